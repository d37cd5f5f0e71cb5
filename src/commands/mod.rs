pub mod inspect;
pub mod load;

pub use inspect::{run_inspect, InspectArgs};
pub use load::{run_load, LoadArgs};
