pub mod error;
pub mod fs;
pub mod io;
pub mod sparse;
