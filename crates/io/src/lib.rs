// File I/O operations

pub mod csv;
pub mod reference;

pub use reference::{load, ReferenceError};

/// Default location of the wood reference dataset, relative to the working directory.
pub const DEFAULT_REFERENCE_PATH: &str = "data/woodHardness.csv";
