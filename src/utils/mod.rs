mod chain_csv;
pub mod plotting;
mod point_file;

pub use chain_csv::*;
pub use point_file::*;
