//! Tabular file parsing

pub mod delimited;
pub mod reader;

pub use delimited::parse;
pub use reader::{DataRows, DelimitedConfig};
