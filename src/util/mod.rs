//! Small request-handling utilities.

pub mod date;
pub mod params;

pub use params::{parse_params, split_csv, ParamSpec, ParamType};
