pub mod analyzer;
pub mod circuit;
pub mod component;
pub mod datasheet;
pub mod diagnostics;
pub mod error;
pub mod units;

pub use analyzer::*;
pub use circuit::*;
pub use component::*;
pub use datasheet::*;
pub use diagnostics::*;
pub use error::*;
pub use units::{format_netlist_value, format_si, parse_value};
