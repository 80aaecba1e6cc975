//! ngspice integration: process runner and rawfile parser.

pub mod rawfile;
pub mod runner;
pub mod types;

pub use rawfile::parse_rawfile;
pub use runner::{NgspiceConfig, NgspiceEngine};
pub use types::{PlotKind, RawVariable, RawfileData, RawfileHeader};
