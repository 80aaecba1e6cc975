//! SPICE simulation of circuitsim circuits through an external ngspice.

pub mod analysis;
pub mod classify;
pub mod deck;
pub mod engine;
pub mod error;
pub mod ngspice;
pub mod results;
pub mod simulator;

pub use analysis::AnalysisRequest;
pub use classify::classify_failure;
pub use deck::{DeckOptions, ModelSubstitution, SpiceDeck};
pub use engine::SpiceEngine;
#[cfg(any(test, feature = "test-utils"))]
pub use engine::{ScriptedEngine, ScriptedResponse};
pub use error::{EngineError, Result, SimulationError, SpiceError};
pub use ngspice::{NgspiceConfig, NgspiceEngine, RawfileData};
pub use results::SimulationResults;
pub use simulator::CircuitSimulator;
