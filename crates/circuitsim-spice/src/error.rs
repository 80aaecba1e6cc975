use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Failures of the external engine process itself.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("ngspice not found ({0}). Install ngspice: brew install ngspice (macOS) or sudo apt-get install ngspice (Ubuntu)")]
    NgspiceNotFound(String),

    #[error("ngspice execution failed: {0}")]
    ExecutionFailed(String),

    #[error("ngspice timed out after {0} seconds")]
    Timeout(u64),

    #[error("failed to parse rawfile: {0}")]
    RawfileParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A simulation failure explained for the caller.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct SimulationError {
    pub message: String,
    pub suggestion: Option<String>,
    pub technical_details: Option<String>,
}

impl SimulationError {
    pub fn new(
        message: impl Into<String>,
        suggestion: impl Into<String>,
        technical_details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            suggestion: Some(suggestion.into()),
            technical_details: Some(technical_details.into()),
        }
    }

    /// Message, suggestion and details as one block of text.
    pub fn full_text(&self) -> String {
        let mut text = self.message.clone();
        if let Some(suggestion) = &self.suggestion {
            text.push_str(&format!("\nSuggestion: {}", suggestion));
        }
        if let Some(details) = &self.technical_details {
            text.push_str(&format!("\nTechnical Details:\n{}", details));
        }
        text
    }

    pub fn to_json(&self) -> Value {
        json!({
            "error": self.message,
            "suggestion": self.suggestion,
            "technical_details": self.technical_details,
        })
    }
}

#[derive(Error, Debug)]
pub enum SpiceError {
    #[error("Invalid analysis request: {0}")]
    InvalidAnalysis(String),

    #[error("Circuit '{0}' has no components to simulate")]
    EmptyCircuit(String),

    #[error("Node(s) {unknown:?} not found in circuit. Available nodes: {available:?}")]
    UnknownNodes {
        unknown: Vec<String>,
        available: Vec<String>,
    },

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl SpiceError {
    pub fn invalid_analysis(msg: impl Into<String>) -> Self {
        Self::InvalidAnalysis(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SpiceError>;
