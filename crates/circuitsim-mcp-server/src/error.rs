use circuitsim_core::CircuitError;
use circuitsim_spice::SpiceError;
use thiserror::Error;

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error(transparent)]
    Circuit(#[from] CircuitError),

    #[error(transparent)]
    Spice(#[from] SpiceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServerError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn limit_exceeded(msg: impl Into<String>) -> Self {
        Self::LimitExceeded(msg.into())
    }

    pub fn circuit_not_found(name: &str) -> Self {
        Self::NotFound(format!("Circuit '{}' not found", name))
    }

    /// True when the caller can fix the request and retry.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::InvalidInput(_) | Self::LimitExceeded(_) => true,
            Self::Circuit(err) => !matches!(
                err,
                CircuitError::Io(_) | CircuitError::Serialization(_) | CircuitError::Library(_)
            ),
            Self::Spice(err) => matches!(
                err,
                SpiceError::InvalidAnalysis(_)
                    | SpiceError::EmptyCircuit(_)
                    | SpiceError::UnknownNodes { .. }
            ),
            _ => false,
        }
    }
}

impl From<ServerError> for rmcp::ErrorData {
    fn from(err: ServerError) -> Self {
        if err.is_client_error() {
            return rmcp::ErrorData::invalid_params(err.to_string(), None);
        }
        match err {
            ServerError::Spice(SpiceError::Simulation(sim)) => {
                let data = sim.to_json();
                rmcp::ErrorData::internal_error(sim.message, Some(data))
            }
            other => rmcp::ErrorData::internal_error(other.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circuitsim_spice::SimulationError;
    use rmcp::model::ErrorCode;

    #[test]
    fn test_not_found_is_invalid_params() {
        let err: rmcp::ErrorData = ServerError::circuit_not_found("amp").into();
        assert_eq!(err.code, ErrorCode::INVALID_PARAMS);
        assert_eq!(err.message, "Circuit 'amp' not found");
    }

    #[test]
    fn test_simulation_failure_carries_guidance() {
        let sim = SimulationError::new(
            "DC simulation failed: Singular matrix (no DC solution)",
            "FIXES: 1) Add ground connection",
            "Original error: singular matrix",
        );
        let err: rmcp::ErrorData = ServerError::from(SpiceError::from(sim)).into();
        assert_eq!(err.code, ErrorCode::INTERNAL_ERROR);
        let data = err.data.unwrap();
        assert_eq!(data["suggestion"], "FIXES: 1) Add ground connection");
        assert_eq!(data["technical_details"], "Original error: singular matrix");
    }

    #[test]
    fn test_invalid_component_is_client_error() {
        let err = ServerError::from(CircuitError::invalid_component("R1", "missing value"));
        assert!(err.is_client_error());
        assert!(!ServerError::config("bad").is_client_error());
    }
}
