use thiserror::Error;

#[derive(Error, Debug)]
pub enum CircuitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid component '{name}': {reason}")]
    InvalidComponent { name: String, reason: String },

    #[error("Invalid node name '{0}': node names must be non-empty and free of whitespace, parentheses, '=' and ','")]
    InvalidNode(String),

    #[error("Duplicate component name: {0}")]
    DuplicateComponent(String),

    #[error("Component {0} not found in datasheet library")]
    UnknownPart(String),

    #[error("Unsupported component type: {0}")]
    UnsupportedComponent(String),

    #[error("Library error: {0}")]
    Library(String),
}

impl CircuitError {
    pub fn invalid_component(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidComponent {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn library(msg: impl Into<String>) -> Self {
        Self::Library(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CircuitError>;
