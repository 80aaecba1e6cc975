use async_trait::async_trait;

use crate::error::EngineError;
use crate::ngspice::types::RawfileData;

/// A SPICE backend that runs a complete deck and returns the first plot.
#[async_trait]
pub trait SpiceEngine: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, deck: &str) -> Result<RawfileData, EngineError>;

    async fn version(&self) -> Result<String, EngineError>;
}

#[cfg(any(test, feature = "test-utils"))]
pub use scripted::{ScriptedEngine, ScriptedResponse};

#[cfg(any(test, feature = "test-utils"))]
mod scripted {
    use super::*;
    use tokio::sync::Mutex;

    /// What the scripted engine answers to every run.
    #[derive(Debug, Clone)]
    pub enum ScriptedResponse {
        Raw(RawfileData),
        NotFound,
        Execution(String),
        Timeout(u64),
    }

    /// In-process engine for tests: returns a fixed response and records
    /// every deck it was given.
    #[derive(Debug)]
    pub struct ScriptedEngine {
        response: Mutex<ScriptedResponse>,
        decks: Mutex<Vec<String>>,
    }

    impl ScriptedEngine {
        pub fn new(response: ScriptedResponse) -> Self {
            Self {
                response: Mutex::new(response),
                decks: Mutex::new(Vec::new()),
            }
        }

        pub fn returning(data: RawfileData) -> Self {
            Self::new(ScriptedResponse::Raw(data))
        }

        pub fn failing(message: impl Into<String>) -> Self {
            Self::new(ScriptedResponse::Execution(message.into()))
        }

        pub async fn set_response(&self, response: ScriptedResponse) {
            *self.response.lock().await = response;
        }

        pub async fn decks(&self) -> Vec<String> {
            self.decks.lock().await.clone()
        }

        pub async fn last_deck(&self) -> Option<String> {
            self.decks.lock().await.last().cloned()
        }
    }

    #[async_trait]
    impl SpiceEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn run(&self, deck: &str) -> Result<RawfileData, EngineError> {
            self.decks.lock().await.push(deck.to_string());
            match self.response.lock().await.clone() {
                ScriptedResponse::Raw(data) => Ok(data),
                ScriptedResponse::NotFound => Err(EngineError::NgspiceNotFound(
                    "'ngspice' is not on PATH".to_string(),
                )),
                ScriptedResponse::Execution(message) => Err(EngineError::ExecutionFailed(message)),
                ScriptedResponse::Timeout(secs) => Err(EngineError::Timeout(secs)),
            }
        }

        async fn version(&self) -> Result<String, EngineError> {
            match &*self.response.lock().await {
                ScriptedResponse::NotFound => Err(EngineError::NgspiceNotFound(
                    "'ngspice' is not on PATH".to_string(),
                )),
                _ => Ok("scripted-1.0".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_engine_records_decks() {
        let raw = RawfileData::from_columns(
            "Operating Point",
            &[("v(out)", "voltage")],
            vec![vec![1.5]],
            None,
        );
        let engine = ScriptedEngine::returning(raw.clone());

        assert_eq!(engine.run("deck one").await.unwrap(), raw);
        engine.set_response(ScriptedResponse::Timeout(3)).await;
        assert!(matches!(
            engine.run("deck two").await,
            Err(EngineError::Timeout(3))
        ));

        assert_eq!(engine.decks().await, vec!["deck one", "deck two"]);
        assert_eq!(engine.version().await.unwrap(), "scripted-1.0");
    }
}
