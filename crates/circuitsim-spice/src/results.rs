use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Output of one analysis run, shaped for the tool responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResults {
    pub analysis_type: String,
    pub circuit_name: String,
    pub data: Map<String, Value>,
    pub metadata: Map<String, Value>,
}

impl SimulationResults {
    pub fn new(analysis_type: impl Into<String>, circuit_name: impl Into<String>) -> Self {
        Self {
            analysis_type: analysis_type.into(),
            circuit_name: circuit_name.into(),
            data: Map::new(),
            metadata: Map::new(),
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// A single numeric data entry, e.g. a DC node voltage.
    pub fn scalar(&self, key: &str) -> Option<f64> {
        self.data.get(key).and_then(Value::as_f64)
    }

    /// A numeric series, e.g. `time` or `out_magnitude`.
    pub fn series(&self, key: &str) -> Option<Vec<f64>> {
        self.data
            .get(key)?
            .as_array()?
            .iter()
            .map(Value::as_f64)
            .collect()
    }
}
