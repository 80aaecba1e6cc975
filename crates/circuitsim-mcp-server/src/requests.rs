//! Tool argument types. Field docs become the JSON schema descriptions
//! clients see.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateCircuitRequest {
    /// Unique circuit name; an existing circuit with this name is replaced
    pub name: String,
    /// Component objects, e.g. {"type": "resistor", "name": "R1", "nodes": ["in", "out"], "value": "1k"}
    pub components: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CircuitNameRequest {
    /// Name of a circuit created earlier
    pub circuit_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DatasheetPromptsRequest {
    /// Name of a circuit created earlier
    pub circuit_name: String,
    /// Return full prompt objects instead of one-line summaries
    #[serde(default = "default_true")]
    pub detailed: bool,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OptimizeRequest {
    /// Name of a circuit created earlier
    pub circuit_name: String,
    /// Goals such as "power", "speed", "cost" or "noise"
    pub optimization_goals: Vec<String>,
    /// Optional constraints; "manufacturer" restricts the alternatives offered
    #[serde(default)]
    pub constraints: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct SearchComponentsRequest {
    /// Component type such as "opamp", "mosfet", "transistor" or "diode"
    #[serde(default)]
    pub component_type: Option<String>,
    /// Manufacturer name, matched case-insensitively
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// Parts must define every parameter named here (values are ignored)
    #[serde(default)]
    pub parameter_filters: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PartNumberRequest {
    /// Library part number, e.g. "LM741"
    pub part_number: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SimulateDcRequest {
    /// Name of a circuit created earlier
    pub circuit_name: String,
    /// Nodes to report (defaults to every node)
    #[serde(default)]
    pub output_nodes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SimulateAcRequest {
    /// Name of a circuit created earlier
    pub circuit_name: String,
    /// Sweep start frequency in Hz
    pub start_freq: f64,
    /// Sweep stop frequency in Hz
    pub stop_freq: f64,
    /// Points per decade
    #[serde(default = "default_ac_points")]
    pub num_points: u32,
    /// Nodes to report (defaults to every node)
    #[serde(default)]
    pub output_nodes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SimulateTransientRequest {
    /// Name of a circuit created earlier
    pub circuit_name: String,
    /// Simulated time in seconds
    pub duration: f64,
    /// Time step in seconds
    pub step_size: f64,
    /// Nodes to report (defaults to every node)
    #[serde(default)]
    pub output_nodes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SimulateWithGuidanceRequest {
    /// Name of a circuit created earlier
    pub circuit_name: String,
    /// "dc", "ac" or "transient"
    #[serde(default = "default_analysis_type")]
    pub analysis_type: String,
    /// Attach datasheet guidance when the circuit would benefit from it
    #[serde(default = "default_true")]
    pub auto_prompt_datasheets: bool,
    /// AC start frequency in Hz (default 1)
    #[serde(default)]
    pub start_freq: Option<f64>,
    /// AC stop frequency in Hz (default 1e6)
    #[serde(default)]
    pub stop_freq: Option<f64>,
    /// AC points per decade (default 50)
    #[serde(default)]
    pub num_points: Option<u32>,
    /// Transient duration in seconds (default 1e-3)
    #[serde(default)]
    pub duration: Option<f64>,
    /// Transient step in seconds (default 1e-6)
    #[serde(default)]
    pub step_size: Option<f64>,
    /// Nodes to report (defaults to every node)
    #[serde(default)]
    pub output_nodes: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

fn default_ac_points() -> u32 {
    100
}

fn default_analysis_type() -> String {
    "dc".to_string()
}
