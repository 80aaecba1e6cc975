//! Circuit definitions stored on disk for the offline CLI commands.
//!
//! A file holds either `{"name": ..., "components": [...]}` or a bare
//! component array, in which case the file stem names the circuit.

use circuitsim_core::Circuit;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

use crate::{Result, ServerError};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CircuitFile {
    Named {
        #[serde(default)]
        name: Option<String>,
        components: Vec<Map<String, Value>>,
    },
    Components(Vec<Map<String, Value>>),
}

pub fn parse_circuit(contents: &str, fallback_name: &str) -> Result<Circuit> {
    let file: CircuitFile = serde_json::from_str(contents).map_err(|e| {
        ServerError::invalid_input(format!(
            "expected {{\"name\", \"components\"}} or a component array: {}",
            e
        ))
    })?;
    let (name, components) = match file {
        CircuitFile::Named { name, components } => {
            (name.unwrap_or_else(|| fallback_name.to_string()), components)
        }
        CircuitFile::Components(components) => (fallback_name.to_string(), components),
    };
    Ok(Circuit::from_specs(name, &components)?)
}

pub fn load_circuit_file(path: &Path) -> Result<Circuit> {
    let contents = std::fs::read_to_string(path)?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("circuit");
    parse_circuit(&contents, stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_file() {
        let circuit = parse_circuit(
            r#"{"name": "divider", "components": [
                {"type": "voltage_source", "name": "V1", "nodes": ["in", "0"], "value": 5},
                {"type": "resistor", "name": "R1", "nodes": ["in", "out"], "value": "10k"}
            ]}"#,
            "ignored",
        )
        .unwrap();
        assert_eq!(circuit.name, "divider");
        assert_eq!(circuit.len(), 2);
    }

    #[test]
    fn test_bare_array_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rc_filter.json");
        std::fs::write(
            &path,
            r#"[{"type": "capacitor", "name": "C1", "nodes": ["out", "gnd"], "value": "100n"}]"#,
        )
        .unwrap();
        let circuit = load_circuit_file(&path).unwrap();
        assert_eq!(circuit.name, "rc_filter");
    }

    #[test]
    fn test_malformed_file_is_invalid_input() {
        let err = parse_circuit("{\"components\": 3}", "x").unwrap_err();
        assert!(matches!(err, ServerError::InvalidInput(_)));
    }
}
