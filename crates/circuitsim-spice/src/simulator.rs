use std::sync::Arc;
use std::time::Instant;

use circuitsim_core::{is_ground_node, Circuit};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::analysis::AnalysisRequest;
use crate::classify::classify_failure;
use crate::deck::{DeckOptions, SpiceDeck};
use crate::engine::SpiceEngine;
use crate::error::{EngineError, Result, SimulationError, SpiceError};
use crate::ngspice::types::RawfileData;
use crate::results::SimulationResults;

/// Runs analyses of [`Circuit`]s on a [`SpiceEngine`].
#[derive(Clone)]
pub struct CircuitSimulator {
    engine: Arc<dyn SpiceEngine>,
    options: DeckOptions,
}

impl CircuitSimulator {
    pub fn new(engine: Arc<dyn SpiceEngine>) -> Self {
        Self {
            engine,
            options: DeckOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DeckOptions) -> Self {
        self.options = options;
        self
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    pub async fn engine_version(&self) -> std::result::Result<String, EngineError> {
        self.engine.version().await
    }

    pub async fn simulate_dc(
        &self,
        circuit: &Circuit,
        output_nodes: Option<&[String]>,
    ) -> Result<SimulationResults> {
        self.simulate(circuit, &AnalysisRequest::Dc, output_nodes)
            .await
    }

    pub async fn simulate_ac(
        &self,
        circuit: &Circuit,
        start_freq: f64,
        stop_freq: f64,
        num_points: u32,
        output_nodes: Option<&[String]>,
    ) -> Result<SimulationResults> {
        self.simulate(
            circuit,
            &AnalysisRequest::ac(start_freq, stop_freq, num_points),
            output_nodes,
        )
        .await
    }

    pub async fn simulate_transient(
        &self,
        circuit: &Circuit,
        duration: f64,
        step_size: f64,
        output_nodes: Option<&[String]>,
    ) -> Result<SimulationResults> {
        self.simulate(
            circuit,
            &AnalysisRequest::transient(step_size, duration),
            output_nodes,
        )
        .await
    }

    /// Run one analysis and extract the requested node data.
    ///
    /// `output_nodes` defaults to every node of the circuit. Ground aliases
    /// are always accepted and read 0.
    pub async fn simulate(
        &self,
        circuit: &Circuit,
        analysis: &AnalysisRequest,
        output_nodes: Option<&[String]>,
    ) -> Result<SimulationResults> {
        analysis.validate()?;
        if circuit.is_empty() {
            return Err(SpiceError::EmptyCircuit(circuit.name.clone()));
        }

        let circuit_nodes = circuit.nodes();
        let output_nodes: Vec<String> = match output_nodes {
            Some(nodes) if !nodes.is_empty() => nodes.to_vec(),
            _ => circuit_nodes.iter().cloned().collect(),
        };
        let unknown: Vec<String> = output_nodes
            .iter()
            .filter(|n| !is_ground_node(n) && !circuit_nodes.contains(*n))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(SpiceError::UnknownNodes {
                unknown,
                available: circuit_nodes.into_iter().collect(),
            });
        }

        let label = analysis.label();
        let deck = SpiceDeck::build(circuit, analysis, &self.options);
        if !deck.skipped.is_empty() {
            warn!(
                "{} simulation of '{}' skips components without a SPICE primitive: {:?}",
                label, circuit.name, deck.skipped
            );
        }

        info!("Running {} simulation of '{}'", label, circuit.name);
        let started = Instant::now();
        let raw = match self.engine.run(&deck.text).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("{} simulation of '{}' failed: {}", label, circuit.name, e);
                return Err(classify_failure(label, &e, circuit, &deck.text).into());
            }
        };
        debug!(
            "{} simulation of '{}' finished in {:?}",
            label,
            circuit.name,
            started.elapsed()
        );

        let mut results = SimulationResults::new(label, circuit.name.clone());
        match analysis {
            AnalysisRequest::Dc => {
                results.data = extract_dc(&raw, &output_nodes)?;
                results
                    .metadata
                    .insert("source_currents".into(), source_currents(&raw, circuit, &deck));
            }
            AnalysisRequest::Ac { .. } => results.data = extract_ac(&raw, &output_nodes)?,
            AnalysisRequest::Transient { .. } => {
                results.data = extract_transient(&raw, &output_nodes)?
            }
        }

        if let Value::Object(params) = analysis.parameters() {
            results.metadata.extend(params);
        }
        results
            .metadata
            .insert("output_nodes".into(), json!(output_nodes));
        results
            .metadata
            .insert("total_nodes".into(), json!(circuit.nodes().len()));
        results
            .metadata
            .insert("points".into(), json!(raw.header.num_points));
        results
            .metadata
            .insert("skipped_components".into(), json!(deck.skipped));
        results
            .metadata
            .insert("model_substitutions".into(), json!(deck.model_substitutions));
        results
            .metadata
            .insert("engine".into(), json!(self.engine.name()));
        results
            .metadata
            .insert("spice_deck".into(), json!(deck.text));
        results
            .metadata
            .insert("timestamp".into(), json!(chrono::Utc::now().to_rfc3339()));

        Ok(results)
    }
}

fn node_index(raw: &RawfileData, node: &str) -> Option<usize> {
    raw.find_variable(&format!("v({})", node))
        .or_else(|| raw.find_variable(node))
        .map(|v| v.index)
}

fn missing_node(node: &str, context: &str, raw: &RawfileData) -> SpiceError {
    let mut available = raw.variable_names();
    available.extend(["gnd".to_string(), "0".to_string()]);
    SimulationError::new(
        format!("Node '{}' not found in {}", node, context),
        "Check that the node name exists in your circuit and is connected to components",
        format!("Available nodes: {:?}", available),
    )
    .into()
}

fn missing_axis(axis: &str, label: &str, raw: &RawfileData) -> SpiceError {
    SimulationError::new(
        format!("No {} data found in {} analysis results", axis, label),
        format!(
            "The {} simulation may have failed or returned invalid results",
            label
        ),
        format!("Returned variables: {:?}", raw.variable_names()),
    )
    .into()
}

fn extract_dc(raw: &RawfileData, nodes: &[String]) -> Result<Map<String, Value>> {
    let mut data = Map::new();
    for node in nodes {
        let value = if is_ground_node(node) {
            0.0
        } else {
            node_index(raw, node)
                .and_then(|idx| raw.first_value(idx))
                .ok_or_else(|| missing_node(node, "simulation results", raw))?
        };
        data.insert(node.clone(), json!(value));
    }
    Ok(data)
}

fn extract_ac(raw: &RawfileData, nodes: &[String]) -> Result<Map<String, Value>> {
    let freq_idx = raw
        .find_by_type("frequency")
        .or_else(|| raw.find_variable("frequency"))
        .map(|v| v.index)
        .ok_or_else(|| missing_axis("frequency", "AC", raw))?;
    let frequency: Vec<f64> = match raw.complex_values(freq_idx) {
        Some(values) => values.iter().map(|c| c.re).collect(),
        None => raw
            .real_values(freq_idx)
            .ok_or_else(|| missing_axis("frequency", "AC", raw))?,
    };

    let mut data = Map::new();
    data.insert("frequency".into(), json!(frequency));
    for node in nodes {
        let (magnitude, phase): (Vec<f64>, Vec<f64>) = if is_ground_node(node) {
            (vec![0.0; frequency.len()], vec![0.0; frequency.len()])
        } else {
            let values = node_index(raw, node)
                .and_then(|idx| raw.complex_values(idx))
                .ok_or_else(|| missing_node(node, "AC analysis results", raw))?;
            values.iter().map(|c| (c.norm(), c.arg())).unzip()
        };
        data.insert(format!("{}_magnitude", node), json!(magnitude));
        data.insert(format!("{}_phase", node), json!(phase));
    }
    Ok(data)
}

fn extract_transient(raw: &RawfileData, nodes: &[String]) -> Result<Map<String, Value>> {
    let time = raw
        .find_by_type("time")
        .or_else(|| raw.find_variable("time"))
        .and_then(|v| raw.real_values(v.index))
        .ok_or_else(|| missing_axis("time", "transient", raw))?;

    let mut data = Map::new();
    let points = time.len();
    data.insert("time".into(), json!(time));
    for node in nodes {
        let values = if is_ground_node(node) {
            vec![0.0; points]
        } else {
            node_index(raw, node)
                .and_then(|idx| raw.real_values(idx))
                .ok_or_else(|| missing_node(node, "transient analysis results", raw))?
        };
        data.insert(node.clone(), json!(values));
    }
    Ok(data)
}

/// Branch currents of the independent sources, keyed by component name.
fn source_currents(raw: &RawfileData, circuit: &Circuit, deck: &SpiceDeck) -> Value {
    let mut currents = Map::new();
    for component in circuit.components().iter().filter(|c| c.kind.is_source()) {
        let Some(element) = deck.element_name(&component.name) else {
            continue;
        };
        let current = raw
            .find_variable(&format!("i({})", element))
            .or_else(|| raw.find_variable(&format!("{}#branch", element)))
            .and_then(|v| raw.first_value(v.index));
        if let Some(current) = current {
            currents.insert(component.name.clone(), json!(current));
        }
    }
    Value::Object(currents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScriptedEngine;
    use circuitsim_core::{Component, ComponentKind, SourceType};

    fn divider() -> Circuit {
        let mut circuit = Circuit::new("divider");
        let mut v1 = Component::new(
            "V1",
            ComponentKind::VoltageSource,
            vec!["in".into(), "gnd".into()],
        )
        .with_value(10.0);
        v1.source_type = Some(SourceType::Dc);
        circuit.add_component(v1).unwrap();
        circuit
            .add_component(
                Component::new("R1", ComponentKind::Resistor, vec!["in".into(), "out".into()])
                    .with_value(1e3),
            )
            .unwrap();
        circuit
            .add_component(
                Component::new("R2", ComponentKind::Resistor, vec!["out".into(), "gnd".into()])
                    .with_value(1e3),
            )
            .unwrap();
        circuit
    }

    fn op_raw() -> RawfileData {
        RawfileData::from_columns(
            "Operating Point",
            &[("v(in)", "voltage"), ("v(out)", "voltage"), ("v1#branch", "current")],
            vec![vec![10.0, 5.0, -0.005]],
            None,
        )
    }

    #[tokio::test]
    async fn test_dc_defaults_to_all_nodes() {
        let engine = Arc::new(ScriptedEngine::returning(op_raw()));
        let simulator = CircuitSimulator::new(engine.clone());

        let results = simulator.simulate_dc(&divider(), None).await.unwrap();
        assert_eq!(results.analysis_type, "DC");
        assert_eq!(results.scalar("in"), Some(10.0));
        assert_eq!(results.scalar("out"), Some(5.0));
        assert_eq!(results.scalar("gnd"), Some(0.0));
        assert_eq!(results.metadata["source_currents"]["V1"], -0.005);
        assert_eq!(results.metadata["engine"], "scripted");

        let deck = engine.last_deck().await.unwrap();
        assert!(deck.contains("V1 in 0 DC 10.0"));
        assert!(deck.trim_end().ends_with(".op\n.end"));
    }

    #[tokio::test]
    async fn test_unknown_output_node_rejected_before_running() {
        let engine = Arc::new(ScriptedEngine::returning(op_raw()));
        let simulator = CircuitSimulator::new(engine.clone());

        let err = simulator
            .simulate_dc(&divider(), Some(&["vout".to_string()]))
            .await
            .unwrap_err();
        match err {
            SpiceError::UnknownNodes { unknown, available } => {
                assert_eq!(unknown, vec!["vout"]);
                assert_eq!(available, vec!["gnd", "in", "out"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(engine.decks().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_circuit_rejected() {
        let simulator = CircuitSimulator::new(Arc::new(ScriptedEngine::returning(op_raw())));
        let err = simulator
            .simulate_dc(&Circuit::new("empty"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SpiceError::EmptyCircuit(name) if name == "empty"));
    }

    #[tokio::test]
    async fn test_node_missing_from_results() {
        let raw = RawfileData::from_columns(
            "Operating Point",
            &[("v(in)", "voltage")],
            vec![vec![10.0]],
            None,
        );
        let simulator = CircuitSimulator::new(Arc::new(ScriptedEngine::returning(raw)));
        let err = simulator
            .simulate_dc(&divider(), Some(&["out".to_string()]))
            .await
            .unwrap_err();
        match err {
            SpiceError::Simulation(e) => {
                assert_eq!(e.message, "Node 'out' not found in simulation results");
                assert!(e.technical_details.unwrap().contains("v(in)"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_analysis_not_run() {
        let engine = Arc::new(ScriptedEngine::returning(op_raw()));
        let simulator = CircuitSimulator::new(engine.clone());
        let err = simulator
            .simulate_transient(&divider(), 1e-6, 1e-3, None)
            .await
            .unwrap_err();
        assert!(matches!(err, SpiceError::InvalidAnalysis(_)));
        assert!(engine.decks().await.is_empty());
    }
}
