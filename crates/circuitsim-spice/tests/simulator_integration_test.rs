use std::sync::Arc;

use approx::assert_relative_eq;
use circuitsim_core::Circuit;
use circuitsim_spice::{
    CircuitSimulator, NgspiceEngine, RawfileData, ScriptedEngine, ScriptedResponse, SpiceEngine,
    SpiceError,
};
use serde_json::{json, Map, Value};

fn circuit(name: &str, value: Value) -> Circuit {
    let specs: Vec<Map<String, Value>> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect();
    Circuit::from_specs(name, &specs).unwrap()
}

fn rc_lowpass() -> Circuit {
    circuit(
        "rc_lowpass",
        json!([
            {"type": "voltage_source", "name": "Vin", "nodes": ["in", "gnd"], "value": 1.0, "source_type": "AC"},
            {"type": "resistor", "name": "R1", "nodes": ["in", "out"], "value": "1k"},
            {"type": "capacitor", "name": "C1", "nodes": ["out", "gnd"], "value": "159n"}
        ]),
    )
}

#[tokio::test]
async fn test_ac_magnitude_and_phase() {
    let raw = RawfileData::from_columns(
        "AC Analysis",
        &[("frequency", "frequency"), ("v(in)", "voltage"), ("v(out)", "voltage")],
        vec![vec![1.0, 1.0, 0.5], vec![1000.0, 1.0, 0.0]],
        Some(vec![vec![0.0, 0.0, -0.5], vec![0.0, 0.0, -1.0]]),
    );
    let engine = Arc::new(ScriptedEngine::returning(raw));
    let simulator = CircuitSimulator::new(engine.clone());

    let results = simulator
        .simulate_ac(&rc_lowpass(), 1.0, 1000.0, 10, Some(&["out".to_string()]))
        .await
        .unwrap();

    assert_eq!(results.analysis_type, "AC");
    assert_eq!(results.series("frequency").unwrap(), vec![1.0, 1000.0]);
    let magnitude = results.series("out_magnitude").unwrap();
    let phase = results.series("out_phase").unwrap();
    assert_relative_eq!(magnitude[0], 0.5f64.hypot(0.5));
    assert_relative_eq!(phase[0], -std::f64::consts::FRAC_PI_4);
    assert_relative_eq!(magnitude[1], 1.0);
    assert_relative_eq!(phase[1], -std::f64::consts::FRAC_PI_2);
    assert!(results.data.get("in_magnitude").is_none());
    assert_eq!(results.metadata["start_freq"], 1.0);
    assert_eq!(results.metadata["num_points"], 10);

    let deck = engine.last_deck().await.unwrap();
    assert!(deck.contains("Vin in 0 DC 0 AC 1.0"));
    assert!(deck.contains(".ac dec 10 1.0 1000.0"));
}

#[tokio::test]
async fn test_transient_series() {
    let raw = RawfileData::from_columns(
        "Transient Analysis",
        &[("time", "time"), ("v(in)", "voltage"), ("v(out)", "voltage")],
        vec![vec![0.0, 1.0, 0.0], vec![1e-4, 1.0, 0.47], vec![2e-4, 1.0, 0.72]],
        None,
    );
    let simulator = CircuitSimulator::new(Arc::new(ScriptedEngine::returning(raw)));

    let results = simulator
        .simulate_transient(&rc_lowpass(), 2e-4, 1e-4, Some(&["out".to_string(), "gnd".to_string()]))
        .await
        .unwrap();

    assert_eq!(results.analysis_type, "Transient");
    assert_eq!(results.series("time").unwrap(), vec![0.0, 1e-4, 2e-4]);
    assert_eq!(results.series("out").unwrap(), vec![0.0, 0.47, 0.72]);
    assert_eq!(results.series("gnd").unwrap(), vec![0.0, 0.0, 0.0]);
    assert_eq!(results.metadata["duration"], 2e-4);
    assert_eq!(results.metadata["step_size"], 1e-4);
}

#[tokio::test]
async fn test_engine_failure_is_explained() {
    let engine = Arc::new(ScriptedEngine::new(ScriptedResponse::NotFound));
    let simulator = CircuitSimulator::new(engine);

    let err = simulator.simulate_dc(&rc_lowpass(), None).await.unwrap_err();
    let SpiceError::Simulation(err) = err else {
        panic!("expected a simulation error");
    };
    assert_eq!(err.message, "DC simulation failed: ngspice not found or not working");
    let details = err.technical_details.unwrap();
    assert!(details.contains("Ground connection found"));
    assert!(details.contains("R1 in out 1000.0"));
}

#[tokio::test]
async fn test_convergence_failure_is_explained() {
    let engine = Arc::new(ScriptedEngine::failing(
        "ngspice exited with exit status: 1\nstdout: \nstderr: Error: Timestep too small",
    ));
    let simulator = CircuitSimulator::new(engine);

    let err = simulator
        .simulate_transient(&rc_lowpass(), 1e-3, 1e-6, None)
        .await
        .unwrap_err();
    let SpiceError::Simulation(err) = err else {
        panic!("expected a simulation error");
    };
    assert_eq!(
        err.message,
        "Transient simulation failed: Singular matrix (no DC solution)"
    );
    assert!(err.suggestion.unwrap().starts_with("FIXES:"));
}

#[tokio::test]
#[ignore] // Requires ngspice to be installed
async fn test_divider_on_ngspice() {
    let engine = Arc::new(NgspiceEngine::default());
    if engine.version().await.is_err() {
        return;
    }
    let simulator = CircuitSimulator::new(engine);
    let divider = circuit(
        "divider",
        json!([
            {"type": "voltage_source", "name": "V1", "nodes": ["in", "0"], "value": 10.0},
            {"type": "resistor", "name": "R1", "nodes": ["in", "out"], "value": 1000.0},
            {"type": "resistor", "name": "R2", "nodes": ["out", "0"], "value": 1000.0}
        ]),
    );

    let results = simulator.simulate_dc(&divider, None).await.unwrap();
    assert_relative_eq!(results.scalar("out").unwrap(), 5.0, epsilon = 1e-6);
    assert_relative_eq!(
        results.metadata["source_currents"]["V1"].as_f64().unwrap(),
        -0.005,
        epsilon = 1e-9
    );
}
