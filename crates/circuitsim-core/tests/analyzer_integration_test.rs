use approx::assert_relative_eq;
use circuitsim_core::{
    Circuit, CircuitComplexityAnalyzer, ComplexityLevel, Component, PromptPriority,
};
use serde_json::{json, Map, Value};

fn specs(value: Value) -> Vec<Map<String, Value>> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().cloned().unwrap())
        .collect()
}

fn build(name: &str, value: Value) -> Circuit {
    Circuit::from_specs(name, &specs(value)).unwrap()
}

#[test]
fn test_simple_divider_is_simple() {
    let circuit = build(
        "divider",
        json!([
            {"type": "resistor", "name": "R1", "nodes": ["n1", "n2"], "value": 1000.0},
            {"type": "resistor", "name": "R2", "nodes": ["n2", "gnd"], "value": 2000.0},
            {"type": "voltage_source", "name": "V1", "nodes": ["n1", "gnd"], "value": 5.0}
        ]),
    );

    let analyzer = CircuitComplexityAnalyzer::new();
    let metrics = analyzer.analyze_complexity(circuit.components());

    assert_eq!(metrics.component_count, 3);
    assert_eq!(metrics.complexity_level, ComplexityLevel::Simple);
    assert_eq!(metrics.passive_components, 2);
    assert_eq!(metrics.power_components, 1);
    assert_eq!(metrics.active_components, 0);
    assert_eq!(metrics.node_count, 3);
    assert_relative_eq!(metrics.complexity_score, 4.0);

    let report = analyzer.analysis_report(circuit.components());
    assert!(!report.datasheet_recommendations.should_prompt);
    assert_eq!(report.datasheet_recommendations.total_prompts, 0);
    assert!(report.recommendations.is_empty());
}

#[test]
fn test_opamp_follower_recommends_datasheet() {
    let circuit = build(
        "follower",
        json!([
            {"type": "opamp", "name": "U1", "nodes": ["in", "out", "out"]},
            {"type": "resistor", "name": "RL", "nodes": ["out", "0"], "value": 1e4},
            {"type": "voltage_source", "name": "VIN", "nodes": ["in", "0"], "value": 1.0}
        ]),
    );

    let analyzer = CircuitComplexityAnalyzer::new();
    let metrics = analyzer.analyze_complexity(circuit.components());
    assert_relative_eq!(metrics.complexity_score, 7.0);
    assert_eq!(metrics.complexity_level, ComplexityLevel::Moderate);

    let prompts = analyzer.datasheet_prompts(circuit.components(), &metrics);
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].component_type, "opamp");
    assert_eq!(prompts[0].priority, PromptPriority::Recommended);
}

#[test]
fn test_moderate_amplifier() {
    let circuit = build(
        "amp",
        json!([
            {"type": "resistor", "name": "R1", "nodes": ["in", "out"], "value": 10000.0},
            {"type": "resistor", "name": "R2", "nodes": ["out", "gnd"], "value": 10000.0},
            {"type": "capacitor", "name": "C1", "nodes": ["out", "gnd"], "value": 1e-6},
            {"type": "opamp", "name": "U1", "nodes": ["in", "out", "out", "vcc", "vee"], "gain": 100000.0},
            {"type": "voltage_source", "name": "VCC", "nodes": ["vcc", "gnd"], "value": 15.0},
            {"type": "voltage_source", "name": "VEE", "nodes": ["vee", "gnd"], "value": -15.0},
            {"type": "voltage_source", "name": "VIN", "nodes": ["in", "gnd"], "value": 1.0}
        ]),
    );

    let analyzer = CircuitComplexityAnalyzer::new();
    let metrics = analyzer.analyze_complexity(circuit.components());
    assert_eq!(metrics.component_count, 7);
    assert_eq!(metrics.active_components, 1);
    assert_eq!(metrics.passive_components, 3);
    assert_eq!(metrics.power_components, 3);
    assert_relative_eq!(metrics.complexity_score, 13.0);
    assert_eq!(metrics.complexity_level, ComplexityLevel::Moderate);
    assert!(!analyzer.should_prompt_for_datasheets(&metrics));
}

#[test]
fn test_large_mixed_circuit_is_very_complex() {
    let mut components = Vec::new();
    for i in 0..5 {
        components.extend(specs(json!([
            {"type": "opamp", "name": format!("U{i}"),
             "nodes": [format!("in{i}"), format!("fb{i}"), format!("out{i}"), "vcc", "vee"]},
            {"type": "mosfet", "name": format!("M{i}"),
             "nodes": [format!("d{i}"), format!("g{i}"), format!("s{i}"), "gnd"], "model": "NMOS"},
            {"type": "resistor", "name": format!("R{i}"),
             "nodes": [format!("out{i}"), format!("fb{i}")], "value": 10000.0},
            {"type": "capacitor", "name": format!("C{i}"),
             "nodes": [format!("out{i}"), "gnd"], "value": 1e-9}
        ])));
    }
    components.extend(specs(json!([
        {"type": "voltage_source", "name": "VCC", "nodes": ["vcc", "gnd"], "value": 15.0},
        {"type": "voltage_source", "name": "VEE", "nodes": ["vee", "gnd"], "value": -15.0}
    ])));
    let circuit = Circuit::from_specs("big", &components).unwrap();

    let analyzer = CircuitComplexityAnalyzer::new();
    let report = analyzer.analysis_report(circuit.components());
    let metrics = &report.complexity_metrics;

    assert_eq!(metrics.component_count, 22);
    assert_eq!(metrics.breakdown.active, 10);
    assert_eq!(metrics.breakdown.passive, 10);
    assert_eq!(metrics.breakdown.power, 2);
    assert_eq!(metrics.node_count, 33);
    assert_relative_eq!(metrics.score, 49.0 * 1.2, epsilon = 1e-9);
    assert_eq!(metrics.level, ComplexityLevel::VeryComplex);

    let recs = &report.datasheet_recommendations;
    assert!(recs.should_prompt);
    assert_eq!(recs.total_prompts, 2);
    assert_eq!(recs.critical_prompts, 1);
    assert_eq!(recs.prompts[0].component_type, "opamp");
    assert_eq!(recs.prompts[0].priority, PromptPriority::Critical);
    assert_eq!(recs.prompts[1].component_type, "mosfet");
    assert_eq!(recs.prompts[1].priority, PromptPriority::Optional);

    assert_eq!(report.recommendations.len(), 3);
    assert!(report.recommendations[0].starts_with("This is a very complex circuit"));
    assert!(report.recommendations[2].starts_with("Critical components detected"));
}

#[test]
fn test_many_opamps_escalate() {
    let components: Vec<Component> = (0..8)
        .map(|i| {
            Component::new(
                format!("U{i}"),
                circuitsim_core::ComponentKind::OpAmp,
                vec![format!("in{i}"), format!("out{i}")],
            )
        })
        .collect();

    let analyzer = CircuitComplexityAnalyzer::new();
    let metrics = analyzer.analyze_complexity(&components);
    assert!(metrics.complexity_level.is_complex());
    assert!(analyzer.should_prompt_for_datasheets(&metrics));

    let prompts = analyzer.datasheet_prompts(&components, &metrics);
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].priority, PromptPriority::Critical);
    assert!(prompts[0].suggested_parts.contains(&"LM741".to_string()));
}

#[test]
fn test_unknown_types_trigger_prompting() {
    let circuit = build(
        "mystery",
        json!([
            {"type": "widget", "name": "X1", "nodes": ["a", "b"]},
            {"type": "gizmo", "name": "X2", "nodes": ["b", "0"]}
        ]),
    );

    let analyzer = CircuitComplexityAnalyzer::new();
    let report = analyzer.analysis_report(circuit.components());
    assert_eq!(report.complexity_metrics.breakdown.unknown, 2);
    assert!(report.datasheet_recommendations.should_prompt);
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.starts_with("Unknown component types detected")));

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["complexity_metrics"]["level"], "moderate");
    assert_eq!(json["datasheet_recommendations"]["prompts"][0]["priority"], "recommended");
}

#[test]
fn test_datasheet_part_suppresses_prompt() {
    let circuit = build(
        "with_part",
        json!([
            {"type": "opamp", "name": "U1", "nodes": ["in", "out"], "part_number": "LM741"},
            {"type": "opamp", "name": "U2", "nodes": ["out", "out2"], "part_number": "GENERIC"}
        ]),
    );

    let analyzer = CircuitComplexityAnalyzer::new();
    let metrics = analyzer.analyze_complexity(circuit.components());
    assert!(analyzer
        .datasheet_prompts(circuit.components(), &metrics)
        .is_empty());
}
