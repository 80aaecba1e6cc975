//! Turns raw engine failures into explanations a circuit designer can act on.

use circuitsim_core::{Circuit, CircuitDiagnostics};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{EngineError, SimulationError};

static MISSING_MODEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"model[s]?\s+['"]?(\w+)['"]?\s+not found"#).expect("valid regex")
});

static UNDEFINED_MODEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"unable to find definition of model\s+(\w+)").expect("valid regex")
});

static PIN_ERROR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(terminals?|pins?)\b").expect("valid regex"));

/// ngspice prints banners and progress notes around the actual errors.
/// Only lines that report a problem are matched against.
fn problem_text(raw: &str) -> String {
    const MARKERS: &[&str] = &[
        "error",
        "singular",
        "converge",
        "timestep too small",
        "unable to find",
        "not found",
        "unknown",
        "unrecognized",
        "fatal",
        "failed",
    ];
    let lower = raw.to_lowercase();
    let lines: Vec<&str> = lower
        .lines()
        .filter(|line| MARKERS.iter().any(|m| line.contains(m)))
        .collect();
    if lines.is_empty() {
        lower
    } else {
        lines.join("\n")
    }
}

fn missing_model_name(text: &str) -> Option<String> {
    MISSING_MODEL
        .captures(text)
        .or_else(|| UNDEFINED_MODEL.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Build the explained failure for a `label` ("DC", "AC", "Transient")
/// analysis of `circuit` that ran `deck`.
pub fn classify_failure(
    label: &str,
    error: &EngineError,
    circuit: &Circuit,
    deck: &str,
) -> SimulationError {
    let diagnostics = CircuitDiagnostics::inspect(circuit).render();
    let details = |prefix: &str| {
        format!(
            "{}Original error: {}\n\nCircuit diagnostics:\n{}",
            prefix, error, diagnostics
        )
    };
    let details_with_deck = || {
        format!(
            "Generated SPICE deck:\n{}\nFull original error details:\n{}\n\nCircuit diagnostics:\n{}",
            deck, error, diagnostics
        )
    };

    match error {
        EngineError::NgspiceNotFound(_) => {
            return SimulationError::new(
                format!("{} simulation failed: ngspice not found or not working", label),
                "Install ngspice: brew install ngspice (macOS) or sudo apt-get install ngspice (Ubuntu)",
                details(""),
            )
        }
        EngineError::Timeout(secs) => {
            return SimulationError::new(
                format!("{} simulation failed: ngspice timed out after {} seconds", label, secs),
                "FIXES: 1) Shorten the transient duration or enlarge the step size, 2) Reduce the number of AC points, 3) Raise simulator.timeout_secs in the server configuration",
                details(""),
            )
        }
        _ => {}
    }

    let text = problem_text(&error.to_string());

    if text.contains("singular matrix")
        || text.contains("convergence")
        || text.contains("timestep too small")
    {
        SimulationError::new(
            format!("{} simulation failed: Singular matrix (no DC solution)", label),
            "FIXES: 1) Add ground connection to node 'gnd' or '0', 2) Check for floating nodes, 3) Verify all components are properly connected, 4) Add small resistance (1mΩ) in series with voltage sources",
            details("This typically means the circuit has no valid DC operating point.\n\n"),
        )
    } else if (text.contains("model") && text.contains("not found"))
        || text.contains("unable to find definition of model")
    {
        let message = match missing_model_name(&text) {
            Some(name) => format!(
                "{} simulation failed: Missing model definition '{}'",
                label, name
            ),
            None => format!("{} simulation failed: Missing model definition", label),
        };
        SimulationError::new(
            message,
            "FIXES: 1) Build the part from the component library with create_datasheet_circuit, 2) Remove the model field to use the built-in defaults, 3) Check spelling of model name",
            details("Built-in models: DefaultDiode, DefaultNPN, DefaultPNP, DefaultNMOS, DefaultPMOS\n\n"),
        )
    } else if text.contains("unknown device") || text.contains("unrecognized") {
        SimulationError::new(
            format!("{} simulation failed: Unknown component type or model", label),
            "FIXES: 1) Check component_type field matches: resistor, capacitor, inductor, voltage_source, current_source, diode, transistor, mosfet, 2) Verify model names for semiconductors",
            details(""),
        )
    } else if text.contains("node") && (text.contains("undefined") || text.contains("unknown")) {
        SimulationError::new(
            format!("{} simulation failed: Undefined node reference", label),
            "FIXES: 1) Check all node names are consistent across components, 2) Ensure ground node 'gnd' or '0' exists, 3) Check for typos in node names",
            details(""),
        )
    } else if PIN_ERROR.is_match(&text) {
        SimulationError::new(
            format!("{} simulation failed: Component terminal/pin error", label),
            "FIXES: 1) Check node count matches component type (resistors need 2, transistors need 3), 2) Verify node names don't contain special characters",
            details(""),
        )
    } else if text.contains("command") && text.contains("run") {
        SimulationError::new(
            format!("{} simulation failed: {}", label, error),
            "COMMON CAUSES: 1) Missing ground connection, 2) Floating nodes, 3) Invalid component models, 4) Malformed netlist. Check the generated SPICE deck in the details.",
            details_with_deck(),
        )
    } else if text.contains("value") || text.contains("parameter") {
        SimulationError::new(
            format!("{} simulation failed: Invalid component parameter", label),
            "FIXES: 1) Check all component values are positive numbers, 2) Verify units (Ω, F, H, V, A), 3) Avoid extremely large or small values",
            details(""),
        )
    } else if text.contains("analysis") || text.contains("directive") {
        SimulationError::new(
            format!("{} simulation failed: SPICE analysis directive error", label),
            "FIXES: 1) Check the analysis parameters (frequencies, duration, step size), 2) Run validate_circuit, 3) Check if circuit has any unusual components",
            details(""),
        )
    } else if text.contains("syntax") || text.contains("parse") {
        SimulationError::new(
            format!("{} simulation failed: SPICE netlist syntax error", label),
            "FIXES: 1) Check for special characters in component names, 2) Verify node names are valid, 3) Check the generated SPICE deck in the details",
            format!(
                "Generated SPICE deck:\n{}\nOriginal error: {}\n\nCircuit diagnostics:\n{}",
                deck, error, diagnostics
            ),
        )
    } else {
        SimulationError::new(
            format!("{} simulation failed: {}", label, error),
            "DEBUGGING STEPS: 1) Check the generated SPICE deck in the details for syntax issues, 2) Use validate_circuit to identify common problems, 3) Simplify the circuit and simulate again",
            details_with_deck(),
        )
    }
}
