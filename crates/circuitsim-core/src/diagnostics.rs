//! Structural checks run before simulation and attached to failures.

use crate::circuit::Circuit;
use crate::component::ComponentKind;
use crate::units::format_si;
use serde::Serialize;
use serde_json::Value;

const RESISTANCE_RANGE: (f64, f64) = (0.1, 1e9);
const CAPACITANCE_RANGE: (f64, f64) = (1e-15, 1e-3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// The value cannot be simulated at all.
    Invalid,
    /// Legal but far outside the usual range.
    Extreme,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueIssue {
    pub component: String,
    pub quantity: &'static str,
    pub value: f64,
    pub severity: IssueSeverity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCount {
    pub component_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitDiagnostics {
    pub circuit_name: String,
    pub component_count: usize,
    pub node_count: usize,
    pub has_ground: bool,
    pub floating_nodes: Vec<String>,
    pub component_types: Vec<TypeCount>,
    pub has_voltage_source: bool,
    pub value_issues: Vec<ValueIssue>,
    pub netlist: String,
}

impl CircuitDiagnostics {
    pub fn inspect(circuit: &Circuit) -> Self {
        let floating_nodes = circuit
            .node_connections()
            .into_iter()
            .filter(|(_, count)| *count == 1)
            .map(|(node, _)| node)
            .collect();

        let mut component_types: Vec<TypeCount> = Vec::new();
        for component in circuit.components() {
            let ty = component.kind.as_str();
            match component_types.iter_mut().find(|t| t.component_type == ty) {
                Some(entry) => entry.count += 1,
                None => component_types.push(TypeCount {
                    component_type: ty.to_string(),
                    count: 1,
                }),
            }
        }

        let value_issues = circuit
            .components()
            .iter()
            .filter_map(|c| {
                let value = c.value?;
                match c.kind {
                    ComponentKind::Resistor => check_value(&c.name, "resistance", "Ω", value, RESISTANCE_RANGE, "0.1Ω to 1GΩ"),
                    ComponentKind::Capacitor => check_value(&c.name, "capacitance", "F", value, CAPACITANCE_RANGE, "1fF to 1mF"),
                    _ => None,
                }
            })
            .collect();

        Self {
            circuit_name: circuit.name.clone(),
            component_count: circuit.len(),
            node_count: circuit.nodes().len(),
            has_ground: circuit.has_ground(),
            floating_nodes,
            has_voltage_source: !circuit
                .components_by_type(&ComponentKind::VoltageSource)
                .is_empty(),
            component_types,
            value_issues,
            netlist: circuit.generate_netlist(),
        }
    }

    /// One line per problem found; empty when the circuit looks sound.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !self.has_ground {
            warnings.push("No ground connection found - add node 'gnd' or '0'".to_string());
        }
        if !self.floating_nodes.is_empty() {
            warnings.push(format!(
                "Floating nodes (only 1 connection): {}",
                self.floating_nodes.join(", ")
            ));
        }
        if !self.has_voltage_source {
            warnings.push(
                "No voltage sources - DC analysis needs at least one voltage source".to_string(),
            );
        }
        warnings.extend(self.value_issues.iter().map(|i| i.message.clone()));
        warnings
    }

    pub fn is_clean(&self) -> bool {
        self.has_ground
            && self.floating_nodes.is_empty()
            && self.has_voltage_source
            && self.value_issues.is_empty()
    }

    /// Plain-text report, ending with the generated netlist.
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("Circuit: {}", self.circuit_name),
            format!("Components: {}", self.component_count),
            format!("Nodes: {}", self.node_count),
            String::new(),
            "Node Analysis:".to_string(),
        ];

        if self.has_ground {
            lines.push("  ✅ Ground connection found".to_string());
        } else {
            lines.push("  ⚠️  NO GROUND CONNECTION FOUND - Add node 'gnd' or '0'".to_string());
        }
        if self.floating_nodes.is_empty() {
            lines.push("  ✅ No floating nodes detected".to_string());
        } else {
            lines.push(format!(
                "  ⚠️  Floating nodes (only 1 connection): {}",
                self.floating_nodes.join(", ")
            ));
        }
        lines.push(String::new());

        lines.push("Component Analysis:".to_string());
        for t in &self.component_types {
            lines.push(format!("  {}: {}", t.component_type, t.count));
        }
        if !self.has_voltage_source {
            lines.push(
                "  ⚠️  NO VOLTAGE SOURCES - DC analysis needs at least one voltage source"
                    .to_string(),
            );
        }
        lines.push(String::new());

        lines.push("Value Analysis:".to_string());
        if self.value_issues.is_empty() {
            lines.push("  ✅ All component values appear reasonable".to_string());
        } else {
            lines.extend(self.value_issues.iter().map(|i| format!("  ⚠️  {}", i.message)));
        }
        lines.push(String::new());

        lines.push("Generated SPICE Netlist:".to_string());
        lines.push(self.netlist.clone());
        lines.join("\n")
    }

    pub fn to_json(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.insert("warnings".into(), serde_json::json!(self.warnings()));
            map.insert("is_clean".into(), Value::Bool(self.is_clean()));
        }
        value
    }
}

fn check_value(
    name: &str,
    quantity: &'static str,
    unit: &str,
    value: f64,
    (low, high): (f64, f64),
    recommended: &str,
) -> Option<ValueIssue> {
    let (severity, message) = if value <= 0.0 {
        (
            IssueSeverity::Invalid,
            format!("{}: Invalid {} {}{} (must be > 0)", name, quantity, format_si(value), unit),
        )
    } else if value < low || value > high {
        (
            IssueSeverity::Extreme,
            format!(
                "{}: Extreme {} {}{} (recommended: {})",
                name,
                quantity,
                format_si(value),
                unit,
                recommended
            ),
        )
    } else {
        return None;
    };

    Some(ValueIssue {
        component: name.to_string(),
        quantity,
        value,
        severity,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;

    fn two_terminal(name: &str, kind: ComponentKind, a: &str, b: &str, value: f64) -> Component {
        Component::new(name, kind, vec![a.into(), b.into()]).with_value(value)
    }

    #[test]
    fn test_clean_divider() {
        let mut circuit = Circuit::new("divider");
        circuit
            .add_component(two_terminal("V1", ComponentKind::VoltageSource, "in", "0", 5.0))
            .unwrap();
        circuit
            .add_component(two_terminal("R1", ComponentKind::Resistor, "in", "out", 1e3))
            .unwrap();
        circuit
            .add_component(two_terminal("R2", ComponentKind::Resistor, "out", "0", 1e3))
            .unwrap();

        let diag = CircuitDiagnostics::inspect(&circuit);
        assert!(diag.is_clean(), "{:?}", diag.warnings());
        let report = diag.render();
        assert!(report.contains("✅ Ground connection found"));
        assert!(report.contains("resistor: 2"));
        assert!(report.ends_with(".END"));
    }

    #[test]
    fn test_problems_detected() {
        let mut circuit = Circuit::new("broken");
        circuit
            .add_component(two_terminal("R1", ComponentKind::Resistor, "a", "b", -5.0))
            .unwrap();
        circuit
            .add_component(two_terminal("C1", ComponentKind::Capacitor, "b", "c", 1.0))
            .unwrap();

        let diag = CircuitDiagnostics::inspect(&circuit);
        assert!(!diag.has_ground);
        assert!(!diag.has_voltage_source);
        assert_eq!(diag.floating_nodes, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(diag.value_issues.len(), 2);
        assert_eq!(diag.value_issues[0].severity, IssueSeverity::Invalid);
        assert_eq!(diag.value_issues[1].severity, IssueSeverity::Extreme);

        let json = diag.to_json();
        assert_eq!(json["is_clean"], false);
        assert_eq!(json["warnings"].as_array().unwrap().len(), 5);
        assert!(diag.render().contains("NO GROUND CONNECTION FOUND"));
    }
}
