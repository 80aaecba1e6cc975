use crate::component::{Component, ComponentKind};
use crate::error::{CircuitError, Result};
use crate::units::format_netlist_value;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

const SPICE_PREFIXES: &[char] = &['R', 'C', 'L', 'V', 'I', 'D', 'Q', 'M', 'J'];
const PREFIX_EXCEPTIONS: &[&str] = &["LED", "LCD", "LDR"];

/// True for the node names SPICE treats as the reference node.
pub fn is_ground_node(node: &str) -> bool {
    matches!(node.to_lowercase().as_str(), "0" | "gnd" | "ground")
}

/// A named collection of components.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Circuit {
    pub name: String,
    components: Vec<Component>,
}

impl Circuit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
        }
    }

    /// Build a circuit from the raw component list of a tool call.
    pub fn from_specs(name: impl Into<String>, specs: &[Map<String, Value>]) -> Result<Self> {
        let mut circuit = Self::new(name);
        for spec in specs {
            circuit.add_component(Component::from_json(spec)?)?;
        }
        debug!(
            "Built circuit '{}' with {} components",
            circuit.name,
            circuit.components.len()
        );
        Ok(circuit)
    }

    pub fn add_component(&mut self, component: Component) -> Result<()> {
        component.validate()?;
        if self.components.iter().any(|c| c.name == component.name) {
            return Err(CircuitError::DuplicateComponent(component.name));
        }
        self.components.push(component);
        Ok(())
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn nodes(&self) -> BTreeSet<String> {
        self.components
            .iter()
            .flat_map(|c| c.nodes.iter().cloned())
            .collect()
    }

    pub fn components_by_type(&self, kind: &ComponentKind) -> Vec<&Component> {
        self.components.iter().filter(|c| &c.kind == kind).collect()
    }

    /// Number of component terminals attached to each node.
    pub fn node_connections(&self) -> BTreeMap<String, usize> {
        let mut connections = BTreeMap::new();
        for node in self.components.iter().flat_map(|c| c.nodes.iter()) {
            *connections.entry(node.clone()).or_insert(0) += 1;
        }
        connections
    }

    pub fn has_ground(&self) -> bool {
        self.components
            .iter()
            .flat_map(|c| c.nodes.iter())
            .any(|n| is_ground_node(n))
    }

    /// Render the human-readable netlist returned by `get_circuit_info`.
    pub fn generate_netlist(&self) -> String {
        let mut lines = vec![
            format!("* Circuit: {}", self.name),
            "* Generated by Circuit Sim MCP".to_string(),
            String::new(),
        ];
        lines.extend(self.components.iter().map(component_card));
        lines.push(String::new());
        lines.push(".END".to_string());
        lines.join("\n")
    }
}

fn component_card(component: &Component) -> String {
    let name = clean_component_name(&component.name);
    let nodes = component.nodes.join(" ");
    let value = component
        .value
        .map(format_netlist_value)
        .unwrap_or_else(|| "0".to_string());
    let model = component
        .model
        .as_deref()
        .map(|m| format!(" {}", m))
        .unwrap_or_default();

    match component.kind {
        ComponentKind::Resistor => format!("R{} {} {}", name, nodes, value),
        ComponentKind::Capacitor => format!("C{} {} {}", name, nodes, value),
        ComponentKind::Inductor => format!("L{} {} {}", name, nodes, value),
        ComponentKind::VoltageSource => format!("V{} {} {}", name, nodes, value),
        ComponentKind::CurrentSource => format!("I{} {} {}", name, nodes, value),
        ComponentKind::Diode => format!("D{} {}{}", name, nodes, model),
        ComponentKind::Transistor => format!("Q{} {}{}", name, nodes, model),
        _ => format!("* Unknown component: {}", component.name),
    }
}

/// Strip a leading SPICE element letter so the card prefix is not doubled.
///
/// `R1` becomes `1`, `R_load` becomes `load`, `LED1` is left alone.
pub fn clean_component_name(name: &str) -> &str {
    if PREFIX_EXCEPTIONS.iter().any(|p| name.starts_with(p)) {
        return name;
    }

    let mut chars = name.chars();
    let (Some(first), Some(second)) = (chars.next(), chars.next()) else {
        return name;
    };
    if !SPICE_PREFIXES.contains(&first) {
        return name;
    }

    if second == '_' {
        &name[2..]
    } else if second.is_alphanumeric() {
        &name[1..]
    } else {
        name
    }
}
