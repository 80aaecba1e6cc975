//! Translation of a [`Circuit`] into an ngspice input deck.

use std::collections::{BTreeMap, BTreeSet};

use circuitsim_core::{
    clean_component_name, format_netlist_value, is_ground_node, spice_model_name, Circuit,
    Component, ComponentKind, SourceType, TransistorType,
};
use serde::Serialize;
use tracing::debug;

use crate::analysis::AnalysisRequest;

pub const DEFAULT_DIODE: &str = "DefaultDiode";
pub const DEFAULT_NPN: &str = "DefaultNPN";
pub const DEFAULT_PNP: &str = "DefaultPNP";
pub const DEFAULT_NMOS: &str = "DefaultNMOS";
pub const DEFAULT_PMOS: &str = "DefaultPMOS";

fn default_model_card(name: &str) -> Option<&'static str> {
    match name {
        DEFAULT_DIODE => Some(".model DefaultDiode D(IS=1e-14 RS=10 CJO=1e-12)"),
        DEFAULT_NPN => Some(".model DefaultNPN NPN(IS=1e-14 BF=100 VAF=100)"),
        DEFAULT_PNP => Some(".model DefaultPNP PNP(IS=1e-14 BF=100 VAF=100)"),
        DEFAULT_NMOS => Some(".model DefaultNMOS NMOS(LEVEL=1 VTO=1.0 KP=1e-3 LAMBDA=0.02)"),
        DEFAULT_PMOS => Some(".model DefaultPMOS PMOS(LEVEL=1 VTO=-1.0 KP=1e-3 LAMBDA=0.02)"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeckOptions {
    pub temperature_c: f64,
    pub nominal_temperature_c: f64,
}

impl Default for DeckOptions {
    fn default() -> Self {
        Self {
            temperature_c: 25.0,
            nominal_temperature_c: 25.0,
        }
    }
}

/// A component that had to run on a built-in model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSubstitution {
    pub component: String,
    pub requested: Option<String>,
    pub used: String,
}

/// A complete ngspice input deck plus what was lost in translation.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiceDeck {
    pub text: String,
    /// Components written as comments because ngspice has no primitive
    /// for them.
    pub skipped: Vec<String>,
    pub model_substitutions: Vec<ModelSubstitution>,
    /// Component name to SPICE element name.
    pub element_names: BTreeMap<String, String>,
}

impl SpiceDeck {
    pub fn build(circuit: &Circuit, analysis: &AnalysisRequest, options: &DeckOptions) -> Self {
        let mut builder = DeckBuilder::default();
        let cards: Vec<String> = circuit
            .components()
            .iter()
            .map(|c| builder.element_card(c))
            .collect();

        let title = single_line(&circuit.name);
        let title = if title.is_empty() {
            "circuit".to_string()
        } else {
            title
        };
        let mut lines = vec![title];
        lines.extend(builder.model_cards.iter().cloned());
        lines.extend(cards);
        lines.push(format!(
            ".options TEMP={} TNOM={}",
            format_netlist_value(options.temperature_c),
            format_netlist_value(options.nominal_temperature_c)
        ));
        lines.push(analysis.directive());
        lines.push(".end".to_string());

        debug!(
            "Built {} deck for '{}': {} cards, {} skipped",
            analysis.label(),
            circuit.name,
            circuit.len(),
            builder.skipped.len()
        );

        Self {
            text: lines.join("\n") + "\n",
            skipped: builder.skipped,
            model_substitutions: builder.substitutions,
            element_names: builder.element_names,
        }
    }

    pub fn element_name(&self, component: &str) -> Option<&str> {
        self.element_names.get(component).map(String::as_str)
    }
}

/// Collapse text onto one deck line: control characters become spaces.
pub fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Map ground aliases to SPICE node `0`.
pub fn spice_node(node: &str) -> &str {
    if is_ground_node(node) {
        "0"
    } else {
        node
    }
}

#[derive(Default)]
struct DeckBuilder {
    model_cards: Vec<String>,
    model_names: BTreeSet<String>,
    used_elements: BTreeSet<String>,
    element_names: BTreeMap<String, String>,
    skipped: Vec<String>,
    substitutions: Vec<ModelSubstitution>,
}

impl DeckBuilder {
    fn element_card(&mut self, component: &Component) -> String {
        let nodes: Vec<&str> = component.nodes.iter().map(|n| spice_node(n)).collect();
        let value = format_netlist_value(component.value.unwrap_or(0.0));

        match &component.kind {
            ComponentKind::Resistor | ComponentKind::Capacitor | ComponentKind::Inductor => {
                let prefix = match component.kind {
                    ComponentKind::Resistor => 'R',
                    ComponentKind::Capacitor => 'C',
                    _ => 'L',
                };
                let element = self.element(component, prefix);
                format!("{} {} {}", element, nodes.join(" "), value)
            }
            ComponentKind::VoltageSource | ComponentKind::CurrentSource => {
                let prefix = if component.kind == ComponentKind::VoltageSource {
                    'V'
                } else {
                    'I'
                };
                let element = self.element(component, prefix);
                format!("{} {} {}", element, nodes.join(" "), source_spec(component))
            }
            ComponentKind::Diode => {
                let model = self.resolve_model(component, DEFAULT_DIODE);
                let element = self.element(component, 'D');
                format!("{} {} {}", element, nodes.join(" "), model)
            }
            ComponentKind::Transistor | ComponentKind::Mosfet => {
                match transistor_polarity(component) {
                    polarity @ (TransistorType::Npn | TransistorType::Pnp) => {
                        let default = if polarity == TransistorType::Npn {
                            DEFAULT_NPN
                        } else {
                            DEFAULT_PNP
                        };
                        let model = self.resolve_model(component, default);
                        let element = self.element(component, 'Q');
                        format!("{} {} {}", element, nodes.join(" "), model)
                    }
                    polarity => {
                        let default = if polarity == TransistorType::Nmos {
                            DEFAULT_NMOS
                        } else {
                            DEFAULT_PMOS
                        };
                        let model = self.resolve_model(component, default);
                        let element = self.element(component, 'M');
                        // Three-terminal parts tie the bulk to the source.
                        let mut terminals = nodes.clone();
                        if terminals.len() == 3 {
                            terminals.push(nodes[2]);
                        }
                        format!("{} {} {}", element, terminals.join(" "), model)
                    }
                }
            }
            ComponentKind::OpAmp | ComponentKind::Other(_) => {
                self.skipped.push(component.name.clone());
                format!(
                    "* skipped {} ({}): no SPICE primitive",
                    single_line(&component.name),
                    single_line(component.kind.as_str())
                )
            }
        }
    }

    /// Unique element name: SPICE prefix followed by the cleaned name.
    fn element(&mut self, component: &Component, prefix: char) -> String {
        let base = format!("{}{}", prefix, clean_component_name(&component.name));
        let mut candidate = base.clone();
        let mut n = 2;
        while !self.used_elements.insert(candidate.to_lowercase()) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        self.element_names
            .insert(component.name.clone(), candidate.clone());
        candidate
    }

    /// Model name for a semiconductor, adding its `.model` card once.
    fn resolve_model(&mut self, component: &Component, default: &str) -> String {
        if let Some(card) = &component.spice_model {
            if let Some(name) = spice_model_name(card) {
                let name = name.to_string();
                if self.model_names.insert(name.to_lowercase()) {
                    self.model_cards.push(card.trim().to_string());
                }
                return name;
            }
        }

        if self.model_names.insert(default.to_lowercase()) {
            if let Some(card) = default_model_card(default) {
                self.model_cards.push(card.to_string());
            }
        }
        // A model name without a card is replaced, not left dangling.
        if let Some(requested) = &component.model {
            if !requested.eq_ignore_ascii_case(default) {
                self.substitutions.push(ModelSubstitution {
                    component: component.name.clone(),
                    requested: Some(requested.clone()),
                    used: default.to_string(),
                });
            }
        }
        default.to_string()
    }
}

fn transistor_polarity(component: &Component) -> TransistorType {
    if let Some(t) = component.transistor_type {
        return t;
    }
    let declared = component
        .parameter_str("mosfet_type")
        .and_then(TransistorType::parse);
    if let Some(t) = declared {
        return t;
    }
    let card_is_pmos = component
        .spice_model
        .as_deref()
        .map(|card| card.to_uppercase().contains(" PMOS"))
        .unwrap_or(false);
    if card_is_pmos {
        TransistorType::Pmos
    } else {
        TransistorType::Nmos
    }
}

fn source_spec(component: &Component) -> String {
    let amplitude = component.value.unwrap_or(0.0);
    let param = |key: &str, default: f64| {
        format_netlist_value(component.parameter_f64(key).unwrap_or(default))
    };

    match component.source_type.unwrap_or_default() {
        SourceType::Dc => format!("DC {}", format_netlist_value(amplitude)),
        SourceType::Ac => format!("DC 0 AC {}", format_netlist_value(amplitude)),
        SourceType::Sin => format!(
            "SIN({} {} {} {} {} {})",
            param("offset", 0.0),
            param("amplitude", amplitude),
            param("frequency", 1e3),
            param("delay", 0.0),
            param("damping", 0.0),
            param("phase", 0.0)
        ),
        SourceType::Pulse => format!(
            "PULSE({} {} {} {} {} {} {})",
            param("initial", 0.0),
            param("pulsed", amplitude),
            param("delay", 0.0),
            param("rise", 1e-9),
            param("fall", 1e-9),
            param("width", 5e-4),
            param("period", 1e-3)
        ),
    }
}
