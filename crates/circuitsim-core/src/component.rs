use crate::datasheet::spice_model_name;
use crate::error::{CircuitError, Result};
use crate::units::parse_value;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// The kind of a circuit component, taken from the `type` field of the
/// tool input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentKind {
    Resistor,
    Capacitor,
    Inductor,
    VoltageSource,
    CurrentSource,
    Diode,
    Transistor,
    OpAmp,
    Mosfet,
    Other(String),
}

impl ComponentKind {
    pub fn parse(s: &str) -> Self {
        let lowered = s.trim().to_lowercase();
        match lowered.as_str() {
            "resistor" => Self::Resistor,
            "capacitor" => Self::Capacitor,
            "inductor" => Self::Inductor,
            "voltage_source" => Self::VoltageSource,
            "current_source" => Self::CurrentSource,
            "diode" => Self::Diode,
            "transistor" => Self::Transistor,
            "opamp" | "operational_amplifier" => Self::OpAmp,
            "mosfet" => Self::Mosfet,
            "" => Self::Other("unknown".to_string()),
            _ => Self::Other(lowered),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Resistor => "resistor",
            Self::Capacitor => "capacitor",
            Self::Inductor => "inductor",
            Self::VoltageSource => "voltage_source",
            Self::CurrentSource => "current_source",
            Self::Diode => "diode",
            Self::Transistor => "transistor",
            Self::OpAmp => "opamp",
            Self::Mosfet => "mosfet",
            Self::Other(name) => name,
        }
    }

    /// Field that carries the value when `value` itself is absent.
    fn value_key(&self) -> Option<&'static str> {
        match self {
            Self::Resistor => Some("resistance"),
            Self::Capacitor => Some("capacitance"),
            Self::Inductor => Some("inductance"),
            Self::VoltageSource => Some("voltage"),
            Self::CurrentSource => Some("current"),
            _ => None,
        }
    }

    fn default_unit(&self) -> Option<&'static str> {
        match self {
            Self::Resistor => Some("Ω"),
            Self::Capacitor => Some("F"),
            Self::Inductor => Some("H"),
            Self::VoltageSource => Some("V"),
            Self::CurrentSource => Some("A"),
            Self::Diode => Some("diode"),
            _ => None,
        }
    }

    pub fn requires_value(&self) -> bool {
        self.value_key().is_some()
    }

    pub fn is_source(&self) -> bool {
        matches!(self, Self::VoltageSource | Self::CurrentSource)
    }
}

impl From<String> for ComponentKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    #[default]
    Dc,
    Ac,
    Sin,
    Pulse,
}

impl SourceType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "dc" => Some(Self::Dc),
            "ac" => Some(Self::Ac),
            "sin" | "sine" => Some(Self::Sin),
            "pulse" => Some(Self::Pulse),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dc => "DC",
            Self::Ac => "AC",
            Self::Sin => "SIN",
            Self::Pulse => "PULSE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransistorType {
    Npn,
    Pnp,
    Nmos,
    Pmos,
}

impl TransistorType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "npn" => Some(Self::Npn),
            "pnp" => Some(Self::Pnp),
            "nmos" => Some(Self::Nmos),
            "pmos" => Some(Self::Pmos),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Npn => "npn",
            Self::Pnp => "pnp",
            Self::Nmos => "nmos",
            Self::Pmos => "pmos",
        }
    }

    pub fn is_mos(&self) -> bool {
        matches!(self, Self::Nmos | Self::Pmos)
    }
}

/// A single circuit element.
///
/// Typed fields cover what the netlist writer and the simulator read. Any
/// other field supplied by the caller is kept in `parameters` and echoed
/// back by [`Component::to_json`].
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub kind: ComponentKind,
    pub nodes: Vec<String>,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub source_type: Option<SourceType>,
    pub transistor_type: Option<TransistorType>,
    pub model: Option<String>,
    pub part_number: Option<String>,
    pub manufacturer: Option<String>,
    /// A complete `.model` card supplied by a datasheet.
    pub spice_model: Option<String>,
    pub parameters: BTreeMap<String, Value>,
}

const TYPED_KEYS: &[&str] = &[
    "name",
    "type",
    "component_type",
    "nodes",
    "value",
    "unit",
    "source_type",
    "transistor_type",
    "model",
    "part_number",
    "manufacturer",
    "spice_model",
];

impl Component {
    pub fn new(name: impl Into<String>, kind: ComponentKind, nodes: Vec<String>) -> Self {
        let unit = kind.default_unit().map(str::to_string);
        Self {
            name: name.into(),
            kind,
            nodes,
            value: None,
            unit,
            source_type: None,
            transistor_type: None,
            model: None,
            part_number: None,
            manufacturer: None,
            spice_model: None,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Build a typed component from one entry of the tool input.
    pub fn from_json(data: &Map<String, Value>) -> Result<Self> {
        let name = match data.get("name") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => {
                return Err(CircuitError::invalid_component(
                    "<unnamed>",
                    "component requires a non-empty 'name'",
                ))
            }
        };

        let kind = data
            .get("type")
            .or_else(|| data.get("component_type"))
            .and_then(Value::as_str)
            .map(ComponentKind::parse)
            .unwrap_or_else(|| ComponentKind::Other("unknown".to_string()));

        let nodes = read_nodes(&name, data)?;

        let mut value = read_number(&name, data, "value")?;
        if value.is_none() {
            if let Some(key) = kind.value_key() {
                value = read_number(&name, data, key)?;
            }
        }
        if kind.requires_value() && value.is_none() {
            let key = kind.value_key().unwrap_or("value");
            return Err(CircuitError::invalid_component(
                &name,
                format!("{} requires 'value' or '{}'", kind, key),
            ));
        }

        let source_type = if kind.is_source() {
            match data.get("source_type").and_then(Value::as_str) {
                Some(raw) => Some(SourceType::parse(raw).ok_or_else(|| {
                    CircuitError::invalid_component(
                        &name,
                        format!("unknown source_type '{}' (expected DC, AC, SIN or PULSE)", raw),
                    )
                })?),
                None => Some(SourceType::Dc),
            }
        } else {
            None
        };

        let transistor_type = match data.get("transistor_type").and_then(Value::as_str) {
            Some(raw) => Some(TransistorType::parse(raw).ok_or_else(|| {
                CircuitError::invalid_component(
                    &name,
                    format!("unknown transistor_type '{}' (expected npn, pnp, nmos or pmos)", raw),
                )
            })?),
            None if kind == ComponentKind::Transistor => {
                return Err(CircuitError::invalid_component(
                    &name,
                    "transistor requires 'transistor_type'",
                ))
            }
            None => None,
        };

        let unit = read_string(data, "unit")
            .or_else(|| transistor_type.map(|t| t.as_str().to_string()))
            .or_else(|| kind.default_unit().map(str::to_string));

        let parameters = data
            .iter()
            .filter(|(k, _)| !TYPED_KEYS.contains(&k.as_str()))
            .filter(|(k, _)| kind.value_key() != Some(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let component = Self {
            name,
            kind,
            nodes,
            value,
            unit,
            source_type,
            transistor_type,
            model: read_string(data, "model"),
            part_number: read_string(data, "part_number"),
            manufacturer: read_string(data, "manufacturer"),
            spice_model: read_string(data, "spice_model"),
            parameters,
        };
        component.validate()?;
        Ok(component)
    }

    /// Check names, model cards, node names and terminal counts.
    ///
    /// Everything checked here ends up on a single deck line, so line
    /// breaks and other control characters are never accepted.
    pub fn validate(&self) -> Result<()> {
        validate_component_name(&self.name)?;
        if let ComponentKind::Other(kind) = &self.kind {
            if kind.chars().any(char::is_control) {
                return Err(CircuitError::invalid_component(
                    &self.name,
                    "component type must not contain control characters",
                ));
            }
        }
        if let Some(model) = &self.model {
            if model.chars().any(|c| c.is_whitespace() || c.is_control()) {
                return Err(CircuitError::invalid_component(
                    &self.name,
                    "model name must be a single token",
                ));
            }
        }
        if let Some(card) = &self.spice_model {
            validate_model_card(&self.name, card)?;
        }

        if self.nodes.is_empty() {
            return Err(CircuitError::invalid_component(
                &self.name,
                "component requires at least one node",
            ));
        }
        for node in &self.nodes {
            validate_node_name(node)?;
        }

        let count = self.nodes.len();
        let (ok, expected) = match &self.kind {
            ComponentKind::Resistor
            | ComponentKind::Capacitor
            | ComponentKind::Inductor
            | ComponentKind::VoltageSource
            | ComponentKind::CurrentSource
            | ComponentKind::Diode => (count == 2, "2"),
            ComponentKind::Transistor => match self.transistor_type {
                Some(t) if t.is_mos() => ((3..=4).contains(&count), "3 or 4"),
                _ => (count == 3, "3"),
            },
            ComponentKind::Mosfet => ((3..=4).contains(&count), "3 or 4"),
            ComponentKind::OpAmp | ComponentKind::Other(_) => (true, ""),
        };
        if !ok {
            return Err(CircuitError::invalid_component(
                &self.name,
                format!("{} expects {} nodes, got {}", self.kind, expected, count),
            ));
        }

        if let Some(v) = self.value {
            if !v.is_finite() {
                return Err(CircuitError::invalid_component(
                    &self.name,
                    "value must be a finite number",
                ));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".into(), Value::String(self.name.clone()));
        map.insert("type".into(), Value::String(self.kind.to_string()));
        map.insert(
            "nodes".into(),
            Value::Array(self.nodes.iter().cloned().map(Value::String).collect()),
        );
        map.insert(
            "value".into(),
            self.value
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        );
        map.insert(
            "unit".into(),
            self.unit.clone().map(Value::String).unwrap_or(Value::Null),
        );

        if let Some(st) = self.source_type {
            map.insert("source_type".into(), Value::String(st.as_str().into()));
        }
        if let Some(tt) = self.transistor_type {
            map.insert("transistor_type".into(), Value::String(tt.as_str().into()));
        }
        for (key, field) in [
            ("model", &self.model),
            ("part_number", &self.part_number),
            ("manufacturer", &self.manufacturer),
            ("spice_model", &self.spice_model),
        ] {
            if let Some(v) = field {
                map.insert(key.into(), Value::String(v.clone()));
            }
        }
        for (k, v) in &self.parameters {
            map.entry(k.clone()).or_insert_with(|| v.clone());
        }
        Value::Object(map)
    }

    /// True when the component was built from a real datasheet part.
    pub fn has_datasheet(&self) -> bool {
        match &self.part_number {
            Some(part) => {
                let upper = part.trim().to_uppercase();
                !upper.is_empty() && upper != "GENERIC" && !upper.starts_with("GENERIC_")
            }
            None => false,
        }
    }

    /// Numeric extra parameter, accepting numbers or SPICE value strings.
    pub fn parameter_f64(&self, key: &str) -> Option<f64> {
        match self.parameters.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_value(s),
            _ => None,
        }
    }

    pub fn parameter_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }
}

/// Component names become SPICE element names and must be one token.
pub fn validate_component_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(CircuitError::invalid_component(
            name.escape_debug().to_string(),
            "component names must be non-empty and free of whitespace and control characters",
        ));
    }
    Ok(())
}

/// A user supplied model card must be exactly one `.model NAME ...` line.
pub fn validate_model_card(component: &str, card: &str) -> Result<()> {
    let card = card.trim();
    if card.chars().any(char::is_control) || spice_model_name(card).is_none() {
        return Err(CircuitError::invalid_component(
            component,
            "spice_model must be a single '.model NAME TYPE(...)' line",
        ));
    }
    Ok(())
}

pub fn validate_node_name(node: &str) -> Result<()> {
    let bad = node.is_empty()
        || node.chars().any(|c| {
            c.is_whitespace() || c.is_control() || matches!(c, '(' | ')' | '=' | ',')
        });
    if bad {
        return Err(CircuitError::InvalidNode(node.to_string()));
    }
    Ok(())
}

fn read_nodes(name: &str, data: &Map<String, Value>) -> Result<Vec<String>> {
    let raw = data
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or_else(|| CircuitError::invalid_component(name, "component requires a 'nodes' list"))?;

    raw.iter()
        .map(|node| match node {
            Value::String(s) => Ok(s.trim().to_string()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(CircuitError::invalid_component(
                name,
                format!("node {} is not a string", other),
            )),
        })
        .collect()
}

fn read_number(name: &str, data: &Map<String, Value>, key: &str) -> Result<Option<f64>> {
    let parsed = match data.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_value(s),
        Some(_) => None,
    };
    match parsed {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(CircuitError::invalid_component(
            name,
            format!("'{}' is not a valid number", key),
        )),
    }
}

fn read_string(data: &Map<String, Value>, key: &str) -> Option<String> {
    data.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_resistor_from_resistance_field() {
        let c = Component::from_json(&spec(json!({
            "type": "resistor", "name": "R1", "nodes": ["n1", "n2"], "resistance": 1000.0
        })))
        .unwrap();

        assert_eq!(c.kind, ComponentKind::Resistor);
        assert_eq!(c.value, Some(1000.0));
        assert_eq!(c.unit.as_deref(), Some("Ω"));
        assert!(c.parameters.is_empty());
    }

    #[test]
    fn test_value_string_with_suffix() {
        let c = Component::from_json(&spec(json!({
            "type": "capacitor", "name": "C1", "nodes": ["a", "0"], "value": "100n"
        })))
        .unwrap();
        assert!((c.value.unwrap() - 100e-9).abs() < 1e-18);
        assert_eq!(c.unit.as_deref(), Some("F"));
    }

    #[test]
    fn test_voltage_source_defaults_to_dc() {
        let c = Component::from_json(&spec(json!({
            "type": "voltage_source", "name": "V1", "nodes": ["n1", "0"], "voltage": 5.0
        })))
        .unwrap();
        assert_eq!(c.source_type, Some(SourceType::Dc));
        assert_eq!(c.unit.as_deref(), Some("V"));
    }

    #[test]
    fn test_missing_value_rejected() {
        let err = Component::from_json(&spec(json!({
            "type": "resistor", "name": "R1", "nodes": ["n1", "n2"]
        })))
        .unwrap_err();
        assert!(matches!(err, CircuitError::InvalidComponent { .. }));
    }

    #[test]
    fn test_node_count_enforced() {
        let err = Component::from_json(&spec(json!({
            "type": "resistor", "name": "R1", "nodes": ["n1"], "value": 1.0
        })))
        .unwrap_err();
        assert!(err.to_string().contains("expects 2 nodes"));

        let ok = Component::from_json(&spec(json!({
            "type": "transistor", "name": "M1", "nodes": ["d", "g", "s", "0"],
            "transistor_type": "nmos"
        })));
        assert!(ok.is_ok());

        let err = Component::from_json(&spec(json!({
            "type": "transistor", "name": "Q1", "nodes": ["c", "b", "e", "0"],
            "transistor_type": "npn"
        })));
        assert!(err.is_err());
    }

    #[test]
    fn test_transistor_unit_follows_type() {
        let c = Component::from_json(&spec(json!({
            "type": "transistor", "name": "Q1", "nodes": ["c", "b", "e"],
            "transistor_type": "NPN", "model": "2N2222"
        })))
        .unwrap();
        assert_eq!(c.transistor_type, Some(TransistorType::Npn));
        assert_eq!(c.unit.as_deref(), Some("npn"));
        assert_eq!(c.model.as_deref(), Some("2N2222"));
    }

    #[test]
    fn test_bad_node_names() {
        for node in ["", "a b", "v(out)", "x=1", "a,b"] {
            let result = Component::from_json(&spec(json!({
                "type": "resistor", "name": "R1", "nodes": [node, "0"], "value": 1.0
            })));
            assert!(matches!(result, Err(CircuitError::InvalidNode(_))), "{node:?}");
        }
        // Host-language keywords are fine as SPICE node names.
        assert!(validate_node_name("in").is_ok());
        assert!(validate_node_name("class").is_ok());
    }

    #[test]
    fn test_component_names_are_single_tokens() {
        for name in ["R 1", "R1\n.control", "R1\u{7}"] {
            let err = Component::from_json(&spec(json!({
                "type": "resistor", "name": name, "nodes": ["a", "0"], "value": 1.0
            })))
            .unwrap_err();
            assert!(matches!(err, CircuitError::InvalidComponent { .. }), "{name:?}");
        }
        assert!(validate_component_name("R_load").is_ok());
        assert!(validate_node_name("a\u{0}").is_err());
    }

    #[test]
    fn test_spice_model_must_be_one_model_line() {
        let diode = |card: &str| {
            Component::from_json(&spec(json!({
                "type": "diode", "name": "D1", "nodes": ["a", "0"], "spice_model": card
            })))
        };
        assert!(diode(".model DX D(IS=1e-14)").is_ok());
        assert!(diode(".model DX D\n.control\nshell id\n.endc").is_err());
        assert!(diode(".control").is_err());
        assert!(diode("R9 a b 1k").is_err());
    }

    #[test]
    fn test_model_and_type_reject_line_breaks() {
        let err = Component::from_json(&spec(json!({
            "type": "diode", "name": "D1", "nodes": ["a", "0"], "model": "DX\n.endc"
        })));
        assert!(err.is_err());

        let err = Component::from_json(&spec(json!({
            "type": "pll\n.control", "name": "U1", "nodes": ["a", "0"]
        })));
        assert!(err.is_err());
    }

    #[test]
    fn test_extra_fields_round_trip() {
        let c = Component::from_json(&spec(json!({
            "type": "opamp", "name": "U1", "nodes": ["in", "out", "vcc", "vee"],
            "gain": 100000.0
        })))
        .unwrap();
        assert_eq!(c.kind, ComponentKind::OpAmp);
        assert_eq!(c.parameter_f64("gain"), Some(100000.0));

        let out = c.to_json();
        assert_eq!(out["type"], "opamp");
        assert_eq!(out["gain"], 100000.0);
        assert_eq!(out["value"], Value::Null);
    }

    #[test]
    fn test_operational_amplifier_alias() {
        assert_eq!(ComponentKind::parse("Operational_Amplifier"), ComponentKind::OpAmp);
        assert_eq!(
            ComponentKind::parse("PLL"),
            ComponentKind::Other("pll".to_string())
        );
    }

    #[test]
    fn test_has_datasheet() {
        let mut c = Component::new("U1", ComponentKind::OpAmp, vec!["a".into()]);
        assert!(!c.has_datasheet());
        c.part_number = Some("GENERIC".into());
        assert!(!c.has_datasheet());
        c.part_number = Some("GENERIC_OPAMP".into());
        assert!(!c.has_datasheet());
        c.part_number = Some("LM741".into());
        assert!(c.has_datasheet());
    }
}
