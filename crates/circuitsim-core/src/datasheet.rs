//! Datasheet-backed component catalogue.
//!
//! The library ships with a small built-in set of common parts and can be
//! extended with `*.json` files of the form `{"components": [...]}`.

use crate::component::{Component, ComponentKind};
use crate::error::{CircuitError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

const BUILTIN_LIBRARY: &str = include_str!("../assets/component_library.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDatasheet {
    pub part_number: String,
    pub manufacturer: String,
    pub description: String,
    /// Component type this part implements, e.g. `opamp` or `mosfet`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default)]
    pub spice_model: Option<String>,
    #[serde(default)]
    pub operating_conditions: Option<BTreeMap<String, Value>>,
    #[serde(default)]
    pub package_info: Option<BTreeMap<String, String>>,
}

impl ComponentDatasheet {
    fn polarity(&self) -> Option<&str> {
        self.parameters.get("polarity").and_then(Value::as_str)
    }

    fn matches_type(&self, component_type: &str) -> bool {
        let needle = component_type.trim().to_lowercase();
        if self.description.to_lowercase().contains(&needle) {
            return true;
        }
        let normalized = ComponentKind::parse(&needle);
        self.category
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(normalized.as_str()))
    }
}

#[derive(Debug, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    components: Vec<ComponentDatasheet>,
}

/// Name of the model defined by a `.model NAME TYPE(...)` card.
pub fn spice_model_name(card: &str) -> Option<&str> {
    let mut tokens = card.split_whitespace();
    let keyword = tokens.next()?;
    if !keyword.eq_ignore_ascii_case(".model") {
        return None;
    }
    tokens.next().map(|name| name.split('(').next().unwrap_or(name))
}

struct ProfileField {
    attribute: &'static str,
    datasheet_key: Option<&'static str>,
    default: f64,
}

const fn field(attribute: &'static str, datasheet_key: Option<&'static str>, default: f64) -> ProfileField {
    ProfileField {
        attribute,
        datasheet_key,
        default,
    }
}

const OPAMP_FIELDS: &[ProfileField] = &[
    field("gain_bandwidth", Some("gain_bandwidth_hz"), 1e6),
    field("input_offset_voltage", Some("input_offset_voltage_v"), 1e-3),
    field("input_bias_current", Some("input_bias_current_a"), 1e-9),
    field("slew_rate", Some("slew_rate_v_per_s"), 1e6),
    field("supply_voltage_min", Some("supply_voltage_min_v"), -15.0),
    field("supply_voltage_max", Some("supply_voltage_max_v"), 15.0),
    field("common_mode_rejection", Some("cmrr_db"), 80.0),
];

const MOSFET_FIELDS: &[ProfileField] = &[
    field("threshold_voltage", Some("vth_v"), 2.0),
    field("drain_source_resistance", Some("rds_on_ohms"), 0.1),
    field("gate_source_capacitance", Some("cgs_f"), 1e-12),
    field("gate_drain_capacitance", Some("cgd_f"), 1e-12),
    field("max_drain_current", Some("id_max_a"), 1.0),
    field("max_drain_source_voltage", Some("vds_max_v"), 100.0),
    field("max_gate_source_voltage", Some("vgs_max_v"), 20.0),
];

const BJT_FIELDS: &[ProfileField] = &[
    field("beta", Some("hfe"), 100.0),
    field("base_emitter_voltage", Some("vbe_v"), 0.7),
    field("max_collector_current", Some("ic_max_a"), 0.1),
    field("max_collector_emitter_voltage", Some("vceo_max_v"), 40.0),
    field("transition_frequency", Some("ft_hz"), 1e8),
];

const DIODE_FIELDS: &[ProfileField] = &[
    field("forward_voltage", Some("vf_v"), 0.7),
    field("reverse_current", Some("ir_a"), 1e-9),
    field("junction_capacitance", Some("cj_f"), 1e-12),
    field("max_forward_current", Some("if_max_a"), 1.0),
    field("max_reverse_voltage", Some("vr_max_v"), 100.0),
    field("recovery_time", Some("trr_s"), 1e-9),
    field("thermal_resistance", None, 100.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeviceProfile {
    OpAmp,
    Mosfet,
    Bjt,
    Diode,
}

impl DeviceProfile {
    fn for_type(component_type: &str, datasheet: &ComponentDatasheet) -> Option<Self> {
        match component_type.trim().to_lowercase().as_str() {
            "opamp" | "operational_amplifier" => Some(Self::OpAmp),
            "mosfet" => Some(Self::Mosfet),
            "transistor" => match datasheet.polarity().map(str::to_lowercase).as_deref() {
                Some("npn") | Some("pnp") => Some(Self::Bjt),
                _ => Some(Self::Mosfet),
            },
            "diode" => Some(Self::Diode),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::OpAmp => "opamp",
            Self::Mosfet => "mosfet",
            Self::Bjt => "transistor",
            Self::Diode => "diode",
        }
    }

    fn fields(&self) -> &'static [ProfileField] {
        match self {
            Self::OpAmp => OPAMP_FIELDS,
            Self::Mosfet => MOSFET_FIELDS,
            Self::Bjt => BJT_FIELDS,
            Self::Diode => DIODE_FIELDS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DatasheetLibrary {
    components: BTreeMap<String, ComponentDatasheet>,
}

impl DatasheetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Library pre-loaded with the parts compiled into the crate.
    pub fn with_builtin() -> Result<Self> {
        let mut library = Self::new();
        let count = library.load_str(BUILTIN_LIBRARY)?;
        debug!("Loaded {} built-in datasheets", count);
        Ok(library)
    }

    pub fn load_str(&mut self, contents: &str) -> Result<usize> {
        let file: LibraryFile = serde_json::from_str(contents)?;
        let count = file.components.len();
        for datasheet in file.components {
            self.insert(datasheet);
        }
        Ok(count)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let contents = std::fs::read_to_string(path)?;
        self.load_str(&contents)
            .map_err(|e| CircuitError::library(format!("{}: {}", path.display(), e)))
    }

    /// Load every `*.json` file in `dir`. Files that fail to parse are
    /// logged and skipped.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match self.load_file(&path) {
                Ok(count) => loaded += count,
                Err(e) => warn!("Skipping component file {}: {}", path.display(), e),
            }
        }
        info!("Loaded {} datasheets from {}", loaded, dir.display());
        Ok(loaded)
    }

    pub fn insert(&mut self, datasheet: ComponentDatasheet) {
        let key = datasheet.part_number.trim().to_uppercase();
        self.components.insert(key, datasheet);
    }

    pub fn get(&self, part_number: &str) -> Option<&ComponentDatasheet> {
        self.components.get(&part_number.trim().to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDatasheet> {
        self.components.values()
    }

    pub fn search(
        &self,
        component_type: Option<&str>,
        manufacturer: Option<&str>,
        parameter_names: &[String],
    ) -> Vec<&ComponentDatasheet> {
        self.components
            .values()
            .filter(|ds| component_type.map_or(true, |t| ds.matches_type(t)))
            .filter(|ds| {
                manufacturer.map_or(true, |m| ds.manufacturer.eq_ignore_ascii_case(m.trim()))
            })
            .filter(|ds| parameter_names.iter().all(|p| ds.parameters.contains_key(p)))
            .collect()
    }

    /// Build a component from a library part.
    ///
    /// `overrides` is the caller's component spec (name, nodes and any
    /// parameter overrides). Datasheet parameters sit underneath it and
    /// profile defaults fill whatever typed attribute is still missing.
    pub fn create_datasheet_component(
        &self,
        component_type: &str,
        part_number: &str,
        overrides: &Map<String, Value>,
    ) -> Result<Component> {
        let datasheet = self
            .get(part_number)
            .ok_or_else(|| CircuitError::UnknownPart(part_number.to_string()))?;
        let profile = DeviceProfile::for_type(component_type, datasheet)
            .ok_or_else(|| CircuitError::UnsupportedComponent(component_type.to_string()))?;

        let mut spec: Map<String, Value> = datasheet
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (k, v) in overrides {
            if k != "type" && k != "component_type" && k != "part_number" {
                spec.insert(k.clone(), v.clone());
            }
        }

        for f in profile.fields() {
            if spec.contains_key(f.attribute) {
                continue;
            }
            let value = f
                .datasheet_key
                .and_then(|key| datasheet.parameters.get(key))
                .cloned()
                .unwrap_or_else(|| json!(f.default));
            spec.insert(f.attribute.to_string(), value);
        }

        let polarity = datasheet.polarity().map(str::to_lowercase);
        match profile {
            DeviceProfile::Bjt => {
                if !spec.contains_key("transistor_type") {
                    spec.insert("transistor_type".into(), json!(polarity));
                }
            }
            DeviceProfile::Mosfet => {
                if !spec.contains_key("mosfet_type") {
                    let mosfet_type = polarity.unwrap_or_else(|| "nmos".to_string());
                    spec.insert("mosfet_type".into(), json!(mosfet_type));
                }
            }
            DeviceProfile::OpAmp | DeviceProfile::Diode => {}
        }

        spec.insert("type".into(), json!(profile.kind()));
        spec.insert("part_number".into(), json!(datasheet.part_number));
        spec.insert("manufacturer".into(), json!(datasheet.manufacturer));
        if let Some(card) = &datasheet.spice_model {
            spec.insert("spice_model".into(), json!(card));
            if !spec.contains_key("model") {
                if let Some(name) = spice_model_name(card) {
                    spec.insert("model".into(), json!(name));
                }
            }
        }

        Component::from_json(&spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> DatasheetLibrary {
        DatasheetLibrary::with_builtin().expect("built-in library parses")
    }

    fn spec(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_builtin_library_parses() {
        let lib = builtin();
        assert!(lib.len() >= 10);
        assert!(lib.get("LM741").is_some());
        assert!(lib.get("lm741").is_some());
        assert!(lib.get("NOPE").is_none());
    }

    #[test]
    fn test_search_by_description_and_category() {
        let lib = builtin();
        let by_description = lib.search(Some("operational amplifier"), None, &[]);
        let by_category = lib.search(Some("opamp"), None, &[]);
        assert_eq!(by_description.len(), 4);
        assert_eq!(by_category.len(), 4);

        let ti = lib.search(Some("opamp"), Some("texas instruments"), &[]);
        assert!(ti.iter().all(|d| d.manufacturer == "Texas Instruments"));

        let with_noise = lib.search(None, None, &["noise_nv_per_rthz".to_string()]);
        assert_eq!(with_noise.len(), 1);
        assert_eq!(with_noise[0].part_number, "TL071");
    }

    #[test]
    fn test_spice_model_name() {
        assert_eq!(spice_model_name(".model 1N4148 D(IS=1n)"), Some("1N4148"));
        assert_eq!(spice_model_name(".MODEL Q1 NPN"), Some("Q1"));
        assert_eq!(spice_model_name(".model FOO(IS=1)"), Some("FOO"));
        assert_eq!(spice_model_name("R1 a b 1k"), None);
    }

    #[test]
    fn test_create_opamp_from_datasheet() {
        let lib = builtin();
        let c = lib
            .create_datasheet_component(
                "opamp",
                "lm741",
                &spec(json!({"name": "U1", "nodes": ["out", "in+", "in-", "vcc", "vee"]})),
            )
            .unwrap();

        assert_eq!(c.kind, ComponentKind::OpAmp);
        assert_eq!(c.part_number.as_deref(), Some("LM741"));
        assert_eq!(c.manufacturer.as_deref(), Some("Texas Instruments"));
        assert_eq!(c.parameter_f64("slew_rate"), Some(500000.0));
        assert_eq!(c.parameter_f64("supply_voltage_max"), Some(18.0));
        assert!(c.has_datasheet());
    }

    #[test]
    fn test_overrides_win_over_datasheet() {
        let lib = builtin();
        let c = lib
            .create_datasheet_component(
                "opamp",
                "LM741",
                &spec(json!({"name": "U1", "nodes": ["a", "b"], "slew_rate": 1.0})),
            )
            .unwrap();
        assert_eq!(c.parameter_f64("slew_rate"), Some(1.0));
    }

    #[test]
    fn test_transistor_profiles() {
        let lib = builtin();
        let mosfet = lib
            .create_datasheet_component(
                "transistor",
                "2N7000",
                &spec(json!({"name": "M1", "nodes": ["d", "g", "s"]})),
            )
            .unwrap();
        assert_eq!(mosfet.kind, ComponentKind::Mosfet);
        assert_eq!(mosfet.parameter_str("mosfet_type"), Some("nmos"));
        assert_eq!(mosfet.model.as_deref(), Some("2N7000"));
        assert_eq!(mosfet.parameter_f64("max_drain_source_voltage"), Some(60.0));

        let bjt = lib
            .create_datasheet_component(
                "transistor",
                "2N3906",
                &spec(json!({"name": "Q1", "nodes": ["c", "b", "e"]})),
            )
            .unwrap();
        assert_eq!(bjt.kind, ComponentKind::Transistor);
        assert_eq!(bjt.transistor_type.map(|t| t.as_str()), Some("pnp"));
    }

    #[test]
    fn test_diode_defaults_fill_missing() {
        let lib = builtin();
        let d = lib
            .create_datasheet_component(
                "diode",
                "1N4148",
                &spec(json!({"name": "D1", "nodes": ["a", "k"]})),
            )
            .unwrap();
        assert_eq!(d.parameter_f64("forward_voltage"), Some(0.72));
        assert_eq!(d.parameter_f64("thermal_resistance"), Some(100.0));
        assert!(d.spice_model.as_deref().unwrap().starts_with(".model 1N4148"));
    }

    #[test]
    fn test_unknown_part_and_unsupported_type() {
        let lib = builtin();
        let overrides = spec(json!({"name": "X1", "nodes": ["a", "b"]}));

        let err = lib
            .create_datasheet_component("opamp", "NOPE123", &overrides)
            .unwrap_err();
        assert!(matches!(err, CircuitError::UnknownPart(p) if p == "NOPE123"));

        let err = lib
            .create_datasheet_component("resistor", "LM741", &overrides)
            .unwrap_err();
        assert!(matches!(err, CircuitError::UnsupportedComponent(_)));
    }

    #[test]
    fn test_load_dir_skips_malformed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom.json"),
            r#"{"components": [{"part_number": "ne5532", "manufacturer": "TI",
                "description": "Dual low-noise operational amplifier",
                "parameters": {"gain_bandwidth_hz": 10000000.0}}]}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut lib = DatasheetLibrary::new();
        let loaded = lib.load_dir(dir.path()).unwrap();
        assert_eq!(loaded, 1);
        assert!(lib.get("NE5532").is_some());
    }
}
