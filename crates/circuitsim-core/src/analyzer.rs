//! Heuristic circuit complexity analysis.
//!
//! Scores a circuit from its component mix and node graph, then decides
//! which component types would benefit from real datasheet parameters
//! before simulation results can be trusted.

use crate::component::Component;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

const DEFAULT_WEIGHT: u32 = 3;

const SIMPLE_THRESHOLD: f64 = 5.0;
const MODERATE_THRESHOLD: f64 = 15.0;
const COMPLEX_THRESHOLD: f64 = 30.0;

const PASSIVE_TYPES: &[&str] = &["resistor", "capacitor", "inductor"];
const POWER_TYPES: &[&str] = &[
    "voltage_source",
    "current_source",
    "power_supply",
    "switching_regulator",
];
const ACTIVE_TYPES: &[&str] = &[
    "opamp",
    "transistor",
    "mosfet",
    "diode",
    "microcontroller",
    "fpga",
];

/// Complexity weight of a component type. Unknown types weigh 3.
pub fn complexity_weight(component_type: &str) -> u32 {
    match component_type {
        "resistor" | "capacitor" => 1,
        "inductor" | "diode" => 2,
        "transistor" | "mosfet" | "jfet" => 3,
        "opamp" | "operational_amplifier" => 4,
        "comparator" => 3,
        "voltage_regulator" => 4,
        "microcontroller" => 8,
        "fpga" => 10,
        "cpu" => 12,
        "voltage_source" | "current_source" => 2,
        "power_supply" => 5,
        "switching_regulator" => 6,
        "mixer" => 5,
        "oscillator" => 4,
        "pll" => 6,
        "adc" | "dac" => 5,
        "logic_gate" => 2,
        "flip_flop" => 3,
        "counter" => 4,
        "memory" => 5,
        _ => DEFAULT_WEIGHT,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
    VeryComplex,
}

impl ComplexityLevel {
    pub fn from_score(score: f64) -> Self {
        if score <= SIMPLE_THRESHOLD {
            Self::Simple
        } else if score <= MODERATE_THRESHOLD {
            Self::Moderate
        } else if score <= COMPLEX_THRESHOLD {
            Self::Complex
        } else {
            Self::VeryComplex
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
            Self::VeryComplex => "very_complex",
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex | Self::VeryComplex)
    }
}

impl fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration order is sort order: critical prompts come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptPriority {
    Critical,
    Recommended,
    Optional,
}

impl PromptPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Recommended => "recommended",
            Self::Optional => "optional",
        }
    }
}

impl fmt::Display for PromptPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityMetrics {
    pub component_count: usize,
    pub component_types: usize,
    pub node_count: usize,
    pub active_components: usize,
    pub passive_components: usize,
    pub power_components: usize,
    pub unknown_components: usize,
    pub complexity_score: f64,
    pub complexity_level: ComplexityLevel,
}

impl ComplexityMetrics {
    fn empty() -> Self {
        Self {
            component_count: 0,
            component_types: 0,
            node_count: 0,
            active_components: 0,
            passive_components: 0,
            power_components: 0,
            unknown_components: 0,
            complexity_score: 0.0,
            complexity_level: ComplexityLevel::Simple,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasheetPrompt {
    pub component_type: String,
    pub priority: PromptPriority,
    pub reason: String,
    pub impact: String,
    pub suggested_parts: Vec<String>,
    pub example_datasheets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentNeed {
    pub count: usize,
    pub has_datasheet: bool,
    pub needs_datasheet: bool,
    pub part_numbers: Vec<String>,
    pub complexity_weight: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplexityBreakdown {
    pub active: usize,
    pub passive: usize,
    pub power: usize,
    pub unknown: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComplexitySummary {
    pub level: ComplexityLevel,
    pub score: f64,
    pub component_count: usize,
    pub component_types: usize,
    pub node_count: usize,
    pub breakdown: ComplexityBreakdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasheetRecommendations {
    pub should_prompt: bool,
    pub total_prompts: usize,
    pub critical_prompts: usize,
    pub recommended_prompts: usize,
    pub prompts: Vec<DatasheetPrompt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub complexity_metrics: ComplexitySummary,
    pub datasheet_recommendations: DatasheetRecommendations,
    pub recommendations: Vec<String>,
}

struct PromptText {
    suggested_parts: &'static [&'static str],
    reason: &'static str,
    impact: &'static str,
    examples: &'static [&'static str],
}

fn prompt_text(component_type: &str) -> Option<PromptText> {
    let text = match component_type {
        "opamp" => PromptText {
            suggested_parts: &["LM741", "LM358", "OP07", "TL071", "OPA2134", "AD8066"],
            reason: "Op-amps require precise specifications for gain-bandwidth, slew rate, and offset voltage",
            impact: "Accurate frequency response, stability analysis, and noise calculations",
            examples: &["LM741.pdf", "OPA2134.pdf", "AD8066.pdf"],
        },
        "mosfet" => PromptText {
            suggested_parts: &["IRF540N", "2N7000", "BSS138", "IRF9540N", "Si7021"],
            reason: "MOSFETs need threshold voltage, Ron, and capacitance specifications",
            impact: "Proper switching analysis, power dissipation, and timing calculations",
            examples: &["IRF540N.pdf", "2N7000.pdf", "BSS138.pdf"],
        },
        "transistor" => PromptText {
            suggested_parts: &["2N2222", "2N3904", "2N3906", "BC547", "2N2907"],
            reason: "Transistors require beta, Vbe, and frequency response parameters",
            impact: "Accurate amplification, switching, and small-signal analysis",
            examples: &["2N2222.pdf", "2N3904.pdf", "BC547.pdf"],
        },
        "voltage_regulator" => PromptText {
            suggested_parts: &["LM7805", "LM317", "AMS1117", "LP2950", "TPS7A47"],
            reason: "Regulators need dropout voltage, load regulation, and thermal characteristics",
            impact: "Power supply stability, thermal management, and load capability analysis",
            examples: &["LM7805.pdf", "LM317.pdf", "AMS1117.pdf"],
        },
        "microcontroller" => PromptText {
            suggested_parts: &["ATmega328P", "STM32F103", "PIC16F877A", "ESP32", "Arduino Uno"],
            reason: "MCUs require I/O characteristics, power consumption, and timing specifications",
            impact: "Digital interface design, power budgeting, and signal integrity",
            examples: &["ATmega328P.pdf", "STM32F103.pdf", "ESP32.pdf"],
        },
        "adc" => PromptText {
            suggested_parts: &["ADS1115", "MCP3008", "AD7476", "LTC2309", "MAX1247"],
            reason: "ADCs need resolution, sampling rate, and input impedance specifications",
            impact: "Accurate signal acquisition, anti-aliasing filter design, and noise analysis",
            examples: &["ADS1115.pdf", "MCP3008.pdf", "AD7476.pdf"],
        },
        "dac" => PromptText {
            suggested_parts: &["DAC0800", "MCP4725", "AD5328", "LTC1257", "MAX5216"],
            reason: "DACs require resolution, settling time, and output characteristics",
            impact: "Signal generation accuracy, reconstruction filter design, and linearity analysis",
            examples: &["MCP4725.pdf", "AD5328.pdf", "MAX5216.pdf"],
        },
        _ => return None,
    };
    Some(text)
}

/// Capitalize the first letter of every alphabetic run: `voltage_regulator`
/// becomes `Voltage_Regulator`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[derive(Debug, Clone, Default)]
pub struct CircuitComplexityAnalyzer;

impl CircuitComplexityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze_complexity(&self, components: &[Component]) -> ComplexityMetrics {
        if components.is_empty() {
            return ComplexityMetrics::empty();
        }

        let mut score = 0.0;
        let mut active = 0;
        let mut passive = 0;
        let mut power = 0;
        let mut unknown = 0;
        let mut types = HashSet::new();
        let mut nodes = BTreeSet::new();

        for component in components {
            let component_type = component.kind.as_str();
            types.insert(component_type);
            nodes.extend(component.nodes.iter().map(String::as_str));
            score += f64::from(complexity_weight(component_type));

            if PASSIVE_TYPES.contains(&component_type) {
                passive += 1;
            } else if POWER_TYPES.contains(&component_type) {
                power += 1;
            } else if ACTIVE_TYPES.contains(&component_type) {
                active += 1;
            } else {
                unknown += 1;
            }
        }

        if nodes.len() > 20 {
            score *= 1.2;
        }
        if types.len() > 10 {
            score *= 1.1;
        }
        if active > passive {
            score *= 1.15;
        }

        ComplexityMetrics {
            component_count: components.len(),
            component_types: types.len(),
            node_count: nodes.len(),
            active_components: active,
            passive_components: passive,
            power_components: power,
            unknown_components: unknown,
            complexity_score: score,
            complexity_level: ComplexityLevel::from_score(score),
        }
    }

    /// Group components by type, in order of first appearance.
    pub fn component_needs(&self, components: &[Component]) -> Vec<(String, ComponentNeed)> {
        let mut needs: Vec<(String, ComponentNeed)> = Vec::new();

        for component in components {
            let component_type = component.kind.as_str();
            let idx = match needs.iter().position(|(t, _)| t == component_type) {
                Some(idx) => idx,
                None => {
                    needs.push((
                        component_type.to_string(),
                        ComponentNeed {
                            count: 0,
                            has_datasheet: false,
                            needs_datasheet: false,
                            part_numbers: Vec::new(),
                            complexity_weight: complexity_weight(component_type),
                        },
                    ));
                    needs.len() - 1
                }
            };

            let need = &mut needs[idx].1;
            need.count += 1;
            if component.has_datasheet() {
                need.has_datasheet = true;
                if let Some(part) = &component.part_number {
                    need.part_numbers.push(part.clone());
                }
            }
        }

        for (_, need) in needs.iter_mut() {
            need.needs_datasheet = need.complexity_weight >= 3 && !need.has_datasheet;
        }
        needs
    }

    pub fn datasheet_prompts(
        &self,
        components: &[Component],
        metrics: &ComplexityMetrics,
    ) -> Vec<DatasheetPrompt> {
        let mut prompts: Vec<DatasheetPrompt> = self
            .component_needs(components)
            .into_iter()
            .filter(|(_, need)| need.needs_datasheet)
            .map(|(component_type, need)| create_prompt(&component_type, &need, metrics))
            .collect();

        // sort_by_key is stable, so first-appearance order holds within a priority
        prompts.sort_by_key(|p| p.priority);
        prompts
    }

    pub fn should_prompt_for_datasheets(&self, metrics: &ComplexityMetrics) -> bool {
        metrics.complexity_level.is_complex()
            || metrics.active_components >= 3
            || metrics.unknown_components >= 2
            || metrics.complexity_score >= 15.0
    }

    pub fn analysis_report(&self, components: &[Component]) -> AnalysisReport {
        let metrics = self.analyze_complexity(components);
        let prompts = self.datasheet_prompts(components, &metrics);
        let should_prompt = self.should_prompt_for_datasheets(&metrics);
        let recommendations = general_recommendations(&metrics, &prompts);

        let count = |priority| prompts.iter().filter(|p| p.priority == priority).count();

        AnalysisReport {
            complexity_metrics: ComplexitySummary {
                level: metrics.complexity_level,
                score: metrics.complexity_score,
                component_count: metrics.component_count,
                component_types: metrics.component_types,
                node_count: metrics.node_count,
                breakdown: ComplexityBreakdown {
                    active: metrics.active_components,
                    passive: metrics.passive_components,
                    power: metrics.power_components,
                    unknown: metrics.unknown_components,
                },
            },
            datasheet_recommendations: DatasheetRecommendations {
                should_prompt,
                total_prompts: prompts.len(),
                critical_prompts: count(PromptPriority::Critical),
                recommended_prompts: count(PromptPriority::Recommended),
                prompts,
            },
            recommendations,
        }
    }
}

fn create_prompt(
    component_type: &str,
    need: &ComponentNeed,
    metrics: &ComplexityMetrics,
) -> DatasheetPrompt {
    let level = metrics.complexity_level;
    let priority = if level.is_complex() && need.complexity_weight >= 4 {
        PromptPriority::Critical
    } else if matches!(level, ComplexityLevel::Moderate | ComplexityLevel::Complex)
        && need.complexity_weight >= 3
    {
        PromptPriority::Recommended
    } else {
        PromptPriority::Optional
    };

    let to_strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    match prompt_text(component_type) {
        Some(text) => DatasheetPrompt {
            component_type: component_type.to_string(),
            priority,
            reason: text.reason.to_string(),
            impact: text.impact.to_string(),
            suggested_parts: to_strings(text.suggested_parts),
            example_datasheets: to_strings(text.examples),
        },
        None => DatasheetPrompt {
            component_type: component_type.to_string(),
            priority,
            reason: format!(
                "{} components benefit from datasheet specifications",
                title_case(component_type)
            ),
            impact: "More accurate simulation and design validation".to_string(),
            suggested_parts: vec![format!("Generic_{}_Part", component_type.to_uppercase())],
            example_datasheets: vec![format!("{}_datasheet.pdf", component_type)],
        },
    }
}

fn general_recommendations(metrics: &ComplexityMetrics, prompts: &[DatasheetPrompt]) -> Vec<String> {
    let mut recommendations = Vec::new();

    if metrics.complexity_level == ComplexityLevel::VeryComplex {
        recommendations.push(
            "This is a very complex circuit. Consider breaking it into smaller subcircuits for easier analysis.".to_string(),
        );
        recommendations.push(
            "Use datasheet-based components for all active devices to ensure accurate simulation."
                .to_string(),
        );
    }
    if metrics.active_components > metrics.passive_components * 2 {
        recommendations.push(
            "High ratio of active to passive components detected. Pay special attention to power supply design and signal integrity.".to_string(),
        );
    }
    if metrics.node_count > 50 {
        recommendations.push(
            "Large number of nodes detected. Consider using hierarchical design or subcircuits."
                .to_string(),
        );
    }
    if prompts.iter().any(|p| p.priority == PromptPriority::Critical) {
        recommendations.push(
            "Critical components detected that require datasheets for accurate simulation."
                .to_string(),
        );
    }
    if metrics.unknown_components > 0 {
        recommendations.push(
            "Unknown component types detected. Consider adding them to the component library."
                .to_string(),
        );
    }
    recommendations
}
