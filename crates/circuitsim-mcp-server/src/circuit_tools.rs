use circuitsim_core::{
    title_case, Circuit, CircuitComplexityAnalyzer, CircuitDiagnostics, Component, ComponentKind,
    ComplexityLevel, DatasheetLibrary, DatasheetPrompt, IssueSeverity, PromptPriority,
};
use circuitsim_spice::{
    AnalysisRequest, CircuitSimulator, DeckOptions, NgspiceConfig, NgspiceEngine,
    SimulationResults, SpiceEngine,
};
use dashmap::{mapref::entry::Entry, DashMap};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

use crate::{Result, ServerConfig, ServerError};

const GUIDANCE_WARNING: &str =
    "Simulation accuracy may be limited without proper component datasheets.";
const NO_PROMPTS_MESSAGE: &str = "No datasheet uploads needed - circuit uses simple components or already has sufficient datasheet information.";

/// Circuit store, datasheet library and simulator behind the MCP tools.
///
/// Every tool method returns the JSON body of its response.
pub struct CircuitTools {
    config: ServerConfig,
    circuits: DashMap<String, Circuit>,
    /// Serializes admission of new circuit names against `max_circuits`.
    admission: Mutex<()>,
    library: Arc<DatasheetLibrary>,
    analyzer: CircuitComplexityAnalyzer,
    simulator: CircuitSimulator,
}

impl CircuitTools {
    /// Tools backed by the ngspice executable named in the configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let engine = NgspiceEngine::new(NgspiceConfig {
            executable: config.simulator.ngspice_path.clone(),
            timeout_secs: config.simulator.timeout_secs,
        });
        Self::with_engine(config, Arc::new(engine))
    }

    pub fn with_engine(config: ServerConfig, engine: Arc<dyn SpiceEngine>) -> Result<Self> {
        config.validate()?;

        let mut library = DatasheetLibrary::with_builtin()?;
        if let Some(dir) = &config.library.datasheet_dir {
            library.load_dir(dir)?;
        }

        let simulator = CircuitSimulator::new(engine).with_options(DeckOptions {
            temperature_c: config.simulator.temperature_c,
            nominal_temperature_c: config.simulator.nominal_temperature_c,
        });

        Ok(Self {
            config,
            circuits: DashMap::new(),
            admission: Mutex::new(()),
            library: Arc::new(library),
            analyzer: CircuitComplexityAnalyzer::new(),
            simulator,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn library(&self) -> &DatasheetLibrary {
        &self.library
    }

    pub fn simulator(&self) -> &CircuitSimulator {
        &self.simulator
    }

    pub fn circuit_count(&self) -> usize {
        self.circuits.len()
    }

    /// A snapshot of a stored circuit.
    pub fn circuit(&self, name: &str) -> Result<Circuit> {
        self.circuits
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ServerError::circuit_not_found(name))
    }

    fn check_component_limit(&self, count: usize) -> Result<()> {
        let max = self.config.limits.max_components_per_circuit;
        if count > max {
            return Err(ServerError::limit_exceeded(format!(
                "circuit has {} components; the limit is {}",
                count, max
            )));
        }
        Ok(())
    }

    /// Insert or replace a circuit. Replacing never counts against
    /// `max_circuits`; new names are admitted one at a time so concurrent
    /// creates cannot overshoot the limit.
    fn store(&self, circuit: Circuit) -> Result<()> {
        if let Some(mut existing) = self.circuits.get_mut(&circuit.name) {
            debug!("Replacing circuit '{}'", circuit.name);
            *existing = circuit;
            return Ok(());
        }

        let max = self.config.limits.max_circuits;
        let _admission = self.admission.lock().unwrap_or_else(|e| e.into_inner());
        // Counted before taking the entry: len() locks every shard.
        let stored = self.circuits.len();
        match self.circuits.entry(circuit.name.clone()) {
            Entry::Occupied(mut entry) => {
                debug!("Replacing circuit '{}'", circuit.name);
                entry.insert(circuit);
            }
            Entry::Vacant(entry) => {
                if stored >= max {
                    return Err(ServerError::limit_exceeded(format!(
                        "{} circuits are stored; the limit is {}. Re-use an existing name to replace a circuit",
                        stored, max
                    )));
                }
                entry.insert(circuit);
            }
        }
        Ok(())
    }

    fn build_circuit(&self, name: &str, components: &[Map<String, Value>]) -> Result<Circuit> {
        check_circuit_name(name)?;
        self.check_component_limit(components.len())?;
        Ok(Circuit::from_specs(name, components)?)
    }

    pub fn create_circuit(&self, name: &str, components: &[Map<String, Value>]) -> Result<Value> {
        let circuit = self.build_circuit(name, components)?;
        let count = circuit.len();
        self.store(circuit)?;
        info!("Created circuit '{}' with {} components", name, count);

        Ok(json!({
            "success": true,
            "circuit_name": name,
            "component_count": count,
            "message": format!("Circuit '{}' created successfully with {} components", name, count),
        }))
    }

    pub fn create_smart_circuit(
        &self,
        name: &str,
        components: &[Map<String, Value>],
    ) -> Result<Value> {
        let circuit = self.build_circuit(name, components)?;
        let report = self.analyzer.analysis_report(circuit.components());
        let count = circuit.len();
        self.store(circuit)?;
        info!(
            "Created smart circuit '{}' ({} components, {})",
            name, count, report.complexity_metrics.level
        );

        let user_prompts = report
            .datasheet_recommendations
            .should_prompt
            .then(|| format_user_prompts(&report.datasheet_recommendations.prompts));
        let mut response = json!({
            "success": true,
            "circuit_name": name,
            "component_count": count,
            "message": format!("Smart circuit '{}' created successfully", name),
            "complexity_analysis": report.complexity_metrics,
            "datasheet_recommendations": report.datasheet_recommendations,
            "design_recommendations": report.recommendations,
        });
        if let Some(prompts) = user_prompts {
            response["user_prompts"] = json!(prompts);
        }
        Ok(response)
    }

    /// Components carrying a `part_number` are built from the datasheet
    /// library; the rest are taken as given.
    pub fn create_datasheet_circuit(
        &self,
        name: &str,
        components: &[Map<String, Value>],
    ) -> Result<Value> {
        check_circuit_name(name)?;
        self.check_component_limit(components.len())?;

        let mut circuit = Circuit::new(name);
        let mut details = Vec::with_capacity(components.len());
        for spec in components {
            let part_number = spec
                .get("part_number")
                .and_then(Value::as_str)
                .filter(|part| !is_generic_part(part));
            let component = match part_number {
                Some(part) => {
                    let component_type = spec
                        .get("type")
                        .or_else(|| spec.get("component_type"))
                        .and_then(Value::as_str)
                        .ok_or_else(|| {
                            ServerError::invalid_input(format!(
                                "component with part_number '{}' needs a type",
                                part
                            ))
                        })?;
                    self.library
                        .create_datasheet_component(component_type, part, spec)?
                }
                None => Component::from_json(spec)?,
            };

            let datasheet = component
                .part_number
                .as_deref()
                .and_then(|part| self.library.get(part));
            details.push(json!({
                "name": component.name,
                "part_number": component.part_number.as_deref().unwrap_or("Generic"),
                "manufacturer": datasheet
                    .map(|ds| ds.manufacturer.as_str())
                    .or(component.manufacturer.as_deref())
                    .unwrap_or("Generic"),
                "datasheet_loaded": datasheet.is_some(),
                "parameters": component.to_json(),
            }));
            circuit.add_component(component)?;
        }

        self.store(circuit)?;
        info!(
            "Created datasheet circuit '{}' with {} components",
            name,
            details.len()
        );

        Ok(json!({
            "success": true,
            "circuit_name": name,
            "component_count": details.len(),
            "components": details,
            "message": format!("Datasheet circuit '{}' created successfully", name),
        }))
    }

    pub fn analyze_circuit_complexity(&self, circuit_name: &str) -> Result<Value> {
        let circuit = self.circuit(circuit_name)?;
        let report = self.analyzer.analysis_report(circuit.components());
        debug!(
            "Complexity of '{}': {} ({:.1})",
            circuit_name, report.complexity_metrics.level, report.complexity_metrics.score
        );

        let user_prompts = report
            .datasheet_recommendations
            .should_prompt
            .then(|| format_user_prompts(&report.datasheet_recommendations.prompts));
        let mut response = json!({
            "success": true,
            "circuit_name": circuit_name,
            "analysis": report,
        });
        if let Some(prompts) = user_prompts {
            response["user_prompts"] = json!(prompts);
        }
        Ok(response)
    }

    pub fn get_datasheet_prompts(&self, circuit_name: &str, detailed: bool) -> Result<Value> {
        let circuit = self.circuit(circuit_name)?;
        let metrics = self.analyzer.analyze_complexity(circuit.components());
        let prompts = self.analyzer.datasheet_prompts(circuit.components(), &metrics);

        if prompts.is_empty() {
            return Ok(json!({
                "success": true,
                "circuit_name": circuit_name,
                "message": NO_PROMPTS_MESSAGE,
                "prompts": [],
            }));
        }

        let critical = count_priority(&prompts, PromptPriority::Critical);
        let recommended = count_priority(&prompts, PromptPriority::Recommended);
        let formatted: Vec<Value> = if detailed {
            prompts.iter().map(detailed_prompt).collect()
        } else {
            prompts
                .iter()
                .map(|p| {
                    json!(format!(
                        "{}: {} - {}",
                        p.priority.as_str().to_uppercase(),
                        p.component_type,
                        p.reason
                    ))
                })
                .collect()
        };

        Ok(json!({
            "success": true,
            "circuit_name": circuit_name,
            "complexity_level": metrics.complexity_level,
            "total_prompts": prompts.len(),
            "critical_count": critical,
            "recommended_count": recommended,
            "message": prompt_message(metrics.complexity_level, prompts.len(), critical),
            "prompts": formatted,
        }))
    }

    pub fn validate_circuit(&self, circuit_name: &str) -> Result<Value> {
        let circuit = self.circuit(circuit_name)?;
        let diagnostics = CircuitDiagnostics::inspect(&circuit);
        if !diagnostics.is_clean() {
            debug!(
                "Circuit '{}' has {} diagnostic warnings",
                circuit_name,
                diagnostics.warnings().len()
            );
        }

        let mut response = diagnostics.to_json();
        response["success"] = json!(true);
        Ok(response)
    }

    /// Check datasheet coverage and operating limits per component.
    pub fn validate_circuit_design(&self, circuit_name: &str) -> Result<Value> {
        let circuit = self.circuit(circuit_name)?;
        let mut warnings = Vec::new();
        let mut results = Vec::with_capacity(circuit.len());

        for component in circuit.components() {
            let mut entry = json!({
                "component": component.name,
                "type": component.kind.as_str(),
            });

            match component.part_number.as_deref().filter(|_| component.has_datasheet()) {
                Some(part) => match self.library.get(part) {
                    Some(datasheet) => {
                        entry["datasheet_available"] = json!(true);
                        entry["manufacturer"] = json!(datasheet.manufacturer);
                        insert_rating_checks(&mut entry, component);
                        entry["status"] = json!("validated");
                    }
                    None => {
                        entry["datasheet_available"] = json!(false);
                        entry["status"] = json!("datasheet_missing");
                        warnings.push(format!(
                            "No datasheet found for {} ({})",
                            component.name, part
                        ));
                    }
                },
                None => {
                    entry["datasheet_available"] = json!(false);
                    entry["status"] = json!("generic_component");
                }
            }
            results.push(entry);
        }

        let errors: Vec<String> = CircuitDiagnostics::inspect(&circuit)
            .value_issues
            .into_iter()
            .filter(|issue| issue.severity == IssueSeverity::Invalid)
            .map(|issue| issue.message)
            .collect();

        Ok(json!({
            "success": true,
            "circuit_name": circuit_name,
            "validation_results": results,
            "warnings": warnings,
            "errors": errors,
            "overall_status": if errors.is_empty() { "valid" } else { "invalid" },
        }))
    }

    pub fn optimize_circuit_design(
        &self,
        circuit_name: &str,
        goals: &[String],
        constraints: Option<&Map<String, Value>>,
    ) -> Result<Value> {
        let circuit = self.circuit(circuit_name)?;
        let manufacturer = constraints
            .and_then(|c| c.get("manufacturer"))
            .and_then(Value::as_str);
        let reason = recommendation_reason(goals);

        let mut recommendations = Vec::new();
        for component in circuit.components().iter().filter(|c| c.has_datasheet()) {
            let Some(current) = component.part_number.as_deref() else {
                continue;
            };
            let candidates = self
                .library
                .search(Some(component.kind.as_str()), manufacturer, &[]);
            if candidates.len() <= 1 {
                continue;
            }
            let alternatives: Vec<&str> = candidates
                .iter()
                .map(|ds| ds.part_number.as_str())
                .filter(|part| !part.eq_ignore_ascii_case(current))
                .take(3)
                .collect();
            if alternatives.is_empty() {
                continue;
            }
            recommendations.push(json!({
                "component": component.name,
                "current_component": current,
                "alternatives": alternatives,
                "optimization_for": goals,
                "recommendation_reason": reason,
            }));
        }

        Ok(json!({
            "success": true,
            "circuit_name": circuit_name,
            "optimization_goals": goals,
            "constraints": constraints,
            "recommendations": recommendations,
            "message": format!("Generated {} optimization recommendations", recommendations.len()),
        }))
    }

    pub fn search_components(
        &self,
        component_type: Option<&str>,
        manufacturer: Option<&str>,
        parameter_filters: Option<&Map<String, Value>>,
    ) -> Result<Value> {
        let names: Vec<String> = parameter_filters
            .map(|filters| filters.keys().cloned().collect())
            .unwrap_or_default();
        let components: Vec<Value> = self
            .library
            .search(component_type, manufacturer, &names)
            .into_iter()
            .map(|ds| {
                json!({
                    "part_number": ds.part_number,
                    "manufacturer": ds.manufacturer,
                    "description": ds.description,
                    "parameters": ds.parameters,
                    "package": ds.package_info,
                })
            })
            .collect();

        Ok(json!({
            "success": true,
            "results_count": components.len(),
            "components": components,
        }))
    }

    pub fn get_component_datasheet(&self, part_number: &str) -> Result<Value> {
        let datasheet = self.library.get(part_number).ok_or_else(|| {
            ServerError::not_found(format!("Component {} not found in library", part_number))
        })?;

        Ok(json!({
            "success": true,
            "part_number": datasheet.part_number,
            "manufacturer": datasheet.manufacturer,
            "description": datasheet.description,
            "category": datasheet.category,
            "parameters": datasheet.parameters,
            "spice_model": datasheet.spice_model,
            "operating_conditions": datasheet.operating_conditions,
            "package_info": datasheet.package_info,
        }))
    }

    /// Run one analysis on a stored circuit after enforcing point limits.
    pub async fn simulate(
        &self,
        circuit_name: &str,
        analysis: &AnalysisRequest,
        output_nodes: Option<&[String]>,
    ) -> Result<Value> {
        let circuit = self.circuit(circuit_name)?;
        analysis.validate()?;
        self.check_points(analysis)?;

        info!("Running {} analysis of '{}'", analysis.label(), circuit_name);
        let results = self
            .simulator
            .simulate(&circuit, analysis, output_nodes)
            .await
            .map_err(|e| {
                warn!("{} analysis of '{}' failed: {}", analysis.label(), circuit_name, e);
                e
            })?;

        Ok(simulation_response(circuit_name, analysis, &results))
    }

    fn check_points(&self, analysis: &AnalysisRequest) -> Result<()> {
        let limits = &self.config.limits;
        let (points, max) = match analysis {
            AnalysisRequest::Dc => return Ok(()),
            AnalysisRequest::Ac { .. } => (analysis.estimated_points(), limits.max_ac_points),
            AnalysisRequest::Transient { .. } => {
                (analysis.estimated_points(), limits.max_transient_points)
            }
        };
        if points > max as u64 {
            return Err(ServerError::limit_exceeded(format!(
                "{} analysis would produce about {} points; the limit is {}",
                analysis.label(),
                points,
                max
            )));
        }
        Ok(())
    }

    pub async fn simulate_dc(
        &self,
        circuit_name: &str,
        output_nodes: Option<&[String]>,
    ) -> Result<Value> {
        self.simulate(circuit_name, &AnalysisRequest::Dc, output_nodes)
            .await
    }

    pub async fn simulate_ac(
        &self,
        circuit_name: &str,
        start_freq: f64,
        stop_freq: f64,
        num_points: u32,
        output_nodes: Option<&[String]>,
    ) -> Result<Value> {
        let analysis = AnalysisRequest::ac(start_freq, stop_freq, num_points);
        self.simulate(circuit_name, &analysis, output_nodes).await
    }

    pub async fn simulate_transient(
        &self,
        circuit_name: &str,
        duration: f64,
        step_size: f64,
        output_nodes: Option<&[String]>,
    ) -> Result<Value> {
        let analysis = AnalysisRequest::transient(step_size, duration);
        self.simulate(circuit_name, &analysis, output_nodes).await
    }

    /// Simulate and, when the circuit would benefit, attach datasheet
    /// guidance with a confidence estimate.
    pub async fn simulate_with_guidance(
        &self,
        request: &crate::requests::SimulateWithGuidanceRequest,
    ) -> Result<Value> {
        let analysis = match request.analysis_type.trim().to_lowercase().as_str() {
            "dc" => AnalysisRequest::Dc,
            "ac" => AnalysisRequest::ac(
                request.start_freq.unwrap_or(1.0),
                request.stop_freq.unwrap_or(1e6),
                request.num_points.unwrap_or(50),
            ),
            "transient" | "tran" => AnalysisRequest::transient(
                request.step_size.unwrap_or(1e-6),
                request.duration.unwrap_or(1e-3),
            ),
            other => {
                return Err(ServerError::invalid_input(format!(
                    "Unsupported analysis type: {}",
                    other
                )))
            }
        };

        let circuit = self.circuit(&request.circuit_name)?;
        let mut response = Map::new();
        response.insert("success".into(), json!(true));
        response.insert("circuit_name".into(), json!(request.circuit_name));

        if request.auto_prompt_datasheets {
            let metrics = self.analyzer.analyze_complexity(circuit.components());
            let prompts = self.analyzer.datasheet_prompts(circuit.components(), &metrics);
            if !prompts.is_empty() {
                response.insert(
                    "datasheet_guidance".into(),
                    json!({
                        "complexity_level": metrics.complexity_level,
                        "simulation_confidence": simulation_confidence(circuit.components()),
                        "recommendations": format_user_prompts(&prompts),
                        "warning": GUIDANCE_WARNING,
                    }),
                );
            }
        }

        let simulation = self
            .simulate(&request.circuit_name, &analysis, request.output_nodes.as_deref())
            .await?;
        if let Value::Object(fields) = simulation {
            response.extend(fields);
        }
        Ok(Value::Object(response))
    }

    pub fn list_circuits(&self) -> Result<Value> {
        let mut circuits: Vec<(String, Value)> = self
            .circuits
            .iter()
            .map(|entry| {
                let circuit = entry.value();
                (
                    circuit.name.clone(),
                    json!({
                        "name": circuit.name,
                        "component_count": circuit.len(),
                        "nodes": circuit.nodes(),
                    }),
                )
            })
            .collect();
        circuits.sort_by(|a, b| a.0.cmp(&b.0));
        let circuits: Vec<Value> = circuits.into_iter().map(|(_, v)| v).collect();

        Ok(json!({
            "success": true,
            "total_circuits": circuits.len(),
            "circuits": circuits,
        }))
    }

    pub fn get_circuit_info(&self, circuit_name: &str) -> Result<Value> {
        let circuit = self.circuit(circuit_name)?;
        let components: Vec<Value> = circuit.components().iter().map(Component::to_json).collect();

        Ok(json!({
            "success": true,
            "circuit_name": circuit_name,
            "components": components,
            "nodes": circuit.nodes(),
            "component_count": circuit.len(),
            "netlist": circuit.generate_netlist(),
        }))
    }
}

fn check_circuit_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ServerError::invalid_input("circuit name must not be empty"));
    }
    if name.chars().any(char::is_control) {
        return Err(ServerError::invalid_input(
            "circuit name must not contain line breaks or other control characters",
        ));
    }
    Ok(())
}

fn is_generic_part(part: &str) -> bool {
    let upper = part.trim().to_uppercase();
    upper.is_empty() || upper == "GENERIC" || upper.starts_with("GENERIC_")
}

fn count_priority(prompts: &[DatasheetPrompt], priority: PromptPriority) -> usize {
    prompts.iter().filter(|p| p.priority == priority).count()
}

fn simulation_response(
    circuit_name: &str,
    analysis: &AnalysisRequest,
    results: &SimulationResults,
) -> Value {
    let mut response = json!({
        "success": true,
        "circuit_name": circuit_name,
        "analysis_type": results.analysis_type,
        "results": results.to_json(),
        "message": format!("{} simulation completed successfully", analysis.label()),
    });
    match analysis {
        AnalysisRequest::Dc => {}
        AnalysisRequest::Ac {
            start_hz, stop_hz, ..
        } => {
            response["frequency_range"] = json!([start_hz, stop_hz]);
        }
        AnalysisRequest::Transient { step_s, stop_s } => {
            response["duration"] = json!(stop_s);
            response["step_size"] = json!(step_s);
        }
    }
    response
}

/// Datasheet ratings worth surfacing next to a validated part.
fn insert_rating_checks(entry: &mut Value, component: &Component) {
    let is_mos = component
        .transistor_type
        .as_ref()
        .map(|t| t.is_mos())
        .unwrap_or(false);
    match &component.kind {
        ComponentKind::OpAmp => {
            if let (Some(min), Some(max)) = (
                component.parameter_f64("supply_voltage_min"),
                component.parameter_f64("supply_voltage_max"),
            ) {
                entry["supply_voltage_range"] = json!([min, max]);
            }
        }
        ComponentKind::Mosfet => insert_mosfet_ratings(entry, component),
        ComponentKind::Transistor if is_mos => insert_mosfet_ratings(entry, component),
        ComponentKind::Transistor => {
            if let Some(vce) = component.parameter_f64("max_collector_emitter_voltage") {
                entry["max_vce"] = json!(vce);
            }
            if let Some(ic) = component.parameter_f64("max_collector_current") {
                entry["max_ic"] = json!(ic);
            }
        }
        ComponentKind::Diode => {
            if let Some(vr) = component.parameter_f64("max_reverse_voltage") {
                entry["max_vr"] = json!(vr);
            }
            if let Some(forward) = component.parameter_f64("max_forward_current") {
                entry["max_if"] = json!(forward);
            }
        }
        _ => {}
    }
}

fn insert_mosfet_ratings(entry: &mut Value, component: &Component) {
    if let Some(vds) = component.parameter_f64("max_drain_source_voltage") {
        entry["max_vds"] = json!(vds);
    }
    if let Some(id) = component.parameter_f64("max_drain_current") {
        entry["max_id"] = json!(id);
    }
}

/// Prompts in the form shown to end users.
pub fn format_user_prompts(prompts: &[DatasheetPrompt]) -> Vec<Value> {
    prompts
        .iter()
        .map(|p| {
            let priority = p.priority.as_str();
            json!({
                "priority": priority.to_uppercase(),
                "component_type": title_case(&p.component_type),
                "message": format!(
                    "📋 {}: Upload datasheet for {} components",
                    title_case(priority),
                    p.component_type
                ),
                "reason": p.reason,
                "suggested_parts": p.suggested_parts.iter().take(3).collect::<Vec<_>>(),
                "examples": p.example_datasheets.iter().take(2).collect::<Vec<_>>(),
            })
        })
        .collect()
}

fn detailed_prompt(prompt: &DatasheetPrompt) -> Value {
    let mut value = json!(prompt);
    value["action_required"] = json!(format!(
        "Please upload a datasheet for {} components to improve simulation accuracy.",
        prompt.component_type
    ));
    value
}

pub fn prompt_message(level: ComplexityLevel, total: usize, critical: usize) -> String {
    match level {
        ComplexityLevel::VeryComplex => format!(
            "⚠️ Very complex circuit detected! {} critical datasheets needed for accurate simulation.",
            critical
        ),
        ComplexityLevel::Complex => format!(
            "🔧 Complex circuit detected. {} datasheets recommended for better accuracy.",
            total
        ),
        _ => format!(
            "📈 {} datasheet uploads recommended to improve simulation quality.",
            total
        ),
    }
}

/// Share of components backed by a datasheet, bucketed.
pub fn simulation_confidence(components: &[Component]) -> &'static str {
    if components.is_empty() {
        return "unknown";
    }
    let with_datasheet = components.iter().filter(|c| c.has_datasheet()).count();
    let ratio = with_datasheet as f64 / components.len() as f64;
    if ratio >= 0.8 {
        "high"
    } else if ratio >= 0.5 {
        "medium"
    } else if ratio >= 0.2 {
        "low"
    } else {
        "very_low"
    }
}

pub fn recommendation_reason(goals: &[String]) -> &'static str {
    let has = |goal: &str| goals.iter().any(|g| g.to_lowercase().contains(goal));
    if has("power") {
        "Consider lower power alternatives for improved efficiency"
    } else if has("speed") {
        "Consider higher bandwidth/faster switching alternatives"
    } else if has("cost") {
        "Consider more cost-effective alternatives"
    } else if has("noise") {
        "Consider low-noise alternatives for better signal integrity"
    } else {
        "General performance optimization recommendations available"
    }
}
