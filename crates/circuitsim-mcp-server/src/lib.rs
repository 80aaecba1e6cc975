use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

pub mod circuit_file;
pub mod circuit_tools;
pub mod config;
pub mod error;
#[cfg(feature = "server-http")]
pub mod http_server;
pub mod logging;
pub mod requests;


pub use circuit_tools::CircuitTools;
pub use config::*;
pub use error::*;
use requests::*;

pub const SERVER_INSTRUCTIONS: &str = "CircuitSim builds analog circuits from JSON component lists and simulates them with ngspice.\n\
Typical flow: create_circuit (or create_smart_circuit / create_datasheet_circuit for library parts), \
validate_circuit, then simulate_dc, simulate_ac or simulate_transient. \
Use analyze_circuit_complexity and get_datasheet_prompts to learn which component datasheets would improve accuracy, \
and search_components / get_component_datasheet to browse the built-in part library. \
Ground is node '0', 'gnd' or 'ground'.";

/// MCP server exposing circuit creation, analysis and simulation tools
#[derive(Clone)]
pub struct CircuitSimMcpServer {
    tools: Arc<CircuitTools>,
    tool_router: ToolRouter<Self>,
}

fn json_result(value: Value) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(&value)
        .map_err(|e| McpError::internal_error(format!("failed to encode response: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[tool_router]
impl CircuitSimMcpServer {
    /// Server backed by the ngspice executable named in `config`
    pub fn new(config: ServerConfig) -> Result<Self> {
        Ok(Self::with_tools(CircuitTools::new(config)?))
    }

    pub fn with_tools(tools: CircuitTools) -> Self {
        Self {
            tools: Arc::new(tools),
            tool_router: Self::tool_router(),
        }
    }

    pub fn tools(&self) -> &CircuitTools {
        &self.tools
    }

    /// Serve MCP over stdin/stdout until the client disconnects
    pub async fn serve_stdio(self) -> anyhow::Result<()> {
        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| anyhow::anyhow!("failed to start stdio transport: {}", e))?;
        service.waiting().await?;
        Ok(())
    }

    #[tool(
        description = "Create a circuit from a list of components. Each component needs type (resistor, capacitor, inductor, voltage_source, current_source, diode, transistor, mosfet, opamp), name and nodes; passives and sources also need value (numbers or strings such as '10k', '100n'). Re-using a name replaces the circuit."
    )]
    async fn create_circuit(
        &self,
        params: Parameters<CreateCircuitRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        json_result(self.tools.create_circuit(&request.name, &request.components)?)
    }

    #[tool(
        description = "Create a circuit and analyze its complexity in one step. Returns complexity metrics, datasheet recommendations, design recommendations and user prompts when datasheets would improve accuracy."
    )]
    async fn create_smart_circuit(
        &self,
        params: Parameters<CreateCircuitRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        json_result(
            self.tools
                .create_smart_circuit(&request.name, &request.components)?,
        )
    }

    #[tool(
        description = "Create a circuit whose components may reference library parts. Components with part_number (e.g. LM741, 2N7000, 1N4148, 2N2222) are populated from the datasheet library; others are used as given."
    )]
    async fn create_datasheet_circuit(
        &self,
        params: Parameters<CreateCircuitRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        json_result(
            self.tools
                .create_datasheet_circuit(&request.name, &request.components)?,
        )
    }

    #[tool(
        description = "Analyze circuit complexity: score, level, component breakdown and which component types need datasheets."
    )]
    async fn analyze_circuit_complexity(
        &self,
        params: Parameters<CircuitNameRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(self.tools.analyze_circuit_complexity(&params.0.circuit_name)?)
    }

    #[tool(
        description = "List datasheet upload prompts for a circuit, most critical first. Set detailed=false for one-line summaries."
    )]
    async fn get_datasheet_prompts(
        &self,
        params: Parameters<DatasheetPromptsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        json_result(
            self.tools
                .get_datasheet_prompts(&request.circuit_name, request.detailed)?,
        )
    }

    #[tool(
        description = "Check a circuit for common problems before simulating: missing ground, floating nodes, missing sources and out-of-range component values."
    )]
    async fn validate_circuit(
        &self,
        params: Parameters<CircuitNameRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(self.tools.validate_circuit(&params.0.circuit_name)?)
    }

    #[tool(
        description = "Validate a circuit against component datasheets: which parts have datasheets, their key ratings, warnings and an overall status."
    )]
    async fn validate_circuit_design(
        &self,
        params: Parameters<CircuitNameRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(self.tools.validate_circuit_design(&params.0.circuit_name)?)
    }

    #[tool(
        description = "Suggest up to three library alternatives for each datasheet component, for goals such as power, speed, cost or noise."
    )]
    async fn optimize_circuit_design(
        &self,
        params: Parameters<OptimizeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        json_result(self.tools.optimize_circuit_design(
            &request.circuit_name,
            &request.optimization_goals,
            request.constraints.as_ref(),
        )?)
    }

    #[tool(
        description = "Search the component library by type, manufacturer and required parameter names."
    )]
    async fn search_components(
        &self,
        params: Parameters<SearchComponentsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        json_result(self.tools.search_components(
            request.component_type.as_deref(),
            request.manufacturer.as_deref(),
            request.parameter_filters.as_ref(),
        )?)
    }

    #[tool(
        description = "Get the full datasheet entry for a library part: parameters, SPICE model, operating conditions and package."
    )]
    async fn get_component_datasheet(
        &self,
        params: Parameters<PartNumberRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(self.tools.get_component_datasheet(&params.0.part_number)?)
    }

    #[tool(
        description = "Run a DC operating point analysis. Returns node voltages and source currents."
    )]
    async fn simulate_dc(
        &self,
        params: Parameters<SimulateDcRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        json_result(
            self.tools
                .simulate_dc(&request.circuit_name, request.output_nodes.as_deref())
                .await?,
        )
    }

    #[tool(
        description = "Run an AC small-signal sweep (decade spacing, num_points per decade). Returns frequency plus magnitude and phase (radians) per node."
    )]
    async fn simulate_ac(
        &self,
        params: Parameters<SimulateAcRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        json_result(
            self.tools
                .simulate_ac(
                    &request.circuit_name,
                    request.start_freq,
                    request.stop_freq,
                    request.num_points,
                    request.output_nodes.as_deref(),
                )
                .await?,
        )
    }

    #[tool(
        description = "Run a transient analysis over duration seconds with the given step. Returns time and node voltage series."
    )]
    async fn simulate_transient(
        &self,
        params: Parameters<SimulateTransientRequest>,
    ) -> Result<CallToolResult, McpError> {
        let request = params.0;
        json_result(
            self.tools
                .simulate_transient(
                    &request.circuit_name,
                    request.duration,
                    request.step_size,
                    request.output_nodes.as_deref(),
                )
                .await?,
        )
    }

    #[tool(
        description = "Simulate (analysis_type dc, ac or transient) and attach datasheet guidance with a simulation confidence estimate when the circuit would benefit from datasheets."
    )]
    async fn simulate_with_guidance(
        &self,
        params: Parameters<SimulateWithGuidanceRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(self.tools.simulate_with_guidance(&params.0).await?)
    }

    #[tool(description = "List stored circuits with their component counts and nodes.")]
    async fn list_circuits(&self) -> Result<CallToolResult, McpError> {
        json_result(self.tools.list_circuits()?)
    }

    #[tool(description = "Get a circuit's components, nodes and generated SPICE netlist.")]
    async fn get_circuit_info(
        &self,
        params: Parameters<CircuitNameRequest>,
    ) -> Result<CallToolResult, McpError> {
        json_result(self.tools.get_circuit_info(&params.0.circuit_name)?)
    }
}

#[tool_handler]
impl ServerHandler for CircuitSimMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(SERVER_INSTRUCTIONS.into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
