use anyhow::{Context, Result};
use circuitsim_core::{CircuitComplexityAnalyzer, CircuitDiagnostics};
use circuitsim_mcp_server::{
    circuit_file::load_circuit_file, logging::init_tracing, CircuitSimMcpServer, ServerConfig,
};
use circuitsim_spice::{AnalysisRequest, DeckOptions, SpiceDeck};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "circuitsim",
    version,
    author,
    about = "CircuitSim - MCP server for analog circuit simulation with ngspice"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(
        long,
        global = true,
        env = "CIRCUITSIM_CONFIG",
        help = "Configuration file path (TOML or JSON)"
    )]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Serve MCP over stdin/stdout")]
    Stdio,

    #[command(about = "Serve MCP over streamable HTTP")]
    Http {
        #[arg(long, help = "Host to bind (overrides configuration)")]
        host: Option<String>,

        #[arg(short, long, help = "Port to bind (overrides configuration)")]
        port: Option<u16>,
    },

    #[command(about = "Check that ngspice and the component library are usable")]
    Check,

    #[command(about = "Print the netlist of a circuit JSON file")]
    Netlist {
        #[arg(help = "Circuit file: {\"name\", \"components\"} or a component array")]
        file: PathBuf,

        #[arg(long, value_enum, help = "Print the full ngspice deck for this analysis")]
        deck: Option<DeckAnalysis>,
    },

    #[command(about = "Print complexity analysis and diagnostics for a circuit JSON file")]
    Analyze {
        #[arg(help = "Circuit file: {\"name\", \"components\"} or a component array")]
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DeckAnalysis {
    Dc,
    Ac,
    Transient,
}

impl DeckAnalysis {
    fn request(self) -> AnalysisRequest {
        match self {
            Self::Dc => AnalysisRequest::Dc,
            Self::Ac => AnalysisRequest::ac(1.0, 1e6, 50),
            Self::Transient => AnalysisRequest::transient(1e-6, 1e-3),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ServerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let _log_guard = init_tracing(&config.logging, cli.verbose);

    match cli.command {
        Commands::Stdio => {
            info!("Starting CircuitSim MCP server on stdio");
            let server = CircuitSimMcpServer::new(config)?;
            server.serve_stdio().await?;
        }
        Commands::Http { host, port } => {
            if let Some(host) = host {
                config.http.host = host;
            }
            if let Some(port) = port {
                config.http.port = port;
            }
            serve_http(config).await?;
        }
        Commands::Check => check(config).await?,
        Commands::Netlist { file, deck } => {
            let circuit = load_circuit_file(&file)
                .with_context(|| format!("reading circuit from {}", file.display()))?;
            match deck {
                Some(analysis) => {
                    let options = DeckOptions {
                        temperature_c: config.simulator.temperature_c,
                        nominal_temperature_c: config.simulator.nominal_temperature_c,
                    };
                    let deck = SpiceDeck::build(&circuit, &analysis.request(), &options);
                    for name in &deck.skipped {
                        warn!("{} has no SPICE primitive and is left out of the deck", name);
                    }
                    print!("{}", deck.text);
                }
                None => print!("{}", circuit.generate_netlist()),
            }
        }
        Commands::Analyze { file } => {
            let circuit = load_circuit_file(&file)
                .with_context(|| format!("reading circuit from {}", file.display()))?;
            let report = CircuitComplexityAnalyzer::new().analysis_report(circuit.components());
            let diagnostics = CircuitDiagnostics::inspect(&circuit);
            let output = serde_json::json!({
                "circuit_name": circuit.name,
                "analysis": report,
                "diagnostics": diagnostics.to_json(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

#[cfg(feature = "server-http")]
async fn serve_http(config: ServerConfig) -> Result<()> {
    let http = config.http.clone();
    let server = CircuitSimMcpServer::new(config)?;
    circuitsim_mcp_server::http_server::start_http_server(server, http)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))
}

#[cfg(not(feature = "server-http"))]
async fn serve_http(_config: ServerConfig) -> Result<()> {
    anyhow::bail!("this build does not include the HTTP transport; rebuild with --features server-http")
}

async fn check(config: ServerConfig) -> Result<()> {
    let server = CircuitSimMcpServer::new(config)?;
    let tools = server.tools();
    println!("Component library: {} parts", tools.library().len());
    match tools.simulator().engine_version().await {
        Ok(version) => {
            println!("ngspice: {}", version);
            Ok(())
        }
        Err(e) => {
            println!("ngspice: unavailable");
            Err(anyhow::Error::new(e).context(format!(
                "running '{}'",
                tools.config().simulator.ngspice_path
            )))
        }
    }
}
