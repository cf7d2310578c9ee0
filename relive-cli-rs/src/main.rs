//! relive - ReLiveAI regret analysis from the terminal
//!
//! Drives an [`AnalysisSession`] either against a provider directly (using the
//! `RELIVE_*` environment) or against a running analysis gateway.

mod view;

use std::io::{IsTerminal, Read};
use std::sync::Arc;
use std::time::Duration;

use analysis_sdk::analysis::EXAMPLE_NARRATIVE;
use analysis_sdk::config::{self, AnalysisConfig};
use analysis_sdk::{AnalysisSession, Analyzer, GatewayClient, Navigation};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

const GATEWAY_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Parser)]
#[command(name = "relive")]
#[command(about = "ReLiveAI - reflect on past decisions with AI regret analysis", long_about = None)]
#[command(version)]
struct Cli {
    /// Use an analysis gateway instead of calling the provider directly
    ///
    /// Pass a base URL, or the flag alone to use ANALYSIS_GATEWAY_SERVICE_ADDR/_PORT.
    #[arg(long, global = true, env = "RELIVE_GATEWAY_URL", num_args = 0..=1, default_missing_value = "")]
    gateway: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a decision or situation
    Analyze {
        /// The decision narrative
        text: Option<String>,

        /// Analyze the built-in example narrative
        #[arg(long, conflicts_with_all = ["text", "stdin"])]
        example: bool,

        /// Read the narrative from standard input
        #[arg(long, conflicts_with = "text")]
        stdin: bool,

        /// Print the result as JSON instead of the results view
        #[arg(long)]
        json: bool,
    },

    /// Check that the analysis provider is reachable
    TestConnection,
}

#[tokio::main]
async fn main() -> Result<()> {
    config_rs::load_dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let analysis_config = AnalysisConfig::from_provider(&config::default_provider())
        .context("invalid analysis configuration")?;
    let analyzer = build_analyzer(cli.gateway.as_deref())?;
    let (session, navigation) = AnalysisSession::new(analyzer, analysis_config.navigation_delay);

    match cli.command {
        Commands::Analyze { text, example, stdin, json } => {
            let text = read_input(text, example, stdin)?;
            analyze(&session, navigation, &text, json).await
        }
        Commands::TestConnection => test_connection(&session).await,
    }
}

fn build_analyzer(gateway: Option<&str>) -> Result<Arc<dyn Analyzer>> {
    match gateway {
        Some(url) => {
            let url = if url.is_empty() {
                config_rs::get_client_address("ANALYSIS_GATEWAY", 8000, None)
            } else {
                url.to_string()
            };
            log::info!("Using analysis gateway at {}", url);
            Ok(Arc::new(GatewayClient::new(url, GATEWAY_TIMEOUT)?))
        }
        None => {
            let analyzer = analysis_sdk::analyzer_from_env().context("failed to configure analyzer")?;
            Ok(Arc::new(analyzer))
        }
    }
}

fn read_input(text: Option<String>, example: bool, stdin: bool) -> Result<String> {
    if example {
        return Ok(EXAMPLE_NARRATIVE.to_string());
    }
    if let Some(text) = text {
        return Ok(text);
    }
    if stdin || !std::io::stdin().is_terminal() {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read standard input")?;
        return Ok(buffer);
    }
    bail!("no narrative given: pass TEXT, --stdin or --example")
}

async fn analyze(
    session: &AnalysisSession,
    mut navigation: tokio::sync::mpsc::UnboundedReceiver<Navigation>,
    text: &str,
    json: bool,
) -> Result<()> {
    eprintln!("Analyzing your decision...");

    let submitted = tokio::select! {
        submitted = session.submit(text) => submitted,
        _ = tokio::signal::ctrl_c() => {
            session.cancel();
            bail!("Analysis cancelled");
        }
    };
    if let Err(err) = submitted {
        bail!("{}", err);
    }

    let view = tokio::select! {
        event = navigation.recv() => match event {
            Some(Navigation::Results(view)) => view,
            None => bail!("session closed before results were ready"),
        },
        _ = tokio::signal::ctrl_c() => {
            session.cancel();
            bail!("Analysis cancelled");
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view.result)?);
    } else {
        print!("{}", view::render(&view));
    }
    Ok(())
}

async fn test_connection(session: &AnalysisSession) -> Result<()> {
    match session.test_connection().await {
        Ok(message) => {
            println!("{}", message);
            Ok(())
        }
        Err(err) => bail!("{}", err),
    }
}
