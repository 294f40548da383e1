//! Beacon Agent CLI
//!
//! Entry point for the `beacon-agent` command-line tool.

use clap::{Parser, Subcommand};
use beacon_agent::config::default_config_path;
use beacon_agent::signal::SignalHandler;
use beacon_agent::{
    AgentConfig, BeaconSender, BeaconSendingContext, EffectiveConfig, HttpTransport,
    StatusTransport, SystemClock,
};
use beacon_protocol::status::DEFAULT_SERVER_ID;
use beacon_protocol::StatusRequest;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Idle wait between shutdown checks in the foreground
const FOREGROUND_WAIT: Duration = Duration::from_secs(60 * 60);

#[derive(Parser)]
#[command(name = "beacon-agent")]
#[command(about = "Telemetry beacon sending agent", version)]
struct Cli {
    /// Path to config file (default: ~/.config/beacon-agent/agent.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Beacon endpoint URL (overrides config file)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Application identifier (overrides config file)
    #[arg(long, global = true)]
    application_id: Option<String>,

    /// Log filter, e.g. "info" or "beacon_agent=debug"
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the beacon sender until interrupted
    Run,

    /// Show the effective configuration
    Config {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Send a single status request and print the response
    Status {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let effective = match load_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Run => run_agent(&effective),
        Commands::Config { json } => run_config(&effective, json),
        Commands::Status { json } => run_status(&effective, json),
    }
}

fn load_config(cli: &Cli) -> Result<EffectiveConfig, beacon_agent::ConfigError> {
    let path = cli.config.clone().or_else(default_config_path);

    let mut overrides = serde_json::Map::new();
    if let Some(ref endpoint) = cli.endpoint {
        overrides.insert("endpoint".to_string(), endpoint.clone().into());
    }
    if let Some(ref app) = cli.application_id {
        overrides.insert("application_id".to_string(), app.clone().into());
    }
    let overrides = (!overrides.is_empty()).then(|| serde_json::Value::Object(overrides));

    EffectiveConfig::build(path.as_deref(), overrides)
}

fn backend_settings(effective: &EffectiveConfig) -> AgentConfig {
    let settings = match effective.settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = settings.require_backend() {
        eprintln!("Error: {}", e);
        eprintln!("Set it in the config file or pass --endpoint / --application-id.");
        process::exit(1);
    }
    settings
}

fn build_transport(settings: &AgentConfig) -> HttpTransport {
    match HttpTransport::new(settings.http_config()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error creating HTTP client: {}", e);
            process::exit(1);
        }
    }
}

fn run_agent(effective: &EffectiveConfig) {
    let settings = backend_settings(effective);
    let transport = build_transport(&settings);

    let context = Arc::new(BeaconSendingContext::new(
        settings.sending_settings(),
        Arc::new(transport),
        Arc::new(SystemClock),
    ));
    let shutdown = context.shutdown_signal();

    if let Err(e) = SignalHandler::new(Arc::clone(&shutdown)).install() {
        eprintln!("Error installing signal handler: {}", e);
        process::exit(1);
    }

    let sender = BeaconSender::with_shutdown_timeout(Arc::clone(&context), settings.shutdown_timeout());
    if let Err(e) = sender.initialize() {
        eprintln!("Error starting beacon sender: {}", e);
        process::exit(1);
    }

    info!(endpoint = %settings.endpoint, application_id = %settings.application_id, "beacon agent running");

    if sender.wait_for_init_timeout(settings.init_timeout()) {
        let server = context.server_config();
        info!(
            capture = server.capture,
            server_id = server.server_id,
            send_interval_ms = server.send_interval.as_millis() as u64,
            "initial handshake completed"
        );
    } else if !context.is_shutdown_requested() {
        warn!(
            timeout_seconds = settings.init_timeout().as_secs(),
            "initial handshake still pending, continuing in the background"
        );
    }

    while shutdown.wait_timeout(FOREGROUND_WAIT).is_ok() {}

    if let Err(e) = sender.shutdown() {
        eprintln!("Error stopping beacon sender: {}", e);
        process::exit(1);
    }
    info!(state = %context.current_state(), "beacon agent stopped");
}

fn run_config(effective: &EffectiveConfig, json_output: bool) {
    if json_output {
        match effective.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    let settings = match effective.settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };

    println!("Effective configuration:\n");
    println!("  Endpoint:              {}", display_or_unset(&settings.endpoint));
    println!("  Application ID:        {}", display_or_unset(&settings.application_id));
    println!("  Status check interval: {} ms", settings.status_check_interval_ms);
    println!("  Connect timeout:       {} s", settings.timeouts.connect_seconds);
    println!("  Read timeout:          {} s", settings.timeouts.read_seconds);
    println!("  Init timeout:          {} s", settings.timeouts.init_seconds);
    println!("  Shutdown timeout:      {} s", settings.timeouts.shutdown_seconds);
    println!("\nSources:");
    for source in &effective.sources {
        match source.path {
            Some(ref path) => println!("  {:?}: {}", source.origin, path),
            None => println!("  {:?}", source.origin),
        }
    }
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

fn run_status(effective: &EffectiveConfig, json_output: bool) {
    let settings = backend_settings(effective);
    let transport = build_transport(&settings);

    let request = StatusRequest::new(settings.application_id.clone(), DEFAULT_SERVER_ID);
    let response = match transport.send_status_request(&request) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Status request failed: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        match response.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("Backend status ({}):\n", settings.endpoint);
        println!("  Capture:         {}", if response.is_capture_enabled() { "on" } else { "off" });
        println!("  Server ID:       {}", response.server_id);
        println!("  Send interval:   {} ms", response.send_interval_ms);
        println!("  Max beacon size: {} KB", response.max_beacon_size_kb);
        println!("  Capture errors:  {}", response.capture_errors);
        println!("  Capture crashes: {}", response.capture_crashes);
    }
}
