use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use reqwest::header::{HeaderValue, ACCEPT};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "probe-cli")]
#[command(about = "Query the health and readiness probes of a service scaffold", long_about = None)]
struct Cli {
    /// Base URL of the surface serving probes (management, or primary when shared).
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Response format to request.
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness probe
    Health {
        #[arg(long, default_value = "/health")]
        path: String,
    },
    /// Readiness probe
    Ready {
        #[arg(long, default_value = "/ready")]
        path: String,
    },
    /// Ask the scaffold to mark itself down and drain
    Markdown {
        #[arg(long, default_value = "/markdown")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let accept = match cli.format {
        Format::Text => HeaderValue::from_static("text/plain"),
        Format::Json => HeaderValue::from_static("application/json"),
    };

    let base = cli.url.trim_end_matches('/');
    let request = match &cli.command {
        Commands::Health { path } => client.get(format!("{}{}", base, path)),
        Commands::Ready { path } => client.get(format!("{}{}", base, path)),
        Commands::Markdown { path } => client.post(format!("{}{}", base, path)),
    };

    let res = request.header(ACCEPT, accept).send().await?;
    print_response(res, cli.format).await
}

async fn print_response(
    res: reqwest::Response,
    format: Format,
) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    let body = res.text().await?;

    match format {
        Format::Json => match serde_json::from_str::<Value>(&body) {
            Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
            Err(_) => println!("{}", body),
        },
        Format::Text => println!("{}", body),
    }

    if !status.is_success() {
        eprintln!("Probe returned status {}", status);
    }
    Ok(status.is_success())
}
