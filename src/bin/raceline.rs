//! Command-line wrapper around the telemetry client.
//!
//! Attaches to the simulator (or a capture file), optionally dumps the raw
//! region bytes, and optionally writes the parsed session document plus
//! all telemetry values to a file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use raceline::Client;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "raceline", version = raceline::VERSION, about = "iRacing telemetry SDK client")]
struct Args {
    /// Use a capture file in place of the live shared memory region
    #[arg(long, value_name = "FILE")]
    test: Option<PathBuf>,

    /// Dump the raw region bytes to a file after attaching
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,

    /// Write the session document and telemetry values to a file
    #[arg(long, value_name = "FILE")]
    parse: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut client = Client::new();

    let started = match client.startup(args.test.as_deref(), args.dump.as_deref()).await {
        Ok(started) => started,
        Err(e) => {
            eprintln!("startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if !started {
        eprintln!("simulator not running");
        return ExitCode::FAILURE;
    }

    if let Some(path) = args.parse.as_deref() {
        if let Err(e) = client.parse_to(path).await {
            eprintln!("parse failed: {}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
