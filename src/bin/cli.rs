//! kvwire CLI Client
//!
//! Sends one raw command to a RESP endpoint and prints the reply.

use clap::Parser;
use kvwire::{Backend, Command, Config, Driver, DriverError};
use tracing_subscriber::{fmt, EnvFilter};

/// kvwire CLI
#[derive(Parser, Debug)]
#[command(name = "kvwire-cli")]
#[command(about = "Send a command to a Redis or RESP-compatible Memcached endpoint")]
#[command(version)]
struct Args {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port (defaults to the backend's conventional port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Backend kind: redis or memcached
    #[arg(short, long, default_value = "redis")]
    backend: Backend,

    /// Connect, read and write timeout in milliseconds
    #[arg(short, long, default_value = "3000")]
    timeout_ms: u64,

    /// Command and its arguments, e.g. `SET key value`
    #[arg(required = true, num_args = 1..)]
    command: Vec<String>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kvwire=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder()
        .host(&args.host)
        .backend(args.backend)
        .timeout_ms(args.timeout_ms);
    if let Some(port) = args.port {
        builder = builder.port(port);
    }
    let config = builder.build();

    tracing::info!("kvwire CLI v{} → {} ({})", kvwire::VERSION, config.addr(), config.backend);

    match run(config, &args.command) {
        Ok(()) => {}
        Err(DriverError::Server(message)) => {
            println!("(error) {}", message);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn run(config: Config, words: &[String]) -> kvwire::Result<()> {
    let command = Command::from_args(words)?;
    let mut driver = Driver::connect(config)?;
    let reply = driver.request(&command)?;
    println!("{}", reply);
    driver.close();
    Ok(())
}
