use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::SystemTime;
use tracing_subscriber::EnvFilter;

mod adapters;
mod coerce;
mod config;
mod error;
mod router;
mod tree;

use adapters::{CouchbaseHttp, NsqLookupdHttp, NsqdHttp};
use config::{CouchbaseConfig, NsqConfig};
use router::Request;

pub type Result<T> = anyhow::Result<T>;

const USAGE: &str = "\
Commands:
  cluster <dotted.path> <int|string|avg|string_list>
  bucket <name> <dotted.path> <int|string|avg|string_list>
  node <hostname> <dotted.path> <int|string|avg|string_list>
  discovery <nodes|buckets>
  nsqd <uptime|health|version>
  nsqd discovery topics
  nsqlookupd <count|names|topics>";

#[derive(Parser)]
#[command(name = "service-probe")]
#[command(about = "Read one metric from a service REST API for the monitoring agent")]
#[command(long_about = None)]
#[command(after_help = USAGE)]
struct Cli {
    /// Config file; defaults to ../conf/<couchbase|nsq>.conf next to the binary.
    #[arg(long)]
    config: Option<PathBuf>,

    /// cluster, bucket, node, discovery, nsqd or nsqlookupd.
    kind: String,

    /// Positional arguments of the command; empty values are skipped.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    // stdout carries the metric value and nothing else.
    match run(&cli) {
        Ok(line) => {
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    // 1) Parse the command; bad shapes and type tags fail before any I/O.
    let request = Request::parse(&cli.kind, &cli.args)?;
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| request.backend().default_config_path());
    tracing::debug!(?request, config = %config_path.display(), "routing");

    // 2) Load the backend config, 3) fetch + resolve + coerce.
    let line = match request {
        Request::Couchbase(request) => {
            let config = CouchbaseConfig::load(&config_path)?;
            router::run_couchbase(&CouchbaseHttp::new(&config)?, &request)?
        }
        Request::Nsqd(request) => {
            let config = NsqConfig::load(&config_path)?;
            router::run_nsqd(&NsqdHttp::new(&config)?, request, SystemTime::now())?
        }
        Request::Lookupd(request) => {
            let config = NsqConfig::load(&config_path)?;
            router::run_lookupd(&NsqLookupdHttp::new(&config)?, request)?
        }
    };

    Ok(line)
}
