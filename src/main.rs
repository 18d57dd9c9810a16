use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use version_resolver::config::{self, ResolverConfig};
use version_resolver::logging::{self, LogFormat};
use version_resolver::service::BatchResolver;
use version_resolver::version::types::{Ecosystem, ResolutionRequest};

#[derive(Parser)]
#[command(name = "version-resolver")]
#[command(version, about = "Resolve the latest version of packages across ecosystems")]
struct Cli {
    /// Config file (defaults to <data_dir>/config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a single package
    Resolve {
        ecosystem: Ecosystem,
        package: String,
        /// Version prefix or tag suffix the result must match
        #[arg(long)]
        hint: Option<String>,
        /// Also fetch metadata and README where the ecosystem has them
        #[arg(long)]
        include_extra: bool,
    },
    /// Resolve a JSON array of requests read from a file or stdin
    Batch {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// List supported ecosystems
    Ecosystems,
}

fn read_requests(file: Option<PathBuf>) -> anyhow::Result<Vec<ResolutionRequest>> {
    let content = match file {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            content
        }
    };
    serde_json::from_str(&content).context("expected a JSON array of resolution requests")
}

async fn run(cli: Cli, config: ResolverConfig) -> anyhow::Result<()> {
    let resolver = BatchResolver::from_config(&config);

    let output = match cli.command {
        Command::Resolve {
            ecosystem,
            package,
            hint,
            include_extra,
        } => {
            let mut request = ResolutionRequest::new(ecosystem, package).with_extra(include_extra);
            request.version_hint = hint;
            serde_json::to_string_pretty(&resolver.resolve_batch(&[request]).await)?
        }
        Command::Batch { file } => {
            let requests = read_requests(file)?;
            serde_json::to_string_pretty(&resolver.resolve_batch(&requests).await)?
        }
        Command::Ecosystems => serde_json::to_string_pretty(&resolver.ecosystems())?,
    };

    println!("{}", output);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = logging::init(&config::log_path(), cli.log_format)?;
    let config = ResolverConfig::load(cli.config.as_deref())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli, config))
}
