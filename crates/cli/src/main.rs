use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use commands::Report;
use config::{EngineConfig, Overrides};
use docqa_vector_store::EmbeddingMode;
use output::CommandResponse;
use std::path::PathBuf;

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Chunk, embed and search documents by namespace", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Print a JSON envelope on stdout (implies --quiet)
    #[arg(long, global = true)]
    json: bool,

    /// TOML config file (lowest precedence after defaults)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory holding persisted namespaces (overrides DOCQA_INDEX_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    index_dir: Option<PathBuf>,

    /// Override embedding backend in this process
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Override embedding model id
    #[arg(long, global = true)]
    embed_model: Option<String>,

    /// Override embedding dimension
    #[arg(long, global = true)]
    embed_dim: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk, embed and persist one document under a namespace
    Index(IndexArgs),

    /// Retrieve the closest chunks of a namespace for one or more queries
    Search(SearchArgs),

    /// List persisted namespaces
    Namespaces,

    /// Show what a persisted namespace holds
    Inspect(InspectArgs),
}

#[derive(Args)]
struct IndexArgs {
    /// Plain-text document; form feeds separate pages
    file: PathBuf,

    /// Namespace key (defaults to the file stem)
    #[arg(short, long)]
    namespace: Option<String>,

    /// Window width in words
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Words shared by consecutive windows
    #[arg(long)]
    overlap: Option<usize>,

    /// Build and report without writing to the index directory
    #[arg(long)]
    no_save: bool,
}

#[derive(Args)]
struct SearchArgs {
    /// Query text; several queries share one index load
    #[arg(required = true)]
    queries: Vec<String>,

    /// Namespace to search
    #[arg(short, long)]
    namespace: String,

    /// Number of chunks per query (overrides DOCQA_TOP_K)
    #[arg(short = 'k', long = "top-k")]
    top_k: Option<usize>,

    /// Also print the joined chunk text for each query
    #[arg(long)]
    context: bool,
}

#[derive(Args)]
struct InspectArgs {
    namespace: String,

    /// Number of leading chunks to preview
    #[arg(long, default_value_t = 3)]
    preview: usize,
}

#[derive(Copy, Clone, ValueEnum)]
enum EmbedMode {
    Stub,
    Http,
}

impl EmbedMode {
    const fn as_domain(self) -> EmbeddingMode {
        match self {
            EmbedMode::Stub => EmbeddingMode::Stub,
            EmbedMode::Http => EmbeddingMode::Http,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet || cli.json {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let json = cli.json;
    match run(cli).await {
        Ok((data, human)) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&CommandResponse::ok(data))?
                );
            } else if !human.is_empty() {
                println!("{human}");
            }
            Ok(())
        }
        Err(err) if json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&CommandResponse::error(&err))?
            );
            std::process::exit(1);
        }
        Err(err) => Err(err),
    }
}

async fn run(cli: Cli) -> Result<(serde_json::Value, String)> {
    let mut overrides = Overrides {
        index_dir: cli.index_dir,
        embed_mode: cli.embed_mode.map(EmbedMode::as_domain),
        embed_model: cli.embed_model,
        embed_dim: cli.embed_dim,
        ..Overrides::default()
    };
    if let Commands::Index(args) = &cli.command {
        overrides.chunk_size = args.chunk_size;
        overrides.chunk_overlap = args.overlap;
    }
    let config = EngineConfig::load(cli.config.as_deref(), &overrides)?;
    log::debug!(
        "Resolved configuration: chunk_size={} overlap={} top_k={} index_dir={} embedding={}:{}/{}",
        config.chunker.chunk_size,
        config.chunker.overlap,
        config.top_k,
        config.index_dir.display(),
        config.embedding.mode.as_str(),
        config.embedding.model_id,
        config.embedding.dimension
    );

    match cli.command {
        Commands::Index(args) => {
            render(commands::run_index(&config, &args.file, args.namespace, !args.no_save).await?)
        }
        Commands::Search(args) => render(
            commands::run_search(&config, args.queries, &args.namespace, args.top_k, args.context)
                .await?,
        ),
        Commands::Namespaces => render(commands::run_namespaces(&config).await?),
        Commands::Inspect(args) => {
            render(commands::run_inspect(&config, &args.namespace, args.preview).await?)
        }
    }
}

fn render(report: impl Report) -> Result<(serde_json::Value, String)> {
    Ok((serde_json::to_value(&report)?, report.human()))
}
