//! Juris CLI
//!
//! Local execution entry point. Job queues and scheduling belong to the
//! surrounding runner; this binary runs one crawl in the foreground.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use juris::{
    error::Result,
    models::{Config, SearchCriteria},
    pipeline,
    services::{Backend, PageQuery},
};
use tokio::sync::watch;

/// Juris - jurisprudence doctrine harvester
#[derive(Parser, Debug)]
#[command(name = "juris", version, about = "Harvests doctrine references from jurisprudence search")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "juris.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Harvest doctrine entries for a search
    Crawl {
        #[command(flatten)]
        search: SearchArgs,

        /// Use the legacy listing pages instead of the search API
        #[arg(long)]
        legacy: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Txt)]
        format: Format,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the request body for one page of a search
    Query {
        #[command(flatten)]
        search: SearchArgs,

        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: usize,
    },

    /// Validate the configuration file
    Validate,
}

#[derive(clap::Args, Debug)]
struct SearchArgs {
    /// Search text
    #[arg(short, long)]
    query: String,

    /// Earliest judgment date (YYYY-MM-DD)
    #[arg(long, default_value = "")]
    from: String,

    /// Latest judgment date (YYYY-MM-DD)
    #[arg(long, default_value = "")]
    to: String,
}

impl SearchArgs {
    fn criteria(&self) -> Result<SearchCriteria> {
        SearchCriteria::parse(&self.query, &self.from, &self.to)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Json,
    Txt,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);

    match cli.command {
        Command::Crawl {
            search,
            legacy,
            format,
            output,
        } => {
            config.validate()?;
            let criteria = search.criteria()?;

            let (cancel_tx, cancel_rx) = watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Interrupt received, finishing with the pages collected so far");
                    let _ = cancel_tx.send(true);
                }
            });

            let result = pipeline::run_crawler(&config, &criteria, legacy, cancel_rx).await?;
            for error in &result.errors {
                log::warn!("Page {} skipped: {}", error.page, error.message);
            }

            let rendered = match format {
                Format::Json => serde_json::to_string_pretty(&result.items())?,
                Format::Txt => result.to_text(),
            };
            match output {
                Some(path) => {
                    tokio::fs::write(&path, rendered).await?;
                    log::info!("Wrote {} entries to {}", result.entries.len(), path.display());
                }
                None => println!("{rendered}"),
            }
        }

        Command::Query { search, page } => {
            let criteria = search.criteria()?;
            match Backend::structured(&config.search).request(&criteria, page)? {
                PageQuery::Fetch(request) => {
                    let body = request
                        .body
                        .map(|b| serde_json::to_string_pretty(b.value()))
                        .transpose()?
                        .unwrap_or_default();
                    println!("POST {}\n{body}", request.url);
                }
                PageQuery::WindowExhausted { page, offset } => {
                    log::warn!("Page {page} starts at offset {offset}, past the result window");
                }
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "Config OK (page size {}, window {}, concurrency {})",
                config.search.page_size,
                config.search.window_max,
                config.crawler.max_concurrent
            );
        }
    }

    Ok(())
}
