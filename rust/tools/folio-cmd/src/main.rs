use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

mod commands;

#[derive(Parser)]
#[command(name = "folio-cmd")]
#[command(about = "Command-line utility for querying folio corpora")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the corpus and print matching pages
    Search {
        /// Corpus directory
        dir: String,

        /// Query text
        query: String,

        /// Score and order the hits (`OR` between words matches any of them)
        #[arg(long)]
        ranked: bool,

        /// Search every category of the layout
        #[arg(long, conflicts_with = "ranked")]
        categories: bool,

        /// Number of hits to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Maximum number of hits (0 for all)
        #[arg(long, default_value_t = 0)]
        limit: usize,

        /// Attach a text snippet around the query to each hit
        #[arg(long)]
        snippets: bool,

        /// Query tokenizer: whitespace, arabic or unicode-word
        #[arg(long, default_value = "whitespace")]
        tokenizer: String,
    },

    /// Print a page with its book, chapter, text and comments
    Page {
        /// Corpus directory
        dir: String,

        /// Page id
        id: u32,
    },

    /// Print the style runs of a page
    Styles {
        /// Corpus directory
        dir: String,

        /// Page id
        page: u32,

        /// Number of tokens on the page
        tokens: u32,
    },

    /// Display headers and record counts of every corpus file
    Inspect {
        /// Corpus directory
        dir: String,
    },

    /// Report or populate an offline copy of the corpus
    Offline {
        /// Corpus directory
        dir: String,

        /// Offline store directory
        offline_dir: String,

        /// Copy every corpus file into the offline store
        #[arg(long)]
        download: bool,
    },
}

/// Installs the stderr subscriber and the `log` bridge; fails if either is
/// already installed.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(())
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Search {
            dir,
            query,
            ranked,
            categories,
            offset,
            limit,
            snippets,
            tokenizer,
        } => commands::search::run(
            &dir,
            &query,
            commands::search::SearchArgs {
                ranked,
                categories,
                offset,
                limit,
                snippets,
                tokenizer,
            },
        ),
        Commands::Page { dir, id } => commands::page::run(&dir, id),
        Commands::Styles { dir, page, tokens } => commands::styles::run(&dir, page, tokens),
        Commands::Inspect { dir } => commands::inspect::run(&dir),
        Commands::Offline {
            dir,
            offline_dir,
            download,
        } => commands::offline::run(&dir, &offline_dir, download),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_once() {
        init_tracing().unwrap();
        log::info!("subscriber installed");
        assert!(init_tracing().is_err());
    }
}
