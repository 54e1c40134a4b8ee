//! CLI commands and argument parsing

use crate::search::{SafeSearch, SearchOptions, SearchType};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Z.AI web search CLI
#[derive(Parser, Debug)]
#[command(name = "zai-search")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML); without it, ZAI_* environment variables are used
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Profile to apply from the configuration file
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a single search
    Search {
        /// Search query
        query: String,

        #[command(flatten)]
        options: SearchArgs,
    },

    /// Run every query in a file (one per line, `#` starts a comment)
    Batch {
        /// Query file
        file: PathBuf,

        /// Maximum searches in flight
        #[arg(long, default_value = "4")]
        concurrency: usize,

        #[command(flatten)]
        options: SearchArgs,
    },

    /// Show the effective configuration (API key redacted)
    Config,
}

/// Per-search overrides of the configured defaults
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Number of results (1-20)
    #[arg(short = 'n', long)]
    pub num_results: Option<u32>,

    /// Search type
    #[arg(short = 't', long, value_parser = parse_search_type)]
    pub search_type: Option<SearchType>,

    /// Language code (ISO 639-1)
    #[arg(long)]
    pub language: Option<String>,

    /// Region code (ISO 3166-1)
    #[arg(long)]
    pub region: Option<String>,

    /// Safe search level
    #[arg(long, value_parser = parse_safe_search)]
    pub safe_search: Option<SafeSearch>,

    /// Only return results from this domain (repeatable)
    #[arg(long = "include-domain")]
    pub include_domains: Vec<String>,

    /// Never return results from this domain (repeatable)
    #[arg(long = "exclude-domain")]
    pub exclude_domains: Vec<String>,
}

impl SearchArgs {
    pub fn to_options(&self) -> SearchOptions {
        SearchOptions {
            num_results: self.num_results,
            include_domains: non_empty(&self.include_domains),
            exclude_domains: non_empty(&self.exclude_domains),
            search_type: self.search_type,
            language: self.language.clone(),
            region: self.region.clone(),
            safe_search: self.safe_search,
        }
    }
}

fn non_empty(domains: &[String]) -> Option<Vec<String>> {
    (!domains.is_empty()).then(|| domains.to_vec())
}

fn parse_search_type(s: &str) -> Result<SearchType, String> {
    s.parse().map_err(|e: crate::Error| e.message().to_string())
}

fn parse_safe_search(s: &str) -> Result<SafeSearch, String> {
    s.parse().map_err(|e: crate::Error| e.message().to_string())
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "zai-search",
            "search",
            "rust async",
            "-n",
            "5",
            "--search-type",
            "news",
            "--include-domain",
            "docs.rs",
            "--include-domain",
            "rust-lang.org",
            "--format",
            "pretty",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Pretty);
        let Commands::Search { query, options } = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(query, "rust async");
        assert_eq!(
            options.to_options(),
            SearchOptions {
                num_results: Some(5),
                search_type: Some(SearchType::News),
                include_domains: Some(vec!["docs.rs".to_string(), "rust-lang.org".to_string()]),
                ..SearchOptions::default()
            }
        );
    }

    #[test]
    fn test_parse_batch_with_globals() {
        let cli = Cli::try_parse_from([
            "zai-search",
            "batch",
            "queries.txt",
            "--concurrency",
            "8",
            "--config",
            "zai.yaml",
            "--profile",
            "prod",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("zai.yaml")));
        assert_eq!(cli.profile.as_deref(), Some("prod"));
        let Commands::Batch {
            file, concurrency, ..
        } = cli.command
        else {
            panic!("expected batch command");
        };
        assert_eq!(file, PathBuf::from("queries.txt"));
        assert_eq!(concurrency, 8);
    }

    #[test]
    fn test_rejects_unknown_search_type() {
        let result = Cli::try_parse_from(["zai-search", "search", "q", "-t", "video"]);
        assert!(result.is_err());
    }
}
