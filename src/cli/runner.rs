//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, SearchArgs};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::loader::load_config;
use crate::search::{BatchItem, BatchOutcome, BatchSummary, SearchClient, SearchResponse};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Search { query, options } => self.search(query, options).await,
            Commands::Batch {
                file,
                concurrency,
                options,
            } => self.batch(file, *concurrency, options).await,
            Commands::Config => self.show_config(),
        }
    }

    /// Effective config: the YAML file when given, else the environment
    fn load_config(&self) -> Result<ClientConfig> {
        match &self.cli.config {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                load_config(path, self.cli.profile.as_deref())
            }
            None if self.cli.profile.is_some() => Err(Error::config(
                "--profile requires a configuration file (use --config)",
            )),
            None => ClientConfig::from_env(),
        }
    }

    fn client(&self) -> Result<SearchClient> {
        SearchClient::new(self.load_config()?)
    }

    async fn search(&self, query: &str, args: &SearchArgs) -> Result<()> {
        let client = self.client()?;
        let response = client.search(query, args.to_options()).await?;

        match self.cli.format {
            OutputFormat::Json => self.output_message(&json!(response)),
            OutputFormat::Pretty => print_response(&response),
        }
        Ok(())
    }

    async fn batch(&self, file: &Path, concurrency: usize, args: &SearchArgs) -> Result<()> {
        let client = self.client()?;
        let content = fs::read_to_string(file)
            .map_err(|e| Error::config(format!("Failed to read '{}': {e}", file.display())))?;

        let items = read_queries(&content)
            .into_iter()
            .enumerate()
            .map(|(index, query)| {
                let request = client.request(query).options(args.to_options()).build()?;
                Ok::<_, Error>(BatchItem::new((index + 1).to_string(), request))
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Running {} queries from {}", items.len(), file.display());
        let start = Instant::now();
        let outcomes = client.search_batch(items, concurrency).await;

        for outcome in &outcomes {
            self.output_message(&outcome_message(outcome));
        }

        let summary = BatchSummary::from_outcomes(&outcomes);
        self.output_message(&json!({
            "type": "SUMMARY",
            "total": summary.total,
            "succeeded": summary.succeeded,
            "failed": summary.failed,
            "results": summary.results,
            "duration_ms": start.elapsed().as_millis() as u64,
        }));
        Ok(())
    }

    fn show_config(&self) -> Result<()> {
        let config = self.load_config()?;
        self.output_message(&config.to_redacted_json());
        Ok(())
    }

    /// Output a message in the selected format
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Queries in a batch file: trimmed, skipping blank lines and `#` comments
pub fn read_queries(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

fn outcome_message(outcome: &BatchOutcome) -> Value {
    let elapsed_ms = outcome.elapsed.as_millis() as u64;
    match &outcome.result {
        Ok(response) => json!({
            "type": "RESULT",
            "id": outcome.id,
            "status": "SUCCEEDED",
            "elapsed_ms": elapsed_ms,
            "response": response,
        }),
        Err(e) => json!({
            "type": "RESULT",
            "id": outcome.id,
            "status": "FAILED",
            "elapsed_ms": elapsed_ms,
            "error": {
                "kind": format!("{:?}", e.kind()),
                "message": e.to_string(),
                "status_code": e.status_code(),
            },
        }),
    }
}

fn print_response(response: &SearchResponse) {
    println!(
        "{} results for \"{}\" ({}, {:.2}s)",
        response.total_results, response.query, response.search_type, response.search_time
    );
    for result in &response.results {
        println!();
        println!("{}. {}", result.position, result.title);
        println!("   {}", result.url);
        if !result.snippet.is_empty() {
            println!("   {}", result.snippet);
        }
    }
    if let Some(token) = &response.next_page_token {
        println!();
        println!("More results available (next page token: {token})");
    }
}
