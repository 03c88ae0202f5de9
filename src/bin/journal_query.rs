//! journal-query: Query the journal from the command line
//!
//! Reads a JSON query from stdin, prints the match count, then each matching
//! message as one JSON line.
//!
//! ## Usage
//! ```text
//! echo '{"topic": ["irc.*"], "payload": {"channel": "#rbot"}}' \
//!     | journal-query --limit 20 --offset 0
//! ```
//! Empty stdin matches every message.
//!
//! ## Configuration
//! - `--config PATH`: YAML config file (see `journal::config::Config::load`)
//! - `JOURNAL_CONFIG`, `JOURNAL__STORAGE__POSTGRES__URI`, `DATABASE_URL`
//! - `JOURNAL_LOG`: tracing filter (default: info)

use std::io::Read;

use clap::Parser;
use tracing::info;

use journal::config::Config;
use journal::interfaces::{JournalStore, DEFAULT_FIND_LIMIT};
use journal::query::Query;
use journal::storage::init_storage;
use journal::utils::bootstrap::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "journal-query", about = "Query the journal from stdin")]
struct Args {
    /// YAML config file
    #[arg(long, env = "JOURNAL_CONFIG")]
    config: Option<String>,

    /// Maximum number of messages to print
    #[arg(long, default_value_t = DEFAULT_FIND_LIMIT)]
    limit: u64,

    /// Matching messages to skip before printing
    #[arg(long, default_value_t = 0)]
    offset: u64,
}

fn read_query() -> Result<Query, Box<dyn std::error::Error>> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    if input.trim().is_empty() {
        return Ok(Query::new());
    }
    Ok(serde_json::from_str(&input)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let query = read_query()?;

    let mut journal = init_storage(&config).await?;

    let total = journal.count(&query).await?;
    println!("{}", total);

    let messages = journal.find(&query, args.limit, args.offset).await?;
    for message in &messages {
        println!("{}", serde_json::to_string(message)?);
    }

    info!(
        total,
        shown = messages.len(),
        limit = args.limit,
        offset = args.offset,
        "journal-query complete"
    );

    journal.close().await?;
    Ok(())
}
