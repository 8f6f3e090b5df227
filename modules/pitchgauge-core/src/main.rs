//! pitchgauge CLI: evaluate one startup idea from the terminal.

use std::io::Read;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use model_client::Claude;
use pitchgauge_common::Config;
use pitchgauge_core::{AggregationMode, Evaluator};

#[derive(Parser)]
#[command(
    name = "pitchgauge",
    about = "Score a startup idea and produce a SWOT report"
)]
struct Cli {
    /// Idea text; read from stdin when omitted.
    idea: Option<String>,

    /// Score whatever metrics come back instead of failing on gaps.
    #[arg(long)]
    lenient: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("pitchgauge_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_redacted();

    let idea = match cli.idea {
        Some(idea) => idea,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    if idea.trim().is_empty() {
        bail!("no idea text provided");
    }

    let model = Arc::new(Claude::new(&config.anthropic_api_key, &config.model));
    let mut evaluator = Evaluator::new(model);
    if cli.lenient {
        evaluator = evaluator.with_aggregation_mode(AggregationMode::Lenient);
    }

    let result = evaluator.run(idea.trim()).await?;
    println!("{result}");
    Ok(())
}
