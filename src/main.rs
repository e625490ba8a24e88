//! # DSA Daily
//!
//! A scheduled content generator that asks Gemini for a batch of Data
//! Structures & Algorithms articles, renders each one to Markdown, and keeps a
//! small state file so topics are never repeated.
//!
//! ## Usage
//!
//! ```sh
//! GEMINI_API_KEY=... dsa_daily
//! ```
//!
//! ## Architecture
//!
//! Each invocation performs exactly one run:
//! 1. **State**: load `generator/state.json` (day counter, used slugs)
//! 2. **Prompt**: ask for N new topics, excluding every used slug
//! 3. **Completion**: one `generateContent` call
//! 4. **Parsing**: strip fences, repair near-JSON, validate the batch size
//! 5. **Output**: allocate slugs, render Markdown, write `daily/day_NNN/`
//! 6. **Bookkeeping**: save the advanced state, rebuild `README.md`

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod prompt;
mod response;
mod slug;
mod state;
mod utils;

use api::GeminiClient;
use cli::Cli;
use config::Config;
use utils::ensure_writable_dir;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("dsa_daily starting up");

    let args = Cli::parse();
    debug!(?args.root, ?args.config, index_only = args.index_only, "Parsed CLI arguments");

    let config = Config::load(&args).await.inspect_err(|e| {
        error!(error = %e, "Invalid configuration");
    })?;
    info!(
        root = %config.root.display(),
        model = %config.model,
        count = config.articles_per_day,
        encoding = %config.field_encoding,
        "Configuration loaded"
    );

    if let Err(e) = ensure_writable_dir(&config.root).await {
        error!(
            path = %config.root.display(),
            error = %e,
            "Output root is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    if args.index_only {
        outputs::indexes::rebuild_index(&config).await?;
        info!(elapsed_ms = start_time.elapsed().as_millis() as u64, "Index rebuilt");
        return Ok(());
    }

    // Credential check happens before any network traffic.
    let client = GeminiClient::from_config(&config).inspect_err(|e| {
        error!(error = %e, "Cannot create completion client");
    })?;

    match pipeline::run(&config, &client).await {
        Ok(summary) => {
            let elapsed = start_time.elapsed();
            info!(
                ?elapsed,
                day = summary.day,
                articles = summary.slugs.len(),
                batch_dir = %summary.batch_dir.display(),
                "Execution complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            Err(e.into())
        }
    }
}
