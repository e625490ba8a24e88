//! One generation run, end to end.
//!
//! ```text
//! load state → build prompt → complete → parse batch
//!            → allocate slugs + render (all in memory)
//!            → write documents → save state → rebuild index
//! ```
//!
//! Nothing touches the output tree or the state file until the whole batch
//! has been parsed and rendered. A failed run leaves the state file exactly
//! as it was, and a failed document write removes the documents already
//! written, so it can simply be retried.

use crate::api::Completion;
use crate::config::Config;
use crate::error::Result;
use crate::outputs::indexes::{list_documents, rebuild_index};
use crate::outputs::markdown::render_article;
use crate::prompt::build_prompt;
use crate::response::parse_batch;
use crate::slug::SlugAllocator;
use crate::state::State;
use crate::utils::{truncate_for_log, write_atomic};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, instrument, warn};

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Batch index that was written.
    pub day: u32,
    pub batch_dir: PathBuf,
    /// Slugs allocated in this run, in response order.
    pub slugs: Vec<String>,
}

/// Perform one full run against `client`.
///
/// # Errors
///
/// Any [`crate::error::GeneratorError`] from loading state, the completion
/// call, parsing, or writing output. On error, no document of this batch is
/// left on disk and the state file is unchanged.
#[instrument(level = "info", skip_all, fields(model = %config.model, count = config.articles_per_day))]
pub async fn run<C: Completion>(config: &Config, client: &C) -> Result<RunSummary> {
    let state_path = config.state_path();
    let state = State::load(&state_path).await?;

    let prompt = build_prompt(
        &state.used_slugs,
        config.articles_per_day,
        config.field_encoding,
    );
    debug!(prompt_len = prompt.len(), used = state.used_slugs.len(), "Built prompt");

    let raw = client.complete(&prompt).await?;
    let articles = parse_batch(&raw, config.articles_per_day, config.field_encoding)
        .inspect_err(|e| {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&raw, 300),
                "Model returned an unusable batch; nothing will be written"
            );
        })?;

    let batch_dir = config.daily_path().join(state.batch_dir_name());
    let mut allocator = SlugAllocator::new(state.used_slugs.iter().cloned());
    allocator.reserve(list_documents(&batch_dir).await?);

    let documents: Vec<(String, String)> = articles
        .iter()
        .map(|article| (allocator.allocate(&article.title), render_article(article)))
        .collect();

    write_batch(&batch_dir, &documents).await?;

    let day = state.day;
    let slugs: Vec<String> = documents.into_iter().map(|(slug, _)| slug).collect();
    state.advance(slugs.iter().cloned()).save(&state_path).await?;

    rebuild_index(config).await?;

    info!(day, articles = slugs.len(), batch_dir = %batch_dir.display(), "Run complete");
    Ok(RunSummary {
        day,
        batch_dir,
        slugs,
    })
}

/// Write every document of the batch, or none of them.
///
/// If any write fails, documents already written by this call are removed, as
/// is the batch directory when this call created it and it is empty again.
async fn write_batch(batch_dir: &Path, documents: &[(String, String)]) -> Result<()> {
    let dir_existed = fs::try_exists(batch_dir).await.unwrap_or(false);
    let mut written: Vec<PathBuf> = Vec::with_capacity(documents.len());

    for (slug, md) in documents {
        let path = batch_dir.join(format!("{slug}.md"));
        if let Err(e) = write_atomic(&path, md.as_bytes()).await {
            error!(path = %path.display(), error = %e, rollback = written.len(), "Write failed; removing partial batch");
            for done in &written {
                if let Err(rm) = fs::remove_file(done).await {
                    warn!(path = %done.display(), error = %rm, "Could not remove partially written article");
                }
            }
            if !dir_existed {
                let _ = fs::remove_dir(batch_dir).await;
            }
            return Err(e);
        }
        info!(path = %path.display(), "Wrote article");
        written.push(path);
    }
    Ok(())
}
