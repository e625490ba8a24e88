//! Persistent run state.
//!
//! The state file records which batch comes next and every slug ever handed
//! out, so the model can be told to avoid repeats and slugs are never reused.
//!
//! ```json
//! {
//!   "day": 4,
//!   "used_slugs": ["binary_search", "kmp_algorithm"]
//! }
//! ```
//!
//! The file is read once at the start of a run and replaced once at the end,
//! only after the whole batch has been written.

use crate::error::{GeneratorError, Result};
use crate::utils::write_atomic;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Index of the next batch. Starts at 1.
    pub day: u32,
    /// Every slug allocated so far, in allocation order.
    #[serde(default)]
    pub used_slugs: Vec<String>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            day: 1,
            used_slugs: Vec::new(),
        }
    }
}

impl State {
    /// State for the next run: `day + 1`, with `new_slugs` appended.
    ///
    /// The existing history is kept exactly as loaded. A new slug that is
    /// already recorded (or repeated within `new_slugs`) is appended once at most.
    pub fn advance<I>(self, new_slugs: I) -> State
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen: HashSet<String> = self.used_slugs.iter().cloned().collect();
        let mut used_slugs = self.used_slugs;
        used_slugs.extend(new_slugs.into_iter().filter(|s| seen.insert(s.clone())));
        State {
            day: self.day + 1,
            used_slugs,
        }
    }

    /// Zero-padded batch directory name for this state's day, e.g. `day_007`.
    pub fn batch_dir_name(&self) -> String {
        format!("day_{:03}", self.day)
    }

    /// Read the state file, or the default state if it does not exist.
    ///
    /// # Errors
    ///
    /// [`GeneratorError::State`] if the file exists but is not a valid state
    /// record, [`GeneratorError::Io`] if it cannot be read.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<State> {
        let text = match fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No state file; starting at day 1");
                return Ok(State::default());
            }
            Err(e) => return Err(GeneratorError::io(path, e)),
        };

        let state: State = serde_json::from_str(&text).map_err(|source| GeneratorError::State {
            path: path.to_path_buf(),
            source,
        })?;
        info!(day = state.day, used = state.used_slugs.len(), "Loaded state");
        Ok(state)
    }

    /// Atomically replace the state file with this state.
    #[instrument(level = "info", skip_all, fields(path = %path.display(), day = self.day))]
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| GeneratorError::State {
            path: path.to_path_buf(),
            source,
        })?;
        write_atomic(path, json.as_bytes()).await?;
        info!(used = self.used_slugs.len(), "Saved state");
        Ok(())
    }
}
