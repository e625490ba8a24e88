//! Top-level index (`README.md`) generation.
//!
//! The index is rebuilt from scratch on every run by scanning the output
//! tree, so it always matches what is on disk:
//!
//! ```text
//! daily/
//! ├── day_001/
//! │   ├── binary_search.md
//! │   └── kmp_algorithm.md
//! └── day_002/
//!     └── segment_tree.md
//! ```
//!
//! Only directories named `day_<digits>` are considered, ordered by their
//! numeric index; inside each, every `*.md` file is listed by name.

use crate::config::Config;
use crate::error::{GeneratorError, Result};
use crate::utils::{humanize_slug, write_atomic};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;
use std::io::ErrorKind;
use std::path::{Component, Path};
use tokio::fs;
use tracing::{debug, info, instrument};

static BATCH_DIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^day_(\d+)$").expect("valid batch dir regex"));

const INDEX_HEADER: &str = "# Data Structures & Algorithms - Auto-Generated Encyclopedia\n\n\
This repository is automatically updated daily with new DSA articles generated using Google's Gemini API.\n\n\
## Daily Index\n";

/// One batch directory and the article slugs it contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchListing {
    pub index: u64,
    pub dir_name: String,
    pub slugs: Vec<String>,
}

/// List every batch directory under `daily_path`, ascending by batch index.
///
/// A missing directory yields an empty list.
#[instrument(level = "info", skip_all, fields(path = %daily_path.display()))]
pub async fn scan_batches(daily_path: &Path) -> Result<Vec<BatchListing>> {
    let mut entries = match fs::read_dir(daily_path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Output tree does not exist yet");
            return Ok(Vec::new());
        }
        Err(e) => return Err(GeneratorError::io(daily_path, e)),
    };

    let mut batches = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| GeneratorError::io(daily_path, e))?
    {
        let dir_name = entry.file_name().to_string_lossy().into_owned();
        let Some(index) = BATCH_DIR
            .captures(&dir_name)
            .and_then(|c| c[1].parse::<u64>().ok())
        else {
            continue;
        };
        let is_dir = entry
            .file_type()
            .await
            .map_err(|e| GeneratorError::io(entry.path(), e))?
            .is_dir();
        if !is_dir {
            continue;
        }

        let slugs = list_documents(&entry.path()).await?;
        batches.push(BatchListing {
            index,
            dir_name,
            slugs,
        });
    }

    batches.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.dir_name.cmp(&b.dir_name)));
    Ok(batches)
}

/// Stems of the `*.md` files directly inside `dir`, sorted.
pub async fn list_documents(dir: &Path) -> Result<Vec<String>> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(GeneratorError::io(dir, e)),
    };

    let mut slugs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| GeneratorError::io(dir, e))?
    {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "md") {
            continue;
        }
        let is_file = entry
            .file_type()
            .await
            .map_err(|e| GeneratorError::io(&path, e))?
            .is_file();
        if let (true, Some(stem)) = (is_file, path.file_stem()) {
            slugs.push(stem.to_string_lossy().into_owned());
        }
    }
    Ok(slugs.into_iter().sorted().collect())
}

/// Render the index document. `link_prefix` is the output directory as seen
/// from the index file, e.g. `daily`.
pub fn render_index(batches: &[BatchListing], link_prefix: &str) -> String {
    let mut md = String::from(INDEX_HEADER);
    let prefix = link_prefix.trim_end_matches('/');

    for batch in batches {
        writeln!(md, "\n### {}\n", humanize_slug(&batch.dir_name)).unwrap();
        for slug in &batch.slugs {
            let link = if prefix.is_empty() {
                format!("{}/{}.md", batch.dir_name, slug)
            } else {
                format!("{}/{}/{}.md", prefix, batch.dir_name, slug)
            };
            writeln!(md, "- [{}]({})", humanize_slug(slug), link).unwrap();
        }
    }
    md
}

/// Output directory relative to the index file, with `/` separators.
fn link_prefix(config: &Config) -> String {
    let daily = config.daily_path();
    let base = config
        .index_path()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let relative = daily.strip_prefix(&base).unwrap_or(&daily);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .join("/")
}

/// Rebuild the index file from the output tree and write it atomically.
#[instrument(level = "info", skip_all, fields(index = %config.index_path().display()))]
pub async fn rebuild_index(config: &Config) -> Result<()> {
    let batches = scan_batches(&config.daily_path()).await?;
    let md = render_index(&batches, &link_prefix(config));
    write_atomic(&config.index_path(), md.as_bytes()).await?;
    info!(
        batches = batches.len(),
        documents = batches.iter().map(|b| b.slugs.len()).sum::<usize>(),
        "Rebuilt index"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "# x\n").unwrap();
    }

    #[test]
    fn test_render_index_empty_is_header_only() {
        assert_eq!(render_index(&[], "daily"), INDEX_HEADER);
    }

    #[test]
    fn test_render_index_groups_by_batch() {
        let batches = vec![
            BatchListing {
                index: 1,
                dir_name: "day_001".into(),
                slugs: vec!["binary_search".into(), "kmp_algorithm_1".into()],
            },
            BatchListing {
                index: 2,
                dir_name: "day_002".into(),
                slugs: vec!["trie".into()],
            },
        ];
        let md = render_index(&batches, "daily");
        let expected = format!(
            "{INDEX_HEADER}\n### Day 001\n\n\
- [Binary Search](daily/day_001/binary_search.md)\n\
- [Kmp Algorithm 1](daily/day_001/kmp_algorithm_1.md)\n\
\n### Day 002\n\n\
- [Trie](daily/day_002/trie.md)\n"
        );
        assert_eq!(md, expected);
    }

    #[tokio::test]
    async fn test_scan_missing_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let batches = scan_batches(&tmp.path().join("daily")).await.unwrap();
        assert!(batches.is_empty());
    }

    #[tokio::test]
    async fn test_scan_orders_numerically_and_filters() {
        let tmp = tempfile::tempdir().unwrap();
        let daily = tmp.path().join("daily");
        touch(&daily.join("day_010").join("heap.md"));
        touch(&daily.join("day_002").join("trie.md"));
        touch(&daily.join("day_002").join("avl_tree.md"));
        touch(&daily.join("day_002").join("notes.txt"));
        touch(&daily.join("drafts").join("wip.md"));
        touch(&daily.join("day_003"));
        std::fs::create_dir_all(daily.join("day_1000")).unwrap();

        let batches = scan_batches(&daily).await.unwrap();
        let names: Vec<_> = batches.iter().map(|b| b.dir_name.as_str()).collect();
        assert_eq!(names, ["day_002", "day_010", "day_1000"]);
        assert_eq!(batches[0].slugs, ["avl_tree", "trie"]);
        assert!(batches[2].slugs.is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_index_writes_readme() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            root: tmp.path().to_path_buf(),
            ..Config::default()
        };
        touch(&config.daily_path().join("day_001").join("binary_search.md"));

        rebuild_index(&config).await.unwrap();

        let readme = std::fs::read_to_string(config.index_path()).unwrap();
        assert!(readme.starts_with("# Data Structures & Algorithms"));
        assert!(readme.contains("### Day 001"));
        assert!(readme.contains("- [Binary Search](daily/day_001/binary_search.md)"));
    }

    #[tokio::test]
    async fn test_rebuild_index_without_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config {
            root: tmp.path().to_path_buf(),
            ..Config::default()
        };
        rebuild_index(&config).await.unwrap();
        assert_eq!(std::fs::read_to_string(config.index_path()).unwrap(), INDEX_HEADER);
    }
}
