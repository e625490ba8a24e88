//! Command-line interface definitions.
//!
//! Every argument is optional: running the binary with no arguments performs
//! one full generation run in the current directory with default settings.

use crate::models::FieldEncoding;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the daily DSA article generator.
///
/// # Examples
///
/// ```sh
/// # One run in the current repository
/// GEMINI_API_KEY=... dsa_daily
///
/// # Explicit root and config file
/// dsa_daily --root ./kb --config generator/config.yaml
///
/// # Regenerate README.md from the existing tree without calling the model
/// dsa_daily --index-only
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Root directory of the knowledge base (defaults to the current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Gemini model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Number of articles to request in this batch
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Field encoding the model is asked to use: `base64` or `plain`
    #[arg(long)]
    pub encoding: Option<FieldEncoding>,

    /// Gemini API key (otherwise read from the variable named by `api_key_env`)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Only rebuild the index from the existing output tree
    #[arg(long)]
    pub index_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_no_arguments() {
        let cli = Cli::parse_from(["dsa_daily"]);
        assert!(cli.root.is_none());
        assert!(cli.config.is_none());
        assert!(cli.count.is_none());
        assert!(!cli.index_only);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "dsa_daily",
            "-r",
            "/tmp/kb",
            "-c",
            "/tmp/kb/config.yaml",
            "-m",
            "gemini-2.0-flash",
            "-n",
            "3",
        ]);

        assert_eq!(cli.root, Some(PathBuf::from("/tmp/kb")));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/kb/config.yaml")));
        assert_eq!(cli.model.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(cli.count, Some(3));
    }

    #[test]
    fn test_cli_encoding_and_index_only() {
        let cli = Cli::parse_from(["dsa_daily", "--encoding", "plain", "--index-only"]);
        assert_eq!(cli.encoding, Some(FieldEncoding::Plain));
        assert!(cli.index_only);

        assert!(Cli::try_parse_from(["dsa_daily", "--encoding", "rot13"]).is_err());
    }

    #[test]
    fn test_cli_api_key_flag() {
        let cli = Cli::parse_from(["dsa_daily", "--api-key", "k-123"]);
        assert_eq!(cli.api_key.as_deref(), Some("k-123"));
    }
}
