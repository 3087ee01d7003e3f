use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show critical errors
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show detailed information
    Verbose,
}

/// Severity applied to failed remote URI checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UriSeverityArg {
    Error,
    #[default]
    Warning,
}

/// Metadata validation tool for Omeka S collections
#[derive(Parser, Debug, Clone)]
#[command(name = "validate-omeka")]
#[command(about = "Validate item and media metadata of an Omeka S collection")]
#[command(version)]
pub struct Cli {
    /// Base URL of the Omeka S API
    #[arg(long = "base-url", help = "Base URL of the API, e.g. https://host/api")]
    pub base_url: Option<String>,

    /// Restrict validation to one item set
    #[arg(long = "item-set-id")]
    pub item_set_id: Option<u64>,

    /// Path to the vocabulary dataset (JSON)
    #[arg(long = "vocabularies", help = "Vocabulary dataset file")]
    pub vocabularies: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Maximum concurrent API requests
    #[arg(long = "concurrency")]
    pub concurrency: Option<usize>,

    /// Probe every URI-typed field value over HTTP
    #[arg(long = "check-uris")]
    pub check_uris: bool,

    /// Report cross-domain redirects during URI checks
    #[arg(long = "check-redirects", requires = "check_uris")]
    pub check_redirects: bool,

    /// Severity for failed URI checks (404 is always an error)
    #[arg(long = "uri-check-severity", value_enum)]
    pub uri_check_severity: Option<UriSeverityArg>,

    /// Write the plain-text report to this file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Export findings as CSV files
    #[arg(long = "export-csv")]
    pub export_csv: bool,

    /// Directory for CSV exports
    #[arg(long = "csv-dir")]
    pub csv_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_basic_cli_parsing() {
        let args = vec!["validate-omeka", "--base-url", "https://omeka.example.org/api"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(
            cli.base_url.as_deref(),
            Some("https://omeka.example.org/api")
        );
        // Unset flags stay unset so lower layers can supply the values.
        assert_eq!(cli.vocabularies, None);
        assert_eq!(cli.timeout, None);
        assert_eq!(cli.uri_check_severity, None);
        assert_eq!(cli.csv_dir, None);
        assert!(!cli.check_uris);
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        let args = vec!["validate-omeka", "--verbose", "--quiet"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_check_redirects_requires_check_uris() {
        let args = vec!["validate-omeka", "--check-redirects"];
        assert!(Cli::try_parse_from(args).is_err());

        let args = vec!["validate-omeka", "--check-uris", "--check-redirects"];
        assert!(Cli::try_parse_from(args).is_ok());
    }

    #[test]
    fn test_uri_severity_parsing() {
        let args = vec![
            "validate-omeka",
            "--check-uris",
            "--uri-check-severity",
            "error",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.uri_check_severity, Some(UriSeverityArg::Error));
    }

    #[test]
    fn test_verbosity_levels() {
        let cli = Cli::try_parse_from(vec!["validate-omeka"]).unwrap();
        assert_eq!(cli.verbosity(), VerbosityLevel::Normal);

        let cli = Cli::try_parse_from(vec!["validate-omeka", "-v"]).unwrap();
        assert_eq!(cli.verbosity(), VerbosityLevel::Verbose);

        let cli = Cli::try_parse_from(vec!["validate-omeka", "-q"]).unwrap();
        assert_eq!(cli.verbosity(), VerbosityLevel::Quiet);
    }
}
