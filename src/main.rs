use std::sync::Arc;

use anyhow::Context;

use validate_omeka::api::{ApiClientConfig, OmekaClient};
use validate_omeka::cli::{Cli, UriSeverityArg, VerbosityLevel};
use validate_omeka::config::ConfigManager;
use validate_omeka::engine::{FieldFinding, Severity, ValidationRun};
use validate_omeka::model::ResourceKind;
use validate_omeka::output::{Output, export_csv};
use validate_omeka::uri_check::{UriCheckConfig, UriCheckSeverity, UriChecker};
use validate_omeka::vocabulary::VocabularyIndex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    let config = ConfigManager::load_config(&cli)
        .await
        .context("Failed to load configuration")?;

    let verbosity = if config.output.quiet {
        VerbosityLevel::Quiet
    } else if config.output.verbose {
        VerbosityLevel::Verbose
    } else {
        VerbosityLevel::Normal
    };
    let output = Output::new(verbosity);

    // A partial vocabulary would make every membership check meaningless, so
    // a load failure is fatal.
    let vocabulary = VocabularyIndex::load(&config.vocabulary.path)
        .context("Failed to load vocabulary dataset")?;

    let base_url = config
        .api
        .base_url
        .clone()
        .context("API base URL is required")?;

    let client = Arc::new(OmekaClient::new(ApiClientConfig {
        base_url: base_url.clone(),
        item_set_id: config.api.item_set_id,
        timeout_seconds: config.api.timeout_seconds,
        max_concurrent_requests: config.api.max_concurrent_requests,
        ..Default::default()
    })?);

    if verbosity >= VerbosityLevel::Normal {
        eprintln!("Fetching items from {base_url} ...");
    }
    let items = client.fetch_items().await.context("Failed to fetch items")?;

    let item_ids: Vec<u64> = items.iter().map(|r| r.id).collect();
    if verbosity >= VerbosityLevel::Normal {
        eprintln!("Fetching media for {} items ...", item_ids.len());
    }
    let (media, failed_items) = client.fetch_all_media(&item_ids).await?;

    let run = ValidationRun::new(&vocabulary);
    let mut report = run.validate_batch(&items, &media);

    // Items whose media could not be fetched are validated without media
    // context; note that rather than failing the run.
    let mut extra: Vec<FieldFinding> = failed_items
        .iter()
        .map(|&id| FieldFinding {
            resource_kind: ResourceKind::Item,
            resource_id: id,
            field_name: "o:media".to_string(),
            occurrence_index: None,
            severity: Severity::Warning,
            message: "Media could not be fetched; media checks skipped".to_string(),
        })
        .collect();

    if config.checks.check_uris {
        if verbosity >= VerbosityLevel::Normal {
            eprintln!("Checking remote URIs ...");
        }
        let checker = Arc::new(UriChecker::new(UriCheckConfig {
            timeout_seconds: config.api.timeout_seconds,
            max_concurrent_requests: config.api.max_concurrent_requests,
            check_redirects: config.checks.check_redirects,
            severity: match config.checks.uri_check_severity {
                UriSeverityArg::Error => UriCheckSeverity::Error,
                UriSeverityArg::Warning => UriCheckSeverity::Warning,
            },
            ..Default::default()
        })?);
        extra.extend(checker.check_records(&items).await?);
        extra.extend(checker.check_records(&media).await?);
    }

    report.merge_findings(extra, &items, &media);

    print!("{}", output.format_report(&report));

    if let Some(report_path) = &config.output.report_path {
        output.save_report(&report, report_path)?;
        if verbosity >= VerbosityLevel::Normal {
            eprintln!("Report written to {}", report_path.display());
        }
    }

    if config.output.export_csv {
        let written = export_csv(&report, &config.output.csv_dir, &base_url)?;
        if verbosity >= VerbosityLevel::Normal {
            for path in written {
                eprintln!("CSV written to {}", path.display());
            }
        }
    }

    if report.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}
