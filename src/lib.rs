//! # validate-omeka Library
//!
//! An async Rust library for validating the item and media metadata of an
//! Omeka S collection: classification-notation parsing, controlled-vocabulary
//! membership, per-field schema validation and optional remote URI checks.

pub mod api;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod iso639;
pub mod model;
pub mod notation;
pub mod output;
pub mod schema;
pub mod uri_check;
pub mod vocabulary;

pub use api::{ApiClientConfig, OmekaClient};
pub use cli::{Cli, UriSeverityArg, VerbosityLevel};
pub use config::{Config, ConfigManager, EnvProvider, SystemEnvProvider};
pub use engine::{
    FieldFinding, FieldValidationEngine, PrivacyContext, Severity, ValidationReport,
    ValidationRun, has_placeholder_media,
};
pub use error::{ConfigError, FormatError, ValidateError, VocabularyLoadError};
pub use model::{FieldValue, ItemRecord, MediaRecord, Record, ResourceKind, ValueKind};
pub use notation::{ClassificationNotation, decompose};
pub use output::{Output, admin_link, export_csv};
pub use schema::{FieldRule, Requirement, SemanticType, rules_for};
pub use uri_check::{UriCheckConfig, UriCheckSeverity, UriChecker, UriStatus};
pub use vocabulary::{VocabularyIndex, VocabularySection, VocabularySet};
