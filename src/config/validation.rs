//! Configuration validation

use super::Config;
use tracing::{error, warn};

const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Emit diagnostics through the log (stdout belongs to the transport).
    pub fn log_diagnostics(&self) {
        for warning in &self.warnings {
            warn!("{}", warning);
        }
        for err in &self.errors {
            error!("{}", err);
        }
    }
}

/// Validate configuration and return warnings/errors
pub fn validate(config: &Config) -> ValidationResult {
    let mut result = ValidationResult::new();

    validate_logging(config, &mut result);
    validate_tables(config, &mut result);

    result
}

fn validate_logging(config: &Config, result: &mut ValidationResult) {
    let logging = &config.logging;

    if !LOG_FORMATS.contains(&logging.format.as_str()) {
        result.error(format!(
            "logging.format: unknown format '{}' (expected one of {})",
            logging.format,
            LOG_FORMATS.join(", ")
        ));
    }

    if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
        result.warn(format!(
            "logging.level: unknown level '{}', using info",
            logging.level
        ));
    }
}

fn validate_tables(config: &Config, result: &mut ValidationResult) {
    if config.tables.fdb_capacity == Some(0) {
        result.error("tables.fdb_capacity: must be at least 1");
    }
    if config.tables.arp_capacity == Some(0) {
        result.error("tables.arp_capacity: must be at least 1");
    }
}
