//! RON settings file for the `harvest` binary.
//!
//! Every field is optional; durations are in milliseconds. Command-line
//! flags win over file values, which win over the engine defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use harvester_engine::{DataTablesSettings, WalkSettings};
use ron::extensions::Extensions;
use serde::Deserialize;

use crate::cli::Cli;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestConfig {
    pub endpoint: Option<String>,
    pub source_param: Option<String>,
    pub columns: Option<Vec<String>>,
    pub page_length: Option<u32>,
    pub max_bytes: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub call_timeout_ms: Option<u64>,
    pub settle_delay_ms: Option<u64>,
    pub retry_delay_ms: Option<u64>,
    pub max_attempts: Option<u32>,
    pub stall_threshold: Option<u32>,
    pub page_limit: Option<u32>,
}

impl HarvestConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("could not read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Parse RON text; bare values are accepted for optional fields.
    pub fn parse(text: &str) -> Result<Self> {
        let options = ron::Options::default().with_default_extension(Extensions::IMPLICIT_SOME);
        Ok(options.from_str(text)?)
    }

    /// Fold command-line overrides into the file values.
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        if cli.endpoint.is_some() {
            self.endpoint = cli.endpoint.clone();
        }
        if cli.page_length.is_some() {
            self.page_length = cli.page_length;
        }
        if cli.page_limit.is_some() {
            self.page_limit = cli.page_limit;
        }
        self
    }

    pub fn walk_settings(&self) -> WalkSettings {
        let defaults = WalkSettings::default();
        WalkSettings {
            call_timeout: millis_or(self.call_timeout_ms, defaults.call_timeout),
            settle_delay: millis_or(self.settle_delay_ms, defaults.settle_delay),
            retry_delay: millis_or(self.retry_delay_ms, defaults.retry_delay),
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts).max(1),
            stall_threshold: self.stall_threshold.unwrap_or(defaults.stall_threshold),
            page_limit: self.page_limit.or(defaults.page_limit),
        }
    }

    pub fn datatables_settings(&self) -> DataTablesSettings {
        let defaults = DataTablesSettings::default();
        DataTablesSettings {
            page_length: self.page_length.unwrap_or(defaults.page_length),
            source_param: self
                .source_param
                .clone()
                .unwrap_or(defaults.source_param),
            columns: self.columns.clone().or(defaults.columns),
            connect_timeout: millis_or(self.connect_timeout_ms, defaults.connect_timeout),
            request_timeout: millis_or(self.request_timeout_ms, defaults.request_timeout),
            max_bytes: self.max_bytes.unwrap_or(defaults.max_bytes),
        }
    }
}

fn millis_or(value: Option<u64>, default: Duration) -> Duration {
    value.map_or(default, Duration::from_millis)
}
