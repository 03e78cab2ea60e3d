//! Logging setup.
//!
//! Log targets all live under `companion::` (`startup`, `api`, `ws`, `db`,
//! `catalog`, `assistant`, `prefs`). A preset picks the base levels, `--log`
//! flags adjust single targets, and `RUST_LOG` replaces both when set.

use std::collections::BTreeMap;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

const TARGET_PREFIX: &str = "companion::";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: '{}'. Use 'text' or 'json'.", s)),
        }
    }
}

/// Base verbosity chosen from CLI flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogPreset {
    /// Startup, API, and storage events; preference writes only on warning
    #[default]
    Production,
    Verbose,
    Debug,
    Trace,
    /// Warnings and errors only
    Quiet,
}

impl LogPreset {
    fn base_directives(self) -> &'static [&'static str] {
        match self {
            LogPreset::Production => &[
                "companion::startup=info",
                "companion::api=info",
                "companion::ws=info",
                "companion::db=info",
                "companion::catalog=info",
                "companion::assistant=info",
                "companion::prefs=warn",
                "tower_http=warn",
            ],
            LogPreset::Verbose => &["companion=info", "tower_http=info"],
            LogPreset::Debug => &["companion=debug", "companion::prefs=info", "tower_http=debug"],
            LogPreset::Trace => &["companion=trace", "tower_http=trace"],
            LogPreset::Quiet => &["companion=warn", "tower_http=error"],
        }
    }
}

/// Logging configuration built from CLI arguments.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub preset: LogPreset,
    /// Per-target levels, keyed by full target name
    pub overrides: BTreeMap<String, LevelFilter>,
    pub format: LogFormat,
}

impl LogConfig {
    /// Build from CLI flags. The quietest flag wins when several are given.
    pub fn from_cli(
        verbose: bool,
        debug: bool,
        trace: bool,
        quiet: bool,
        log_overrides: Vec<String>,
        format: LogFormat,
    ) -> Self {
        let preset = match (quiet, trace, debug, verbose) {
            (true, ..) => LogPreset::Quiet,
            (_, true, ..) => LogPreset::Trace,
            (_, _, true, _) => LogPreset::Debug,
            (_, _, _, true) => LogPreset::Verbose,
            _ => LogPreset::Production,
        };

        let overrides = log_overrides
            .iter()
            .flat_map(|arg| arg.split(','))
            .filter_map(parse_override)
            .collect();

        Self {
            preset,
            overrides,
            format,
        }
    }

    /// Filter directives: preset first, then overrides so they take precedence.
    pub fn directives(&self) -> Vec<String> {
        let mut directives: Vec<String> = self
            .preset
            .base_directives()
            .iter()
            .map(|d| d.to_string())
            .collect();
        directives.extend(
            self.overrides
                .iter()
                .map(|(target, level)| format!("{}={}", target, level.to_string().to_lowercase())),
        );
        directives
    }

    pub fn build_filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }
        EnvFilter::try_new(self.directives().join(",")).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Parse `target=level`, qualifying bare targets with `companion::`.
fn parse_override(part: &str) -> Option<(String, LevelFilter)> {
    let (target, level) = part.split_once('=')?;
    let target = target.trim();
    let level: LevelFilter = level.trim().to_lowercase().parse().ok()?;

    let full_target = if target.starts_with(TARGET_PREFIX) || target == "companion" || target == "tower_http" {
        target.to_string()
    } else {
        format!("{}{}", TARGET_PREFIX, target)
    };
    Some((full_target, level))
}

/// Install the global subscriber.
pub fn init(config: &LogConfig) {
    let filter = config.build_filter();

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_thread_ids(false))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_events(FmtSpan::CLOSE),
                )
                .init();
        }
    }
}
