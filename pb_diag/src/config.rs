//! Diagnostics configuration.
//!
//! Consolidates CLI overrides and environment variable reads into one
//! validated configuration.

use pickleball_engine::EngineConfig;
use std::path::PathBuf;
use std::str::FromStr;

/// Which reports to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Integrity,
    Standings,
    Bracket,
    All,
}

impl FromStr for ReportKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "integrity" | "rr" => Ok(Self::Integrity),
            "standings" => Ok(Self::Standings),
            "bracket" | "playin" => Ok(Self::Bracket),
            "all" => Ok(Self::All),
            other => Err(ConfigError::Invalid {
                var: "DIAG_REPORT".to_string(),
                reason: format!(
                    "Unknown report '{other}', expected integrity, standings, bracket or all"
                ),
            }),
        }
    }
}

/// Complete diagnostics configuration
#[derive(Debug, Clone)]
pub struct DiagConfig {
    /// Division snapshot JSON to inspect
    pub snapshot_path: PathBuf,
    pub report: ReportKind,
    /// Emit JSON instead of text
    pub json: bool,
    /// Exit non-zero when the round-robin integrity report has problems
    pub check: bool,
    pub engine: EngineConfig,
}

impl DiagConfig {
    /// Load configuration, letting CLI values override the environment
    ///
    /// # Errors
    ///
    /// Returns error if no snapshot path is given or a value cannot be parsed
    pub fn from_env(
        snapshot_override: Option<PathBuf>,
        report_override: Option<ReportKind>,
        json: bool,
        check: bool,
    ) -> Result<Self, ConfigError> {
        let snapshot_path = snapshot_override
            .or_else(|| std::env::var("DIVISION_SNAPSHOT").ok().map(PathBuf::from))
            .ok_or_else(|| ConfigError::MissingRequired {
                var: "DIVISION_SNAPSHOT".to_string(),
                hint: "Pass --snapshot PATH or export a division snapshot as JSON".to_string(),
            })?;

        let report = match report_override {
            Some(report) => report,
            None => match std::env::var("DIAG_REPORT") {
                Ok(value) => value.parse()?,
                Err(_) => ReportKind::All,
            },
        };

        let engine = EngineConfig::from_env()?;

        Ok(Self {
            snapshot_path,
            report,
            json,
            check,
            engine,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if !self.snapshot_path.is_file() {
            return Err(ConfigError::Invalid {
                var: "DIVISION_SNAPSHOT".to_string(),
                reason: format!("{} is not a readable file", self.snapshot_path.display()),
            });
        }
        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error(transparent)]
    Engine(#[from] pickleball_engine::ConfigError),
}
