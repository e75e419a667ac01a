//! Engine configuration.
//!
//! Consolidates the environment variables that shape bracket policy and
//! provides validated configuration.

use crate::bracket::{BracketPolicy, LadderPolicy, LadderStep, PowerOfTwoPolicy};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Bracket sizing policy
    pub bracket_policy: BracketPolicy,
    /// Play a third-place match between the semifinal losers
    pub third_place_match: bool,
    /// Smallest field that may enter the elimination stage
    pub min_elimination_teams: usize,
    /// Refuse to leave RR_COMPLETE while the round-robin integrity report has problems
    pub require_clean_round_robin: bool,
}

impl EngineConfig {
    /// Load configuration from environment variables
    ///
    /// Recognised variables:
    /// - `BRACKET_POLICY`: `ladder` or `power_of_two` (default: ladder)
    /// - `BRACKET_LADDER`: comma-separated `max_teams:bracket_size` steps
    ///   (default: `8:4,16:8,24:16,32:32`)
    /// - `BRACKET_LADDER_FALLBACK`: bracket size above the last step (default: 64)
    /// - `THIRD_PLACE_MATCH`: bool (default: false)
    /// - `MIN_ELIMINATION_TEAMS`: (default: 2)
    /// - `REQUIRE_CLEAN_ROUND_ROBIN`: bool (default: true)
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::development();

        let bracket_policy = match std::env::var("BRACKET_POLICY") {
            Err(_) => BracketPolicy::Ladder(ladder_from_env()?),
            Ok(value) => match value.to_lowercase().as_str() {
                "ladder" => BracketPolicy::Ladder(ladder_from_env()?),
                "power_of_two" | "pow2" => BracketPolicy::PowerOfTwo(PowerOfTwoPolicy),
                other => {
                    return Err(ConfigError::Invalid {
                        var: "BRACKET_POLICY".to_string(),
                        reason: format!("Unknown policy '{other}', expected ladder or power_of_two"),
                    });
                }
            },
        };

        Ok(Self {
            bracket_policy,
            third_place_match: parse_env_or("THIRD_PLACE_MATCH", defaults.third_place_match),
            min_elimination_teams: parse_env_or(
                "MIN_ELIMINATION_TEAMS",
                defaults.min_elimination_teams,
            ),
            require_clean_round_robin: parse_env_or(
                "REQUIRE_CLEAN_ROUND_ROBIN",
                defaults.require_clean_round_robin,
            ),
        })
    }

    /// Default configuration: the standard ladder, no third-place match
    pub fn development() -> Self {
        Self {
            bracket_policy: BracketPolicy::default(),
            third_place_match: false,
            min_elimination_teams: 2,
            require_clean_round_robin: true,
        }
    }

    pub fn with_third_place_match(mut self, enabled: bool) -> Self {
        self.third_place_match = enabled;
        self
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_elimination_teams < 2 {
            return Err(ConfigError::Invalid {
                var: "MIN_ELIMINATION_TEAMS".to_string(),
                reason: "Must be at least 2".to_string(),
            });
        }

        let BracketPolicy::Ladder(ladder) = &self.bracket_policy else {
            return Ok(());
        };

        let is_bracket = |size: u32| size >= 2 && size.is_power_of_two();
        let mut previous: Option<LadderStep> = None;
        for step in &ladder.steps {
            if !is_bracket(step.bracket_size) {
                return Err(ConfigError::Invalid {
                    var: "BRACKET_LADDER".to_string(),
                    reason: format!(
                        "Bracket size {} is not a power of two of at least 2",
                        step.bracket_size
                    ),
                });
            }
            if let Some(prev) = previous {
                if step.max_teams <= prev.max_teams {
                    return Err(ConfigError::Invalid {
                        var: "BRACKET_LADDER".to_string(),
                        reason: format!(
                            "Team thresholds must increase ({} after {})",
                            step.max_teams, prev.max_teams
                        ),
                    });
                }
                if step.bracket_size < prev.bracket_size {
                    return Err(ConfigError::Invalid {
                        var: "BRACKET_LADDER".to_string(),
                        reason: "Bracket sizes must not shrink as fields grow".to_string(),
                    });
                }
            }
            previous = Some(*step);
        }

        if !is_bracket(ladder.fallback)
            || previous.is_some_and(|last| ladder.fallback < last.bracket_size)
        {
            return Err(ConfigError::Invalid {
                var: "BRACKET_LADDER_FALLBACK".to_string(),
                reason: format!(
                    "{} must be a power of two no smaller than the last ladder step",
                    ladder.fallback
                ),
            });
        }

        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::development()
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

fn ladder_from_env() -> Result<LadderPolicy, ConfigError> {
    let defaults = LadderPolicy::default();
    let steps = match std::env::var("BRACKET_LADDER") {
        Ok(raw) => parse_ladder(&raw)?,
        Err(_) => defaults.steps,
    };
    let fallback = parse_env_or("BRACKET_LADDER_FALLBACK", defaults.fallback);
    Ok(LadderPolicy::new(steps, fallback))
}

/// Parse `max_teams:bracket_size` pairs separated by commas
pub fn parse_ladder(raw: &str) -> Result<Vec<LadderStep>, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: "BRACKET_LADDER".to_string(),
        reason,
    };

    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (max_teams, bracket_size) = part
                .split_once(':')
                .ok_or_else(|| invalid(format!("'{part}' is not max_teams:bracket_size")))?;
            Ok(LadderStep {
                max_teams: max_teams
                    .trim()
                    .parse()
                    .map_err(|_| invalid(format!("'{max_teams}' is not a team count")))?,
                bracket_size: bracket_size
                    .trim()
                    .parse()
                    .map_err(|_| invalid(format!("'{bracket_size}' is not a bracket size")))?,
            })
        })
        .collect()
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 6] = [
        "BRACKET_POLICY",
        "BRACKET_LADDER",
        "BRACKET_LADDER_FALLBACK",
        "THIRD_PLACE_MATCH",
        "MIN_ELIMINATION_TEAMS",
        "REQUIRE_CLEAN_ROUND_ROBIN",
    ];

    fn clear_env() {
        for var in VARS {
            // SAFETY: tests touching the environment run serially
            unsafe { std::env::remove_var(var) };
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: tests touching the environment run serially
        unsafe { std::env::set_var(key, value) };
    }

    #[test]
    fn test_parse_ladder() {
        let steps = parse_ladder("8:4, 16:8,24:16").unwrap();
        assert_eq!(steps.len(), 3);
        assert_eq!(
            steps[2],
            LadderStep {
                max_teams: 24,
                bracket_size: 16
            }
        );
        assert!(parse_ladder("8-4").is_err());
        assert!(parse_ladder("eight:4").is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.third_place_match);
    }

    #[test]
    fn test_validation_rejects_odd_bracket() {
        let config = EngineConfig {
            bracket_policy: BracketPolicy::Ladder(LadderPolicy::new(
                vec![LadderStep {
                    max_teams: 8,
                    bracket_size: 6,
                }],
                64,
            )),
            ..EngineConfig::development()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_validation_rejects_unordered_ladder() {
        let config = EngineConfig {
            bracket_policy: BracketPolicy::Ladder(LadderPolicy::new(
                parse_ladder("16:8,8:4").unwrap(),
                64,
            )),
            ..EngineConfig::development()
        };
        assert!(config.validate().is_err());

        let small_fallback = EngineConfig {
            bracket_policy: BracketPolicy::Ladder(LadderPolicy::new(
                parse_ladder("8:4,16:8").unwrap(),
                4,
            )),
            ..EngineConfig::development()
        };
        assert!(small_fallback.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_single_team_elimination() {
        let config = EngineConfig {
            min_elimination_teams: 1,
            ..EngineConfig::development()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = EngineConfig::from_env().unwrap();
        assert_eq!(config, EngineConfig::development());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        set_env("BRACKET_LADDER", "4:2,12:8");
        set_env("BRACKET_LADDER_FALLBACK", "16");
        set_env("THIRD_PLACE_MATCH", "true");
        let config = EngineConfig::from_env().unwrap();
        clear_env();

        assert!(config.third_place_match);
        assert_eq!(
            config.bracket_policy,
            BracketPolicy::Ladder(LadderPolicy::new(parse_ladder("4:2,12:8").unwrap(), 16))
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_power_of_two() {
        clear_env();
        set_env("BRACKET_POLICY", "power_of_two");
        let config = EngineConfig::from_env().unwrap();
        clear_env();
        assert_eq!(
            config.bracket_policy,
            BracketPolicy::PowerOfTwo(PowerOfTwoPolicy)
        );
    }

    #[test]
    #[serial]
    fn test_from_env_unknown_policy() {
        clear_env();
        set_env("BRACKET_POLICY", "swiss");
        let result = EngineConfig::from_env();
        clear_env();
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    #[serial]
    fn test_from_env_bad_ladder_without_policy() {
        clear_env();
        set_env("BRACKET_LADDER", "4:two");
        let result = EngineConfig::from_env();
        clear_env();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { ref var, .. }) if var == "BRACKET_LADDER"
        ));
    }
}
