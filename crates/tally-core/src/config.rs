//! Engine configuration

use tracing::warn;

/// What to do when a question resolves an entity but no month.
///
/// The safe default is to ask; `AllTime` instead widens the filter to the
/// whole dataset and reports no resolved month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthPolicy {
    #[default]
    Clarify,
    AllTime,
}

impl std::str::FromStr for MonthPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clarify" => Ok(Self::Clarify),
            "all-time" | "all_time" | "alltime" => Ok(Self::AllTime),
            _ => Err(format!("Unknown month policy: {}", s)),
        }
    }
}

/// Tunables for the query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Evidence rows returned when the caller does not pass a limit.
    pub default_evidence_limit: i64,
    /// Behavior for entity questions with no month.
    pub month_policy: MonthPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_evidence_limit: 20,
            month_policy: MonthPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Read configuration from `TALLY_MONTH_POLICY` and
    /// `TALLY_EVIDENCE_LIMIT`, falling back to defaults on anything
    /// unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("TALLY_MONTH_POLICY") {
            match value.parse() {
                Ok(policy) => config.month_policy = policy,
                Err(e) => warn!("Ignoring TALLY_MONTH_POLICY: {}", e),
            }
        }

        if let Ok(value) = std::env::var("TALLY_EVIDENCE_LIMIT") {
            match value.parse::<i64>() {
                Ok(limit) if limit > 0 => config.default_evidence_limit = limit,
                _ => warn!("Ignoring TALLY_EVIDENCE_LIMIT: expected a positive integer"),
            }
        }

        config
    }
}
