//! Long-only policy: which instruments may not be shorted.
//!
//! The simulator asks an injected [`LongOnlyPolicy`] whether to clip short
//! signals. New market classes plug in here without touching the simulator.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Decides whether an instrument is restricted to long or flat positions.
pub trait LongOnlyPolicy: Send + Sync {
    fn is_long_only(&self, symbol: &str) -> bool;
}

impl<F> LongOnlyPolicy for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_long_only(&self, symbol: &str) -> bool {
        self(symbol)
    }
}

/// Long-only when the upper-cased symbol contains any configured token.
///
/// The default token `.TW` covers Taiwan-listed tickers (`2330.TW`, `^TWO` does
/// not match, `6488.TWO` does).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTokenPolicy {
    tokens: Vec<String>,
}

impl SymbolTokenPolicy {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|t| t.as_ref().trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl LongOnlyPolicy for SymbolTokenPolicy {
    fn is_long_only(&self, symbol: &str) -> bool {
        let upper = symbol.to_uppercase();
        self.tokens.iter().any(|t| upper.contains(t.as_str()))
    }
}

/// Serializable policy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Symbol substrings marking long-only markets. Empty disables the override.
    pub long_only_tokens: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            long_only_tokens: vec![".TW".to_string()],
        }
    }
}

impl PolicyConfig {
    /// Build the policy, or `None` when no tokens are configured.
    pub fn build(&self) -> Option<Arc<dyn LongOnlyPolicy>> {
        let policy = SymbolTokenPolicy::new(&self.long_only_tokens);
        if policy.tokens().is_empty() {
            None
        } else {
            Some(Arc::new(policy))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_regional_suffix_case_insensitively() {
        let policy = SymbolTokenPolicy::new([".TW"]);
        assert!(policy.is_long_only("2330.TW"));
        assert!(policy.is_long_only("2330.tw"));
        assert!(policy.is_long_only("6488.TWO"));
        assert!(!policy.is_long_only("NVDA"));
        assert!(!policy.is_long_only("^TWII"));
    }

    #[test]
    fn blank_tokens_are_dropped() {
        let policy = SymbolTokenPolicy::new(["", "  "]);
        assert!(policy.tokens().is_empty());
        assert!(!policy.is_long_only("ANYTHING"));
    }

    #[test]
    fn closures_are_policies() {
        let policy = |s: &str| s.ends_with(".KS");
        assert!(policy.is_long_only("005930.KS"));
        assert!(!policy.is_long_only("AAPL"));
    }

    #[test]
    fn empty_config_disables_override() {
        let config = PolicyConfig {
            long_only_tokens: vec![],
        };
        assert!(config.build().is_none());
        assert!(PolicyConfig::default().build().is_some());
    }
}
