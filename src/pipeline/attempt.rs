//! Attempt records and scan reports.
//!
//! The escalation order is a first-class data structure: every strategy
//! the orchestrator tries is named by a [`Strategy`] value, and every try
//! appends a [`ScanAttempt`] to the report regardless of outcome, so the
//! full search trace is observable even on total failure. The trace
//! belongs to its scan call; there is no shared log buffer.

use crate::domain::DecodedSymbol;
use crate::processors::types::TransformKind;
use serde::{Deserialize, Serialize};

/// One rung of the fallback ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Strategy {
    /// The whole-image decode tried before any detection work.
    Primary,
    /// The detection step itself; recorded only when it fails, since a
    /// successful detection is not a decode attempt.
    Detection,
    /// A decode of one region variant.
    Region {
        /// Candidate region index, in confidence order.
        index: usize,
        /// The transform applied to the region's buffer.
        transform: TransformKind,
    },
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Primary => write!(f, "primary"),
            Strategy::Detection => write!(f, "detect"),
            Strategy::Region { index, transform } => write!(f, "region{index}:{transform}"),
        }
    }
}

/// One entry in the scan trace. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanAttempt {
    /// The strategy that was tried.
    pub strategy: Strategy,
    /// Wall-clock time the attempt took, in milliseconds.
    pub elapsed_ms: u64,
    /// Whether the attempt produced at least one symbol.
    pub success: bool,
    /// The symbols this attempt decoded; empty unless `success`.
    pub symbols: Vec<DecodedSymbol>,
}

/// The result of one scan call.
///
/// Always well-formed: a scan that fails every strategy returns an empty
/// symbol list and the complete attempts trace, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// The decoded symbols from the first successful attempt, or empty.
    pub symbols: Vec<DecodedSymbol>,
    /// Every strategy tried, in order.
    pub attempts: Vec<ScanAttempt>,
    /// Total wall-clock time of the scan, in milliseconds.
    pub elapsed_ms: u64,
}

impl ScanReport {
    /// True when at least one symbol was decoded.
    pub fn is_success(&self) -> bool {
        !self.symbols.is_empty()
    }

    /// The strategy that produced the result, when there is one.
    pub fn winning_strategy(&self) -> Option<Strategy> {
        self.attempts
            .iter()
            .find(|attempt| attempt.success)
            .map(|attempt| attempt.strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::Primary.to_string(), "primary");
        assert_eq!(Strategy::Detection.to_string(), "detect");
        assert_eq!(
            Strategy::Region {
                index: 0,
                transform: TransformKind::PaddedCrop
            }
            .to_string(),
            "region0:crop"
        );
        assert_eq!(
            Strategy::Region {
                index: 2,
                transform: TransformKind::RotatedBinarized { angle: 45.0 }
            }
            .to_string(),
            "region2:rotate+45:binarized"
        );
    }

    #[test]
    fn test_winning_strategy() {
        let report = ScanReport {
            symbols: vec![DecodedSymbol::new("x".to_string())],
            attempts: vec![
                ScanAttempt {
                    strategy: Strategy::Primary,
                    elapsed_ms: 3,
                    success: false,
                    symbols: Vec::new(),
                },
                ScanAttempt {
                    strategy: Strategy::Region {
                        index: 0,
                        transform: TransformKind::PaddedCrop,
                    },
                    elapsed_ms: 5,
                    success: true,
                    symbols: vec![DecodedSymbol::new("x".to_string())],
                },
            ],
            elapsed_ms: 8,
        };
        assert!(report.is_success());
        assert_eq!(
            report.winning_strategy(),
            Some(Strategy::Region {
                index: 0,
                transform: TransformKind::PaddedCrop
            })
        );
    }
}
