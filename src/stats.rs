//! Derived capacity counters for a skyline model.

use serde::{Deserialize, Serialize};

/// `lit_count + available_count == total_count` for every value built through
/// [`SkylineStats::from_counts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkylineStats {
    pub lit_count: u64,
    pub total_count: u64,
    pub available_count: u64,
}

impl SkylineStats {
    /// Build stats from a lit count and a capacity. A lit count above the
    /// capacity is clamped so the counters stay consistent.
    pub fn from_counts(lit: u64, total: u64) -> Self {
        let lit_count = lit.min(total);
        SkylineStats {
            lit_count,
            total_count: total,
            available_count: total - lit_count,
        }
    }

    pub fn is_full(&self) -> bool {
        self.available_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_add_up() {
        let s = SkylineStats::from_counts(12, 5000);
        assert_eq!(s.lit_count, 12);
        assert_eq!(s.available_count, 4988);
        assert!(!s.is_full());
    }

    #[test]
    fn overfull_is_clamped() {
        let s = SkylineStats::from_counts(20, 15);
        assert_eq!(s.lit_count + s.available_count, s.total_count);
        assert!(s.is_full());
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(SkylineStats::from_counts(1, 3)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"litCount": 1, "totalCount": 3, "availableCount": 2})
        );
    }
}
