// 🪄 Partitioner / Diagnoser - Ready vs NeedsReview
// Splits priced rows on the cost threshold and pins a human-readable
// reason on every row that lands in the review bucket. First matching
// rule wins: a row with no weight AND no price reports the weight.

use crate::cost::{FieldValue, PricedRecord};
use serde::{Deserialize, Serialize};

/// Costs at or below this are not importable (0.01 instead of 0.0
/// guards against float dust from the division)
pub const READY_THRESHOLD: f64 = 0.01;

// ============================================================================
// REVIEW REASON
// ============================================================================

/// Why a zero came out of a numeric field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldState {
    /// Cell was blank or the column value was null
    Absent,
    /// Cell had content that did not parse as a number
    Unparseable,
    /// Field parsed fine (the zero came from elsewhere)
    Present,
}

impl FieldState {
    fn of(field: &FieldValue) -> FieldState {
        match field {
            FieldValue::Missing => FieldState::Absent,
            FieldValue::Unparseable { .. } => FieldState::Unparseable,
            FieldValue::Number(_) => FieldState::Present,
        }
    }
}

/// Diagnosis for a NeedsReview row. The label is what lands in the
/// error report; `field_state` additionally tells absent apart from
/// present-but-garbage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewReason {
    MissingWeight { field_state: FieldState },
    NoSourcePrice { field_state: FieldState },
    Unknown,
}

impl ReviewReason {
    /// Human-readable label for the review report
    pub fn label(&self) -> &'static str {
        match self {
            ReviewReason::MissingWeight { .. } => "Falta PESO en Odoo",
            ReviewReason::NoSourcePrice { .. } => "Precio 0 en Ternium",
            ReviewReason::Unknown => "Error desconocido",
        }
    }
}

impl std::fmt::Display for ReviewReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================================================
// OUTCOME
// ============================================================================

/// A review-bucket row: the priced record plus its diagnosis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub record: PricedRecord,
    pub reason: ReviewReason,
}

/// Total, disjoint split of the joined set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partitioned {
    pub ready: Vec<PricedRecord>,
    pub review: Vec<ReviewRecord>,
}

impl Partitioned {
    pub fn total(&self) -> usize {
        self.ready.len() + self.review.len()
    }
}

// ============================================================================
// PARTITIONER
// ============================================================================

pub struct Partitioner {
    threshold: f64,
}

impl Partitioner {
    pub fn new() -> Self {
        Partitioner {
            threshold: READY_THRESHOLD,
        }
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Partitioner { threshold }
    }

    /// Split priced rows: cost > threshold → ready, else review.
    /// Every input row lands in exactly one bucket.
    pub fn partition(&self, priced: Vec<PricedRecord>) -> Partitioned {
        let mut ready = Vec::new();
        let mut review = Vec::new();

        for record in priced {
            if record.computed_cost > self.threshold {
                ready.push(record);
            } else {
                let reason = self.diagnose(&record);
                review.push(ReviewRecord { record, reason });
            }
        }

        Partitioned { ready, review }
    }

    /// First matching rule wins:
    /// 1. weight == 0        → missing weight
    /// 2. base_price == 0    → no source price
    /// 3. anything else      → unknown (e.g. rounding dust near 0)
    fn diagnose(&self, record: &PricedRecord) -> ReviewReason {
        if record.weight == 0.0 {
            return ReviewReason::MissingWeight {
                field_state: FieldState::of(&record.weight_field),
            };
        }

        if record.base_price == 0.0 {
            return ReviewReason::NoSourcePrice {
                field_state: FieldState::of(&record.primary_field),
            };
        }

        ReviewReason::Unknown
    }
}

impl Default for Partitioner {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostCalculator;
    use crate::join::JoinedRecord;
    use crate::model::{InventoryRecord, SupplierRecord};

    fn priced(primary: Option<&str>, weight: &str) -> PricedRecord {
        let record = JoinedRecord {
            inventory: InventoryRecord {
                identifier: "P1".to_string(),
                supplier_key_ref: "0000000123".to_string(),
                weight_raw: weight.to_string(),
                name: None,
                row_number: 1,
            },
            supplier: SupplierRecord {
                supplier_key: "0000000123".to_string(),
                unit_price_primary: primary.map(|s| s.to_string()),
                unit_price_secondary: None,
                row_number: 1,
            },
        };
        CostCalculator::new().price(record)
    }

    #[test]
    fn test_ready_above_threshold() {
        let split = Partitioner::new().partition(vec![priced(Some("$1,200.00"), "5")]);

        assert_eq!(split.ready.len(), 1);
        assert_eq!(split.review.len(), 0);
        assert!((split.ready[0].computed_cost - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_partition_is_total_and_disjoint() {
        let rows = vec![
            priced(Some("$1,200.00"), "5"),  // ready
            priced(Some("$1,200.00"), ""),   // review: no weight
            priced(None, "5"),               // review: no price
            priced(Some("$2.00"), "1"),      // cost 0.002 → review
        ];
        let total = rows.len();

        let split = Partitioner::new().partition(rows);

        assert_eq!(split.total(), total);
        assert_eq!(split.ready.len(), 1);
        assert_eq!(split.review.len(), 3);
    }

    #[test]
    fn test_missing_weight_diagnosis() {
        let split = Partitioner::new().partition(vec![priced(Some("$1,200.00"), "")]);

        let reason = split.review[0].reason;
        assert!(matches!(
            reason,
            ReviewReason::MissingWeight {
                field_state: FieldState::Absent
            }
        ));
        assert_eq!(reason.label(), "Falta PESO en Odoo");
    }

    #[test]
    fn test_missing_weight_wins_over_missing_price() {
        // Both zero: weight rule fires first
        let split = Partitioner::new().partition(vec![priced(None, "")]);

        assert!(matches!(
            split.review[0].reason,
            ReviewReason::MissingWeight { .. }
        ));
    }

    #[test]
    fn test_no_source_price_diagnosis() {
        let split = Partitioner::new().partition(vec![priced(None, "5")]);

        let reason = split.review[0].reason;
        assert!(matches!(
            reason,
            ReviewReason::NoSourcePrice {
                field_state: FieldState::Absent
            }
        ));
        assert_eq!(reason.label(), "Precio 0 en Ternium");
    }

    #[test]
    fn test_unparseable_price_distinguished_from_absent() {
        let split = Partitioner::new().partition(vec![priced(Some("consultar"), "5")]);

        assert!(matches!(
            split.review[0].reason,
            ReviewReason::NoSourcePrice {
                field_state: FieldState::Unparseable
            }
        ));
        // Same label either way; the report wording does not change
        assert_eq!(split.review[0].reason.label(), "Precio 0 en Ternium");
    }

    #[test]
    fn test_near_zero_cost_is_unknown() {
        // Price and weight both present, cost just under threshold
        let split = Partitioner::new().partition(vec![priced(Some("$2.00"), "1")]);

        assert!(matches!(split.review[0].reason, ReviewReason::Unknown));
        assert_eq!(split.review[0].reason.label(), "Error desconocido");
    }

    #[test]
    fn test_cost_exactly_at_threshold_needs_review() {
        // 0.01 is NOT ready: the rule is strictly greater-than
        let split = Partitioner::with_threshold(0.01).partition(vec![priced(Some("$10.00"), "1")]);

        assert_eq!(split.ready.len(), 0);
        assert_eq!(split.review.len(), 1);
    }
}
