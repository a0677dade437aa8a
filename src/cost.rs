// 💲 Cost Calculator - Currency parsing + base price + final cost
// Derives the new Odoo standard price for each joined row:
//
//   computed_cost = (base_price / 1000) * weight
//
// Prices are per metric ton, weights per unit in kg, so the divisor
// is a fixed unit conversion. Parse failures never abort the run:
// they coerce to 0 and fall into the review bucket downstream, but
// the calculator remembers WHY a field became 0 (absent vs garbage)
// so the diagnosis can tell the difference.

use crate::join::JoinedRecord;
use serde::{Deserialize, Serialize};

/// Additive surcharge applied when pricing falls back to the bonus
/// price (the bonus price excludes shipping; this puts it back)
pub const BONUS_SURCHARGE: f64 = 65.45;

/// Unit conversion: catalog prices are per 1000 kg
pub const WEIGHT_DIVISOR: f64 = 1000.0;

// ============================================================================
// FIELD VALUE
// ============================================================================

/// A numeric field as found in the source: present, absent, or
/// present-but-unparseable. The policy layer maps the last two to
/// 0.0, but the three-way split survives into the review diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Missing,
    Unparseable { raw: String },
    Number(f64),
}

impl FieldValue {
    /// Parse a currency-formatted cell: "$1,234.56" → 1234.56.
    /// Strips the currency symbol and thousands separators; plain
    /// numbers pass through; None/blank is Missing.
    pub fn parse_money(raw: Option<&str>) -> FieldValue {
        let raw = match raw {
            Some(r) if !r.trim().is_empty() => r.trim(),
            _ => return FieldValue::Missing,
        };

        let cleaned: String = raw
            .chars()
            .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
            .collect();

        match cleaned.parse::<f64>() {
            Ok(n) => FieldValue::Number(n),
            Err(_) => FieldValue::Unparseable {
                raw: raw.to_string(),
            },
        }
    }

    /// Parse a plain numeric cell (weight)
    pub fn parse_number(raw: &str) -> FieldValue {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return FieldValue::Missing;
        }

        match trimmed.parse::<f64>() {
            Ok(n) => FieldValue::Number(n),
            Err(_) => FieldValue::Unparseable {
                raw: trimmed.to_string(),
            },
        }
    }

    /// Coercion policy: anything that is not a finite number reads
    /// as 0.0 (the run always completes; strictness is per-row)
    pub fn or_zero(&self) -> f64 {
        match self {
            FieldValue::Number(n) if n.is_finite() => *n,
            _ => 0.0,
        }
    }

    pub fn is_unparseable(&self) -> bool {
        matches!(self, FieldValue::Unparseable { .. })
    }
}

// ============================================================================
// PRICING POLICY
// ============================================================================

/// How the base price is selected from the two catalog price fields.
/// The catalog went through two revisions of this rule; the dual
/// price policy supersedes the older one and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceFallbackPolicy {
    /// Base price is the primary field, used directly (older catalogs
    /// without a bonus column)
    PrimaryOnly,
    /// Primary when > 1.0; else bonus price + surcharge when > 1.0;
    /// else no price
    BonusWithSurcharge,
}

/// Which branch actually priced a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceSource {
    Primary,
    BonusPlusSurcharge,
    NoPrice,
}

// ============================================================================
// PRICED RECORD
// ============================================================================

/// A joined row with its derived pricing attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedRecord {
    pub record: JoinedRecord,

    /// Selected per-ton price after fallback logic
    pub base_price: f64,
    pub price_source: PriceSource,

    /// Weight after coercion (0.0 when missing/garbage)
    pub weight: f64,

    /// Final cost: (base_price / 1000) * weight, non-finite → 0
    pub computed_cost: f64,

    /// Field states kept for the review diagnosis
    pub primary_field: FieldValue,
    pub weight_field: FieldValue,
}

// ============================================================================
// COST CALCULATOR
// ============================================================================

pub struct CostCalculator {
    policy: PriceFallbackPolicy,
    /// Threshold a price field must clear to count as a real price
    price_floor: f64,
}

impl CostCalculator {
    pub fn new() -> Self {
        CostCalculator {
            policy: PriceFallbackPolicy::BonusWithSurcharge,
            price_floor: 1.0,
        }
    }

    pub fn with_policy(policy: PriceFallbackPolicy) -> Self {
        CostCalculator {
            policy,
            price_floor: 1.0,
        }
    }

    /// Derive base price and final cost for one joined row
    pub fn price(&self, record: JoinedRecord) -> PricedRecord {
        let primary = FieldValue::parse_money(record.supplier.unit_price_primary.as_deref());
        let secondary = FieldValue::parse_money(record.supplier.unit_price_secondary.as_deref());

        let (base_price, price_source) = self.select_base_price(&primary, &secondary);

        let weight_field = FieldValue::parse_number(&record.inventory.weight_raw);
        let weight = weight_field.or_zero();

        let raw_cost = (base_price / WEIGHT_DIVISOR) * weight;
        let computed_cost = if raw_cost.is_finite() { raw_cost } else { 0.0 };

        PricedRecord {
            record,
            base_price,
            price_source,
            weight,
            computed_cost,
            primary_field: primary,
            weight_field,
        }
    }

    fn select_base_price(
        &self,
        primary: &FieldValue,
        secondary: &FieldValue,
    ) -> (f64, PriceSource) {
        match self.policy {
            PriceFallbackPolicy::PrimaryOnly => {
                let value = primary.or_zero();
                if value > 0.0 {
                    (value, PriceSource::Primary)
                } else {
                    (0.0, PriceSource::NoPrice)
                }
            }
            PriceFallbackPolicy::BonusWithSurcharge => {
                let primary_value = primary.or_zero();
                if primary_value > self.price_floor {
                    return (primary_value, PriceSource::Primary);
                }

                let secondary_value = secondary.or_zero();
                if secondary_value > self.price_floor {
                    return (secondary_value + BONUS_SURCHARGE, PriceSource::BonusPlusSurcharge);
                }

                (0.0, PriceSource::NoPrice)
            }
        }
    }
}

impl Default for CostCalculator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
