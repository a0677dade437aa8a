// 🔗 Joiner - Inner equi-join on the canonical key
// Matches Odoo rows to Ternium rows whose normalized keys are equal.
// No outer-join semantics: unmatched rows on either side drop out of
// the result, but they are COUNTED so the run report can surface how
// much of each file went unpriced.

use crate::model::{InventoryRecord, SupplierRecord};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// JOINED RECORD
// ============================================================================

/// One inventory row matched with one catalog row.
/// Duplicate catalog keys fan out: an inventory row joins once per
/// matching catalog row, exactly like the original merge. Catalog key
/// uniqueness is NOT enforced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinedRecord {
    pub inventory: InventoryRecord,
    pub supplier: SupplierRecord,
}

// ============================================================================
// JOIN STATS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStats {
    /// Joined rows produced (includes fan-out duplicates)
    pub matched: usize,
    /// Inventory rows with a key that matched nothing in the catalog.
    /// These produce no output and no review entry; the count is the
    /// only trace they leave.
    pub unmatched_inventory: usize,
    /// Catalog rows no inventory row pointed at
    pub unmatched_catalog: usize,
}

/// Terminal condition: zero rows matched after normalization.
/// Reported to the caller as its own error, not a crash. It usually
/// means the wrong pair of files was uploaded.
#[derive(Debug, Clone)]
pub struct EmptyJoin {
    pub inventory_rows: usize,
    pub catalog_rows: usize,
}

impl std::fmt::Display for EmptyJoin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "No se encontraron coincidencias ({} filas de Odoo contra {} de Ternium)",
            self.inventory_rows, self.catalog_rows
        )
    }
}

impl std::error::Error for EmptyJoin {}

// ============================================================================
// JOINER
// ============================================================================

/// Inner join inventory × catalog on normalized key equality.
/// Output preserves inventory order; fan-out follows catalog order.
pub fn inner_join(
    inventory: &[InventoryRecord],
    suppliers: &[SupplierRecord],
) -> (Vec<JoinedRecord>, JoinStats) {
    // Index catalog rows by key; a Vec per key keeps the fan-out
    let mut by_key: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, supplier) in suppliers.iter().enumerate() {
        by_key.entry(supplier.supplier_key.as_str()).or_default().push(i);
    }

    let mut joined = Vec::new();
    let mut matched_supplier = vec![false; suppliers.len()];
    let mut unmatched_inventory = 0;

    for record in inventory {
        match by_key.get(record.supplier_key_ref.as_str()) {
            Some(indices) => {
                for &i in indices {
                    matched_supplier[i] = true;
                    joined.push(JoinedRecord {
                        inventory: record.clone(),
                        supplier: suppliers[i].clone(),
                    });
                }
            }
            None => unmatched_inventory += 1,
        }
    }

    let stats = JoinStats {
        matched: joined.len(),
        unmatched_inventory,
        unmatched_catalog: matched_supplier.iter().filter(|m| !**m).count(),
    };

    (joined, stats)
}

// ============================================================================
// TESTS
// ============================================================================
