// 📦 Record Model - Typed rows extracted from the raw tables
// One record type per source, immutable once extracted, with the
// source row number kept for provenance. Join keys are stored in
// canonical form; prices stay as raw text until the cost step.

use crate::loader::RawTable;
use crate::normalize::{clean_identifier, normalize_key};
use crate::schema::ResolvedSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// SUPPLIER RECORD (Ternium catalog row)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierRecord {
    /// Canonical join key (normalized "Clave producto")
    pub supplier_key: String,

    /// Raw "price including shipping" text, e.g. "$1,234.56".
    /// None when the cell is blank.
    pub unit_price_primary: Option<String>,

    /// Raw bonus/discounted price text.
    /// None when the cell is blank OR the catalog revision has no
    /// bonus column at all (the cost step treats both as absent;
    /// the pipeline disables the fallback branch for the latter).
    pub unit_price_secondary: Option<String>,

    /// 1-based data row in the source (after the header)
    pub row_number: usize,
}

// ============================================================================
// INVENTORY RECORD (Odoo export row)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Display identifier: external id or internal reference code,
    /// depending on the resolved schema. Cleaned but NOT zero-padded,
    /// so it round-trips into the update file byte-exact.
    pub identifier: String,

    /// Canonical foreign key into SupplierRecord.supplier_key
    pub supplier_key_ref: String,

    /// Raw weight text ("" when blank); coerced at the cost step
    pub weight_raw: String,

    /// Product name, when the export carries one
    pub name: Option<String>,

    /// 1-based data row in the source (after the header)
    pub row_number: usize,
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Extract catalog rows under a resolved schema.
/// Rows with a blank product key cannot be joined and are dropped
/// here; padding a blank to "0000000000" would otherwise match any
/// inventory row whose reference is literally "0".
pub fn extract_supplier_records(table: &RawTable, schema: &ResolvedSchema) -> Vec<SupplierRecord> {
    let mut records = Vec::with_capacity(table.row_count());

    for row in 0..table.row_count() {
        let key_raw = table.cell(row, schema.product_key);
        if key_raw.trim().is_empty() {
            continue;
        }

        records.push(SupplierRecord {
            supplier_key: normalize_key(key_raw),
            unit_price_primary: non_blank(table.cell(row, schema.price_primary)),
            unit_price_secondary: schema
                .price_bonus
                .and_then(|col| non_blank(table.cell(row, col))),
            row_number: row + 1,
        });
    }

    records
}

/// Extract inventory rows under a resolved schema.
/// Rows with a blank supplier key reference cannot join and are
/// dropped here (the original tool's dropna step).
pub fn extract_inventory_records(
    table: &RawTable,
    schema: &ResolvedSchema,
) -> Vec<InventoryRecord> {
    let mut records = Vec::with_capacity(table.row_count());

    for row in 0..table.row_count() {
        let key_ref_raw = table.cell(row, schema.supplier_key_ref);
        if key_ref_raw.trim().is_empty() {
            continue;
        }

        records.push(InventoryRecord {
            identifier: clean_identifier(table.cell(row, schema.identifier.index())),
            supplier_key_ref: normalize_key(key_ref_raw),
            weight_raw: table.cell(row, schema.weight).trim().to_string(),
            name: schema.name.and_then(|col| non_blank(table.cell(row, col))),
            row_number: row + 1,
        });
    }

    records
}

fn non_blank(cell: &str) -> Option<String> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
