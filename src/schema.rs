// 📐 Schema Validator - Required columns + identifier resolution
// Confirms each source carries the columns the pipeline needs, and
// resolves WHICH identifier column drives the run exactly once.
//
// Missing columns are collected and reported together, not one at a
// time. Users fixing an export deserve the complete list.

use crate::loader::RawTable;
use serde::{Deserialize, Serialize};

// ============================================================================
// COLUMN CONFIGURATION
// ============================================================================

/// Expected column names in the Ternium catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogColumns {
    /// Product key (join key), e.g. "Clave producto"
    pub product_key: String,
    /// Primary price including shipping, e.g. "Precio con envío USD"
    pub price_primary: String,
    /// Substring that identifies the bonus/discounted price column.
    /// The exact header drifted between catalog revisions, so this is
    /// matched case-insensitively as a substring.
    pub price_bonus_needle: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        CatalogColumns {
            product_key: "Clave producto".to_string(),
            price_primary: "Precio con envío USD".to_string(),
            price_bonus_needle: "bonificado".to_string(),
        }
    }
}

/// Expected column names in the Odoo export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryColumns {
    /// External-system id column (takes priority when present)
    pub external_id: String,
    /// Internal reference code column (fallback)
    pub internal_code: String,
    /// Foreign key into the catalog's product key
    pub supplier_key_ref: String,
    /// Weight per unit
    pub weight: String,
    /// Product name (optional in the source)
    pub name: String,
}

impl Default for InventoryColumns {
    fn default() -> Self {
        InventoryColumns {
            external_id: "id".to_string(),
            internal_code: "Referencia interna".to_string(),
            supplier_key_ref: "x_ternium_id".to_string(),
            weight: "Peso".to_string(),
            name: "Nombre".to_string(),
        }
    }
}

/// Which identifier column the run is allowed to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierPolicy {
    /// Use the external id when its column exists, otherwise fall
    /// back to the internal reference code (with an advisory)
    PreferExternalId,
    /// Only ever use the internal reference code
    InternalCodeOnly,
}

// ============================================================================
// RESOLVED SCHEMA
// ============================================================================

/// The identifier column chosen for this run.
/// Resolved ONCE here and consumed by both the record extraction and
/// the export step, never re-derived ad hoc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentifierColumn {
    UsingExternalId { index: usize },
    UsingInternalCode { index: usize },
}

impl IdentifierColumn {
    pub fn index(&self) -> usize {
        match self {
            IdentifierColumn::UsingExternalId { index } => *index,
            IdentifierColumn::UsingInternalCode { index } => *index,
        }
    }

    /// Column header the update file must use so Odoo re-imports it
    pub fn export_header(&self) -> &str {
        match self {
            IdentifierColumn::UsingExternalId { .. } => "id",
            IdentifierColumn::UsingInternalCode { .. } => "default_code",
        }
    }
}

/// Column indices for one validated run
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub product_key: usize,
    pub price_primary: usize,
    /// Bonus price column, when the catalog revision carries one.
    /// Its absence disables the surcharge fallback entirely.
    pub price_bonus: Option<usize>,
    pub identifier: IdentifierColumn,
    pub supplier_key_ref: usize,
    pub weight: usize,
    pub name: Option<usize>,
    /// Non-fatal notes (e.g. identifier fallback) for the run report
    pub advisories: Vec<String>,
}

// ============================================================================
// SCHEMA ERROR
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingColumn {
    pub source: String,
    pub column: String,
}

impl std::fmt::Display for MissingColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Falta la columna '{}' en {}", self.column, self.source)
    }
}

/// All missing required columns, collected across both sources
#[derive(Debug, Clone)]
pub struct SchemaError {
    pub missing: Vec<MissingColumn>,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lines: Vec<String> = self.missing.iter().map(|m| m.to_string()).collect();
        write!(f, "{}", lines.join("; "))
    }
}

impl std::error::Error for SchemaError {}

// ============================================================================
// SCHEMA VALIDATOR
// ============================================================================

pub struct SchemaValidator {
    catalog: CatalogColumns,
    inventory: InventoryColumns,
    identifier_policy: IdentifierPolicy,
}

impl SchemaValidator {
    pub fn new() -> Self {
        SchemaValidator {
            catalog: CatalogColumns::default(),
            inventory: InventoryColumns::default(),
            identifier_policy: IdentifierPolicy::PreferExternalId,
        }
    }

    pub fn with_columns(
        catalog: CatalogColumns,
        inventory: InventoryColumns,
        identifier_policy: IdentifierPolicy,
    ) -> Self {
        SchemaValidator {
            catalog,
            inventory,
            identifier_policy,
        }
    }

    /// Validate both sources and resolve column indices.
    /// Collects EVERY missing column before failing.
    pub fn resolve(
        &self,
        catalog: &RawTable,
        inventory: &RawTable,
    ) -> Result<ResolvedSchema, SchemaError> {
        let mut missing = Vec::new();
        let mut advisories = Vec::new();

        // --- Catalog (Ternium) ---
        let product_key = require(catalog, &self.catalog.product_key, "Ternium", &mut missing);
        let price_primary = require(catalog, &self.catalog.price_primary, "Ternium", &mut missing);
        let price_bonus = catalog.find_column_containing(&self.catalog.price_bonus_needle);

        // --- Inventory (Odoo) ---
        let supplier_key_ref = require(
            inventory,
            &self.inventory.supplier_key_ref,
            "Odoo",
            &mut missing,
        );
        let weight = require(inventory, &self.inventory.weight, "Odoo", &mut missing);
        let name = inventory.column_index(&self.inventory.name);

        let identifier = self.resolve_identifier(inventory, &mut missing, &mut advisories);

        // Every None above pushed onto `missing`, so a fully-Some
        // tuple and an empty error list are the same condition
        match (product_key, price_primary, supplier_key_ref, weight, identifier) {
            (Some(product_key), Some(price_primary), Some(supplier_key_ref), Some(weight), Some(identifier))
                if missing.is_empty() =>
            {
                Ok(ResolvedSchema {
                    product_key,
                    price_primary,
                    price_bonus,
                    identifier,
                    supplier_key_ref,
                    weight,
                    name,
                    advisories,
                })
            }
            _ => Err(SchemaError { missing }),
        }
    }

    /// Choose the identifier column under the configured policy
    fn resolve_identifier(
        &self,
        inventory: &RawTable,
        missing: &mut Vec<MissingColumn>,
        advisories: &mut Vec<String>,
    ) -> Option<IdentifierColumn> {
        let external = inventory.column_index(&self.inventory.external_id);
        let internal = inventory.column_index(&self.inventory.internal_code);

        match self.identifier_policy {
            IdentifierPolicy::PreferExternalId => match (external, internal) {
                (Some(index), _) => Some(IdentifierColumn::UsingExternalId { index }),
                (None, Some(index)) => {
                    advisories.push(format!(
                        "Columna '{}' no encontrada; usando '{}' como identificador",
                        self.inventory.external_id, self.inventory.internal_code
                    ));
                    Some(IdentifierColumn::UsingInternalCode { index })
                }
                (None, None) => {
                    missing.push(MissingColumn {
                        source: "Odoo".to_string(),
                        column: format!(
                            "'{}' o '{}'",
                            self.inventory.external_id, self.inventory.internal_code
                        ),
                    });
                    None
                }
            },
            IdentifierPolicy::InternalCodeOnly => match internal {
                Some(index) => Some(IdentifierColumn::UsingInternalCode { index }),
                None => {
                    missing.push(MissingColumn {
                        source: "Odoo".to_string(),
                        column: self.inventory.internal_code.clone(),
                    });
                    None
                }
            },
        }
    }
}

fn require(
    table: &RawTable,
    column: &str,
    source: &str,
    missing: &mut Vec<MissingColumn>,
) -> Option<usize> {
    let found = table.column_index(column);
    if found.is_none() {
        missing.push(MissingColumn {
            source: source.to_string(),
            column: column.to_string(),
        });
    }
    found
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
