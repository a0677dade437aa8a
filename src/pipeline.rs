// ⚙️ Pipeline - load → validate → normalize → join → price → split
// One-shot, in-memory batch run. Any failure aborts the whole run and
// nothing partial comes out; coercion issues never abort, they just
// surface in the review bucket.

use crate::cost::{CostCalculator, PriceFallbackPolicy, PricedRecord};
use crate::join::{inner_join, EmptyJoin, JoinStats};
use crate::loader::{load_table_from_path, RawTable};
use crate::model::{extract_inventory_records, extract_supplier_records};
use crate::partition::{Partitioner, ReviewRecord};
use crate::schema::{CatalogColumns, IdentifierPolicy, InventoryColumns, SchemaValidator};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Everything that varied across the three historical versions of
/// this tool, collapsed into one configuration surface.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub catalog_columns: CatalogColumns,
    pub inventory_columns: InventoryColumns,
    pub identifier_policy: IdentifierPolicy,
    pub price_fallback_policy: PriceFallbackPolicy,
    /// 0-based header row of the catalog file. Ternium ships two
    /// title rows above the header, hence 2.
    pub catalog_header_row: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            catalog_columns: CatalogColumns::default(),
            inventory_columns: InventoryColumns::default(),
            identifier_policy: IdentifierPolicy::PreferExternalId,
            price_fallback_policy: PriceFallbackPolicy::BonusWithSurcharge,
            catalog_header_row: 2,
        }
    }
}

// ============================================================================
// RUN REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Rows cleared for import
    pub ready: Vec<PricedRecord>,
    /// Rows needing human review, each with a diagnosis
    pub review: Vec<ReviewRecord>,

    /// Header the update file must use ("id" or "default_code")
    pub identifier_header: String,
    /// Whether the source carried a name column worth exporting
    pub include_name: bool,

    /// Non-fatal notes from schema resolution
    pub advisories: Vec<String>,
    pub join_stats: JoinStats,

    /// Input sizes after cleanup (inventory excludes rows without a
    /// supplier key reference)
    pub inventory_rows: usize,
    pub catalog_rows: usize,

    pub processed_at: DateTime<Utc>,
}

impl RunReport {
    pub fn summary(&self) -> String {
        let mut line = format!(
            "Proceso terminado: {} listos para importar, {} a revisión",
            self.ready.len(),
            self.review.len()
        );
        if self.join_stats.unmatched_inventory > 0 {
            line.push_str(&format!(
                " ({} filas de Odoo sin coincidencia en Ternium)",
                self.join_stats.unmatched_inventory
            ));
        }
        line
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline {
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Pipeline { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run against two already-loaded tables
    pub fn run(&self, catalog: &RawTable, inventory: &RawTable) -> Result<RunReport> {
        // 1. Validate columns, resolve the identifier once
        let validator = SchemaValidator::with_columns(
            self.config.catalog_columns.clone(),
            self.config.inventory_columns.clone(),
            self.config.identifier_policy,
        );
        let schema = validator.resolve(catalog, inventory)?;

        // 2. Extract typed records (keys canonicalized here)
        let suppliers = extract_supplier_records(catalog, &schema);
        let inventory_records = extract_inventory_records(inventory, &schema);

        // 3. Join on the canonical key
        let (joined, join_stats) = inner_join(&inventory_records, &suppliers);
        if joined.is_empty() {
            return Err(EmptyJoin {
                inventory_rows: inventory_records.len(),
                catalog_rows: suppliers.len(),
            }
            .into());
        }

        // 4. Price. Catalogs without a bonus column have no fallback
        //    branch, whatever the configured policy says.
        let policy = if schema.price_bonus.is_none() {
            PriceFallbackPolicy::PrimaryOnly
        } else {
            self.config.price_fallback_policy
        };
        let calculator = CostCalculator::with_policy(policy);
        let priced: Vec<PricedRecord> = joined.into_iter().map(|j| calculator.price(j)).collect();

        // 5. Split and diagnose
        let split = Partitioner::new().partition(priced);

        Ok(RunReport {
            ready: split.ready,
            review: split.review,
            identifier_header: schema.identifier.export_header().to_string(),
            include_name: schema.name.is_some(),
            advisories: schema.advisories,
            join_stats,
            inventory_rows: inventory_records.len(),
            catalog_rows: suppliers.len(),
            processed_at: Utc::now(),
        })
    }

    /// Load both files (format by extension) and run.
    /// The catalog header offset comes from the configuration; the
    /// inventory header is always the first row.
    pub fn run_files(&self, inventory_path: &Path, catalog_path: &Path) -> Result<RunReport> {
        let catalog =
            load_table_from_path(catalog_path, self.config.catalog_header_row, "Ternium")?;
        let inventory = load_table_from_path(inventory_path, 0, "Odoo")?;
        self.run(&catalog, &inventory)
    }
}

impl Default for Pipeline {
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
    use crate::loader::{load_table, TableFormat};
    use crate::partition::ReviewReason;
    use crate::schema::SchemaError;

    const TERNIUM_CSV: &str = "\
Catálogo de precios Ternium,,,
Vigencia: Enero 2025,,,
Clave producto,Descripción,Precio con envío USD,Precio bonificado USD
123,Lámina galvanizada,\"$1,200.00\",
456,Perfil PTR,,$950.00
789,Varilla,$0.00,
";

    const ODOO_CSV: &str = "\
Referencia interna,x_ternium_id,Peso,Nombre
0000000123,123,5,Lámina
0000000456,456.0,2,Perfil
0000000789,789,3,Varilla
0000000999,111,4,Sin catálogo
";

    fn tables() -> (RawTable, RawTable) {
        let catalog = load_table(TERNIUM_CSV.as_bytes(), TableFormat::Csv, 2, "Ternium").unwrap();
        let inventory = load_table(ODOO_CSV.as_bytes(), TableFormat::Csv, 0, "Odoo").unwrap();
        (catalog, inventory)
    }

    #[test]
    fn test_end_to_end_run() {
        let (catalog, inventory) = tables();
        let report = Pipeline::new().run(&catalog, &inventory).unwrap();

        // 123 → 1200/1000*5 = 6.00 ready
        // 456 → (950+65.45)/1000*2 = 2.0309 ready (bonus fallback)
        // 789 → price 0 → review
        // 999 → unmatched, dropped
        assert_eq!(report.ready.len(), 2);
        assert_eq!(report.review.len(), 1);
        assert_eq!(report.join_stats.unmatched_inventory, 1);

        let lamina = &report.ready[0];
        assert_eq!(lamina.record.inventory.identifier, "0000000123");
        assert!((lamina.computed_cost - 6.0).abs() < 1e-9);

        let perfil = &report.ready[1];
        assert!((perfil.base_price - 1015.45).abs() < 1e-9);

        assert!(matches!(
            report.review[0].reason,
            ReviewReason::NoSourcePrice { .. }
        ));
        assert!(report.summary().contains("2 listos"));
    }

    #[test]
    fn test_identifier_resolution_flows_to_report() {
        let (catalog, inventory) = tables();
        let report = Pipeline::new().run(&catalog, &inventory).unwrap();

        // No "id" column in the export: falls back with an advisory
        assert_eq!(report.identifier_header, "default_code");
        assert_eq!(report.advisories.len(), 1);
        assert!(report.include_name);
    }

    #[test]
    fn test_schema_errors_surface_with_full_list() {
        let catalog = load_table(b"a,b\n1,2\n1,2\n1,2\n", TableFormat::Csv, 2, "Ternium").unwrap();
        let (_, inventory) = tables();

        let err = Pipeline::new().run(&catalog, &inventory).unwrap_err();
        let schema_err = err.downcast_ref::<SchemaError>().expect("schema error");

        // Product key and price both reported at once
        assert_eq!(schema_err.missing.len(), 2);
    }

    #[test]
    fn test_empty_join_is_a_distinct_condition() {
        let (catalog, _) = tables();
        let inventory = load_table(
            b"Referencia interna,x_ternium_id,Peso\nX1,555,2\n",
            TableFormat::Csv,
            0,
            "Odoo",
        )
        .unwrap();

        let err = Pipeline::new().run(&catalog, &inventory).unwrap_err();
        assert!(err.downcast_ref::<EmptyJoin>().is_some());
    }

    #[test]
    fn test_catalog_without_bonus_column_disables_fallback() {
        let catalog = load_table(
            b"x,,\n,,\nClave producto,Precio con env\xc3\xado USD,Otra\n456,$0.50,x\n",
            TableFormat::Csv,
            2,
            "Ternium",
        )
        .unwrap();
        let inventory = load_table(
            b"Referencia interna,x_ternium_id,Peso\nP1,456,1000\n",
            TableFormat::Csv,
            0,
            "Odoo",
        )
        .unwrap();

        let report = Pipeline::new().run(&catalog, &inventory).unwrap();

        // PrimaryOnly semantics: 0.50 used directly, 0.5/1000*1000 = 0.5 → ready
        assert_eq!(report.ready.len(), 1);
        assert!((report.ready[0].base_price - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_catalog_keys_fan_out_through_pipeline() {
        let catalog = load_table(
            b",,\n,,\nClave producto,Precio con env\xc3\xado USD,Precio bonificado\n77,\"$1,000.00\",\n77,\"$2,000.00\",\n",
            TableFormat::Csv,
            2,
            "Ternium",
        )
        .unwrap();
        let inventory = load_table(
            b"Referencia interna,x_ternium_id,Peso\nP1,77,1\n",
            TableFormat::Csv,
            0,
            "Odoo",
        )
        .unwrap();

        let report = Pipeline::new().run(&catalog, &inventory).unwrap();

        // One inventory row, two catalog rows with the same key
        assert_eq!(report.ready.len(), 2);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let (catalog, inventory) = tables();
        let report = Pipeline::new().run(&catalog, &inventory).unwrap();

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"ready\""));
        assert!(json.contains("\"join_stats\""));
    }
}
