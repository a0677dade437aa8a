// Price Sync - Ternium catalog → Odoo price updates
// Exposes all pipeline stages for use in the CLI and tests

pub mod loader;
pub mod schema;
pub mod normalize;
pub mod model;
pub mod join;
pub mod cost;
pub mod partition;
pub mod export;
pub mod pipeline;

// Re-export commonly used types
pub use loader::{load_table, load_table_from_path, RawTable, TableFormat};
pub use schema::{
    CatalogColumns, IdentifierColumn, IdentifierPolicy, InventoryColumns, MissingColumn,
    ResolvedSchema, SchemaError, SchemaValidator,
};
pub use normalize::{clean_identifier, normalize_key, KEY_WIDTH};
pub use model::{
    extract_inventory_records, extract_supplier_records, InventoryRecord, SupplierRecord,
};
pub use join::{inner_join, EmptyJoin, JoinStats, JoinedRecord};
pub use cost::{
    CostCalculator, FieldValue, PriceFallbackPolicy, PriceSource, PricedRecord, BONUS_SURCHARGE,
    WEIGHT_DIVISOR,
};
pub use partition::{
    FieldState, Partitioned, Partitioner, ReviewReason, ReviewRecord, READY_THRESHOLD,
};
pub use export::{review_xlsx_bytes, update_csv_bytes, write_review_xlsx, write_update_csv};
pub use pipeline::{Pipeline, PipelineConfig, RunReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
