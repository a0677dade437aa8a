// 💾 Exporter - Update CSV + review report spreadsheet
// Two outputs per run:
// - actualizacion_precios.csv: what Odoo re-imports. Identifier is
//   written as TEXT exactly as extracted; re-parsing it as a number
//   would lose the leading zeros all over again.
// - productos_con_error.xlsx: one row per review record, for humans.
//   Excel, because that is what the people reviewing it open.

use crate::cost::PricedRecord;
use crate::partition::ReviewRecord;
use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

// ============================================================================
// UPDATE FILE (CSV)
// ============================================================================

/// Serialize ready rows as the Odoo import CSV.
/// `identifier_header` is "id" or "default_code" from the resolved
/// schema; the name column is only emitted when the source had one.
pub fn update_csv_bytes(
    ready: &[PricedRecord],
    identifier_header: &str,
    include_name: bool,
) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec![identifier_header, "x_ternium_id"];
    if include_name {
        header.push("name");
    }
    header.push("standard_price");
    writer.write_record(&header)?;

    for record in ready {
        let price = format!("{:.2}", record.computed_cost);
        let mut row = vec![
            record.record.inventory.identifier.as_str(),
            record.record.inventory.supplier_key_ref.as_str(),
        ];
        if include_name {
            row.push(record.record.inventory.name.as_deref().unwrap_or(""));
        }
        row.push(&price);
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finalize update CSV: {}", e))
}

/// Write the update CSV to disk
pub fn write_update_csv(
    path: &Path,
    ready: &[PricedRecord],
    identifier_header: &str,
    include_name: bool,
) -> Result<()> {
    let bytes = update_csv_bytes(ready, identifier_header, include_name)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write update file '{}'", path.display()))
}

// ============================================================================
// REVIEW REPORT (XLSX)
// ============================================================================

/// Serialize review rows as the error-report workbook
pub fn review_xlsx_bytes(review: &[ReviewRecord], identifier_header: &str) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    let headers = [
        identifier_header,
        "x_ternium_id",
        "Nombre",
        "Peso",
        "Precio base",
        "Nuevo Costo",
        "Motivo Error",
    ];
    for (col, title) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }

    for (i, entry) in review.iter().enumerate() {
        let row = (i + 1) as u32;
        let inventory = &entry.record.record.inventory;

        // Identifiers as text, never numbers
        sheet.write_string(row, 0, &inventory.identifier)?;
        sheet.write_string(row, 1, &inventory.supplier_key_ref)?;
        sheet.write_string(row, 2, inventory.name.as_deref().unwrap_or(""))?;
        sheet.write_number(row, 3, entry.record.weight)?;
        sheet.write_number(row, 4, entry.record.base_price)?;
        sheet.write_number(row, 5, entry.record.computed_cost)?;
        sheet.write_string(row, 6, entry.reason.label())?;
    }

    let bytes = workbook.save_to_buffer()?;
    Ok(bytes)
}

/// Write the review workbook to disk
pub fn write_review_xlsx(path: &Path, review: &[ReviewRecord], identifier_header: &str) -> Result<()> {
    let bytes = review_xlsx_bytes(review, identifier_header)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write review report '{}'", path.display()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostCalculator;
    use crate::join::JoinedRecord;
    use crate::loader::{load_table, TableFormat};
    use crate::model::{InventoryRecord, SupplierRecord};
    use crate::partition::Partitioner;

    fn priced(identifier: &str, name: Option<&str>, primary: Option<&str>, weight: &str) -> PricedRecord {
        let record = JoinedRecord {
            inventory: InventoryRecord {
                identifier: identifier.to_string(),
                supplier_key_ref: "0000000456".to_string(),
                weight_raw: weight.to_string(),
                name: name.map(|s| s.to_string()),
                row_number: 1,
            },
            supplier: SupplierRecord {
                supplier_key: "0000000456".to_string(),
                unit_price_primary: primary.map(|s| s.to_string()),
                unit_price_secondary: None,
                row_number: 1,
            },
        };
        CostCalculator::new().price(record)
    }

    #[test]
    fn test_update_csv_shape_and_rounding() {
        let ready = vec![priced("0000123", Some("Lámina"), Some("$1,200.00"), "5")];
        let bytes = update_csv_bytes(&ready, "default_code", true).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "default_code,x_ternium_id,name,standard_price"
        );
        assert_eq!(lines.next().unwrap(), "0000123,0000000456,Lámina,6.00");
    }

    #[test]
    fn test_update_csv_without_name_column() {
        let ready = vec![priced("prod_1", None, Some("$1,000.00"), "2")];
        let bytes = update_csv_bytes(&ready, "id", false).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("id,x_ternium_id,standard_price\n"));
        assert!(text.contains("prod_1,0000000456,2.00"));
    }

    #[test]
    fn test_update_round_trip_preserves_identifier_text() {
        // Export then re-load: "0000123" must come back byte-exact
        let ready = vec![priced("0000123", None, Some("$1,200.00"), "5")];
        let bytes = update_csv_bytes(&ready, "default_code", false).unwrap();

        let table = load_table(&bytes, TableFormat::Csv, 0, "reimport").unwrap();
        assert_eq!(table.cell(0, 0), "0000123");
    }

    #[test]
    fn test_review_xlsx_round_trip() {
        // Build a review row, write the workbook, read it back with
        // the loader and check the diagnosis landed
        let split = Partitioner::new().partition(vec![priced(
            "0000124",
            Some("Perfil PTR"),
            Some("$1,200.00"),
            "",
        )]);
        assert_eq!(split.review.len(), 1);

        let bytes = review_xlsx_bytes(&split.review, "default_code").unwrap();
        let table = load_table(&bytes, TableFormat::Xlsx, 0, "review").unwrap();

        assert_eq!(table.headers[0], "default_code");
        assert_eq!(table.headers[6], "Motivo Error");
        assert_eq!(table.cell(0, 0), "0000124");
        assert_eq!(table.cell(0, 2), "Perfil PTR");
        assert_eq!(table.cell(0, 3), "0"); // coerced weight
        assert_eq!(table.cell(0, 6), "Falta PESO en Odoo");
    }

    #[test]
    fn test_write_files_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let update_path = dir.path().join("actualizacion.csv");
        let review_path = dir.path().join("errores.xlsx");

        let split = Partitioner::new().partition(vec![
            priced("A", None, Some("$1,000.00"), "2"),
            priced("B", None, None, "2"),
        ]);

        write_update_csv(&update_path, &split.ready, "default_code", false).unwrap();
        write_review_xlsx(&review_path, &split.review, "default_code").unwrap();

        assert!(update_path.exists());
        assert!(review_path.exists());

        let reloaded = load_table_from_disk(&update_path);
        assert_eq!(reloaded.cell(0, 0), "A");
    }

    fn load_table_from_disk(path: &Path) -> crate::loader::RawTable {
        crate::loader::load_table_from_path(path, 0, "test").unwrap()
    }
}
