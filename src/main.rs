use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

use price_sync::{write_review_xlsx, write_update_csv, EmptyJoin, Pipeline};

const UPDATE_FILE: &str = "actualizacion_precios_ternium.csv";
const REVIEW_FILE: &str = "productos_con_error.xlsx";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let json_mode = args.iter().any(|a| a == "--json");
    let positional: Vec<&String> = args[1..].iter().filter(|a| !a.starts_with("--")).collect();

    if positional.len() < 2 {
        eprintln!("Uso: price-sync <archivo-odoo> <catalogo-ternium> [directorio-salida] [--json]");
        eprintln!("     Formatos soportados: .csv, .xlsx");
        std::process::exit(1);
    }

    let odoo_path = Path::new(positional[0]);
    let ternium_path = Path::new(positional[1]);
    let out_dir: PathBuf = positional
        .get(2)
        .map(|p| PathBuf::from(p.as_str()))
        .unwrap_or_else(|| PathBuf::from("."));

    run_sync(odoo_path, ternium_path, &out_dir, json_mode)
}

fn run_sync(odoo_path: &Path, ternium_path: &Path, out_dir: &Path, json_mode: bool) -> Result<()> {
    if !json_mode {
        println!("🏭 Actualizador de Precios: Ternium a Odoo");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        println!("\n📂 Cargando archivos...");
    }

    let pipeline = Pipeline::new();
    let report = match pipeline.run_files(odoo_path, ternium_path) {
        Ok(report) => report,
        Err(err) => {
            // An empty join is a bad file pairing, not a crash
            if let Some(empty) = err.downcast_ref::<EmptyJoin>() {
                eprintln!("⚠️  {}", empty);
                std::process::exit(2);
            }
            eprintln!("❌ Error: {}", err);
            std::process::exit(1);
        }
    };

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for advisory in &report.advisories {
        println!("ℹ️  {}", advisory);
    }

    println!(
        "✓ {} filas de Odoo, {} filas de Ternium",
        report.inventory_rows, report.catalog_rows
    );

    // Write both outputs
    println!("\n💾 Escribiendo resultados...");
    let update_path = out_dir.join(UPDATE_FILE);
    write_update_csv(
        &update_path,
        &report.ready,
        &report.identifier_header,
        report.include_name,
    )?;
    println!("✓ {} ({} productos)", update_path.display(), report.ready.len());

    if report.review.is_empty() {
        println!("✓ Sin errores para revisar");
    } else {
        let review_path = out_dir.join(REVIEW_FILE);
        write_review_xlsx(&review_path, &report.review, &report.identifier_header)?;
        println!(
            "⚠️  {} ({} productos)",
            review_path.display(),
            report.review.len()
        );
    }

    if report.join_stats.unmatched_inventory > 0 {
        println!(
            "ℹ️  {} filas de Odoo sin coincidencia en el catálogo",
            report.join_stats.unmatched_inventory
        );
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ {}", report.summary());

    Ok(())
}
