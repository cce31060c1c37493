//! `loggerforge instruments`: List the instrument catalog.

use loggerforge_core::CatalogEntry;
use loggerforge_instruments::builtin_catalog;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = builtin_catalog();
    let entries: Vec<&CatalogEntry> = catalog.iter().collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{:<28} {:<16} {:<40} {}", "TYPE", "CATEGORY", "INSTRUMENT", "NEEDS");
    for entry in entries {
        let d = &entry.descriptor;
        println!(
            "{:<28} {:<16} {:<40} {}",
            d.type_id,
            d.category,
            format!("{} {}", d.manufacturer, d.model),
            needs(entry)
        );
    }
    Ok(())
}

/// Settings and dependencies a type must be given.
fn needs(entry: &CatalogEntry) -> String {
    let r = &entry.requirements;
    let mut needs = Vec::new();
    if r.sdi12_address {
        needs.push("sdi12_address".to_string());
    }
    if r.elevation {
        needs.push("elevation".to_string());
    }
    needs.extend(r.params.iter().map(|p| format!("param:{p}")));
    needs.extend(entry.dependencies.iter().map(|d| format!("<{}>", d.name)));
    if needs.is_empty() {
        "-".into()
    } else {
        needs.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_lists_requirements_and_dependencies() {
        let catalog = builtin_catalog();
        assert_eq!(needs(catalog.get("Setra_CS100").unwrap()), "-");
        assert_eq!(
            needs(catalog.get("Acclima_TDR310N").unwrap()),
            "sdi12_address, elevation"
        );
        assert_eq!(
            needs(catalog.get("Sierra_RV50X").unwrap()),
            "<battery_voltage>, <shutoff_voltage>"
        );
        assert_eq!(needs(catalog.get("Apogee_SP510").unwrap()), "param:pyran_calib");
    }
}
