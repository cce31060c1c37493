//! # LoggerForge Instruments
//!
//! Definitions for every supported instrument type, and the
//! [`builtin_catalog`] that registers them.
//!
//! Each module holds one manufacturer's devices. An instrument type exposes a
//! `Descriptor` constant and an entry function returning its
//! [`CatalogEntry`](loggerforge_core::CatalogEntry), which carries the
//! settings the type requires and the dependencies it declares.

pub mod acclima;
pub mod apogee;
pub mod campbell;
pub mod envirocams;
pub mod ott;
pub mod prostar;
pub mod rmyoung;
pub mod setra;
pub mod sierra;
pub mod sparkfun;
pub mod vaisala;

mod shared;

use loggerforge_core::{Catalog, CatalogBuilder};
use tracing::debug;

/// The catalog of all built-in instrument types.
pub fn builtin_catalog() -> Catalog {
    let catalog = CatalogBuilder::new()
        .register(rmyoung::wind_monitor_entry())
        .register(rmyoung::ultrasonic_entry())
        .register(setra::entry())
        .register(vaisala::entry())
        .register(acclima::entry())
        .register(prostar::entry())
        .register(campbell::battery_entry())
        .register(campbell::panel_temp_entry())
        .register(envirocams::ipatrol_entry())
        .register(envirocams::scout_entry())
        .register(sparkfun::entry())
        .register(ott::pls500_entry())
        .register(ott::pluvio2_entry())
        .register(sierra::entry())
        .register(campbell::snowvue_entry())
        .register(apogee::entry())
        .build();

    debug!(count = catalog.len(), "Built-in instrument catalog ready");
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use loggerforge_core::InstrumentSettings;
    use serde_json::json;

    /// Settings that satisfy every requirement the entry declares.
    fn satisfying(entry: &loggerforge_core::CatalogEntry) -> InstrumentSettings {
        let mut s = InstrumentSettings::default();
        if entry.requirements.sdi12_address {
            s.sdi12_address = Some("1".parse().unwrap());
        }
        if entry.requirements.elevation {
            s.elevation = Some(-10);
        }
        for param in &entry.requirements.params {
            s.params.insert((*param).to_string(), json!(1.0));
        }
        s
    }

    #[test]
    fn registers_every_type() {
        let catalog = builtin_catalog();
        assert_eq!(catalog.len(), 16);
        assert_eq!(catalog.type_ids()[0], "Acclima_TDR310N");
        assert!(catalog.get("OTT_Pluvio2").is_some());
    }

    #[test]
    fn every_entry_builds_from_its_requirements() {
        let catalog = builtin_catalog();
        for entry in catalog.iter() {
            let settings = satisfying(entry);
            let instrument = entry
                .instantiate(&settings)
                .unwrap_or_else(|e| panic!("{}: {e}", entry.descriptor.type_id));
            assert_eq!(instrument.id(), entry.descriptor.type_id);
            assert_eq!(instrument.dependencies(), entry.dependencies);
        }
    }

    #[test]
    fn declared_requirements_are_enforced() {
        let catalog = builtin_catalog();
        for entry in catalog.iter() {
            let r = &entry.requirements;
            if r.sdi12_address || r.elevation || !r.params.is_empty() {
                assert!(
                    entry.instantiate(&InstrumentSettings::default()).is_err(),
                    "{} built without its required settings",
                    entry.descriptor.type_id
                );
            }
        }
    }

    #[test]
    fn power_switched_devices_declare_supply_dependencies() {
        let catalog = builtin_catalog();
        for type_id in ["Sierra_RV50X", "EnviroCams_iPatrol", "EnviroCams_Scout"] {
            let names: Vec<_> = catalog.get(type_id).unwrap().dependencies.iter().map(|d| d.name).collect();
            assert_eq!(names, ["battery_voltage", "shutoff_voltage"]);
        }
        assert_eq!(
            catalog.get("Campbell_SnowVue10").unwrap().dependencies[0].name,
            "air_temperature"
        );
    }

    #[test]
    fn catalog_lists_as_json() {
        let catalog = builtin_catalog();
        let entry = catalog.get("Apogee_SP510").unwrap();
        let v = serde_json::to_value(entry).unwrap();
        assert_eq!(v["type_id"], "Apogee_SP510");
        assert_eq!(v["requirements"]["params"][0], "pyran_calib");
        assert!(v.get("constructor").is_none());
    }
}
