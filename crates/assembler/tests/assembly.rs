//! End-to-end assembly against the built-in catalog.

use std::collections::HashSet;

use chrono::NaiveDate;
use loggerforge_assembler::{ProgramAssembler, describe};
use loggerforge_core::{
    CatalogBuilder, CatalogEntry, DataInterval, Deps, Descriptor, Error, Instrument, InstrumentParts,
    InstrumentRequest, InstrumentSettings, NameInclusion, ProgramOptions, ProgramRequest, Table,
    TableItem, Terminal, TimeUnit, Variable, Wiring,
};
use loggerforge_instruments::{builtin_catalog, setra};
use serde_json::json;

fn program(instruments: Vec<InstrumentRequest>) -> ProgramRequest {
    ProgramRequest {
        name: "Test Station".into(),
        options: ProgramOptions::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()),
        instruments,
    }
}

fn with(settings: InstrumentSettings) -> impl FnOnce(InstrumentRequest) -> InstrumentRequest {
    move |r| r.settings(settings)
}

fn soil_probe(address: &str, elevation: i32) -> InstrumentRequest {
    with(InstrumentSettings {
        label: Some(format!("soil_{address}")),
        sdi12_address: Some(address.parse().unwrap()),
        elevation: Some(elevation),
        name_inclusion: NameInclusion::Both,
        ..Default::default()
    })(InstrumentRequest::new("Acclima_TDR310N"))
}

/// A realistic station exercising every facet.
fn station() -> ProgramRequest {
    let mut pyranometer = InstrumentSettings::default();
    pyranometer.params.insert("pyran_calib".into(), json!(5.27));

    program(vec![
        InstrumentRequest::new("Campbell_CR1000X_Battery"),
        InstrumentRequest::new("Campbell_CR1000X_PanelTemp"),
        InstrumentRequest::new("RMYoung_05108_77"),
        InstrumentRequest::new("Setra_CS100"),
        with(InstrumentSettings {
            label: Some("hmp".into()),
            ..Default::default()
        })(InstrumentRequest::new("Vaisala_HMP155")),
        soil_probe("1", -10),
        soil_probe("2", -30),
        with(InstrumentSettings {
            sdi12_address: Some("3".parse().unwrap()),
            ..Default::default()
        })(InstrumentRequest::new("OTT_Pluvio2")),
        InstrumentRequest::new("Sierra_RV50X")
            .depends_on("battery_voltage", "Campbell_CR1000X_Battery", "batt_volt")
            .depends_on("shutoff_voltage", "Campbell_CR1000X_Battery", "shutoff_voltage"),
        with(InstrumentSettings {
            sdi12_address: Some("4".parse().unwrap()),
            ..Default::default()
        })(InstrumentRequest::new("Campbell_SnowVue10"))
        .depends_on("air_temperature", "hmp", "air_temp"),
        with(pyranometer)(InstrumentRequest::new("Apogee_SP510")),
    ])
}

/// Names declared by the rendered declaration block.
fn declared_names(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            if let Some(rest) = line.strip_prefix("Alias ") {
                let alias = rest.split(" = ").nth(1)?;
                return Some(alias.split(' ').next()?.to_string());
            }
            let rest = ["Public ", "Dim ", "Const "]
                .iter()
                .find_map(|kind| line.strip_prefix(kind))?;
            let end = rest.find(['(', ' ']).unwrap_or(rest.len());
            Some(rest[..end].to_string())
        })
        .collect()
}

#[test]
fn assembly_is_deterministic() {
    let catalog = builtin_catalog();
    let assembler = ProgramAssembler::new(&catalog);
    let first = assembler.assemble(&station()).unwrap();
    let second = assembler.assemble(&station()).unwrap();
    assert_eq!(first.text, second.text);
}

#[test]
fn station_sections_in_order() {
    let catalog = builtin_catalog();
    let text = ProgramAssembler::new(&catalog).assemble(&station()).unwrap().text;

    let markers = [
        "'Program: Test Station",
        "'Date: 2026-03-01",
        "'System Configuration",
        "'Wiring: RMYoung_05108_77",
        "Public batt_volt",
        "SequentialMode",
        "DataTable(FiveMin,True,-1)",
        "DataTable(StatusReport,True,-1)",
        "DataTable(Soils,True,-1)",
        "BeginProg",
        "    shutoff_voltage = 11.5",
        "    Scan(5,Sec,0,0)",
        "        Battery(batt_volt)",
        "        CallTable FiveMin",
        "        CallTable Soils",
        "        pluv_flag = 1",
        "    NextScan",
        "    SlowSequence 'soil",
        "    SlowSequence 'pluvio",
        "    SlowSequence 'Snow",
        "EndProg",
    ];
    let mut cursor = 0;
    for marker in markers {
        let found = text[cursor..]
            .find(marker)
            .unwrap_or_else(|| panic!("'{marker}' missing or out of order"));
        cursor += found + marker.len();
    }
    assert!(text.ends_with("EndProg\n"));
    assert!(!text.contains("PreserveVariables"));
    assert!(text.contains(":FieldNames(\"air_temp_max\")"));
    assert!(
        !declared_names(&text).contains(&"air_temp_max".to_string()),
        "field-only names are not declared"
    );
}

#[test]
fn five_min_items_follow_program_order() {
    let catalog = builtin_catalog();
    let assembler = ProgramAssembler::new(&catalog);

    let forward = assembler
        .assemble(&program(vec![
            InstrumentRequest::new("Setra_CS100"),
            InstrumentRequest::new("Vaisala_HMP155"),
        ]))
        .unwrap();
    let calls: Vec<_> = forward.tables[0].items.iter().map(|i| i.call.as_str()).collect();
    assert_eq!(
        calls,
        [
            "Average(1,bp,IEEE4,False)",
            "Average(1,air_temp,FP2,False)",
            "Maximum(1,air_temp,FP2,False,True)",
            "Minimum(1,air_temp,FP2,False,True)",
            "Average(1,rh,FP2,False)",
        ]
    );

    let reversed = assembler
        .assemble(&program(vec![
            InstrumentRequest::new("Vaisala_HMP155"),
            InstrumentRequest::new("Setra_CS100"),
        ]))
        .unwrap();
    assert_eq!(
        reversed.tables[0].items.last().unwrap().call,
        "Average(1,bp,IEEE4,False)"
    );
}

#[test]
fn effective_names_are_unique() {
    let catalog = builtin_catalog();
    let text = ProgramAssembler::new(&catalog).assemble(&station()).unwrap().text;
    let names = declared_names(&text);
    let distinct: HashSet<_> = names.iter().map(|n| n.to_ascii_lowercase()).collect();
    assert!(names.len() > 50);
    assert_eq!(names.len(), distinct.len());
    assert!(names.contains(&"soil_vwc_1_n10".to_string()));
    assert!(names.contains(&"soil_vwc_2_n30".to_string()));
}

struct TenMinuteLogger(InstrumentParts);

impl Instrument for TenMinuteLogger {
    fn parts(&self) -> &InstrumentParts {
        &self.0
    }

    fn tables(&self, _deps: &Deps<'_>) -> loggerforge_core::Result<Option<Vec<Table>>> {
        Ok(Some(vec![
            Table::new("FiveMin")
                .interval(DataInterval::new(0, 10, TimeUnit::Min, 10))
                .item(TableItem::new("Sample(1,level,FP2)")),
        ]))
    }
}

const TEN_MINUTE: Descriptor = Descriptor {
    type_id: "Test_TenMinute",
    manufacturer: "Test",
    model: "Ten Minute",
    category: "Level",
};

#[test]
fn mismatched_five_min_interval_is_a_table_conflict() {
    let catalog = CatalogBuilder::new()
        .register(setra::entry())
        .register(CatalogEntry::new(TEN_MINUTE, |s| {
            Ok(Box::new(TenMinuteLogger(InstrumentParts::assemble(
                TEN_MINUTE,
                s,
                Wiring::default(),
                vec![Variable::public("level").into()],
                &[],
            )?)))
        }))
        .build();

    let err = ProgramAssembler::new(&catalog)
        .assemble(&program(vec![
            InstrumentRequest::new("Setra_CS100"),
            InstrumentRequest::new("Test_TenMinute"),
        ]))
        .unwrap_err();
    assert!(matches!(
        &err,
        Error::TableConflict { table, first, second, .. }
            if table == "FiveMin" && first == "Setra_CS100" && second == "Test_TenMinute"
    ));
    assert_eq!(err.kind(), "table_conflict");
}

#[test]
fn duplicate_bp_is_a_naming_conflict() {
    let catalog = builtin_catalog();
    let labelled = |label: &str| {
        with(InstrumentSettings {
            label: Some(label.into()),
            ..Default::default()
        })(InstrumentRequest::new("Setra_CS100"))
    };
    let err = ProgramAssembler::new(&catalog)
        .assemble(&program(vec![labelled("baro_a"), labelled("baro_b")]))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::DuplicateVariableName { name, first, second }
            if name == "bp" && first == "baro_a" && second == "baro_b"
    ));
}

#[test]
fn elevation_suffix_avoids_the_collision() {
    let catalog = builtin_catalog();
    let at = |elevation: i32| {
        with(InstrumentSettings {
            label: Some(format!("baro_{elevation}")),
            elevation: Some(elevation),
            name_inclusion: NameInclusion::Elevation,
            ..Default::default()
        })(InstrumentRequest::new("Setra_CS100"))
    };
    let assembled = ProgramAssembler::new(&catalog)
        .assemble(&program(vec![at(100), at(200)]))
        .unwrap();
    assert!(assembled.text.contains("Public bp_100 : Units bp_100 = kPa"));
    assert!(assembled.text.contains("        bp_200 = bp_200*0.1"));
}

#[test]
fn sdi12_device_without_address_fails() {
    let catalog = builtin_catalog();
    let err = ProgramAssembler::new(&catalog)
        .assemble(&program(vec![InstrumentRequest::new("OTT_PLS500")]))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InstrumentConfig { instrument, setting, .. }
            if instrument == "OTT_PLS500" && setting == "sdi12_address"
    ));
}

#[test]
fn unbound_battery_voltage_fails() {
    let catalog = builtin_catalog();
    let err = ProgramAssembler::new(&catalog)
        .assemble(&program(vec![InstrumentRequest::new("Sierra_RV50X")]))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MissingDependency { instrument, dependency, .. }
            if instrument == "Sierra_RV50X" && dependency == "battery_voltage"
    ));
}

#[test]
fn dependency_renders_sibling_effective_name() {
    let catalog = builtin_catalog();
    let battery = with(InstrumentSettings {
        elevation: Some(100),
        name_inclusion: NameInclusion::Elevation,
        ..Default::default()
    })(InstrumentRequest::new("Campbell_CR1000X_Battery"));
    let modem = InstrumentRequest::new("Sierra_RV50X")
        .depends_on("battery_voltage", "Campbell_CR1000X_Battery", "batt_volt")
        .depends_on("shutoff_voltage", "Campbell_CR1000X_Battery", "shutoff_voltage");

    let text = ProgramAssembler::new(&catalog)
        .assemble(&program(vec![battery, modem]))
        .unwrap()
        .text;
    assert!(text.contains("        If batt_volt_100 < shutoff_voltage_100 Then"));
    assert!(text.contains("        SW12(SW12_2,Modem_Power)"));
}

#[test]
fn soil_sequences_group_under_first_cadence() {
    let catalog = builtin_catalog();
    let assembled = ProgramAssembler::new(&catalog)
        .assemble(&program(vec![soil_probe("1", -10), soil_probe("2", -30)]))
        .unwrap();

    assert_eq!(assembled.sequences.len(), 1);
    let soil = &assembled.sequences[0];
    assert_eq!(soil.id, "soil");
    assert_eq!(soil.scan.to_string(), "Scan(1,Min,0,0)");

    let first = "If IfTime(4,5,Min) Then\n    SDI12Recorder(soil_1,C3,\"1\",\"M1!\",1,0,-1)\n    soil_vwc_1_n10 = soil_vwc_1_n10*0.01\nEndIf";
    let second = "If IfTime(4,5,Min) Then\n    SDI12Recorder(soil_2,C3,\"2\",\"M1!\",1,0,-1)\n    soil_vwc_2_n30 = soil_vwc_2_n30*0.01\nEndIf";
    assert_eq!(soil.logic(), format!("{first}\n{second}"));

    let soils = assembled.tables.iter().find(|t| t.name == "Soils").unwrap();
    assert_eq!(soils.items.len(), 10);
}

#[test]
fn wiring_override_reaches_calls_and_diagram() {
    let catalog = builtin_catalog();
    let mut settings = InstrumentSettings::default();
    settings.wiring.insert("Blue".into(), Some(Terminal::Se(5)));
    let text = ProgramAssembler::new(&catalog)
        .assemble(&program(vec![with(settings)(InstrumentRequest::new("Setra_CS100"))]))
        .unwrap()
        .text;
    assert!(text.contains("'Blue:    SE5      Signal H"));
    assert!(text.contains("VoltSE(bp,1,mV5000,5,True,0,60,0.2,600)"));
}

#[test]
fn case_variant_wiring_keys_fail() {
    let catalog = builtin_catalog();
    let mut settings = InstrumentSettings::default();
    settings.wiring.insert("Blue".into(), Some(Terminal::Se(3)));
    settings.wiring.insert("blue".into(), Some(Terminal::Se(9)));
    let err = ProgramAssembler::new(&catalog)
        .assemble(&program(vec![with(settings)(InstrumentRequest::new("Setra_CS100"))]))
        .unwrap_err();
    assert!(matches!(err, Error::AmbiguousWiringRole { role, .. } if role == "Blue"));
}

#[test]
fn disconnecting_a_wired_role_fails() {
    let catalog = builtin_catalog();
    let mut settings = InstrumentSettings::default();
    settings.wiring.insert("Yellow".into(), None);
    let err = ProgramAssembler::new(&catalog)
        .assemble(&program(vec![with(settings)(InstrumentRequest::new("Setra_CS100"))]))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InstrumentConfig { instrument, setting, .. }
            if instrument == "Setra_CS100" && setting == "wiring"
    ));
}

#[test]
fn dependency_on_field_only_name_fails() {
    let catalog = builtin_catalog();
    let mut request = station();
    for instrument in &mut request.instruments {
        if instrument.type_id == "Campbell_SnowVue10" {
            *instrument = instrument.clone().depends_on("air_temperature", "hmp", "air_temp_max");
        }
    }
    let err = ProgramAssembler::new(&catalog).assemble(&request).unwrap_err();
    assert!(matches!(
        err,
        Error::MissingDependency { dependency, reason, .. }
            if dependency == "air_temperature" && reason.contains("air_temp_max")
    ));
}

#[test]
fn unknown_type_fails() {
    let catalog = builtin_catalog();
    let err = ProgramAssembler::new(&catalog)
        .assemble(&program(vec![InstrumentRequest::new("Nonexistent")]))
        .unwrap_err();
    assert_eq!(err, Error::UnknownInstrument("Nonexistent".into()));
}

#[test]
fn preserve_variables_and_pipeline_mode() {
    let catalog = builtin_catalog();
    let mut request = program(vec![InstrumentRequest::new("Campbell_CR1000X_PanelTemp")]);
    request.options.preserve_variables = true;
    request.options.mode = loggerforge_core::ExecutionMode::Pipeline;
    let text = ProgramAssembler::new(&catalog).assemble(&request).unwrap().text;
    assert!(text.contains("\n\nPreserveVariables\nPipelineMode\n\n"));
}

#[test]
fn describe_uses_placeholders() {
    let catalog = builtin_catalog();
    let modem = catalog
        .instantiate("Sierra_RV50X", &InstrumentSettings::default())
        .unwrap();
    let text = describe(modem.as_ref()).unwrap();
    assert!(text.starts_with("Sierra Wireless RV50X (Modem)\n\nWiring Defaults:\n"));
    assert!(text.contains("<battery_voltage>: Measured supply battery voltage"));
    assert!(text.contains("If <battery_voltage> < <shutoff_voltage> Then"));
    assert!(text.contains("Pre-Scan Logic:\nModem_Power = True"));
}
