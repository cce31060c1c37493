//! RM Young wind monitors.

use loggerforge_core::call::Arg;
use loggerforge_core::logic::condition;
use loggerforge_core::{
    Body, CatalogEntry, Declaration, Deps, Descriptor, IfBlock, Instrument, InstrumentParts, InstrumentSettings,
    Result, Table, TableItem, Terminal, Variable, Wire, Wiring, call,
};

use crate::shared::{five_min, status_report};

pub const WIND_MONITOR: Descriptor = Descriptor {
    type_id: "RMYoung_05108_77",
    manufacturer: "RM Young",
    model: "05108-77",
    category: "Wind",
};

pub const ULTRASONIC: Descriptor = Descriptor {
    type_id: "RMYoung_09106",
    manufacturer: "RM Young",
    model: "09106",
    category: "Wind",
};

pub fn wind_monitor_entry() -> CatalogEntry {
    CatalogEntry::new(WIND_MONITOR, |s| Ok(Box::new(WindMonitor::new(s)?)))
}

pub fn ultrasonic_entry() -> CatalogEntry {
    CatalogEntry::new(ULTRASONIC, |s| Ok(Box::new(Ultrasonic::new(s)?)))
}

fn wind_variables() -> Vec<Declaration> {
    vec![
        Variable::public("wind_spd").units("m s-1").into(),
        Variable::public("wind_dir").units("arcdeg").into(),
        Variable::public("wind_timer").units("sec").into(),
        Variable::field("wind_dir_sd").into(),
        Variable::field("windgust").into(),
    ]
}

/// Vector-averaged speed and direction plus gust, and a calm-time counter.
fn wind_tables(parts: &InstrumentParts) -> Result<Vec<Table>> {
    let spd = parts.var("wind_spd")?;
    let dir = parts.var("wind_dir")?;
    let timer = parts.var("wind_timer")?;

    Ok(vec![
        five_min()
            .item(
                TableItem::new(call!("WindVector", 1, spd, dir, "FP2", false, 0, 0, 0))
                    .fields([spd, dir, parts.var("wind_dir_sd")?]),
            )
            .item(
                TableItem::new(call::maximum(1, spd, "FP2", false, false))
                    .fields([parts.var("windgust")?]),
            ),
        status_report()
            .item(TableItem::new(call::totalize(1, timer, "IEEE4", false)).fields([timer])),
    ])
}

/// Direction is meaningless in calm air; count calm seconds instead.
fn calm_check(parts: &InstrumentParts) -> Result<IfBlock> {
    let spd = parts.var("wind_spd")?;
    let dir = parts.var("wind_dir")?;
    let timer = parts.var("wind_timer")?;
    Ok(IfBlock::new(
        condition([spd, "<=", "0"]),
        Body::new()
            .line(format!("{dir} = NAN"))
            .line(format!("{timer} = 3")),
    )
    .otherwise(Body::new().line(format!("{timer} = 0"))))
}

/// 05108-77 propeller anemometer: pulse-counted speed, potentiometer
/// direction.
pub struct WindMonitor {
    parts: InstrumentParts,
}

impl WindMonitor {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let wiring = Wiring::new(vec![
            Wire::new("Red", Terminal::P(1), "WS Signal      WS SIG"),
            Wire::new("White", Terminal::Vx(2), "WD Excite      WD EXC"),
            Wire::new("Green", Terminal::Se(7), "WD Signal      WD SIG"),
            Wire::new("Black", Terminal::AnalogGround, "Signal G       WD REF"),
            Wire::new("Brown", Terminal::Ground, "Earth G        GND*"),
        ])
        .with_note("* NOTE: Ground to EARTH in junction box directly to mast");

        let mut declarations = vec![
            Variable::constant("WS_offset", 0).into(),
            Variable::constant("WS_multiplier", 0.1666).into(),
        ];
        declarations.extend(wind_variables());

        Ok(Self {
            parts: InstrumentParts::assemble(WIND_MONITOR, settings, wiring, declarations, &[])?,
        })
    }
}

impl Instrument for WindMonitor {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        wind_tables(&self.parts).map(Some)
    }

    fn program(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        let p = &self.parts;
        let lines = [
            call!(
                "BrHalf",
                p.var("wind_dir")?,
                1,
                "mV5000",
                p.terminal("Green")?,
                p.terminal("White")?,
                1,
                2500,
                true,
                0,
                60,
                355,
                0
            )
            .to_string(),
            call!(
                "PulseCount",
                p.var("wind_spd")?,
                1,
                p.terminal("Red")?,
                5,
                1,
                Arg::raw(p.var("WS_multiplier")?),
                Arg::raw(p.var("WS_offset")?)
            )
            .to_string(),
            calm_check(p)?.to_string(),
        ];
        Ok(Some(lines.join("\n")))
    }
}

/// 09106 ultrasonic anemometer with analog voltage outputs.
pub struct Ultrasonic {
    parts: InstrumentParts,
}

impl Ultrasonic {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let wiring = Wiring::new(vec![
            Wire::new("Red", Terminal::Power12V, "12v Power"),
            Wire::new("White", Terminal::AnalogGround, "Signal G"),
            Wire::new("Clear", Terminal::AnalogGround, "Signal G"),
            Wire::new("Green", Terminal::Se(13), "WD Signal"),
            Wire::new("Brown", Terminal::Se(14), "WS Signal"),
            Wire::new("Black", Terminal::Ground, "Power Ground"),
        ]);

        Ok(Self {
            parts: InstrumentParts::assemble(ULTRASONIC, settings, wiring, wind_variables(), &[])?,
        })
    }
}

impl Instrument for Ultrasonic {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        wind_tables(&self.parts).map(Some)
    }

    fn program(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        let p = &self.parts;
        let spd = p.var("wind_spd")?;
        let dir = p.var("wind_dir")?;

        let wrap = IfBlock::new(
            condition([dir, ">", "360"]),
            Body::new().line(format!("{dir} = {dir} - 360")),
        );
        let lines = [
            call!("VoltSE", spd, 1, "mV5000", p.terminal("Brown")?, 0, 0, 15000, 0.02, 0).to_string(),
            call!("VoltSE", dir, 1, "mV5000", p.terminal("Green")?, 0, 0, 15000, 0.108, 0).to_string(),
            wrap.to_string(),
            calm_check(p)?.to_string(),
        ];
        Ok(Some(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wind_monitor_program_uses_wiring() {
        let w = WindMonitor::new(&InstrumentSettings::default()).unwrap();
        let program = w.program(&Deps::placeholders(w.id())).unwrap().unwrap();
        assert!(program.starts_with("BrHalf(wind_dir,1,mV5000,7,Vx2,1,2500,True,0,60,355,0)"));
        assert!(program.contains("PulseCount(wind_spd,1,P1,5,1,WS_multiplier,WS_offset)"));
        assert!(program.contains("If wind_spd <= 0 Then\n    wind_dir = NAN"));
    }

    #[test]
    fn wind_tables_label_columns() {
        let w = WindMonitor::new(&InstrumentSettings::default()).unwrap();
        let tables = w.tables(&Deps::placeholders(w.id())).unwrap().unwrap();
        assert_eq!(tables[0].name, "FiveMin");
        assert_eq!(
            tables[0].items[0].to_string(),
            "WindVector(1,wind_spd,wind_dir,FP2,False,0,0,0):FieldNames(\"wind_spd,wind_dir,wind_dir_sd\")"
        );
        assert_eq!(tables[1].name, "StatusReport");
    }

    #[test]
    fn ultrasonic_reads_speed_from_brown() {
        let u = Ultrasonic::new(&InstrumentSettings::default()).unwrap();
        let program = u.program(&Deps::placeholders(u.id())).unwrap().unwrap();
        assert!(program.starts_with("VoltSE(wind_spd,1,mV5000,14,0,0,15000,0.02,0)"));
        assert!(program.contains("If wind_dir > 360 Then\n    wind_dir = wind_dir - 360\nEndIf"));
    }
}
