//! Campbell Scientific: the logger's own battery and panel sensors, and the
//! SnowVUE 10 snow depth sensor.

use loggerforge_core::call::Arg;
use loggerforge_core::logic::condition;
use loggerforge_core::{
    Body, CatalogEntry, DataType, Dependency, Deps, Descriptor, IfBlock, Instrument, InstrumentParts,
    InstrumentSettings, Register, Result, Scan, Sdi12Address, SlowSequence, Table, TableItem, Terminal,
    TimeUnit, Variable, Wire, Wiring, call,
};

use crate::shared::{five_min, sdi12_recorder, status_report};

pub const BATTERY: Descriptor = Descriptor {
    type_id: "Campbell_CR1000X_Battery",
    manufacturer: "Campbell Scientific",
    model: "CR1000X Battery",
    category: "Power",
};

pub const PANEL_TEMP: Descriptor = Descriptor {
    type_id: "Campbell_CR1000X_PanelTemp",
    manufacturer: "Campbell Scientific",
    model: "CR1000X Panel Temperature",
    category: "Logger",
};

pub const SNOWVUE: Descriptor = Descriptor {
    type_id: "Campbell_SnowVue10",
    manufacturer: "Campbell Scientific",
    model: "SnowVUE10",
    category: "Snow",
};

pub fn battery_entry() -> CatalogEntry {
    CatalogEntry::new(BATTERY, |s| Ok(Box::new(Battery::new(s)?)))
}

pub fn panel_temp_entry() -> CatalogEntry {
    CatalogEntry::new(PANEL_TEMP, |s| Ok(Box::new(PanelTemp::new(s)?)))
}

pub fn snowvue_entry() -> CatalogEntry {
    CatalogEntry::new(SNOWVUE, |s| Ok(Box::new(SnowVue10::new(s)?)))
        .requires_sdi12()
        .dependencies(SNOWVUE_DEPENDENCIES)
}

/// Supply voltage measured by the logger itself.
pub struct Battery {
    parts: InstrumentParts,
    shutoff: f64,
}

impl Battery {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let shutoff = settings.param_f64(BATTERY.type_id, "shutoff_voltage", Some(11.5))?;
        let declarations = vec![
            Variable::public("batt_volt").units("v").into(),
            Variable::public("shutoff_voltage").units("v").into(),
        ];
        Ok(Self {
            parts: InstrumentParts::assemble(BATTERY, settings, Wiring::default(), declarations, &[])?,
            shutoff,
        })
    }
}

impl Instrument for Battery {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        let batt = self.parts.var("batt_volt")?;
        Ok(Some(vec![
            five_min()
                .item(TableItem::new(call::sample(1, batt, "FP2")))
                .item(TableItem::new(call::minimum(1, batt, "FP2", false, false))),
        ]))
    }

    fn pre_scan(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        Ok(Some(format!(
            "{} = {}",
            self.parts.var("shutoff_voltage")?,
            self.shutoff
        )))
    }

    fn program(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        Ok(Some(call!("Battery", self.parts.var("batt_volt")?).to_string()))
    }
}

pub struct PanelTemp {
    parts: InstrumentParts,
}

impl PanelTemp {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let declarations = vec![Variable::public("panel_temp").units("deg C").into()];
        Ok(Self {
            parts: InstrumentParts::assemble(PANEL_TEMP, settings, Wiring::default(), declarations, &[])?,
        })
    }
}

impl Instrument for PanelTemp {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        let temp = self.parts.var("panel_temp")?;
        Ok(Some(vec![
            status_report().item(TableItem::new(call::average(1, temp, "FP2", false)).fields([temp])),
        ]))
    }

    fn program(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        // 15000 Hz rejects 50 and 60 Hz mains noise.
        Ok(Some(call!("PanelTemp", self.parts.var("panel_temp")?, 15000).to_string()))
    }
}

const SNOWVUE_DEPENDENCIES: &[Dependency] = &[Dependency {
    name: "air_temperature",
    description: "Air temperature in deg C for the speed-of-sound correction",
}];

/// Ultrasonic snow depth sensor.
///
/// The distance to bare ground is kept in a file on the logger so that it
/// survives restarts; setting `Set_D2G` re-zeroes it from the next reading.
pub struct SnowVue10 {
    parts: InstrumentParts,
    address: Sdi12Address,
    ground_distance: f64,
}

impl SnowVue10 {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let address = settings.require_sdi12(SNOWVUE.type_id)?.clone();
        let ground_distance = settings.param_f64(SNOWVUE.type_id, "ground_distance", Some(1.9))?;

        let wiring = Wiring::new(vec![
            Wire::new("White", Terminal::C(1), "SDI-12 data SDI_ADD: 1"),
            Wire::new("Brown", Terminal::Power12V, "Fuse Block 0.5A fuse power"),
            Wire::new("Black", Terminal::Ground, "Power Ground"),
            Wire::new("Clear", Terminal::AnalogGround, ""),
        ]);

        let declarations = vec![
            Variable::public("SnowVUE_Go").data_type(DataType::Boolean).into(),
            Variable::public("Set_D2G").data_type(DataType::Boolean).into(),
            Register::public("SnowVUE", 2)
                .alias_with_units(1, "Dist2Targ", "m")
                .alias(2, "snow_depth_q")
                .into(),
            Variable::public("Dist2Gnd").units("m").into(),
            Variable::public("TCDT").units("m").into(),
            Variable::public("snow_depth").units("cm").into(),
            Variable::public("snow_min").units("cm").into(),
            Variable::dim("FH").data_type(DataType::Long).into(),
            Variable::dim("dummystr").data_type(DataType::String(None)).into(),
            Register::public("SnowVUE_Meta", 8)
                .alias_with_units(2, "IntTemp", "deg C")
                .alias_with_units(3, "IntRH", "%")
                .alias_with_units(4, "Pitch", "deg")
                .alias_with_units(5, "Roll", "deg")
                .alias_with_units(6, "SupVolt", "v")
                .alias_with_units(7, "ResFreq", "kHz")
                .alias_with_units(8, "Alert", "unitless")
                .into(),
        ];

        Ok(Self {
            parts: InstrumentParts::assemble(SNOWVUE, settings, wiring, declarations, SNOWVUE_DEPENDENCIES)?,
            address,
            ground_distance,
        })
    }

    /// One file per instance, named after its ground-distance variable.
    fn ground_file(&self) -> Result<Arg> {
        Ok(Arg::quoted(format!("USR:{}.txt", self.parts.var("Dist2Gnd")?)))
    }
}

impl Instrument for SnowVue10 {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        let p = &self.parts;
        let depth = p.var("snow_depth")?;
        let quality = p.var("snow_depth_q")?;
        let min = p.var("snow_min")?;
        Ok(Some(vec![
            five_min()
                .item(TableItem::new(call::sample(1, depth, "FP2")).fields([depth]))
                .item(TableItem::new(call::sample(1, quality, "FP2")).fields([quality])),
            status_report().item(TableItem::new(call::minimum(1, min, "FP2", false, false)).fields([min])),
        ]))
    }

    fn pre_scan(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        let p = &self.parts;
        let fh = p.var("FH")?;
        let buf = p.var("dummystr")?;
        let d2g = p.var("Dist2Gnd")?;
        let file = self.ground_file()?;

        let restore = IfBlock::new(
            condition([Arg::from(call!("FileSize", file.clone())), ">".into(), 0.into()]),
            Body::new()
                .line(format!("{fh} = {}", call!("FileOpen", file, Arg::quoted("r"), 0)))
                .line(call!("FileRead", fh, buf, 10))
                .line(call!("SplitStr", d2g, buf, Arg::quoted(""), 1, 0))
                .line(call!("FileClose", fh)),
        )
        .otherwise(Body::new().line(format!("{d2g} = {}", self.ground_distance)));
        Ok(Some(restore.to_string()))
    }

    fn program(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        let go = self.parts.var("SnowVUE_Go")?;
        let set = self.parts.var("Set_D2G")?;
        let lines = [
            // Start a reading ahead of each five-minute boundary.
            IfBlock::new(call!("IfTime", 237, 300, "Sec"), Body::new().line(format!("{go} = True"))),
            IfBlock::new(set, Body::new().line(format!("{go} = True"))),
        ];
        Ok(Some(
            lines.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n"),
        ))
    }

    fn slow_sequence(&self, deps: &Deps<'_>) -> Result<Option<SlowSequence>> {
        let p = &self.parts;
        let port = p.terminal("White")?;
        let go = p.var("SnowVUE_Go")?;
        let set = p.var("Set_D2G")?;
        let tcdt = p.var("TCDT")?;
        let depth = p.var("snow_depth")?;
        let min = p.var("snow_min")?;
        let d2g = p.var("Dist2Gnd")?;
        let fh = p.var("FH")?;
        let buf = p.var("dummystr")?;
        let air = deps.name("air_temperature")?;

        let measure = IfBlock::new(
            go,
            Body::new()
                .line(sdi12_recorder(p.register("SnowVUE")?.name(), port, &self.address, "M1!"))
                .line(sdi12_recorder(p.register("SnowVUE_Meta")?.name(), port, &self.address, "M9!")),
        );
        let clamp = IfBlock::new(
            condition([depth, "<", "0"]),
            Body::new()
                .line(format!("{min} = {depth}"))
                .line(format!("{depth} = 0")),
        );
        let rezero = IfBlock::new(
            set,
            Body::new()
                .line(format!("{d2g} = {tcdt}"))
                .line(format!(
                    "{fh} = {}",
                    call!("FileOpen", self.ground_file()?, Arg::quoted("w"), 0)
                ))
                .line(call!("Sprintf", buf, Arg::quoted("%f"), d2g))
                .line(call!("FileWrite", fh, buf, 0))
                .line(call!("FileClose", fh))
                .line(format!("{set} = False")),
        );

        let sequence = SlowSequence::new("Snow", Scan::new(1, TimeUnit::Min))
            .line(measure)
            .line(format!("{go} = False"))
            .line(format!(
                "{tcdt} = {}*SQR(({air}+273.15)/273.15)",
                p.var("Dist2Targ")?
            ))
            .line(format!("{depth} = ({d2g} - {tcdt}) * 100"))
            .line(clamp)
            .line(rezero);
        Ok(Some(sequence))
    }
}
