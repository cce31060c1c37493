//! OTT Hydromet SDI-12 sensors.

use loggerforge_core::call::Arg;
use loggerforge_core::{
    CatalogEntry, Deps, Descriptor, Instrument, InstrumentParts, InstrumentSettings, Register, Result,
    Scan, Sdi12Address, SlowSequence, Table, TableItem, Terminal, TimeUnit, Variable, Wire, Wiring,
    call,
};

use crate::shared::{five_min, sdi12_recorder, status_report};

pub const PLS500: Descriptor = Descriptor {
    type_id: "OTT_PLS500",
    manufacturer: "OTT",
    model: "PLS 500",
    category: "Pressure Probe",
};

pub const PLUVIO2: Descriptor = Descriptor {
    type_id: "OTT_Pluvio2",
    manufacturer: "OTT",
    model: "Pluvio2 L 400",
    category: "Precipitation",
};

pub fn pls500_entry() -> CatalogEntry {
    CatalogEntry::new(PLS500, |s| Ok(Box::new(Pls500::new(s)?))).requires_sdi12()
}

pub fn pluvio2_entry() -> CatalogEntry {
    CatalogEntry::new(PLUVIO2, |s| Ok(Box::new(Pluvio2::new(s)?))).requires_sdi12()
}

/// Well level and water temperature transducer.
pub struct Pls500 {
    parts: InstrumentParts,
    address: Sdi12Address,
}

impl Pls500 {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let address = settings.require_sdi12(PLS500.type_id)?.clone();
        let wiring = Wiring::new(vec![
            Wire::new("Blue", Terminal::Ground, ""),
            Wire::new("Red", Terminal::Power12V, "(on CR1000X)"),
            Wire::new("Grey", Terminal::C(5), "SDI-12 data"),
        ]);
        let declarations = vec![
            Register::public("Transducer", 3)
                .alias_with_units(1, "well_lvl", "m")
                .alias_with_units(2, "well_tmp", "deg C")
                .alias(3, "well_status")
                .into(),
        ];
        Ok(Self {
            parts: InstrumentParts::assemble(PLS500, settings, wiring, declarations, &[])?,
            address,
        })
    }
}

impl Instrument for Pls500 {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        let p = &self.parts;
        let level = p.var("well_lvl")?;
        let temp = p.var("well_tmp")?;
        let status = p.var("well_status")?;
        Ok(Some(vec![
            five_min()
                .item(TableItem::new(call::average(1, level, "FP2", false)).fields([level]))
                .item(TableItem::new(call::average(1, temp, "FP2", false)).fields([temp]))
                .item(TableItem::new(call::sample(1, status, "FP2")).fields([status])),
        ]))
    }

    fn slow_sequence(&self, _deps: &Deps<'_>) -> Result<Option<SlowSequence>> {
        let p = &self.parts;
        Ok(Some(
            SlowSequence::new("Transducer", Scan::new(1, TimeUnit::Min)).line(sdi12_recorder(
                p.register("Transducer")?.name(),
                p.terminal("Grey")?,
                &self.address,
                "M!",
            )),
        ))
    }
}

/// Weighing precipitation gauge.
///
/// The gauge reports accumulation since its last poll, so the five-minute
/// total only counts a scan in which the slow sequence fetched new data.
pub struct Pluvio2 {
    parts: InstrumentParts,
    address: Sdi12Address,
}

impl Pluvio2 {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let address = settings.require_sdi12(PLUVIO2.type_id)?.clone();
        let wiring = Wiring::new(vec![
            Wire::unconnected("Black", "DC Converter black (out) (#1 not used)"),
            Wire::new("Green", Terminal::C(5), "SDI-12 data SDI_ADD: 2"),
            Wire::new("White", Terminal::Ground, "Data Ground"),
            Wire::unconnected("Red", "24V DC Converter Out (Yellow)"),
            Wire::new("Yellow", Terminal::Power12V, "12v Power"),
            Wire::new("Brown", Terminal::Ground, "Power Ground"),
        ]);
        let declarations = vec![
            Register::public("Pluvio", 9)
                .alias_with_units(1, "ppt_max_rate", "mm hr-1")
                .alias_with_units(2, "ppt", "mm")
                .alias_with_units(3, "pluv_accuNRT", "mm")
                .alias_with_units(4, "pluv_accuTtlNRT", "mm")
                .alias_with_units(5, "pluv_fill", "mm")
                .alias_with_units(6, "pluv_bucketNRT", "mm")
                .alias_with_units(7, "pluv_temp", "deg C")
                .alias_with_units(8, "pluv_heater", "code")
                .alias_with_units(9, "pluv_gagestat", "code")
                .into(),
            Variable::public("pluv_flag").initial(1).into(),
        ];
        Ok(Self {
            parts: InstrumentParts::assemble(PLUVIO2, settings, wiring, declarations, &[])?,
            address,
        })
    }
}

impl Instrument for Pluvio2 {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        let p = &self.parts;
        let ppt = p.var("ppt")?;
        let rate = p.var("ppt_max_rate")?;
        let fill = p.var("pluv_fill")?;
        let heater = p.var("pluv_heater")?;
        Ok(Some(vec![
            five_min()
                .item(
                    TableItem::new(call::totalize(1, ppt, "IEEE4", Arg::raw(p.var("pluv_flag")?)))
                        .fields([ppt]),
                )
                .item(TableItem::new(call::maximum(1, rate, "IEEE4", false, false)).fields([rate]))
                .item(TableItem::new(call::sample(1, fill, "IEEE4")).fields([fill]))
                .item(TableItem::new(call::sample(1, heater, "FP2")).fields([heater])),
            status_report()
                .item(TableItem::new(call::sample(1, p.var("pluv_gagestat")?, "FP2")))
                .item(TableItem::new(call::sample(1, p.var("pluv_temp")?, "FP2"))),
        ]))
    }

    fn post_scan(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        Ok(Some(format!("{} = 1", self.parts.var("pluv_flag")?)))
    }

    fn slow_sequence(&self, _deps: &Deps<'_>) -> Result<Option<SlowSequence>> {
        let p = &self.parts;
        Ok(Some(
            SlowSequence::new("pluvio", Scan::new(1, TimeUnit::Min))
                .line(sdi12_recorder(
                    p.register("Pluvio")?.name(),
                    p.terminal("Green")?,
                    &self.address,
                    "C!",
                ))
                .line(format!("{} = 0", p.var("pluv_flag")?)),
        ))
    }
}
