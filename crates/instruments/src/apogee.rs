//! Apogee SP-510 thermopile pyranometer.

use loggerforge_core::logic::condition;
use loggerforge_core::{
    Body, CatalogEntry, Deps, Descriptor, IfBlock, Instrument, InstrumentParts, InstrumentSettings,
    Result, Table, TableItem, Terminal, Variable, Wire, Wiring, call,
};

use crate::shared::{five_min, status_report};

pub const DESCRIPTOR: Descriptor = Descriptor {
    type_id: "Apogee_SP510",
    manufacturer: "Apogee",
    model: "SP-510 SS",
    category: "Pyranometer",
};

pub fn entry() -> CatalogEntry {
    CatalogEntry::new(DESCRIPTOR, |s| Ok(Box::new(Sp510::new(s)?))).requires_param("pyran_calib")
}

pub struct Sp510 {
    parts: InstrumentParts,
    /// Sensor-specific multiplier in W m-2 per mV.
    calibration: f64,
}

impl Sp510 {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let calibration = settings.param_f64(DESCRIPTOR.type_id, "pyran_calib", None)?;
        let wiring = Wiring::new(vec![
            Wire::new("White", Terminal::DiffHigh(2), "Signal Positive"),
            Wire::new("Black", Terminal::DiffLow(2), "Signal Negative"),
            Wire::new("Clear", Terminal::AnalogGround, "Shield Ground"),
            Wire::new("Yellow", Terminal::Power12V, "Fuse block 0.5A fuse heater"),
            Wire::new("Blue", Terminal::Ground, "Power ground for heater"),
        ]);
        let declarations = vec![
            Variable::public("sol_rad").units("W m-2").into(),
            Variable::public("sol_min").units("W m-2").into(),
            Variable::public("pyran_calib").into(),
        ];
        Ok(Self {
            parts: InstrumentParts::assemble(DESCRIPTOR, settings, wiring, declarations, &[])?,
            calibration,
        })
    }
}

impl Instrument for Sp510 {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        let rad = self.parts.var("sol_rad")?;
        let min = self.parts.var("sol_min")?;
        Ok(Some(vec![
            five_min().item(TableItem::new(call::average(1, rad, "FP2", false)).fields([rad])),
            status_report().item(TableItem::new(call::minimum(1, min, "FP2", false, false)).fields([min])),
        ]))
    }

    fn pre_scan(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        Ok(Some(format!("{} = {}", self.parts.var("pyran_calib")?, self.calibration)))
    }

    fn program(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        let p = &self.parts;
        let rad = p.var("sol_rad")?;
        let calib = p.var("pyran_calib")?;

        // Night-time offsets read slightly negative; keep them for QC only.
        let clamp = IfBlock::new(
            condition([rad, "<", "0"]),
            Body::new()
                .line(format!("{} = {rad}", p.var("sol_min")?))
                .line(format!("{rad} = 0")),
        );
        let lines = [
            call!("VoltDiff", rad, 1, "mV200", p.terminal("White")?, true, 0, 60, calib, 0).to_string(),
            clamp.to_string(),
        ];
        Ok(Some(lines.join("\n")))
    }
}
