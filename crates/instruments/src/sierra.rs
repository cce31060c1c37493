//! Sierra Wireless RV50X cellular modem.

use loggerforge_core::logic::condition;
use loggerforge_core::{
    Body, CatalogEntry, DataType, Deps, Descriptor, IfBlock, Instrument, InstrumentParts,
    InstrumentSettings, Result, Terminal, Variable, Wire, Wiring, call,
};

use crate::shared::POWER_DEPENDENCIES;

pub const DESCRIPTOR: Descriptor = Descriptor {
    type_id: "Sierra_RV50X",
    manufacturer: "Sierra Wireless",
    model: "RV50X",
    category: "Modem",
};

pub fn entry() -> CatalogEntry {
    CatalogEntry::new(DESCRIPTOR, |s| Ok(Box::new(Rv50x::new(s)?))).dependencies(POWER_DEPENDENCIES)
}

/// The modem is power-cycled once a night. On a low battery it only comes
/// up for a few minutes every four hours.
pub struct Rv50x {
    parts: InstrumentParts,
}

impl Rv50x {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let wiring = Wiring::new(vec![
            Wire::new("Black", Terminal::Ground, ""),
            Wire::new("Red", Terminal::Power12V, "(On CR1000X)"),
            Wire::new("White", Terminal::Sw12(2), ""),
        ]);
        let declarations = vec![Variable::public("Modem_Power").data_type(DataType::Boolean).into()];
        Ok(Self {
            parts: InstrumentParts::assemble(DESCRIPTOR, settings, wiring, declarations, POWER_DEPENDENCIES)?,
        })
    }
}

impl Instrument for Rv50x {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn pre_scan(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        Ok(Some(format!("{} = True", self.parts.var("Modem_Power")?)))
    }

    fn program(&self, deps: &Deps<'_>) -> Result<Option<String>> {
        let p = &self.parts;
        let power = p.var("Modem_Power")?;
        let battery = deps.name("battery_voltage")?;
        let shutoff = deps.name("shutoff_voltage")?;

        let on = || Body::new().line(format!("{power} = True"));
        let off = || Body::new().line(format!("{power} = False"));

        let nightly = IfBlock::new(call!("TimeIsBetween", 2, 3, 1440, "Min"), off()).otherwise(on());
        let low_battery = IfBlock::new(
            condition([battery.as_str(), "<", shutoff.as_str()]),
            Body::new().line(
                IfBlock::new(call!("TimeIsBetween", 1, 4, 240, "Min"), on()).otherwise(off()),
            ),
        );
        let lines = [
            nightly.to_string(),
            low_battery.to_string(),
            call!("SW12", p.terminal("White")?, power).to_string(),
        ];
        Ok(Some(lines.join("\n")))
    }
}
