//! Setra CS100 barometer.

use loggerforge_core::{
    CatalogEntry, Deps, Descriptor, Instrument, InstrumentParts, InstrumentSettings, Result, Table,
    TableItem, Terminal, Variable, Wire, Wiring, call,
};

use crate::shared::five_min;

pub const DESCRIPTOR: Descriptor = Descriptor {
    type_id: "Setra_CS100",
    manufacturer: "Setra",
    model: "CS100",
    category: "Barometer",
};

pub fn entry() -> CatalogEntry {
    CatalogEntry::new(DESCRIPTOR, |s| Ok(Box::new(Cs100::new(s)?)))
}

pub struct Cs100 {
    parts: InstrumentParts,
}

impl Cs100 {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let wiring = Wiring::new(vec![
            Wire::new("Blue", Terminal::Se(2), "Signal H"),
            Wire::new("Yellow", Terminal::AnalogGround, "Signal G"),
            Wire::new("Clear", Terminal::AnalogGround, "Signal G"),
            Wire::new("Red", Terminal::Power12V, "12v Power"),
            Wire::new("Black", Terminal::Ground, "Power Ground"),
            Wire::new("Green", Terminal::C(2), "Control"),
        ]);
        let declarations = vec![Variable::public("bp").units("kPa").into()];

        Ok(Self {
            parts: InstrumentParts::assemble(DESCRIPTOR, settings, wiring, declarations, &[])?,
        })
    }
}

impl Instrument for Cs100 {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        let bp = self.parts.var("bp")?;
        Ok(Some(vec![
            five_min().item(TableItem::new(call::average(1, bp, "IEEE4", false))),
        ]))
    }

    fn program(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        let p = &self.parts;
        let bp = p.var("bp")?;
        let lines = [
            // Sensor is enabled through the control port before each reading.
            call!("PortSet", p.terminal("Green")?, 1).to_string(),
            call!("VoltSE", bp, 1, "mV5000", p.terminal("Blue")?, true, 0, 60, 0.2, 600).to_string(),
            format!("{bp} = {bp}*0.1"),
        ];
        Ok(Some(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_in_order() {
        let b = Cs100::new(&InstrumentSettings::default()).unwrap();
        let program = b.program(&Deps::placeholders(b.id())).unwrap().unwrap();
        assert_eq!(
            program,
            "PortSet(C2,1)\nVoltSE(bp,1,mV5000,2,True,0,60,0.2,600)\nbp = bp*0.1"
        );
    }

    #[test]
    fn single_average_item() {
        let b = Cs100::new(&InstrumentSettings::default()).unwrap();
        let tables = b.tables(&Deps::placeholders(b.id())).unwrap().unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].items[0].to_string(), "Average(1,bp,IEEE4,False)");
    }
}
