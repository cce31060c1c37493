//! Acclima TDR-310N soil moisture probe (SDI-12).

use loggerforge_core::{
    Body, CatalogEntry, Deps, Descriptor, IfBlock, Instrument, InstrumentParts, InstrumentSettings,
    Register, Result, Scan, Sdi12Address, SlowSequence, Table, TableItem, Terminal, TimeUnit, Wire,
    Wiring, call,
};

use crate::shared::{five_min, sdi12_recorder};

pub const DESCRIPTOR: Descriptor = Descriptor {
    type_id: "Acclima_TDR310N",
    manufacturer: "Acclima",
    model: "TDR-310N",
    category: "Soil",
};

pub fn entry() -> CatalogEntry {
    CatalogEntry::new(DESCRIPTOR, |s| Ok(Box::new(Tdr310n::new(s)?)))
        .requires_sdi12()
        .requires_elevation()
}

/// Alias name and its column prefix in the Soils table.
const ELEMENTS: [(&str, &str); 5] = [
    ("soil_vwc", "vwc"),
    ("soil_temp", "temp"),
    ("soil_perm", "perm"),
    ("soil_ec_blk", "blk"),
    ("soil_ec_por", "por"),
];

pub struct Tdr310n {
    parts: InstrumentParts,
    address: Sdi12Address,
    register: String,
}

impl Tdr310n {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let address = settings.require_sdi12(DESCRIPTOR.type_id)?.clone();
        settings.require_elevation(DESCRIPTOR.type_id)?;

        let wiring = Wiring::new(vec![
            Wire::new("Blue", Terminal::C(3), "SDI-12 data  SDI_ADD: 1-5"),
            Wire::new("Red", Terminal::Power12V, "12v Power"),
            Wire::new("White", Terminal::Ground, "Ground"),
        ]);

        // One register per bus address so several probes can share a port.
        let register = format!("soil_{address}");
        let declarations = vec![
            Register::public(register.clone(), 5)
                .alias_with_units(1, "soil_vwc", "m3 m-3")
                .alias_with_units(2, "soil_temp", "deg C")
                .alias(3, "soil_perm")
                .alias_with_units(4, "soil_ec_blk", "uS cm-1")
                .alias_with_units(5, "soil_ec_por", "uS cm-1")
                .into(),
        ];

        Ok(Self {
            parts: InstrumentParts::assemble(DESCRIPTOR, settings, wiring, declarations, &[])?,
            address,
            register,
        })
    }
}

impl Instrument for Tdr310n {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        let mut observations = five_min();
        // Soils is a per-probe archive and stays off the card.
        let mut soils = Table::new("Soils").card_out(None);

        for (alias, column) in ELEMENTS {
            let name = self.parts.var(alias)?;
            observations = observations.item(TableItem::new(call::sample(1, name, "FP2")).fields([name]));
            soils = soils.item(
                TableItem::new(call::sample(1, name, "FP2")).fields([format!("{column}_{}", self.address)]),
            );
        }
        Ok(Some(vec![observations, soils]))
    }

    fn slow_sequence(&self, _deps: &Deps<'_>) -> Result<Option<SlowSequence>> {
        let p = &self.parts;
        let register = p.register(&self.register)?;
        let vwc = p.var("soil_vwc")?;

        let measure = IfBlock::new(
            call!("IfTime", 4, 5, "Min"),
            Body::new()
                .line(sdi12_recorder(register.name(), p.terminal("Blue")?, &self.address, "M1!"))
                // The probe reports percent; tables store a fraction.
                .line(format!("{vwc} = {vwc}*0.01")),
        );
        Ok(Some(
            SlowSequence::new("soil", Scan::new(1, TimeUnit::Min)).line(measure),
        ))
    }
}
