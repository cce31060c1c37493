//! Vaisala HMP155 humidity/temperature probe on RS-485.

use loggerforge_core::call::Arg;
use loggerforge_core::{
    Body, CatalogEntry, DataType, Deps, Descriptor, IfBlock, Instrument, InstrumentParts,
    InstrumentSettings, Register, Result, Table, TableItem, Terminal, Variable, Wire, Wiring, call,
};

use crate::shared::five_min;

pub const DESCRIPTOR: Descriptor = Descriptor {
    type_id: "Vaisala_HMP155",
    manufacturer: "Vaisala",
    model: "HMP-155 (RS-485)",
    category: "RH/T",
};

pub fn entry() -> CatalogEntry {
    CatalogEntry::new(DESCRIPTOR, |s| Ok(Box::new(Hmp155::new(s)?)))
}

pub struct Hmp155 {
    parts: InstrumentParts,
}

impl Hmp155 {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let wiring = Wiring::new(vec![
            Wire::new("Brown", Terminal::ComC(7), "RS485 B"),
            Wire::new("Pink", Terminal::C(8), "RS485 A"),
            Wire::new("Red", Terminal::Rg(2), ""),
            Wire::new("Blue", Terminal::Power12V, "12V Power"),
            Wire::new("Black/Clear", Terminal::AnalogGround, ""),
        ]);

        let declarations = vec![
            Register::public("rhtemp", 2)
                .data_type(DataType::Float)
                .alias_with_units(1, "rh", "%")
                .alias_with_units(2, "air_temp", "deg C")
                .into(),
            Variable::public("reset_hmp155").data_type(DataType::Boolean).into(),
            Variable::dim("NBytesReturned").data_type(DataType::Long).into(),
            Variable::dim("SerialIngest").data_type(DataType::String(Some(26))).into(),
            Variable::dim("String_1").data_type(DataType::String(None)).into(),
            Variable::dim("String_2").data_type(DataType::String(None)).into(),
            Variable::constant("CRLF", "CHR(13)+CHR(10)").into(),
            Variable::field("air_temp_max").into(),
            Variable::field("air_temp_min").into(),
        ];

        Ok(Self {
            parts: InstrumentParts::assemble(DESCRIPTOR, settings, wiring, declarations, &[])?,
        })
    }
}

impl Instrument for Hmp155 {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        let p = &self.parts;
        let air = p.var("air_temp")?;
        let rh = p.var("rh")?;
        Ok(Some(vec![
            five_min()
                .item(TableItem::new(call::average(1, air, "FP2", false)).fields([air]))
                .item(
                    TableItem::new(call::maximum(1, air, "FP2", false, true))
                        .fields([p.var("air_temp_max")?]),
                )
                .item(
                    TableItem::new(call::minimum(1, air, "FP2", false, true))
                        .fields([p.var("air_temp_min")?]),
                )
                .item(TableItem::new(call::average(1, rh, "FP2", false)).fields([rh])),
        ]))
    }

    fn pre_scan(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        Ok(Some(format!("{} = True", self.parts.var("reset_hmp155")?)))
    }

    fn program(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        let p = &self.parts;
        let port = p.terminal("Brown")?;
        let reset = p.var("reset_hmp155")?;
        let s1 = p.var("String_1")?;
        let s2 = p.var("String_2")?;
        let crlf = p.var("CRLF")?;
        let ingest = p.var("SerialIngest")?;

        // Put the probe into run mode once after power-up.
        let wake = IfBlock::new(
            reset,
            Body::new()
                .line(call!("SerialOpen", port, 4800, 10, 0, 53, 4))
                .line(format!("{s1} = \"SMODE RUN\"+{crlf}"))
                .line(format!("{s2} = \"R\"+{crlf}"))
                .line(call!("SerialOut", port, s1, Arg::quoted("RUN"), 3, 100))
                .line(call!("Delay", 0, 500, "mSec"))
                .line(call!("SerialOut", port, s2, Arg::quoted("RH"), 3, 100))
                .line(format!("{reset} = False")),
        );

        let lines = [
            wake.to_string(),
            call!(
                "SerialInRecord",
                port,
                ingest,
                "00",
                25,
                "&H0D0A",
                p.var("NBytesReturned")?,
                "01"
            )
            .to_string(),
            call!("SplitStr", p.var("rh")?, ingest, Arg::quoted("="), 2, 0).to_string(),
            call!("SerialFlush", port).to_string(),
        ];
        Ok(Some(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_register_with_aliases() {
        let h = Hmp155::new(&InstrumentSettings::default()).unwrap();
        let decls = h.variables().declarations();
        assert_eq!(decls[0], "Public rhtemp(2) As Float");
        assert_eq!(decls[1], "Alias rhtemp(1) = rh : Units rh = %");
        assert!(decls.contains(&"Dim SerialIngest As String * 26".to_string()));
        assert!(!decls.iter().any(|d| d.contains("air_temp_max")));
    }

    #[test]
    fn serial_program_uses_com_port() {
        let h = Hmp155::new(&InstrumentSettings::default()).unwrap();
        let program = h.program(&Deps::placeholders(h.id())).unwrap().unwrap();
        assert!(program.starts_with("If reset_hmp155 Then\n    SerialOpen(ComC7,4800,10,0,53,4)"));
        assert!(program.contains("SerialOut(ComC7,String_1,\"RUN\",3,100)"));
        assert!(program.ends_with("SerialFlush(ComC7)"));
    }

    #[test]
    fn elevation_suffix_renames_aliases() {
        let settings = InstrumentSettings {
            elevation: Some(200),
            name_inclusion: loggerforge_core::NameInclusion::Elevation,
            ..Default::default()
        };
        let h = Hmp155::new(&settings).unwrap();
        let tables = h.tables(&Deps::placeholders(h.id())).unwrap().unwrap();
        assert_eq!(
            tables[0].items[0].to_string(),
            "Average(1,air_temp_200,FP2,False):FieldNames(\"air_temp_200\")"
        );
        assert_eq!(h.parts().register("rhtemp").unwrap().name(), "rhtemp");
    }
}
