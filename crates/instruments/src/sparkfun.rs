//! SparkFun magnetic door switch on an enclosure.

use loggerforge_core::logic::condition;
use loggerforge_core::{
    Body, CatalogEntry, DataType, Deps, Descriptor, IfBlock, Instrument, InstrumentParts,
    InstrumentSettings, Result, Table, TableItem, Terminal, Variable, Wire, Wiring, call,
};

use crate::shared::{five_min, status_report};

pub const DESCRIPTOR: Descriptor = Descriptor {
    type_id: "SparkFun_Door_Switch",
    manufacturer: "SparkFun",
    model: "Door Switch",
    category: "Door",
};

pub fn entry() -> CatalogEntry {
    CatalogEntry::new(DESCRIPTOR, |s| Ok(Box::new(DoorSwitch::new(s)?)))
}

/// Seconds a door may stand open before it is reported closed again,
/// assuming it was propped open on purpose.
const OPEN_LIMIT_SECS: u32 = 14400;

pub struct DoorSwitch {
    parts: InstrumentParts,
}

impl DoorSwitch {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let wiring = Wiring::new(vec![
            Wire::new("Red", Terminal::Power5V, "5v Power"),
            Wire::new("Black", Terminal::C(4), "Open/Closed Status"),
        ]);
        let declarations = vec![
            Variable::public("door").into(),
            Variable::public("door_timer").data_type(DataType::Long).units("sec").into(),
        ];
        Ok(Self {
            parts: InstrumentParts::assemble(DESCRIPTOR, settings, wiring, declarations, &[])?,
        })
    }
}

impl Instrument for DoorSwitch {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        let door = self.parts.var("door")?;
        let timer = self.parts.var("door_timer")?;
        Ok(Some(vec![
            five_min().item(TableItem::new(call::maximum(1, door, "FP2", false, false)).fields([door])),
            status_report()
                .item(TableItem::new(call::maximum(1, timer, "UINT4", false, false)).fields([timer])),
        ]))
    }

    fn program(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        let p = &self.parts;
        let door = p.var("door")?;
        let timer = p.var("door_timer")?;

        let stale = IfBlock::new(
            condition([timer.to_string(), ">".into(), OPEN_LIMIT_SECS.to_string()]),
            Body::new().line(format!("{door} = 0")),
        )
        .otherwise(Body::new().line(format!("{door} = 1")));

        // Closed circuit: reset the open timer. Open: run it and read it back.
        let block = IfBlock::new(
            call!("CheckPort", p.terminal("Black")?),
            Body::new()
                .line(format!("{door} = 0"))
                .line(format!("{timer} = 0"))
                .line(call!("Timer", 1, 2, 3)),
        )
        .otherwise(
            Body::new()
                .line(call!("Timer", 1, 2, 0))
                .line(format!("{timer} = {}", call!("Timer", 1, 2, 4)))
                .line(stale),
        );
        Ok(Some(block.to_string()))
    }
}
