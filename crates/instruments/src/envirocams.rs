//! EnviroCams PTZ IP cameras on a switched 12 V supply.

use loggerforge_core::logic::condition;
use loggerforge_core::{
    Body, CatalogEntry, DataType, Deps, Descriptor, IfBlock, Instrument, InstrumentParts,
    InstrumentSettings, Result, Terminal, Variable, Wire, Wiring, call,
};

use crate::shared::POWER_DEPENDENCIES;

pub const IPATROL: Descriptor = Descriptor {
    type_id: "EnviroCams_iPatrol",
    manufacturer: "EnviroCams",
    model: "iPatrol PTZ",
    category: "IP Camera",
};

pub const SCOUT: Descriptor = Descriptor {
    type_id: "EnviroCams_Scout",
    manufacturer: "EnviroCams",
    model: "Scout PTZ",
    category: "IP Camera",
};

pub fn ipatrol_entry() -> CatalogEntry {
    CatalogEntry::new(IPATROL, |s| Ok(Box::new(IpCamera::new(IPATROL, s)?)))
        .dependencies(POWER_DEPENDENCIES)
}

pub fn scout_entry() -> CatalogEntry {
    CatalogEntry::new(SCOUT, |s| Ok(Box::new(IpCamera::new(SCOUT, s)?)))
        .dependencies(POWER_DEPENDENCIES)
}

/// Both camera models share wiring and power logic; only the descriptor
/// differs.
///
/// With `Camera_Power_Manual` set the operator's `Camera_Power` is applied
/// as is. Otherwise the camera is cycled off for an hour each night and shut
/// down whenever the battery falls below the shutoff voltage.
pub struct IpCamera {
    parts: InstrumentParts,
}

impl IpCamera {
    pub fn new(descriptor: Descriptor, settings: &InstrumentSettings) -> Result<Self> {
        let wiring = Wiring::new(vec![
            Wire::new("Black", Terminal::Ground, "#4 Black to Ground"),
            Wire::new(
                "Red",
                Terminal::Sw12(1),
                "CR1000X SW1 and #2 red to fuse block (6.2A fuse)",
            ),
        ])
        .with_note("Red from camera to #1 and white to ground (yellow cable)");

        let declarations = vec![
            Variable::public("Camera_Power").data_type(DataType::Boolean).into(),
            Variable::public("Camera_Power_Manual").data_type(DataType::Boolean).into(),
        ];

        Ok(Self {
            parts: InstrumentParts::assemble(descriptor, settings, wiring, declarations, POWER_DEPENDENCIES)?,
        })
    }
}

impl Instrument for IpCamera {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn pre_scan(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        let p = &self.parts;
        Ok(Some(format!(
            "{} = True\n{} = True",
            p.var("Camera_Power")?,
            p.var("Camera_Power_Manual")?
        )))
    }

    fn program(&self, deps: &Deps<'_>) -> Result<Option<String>> {
        let p = &self.parts;
        let power = p.var("Camera_Power")?;
        let switch = call!("SW12", p.terminal("Red")?, power);
        let battery = deps.name("battery_voltage")?;
        let shutoff = deps.name("shutoff_voltage")?;

        let nightly = IfBlock::new(
            call!("TimeIsBetween", 2, 3, 1440, "Min"),
            Body::new().line(format!("{power} = False")),
        )
        .otherwise(Body::new().line(format!("{power} = True")));
        let low_battery = IfBlock::new(
            condition([battery.as_str(), "<", shutoff.as_str()]),
            Body::new().line(format!("{power} = False")),
        );

        let block = IfBlock::new(p.var("Camera_Power_Manual")?, Body::new().line(&switch)).otherwise(
            Body::new().line(nightly).line(low_battery).line(&switch),
        );
        Ok(Some(block.to_string()))
    }
}
