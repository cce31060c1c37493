//! Morningstar ProStar charge controller read through an EMC-1 Modbus
//! gateway.

use loggerforge_core::call::Arg;
use loggerforge_core::logic::condition;
use loggerforge_core::{
    Body, CatalogEntry, DataType, Deps, Descriptor, ForLoop, IfBlock, Instrument, InstrumentParts,
    InstrumentSettings, Register, Result, Scan, SlowSequence, Table, TableItem, TimeUnit, Variable,
    Wiring, call,
};

use crate::shared::five_min;

pub const DESCRIPTOR: Descriptor = Descriptor {
    type_id: "ProStar_EMC1",
    manufacturer: "Morningstar",
    model: "ProStar EMC-1",
    category: "Charge Data",
};

pub fn entry() -> CatalogEntry {
    CatalogEntry::new(DESCRIPTOR, |s| Ok(Box::new(ProStar::new(s)?)))
}

const REGISTER: &str = "ChgCntDat";
const REGISTER_LEN: u32 = 82;
const DEFAULT_HOST: &str = "192.168.1.253";
const DEFAULT_SHUTOFF: f64 = 22.0;

/// Controller registers logged to the ChargeData table.
const CHARGE_REGISTERS: [(u32, &str); 18] = [
    (17, "charge_current"),
    (18, "array_current"),
    (19, "battery_terminal_voltage"),
    (21, "load_voltage"),
    (22, "net_battery_current"),
    (23, "load_current"),
    (27, "heatsink_temp"),
    (28, "battery_temp"),
    (29, "ambient_temp"),
    (34, "charge_state"),
    (41, "total_ah_charge_hi"),
    (42, "total_ah_charge_lo"),
    (47, "load_state"),
    (53, "total_ah_load_hi"),
    (54, "total_ah_load_lo"),
    (74, "daily_absorption_time"),
    (75, "daily_equalization_time"),
    (76, "daily_float_time"),
];

/// Unpacks the controller's half-precision register format.
const SCALE_TO_F16: &str = r#"Function ScaleToF16(value)
    Dim out
    Dim exponent
    out = value
    out = out AND HexToDec("3ff")
    out = out / 1024.0
    out = out + 1
    value = value >> 10

    exponent = value AND HexToDec("1f")
    exponent = exponent - 15
    out = out * PWR(2, exponent)

    Return out
EndFunction"#;

pub struct ProStar {
    parts: InstrumentParts,
    host: String,
    shutoff: f64,
}

impl ProStar {
    pub fn new(settings: &InstrumentSettings) -> Result<Self> {
        let type_id = DESCRIPTOR.type_id;
        let host = settings.param_str(type_id, "modbus_host", Some(DEFAULT_HOST))?;
        let shutoff = settings.param_f64(type_id, "shutoff_voltage", Some(DEFAULT_SHUTOFF))?;

        let register = CHARGE_REGISTERS.iter().fold(
            Register::dim(REGISTER, REGISTER_LEN).data_type(DataType::Long),
            |r, (index, name)| r.alias(*index, *name),
        );
        let declarations = vec![
            Variable::public("ModbusSocket").data_type(DataType::Long).into(),
            Variable::public("ModbusResult").into(),
            register.into(),
            Variable::dim("i").into(),
            Variable::public("batt_volt").units("v").into(),
            Variable::public("shutoff_voltage").units("v").into(),
        ];

        Ok(Self {
            parts: InstrumentParts::assemble(DESCRIPTOR, settings, Wiring::default(), declarations, &[])?,
            host,
            shutoff,
        })
    }
}

impl Instrument for ProStar {
    fn parts(&self) -> &InstrumentParts {
        &self.parts
    }

    fn tables(&self, _deps: &Deps<'_>) -> Result<Option<Vec<Table>>> {
        let batt = self.parts.var("batt_volt")?;
        let observations = five_min()
            .item(TableItem::new(call::sample(1, batt, "FP2")))
            .item(TableItem::new(call::minimum(1, batt, "FP2", false, false)));

        let mut charge = Table::new("ChargeData");
        for (_, name) in CHARGE_REGISTERS {
            charge = charge.item(TableItem::new(call::sample(1, self.parts.var(name)?, "Long")));
        }
        Ok(Some(vec![observations, charge]))
    }

    fn pre_scan(&self, _deps: &Deps<'_>) -> Result<Option<String>> {
        Ok(Some(format!(
            "{} = {}",
            self.parts.var("shutoff_voltage")?,
            self.shutoff
        )))
    }

    fn functions(&self, _deps: &Deps<'_>) -> Result<Option<Vec<String>>> {
        Ok(Some(vec![SCALE_TO_F16.to_string()]))
    }

    fn slow_sequence(&self, _deps: &Deps<'_>) -> Result<Option<SlowSequence>> {
        let p = &self.parts;
        let socket = p.var("ModbusSocket")?;
        let register = p.register(REGISTER)?;
        let i = p.var("i")?;

        // A closed socket means stale data; blank the whole register.
        let blank = IfBlock::new(
            condition([socket, "=", "0"]),
            Body::new().line(ForLoop::new(
                i,
                1,
                REGISTER_LEN,
                Body::new().line(format!("{} = NAN", register.element(i))),
            )),
        );

        let sequence = SlowSequence::new("Charge", Scan::new(1, TimeUnit::Min))
            .line(format!(
                "{socket} = {}",
                call!("TCPOpen", Arg::quoted(&self.host), 502, 1)
            ))
            .line(call!(
                "ModbusClient",
                p.var("ModbusResult")?,
                socket,
                9600,
                1,
                3,
                format!("{}()", register.name()),
                1,
                REGISTER_LEN,
                3,
                1500,
                3
            ))
            .line(format!(
                "{} = ScaleToF16({})",
                p.var("batt_volt")?,
                register.element(25)
            ))
            .line(blank);
        Ok(Some(sequence))
    }
}
