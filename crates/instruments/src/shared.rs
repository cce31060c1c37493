//! Pieces several instruments share.

use loggerforge_core::call::{Arg, Call};
use loggerforge_core::{DataInterval, Dependency, Sdi12Address, Table, Terminal, TimeUnit, call};

/// The five-minute observation table most sensors write to.
pub(crate) fn five_min() -> Table {
    Table::new("FiveMin")
}

/// Two-hourly housekeeping table.
pub(crate) fn status_report() -> Table {
    Table::new("StatusReport").interval(DataInterval::new(0, 120, TimeUnit::Min, 10))
}

/// `SDI12Recorder(dest, port, "addr", "cmd", 1, 0, -1)`
pub(crate) fn sdi12_recorder(dest: &str, port: Terminal, address: &Sdi12Address, command: &str) -> Call {
    call!(
        "SDI12Recorder",
        dest,
        port,
        Arg::quoted(address.to_string()),
        Arg::quoted(command),
        1,
        0,
        -1
    )
}

/// Power-switching devices shed load when the battery runs low.
pub(crate) const POWER_DEPENDENCIES: &[Dependency] = &[
    Dependency {
        name: "battery_voltage",
        description: "Measured supply battery voltage",
    },
    Dependency {
        name: "shutoff_voltage",
        description: "Voltage below which non-essential loads are switched off",
    },
];
