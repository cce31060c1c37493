//! Table Model: data tables and their output items.

use std::fmt;

use crate::sequence::TimeUnit;

/// `DataInterval(offset, interval, unit, lapses)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataInterval {
    pub offset: u32,
    pub interval: u32,
    pub unit: TimeUnit,
    pub lapses: u32,
}

impl DataInterval {
    pub fn new(offset: u32, interval: u32, unit: TimeUnit, lapses: u32) -> Self {
        Self {
            offset,
            interval,
            unit,
            lapses,
        }
    }
}

impl Default for DataInterval {
    fn default() -> Self {
        Self::new(0, 5, TimeUnit::Min, 10)
    }
}

impl fmt::Display for DataInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DataInterval({},{},{},{})",
            self.offset, self.interval, self.unit, self.lapses
        )
    }
}

/// `CardOut(stop_ring, size)`. `stop_ring` 0 is a ring buffer, 1 stops
/// when full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardOut {
    pub stop_ring: u8,
    pub size: i64,
}

impl Default for CardOut {
    fn default() -> Self {
        Self {
            stop_ring: 0,
            size: -1,
        }
    }
}

impl fmt::Display for CardOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CardOut({},{})", self.stop_ring, self.size)
    }
}

/// Everything about a table except its items. Two same-named tables must
/// agree on all of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSettings {
    pub trigger: String,
    pub size: i64,
    pub interval: DataInterval,
    /// `None` keeps the table off the memory card.
    pub card_out: Option<CardOut>,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            trigger: "True".into(),
            size: -1,
            interval: DataInterval::default(),
            card_out: Some(CardOut::default()),
        }
    }
}

impl TableSettings {
    /// Human-readable list of the attributes that differ, or `None`.
    pub fn difference(&self, other: &TableSettings) -> Option<String> {
        let mut diffs = Vec::new();
        if self.trigger != other.trigger {
            diffs.push(format!("trigger {} vs {}", self.trigger, other.trigger));
        }
        if self.size != other.size {
            diffs.push(format!("size {} vs {}", self.size, other.size));
        }
        if self.interval != other.interval {
            diffs.push(format!("{} vs {}", self.interval, other.interval));
        }
        if self.card_out != other.card_out {
            let show = |c: &Option<CardOut>| c.map_or("no CardOut".to_string(), |c| c.to_string());
            diffs.push(format!("{} vs {}", show(&self.card_out), show(&other.card_out)));
        }
        (!diffs.is_empty()).then(|| diffs.join(", "))
    }
}

/// One output instruction, optionally labelling its columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableItem {
    pub call: String,
    pub field_names: Vec<String>,
}

impl TableItem {
    pub fn new(call: impl ToString) -> Self {
        Self {
            call: call.to_string(),
            field_names: Vec::new(),
        }
    }

    pub fn fields<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.field_names = names.into_iter().map(|n| n.to_string()).collect();
        self
    }
}

impl fmt::Display for TableItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field_names.is_empty() {
            f.write_str(&self.call)
        } else {
            write!(f, "{}:FieldNames(\"{}\")", self.call, self.field_names.join(","))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub settings: TableSettings,
    pub items: Vec<TableItem>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: TableSettings::default(),
            items: Vec::new(),
        }
    }

    pub fn item(mut self, item: TableItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn interval(mut self, interval: DataInterval) -> Self {
        self.settings.interval = interval;
        self
    }

    pub fn card_out(mut self, card_out: Option<CardOut>) -> Self {
        self.settings.card_out = card_out;
        self
    }

    pub fn trigger(mut self, trigger: impl Into<String>) -> Self {
        self.settings.trigger = trigger.into();
        self
    }

    pub fn size(mut self, size: i64) -> Self {
        self.settings.size = size;
        self
    }

    /// `CallTable <name>`, emitted inside the main scan.
    pub fn trigger_statement(&self) -> String {
        format!("CallTable {}", self.name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.settings;
        writeln!(f, "DataTable({},{},{})", self.name, s.trigger, s.size)?;
        writeln!(f, "    {}", s.interval)?;
        if let Some(card) = &s.card_out {
            writeln!(f, "    {card}")?;
        }
        writeln!(f)?;
        for item in &self.items {
            writeln!(f, "    {item}")?;
        }
        f.write_str("EndTable")
    }
}
