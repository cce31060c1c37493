//! Table Merger.
//!
//! Same-named tables from different instruments become one table. Their
//! settings must match exactly; items are concatenated in program order.

use std::collections::HashMap;

use loggerforge_core::{Error, Result, Table};
use tracing::debug;

/// Merge tables contributed as `(instrument id, tables)` pairs, in program
/// order. Tables come out in first-seen order.
pub fn merge_tables<'a, I>(contributions: I) -> Result<Vec<Table>>
where
    I: IntoIterator<Item = (&'a str, Vec<Table>)>,
{
    let mut merged: Vec<(Table, &'a str)> = Vec::new();
    // Table names are matched without case, like every other identifier in
    // the target dialect.
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (owner, tables) in contributions {
        for table in tables {
            let key = table.name.to_ascii_lowercase();
            match seen.get(&key) {
                None => {
                    debug!(table = %table.name, instrument = owner, "Table seeded");
                    seen.insert(key, merged.len());
                    merged.push((table, owner));
                }
                Some(&index) => {
                    let (seed, first) = &mut merged[index];
                    if let Some(detail) = seed.settings.difference(&table.settings) {
                        return Err(Error::TableConflict {
                            table: seed.name.clone(),
                            first: first.to_string(),
                            second: owner.to_string(),
                            detail,
                        });
                    }
                    debug!(table = %seed.name, instrument = owner, items = table.items.len(), "Table items appended");
                    seed.items.extend(table.items);
                }
            }
        }
    }

    Ok(merged.into_iter().map(|(table, _)| table).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use loggerforge_core::{DataInterval, TableItem, TimeUnit};

    fn five_min(items: &[&str]) -> Table {
        items
            .iter()
            .fold(Table::new("FiveMin"), |t, i| t.item(TableItem::new(*i)))
    }

    #[test]
    fn items_concatenate_in_program_order() {
        let merged = merge_tables([
            ("a", vec![five_min(&["A1", "A2"])]),
            ("b", vec![five_min(&["B1"]), Table::new("Soils")]),
            ("c", vec![five_min(&["C1"])]),
        ])
        .unwrap();

        assert_eq!(merged.len(), 2);
        let calls: Vec<_> = merged[0].items.iter().map(|i| i.call.as_str()).collect();
        assert_eq!(calls, ["A1", "A2", "B1", "C1"]);
        assert_eq!(merged[1].name, "Soils");
    }

    #[test]
    fn interval_mismatch_conflicts() {
        let ten = five_min(&["B1"]).interval(DataInterval::new(0, 10, TimeUnit::Min, 10));
        let err = merge_tables([("a", vec![five_min(&["A1"])]), ("b", vec![ten])]).unwrap_err();
        match err {
            Error::TableConflict { table, first, second, detail } => {
                assert_eq!(table, "FiveMin");
                assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
                assert!(detail.contains("DataInterval(0,5,Min,10) vs DataInterval(0,10,Min,10)"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn card_out_policy_must_match() {
        let off_card = five_min(&["B1"]).card_out(None);
        assert!(merge_tables([("a", vec![five_min(&[])]), ("b", vec![off_card])]).is_err());
    }

    #[test]
    fn names_match_without_case() {
        let lower = Table::new("fivemin").item(TableItem::new("B1"));
        let merged = merge_tables([("a", vec![five_min(&["A1"])]), ("b", vec![lower])]).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "FiveMin");
        assert_eq!(merged[0].items.len(), 2);
    }
}
