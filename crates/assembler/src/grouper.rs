//! Slow-Sequence Grouper.

use std::collections::HashMap;

use loggerforge_core::SlowSequence;
use tracing::{debug, warn};

/// Group sequences contributed as `(instrument id, sequence)` pairs by id.
///
/// The first occurrence of an id fixes its cadence; later bodies are
/// appended to it. A later occurrence that asks for a different cadence is
/// still merged, but logged.
pub fn group_sequences<'a, I>(contributions: I) -> Vec<SlowSequence>
where
    I: IntoIterator<Item = (&'a str, SlowSequence)>,
{
    let mut grouped: Vec<SlowSequence> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (owner, sequence) in contributions {
        match seen.get(&sequence.id) {
            None => {
                debug!(sequence = %sequence.id, instrument = owner, "Slow sequence started");
                seen.insert(sequence.id.clone(), grouped.len());
                grouped.push(sequence);
            }
            Some(&index) => {
                let first = &mut grouped[index];
                if first.scan != sequence.scan {
                    warn!(
                        sequence = %first.id,
                        instrument = owner,
                        kept = %first.scan,
                        ignored = %sequence.scan,
                        "Slow sequence cadence differs from its first occurrence; keeping the first"
                    );
                }
                debug!(sequence = %first.id, instrument = owner, "Slow sequence body appended");
                first.absorb(sequence);
            }
        }
    }

    grouped
}
