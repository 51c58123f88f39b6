use std::collections::BTreeMap;
use std::fmt::Debug;
use std::ops::Range;

use crate::error::{DisasmError, Result};

/// Ordered map from disjoint half-open ranges to values.
///
/// Setting a range always wins on that exact range: overlapped entries are
/// clipped, split around it, or dropped when fully covered.
#[derive(Debug, Clone)]
pub struct IntervalMap<K, V> {
    // start -> (end, value)
    entries: BTreeMap<K, (K, V)>,
}

impl<K, V> Default for IntervalMap<K, V>
where
    K: Ord + Copy,
{
    fn default() -> Self {
        IntervalMap {
            entries: BTreeMap::new(),
        }
    }
}

impl<K, V> IntervalMap<K, V>
where
    K: Ord + Copy + Debug,
    V: Clone,
{
    pub fn new() -> Self {
        IntervalMap {
            entries: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert `value` over `range`. Empty ranges are ignored.
    pub fn set(&mut self, range: Range<K>, value: V) {
        if range.start >= range.end {
            return;
        }
        self.remove_range(range.clone());
        self.entries.insert(range.start, (range.end, value));
    }

    /// Clear `range`, clipping or dropping whatever overlaps it
    pub fn remove_range(&mut self, range: Range<K>) {
        if range.start >= range.end {
            return;
        }
        let overlapped: Vec<K> = self.overlapping_starts(&range);
        for start in overlapped {
            let (end, value) = match self.entries.remove(&start) {
                Some(entry) => entry,
                None => continue,
            };
            if start < range.start {
                self.entries.insert(start, (range.start, value.clone()));
            }
            if end > range.end {
                self.entries.insert(range.end, (end, value));
            }
        }
    }

    /// Value whose range contains `point`
    pub fn lookup(&self, point: K) -> Option<&V> {
        self.entry_at(point).map(|(_, value)| value)
    }

    /// Like `lookup`, but a miss is an error
    pub fn get(&self, point: K) -> Result<&V> {
        self.lookup(point)
            .ok_or_else(|| DisasmError::NotFound(format!("no interval contains {:?}", point)))
    }

    /// Range and value of the entry containing `point`
    pub fn entry_at(&self, point: K) -> Option<(Range<K>, &V)> {
        let (start, (end, value)) = self.entries.range(..=point).next_back()?;
        if point < *end {
            Some((*start..*end, value))
        } else {
            None
        }
    }

    /// All entries in ascending start order
    pub fn items(&self) -> impl Iterator<Item = (Range<K>, &V)> + '_ {
        self.entries
            .iter()
            .map(|(start, (end, value))| (*start..*end, value))
    }

    /// Entries intersecting `range`, ascending
    pub fn overlapping(&self, range: Range<K>) -> impl Iterator<Item = (Range<K>, &V)> + '_ {
        let starts = self.overlapping_starts(&range);
        starts.into_iter().filter_map(move |start| {
            self.entries
                .get(&start)
                .map(|(end, value)| (start..*end, value))
        })
    }

    fn overlapping_starts(&self, range: &Range<K>) -> Vec<K> {
        if range.start >= range.end {
            return Vec::new();
        }
        let mut starts: Vec<K> = self
            .entries
            .range(..range.end)
            .rev()
            .take_while(|(_, (end, _))| *end > range.start)
            .map(|(start, _)| *start)
            .collect();
        starts.reverse();
        starts
    }
}
