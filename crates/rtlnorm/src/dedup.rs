//! Duplicate suppression

#[cfg(not(test))]
use log::trace;

#[cfg(test)]
use std::println as trace;

use crate::record::OutputRecord;

/// Drops a record identical to the one before it
///
/// Many sensors repeat each transmission several times in quick
/// succession. Records are compared in full, including
/// `dateTime`, so repeats a second apart are kept.
#[derive(Clone, Debug, Default)]
pub struct DuplicateSuppressor {
    last: Option<OutputRecord>,
}

impl DuplicateSuppressor {
    /// New suppressor, with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `rec` unless it repeats the last admitted record
    pub fn admit(&mut self, rec: OutputRecord) -> Option<OutputRecord> {
        if self.last.as_ref() == Some(&rec) {
            trace!("dedup: dropping duplicate {}", rec);
            return None;
        }
        self.last = Some(rec.clone());
        Some(rec)
    }

    /// Last admitted record
    pub fn last(&self) -> Option<&OutputRecord> {
        self.last.as_ref()
    }

    /// Forget the last record
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::record::UnitSystem;

    fn record(date_time: i64, temp: f64) -> OutputRecord {
        let mut rec = OutputRecord::new(date_time, UnitSystem::Metric);
        rec.fields.insert("outTemp".to_owned(), temp.into());
        rec
    }

    #[test]
    fn test_admit() {
        let mut dedup = DuplicateSuppressor::new();
        assert!(dedup.admit(record(100, 10.0)).is_some());
        assert!(dedup.admit(record(100, 10.0)).is_none());
        assert!(dedup.admit(record(101, 10.0)).is_some());
        assert!(dedup.admit(record(101, 10.5)).is_some());
        assert!(dedup.admit(record(100, 10.0)).is_some());
        assert_eq!(dedup.last(), Some(&record(100, 10.0)));

        dedup.reset();
        assert!(dedup.admit(record(100, 10.0)).is_some());
    }
}
