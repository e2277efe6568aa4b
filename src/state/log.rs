//! Bounded diagnostic log.
//!
//! A fixed-capacity ring of recent diagnostic messages, newest first. The
//! bound is applied after every insert batch, so `len() <= CAPACITY` holds
//! after every operation regardless of how many messages arrive at once.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Maximum number of entries retained.
pub const LOG_CAPACITY: usize = 10;

/// A single timestamped diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Posix milliseconds at which the message was recorded.
    pub timestamp_millis: i64,

    /// The diagnostic message.
    pub message: String,
}

/// Bounded ring of recent diagnostic messages, most recent first.
///
/// Eviction policy: drop oldest beyond capacity. Entries are destroyed only
/// by eviction; there is no explicit removal operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticLog {
    entries: VecDeque<LogEntry>,
}

impl DiagnosticLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        DiagnosticLog {
            entries: VecDeque::with_capacity(LOG_CAPACITY),
        }
    }

    /// Returns the number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the log holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a batch of messages, each stamped with `timestamp_millis`.
    ///
    /// Messages are prepended in order, so the last message of the batch ends
    /// up most recent. The log is then truncated to [`LOG_CAPACITY`].
    pub fn append_entries<I, S>(&mut self, timestamp_millis: i64, messages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for message in messages {
            self.entries.push_front(LogEntry {
                timestamp_millis,
                message: message.into(),
            });
        }
        self.entries.truncate(LOG_CAPACITY);
    }

    /// Appends a single message stamped with `timestamp_millis`.
    pub fn append(&mut self, timestamp_millis: i64, message: impl Into<String>) {
        self.append_entries(timestamp_millis, [message.into()]);
    }

    /// Renders the retained messages, most recent first, one per line.
    ///
    /// Timestamps are not included in the rendered form; entry age is
    /// observable only via ordering.
    pub fn render(&self) -> String {
        let lines: Vec<&str> = self.entries.iter().map(|e| e.message.as_str()).collect();
        lines.join("\n")
    }

    /// Iterates over retained entries, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_log_is_empty() {
        let log = DiagnosticLog::new();
        assert!(log.is_empty());
        assert_eq!(log.render(), "");
    }

    #[test]
    fn append_orders_most_recent_first() {
        let mut log = DiagnosticLog::new();
        log.append(1, "first");
        log.append(2, "second");
        log.append(3, "third");

        assert_eq!(log.render(), "third\nsecond\nfirst");
    }

    #[test]
    fn batch_append_keeps_batch_order() {
        let mut log = DiagnosticLog::new();
        log.append_entries(5, ["a", "b", "c"]);

        // The last message of the batch is the most recent.
        assert_eq!(log.render(), "c\nb\na");
    }

    #[test]
    fn truncates_to_capacity() {
        let mut log = DiagnosticLog::new();
        for i in 0..25 {
            log.append(i, format!("message {i}"));
        }

        assert_eq!(log.len(), LOG_CAPACITY);
        // The most recent message survives; the oldest are evicted.
        assert_eq!(log.iter().next().unwrap().message, "message 24");
        assert_eq!(log.iter().last().unwrap().message, "message 15");
    }

    #[test]
    fn oversized_batch_truncates_after_insert() {
        let mut log = DiagnosticLog::new();
        let messages: Vec<String> = (0..30).map(|i| format!("m{i}")).collect();
        log.append_entries(1, messages);

        assert_eq!(log.len(), LOG_CAPACITY);
        // Newest-first: the last message of the batch leads.
        assert_eq!(log.iter().next().unwrap().message, "m29");
    }

    #[test]
    fn entries_carry_timestamps() {
        let mut log = DiagnosticLog::new();
        log.append(123, "stamped");
        assert_eq!(log.iter().next().unwrap().timestamp_millis, 123);
    }

    proptest! {
        /// The capacity bound holds after every append, for any batch sizes.
        #[test]
        fn prop_len_bounded(batches in prop::collection::vec(
            prop::collection::vec(".*", 0..15),
            0..10,
        )) {
            let mut log = DiagnosticLog::new();
            for (i, batch) in batches.into_iter().enumerate() {
                log.append_entries(i as i64, batch);
                prop_assert!(log.len() <= LOG_CAPACITY);
            }
        }

        /// Single appends read back in strict most-recent-first order.
        #[test]
        fn prop_order_most_recent_first(count in 1usize..30) {
            let mut log = DiagnosticLog::new();
            for i in 0..count {
                log.append(i as i64, format!("m{i}"));
            }

            let expected: Vec<String> = (0..count)
                .rev()
                .take(LOG_CAPACITY)
                .map(|i| format!("m{i}"))
                .collect();
            prop_assert_eq!(log.render(), expected.join("\n"));
        }
    }
}
