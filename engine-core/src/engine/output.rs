use crate::prelude::*;
use std::io::{self, Write};
use std::sync::Mutex;

/// Process-wide serialization point for emitted events, grounded on the
/// teacher's `OrderBookSyncer` trait — same shape (one callback per event
/// kind), but here the callback's job is formatting and writing a line,
/// not fanning out to replicas.
///
/// `InstrumentBook` calls back into a sink after matching/cancellation
/// work is complete and `output_ts` has been sampled; the sink's own
/// lock is acquired only for the duration of writing one line, strictly
/// shorter-lived than the `InstrumentBook` mutex held by the caller.
pub trait EventSink: Send + Sync {
    fn order_added(&self, event: &Added);
    fn order_executed(&self, event: &Executed);
    fn order_deleted(&self, event: &Deleted);
    /// Best-effort debug dump of resting orders for one instrument,
    /// one wire-format line per order, no timestamps. Default is a
    /// no-op so most sinks don't need to implement it.
    fn dump_line(&self, _line: &str) {}
}

/// Writes events to stdout in the engine's protocol format, one
/// line per event, holding `lock` only across a single `write_all`.
pub struct StdoutSink {
    lock: Mutex<io::Stdout>,
}

impl StdoutSink {
    pub fn new() -> Self {
        Self {
            lock: Mutex::new(io::stdout()),
        }
    }

    fn write_line(&self, line: &str) {
        let mut out = self.lock.lock().unwrap();
        let _ = out.write_all(line.as_bytes());
        let _ = out.write_all(b"\n");
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for StdoutSink {
    fn order_added(&self, event: &Added) {
        let side = if event.is_sell_side { "S" } else { "B" };
        self.write_line(&format!(
            "{} {} {} {} {} {} {}",
            side,
            event.id,
            event.symbol,
            event.price,
            event.remaining,
            event.input_ts,
            event.output_ts
        ));
    }

    fn order_executed(&self, event: &Executed) {
        self.write_line(&format!(
            "E {} {} {} {} {} {} {}",
            event.resting_id,
            event.new_id,
            event.execution_id,
            event.price,
            event.quantity,
            event.input_ts,
            event.output_ts
        ));
    }

    fn order_deleted(&self, event: &Deleted) {
        let status = if event.accepted { "A" } else { "R" };
        self.write_line(&format!(
            "X {} {} {} {}",
            event.id, status, event.input_ts, event.output_ts
        ));
    }

    fn dump_line(&self, line: &str) {
        self.write_line(line);
    }
}

/// No-op sink, used by tests and benches that only care about the book's
/// state transitions, not the formatted output stream. Grounded on the
/// teacher's `EmptyOrderBookSyncer`.
#[derive(Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn order_added(&self, _event: &Added) {}
    fn order_executed(&self, _event: &Executed) {}
    fn order_deleted(&self, _event: &Deleted) {}
}

/// Test double that records every event it receives, in arrival order,
/// so assertions can check exact sequences.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn order_added(&self, event: &Added) {
        let side = if event.is_sell_side { "S" } else { "B" };
        self.events.lock().unwrap().push(format!(
            "{} {} {} {} {}",
            side, event.id, event.symbol, event.price, event.remaining
        ));
    }

    fn order_executed(&self, event: &Executed) {
        self.events.lock().unwrap().push(format!(
            "E {} {} {} {} {}",
            event.resting_id, event.new_id, event.execution_id, event.price, event.quantity
        ));
    }

    fn order_deleted(&self, event: &Deleted) {
        let status = if event.accepted { "A" } else { "R" };
        self.events
            .lock()
            .unwrap()
            .push(format!("X {} {}", event.id, status));
    }

    fn dump_line(&self, line: &str) {
        self.events.lock().unwrap().push(line.to_string());
    }
}
