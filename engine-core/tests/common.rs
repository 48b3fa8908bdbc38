use engine_core::prelude::*;

/// Builds a `NewOrder` for tests, mirroring the wire command's fields
/// minus framing (spec.md §3).
pub fn order(id: OrderId, side: Side, price: Price, quantity: Quantity) -> NewOrder {
    NewOrder {
        id,
        side,
        price,
        quantity,
    }
}

/// A fresh `InstrumentBook` plus the clock and recording sink tests need
/// to drive `match_order`/`cancel` and assert on the emitted event
/// sequence (spec.md §8's scenarios print nothing but a textual log, so
/// that log is what tests compare against).
pub struct Harness {
    pub book: InstrumentBook,
    pub clock: Clock,
    pub sink: RecordingSink,
}

impl Harness {
    pub fn new(symbol: &str) -> Self {
        Self {
            book: InstrumentBook::new(Symbol::from(symbol)),
            clock: Clock::new(),
            sink: RecordingSink::new(),
        }
    }

    pub fn buy(&self, id: OrderId, price: Price, quantity: Quantity) {
        self.book
            .match_order(order(id, Side::Buy, price, quantity), 0, &self.clock, &self.sink);
    }

    pub fn sell(&self, id: OrderId, price: Price, quantity: Quantity) {
        self.book
            .match_order(order(id, Side::Sell, price, quantity), 0, &self.clock, &self.sink);
    }

    pub fn cancel(&self, id: OrderId) {
        self.book.cancel(id, 0, &self.clock, &self.sink);
    }

    pub fn lines(&self) -> Vec<String> {
        self.sink.lines()
    }
}
