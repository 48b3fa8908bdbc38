use crate::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Process-wide registry of instruments and the id-to-symbol routing
/// table that lets a `Cancel` command find the book its target order
/// rests on without scanning every instrument.
///
/// Both maps are guarded by one short-lived mutex — lookup and
/// insert only, never held across a `match`/`cancel` call on the
/// `InstrumentBook` it returns. This is the outermost of the engine's
/// lock tiers: acquired, used briefly, and released before the
/// (much longer) `InstrumentBook` critical section begins.
pub struct GlobalBook {
    inner: Mutex<Inner>,
}

struct Inner {
    instruments: HashMap<Symbol, Arc<InstrumentBook>>,
    id_to_symbol: HashMap<OrderId, Symbol>,
}

impl GlobalBook {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                instruments: HashMap::new(),
                id_to_symbol: HashMap::new(),
            }),
        }
    }

    /// Records `order_id → symbol` and fetches-or-creates the
    /// `InstrumentBook` for `symbol`, in that order: this is the only
    /// moment we're sure which book the id will belong to. If the order
    /// never rests the entry is stale but harmless, since `cancel`
    /// treats a missing-in-`by_id` id as rejection regardless of what
    /// `id_to_symbol` still says.
    pub fn resolve_for_trade(&self, order_id: OrderId, symbol: Symbol) -> Arc<InstrumentBook> {
        let mut inner = self.inner.lock().unwrap();
        inner.id_to_symbol.insert(order_id, symbol);
        inner
            .instruments
            .entry(symbol)
            .or_insert_with(|| Arc::new(InstrumentBook::new(symbol)))
            .clone()
    }

    /// Removes `order_id` from the routing table unconditionally — found
    /// or not, the id is now considered consumed, so a second cancel of
    /// the same id is always rejected. Returns the owning
    /// `InstrumentBook` if the id was known.
    pub fn resolve_for_cancel(&self, order_id: OrderId) -> Option<Arc<InstrumentBook>> {
        let mut inner = self.inner.lock().unwrap();
        let symbol = inner.id_to_symbol.remove(&order_id)?;
        Some(
            inner
                .instruments
                .get(&symbol)
                .expect("instrument present once any id has resolved into it")
                .clone(),
        )
    }

    /// Best-effort debug dump of every instrument's resting orders, used
    /// only by the `Print` command. Iterates a snapshot of the
    /// instrument map; never holds `self.inner`'s lock while calling
    /// into an `InstrumentBook`.
    pub fn debug_dump(&self, sink: &dyn EventSink) {
        let books: Vec<Arc<InstrumentBook>> = {
            let inner = self.inner.lock().unwrap();
            inner.instruments.values().cloned().collect()
        };
        for book in books {
            book.debug_dump(sink);
        }
    }
}

impl Default for GlobalBook {
    fn default() -> Self {
        Self::new()
    }
}
