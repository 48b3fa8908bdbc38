use crate::prelude::*;
use std::collections::HashMap;
use std::sync::Mutex;

/// One resting order plus its intrusive neighbours within one side of one
/// `InstrumentBook`. The arena is keyed by `OrderId`: the id is already a
/// stable, unique handle, so `by_id` plays the role of both the node
/// arena and the by-id index.
#[derive(Debug, Clone)]
pub(crate) struct RestingOrder {
    pub node: OrderNode,
}

/// The matching unit for one instrument symbol: two price-sorted lists of
/// resting orders (bids descending, asks ascending), a by-id arena over
/// both, and the mutex that serializes every `match_order`/`cancel` call
/// against it.
///
/// Only one thread is ever inside an `InstrumentBook`'s critical section
/// at a time, so the book is represented as a plain arena of handles
/// behind a single exclusive mutex rather than a lock-free structure —
/// there is no concurrent-access problem here to buy a lock-free design
/// its way out of.
pub struct InstrumentBook {
    symbol: Symbol,
    inner: Mutex<BookState>,
}

struct BookState {
    bid_head: Option<OrderId>,
    ask_head: Option<OrderId>,
    by_id: HashMap<OrderId, RestingOrder>,
}

impl InstrumentBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            inner: Mutex::new(BookState {
                bid_head: None,
                ask_head: None,
                by_id: HashMap::new(),
            }),
        }
    }

    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// Matches `new_order` against the opposite side, walking price/time
    /// priority, then inserts any unfilled remainder on its own side.
    /// Emits zero or more `Executed` events, at most one `Added` event,
    /// through `sink`. `clock` supplies `output_ts`, sampled once per
    /// emitted event, immediately before that event is handed to the
    /// sink.
    pub fn match_order(
        &self,
        mut new_order: NewOrder,
        input_ts: u64,
        clock: &Clock,
        sink: &dyn EventSink,
    ) {
        let mut state = self.inner.lock().unwrap();

        let mut cur = match new_order.side {
            Side::Buy => state.ask_head,
            Side::Sell => state.bid_head,
        };

        while let Some(resting_id) = cur {
            if new_order.quantity == 0 {
                break;
            }
            // A zero-sized resting order must never be observed; the walk
            // terminates defensively rather than matching against it.
            let resting_price = {
                let resting = state.by_id.get(&resting_id).expect("arena entry for linked id");
                if resting.node.remaining == 0 {
                    break;
                }
                resting.node.price
            };
            let matches = match new_order.side {
                Side::Buy => new_order.price >= resting_price,
                Side::Sell => resting_price >= new_order.price,
            };
            if !matches {
                break;
            }

            let next = state.by_id.get(&resting_id).unwrap().node.next;
            let (fill, resting_fully_consumed, execution_id);
            {
                let resting = &mut state.by_id.get_mut(&resting_id).unwrap().node;
                resting.executed_count += 1;
                execution_id = resting.executed_count;
                fill = resting.remaining.min(new_order.quantity);
                if resting.remaining > new_order.quantity {
                    resting.remaining -= fill;
                    resting_fully_consumed = false;
                } else {
                    resting_fully_consumed = true;
                }
            }

            let output_ts = clock.now_micros();
            sink.order_executed(&Executed {
                resting_id,
                new_id: new_order.id,
                execution_id,
                price: resting_price,
                quantity: fill,
                input_ts,
                output_ts,
            });

            if !resting_fully_consumed {
                new_order.quantity = 0;
                break;
            }

            new_order.quantity -= fill;
            state.by_id.remove(&resting_id);
            cur = next;
        }

        // Rebind the opposite head to the first un-consumed node and null
        // its prev.
        if let Some(survivor) = cur {
            if let Some(node) = state.by_id.get_mut(&survivor) {
                node.node.prev = None;
            }
        }
        match new_order.side {
            Side::Buy => state.ask_head = cur,
            Side::Sell => state.bid_head = cur,
        }

        if new_order.quantity > 0 {
            let id = new_order.id;
            let price = new_order.price;
            let remaining = new_order.quantity;
            let is_sell_side = new_order.side == Side::Sell;
            self.insert(&mut state, new_order);
            let output_ts = clock.now_micros();
            sink.order_added(&Added {
                id,
                symbol: self.symbol,
                price,
                remaining,
                is_sell_side,
                input_ts,
                output_ts,
            });
        }
    }

    fn insert(&self, state: &mut BookState, order: NewOrder) {
        let NewOrder { id, side, price, quantity } = order;
        let node = OrderNode {
            side,
            price,
            remaining: quantity,
            executed_count: 0,
            prev: None,
            next: None,
        };
        state.by_id.insert(id, RestingOrder { node });

        match side {
            Side::Buy => {
                let head = state.bid_head;
                match head {
                    None => state.bid_head = Some(id),
                    Some(head_id) if price > state.by_id[&head_id].node.price => {
                        state.by_id.get_mut(&id).unwrap().node.next = Some(head_id);
                        state.by_id.get_mut(&head_id).unwrap().node.prev = Some(id);
                        state.bid_head = Some(id);
                    }
                    Some(head_id) => {
                        let mut walker = head_id;
                        loop {
                            let next = state.by_id[&walker].node.next;
                            match next {
                                Some(next_id) if state.by_id[&next_id].node.price >= price => {
                                    walker = next_id;
                                }
                                _ => break,
                            }
                        }
                        let next = state.by_id[&walker].node.next;
                        state.by_id.get_mut(&id).unwrap().node.next = next;
                        state.by_id.get_mut(&id).unwrap().node.prev = Some(walker);
                        if let Some(next_id) = next {
                            state.by_id.get_mut(&next_id).unwrap().node.prev = Some(id);
                        }
                        state.by_id.get_mut(&walker).unwrap().node.next = Some(id);
                    }
                }
            }
            Side::Sell => {
                let head = state.ask_head;
                match head {
                    None => state.ask_head = Some(id),
                    Some(head_id) if price < state.by_id[&head_id].node.price => {
                        state.by_id.get_mut(&id).unwrap().node.next = Some(head_id);
                        state.by_id.get_mut(&head_id).unwrap().node.prev = Some(id);
                        state.ask_head = Some(id);
                    }
                    Some(head_id) => {
                        let mut walker = head_id;
                        loop {
                            let next = state.by_id[&walker].node.next;
                            match next {
                                Some(next_id) if price >= state.by_id[&next_id].node.price => {
                                    walker = next_id;
                                }
                                _ => break,
                            }
                        }
                        let next = state.by_id[&walker].node.next;
                        state.by_id.get_mut(&id).unwrap().node.next = next;
                        state.by_id.get_mut(&id).unwrap().node.prev = Some(walker);
                        if let Some(next_id) = next {
                            state.by_id.get_mut(&next_id).unwrap().node.prev = Some(id);
                        }
                        state.by_id.get_mut(&walker).unwrap().node.next = Some(id);
                    }
                }
            }
        }
    }

    /// Cancels a resting order by id. Always emits exactly one `Deleted`
    /// event: accepted if the id was found and unlinked, rejected if not.
    ///
    /// Unlinks symmetrically (`prev.next = next; next.prev = prev`) so a
    /// middle-of-list cancel relinks both neighbours correctly.
    pub fn cancel(&self, order_id: OrderId, input_ts: u64, clock: &Clock, sink: &dyn EventSink) {
        let mut state = self.inner.lock().unwrap();
        let accepted = match state.by_id.remove(&order_id) {
            None => false,
            Some(removed) => {
                let (side, prev, next) = (removed.node.side, removed.node.prev, removed.node.next);
                if let Some(prev_id) = prev {
                    state.by_id.get_mut(&prev_id).unwrap().node.next = next;
                } else {
                    match side {
                        Side::Buy => state.bid_head = next,
                        Side::Sell => state.ask_head = next,
                    }
                }
                if let Some(next_id) = next {
                    state.by_id.get_mut(&next_id).unwrap().node.prev = prev;
                }
                true
            }
        };
        let output_ts = clock.now_micros();
        sink.order_deleted(&Deleted {
            id: order_id,
            accepted,
            input_ts,
            output_ts,
        });
    }

    /// Best-effort debug dump for the `Print` command: the ask side head
    /// to tail, then the bid side head to tail, one wire-format line per
    /// resting order, no timestamps. Never touches the protocol event
    /// stream.
    pub fn debug_dump(&self, sink: &dyn EventSink) {
        let state = self.inner.lock().unwrap();
        let mut cur = state.ask_head;
        while let Some(id) = cur {
            let node = &state.by_id[&id].node;
            sink.dump_line(&format!(
                "S {} {} {} {}",
                id, self.symbol, node.price, node.remaining
            ));
            cur = node.next;
        }
        let mut cur = state.bid_head;
        while let Some(id) = cur {
            let node = &state.by_id[&id].node;
            sink.dump_line(&format!(
                "B {} {} {} {}",
                id, self.symbol, node.price, node.remaining
            ));
            cur = node.next;
        }
    }

    #[cfg(test)]
    pub(crate) fn snapshot(&self, side: Side) -> Vec<(OrderId, Price, Quantity)> {
        let state = self.inner.lock().unwrap();
        let mut cur = match side {
            Side::Buy => state.bid_head,
            Side::Sell => state.ask_head,
        };
        let mut out = Vec::new();
        while let Some(id) = cur {
            let node = &state.by_id[&id].node;
            out.push((id, node.price, node.remaining));
            cur = node.next;
        }
        out
    }

    #[cfg(test)]
    pub(crate) fn resting_count(&self) -> usize {
        self.inner.lock().unwrap().by_id.len()
    }
}
