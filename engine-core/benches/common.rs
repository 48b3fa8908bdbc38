use engine_core::prelude::*;

/// Builds a `NewOrder` for benchmarks, mirroring `tests/common.rs`.
pub fn order(id: OrderId, side: Side, price: Price, quantity: Quantity) -> NewOrder {
    NewOrder {
        id,
        side,
        price,
        quantity,
    }
}
