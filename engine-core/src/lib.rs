//! Core of a concurrent limit-order matching engine.
//!
//! The binary entry point (`src/bin/matchd.rs`) owns the socket listener
//! and thread-per-connection wiring; everything that matters for
//! correctness — the order book, the matching algorithm, the global
//! symbol registry and the serialized output stream — lives here so it
//! can be exercised directly from tests and benches without a socket.

pub mod engine;

pub use engine::prelude;
