use crate::prelude::*;
use std::io::Read;
use std::sync::Arc;

/// Wire record size: `type`(1) + `order_id`(4) + `price`(4) + `count`(4)
/// + `instrument`(9), packed with no alignment padding.
pub const RECORD_LEN: usize = 1 + 4 + 4 + 4 + 9;

/// A decoded command, the typed product of the command decoder. Kept
/// here, alongside `ConnectionWorker`, because both are part of the
/// same read-decode-dispatch loop.
#[derive(Debug, Clone)]
pub enum Command {
    Buy {
        id: OrderId,
        symbol: Symbol,
        price: Price,
        count: Quantity,
    },
    Sell {
        id: OrderId,
        symbol: Symbol,
        price: Price,
        count: Quantity,
    },
    Cancel {
        id: OrderId,
    },
    Print,
}

/// Decodes one fixed-width record into a `Command`. The dispatch is
/// exhaustive — an unrecognized type byte is rejected outright rather
/// than treated as a debug print.
pub fn decode_command(record: &[u8; RECORD_LEN]) -> Result<Command, FramingError> {
    let type_byte = record[0];
    let order_id = u32::from_le_bytes(record[1..5].try_into().unwrap());
    let price = u32::from_le_bytes(record[5..9].try_into().unwrap());
    let count = u32::from_le_bytes(record[9..13].try_into().unwrap());
    let instrument: [u8; 9] = record[13..22].try_into().unwrap();

    match type_byte {
        b'B' => Ok(Command::Buy {
            id: order_id,
            symbol: Symbol::from_wire(&instrument),
            price,
            count,
        }),
        b'S' => Ok(Command::Sell {
            id: order_id,
            symbol: Symbol::from_wire(&instrument),
            price,
            count,
        }),
        b'C' => Ok(Command::Cancel { id: order_id }),
        b'P' => Ok(Command::Print),
        other => Err(FramingError::UnknownCommandType(other)),
    }
}

/// Reads exactly one record off `reader`. A zero-byte read before any
/// data arrives is a clean end-of-stream; any other short read is a
/// framing error. Both outcomes cause the caller to return rather than
/// fall through to the next read.
pub fn read_record<R: Read>(reader: &mut R) -> Result<Option<[u8; RECORD_LEN]>, FramingError> {
    let mut buf = [0u8; RECORD_LEN];
    let mut total = 0;
    while total < RECORD_LEN {
        let n = reader.read(&mut buf[total..])?;
        if n == 0 {
            if total == 0 {
                return Ok(None);
            }
            return Err(FramingError::ShortRead {
                bytes_read: total,
                record_len: RECORD_LEN,
            });
        }
        total += n;
    }
    Ok(Some(buf))
}

/// One command loop per accepted connection. Owns its reader
/// exclusively until end-of-stream or a fatal read error, then drops
/// it, closing the underlying descriptor.
pub struct ConnectionWorker<'a> {
    global: &'a GlobalBook,
    clock: &'a Clock,
    sink: &'a dyn EventSink,
}

impl<'a> ConnectionWorker<'a> {
    pub fn new(global: &'a GlobalBook, clock: &'a Clock, sink: &'a dyn EventSink) -> Self {
        Self {
            global,
            clock,
            sink,
        }
    }

    /// Runs the read-decode-dispatch loop until end-of-stream or a fatal
    /// framing/I/O error. Returns the error so the caller can log it;
    /// a clean end-of-stream returns `Ok(())`.
    pub fn run<R: Read>(&self, mut reader: R) -> Result<(), FramingError> {
        loop {
            let record = match read_record(&mut reader)? {
                None => return Ok(()),
                Some(record) => record,
            };
            let input_ts = self.clock.now_micros();
            let command = decode_command(&record)?;
            self.dispatch(command, input_ts);
        }
    }

    fn dispatch(&self, command: Command, input_ts: u64) {
        match command {
            Command::Buy {
                id,
                symbol,
                price,
                count,
            } => self.trade(id, Side::Buy, symbol, price, count, input_ts),
            Command::Sell {
                id,
                symbol,
                price,
                count,
            } => self.trade(id, Side::Sell, symbol, price, count, input_ts),
            Command::Cancel { id } => self.cancel(id, input_ts),
            Command::Print => self.global.debug_dump(self.sink),
        }
    }

    /// Price and quantity must both be strictly positive; orders with
    /// either at zero are rejected outright — no `Added` event, no
    /// match attempted, just a dropped command.
    fn trade(
        &self,
        id: OrderId,
        side: Side,
        symbol: Symbol,
        price: Price,
        count: Quantity,
        input_ts: u64,
    ) {
        if price == 0 || count == 0 {
            tracing::debug!(order_id = id, price, count, "rejecting zero price/count order");
            return;
        }
        let book: Arc<InstrumentBook> = self.global.resolve_for_trade(id, symbol);
        let new_order = NewOrder {
            id,
            side,
            price,
            quantity: count,
        };
        book.match_order(new_order, input_ts, self.clock, self.sink);
    }

    fn cancel(&self, id: OrderId, input_ts: u64) {
        match self.global.resolve_for_cancel(id) {
            Some(book) => book.cancel(id, input_ts, self.clock, self.sink),
            None => {
                let output_ts = self.clock.now_micros();
                self.sink.order_deleted(&Deleted {
                    id,
                    accepted: false,
                    input_ts,
                    output_ts,
                });
            }
        }
    }
}
