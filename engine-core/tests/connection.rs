//! The wire framing and dispatch loop from spec.md §6/§4.3: record
//! decoding, end-of-stream vs. short-read framing errors, and the
//! read-decode-dispatch loop driven end to end over an in-memory
//! reader standing in for a socket.
use engine_core::prelude::*;
use std::io::Cursor;

fn record(kind: u8, id: u32, price: u32, count: u32, symbol: &str) -> [u8; RECORD_LEN] {
    let mut buf = [0u8; RECORD_LEN];
    buf[0] = kind;
    buf[1..5].copy_from_slice(&id.to_le_bytes());
    buf[5..9].copy_from_slice(&price.to_le_bytes());
    buf[9..13].copy_from_slice(&count.to_le_bytes());
    let bytes = symbol.as_bytes();
    buf[13..13 + bytes.len()].copy_from_slice(bytes);
    buf
}

#[test]
fn decodes_all_four_command_kinds() {
    let buy = decode_command(&record(b'B', 1, 100, 10, "AAPL")).unwrap();
    match buy {
        Command::Buy { id, price, count, symbol } => {
            assert_eq!((id, price, count, symbol.as_str()), (1, 100, 10, "AAPL"));
        }
        _ => panic!("expected Buy"),
    }

    let sell = decode_command(&record(b'S', 2, 50, 5, "GOOG")).unwrap();
    assert!(matches!(sell, Command::Sell { id: 2, price: 50, count: 5, .. }));

    let cancel = decode_command(&record(b'C', 7, 0, 0, "")).unwrap();
    assert!(matches!(cancel, Command::Cancel { id: 7 }));

    let print = decode_command(&record(b'P', 0, 0, 0, "")).unwrap();
    assert!(matches!(print, Command::Print));
}

#[test]
fn rejects_unrecognized_command_type_byte() {
    let err = decode_command(&record(b'Z', 1, 1, 1, "X")).unwrap_err();
    assert!(matches!(err, FramingError::UnknownCommandType(b'Z')));
}

#[test]
fn clean_end_of_stream_before_any_bytes_returns_none() {
    let mut reader = Cursor::new(Vec::<u8>::new());
    assert!(read_record(&mut reader).unwrap().is_none());
}

#[test]
fn short_read_mid_record_is_a_framing_error() {
    let mut reader = Cursor::new(vec![b'B', 1, 2, 3]);
    let err = read_record(&mut reader).unwrap_err();
    assert!(matches!(err, FramingError::ShortRead { bytes_read: 4, record_len } if record_len == RECORD_LEN));
}

#[test]
fn worker_dispatches_buy_sell_and_cancel_over_a_byte_stream() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&record(b'B', 1, 100, 10, "AAPL"));
    bytes.extend_from_slice(&record(b'S', 2, 100, 6, "AAPL"));
    bytes.extend_from_slice(&record(b'C', 1, 0, 0, ""));

    let global = GlobalBook::new();
    let clock = Clock::new();
    let sink = RecordingSink::new();
    let worker = ConnectionWorker::new(&global, &clock, &sink);

    worker.run(Cursor::new(bytes)).unwrap();

    assert_eq!(
        sink.lines(),
        vec!["B 1 AAPL 100 10", "E 1 2 1 100 6", "X 1 R"]
    );
}

#[test]
fn worker_rejects_zero_price_and_zero_quantity_orders() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&record(b'B', 1, 0, 10, "AAPL"));
    bytes.extend_from_slice(&record(b'B', 2, 100, 0, "AAPL"));

    let global = GlobalBook::new();
    let clock = Clock::new();
    let sink = RecordingSink::new();
    let worker = ConnectionWorker::new(&global, &clock, &sink);

    worker.run(Cursor::new(bytes)).unwrap();

    assert!(sink.lines().is_empty());
}
