//! Decoder Tests
//!
//! Tests for reply parsing, covering:
//! - Every reply type, including null bulk and null array
//! - Incomplete input at every position
//! - Malformed input rejection
//! - Resumable decoding agreeing with the stateless parser

use bytes::BytesMut;
use kvwire::protocol::{
    encode_reply, try_parse, try_parse_with, Limits, ParseOutcome, Reply, ReplyDecoder,
};
use proptest::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

fn complete(buf: &[u8]) -> (Reply, usize) {
    match try_parse(buf) {
        ParseOutcome::Complete(reply, consumed) => (reply, consumed),
        other => panic!("expected complete reply, got {:?}", other),
    }
}

fn assert_malformed(buf: &[u8]) {
    match try_parse(buf) {
        ParseOutcome::Malformed(_) => {}
        other => panic!("expected malformed for {:?}, got {:?}", buf, other),
    }
}

fn wire(reply: &Reply) -> Vec<u8> {
    let mut out = BytesMut::new();
    encode_reply(reply, &mut out);
    out.to_vec()
}

// =============================================================================
// Scalar Reply Tests
// =============================================================================

#[test]
fn test_status() {
    assert_eq!(complete(b"+OK\r\n"), (Reply::status("OK"), 5));
}

#[test]
fn test_empty_status() {
    assert_eq!(complete(b"+\r\n"), (Reply::status(""), 3));
}

#[test]
fn test_error() {
    assert_eq!(
        complete(b"-ERR bad thing\r\n"),
        (Reply::error("ERR bad thing"), 16)
    );
}

#[test]
fn test_integers() {
    assert_eq!(complete(b":0\r\n"), (Reply::Integer(0), 4));
    assert_eq!(complete(b":-42\r\n"), (Reply::Integer(-42), 6));
    assert_eq!(
        complete(b":9223372036854775807\r\n").0,
        Reply::Integer(i64::MAX)
    );
}

#[test]
fn test_bulk() {
    assert_eq!(complete(b"$5\r\nhello\r\n"), (Reply::bulk("hello"), 11));
}

#[test]
fn test_bulk_with_embedded_crlf() {
    assert_eq!(complete(b"$4\r\na\r\nb\r\n"), (Reply::bulk("a\r\nb"), 10));
}

#[test]
fn test_null_bulk_distinct_from_empty_bulk() {
    assert_eq!(complete(b"$-1\r\n"), (Reply::Bulk(None), 5));
    assert_eq!(complete(b"$0\r\n\r\n"), (Reply::Bulk(Some(Default::default())), 6));
    assert_ne!(complete(b"$-1\r\n").0, complete(b"$0\r\n\r\n").0);
}

// =============================================================================
// Array Reply Tests
// =============================================================================

#[test]
fn test_nested_arrays() {
    let (reply, consumed) = complete(b"*2\r\n*1\r\n:1\r\n$-1\r\n");
    assert_eq!(
        reply,
        Reply::Array(vec![Reply::Array(vec![Reply::Integer(1)]), Reply::Bulk(None)])
    );
    assert_eq!(consumed, 17);
}

#[test]
fn test_empty_array() {
    assert_eq!(complete(b"*0\r\n"), (Reply::Array(vec![]), 4));
}

#[test]
fn test_null_array_distinct_from_null_bulk() {
    assert_eq!(complete(b"*-1\r\n"), (Reply::NullArray, 5));
    assert_ne!(Reply::NullArray, Reply::Bulk(None));
}

#[test]
fn test_array_of_mixed_types() {
    let (reply, _) = complete(b"*4\r\n+OK\r\n-ERR no\r\n:7\r\n$3\r\nabc\r\n");
    assert_eq!(
        reply,
        Reply::Array(vec![
            Reply::status("OK"),
            Reply::error("ERR no"),
            Reply::Integer(7),
            Reply::bulk("abc"),
        ])
    );
}

#[test]
fn test_trailing_bytes_not_consumed() {
    let (reply, consumed) = complete(b"+OK\r\n:1\r\n");
    assert_eq!(reply, Reply::status("OK"));
    assert_eq!(consumed, 5);
}

// =============================================================================
// Incomplete Input Tests
// =============================================================================

#[test]
fn test_empty_buffer_incomplete() {
    assert_eq!(try_parse(b""), ParseOutcome::Incomplete);
}

#[test]
fn test_every_prefix_is_incomplete() {
    let full = b"*3\r\n$3\r\nSET\r\n*1\r\n:5\r\n$-1\r\n";
    for end in 0..full.len() {
        assert_eq!(
            try_parse(&full[..end]),
            ParseOutcome::Incomplete,
            "prefix of {} bytes",
            end
        );
    }
    assert!(matches!(try_parse(full), ParseOutcome::Complete(_, n) if n == full.len()));
}

#[test]
fn test_bulk_waits_for_terminator() {
    assert_eq!(try_parse(b"$3\r\nabc"), ParseOutcome::Incomplete);
    assert_eq!(try_parse(b"$3\r\nabc\r"), ParseOutcome::Incomplete);
}

#[test]
fn test_status_with_lone_cr_incomplete() {
    assert_eq!(try_parse(b"+OK\r"), ParseOutcome::Incomplete);
}

// =============================================================================
// Malformed Input Tests
// =============================================================================

#[test]
fn test_unknown_type_byte() {
    assert_malformed(b"?what\r\n");
    assert_malformed(b"OK\r\n");
}

#[test]
fn test_negative_bulk_length() {
    assert_malformed(b"$-2\r\n");
    assert_malformed(b"$-2\r\nab\r\n");
}

#[test]
fn test_non_digit_lengths() {
    assert_malformed(b"$abc\r\n");
    assert_malformed(b"$\r\n");
    assert_malformed(b"$1x\r\nz\r\n");
    assert_malformed(b"*two\r\n");
    assert_malformed(b"*-5\r\n");
}

#[test]
fn test_invalid_integer() {
    assert_malformed(b":12a\r\n");
    assert_malformed(b":\r\n");
    assert_malformed(b":99999999999999999999\r\n");
}

#[test]
fn test_bulk_payload_without_crlf() {
    assert_malformed(b"$3\r\nabcXY");
}

#[test]
fn test_malformed_element_inside_array() {
    assert_malformed(b"*2\r\n:1\r\n!\r\n");
}

#[test]
fn test_bulk_length_over_limit() {
    let limits = Limits {
        max_bulk_len: 4,
        ..Limits::default()
    };
    assert!(matches!(
        try_parse_with(b"$5\r\n", &limits),
        ParseOutcome::Malformed(_)
    ));
    assert!(matches!(
        try_parse_with(b"$4\r\nabcd\r\n", &limits),
        ParseOutcome::Complete(_, 10)
    ));
}

#[test]
fn test_nesting_over_limit() {
    let limits = Limits {
        max_depth: 2,
        ..Limits::default()
    };
    assert!(matches!(
        try_parse_with(b"*1\r\n*1\r\n:1\r\n", &limits),
        ParseOutcome::Complete(_, _)
    ));
    assert!(matches!(
        try_parse_with(b"*1\r\n*1\r\n*1\r\n:1\r\n", &limits),
        ParseOutcome::Malformed(_)
    ));

    let mut decoder = ReplyDecoder::new(limits);
    assert!(matches!(
        decoder.decode(b"*1\r\n*1\r\n*1\r\n"),
        ParseOutcome::Malformed(_)
    ));
}

#[test]
fn test_deep_nesting_does_not_overflow() {
    let mut buf = b"*1\r\n".repeat(100_000);
    buf.extend_from_slice(b":1\r\n");
    assert_malformed(&buf);
    assert!(matches!(
        ReplyDecoder::default().decode(&buf),
        ParseOutcome::Malformed(_)
    ));
}

// =============================================================================
// Resumable Decoder Tests
// =============================================================================

#[test]
fn test_decoder_byte_by_byte() {
    let full = b"*2\r\n*1\r\n:1\r\n$-1\r\n";
    let mut decoder = ReplyDecoder::default();
    for end in 1..full.len() {
        assert_eq!(decoder.decode(&full[..end]), ParseOutcome::Incomplete);
    }
    assert_eq!(decoder.decode(full), try_parse(full));
}

#[test]
fn test_decoder_reusable_after_complete() {
    let mut decoder = ReplyDecoder::default();
    assert_eq!(decoder.decode(b"+OK\r\n"), ParseOutcome::Complete(Reply::status("OK"), 5));
    assert_eq!(decoder.decode(b":3\r\n"), ParseOutcome::Complete(Reply::Integer(3), 4));
}

#[test]
fn test_decoder_reset_discards_progress() {
    let mut decoder = ReplyDecoder::default();
    assert_eq!(decoder.decode(b"*2\r\n:1\r\n"), ParseOutcome::Incomplete);
    assert!(decoder.in_progress());
    decoder.reset();
    assert!(!decoder.in_progress());
    assert_eq!(decoder.decode(b":9\r\n"), ParseOutcome::Complete(Reply::Integer(9), 4));
}

// =============================================================================
// Properties
// =============================================================================

fn arb_reply() -> impl Strategy<Value = Reply> {
    let leaf = prop_oneof![
        "[a-zA-Z0-9 ]{0,16}".prop_map(|s| Reply::status(s)),
        "[a-zA-Z0-9 ]{0,16}".prop_map(|s| Reply::error(s)),
        any::<i64>().prop_map(Reply::Integer),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(|b| Reply::bulk(b)),
        Just(Reply::Bulk(None)),
        Just(Reply::NullArray),
    ];
    leaf.prop_recursive(4, 64, 6, |inner| {
        prop::collection::vec(inner, 0..6).prop_map(Reply::Array)
    })
}

/// Reply bytes plus cut points splitting them into non-empty chunks
fn chunked_reply() -> impl Strategy<Value = (Reply, Vec<u8>, Vec<usize>)> {
    arb_reply().prop_flat_map(|reply| {
        let bytes = wire(&reply);
        let len = bytes.len();
        let cuts = prop::collection::btree_set(1..len.max(2), 0..8);
        (Just(reply), Just(bytes), cuts).prop_map(move |(reply, bytes, cuts)| {
            let mut cuts: Vec<usize> = cuts.into_iter().filter(|&c| c < len).collect();
            cuts.push(len);
            (reply, bytes, cuts)
        })
    })
}

proptest! {
    #[test]
    fn prop_reply_round_trips(reply in arb_reply()) {
        let bytes = wire(&reply);
        prop_assert_eq!(try_parse(&bytes), ParseOutcome::Complete(reply, bytes.len()));
    }

    #[test]
    fn prop_partial_delivery_invariance((reply, bytes, cuts) in chunked_reply()) {
        let mut decoder = ReplyDecoder::default();
        let last = cuts.len() - 1;
        for (i, &end) in cuts.iter().enumerate() {
            let stateless = try_parse(&bytes[..end]);
            let resumed = decoder.decode(&bytes[..end]);
            prop_assert_eq!(&resumed, &stateless);
            if i < last {
                prop_assert_eq!(resumed, ParseOutcome::Incomplete);
            } else {
                prop_assert_eq!(resumed, ParseOutcome::Complete(reply.clone(), bytes.len()));
            }
        }
    }

    #[test]
    fn prop_garbage_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let _ = try_parse(&bytes);
        let _ = ReplyDecoder::default().decode(&bytes);
    }
}
