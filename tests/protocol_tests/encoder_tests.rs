//! Encoder Tests
//!
//! Tests for command construction and multi-bulk encoding.

use bytes::BytesMut;
use kvwire::protocol::{encode_command, encoded_len, try_parse, ParseOutcome, Reply};
use kvwire::{Command, DriverError};
use proptest::prelude::*;

// =============================================================================
// Exact Wire Format Tests
// =============================================================================

#[test]
fn test_encode_set_exact_bytes() {
    let cmd = Command::new("SET").arg("k").arg("v");
    assert_eq!(&cmd.encode()[..], b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n");
}

#[test]
fn test_encode_single_verb() {
    let cmd = Command::new("PING");
    assert_eq!(&cmd.encode()[..], b"*1\r\n$4\r\nPING\r\n");
}

#[test]
fn test_encode_empty_argument() {
    let cmd = Command::new("SET").arg("k").arg("");
    assert_eq!(&cmd.encode()[..], b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$0\r\n\r\n");
}

#[test]
fn test_encode_binary_argument_with_crlf() {
    let cmd = Command::new("SET").arg("k").arg(b"a\r\nb\x00");
    assert_eq!(
        &cmd.encode()[..],
        b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$5\r\na\r\nb\x00\r\n"
    );
}

#[test]
fn test_encode_integer_argument() {
    let cmd = Command::new("INCRBY").arg("counter").arg_int(-15);
    assert_eq!(
        &cmd.encode()[..],
        b"*3\r\n$6\r\nINCRBY\r\n$7\r\ncounter\r\n$3\r\n-15\r\n"
    );
}

#[test]
fn test_encode_appends_to_existing_buffer() {
    let mut out = BytesMut::from(&b"prefix"[..]);
    encode_command(&["GET", "k"][..], &mut out).unwrap();
    assert_eq!(&out[..], b"prefix*2\r\n$3\r\nGET\r\n$1\r\nk\r\n");
}

#[test]
fn test_encode_ten_arguments_two_digit_count() {
    let cmd = Command::new("MGET").args((1..10).map(|i| i.to_string()));
    let wire = cmd.encode();
    assert!(wire.starts_with(b"*10\r\n$4\r\nMGET\r\n$1\r\n1\r\n"));
    assert_eq!(wire.len(), encoded_len(cmd.as_args()));
}

// =============================================================================
// Invalid Input Tests
// =============================================================================

#[test]
fn test_encode_empty_command_rejected() {
    let mut out = BytesMut::new();
    let empty: [&str; 0] = [];
    let err = encode_command(&empty[..], &mut out).unwrap_err();
    assert!(matches!(err, DriverError::InvalidArgument(_)));
    assert!(out.is_empty());
}

#[test]
fn test_from_args_empty_rejected() {
    let err = Command::from_args(Vec::<String>::new()).unwrap_err();
    assert!(matches!(err, DriverError::InvalidArgument(_)));
    assert!(!err.is_connection_fatal());
}

#[test]
fn test_from_args_preserves_order() {
    let cmd = Command::from_args(["HSET", "h", "f", "v"]).unwrap();
    assert_eq!(cmd.name(), b"HSET");
    assert_eq!(cmd.len(), 4);
    assert_eq!(cmd, Command::new("HSET").args(["h", "f", "v"]));
}

// =============================================================================
// Properties
// =============================================================================

fn arg_lists() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..8)
}

proptest! {
    #[test]
    fn prop_encoded_len_is_exact(args in arg_lists()) {
        let mut out = BytesMut::new();
        encode_command(&args[..], &mut out).unwrap();
        prop_assert_eq!(out.len(), encoded_len(&args[..]));
    }

    /// A conforming server echoing the request back parses to the same arguments
    #[test]
    fn prop_request_round_trips_as_bulk_array(args in arg_lists()) {
        let cmd = Command::from_args(&args).unwrap();
        let wire = cmd.encode();

        let expected = Reply::Array(args.iter().map(|a| Reply::bulk(a)).collect());
        prop_assert_eq!(try_parse(&wire), ParseOutcome::Complete(expected, wire.len()));
    }
}
