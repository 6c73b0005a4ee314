use bytes::BytesMut;
use honeytel_codec::{OptionNegotiator, TelnetCodec, TelnetFrame, TelnetOption};
use tokio_util::codec::{Decoder, Encoder};

#[test]
fn handshake_bytes_match_scenario_5() {
    let mut negotiator = OptionNegotiator::new();
    let frames = negotiator.initial_frames();

    let mut codec = TelnetCodec::new();
    let mut out = BytesMut::new();
    for frame in frames {
        codec.encode(frame, &mut out).unwrap();
    }

    let expected: &[u8] = &[
        255, 251, 1, // IAC WILL ECHO
        255, 251, 3, // IAC WILL SGA
        255, 252, 39, // IAC WONT NEW-ENVIRON
        255, 254, 1, // IAC DONT ECHO
        255, 253, 3, // IAC DO SGA
        255, 254, 31, // IAC DONT NAWS
        255, 253, 24, // IAC DO TTYPE
        255, 254, 34, // IAC DONT LINEMODE
        255, 253, 39, // IAC DO NEW-ENVIRON
    ];
    assert_eq!(&out[..], expected);
}

#[test]
fn ttype_will_triggers_do_and_subnegotiation_request() {
    let mut negotiator = OptionNegotiator::new();
    let _ = negotiator.initial_frames();

    let (replies, _) = negotiator.handle_frame(TelnetFrame::Will(TelnetOption::TerminalType));
    assert_eq!(
        replies,
        vec![TelnetFrame::SubnegotiationRequest(TelnetOption::TerminalType)]
    );

    let mut codec = TelnetCodec::new();
    let mut out = BytesMut::new();
    for frame in replies {
        codec.encode(frame, &mut out).unwrap();
    }
    assert_eq!(&out[..], &[255, 250, 24, 1, 255, 240][..]);
}

#[test]
fn decoding_is_chunk_size_independent() {
    let input: &[u8] = b"root\r\n123456\r\nuname -a\r\n";

    let mut bulk = TelnetCodec::new();
    let mut bulk_buf = BytesMut::from(input);
    let mut bulk_out = Vec::new();
    while let Some(f) = bulk.decode(&mut bulk_buf).unwrap() {
        bulk_out.push(f);
    }

    let mut one = TelnetCodec::new();
    let mut one_buf = BytesMut::new();
    let mut one_out = Vec::new();
    for &b in input {
        one_buf.extend_from_slice(&[b]);
        while let Some(f) = one.decode(&mut one_buf).unwrap() {
            one_out.push(f);
        }
    }

    assert_eq!(bulk_out, one_out);
}
