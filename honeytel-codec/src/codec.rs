//
// Copyright 2017-2026 Honeytel Contributors. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The Telnet Codec (spec.md §4.A): a byte-stream transducer between raw
//! socket bytes and [`TelnetFrame`]s. IAC escaping, CR/LF cooking and ANSI
//! cursor-key decoding all happen here; option-negotiation policy (§4.B)
//! lives one layer up in [`crate::options::OptionNegotiator`].

use crate::consts::*;
use crate::event::KeyCode;
use crate::frame::TelnetFrame;
use crate::options::TelnetOption;
use crate::result::CodecError;
use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

/// Escape sequences recognized for the `"ansi"` terminal type (spec.md §4.A /
/// §6's terminal-info collaborator, hardcoded here since this honeypot only
/// ever needs the `ansi` capability set).
const ESCSEQ: &[(&[u8], KeyCode)] = &[
    (b"\x1b[A", KeyCode::Up),
    (b"\x1b[B", KeyCode::Down),
    (b"\x1b[C", KeyCode::Right),
    (b"\x1b[D", KeyCode::Left),
    (b"\x1b[3~", KeyCode::Delete),
];

/// A peer that never sends `IAC SE` would otherwise grow the subnegotiation
/// buffer without bound; none of the options this honeypot negotiates ever
/// needs more than a terminal-type string or a window-size quad.
const MAX_SUBNEGOTIATION_LEN: usize = 512;

enum EscMatch {
    Exact(KeyCode),
    Prefix,
    None,
}

fn escseq_lookup(buf: &[u8]) -> EscMatch {
    let mut any_prefix = false;
    for (seq, key) in ESCSEQ {
        if *seq == buf {
            return EscMatch::Exact(*key);
        }
        if seq.starts_with(buf) {
            any_prefix = true;
        }
    }
    if any_prefix {
        EscMatch::Prefix
    } else {
        EscMatch::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Do,
    Dont,
    Will,
    Wont,
}

enum State {
    Idle,
    GotIac,
    GotIacVerb(Verb),
    /// `IAC SB` seen; waiting for the option byte that names the subnegotiation.
    GotSb,
    /// Accumulating subnegotiation payload for `opt`; `got_iac` tracks whether
    /// the previous byte was an `IAC` awaiting `SE` or a doubled `IAC`.
    InSb { opt: TelnetOption, data: Vec<u8>, got_iac: bool },
    /// Accumulating a possible ANSI escape sequence.
    Esc(Vec<u8>),
}

/// Decodes a raw Telnet byte stream into [`TelnetFrame`]s and encodes frames
/// back into wire bytes, doubling `IAC` and cooking bare `LF` to `CRLF`.
pub struct TelnetCodec {
    state: State,
}

impl Default for TelnetCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TelnetCodec {
    pub fn new() -> Self {
        TelnetCodec { state: State::Idle }
    }
}

impl Decoder for TelnetCodec {
    type Item = TelnetFrame;
    type Error = CodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<TelnetFrame>, CodecError> {
        loop {
            if buf.is_empty() {
                return Ok(None);
            }
            match &mut self.state {
                State::Idle => {
                    let b = buf[0];
                    if b == IAC {
                        buf.advance(1);
                        self.state = State::GotIac;
                        continue;
                    }
                    if b == CR {
                        // Need to peek the byte after CR to decide how to cook it.
                        if buf.len() < 2 {
                            return Ok(None);
                        }
                        let peek = buf[1];
                        if peek == NUL || peek == LF {
                            buf.advance(2);
                        } else {
                            buf.advance(1);
                        }
                        return Ok(Some(TelnetFrame::Data(LF)));
                    }
                    if b == 0x1B {
                        buf.advance(1);
                        self.state = State::Esc(vec![0x1B]);
                        continue;
                    }
                    buf.advance(1);
                    return Ok(Some(TelnetFrame::Data(b)));
                }
                State::Esc(seq) => {
                    let b = buf[0];
                    buf.advance(1);
                    seq.push(b);
                    match escseq_lookup(seq) {
                        EscMatch::Exact(key) => {
                            self.state = State::Idle;
                            return Ok(Some(TelnetFrame::KeyPress(key)));
                        }
                        EscMatch::Prefix => continue,
                        EscMatch::None => {
                            let mut leftover = seq.clone();
                            let first = leftover.remove(0);
                            let mut requeued = BytesMut::with_capacity(leftover.len() + buf.len());
                            requeued.extend_from_slice(&leftover);
                            requeued.extend_from_slice(buf);
                            *buf = requeued;
                            self.state = State::Idle;
                            return Ok(Some(TelnetFrame::Data(first)));
                        }
                    }
                }
                State::GotIac => {
                    let b = buf[0];
                    buf.advance(1);
                    match b {
                        IAC => {
                            self.state = State::Idle;
                            return Ok(Some(TelnetFrame::Data(0xFF)));
                        }
                        DO => self.state = State::GotIacVerb(Verb::Do),
                        DONT => self.state = State::GotIacVerb(Verb::Dont),
                        WILL => self.state = State::GotIacVerb(Verb::Will),
                        WONT => self.state = State::GotIacVerb(Verb::Wont),
                        SB => {
                            self.state = State::GotSb;
                            continue;
                        }
                        NOP => {
                            self.state = State::Idle;
                            return Ok(Some(TelnetFrame::NoOperation));
                        }
                        DM => {
                            self.state = State::Idle;
                            return Ok(Some(TelnetFrame::DataMark));
                        }
                        BRK => {
                            self.state = State::Idle;
                            return Ok(Some(TelnetFrame::Break));
                        }
                        IP => {
                            self.state = State::Idle;
                            return Ok(Some(TelnetFrame::InterruptProcess));
                        }
                        AO => {
                            self.state = State::Idle;
                            return Ok(Some(TelnetFrame::AbortOutput));
                        }
                        AYT => {
                            self.state = State::Idle;
                            return Ok(Some(TelnetFrame::AreYouThere));
                        }
                        EC => {
                            self.state = State::Idle;
                            return Ok(Some(TelnetFrame::EraseCharacter));
                        }
                        crate::consts::EL => {
                            self.state = State::Idle;
                            return Ok(Some(TelnetFrame::EraseLine));
                        }
                        GA => {
                            self.state = State::Idle;
                            return Ok(Some(TelnetFrame::GoAhead));
                        }
                        SE => {
                            // SE without a preceding SB: ignore.
                            self.state = State::Idle;
                            continue;
                        }
                        other => {
                            self.state = State::Idle;
                            return Err(CodecError::UnknownCommand(other));
                        }
                    }
                }
                State::GotIacVerb(verb) => {
                    let opt = TelnetOption::from_u8(buf[0]);
                    buf.advance(1);
                    let verb = *verb;
                    self.state = State::Idle;
                    return Ok(Some(match verb {
                        Verb::Do => TelnetFrame::Do(opt),
                        Verb::Dont => TelnetFrame::Dont(opt),
                        Verb::Will => TelnetFrame::Will(opt),
                        Verb::Wont => TelnetFrame::Wont(opt),
                    }));
                }
                State::GotSb => {
                    let opt = TelnetOption::from_u8(buf[0]);
                    buf.advance(1);
                    self.state = State::InSb { opt, data: Vec::new(), got_iac: false };
                }
                State::InSb { opt, data, got_iac } => {
                    let b = buf[0];
                    buf.advance(1);
                    if *got_iac {
                        if b == SE {
                            let opt = *opt;
                            let data = std::mem::take(data);
                            self.state = State::Idle;
                            return Ok(Some(TelnetFrame::Subnegotiation(opt, data)));
                        } else if b == IAC {
                            data.push(0xFF);
                            *got_iac = false;
                        } else {
                            // Malformed; best-effort recovery (spec.md §7: Recoverable).
                            data.push(b);
                            *got_iac = false;
                        }
                    } else if b == IAC {
                        *got_iac = true;
                    } else {
                        data.push(b);
                    }
                    if data.len() > MAX_SUBNEGOTIATION_LEN {
                        self.state = State::Idle;
                        return Err(CodecError::SubnegotiationTooLarge);
                    }
                }
            }
        }
    }
}

impl Encoder<TelnetFrame> for TelnetCodec {
    type Error = CodecError;

    fn encode(&mut self, item: TelnetFrame, dst: &mut BytesMut) -> Result<(), CodecError> {
        match item {
            TelnetFrame::Data(b) => encode_data_byte(b, dst),
            TelnetFrame::KeyPress(_) => {}
            TelnetFrame::NoOperation => dst.put_slice(&[IAC, NOP]),
            TelnetFrame::DataMark => dst.put_slice(&[IAC, DM]),
            TelnetFrame::Break => dst.put_slice(&[IAC, BRK]),
            TelnetFrame::InterruptProcess => dst.put_slice(&[IAC, IP]),
            TelnetFrame::AbortOutput => dst.put_slice(&[IAC, AO]),
            TelnetFrame::AreYouThere => dst.put_slice(&[IAC, AYT]),
            TelnetFrame::EraseCharacter => dst.put_slice(&[IAC, EC]),
            TelnetFrame::EraseLine => dst.put_slice(&[IAC, crate::consts::EL]),
            TelnetFrame::GoAhead => dst.put_slice(&[IAC, GA]),
            TelnetFrame::Will(opt) => dst.put_slice(&[IAC, WILL, opt.to_u8()]),
            TelnetFrame::Wont(opt) => dst.put_slice(&[IAC, WONT, opt.to_u8()]),
            TelnetFrame::Do(opt) => dst.put_slice(&[IAC, DO, opt.to_u8()]),
            TelnetFrame::Dont(opt) => dst.put_slice(&[IAC, DONT, opt.to_u8()]),
            TelnetFrame::Subnegotiation(opt, data) => {
                dst.put_slice(&[IAC, SB, opt.to_u8()]);
                for b in data {
                    if b == IAC {
                        dst.put_slice(&[IAC, IAC]);
                    } else {
                        dst.put_u8(b);
                    }
                }
                dst.put_slice(&[IAC, SE]);
            }
            TelnetFrame::SubnegotiationRequest(opt) => {
                dst.put_slice(&[IAC, SB, opt.to_u8(), TTYPE_SEND, IAC, SE]);
            }
        }
        Ok(())
    }
}

/// Payload-byte framing (spec.md §4.A "Outbound framing"): `IAC` is doubled,
/// a bare `LF` becomes `CRLF`.
fn encode_data_byte(b: u8, dst: &mut BytesMut) {
    if b == IAC {
        dst.put_slice(&[IAC, IAC]);
    } else if b == LF {
        dst.put_slice(&[CR, LF]);
    } else {
        dst.put_u8(b);
    }
}

/// Frames an already-cooked payload (no IAC/LF scanning) for writes that
/// bypass cooking, per spec.md §4.A "Command writes bypass cooking."
pub fn encode_payload(payload: &[u8], dst: &mut BytesMut) {
    for &b in payload {
        encode_data_byte(b, dst);
    }
}
