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

//! Telnet option identifiers and the option negotiator.

use crate::frame::TelnetFrame;
use std::fmt;

/// The small subset of IANA-registered Telnet options this honeypot negotiates.
/// Anything else round-trips through [`TelnetOption::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TelnetOption {
    Binary,
    Echo,
    SuppressGoAhead,
    Status,
    TerminalType,
    WindowSize,
    Linemode,
    NewEnvironment,
    Unknown(u8),
}

impl TelnetOption {
    pub fn to_u8(self) -> u8 {
        match self {
            TelnetOption::Binary => 0,
            TelnetOption::Echo => 1,
            TelnetOption::SuppressGoAhead => 3,
            TelnetOption::Status => 5,
            TelnetOption::TerminalType => 24,
            TelnetOption::WindowSize => 31,
            TelnetOption::Linemode => 34,
            TelnetOption::NewEnvironment => 39,
            TelnetOption::Unknown(b) => b,
        }
    }

    pub fn from_u8(b: u8) -> Self {
        match b {
            0 => TelnetOption::Binary,
            1 => TelnetOption::Echo,
            3 => TelnetOption::SuppressGoAhead,
            5 => TelnetOption::Status,
            24 => TelnetOption::TerminalType,
            31 => TelnetOption::WindowSize,
            34 => TelnetOption::Linemode,
            39 => TelnetOption::NewEnvironment,
            other => TelnetOption::Unknown(other),
        }
    }
}

impl fmt::Display for TelnetOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelnetOption::Binary => write!(f, "BINARY"),
            TelnetOption::Echo => write!(f, "ECHO"),
            TelnetOption::SuppressGoAhead => write!(f, "SGA"),
            TelnetOption::Status => write!(f, "STATUS"),
            TelnetOption::TerminalType => write!(f, "TTYPE"),
            TelnetOption::WindowSize => write!(f, "NAWS"),
            TelnetOption::Linemode => write!(f, "LINEMODE"),
            TelnetOption::NewEnvironment => write!(f, "NEW-ENVIRON"),
            TelnetOption::Unknown(b) => write!(f, "UNKNOWN({b})"),
        }
    }
}

/// Which side's reply a policy entry describes (see spec.md §4.B).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// We will / we won't.
    Will(bool),
    /// We do / we don't.
    Do(bool),
}

/// A terminal type or window size observation extracted from a subnegotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationEvent {
    TerminalType(String),
    WindowSize { width: u16, height: u16 },
    EchoChanged(bool),
}

/// Tracks per-option state using the two boolean maps spec.md §3 itself specifies
/// (`local_will[opt]`, `remote_do[opt]`) rather than a full RFC 1143 Q-method
/// machine — this honeypot's policy tables are static and it never needs to
/// resolve negotiation loops, only to avoid sending an identical reply twice.
pub struct OptionNegotiator {
    /// What we last declared ourselves willing to do (WILL=true / WONT=false).
    local_will: Vec<(TelnetOption, bool)>,
    /// What we last demanded of the peer (DO=true / DONT=false).
    remote_do: Vec<(TelnetOption, bool)>,
    /// Reply policy when the peer announces WILL/WONT (keyed in table order).
    willack: Vec<(TelnetOption, Ack)>,
    /// Reply policy when the peer announces DO/DONT (keyed in table order).
    doack: Vec<(TelnetOption, Ack)>,
    echo_enabled: bool,
}

impl Default for OptionNegotiator {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionNegotiator {
    pub fn new() -> Self {
        use TelnetOption::*;
        OptionNegotiator {
            local_will: Vec::new(),
            remote_do: Vec::new(),
            // doack: reply for incoming DO/DONT, expressed as our WILL/WONT.
            doack: vec![
                (Echo, Ack::Will(true)),
                (SuppressGoAhead, Ack::Will(true)),
                (NewEnvironment, Ack::Will(false)),
            ],
            // willack: reply for incoming WILL/WONT, expressed as our DO/DONT.
            willack: vec![
                (Echo, Ack::Do(false)),
                (SuppressGoAhead, Ack::Do(true)),
                (WindowSize, Ack::Do(false)),
                (TerminalType, Ack::Do(true)),
                (Linemode, Ack::Do(false)),
                (NewEnvironment, Ack::Do(true)),
            ],
            echo_enabled: true,
        }
    }

    fn find_local(&self, opt: TelnetOption) -> Option<bool> {
        self.local_will.iter().find(|(o, _)| *o == opt).map(|(_, v)| *v)
    }

    fn find_remote(&self, opt: TelnetOption) -> Option<bool> {
        self.remote_do.iter().find(|(o, _)| *o == opt).map(|(_, v)| *v)
    }

    fn set_local(&mut self, opt: TelnetOption, value: bool) {
        if let Some(slot) = self.local_will.iter_mut().find(|(o, _)| *o == opt) {
            slot.1 = value;
        } else {
            self.local_will.push((opt, value));
        }
    }

    fn set_remote(&mut self, opt: TelnetOption, value: bool) {
        if let Some(slot) = self.remote_do.iter_mut().find(|(o, _)| *o == opt) {
            slot.1 = value;
        } else {
            self.remote_do.push((opt, value));
        }
    }

    /// Declare ourselves WILL/WONT `opt`, suppressing the send if our recorded
    /// state already matches (spec.md §3 invariant: option tables converge).
    fn declare_will(&mut self, opt: TelnetOption, will: bool, out: &mut Vec<TelnetFrame>) {
        if self.find_local(opt) == Some(will) {
            return;
        }
        self.set_local(opt, will);
        out.push(if will {
            TelnetFrame::Will(opt)
        } else {
            TelnetFrame::Wont(opt)
        });
    }

    /// Demand DO/DONT `opt` of the peer, with the same suppression rule.
    fn demand_do(&mut self, opt: TelnetOption, do_: bool, out: &mut Vec<TelnetFrame>) {
        if self.find_remote(opt) == Some(do_) {
            return;
        }
        self.set_remote(opt, do_);
        out.push(if do_ {
            TelnetFrame::Do(opt)
        } else {
            TelnetFrame::Dont(opt)
        });
    }

    /// Emit the unsolicited handshake: every entry of `doack` as a WILL/WONT,
    /// then every entry of `willack` as a DO/DONT, in table order
    /// (spec.md §8 scenario 5 requires a stable, deterministic order).
    pub fn initial_frames(&mut self) -> Vec<TelnetFrame> {
        let mut out = Vec::new();
        for (opt, ack) in self.doack.clone() {
            if let Ack::Will(will) = ack {
                self.declare_will(opt, will, &mut out);
            }
        }
        for (opt, ack) in self.willack.clone() {
            if let Ack::Do(do_) = ack {
                self.demand_do(opt, do_, &mut out);
            }
        }
        out
    }

    pub fn echo_enabled(&self) -> bool {
        self.echo_enabled
    }

    /// Process one incoming negotiation frame. Returns the reply frame(s) to
    /// send (possibly empty) and an optional higher-level event.
    pub fn handle_frame(
        &mut self,
        frame: TelnetFrame,
    ) -> (Vec<TelnetFrame>, Option<NegotiationEvent>) {
        let mut out = Vec::new();
        let mut event = None;
        match frame {
            TelnetFrame::Will(opt) | TelnetFrame::Wont(opt) => {
                let will = matches!(frame, TelnetFrame::Will(_));
                let reply = self
                    .willack
                    .iter()
                    .find(|(o, _)| *o == opt)
                    .map(|(_, a)| *a)
                    .unwrap_or(Ack::Do(false));
                if let Ack::Do(do_) = reply {
                    self.demand_do(opt, do_, &mut out);
                }
                if will && opt == TelnetOption::TerminalType {
                    out.push(TelnetFrame::SubnegotiationRequest(TelnetOption::TerminalType));
                }
            }
            TelnetFrame::Do(opt) | TelnetFrame::Dont(opt) => {
                let do_ = matches!(frame, TelnetFrame::Do(_));
                let reply = self
                    .doack
                    .iter()
                    .find(|(o, _)| *o == opt)
                    .map(|(_, a)| *a)
                    .unwrap_or(Ack::Will(false));
                if let Ack::Will(will) = reply {
                    self.declare_will(opt, will, &mut out);
                }
                if opt == TelnetOption::Echo {
                    self.echo_enabled = do_;
                    event = Some(NegotiationEvent::EchoChanged(do_));
                }
            }
            TelnetFrame::Subnegotiation(opt, data) => {
                if opt == TelnetOption::TerminalType && data.first() == Some(&crate::consts::TTYPE_IS) {
                    let name = String::from_utf8_lossy(&data[1..]).to_string();
                    event = Some(NegotiationEvent::TerminalType(name));
                } else if opt == TelnetOption::WindowSize && data.len() >= 4 {
                    let width = u16::from_be_bytes([data[0], data[1]]);
                    let height = u16::from_be_bytes([data[2], data[3]]);
                    event = Some(NegotiationEvent::WindowSize { width, height });
                }
            }
            TelnetFrame::NoOperation => {
                out.push(TelnetFrame::NoOperation);
            }
            _ => {}
        }
        (out, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_handshake_order_is_stable() {
        let mut neg = OptionNegotiator::new();
        let frames = neg.initial_frames();
        assert_eq!(
            frames,
            vec![
                TelnetFrame::Will(TelnetOption::Echo),
                TelnetFrame::Will(TelnetOption::SuppressGoAhead),
                TelnetFrame::Wont(TelnetOption::NewEnvironment),
                TelnetFrame::Dont(TelnetOption::Echo),
                TelnetFrame::Do(TelnetOption::SuppressGoAhead),
                TelnetFrame::Dont(TelnetOption::WindowSize),
                TelnetFrame::Do(TelnetOption::TerminalType),
                TelnetFrame::Dont(TelnetOption::Linemode),
                TelnetFrame::Do(TelnetOption::NewEnvironment),
            ]
        );
    }

    #[test]
    fn duplicate_agreement_is_suppressed() {
        let mut neg = OptionNegotiator::new();
        let _ = neg.initial_frames();
        // Peer confirms what we already declared; no reply should be sent.
        let (replies, _) = neg.handle_frame(TelnetFrame::Do(TelnetOption::Echo));
        assert!(replies.is_empty());
    }

    #[test]
    fn will_ttype_triggers_subnegotiation_request() {
        let mut neg = OptionNegotiator::new();
        let _ = neg.initial_frames();
        let (replies, _) = neg.handle_frame(TelnetFrame::Will(TelnetOption::TerminalType));
        assert!(replies.contains(&TelnetFrame::SubnegotiationRequest(TelnetOption::TerminalType)));
    }

    #[test]
    fn ttype_subnegotiation_is_parsed() {
        let mut neg = OptionNegotiator::new();
        let mut payload = vec![crate::consts::TTYPE_IS];
        payload.extend_from_slice(b"ansi");
        let (_, event) = neg.handle_frame(TelnetFrame::Subnegotiation(TelnetOption::TerminalType, payload));
        assert_eq!(event, Some(NegotiationEvent::TerminalType("ansi".to_string())));
    }

    #[test]
    fn unknown_option_do_defaults_to_wont() {
        let mut neg = OptionNegotiator::new();
        let (replies, _) = neg.handle_frame(TelnetFrame::Do(TelnetOption::Unknown(200)));
        assert_eq!(replies, vec![TelnetFrame::Wont(TelnetOption::Unknown(200))]);
    }
}
