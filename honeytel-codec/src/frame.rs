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

//! Wire-level Telnet frames produced by the decoder and consumed by the encoder.

use crate::event::KeyCode;
use crate::options::TelnetOption;

/// One decoded unit of the Telnet byte stream: either a single cooked data
/// byte (already CR/LF-cooked, IAC-unescaped), a symbolic key decoded from an
/// ANSI escape sequence, or a command/negotiation frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelnetFrame {
    /// A single payload byte, already cooked.
    Data(u8),
    /// A symbolic key (arrow keys, delete) decoded from an escape sequence.
    KeyPress(KeyCode),
    NoOperation,
    DataMark,
    Break,
    InterruptProcess,
    AbortOutput,
    AreYouThere,
    EraseCharacter,
    EraseLine,
    GoAhead,
    Will(TelnetOption),
    Wont(TelnetOption),
    Do(TelnetOption),
    Dont(TelnetOption),
    /// A fully accumulated `IAC SB opt ... IAC SE` block with its payload.
    Subnegotiation(TelnetOption, Vec<u8>),
    /// Synthetic frame the negotiator emits to ask for `IAC SB <opt> SEND IAC SE`.
    SubnegotiationRequest(TelnetOption),
}
