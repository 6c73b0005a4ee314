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

//! The cooked event stream handed to callers above the codec: never raw IAC
//! framing, only user-visible bytes, symbolic keys, and negotiation results
//! (spec.md §3 invariant: "the cooked queue never contains raw IAC framing").

use crate::options::NegotiationEvent;

/// A symbolic key decoded from an ANSI/terminal escape sequence, or a literal byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    Byte(u8),
    Up,
    Down,
    Left,
    Right,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelnetEvent {
    Key(KeyCode),
    Negotiation(NegotiationEvent),
    /// The peer closed the connection (or the socket errored, treated as EOF).
    Eof,
}
