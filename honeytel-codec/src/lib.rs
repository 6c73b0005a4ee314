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

#![warn(missing_debug_implementations)]

//! Telnet IAC framing, CR/LF cooking, ANSI cursor-key decoding, and option
//! negotiation. This crate is the lowest layer of the honeypot: it knows
//! nothing about authentication, shells, or logging, only the wire protocol.

pub mod consts;
mod codec;
mod event;
mod frame;
mod options;
mod result;

pub use codec::{encode_payload, TelnetCodec};
pub use event::{KeyCode, TelnetEvent};
pub use frame::TelnetFrame;
pub use options::{Ack, NegotiationEvent, OptionNegotiator, TelnetOption};
pub use result::{CodecError, CodecResult};
