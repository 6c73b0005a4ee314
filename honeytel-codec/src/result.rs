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

use std::fmt;

pub type CodecResult<T> = Result<T, CodecError>;

/// Codec-level errors. All of these are Recoverable per spec.md §7: the
/// session logs nothing client-visible and either drops the offending frame
/// or ends quietly.
#[derive(Debug)]
pub enum CodecError {
    Io(std::io::Error),
    /// A subnegotiation block exceeded the buffer cap without an `IAC SE`.
    SubnegotiationTooLarge,
    /// A command byte following `IAC` was not recognized.
    UnknownCommand(u8),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Io(e) => write!(f, "i/o error: {e}"),
            CodecError::SubnegotiationTooLarge => write!(f, "subnegotiation buffer overflow"),
            CodecError::UnknownCommand(b) => write!(f, "unknown telnet command byte {b:#04x}"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<std::io::Error> for CodecError {
    fn from(e: std::io::Error) -> Self {
        CodecError::Io(e)
    }
}
