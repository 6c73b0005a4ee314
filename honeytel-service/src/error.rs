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

//! Service-layer error taxonomy (spec.md §7), realized as one `thiserror`
//! enum wrapping the lower crates' errors plus the session/startup failure
//! modes specific to this layer.

use honeytel_codec::CodecError;
use honeytel_terminal::TerminalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("telnet codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("terminal error: {0}")]
    Terminal(#[from] TerminalError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("configuration file is not valid TOML: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("chroot check failed: root inode is not 2")]
    ChrootCheckFailed,

    #[error("busybox is not available: {0}")]
    BusyboxMissing(String),

    #[error("samples directory is not writable: {0}")]
    SamplesDirUnwritable(String),

    #[error("failed to spawn shell child: {0}")]
    SpawnFailed(String),

    #[error("client closed the connection")]
    ConnectionClosed,
}

impl ServiceError {
    /// Startup-fatal per spec.md §7: print a `[!]`-prefixed message and exit
    /// non-zero rather than starting the server loop.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            ServiceError::ChrootCheckFailed
                | ServiceError::BusyboxMissing(_)
                | ServiceError::SamplesDirUnwritable(_)
                | ServiceError::Config(_)
                | ServiceError::ConfigParse(_)
        )
    }

    /// Session-fatal per spec.md §7: end this session only, log
    /// `SESSION_END`, and let the server continue accepting others.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            ServiceError::ConnectionClosed | ServiceError::Io(_) | ServiceError::SpawnFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_fatal_classification() {
        assert!(ServiceError::ChrootCheckFailed.is_startup_fatal());
        assert!(ServiceError::BusyboxMissing("missing".to_string()).is_startup_fatal());
        assert!(!ServiceError::ConnectionClosed.is_startup_fatal());
    }

    #[test]
    fn session_fatal_classification() {
        assert!(ServiceError::ConnectionClosed.is_session_fatal());
        assert!(!ServiceError::ChrootCheckFailed.is_session_fatal());
    }
}
