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

//! The honeypot service layer: configuration, authentication, the session
//! orchestrator, output deception, logging, and the server accept loop. Sits
//! on top of `honeytel-codec` and `honeytel-terminal`, which know nothing
//! about shells, credentials, or deception.

pub mod auth;
pub mod banner;
pub mod config;
pub mod error;
pub mod logger;
pub mod retrieve;
pub mod rewriter;
pub mod server;
pub mod session;

pub use auth::{AuthCallback, StaticCredentials};
pub use config::{HoneypotConfig, ReplacementEntry};
pub use error::ServiceError;
pub use logger::LogSink;
pub use retrieve::{HttpRetriever, Retriever};
pub use rewriter::OutputRewriter;
pub use server::TelnetServer;
pub use session::{build_welcome, Session};
