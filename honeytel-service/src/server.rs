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

//! The Server Loop (spec.md §4.H): bind once, accept forever, one
//! [`Session`] task per connection. No connection limit, no draining on
//! shutdown — the process exits immediately on SIGINT (spec.md: "not a
//! general-purpose, production-hardened server").

use crate::auth::AuthCallback;
use crate::config::HoneypotConfig;
use crate::error::ServiceError;
use crate::logger::LogSink;
use crate::retrieve::Retriever;
use crate::rewriter::OutputRewriter;
use crate::session::Session;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Everything a [`Session`] needs, bundled once at startup and cloned (cheaply,
/// via `Arc`) into every accepted connection.
pub struct TelnetServer {
    config: Arc<HoneypotConfig>,
    rewriter: Arc<OutputRewriter>,
    auth: Arc<dyn AuthCallback>,
    retriever: Arc<dyn Retriever>,
    logger: Arc<LogSink>,
    welcome: Arc<str>,
    listener: TcpListener,
}

impl TelnetServer {
    #[allow(clippy::too_many_arguments)]
    pub async fn bind(
        config: Arc<HoneypotConfig>,
        rewriter: Arc<OutputRewriter>,
        auth: Arc<dyn AuthCallback>,
        retriever: Arc<dyn Retriever>,
        logger: Arc<LogSink>,
        welcome: Arc<str>,
    ) -> Result<Self, ServiceError> {
        let addr = format!("{}:{}", config.listen_address, config.listen_port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(%addr, "honeytel listening");
        Ok(TelnetServer { config, rewriter, auth, retriever, logger, welcome, listener })
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever, spawning one [`Session`] task per
    /// connection. A failed `accept()` is logged and retried (spec.md §7:
    /// Recoverable), never fatal to the listener itself.
    pub async fn run(self) -> Result<(), ServiceError> {
        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    continue;
                }
            };
            tracing::debug!(%peer, "accepted connection");
            let session = Session::new(
                self.config.clone(),
                self.rewriter.clone(),
                self.auth.clone(),
                self.retriever.clone(),
                self.logger.clone(),
                self.welcome.clone(),
                peer,
            );
            tokio::spawn(session.run(socket));
        }
    }
}
