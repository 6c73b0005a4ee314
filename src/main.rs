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

//! The `honeytel` binary: loads configuration, runs startup-fatal checks,
//! then hands off to the server loop.

use honeytel_service::{
    banner, build_welcome, config::HoneypotConfig, server::TelnetServer, HttpRetriever, LogSink,
    OutputRewriter, ServiceError, StaticCredentials,
};
use std::path::PathBuf;
use std::sync::Arc;

fn config_path() -> PathBuf {
    std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("honeytel.toml"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        eprintln!("[!] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ServiceError> {
    let config = Arc::new(HoneypotConfig::load(&config_path())?);

    if config.check_chroot {
        banner::check_chroot()?;
    }

    let captured_banner = if config.use_busybox {
        Some(banner::capture_busybox_banner()?)
    } else {
        None
    };

    banner::ensure_samples_dir(&config.samples_dir)?;

    let real_hostname = banner::real_hostname();
    let rewriter = Arc::new(OutputRewriter::with_defaults(&config, &real_hostname, captured_banner.as_deref()));
    let welcome = build_welcome(captured_banner.as_deref());
    let auth = Arc::new(StaticCredentials::new(config.auth_username.clone(), config.auth_password.clone()));
    let retriever = Arc::new(HttpRetriever::new());
    let logger = Arc::new(LogSink::new(config.log_path.clone()));

    let server = TelnetServer::bind(config, rewriter, auth, retriever, logger, welcome).await?;
    server.run().await
}
