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

//! Honeypot configuration (spec.md §6): a single TOML file deserialized into
//! [`HoneypotConfig`], whose fields are exactly the configuration options
//! spec.md's "Configuration" section lists.

use crate::error::ServiceError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_max_auth_attempts() -> usize {
    3
}
fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}
fn default_listen_port() -> u16 {
    23
}
fn default_true() -> bool {
    true
}
fn default_log_path() -> PathBuf {
    PathBuf::from("/var/log/honeytel.log")
}
fn default_samples_dir() -> PathBuf {
    PathBuf::from("/var/log/honeytel_samples")
}
fn default_fake_hostname() -> String {
    "prodigy".to_string()
}
fn default_fake_architecture() -> String {
    "MIPS".to_string()
}
fn default_busybox_fake_banner() -> String {
    "BusyBox v1.18.4 (2012-04-17 18:58:31 CST)".to_string()
}

/// One entry of the "extra substitutions" the operator can add on top of the
/// built-in deception table (spec.md §6 `replacements`). A `Vec` rather than a
/// map, because ordering is load-bearing (spec.md §3: `ReplacementTable`
/// iteration order must be deterministic).
#[derive(Debug, Clone, Deserialize)]
pub struct ReplacementEntry {
    pub from: String,
    pub to: String,
}

/// Configuration recognized by the honeypot (spec.md §6). Deserialized from a
/// single TOML file; every field not present in the file falls back to the
/// documented default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HoneypotConfig {
    pub auth_username: Option<String>,
    pub auth_password: Option<String>,
    #[serde(default = "default_max_auth_attempts")]
    pub max_auth_attempts: usize,
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_true")]
    pub use_busybox: bool,
    #[serde(default = "default_true")]
    pub check_chroot: bool,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    #[serde(default = "default_samples_dir")]
    pub samples_dir: PathBuf,
    #[serde(default = "default_fake_hostname")]
    pub fake_hostname: String,
    #[serde(default = "default_fake_architecture")]
    pub fake_architecture: String,
    #[serde(default = "default_busybox_fake_banner")]
    pub busybox_fake_banner: String,
    pub replacements: Vec<ReplacementEntry>,
}

impl Default for HoneypotConfig {
    fn default() -> Self {
        HoneypotConfig {
            auth_username: Some("root".to_string()),
            auth_password: Some("123456".to_string()),
            max_auth_attempts: default_max_auth_attempts(),
            listen_address: default_listen_address(),
            listen_port: default_listen_port(),
            use_busybox: true,
            check_chroot: true,
            log_path: default_log_path(),
            samples_dir: default_samples_dir(),
            fake_hostname: default_fake_hostname(),
            fake_architecture: default_fake_architecture(),
            busybox_fake_banner: default_busybox_fake_banner(),
            replacements: Vec::new(),
        }
    }
}

impl HoneypotConfig {
    /// Load configuration from a TOML file. Missing files fall back to
    /// [`HoneypotConfig::default`] — the configuration file itself is not one
    /// of spec.md's startup-fatal conditions.
    pub fn load(path: &Path) -> Result<Self, ServiceError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let config: HoneypotConfig = toml::from_str(&text)?;
                config.validate()?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(ServiceError::Io(e)),
        }
    }

    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.max_auth_attempts == 0 {
            return Err(ServiceError::Config(
                "max_auth_attempts must be greater than 0".to_string(),
            ));
        }
        if self.listen_port == 0 {
            return Err(ServiceError::Config(
                "listen_port must be nonzero".to_string(),
            ));
        }
        Ok(())
    }

    /// The shell program and argv the session orchestrator spawns (spec.md
    /// §4.E step 2 / §6 `use_busybox`).
    pub fn shell_command(&self) -> (&'static str, &'static [&'static str]) {
        if self.use_busybox {
            ("/bin/busybox", &["sh"])
        } else {
            ("/bin/bash", &[])
        }
    }

    /// A human-readable label for the shell, used to strip the
    /// `"<SHELL>: line <N>: "` prefix from child stdout (spec.md §4.E step f).
    pub fn shell_label(&self) -> String {
        let (program, args) = self.shell_command();
        if args.is_empty() {
            program.to_string()
        } else {
            format!("{program} {}", args.join(" "))
        }
    }
}
