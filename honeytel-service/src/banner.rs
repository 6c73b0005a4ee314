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

//! Startup-fatal checks (spec.md §6/§7): BusyBox banner capture, the chroot
//! heuristic, and the real hostname the Output Rewriter needs to mask. These
//! run once, synchronously, before the server loop starts.

use crate::error::ServiceError;
use regex::Regex;
use std::sync::OnceLock;

fn banner_paren_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r".+\)").unwrap())
}

/// Runs `/bin/busybox` with no arguments and captures its first line of
/// output, which (per spec.md §4.F) starts with `BusyBox vX.Y.Z (...)`.
/// Startup-fatal if the binary is missing (spec.md: "If BusyBox is
/// unavailable, startup fails").
pub fn capture_busybox_banner() -> Result<String, ServiceError> {
    let output = std::process::Command::new("/bin/busybox")
        .output()
        .map_err(|e| ServiceError::BusyboxMissing(e.to_string()))?;
    let combined = if !output.stdout.is_empty() { &output.stdout } else { &output.stderr };
    let first_line = String::from_utf8_lossy(combined)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string();
    if first_line.is_empty() {
        return Err(ServiceError::BusyboxMissing(
            "busybox produced no banner output".to_string(),
        ));
    }
    Ok(first_line)
}

/// The welcome banner written after a successful login (spec.md §4.F): the
/// captured banner line (trimmed to its `.+\)` match, dropping any trailing
/// "multi-call binary." text) with `" built-in shell (ash)"` appended, plus
/// the help hint line.
pub fn synthesize_welcome(captured_banner: &str) -> String {
    let trimmed = banner_paren_regex()
        .find(captured_banner)
        .map(|m| m.as_str())
        .unwrap_or(captured_banner);
    format!("{trimmed} built-in shell (ash)\nEnter 'help' for a list of built-in commands.\n")
}

/// The chroot heuristic (spec.md §6 `check_chroot`): refuse to start if `/`'s
/// inode number isn't 2, a proxy for "we are inside a jail" (real roots are
/// almost always inode 2; a bind-mounted or chrooted `/` usually isn't).
#[cfg(unix)]
pub fn check_chroot() -> Result<(), ServiceError> {
    use std::os::unix::fs::MetadataExt;
    let meta = std::fs::metadata("/").map_err(ServiceError::Io)?;
    if meta.ino() != 2 {
        return Err(ServiceError::ChrootCheckFailed);
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn check_chroot() -> Result<(), ServiceError> {
    Err(ServiceError::ChrootCheckFailed)
}

/// The real hostname, masked by the Output Rewriter (spec.md §4.F).
pub fn real_hostname() -> String {
    match hostname_via_libc() {
        Some(name) if !name.is_empty() => name,
        _ => String::new(),
    }
}

#[cfg(unix)]
fn hostname_via_libc() -> Option<String> {
    let mut buf = vec![0u8; 256];
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if rc != 0 {
        return None;
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Some(String::from_utf8_lossy(&buf[..end]).into_owned())
}

#[cfg(not(unix))]
fn hostname_via_libc() -> Option<String> {
    None
}

/// Ensures the samples directory exists and is writable (spec.md §7:
/// "unwritable... samples" is startup-fatal).
pub fn ensure_samples_dir(path: &std::path::Path) -> Result<(), ServiceError> {
    std::fs::create_dir_all(path)
        .map_err(|e| ServiceError::SamplesDirUnwritable(e.to_string()))?;
    let probe = path.join(".honeytel-write-check");
    std::fs::write(&probe, b"").map_err(|e| ServiceError::SamplesDirUnwritable(e.to_string()))?;
    let _ = std::fs::remove_file(&probe);
    Ok(())
}
