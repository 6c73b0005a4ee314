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

//! The attacker-facing append-only log (spec.md §4.G). Distinct from the
//! operator-facing `tracing` output: this is the forensic record, one line
//! per `LogRecord`, format `[time] [ip:port] TAG[: detail]`.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An append-only log sink at a fixed path, mode 0644 on creation. Writes are
/// a single `write()` call per record (spec.md §4.G: lines are short, well
/// under `PIPE_BUF`, so concurrent appenders never interleave a partial
/// line). Lazily (re)opened: if the file has been removed since the last
/// write, the next write recreates it.
pub struct LogSink {
    path: PathBuf,
    handle: Mutex<Option<File>>,
}

impl LogSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LogSink { path: path.into(), handle: Mutex::new(None) }
    }

    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut guard = self.handle.lock().expect("log mutex poisoned");
        if guard.is_none() || !self.path.exists() {
            *guard = Some(self.open()?);
        }
        let file = guard.as_mut().expect("log handle just opened");
        file.write_all(line.as_bytes())
    }

    fn open(&self) -> std::io::Result<File> {
        let mut options = OpenOptions::new();
        options.append(true).create(true);
        #[cfg(unix)]
        options.mode(0o644);
        options.open(&self.path)
    }

    fn record(&self, peer: SocketAddr, tag: &str, detail: Option<&str>) {
        let now = chrono::Local::now().format(TIME_FORMAT);
        let line = match detail {
            // A literal newline inside `detail` would split one LogRecord
            // into two, violating spec.md §8 invariant 5; collapse it.
            Some(detail) => format!(
                "[{now}] [{}:{}] {tag}: {}\n",
                peer.ip(),
                peer.port(),
                detail.replace(['\n', '\r'], " ")
            ),
            None => format!("[{now}] [{}:{}] {tag}\n", peer.ip(), peer.port()),
        };
        if let Err(e) = self.write_line(&line) {
            tracing::warn!(error = %e, path = %self.path.display(), "failed to write honeypot log line");
        }
    }

    pub fn session_start(&self, peer: SocketAddr) {
        self.record(peer, "SESSION_START", None);
    }

    pub fn session_end(&self, peer: SocketAddr) {
        self.record(peer, "SESSION_END", None);
    }

    pub fn auth(&self, peer: SocketAddr, user: Option<&str>, pass: Option<&str>) {
        let detail = format!("{}:{}", user.unwrap_or(""), pass.unwrap_or(""));
        self.record(peer, "AUTH", Some(&detail));
    }

    pub fn cmd(&self, peer: SocketAddr, line: &str) {
        self.record(peer, "CMD", Some(line));
    }

    pub fn sample(&self, peer: SocketAddr, destination: &Path) {
        self.record(peer, "SAMPLE", Some(&destination.display().to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn peer() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 12345)
    }

    #[test]
    fn record_matches_expected_regex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("honeytel.log");
        let sink = LogSink::new(&path);
        sink.session_start(peer());
        sink.auth(peer(), Some("root"), Some("123456"));
        sink.cmd(peer(), "uname -a");
        sink.session_end(peer());

        let content = std::fs::read_to_string(&path).unwrap();
        let re = regex::Regex::new(r"^\[[^\]]+\] \[[^\]]+:\d+\] [A-Z_]+(: .*)?$").unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        for line in &lines {
            assert!(re.is_match(line), "line did not match expected format: {line}");
        }
        assert!(lines[1].ends_with("AUTH: root:123456"));
        assert!(lines[2].ends_with("CMD: uname -a"));
    }

    #[test]
    fn embedded_newline_in_detail_stays_single_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("honeytel.log");
        let sink = LogSink::new(&path);
        sink.cmd(peer(), "echo a\necho b");
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn file_is_created_with_mode_0644() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("honeytel.log");
        let sink = LogSink::new(&path);
        sink.session_start(peer());
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn recreates_file_if_removed_between_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("honeytel.log");
        let sink = LogSink::new(&path);
        sink.session_start(peer());
        std::fs::remove_file(&path).unwrap();
        sink.session_end(peer());
        assert!(path.exists());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }
}
