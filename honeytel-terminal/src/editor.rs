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

//! The Line Editor (spec.md §4.C): turns a stream of cooked key events into
//! completed lines, with cursor movement, insertion, backspace/delete,
//! bounded history, and the ^C/^D/Enter sentinels the session orchestrator
//! relies on. Output bytes returned by [`LineEditor::feed`] are logical
//! payload bytes (a bare `\n` for newline) — callers push them through the
//! codec's [`honeytel_codec::encode_payload`] before writing to the socket,
//! so this crate never needs to know about IAC escaping.

use crate::terminfo::TermInfo;
use honeytel_codec::KeyCode;

const MAX_HISTORY: usize = 100;
const BACKSPACE_7F: u8 = 0x7F;
const BACKSPACE_08: u8 = 0x08;
const CTRL_C: u8 = 0x03;
const CTRL_D: u8 = 0x04;
const ENTER: u8 = 0x0A;

/// Outcome of a completed line (Enter, ^C, or ^D).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineResult {
    /// The committed text. Empty for an aborted line; the literal string
    /// `"QUIT"` for ^D on an empty buffer (spec.md §4.C).
    pub text: String,
    /// Set only for ^C: the session orchestrator must SIGINT the shell
    /// child's process group (spec.md §4.E step 4).
    pub interrupt: bool,
}

/// A single in-progress line being edited.
pub struct LineEditor {
    buffer: Vec<u8>,
    cursor: usize,
    echo: bool,
    use_history: bool,
    history: Vec<String>,
    history_cursor: Option<usize>,
    saved_current: Vec<u8>,
}

impl LineEditor {
    pub fn new() -> Self {
        LineEditor {
            buffer: Vec::new(),
            cursor: 0,
            echo: true,
            use_history: true,
            history: Vec::new(),
            history_cursor: None,
            saved_current: Vec::new(),
        }
    }

    /// Begin reading a new line. `echo` false is used for password prompts;
    /// `use_history` false for anything that shouldn't pollute history
    /// (notably the username and password prompts themselves).
    pub fn begin_line(&mut self, echo: bool, use_history: bool) {
        self.buffer.clear();
        self.cursor = 0;
        self.echo = echo;
        self.use_history = use_history;
        self.history_cursor = None;
        self.saved_current.clear();
    }

    /// Feed one cooked key event. Returns the bytes to echo to the client
    /// (empty if nothing should be echoed) and, if the line completed, the
    /// [`LineResult`].
    pub fn feed(&mut self, key: KeyCode, term: &dyn TermInfo) -> (Vec<u8>, Option<LineResult>) {
        match key {
            KeyCode::Byte(CTRL_C) => {
                let echoed = self.echo_bytes(b"^C ABORT\n");
                self.buffer.clear();
                self.cursor = 0;
                (
                    echoed,
                    Some(LineResult { text: String::new(), interrupt: true }),
                )
            }
            KeyCode::Byte(CTRL_D) => {
                if self.buffer.is_empty() {
                    let echoed = self.echo_bytes(b"^D QUIT\n");
                    (
                        echoed,
                        Some(LineResult { text: "QUIT".to_string(), interrupt: false }),
                    )
                } else {
                    let echoed = self.echo_bytes(b"^D ABORT (QUIT)\n");
                    self.buffer.clear();
                    self.cursor = 0;
                    (
                        echoed,
                        Some(LineResult { text: String::new(), interrupt: false }),
                    )
                }
            }
            KeyCode::Byte(ENTER) => {
                let text = String::from_utf8_lossy(&self.buffer).into_owned();
                if self.use_history && !text.is_empty() {
                    self.push_history(text.clone());
                }
                self.buffer.clear();
                self.cursor = 0;
                (b"\n".to_vec(), Some(LineResult { text, interrupt: false }))
            }
            KeyCode::Byte(b) if b == BACKSPACE_7F || b == BACKSPACE_08 => {
                (self.delete_left(term), None)
            }
            KeyCode::Delete => (self.delete_at_cursor(term), None),
            KeyCode::Left => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    (self.echo_bytes(term.cursor_left()), None)
                } else {
                    (self.bell(), None)
                }
            }
            KeyCode::Right => {
                if self.cursor < self.buffer.len() {
                    self.cursor += 1;
                    (self.echo_bytes(term.cursor_right()), None)
                } else {
                    (self.bell(), None)
                }
            }
            KeyCode::Up => (self.history_scroll(-1), None),
            KeyCode::Down => (self.history_scroll(1), None),
            KeyCode::Byte(b) if b < 0x20 => {
                let caret = [b'^', b + 0x40];
                (self.echo_bytes(&caret), None)
            }
            KeyCode::Byte(b) => (self.insert(b, term), None),
        }
    }

    fn bell(&self) -> Vec<u8> {
        if self.echo { vec![0x07] } else { Vec::new() }
    }

    fn echo_bytes(&self, bytes: &[u8]) -> Vec<u8> {
        if self.echo { bytes.to_vec() } else { Vec::new() }
    }

    fn insert(&mut self, b: u8, term: &dyn TermInfo) -> Vec<u8> {
        self.buffer.insert(self.cursor, b);
        self.cursor += 1;
        if !self.echo {
            return Vec::new();
        }
        let mut out = vec![b];
        let suffix = &self.buffer[self.cursor..];
        if suffix.is_empty() {
            return out;
        }
        out.extend_from_slice(suffix);
        for _ in 0..suffix.len() {
            out.extend_from_slice(term.cursor_left());
        }
        out
    }

    fn delete_left(&mut self, term: &dyn TermInfo) -> Vec<u8> {
        if self.cursor == 0 {
            return self.bell();
        }
        self.cursor -= 1;
        self.buffer.remove(self.cursor);
        self.redraw_from_cursor(term)
    }

    fn delete_at_cursor(&mut self, term: &dyn TermInfo) -> Vec<u8> {
        if self.cursor >= self.buffer.len() {
            return self.bell();
        }
        self.buffer.remove(self.cursor);
        self.redraw_from_cursor(term)
    }

    /// Redraw the tail of the line after a deletion: move left one cell,
    /// rewrite the remaining suffix, blank the now-stale trailing cell, and
    /// return the cursor to its logical position.
    fn redraw_from_cursor(&self, term: &dyn TermInfo) -> Vec<u8> {
        if !self.echo {
            return Vec::new();
        }
        let mut out = term.cursor_left().to_vec();
        let suffix = &self.buffer[self.cursor..];
        out.extend_from_slice(suffix);
        out.extend_from_slice(b" ");
        for _ in 0..suffix.len() + 1 {
            out.extend_from_slice(term.cursor_left());
        }
        out
    }

    fn push_history(&mut self, line: String) {
        self.history.push(line);
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
    }

    /// `direction` is -1 for UP (older), +1 for DOWN (newer). Restores the
    /// entire buffer from history, as spec.md §4.C requires.
    fn history_scroll(&mut self, direction: i32) -> Vec<u8> {
        if self.history.is_empty() {
            return self.bell();
        }
        let next_index = match (self.history_cursor, direction) {
            (None, -1) => Some(self.history.len() - 1),
            (None, 1) => return self.bell(),
            (Some(i), -1) => {
                if i == 0 {
                    return self.bell();
                }
                Some(i - 1)
            }
            (Some(i), 1) => {
                if i + 1 >= self.history.len() {
                    None
                } else {
                    Some(i + 1)
                }
            }
            _ => None,
        };

        if self.history_cursor.is_none() && direction == -1 {
            self.saved_current = self.buffer.clone();
        }

        let new_contents: Vec<u8> = match next_index {
            Some(i) => self.history[i].clone().into_bytes(),
            None => self.saved_current.clone(),
        };
        self.history_cursor = next_index;

        let erase = self.erase_current_line();
        self.buffer = new_contents;
        self.cursor = self.buffer.len();

        if !self.echo {
            return Vec::new();
        }
        let mut out = erase;
        out.extend_from_slice(&self.buffer);
        out
    }

    fn erase_current_line(&self) -> Vec<u8> {
        if !self.echo || self.cursor == 0 {
            return Vec::new();
        }
        let mut out = Vec::new();
        for _ in 0..self.cursor {
            out.push(BACKSPACE_08);
        }
        out
    }
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminfo::AnsiTermInfo;

    fn feed_str(editor: &mut LineEditor, s: &str, term: &dyn TermInfo) -> Option<LineResult> {
        let mut result = None;
        for b in s.bytes() {
            let (_, r) = editor.feed(KeyCode::Byte(b), term);
            if r.is_some() {
                result = r;
            }
        }
        result
    }

    #[test]
    fn simple_line_commits_on_enter() {
        let term = AnsiTermInfo;
        let mut editor = LineEditor::new();
        editor.begin_line(true, true);
        let result = feed_str(&mut editor, "uname -a\n", &term).unwrap();
        assert_eq!(result.text, "uname -a");
        assert!(!result.interrupt);
    }

    #[test]
    fn ctrl_c_aborts_and_signals_interrupt() {
        let term = AnsiTermInfo;
        let mut editor = LineEditor::new();
        editor.begin_line(true, true);
        feed_str(&mut editor, "sleep 60", &term);
        let (echo, result) = editor.feed(KeyCode::Byte(0x03), &term);
        let result = result.unwrap();
        assert_eq!(result.text, "");
        assert!(result.interrupt);
        assert_eq!(echo, b"^C ABORT\n");
    }

    #[test]
    fn ctrl_d_on_empty_line_returns_quit_sentinel() {
        let term = AnsiTermInfo;
        let mut editor = LineEditor::new();
        editor.begin_line(true, true);
        let (_, result) = editor.feed(KeyCode::Byte(0x04), &term);
        let result = result.unwrap();
        assert_eq!(result.text, "QUIT");
        assert!(!result.interrupt);
    }

    #[test]
    fn ctrl_d_on_nonempty_line_aborts_without_quit() {
        let term = AnsiTermInfo;
        let mut editor = LineEditor::new();
        editor.begin_line(true, true);
        feed_str(&mut editor, "partial", &term);
        let (_, result) = editor.feed(KeyCode::Byte(0x04), &term);
        let result = result.unwrap();
        assert_eq!(result.text, "");
        assert!(!result.interrupt);
    }

    #[test]
    fn password_entry_suppresses_echo_but_sends_newline() {
        let term = AnsiTermInfo;
        let mut editor = LineEditor::new();
        editor.begin_line(false, false);
        let (echo1, _) = editor.feed(KeyCode::Byte(b's'), &term);
        assert!(echo1.is_empty());
        let (echo2, result) = editor.feed(KeyCode::Byte(ENTER), &term);
        assert_eq!(echo2, b"\n");
        assert_eq!(result.unwrap().text, "s");
    }

    #[test]
    fn backspace_deletes_left_and_bells_at_start() {
        let term = AnsiTermInfo;
        let mut editor = LineEditor::new();
        editor.begin_line(true, true);
        let (bell, _) = editor.feed(KeyCode::Byte(BACKSPACE_7F), &term);
        assert_eq!(bell, vec![0x07]);
        feed_str(&mut editor, "ab", &term);
        editor.feed(KeyCode::Byte(BACKSPACE_7F), &term);
        let (_, result) = editor.feed(KeyCode::Byte(ENTER), &term);
        assert_eq!(result.unwrap().text, "a");
    }

    #[test]
    fn history_up_restores_previous_line() {
        let term = AnsiTermInfo;
        let mut editor = LineEditor::new();
        editor.begin_line(true, true);
        feed_str(&mut editor, "first\n", &term);
        editor.begin_line(true, true);
        editor.feed(KeyCode::Up, &term);
        let (_, result) = editor.feed(KeyCode::Byte(ENTER), &term);
        assert_eq!(result.unwrap().text, "first");
    }

    #[test]
    fn left_at_start_of_line_bells() {
        let term = AnsiTermInfo;
        let mut editor = LineEditor::new();
        editor.begin_line(true, true);
        let (echo, _) = editor.feed(KeyCode::Left, &term);
        assert_eq!(echo, vec![0x07]);
    }

    #[test]
    fn control_byte_renders_caret_notation() {
        let term = AnsiTermInfo;
        let mut editor = LineEditor::new();
        editor.begin_line(true, true);
        let (echo, _) = editor.feed(KeyCode::Byte(0x01), &term);
        assert_eq!(echo, b"^A");
    }
}
