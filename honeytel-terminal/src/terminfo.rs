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

//! The terminal-info collaborator named in spec.md §6: capability strings for
//! `el` (clear to end of line), `dch1` (delete character), `ich1` (insert
//! character), `cub1` (cursor left) and `cuf1` (cursor right). A full
//! terminfo database is unnecessary here — the honeypot only ever drives the
//! `"ansi"` terminal type, so a single hardcoded implementation suffices.

/// Resolves the handful of capability strings the line editor needs to redraw
/// the current line after an edit.
pub trait TermInfo: Send + Sync {
    fn clear_to_eol(&self) -> &[u8];
    fn delete_char(&self) -> &[u8];
    fn insert_char(&self) -> &[u8];
    fn cursor_left(&self) -> &[u8];
    fn cursor_right(&self) -> &[u8];
}

/// ANSI X3.64 escape sequences for the five capabilities above.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnsiTermInfo;

impl TermInfo for AnsiTermInfo {
    fn clear_to_eol(&self) -> &[u8] {
        b"\x1b[K"
    }
    fn delete_char(&self) -> &[u8] {
        b"\x1b[P"
    }
    fn insert_char(&self) -> &[u8] {
        b"\x1b[@"
    }
    fn cursor_left(&self) -> &[u8] {
        b"\x1b[D"
    }
    fn cursor_right(&self) -> &[u8] {
        b"\x1b[C"
    }
}
