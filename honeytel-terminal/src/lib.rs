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

//! The Line Editor and its terminal-capability collaborator (spec.md §4.C, §6).

mod editor;
mod result;
mod terminfo;

pub use editor::{LineEditor, LineResult};
pub use result::{TerminalError, TerminalResult};
pub use terminfo::{AnsiTermInfo, TermInfo};
