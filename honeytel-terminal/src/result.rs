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

use thiserror::Error;

pub type TerminalResult<T> = Result<T, TerminalError>;

/// Terminal-layer errors. All Recoverable per spec.md §7: an unrecognised
/// escape sequence is treated as literal bytes by the codec layer already, so
/// in practice this crate only ever surfaces encoding-adjacent failures.
#[derive(Debug, Error)]
pub enum TerminalError {
    #[error("line buffer exceeded maximum length")]
    LineTooLong,
}
