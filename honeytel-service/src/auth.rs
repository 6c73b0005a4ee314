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

//! The Authenticator's credential-check collaborator (spec.md §4.D). The
//! prompting, retry loop, and logging live in [`crate::session::Session`];
//! this trait isolates only the pass/fail decision so tests can substitute
//! it without driving a real socket.

use async_trait::async_trait;

/// Default prompts (spec.md §4.D step 1/2), matching the retrieved
/// `telnetsrvlib.py` defaults (`PROMPT_USER`, `PROMPT_PASS`).
pub const PROMPT_USER: &str = "Username: ";
pub const PROMPT_PASS: &str = "Password: ";

/// Decides whether a (username, password) attempt authenticates. Called
/// regardless of outcome — logging every attempt is the session's job, not
/// this trait's (spec.md §4.D: "The callback logs every attempt... regardless
/// of outcome").
#[async_trait]
pub trait AuthCallback: Send + Sync {
    async fn check(&self, username: Option<&str>, password: Option<&str>) -> bool;
}

/// The honeypot's actual policy: a fixed, configured (username, password)
/// pair, compared by equality (spec.md §6 `auth_username`/`auth_password`).
/// A `None` side of the pair means that prompt was never asked, so a
/// matching `None` attempt value is required too.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    username: Option<String>,
    password: Option<String>,
}

impl StaticCredentials {
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        StaticCredentials { username, password }
    }

    pub fn needs_username(&self) -> bool {
        self.username.is_some()
    }

    pub fn needs_password(&self) -> bool {
        self.password.is_some()
    }
}

#[async_trait]
impl AuthCallback for StaticCredentials {
    async fn check(&self, username: Option<&str>, password: Option<&str>) -> bool {
        username == self.username.as_deref() && password == self.password.as_deref()
    }
}
