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

//! The URL retriever external collaborator (spec.md §6): `retrieve(url) ->
//! local_path | none`, best-effort, must never raise (spec.md §7: a
//! retrieval failure is Recoverable — swallow it silently).

use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, url: &str) -> Option<PathBuf>;
}

/// The real collaborator: downloads the URL with `reqwest` into a temporary
/// file. The session orchestrator (spec.md §4.E step d) then MD5s that file
/// and moves it into the samples directory.
pub struct HttpRetriever {
    client: reqwest::Client,
}

impl HttpRetriever {
    pub fn new() -> Self {
        HttpRetriever { client: reqwest::Client::new() }
    }
}

impl Default for HttpRetriever {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, url: &str) -> Option<PathBuf> {
        let response = self.client.get(url).send().await.ok()?;
        let bytes = response.bytes().await.ok()?;
        let file = tempfile::NamedTempFile::new().ok()?;
        tokio::fs::write(file.path(), &bytes).await.ok()?;
        let (_, path) = file.keep().ok()?;
        Some(path)
    }
}
