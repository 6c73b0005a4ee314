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

//! The Output Rewriter (spec.md §4.F): an ordered table of byte-substring
//! replacements applied to every chunk written to the client, so the
//! attacker sees a BusyBox/MIPS device instead of this host.

use crate::config::HoneypotConfig;

/// Longest-match-first architecture tokens `uname -a` prints, mapped to a
/// single fake architecture string (spec.md §4.F). Order matters: the triple
/// and double repeats of `x86_64` must be replaced before the lone token, or
/// the lone-token entry would partially clobber them first.
const ARCH_TOKENS: &[&str] = &[
    "x86_64 x86_64 x86_64",
    "x86_64 x86_64",
    "x86_64",
    "i686",
    "i386",
    "amd64",
];

/// An ordered, deterministic substring-replacement table (spec.md §3
/// `ReplacementTable`). A `Vec`, not a `HashMap`: iteration order is part of
/// the contract (overlapping replacements are history-dependent).
#[derive(Debug, Clone, Default)]
pub struct OutputRewriter {
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl OutputRewriter {
    pub fn new() -> Self {
        OutputRewriter { entries: Vec::new() }
    }

    pub fn push(&mut self, from: impl Into<Vec<u8>>, to: impl Into<Vec<u8>>) {
        self.entries.push((from.into(), to.into()));
    }

    /// Build the default table spec.md §4.F specifies: real hostname, distro
    /// name, architecture tokens, and the BusyBox startup banner.
    pub fn with_defaults(config: &HoneypotConfig, real_hostname: &str, busybox_banner: Option<&str>) -> Self {
        let mut rewriter = OutputRewriter::new();
        if !real_hostname.is_empty() {
            rewriter.push(real_hostname, config.fake_hostname.clone());
        }
        rewriter.push("Ubuntu", "Debian");
        for token in ARCH_TOKENS {
            rewriter.push(*token, config.fake_architecture.clone());
        }
        if let Some(banner) = busybox_banner {
            rewriter.push(banner, config.busybox_fake_banner.clone());
            if let Some(paren) = banner.rfind(')') {
                rewriter.push(&banner[..=paren], config.busybox_fake_banner.clone());
            }
        }
        for extra in &config.replacements {
            rewriter.push(extra.from.clone(), extra.to.clone());
        }
        rewriter
    }

    /// Apply every entry in table order, one left-to-right scan each
    /// (spec.md §8 invariant 6: every byte passes through the table exactly
    /// once, in the same deterministic order).
    pub fn apply(&self, input: &[u8]) -> Vec<u8> {
        let mut data = input.to_vec();
        for (from, to) in &self.entries {
            data = replace_bytes(&data, from, to);
        }
        data
    }
}

fn replace_bytes(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    if from.is_empty() {
        return haystack.to_vec();
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_hostname_and_distro() {
        let mut rewriter = OutputRewriter::new();
        rewriter.push("realbox", "prodigy");
        rewriter.push("Ubuntu", "Debian");
        let out = rewriter.apply(b"realbox running Ubuntu 20.04");
        assert_eq!(out, b"prodigy running Debian 20.04");
    }

    #[test]
    fn triple_x86_64_collapses_to_single_mips_each() {
        let mut rewriter = OutputRewriter::new();
        for token in ARCH_TOKENS {
            rewriter.push(*token, "MIPS");
        }
        let out = rewriter.apply(b"Linux box 5.4.0 x86_64 x86_64 x86_64 x86_64 GNU/Linux");
        assert_eq!(out, b"Linux box 5.4.0 MIPS MIPS GNU/Linux");
    }

    #[test]
    fn order_is_deterministic_across_runs() {
        let config = HoneypotConfig::default();
        let r1 = OutputRewriter::with_defaults(&config, "realhost", None);
        let r2 = OutputRewriter::with_defaults(&config, "realhost", None);
        assert_eq!(r1.entries, r2.entries);
    }

    #[test]
    fn busybox_banner_and_date_stripped_variant_both_replaced() {
        let config = HoneypotConfig::default();
        let banner = "BusyBox v1.22.1 (Debian 1:1.22.0-9+deb8u1) multi-call binary.";
        let rewriter = OutputRewriter::with_defaults(&config, "", Some(banner));
        let out = rewriter.apply(banner.as_bytes());
        assert_eq!(out, config.busybox_fake_banner.as_bytes());
        let truncated = &banner[..banner.rfind(')').unwrap() + 1];
        let out2 = rewriter.apply(truncated.as_bytes());
        assert_eq!(out2, config.busybox_fake_banner.as_bytes());
    }
}
