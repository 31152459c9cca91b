// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filename normalization for duplicate comparison.
//!
//! Release filenames for the same video differ in quality tags, codec
//! tags, separators and casing. `normalize` canonicalizes all of that
//! away so `(normalized name, topic)` can serve as the dedup key. The
//! result is a comparison key only; it is not reversible.

use std::sync::LazyLock;

use regex::Regex;

static EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(mp4|mkv|avi|mov|wmv|flv|webm)$").unwrap());

static RESOLUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\[({]?\b(\d{3,4}p|\d+k|uhd|fhd|hd|sd)\b[\])}]?").unwrap()
});

static CODEC_AUDIO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\[({]?\b(x264|x265|hevc|h264|h265|avc|av1|aac|ac3|dts|mp3|flac)\b[\])}]?")
        .unwrap()
});

static RELEASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\[({](rss|web-dl|hdtv|bluray|brrip|webrip)[\])}]").unwrap());

static DOMAIN_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.(xxx|com|net|org)([ _\-.]|$)").unwrap());

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ _\-.]+").unwrap());

static NON_ALNUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9 ]").unwrap());

/// Canonicalize a filename into its dedup comparison key.
///
/// The result may be empty (e.g. a filename made entirely of stripped
/// tokens); callers must never treat two empty keys as equal.
pub fn normalize(filename: &str) -> String {
    let s = filename.to_lowercase();
    let s = EXTENSION.replace(&s, "");
    let s = RESOLUTION.replace_all(&s, "");
    let s = CODEC_AUDIO.replace_all(&s, "");
    let s = RELEASE.replace_all(&s, "");
    let s = DOMAIN_SUFFIX.replace_all(&s, "$2");
    let s = SEPARATORS.replace_all(&s, " ");
    let s = NON_ALNUM.replace_all(&s, "");
    s.replace(' ', "")
}

/// Derive the dedup key for a filename under the configured policy.
///
/// With normalization disabled the key is the lowercased filename
/// verbatim, no token stripping.
pub fn normalized_name(filename: &str, normalize_filenames: bool) -> String {
    if normalize_filenames {
        normalize(filename)
    } else {
        filename.to_lowercase()
    }
}
