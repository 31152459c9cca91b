// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The video predicate: decides whether a message is a candidate video
//! and which match keywords apply.

use tracing::debug;

use vidsift_config::DedupConfig;
use vidsift_core::{CandidateVideo, ChatMessage};

use crate::normalize::normalized_name;

/// Keywords from `matches` that apply to this message, in input order and
/// original spelling. Empty when the message is not a candidate.
///
/// A message qualifies only when its media carries a document that the
/// protocol marks as video (flag or video attribute), its duration is
/// present and at least `min_duration_secs`, and no exclusion matches.
pub fn matched_keywords(
    msg: &ChatMessage,
    matches: &[String],
    exclusions: &[String],
    min_duration_secs: u32,
) -> Vec<String> {
    let Some(doc) = msg.media.document() else {
        return Vec::new();
    };
    if !doc.is_video() {
        return Vec::new();
    }
    let Some(duration) = doc.duration_secs else {
        return Vec::new();
    };
    if duration < min_duration_secs {
        debug!(
            msg_id = msg.id,
            duration, min_duration_secs, "video below minimum duration"
        );
        return Vec::new();
    }

    let file_name = doc.file_name.as_deref().unwrap_or_default();
    let caption_lower = msg.caption.to_lowercase();
    if should_exclude(&caption_lower, file_name, exclusions) {
        debug!(msg_id = msg.id, file_name, "excluded by keyword");
        return Vec::new();
    }

    let text = format!("{caption_lower} {}", file_name.to_lowercase());
    matches
        .iter()
        .filter(|keyword| {
            let needle = keyword.trim().to_lowercase();
            !needle.is_empty() && text.contains(&needle)
        })
        .cloned()
        .collect()
}

/// True when any non-empty exclusion occurs as a substring of the
/// caption-plus-filename text. Substring, not word boundary.
pub fn should_exclude(caption_lower: &str, file_name: &str, exclusions: &[String]) -> bool {
    let text = format!("{caption_lower} {}", file_name.to_lowercase());
    exclusions.iter().any(|exclusion| {
        let needle = exclusion.trim().to_lowercase();
        !needle.is_empty() && text.contains(&needle)
    })
}

/// Extract the full candidate metadata for a qualifying message.
///
/// Returns `None` when the message does not carry a video document with a
/// filename (callers run [`matched_keywords`] first, so this is the
/// missing-fields guard, not the policy gate).
pub fn extract_candidate(msg: &ChatMessage, dedup: &DedupConfig) -> Option<CandidateVideo> {
    let doc = msg.media.document()?;
    if !doc.is_video() {
        return None;
    }
    let file_name = doc.file_name.clone()?;
    Some(CandidateVideo {
        source_chat_id: msg.chat_id,
        source_message_id: msg.id,
        normalized_name: normalized_name(&file_name, dedup.normalize_filenames),
        duration_secs: doc.duration_secs,
        size_mb: doc.size_mb(),
        width: doc.width,
        height: doc.height,
        mime_type: doc.mime_type.clone(),
        caption_lower: msg.caption.to_lowercase(),
        file_name_lower: file_name.to_lowercase(),
        file_name,
    })
}
