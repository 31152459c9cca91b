// SPDX-FileCopyrightText: 2026 Vidsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The duplicate oracle: decides whether a candidate video is already
//! present in a topic, under a configurable multi-criterion policy.
//!
//! Three paths, evaluated in order against the topic's stored rows (in
//! insertion order):
//!
//! 1. exact normalized-name match, with every enabled metadata check
//!    required to pass independently;
//! 2. near-name match via a weighted prefix + character-set Jaccard
//!    similarity (threshold 0.85), same check rule, only when at least
//!    one metadata check is enabled;
//! 3. metadata-only fallback over the whole topic, only when the first
//!    two paths produced nothing and at least one check is enabled.
//!
//! The similarity metric is deliberately not a standard edit distance; it
//! is tuned to the truncated-filename failure mode and must not be
//! replaced with Levenshtein or trigram similarity.

use std::collections::HashSet;

use tracing::debug;

use vidsift_config::DedupConfig;
use vidsift_core::{CandidateVideo, DocumentMedia, VidsiftError};
use vidsift_storage::{ProcessedVideo, Store};

/// Near-name acceptance threshold.
const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Minimum length ratio below which two names are never similar.
const LENGTH_RATIO_FLOOR: f64 = 0.7;

/// Duplicate decision procedure over the persistent store.
#[derive(Clone)]
pub struct DuplicateOracle {
    policy: DedupConfig,
}

impl DuplicateOracle {
    pub fn new(policy: DedupConfig) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DedupConfig {
        &self.policy
    }

    /// First stored row that duplicates `candidate` in `topic`, if any.
    pub async fn find_similar(
        &self,
        store: &Store,
        candidate: &CandidateVideo,
        topic: &str,
    ) -> Result<Option<ProcessedVideo>, VidsiftError> {
        Ok(self.find_all_similar(store, candidate, topic).await?.into_iter().next())
    }

    /// Every stored row that duplicates `candidate` in `topic`.
    pub async fn find_all_similar(
        &self,
        store: &Store,
        candidate: &CandidateVideo,
        topic: &str,
    ) -> Result<Vec<ProcessedVideo>, VidsiftError> {
        let rows = store.videos_in_topic(topic).await?;
        let mut hits: Vec<ProcessedVideo> = Vec::new();
        let mut hit_ids: HashSet<i64> = HashSet::new();

        // Exact-name path. Empty names never match each other.
        if !candidate.normalized_name.is_empty() {
            for row in &rows {
                if row.normalized_name == candidate.normalized_name
                    && self.checks_pass(candidate, row)
                    && hit_ids.insert(row.id)
                {
                    debug!(
                        name = candidate.normalized_name.as_str(),
                        topic, row_id = row.id, "duplicate: exact name"
                    );
                    hits.push(row.clone());
                }
            }
        }

        // Near-name path, only meaningful with a metadata check enabled.
        if self.policy.any_check_enabled() {
            for row in &rows {
                if hit_ids.contains(&row.id) {
                    continue;
                }
                let score = similarity(&candidate.normalized_name, &row.normalized_name);
                if score >= SIMILARITY_THRESHOLD
                    && self.checks_pass(candidate, row)
                    && hit_ids.insert(row.id)
                {
                    debug!(
                        name = candidate.normalized_name.as_str(),
                        row_name = row.normalized_name.as_str(),
                        score,
                        topic,
                        "duplicate: near name"
                    );
                    hits.push(row.clone());
                }
            }
        }

        // Metadata-only fallback, only when nothing matched by name.
        if hits.is_empty() && self.policy.any_check_enabled() {
            for row in &rows {
                if self.checks_pass(candidate, row) {
                    debug!(
                        name = candidate.normalized_name.as_str(),
                        row_name = row.normalized_name.as_str(),
                        topic,
                        "duplicate: metadata only"
                    );
                    hits.push(row.clone());
                }
            }
        }

        Ok(hits)
    }

    /// Every enabled metadata check must pass independently; a check with
    /// missing data on either side fails.
    fn checks_pass(&self, candidate: &CandidateVideo, row: &ProcessedVideo) -> bool {
        if self.policy.check_duration {
            let (Some(a), Some(b)) = (candidate.duration_secs, row.duration_secs) else {
                return false;
            };
            if (i64::from(a) - i64::from(b)).unsigned_abs()
                > u64::from(self.policy.duration_tolerance_secs)
            {
                return false;
            }
        }
        if self.policy.check_file_size {
            let Some(b) = row.size_mb else {
                return false;
            };
            if !within_percent(candidate.size_mb, b, self.policy.file_size_tolerance_percent) {
                return false;
            }
        }
        if self.policy.check_resolution {
            let (Some(w1), Some(h1), Some(w2), Some(h2)) =
                (candidate.width, candidate.height, row.width, row.height)
            else {
                return false;
            };
            let area_a = f64::from(w1) * f64::from(h1);
            let area_b = f64::from(w2) * f64::from(h2);
            if !within_percent(area_a, area_b, self.policy.resolution_tolerance_percent) {
                return false;
            }
        }
        if self.policy.check_mime_type {
            let (Some(a), Some(b)) = (candidate.mime_type.as_deref(), row.mime_type.as_deref())
            else {
                return false;
            };
            if !a.eq_ignore_ascii_case(b) {
                return false;
            }
        }
        true
    }

    /// Apply the enabled metadata checks between a destination message's
    /// document and a stored row; used when matching cached destination
    /// messages for duplicate deletion.
    pub fn doc_matches_row(&self, doc: &DocumentMedia, row: &ProcessedVideo) -> bool {
        if self.policy.check_duration {
            let (Some(a), Some(b)) = (doc.duration_secs, row.duration_secs) else {
                return false;
            };
            if (i64::from(a) - i64::from(b)).unsigned_abs()
                > u64::from(self.policy.duration_tolerance_secs)
            {
                return false;
            }
        }
        if self.policy.check_file_size {
            let Some(b) = row.size_mb else {
                return false;
            };
            if !within_percent(doc.size_mb(), b, self.policy.file_size_tolerance_percent) {
                return false;
            }
        }
        if self.policy.check_resolution {
            let (Some(w1), Some(h1), Some(w2), Some(h2)) = (doc.width, doc.height, row.width, row.height)
            else {
                return false;
            };
            if !within_percent(
                f64::from(w1) * f64::from(h1),
                f64::from(w2) * f64::from(h2),
                self.policy.resolution_tolerance_percent,
            ) {
                return false;
            }
        }
        if self.policy.check_mime_type {
            let (Some(a), Some(b)) = (doc.mime_type.as_deref(), row.mime_type.as_deref()) else {
                return false;
            };
            if !a.eq_ignore_ascii_case(b) {
                return false;
            }
        }
        true
    }
}

/// Relative difference within `pct` percent of the larger value. Two
/// zeroes are equal by definition.
fn within_percent(a: f64, b: f64, pct: f64) -> bool {
    let max = a.max(b);
    if max <= 0.0 {
        return true;
    }
    (a - b).abs() / max * 100.0 <= pct
}

/// String similarity between two normalized names.
///
/// equal → 1.0; length ratio < 0.7 → 0.0; containment → length ratio;
/// otherwise 0.7·(common prefix / max len) + 0.3·jaccard(char sets).
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    let ratio = len_a.min(len_b) as f64 / len_a.max(len_b) as f64;
    if ratio < LENGTH_RATIO_FLOOR {
        return 0.0;
    }
    if a.contains(b) || b.contains(a) {
        return ratio;
    }

    let prefix = a
        .chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count();
    let prefix_score = prefix as f64 / len_a.max(len_b) as f64;

    let set_a: HashSet<char> = a.chars().collect();
    let set_b: HashSet<char> = b.chars().collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    let jaccard = if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    };

    0.7 * prefix_score + 0.3 * jaccard
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use vidsift_config::StorageConfig;
    use vidsift_core::ChatId;
    use vidsift_storage::NewProcessedVideo;

    async fn store() -> (Store, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let config = StorageConfig {
            data_dir: dir.path().to_string_lossy().to_string(),
        };
        (Store::open(&config).await.unwrap(), dir)
    }

    fn candidate(name: &str, duration: Option<u32>, size_mb: f64) -> CandidateVideo {
        CandidateVideo {
            source_chat_id: ChatId(-100),
            source_message_id: 1,
            file_name: format!("{name}.mp4"),
            normalized_name: name.to_string(),
            duration_secs: duration,
            size_mb,
            width: Some(1920),
            height: Some(1080),
            mime_type: Some("video/mp4".to_string()),
            caption_lower: String::new(),
            file_name_lower: format!("{name}.mp4"),
        }
    }

    fn row(name: &str, topic: &str, duration: Option<u32>, size_mb: Option<f64>) -> NewProcessedVideo {
        NewProcessedVideo {
            file_name: format!("{name}.mp4"),
            normalized_name: name.to_string(),
            topic_name: topic.to_string(),
            duration_secs: duration,
            size_mb,
            width: Some(1920),
            height: Some(1080),
            mime_type: Some("video/mp4".to_string()),
        }
    }

    #[test]
    fn similarity_equal_is_one() {
        assert_eq!(similarity("fookeyword", "fookeyword"), 1.0);
    }

    #[test]
    fn similarity_empty_never_matches() {
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn similarity_short_against_long_is_zero() {
        // Length ratio 3/10 < 0.7.
        assert_eq!(similarity("abc", "abcdefghij"), 0.0);
    }

    #[test]
    fn similarity_containment_is_length_ratio() {
        // "videoname" contains "videonam", ratio 8/9.
        let score = similarity("videonam", "videoname");
        assert!((score - 8.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn similarity_weighted_prefix_and_jaccard() {
        // Same length, shared prefix "abcdefg" (7 of 8), then diverge.
        let a = "abcdefgh";
        let b = "abcdefgx";
        let prefix_score = 7.0 / 8.0;
        let jaccard = 7.0 / 9.0; // 7 shared chars of 9 distinct
        let expected = 0.7 * prefix_score + 0.3 * jaccard;
        assert!((similarity(a, b) - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn exact_name_without_checks_is_duplicate() {
        let (store, _dir) = store().await;
        store.put_video(&row("samplekeyword", "keyword", Some(600), Some(120.0)))
            .await
            .unwrap();

        let oracle = DuplicateOracle::new(DedupConfig::default());
        let hit = oracle
            .find_similar(&store, &candidate("samplekeyword", Some(600), 120.0), "keyword")
            .await
            .unwrap();
        assert!(hit.is_some());
    }

    #[tokio::test]
    async fn different_topic_is_not_duplicate() {
        let (store, _dir) = store().await;
        store.put_video(&row("samplekeyword", "other", Some(600), Some(120.0)))
            .await
            .unwrap();

        let oracle = DuplicateOracle::new(DedupConfig::default());
        let hit = oracle
            .find_similar(&store, &candidate("samplekeyword", Some(600), 120.0), "keyword")
            .await
            .unwrap();
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn wildcard_topic_rows_count_as_duplicates() {
        let (store, _dir) = store().await;
        store.put_video(&row("samplekeyword", "*", Some(600), Some(120.0)))
            .await
            .unwrap();

        let oracle = DuplicateOracle::new(DedupConfig::default());
        let hit = oracle
            .find_similar(&store, &candidate("samplekeyword", Some(600), 120.0), "keyword")
            .await
            .unwrap();
        assert!(hit.is_some());
    }

    #[tokio::test]
    async fn enabled_check_rejects_out_of_tolerance_duration() {
        let (store, _dir) = store().await;
        store.put_video(&row("samplekeyword", "keyword", Some(600), Some(120.0)))
            .await
            .unwrap();

        let policy = DedupConfig {
            check_duration: true,
            duration_tolerance_secs: 30,
            ..DedupConfig::default()
        };
        let oracle = DuplicateOracle::new(policy);

        // 631 is 31 seconds away: out of tolerance.
        let miss = oracle
            .find_similar(&store, &candidate("samplekeyword", Some(631), 120.0), "keyword")
            .await
            .unwrap();
        assert!(miss.is_none());

        // 605 is within 30 seconds.
        let hit = oracle
            .find_similar(&store, &candidate("samplekeyword", Some(605), 120.0), "keyword")
            .await
            .unwrap();
        assert!(hit.is_some());
    }

    #[tokio::test]
    async fn enabled_check_with_missing_data_rejects_row() {
        let (store, _dir) = store().await;
        store.put_video(&row("samplekeyword", "keyword", None, Some(120.0)))
            .await
            .unwrap();

        let policy = DedupConfig {
            check_duration: true,
            ..DedupConfig::default()
        };
        let oracle = DuplicateOracle::new(policy);
        let hit = oracle
            .find_similar(&store, &candidate("samplekeyword", Some(600), 120.0), "keyword")
            .await
            .unwrap();
        // Exact-name path rejects; metadata fallback also requires the
        // duration on both sides.
        assert!(hit.is_none());
    }

    #[tokio::test]
    async fn near_name_requires_an_enabled_check() {
        let (store, _dir) = store().await;
        // Truncated variant of the same name: contained, ratio ≥ 0.85.
        store.put_video(&row("verylongvideoname", "keyword", Some(600), Some(120.0)))
            .await
            .unwrap();

        let cand = candidate("verylongvideonam", Some(600), 120.0);

        let no_checks = DuplicateOracle::new(DedupConfig::default());
        assert!(no_checks
            .find_similar(&store, &cand, "keyword")
            .await
            .unwrap()
            .is_none());

        let with_check = DuplicateOracle::new(DedupConfig {
            check_duration: true,
            ..DedupConfig::default()
        });
        assert!(with_check
            .find_similar(&store, &cand, "keyword")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn metadata_only_fallback_ignores_names() {
        let (store, _dir) = store().await;
        store.put_video(&row("completelydifferent", "keyword", Some(600), Some(120.0)))
            .await
            .unwrap();

        let policy = DedupConfig {
            check_duration: true,
            check_file_size: true,
            ..DedupConfig::default()
        };
        let oracle = DuplicateOracle::new(policy);
        let hit = oracle
            .find_similar(&store, &candidate("unrelatedname", Some(605), 121.0), "keyword")
            .await
            .unwrap();
        assert!(hit.is_some());
    }

    #[tokio::test]
    async fn adding_a_check_never_creates_duplicates_given_one_check() {
        let (store, _dir) = store().await;
        store.put_video(&row("samplekeyword", "keyword", Some(600), Some(200.0)))
            .await
            .unwrap();

        let cand = candidate("samplekeyword", Some(605), 120.0);

        let duration_only = DuplicateOracle::new(DedupConfig {
            check_duration: true,
            ..DedupConfig::default()
        });
        assert!(duration_only
            .find_similar(&store, &cand, "keyword")
            .await
            .unwrap()
            .is_some());

        // Size is far outside 5%: the stricter policy flips nothing from
        // not-duplicate to duplicate, it only rejects.
        let duration_and_size = DuplicateOracle::new(DedupConfig {
            check_duration: true,
            check_file_size: true,
            ..DedupConfig::default()
        });
        assert!(duration_and_size
            .find_similar(&store, &cand, "keyword")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn find_all_returns_rows_in_insertion_order() {
        let (store, _dir) = store().await;
        store.put_video(&row("samplekeyword", "*", Some(600), Some(120.0)))
            .await
            .unwrap();
        store.put_video(&row("samplekeyword", "keyword", Some(602), Some(120.5)))
            .await
            .unwrap();

        let oracle = DuplicateOracle::new(DedupConfig::default());
        let hits = oracle
            .find_all_similar(&store, &candidate("samplekeyword", Some(600), 120.0), "keyword")
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].topic_name, "*");
        assert_eq!(hits[1].topic_name, "keyword");
    }

    #[tokio::test]
    async fn empty_normalized_names_never_match() {
        let (store, _dir) = store().await;
        store.put_video(&row("", "keyword", Some(600), Some(120.0)))
            .await
            .unwrap();

        let oracle = DuplicateOracle::new(DedupConfig::default());
        let hit = oracle
            .find_similar(&store, &candidate("", Some(600), 120.0), "keyword")
            .await
            .unwrap();
        assert!(hit.is_none());
    }

    #[test]
    fn within_percent_uses_larger_side() {
        assert!(within_percent(100.0, 105.0, 5.0));
        assert!(!within_percent(100.0, 106.0, 5.0));
        assert!(within_percent(0.0, 0.0, 5.0));
    }

    #[test]
    fn doc_matches_row_applies_enabled_checks() {
        let oracle = DuplicateOracle::new(DedupConfig {
            check_duration: true,
            duration_tolerance_secs: 30,
            ..DedupConfig::default()
        });
        let doc = DocumentMedia {
            duration_secs: Some(600),
            ..DocumentMedia::default()
        };
        let stored = ProcessedVideo {
            id: 1,
            file_name: "x.mp4".to_string(),
            normalized_name: "x".to_string(),
            topic_name: "keyword".to_string(),
            duration_secs: Some(620),
            size_mb: None,
            width: None,
            height: None,
            mime_type: None,
            processed_at: String::new(),
        };
        assert!(oracle.doc_matches_row(&doc, &stored));

        let far = ProcessedVideo {
            duration_secs: Some(700),
            ..stored
        };
        assert!(!oracle.doc_matches_row(&doc, &far));
    }
}
