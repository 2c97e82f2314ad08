//! Transcription-similarity clustering of takes.
//!
//! Repeated takes of the same line rarely transcribe identically, so
//! membership is decided by normalised Levenshtein distance over the
//! lower-cased, trimmed texts rather than equality.

use crate::core::model::{Group, Segment};
use log::debug;

/// Levenshtein edit distance over characters, two-row dynamic programming.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            current[j + 1] = substitution.min(prev[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

/// Similarity in [0, 1] between two transcriptions.
///
/// Texts are trimmed and lower-cased first. Two empty texts are fully
/// similar, exactly one empty text is fully dissimilar.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    1.0 - levenshtein(&a, &b) as f64 / max_len as f64
}

/// Cluster segments into take groups by greedy single-pass similarity.
///
/// Each unused segment seeds a group and absorbs every later unused
/// segment whose text similarity reaches `threshold`. Group ids follow
/// creation order, which is the detection order of the earliest member.
pub fn group_segments(segments: &[Segment], threshold: f64) -> Vec<Group> {
    let mut used = vec![false; segments.len()];
    let mut groups: Vec<Group> = Vec::new();

    for i in 0..segments.len() {
        if used[i] {
            continue;
        }
        used[i] = true;
        let mut members = vec![i];
        for j in (i + 1)..segments.len() {
            if used[j] {
                continue;
            }
            if similarity(segments[i].text(), segments[j].text()) >= threshold {
                used[j] = true;
                members.push(j);
            }
        }

        // Longest member text; ties keep the earliest take.
        let mut text_summary = "";
        for &m in &members {
            let text = segments[m].text();
            if text.chars().count() > text_summary.chars().count() {
                text_summary = text;
            }
        }
        let text_summary = text_summary.to_string();

        groups.push(Group {
            group_id: groups.len(),
            members,
            text_summary,
        });
    }

    debug!(
        "grouped {} segment(s) into {} group(s)",
        segments.len(),
        groups.len()
    );
    groups
}
