// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Utility functions for summarizing decode results

use std::collections::BTreeMap;

use crate::results::Detection;

/// Simple pluralization for common COCO class names.
#[must_use]
pub fn pluralize(word: &str) -> String {
    match word {
        "person" => "persons".to_string(),
        "bus" => "buses".to_string(),
        "knife" => "knives".to_string(),
        "mouse" => "mice".to_string(),
        "sheep" => "sheep".to_string(),
        "skis" => "skis".to_string(),
        _ => {
            if word.ends_with('s') || word.ends_with("ch") || word.ends_with("sh") {
                format!("{word}es")
            } else if word.ends_with('y') && !word.ends_with("ey") && !word.ends_with("ay") {
                format!("{}ies", &word[..word.len() - 1])
            } else {
                format!("{word}s")
            }
        }
    }
}

/// Count detections per class and format as summary string (e.g., "4 persons, 1 bus").
///
/// Classes are listed in ascending `class_id` order. Returns an empty string
/// when there are no detections.
#[must_use]
pub fn format_class_counts(detections: &[Detection]) -> String {
    let mut counts: BTreeMap<usize, (&'static str, usize)> = BTreeMap::new();
    for det in detections {
        counts.entry(det.class_id).or_insert((det.name(), 0)).1 += 1;
    }

    let parts: Vec<String> = counts
        .values()
        .map(|&(class_name, count)| {
            let name = if count > 1 {
                pluralize(class_name)
            } else {
                class_name.to_string()
            };
            format!("{count} {name}")
        })
        .collect();

    parts.join(", ")
}
