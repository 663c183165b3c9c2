//! Subtitle and JSON renderings of the flat view.

use crate::types::FlatSegment;

pub fn to_json(segments: &[FlatSegment]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(segments)
}

/// SubRip: 1-based cue numbers and `,` as the decimal marker.
pub fn to_srt(segments: &[FlatSegment]) -> String {
    let mut output = Vec::new();
    for (i, segment) in segments.iter().enumerate() {
        output.push((i + 1).to_string());
        output.push(format!(
            "{} --> {}",
            segment.start.replace('.', ","),
            segment.end.replace('.', ",")
        ));
        output.push(segment.text.trim().to_string());
        output.push(String::new());
    }
    output.join("\n")
}

pub fn to_vtt(segments: &[FlatSegment]) -> String {
    let mut output = vec!["WEBVTT\n".to_string()];
    for segment in segments {
        output.push(format!("{} --> {}", segment.start, segment.end));
        output.push(segment.text.trim().to_string());
        output.push(String::new());
    }
    output.join("\n")
}
