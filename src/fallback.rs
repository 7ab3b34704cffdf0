//! Offline summarizer used when no model can be reached.

/// Marker placed at the top of every locally produced summary.
pub const LOCAL_SUMMARY_MARKER: &str = "[Ringkasan lokal - bukan hasil model AI]";

/// Number of leading sentences kept by the local summarizer.
pub const LOCAL_SUMMARY_SENTENCES: usize = 5;

/// Summarize `text` without any network access.
///
/// Sentences are the trimmed, non-empty pieces between `.` characters. Text
/// with fewer than six sentences is returned unchanged; otherwise the first
/// five are joined with `". "`. The result always starts with
/// [`LOCAL_SUMMARY_MARKER`].
pub fn local_summary(text: &str) -> String {
    format!("{}\n{}", LOCAL_SUMMARY_MARKER, leading_sentences(text))
}

fn leading_sentences(text: &str) -> String {
    let sentences: Vec<&str> = text
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if sentences.len() <= LOCAL_SUMMARY_SENTENCES {
        return text.to_string();
    }

    sentences[..LOCAL_SUMMARY_SENTENCES].join(". ")
}
