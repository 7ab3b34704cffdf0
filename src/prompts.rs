//! Default prompts for chunk summarization and consolidation.
//!
//! The defaults produce Indonesian bullet-point summaries. All of them can be
//! replaced through the `[summarizer]` table of the configuration file.

/// System prompt sent with every summarization request.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "Kamu adalah asisten yang ahli dalam meringkas dokumen panjang.";

/// Instruction placed before the chunk text in the user message.
pub const DEFAULT_SUMMARY_PROMPT: &str =
    "Ringkas teks berikut menjadi poin-poin utama dengan bahasa mudah:";

/// Instruction for the optional second pass over the joined partial summaries.
pub const DEFAULT_CONSOLIDATION_PROMPT: &str = r#"Berikut adalah beberapa ringkasan bagian dari satu dokumen yang sama.
Gabungkan menjadi satu ringkasan akhir yang utuh:
- Hilangkan poin yang berulang
- Pertahankan urutan pembahasan dokumen
- Gunakan poin-poin dengan bahasa mudah"#;

/// Build the user message from an instruction and the text to summarize.
pub fn user_message(instruction: &str, text: &str) -> String {
    format!("{}\n\n{}", instruction.trim_end(), text)
}
