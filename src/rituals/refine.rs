//! Feedback-driven script refinement.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Feedback {
    /// 1–5 rating; missing counts as 0.
    pub rating: i64,
    pub comments: String,
}

const LOW_RATING: i64 = 2;

/// Append improvement hints derived from `feedback` to `script`.
pub fn refine_script(script: &str, feedback: &Feedback) -> String {
    let comments = feedback.comments.to_lowercase();
    let mut hints = Vec::new();

    if feedback.rating <= LOW_RATING {
        hints.push("# ⚠️ Suggestion: Add error handling or break down logic");
    }
    if comments.contains("doc") {
        hints.push("# 📚 Add inline documentation or usage comments");
    }
    if comments.contains("perf") || comments.contains("slow") {
        hints.push("# ⚡ Consider optimizing loop or I/O operations");
    }
    if comments.contains("security") {
        hints.push("# 🔐 Add input validation or sanitize user input");
    }

    format!("{script}\n\n{}", hints.join("\n"))
}
