use std::fmt::Write;

use super::ClassifiedError;

const RECOVERABLE_CLOSING: &str = "Follow the suggestions above to resolve the issue.";
const ESCALATE_CLOSING: &str =
    "This error may need attention from support. Include the details above when reporting it.";

/// Render a classified error for terminal output.
pub fn user_friendly_message(error: &ClassifiedError) -> String {
    let mut out = String::new();
    out.push_str(&error.message);
    out.push_str("\n\n");

    if !error.suggestions.is_empty() {
        out.push_str("Suggestions:\n");
        for (i, suggestion) in error.suggestions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, suggestion);
        }
        out.push('\n');
    }

    out.push_str(if error.recoverable {
        RECOVERABLE_CLOSING
    } else {
        ESCALATE_CLOSING
    });
    out
}
