// ============================================================
// Layer 4 — Transcription Preprocessor
// ============================================================
// Repairs systematic artefacts left behind by the people who
// transcribed the corpora.
//
// The transcribers tokenised punctuation and wrote quotes in
// their own shorthand, e.g.
//   ,,Hello , world ! ,,   →   "Hello, world!"
//   they do n ' t know     →   they don't know
//
// Repair steps (applied in order, once per transcription):
//   1. Ordered substring replacements (REPLACEMENTS below)
//   2. Strip the space after a leading quote and before a
//      trailing quote, for both " and '
//
// The table is part of the corpus contract: text files that were
// produced by an earlier run must come out identical, so it must
// never be reordered or "improved".
//
// Reference: Rust Book §8 (Strings in Rust)

/// Substring replacements, applied in this exact order.
const REPLACEMENTS: &[(&str, &str)] = &[
    (",,", "\""),
    ("`", "'"),
    (" ,", ","),
    (" .", "."),
    (" !", "!"),
    (" ?", "?"),
    (" )", ")"),
    ("( ", "("),
    (" :", ":"),
    ("n ' t", "n't"),
    (" ' s ", "'s "),
];

pub struct Preprocessor;

impl Preprocessor {
    /// Create a new Preprocessor instance
    pub fn new() -> Self {
        Self
    }

    /// Undo annotation artefacts in one transcription.
    /// Logs the repaired line when anything changed.
    pub fn clean(&self, line: &str) -> String {
        // ── Step 1: Ordered replacements ──────────────────────────────────────
        let mut after = REPLACEMENTS
            .iter()
            .fold(line.to_string(), |text, (from, to)| text.replace(from, to));

        // ── Step 2: Quotes hugging the ends of the line ───────────────────────
        for quote in ["\"", "'"] {
            let opening = format!("{quote} ");
            if let Some(rest) = after.strip_prefix(&opening) {
                after = format!("{quote}{rest}");
            }

            let closing = format!(" {quote}");
            if let Some(rest) = after.strip_suffix(&closing) {
                after = format!("{rest}{quote}");
            }
        }

        if after != line {
            tracing::debug!("Cleaned line: {}", after);
        }
        after
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_comma_is_a_quote() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(",,Hello , world ! ,,"), "\"Hello, world!\"");
    }

    #[test]
    fn test_contractions() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("they do n ' t know"), "they don't know");
        assert_eq!(p.clean("the dog ' s bone"), "the dog's bone");
    }

    #[test]
    fn test_brackets_and_colons() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("see ( below ) :"), "see (below):");
    }

    #[test]
    fn test_backtick_becomes_apostrophe() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("`tis"), "'tis");
    }

    #[test]
    fn test_single_quotes_at_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("' quoted '"), "'quoted'");
    }

    #[test]
    fn test_clean_text_unchanged() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("Nothing to fix here."), "Nothing to fix here.");
        assert_eq!(p.clean(""), "");
    }
}
