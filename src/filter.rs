// Lexical profanity filter.
//
// A case-insensitive substring match against a fixed multi-script term
// list (ASCII, romanized Urdu/Hindi, and Urdu script). Operators can extend
// the list through GROUPGUARD_EXTRA_TERMS; the built-in terms always apply.

/// Built-in terms. Stored lowercase.
pub const DEFAULT_TERMS: &[&str] = &[
    "g***",
    "s***",
    "b***",
    "fuck",
    "shit",
    "gali",
    "lanat",
    "haram",
    "chutiya",
    "kutte",
    "madarchod",
    "گالی",
    "حرام",
    "گالی دینا",
];

#[derive(Debug, Clone)]
pub struct ProfanityFilter {
    terms: Vec<String>,
}

impl Default for ProfanityFilter {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl ProfanityFilter {
    /// Build a filter from the built-in list plus `extra` terms.
    /// Blank extra terms are ignored (they would match everything).
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut terms: Vec<String> = DEFAULT_TERMS.iter().map(|t| t.to_string()).collect();
        for term in extra {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }
        Self { terms }
    }

    /// Whether `text` contains any configured term, ignoring case.
    pub fn is_flagged(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();
        self.terms.iter().any(|t| lowered.contains(t.as_str()))
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}
