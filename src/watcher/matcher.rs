//! Case-insensitive keyword matching.

/// A keyword set compiled for case-insensitive substring search.
///
/// Keywords are lowercased once and kept in configuration order with
/// duplicates removed, so evaluation order is stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
}

impl KeywordMatcher {
    /// Compile a keyword set. Empty keywords are dropped.
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lowered: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().to_lowercase();
            if !keyword.is_empty() && !lowered.contains(&keyword) {
                lowered.push(keyword);
            }
        }
        Self { keywords: lowered }
    }

    /// Return the first keyword contained in `line`, if any.
    #[must_use]
    pub fn find(&self, line: &str) -> Option<&str> {
        if self.keywords.is_empty() {
            return None;
        }
        let line = line.to_lowercase();
        self.keywords
            .iter()
            .find(|k| line.contains(k.as_str()))
            .map(String::as_str)
    }

    /// Whether `line` contains any keyword.
    #[must_use]
    pub fn is_match(&self, line: &str) -> bool {
        self.find(line).is_some()
    }

    /// Whether the set has no keywords.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}
