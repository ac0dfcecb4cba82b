//! Search terms and the filters the gateway hands to a store.

use regex::{Regex, RegexBuilder};

use shop_search_core::{SearchCollection, SearchRecord, ShopId};

use crate::error::SearchError;

/// Upper bound on the compiled matcher size.
const TERM_SIZE_LIMIT: usize = 1 << 20;

/// A free-text term compiled for case-insensitive substring matching.
///
/// The term is trimmed and matched literally: regex and `LIKE`
/// metacharacters have no special meaning. A blank term matches everything.
#[derive(Debug, Clone)]
pub struct SearchTerm {
    text: String,
    matcher: Option<Regex>,
}

impl SearchTerm {
    /// Compile a search term.
    ///
    /// # Errors
    ///
    /// Returns `SearchError::InvalidTerm` if the term is too large to compile.
    pub fn new(term: &str) -> Result<Self, SearchError> {
        let text = term.trim().to_string();
        if text.is_empty() {
            return Ok(Self {
                text,
                matcher: None,
            });
        }

        let matcher = RegexBuilder::new(&regex::escape(&text))
            .case_insensitive(true)
            .size_limit(TERM_SIZE_LIMIT)
            .build()
            .map_err(|e| SearchError::InvalidTerm(e.to_string()))?;

        Ok(Self {
            text,
            matcher: Some(matcher),
        })
    }

    /// The trimmed term.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn is_blank(&self) -> bool {
        self.matcher.is_none()
    }

    /// Whether `value` contains the term, ignoring case.
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        self.matcher.as_ref().is_none_or(|re| re.is_match(value))
    }

    /// An `ILIKE` pattern with `%`, `_` and `\` escaped, or `None` when blank.
    #[must_use]
    pub fn like_pattern(&self) -> Option<String> {
        if self.is_blank() {
            return None;
        }

        let mut pattern = String::with_capacity(self.text.len() + 2);
        pattern.push('%');
        for c in self.text.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        Some(pattern)
    }
}

/// Everything a store needs to select matching records.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    pub collection: SearchCollection,
    /// Records outside this shop never match.
    pub shop_id: ShopId,
    pub term: SearchTerm,
    /// Include products with `is_visible == false`.
    pub include_hidden: bool,
}

impl SearchFilter {
    /// Evaluate the filter against a record in memory.
    #[must_use]
    pub fn matches(&self, record: &SearchRecord) -> bool {
        record.collection() == self.collection
            && record.shop_id() == &self.shop_id
            && (self.include_hidden || record.is_visible())
            && (self.term.is_blank()
                || record
                    .matchable_values()
                    .into_iter()
                    .any(|value| self.term.matches(value)))
    }
}
