use std::fmt;

/// A cache key before normalization.
///
/// Variants are tried in a fixed priority order: an explicit string is used
/// verbatim, a custom canonical identifier wins over generic stringification,
/// and sequences normalize element by element so that structurally different
/// composite keys can never collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheKey {
    /// Used verbatim.
    Str(String),
    /// A canonical identifier provided by the application object itself.
    Custom(String),
    /// An ordered composite key; elements are normalized recursively.
    Seq(Vec<CacheKey>),
    /// Fallback for anything else, holding its generic string representation.
    Other(String),
}

impl CacheKey {
    pub fn custom(id: impl Into<String>) -> Self {
        CacheKey::Custom(id.into())
    }

    pub fn other(value: impl ToString) -> Self {
        CacheKey::Other(value.to_string())
    }

    /// Collapses the key into the canonical string stored in the table.
    pub fn normalize(&self) -> String {
        match self {
            CacheKey::Str(s) => s.clone(),
            CacheKey::Custom(id) => id.clone(),
            CacheKey::Seq(elements) => elements
                .iter()
                .map(|element| escape_element(&element.normalize()))
                .collect::<Vec<_>>()
                .join("/"),
            CacheKey::Other(s) => s.clone(),
        }
    }
}

// Escapes the join separator (and the escape character itself) inside a
// sequence element, so ["a/b"] and ["a", "b"] stay distinct keys.
fn escape_element(element: &str) -> String {
    element.replace('%', "%25").replace('/', "%2F")
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalize())
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        CacheKey::Str(value.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        CacheKey::Str(value)
    }
}

impl From<&String> for CacheKey {
    fn from(value: &String) -> Self {
        CacheKey::Str(value.clone())
    }
}

impl From<Vec<CacheKey>> for CacheKey {
    fn from(value: Vec<CacheKey>) -> Self {
        CacheKey::Seq(value)
    }
}

impl From<Vec<&str>> for CacheKey {
    fn from(value: Vec<&str>) -> Self {
        CacheKey::Seq(value.into_iter().map(CacheKey::from).collect())
    }
}

impl From<Vec<String>> for CacheKey {
    fn from(value: Vec<String>) -> Self {
        CacheKey::Seq(value.into_iter().map(CacheKey::from).collect())
    }
}

impl From<u64> for CacheKey {
    fn from(value: u64) -> Self {
        CacheKey::Other(value.to_string())
    }
}

impl From<i64> for CacheKey {
    fn from(value: i64) -> Self {
        CacheKey::Other(value.to_string())
    }
}

impl From<u32> for CacheKey {
    fn from(value: u32) -> Self {
        CacheKey::Other(value.to_string())
    }
}

impl From<i32> for CacheKey {
    fn from(value: i32) -> Self {
        CacheKey::Other(value.to_string())
    }
}
