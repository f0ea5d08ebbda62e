use serde::Deserialize;

/// Column classification a compiler is built with.
///
/// An empty list behaves exactly like an unset one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Rule {
    /// Fields searched by a bare term, in order.
    #[serde(default)]
    pub any_of: Vec<String>,
    /// Fields compared by substring regex instead of equality.
    #[serde(default)]
    pub is_string: Vec<String>,
    /// Fields that accept `NOW`, relative and absolute dates.
    #[serde(default)]
    pub is_date: Vec<String>,
}

impl Rule {
    /// Whether `:` on this field renders a substring match.
    pub fn is_string(&self, field: &str) -> bool {
        self.is_string.is_empty() || self.is_string.iter().any(|f| f == field)
    }

    pub fn is_date(&self, field: &str) -> bool {
        self.is_date.iter().any(|f| f == field)
    }
}
