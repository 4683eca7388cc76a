//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// Supported languages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Vietnamese,
    English,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Vietnamese => "vi",
            Language::English => "en",
        }
    }

    /// Pick a language from an `Accept-Language` style value.
    ///
    /// Anything that does not start with `en` falls back to Vietnamese, the
    /// language warehouse staff use on the handheld client.
    pub fn from_header(value: &str) -> Self {
        let primary = value
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if primary.starts_with("en") {
            Language::English
        } else {
            Language::Vietnamese
        }
    }
}

/// Whoever performs a scan.
///
/// Always passed explicitly; processors never look up a "current user".
/// `System` is the elevated context used when no user can be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    User { id: i64, permissions: Vec<String> },
    System,
}

impl Actor {
    /// Permission required to run stock operations such as preparing a transfer
    pub const STOCK_OPERATE: (&'static str, &'static str) = ("stock", "operate");

    pub fn user(id: i64, permissions: Vec<String>) -> Self {
        Actor::User { id, permissions }
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Actor::User { id, .. } => Some(*id),
            Actor::System => None,
        }
    }

    /// Check a `resource:action` permission. The system actor holds all of them.
    pub fn has_permission(&self, resource: &str, action: &str) -> bool {
        match self {
            Actor::User { permissions, .. } => {
                let wanted = format!("{}:{}", resource, action);
                permissions.iter().any(|p| *p == wanted)
            }
            Actor::System => true,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Actor::System)
    }
}

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 50,
        }
    }
}

impl Pagination {
    /// Clamp to sane bounds: page starts at 1, page size within `1..=max_per_page`
    pub fn clamped(page: Option<u32>, per_page: Option<u32>, default_per_page: u32, max_per_page: u32) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page
            .unwrap_or(default_per_page)
            .clamp(1, max_per_page.max(1));
        Self { page, per_page }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn total_pages(&self, total_items: u64) -> u32 {
        let per_page = u64::from(self.per_page.max(1));
        ((total_items + per_page - 1) / per_page) as u32
    }
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Label/value pair used by filter dropdowns and search suggestions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabeledValue {
    pub value: String,
    pub label: String,
}

impl LabeledValue {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// Suggestion entries use the raw value as their label
    pub fn same(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_header() {
        assert_eq!(Language::from_header("en-US,en;q=0.9"), Language::English);
        assert_eq!(Language::from_header("vi-VN"), Language::Vietnamese);
        assert_eq!(Language::from_header(""), Language::Vietnamese);
    }

    #[test]
    fn test_actor_permissions() {
        let user = Actor::user(7, vec!["stock:operate".to_string()]);
        assert!(user.has_permission("stock", "operate"));
        assert!(!user.has_permission("stock", "admin"));
        assert_eq!(user.user_id(), Some(7));

        assert!(Actor::System.has_permission("anything", "at_all"));
        assert_eq!(Actor::System.user_id(), None);
    }

    #[test]
    fn test_pagination_clamping() {
        let p = Pagination::clamped(Some(0), Some(500), 50, 200);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 200);
        assert_eq!(p.offset(), 0);

        let p = Pagination::clamped(Some(3), None, 50, 200);
        assert_eq!(p.offset(), 100);
        assert_eq!(p.total_pages(101), 3);
        assert_eq!(p.total_pages(0), 0);
    }
}
