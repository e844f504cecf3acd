//! The fixed calendar category table.
//!
//! Each category carries a default display color and a priority, where 1 is
//! the most urgent category and 10 the least. The priority weights are part of
//! the stored-data contract and must not be renumbered.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Priority assigned to categories outside the table.
pub const DEFAULT_PRIORITY: u8 = 5;

/// Color used when a category is unrecognized.
pub const NEUTRAL_COLOR: &str = "#9E9E9E";

/// Color of holiday pseudo-occurrences and their markers.
pub const HOLIDAY_COLOR: &str = "#E53935";

/// A calendar category key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Study,
    Family,
    Health,
    Travel,
    Project,
    Social,
    Finance,
    Hobby,
    /// Any key not in the table.
    #[serde(other)]
    Other,
}

impl Category {
    /// All recognized categories, in table order.
    pub const ALL: [Category; 10] = [
        Category::Work,
        Category::Personal,
        Category::Study,
        Category::Family,
        Category::Health,
        Category::Travel,
        Category::Project,
        Category::Social,
        Category::Finance,
        Category::Hobby,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Study => "study",
            Category::Family => "family",
            Category::Health => "health",
            Category::Travel => "travel",
            Category::Project => "project",
            Category::Social => "social",
            Category::Finance => "finance",
            Category::Hobby => "hobby",
            Category::Other => "other",
        }
    }

    /// Priority weight (1 = highest).
    pub fn priority(self) -> u8 {
        match self {
            Category::Study => 1,
            Category::Work => 2,
            Category::Health => 3,
            Category::Family => 4,
            Category::Personal => 5,
            Category::Project => 6,
            Category::Finance => 7,
            Category::Social => 8,
            Category::Travel => 9,
            Category::Hobby => 10,
            Category::Other => DEFAULT_PRIORITY,
        }
    }

    /// Registered default color, `None` for [`Category::Other`].
    pub fn default_color(self) -> Option<&'static str> {
        let color = match self {
            Category::Work => "#4285F4",
            Category::Personal => "#34A853",
            Category::Study => "#FBBC05",
            Category::Family => "#FF7043",
            Category::Health => "#26A69A",
            Category::Travel => "#29B6F6",
            Category::Project => "#7E57C2",
            Category::Social => "#EC407A",
            Category::Finance => "#8D6E63",
            Category::Hobby => "#AB47BC",
            Category::Other => return None,
        };
        Some(color)
    }

    /// Parse a stored key. Unknown keys map to [`Category::Other`].
    pub fn from_key(key: &str) -> Category {
        key.parse().unwrap_or(Category::Other)
    }
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.key() == key)
            .ok_or(())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// User color overrides layered over the category defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    /// Keyed by [`Category::key`].
    overrides: BTreeMap<String, String>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the color of one category.
    pub fn with_color(mut self, category: Category, color: impl Into<String>) -> Self {
        self.overrides.insert(category.key().to_string(), color.into());
        self
    }

    /// Overrides as `(category key, color)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.overrides.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolve the display color for an event.
    ///
    /// Order: the event's explicit color, this palette's override, the
    /// category default, then [`NEUTRAL_COLOR`].
    pub fn resolve(&self, category: Category, explicit: Option<&str>) -> String {
        explicit
            .filter(|c| !c.trim().is_empty())
            .or_else(|| self.overrides.get(category.key()).map(String::as_str))
            .or_else(|| category.default_color())
            .unwrap_or(NEUTRAL_COLOR)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_table() {
        let table: Vec<(Category, u8)> = Category::ALL
            .into_iter()
            .map(|c| (c, c.priority()))
            .collect();
        assert!(table.contains(&(Category::Study, 1)));
        assert!(table.contains(&(Category::Work, 2)));
        assert!(table.contains(&(Category::Health, 3)));
        assert!(table.contains(&(Category::Family, 4)));
        assert!(table.contains(&(Category::Personal, 5)));
        assert!(table.contains(&(Category::Project, 6)));
        assert!(table.contains(&(Category::Finance, 7)));
        assert!(table.contains(&(Category::Social, 8)));
        assert!(table.contains(&(Category::Travel, 9)));
        assert!(table.contains(&(Category::Hobby, 10)));
    }

    #[test]
    fn test_unknown_category_is_mid_priority() {
        assert_eq!(Category::from_key("gardening"), Category::Other);
        assert_eq!(Category::Other.priority(), 5);
    }

    #[test]
    fn test_from_key_is_case_insensitive() {
        assert_eq!(Category::from_key(" Study "), Category::Study);
        assert_eq!(Category::from_key("WORK"), Category::Work);
    }

    #[test]
    fn test_serde_unknown_key_is_other() {
        let c: Category = serde_json::from_str("\"gardening\"").unwrap();
        assert_eq!(c, Category::Other);
        let c: Category = serde_json::from_str("\"health\"").unwrap();
        assert_eq!(c, Category::Health);
    }

    #[test]
    fn test_palette_deserializes_from_table() {
        let palette: Palette = serde_json::from_str(r##"{"study": "#111111"}"##).unwrap();
        assert_eq!(palette.resolve(Category::Study, None), "#111111");
    }

    #[test]
    fn test_color_resolution_order() {
        let palette = Palette::new().with_color(Category::Work, "#000001");
        assert_eq!(palette.resolve(Category::Work, Some("#123456")), "#123456");
        assert_eq!(palette.resolve(Category::Work, None), "#000001");
        assert_eq!(palette.resolve(Category::Work, Some("  ")), "#000001");
        assert_eq!(palette.resolve(Category::Hobby, None), "#AB47BC");
        assert_eq!(palette.resolve(Category::Other, None), NEUTRAL_COLOR);
    }
}
