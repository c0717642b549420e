use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A three-line element set (name line plus the two TLE lines)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrbitalElementSet {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

/// Identifies the tracked object in a catalog response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObjectId {
    pub catalog_number: u32,
    #[serde(default)]
    pub name: Option<String>,
}

impl ObjectId {
    pub fn new(catalog_number: u32, name: Option<&str>) -> Self {
        Self {
            catalog_number,
            name: name.map(String::from),
        }
    }

    /// True if a catalog line mentions this object by name or catalog number
    pub fn matches(&self, line: &str) -> bool {
        let by_name = self
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .is_some_and(|n| line.contains(n));
        by_name || line.contains(&self.catalog_number.to_string())
    }

    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", name, self.catalog_number),
            None => format!("NORAD {}", self.catalog_number),
        }
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new(25544, Some("ISS"))
    }
}
