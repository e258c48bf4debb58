// src/category.rs
// Fixed editorial taxonomy. The slug is derived from the name in the only
// constructor, so the two can never disagree; deserialization goes through
// the constructor and ignores any serialized slug.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    name: String,
    slug: String,
    color: String,
    description: String,
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wire {
            name: String,
            #[serde(default)]
            color: String,
            #[serde(default)]
            description: String,
        }
        let wire = Wire::deserialize(deserializer)?;
        Ok(Category::new(&wire.name, &wire.description, &wire.color))
    }
}

impl Category {
    pub fn new(name: &str, description: &str, color: &str) -> Self {
        let slug = name.to_lowercase().replace(' ', "-");
        Self {
            name: name.to_string(),
            slug,
            color: color.to_string(),
            description: if description.is_empty() {
                name.to_string()
            } else {
                description.to_string()
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn technology() -> Self {
        Self::new("Technology", "Technology and software news", "#3B82F6")
    }

    pub fn business() -> Self {
        Self::new("Business", "Business and finance news", "#10B981")
    }

    pub fn sports() -> Self {
        Self::new("Sports", "Sports and athletics news", "#F59E0B")
    }

    pub fn politics() -> Self {
        Self::new("Politics", "Political news and analysis", "#EF4444")
    }

    pub fn health() -> Self {
        Self::new("Health", "Health and medical news", "#8B5CF6")
    }

    pub fn science() -> Self {
        Self::new("Science", "Science and research news", "#06B6D4")
    }

    pub fn entertainment() -> Self {
        Self::new("Entertainment", "Entertainment and celebrity news", "#F97316")
    }

    pub fn general() -> Self {
        Self::new("General", "General news and current events", "#6B7280")
    }

    /// The eight seed categories, in display order.
    pub fn seed() -> Vec<Self> {
        vec![
            Self::technology(),
            Self::business(),
            Self::sports(),
            Self::politics(),
            Self::health(),
            Self::science(),
            Self::entertainment(),
            Self::general(),
        ]
    }

    /// Case-insensitive keyword match against name, description, or slug.
    pub fn matches(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.name.to_lowercase().contains(&keyword)
            || self.description.to_lowercase().contains(&keyword)
            || self.slug == keyword
    }
}
