//! Download categories.
//!
//! The backend only knows numeric category ids; callers talk in labels and
//! save paths. `CategoryLookup` bridges the two.

use async_trait::async_trait;
use serde::Serialize;

use crate::config::DownloadsConfig;

/// A backend download category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: u32,
    pub label: String,
    pub path: String,
}

/// Resolves categories by id, label or save path.
#[async_trait]
pub trait CategoryLookup: Send + Sync {
    async fn by_id(&self, id: u32) -> Option<Category>;

    /// Label match is case-insensitive.
    async fn by_name(&self, name: &str) -> Option<Category>;

    async fn by_path(&self, path: &str) -> Option<Category>;

    async fn all(&self) -> Vec<Category>;
}

/// Categories declared in configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCategories {
    categories: Vec<Category>,
}

impl StaticCategories {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn from_config(config: &DownloadsConfig) -> Self {
        Self::new(
            config
                .categories
                .iter()
                .map(|c| Category {
                    id: c.id,
                    label: c.label.clone(),
                    path: c.path.clone(),
                })
                .collect(),
        )
    }
}

#[async_trait]
impl CategoryLookup for StaticCategories {
    async fn by_id(&self, id: u32) -> Option<Category> {
        self.categories.iter().find(|c| c.id == id).cloned()
    }

    async fn by_name(&self, name: &str) -> Option<Category> {
        self.categories
            .iter()
            .find(|c| c.label.eq_ignore_ascii_case(name))
            .cloned()
    }

    async fn by_path(&self, path: &str) -> Option<Category> {
        let wanted = path.trim_end_matches('/');
        if wanted.is_empty() {
            return None;
        }
        self.categories
            .iter()
            .find(|c| c.path.trim_end_matches('/') == wanted)
            .cloned()
    }

    async fn all(&self) -> Vec<Category> {
        self.categories.clone()
    }
}
