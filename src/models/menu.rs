//! Navigation menu model.

use serde::{Deserialize, Serialize};

/// What a menu entry renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuType {
    /// Links to an in-app page.
    #[default]
    Page,
    /// Groups child entries.
    Folder,
    /// Visual separator.
    Divider,
    /// Links outside the application.
    External,
}

/// A single entry of the hierarchical navigation menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    /// Unique identifier.
    pub id: u32,
    /// Parent entry, `None` for top-level entries.
    #[serde(default)]
    pub parent_id: Option<u32>,
    /// Label.
    pub name: String,
    /// Route or URL, absent for folders and dividers.
    #[serde(default)]
    pub path: Option<String>,
    /// Rendering kind.
    #[serde(default)]
    pub menu_type: MenuType,
    /// Icon name.
    #[serde(default)]
    pub icon: Option<String>,
    /// Position among siblings.
    #[serde(default)]
    pub sort_order: i32,
    /// Hidden when false.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Any of these roles makes the entry visible.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Any of these permissions makes the entry visible.
    #[serde(default)]
    pub permissions: Vec<String>,
}

fn default_active() -> bool {
    true
}
