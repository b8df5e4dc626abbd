//! Menu visibility.
//!
//! Builds the navigation tree a given user is allowed to see from the flat,
//! `parent_id`-linked menu list.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{Menu, MenuType, User};

use super::AccessRequirement;

/// A visible menu entry with its visible children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuNode {
    /// Menu id.
    pub id: u32,
    /// Label.
    pub name: String,
    /// Route or URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Rendering kind.
    pub menu_type: MenuType,
    /// Icon name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Visible children, in display order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,
}

/// Validated menu hierarchy.
#[derive(Debug, Clone, Default)]
pub struct MenuTree {
    children: HashMap<Option<u32>, Vec<Menu>>,
}

impl MenuTree {
    /// Validates the menu list and indexes it by parent.
    ///
    /// Fails on duplicate ids, on a `parent_id` that names no menu, and on
    /// parent cycles.
    pub fn build(menus: Vec<Menu>) -> WorkflowResult<Self> {
        let invalid = |message: String| WorkflowError::InvalidConfig { message };

        let mut parents: HashMap<u32, Option<u32>> = HashMap::with_capacity(menus.len());
        for menu in &menus {
            if parents.insert(menu.id, menu.parent_id).is_some() {
                return Err(invalid(format!("duplicate menu id {}", menu.id)));
            }
        }

        for menu in &menus {
            let mut seen = HashSet::from([menu.id]);
            let mut cursor = menu.parent_id;
            while let Some(parent) = cursor {
                let grandparent = parents.get(&parent).ok_or_else(|| {
                    invalid(format!(
                        "menu {} refers to missing parent {}",
                        menu.id, parent
                    ))
                })?;
                if !seen.insert(parent) {
                    return Err(invalid(format!("menu {} is part of a parent cycle", menu.id)));
                }
                cursor = *grandparent;
            }
        }

        let mut children: HashMap<Option<u32>, Vec<Menu>> = HashMap::new();
        for menu in menus {
            children.entry(menu.parent_id).or_default().push(menu);
        }
        for siblings in children.values_mut() {
            siblings.sort_by(|a, b| {
                a.sort_order
                    .cmp(&b.sort_order)
                    .then_with(|| a.name.cmp(&b.name))
            });
        }

        Ok(Self { children })
    }

    /// Number of menu entries in the tree.
    pub fn len(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }

    /// Returns true if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the part of the tree `user` may see.
    ///
    /// Inactive entries and entries whose roles/permissions the user does not
    /// hold are hidden with their whole subtree. Folders left empty are
    /// dropped, as are dividers that would lead, trail or double up.
    pub fn visible_for(&self, user: &User) -> Vec<MenuNode> {
        self.visible_children(None, user)
    }

    fn visible_children(&self, parent: Option<u32>, user: &User) -> Vec<MenuNode> {
        let Some(siblings) = self.children.get(&parent) else {
            return Vec::new();
        };

        let nodes: Vec<MenuNode> = siblings
            .iter()
            .filter(|menu| menu.is_active && requirement(menu).is_satisfied_by(user))
            .filter_map(|menu| {
                let children = self.visible_children(Some(menu.id), user);
                if menu.menu_type == MenuType::Folder && children.is_empty() {
                    return None;
                }
                Some(MenuNode {
                    id: menu.id,
                    name: menu.name.clone(),
                    path: menu.path.clone(),
                    menu_type: menu.menu_type,
                    icon: menu.icon.clone(),
                    children,
                })
            })
            .collect();

        trim_dividers(nodes)
    }
}

fn requirement(menu: &Menu) -> AccessRequirement {
    AccessRequirement {
        roles: menu.roles.clone(),
        permissions: menu.permissions.clone(),
        require_all: false,
    }
}

fn trim_dividers(nodes: Vec<MenuNode>) -> Vec<MenuNode> {
    let mut out: Vec<MenuNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let is_divider = node.menu_type == MenuType::Divider;
        let after_divider = out
            .last()
            .is_none_or(|prev| prev.menu_type == MenuType::Divider);
        if is_divider && after_divider {
            continue;
        }
        out.push(node);
    }
    if out.last().is_some_and(|n| n.menu_type == MenuType::Divider) {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu(id: u32, parent_id: Option<u32>, name: &str, menu_type: MenuType, roles: &[&str]) -> Menu {
        Menu {
            id,
            parent_id,
            name: name.to_string(),
            path: Some(format!("/{}", name.to_lowercase())),
            menu_type,
            icon: None,
            sort_order: id as i32,
            is_active: true,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            permissions: vec![],
        }
    }

    fn user(roles: &[&str]) -> User {
        User {
            id: "u-001".to_string(),
            first_name: "Kofi".to_string(),
            last_name: "Mensah".to_string(),
            email: "kofi@ghf.org".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            permissions: vec![],
        }
    }

    fn sample_tree() -> MenuTree {
        MenuTree::build(vec![
            menu(1, None, "Dashboard", MenuType::Page, &[]),
            menu(2, None, "HR", MenuType::Folder, &[]),
            menu(3, Some(2), "Leaves", MenuType::Page, &[]),
            menu(4, Some(2), "Approvals", MenuType::Page, &["HR Manager", "Admin"]),
            menu(5, None, "Sep", MenuType::Divider, &[]),
            menu(6, None, "Admin", MenuType::Folder, &["Admin"]),
            menu(7, Some(6), "Menus", MenuType::Page, &[]),
            menu(8, None, "Sep2", MenuType::Divider, &[]),
        ])
        .unwrap()
    }

    fn names(nodes: &[MenuNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[test]
    fn test_admin_sees_everything_except_trailing_divider() {
        let nodes = sample_tree().visible_for(&user(&["Admin"]));
        assert_eq!(names(&nodes), ["Dashboard", "HR", "Sep", "Admin"]);
        assert_eq!(names(&nodes[1].children), ["Leaves", "Approvals"]);
        assert_eq!(names(&nodes[3].children), ["Menus"]);
    }

    #[test]
    fn test_staff_sees_filtered_tree() {
        let nodes = sample_tree().visible_for(&user(&["Staff"]));
        assert_eq!(names(&nodes), ["Dashboard", "HR"]);
        assert_eq!(names(&nodes[0].children), Vec::<&str>::new());
        assert_eq!(names(&nodes[1].children), ["Leaves"]);
    }

    #[test]
    fn test_empty_folder_is_dropped() {
        let mut items = vec![
            menu(1, None, "Reports", MenuType::Folder, &[]),
            menu(2, Some(1), "Budget", MenuType::Page, &["Finance Manager"]),
        ];
        items.push(menu(3, None, "Home", MenuType::Page, &[]));
        let tree = MenuTree::build(items).unwrap();
        assert_eq!(names(&tree.visible_for(&user(&[]))), ["Home"]);
    }

    #[test]
    fn test_inactive_entry_hides_subtree() {
        let mut parent = menu(1, None, "Meetings", MenuType::Folder, &[]);
        parent.is_active = false;
        let tree = MenuTree::build(vec![
            parent,
            menu(2, Some(1), "Minutes", MenuType::Page, &[]),
        ])
        .unwrap();
        assert!(tree.visible_for(&user(&["Admin"])).is_empty());
    }

    #[test]
    fn test_siblings_sorted_by_order_then_name() {
        let mut b = menu(1, None, "Beta", MenuType::Page, &[]);
        let mut a = menu(2, None, "Alpha", MenuType::Page, &[]);
        let mut c = menu(3, None, "Gamma", MenuType::Page, &[]);
        b.sort_order = 1;
        a.sort_order = 1;
        c.sort_order = 0;
        let tree = MenuTree::build(vec![b, a, c]).unwrap();
        assert_eq!(names(&tree.visible_for(&user(&[]))), ["Gamma", "Alpha", "Beta"]);
    }

    #[test]
    fn test_consecutive_dividers_collapse() {
        let tree = MenuTree::build(vec![
            menu(1, None, "Top", MenuType::Divider, &[]),
            menu(2, None, "A", MenuType::Page, &[]),
            menu(3, None, "S1", MenuType::Divider, &[]),
            menu(4, None, "S2", MenuType::Divider, &[]),
            menu(5, None, "B", MenuType::Page, &[]),
        ])
        .unwrap();
        assert_eq!(names(&tree.visible_for(&user(&[]))), ["A", "S1", "B"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = MenuTree::build(vec![
            menu(1, None, "A", MenuType::Page, &[]),
            menu(1, None, "B", MenuType::Page, &[]),
        ]);
        assert!(matches!(result, Err(WorkflowError::InvalidConfig { .. })));
    }

    #[test]
    fn test_missing_parent_rejected() {
        let result = MenuTree::build(vec![menu(2, Some(9), "Orphan", MenuType::Page, &[])]);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("missing parent 9"));
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let result = MenuTree::build(vec![
            menu(1, Some(2), "A", MenuType::Folder, &[]),
            menu(2, Some(1), "B", MenuType::Folder, &[]),
        ]);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_len_counts_all_entries() {
        assert_eq!(sample_tree().len(), 8);
        assert!(MenuTree::default().is_empty());
    }
}
