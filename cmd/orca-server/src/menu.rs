//! Menu records and the in-memory table behind the demo routes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use orca_error::{codes, ensure, with_code, OrcaResult, ResultExt};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Longest accepted label, in characters.
pub const LABEL_MAX: usize = 20;
/// Longest accepted code, in bytes.
pub const CODE_MAX: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuType {
    Menu,
    Directory,
    Button,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    #[serde(default)]
    pub menu_id: u64,
    pub label: String,
    pub code: String,
    #[serde(rename = "type")]
    pub kind: MenuType,
    #[serde(default)]
    pub parent_id: Option<u64>,
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub icon_name: String,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub keep_alive: bool,
    #[serde(default)]
    pub show: bool,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub description: String,
}

impl Menu {
    pub fn validate(&self) -> OrcaResult<()> {
        ensure!(!self.code.trim().is_empty(), codes::VALIDATION, "menu code is empty");
        ensure!(
            self.code.len() <= CODE_MAX,
            codes::VALIDATION,
            "menu code is {} bytes, limit {}",
            self.code.len(),
            CODE_MAX
        );
        ensure!(!self.label.trim().is_empty(), codes::VALIDATION, "menu label is empty");
        ensure!(
            self.label.chars().count() <= LABEL_MAX,
            codes::VALIDATION,
            "menu label `{}` is longer than {} characters",
            self.label,
            LABEL_MAX
        );
        Ok(())
    }

    /// Only `Menu` entries are navigable; others drop routing fields.
    fn normalize(&mut self) {
        if self.kind != MenuType::Menu {
            self.component = None;
            self.parent_id = None;
            self.route = None;
        }
    }
}

/// Filters and paging for [`MenuStore::list`]. Filters are substring
/// matches; empty means "any".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub code: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub page: usize,
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            code: String::new(),
            label: String::new(),
            kind: String::new(),
            page: 1,
            limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuList {
    pub total: usize,
    pub items: Vec<Menu>,
}

/// `(label, code, type, route)`
type SeedRow = (&'static str, &'static str, MenuType, Option<&'static str>);

const SEED: [SeedRow; 4] = [
    ("System", "system", MenuType::Directory, None),
    ("Menus", "system:menu", MenuType::Menu, Some("/system/menus")),
    ("Users", "system:user", MenuType::Menu, Some("/system/users")),
    ("Delete menu", "system:menu:delete", MenuType::Button, None),
];

/// Menus keyed by code.
#[derive(Debug, Default)]
pub struct MenuStore {
    menus: RwLock<BTreeMap<String, Menu>>,
    next_id: AtomicU64,
}

impl MenuStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with a small navigation tree.
    pub fn seeded() -> OrcaResult<Self> {
        let store = Self::new();
        store.seed(&SEED)?;
        Ok(store)
    }

    fn seed(&self, rows: &[SeedRow]) -> OrcaResult<()> {
        for (order, &(label, code, kind, route)) in rows.iter().enumerate() {
            let menu = Menu {
                menu_id: 0,
                label: label.to_string(),
                code: code.to_string(),
                kind,
                parent_id: route.map(|_| 1),
                route: route.map(str::to_string),
                component: route.map(|r| format!("views{}/index", r)),
                icon_name: String::new(),
                order: order as u32,
                keep_alive: false,
                show: true,
                status: true,
                description: String::new(),
            };
            self.insert(menu).wrap(format!("seeding menu `{}`", code))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.menus.read().len()
    }

    pub fn get(&self, code: &str) -> OrcaResult<Menu> {
        self.menus
            .read()
            .get(code)
            .cloned()
            .ok_or_else(|| with_code!(codes::MENU_NOT_FOUND, "menu `{}` does not exist", code))
    }

    pub fn list(&self, q: &ListQuery) -> MenuList {
        let menus = self.menus.read();
        let matching: Vec<&Menu> = menus
            .values()
            .filter(|m| m.code.contains(&q.code))
            .filter(|m| m.label.contains(&q.label))
            .filter(|m| format!("{:?}", m.kind).contains(&q.kind))
            .collect();

        let limit = q.limit.max(1);
        let offset = q.page.saturating_sub(1).saturating_mul(limit);
        MenuList {
            total: matching.len(),
            items: matching.into_iter().skip(offset).take(limit).cloned().collect(),
        }
    }

    /// Insert a new menu. Code and label must both be unused.
    pub fn insert(&self, mut menu: Menu) -> OrcaResult<Menu> {
        menu.validate()?;
        menu.normalize();

        let mut menus = self.menus.write();
        let clash = menus
            .values()
            .any(|m| m.code == menu.code || m.label == menu.label);
        ensure!(
            !clash,
            codes::MENU_ALREADY_EXIST,
            "menu code `{}` or label `{}` already in use",
            menu.code,
            menu.label
        );

        menu.menu_id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        menus.insert(menu.code.clone(), menu.clone());
        Ok(menu)
    }

    /// Replace the menu stored under `code`. The id is kept; the code in the
    /// body must match the path.
    pub fn update(&self, code: &str, mut menu: Menu) -> OrcaResult<Menu> {
        menu.validate()?;
        menu.normalize();
        ensure!(
            menu.code == code,
            codes::VALIDATION,
            "body code `{}` does not match path `{}`",
            menu.code,
            code
        );

        let mut menus = self.menus.write();
        let Some(current) = menus.get(code) else {
            return Err(with_code!(codes::MENU_NOT_FOUND, "menu `{}` does not exist", code));
        };
        menu.menu_id = current.menu_id;

        let label_taken = menus
            .values()
            .any(|m| m.code != code && m.label == menu.label);
        ensure!(
            !label_taken,
            codes::MENU_ALREADY_EXIST,
            "label `{}` already in use",
            menu.label
        );

        menus.insert(code.to_string(), menu.clone());
        Ok(menu)
    }

    /// Delete every listed menu, or none if any code is unknown.
    pub fn delete(&self, codes_: &[String]) -> OrcaResult<usize> {
        ensure!(!codes_.is_empty(), codes::VALIDATION, "no menu codes given");

        let mut menus = self.menus.write();
        let unknown: Vec<&str> = codes_
            .iter()
            .filter(|c| !menus.contains_key(c.as_str()))
            .map(String::as_str)
            .collect();
        ensure!(
            unknown.is_empty(),
            codes::VALIDATION,
            "unknown menu codes {:?}",
            unknown
        );

        Ok(codes_.iter().filter(|c| menus.remove(c.as_str()).is_some()).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orca_error::chain;

    fn menu(code: &str, label: &str) -> Menu {
        Menu {
            menu_id: 0,
            label: label.to_string(),
            code: code.to_string(),
            kind: MenuType::Menu,
            parent_id: Some(1),
            route: Some("/x".to_string()),
            component: None,
            icon_name: String::new(),
            order: 0,
            keep_alive: false,
            show: true,
            status: true,
            description: String::new(),
        }
    }

    #[test]
    fn seeded_store() {
        let store = MenuStore::seeded().unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(store.get("system:menu").unwrap().label, "Menus");
    }

    #[test]
    fn conflicting_seed_rows_fail() {
        let store = MenuStore::new();
        let rows: [SeedRow; 2] = [
            ("Same", "a", MenuType::Menu, None),
            ("Same", "b", MenuType::Menu, None),
        ];
        let err = store.seed(&rows).unwrap_err();
        assert_eq!(err.code(), Some(codes::MENU_ALREADY_EXIST));
        assert!(err.to_string().contains("seeding menu `b`"), "got: {err}");
    }

    #[test]
    fn insert_assigns_ids() {
        let store = MenuStore::new();
        let a = store.insert(menu("a", "A")).unwrap();
        let b = store.insert(menu("b", "B")).unwrap();
        assert_eq!(a.menu_id, 1);
        assert_eq!(b.menu_id, 2);
    }

    #[test]
    fn insert_conflict() {
        let store = MenuStore::new();
        store.insert(menu("a", "A")).unwrap();
        let err = store.insert(menu("a", "Other")).unwrap_err();
        assert_eq!(err.code(), Some(codes::MENU_ALREADY_EXIST));
        let err = store.insert(menu("other", "A")).unwrap_err();
        assert_eq!(err.code(), Some(codes::MENU_ALREADY_EXIST));
    }

    #[test]
    fn validation_failures() {
        let store = MenuStore::new();
        let err = store.insert(menu("", "A")).unwrap_err();
        assert_eq!(err.code(), Some(codes::VALIDATION));
        let err = store.insert(menu("a", &"x".repeat(LABEL_MAX + 1))).unwrap_err();
        assert_eq!(err.code(), Some(codes::VALIDATION));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn non_menu_types_drop_routing() {
        let store = MenuStore::new();
        let mut m = menu("btn", "Button");
        m.kind = MenuType::Button;
        let saved = store.insert(m).unwrap();
        assert_eq!(saved.route, None);
        assert_eq!(saved.parent_id, None);
    }

    #[test]
    fn get_missing_is_not_found() {
        let err = MenuStore::new().get("nope").unwrap_err();
        assert!(chain::is_code(&err, codes::MENU_NOT_FOUND));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn list_filters_and_pages() {
        let store = MenuStore::seeded().unwrap();
        let all = store.list(&ListQuery::default());
        assert_eq!(all.total, 4);

        let q = ListQuery {
            code: "system:".to_string(),
            limit: 2,
            page: 2,
            ..ListQuery::default()
        };
        let page = store.list(&q);
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);

        let q = ListQuery {
            kind: "Button".to_string(),
            ..ListQuery::default()
        };
        assert_eq!(store.list(&q).total, 1);
    }

    #[test]
    fn update_keeps_id() {
        let store = MenuStore::new();
        let a = store.insert(menu("a", "A")).unwrap();
        let mut changed = menu("a", "Renamed");
        changed.order = 9;
        let saved = store.update("a", changed).unwrap();
        assert_eq!(saved.menu_id, a.menu_id);
        assert_eq!(store.get("a").unwrap().label, "Renamed");

        let err = store.update("zzz", menu("zzz", "Z")).unwrap_err();
        assert_eq!(err.code(), Some(codes::MENU_NOT_FOUND));
        let err = store.update("a", menu("b", "B")).unwrap_err();
        assert_eq!(err.code(), Some(codes::VALIDATION));
    }

    #[test]
    fn delete_is_all_or_nothing() {
        let store = MenuStore::seeded().unwrap();
        let err = store
            .delete(&["system".to_string(), "ghost".to_string()])
            .unwrap_err();
        assert_eq!(err.code(), Some(codes::VALIDATION));
        assert_eq!(store.len(), 4);

        let n = store
            .delete(&["system".to_string(), "system:user".to_string()])
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(store.len(), 2);

        assert!(store.delete(&[]).is_err());
    }
}
