//! Browser tab inventory
//!
//! The browser itself is out of process. A bridge (extension background page,
//! WebDriver session, ...) pushes its tab list here and drains the reload
//! requests the scheduler queues.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{rules::is_web_url, RefreshError, Result};

pub type TabId = u64;
pub type WindowId = u64;

/// A live browser tab as reported by the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Active tab within its window
    #[serde(default)]
    pub active: bool,
    /// `None` when the browser does not report highlighting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<bool>,
    #[serde(default)]
    pub window_id: WindowId,
}

impl Tab {
    /// A tab counts as focused when it is active in its window and not
    /// explicitly unhighlighted. Whether that window has OS focus is not consulted.
    pub fn is_focused(&self) -> bool {
        self.active && self.highlighted != Some(false)
    }
}

/// Filter for [`TabInventory::query_tabs`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TabQuery {
    pub active: Option<bool>,
    /// Only tabs in the most recently focused window
    pub current_window: bool,
}

impl TabQuery {
    pub fn all() -> Self {
        Self::default()
    }

    /// The front tab of the current window
    pub fn active() -> Self {
        Self {
            active: Some(true),
            current_window: true,
        }
    }

    fn accepts(&self, tab: &Tab, focused_window: Option<WindowId>) -> bool {
        if self.current_window && focused_window.is_some_and(|window| window != tab.window_id) {
            return false;
        }
        self.active.map_or(true, |active| tab.active == active)
    }
}

/// Queryable set of open tabs plus the reload side effect
pub trait TabInventory: Send + Sync {
    fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>>;

    /// Ask the browser to reload a tab. Fails fast for tabs that cannot be reloaded.
    fn reload_tab(&self, id: TabId) -> Result<()>;
}

#[derive(Debug, Default)]
struct BridgeInner {
    tabs: BTreeMap<TabId, Tab>,
    pending_reloads: VecDeque<TabId>,
    /// Window of the last activated tab; `None` until the bridge reports one
    focused_window: Option<WindowId>,
}

/// Tab inventory fed by an external browser bridge
#[derive(Debug, Default)]
pub struct BridgeTabInventory {
    inner: Mutex<BridgeInner>,
}

impl BridgeTabInventory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BridgeInner>> {
        self.inner.lock().map_err(|_| RefreshError::LockPoisoned("tab inventory"))
    }

    /// Replace the whole snapshot. Reloads queued for tabs that disappeared are dropped.
    pub fn replace_all(&self, tabs: Vec<Tab>) -> Result<()> {
        let mut inner = self.lock()?;
        inner.tabs = tabs.into_iter().map(|tab| (tab.id, tab)).collect();
        let BridgeInner { tabs, pending_reloads, .. } = &mut *inner;
        pending_reloads.retain(|id| tabs.contains_key(id));
        debug!("Tab snapshot replaced ({} tabs)", inner.tabs.len());
        Ok(())
    }

    /// Insert or update a single tab
    pub fn upsert(&self, tab: Tab) -> Result<()> {
        let mut inner = self.lock()?;
        inner.tabs.insert(tab.id, tab);
        Ok(())
    }

    /// Forget a closed tab. Returns whether it was known.
    pub fn remove(&self, id: TabId) -> Result<bool> {
        let mut inner = self.lock()?;
        inner.pending_reloads.retain(|pending| *pending != id);
        Ok(inner.tabs.remove(&id).is_some())
    }

    /// Mark a tab as the active one in its window and make that window current.
    /// Tabs in other windows keep their flags.
    pub fn activate(&self, id: TabId) -> Result<()> {
        let mut inner = self.lock()?;
        let window = inner.tabs.get(&id).ok_or(RefreshError::TabNotFound(id))?.window_id;
        for (tab_id, tab) in inner.tabs.iter_mut().filter(|(_, tab)| tab.window_id == window) {
            tab.active = *tab_id == id;
        }
        inner.focused_window = Some(window);
        Ok(())
    }

    /// Take all queued reload requests in the order they were made
    pub fn drain_reloads(&self) -> Result<Vec<TabId>> {
        let mut inner = self.lock()?;
        Ok(inner.pending_reloads.drain(..).collect())
    }

    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.tabs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TabInventory for BridgeTabInventory {
    fn query_tabs(&self, query: &TabQuery) -> Result<Vec<Tab>> {
        let inner = self.lock()?;
        Ok(inner
            .tabs
            .values()
            .filter(|tab| query.accepts(tab, inner.focused_window))
            .cloned()
            .collect())
    }

    fn reload_tab(&self, id: TabId) -> Result<()> {
        let mut inner = self.lock()?;
        let tab = inner.tabs.get(&id).ok_or(RefreshError::TabNotFound(id))?;
        if !is_web_url(&tab.url) {
            return Err(RefreshError::NotReloadable(id));
        }
        if !inner.pending_reloads.contains(&id) {
            inner.pending_reloads.push_back(id);
            info!("Queued reload for tab {}", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: TabId, url: &str, active: bool) -> Tab {
        Tab {
            id,
            url: url.to_string(),
            title: format!("tab {}", id),
            active,
            highlighted: None,
            window_id: 0,
        }
    }

    #[test]
    fn focus_requires_active_and_not_unhighlighted() {
        let mut t = tab(1, "https://a.com/", true);
        assert!(t.is_focused());
        t.highlighted = Some(false);
        assert!(!t.is_focused());
        t.highlighted = Some(true);
        assert!(t.is_focused());
        t.active = false;
        assert!(!t.is_focused());
    }

    #[test]
    fn query_filters_active_tabs() {
        let inventory = BridgeTabInventory::new();
        inventory
            .replace_all(vec![tab(1, "https://a.com/", false), tab(2, "https://b.com/", true)])
            .unwrap();

        assert_eq!(inventory.query_tabs(&TabQuery::all()).unwrap().len(), 2);
        let active = inventory.query_tabs(&TabQuery::active()).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, 2);
    }

    #[test]
    fn activate_moves_the_active_flag() {
        let inventory = BridgeTabInventory::new();
        inventory
            .replace_all(vec![tab(1, "https://a.com/", true), tab(2, "https://b.com/", false)])
            .unwrap();
        inventory.activate(2).unwrap();

        let active = inventory.query_tabs(&TabQuery::active()).unwrap();
        assert_eq!(active.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);
        assert!(matches!(inventory.activate(9), Err(RefreshError::TabNotFound(9))));
    }

    fn in_window(mut tab: Tab, window_id: WindowId) -> Tab {
        tab.window_id = window_id;
        tab
    }

    #[test]
    fn activate_leaves_other_windows_alone() {
        let inventory = BridgeTabInventory::new();
        inventory
            .replace_all(vec![
                in_window(tab(1, "https://a.com/", false), 1),
                in_window(tab(2, "https://b.com/", true), 2),
                in_window(tab(3, "https://c.com/", true), 1),
            ])
            .unwrap();
        inventory.activate(1).unwrap();

        let mut active: Vec<TabId> = inventory
            .query_tabs(&TabQuery { active: Some(true), current_window: false })
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        active.sort();
        assert_eq!(active, vec![1, 2]);
    }

    #[test]
    fn active_query_follows_the_focused_window() {
        let inventory = BridgeTabInventory::new();
        inventory
            .replace_all(vec![
                in_window(tab(1, "https://a.com/", true), 1),
                in_window(tab(2, "https://b.com/", true), 2),
            ])
            .unwrap();

        inventory.activate(2).unwrap();
        let front = inventory.query_tabs(&TabQuery::active()).unwrap();
        assert_eq!(front.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);

        inventory.activate(1).unwrap();
        let front = inventory.query_tabs(&TabQuery::active()).unwrap();
        assert_eq!(front.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn reloads_are_queued_once_and_drained() {
        let inventory = BridgeTabInventory::new();
        inventory.upsert(tab(1, "https://a.com/", false)).unwrap();
        inventory.reload_tab(1).unwrap();
        inventory.reload_tab(1).unwrap();

        assert_eq!(inventory.drain_reloads().unwrap(), vec![1]);
        assert!(inventory.drain_reloads().unwrap().is_empty());
    }

    #[test]
    fn privileged_and_unknown_tabs_fail_to_reload() {
        let inventory = BridgeTabInventory::new();
        inventory.upsert(tab(1, "about:config", false)).unwrap();

        assert!(matches!(inventory.reload_tab(1), Err(RefreshError::NotReloadable(1))));
        assert!(matches!(inventory.reload_tab(2), Err(RefreshError::TabNotFound(2))));
    }

    #[test]
    fn removing_a_tab_drops_its_pending_reload() {
        let inventory = BridgeTabInventory::new();
        inventory.upsert(tab(1, "https://a.com/", false)).unwrap();
        inventory.reload_tab(1).unwrap();

        assert!(inventory.remove(1).unwrap());
        assert!(!inventory.remove(1).unwrap());
        assert!(inventory.drain_reloads().unwrap().is_empty());
        assert!(inventory.is_empty());
    }
}
