//! Page view context — an identifier scoped to one logical page view.

use crate::ids;

/// Tracks the active page view id for one tracker instance.
///
/// The id rotates on each page-view tracking call and stays fixed for
/// sub-events within the same page view. It lives only in memory; a reload
/// always starts a new page view.
#[derive(Debug, Default)]
pub struct PageViewTracker {
    current: Option<String>,
}

impl PageViewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new logical page view and return its identifier.
    pub fn new_page_view(&mut self) -> String {
        let id = ids::new_id();
        self.current = Some(id.clone());
        id
    }

    /// The active page view id, minted lazily for events that arrive before
    /// any page-view call.
    pub fn current(&mut self) -> String {
        self.current.get_or_insert_with(ids::new_id).clone()
    }
}
