use std::cmp::min;

use crate::models::{RsvpEntry, RsvpStatus};
use crate::store::RsvpStore;

/// Which slice of the roster the list shows.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum RosterView {
    All,
    Confirmed,
}

impl RosterView {
    pub(crate) fn title(self) -> &'static str {
        match self {
            RosterView::All => "All RSVPs",
            RosterView::Confirmed => "Confirmed Attendees",
        }
    }
}

/// Selection and view state for the roster list. The rows themselves always
/// come from the store's feeds so the screen never holds a stale copy.
pub(crate) struct RosterScreen {
    pub(crate) view: RosterView,
    pub(crate) selected: usize,
}

impl RosterScreen {
    pub(crate) fn new() -> Self {
        Self {
            view: RosterView::All,
            selected: 0,
        }
    }

    /// Rows for the active view. The confirmed feed yields players only, so
    /// they are paired back up with `Yes`.
    pub(crate) fn rows(&self, store: &RsvpStore) -> Vec<RsvpEntry> {
        match self.view {
            RosterView::All => store.all_entries().get().to_vec(),
            RosterView::Confirmed => store
                .confirmed_attendees()
                .get()
                .into_iter()
                .map(|player| RsvpEntry::new(player, RsvpStatus::Yes))
                .collect(),
        }
    }

    pub(crate) fn toggle_view(&mut self) -> RosterView {
        self.view = match self.view {
            RosterView::All => RosterView::Confirmed,
            RosterView::Confirmed => RosterView::All,
        };
        self.selected = 0;
        self.view
    }

    pub(crate) fn move_selection(&mut self, offset: isize, len: usize) {
        if len == 0 {
            self.selected = 0;
            return;
        }
        let max_index = len - 1;
        let next = (self.selected as isize + offset).clamp(0, max_index as isize);
        self.selected = next as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    pub(crate) fn ensure_in_bounds(&mut self, len: usize) {
        self.selected = min(self.selected, len.saturating_sub(1));
    }
}
