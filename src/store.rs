//! The RSVP entry store: the one place the roster lives.
//!
//! Every mutation builds a fresh list, publishes it to subscribers, writes it
//! to storage and logs what happened, in that order. "Failures" such as adding
//! a player twice or updating an unknown player are not errors: nothing
//! changes, a line is logged, and the returned [`Outcome`] says so.
//!
//! Storage problems are absorbed as well. The in-memory roster keeps working,
//! the failure is logged as a warning and remembered in
//! [`RsvpStore::storage_error`] until the next successful write.
//!
//! A saved roster that cannot be read or decoded is never overwritten behind
//! the user's back: saving stays off, see [`RsvpStore::load_failure`], until
//! `clear_all` succeeds.

use std::collections::HashSet;
use std::rc::Rc;

use crate::error::{SnapshotError, StorageError};
use crate::logging::Logger;
use crate::models::{Player, RsvpCounts, RsvpEntry, RsvpStatus};
use crate::observable::{Feed, MappedFeed, Observable};
use crate::storage::Storage;

/// The single key the whole roster is stored under.
pub const STORAGE_KEY: &str = "rsvps";

/// What a mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Added,
    Updated,
    /// `add` found a player with the same id and left the roster alone.
    DuplicateSkipped,
    /// `update` found no player with that id.
    NotFound,
    Cleared,
}

pub struct RsvpStore {
    entries: Observable<Vec<RsvpEntry>>,
    storage: Box<dyn Storage>,
    logger: Box<dyn Logger>,
    storage_error: Option<StorageError>,
    load_failure: Option<String>,
}

impl RsvpStore {
    /// Build the store and adopt whatever roster `storage` already holds.
    ///
    /// A value that cannot be read or decoded, or that repeats a player id,
    /// is logged and ignored; the store then starts empty with saving held
    /// back.
    pub fn open(storage: Box<dyn Storage>, logger: Box<dyn Logger>) -> Self {
        let mut store = Self {
            entries: Observable::new(Vec::new()),
            storage,
            logger,
            storage_error: None,
            load_failure: None,
        };

        match store.storage.load(STORAGE_KEY) {
            Ok(Some(bytes)) => match decode_entries(&bytes) {
                Ok(saved) => {
                    store.entries.set(saved);
                    store.logger.log("Loaded saved RSVP entries from storage.");
                }
                Err(err) => {
                    store
                        .logger
                        .warn(&format!("Ignoring saved RSVP entries: {err}"));
                    store.load_failure = Some(err.to_string());
                }
            },
            Ok(None) => {}
            Err(err) => {
                store
                    .logger
                    .warn(&format!("Could not read saved RSVP entries: {err}"));
                store.load_failure = Some(err.to_string());
                store.storage_error = Some(err);
            }
        }

        store
    }

    /// Append a new entry unless a player with the same id is already there.
    pub fn add(&mut self, player: Player, status: RsvpStatus) -> Outcome {
        let current = self.entries.get();
        if position_of(&current, &player.id).is_some() {
            self.logger.log(&format!(
                "Add skipped: player {} already exists.",
                player.name
            ));
            return Outcome::DuplicateSkipped;
        }

        let message = format!("RSVP added for {}: {}", player.name, status);
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(RsvpEntry::new(player, status));

        self.commit(next);
        self.logger.log(&message);
        Outcome::Added
    }

    /// Replace the status of the entry whose player id matches. The stored
    /// player record is kept; only the status changes.
    pub fn update(&mut self, player: &Player, status: RsvpStatus) -> Outcome {
        let current = self.entries.get();
        let Some(index) = position_of(&current, &player.id) else {
            self.logger.log(&format!(
                "Update failed: player {} not found.",
                player.name
            ));
            return Outcome::NotFound;
        };

        let mut next = current.to_vec();
        next[index].status = status;

        self.commit(next);
        self.logger
            .log(&format!("RSVP updated for {}: {}", player.name, status));
        Outcome::Updated
    }

    pub fn add_or_update(&mut self, player: Player, status: RsvpStatus) -> Outcome {
        if self.contains(&player.id) {
            self.update(&player, status)
        } else {
            self.add(player, status)
        }
    }

    /// Drop every entry and remove the persisted copy. A successful clear
    /// also turns saving back on after a failed load.
    pub fn clear_all(&mut self) -> Outcome {
        let result = self.storage.clear(STORAGE_KEY);
        if result.is_ok() && self.load_failure.take().is_some() {
            self.logger.log("Saving resumed after clearing the unreadable roster.");
        }
        self.record_storage_result(result, "clear");
        self.entries.set(Vec::new());
        self.logger.log("Cleared all RSVP entries.");
        Outcome::Cleared
    }

    pub fn all_entries(&self) -> Feed<Vec<RsvpEntry>> {
        self.entries.feed()
    }

    /// Players who answered `Yes`, in roster order.
    pub fn confirmed_attendees(&self) -> MappedFeed<Vec<RsvpEntry>, Vec<Player>> {
        self.entries
            .feed()
            .map(|entries: &Vec<RsvpEntry>| players_with_status(entries, RsvpStatus::Yes))
    }

    pub fn counts(&self) -> MappedFeed<Vec<RsvpEntry>, RsvpCounts> {
        self.entries
            .feed()
            .map(|entries: &Vec<RsvpEntry>| RsvpCounts::tally(entries))
    }

    /// Current snapshot, for callers that poll instead of subscribing.
    pub fn entries(&self) -> Rc<Vec<RsvpEntry>> {
        self.entries.get()
    }

    pub fn contains(&self, player_id: &str) -> bool {
        position_of(&self.entries.get(), player_id).is_some()
    }

    /// The last storage failure, if the most recent storage call failed.
    pub fn storage_error(&self) -> Option<&StorageError> {
        self.storage_error.as_ref()
    }

    /// Why the saved roster was rejected at startup. While this is set,
    /// mutations stay in memory and the saved value is left untouched.
    pub fn load_failure(&self) -> Option<&str> {
        self.load_failure.as_deref()
    }

    fn commit(&mut self, next: Vec<RsvpEntry>) {
        let encoded = encode_entries(&next);
        self.entries.set(next);
        if let Some(reason) = &self.load_failure {
            self.logger.warn(&format!(
                "RSVP list not saved, the saved roster could not be loaded: {reason}"
            ));
            return;
        }
        match encoded {
            Ok(bytes) => {
                let result = self.storage.save(STORAGE_KEY, &bytes);
                self.record_storage_result(result, "save");
            }
            Err(err) => self
                .logger
                .warn(&format!("RSVP list not saved: {err}")),
        }
    }

    fn record_storage_result(&mut self, result: Result<(), StorageError>, action: &str) {
        match result {
            Ok(()) => self.storage_error = None,
            Err(err) => {
                self.logger.warn(&format!(
                    "Storage {action} failed, keeping changes in memory only: {err}"
                ));
                self.storage_error = Some(err);
            }
        }
    }
}

fn position_of(entries: &[RsvpEntry], player_id: &str) -> Option<usize> {
    entries.iter().position(|entry| entry.player.id == player_id)
}

fn players_with_status(entries: &[RsvpEntry], status: RsvpStatus) -> Vec<Player> {
    entries
        .iter()
        .filter(|entry| entry.status == status)
        .map(|entry| entry.player.clone())
        .collect()
}

fn encode_entries(entries: &[RsvpEntry]) -> Result<Vec<u8>, SnapshotError> {
    serde_json::to_vec(entries).map_err(SnapshotError::Encode)
}

fn decode_entries(bytes: &[u8]) -> Result<Vec<RsvpEntry>, SnapshotError> {
    let entries: Vec<RsvpEntry> = serde_json::from_slice(bytes).map_err(SnapshotError::Decode)?;
    match first_repeated_id(&entries) {
        Some(id) => Err(SnapshotError::DuplicateId(id)),
        None => Ok(entries),
    }
}

fn first_repeated_id(entries: &[RsvpEntry]) -> Option<String> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .iter()
        .find(|entry| !seen.insert(entry.player.id.as_str()))
        .map(|entry| entry.player.id.clone())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;
    use crate::logging::testing::RecordingLogger;
    use crate::storage::{MemoryStorage, StorageCall};

    struct Harness {
        store: RsvpStore,
        storage: Rc<MemoryStorage>,
        logger: Rc<RecordingLogger>,
    }

    fn harness_with(storage: MemoryStorage) -> Harness {
        let storage = Rc::new(storage);
        let logger = Rc::new(RecordingLogger::default());
        let store = RsvpStore::open(Box::new(Rc::clone(&storage)), Box::new(Rc::clone(&logger)));
        Harness {
            store,
            storage,
            logger,
        }
    }

    fn harness_with_broken_reads() -> Harness {
        let storage = MemoryStorage::new();
        storage.fail_reads(true);
        harness_with(storage)
    }

    fn harness() -> Harness {
        harness_with(MemoryStorage::new())
    }

    fn player(id: &str, name: &str) -> Player {
        Player::new(id, name, "123")
    }

    fn saved_entries(storage: &MemoryStorage) -> Option<Vec<RsvpEntry>> {
        storage
            .raw(STORAGE_KEY)
            .map(|bytes| serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn starts_empty_without_saved_value() {
        let h = harness();
        assert!(h.store.entries().is_empty());
        assert_eq!(
            h.storage.calls(),
            vec![StorageCall::Load {
                key: STORAGE_KEY.into()
            }]
        );
        assert!(!h.logger.contains("Loaded"));
    }

    #[test]
    fn add_appends_publishes_and_persists() {
        let mut h = harness();
        let alice = player("1", "Alice");

        assert_eq!(h.store.add(alice.clone(), RsvpStatus::Yes), Outcome::Added);

        let entries = h.store.all_entries().get();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].player.name, "Alice");
        assert_eq!(saved_entries(&h.storage).as_deref(), Some(entries.as_slice()));
        assert!(h.logger.contains("RSVP added for Alice: Yes"));
    }

    #[test]
    fn duplicate_add_keeps_first_status() {
        let mut h = harness();
        let alice = player("1", "Alice");
        h.store.add(alice.clone(), RsvpStatus::Yes);
        let saves_before = h.storage.calls().len();

        let renamed = Player::new("1", "Alice Again", "999");
        assert_eq!(
            h.store.add(renamed, RsvpStatus::No),
            Outcome::DuplicateSkipped
        );

        let entries = h.store.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, RsvpStatus::Yes);
        assert_eq!(entries[0].player, alice);
        assert_eq!(h.storage.calls().len(), saves_before);
        assert!(h.logger.contains("Add skipped: player Alice Again already exists."));
    }

    #[test]
    fn ids_stay_unique_across_many_adds() {
        let mut h = harness();
        for round in 0..3 {
            for id in ["a", "b", "c", "a", "b"] {
                h.store
                    .add(player(id, &format!("{id}{round}")), RsvpStatus::Maybe);
            }
        }

        let entries = h.store.entries();
        let ids: Vec<&str> = entries.iter().map(|e| e.player.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn update_changes_only_the_matching_status() {
        let mut h = harness();
        let alice = player("1", "Alice");
        let bob = player("2", "Bob");
        h.store.add(alice.clone(), RsvpStatus::Yes);
        h.store.add(bob.clone(), RsvpStatus::Maybe);

        assert_eq!(h.store.update(&alice, RsvpStatus::No), Outcome::Updated);

        let entries = h.store.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], RsvpEntry::new(alice, RsvpStatus::No));
        assert_eq!(entries[1], RsvpEntry::new(bob, RsvpStatus::Maybe));
        assert_eq!(saved_entries(&h.storage).as_deref(), Some(entries.as_slice()));
        assert!(h.logger.contains("RSVP updated for Alice: No"));
    }

    #[test]
    fn update_keeps_stored_player_record() {
        let mut h = harness();
        let original = player("1", "Alice").with_email("a@example.com");
        h.store.add(original.clone(), RsvpStatus::Maybe);

        let edited = Player::new("1", "Someone Else", "000");
        h.store.update(&edited, RsvpStatus::Yes);

        let entries = h.store.entries();
        assert_eq!(entries[0].player, original);
        assert_eq!(entries[0].status, RsvpStatus::Yes);
    }

    #[test]
    fn update_of_missing_player_is_a_logged_no_op() {
        let mut h = harness();
        let ghost = player("x", "Ghost");

        assert_eq!(h.store.update(&ghost, RsvpStatus::No), Outcome::NotFound);

        assert!(h.store.entries().is_empty());
        assert_eq!(h.store.all_entries().version(), 0);
        assert!(saved_entries(&h.storage).is_none());
        assert!(h.logger.contains("Update failed: player Ghost not found."));
    }

    #[test]
    fn add_or_update_dispatches_on_id() {
        let mut h = harness();
        let alice = player("1", "Alice");

        assert_eq!(
            h.store.add_or_update(alice.clone(), RsvpStatus::Maybe),
            Outcome::Added
        );
        assert_eq!(
            h.store.add_or_update(alice, RsvpStatus::Yes),
            Outcome::Updated
        );

        let entries = h.store.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, RsvpStatus::Yes);
    }

    #[test]
    fn counts_follow_statuses() {
        let mut h = harness();
        let statuses = [
            RsvpStatus::Yes,
            RsvpStatus::Yes,
            RsvpStatus::No,
            RsvpStatus::Maybe,
        ];
        for (i, status) in statuses.into_iter().enumerate() {
            h.store.add(player(&i.to_string(), "P"), status);
        }

        assert_eq!(
            h.store.counts().get(),
            RsvpCounts {
                total: 4,
                confirmed: 2,
                declined: 1
            }
        );
    }

    #[test]
    fn confirmed_attendees_keep_roster_order() {
        let mut h = harness();
        let a = player("a", "A");
        let b = player("b", "B");
        let c = player("c", "C");
        h.store.add(a.clone(), RsvpStatus::Yes);
        h.store.add(b, RsvpStatus::No);
        h.store.add(c.clone(), RsvpStatus::Yes);

        assert_eq!(h.store.confirmed_attendees().get(), vec![a, c]);
    }

    #[test]
    fn derived_feeds_replay_then_follow_mutations() {
        let mut h = harness();
        h.store.add(player("1", "A"), RsvpStatus::Yes);

        let counts_seen = Rc::new(RefCell::new(Vec::new()));
        let names_seen = Rc::new(RefCell::new(Vec::new()));
        let counts_sink = Rc::clone(&counts_seen);
        let names_sink = Rc::clone(&names_seen);
        let _counts = h
            .store
            .counts()
            .subscribe(move |counts| counts_sink.borrow_mut().push(counts.confirmed));
        let _names = h.store.confirmed_attendees().subscribe(move |players| {
            names_sink
                .borrow_mut()
                .push(players.iter().map(|p| p.name.clone()).collect::<Vec<_>>())
        });

        h.store.add(player("2", "B"), RsvpStatus::Yes);
        h.store.update(&player("1", "A"), RsvpStatus::No);
        h.store.add(player("2", "B"), RsvpStatus::No);
        h.store.clear_all();

        assert_eq!(*counts_seen.borrow(), vec![1, 2, 1, 0]);
        assert_eq!(
            *names_seen.borrow(),
            vec![
                vec!["A".to_string()],
                vec!["A".to_string(), "B".to_string()],
                vec!["B".to_string()],
                Vec::<String>::new(),
            ]
        );
    }

    #[test]
    fn meta_passes_through_untouched() {
        let mut h = harness();
        let tagged = player("1", "A").with_meta(json!({ "team": ["red", 3] }));
        h.store.add(tagged.clone(), RsvpStatus::Maybe);

        let saved = saved_entries(&h.storage).unwrap();
        assert_eq!(saved[0].player.meta, tagged.meta);
    }

    #[test]
    fn clear_all_resets_and_clears_storage() {
        let mut h = harness();
        h.store.add(player("1", "A"), RsvpStatus::Yes);
        h.store.add(player("2", "B"), RsvpStatus::No);
        let calls_before = h.storage.calls().len();

        assert_eq!(h.store.clear_all(), Outcome::Cleared);

        assert!(h.store.all_entries().get().is_empty());
        assert_eq!(h.store.counts().get(), RsvpCounts::default());
        assert_eq!(
            h.storage.calls()[calls_before..],
            [StorageCall::Clear {
                key: STORAGE_KEY.into()
            }]
        );
        assert!(h.storage.raw(STORAGE_KEY).is_none());
        assert!(h.logger.contains("Cleared all RSVP entries."));
    }

    #[test]
    fn reopening_restores_saved_roster() {
        let mut h = harness();
        h.store.add(player("1", "A"), RsvpStatus::Yes);
        h.store.add(player("2", "B").with_email("b@x"), RsvpStatus::Maybe);
        h.store.update(&player("2", "B"), RsvpStatus::No);
        let bytes = h.storage.raw(STORAGE_KEY).unwrap();

        let reopened = harness_with(MemoryStorage::seeded(STORAGE_KEY, bytes));

        assert_eq!(reopened.store.entries(), h.store.entries());
        assert!(reopened
            .logger
            .contains("Loaded saved RSVP entries from storage."));
    }

    #[test]
    fn malformed_saved_value_starts_empty() {
        let h = harness_with(MemoryStorage::seeded(STORAGE_KEY, "{not json"));

        assert!(h.store.entries().is_empty());
        assert!(h.logger.warned("malformed"));
        assert_eq!(h.storage.raw(STORAGE_KEY), Some(b"{not json".to_vec()));
        assert!(h.store.load_failure().unwrap().contains("malformed"));
    }

    #[test]
    fn rejected_saved_value_is_not_overwritten_until_cleared() {
        let mut h = harness_with(MemoryStorage::seeded(STORAGE_KEY, "{not json"));

        assert_eq!(h.store.add(player("1", "A"), RsvpStatus::Yes), Outcome::Added);

        assert_eq!(h.store.entries().len(), 1);
        assert_eq!(h.storage.raw(STORAGE_KEY), Some(b"{not json".to_vec()));
        assert!(h.logger.warned("RSVP list not saved"));
        assert!(!h
            .storage
            .calls()
            .iter()
            .any(|call| matches!(call, StorageCall::Save { .. })));

        h.store.clear_all();
        assert!(h.store.load_failure().is_none());
        h.store.add(player("2", "B"), RsvpStatus::No);

        let saved = saved_entries(&h.storage).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].player.id, "2");
    }

    #[test]
    fn saved_value_with_repeated_id_is_rejected() {
        let raw = json!([
            { "player": { "id": "1", "name": "A", "phone": "1" }, "status": "Yes" },
            { "player": { "id": "1", "name": "B", "phone": "2" }, "status": "No" }
        ])
        .to_string();
        let h = harness_with(MemoryStorage::seeded(STORAGE_KEY, raw));

        assert!(h.store.entries().is_empty());
        assert!(h.logger.warned("repeats player id '1'"));
    }

    // Storage failures are absorbed: the roster keeps changing in memory and
    // the failure is reported through `storage_error` and a warning.
    #[test]
    fn failed_save_degrades_to_memory_only() {
        let mut h = harness();
        h.storage.fail_writes(true);

        assert_eq!(h.store.add(player("1", "A"), RsvpStatus::Yes), Outcome::Added);

        assert_eq!(h.store.entries().len(), 1);
        assert!(matches!(
            h.store.storage_error(),
            Some(StorageError::Unavailable(_))
        ));
        assert!(h.logger.warned("Storage save failed"));
        assert!(h.storage.raw(STORAGE_KEY).is_none());

        h.storage.fail_writes(false);
        h.store.add(player("2", "B"), RsvpStatus::No);

        assert!(h.store.storage_error().is_none());
        assert_eq!(saved_entries(&h.storage).unwrap().len(), 2);
    }

    #[test]
    fn unreadable_storage_holds_back_saves() {
        let mut h = harness_with_broken_reads();

        assert!(h.store.entries().is_empty());
        assert!(h.logger.warned("Could not read saved RSVP entries"));
        assert_eq!(
            h.store.load_failure(),
            Some("storage unavailable: disk unreadable")
        );

        h.store.add(player("1", "A"), RsvpStatus::Yes);

        assert_eq!(h.store.entries().len(), 1);
        assert!(h.store.storage_error().is_some());
        assert!(h.storage.raw(STORAGE_KEY).is_none());
    }

    #[test]
    fn failed_clear_still_empties_memory() {
        let mut h = harness();
        h.store.add(player("1", "A"), RsvpStatus::Yes);
        h.storage.fail_writes(true);

        h.store.clear_all();

        assert!(h.store.entries().is_empty());
        assert!(h.store.storage_error().is_some());
        assert!(h.storage.raw(STORAGE_KEY).is_some());
    }
}
