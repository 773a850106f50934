//! Domain models shared by the entry store, the persistence layer and the TUI.
//! They stay plain data holders: the store owns the rules about identity and
//! the UI owns formatting, so nothing here needs to know about either.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A person on the roster. `id` is the only field the store ever compares;
/// every other field is carried along untouched.
pub struct Player {
    /// Opaque identifier handed out by an [`IdGenerator`](crate::ids::IdGenerator).
    /// Never changes once the player exists.
    pub id: String,
    /// Display name, trimmed by the caller before it reaches the store.
    pub name: String,
    /// Contact number, trimmed by the caller as well.
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Free-form extension slot (team, role, ...). The store round-trips it
    /// through storage without looking inside.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            phone: phone.into(),
            email: None,
            meta: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// The three answers a player can give. Serialized as its label so the
/// persisted JSON reads `"status": "Yes"`.
pub enum RsvpStatus {
    Yes,
    Maybe,
    No,
}

impl RsvpStatus {
    /// Every status in the order the form and the status buttons present them.
    pub const ALL: [RsvpStatus; 3] = [RsvpStatus::Yes, RsvpStatus::Maybe, RsvpStatus::No];

    pub fn label(self) -> &'static str {
        match self {
            RsvpStatus::Yes => "Yes",
            RsvpStatus::Maybe => "Maybe",
            RsvpStatus::No => "No",
        }
    }

    /// Step through [`RsvpStatus::ALL`], wrapping at both ends. Used by the
    /// Left/Right bindings in the roster and the add form.
    pub fn cycle(self, offset: isize) -> RsvpStatus {
        let len = Self::ALL.len() as isize;
        let current = Self::ALL.iter().position(|s| *s == self).unwrap_or(0) as isize;
        let next = (current + offset).rem_euclid(len) as usize;
        Self::ALL[next]
    }
}

impl fmt::Display for RsvpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// One roster line: a player and the answer they gave.
pub struct RsvpEntry {
    pub player: Player,
    pub status: RsvpStatus,
}

impl RsvpEntry {
    pub fn new(player: Player, status: RsvpStatus) -> Self {
        Self { player, status }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Summary numbers shown in the footer. Always derived from the entry list,
/// never stored. `Maybe` answers only show up in `total`.
pub struct RsvpCounts {
    pub total: usize,
    pub confirmed: usize,
    pub declined: usize,
}

impl RsvpCounts {
    pub fn tally(entries: &[RsvpEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut counts, entry| {
            counts.total += 1;
            match entry.status {
                RsvpStatus::Yes => counts.confirmed += 1,
                RsvpStatus::No => counts.declined += 1,
                RsvpStatus::Maybe => {}
            }
            counts
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_serializes_as_label() {
        let entry = RsvpEntry::new(Player::new("1", "Alice", "123"), RsvpStatus::Maybe);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "player": { "id": "1", "name": "Alice", "phone": "123" },
                "status": "Maybe"
            })
        );
    }

    #[test]
    fn optional_fields_round_trip() {
        let player = Player::new("7", "Bo", "555")
            .with_email("bo@example.com")
            .with_meta(json!({ "team": "blue", "captain": true }));
        let raw = serde_json::to_string(&player).unwrap();
        let back: Player = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, player);
    }

    #[test]
    fn unknown_status_label_is_rejected_on_decode() {
        let raw = r#"{"player":{"id":"1","name":"A","phone":"1"},"status":"Perhaps"}"#;
        assert!(serde_json::from_str::<RsvpEntry>(raw).is_err());
    }

    #[test]
    fn cycle_wraps_both_directions() {
        assert_eq!(RsvpStatus::Yes.cycle(1), RsvpStatus::Maybe);
        assert_eq!(RsvpStatus::No.cycle(1), RsvpStatus::Yes);
        assert_eq!(RsvpStatus::Yes.cycle(-1), RsvpStatus::No);
    }

    #[test]
    fn tally_ignores_maybe_outside_total() {
        let entries: Vec<RsvpEntry> = [
            RsvpStatus::Yes,
            RsvpStatus::Yes,
            RsvpStatus::No,
            RsvpStatus::Maybe,
        ]
        .into_iter()
        .enumerate()
        .map(|(i, s)| RsvpEntry::new(Player::new(i.to_string(), "P", "0"), s))
        .collect();

        assert_eq!(
            RsvpCounts::tally(&entries),
            RsvpCounts {
                total: 4,
                confirmed: 2,
                declined: 1
            }
        );
    }
}
