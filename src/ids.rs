//! Player id generation. The store trusts ids to be unique but never makes
//! them; the add-player form asks an [`IdGenerator`] for one.

use uuid::Uuid;

pub trait IdGenerator {
    fn generate(&self) -> String;
}

/// Random v4 UUIDs in hyphenated form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
