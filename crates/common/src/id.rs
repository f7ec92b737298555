//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// Length of the random suffix appended to colliding slugs.
pub const SLUG_SUFFIX_LEN: usize = 8;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are lexicographically sortable, so ordering by ID roughly
    /// follows creation time.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a random bearer token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // No time component, unlike ULIDs
        Uuid::new_v4().simple().to_string()
    }

    /// Generate an 8-character lowercase hexadecimal suffix (32 random bits).
    #[must_use]
    pub fn generate_slug_suffix(&self) -> String {
        let mut hex = Uuid::new_v4().simple().to_string();
        hex.truncate(SLUG_SUFFIX_LEN);
        hex
    }
}
