//! The signed-in identity whose id scopes the persisted conversation list.

use serde::{Deserialize, Serialize};

/// Slot key used while no identity is signed in.
const GUEST_KEY: &str = "conversations_guest";

/// Display attributes supplied by the identity provider.
///
/// The store never reads these; only the id participates in key namespacing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Display name.
    pub display_name: Option<String>,
    /// Avatar URL.
    pub photo_url: Option<String>,
    /// Company, when provided at registration.
    pub company: Option<String>,
}

/// The identity that owns a conversation list.
///
/// Switching identities constructs a fresh store over a different slot key,
/// so conversations can never leak between identities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    /// Unauthenticated placeholder identity.
    Guest,
    /// Authenticated user with a stable unique id.
    User {
        /// Stable unique id from the identity provider.
        uid: String,
        /// Display attributes; ignored by the store.
        profile: UserProfile,
    },
}

impl Identity {
    /// Authenticated identity with no display attributes.
    #[must_use]
    pub fn user(uid: impl Into<String>) -> Self {
        Self::User {
            uid: uid.into(),
            profile: UserProfile::default(),
        }
    }

    /// Key of the storage slot holding this identity's conversations.
    #[must_use]
    pub fn storage_key(&self) -> String {
        match self {
            Self::Guest => GUEST_KEY.to_string(),
            Self::User { uid, .. } => format!("conversations_{uid}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_key_is_fixed() {
        assert_eq!(Identity::Guest.storage_key(), "conversations_guest");
    }

    #[test]
    fn test_user_keys_embed_the_uid() {
        assert_eq!(Identity::user("u1").storage_key(), "conversations_u1");
        assert_eq!(Identity::user("u2").storage_key(), "conversations_u2");
    }

    #[test]
    fn test_guest_and_user_slots_never_share_a_key() {
        // Provider uids are opaque random strings, never the literal "guest".
        let guest = Identity::Guest.storage_key();
        let user = Identity::user("fYx2kQ9rT1aZ").storage_key();
        assert_ne!(guest, user);
    }
}
