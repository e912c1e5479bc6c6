//! Username resolution.
//!
//! Lookups may go through NSS (LDAP, sssd) and be slow, so every uid is
//! resolved at most once per invocation. The cache is owned by the caller
//! and is not shared between threads.

use ahash::AHashMap as HashMap;
use nix::unistd::{Uid, User};
use tracing::debug;

/// Resolves numeric user ids to display names.
pub trait NameLookup {
    fn user_name(&mut self, uid: u32) -> String;
}

/// Append-only uid -> name cache backed by the system user database.
#[derive(Debug, Default)]
pub struct UserNameCache {
    names: HashMap<u32, String>,
}

impl UserNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl NameLookup for UserNameCache {
    /// Falls back to the decimal uid when the user is unknown.
    fn user_name(&mut self, uid: u32) -> String {
        self.names
            .entry(uid)
            .or_insert_with(|| match User::from_uid(Uid::from_raw(uid)) {
                Ok(Some(user)) => user.name,
                Ok(None) => uid.to_string(),
                Err(e) => {
                    debug!("User lookup for uid {} failed: {}", uid, e);
                    uid.to_string()
                }
            })
            .clone()
    }
}

/// Looks up the uid of a named user. `Ok(None)` when no such user exists.
pub fn lookup_uid(name: &str) -> Result<Option<u32>, nix::Error> {
    Ok(User::from_name(name)?.map(|u| u.uid.as_raw()))
}
