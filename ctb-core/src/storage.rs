use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

/// Key under which the client-credential (application) token is cached.
pub const APP_TOKEN_KEY: &str = "ctb_app_access_token";

/// Key under which the logged-in user's token is cached.
pub const USER_TOKEN_KEY: &str = "ctb_user_access_token";

/// Key/value storage for access tokens.
///
/// One store may be shared by many concurrent upload runs, so every method
/// must be safe to call from several tasks at once.
pub trait CredentialStore: Send + Sync {
    fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str);

    fn delete(&self, key: &str);

    fn clear(&self);
}

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn has(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        debug!(key, "storing credential");
        self.values.write().insert(key.to_string(), value.to_string());
    }

    fn delete(&self, key: &str) {
        debug!(key, "deleting credential");
        self.values.write().remove(key);
    }

    fn clear(&self) {
        self.values.write().clear();
    }
}
