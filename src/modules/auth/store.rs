use std::collections::HashMap;
use std::io;

use serde::{Deserialize, Serialize};

use super::digest::{digest_password, verify_password};
use crate::modules::storage::KeyValueStore;
use crate::modules::utils::logging::log_data_operation;
use crate::{MIN_PASSWORD_LEN, USER_DATA_KEY};

/// Reasons a caller-supplied input is rejected before any storage call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingEmail,
    MissingPassword,
    MissingFields,
    MissingCode,
    PasswordMismatch,
    PasswordTooShort,
    InvalidCode,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingEmail => write!(f, "Please enter your email."),
            ValidationError::MissingPassword => {
                write!(f, "A password is required for a new user.")
            }
            ValidationError::MissingFields => write!(f, "Please fill in every field."),
            ValidationError::MissingCode => write!(f, "Please enter the code."),
            ValidationError::PasswordMismatch => write!(f, "The passwords do not match."),
            ValidationError::PasswordTooShort => write!(
                f,
                "The password must be at least {} characters long.",
                MIN_PASSWORD_LEN
            ),
            ValidationError::InvalidCode => write!(f, "Invalid code. Please try again."),
        }
    }
}

/// Custom error type for credential store operations
#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    Persistence(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Validation(e) => write!(f, "{}", e),
            StoreError::Persistence(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(error: ValidationError) -> Self {
        StoreError::Validation(error)
    }
}

impl From<io::Error> for StoreError {
    fn from(error: io::Error) -> Self {
        StoreError::Persistence(error.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Persistence(error.to_string())
    }
}

/// A single registered user as persisted in the registry blob
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub email: String,
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
    #[serde(rename = "tempCode", skip_serializing_if = "Option::is_none")]
    pub temp_code: Option<String>,
}

impl UserRecord {
    /// A record carrying a pending one-time code
    pub fn is_reset_pending(&self) -> bool {
        self.temp_code.is_some()
    }
}

/// Durable email-to-record mapping, persisted as one JSON blob under the
/// "userData" key of the injected backend. Every mutation reads the whole
/// registry, updates one entry and writes the whole thing back.
pub struct CredentialStore<S: KeyValueStore> {
    backend: S,
}

impl<S: KeyValueStore> CredentialStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Read the full registry from the backend. A blob that was never
    /// written is an empty registry.
    fn load_registry(&self) -> Result<HashMap<String, UserRecord>, StoreError> {
        match self.backend.get(USER_DATA_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(HashMap::new()),
        }
    }

    /// Write the full registry back as a single blob.
    fn save_registry(&self, registry: &HashMap<String, UserRecord>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(registry)?;
        self.backend.set(USER_DATA_KEY, &raw)?;
        Ok(())
    }

    /// Create or update the record for an email.
    ///
    /// A new record requires a password. For an existing record a given
    /// password replaces the stored digest, and the code field follows the
    /// argument literally: a given code is stored, an absent one clears any
    /// pending code. Callers that want the code kept must pass its current
    /// value back.
    pub fn upsert_user(
        &self,
        email: &str,
        password: Option<&str>,
        temp_code: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut registry = self.load_registry()?;

        match registry.get_mut(email) {
            Some(record) => {
                if let Some(password) = password {
                    record.password_hash = digest_password(password);
                }
                record.temp_code = temp_code.map(|code| code.to_string());
            }
            None => {
                let password = password.ok_or(ValidationError::MissingPassword)?;
                registry.insert(
                    email.to_string(),
                    UserRecord {
                        email: email.to_string(),
                        password_hash: digest_password(password),
                        temp_code: temp_code.map(|code| code.to_string()),
                    },
                );
            }
        }

        match self.save_registry(&registry) {
            Ok(()) => {
                log_data_operation("upsert_user", email, "user_registry", true, None);
                Ok(())
            }
            Err(e) => {
                log_data_operation(
                    "upsert_user",
                    email,
                    "user_registry",
                    false,
                    Some(&e.to_string()),
                );
                Err(e)
            }
        }
    }

    /// Look up a record by exact email. A missing registry or key is a
    /// normal `None`; backend read failures are logged and collapsed to
    /// `None` as well instead of surfacing to the caller.
    pub fn get_user_by_email(&self, email: &str) -> Option<UserRecord> {
        match self.load_registry() {
            Ok(registry) => registry.get(email).cloned(),
            Err(e) => {
                log_data_operation(
                    "get_user_by_email",
                    email,
                    "user_registry",
                    false,
                    Some(&e.to_string()),
                );
                None
            }
        }
    }

    /// Check a password against the stored digest for an email.
    /// Unknown emails, empty digests and backend failures all answer false;
    /// this never fails.
    pub fn authenticate(&self, email: &str, password: &str) -> bool {
        match self.get_user_by_email(email) {
            Some(record) if !record.password_hash.is_empty() => {
                verify_password(password, &record.password_hash)
            }
            _ => false,
        }
    }

    /// Delete the entire registry. Irreversible.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        match self.backend.remove(USER_DATA_KEY) {
            Ok(()) => {
                log_data_operation("clear_all", "-", "user_registry", true, None);
                Ok(())
            }
            Err(e) => {
                log_data_operation("clear_all", "-", "user_registry", false, Some(&e.to_string()));
                Err(StoreError::from(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::MemoryStore;

    fn setup_test_store() -> CredentialStore<MemoryStore> {
        CredentialStore::new(MemoryStore::new())
    }

    /// Backend whose every call fails, for exercising the error policy
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> io::Result<Option<String>> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }

        fn set(&self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }

        fn remove(&self, _key: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn test_upsert_then_get() {
        let store = setup_test_store();

        store
            .upsert_user("a@b.com", Some("secret1"), None)
            .unwrap();

        let record = store.get_user_by_email("a@b.com").unwrap();
        assert_eq!(record.email, "a@b.com");
        assert!(verify_password("secret1", &record.password_hash));
        assert_eq!(record.temp_code, None);
        assert!(!record.is_reset_pending());
    }

    #[test]
    fn test_new_user_requires_password() {
        let store = setup_test_store();

        let result = store.upsert_user("a@b.com", None, Some("1234"));
        assert!(matches!(
            result,
            Err(StoreError::Validation(ValidationError::MissingPassword))
        ));

        // Nothing was written
        assert!(store.get_user_by_email("a@b.com").is_none());
    }

    #[test]
    fn test_absent_code_argument_clears_pending_code() {
        let store = setup_test_store();

        store
            .upsert_user("a@b.com", Some("secret1"), Some("1234"))
            .unwrap();
        assert_eq!(
            store.get_user_by_email("a@b.com").unwrap().temp_code,
            Some("1234".to_string())
        );

        // An update without the code argument wipes the pending code
        store.upsert_user("a@b.com", None, None).unwrap();
        assert_eq!(store.get_user_by_email("a@b.com").unwrap().temp_code, None);
    }

    #[test]
    fn test_update_keeps_digest_when_password_absent() {
        let store = setup_test_store();

        store
            .upsert_user("a@b.com", Some("secret1"), None)
            .unwrap();
        let before = store.get_user_by_email("a@b.com").unwrap().password_hash;

        store.upsert_user("a@b.com", None, Some("1234")).unwrap();
        let after = store.get_user_by_email("a@b.com").unwrap().password_hash;

        assert_eq!(before, after);
        assert!(store.authenticate("a@b.com", "secret1"));
    }

    #[test]
    fn test_authenticate() {
        let store = setup_test_store();

        store
            .upsert_user("a@b.com", Some("secret1"), None)
            .unwrap();

        assert!(store.authenticate("a@b.com", "secret1"));
        assert!(!store.authenticate("a@b.com", "wrong"));
        assert!(!store.authenticate("nobody@b.com", "secret1"));
    }

    #[test]
    fn test_email_is_case_sensitive() {
        let store = setup_test_store();

        store
            .upsert_user("a@b.com", Some("secret1"), None)
            .unwrap();

        assert!(store.get_user_by_email("A@b.com").is_none());
        assert!(!store.authenticate("A@b.com", "secret1"));
    }

    #[test]
    fn test_clear_all_wipes_every_record() {
        let store = setup_test_store();

        store
            .upsert_user("a@b.com", Some("secret1"), None)
            .unwrap();
        store
            .upsert_user("c@d.com", Some("secret2"), None)
            .unwrap();

        store.clear_all().unwrap();

        assert!(store.get_user_by_email("a@b.com").is_none());
        assert!(store.get_user_by_email("c@d.com").is_none());
    }

    #[test]
    fn test_reads_swallow_backend_failures() {
        let store = CredentialStore::new(BrokenStore);

        // Lookup and authenticate collapse the failure instead of raising
        assert!(store.get_user_by_email("a@b.com").is_none());
        assert!(!store.authenticate("a@b.com", "secret1"));
    }

    #[test]
    fn test_writes_propagate_backend_failures() {
        let store = CredentialStore::new(BrokenStore);

        assert!(matches!(
            store.upsert_user("a@b.com", Some("secret1"), None),
            Err(StoreError::Persistence(_))
        ));
        assert!(matches!(store.clear_all(), Err(StoreError::Persistence(_))));
    }

    #[test]
    fn test_corrupt_blob_reads_as_absent_but_fails_writes() {
        let backend = MemoryStore::new();
        backend.set(USER_DATA_KEY, "not json at all").unwrap();
        let store = CredentialStore::new(backend);

        assert!(store.get_user_by_email("a@b.com").is_none());
        assert!(!store.authenticate("a@b.com", "secret1"));
        assert!(matches!(
            store.upsert_user("a@b.com", Some("secret1"), None),
            Err(StoreError::Persistence(_))
        ));
    }

    #[test]
    fn test_registry_wire_format() {
        let store = setup_test_store();

        store
            .upsert_user("a@b.com", Some("secret1"), Some("1234"))
            .unwrap();
        store
            .upsert_user("c@d.com", Some("secret2"), None)
            .unwrap();

        let raw = store.backend.get(USER_DATA_KEY).unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();

        // One JSON object keyed by email
        let pending = &parsed["a@b.com"];
        assert_eq!(pending["email"], "a@b.com");
        assert!(pending["passwordHash"].is_string());
        assert_eq!(pending["tempCode"], "1234");

        // An absent code is omitted from the record entirely
        let settled = parsed["c@d.com"].as_object().unwrap();
        assert!(!settled.contains_key("tempCode"));
    }
}
