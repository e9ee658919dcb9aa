use std::time::{SystemTime, UNIX_EPOCH};

use keyring::Entry;
use serde::{Deserialize, Serialize};

/// SMTP credentials with metadata, as serialized into the system keyring
#[derive(Serialize, Deserialize)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub last_updated: u64,
}

/// Keeps the SMTP credentials for code delivery in the system keyring
/// instead of a file on disk.
pub struct SecureEmailManager {
    keyring: Entry,
}

impl SecureEmailManager {
    pub fn new() -> Self {
        Self {
            keyring: Entry::new("first-access", "smtp-credentials")
                .expect("Failed to create keyring entry"),
        }
    }

    /// Store new SMTP credentials, replacing any previous ones
    pub fn store_credentials(
        &self,
        username: &str,
        password: &str,
        host: &str,
        port: u16,
    ) -> Result<(), String> {
        let credentials = SmtpCredentials {
            username: username.to_string(),
            password: password.to_string(),
            host: host.to_string(),
            port,
            last_updated: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_secs(),
        };

        let creds_json = serde_json::to_string(&credentials)
            .map_err(|e| format!("Failed to serialize credentials: {}", e))?;

        self.keyring
            .set_password(&creds_json)
            .map_err(|e| format!("Failed to store credentials: {}", e))
    }

    /// Retrieve the stored SMTP credentials
    pub fn get_credentials(&self) -> Result<SmtpCredentials, String> {
        let creds_json = self
            .keyring
            .get_password()
            .map_err(|e| format!("Failed to retrieve credentials: {}", e))?;

        serde_json::from_str(&creds_json).map_err(|e| format!("Failed to parse credentials: {}", e))
    }

    /// Whether a usable set of credentials has been stored
    pub fn has_credentials(&self) -> bool {
        self.get_credentials().is_ok()
    }

    /// Delete the stored credentials
    pub fn delete_credentials(&self) -> Result<(), String> {
        self.keyring
            .delete_password()
            .map_err(|e| format!("Failed to delete credentials: {}", e))
    }
}

impl Default for SecureEmailManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The real manager talks to the system keyring, so tests run against a
    // mock with the same surface
    struct MockEmailManager {
        stored: Option<SmtpCredentials>,
    }

    impl MockEmailManager {
        fn new() -> Self {
            Self { stored: None }
        }

        fn store_credentials(
            &mut self,
            username: &str,
            password: &str,
            host: &str,
            port: u16,
        ) -> Result<(), String> {
            self.stored = Some(SmtpCredentials {
                username: username.to_string(),
                password: password.to_string(),
                host: host.to_string(),
                port,
                last_updated: 0,
            });
            Ok(())
        }

        fn get_credentials(&self) -> Result<&SmtpCredentials, String> {
            self.stored.as_ref().ok_or("No credentials stored".to_string())
        }

        fn delete_credentials(&mut self) -> Result<(), String> {
            self.stored = None;
            Ok(())
        }
    }

    #[test]
    fn test_credential_life_cycle() {
        let mut manager = MockEmailManager::new();

        assert!(manager.get_credentials().is_err());

        manager
            .store_credentials("sender@example.com", "app-password", "smtp.example.com", 587)
            .unwrap();

        let creds = manager.get_credentials().unwrap();
        assert_eq!(creds.username, "sender@example.com");
        assert_eq!(creds.host, "smtp.example.com");
        assert_eq!(creds.port, 587);

        manager.delete_credentials().unwrap();
        assert!(manager.get_credentials().is_err());
    }
}
