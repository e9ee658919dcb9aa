// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{
    auth,
    email,
    storage,
    utils,
};

// Re-export commonly used types
pub use modules::auth::reset::{ResetFlow, ResetStep};
pub use modules::auth::store::{CredentialStore, StoreError, UserRecord, ValidationError};
pub use modules::email::SecureEmailManager;
pub use modules::storage::{FileStore, KeyValueStore, MemoryStore};

// Constants
pub const USER_DATA_KEY: &str = "userData";
pub const MIN_PASSWORD_LEN: usize = 6;
pub const SENTINEL_PASSWORD: &str = "undefined";
pub const DASHBOARD_URL: &str =
    "https://n8n.rannyzyzz.com.br/webhook/f0cea945-1b5c-4e26-b53f-2fdd955a11f6";

// Type aliases
pub type HmacSha256 = hmac::Hmac<sha2::Sha256>;
