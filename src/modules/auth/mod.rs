pub mod digest;
pub mod reset;
pub mod store;
pub mod user_interface;

// Re-export the main types and functions
pub use digest::{digest_password, verify_password};
pub use reset::{generate_temp_code, ResetFlow, ResetStep};
pub use store::{CredentialStore, StoreError, UserRecord, ValidationError};
