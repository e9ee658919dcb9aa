pub mod file;
pub mod memory;

// Re-export the backends
pub use file::FileStore;
pub use memory::MemoryStore;

use std::io;

/// Port to the durable key-value blob store backing the user registry.
/// The store is injected into `CredentialStore` so callers can swap the
/// file-backed implementation for an in-memory one.
pub trait KeyValueStore {
    /// Fetch the blob stored under a key. A key that has never been
    /// written is a normal `None`, not an error.
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Overwrite the blob under a key wholesale.
    fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Delete a key and its blob entirely.
    fn remove(&self, key: &str) -> io::Result<()>;
}

// A shared reference to a store is itself a store, so a backend can be
// handed to a consumer while the owner keeps access to it.
impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        (**self).remove(key)
    }
}
