use pbkdf2::pbkdf2;
use rand::Rng;

use crate::HmacSha256;

const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;
const PBKDF2_ITERATIONS: u32 = 100_000;

/// Function to generate a random per-record salt
pub fn generate_random_salt() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..SALT_LEN).map(|_| rng.gen()).collect()
}

/// Function to derive a 32-byte key from a password and salt using PBKDF2
fn derive_key(password: &str, salt: &[u8]) -> Vec<u8> {
    let mut key = vec![0u8; KEY_LEN];

    pbkdf2::<HmacSha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);

    key
}

/// Digest a plaintext password for storage.
/// Each digest carries its own random salt, stored as "hex(salt)$hex(key)",
/// so verification needs nothing beyond the stored string itself.
pub fn digest_password(password: &str) -> String {
    let salt = generate_random_salt();
    let key = derive_key(password, &salt);

    format!("{}${}", hex::encode(&salt), hex::encode(&key))
}

/// Verify a plaintext password against a stored digest.
/// A malformed digest verifies as false rather than failing.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let (salt_hex, key_hex) = match stored.split_once('$') {
        Some(parts) => parts,
        None => return false,
    };

    let salt = match hex::decode(salt_hex) {
        Ok(salt) => salt,
        Err(_) => return false,
    };
    let expected = match hex::decode(key_hex) {
        Ok(key) => key,
        Err(_) => return false,
    };

    derive_key(password, &salt) == expected
}
