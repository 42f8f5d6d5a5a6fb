//! Account entity - a user who owns batches
//!
//! Passwords are stored as a salted SHA-256 digest. This keeps plain text off
//! disk; it is not meant as hardened credential storage.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password_hash: String,
    pub salt: String,
}

impl Account {
    /// Create an account with a fresh random salt
    pub fn new(username: impl Into<String>, password: &str) -> Self {
        let salt_bytes: [u8; 16] = rand::rng().random();
        let salt = to_hex(&salt_bytes);
        let password_hash = hash_password(&salt, password);
        Self {
            username: username.into(),
            password_hash,
            salt,
        }
    }

    /// Check a candidate password against the stored digest
    pub fn verify(&self, password: &str) -> bool {
        hash_password(&self.salt, password) == self.password_hash
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    to_hex(&hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_password() {
        let account = Account::new("alice", "s3cret");
        assert!(account.verify("s3cret"));
        assert!(!account.verify("wrong"));
        assert!(!account.verify(""));
    }

    #[test]
    fn test_salt_differs_per_account() {
        let a = Account::new("alice", "same");
        let b = Account::new("bob", "same");
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.password_hash, b.password_hash);
        assert_eq!(a.salt.len(), 32);
        assert_eq!(a.password_hash.len(), 64);
    }

    #[test]
    fn test_password_not_stored() {
        let account = Account::new("alice", "plaintext-password");
        let yaml = serde_yml::to_string(&account).unwrap();
        assert!(!yaml.contains("plaintext-password"));
    }
}
