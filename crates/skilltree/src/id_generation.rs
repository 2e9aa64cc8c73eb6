//! Hash-based ID generation.
//!
//! IDs are SHA256 digests of the entity's text, a timestamp and a nonce,
//! base36 encoded. The hash length adapts to how many IDs the generator
//! already knows about (4-6 characters), and colliding candidates are retried
//! with the next nonce.
//!
//! - trees: `{prefix}-{hash}` (e.g. `skill-a3f8`)
//! - nodes: `node-{hash}`
//!
//! # Example
//!
//! ```
//! use skilltree::id_generation::IdGenerator;
//!
//! let mut generator = IdGenerator::new("node");
//! let id = generator.generate("Knife skills", "Dice an onion").unwrap();
//! assert!(id.starts_with("node-"));
//! ```

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;
const MAX_LENGTH: usize = 6;

/// Prefix used for node IDs.
pub const NODE_PREFIX: &str = "node";

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Every nonce at every length collided
    #[error("Unable to generate unique ID after {attempts} attempts")]
    CollisionExhausted {
        /// Candidates tried
        attempts: u32,
    },
}

/// Hash-based ID generator with collision detection.
///
/// Seed it with the IDs already in use via [`register_id`](Self::register_id)
/// or [`with_existing`](Self::with_existing).
#[derive(Debug, Clone)]
pub struct IdGenerator {
    prefix: String,
    existing_ids: HashSet<String>,
}

impl IdGenerator {
    /// Create a generator for `{prefix}-{hash}` IDs
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            existing_ids: HashSet::new(),
        }
    }

    /// Create a generator that avoids every ID in `existing`
    pub fn with_existing<I, S>(prefix: impl Into<String>, existing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut generator = Self::new(prefix);
        for id in existing {
            generator.register_id(id);
        }
        generator
    }

    /// Register an existing ID to prevent collisions
    pub fn register_id(&mut self, id: impl Into<String>) {
        self.existing_ids.insert(id.into());
    }

    /// Number of IDs known to the generator
    #[must_use]
    pub fn known_ids(&self) -> usize {
        self.existing_ids.len()
    }

    /// Generate a new unique ID from the entity's title and description.
    ///
    /// # Errors
    ///
    /// Returns [`IdGenerationError::CollisionExhausted`] if no unique ID can
    /// be found at any permitted length.
    pub fn generate(&mut self, title: &str, description: &str) -> Result<String, IdGenerationError> {
        let mut attempts = 0;
        for length in self.adaptive_length()..=MAX_LENGTH {
            for nonce in 0..MAX_NONCE {
                attempts += 1;
                let id = self.hash_id(title, description, nonce, length);
                if self.existing_ids.insert(id.clone()) {
                    if nonce > 0 {
                        debug!(nonce, length, "Generated unique ID after collision retries");
                    }
                    return Ok(id);
                }
            }
            warn!(length, max_nonce = MAX_NONCE, "All nonces exhausted, increasing ID length");
        }

        Err(IdGenerationError::CollisionExhausted { attempts })
    }

    fn hash_id(&self, title: &str, description: &str, nonce: u32, length: usize) -> String {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let content = format!("{title}|{description}|{timestamp}|{nonce}");

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let hash_bytes = hasher.finalize();

        format!("{}-{}", self.prefix, encode_base36(&hash_bytes[..8], length))
    }

    /// - up to 500 known IDs: 4 chars
    /// - up to 1,500: 5 chars
    /// - beyond: 6 chars
    fn adaptive_length(&self) -> usize {
        match self.existing_ids.len() {
            0..=500 => 4,
            501..=1500 => 5,
            _ => MAX_LENGTH,
        }
    }
}

/// Encode up to 8 bytes as a base36 string of exactly `length` characters.
fn encode_base36(bytes: &[u8], length: usize) -> String {
    let mut n = bytes
        .iter()
        .fold(0u64, |acc, &b| acc.wrapping_shl(8).wrapping_add(u64::from(b)));

    let mut result = Vec::with_capacity(length);
    while result.len() < length {
        result.push(BASE36_CHARS[(n % 36) as usize] as char);
        n /= 36;
    }
    result.iter().rev().collect()
}

/// Check that `id` has the form `{prefix}-{hash}` with a 4-6 character
/// lowercase alphanumeric hash.
#[must_use]
pub fn validate_id(id: &str, prefix: &str) -> bool {
    let Some(hash) = id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };

    (4..=MAX_LENGTH).contains(&hash.len())
        && hash
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
}
