//! Token index hashes for batched conditional lookups.
//!
//! Single-token conditional expressions are resolved in bulk against the
//! token index. Each index row stores a 64-bit hash of the indexed
//! coordinates; the same framing is reproduced here so engine-computed
//! hashes line up with stored rows.

use xxhash_rust::xxh3::Xxh3;

use crate::partition::PartitionId;

/// Hash layout version. Bump when the framing below changes.
const HASH_VERSION: u8 = 1;

/// Hashes a token parameter by system and value.
pub fn hash_token_system_and_value(
    partition: Option<PartitionId>,
    resource_type: &str,
    param_name: &str,
    system: &str,
    value: &str,
) -> u64 {
    hash_parts(partition, &[resource_type, param_name, system, value])
}

/// Hashes a token parameter by value alone.
pub fn hash_token_value(
    partition: Option<PartitionId>,
    resource_type: &str,
    param_name: &str,
    value: &str,
) -> u64 {
    hash_parts(partition, &[resource_type, param_name, value])
}

/// Hashes length-framed parts with an optional partition prefix.
///
/// Each part is framed by its byte length so adjacent parts cannot collide
/// by shifting bytes between them.
fn hash_parts(partition: Option<PartitionId>, parts: &[&str]) -> u64 {
    let mut hasher = Xxh3::with_seed(0);
    feed_u8(&mut hasher, HASH_VERSION);
    match partition {
        Some(id) => {
            feed_u8(&mut hasher, 1);
            feed_i32(&mut hasher, id.value());
        }
        None => feed_u8(&mut hasher, 0),
    }
    feed_u8(&mut hasher, parts.len() as u8);
    for part in parts {
        feed_bytes(&mut hasher, part.as_bytes());
    }
    hasher.digest()
}

fn feed_u8(hasher: &mut Xxh3, v: u8) {
    hasher.update(&[v]);
}

fn feed_i32(hasher: &mut Xxh3, v: i32) {
    hasher.update(&v.to_le_bytes());
}

fn feed_u32(hasher: &mut Xxh3, v: u32) {
    hasher.update(&v.to_le_bytes());
}

fn feed_bytes(hasher: &mut Xxh3, bytes: &[u8]) {
    feed_u32(hasher, bytes.len() as u32);
    hasher.update(bytes);
}
