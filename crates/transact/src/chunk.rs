//! Fixed-size chunking for batched store operations.
//!
//! Large id sets are handed to the store in fixed-size groups so that no
//! single query carries an unbounded parameter list. Chunking implies no
//! ordering guarantee across groups.

/// Default number of items per batched store call.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Splits `items` into fixed-size chunks.
///
/// Every chunk has exactly `size` items except the last, which holds the
/// remainder. A `size` of zero is treated as one.
///
/// # Examples
///
/// ```
/// use helios_transact::chunk;
///
/// let items: Vec<u32> = (0..250).collect();
/// let sizes: Vec<usize> = chunk::chunks(&items, 100).map(|c| c.len()).collect();
/// assert_eq!(sizes, vec![100, 100, 50]);
/// ```
pub fn chunks<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}
