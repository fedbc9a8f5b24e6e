//! The 64-bit term hash keying the word dictionary.
//!
//! FNV-1a over the UTF-8 bytes, seeded with `FNV_OFFSET ^ seed`, followed by a
//! three-round avalanche finalizer. The index builder computes the same function;
//! the two must agree bit for bit.

use std::{collections::VecDeque, sync::Mutex};

use ahash::AHashMap;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Default capacity of a [`HashMemo`].
pub const DEFAULT_MEMO_CAPACITY: usize = 1024;

/// Hashes `text` with the default seed.
#[inline]
pub fn hash64(text: &str) -> u64 {
    hash64_with_seed(text.as_bytes(), 0)
}

pub fn hash64_with_seed(bytes: &[u8], seed: u64) -> u64 {
    let mut h = FNV_OFFSET ^ seed;
    for &b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(FNV_PRIME);
    }
    avalanche(h)
}

#[inline]
fn avalanche(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}

/// Bounded `text -> hash64(text)` memo.
///
/// Once the capacity is exceeded the oldest inserted key is evicted (FIFO); lookups
/// do not refresh a key's age.
pub struct HashMemo {
    capacity: usize,
    inner: Mutex<MemoInner>,
}

#[derive(Default)]
struct MemoInner {
    hashes: AHashMap<String, u64>,
    order: VecDeque<String>,
}

impl HashMemo {
    pub fn new() -> HashMemo {
        Self::with_capacity(DEFAULT_MEMO_CAPACITY)
    }

    /// A memo holding at most `capacity` keys; zero disables memoization.
    pub fn with_capacity(capacity: usize) -> HashMemo {
        HashMemo {
            capacity,
            inner: Default::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("lock").hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, text: &str) -> bool {
        self.inner.lock().expect("lock").hashes.contains_key(text)
    }

    /// Returns `hash64(text)`, memoized.
    pub fn hash(&self, text: &str) -> u64 {
        if self.capacity == 0 {
            return hash64(text);
        }
        let mut inner = self.inner.lock().expect("lock");
        if let Some(&h) = inner.hashes.get(text) {
            return h;
        }
        let h = hash64(text);
        inner.hashes.insert(text.to_string(), h);
        inner.order.push_back(text.to_string());
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.hashes.remove(&oldest);
            }
        }
        h
    }

    /// Seeded hashes are never memoized.
    pub fn hash_with_seed(&self, text: &str, seed: u64) -> u64 {
        if seed == 0 {
            self.hash(text)
        } else {
            hash64_with_seed(text.as_bytes(), seed)
        }
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("lock");
        inner.hashes.clear();
        inner.order.clear();
    }
}

impl Default for HashMemo {
    fn default() -> Self {
        HashMemo::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(hash64(""), 0xefd0_1f60_ba99_2926);
        assert_eq!(hash64("a"), 0x82a2_a958_a9be_ce5b);
        assert_eq!(hash64("the"), 0xcb3f_f435_b889_fb31);
        assert_eq!(hash64("cat"), 0x98e2_5a30_2c6e_b1d4);
        assert_eq!(hash64("كتاب"), 0xc7d3_3688_2b7e_0c90);
        assert_eq!(hash64("الله"), 0x0953_88a6_2466_2f9c);
        assert_eq!(hash64_with_seed(b"the", 7), 0x0b93_55b5_d969_621e);
        assert_eq!(hash64_with_seed(b"the", 0), hash64("the"));
    }

    #[test]
    fn test_memo_matches_hash() {
        let memo = HashMemo::new();
        for word in ["the", "cat", "كتاب", "the"] {
            assert_eq!(memo.hash(word), hash64(word));
        }
        assert_eq!(memo.len(), 3);
        assert_eq!(memo.hash_with_seed("dog", 7), hash64_with_seed(b"dog", 7));
        assert!(!memo.contains("dog"));
    }

    #[test]
    fn test_memo_evicts_oldest_inserted_not_least_recent() {
        let memo = HashMemo::with_capacity(2);
        memo.hash("a");
        memo.hash("b");
        // A hit on "a" does not refresh it: eviction is FIFO, not LRU.
        memo.hash("a");
        memo.hash("c");
        assert!(!memo.contains("a"));
        assert!(memo.contains("b"));
        assert!(memo.contains("c"));
        assert_eq!(memo.len(), 2);

        memo.clear();
        assert!(memo.is_empty());
    }

    #[test]
    fn test_zero_capacity() {
        let memo = HashMemo::with_capacity(0);
        assert_eq!(memo.hash("x"), hash64("x"));
        assert!(memo.is_empty());
    }
}
