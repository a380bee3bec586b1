//! Jenkins one-at-a-time hash.

/// Computes the 32-bit digest of a record key.
///
/// Every byte of the key is mixed in, followed by a final avalanche. All
/// arithmetic wraps, so any input (including the empty string) is valid.
pub fn digest(key: &str) -> u32 {
    let mut hash: u32 = 0;
    for &byte in key.as_bytes() {
        hash = hash.wrapping_add(u32::from(byte));
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash.wrapping_add(hash << 15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(digest(""), 0);
        assert_eq!(digest("a"), 0xca2e_9442);
        assert_eq!(
            digest("The quick brown fox jumps over the lazy dog"),
            0x519e_91f5
        );
        assert_eq!(digest("alice"), 1_031_422_857);
        assert_eq!(digest("bob"), 4_065_264_892);
    }

    #[test]
    fn repeated_calls_agree() {
        for key in ["alice", "bob", "carol", "", "k11310"] {
            assert_eq!(digest(key), digest(key));
        }
    }

    #[test]
    fn distinct_keys_can_collide() {
        assert_eq!(digest("k11310"), digest("k19528"));
        assert_eq!(digest("k11310"), 2_456_160_739);
    }
}
