//! Content hashes with pinned outputs.
//!
//! FNV-1a and the 128-bit simhash are part of the data contract: structural
//! hashes and text hashes must be identical across devices and releases, so
//! both are implemented here rather than delegated to a generic hasher.

const FNV32_OFFSET: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;
const FNV64_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 32-bit FNV-1a.
pub fn fnv1a_32(data: &[u8]) -> u32 {
    let mut hash = FNV32_OFFSET;
    for byte in data {
        hash ^= u32::from(*byte);
        hash = hash.wrapping_mul(FNV32_PRIME);
    }
    hash
}

/// 32-bit FNV-1a as 8 lowercase hex characters.
pub fn fnv1a_32_hex(data: &[u8]) -> String {
    format!("{:08x}", fnv1a_32(data))
}

/// 64-bit FNV-1a.
pub fn fnv1a_64(data: &[u8]) -> u64 {
    let mut hash = FNV64_OFFSET;
    for byte in data {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV64_PRIME);
    }
    hash
}

/// 128-bit simhash over character 3-shingles, lowercase hex.
///
/// The input is lowercased and trimmed first. Each shingle contributes a
/// 128-bit signature (two salted FNV-1a 64 halves); the sign of the per-bit
/// vote sum yields the final bit. Empty input hashes to all zeros.
pub fn simhash128(text: &str) -> String {
    let normalized = text.trim().to_lowercase();
    let chars: Vec<char> = normalized.chars().collect();

    let mut votes = [0i32; 128];
    let mut shingle = |s: &str| {
        let hi = fnv1a_64(s.as_bytes());
        let lo = fnv1a_64(format!("{s}\u{1}").as_bytes());
        for bit in 0..64 {
            votes[bit] += if hi >> bit & 1 == 1 { 1 } else { -1 };
            votes[64 + bit] += if lo >> bit & 1 == 1 { 1 } else { -1 };
        }
    };

    if chars.is_empty() {
        return "0".repeat(32);
    }
    if chars.len() < 3 {
        shingle(&normalized);
    } else {
        for window in chars.windows(3) {
            shingle(&window.iter().collect::<String>());
        }
    }

    let mut hi: u64 = 0;
    let mut lo: u64 = 0;
    for bit in 0..64 {
        if votes[bit] > 0 {
            hi |= 1 << bit;
        }
        if votes[64 + bit] > 0 {
            lo |= 1 << bit;
        }
    }
    format!("{hi:016x}{lo:016x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_32_known_vectors() {
        // Reference values for the 32-bit FNV-1a parameters.
        assert_eq!(fnv1a_32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c_292c);
    }

    #[test]
    fn test_fnv1a_32_hex_width() {
        assert_eq!(fnv1a_32_hex(b"").len(), 8);
        assert_eq!(fnv1a_32_hex(b""), "811c9dc5");
    }

    #[test]
    fn test_simhash_is_stable_and_case_insensitive() {
        let a = simhash128("Submit Order");
        let b = simhash128("  submit order  ");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_simhash_empty_is_zero() {
        assert_eq!(simhash128(""), "0".repeat(32));
        assert_eq!(simhash128("   "), "0".repeat(32));
    }

    #[test]
    fn test_simhash_similar_texts_share_bits() {
        let a = u128::from_str_radix(&simhash128("confirm your subscription now"), 16).unwrap();
        let b = u128::from_str_radix(&simhash128("confirm your subscription today"), 16).unwrap();
        let c = u128::from_str_radix(&simhash128("quarterly revenue dashboard"), 16).unwrap();
        let near = (a ^ b).count_ones();
        let far = (a ^ c).count_ones();
        assert!(near < far, "similar texts should be closer ({near} vs {far})");
    }

    #[test]
    fn test_simhash_short_input() {
        let h = simhash128("ok");
        assert_eq!(h.len(), 32);
        assert_ne!(h, "0".repeat(32));
    }
}
