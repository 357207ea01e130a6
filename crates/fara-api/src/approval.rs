//! The Approval Ticket Authority (spec §4.6). Embedded within the
//! Coordinator but kept in its own module since the token lifecycle —
//! mint, constant-time compare, single-use clear — is conceptually
//! distinct from state-machine transitions.

use rand::RngCore;
use subtle::ConstantTimeEq;

/// Mint a fresh opaque token: 16 random bytes (128 bits), URL-safe base64
/// with no padding, matching `secrets.token_urlsafe(16)` in the original.
pub fn mint_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64_url_encode(&bytes)
}

/// Constant-time comparison against the stored token. Never short-circuits
/// on length up front in a way that leaks timing beyond the length itself.
pub fn tokens_match(candidate: &str, stored: &str) -> bool {
    let candidate = candidate.as_bytes();
    let stored = stored.as_bytes();
    if candidate.len() != stored.len() {
        return false;
    }
    candidate.ct_eq(stored).into()
}

fn base64_url_encode(bytes: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
    let mut out = String::with_capacity((bytes.len() * 4).div_ceil(3));
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = *chunk.get(1).unwrap_or(&0) as u32;
        let b2 = *chunk.get(2).unwrap_or(&0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;
        out.push(ALPHABET[((triple >> 18) & 0x3f) as usize] as char);
        out.push(ALPHABET[((triple >> 12) & 0x3f) as usize] as char);
        if chunk.len() > 1 {
            out.push(ALPHABET[((triple >> 6) & 0x3f) as usize] as char);
        }
        if chunk.len() > 2 {
            out.push(ALPHABET[(triple & 0x3f) as usize] as char);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_tokens_are_url_safe_and_sufficiently_long() {
        let token = mint_token();
        assert!(token.len() >= 20);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn minted_tokens_are_distinct() {
        assert_ne!(mint_token(), mint_token());
    }

    #[test]
    fn matching_tokens_compare_equal() {
        let token = mint_token();
        assert!(tokens_match(&token, &token));
    }

    #[test]
    fn mismatched_tokens_compare_unequal() {
        assert!(!tokens_match("abc", "xyz"));
        assert!(!tokens_match("short", "muchlongerstring"));
    }
}
