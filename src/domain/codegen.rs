//! Generation of voucher codes and coupon validation tokens.
//!
//! Both draw from the operating system's CSPRNG. Voucher codes are short and
//! human-presentable; their uniqueness is enforced by the voucher store's
//! unique index, with callers retrying on collision. Validation tokens carry
//! 256 bits of entropy and are treated as unguessable capabilities.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};

/// Institution tag prefixed to every voucher code.
pub const CODE_PREFIX: &str = "LB";

/// Alphabet for voucher code groups: uppercase letters and digits.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of each voucher code group.
const CODE_GROUP_LEN: usize = 4;

/// Validation token entropy in bytes (256 bits).
const TOKEN_BYTES: usize = 32;

/// Mints a human-presentable voucher code in the form `LB-XXXX-XXXX`.
pub fn mint_voucher_code() -> String {
    let mut rng = OsRng;
    let mut group = |rng: &mut OsRng| -> String {
        (0..CODE_GROUP_LEN)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    };
    format!("{}-{}-{}", CODE_PREFIX, group(&mut rng), group(&mut rng))
}

/// Mints a URL-safe single-use validation token for a coupon reservation.
pub fn mint_validation_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn voucher_code_matches_pattern() {
        let code = mint_voucher_code();
        let parts: Vec<&str> = code.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "LB");
        for group in &parts[1..] {
            assert_eq!(group.len(), 4);
            assert!(group
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }

    #[test]
    fn voucher_codes_do_not_trivially_collide() {
        let codes: HashSet<String> = (0..1000).map(|_| mint_voucher_code()).collect();
        assert_eq!(codes.len(), 1000);
    }

    #[test]
    fn validation_token_is_url_safe_and_long() {
        let token = mint_validation_token();
        // 32 bytes -> 43 base64 characters without padding.
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn validation_tokens_are_unique() {
        let tokens: HashSet<String> = (0..100).map(|_| mint_validation_token()).collect();
        assert_eq!(tokens.len(), 100);
    }
}
