//! Public share tokens.
//!
//! A share token substitutes for authentication when viewing one entry, so
//! it must be unguessable: 32 alphanumeric characters carry roughly 190
//! bits of entropy.

use rand::Rng;

/// Length of a generated public token.
pub const PUBLIC_TOKEN_LENGTH: usize = 32;

/// Generate a fresh random public token.
pub fn generate_public_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(PUBLIC_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Whether `token` has the shape of a token this module could have issued.
///
/// Lets callers reject garbage without a database round trip.
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == PUBLIC_TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_alphanumeric())
}
