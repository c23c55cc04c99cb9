use rand::distr::Alphanumeric;
use rand::Rng;

/// Generate a delete token of `length` characters drawn from `[a-zA-Z0-9]`.
///
/// Tokens are not checked against live ones; expiry bounds the collision window.
pub fn generate_token(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
