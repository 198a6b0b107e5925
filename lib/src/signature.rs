//! Placeholder transaction signatures and explorer links.
//!
//! No transaction is ever signed. The session shows a locally generated string
//! with the shape of a Solana signature so that the explorer link and copy
//! affordances have something to work with.

use rand::Rng;

/// Bitcoin/Solana Base58 alphabet (no `0`, `I`, `O` or `l`)
pub const BASE58_ALPHABET: &[u8; 58] =
    b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Length of a Base58-encoded 64-byte signature
pub const SIGNATURE_LENGTH: usize = 88;

/// Generate a fresh placeholder signature from the thread-local RNG.
#[must_use]
pub fn generate_placeholder_signature() -> String {
    placeholder_signature_with(&mut rand::thread_rng(), SIGNATURE_LENGTH)
}

/// Generate `length` characters, each drawn independently and uniformly from the alphabet.
pub fn placeholder_signature_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| char::from(BASE58_ALPHABET[rng.gen_range(0..BASE58_ALPHABET.len())]))
        .collect()
}

#[must_use]
pub fn is_base58(text: &str) -> bool {
    text.bytes().all(|b| BASE58_ALPHABET.contains(&b))
}

/// Build a block-explorer link for a transaction.
///
/// The network name is interpolated verbatim; any string is accepted.
#[must_use]
pub fn explorer_url(explorer_base: &str, signature: &str, network: &str) -> String {
    format!(
        "{}/tx/{}?cluster={}",
        explorer_base.trim_end_matches('/'),
        signature,
        network
    )
}
