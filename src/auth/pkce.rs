//! PKCE S256 challenge generation
//!
//! Implements the Proof Key for Code Exchange extension (RFC 7636) with the
//! `S256` method, which Google requires for installed-application clients
//! that cannot keep a secret.
//!
//! 1. Generate a high-entropy `code_verifier`.
//! 2. Send `BASE64URL(SHA256(code_verifier))` as `code_challenge` with the
//!    authorization request.
//! 3. Send the original verifier with the token exchange.

use base64::Engine as _;
use sha2::{Digest, Sha256};

/// A PKCE S256 verifier and its derived challenge.
///
/// # Examples
///
/// ```
/// use chatvault::auth::pkce::generate;
///
/// let pkce = generate();
/// assert_eq!(pkce.verifier.len(), 43);
/// assert_ne!(pkce.verifier, pkce.challenge);
/// ```
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// 32 random bytes, base64url without padding (43 characters).
    pub verifier: String,

    /// base64url (no padding) SHA-256 digest of [`Self::verifier`].
    pub challenge: String,
}

impl PkceChallenge {
    /// The challenge method sent with the authorization request.
    pub const METHOD: &'static str = "S256";
}

/// Generates a fresh PKCE S256 challenge.
pub fn generate() -> PkceChallenge {
    use rand::RngCore as _;

    let mut random_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut random_bytes);

    let verifier = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes);
    let challenge = challenge_for(&verifier);

    PkceChallenge {
        verifier,
        challenge,
    }
}

/// Computes the S256 challenge for a verifier
/// (`ASCII(BASE64URL(SHA256(ASCII(code_verifier))))`, RFC 7636 section 4.2).
pub fn challenge_for(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice())
}
