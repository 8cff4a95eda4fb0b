use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// The only supported challenge method. `plain` defeats the point of PKCE
/// and is rejected.
pub const METHOD_S256: &str = "S256";

/// Compute the S256 challenge for a verifier: BASE64URL(SHA-256(verifier)),
/// unpadded.
pub fn challenge_s256(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Check a token-request verifier against the challenge captured at
/// authorization time.
pub fn verify(verifier: &str, challenge: &str) -> bool {
    // RFC 7636 bounds the verifier length.
    if verifier.len() < 43 || verifier.len() > 128 {
        return false;
    }
    challenge_s256(verifier) == challenge
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

    #[test]
    fn rfc7636_reference_vector() {
        // Appendix B of RFC 7636.
        assert_eq!(challenge_s256(VERIFIER), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    }

    #[test]
    fn matching_verifier_passes() {
        let challenge = challenge_s256(VERIFIER);
        assert!(verify(VERIFIER, &challenge));
    }

    #[test]
    fn wrong_verifier_fails() {
        let challenge = challenge_s256(VERIFIER);
        assert!(!verify("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", &challenge));
    }

    #[test]
    fn short_verifier_fails_even_if_hash_matches() {
        let challenge = challenge_s256("short");
        assert!(!verify("short", &challenge));
    }
}
