use crate::*;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use crypto_box::{PublicKey, SecretKey};
use std::fmt;
use std::str::FromStr;

/// The tally authority's public key.
///
/// Safe to distribute: every voter encrypts their signed ballot to it.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorityPublicKey(PublicKey);

impl AuthorityPublicKey {
    /// Construct a public key from exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            Error::InvalidKey(format!(
                "public key is {} bytes (expected {})",
                bytes.len(),
                PUBLIC_KEY_LENGTH
            ))
        })?;
        Ok(AuthorityPublicKey(PublicKey::from(bytes)))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, Error> {
        let bytes = decode_base64(encoded)?;
        Self::from_bytes(&bytes)
    }

    #[inline]
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        *self.0.as_bytes()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0.as_bytes())
    }

    /// Seal `msg` into an envelope only the authority can open.
    pub fn encrypt(&self, msg: &[u8]) -> Result<Vec<u8>, Error> {
        encrypt_to(&self.0, msg)
    }
}

impl FromStr for AuthorityPublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64(s)
    }
}

impl fmt::Debug for AuthorityPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorityPublicKey({})", self.to_base64())
    }
}

impl fmt::Display for AuthorityPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

/// The tally authority's secret key. Never leaves the operator's machine.
#[derive(Clone)]
pub struct AuthoritySecretKey(SecretKey);

impl AuthoritySecretKey {
    /// Construct a secret key from exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        secret_key_from_slice(bytes).map(AuthoritySecretKey)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, Error> {
        let bytes = decode_base64(encoded)?;
        Self::from_bytes(&bytes)
    }

    /// Hex with or without a `0x` prefix.
    pub fn from_hex(encoded: &str) -> Result<Self, Error> {
        let bytes = hex::decode(strip_hex_prefix(encoded.trim()))
            .map_err(|e| Error::InvalidKey(format!("invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Accepts either `0x`-prefixed hex or base64, optionally wrapped in quotes as found in
    /// `.env` files.
    pub fn decode(encoded: &str) -> Result<Self, Error> {
        let encoded = encoded.trim().trim_matches(|c| c == '"' || c == '\'');
        if encoded.starts_with("0x") {
            Self::from_hex(encoded)
        } else {
            Self::from_base64(encoded)
        }
    }

    pub fn public_key(&self) -> AuthorityPublicKey {
        AuthorityPublicKey(self.0.public_key())
    }

    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LENGTH] {
        self.0.to_bytes()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0.to_bytes())
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0.to_bytes()))
    }

    /// Open an envelope sealed to this key's public half.
    pub fn decrypt(&self, envelope: &[u8]) -> Result<Vec<u8>, Error> {
        decrypt_with(&self.0, envelope)
    }
}

impl fmt::Debug for AuthoritySecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthoritySecretKey(<redacted>)")
    }
}

/// Generate a keypair for the tally authority
pub fn generate_keypair() -> (AuthoritySecretKey, AuthorityPublicKey) {
    let secret = AuthoritySecretKey(random_secret_key());
    let public = secret.public_key();
    (secret, public)
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, Error> {
    BASE64
        .decode(encoded.trim())
        .map_err(|e| Error::InvalidKey(format!("invalid base64: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodings() {
        let (secret, public) = generate_keypair();

        let from_b64 = AuthoritySecretKey::from_base64(&secret.to_base64()).unwrap();
        let from_hex = AuthoritySecretKey::from_hex(&secret.to_hex()).unwrap();
        assert_eq!(from_b64.to_bytes(), secret.to_bytes());
        assert_eq!(from_hex.to_bytes(), secret.to_bytes());

        let decoded = AuthoritySecretKey::decode(&format!("\"{}\"", secret.to_base64())).unwrap();
        assert_eq!(decoded.public_key(), public);
        let decoded = AuthoritySecretKey::decode(&secret.to_hex()).unwrap();
        assert_eq!(decoded.public_key(), public);

        let parsed: AuthorityPublicKey = public.to_base64().parse().unwrap();
        assert_eq!(parsed, public);
    }

    #[test]
    fn test_derive_known_public_key() {
        // RFC 7748 section 6.1, Alice
        let secret = AuthoritySecretKey::from_hex(
            "77076d0a7318a57d3c16c17251b26645df4c2f87ebc0992ab177fba51db92c2a",
        )
        .unwrap();
        assert_eq!(
            hex::encode(secret.public_key().to_bytes()),
            "8520f0098930a754748b7ddcb43ef75a0dbf3a0d26381af4eba4a98eaa9b4e6a"
        );
    }

    #[test]
    fn test_invalid_lengths() {
        assert!(matches!(
            AuthorityPublicKey::from_bytes(&[0u8; 31]),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            AuthoritySecretKey::from_bytes(&[0u8; 33]),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            AuthoritySecretKey::from_base64("not base64!"),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            AuthoritySecretKey::decode("0x1234"),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let (secret, _) = generate_keypair();
        let debug = format!("{:?}", secret);
        assert!(!debug.contains(&secret.to_base64()));
        assert!(!debug.contains(&hex::encode(secret.to_bytes())));
    }

    #[test]
    fn test_authority_round_trip() {
        let (secret, public) = generate_keypair();
        let envelope = public.encrypt(b"0xabcdef").unwrap();
        assert_eq!(secret.decrypt(&envelope).unwrap(), b"0xabcdef");
    }
}
