//! Anonymous-sender NaCl box: X25519 + XSalsa20-Poly1305.
//!
//! Every encryption uses a fresh ephemeral X25519 key pair and a fresh random nonce.
//! The recipient gets everything it needs to decrypt in the envelope:
//!
//! ```text
//! ephemeral public key (32) || nonce (24) || ciphertext (plaintext length + 16 byte tag)
//! ```
//!
//! The envelope is byte-compatible with a tweetnacl `box` whose output is prefixed with the
//! sender public key and the nonce.

use crate::*;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use crypto_box::aead::generic_array::GenericArray;
use crypto_box::aead::Aead;
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;

pub const PUBLIC_KEY_LENGTH: usize = 32;
pub const SECRET_KEY_LENGTH: usize = 32;
pub const NONCE_LENGTH: usize = 24;
pub const TAG_LENGTH: usize = 16;

/// Ephemeral public key and nonce.
pub const ENVELOPE_HEADER_LENGTH: usize = PUBLIC_KEY_LENGTH + NONCE_LENGTH;

/// Smallest well-formed envelope: header plus the tag of an empty plaintext.
pub const MIN_ENVELOPE_LENGTH: usize = ENVELOPE_HEADER_LENGTH + TAG_LENGTH;

/// Encrypt a message so that only the holder of the secret key behind `receiver_pub` can
/// read it.
pub fn encrypt(receiver_pub: &[u8], msg: &[u8]) -> Result<Vec<u8>, Error> {
    let receiver_pub = public_key_from_slice(receiver_pub)?;
    encrypt_to(&receiver_pub, msg)
}

/// Like [`encrypt`], with the envelope base64 encoded.
pub fn encrypt_to_base64(receiver_pub: &[u8], msg: &[u8]) -> Result<String, Error> {
    encrypt(receiver_pub, msg).map(|envelope| BASE64.encode(envelope))
}

pub(crate) fn encrypt_to(receiver_pub: &PublicKey, msg: &[u8]) -> Result<Vec<u8>, Error> {
    // The ephemeral secret never leaves this function
    let ephemeral_sk = random_secret_key();
    let ephemeral_pk = ephemeral_sk.public_key();

    let salsa_box = SalsaBox::new(receiver_pub, &ephemeral_sk);

    let mut nonce = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce);

    let encrypted = salsa_box
        .encrypt(GenericArray::from_slice(&nonce), msg)
        .map_err(|_| Error::EncryptionFailure)?;

    let mut envelope = Vec::with_capacity(ENVELOPE_HEADER_LENGTH + encrypted.len());
    envelope.extend_from_slice(ephemeral_pk.as_bytes());
    envelope.extend_from_slice(&nonce);
    envelope.extend(encrypted);

    tracing::debug!(
        plaintext_len = msg.len(),
        envelope_len = envelope.len(),
        "sealed envelope"
    );

    Ok(envelope)
}

/// Decrypt an envelope produced by [`encrypt`] using the receiver's 32 byte secret key.
pub fn decrypt(receiver_sec: &[u8], envelope: &[u8]) -> Result<Vec<u8>, Error> {
    let receiver_sec = secret_key_from_slice(receiver_sec)?;
    decrypt_with(&receiver_sec, envelope)
}

/// Like [`decrypt`], for a base64 encoded envelope.
pub fn decrypt_base64(receiver_sec: &[u8], envelope: &str) -> Result<Vec<u8>, Error> {
    let receiver_sec = secret_key_from_slice(receiver_sec)?;
    let envelope = BASE64
        .decode(envelope.trim())
        .map_err(|e| Error::InvalidEnvelopeEncoding(format!("base64: {}", e)))?;
    decrypt_with(&receiver_sec, &envelope)
}

pub(crate) fn decrypt_with(receiver_sec: &SecretKey, envelope: &[u8]) -> Result<Vec<u8>, Error> {
    if envelope.len() < MIN_ENVELOPE_LENGTH {
        return Err(Error::MalformedEnvelope(envelope.len()));
    }

    let (ephemeral_pk, rest) = envelope.split_at(PUBLIC_KEY_LENGTH);
    let (nonce, encrypted) = rest.split_at(NONCE_LENGTH);

    let ephemeral_pk = public_key_from_slice(ephemeral_pk)?;
    let salsa_box = SalsaBox::new(&ephemeral_pk, receiver_sec);

    salsa_box
        .decrypt(GenericArray::from_slice(nonce), encrypted)
        .map_err(|_| Error::DecryptionFailure)
}

/// A new X25519 secret key from the operating system CSPRNG.
pub(crate) fn random_secret_key() -> SecretKey {
    let mut bytes = [0u8; SECRET_KEY_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    SecretKey::from(bytes)
}

fn public_key_from_slice(bytes: &[u8]) -> Result<PublicKey, Error> {
    let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
        Error::InvalidKey(format!(
            "public key is {} bytes (expected {})",
            bytes.len(),
            PUBLIC_KEY_LENGTH
        ))
    })?;
    Ok(PublicKey::from(bytes))
}

pub(crate) fn secret_key_from_slice(bytes: &[u8]) -> Result<SecretKey, Error> {
    let bytes: [u8; SECRET_KEY_LENGTH] = bytes.try_into().map_err(|_| {
        Error::InvalidKey(format!(
            "private key is {} bytes (expected {})",
            bytes.len(),
            SECRET_KEY_LENGTH
        ))
    })?;
    Ok(SecretKey::from(bytes))
}
