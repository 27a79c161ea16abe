//! Call data for the `castPrivateVote(uint256 electionId, bytes encryptedSignature)` ledger
//! operation.
//!
//! The layout is the standard ABI encoding of a `(uint256, bytes)` argument list:
//!
//! | bytes      | field                                  |
//! |------------|----------------------------------------|
//! | `0..4`     | function selector                      |
//! | `4..36`    | election id                            |
//! | `36..68`   | offset of the `bytes` argument (0x40)  |
//! | `68..100`  | payload length `n`                     |
//! | `100..`    | encrypted signature (`n` bytes, padded to a 32 byte boundary) |

use crate::*;
use alloy_primitives::U256;
use alloy_sol_types::{sol, SolCall};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

sol! {
    function castPrivateVote(uint256 electionId, bytes encryptedSignature);
}

pub const SELECTOR_LENGTH: usize = 4;
pub const WORD_LENGTH: usize = 32;

const ELECTION_ID_START: usize = SELECTOR_LENGTH;
const OFFSET_WORD_START: usize = ELECTION_ID_START + WORD_LENGTH;
const LENGTH_WORD_START: usize = OFFSET_WORD_START + WORD_LENGTH;

/// Byte offset of the encrypted signature; also the minimum call data size.
pub const PAYLOAD_START: usize = LENGTH_WORD_START + WORD_LENGTH;

/// Offset word of a `(uint256, bytes)` encoding: the dynamic part follows two head words.
const BYTES_ARGUMENT_OFFSET: u64 = 2 * WORD_LENGTH as u64;

/// Selector of `castPrivateVote(uint256,bytes)`.
pub const CAST_PRIVATE_VOTE_SELECTOR: [u8; 4] = castPrivateVoteCall::SELECTOR;

/// Decoded `castPrivateVote` call data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallData {
    pub selector: [u8; 4],
    pub election_id: U256,
    pub encrypted_signature: Vec<u8>,
}

impl CallData {
    /// Parse call data from a hex string, with or without a leading `0x`.
    pub fn from_hex(input: &str) -> Result<Self, Error> {
        let hex_data = strip_hex_prefix(input.trim());

        if hex_data.len() < PAYLOAD_START * 2 {
            return Err(Error::MalformedCallData(format!(
                "{} hex characters is shorter than the {} character header",
                hex_data.len(),
                PAYLOAD_START * 2
            )));
        }

        let bytes = hex::decode(hex_data)
            .map_err(|e| Error::MalformedCallData(format!("invalid hex: {}", e)))?;

        Self::from_bytes(&bytes)
    }

    /// Parse raw call data bytes.
    ///
    /// Only the layout is validated. The selector and election id are returned as found;
    /// checking them is up to the caller.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < PAYLOAD_START {
            return Err(Error::MalformedCallData(format!(
                "{} bytes is shorter than the {} byte header",
                bytes.len(),
                PAYLOAD_START
            )));
        }

        let mut selector = [0u8; SELECTOR_LENGTH];
        selector.copy_from_slice(&bytes[..SELECTOR_LENGTH]);

        let election_id = U256::from_be_slice(&bytes[ELECTION_ID_START..OFFSET_WORD_START]);

        let offset = read_word(&bytes[OFFSET_WORD_START..LENGTH_WORD_START])?;
        if offset != BYTES_ARGUMENT_OFFSET as usize {
            return Err(Error::MalformedCallData(format!(
                "bytes argument offset is {:#x}, expected {:#x}",
                offset, BYTES_ARGUMENT_OFFSET
            )));
        }

        let length = read_word(&bytes[LENGTH_WORD_START..PAYLOAD_START])?;
        let available = bytes.len() - PAYLOAD_START;
        if length > available {
            return Err(Error::MalformedCallData(format!(
                "declared payload length {} exceeds the {} bytes available",
                length, available
            )));
        }

        let encrypted_signature = bytes[PAYLOAD_START..PAYLOAD_START + length].to_vec();
        tracing::debug!(
            election_id = %election_id,
            payload_len = length,
            "parsed castPrivateVote call data"
        );

        Ok(CallData {
            selector,
            election_id,
            encrypted_signature,
        })
    }

    pub fn is_cast_private_vote(&self) -> bool {
        self.selector == CAST_PRIVATE_VOTE_SELECTOR
    }
}

/// Extract the encrypted signature embedded in `castPrivateVote` call data.
pub fn extract_encrypted_signature(call_data_hex: &str) -> Result<Vec<u8>, Error> {
    CallData::from_hex(call_data_hex).map(|call| call.encrypted_signature)
}

/// Extract the encrypted signature embedded in `castPrivateVote` call data, base64 encoded.
pub fn extract_encrypted_signature_base64(call_data_hex: &str) -> Result<String, Error> {
    extract_encrypted_signature(call_data_hex).map(|payload| BASE64.encode(payload))
}

/// ABI-encode a `castPrivateVote` call carrying `encrypted_signature`.
pub fn encode_cast_private_vote(election_id: U256, encrypted_signature: &[u8]) -> Vec<u8> {
    castPrivateVoteCall {
        electionId: election_id,
        encryptedSignature: encrypted_signature.to_vec().into(),
    }
    .abi_encode()
}

pub fn strip_hex_prefix(input: &str) -> &str {
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

// Read a 32 byte big-endian word that must fit in a usize.
fn read_word(word: &[u8]) -> Result<usize, Error> {
    let (high, low) = word.split_at(WORD_LENGTH - 8);
    if high.iter().any(|b| *b != 0) {
        return Err(Error::MalformedCallData(format!(
            "word 0x{} is out of range",
            hex::encode(word)
        )));
    }

    let mut low_bytes = [0u8; 8];
    low_bytes.copy_from_slice(low);
    usize::try_from(u64::from_be_bytes(low_bytes)).map_err(|_| {
        Error::MalformedCallData(format!("word 0x{} is out of range", hex::encode(word)))
    })
}
