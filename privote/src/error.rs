use alloy_primitives::{Address, U256};
use std::fmt;
use thiserror::Error;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("privote: malformed call data: {0}")]
    MalformedCallData(String),

    #[error("privote: unexpected function selector 0x{}", hex::encode(.0))]
    UnexpectedSelector([u8; 4]),

    #[error("privote: ballot is for election {found}, expected election {expected}")]
    ElectionMismatch { expected: U256, found: U256 },

    #[error("privote: no configuration for election {0}")]
    UnknownElection(String),

    #[error("privote: invalid key: {0}")]
    InvalidKey(String),

    #[error("privote: malformed envelope: {0} bytes is shorter than the minimum envelope size")]
    MalformedEnvelope(usize),

    #[error("privote: envelope is neither valid hex nor valid base64: {0}")]
    InvalidEnvelopeEncoding(String),

    #[error("privote: encryption failed")]
    EncryptionFailure,

    #[error("privote: decryption failed - invalid ciphertext or wrong key")]
    DecryptionFailure,

    #[error("privote: invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("privote: signature matches more than one option (indexes {0:?})")]
    AmbiguousMatch(Vec<usize>),

    #[error("privote: option {0} does not exist in election")]
    InvalidOption(u32),

    #[error("privote: invalid election configuration: {0}")]
    InvalidElection(String),

    #[error("privote: signature was produced by {recovered}, expected {expected}")]
    SignerMismatch { expected: Address, recovered: Address },

    #[error("privote: signature rejected by user")]
    SignatureRejected,

    #[error("privote: submission failed: {0}")]
    SubmissionFailure(String),

    #[error("privote: JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Data-free category of an [`Error`], safe to put in reports.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedCallData,
    UnexpectedSelector,
    ElectionMismatch,
    UnknownElection,
    InvalidKey,
    MalformedEnvelope,
    InvalidEnvelopeEncoding,
    EncryptionFailure,
    DecryptionFailure,
    InvalidSignatureFormat,
    AmbiguousMatch,
    InvalidOption,
    InvalidElection,
    SignerMismatch,
    SignatureRejected,
    SubmissionFailure,
    Json,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MalformedCallData(_) => ErrorKind::MalformedCallData,
            Error::UnexpectedSelector(_) => ErrorKind::UnexpectedSelector,
            Error::ElectionMismatch { .. } => ErrorKind::ElectionMismatch,
            Error::UnknownElection(_) => ErrorKind::UnknownElection,
            Error::InvalidKey(_) => ErrorKind::InvalidKey,
            Error::MalformedEnvelope(_) => ErrorKind::MalformedEnvelope,
            Error::InvalidEnvelopeEncoding(_) => ErrorKind::InvalidEnvelopeEncoding,
            Error::EncryptionFailure => ErrorKind::EncryptionFailure,
            Error::DecryptionFailure => ErrorKind::DecryptionFailure,
            Error::InvalidSignatureFormat(_) => ErrorKind::InvalidSignatureFormat,
            Error::AmbiguousMatch(_) => ErrorKind::AmbiguousMatch,
            Error::InvalidOption(_) => ErrorKind::InvalidOption,
            Error::InvalidElection(_) => ErrorKind::InvalidElection,
            Error::SignerMismatch { .. } => ErrorKind::SignerMismatch,
            Error::SignatureRejected => ErrorKind::SignatureRejected,
            Error::SubmissionFailure(_) => ErrorKind::SubmissionFailure,
            Error::Json(_) => ErrorKind::Json,
        }
    }
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedCallData => "malformed_call_data",
            ErrorKind::UnexpectedSelector => "unexpected_selector",
            ErrorKind::ElectionMismatch => "election_mismatch",
            ErrorKind::UnknownElection => "unknown_election",
            ErrorKind::InvalidKey => "invalid_key",
            ErrorKind::MalformedEnvelope => "malformed_envelope",
            ErrorKind::InvalidEnvelopeEncoding => "invalid_envelope_encoding",
            ErrorKind::EncryptionFailure => "encryption_failure",
            ErrorKind::DecryptionFailure => "decryption_failure",
            ErrorKind::InvalidSignatureFormat => "invalid_signature_format",
            ErrorKind::AmbiguousMatch => "ambiguous_match",
            ErrorKind::InvalidOption => "invalid_option",
            ErrorKind::InvalidElection => "invalid_election",
            ErrorKind::SignerMismatch => "signer_mismatch",
            ErrorKind::SignatureRejected => "signature_rejected",
            ErrorKind::SubmissionFailure => "submission_failure",
            ErrorKind::Json => "json",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
