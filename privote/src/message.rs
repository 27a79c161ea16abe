use crate::*;
use alloy_primitives::{Address, Signature};

/// Prefix of every canonical vote message.
///
/// Changing it invalidates every cast but untallied ballot.
pub const VOTE_MESSAGE_PREFIX: &str = "I vote for ";

/// r || s || v
pub const SIGNATURE_LENGTH: usize = 65;

/// `0x` followed by the hex encoded signature.
pub const SIGNATURE_HEX_LENGTH: usize = 2 + SIGNATURE_LENGTH * 2;

/// The exact message a voter must sign to choose the option with `option_text`.
pub fn canonical_message(option_text: &str) -> String {
    format!("{}{}", VOTE_MESSAGE_PREFIX, option_text)
}

/// Structural check of a wallet signature string: `0x` followed by 130 hex digits that
/// decode to a secp256k1 signature.
pub fn parse_signature(signature: &str) -> Result<Signature, Error> {
    if !signature.starts_with("0x") {
        return Err(Error::InvalidSignatureFormat(
            "signature must start with 0x".to_owned(),
        ));
    }
    if signature.len() != SIGNATURE_HEX_LENGTH {
        return Err(Error::InvalidSignatureFormat(format!(
            "signature is {} characters (expected {})",
            signature.len(),
            SIGNATURE_HEX_LENGTH
        )));
    }

    let bytes = hex::decode(&signature[2..])
        .map_err(|e| Error::InvalidSignatureFormat(format!("invalid hex: {}", e)))?;

    Signature::try_from(bytes.as_slice())
        .map_err(|e| Error::InvalidSignatureFormat(e.to_string()))
}

/// Recover the address that signed `message` (EIP-191 personal message).
pub fn recover_signer(signature: &str, message: &str) -> Result<Address, Error> {
    let signature = parse_signature(signature)?;
    signature
        .recover_address_from_msg(message)
        .map_err(|e| Error::InvalidSignatureFormat(e.to_string()))
}

/// The option a signature was produced for.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SignatureMatch {
    /// 0-based position in the election's option list
    pub index: usize,
    pub option_id: u32,
    pub option_text: String,
}

impl SignatureMatch {
    /// 1-based choice number for display
    pub fn choice(&self) -> usize {
        self.index + 1
    }

    pub fn district(&self) -> Option<char> {
        district_letter(&self.option_text)
    }
}

/// Find the option whose canonical message `voter` signed.
///
/// Every option is probed. A failed recovery for one option only means that option does not
/// match. `Ok(None)` means the signature is well formed but matches no option, which is a
/// valid outcome distinct from every error. More than one match is an `AmbiguousMatch` error.
pub fn match_signature(
    signature: &str,
    voter: Address,
    options: &[VoteOption],
) -> Result<Option<SignatureMatch>, Error> {
    let signature = parse_signature(signature)?;

    let mut matches = vec![];
    for (index, option) in options.iter().enumerate() {
        match signature.recover_address_from_msg(option.message()) {
            Ok(recovered) if recovered == voter => matches.push(index),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(option = option.id, "signature recovery failed: {}", e);
            }
        }
    }

    match matches.as_slice() {
        [] => Ok(None),
        [index] => {
            let option = &options[*index];
            Ok(Some(SignatureMatch {
                index: *index,
                option_id: option.id,
                option_text: option.text.clone(),
            }))
        }
        _ => Err(Error::AmbiguousMatch(matches)),
    }
}

/// The district letter of an option such as `"District B"`.
pub fn district_letter(option_text: &str) -> Option<char> {
    let (_, rest) = option_text.split_once("District ")?;
    rest.chars().next().filter(|c| c.is_ascii_uppercase())
}
