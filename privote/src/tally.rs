use crate::*;
use alloy_primitives::{Address, B256, U256};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use indexmap::IndexMap;
use rayon::prelude::*;

/// Where a ballot's envelope comes from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BallotPayload {
    /// Hex encoded `castPrivateVote` call data
    CallData(String),

    /// A stored envelope, `0x`-hex or base64
    EncryptedSignature(String),
}

/// A private vote as recorded on the ledger.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BallotRecord {
    pub voter: Address,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,

    #[serde(flatten)]
    pub payload: BallotPayload,
}

impl BallotRecord {
    pub fn from_call_data(voter: Address, call_data_hex: &str) -> Self {
        BallotRecord {
            voter,
            user_id: None,
            tx_hash: None,
            payload: BallotPayload::CallData(call_data_hex.to_owned()),
        }
    }

    /// Decrypt the ballot and match it against `election`.
    pub fn decrypt(
        &self,
        secret: &AuthoritySecretKey,
        election: &ElectionConfig,
    ) -> Result<DecryptedBallot, Error> {
        match &self.payload {
            BallotPayload::CallData(call_data) => {
                decrypt_and_verify(call_data, self.voter, secret, election)
            }
            BallotPayload::EncryptedSignature(encoded) => {
                let envelope = decode_envelope(encoded)?;
                open_envelope(
                    election.election_id_word(),
                    envelope,
                    self.voter,
                    secret,
                    election,
                )
            }
        }
    }
}

/// A ballot after decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedBallot {
    pub election_id: U256,
    pub encrypted_signature: Vec<u8>,

    /// The voter's signature in plaintext. Never log this.
    pub signature: String,

    /// `None` when the signature matches no option.
    pub vote: Option<SignatureMatch>,
}

impl DecryptedBallot {
    pub fn district(&self) -> Option<char> {
        self.vote.as_ref().and_then(SignatureMatch::district)
    }
}

/// Reject call data that is not a `castPrivateVote` for `election`.
pub fn check_call_data(call: &CallData, election: &ElectionConfig) -> Result<(), Error> {
    if !call.is_cast_private_vote() {
        return Err(Error::UnexpectedSelector(call.selector));
    }

    let expected = election.election_id_word();
    if call.election_id != expected {
        return Err(Error::ElectionMismatch {
            expected,
            found: call.election_id,
        });
    }

    Ok(())
}

/// The envelope plaintext is the wallet's signature string.
pub fn decode_signature_plaintext(plaintext: Vec<u8>) -> Result<String, Error> {
    String::from_utf8(plaintext).map_err(|_| {
        Error::InvalidSignatureFormat("decrypted signature is not valid UTF-8".to_owned())
    })
}

/// Run one ballot through the whole pipeline: extract the envelope from the call data,
/// decrypt it with the authority's key and match the signature against `voter` and the
/// election's options.
///
/// A well formed ballot that matches no option is `Ok` with `vote == None`.
pub fn decrypt_and_verify(
    call_data_hex: &str,
    voter: Address,
    secret: &AuthoritySecretKey,
    election: &ElectionConfig,
) -> Result<DecryptedBallot, Error> {
    let call = CallData::from_hex(call_data_hex)?;
    check_call_data(&call, election)?;
    tracing::debug!(
        election = election.election_id,
        payload = call.encrypted_signature.len(),
        "extracted encrypted signature"
    );

    open_envelope(
        call.election_id,
        call.encrypted_signature,
        voter,
        secret,
        election,
    )
}

fn open_envelope(
    election_id: U256,
    envelope: Vec<u8>,
    voter: Address,
    secret: &AuthoritySecretKey,
    election: &ElectionConfig,
) -> Result<DecryptedBallot, Error> {
    let plaintext = secret.decrypt(&envelope)?;
    let signature = decode_signature_plaintext(plaintext)?;
    tracing::debug!(
        election = election.election_id,
        envelope = envelope.len(),
        "decrypted ballot"
    );

    let vote = match_signature(&signature, voter, &election.options)?;

    Ok(DecryptedBallot {
        election_id,
        encrypted_signature: envelope,
        signature,
        vote,
    })
}

fn decode_envelope(encoded: &str) -> Result<Vec<u8>, Error> {
    let encoded = encoded.trim();
    if encoded.starts_with("0x") {
        hex::decode(strip_hex_prefix(encoded))
            .map_err(|e| Error::InvalidEnvelopeEncoding(format!("hex: {}", e)))
    } else {
        BASE64
            .decode(encoded)
            .map_err(|e| Error::InvalidEnvelopeEncoding(format!("base64: {}", e)))
    }
}

/// What happened to one ballot.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Counted { vote: SignatureMatch },
    NoMatch,
    Failed { kind: ErrorKind, detail: String },
}

impl Outcome {
    /// Anomaly reason, `None` for a counted ballot.
    pub fn anomaly(&self) -> Option<&'static str> {
        match self {
            Outcome::Counted { .. } => None,
            Outcome::NoMatch => Some("no_match"),
            Outcome::Failed { kind, .. } => Some(kind.as_str()),
        }
    }
}

impl From<Result<DecryptedBallot, Error>> for Outcome {
    fn from(result: Result<DecryptedBallot, Error>) -> Self {
        match result {
            Ok(DecryptedBallot {
                vote: Some(vote), ..
            }) => Outcome::Counted { vote },
            Ok(_) => Outcome::NoMatch,
            Err(e) => Outcome::Failed {
                kind: e.kind(),
                detail: e.to_string(),
            },
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BallotVerdict {
    pub voter: Address,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<B256>,

    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OptionTally {
    pub option_id: u32,
    pub text: String,
    pub votes: usize,

    /// Share of all processed ballots, anomalies included
    pub percentage: f64,
    pub voters: Vec<Address>,
}

#[derive(Serialize, Debug, Clone)]
pub struct TallyReport {
    pub election_id: u64,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,

    /// Number of ballots processed
    pub ballots: usize,

    /// Number of ballots that matched an option
    pub counted: usize,

    /// Per-option results keyed by option text, in configured order
    pub totals: IndexMap<String, OptionTally>,

    /// Every option tied for the most votes. Empty when nothing was counted.
    pub winners: Vec<String>,

    /// Ballots left out of the totals, by reason
    pub anomalies: IndexMap<String, usize>,

    pub verdicts: Vec<BallotVerdict>,
}

impl TallyReport {
    pub fn anomaly_count(&self) -> usize {
        self.anomalies.values().sum()
    }
}

/// Tally a batch of ballots for one election.
///
/// Ballots are processed independently and in parallel. A ballot that fails is recorded as
/// an anomaly and never aborts the batch.
pub fn tally(
    ballots: &[BallotRecord],
    secret: &AuthoritySecretKey,
    election: &ElectionConfig,
) -> TallyReport {
    let outcomes: Vec<Outcome> = ballots
        .par_iter()
        .map(|ballot| Outcome::from(ballot.decrypt(secret, election)))
        .collect();

    let mut totals: IndexMap<String, OptionTally> = election
        .options
        .iter()
        .map(|option| {
            let tally = OptionTally {
                option_id: option.id,
                text: option.text.clone(),
                votes: 0,
                percentage: 0.0,
                voters: vec![],
            };
            (option.text.clone(), tally)
        })
        .collect();

    let mut anomalies: IndexMap<String, usize> = IndexMap::new();
    let mut verdicts = Vec::with_capacity(ballots.len());
    let mut counted = 0;

    for (ballot, outcome) in ballots.iter().zip(outcomes) {
        match &outcome {
            Outcome::Counted { vote } => {
                if let Some(option) = totals.get_mut(&vote.option_text) {
                    option.votes += 1;
                    option.voters.push(ballot.voter);
                    counted += 1;
                }
            }
            Outcome::NoMatch => {
                tracing::warn!(voter = %ballot.voter, "ballot matches no option");
            }
            Outcome::Failed { kind, .. } => {
                tracing::warn!(voter = %ballot.voter, kind = %kind, "ballot rejected");
            }
        }
        if let Some(reason) = outcome.anomaly() {
            *anomalies.entry(reason.to_owned()).or_insert(0) += 1;
        }

        verdicts.push(BallotVerdict {
            voter: ballot.voter,
            user_id: ballot.user_id,
            tx_hash: ballot.tx_hash,
            outcome,
        });
    }

    if !ballots.is_empty() {
        for option in totals.values_mut() {
            option.percentage = option.votes as f64 * 100.0 / ballots.len() as f64;
        }
    }

    let max_votes = totals.values().map(|t| t.votes).max().unwrap_or(0);
    let winners = if max_votes == 0 {
        vec![]
    } else {
        totals
            .values()
            .filter(|t| t.votes == max_votes)
            .map(|t| t.text.clone())
            .collect()
    };

    tracing::info!(
        election = election.election_id,
        ballots = ballots.len(),
        counted,
        "tally complete"
    );

    TallyReport {
        election_id: election.election_id,
        title: election.title.clone(),
        ballots: ballots.len(),
        counted,
        totals,
        winners,
        anomalies,
        verdicts,
    }
}
