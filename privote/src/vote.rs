use crate::*;
use std::fmt;

/// Where a private vote attempt is.
///
/// `Idle -> OptionSelected -> AwaitingSignature -> Encrypting -> Submitting -> Confirmed`,
/// with any step after selection able to end in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    OptionSelected(VoteOption),
    AwaitingSignature { option: VoteOption, message: String },
    Encrypting { option: VoteOption },
    Submitting { option: VoteOption },
    Confirmed(Receipt),
    Failed(FailureReason),
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::OptionSelected(_) => "option_selected",
            SubmissionState::AwaitingSignature { .. } => "awaiting_signature",
            SubmissionState::Encrypting { .. } => "encrypting",
            SubmissionState::Submitting { .. } => "submitting",
            SubmissionState::Confirmed(_) => "confirmed",
            SubmissionState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubmissionState::Confirmed(_) | SubmissionState::Failed(_)
        )
    }
}

/// What the voter is told when a submission fails. Never carries cryptographic detail.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The voter declined to sign. The option has to be selected again.
    SignatureRejected,

    /// Anything else. Retrying restarts from `Idle` with a fresh envelope.
    SubmissionFailed,
}

impl From<&Error> for FailureReason {
    fn from(error: &Error) -> Self {
        match error {
            Error::SignatureRejected => FailureReason::SignatureRejected,
            _ => FailureReason::SubmissionFailed,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::SignatureRejected => f.write_str("Signature rejected by user"),
            FailureReason::SubmissionFailed => {
                f.write_str("Failed to submit vote, please try again")
            }
        }
    }
}

/// Client side flow of one voter's private vote: sign the canonical message for the chosen
/// option, seal the signature to the tally authority and hand the envelope to the ledger.
///
/// Nothing reaches the ledger before encryption has completed, so abandoning the flow (or
/// dropping the future) before `Submitting` leaves no trace.
pub struct PrivateVote<W, L> {
    election: ElectionConfig,
    authority: AuthorityPublicKey,
    wallet: W,
    ledger: L,
    state: SubmissionState,
}

impl<W: Wallet, L: Ledger> PrivateVote<W, L> {
    pub fn new(election: ElectionConfig, authority: AuthorityPublicKey, wallet: W, ledger: L) -> Self {
        PrivateVote {
            election,
            authority,
            wallet,
            ledger,
            state: SubmissionState::Idle,
        }
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn election(&self) -> &ElectionConfig {
        &self.election
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Return to `Idle`.
    ///
    /// A state that is neither `Idle` nor terminal belongs to an attempt whose future was
    /// dropped, e.g. while the wallet prompt was open. It is discarded.
    pub fn reset(&mut self) {
        if !self.state.is_terminal() && self.state != SubmissionState::Idle {
            tracing::info!(
                election = self.election.election_id,
                state = self.state.name(),
                "discarding abandoned private vote"
            );
        }
        self.transition(SubmissionState::Idle);
    }

    /// Cast a private vote for `option_id`, running the whole flow.
    ///
    /// An unknown option is rejected up front and leaves the state `Idle`. Once an option is
    /// selected, every error ends the attempt in `Failed`.
    pub async fn submit(&mut self, option_id: u32) -> Result<Receipt, Error> {
        self.reset();

        let option = self
            .election
            .get_option(option_id)
            .cloned()
            .ok_or(Error::InvalidOption(option_id))?;
        self.transition(SubmissionState::OptionSelected(option.clone()));

        match self.run(option).await {
            Ok(receipt) => {
                self.transition(SubmissionState::Confirmed(receipt.clone()));
                Ok(receipt)
            }
            Err(e) => {
                let reason = FailureReason::from(&e);
                tracing::warn!(
                    election = self.election.election_id,
                    kind = %e.kind(),
                    "private vote failed: {}",
                    reason
                );
                self.transition(SubmissionState::Failed(reason));
                Err(e)
            }
        }
    }

    async fn run(&mut self, option: VoteOption) -> Result<Receipt, Error> {
        let message = option.message();
        self.transition(SubmissionState::AwaitingSignature {
            option: option.clone(),
            message: message.clone(),
        });

        let signature = self
            .wallet
            .sign_message(&message)
            .await
            .map_err(|e| match e {
                WalletError::Rejected => Error::SignatureRejected,
                WalletError::Failed(e) => {
                    Error::SubmissionFailure(format!("failed to sign message: {}", e))
                }
            })?;

        self.transition(SubmissionState::Encrypting {
            option: option.clone(),
        });
        self.verify_signature(&signature, &message)?;
        let envelope = self.authority.encrypt(signature.as_bytes())?;

        self.transition(SubmissionState::Submitting { option });
        self.ledger
            .cast_private_vote(self.election.election_id_word(), envelope)
            .await
            .map_err(|e| Error::SubmissionFailure(e.to_string()))
    }

    // Structural check plus recovery against the wallet's own address, so a bad signature
    // never reaches the ledger.
    fn verify_signature(&self, signature: &str, message: &str) -> Result<(), Error> {
        let expected = self.wallet.address();
        let recovered = recover_signer(signature, message)?;
        if recovered != expected {
            return Err(Error::SignerMismatch {
                expected,
                recovered,
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: SubmissionState) {
        tracing::info!(
            election = self.election.election_id,
            from = self.state.name(),
            to = next.name(),
            "private vote"
        );
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};
    use async_trait::async_trait;

    fn districts() -> ElectionConfig {
        ElectionConfig::new(
            3,
            &["District A", "District B", "District C", "District D"],
        )
    }

    struct RejectingWallet(LocalWallet);

    #[async_trait]
    impl Wallet for RejectingWallet {
        fn address(&self) -> Address {
            self.0.address()
        }

        async fn sign_message(&self, _message: &str) -> Result<String, WalletError> {
            Err(WalletError::Rejected)
        }
    }

    // Signs with one key, claims another address
    struct ImpostorWallet {
        signer: LocalWallet,
        claimed: Address,
    }

    #[async_trait]
    impl Wallet for ImpostorWallet {
        fn address(&self) -> Address {
            self.claimed
        }

        async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
            self.signer.sign(message)
        }
    }

    struct GarbageWallet(Address);

    #[async_trait]
    impl Wallet for GarbageWallet {
        fn address(&self) -> Address {
            self.0
        }

        async fn sign_message(&self, _message: &str) -> Result<String, WalletError> {
            Ok("0x1234".to_owned())
        }
    }

    struct FailingLedger;

    #[async_trait]
    impl Ledger for FailingLedger {
        async fn cast_private_vote(
            &self,
            _election_id: U256,
            _encrypted_signature: Vec<u8>,
        ) -> Result<Receipt, LedgerError> {
            Err(LedgerError::Timeout)
        }
    }

    #[tokio::test]
    async fn test_submit_confirmed() {
        let (secret, public) = generate_keypair();
        let wallet = LocalWallet::random();
        let voter = wallet.address();
        let ledger = MemoryLedger::new(voter);

        let mut vote = PrivateVote::new(districts(), public, wallet, ledger.clone());
        assert_eq!(vote.state(), &SubmissionState::Idle);

        let receipt = vote.submit(2).await.unwrap();
        assert_eq!(vote.state(), &SubmissionState::Confirmed(receipt.clone()));

        let calls = ledger.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tx_hash, receipt.tx_hash);

        let call = CallData::from_bytes(&calls[0].call_data).unwrap();
        assert_eq!(call.election_id, U256::from(3u64));

        let signature = String::from_utf8(secret.decrypt(&call.encrypted_signature).unwrap()).unwrap();
        let vote = match_signature(&signature, voter, &districts().options)
            .unwrap()
            .unwrap();
        assert_eq!(vote.option_id, 2);
        assert_eq!(vote.option_text, "District B");
    }

    #[tokio::test]
    async fn test_invalid_option_stays_idle() {
        let (_, public) = generate_keypair();
        let wallet = LocalWallet::random();
        let ledger = MemoryLedger::new(wallet.address());

        let mut vote = PrivateVote::new(districts(), public, wallet, ledger.clone());
        assert!(matches!(vote.submit(5).await, Err(Error::InvalidOption(5))));
        assert!(matches!(vote.submit(0).await, Err(Error::InvalidOption(0))));
        assert_eq!(vote.state(), &SubmissionState::Idle);
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_signature_rejected() {
        let (_, public) = generate_keypair();
        let wallet = LocalWallet::random();
        let ledger = MemoryLedger::new(wallet.address());

        let mut vote = PrivateVote::new(
            districts(),
            public.clone(),
            RejectingWallet(wallet.clone()),
            ledger.clone(),
        );
        assert!(matches!(vote.submit(1).await, Err(Error::SignatureRejected)));
        assert_eq!(
            vote.state(),
            &SubmissionState::Failed(FailureReason::SignatureRejected)
        );
        assert!(ledger.calls().is_empty());

        // Restart from scratch with a wallet that signs
        let mut vote = PrivateVote::new(districts(), public, wallet, ledger.clone());
        vote.submit(1).await.unwrap();
        assert_eq!(ledger.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_ledger_failure() {
        let (_, public) = generate_keypair();
        let mut vote = PrivateVote::new(districts(), public, LocalWallet::random(), FailingLedger);

        match vote.submit(4).await {
            Err(Error::SubmissionFailure(_)) => {}
            other => panic!("expected SubmissionFailure, got {:?}", other),
        }
        assert_eq!(
            vote.state(),
            &SubmissionState::Failed(FailureReason::SubmissionFailed)
        );
        assert_eq!(
            FailureReason::SubmissionFailed.to_string(),
            "Failed to submit vote, please try again"
        );
    }

    #[tokio::test]
    async fn test_bad_signatures_never_reach_ledger() {
        let (_, public) = generate_keypair();
        let ledger = MemoryLedger::new(Address::ZERO);

        let mut vote = PrivateVote::new(
            districts(),
            public.clone(),
            GarbageWallet(Address::repeat_byte(1)),
            ledger.clone(),
        );
        assert!(matches!(
            vote.submit(1).await,
            Err(Error::InvalidSignatureFormat(_))
        ));
        assert_eq!(
            vote.state(),
            &SubmissionState::Failed(FailureReason::SubmissionFailed)
        );

        let impostor = ImpostorWallet {
            signer: LocalWallet::random(),
            claimed: Address::repeat_byte(2),
        };
        let mut vote = PrivateVote::new(districts(), public, impostor, ledger.clone());
        assert!(matches!(
            vote.submit(1).await,
            Err(Error::SignerMismatch { .. })
        ));

        assert!(ledger.calls().is_empty());
    }

    // Never answers, like a signing prompt the voter walked away from
    struct PendingWallet(Address);

    #[async_trait]
    impl Wallet for PendingWallet {
        fn address(&self) -> Address {
            self.0
        }

        async fn sign_message(&self, _message: &str) -> Result<String, WalletError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_abandoned_attempt_can_be_retried() {
        let (_, public) = generate_keypair();
        let ledger = MemoryLedger::new(Address::ZERO);
        let mut vote = PrivateVote::new(
            districts(),
            public,
            PendingWallet(Address::repeat_byte(3)),
            ledger.clone(),
        );

        let abandoned =
            tokio::time::timeout(std::time::Duration::from_millis(50), vote.submit(1)).await;
        assert!(abandoned.is_err());
        assert!(matches!(
            vote.state(),
            SubmissionState::AwaitingSignature { .. }
        ));
        assert!(ledger.calls().is_empty());

        vote.reset();
        assert_eq!(vote.state(), &SubmissionState::Idle);

        // Abandon again and go straight to a new submission
        let abandoned =
            tokio::time::timeout(std::time::Duration::from_millis(50), vote.submit(2)).await;
        assert!(abandoned.is_err());
        assert!(matches!(vote.submit(9).await, Err(Error::InvalidOption(9))));
        assert_eq!(vote.state(), &SubmissionState::Idle);
        assert!(ledger.calls().is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_attempt_then_confirmed() {
        let (secret, public) = generate_keypair();
        let wallet = LocalWallet::random();
        let voter = wallet.address();
        let ledger = MemoryLedger::new(voter);

        let mut pending = PrivateVote::new(
            districts(),
            public.clone(),
            PendingWallet(voter),
            ledger.clone(),
        );
        let abandoned =
            tokio::time::timeout(std::time::Duration::from_millis(50), pending.submit(1)).await;
        assert!(abandoned.is_err());

        // The same flow object resumes once the wallet can sign again
        let mut vote = PrivateVote {
            election: pending.election,
            authority: pending.authority,
            wallet,
            ledger: pending.ledger,
            state: pending.state,
        };
        let receipt = vote.submit(1).await.unwrap();
        assert_eq!(vote.state(), &SubmissionState::Confirmed(receipt));

        let calls = ledger.calls();
        assert_eq!(calls.len(), 1);
        let call = CallData::from_bytes(&calls[0].call_data).unwrap();
        let signature =
            String::from_utf8(secret.decrypt(&call.encrypted_signature).unwrap()).unwrap();
        let vote = match_signature(&signature, voter, &districts().options)
            .unwrap()
            .unwrap();
        assert_eq!(vote.option_text, "District A");
    }

    #[tokio::test]
    async fn test_retry_uses_fresh_envelope() {
        let (_, public) = generate_keypair();
        let wallet = LocalWallet::random();
        let ledger = MemoryLedger::new(wallet.address());

        let mut vote = PrivateVote::new(districts(), public, wallet, ledger.clone());
        vote.submit(3).await.unwrap();
        vote.submit(3).await.unwrap();

        let calls = ledger.calls();
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0].call_data, calls[1].call_data);
    }
}
