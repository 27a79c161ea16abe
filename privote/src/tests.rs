use crate::*;
use alloy_primitives::U256;

#[tokio::test]
async fn end_to_end() {
    // Create the authority keys and the election
    let (secret, public) = generate_keypair();
    let election = ElectionConfig::new(
        3,
        &["District A", "District B", "District C", "District D"],
    );
    election.validate().unwrap();

    // Three voters share one ledger
    let ledger = MemoryLedger::new(alloy_primitives::Address::ZERO);
    let choices = [2u32, 2, 4];
    let mut voters = vec![];
    for option_id in choices.iter() {
        let wallet = LocalWallet::random();
        let voter = wallet.address();
        let mut vote = PrivateVote::new(
            election.clone(),
            public.clone(),
            wallet,
            ledger.for_sender(voter),
        );
        vote.submit(*option_id).await.unwrap();
        voters.push(voter);
    }

    // Nothing on the ledger reveals the choice
    let calls = ledger.calls();
    assert_eq!(calls.len(), 3);
    for call in calls.iter() {
        let needle = b"District";
        assert!(!call.call_data.windows(needle.len()).any(|w| w == needle));
    }

    // Single ballot, the way the operator tool sees it
    let call_data = format!("0x{}", hex::encode(&calls[0].call_data));
    let extracted = extract_encrypted_signature(&call_data).unwrap();
    let signature = String::from_utf8(secret.decrypt(&extracted).unwrap()).unwrap();
    assert_eq!(signature.len(), SIGNATURE_HEX_LENGTH);

    let ballot = decrypt_and_verify(&call_data, voters[0], &secret, &election).unwrap();
    assert_eq!(ballot.election_id, U256::from(3u64));
    let vote = ballot.vote.clone().unwrap();
    assert_eq!(vote.index, 1);
    assert_eq!(vote.option_text, "District B");
    assert_eq!(canonical_message(&vote.option_text), "I vote for District B");
    assert_eq!(ballot.district(), Some('B'));

    // The same ballot claimed by another voter matches nothing
    let ballot = decrypt_and_verify(&call_data, voters[1], &secret, &election).unwrap();
    assert_eq!(ballot.vote, None);

    // Tally everything, plus a ballot encrypted to some other authority
    let (_, other_public) = generate_keypair();
    let stray = LocalWallet::random();
    let mut stray_vote = PrivateVote::new(
        election.clone(),
        other_public,
        stray.clone(),
        ledger.for_sender(stray.address()),
    );
    stray_vote.submit(1).await.unwrap();

    let report = tally(&ledger.ballots(), &secret, &election);
    assert_eq!(report.ballots, 4);
    assert_eq!(report.counted, 3);
    assert_eq!(report.totals["District B"].votes, 2);
    assert_eq!(report.totals["District D"].votes, 1);
    assert_eq!(report.totals["District D"].voters, vec![voters[2]]);
    assert_eq!(report.winners, vec!["District B".to_owned()]);
    assert_eq!(report.anomalies["decryption_failure"], 1);
    assert_eq!(report.verdicts[3].voter, stray.address());
}

#[test]
fn authority_key_from_env_encodings() {
    let (secret, public) = generate_keypair();

    let from_base64 = AuthoritySecretKey::decode(&secret.to_base64()).unwrap();
    let from_hex = AuthoritySecretKey::decode(&secret.to_hex()).unwrap();
    let quoted = AuthoritySecretKey::decode(&format!("\"{}\"", secret.to_base64())).unwrap();

    for key in [from_base64, from_hex, quoted] {
        assert_eq!(key.public_key(), public);
    }

    let envelope = public.encrypt(b"0x00").unwrap();
    assert_eq!(
        decrypt(&secret.to_bytes(), &envelope).unwrap(),
        b"0x00".to_vec()
    );
}
