use crate::{fail, Config};
use privote::{FailureReason, LocalWallet, MemoryLedger, PrivateVote, Wallet};

pub fn command_vote(matches: &clap::ArgMatches, config: &Config) {
    let public_key = config.require_public_key("vote");

    let election_id = matches
        .get_one::<u64>("election-id")
        .copied()
        .unwrap_or_else(|| fail("vote", "election id required"));
    let election = config.require_election("vote", election_id);

    let option_id = matches
        .get_one::<u32>("OPTION-ID")
        .copied()
        .unwrap_or_else(|| fail("vote", "option id required"));

    let wallet_key = matches
        .get_one::<String>("wallet-key")
        .map(|s| crate::expand(s))
        .unwrap_or_else(|| fail("vote", "wallet key required"));
    let wallet = LocalWallet::from_hex(&wallet_key).unwrap_or_else(|e| fail("vote", e));
    let ledger = MemoryLedger::new(wallet.address());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fail("vote", e));

    let mut vote = PrivateVote::new(election.clone(), public_key.clone(), wallet, ledger.clone());
    match runtime.block_on(vote.submit(option_id)) {
        Ok(receipt) => eprintln!("Vote submitted: {}", receipt.tx_hash),
        Err(privote::Error::InvalidOption(id)) => fail(
            "vote",
            format!("option {} does not exist in election {}", id, election_id),
        ),
        Err(e) => {
            tracing::debug!("{}", e);
            fail("vote", FailureReason::from(&e))
        }
    }

    for ballot in ledger.ballots() {
        let json = serde_json::to_string_pretty(&ballot).unwrap_or_else(|e| fail("vote", e));
        println!("{}", json);
    }
}
