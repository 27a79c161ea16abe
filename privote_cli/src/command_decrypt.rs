use crate::{fail, Config};
use alloy_primitives::Address;
use privote::{check_call_data, decode_signature_plaintext, match_signature, CallData};

pub fn command_decrypt(matches: &clap::ArgMatches, config: &Config) {
    let secret_key = config.require_secret_key("decrypt");

    let call_data = matches
        .get_one::<String>("CALL-DATA")
        .map(|s| crate::expand(s))
        .unwrap_or_else(|| fail("decrypt", "call data required"));
    let voter: Address = matches
        .get_one::<String>("VOTER-ADDRESS")
        .map(|s| crate::expand(s))
        .unwrap_or_else(|| fail("decrypt", "voter address required"))
        .trim()
        .parse()
        .unwrap_or_else(|e| fail("decrypt", format!("invalid voter address: {}", e)));

    println!("Extracting encrypted signature from call data...");
    let call = CallData::from_hex(&call_data).unwrap_or_else(|e| fail("decrypt", e));
    let election = config
        .elections
        .get_by_word(call.election_id)
        .unwrap_or_else(|e| fail("decrypt", e));
    check_call_data(&call, election).unwrap_or_else(|e| fail("decrypt", e));
    println!("  election id:         {}", call.election_id);
    println!(
        "  encrypted signature: {} bytes",
        call.encrypted_signature.len()
    );

    println!("Decrypting with the tally authority key...");
    let signature = secret_key
        .decrypt(&call.encrypted_signature)
        .and_then(decode_signature_plaintext)
        .unwrap_or_else(|e| fail("decrypt", e));
    println!("  signature: {}", signature);

    println!(
        "Matching signature against {} options for voter {}...",
        election.options.len(),
        voter
    );
    let vote = match_signature(&signature, voter, &election.options)
        .unwrap_or_else(|e| fail("decrypt", e));

    println!();
    match vote {
        Some(vote) => {
            match vote.district() {
                Some(district) => println!("Verdict: voted for District {}", district),
                None => println!("Verdict: voted for {}", vote.option_text),
            }
            println!("  option: {}", vote.option_text);
            println!("  index:  {} (choice {})", vote.index, vote.choice());
        }
        None => {
            println!("Verdict: no match");
            println!(
                "  the signature does not match any option of election {} for {}",
                election.election_id, voter
            );
        }
    }
}
