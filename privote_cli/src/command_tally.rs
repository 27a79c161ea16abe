use crate::{fail, Config};
use privote::{BallotRecord, Outcome, TallyReport};

pub fn command_tally(matches: &clap::ArgMatches, config: &Config) {
    let secret_key = config.require_secret_key("tally");

    let election_id = matches
        .get_one::<u64>("election-id")
        .copied()
        .unwrap_or_else(|| fail("tally", "election id required"));
    let election = config.require_election("tally", election_id);

    let filename = matches
        .get_one::<String>("BALLOTS-FILE")
        .map(|s| crate::expand(s))
        .unwrap_or_else(|| fail("tally", "ballots file required"));
    let file_bytes = std::fs::read(&filename)
        .unwrap_or_else(|e| fail("tally", format!("unable to read {}: {}", filename, e)));
    let ballots: Vec<BallotRecord> = serde_json::from_slice(&file_bytes)
        .unwrap_or_else(|e| fail("tally", format!("unable to read {}: {}", filename, e)));

    let report = privote::tally(&ballots, secret_key, election);

    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&report)
            .unwrap_or_else(|e| fail("tally", e));
        println!("{}", json);
    } else {
        print_report(&report);
    }
}

fn print_report(report: &TallyReport) {
    if report.title.is_empty() {
        println!("Election {}", report.election_id);
    } else {
        println!("Election {}: {}", report.election_id, report.title);
    }
    println!();

    for (i, verdict) in report.verdicts.iter().enumerate() {
        let result = match &verdict.outcome {
            Outcome::Counted { vote } => format!("{} (choice {})", vote.option_text, vote.choice()),
            Outcome::NoMatch => "no match".to_owned(),
            Outcome::Failed { kind, detail } => format!("rejected [{}] {}", kind, detail),
        };
        match verdict.user_id {
            Some(user_id) => println!("#{} {} (user {}): {}", i + 1, verdict.voter, user_id, result),
            None => println!("#{} {}: {}", i + 1, verdict.voter, result),
        }
    }
    println!();

    println!("Totals ({} of {} ballots counted):", report.counted, report.ballots);
    for option in report.totals.values() {
        println!(
            "  {:>3}  {:>5.1}%  {}",
            option.votes, option.percentage, option.text
        );
    }
    println!();

    if report.winners.is_empty() {
        println!("Winner: none");
    } else {
        println!("Winner: {}", report.winners.join(", "));
    }

    println!("Anomalies: {}", report.anomaly_count());
    for (reason, count) in report.anomalies.iter() {
        println!("  {}: {}", reason, count);
    }
}
