use clap::{value_parser, Arg, ArgAction, Command};
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod command_decrypt;
mod command_keygen;
mod command_tally;
mod command_vote;
mod config;

pub use command_decrypt::*;
pub use command_keygen::*;
pub use command_tally::*;
pub use command_vote::*;
pub use config::*;

fn main() {
    let matches = Command::new("privote")
        .version("0.1.0")
        .about("Tally authority tooling for encrypted private votes")
        .arg(
            Arg::new("v")
                .short('v')
                .action(ArgAction::Count)
                .global(true)
                .help("Sets the level of verbosity"),
        )
        .arg(
            Arg::new("elections")
                .long("elections")
                .value_name("FILE")
                .global(true)
                .help("Election registry in JSON - can also be set with PRIVOTE_ELECTIONS"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("keygen")
                .about("Generate a tally authority keypair, or derive the public key of a secret")
                .arg(
                    Arg::new("secret")
                        .long("secret")
                        .value_name("KEY")
                        .help("Existing secret key in base64 or 0x-hex - defaults to PRIVOTE_SECRET_KEY"),
                ),
        )
        .subcommand(
            Command::new("decrypt")
                .about("Decrypt and verify a single private vote")
                .arg(
                    Arg::new("CALL-DATA")
                        .index(1)
                        .required(true)
                        .help("castPrivateVote call data in hex"),
                )
                .arg(
                    Arg::new("VOTER-ADDRESS")
                        .index(2)
                        .required(true)
                        .help("Address that sent the transaction"),
                ),
        )
        .subcommand(
            Command::new("tally")
                .about("Tally a file of private votes")
                .arg(
                    Arg::new("BALLOTS-FILE")
                        .index(1)
                        .required(true)
                        .help("JSON array of ballot records"),
                )
                .arg(election_id_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the full report as JSON"),
                ),
        )
        .subcommand(
            Command::new("vote")
                .about("Cast a private vote against an in-memory ledger")
                .arg(
                    Arg::new("OPTION-ID")
                        .index(1)
                        .required(true)
                        .value_parser(value_parser!(u32))
                        .help("1-based option id"),
                )
                .arg(election_id_arg())
                .arg(
                    Arg::new("wallet-key")
                        .long("wallet-key")
                        .value_name("HEX")
                        .required(true)
                        .help("Voter's secp256k1 private key"),
                ),
        )
        .get_matches();

    let level = match matches.get_count("v") {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    setup_tracing(level);

    let elections = matches.get_one::<String>("elections").map(|s| expand(s));
    let config = Config::from_env(elections.as_deref());

    // Subcommands
    match matches.subcommand() {
        Some(("keygen", matches)) => command_keygen(matches, &config),
        Some(("decrypt", matches)) => command_decrypt(matches, &config),
        Some(("tally", matches)) => command_tally(matches, &config),
        Some(("vote", matches)) => command_vote(matches, &config),
        _ => unreachable!("subcommand is required"),
    }
}

fn election_id_arg() -> Arg {
    Arg::new("election-id")
        .long("election-id")
        .value_name("ID")
        .required(true)
        .value_parser(value_parser!(u64))
        .help("Election to use")
}

// Logs go to stderr so stdout stays parseable
fn setup_tracing(level: Level) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(LevelFilter::from_level(level))
        .init();
}

/// Expand `~` and environment variables in an argument
pub fn expand(input: &str) -> String {
    shellexpand::full(input)
        .map(|expanded| expanded.into_owned())
        .unwrap_or_else(|_| input.to_owned())
}

pub fn fail(command: &str, message: impl std::fmt::Display) -> ! {
    eprintln!("privote {}: {}", command, message);
    std::process::exit(1);
}
