use crate::{fail, Config};
use privote::AuthoritySecretKey;

/// Secret key for `keygen`: `--secret`, then `PRIVOTE_SECRET_KEY`, then a fresh one.
pub fn keygen_secret(matches: &clap::ArgMatches, config: &Config) -> AuthoritySecretKey {
    match matches.get_one::<String>("secret") {
        Some(secret) => AuthoritySecretKey::decode(&crate::expand(secret))
            .unwrap_or_else(|e| fail("keygen", e)),
        None => match &config.secret_key {
            Some(secret) => secret.clone(),
            None => privote::generate_keypair().0,
        },
    }
}

pub fn command_keygen(matches: &clap::ArgMatches, config: &Config) {
    let secret = keygen_secret(matches, config);
    let public = secret.public_key();

    println!("secret-key (base64): {}", secret.to_base64());
    println!("secret-key (hex):    {}", secret.to_hex());
    println!("public-key (base64): {}", public.to_base64());
    println!();
    println!("# .env");
    println!("PRIVOTE_SECRET_KEY={}", secret.to_base64());
    println!("PRIVOTE_PUBLIC_KEY={}", public.to_base64());
}
