use crate::fail;
use privote::{AuthorityPublicKey, AuthoritySecretKey, ElectionConfig, ElectionRegistry};
use std::env::var;

const BUNDLED_ELECTIONS: &str = include_str!("elections.json");

pub struct Config {
    pub secret_key: Option<AuthoritySecretKey>,
    pub public_key: Option<AuthorityPublicKey>,
    pub elections: ElectionRegistry,
}

impl Config {
    /// Load configuration from the environment, after reading `.env` if there is one.
    pub fn from_env(elections_file: Option<&str>) -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                fail("config", format!("unable to read .env: {}", e));
            }
        }

        let secret_key = match var("PRIVOTE_SECRET_KEY") {
            Ok(val) => match AuthoritySecretKey::decode(&val) {
                Ok(key) => Some(key),
                Err(e) => fail("config", format!("PRIVOTE_SECRET_KEY: {}", e)),
            },
            Err(_e) => None,
        };

        let public_key = match var("PRIVOTE_PUBLIC_KEY") {
            Ok(val) => match AuthorityPublicKey::from_base64(val.trim().trim_matches('"')) {
                Ok(key) => Some(key),
                Err(e) => fail("config", format!("PRIVOTE_PUBLIC_KEY: {}", e)),
            },
            // Assume that WE are the authority
            Err(_e) => secret_key.as_ref().map(AuthoritySecretKey::public_key),
        };

        let elections_file = elections_file
            .map(str::to_owned)
            .or_else(|| var("PRIVOTE_ELECTIONS").ok().map(|path| crate::expand(&path)));

        let elections = match elections_file {
            Some(path) => {
                let bytes = std::fs::read(&path).unwrap_or_else(|e| {
                    fail("config", format!("unable to read {}: {}", path, e))
                });
                ElectionRegistry::from_json(&bytes)
                    .unwrap_or_else(|e| fail("config", format!("{}: {}", path, e)))
            }
            None => ElectionRegistry::from_json(BUNDLED_ELECTIONS.as_bytes())
                .unwrap_or_else(|e| fail("config", e)),
        };

        Config {
            secret_key,
            public_key,
            elections,
        }
    }

    pub fn require_secret_key(&self, command: &str) -> &AuthoritySecretKey {
        match &self.secret_key {
            Some(key) => key,
            None => fail(
                command,
                "PRIVOTE_SECRET_KEY must be set in the environment or in .env",
            ),
        }
    }

    pub fn require_public_key(&self, command: &str) -> &AuthorityPublicKey {
        match &self.public_key {
            Some(key) => key,
            None => fail(
                command,
                "PRIVOTE_PUBLIC_KEY or PRIVOTE_SECRET_KEY must be set in the environment or in .env",
            ),
        }
    }

    pub fn require_election(&self, command: &str, election_id: u64) -> &ElectionConfig {
        match self.elections.get(election_id) {
            Some(election) => election,
            None => fail(
                command,
                format!("no configuration for election {}", election_id),
            ),
        }
    }
}
