use crate::*;
use alloy_primitives::U256;
use std::collections::HashSet;

/// One choice on a private ballot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VoteOption {
    /// 1-based, unique within the election
    pub id: u32,

    /// Embedded verbatim in the message the voter signs.
    pub text: String,
}

impl VoteOption {
    pub fn new(id: u32, text: &str) -> Self {
        VoteOption {
            id,
            text: text.to_owned(),
        }
    }

    /// The exact message a voter signs to choose this option.
    pub fn message(&self) -> String {
        canonical_message(&self.text)
    }
}

/// A private election and its fixed list of options.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ElectionConfig {
    pub election_id: u64,

    #[serde(default)]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,

    /// Ordered list of options. Fixed once voting starts.
    pub options: Vec<VoteOption>,
}

impl ElectionConfig {
    /// Create an election whose options are numbered `1..=n` in the given order.
    pub fn new(election_id: u64, options: &[&str]) -> Self {
        ElectionConfig {
            election_id,
            title: String::new(),
            options: options
                .iter()
                .enumerate()
                .map(|(i, text)| VoteOption::new(i as u32 + 1, text))
                .collect(),
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    /// Parse and validate an election from JSON
    pub fn from_json(bytes: &[u8]) -> Result<Self, Error> {
        let election: ElectionConfig = serde_json::from_slice(bytes)?;
        election.validate()?;
        Ok(election)
    }

    /// Option ids must be `1..=n` in order and option texts must be unique, so that every
    /// option has a distinct canonical message.
    pub fn validate(&self) -> Result<(), Error> {
        if self.options.is_empty() {
            return Err(Error::InvalidElection(format!(
                "election {} has no options",
                self.election_id
            )));
        }

        let mut texts = HashSet::new();
        for (i, option) in self.options.iter().enumerate() {
            if option.id as usize != i + 1 {
                return Err(Error::InvalidElection(format!(
                    "election {}: option at position {} has id {} (expected {})",
                    self.election_id,
                    i,
                    option.id,
                    i + 1
                )));
            }
            if !texts.insert(option.text.as_str()) {
                return Err(Error::InvalidElection(format!(
                    "election {}: duplicate option text {:?}",
                    self.election_id, option.text
                )));
            }
        }

        Ok(())
    }

    /// Get an option with the given ID
    pub fn get_option(&self, option_id: u32) -> Option<&VoteOption> {
        self.options.iter().find(|option| option.id == option_id)
    }

    /// The election id as it appears in call data
    pub fn election_id_word(&self) -> U256 {
        U256::from(self.election_id)
    }
}

/// Every private election the tally authority is responsible for.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ElectionRegistry {
    pub elections: Vec<ElectionConfig>,
}

impl ElectionRegistry {
    pub fn from_json(bytes: &[u8]) -> Result<Self, Error> {
        let registry: ElectionRegistry = serde_json::from_slice(bytes)?;
        registry.validate()?;
        Ok(registry)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let mut ids = HashSet::new();
        for election in self.elections.iter() {
            election.validate()?;
            if !ids.insert(election.election_id) {
                return Err(Error::InvalidElection(format!(
                    "duplicate election id {}",
                    election.election_id
                )));
            }
        }
        Ok(())
    }

    /// Get an election with the given ID
    pub fn get(&self, election_id: u64) -> Option<&ElectionConfig> {
        self.elections
            .iter()
            .find(|election| election.election_id == election_id)
    }

    /// Look up the election named by a call data election word.
    pub fn get_by_word(&self, election_id: U256) -> Result<&ElectionConfig, Error> {
        u64::try_from(election_id)
            .ok()
            .and_then(|id| self.get(id))
            .ok_or_else(|| Error::UnknownElection(election_id.to_string()))
    }
}
