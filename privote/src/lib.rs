#[macro_use]
extern crate serde;

mod calldata;
mod election;
mod error;
mod keys;
mod ledger;
mod message;
mod nacl_box;
mod tally;
mod vote;
mod wallet;

pub use calldata::*;
pub use election::*;
pub use error::*;
pub use keys::*;
pub use ledger::*;
pub use message::*;
pub use nacl_box::*;
pub use tally::*;
pub use vote::*;
pub use wallet::*;

#[cfg(test)]
mod tests;
