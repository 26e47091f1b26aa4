//! Squad account decoding and enrichment for the Squads v1 program.
//!
//! Raw account bytes decode into a [`SquadAccount`]; [`rpc::enrich`] resolves
//! supply and balances and produces a [`Squad`] with per-member voting power.

pub mod account_layouts;
pub mod accounts;
pub mod client;
pub mod codec;
pub mod config;
pub mod constants;
pub mod errors;
pub mod layout;
pub mod rpc;
pub mod token_layouts;
pub mod voting;

pub use accounts::{AllocationType, EnrichmentInputs, Squad, SquadAccount, SquadMember};
pub use client::SquadsClient;
pub use config::{ClientConfig, Cluster};
pub use errors::SquadsError;
pub use rpc::{AccountFetcher, AccountInfo, AccountRpc, SquadsRpc};
pub use voting::VotingPower;
