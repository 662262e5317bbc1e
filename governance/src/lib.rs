//! DAO governance.
//!
//! Proposals are published as hash commitments in OP_RETURN outputs. Votes are
//! cast blind: the ballot list and the voter's merit list are encrypted with a
//! per-vote key and only the hash goes on chain. The key is revealed in a later
//! phase. Voting weight is the locked stake plus merit, the age-decayed value
//! of the voter's past compensation issuance.

pub mod ballot;
pub mod blind_vote;
pub mod consensus;
pub mod error;
pub mod merit;
pub mod my_vote;
pub mod proposal;
pub mod storage;

pub use ballot::{Ballot, BallotList, Vote, VoteWithProposalTxId};
pub use blind_vote::{blind_vote_list_hash, BlindVote};
pub use error::GovernanceError;
pub use merit::{merit_stake, weighted_merit_amount, Issuance, Merit, MeritList};
pub use my_vote::{MyVote, MyVoteList, MyVoteListService};
pub use proposal::{Proposal, ProposalKind};
pub use storage::{JsonFileStorage, MemoryStorage, MyVoteStorage};
