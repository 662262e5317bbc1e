use serde::{Deserialize, Serialize};

use bsq_types::TxId;

use crate::proposal::Proposal;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vote {
    Accept,
    Reject,
}

/// A proposal with the voter's decision; `None` means ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    pub proposal: Proposal,
    pub vote: Option<Vote>,
}

impl Ballot {
    pub fn new(proposal: Proposal, vote: Option<Vote>) -> Self {
        Self { proposal, vote }
    }

    pub fn proposal_tx_id(&self) -> Option<&TxId> {
        self.proposal.tx_id.as_ref()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotList(pub Vec<Ballot>);

impl BallotList {
    pub fn new(ballots: Vec<Ballot>) -> Self {
        Self(ballots)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ballot> {
        self.0.iter()
    }

    pub fn find(&self, proposal_tx_id: &TxId) -> Option<&Ballot> {
        self.0
            .iter()
            .find(|b| b.proposal_tx_id() == Some(proposal_tx_id))
    }

    /// The compact form that gets encrypted into a blind vote. Sorted by
    /// proposal tx id so that equal ballots encrypt equal plaintexts.
    pub fn votes(&self) -> Vec<VoteWithProposalTxId> {
        let mut votes: Vec<VoteWithProposalTxId> = self
            .0
            .iter()
            .filter_map(|b| {
                Some(VoteWithProposalTxId {
                    proposal_tx_id: b.proposal_tx_id()?.clone(),
                    vote: b.vote,
                })
            })
            .collect();
        votes.sort_by(|a, b| a.proposal_tx_id.cmp(&b.proposal_tx_id));
        votes
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteWithProposalTxId {
    pub proposal_tx_id: TxId,
    pub vote: Option<Vote>,
}
