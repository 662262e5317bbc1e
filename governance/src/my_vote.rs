//! The voter's own votes.
//!
//! A vote is stored locally when its blind vote tx is created, because the
//! secret key must survive until the reveal phase. The list is written to
//! storage after every change.

use serde::{Deserialize, Serialize};

use bsq_crypto::SecretKey;
use bsq_store::DaoStateReader;
use bsq_types::{Cycle, TxId};

use crate::ballot::BallotList;
use crate::blind_vote::BlindVote;
use crate::error::GovernanceError;
use crate::merit::{merit_stake, MeritList};
use crate::storage::MyVoteStorage;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MyVote {
    /// Chain height when the vote was created.
    pub height: u32,
    pub ballot_list: BallotList,
    pub secret_key: SecretKey,
    pub blind_vote: BlindVote,
    /// Unix seconds.
    pub date: u64,
    pub reveal_tx_id: Option<TxId>,
}

impl MyVote {
    pub fn blind_vote_tx_id(&self) -> Option<&TxId> {
        self.blind_vote.tx_id.as_ref()
    }

    pub fn merit_list(&self) -> Result<MeritList, GovernanceError> {
        self.blind_vote.decrypt_merit_list(&self.secret_key)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MyVoteList(pub Vec<MyVote>);

impl MyVoteList {
    pub fn iter(&self) -> impl Iterator<Item = &MyVote> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

pub struct MyVoteListService<P: MyVoteStorage> {
    storage: P,
    list: MyVoteList,
}

impl<P: MyVoteStorage> MyVoteListService<P> {
    pub fn load(storage: P) -> Result<Self, GovernanceError> {
        let list = storage.load()?;
        tracing::debug!(votes = list.len(), "loaded my vote list");
        Ok(Self { storage, list })
    }

    pub fn list(&self) -> &MyVoteList {
        &self.list
    }

    /// Record a freshly created blind vote at the current chain height.
    pub fn create_and_add_my_vote<S: DaoStateReader + ?Sized>(
        &mut self,
        state: &S,
        ballot_list: BallotList,
        secret_key: SecretKey,
        blind_vote: BlindVote,
        date: u64,
    ) -> Result<(), GovernanceError> {
        let my_vote = MyVote {
            height: state.chain_height(),
            ballot_list,
            secret_key,
            blind_vote,
            date,
            reveal_tx_id: None,
        };
        let height = my_vote.height;
        let blind_vote_tx_id = my_vote.blind_vote_tx_id().cloned();
        self.list.0.push(my_vote);
        if let Err(e) = self.persist() {
            self.list.0.pop();
            return Err(e);
        }
        tracing::info!(height, blind_vote_tx_id = ?blind_vote_tx_id, "added my vote");
        Ok(())
    }

    pub fn apply_reveal_tx_id(
        &mut self,
        blind_vote_tx_id: &TxId,
        reveal_tx_id: TxId,
    ) -> Result<(), GovernanceError> {
        let my_vote = self
            .list
            .0
            .iter_mut()
            .find(|v| v.blind_vote_tx_id() == Some(blind_vote_tx_id))
            .ok_or_else(|| GovernanceError::MyVoteNotFound(blind_vote_tx_id.clone()))?;
        let previous = my_vote.reveal_tx_id.replace(reveal_tx_id.clone());
        if let Err(e) = self.persist() {
            if let Some(my_vote) = self
                .list
                .0
                .iter_mut()
                .find(|v| v.blind_vote_tx_id() == Some(blind_vote_tx_id))
            {
                my_vote.reveal_tx_id = previous;
            }
            return Err(e);
        }
        tracing::info!(blind_vote_tx_id = %blind_vote_tx_id, reveal_tx_id = %reveal_tx_id, "vote revealed");
        Ok(())
    }

    /// Merit and stake this node voted with on `proposal_tx_id`.
    ///
    /// Merit is weighed at the height of the blind vote tx, or the vote's
    /// creation height while the tx is unconfirmed.
    pub fn merit_and_stake_for_proposal<S: DaoStateReader + ?Sized>(
        &self,
        proposal_tx_id: &TxId,
        state: &S,
        blocks_per_year: u32,
    ) -> Result<Option<(u64, u64)>, GovernanceError> {
        let Some(my_vote) = self
            .list
            .iter()
            .find(|v| v.ballot_list.find(proposal_tx_id).is_some())
        else {
            return Ok(None);
        };
        let height = my_vote
            .blind_vote_tx_id()
            .and_then(|id| state.tx(id))
            .map(|tx| tx.block_height)
            .unwrap_or(my_vote.height);
        let merit = merit_stake(&my_vote.merit_list()?, state, height, blocks_per_year)?;
        Ok(Some((merit, my_vote.blind_vote.stake)))
    }

    pub fn my_votes_for_cycle<'a>(&'a self, cycle: &'a Cycle) -> impl Iterator<Item = &'a MyVote> {
        self.list.iter().filter(move |v| cycle.contains(v.height))
    }

    fn persist(&self) -> Result<(), GovernanceError> {
        self.storage.save(&self.list)
    }
}
