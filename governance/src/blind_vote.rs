//! Blind votes.
//!
//! The encrypted ballot list is hashed into the blind vote OP_RETURN. After the
//! blind vote phase every voter reveals its key together with the hash of the
//! list of all blind votes it has seen, so votes can be counted against a
//! common set.

use serde::{Deserialize, Serialize};

use bsq_crypto::{decrypt, encrypt, SecretKey};
use bsq_types::{op_return::HASH_LENGTH, OpReturnType, TxId};

use crate::ballot::{BallotList, VoteWithProposalTxId};
use crate::consensus::{hash_of_payload, op_return_data};
use crate::error::GovernanceError;
use crate::merit::MeritList;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindVote {
    pub encrypted_votes: Vec<u8>,
    pub tx_id: Option<TxId>,
    pub stake: u64,
    pub encrypted_merit_list: Vec<u8>,
}

impl BlindVote {
    pub fn create(
        ballots: &BallotList,
        merits: &MeritList,
        stake: u64,
        secret_key: &SecretKey,
    ) -> Result<Self, GovernanceError> {
        let votes = bincode::serialize(&ballots.votes())?;
        Ok(Self {
            encrypted_votes: encrypt(&votes, secret_key)?,
            tx_id: None,
            stake,
            encrypted_merit_list: encrypt(&merits.to_bytes()?, secret_key)?,
        })
    }

    pub fn decrypt_votes(
        &self,
        secret_key: &SecretKey,
    ) -> Result<Vec<VoteWithProposalTxId>, GovernanceError> {
        let plain = decrypt(&self.encrypted_votes, secret_key)?;
        Ok(bincode::deserialize(&plain)?)
    }

    pub fn decrypt_merit_list(&self, secret_key: &SecretKey) -> Result<MeritList, GovernanceError> {
        MeritList::from_bytes(&decrypt(&self.encrypted_merit_list, secret_key)?)
    }

    pub fn hash(&self) -> Result<[u8; HASH_LENGTH], GovernanceError> {
        hash_of_payload(&self.encrypted_votes)
    }

    pub fn op_return_data(&self) -> Result<Vec<u8>, GovernanceError> {
        Ok(op_return_data(OpReturnType::BlindVote, &self.hash()?))
    }
}

/// Hash over the tx ids of `blind_votes`, independent of their order.
/// Blind votes not yet published are skipped.
pub fn blind_vote_list_hash(blind_votes: &[BlindVote]) -> Result<[u8; HASH_LENGTH], GovernanceError> {
    let mut tx_ids: Vec<&TxId> = blind_votes.iter().filter_map(|b| b.tx_id.as_ref()).collect();
    tx_ids.sort();
    hash_of_payload(&tx_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::{Ballot, Vote};
    use crate::merit::{Issuance, Merit};
    use crate::proposal::{Proposal, ProposalKind};
    use bsq_crypto::generate_secret_key;

    fn ballots() -> BallotList {
        let mut proposal = Proposal::new("p", "", ProposalKind::Generic, 0);
        proposal.tx_id = Some(TxId::new("p1"));
        BallotList::new(vec![Ballot::new(proposal, Some(Vote::Accept))])
    }

    fn merits() -> MeritList {
        MeritList::new(vec![Merit {
            issuance: Issuance {
                tx_id: TxId::new("c1"),
                chain_height: 5,
                amount: 100,
            },
        }])
    }

    #[test]
    fn decrypts_with_the_right_key_only() {
        let key = generate_secret_key().unwrap();
        let blind_vote = BlindVote::create(&ballots(), &merits(), 1_000, &key).unwrap();

        let votes = blind_vote.decrypt_votes(&key).unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].proposal_tx_id, TxId::new("p1"));
        assert_eq!(votes[0].vote, Some(Vote::Accept));
        assert_eq!(blind_vote.decrypt_merit_list(&key).unwrap(), merits());

        let other = generate_secret_key().unwrap();
        assert!(blind_vote.decrypt_votes(&other).is_err());
    }

    #[test]
    fn list_hash_ignores_order() {
        let key = generate_secret_key().unwrap();
        let mut a = BlindVote::create(&ballots(), &merits(), 1, &key).unwrap();
        let mut b = a.clone();
        a.tx_id = Some(TxId::new("a"));
        b.tx_id = Some(TxId::new("b"));
        assert_eq!(
            blind_vote_list_hash(&[a.clone(), b.clone()]).unwrap(),
            blind_vote_list_hash(&[b, a]).unwrap()
        );
    }

    #[test]
    fn op_return_commits_to_encrypted_votes() {
        let key = generate_secret_key().unwrap();
        let blind_vote = BlindVote::create(&ballots(), &merits(), 1, &key).unwrap();
        let data = blind_vote.op_return_data().unwrap();
        assert_eq!(data[0], OpReturnType::BlindVote.as_byte());
        assert_eq!(&data[2..], &blind_vote.hash().unwrap());
    }
}
