//! Proposal payloads.
//!
//! Only the hash of a proposal goes on chain. The full payload travels over
//! the p2p network and is checked against the hash in the OP_RETURN.

use serde::{Deserialize, Serialize};

use bsq_types::{op_return::HASH_LENGTH, OpReturnType, Param, TxId, TxType};

use crate::consensus::{hash_of_payload, op_return_data};
use crate::error::GovernanceError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalKind {
    Generic,
    CompensationRequest {
        requested_bsq: u64,
        bsq_address: String,
    },
    ChangeParam {
        param: Param,
        value: u64,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub name: String,
    pub link: String,
    pub kind: ProposalKind,
    pub version: u8,
    /// Unix seconds.
    pub creation_time: u64,
    /// Set once the proposal tx is published. Not part of the hash.
    pub tx_id: Option<TxId>,
}

/// The hashed part of a proposal.
#[derive(Serialize)]
struct HashedProposal<'a> {
    name: &'a str,
    link: &'a str,
    kind: &'a ProposalKind,
    version: u8,
    creation_time: u64,
}

impl Proposal {
    pub fn new(name: impl Into<String>, link: impl Into<String>, kind: ProposalKind, creation_time: u64) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
            kind,
            version: bsq_types::op_return::OP_RETURN_VERSION,
            creation_time,
            tx_id: None,
        }
    }

    pub fn op_return_type(&self) -> OpReturnType {
        match self.kind {
            ProposalKind::Generic => OpReturnType::Proposal,
            ProposalKind::CompensationRequest { .. } => OpReturnType::CompensationRequest,
            ProposalKind::ChangeParam { .. } => OpReturnType::ChangeParam,
        }
    }

    pub fn tx_type(&self) -> TxType {
        match self.kind {
            ProposalKind::Generic => TxType::Proposal,
            ProposalKind::CompensationRequest { .. } => TxType::CompensationRequest,
            ProposalKind::ChangeParam { .. } => TxType::ChangeParam,
        }
    }

    pub fn payload_hash(&self) -> Result<[u8; HASH_LENGTH], GovernanceError> {
        hash_of_payload(&HashedProposal {
            name: &self.name,
            link: &self.link,
            kind: &self.kind,
            version: self.version,
            creation_time: self.creation_time,
        })
    }

    pub fn op_return_data(&self) -> Result<Vec<u8>, GovernanceError> {
        Ok(op_return_data(self.op_return_type(), &self.payload_hash()?))
    }

    /// Whether the on-chain hash commits to this payload.
    pub fn matches_hash(&self, hash: &[u8; HASH_LENGTH]) -> bool {
        self.payload_hash().is_ok_and(|h| &h == hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comp_request() -> Proposal {
        Proposal::new(
            "dev work",
            "https://example.com/1",
            ProposalKind::CompensationRequest {
                requested_bsq: 10_000,
                bsq_address: "Bbsq1".into(),
            },
            1_700_000_000,
        )
    }

    #[test]
    fn tx_id_does_not_change_hash() {
        let mut proposal = comp_request();
        let before = proposal.payload_hash().unwrap();
        proposal.tx_id = Some(TxId::new("published"));
        assert_eq!(proposal.payload_hash().unwrap(), before);
        assert!(proposal.matches_hash(&before));
    }

    #[test]
    fn kind_selects_op_return_type() {
        let proposal = comp_request();
        assert_eq!(proposal.op_return_type(), OpReturnType::CompensationRequest);
        assert_eq!(proposal.tx_type(), TxType::CompensationRequest);
        let data = proposal.op_return_data().unwrap();
        assert_eq!(data[0], OpReturnType::CompensationRequest.as_byte());

        let change = Proposal::new(
            "raise fee",
            "",
            ProposalKind::ChangeParam {
                param: Param::ProposalFee,
                value: 300,
            },
            0,
        );
        assert_eq!(change.op_return_type(), OpReturnType::ChangeParam);
    }

    #[test]
    fn edited_payload_no_longer_matches() {
        let proposal = comp_request();
        let hash = proposal.payload_hash().unwrap();
        let mut edited = proposal.clone();
        edited.link.push('x');
        assert!(!edited.matches_hash(&hash));
    }
}
