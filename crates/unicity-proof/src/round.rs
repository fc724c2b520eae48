//! Round certification, producer side
//!
//! A [`PartitionRound`] gathers the final state of every unit of one shard at
//! the end of a round. Certifying it builds the whole commitment chain (unit
//! log trees, state tree, shard tree, unicity tree), signs the seal with the
//! given root signers and yields a [`CertifiedRound`] that hands out unit
//! state proofs.
//!
//! The root chain normally builds the shard and unicity trees from many
//! partitions' submissions; here the other shards and partitions are passed
//! in as finished leaves.

use serde_bytes::ByteBuf;
use std::collections::BTreeMap;

use unicity_core::crypto::hash::HashAlgorithm;
use unicity_core::serialization::encode_tagged;
use unicity_core::{HashAlgorithmKind, Hashable, Result, ShardId, Signer, UnicityError, UnitId};
use unicity_types::{
    InputRecord, PartitionDescriptionRecord, ShardTree, ShardTreeInput, StateTree, StateUnit,
    UnicityCertificate, UnicitySeal, UnicityTree, UnicityTreeData, INPUT_RECORD_VERSION,
};

use crate::unit_log::UnitLog;
use crate::unit_proof::{StateUnitData, UnitStateProof};

/// Proof format version produced by this crate
pub const UNIT_STATE_PROOF_VERSION: u32 = 1;

/// A root validator taking part in signing the seal
pub type RootSigner<'a> = (&'a str, &'a dyn Signer);

/// Final state of one unit in a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundUnit {
    /// Unit's own value
    pub value: u64,
    /// Unit data after the round
    pub data: StateUnitData,
    /// Unit's log of this round
    pub log: UnitLog,
}

/// Round facts supplied by the partition and the root chain
#[derive(Debug, Clone, Default)]
pub struct RoundParams {
    /// State hash certified for the previous round
    pub previous_state_hash: Vec<u8>,
    /// Partition round number
    pub round_number: u64,
    /// Epoch number
    pub epoch: u64,
    /// Round timestamp, seconds
    pub timestamp: u64,
    /// Block hash; required exactly when the state changed
    pub block_hash: Option<Vec<u8>>,
    /// Transaction-round hash
    pub tr_hash: Vec<u8>,
    /// Fees collected this round
    pub sum_of_earned_fees: u64,
    /// Root-chain round sealing this round
    pub root_round: u64,
    /// Hash of the previous root-chain seal
    pub previous_seal_hash: Vec<u8>,
    /// Inputs of the partition's other shards
    pub sibling_shards: Vec<ShardTreeInput>,
    /// Leaves of the other partitions in the unicity tree
    pub other_partitions: Vec<UnicityTreeData>,
}

/// Root-chain facts of a repeat round
#[derive(Debug, Clone, Default)]
pub struct RepeatParams {
    /// Partition round number; must exceed the repeated one
    pub round_number: u64,
    /// Root-chain round sealing the repeat
    pub root_round: u64,
    /// Seal timestamp, seconds
    pub timestamp: u64,
    /// Leaves of the other partitions in the unicity tree
    pub other_partitions: Vec<UnicityTreeData>,
}

/// Units of one shard at the end of a round
#[derive(Debug, Clone)]
pub struct PartitionRound {
    algorithm: HashAlgorithmKind,
    pdr: PartitionDescriptionRecord,
    shard: ShardId,
    units: BTreeMap<UnitId, RoundUnit>,
}

impl PartitionRound {
    /// Start a round of `shard` in the partition described by `pdr`
    pub fn new(
        algorithm: HashAlgorithmKind,
        pdr: PartitionDescriptionRecord,
        shard: ShardId,
    ) -> Result<Self> {
        pdr.is_valid()?;
        if !pdr.shards.shards().contains(&shard) {
            return Err(UnicityError::invalid(format!(
                "shard {shard} is not in the sharding scheme of partition {}",
                pdr.partition_id
            )));
        }
        Ok(Self {
            algorithm,
            pdr,
            shard,
            units: BTreeMap::new(),
        })
    }

    /// Add a unit's final state
    ///
    /// The latest log entry must commit to `data`.
    pub fn add_unit(&mut self, unit_id: UnitId, unit: RoundUnit) -> Result<()> {
        if unit_id.as_bytes().len() != self.pdr.unit_id_len as usize {
            return Err(UnicityError::invalid(format!(
                "unit id {unit_id} has length {}, partition uses {}",
                unit_id.as_bytes().len(),
                self.pdr.unit_id_len
            )));
        }
        let algorithm = self.algorithm.algorithm();
        let data_hash = unit.data.hash(algorithm)?;
        let latest = unit.log.latest()?;
        if latest.unit_data_hash.as_slice() != data_hash.as_slice() {
            return Err(UnicityError::hex_mismatch(
                "unit data hash",
                &latest.unit_data_hash,
                &data_hash,
            ));
        }
        if self.units.contains_key(&unit_id) {
            return Err(UnicityError::invalid(format!("duplicate unit {unit_id}")));
        }
        self.units.insert(unit_id, unit);
        Ok(())
    }

    /// Number of units in the round
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// True when no unit was added
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Build every tree of the round and seal it
    pub fn certify(
        &self,
        params: &RoundParams,
        signers: &[RootSigner<'_>],
    ) -> Result<CertifiedRound> {
        let algorithm = self.algorithm.algorithm();
        let state_units = self
            .units
            .iter()
            .map(|(id, unit)| {
                Ok(StateUnit {
                    unit_id: id.clone(),
                    log_root: unit.log.root(algorithm)?.to_vec(),
                    value: unit.value,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let state_tree = StateTree::new(algorithm, state_units)?;
        let state_hash = state_tree
            .root_hash()
            .ok_or_else(|| UnicityError::missing("state tree root"))?;

        let ir = InputRecord {
            version: INPUT_RECORD_VERSION,
            previous_hash: params.previous_state_hash.clone(),
            hash: state_hash.to_vec(),
            block_hash: params.block_hash.clone(),
            summary_value: state_tree.root_summary_value().to_be_bytes().to_vec(),
            et_hash: None,
            round_number: params.round_number,
            epoch: params.epoch,
            timestamp: params.timestamp,
            sum_of_earned_fees: params.sum_of_earned_fees,
        };
        ir.is_valid()?;

        let anchor = SealAnchor {
            root_round: params.root_round,
            epoch: params.epoch,
            timestamp: params.timestamp,
            previous_seal_hash: params.previous_seal_hash.clone(),
        };
        let certificate = self.seal(
            ir,
            &params.tr_hash,
            &params.sibling_shards,
            &params.other_partitions,
            &anchor,
            signers,
        )?;
        tracing::debug!(
            partition = %self.pdr.partition_id,
            shard = %self.shard,
            round = params.round_number,
            root_round = params.root_round,
            units = self.units.len(),
            "certified partition round"
        );
        Ok(CertifiedRound {
            round: self.clone(),
            state_tree,
            certificate,
            tr_hash: params.tr_hash.clone(),
            sibling_shards: params.sibling_shards.clone(),
        })
    }

    fn seal(
        &self,
        ir: InputRecord,
        tr_hash: &[u8],
        sibling_shards: &[ShardTreeInput],
        other_partitions: &[UnicityTreeData],
        anchor: &SealAnchor,
        signers: &[RootSigner<'_>],
    ) -> Result<UnicityCertificate> {
        let algorithm = self.algorithm.algorithm();
        let mut shard_inputs = sibling_shards.to_vec();
        shard_inputs.push(ShardTreeInput {
            shard: self.shard.clone(),
            ir: ir.clone(),
            tr_hash: tr_hash.to_vec(),
        });
        let shard_tree = ShardTree::new(&self.pdr.shards, &shard_inputs, algorithm)?;

        let partition = self.pdr.partition_id;
        let mut leaves = other_partitions.to_vec();
        leaves.push(UnicityTreeData {
            partition,
            shard_tree_root: shard_tree.root_hash().to_vec(),
            pdr_hash: self.pdr.descriptor_hash(algorithm)?.to_vec(),
        });
        let unicity_tree = UnicityTree::new(algorithm, leaves)?;
        let root = unicity_tree
            .root_hash()
            .ok_or_else(|| UnicityError::missing("unicity tree root"))?;

        let mut seal = UnicitySeal {
            version: 1,
            root_chain_round_number: anchor.root_round,
            epoch: anchor.epoch,
            timestamp: anchor.timestamp,
            previous_hash: anchor.previous_seal_hash.clone(),
            hash: root.to_vec(),
            signatures: BTreeMap::new(),
        };
        for (node_id, signer) in signers {
            seal.sign(node_id, *signer, algorithm)?;
        }

        Ok(UnicityCertificate {
            version: 1,
            input_record: Some(ir),
            tr_hash: tr_hash.to_vec(),
            shard_tree_certificate: shard_tree.certificate(&self.shard)?,
            unicity_tree_certificate: Some(unicity_tree.certificate(partition)?),
            unicity_seal: Some(seal),
        })
    }
}

struct SealAnchor {
    root_round: u64,
    epoch: u64,
    timestamp: u64,
    previous_seal_hash: Vec<u8>,
}

/// A sealed round, ready to hand out proofs
#[derive(Debug, Clone)]
pub struct CertifiedRound {
    round: PartitionRound,
    state_tree: StateTree,
    certificate: UnicityCertificate,
    tr_hash: Vec<u8>,
    sibling_shards: Vec<ShardTreeInput>,
}

impl CertifiedRound {
    /// The round's unicity certificate
    pub fn certificate(&self) -> &UnicityCertificate {
        &self.certificate
    }

    /// The round's state tree
    pub fn state_tree(&self) -> &StateTree {
        &self.state_tree
    }

    /// Hash algorithm of the round
    pub fn algorithm(&self) -> &'static dyn HashAlgorithm {
        self.round.algorithm.algorithm()
    }

    /// Unit ids of the round, in order
    pub fn unit_ids(&self) -> impl Iterator<Item = &UnitId> {
        self.round.units.keys()
    }

    fn unit(&self, unit_id: &UnitId) -> Result<&RoundUnit> {
        self.round
            .units
            .get(unit_id)
            .ok_or_else(|| UnicityError::not_found(format!("unit {unit_id} not found")))
    }

    /// Data of `unit_id` after the round
    pub fn unit_data(&self, unit_id: &UnitId) -> Result<&StateUnitData> {
        Ok(&self.unit(unit_id)?.data)
    }

    /// State proof of `unit_id` against the round's certificate
    pub fn unit_proof(&self, unit_id: &UnitId) -> Result<UnitStateProof> {
        let unit = self.unit(unit_id)?;
        let algorithm = self.algorithm();
        let latest = unit.log.latest()?;
        Ok(UnitStateProof {
            version: UNIT_STATE_PROOF_VERSION,
            unit_id: unit_id.clone(),
            unit_value: unit.value,
            unit_ledger_hash: latest.unit_ledger_hash.clone(),
            unit_tree_cert: Some(unit.log.certificate(algorithm)?),
            state_tree_cert: Some(self.state_tree.certificate(unit_id)?),
            unicity_certificate: Some(ByteBuf::from(encode_tagged(&self.certificate)?)),
        })
    }

    /// Seal a repeat of this round: same input record, later round numbers
    pub fn repeat(
        &self,
        params: &RepeatParams,
        signers: &[RootSigner<'_>],
    ) -> Result<CertifiedRound> {
        let algorithm = self.algorithm();
        let ir = self.certificate.input_record()?.new_repeat(params.round_number)?;
        let previous_seal = self.certificate.unicity_seal()?;
        let anchor = SealAnchor {
            root_round: params.root_round,
            epoch: previous_seal.epoch,
            timestamp: params.timestamp,
            previous_seal_hash: previous_seal.hash(algorithm)?.to_vec(),
        };
        let certificate = self.round.seal(
            ir,
            &self.tr_hash,
            &self.sibling_shards,
            &params.other_partitions,
            &anchor,
            signers,
        )?;
        certificate.check_repeat(&self.certificate)?;
        tracing::debug!(
            partition = %self.round.pdr.partition_id,
            round = params.round_number,
            root_round = params.root_round,
            "sealed repeat round"
        );
        Ok(CertifiedRound {
            certificate,
            ..self.clone()
        })
    }
}
