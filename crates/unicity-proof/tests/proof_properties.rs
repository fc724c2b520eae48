//! Property tests for produced proofs
//!
//! For arbitrary rounds, every unit's proof verifies against the round's
//! certificate, and claiming a different unit value is caught as a summary
//! mismatch.

use async_trait::async_trait;
use proptest::prelude::*;
use std::collections::BTreeMap;

use unicity_core::{HashAlgorithmKind, PartitionId, PartitionTypeId, ShardId, UnitId};
use unicity_proof::{
    verify_unit_state_proof, CertifiedRound, PartitionRound, RoundParams, RoundUnit,
    StateUnitData, UnicityCertificateValidator, UnitLog, VerificationError,
};
use unicity_types::{PartitionDescriptionRecord, ShardingScheme, UnicityCertificate};

struct AcceptAll;

#[async_trait]
impl UnicityCertificateValidator for AcceptAll {
    async fn validate(&self, _certificate: &UnicityCertificate) -> unicity_core::Result<()> {
        Ok(())
    }
}

fn certify(algorithm: HashAlgorithmKind, units: &BTreeMap<[u8; 2], (u64, u8)>) -> CertifiedRound {
    let algo = algorithm.algorithm();
    let pdr = PartitionDescriptionRecord {
        version: 1,
        network_id: 1,
        partition_id: PartitionId::new(2),
        partition_type_id: PartitionTypeId::new(1),
        type_id_len: 0,
        unit_id_len: 2,
        shards: ShardingScheme::default(),
        t2_timeout_ms: 1_000,
    };
    let mut round = PartitionRound::new(algorithm, pdr, ShardId::root()).unwrap();
    for (id, (value, changes)) in units {
        let data = StateUnitData::new(id.to_vec());
        let data_hash = data.hash(algo).unwrap().to_vec();
        let mut log = UnitLog::new(vec![id[0]; 32]);
        log.append(None, data_hash.clone(), algo);
        for i in 0..*changes {
            log.append(Some(vec![i; 32]), data_hash.clone(), algo);
        }
        round
            .add_unit(UnitId::new(id.to_vec()), RoundUnit { value: *value, data, log })
            .unwrap();
    }
    let params = RoundParams {
        previous_state_hash: vec![0; 32],
        round_number: 1,
        timestamp: 1,
        block_hash: Some(vec![1; 32]),
        tr_hash: vec![2; 32],
        root_round: 1,
        previous_seal_hash: vec![3; 32],
        ..Default::default()
    };
    round.certify(&params, &[]).unwrap()
}

fn rounds() -> impl Strategy<Value = (HashAlgorithmKind, BTreeMap<[u8; 2], (u64, u8)>)> {
    (
        prop_oneof![Just(HashAlgorithmKind::Sha256), Just(HashAlgorithmKind::Blake3)],
        prop::collection::btree_map(any::<[u8; 2]>(), (0u64..1_000_000, 0u8..4), 1..24),
    )
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #[test]
    fn every_unit_proof_verifies((algorithm, units) in rounds()) {
        let round = certify(algorithm, &units);
        let algo = algorithm.algorithm();
        for id in round.unit_ids() {
            let proof = round.unit_proof(id).unwrap();
            let data = round.unit_data(id).unwrap();
            let outcome = block_on(verify_unit_state_proof(&proof, algo, Some(data), &AcceptAll));
            prop_assert!(outcome.is_ok(), "{:?}", outcome);
        }
    }

    #[test]
    fn claimed_value_change_is_caught(
        (algorithm, units) in rounds(),
        delta in 1u64..1_000,
    ) {
        let round = certify(algorithm, &units);
        let id = round.unit_ids().next().unwrap().clone();
        let mut proof = round.unit_proof(&id).unwrap();
        proof.unit_value += delta;
        let data = round.unit_data(&id).unwrap();
        let outcome = block_on(verify_unit_state_proof(
            &proof,
            algorithm.algorithm(),
            Some(data),
            &AcceptAll,
        ));
        let is_summary_mismatch = matches!(
            outcome,
            Err(VerificationError::SummaryValueMismatch { .. })
        );
        prop_assert!(is_summary_mismatch);
    }
}
