//! End-to-end unit state proof verification
//!
//! A round is certified by two root signers (quorum 2) next to two other
//! partitions, then proofs are checked against a trust-base validator, with
//! single fields of the proof, data or certificate altered to hit each check.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use unicity_core::config::{RootNodeConfig, TrustBaseConfig, VerifierConfig};
use unicity_core::serialization::encode_tagged;
use unicity_core::{
    Ed25519Signer, Ed25519Verifier, HashAlgorithmKind, PartitionId, PartitionTypeId,
    Secp256k1Signer, Secp256k1Verifier, ShardId, Signer, UnicityError, UnitId,
};
use unicity_proof::{
    verify_unit_data_and_proof, verify_unit_state_proof, verify_with_timeout, CertifiedRound,
    PartitionRound, RepeatParams, RoundParams, RoundUnit, StateUnitData, TaggedValue,
    TrustBaseValidator, UnicityCertificateValidator, UnitDataAndProof, UnitLog,
    VerificationError,
};
use unicity_types::{
    PartitionDescriptionRecord, RootNode, RootTrustBase, ShardingScheme, UnicityCertificate,
    UnicityTreeData,
};

const ALGO: HashAlgorithmKind = HashAlgorithmKind::Sha256;
const PARTITION: PartitionId = PartitionId::new(5);

struct Fixture {
    signers: Vec<(String, Ed25519Signer)>,
    pdr: PartitionDescriptionRecord,
    round: CertifiedRound,
}

fn pdr() -> PartitionDescriptionRecord {
    PartitionDescriptionRecord {
        version: 1,
        network_id: 3,
        partition_id: PARTITION,
        partition_type_id: PartitionTypeId::new(1),
        type_id_len: 1,
        unit_id_len: 4,
        shards: ShardingScheme::default(),
        t2_timeout_ms: 2_500,
    }
}

fn unit_id(n: u8) -> UnitId {
    UnitId::new([0, 0, 0, n])
}

fn round_unit(value: u64, payload: &[u8], changes: u8) -> RoundUnit {
    let algo = ALGO.algorithm();
    let data = StateUnitData::new(payload.to_vec());
    let data_hash = data.hash(algo).unwrap();
    let mut log = UnitLog::new(vec![0x11; 32]);
    for i in 0..changes {
        log.append(Some(vec![i; 32]), data_hash.to_vec(), algo);
    }
    if changes == 0 {
        log.append(None, data_hash.to_vec(), algo);
    }
    RoundUnit { value, data, log }
}

fn other_partitions() -> Vec<UnicityTreeData> {
    [1u32, 9]
        .into_iter()
        .map(|id| UnicityTreeData {
            partition: PartitionId::new(id),
            shard_tree_root: vec![id as u8; 32],
            pdr_hash: vec![0xa0 | id as u8; 32],
        })
        .collect()
}

fn open_round() -> PartitionRound {
    let mut round = PartitionRound::new(ALGO, pdr(), ShardId::root()).unwrap();
    round
        .add_unit(unit_id(1), round_unit(5, b"\x82\x01\x02", 1))
        .unwrap();
    round
        .add_unit(unit_id(2), round_unit(7, b"\x82\x03\x04", 3))
        .unwrap();
    round
        .add_unit(unit_id(3), round_unit(0, b"\x80", 0))
        .unwrap();
    round
}

fn round_params() -> RoundParams {
    RoundParams {
        previous_state_hash: vec![0; 32],
        round_number: 100,
        epoch: 1,
        timestamp: 1_700_000_000,
        block_hash: Some(vec![0xbb; 32]),
        tr_hash: vec![0xcc; 32],
        sum_of_earned_fees: 3,
        root_round: 40,
        previous_seal_hash: vec![0xdd; 32],
        sibling_shards: Vec::new(),
        other_partitions: other_partitions(),
    }
}

fn fixture() -> Fixture {
    let signers: Vec<(String, Ed25519Signer)> = ["root-1", "root-2"]
        .into_iter()
        .map(|id| (id.to_string(), Ed25519Signer::generate()))
        .collect();
    let refs = signer_refs(&signers);
    let round = open_round().certify(&round_params(), &refs).unwrap();
    Fixture {
        signers,
        pdr: pdr(),
        round,
    }
}

fn signer_refs(signers: &[(String, Ed25519Signer)]) -> Vec<(&str, &dyn Signer)> {
    signers
        .iter()
        .map(|(id, s)| (id.as_str(), s as &dyn Signer))
        .collect()
}

impl Fixture {
    fn trust_base(&self) -> RootTrustBase {
        let nodes = self
            .signers
            .iter()
            .map(|(id, s)| RootNode {
                node_id: id.clone(),
                public_key: s.public_key(),
                stake: 1,
            })
            .collect();
        RootTrustBase::new(nodes, 2).unwrap()
    }

    fn pdr_hash(&self) -> Vec<u8> {
        self.pdr.descriptor_hash(ALGO.algorithm()).unwrap().to_vec()
    }

    fn validator(&self) -> TrustBaseValidator {
        TrustBaseValidator::new(
            self.trust_base(),
            Arc::new(Ed25519Verifier),
            ALGO,
            PARTITION,
            self.pdr_hash(),
        )
    }
}

struct SlowValidator;

#[async_trait]
impl UnicityCertificateValidator for SlowValidator {
    async fn validate(&self, _certificate: &UnicityCertificate) -> unicity_core::Result<()> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

struct RejectingValidator;

#[async_trait]
impl UnicityCertificateValidator for RejectingValidator {
    async fn validate(&self, _certificate: &UnicityCertificate) -> unicity_core::Result<()> {
        Err(UnicityError::crypto("root chain unreachable"))
    }
}

#[tokio::test]
async fn test_every_unit_verifies() {
    let fx = fixture();
    let validator = fx.validator();
    for id in [unit_id(1), unit_id(2), unit_id(3)] {
        let proof = fx.round.unit_proof(&id).unwrap();
        let data = fx.round.unit_data(&id).unwrap();
        verify_unit_state_proof(&proof, ALGO.algorithm(), Some(data), &validator)
            .await
            .unwrap();
    }
    let ir = fx.round.certificate().input_record().unwrap();
    assert_eq!(ir.summary_value, 12u64.to_be_bytes().to_vec());
}

#[tokio::test]
async fn test_verification_is_repeatable() {
    let fx = fixture();
    let validator = fx.validator();
    let proof = fx.round.unit_proof(&unit_id(2)).unwrap();
    let data = fx.round.unit_data(&unit_id(2)).unwrap();
    let first = verify_unit_state_proof(&proof, ALGO.algorithm(), Some(data), &validator).await;
    let second = verify_unit_state_proof(&proof, ALGO.algorithm(), Some(data), &validator).await;
    assert_eq!(first, second);
    assert!(first.is_ok());
}

#[tokio::test]
async fn test_missing_parts_are_named() {
    let fx = fixture();
    let validator = fx.validator();
    let algo = ALGO.algorithm();
    let proof = fx.round.unit_proof(&unit_id(1)).unwrap();
    let data = fx.round.unit_data(&unit_id(1)).unwrap();

    let err = verify_unit_state_proof(&proof, algo, None, &validator)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "unit data is nil");

    let mut no_cert = proof.clone();
    no_cert.unicity_certificate = None;
    let err = verify_unit_state_proof(&no_cert, algo, Some(data), &validator)
        .await
        .unwrap_err();
    assert_eq!(err, VerificationError::missing("unicity certificate"));

    let mut no_state = proof.clone();
    no_state.state_tree_cert = None;
    let err = verify_unit_state_proof(&no_state, algo, Some(data), &validator)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "state tree cert is nil");

    let mut no_id = proof;
    no_id.unit_id = UnitId::default();
    let err = verify_unit_state_proof(&no_id, algo, Some(data), &validator)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "unit id is nil");
}

#[tokio::test]
async fn test_empty_parts_count_as_missing() {
    let fx = fixture();
    let validator = fx.validator();
    let algo = ALGO.algorithm();
    let proof = fx.round.unit_proof(&unit_id(1)).unwrap();
    let data = fx.round.unit_data(&unit_id(1)).unwrap();

    let empty_data = StateUnitData::new(Vec::new());
    let err = verify_unit_state_proof(&proof, algo, Some(&empty_data), &validator)
        .await
        .unwrap_err();
    assert_eq!(err, VerificationError::missing("unit data"));

    let mut empty_cert = proof;
    empty_cert.unicity_certificate = Some(serde_bytes::ByteBuf::new());
    let err = verify_unit_state_proof(&empty_cert, algo, Some(data), &validator)
        .await
        .unwrap_err();
    assert_eq!(err, VerificationError::missing("unicity certificate"));
}

#[tokio::test]
async fn test_wrong_unit_data_rejected() {
    let fx = fixture();
    let proof = fx.round.unit_proof(&unit_id(1)).unwrap();
    let other = fx.round.unit_data(&unit_id(2)).unwrap();
    let err = verify_unit_state_proof(&proof, ALGO.algorithm(), Some(other), &fx.validator())
        .await
        .unwrap_err();
    assert!(matches!(err, VerificationError::UnitDataMismatch { .. }));
    assert_eq!(
        err.to_string(),
        "unit data hash does not match hash in unit tree"
    );
}

#[tokio::test]
async fn test_altered_ledger_hash_breaks_state_root() {
    let fx = fixture();
    let mut proof = fx.round.unit_proof(&unit_id(2)).unwrap();
    proof.unit_ledger_hash[0] ^= 0x01;
    let data = fx.round.unit_data(&unit_id(2)).unwrap();
    let err = verify_unit_state_proof(&proof, ALGO.algorithm(), Some(data), &fx.validator())
        .await
        .unwrap_err();
    assert!(
        matches!(err, VerificationError::StateRootMismatch { .. }),
        "{err}"
    );
}

#[tokio::test]
async fn test_altered_value_breaks_summary() {
    let fx = fixture();
    let mut proof = fx.round.unit_proof(&unit_id(1)).unwrap();
    proof.unit_value += 1;
    let data = fx.round.unit_data(&unit_id(1)).unwrap();
    let err = verify_unit_state_proof(&proof, ALGO.algorithm(), Some(data), &fx.validator())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        VerificationError::SummaryValueMismatch {
            expected: 12u64.to_be_bytes().to_vec(),
            actual: 13u64.to_be_bytes().to_vec(),
        }
    );
}

#[tokio::test]
async fn test_altered_sibling_hash_breaks_state_root() {
    let fx = fixture();
    let algo = ALGO.algorithm();
    let data = fx.round.unit_data(&unit_id(1)).unwrap();
    let mut proof = fx.round.unit_proof(&unit_id(1)).unwrap();
    let sibling = proof
        .state_tree_cert
        .as_mut()
        .unwrap()
        .path
        .iter_mut()
        .find_map(|item| item.sibling_summary_hash.as_mut())
        .expect("unit 1 has a sibling subtree");
    sibling[0] ^= 0x80;
    let err = verify_unit_state_proof(&proof, algo, Some(data), &fx.validator())
        .await
        .unwrap_err();
    assert!(
        matches!(err, VerificationError::StateRootMismatch { .. }),
        "{err}"
    );
}

#[tokio::test]
async fn test_forged_seal_signature_rejected() {
    let fx = fixture();
    let mut certificate = fx.round.certificate().clone();
    let seal = certificate.unicity_seal.as_mut().unwrap();
    let signature = seal.signatures.get_mut("root-1").unwrap();
    signature[0] ^= 0x01;

    let mut proof = fx.round.unit_proof(&unit_id(1)).unwrap();
    proof.unicity_certificate = Some(encode_tagged(&certificate).unwrap().into());
    let data = fx.round.unit_data(&unit_id(1)).unwrap();
    let err = verify_unit_state_proof(&proof, ALGO.algorithm(), Some(data), &fx.validator())
        .await
        .unwrap_err();
    assert!(matches!(err, VerificationError::CertificateRejected(_)));
    assert!(err.to_string().contains("root-1"), "{err}");
}

#[tokio::test]
async fn test_undecodable_certificate_rejected() {
    let fx = fixture();
    let mut proof = fx.round.unit_proof(&unit_id(1)).unwrap();
    proof.unicity_certificate = Some(vec![0xff, 0x00].into());
    let data = fx.round.unit_data(&unit_id(1)).unwrap();
    let err = verify_unit_state_proof(&proof, ALGO.algorithm(), Some(data), &fx.validator())
        .await
        .unwrap_err();
    assert!(matches!(err, VerificationError::CertificateDecode(_)));
    assert!(err
        .to_string()
        .starts_with("failed to get unicity certificate"));
}

#[tokio::test]
async fn test_wrong_partition_rejected() {
    let fx = fixture();
    let validator = TrustBaseValidator::new(
        fx.trust_base(),
        Arc::new(Ed25519Verifier),
        ALGO,
        PartitionId::new(6),
        fx.pdr_hash(),
    );
    let proof = fx.round.unit_proof(&unit_id(1)).unwrap();
    let data = fx.round.unit_data(&unit_id(1)).unwrap();
    let err = verify_unit_state_proof(&proof, ALGO.algorithm(), Some(data), &validator)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid unicity certificate: invalid partition identifier: expected 00000006, got 00000005"
    );
}

#[tokio::test]
async fn test_validator_failure_propagates() {
    let fx = fixture();
    let proof = fx.round.unit_proof(&unit_id(1)).unwrap();
    let data = fx.round.unit_data(&unit_id(1)).unwrap();
    let err = verify_unit_state_proof(&proof, ALGO.algorithm(), Some(data), &RejectingValidator)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid unicity certificate: crypto error: root chain unreachable"
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_validator_times_out() {
    let fx = fixture();
    let proof = fx.round.unit_proof(&unit_id(1)).unwrap();
    let data = fx.round.unit_data(&unit_id(1)).unwrap();
    let err = verify_with_timeout(
        &proof,
        ALGO.algorithm(),
        Some(data),
        &SlowValidator,
        Duration::from_millis(250),
    )
    .await
    .unwrap_err();
    assert_eq!(err, VerificationError::ValidatorTimeout(Duration::from_millis(250)));
}

#[tokio::test]
async fn test_timeout_allows_prompt_validator() {
    let fx = fixture();
    let proof = fx.round.unit_proof(&unit_id(3)).unwrap();
    let data = fx.round.unit_data(&unit_id(3)).unwrap();
    verify_with_timeout(
        &proof,
        ALGO.algorithm(),
        Some(data),
        &fx.validator(),
        Duration::from_secs(5),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn test_data_and_proof_pair() {
    let fx = fixture();
    let validator = fx.validator();
    let algo = ALGO.algorithm();
    let mut pair = UnitDataAndProof {
        unit_data: Some(fx.round.unit_data(&unit_id(2)).unwrap().clone()),
        proof: None,
    };
    let err = verify_unit_data_and_proof(&pair, algo, &validator)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "unit state proof is nil");

    pair.proof = Some(fx.round.unit_proof(&unit_id(2)).unwrap());
    verify_unit_data_and_proof(&pair, algo, &validator)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_repeat_round_links_to_previous_seal() {
    let fx = fixture();
    let refs = signer_refs(&fx.signers);
    let repeat = fx
        .round
        .repeat(
            &RepeatParams {
                round_number: 101,
                root_round: 41,
                timestamp: 1_700_000_010,
                other_partitions: other_partitions(),
            },
            &refs,
        )
        .unwrap();
    let previous_seal = fx.round.certificate().unicity_seal().unwrap().clone();
    let anchored = fx.validator().with_previous_seal(previous_seal.clone());

    let proof = repeat.unit_proof(&unit_id(2)).unwrap();
    let data = repeat.unit_data(&unit_id(2)).unwrap();
    verify_unit_state_proof(&proof, ALGO.algorithm(), Some(data), &anchored)
        .await
        .unwrap();

    let original = fx.round.unit_proof(&unit_id(2)).unwrap();
    verify_unit_state_proof(&original, ALGO.algorithm(), Some(data), &anchored)
        .await
        .unwrap();

    let repeat_seal = repeat.certificate().unicity_seal().unwrap().clone();
    let ahead = fx.validator().with_previous_seal(repeat_seal);
    let err = verify_unit_state_proof(&original, ALGO.algorithm(), Some(data), &ahead)
        .await
        .unwrap_err();
    assert!(matches!(err, VerificationError::CertificateRejected(_)));
}

#[tokio::test]
async fn test_repeat_with_changed_record_rejected() {
    let fx = fixture();
    let certificate = fx.round.certificate();
    let mut altered = certificate.clone();
    let ir = altered.input_record.as_mut().unwrap();
    ir.round_number += 1;
    ir.sum_of_earned_fees += 1;
    let seal = altered.unicity_seal.as_mut().unwrap();
    seal.root_chain_round_number += 1;
    let err = altered.check_repeat(certificate).unwrap_err();
    assert_eq!(err.to_string(), "sum of fees is different: 3 vs 4");
}

#[tokio::test]
async fn test_secp256k1_sealed_round_verifies() {
    let signers: Vec<(String, Secp256k1Signer)> = ["root-1", "root-2"]
        .into_iter()
        .map(|id| (id.to_string(), Secp256k1Signer::generate()))
        .collect();
    let refs: Vec<(&str, &dyn Signer)> = signers
        .iter()
        .map(|(id, s)| (id.as_str(), s as &dyn Signer))
        .collect();
    let round = open_round().certify(&round_params(), &refs).unwrap();
    let nodes = signers
        .iter()
        .map(|(id, s)| RootNode {
            node_id: id.clone(),
            public_key: s.public_key(),
            stake: 1,
        })
        .collect();
    let trust_base = RootTrustBase::new(nodes, 2).unwrap();
    let pdr_hash = pdr().descriptor_hash(ALGO.algorithm()).unwrap().to_vec();

    let validator = TrustBaseValidator::new(
        trust_base.clone(),
        Arc::new(Secp256k1Verifier),
        ALGO,
        PARTITION,
        pdr_hash.clone(),
    );
    let seal = round.certificate().unicity_seal().unwrap();
    assert!(seal.signatures.values().all(|sig| sig.len() == 65));
    let proof = round.unit_proof(&unit_id(2)).unwrap();
    let data = round.unit_data(&unit_id(2)).unwrap();
    verify_unit_state_proof(&proof, ALGO.algorithm(), Some(data), &validator)
        .await
        .unwrap();

    let ed_validator =
        TrustBaseValidator::new(trust_base, Arc::new(Ed25519Verifier), ALGO, PARTITION, pdr_hash);
    let err = verify_unit_state_proof(&proof, ALGO.algorithm(), Some(data), &ed_validator)
        .await
        .unwrap_err();
    assert!(matches!(err, VerificationError::CertificateRejected(_)));
}

#[tokio::test]
async fn test_validator_from_config() {
    let fx = fixture();
    let config = VerifierConfig {
        hash_algorithm: ALGO,
        partition_id: PARTITION,
        pdr_hash: hex::encode(fx.pdr_hash()),
        trust_base: TrustBaseConfig {
            quorum_threshold: 2,
            nodes: fx
                .signers
                .iter()
                .map(|(id, s)| RootNodeConfig {
                    node_id: id.clone(),
                    public_key: hex::encode(s.public_key()),
                    stake: 1,
                })
                .collect(),
        },
        ..Default::default()
    };
    let validator = TrustBaseValidator::from_config(&config).unwrap();
    let proof = fx.round.unit_proof(&unit_id(1)).unwrap();
    let data = fx.round.unit_data(&unit_id(1)).unwrap();
    verify_with_timeout(
        &proof,
        config.hash_algorithm.algorithm(),
        Some(data),
        &validator,
        config.validator_timeout(),
    )
    .await
    .unwrap();
}

#[test]
fn test_proof_travels_as_tagged_value() {
    let fx = fixture();
    let proof = fx.round.unit_proof(&unit_id(2)).unwrap();
    let bytes = encode_tagged(&proof).unwrap();
    match TaggedValue::decode(&bytes).unwrap() {
        TaggedValue::UnitStateProof(decoded) => assert_eq!(decoded, proof),
        other => panic!("unexpected value {:?}", other.tag()),
    }
}
