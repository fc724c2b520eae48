//! Wire-format tests for certificate types

use sha2::{Digest as _, Sha256};

use unicity_core::serialization::{decode_tagged, encode_tagged, to_vec, TaggedEnvelope};
use unicity_core::{HashAlgorithmKind, Hashable, PartitionId, TypeTag, UnicityError};
use unicity_types::{ImtPathItem, InputRecord, UnicityTreeCertificate};

fn utc() -> UnicityTreeCertificate {
    let partition = PartitionId::new(0x0101_0101);
    UnicityTreeCertificate {
        version: 1,
        partition,
        hash_steps: vec![ImtPathItem::new(partition.to_bytes(), vec![1, 2, 3])],
        pdr_hash: vec![1, 2, 3, 4],
    }
}

#[test]
fn unicity_tree_certificate_hash_matches_raw_concatenation() {
    let expected = Sha256::digest([
        1u8, 1, 1, 1, // partition
        1, 1, 1, 1, 1, 2, 3, // step key + hash
        1, 2, 3, 4, // descriptor hash
    ]);
    let algo = HashAlgorithmKind::Sha256.algorithm();
    assert_eq!(utc().hash(algo).unwrap().as_slice(), expected.as_slice());
}

#[test]
fn tagged_certificate_roundtrip() {
    let bytes = encode_tagged(&utc()).unwrap();
    let envelope = TaggedEnvelope::decode(&bytes).unwrap();
    assert_eq!(envelope.type_tag().unwrap(), TypeTag::UnicityTreeCertificate);
    assert_eq!(decode_tagged::<UnicityTreeCertificate>(&bytes).unwrap(), utc());
}

#[test]
fn zero_version_input_record_rejected() {
    let ir = InputRecord {
        version: 0,
        ..InputRecord::default()
    };
    let bytes = encode_tagged(&ir).unwrap();
    assert!(matches!(
        decode_tagged::<InputRecord>(&bytes),
        Err(UnicityError::ZeroVersion { .. })
    ));
}

#[test]
fn certificate_under_wrong_tag_rejected() {
    let envelope = TaggedEnvelope {
        tag: TypeTag::InputRecord.value(),
        body: to_vec(&utc()).unwrap(),
    };
    let err = decode_tagged::<UnicityTreeCertificate>(&to_vec(&envelope).unwrap()).unwrap_err();
    assert_eq!(err.to_string(), "unexpected tag: 1008, expected: 1009");
}

#[test]
fn json_rendering_is_readable() {
    let json = serde_json::to_value(utc()).unwrap();
    assert_eq!(json["partition"], 0x0101_0101);
    assert_eq!(json["pdr_hash"], serde_json::json!([1, 2, 3, 4]));
}
