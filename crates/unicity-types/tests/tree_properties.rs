//! Property tests for the commitment trees
//!
//! - State tree: any unit's path folds to the committed root and to the sum of
//!   all unit values
//! - Unicity tree: any partition's certificate folds to the committed root,
//!   and absent partitions are reported by their own id

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use unicity_core::{HashAlgorithmKind, PartitionId, UnitId};
use unicity_types::{StateTree, StateUnit, UnicityTree, UnicityTreeData};

fn state_units() -> impl Strategy<Value = Vec<StateUnit>> {
    prop::collection::btree_map(
        prop::collection::vec(any::<u8>(), 1..6),
        (any::<[u8; 32]>(), 0u64..1_000_000),
        1..40,
    )
    .prop_map(|units: BTreeMap<Vec<u8>, ([u8; 32], u64)>| {
        units
            .into_iter()
            .map(|(id, (log_root, value))| StateUnit {
                unit_id: UnitId::new(id),
                log_root: log_root.to_vec(),
                value,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn state_tree_conserves_value(units in state_units()) {
        let algo = HashAlgorithmKind::Sha256.algorithm();
        let total: u64 = units.iter().map(|u| u.value).sum();
        let tree = StateTree::new(algo, units.clone()).unwrap();
        prop_assert_eq!(tree.root_summary_value(), total);

        for unit in &units {
            let cert = tree.certificate(&unit.unit_id).unwrap();
            let (hash, value) = cert
                .compute_output(&unit.unit_id, &unit.log_root, unit.value, algo)
                .unwrap();
            prop_assert_eq!(value, total);
            prop_assert_eq!(Some(hash), tree.root_hash());
        }
    }

    #[test]
    fn unicity_tree_certificates_reproduce_root(
        partitions in prop::collection::btree_set(any::<u32>(), 1..40),
        absent in any::<u32>(),
    ) {
        let algo = HashAlgorithmKind::Blake3.algorithm();
        let leaves: Vec<UnicityTreeData> = partitions
            .iter()
            .map(|p| UnicityTreeData {
                partition: PartitionId::new(*p),
                shard_tree_root: p.to_le_bytes().repeat(8),
                pdr_hash: vec![1; 32],
            })
            .collect();
        let tree = UnicityTree::new(algo, leaves.clone()).unwrap();
        for leaf in &leaves {
            let cert = tree.certificate(leaf.partition).unwrap();
            prop_assert_eq!(
                Some(cert.eval_auth_path(&leaf.shard_tree_root, algo).unwrap()),
                tree.root_hash()
            );
        }
        if !partitions.contains(&absent) {
            let err = tree.certificate(PartitionId::new(absent)).unwrap_err();
            prop_assert_eq!(
                err.to_string(),
                format!("certificate for partition {absent:08x} not found")
            );
        }
    }
}

#[test]
fn three_partitions_have_two_step_paths() {
    let algo = HashAlgorithmKind::Sha256.algorithm();
    let leaves: Vec<UnicityTreeData> = (1..=3u32)
        .map(|p| UnicityTreeData {
            partition: PartitionId::new(p),
            shard_tree_root: vec![p as u8; 32],
            pdr_hash: vec![0; 32],
        })
        .collect();
    let tree = UnicityTree::new(algo, leaves).unwrap();
    let cert = tree.certificate(PartitionId::new(1)).unwrap();
    assert_eq!(cert.hash_steps.len(), 2);
    assert_eq!(
        Some(cert.eval_auth_path(&[1; 32], algo).unwrap()),
        tree.root_hash()
    );
    assert_eq!(
        tree.certificate(PartitionId::new(4)).unwrap_err().to_string(),
        "certificate for partition 00000004 not found"
    );
}

#[test]
fn two_unit_state_tree_totals_twelve() {
    let algo = HashAlgorithmKind::Sha256.algorithm();
    let units = vec![
        StateUnit {
            unit_id: UnitId::new(vec![0xaa]),
            log_root: vec![1; 32],
            value: 5,
        },
        StateUnit {
            unit_id: UnitId::new(vec![0xbb]),
            log_root: vec![2; 32],
            value: 7,
        },
    ];
    let tree = StateTree::new(algo, units.clone()).unwrap();
    let mut seen = BTreeSet::new();
    for unit in &units {
        let cert = tree.certificate(&unit.unit_id).unwrap();
        let (hash, total) = cert
            .compute_output(&unit.unit_id, &unit.log_root, unit.value, algo)
            .unwrap();
        assert_eq!(total, 12);
        seen.insert(hash);
    }
    assert_eq!(seen.len(), 1);
    assert_eq!(seen.into_iter().next(), tree.root_hash());
}
