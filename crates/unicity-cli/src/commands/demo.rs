//! Certify a demo round and write everything a verifier needs

use anyhow::Context;
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use unicity_core::config::{RootNodeConfig, TrustBaseConfig, VerifierConfig};
use unicity_core::serialization::encode_tagged;
use unicity_core::{
    HashAlgorithmKind, PartitionId, PartitionTypeId, ShardId, SignatureScheme, Signer, UnitId,
};
use unicity_proof::{PartitionRound, RoundParams, RoundUnit, StateUnitData, UnitLog};
use unicity_types::{PartitionDescriptionRecord, ShardingScheme, UnicityTreeData};

const DEMO_PARTITION: PartitionId = PartitionId::new(0x0000_0007);
const ROOT_NODES: [&str; 3] = ["root-1", "root-2", "root-3"];
const QUORUM: u64 = 2;

/// Arguments for demo round generation
#[derive(Args)]
pub struct DemoArgs {
    /// Output directory
    #[arg(short, long, default_value = "unicity-demo")]
    pub output: PathBuf,

    /// Number of units in the round
    #[arg(short, long, default_value = "4")]
    pub units: u8,

    /// Hash algorithm of the partition
    #[arg(long, default_value = "sha256")]
    pub algorithm: HashAlgorithmKind,

    /// Signature scheme of the root nodes
    #[arg(long, default_value = "ed25519")]
    pub scheme: SignatureScheme,
}

/// Files written by a demo run
#[derive(Debug)]
pub struct DemoOutput {
    /// Verifier configuration
    pub config: PathBuf,
    /// Tagged unicity certificate
    pub certificate: PathBuf,
    /// Proof and data file of each unit
    pub units: Vec<(PathBuf, PathBuf)>,
}

pub fn run(args: &DemoArgs) -> anyhow::Result<DemoOutput> {
    if args.units == 0 {
        anyhow::bail!("a demo round needs at least one unit");
    }
    let algo = args.algorithm.algorithm();
    fs::create_dir_all(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let signers: Vec<(&str, Box<dyn Signer>)> = ROOT_NODES
        .iter()
        .map(|id| (*id, args.scheme.generate_signer()))
        .collect();

    let pdr = PartitionDescriptionRecord {
        version: 1,
        network_id: 3,
        partition_id: DEMO_PARTITION,
        partition_type_id: PartitionTypeId::new(1),
        type_id_len: 1,
        unit_id_len: 4,
        shards: ShardingScheme::default(),
        t2_timeout_ms: 2_500,
    };
    let pdr_hash = pdr.descriptor_hash(algo)?;

    let mut round = PartitionRound::new(args.algorithm, pdr, ShardId::root())?;
    for i in 0..args.units {
        let value = u64::from(i + 1) * 100;
        let data = StateUnitData::encode(&(value, format!("owner-{i}")))?;
        let mut log = UnitLog::new(algo.hash(&[i]).to_vec());
        let tx_record = algo.hash(format!("transfer-{i}").as_bytes());
        log.append(Some(tx_record.to_vec()), data.hash(algo)?.to_vec(), algo);
        round.add_unit(
            UnitId::new([1, 0, 0, i]),
            RoundUnit { value, data, log },
        )?;
    }

    let timestamp = u64::try_from(chrono::Utc::now().timestamp())?;
    let params = RoundParams {
        previous_state_hash: algo.hash(b"genesis state").to_vec(),
        round_number: 1,
        epoch: 0,
        timestamp,
        block_hash: Some(algo.hash(b"demo block").to_vec()),
        tr_hash: algo.hash(b"demo technical record").to_vec(),
        sum_of_earned_fees: 1,
        root_round: 1,
        previous_seal_hash: algo.hash(b"genesis seal").to_vec(),
        sibling_shards: Vec::new(),
        other_partitions: vec![UnicityTreeData {
            partition: PartitionId::new(1),
            shard_tree_root: algo.hash(b"money partition").to_vec(),
            pdr_hash: algo.hash(b"money partition description").to_vec(),
        }],
    };
    let signer_refs: Vec<(&str, &dyn Signer)> = signers
        .iter()
        .map(|(id, s)| (*id, s.as_ref()))
        .collect();
    let certified = round.certify(&params, &signer_refs)?;

    let config = VerifierConfig {
        hash_algorithm: args.algorithm,
        signature_scheme: args.scheme,
        partition_id: DEMO_PARTITION,
        pdr_hash: hex::encode(pdr_hash),
        trust_base: TrustBaseConfig {
            quorum_threshold: QUORUM,
            nodes: signers
                .iter()
                .map(|(id, s)| RootNodeConfig {
                    node_id: id.to_string(),
                    public_key: hex::encode(s.public_key()),
                    stake: 1,
                })
                .collect(),
        },
        ..Default::default()
    };
    let config_path = args.output.join("verifier.toml");
    write(&config_path, config.to_toml_string()?.as_bytes())?;

    let certificate_path = args.output.join("certificate.cbor");
    write(&certificate_path, &encode_tagged(certified.certificate())?)?;

    let mut units = Vec::new();
    for unit_id in certified.unit_ids() {
        let proof_path = args.output.join(format!("unit-{unit_id}.proof"));
        let data_path = args.output.join(format!("unit-{unit_id}.data"));
        write(&proof_path, &encode_tagged(&certified.unit_proof(unit_id)?)?)?;
        write(&data_path, &certified.unit_data(unit_id)?.data)?;
        units.push((proof_path, data_path));
    }

    info!(
        units = units.len(),
        partition = %DEMO_PARTITION,
        scheme = %args.scheme,
        output = %args.output.display(),
        "demo round certified"
    );
    Ok(DemoOutput {
        config: config_path,
        certificate: certificate_path,
        units,
    })
}

fn write(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
}
