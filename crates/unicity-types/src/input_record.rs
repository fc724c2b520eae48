//! Per-round state commitment of a partition

use serde::{Deserialize, Serialize};
use std::fmt;

use unicity_core::serialization::{Tagged, TypeTag};
use unicity_core::{CanonicalHasher, Hashable, Result, UnicityError};

/// The only supported input record version
pub const INPUT_RECORD_VERSION: u32 = 1;

/// State commitment a partition submits for one round
///
/// `summary_value` is the partition's numeric aggregate in fixed-width
/// big-endian form, so it can be compared byte-for-byte with a recomputed
/// state-tree total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRecord {
    /// Record format version
    pub version: u32,
    /// State hash at the end of the previous round
    #[serde(with = "serde_bytes")]
    pub previous_hash: Vec<u8>,
    /// State hash at the end of this round
    #[serde(with = "serde_bytes")]
    pub hash: Vec<u8>,
    /// Hash of the block produced this round; empty when the state did not change
    #[serde(with = "serde_bytes")]
    pub block_hash: Option<Vec<u8>>,
    /// Partition summary value
    #[serde(with = "serde_bytes")]
    pub summary_value: Vec<u8>,
    /// Epoch transition hash
    #[serde(with = "serde_bytes")]
    pub et_hash: Option<Vec<u8>>,
    /// Partition round number
    pub round_number: u64,
    /// Epoch number
    pub epoch: u64,
    /// Round timestamp, seconds
    pub timestamp: u64,
    /// Fees collected this round
    pub sum_of_earned_fees: u64,
}

impl InputRecord {
    /// Check the record's internal invariants
    ///
    /// The state hash changes if and only if a block hash is present.
    pub fn is_valid(&self) -> Result<()> {
        if self.version != INPUT_RECORD_VERSION {
            return Err(UnicityError::invalid_record(format!(
                "invalid version (type InputRecord): {}",
                self.version
            )));
        }
        if self.round_number == 0 {
            return Err(UnicityError::invalid_record("round number is unassigned"));
        }
        if self.summary_value.is_empty() {
            return Err(UnicityError::invalid_record("summary value is nil"));
        }
        let state_changed = self.previous_hash != self.hash;
        match (state_changed, self.has_block_hash()) {
            (true, false) => {
                return Err(UnicityError::invalid_record(
                    "block hash is nil but state hash changed",
                ))
            }
            (false, true) => {
                return Err(UnicityError::invalid_record(
                    "state hash didn't change but block hash is not nil",
                ))
            }
            _ => {}
        }
        if self.timestamp == 0 {
            return Err(UnicityError::invalid_record("timestamp is unassigned"));
        }
        Ok(())
    }

    /// True when a non-empty block hash is present
    pub fn has_block_hash(&self) -> bool {
        self.block_hash.as_ref().is_some_and(|h| !h.is_empty())
    }

    /// Record for a round without new transactions
    ///
    /// Every field is copied from `self` except the round number, which must
    /// move strictly forward.
    pub fn new_repeat(&self, round_number: u64) -> Result<InputRecord> {
        if round_number <= self.round_number {
            return Err(UnicityError::invalid_record(format!(
                "repeat round number {round_number} does not follow {}",
                self.round_number
            )));
        }
        Ok(InputRecord {
            round_number,
            ..self.clone()
        })
    }

    /// Summary value as a number, when it is a big-endian `u64`
    pub fn summary_value_u64(&self) -> Option<u64> {
        let bytes: [u8; 8] = self.summary_value.as_slice().try_into().ok()?;
        Some(u64::from_be_bytes(bytes))
    }
}

fn opt_hex(value: &Option<Vec<u8>>) -> String {
    value.as_deref().map(hex::encode).unwrap_or_default()
}

fn compare(a: &InputRecord, b: &InputRecord, include_round: bool) -> Result<()> {
    let differ = |what: &str, x: String, y: String| {
        Err(UnicityError::invalid(format!("{what} is different: {x} vs {y}")))
    };
    if a.version != b.version {
        return differ("version", a.version.to_string(), b.version.to_string());
    }
    if a.previous_hash != b.previous_hash {
        return differ(
            "previous state hash",
            hex::encode(&a.previous_hash),
            hex::encode(&b.previous_hash),
        );
    }
    if a.hash != b.hash {
        return differ("state hash", hex::encode(&a.hash), hex::encode(&b.hash));
    }
    if a.block_hash != b.block_hash {
        return differ("block hash", opt_hex(&a.block_hash), opt_hex(&b.block_hash));
    }
    if a.summary_value != b.summary_value {
        return differ(
            "summary value",
            hex::encode(&a.summary_value),
            hex::encode(&b.summary_value),
        );
    }
    if a.et_hash != b.et_hash {
        return differ("ET hash", opt_hex(&a.et_hash), opt_hex(&b.et_hash));
    }
    if include_round && a.round_number != b.round_number {
        return differ(
            "round number",
            a.round_number.to_string(),
            b.round_number.to_string(),
        );
    }
    if a.epoch != b.epoch {
        return differ("epoch", a.epoch.to_string(), b.epoch.to_string());
    }
    if a.timestamp != b.timestamp {
        return differ("timestamp", a.timestamp.to_string(), b.timestamp.to_string());
    }
    if a.sum_of_earned_fees != b.sum_of_earned_fees {
        return differ(
            "sum of fees",
            a.sum_of_earned_fees.to_string(),
            b.sum_of_earned_fees.to_string(),
        );
    }
    Ok(())
}

/// Fail with the first field that differs between `a` and `b`
pub fn assert_equal(a: &InputRecord, b: &InputRecord) -> Result<()> {
    compare(a, b, true)
}

/// Like [`assert_equal`] but ignoring the round number
pub fn assert_equal_except_round(a: &InputRecord, b: &InputRecord) -> Result<()> {
    compare(a, b, false)
}

/// Field-by-field equality
pub fn is_equal(a: &InputRecord, b: &InputRecord) -> bool {
    assert_equal(a, b).is_ok()
}

impl fmt::Display for InputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "H: {} H': {} Bh: {} round: {} epoch: {} fees: {} ETh: {} summary: {}",
            hex::encode(&self.hash),
            hex::encode(&self.previous_hash),
            opt_hex(&self.block_hash),
            self.round_number,
            self.epoch,
            self.sum_of_earned_fees,
            opt_hex(&self.et_hash),
            hex::encode(&self.summary_value),
        )
    }
}

impl Hashable for InputRecord {
    fn add_to_hasher(&self, hasher: &mut CanonicalHasher) {
        hasher.write(self);
    }
}

impl Tagged for InputRecord {
    const TAG: TypeTag = TypeTag::InputRecord;
    const SUPPORTED_VERSION: u32 = INPUT_RECORD_VERSION;
    const TYPE_NAME: &'static str = "InputRecord";

    fn version(&self) -> u32 {
        self.version
    }
}
