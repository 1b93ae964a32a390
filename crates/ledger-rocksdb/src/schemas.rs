//! Column-family definitions, one per store table.

use ledger_db::{OnlineWeightSample, PeerInfo, UncheckedEntry};
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;

use crate::{define_table_with_default_codec, define_table_without_codec, impl_borsh_value_codec};

define_table_with_default_codec!(
    /// account -> account_info
    (AccountSchema) AccountId => AccountInfo
);

define_table_with_default_codec!(
    /// block hash -> the stored block itself
    (BlockSchema) BlockHash => Block
);

define_table_with_default_codec!(
    /// block hash -> its derived sideband
    (SidebandSchema) BlockHash => Sideband
);

define_table_with_default_codec!(
    /// (destination, send-hash) -> pending entry
    (PendingSchema) PendingKey => PendingEntry
);

define_table_with_default_codec!(
    /// send-hash -> the block hash that consumed it, so a rolled-back
    /// send can find its receiver on another chain.
    (PendingReceiverSchema) BlockHash => BlockHash
);

define_table_with_default_codec!(
    /// legacy block hash -> owning account
    (FrontierSchema) BlockHash => AccountId
);

define_table_with_default_codec!(
    /// account -> confirmation-height record
    (ConfirmationHeightSchema) AccountId => ConfirmationHeightInfo
);

define_table_with_default_codec!(
    /// peer address -> peer info
    (PeerSchema) String => PeerInfo
);

define_table_with_default_codec!(
    /// monotonic sample index -> online-weight sample
    (OnlineWeightSchema) u64 => OnlineWeightSample
);

define_table_with_default_codec!(
    /// missing-dependency hash -> parked blocks
    (UncheckedSchema) BlockHash => Vec<UncheckedEntry>
);

define_table_with_default_codec!(
    /// fixed meta key -> schema version
    (MetaSchema) String => u32
);

define_table_with_default_codec!(
    /// small named counters, currently just the next free
    /// [`OnlineWeightSchema`] key.
    (CounterSchema) String => u64
);

/// Every column family the store opens, in the order `DB::open` expects.
pub const COLUMN_FAMILIES: &[&str] = &[
    AccountSchema::table_name(),
    BlockSchema::table_name(),
    SidebandSchema::table_name(),
    PendingSchema::table_name(),
    PendingReceiverSchema::table_name(),
    FrontierSchema::table_name(),
    ConfirmationHeightSchema::table_name(),
    PeerSchema::table_name(),
    OnlineWeightSchema::table_name(),
    UncheckedSchema::table_name(),
    MetaSchema::table_name(),
    CounterSchema::table_name(),
];

/// Fixed single key under which the schema version is stored in
/// [`MetaSchema`].
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Monotonic counter key used to mint fresh [`OnlineWeightSchema`] keys.
pub const ONLINE_WEIGHT_NEXT_KEY: &str = "online_weight_next";
