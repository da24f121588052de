//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode for hashing, JSON for snapshots)
//! - Immutability: records are consumed and re-created, never mutated
//! - Exact integer arithmetic for values

use crate::crypto::{hex32, sha256, PublicKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Ledger identity bound to a public key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    /// Legal name
    pub name: String,

    /// Key that signs on this party's behalf
    pub owning_key: PublicKey,
}

impl Party {
    /// Create new party
    pub fn new(name: impl Into<String>, owning_key: PublicKey) -> Self {
        Self {
            name: name.into(),
            owning_key,
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Stable identifier of an obligation across its lineage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinearId(Uuid);

impl LinearId {
    /// Fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for LinearId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for LinearId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for LinearId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fungible cash record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashRecord {
    /// Amount; valid records are strictly positive
    pub value: i64,

    /// Issuer, fixed for the whole lineage
    pub creator: Party,

    /// Current holder; only this party may consume the record
    pub owner: Party,
}

impl CashRecord {
    /// Create new cash record
    pub fn new(value: i64, creator: Party, owner: Party) -> Self {
        Self {
            value,
            creator,
            owner,
        }
    }

    /// Same cash handed to a new owner, with the command that authorises it
    pub fn with_new_owner(&self, new_owner: Party) -> (CashCommand, CashRecord) {
        (
            CashCommand::Move,
            CashRecord {
                owner: new_owner,
                ..self.clone()
            },
        )
    }
}

/// IOU between a lender and a borrower
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationRecord {
    /// Amount owed
    pub value: i64,

    /// Party owed the money
    pub lender: Party,

    /// Party owing the money
    pub borrower: Party,

    /// Lineage identifier
    pub linear_id: LinearId,
}

impl ObligationRecord {
    /// Create new obligation with a fresh linear id
    pub fn new(value: i64, lender: Party, borrower: Party) -> Self {
        Self {
            value,
            lender,
            borrower,
            linear_id: LinearId::new(),
        }
    }

    /// Parties that must sign its creation
    pub fn participants(&self) -> [&Party; 2] {
        [&self.lender, &self.borrower]
    }
}

/// A unit of ledger state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerRecord {
    /// Cash record
    Cash(CashRecord),
    /// Obligation record
    Obligation(ObligationRecord),
}

impl LedgerRecord {
    /// Cash payload, if any
    pub fn as_cash(&self) -> Option<&CashRecord> {
        match self {
            LedgerRecord::Cash(cash) => Some(cash),
            LedgerRecord::Obligation(_) => None,
        }
    }

    /// Obligation payload, if any
    pub fn as_obligation(&self) -> Option<&ObligationRecord> {
        match self {
            LedgerRecord::Obligation(iou) => Some(iou),
            LedgerRecord::Cash(_) => None,
        }
    }
}

impl From<CashRecord> for LedgerRecord {
    fn from(cash: CashRecord) -> Self {
        LedgerRecord::Cash(cash)
    }
}

impl From<ObligationRecord> for LedgerRecord {
    fn from(iou: ObligationRecord) -> Self {
        LedgerRecord::Obligation(iou)
    }
}

/// Cash contract commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashCommand {
    /// Issue new money
    Create,
    /// Transfer existing money
    Move,
}

/// Obligation contract commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationCommand {
    /// Open an IOU
    Create,
    /// Settle an IOU in full
    Destroy,
}

/// Action attached to a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "contract", content = "action", rename_all = "snake_case")]
pub enum CommandData {
    /// Cash family
    Cash(CashCommand),
    /// Obligation family
    Obligation(ObligationCommand),
    /// Command of a contract unknown to this ledger
    Other(String),
}

impl CommandData {
    /// Cash command, if any
    pub fn as_cash(&self) -> Option<CashCommand> {
        match self {
            CommandData::Cash(command) => Some(*command),
            _ => None,
        }
    }

    /// Obligation command, if any
    pub fn as_obligation(&self) -> Option<ObligationCommand> {
        match self {
            CommandData::Obligation(command) => Some(*command),
            _ => None,
        }
    }
}

/// Command plus the keys attributed to it
///
/// Signers are a list: the platform may attribute the same key twice and
/// cardinality clauses count every entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// What the transaction does
    pub data: CommandData,

    /// Keys that signed for it
    pub signers: Vec<PublicKey>,
}

impl Command {
    /// Create new command
    pub fn new(data: CommandData, signers: impl IntoIterator<Item = PublicKey>) -> Self {
        Self {
            data,
            signers: signers.into_iter().collect(),
        }
    }
}

/// Transaction identifier (SHA-256 of the canonical encoding)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(#[serde(with = "hex32")] [u8; 32]);

impl TxId {
    /// Wrap a precomputed hash
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw hash bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({}..)", &hex::encode(self.0)[..12])
    }
}

/// Transaction as seen by the verifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Consumed records, in order
    #[serde(default)]
    pub inputs: Vec<LedgerRecord>,

    /// Produced records, in order
    #[serde(default)]
    pub outputs: Vec<LedgerRecord>,

    /// Attached commands
    #[serde(default)]
    pub commands: Vec<Command>,
}

impl Transaction {
    /// Cash inputs
    pub fn cash_inputs(&self) -> Vec<&CashRecord> {
        self.inputs.iter().filter_map(LedgerRecord::as_cash).collect()
    }

    /// Cash outputs
    pub fn cash_outputs(&self) -> Vec<&CashRecord> {
        self.outputs.iter().filter_map(LedgerRecord::as_cash).collect()
    }

    /// Obligation inputs
    pub fn obligation_inputs(&self) -> Vec<&ObligationRecord> {
        self.inputs
            .iter()
            .filter_map(LedgerRecord::as_obligation)
            .collect()
    }

    /// Obligation outputs
    pub fn obligation_outputs(&self) -> Vec<&ObligationRecord> {
        self.outputs
            .iter()
            .filter_map(LedgerRecord::as_obligation)
            .collect()
    }

    /// Whether any command matches
    pub fn has_command(&self, data: &CommandData) -> bool {
        self.commands.iter().any(|c| &c.data == data)
    }

    /// First command no contract here understands
    pub fn unsupported_command(&self) -> Option<&str> {
        self.commands.iter().find_map(|c| match &c.data {
            CommandData::Other(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Aggregate signer key set
    pub fn signers(&self) -> BTreeSet<PublicKey> {
        self.commands
            .iter()
            .flat_map(|c| c.signers.iter().copied())
            .collect()
    }

    /// Canonical bytes used for the transaction id
    pub fn canonical_bytes(&self) -> crate::Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Content hash
    pub fn id(&self) -> crate::Result<TxId> {
        Ok(TxId(sha256(&self.canonical_bytes()?)))
    }
}

/// Incremental transaction assembly
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    tx: Transaction,
}

impl TransactionBuilder {
    /// Empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a record
    pub fn add_input_state(mut self, record: impl Into<LedgerRecord>) -> Self {
        self.tx.inputs.push(record.into());
        self
    }

    /// Produce a record
    pub fn add_output_state(mut self, record: impl Into<LedgerRecord>) -> Self {
        self.tx.outputs.push(record.into());
        self
    }

    /// Attach a command
    pub fn add_command(
        mut self,
        data: CommandData,
        signers: impl IntoIterator<Item = PublicKey>,
    ) -> Self {
        self.tx.commands.push(Command::new(data, signers));
        self
    }

    /// Finish
    pub fn build(self) -> Transaction {
        self.tx
    }
}
