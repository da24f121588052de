//! Vault: read access to ledger states
//!
//! The [`Vault`] trait is the query contract flows rely on: filter by
//! record kind, owner, creator or linear id and read one page at a time.
//! [`PagedStates`] walks the pages lazily so a caller that has seen enough
//! stops issuing queries. [`InMemoryVault`] is an ordered, thread-safe
//! store that also records finalized transactions.

use crate::{flows::ProposedTransaction, Error, Result};
use ledger_core::{CashRecord, LedgerRecord, LinearId, ObligationRecord, Party, TxId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// Default page size for single-shot queries
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Pointer to an output of a recorded transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateRef {
    /// Producing transaction
    pub tx_id: TxId,

    /// Output position
    pub index: usize,
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.tx_id, self.index)
    }
}

/// A state together with where it was produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateAndRef<T> {
    /// The record
    pub state: T,

    /// Its position on the ledger
    pub reference: StateRef,
}

impl StateAndRef<LedgerRecord> {
    /// Narrow to a cash state
    pub fn into_cash(self) -> Option<StateAndRef<CashRecord>> {
        match self.state {
            LedgerRecord::Cash(state) => Some(StateAndRef {
                state,
                reference: self.reference,
            }),
            LedgerRecord::Obligation(_) => None,
        }
    }

    /// Narrow to an obligation state
    pub fn into_obligation(self) -> Option<StateAndRef<ObligationRecord>> {
        match self.state {
            LedgerRecord::Obligation(state) => Some(StateAndRef {
                state,
                reference: self.reference,
            }),
            LedgerRecord::Cash(_) => None,
        }
    }
}

/// Record family filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Cash records
    Cash,
    /// Obligation records
    Obligation,
}

impl RecordKind {
    fn matches(self, record: &LedgerRecord) -> bool {
        matches!(
            (self, record),
            (RecordKind::Cash, LedgerRecord::Cash(_))
                | (RecordKind::Obligation, LedgerRecord::Obligation(_))
        )
    }
}

/// Consumption status filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateStatus {
    /// Still spendable
    #[default]
    Unconsumed,
    /// Already used as an input
    Consumed,
    /// Both
    All,
}

impl StateStatus {
    fn matches(self, consumed: bool) -> bool {
        match self {
            StateStatus::Unconsumed => !consumed,
            StateStatus::Consumed => consumed,
            StateStatus::All => true,
        }
    }
}

/// Vault query filter; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryCriteria {
    /// Record family
    pub kind: Option<RecordKind>,

    /// Cash owner, or either participant of an obligation
    pub owner: Option<Party>,

    /// Cash creator; obligations never match
    pub creator: Option<Party>,

    /// Obligation lineage
    pub linear_id: Option<LinearId>,

    /// Consumption status
    pub status: StateStatus,
}

impl QueryCriteria {
    /// Unconsumed cash
    pub fn cash() -> Self {
        Self {
            kind: Some(RecordKind::Cash),
            ..Self::default()
        }
    }

    /// Unconsumed obligations
    pub fn obligations() -> Self {
        Self {
            kind: Some(RecordKind::Obligation),
            ..Self::default()
        }
    }

    /// Restrict to an owner
    pub fn owned_by(mut self, owner: &Party) -> Self {
        self.owner = Some(owner.clone());
        self
    }

    /// Restrict to a creator
    pub fn created_by(mut self, creator: &Party) -> Self {
        self.creator = Some(creator.clone());
        self
    }

    /// Restrict to a linear id
    pub fn with_linear_id(mut self, linear_id: LinearId) -> Self {
        self.linear_id = Some(linear_id);
        self
    }

    /// Restrict to a status
    pub fn with_status(mut self, status: StateStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether a stored state passes this filter
    pub fn matches(&self, record: &LedgerRecord, consumed: bool) -> bool {
        if !self.status.matches(consumed) {
            return false;
        }
        if let Some(kind) = self.kind {
            if !kind.matches(record) {
                return false;
            }
        }

        match record {
            LedgerRecord::Cash(cash) => {
                self.owner.as_ref().map_or(true, |p| &cash.owner == p)
                    && self.creator.as_ref().map_or(true, |p| &cash.creator == p)
                    && self.linear_id.is_none()
            }
            LedgerRecord::Obligation(iou) => {
                self.owner
                    .as_ref()
                    .map_or(true, |p| iou.participants().contains(&p))
                    && self.creator.is_none()
                    && self.linear_id.map_or(true, |id| iou.linear_id == id)
            }
        }
    }
}

/// Which page to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpecification {
    /// Zero-based page index
    pub page_number: usize,

    /// States per page
    pub page_size: usize,
}

impl PageSpecification {
    /// Page `page_number` of `page_size` states
    pub fn new(page_number: usize, page_size: usize) -> Self {
        Self {
            page_number,
            page_size,
        }
    }
}

impl Default for PageSpecification {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE)
    }
}

/// One page of query results, in ledger order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// States on this page
    pub states: Vec<StateAndRef<LedgerRecord>>,

    /// Matching states across all pages
    pub total_states_available: usize,
}

/// Read contract of the vault
pub trait Vault: Send + Sync {
    /// One page of states matching `criteria`
    fn find(&self, criteria: &QueryCriteria, paging: PageSpecification) -> Result<Page>;
}

/// Lazy iterator over every page of a query
///
/// A page is only requested once the previous one has been drained.
#[derive(Debug)]
pub struct PagedStates<'v, V: Vault + ?Sized> {
    vault: &'v V,
    criteria: QueryCriteria,
    page_size: usize,
    next_page: usize,
    buffer: VecDeque<StateAndRef<LedgerRecord>>,
    exhausted: bool,
    pages_fetched: usize,
}

impl<'v, V: Vault + ?Sized> PagedStates<'v, V> {
    /// Iterate `criteria` over `vault` in pages of `page_size`
    pub fn new(vault: &'v V, criteria: QueryCriteria, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(Error::Config("page size must be positive".to_string()));
        }
        Ok(Self {
            vault,
            criteria,
            page_size,
            next_page: 0,
            buffer: VecDeque::new(),
            exhausted: false,
            pages_fetched: 0,
        })
    }

    /// Restart from the first page
    pub fn rewind(&mut self) {
        self.next_page = 0;
        self.buffer.clear();
        self.exhausted = false;
    }

    /// Queries issued so far, including those before a rewind
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    fn fetch(&mut self) -> Result<()> {
        let paging = PageSpecification::new(self.next_page, self.page_size);
        let page = self.vault.find(&self.criteria, paging)?;
        self.pages_fetched += 1;
        self.next_page += 1;

        let seen = self.next_page * self.page_size;
        if page.states.len() < self.page_size || seen >= page.total_states_available {
            self.exhausted = true;
        }
        self.buffer.extend(page.states);
        Ok(())
    }
}

impl<V: Vault + ?Sized> Iterator for PagedStates<'_, V> {
    type Item = Result<StateAndRef<LedgerRecord>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

#[derive(Debug)]
struct StoredState {
    state: StateAndRef<LedgerRecord>,
    consumed: bool,
}

#[derive(Debug, Default)]
struct VaultTable {
    states: Vec<StoredState>,
    index: HashMap<StateRef, usize>,
    recorded: HashSet<TxId>,
}

/// Ordered in-memory vault
#[derive(Debug, Default)]
pub struct InMemoryVault {
    table: RwLock<VaultTable>,
}

impl InMemoryVault {
    /// Empty vault
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a finalized transaction: consume its inputs, store its outputs
    ///
    /// Nothing changes unless every input is known and unconsumed.
    pub fn record(&self, proposed: &ProposedTransaction) -> Result<TxId> {
        let tx_id = proposed.id()?;
        let mut guard = self.table.write();
        let table = &mut *guard;

        if table.recorded.contains(&tx_id) {
            return Err(Error::DuplicateTransaction(tx_id));
        }

        let inputs = &proposed.transaction.inputs;
        if proposed.input_refs.len() != inputs.len() {
            return Err(Error::InputCountMismatch {
                refs: proposed.input_refs.len(),
                inputs: inputs.len(),
            });
        }

        let mut seen = HashSet::new();
        for (input, record) in proposed.input_refs.iter().zip(inputs) {
            let position = *table.index.get(input).ok_or(Error::UnknownState(*input))?;
            let stored = &table.states[position];
            if stored.consumed || !seen.insert(*input) {
                tracing::warn!(state = %input, "double spend attempt");
                return Err(Error::DoubleSpend(*input));
            }
            if &stored.state.state != record {
                return Err(Error::InputMismatch(*input));
            }
        }

        for input in &proposed.input_refs {
            if let Some(&position) = table.index.get(input) {
                table.states[position].consumed = true;
            }
        }

        for (index, record) in proposed.transaction.outputs.iter().enumerate() {
            let reference = StateRef { tx_id, index };
            let position = table.states.len();
            table.states.push(StoredState {
                state: StateAndRef {
                    state: record.clone(),
                    reference,
                },
                consumed: false,
            });
            table.index.insert(reference, position);
        }
        table.recorded.insert(tx_id);

        tracing::debug!(
            tx_id = %tx_id,
            consumed = proposed.input_refs.len(),
            produced = proposed.transaction.outputs.len(),
            "transaction recorded"
        );
        Ok(tx_id)
    }

    /// Look up a state and whether it has been consumed
    pub fn get(&self, reference: &StateRef) -> Option<(StateAndRef<LedgerRecord>, bool)> {
        let table = self.table.read();
        table
            .index
            .get(reference)
            .map(|&position| {
                let stored = &table.states[position];
                (stored.state.clone(), stored.consumed)
            })
    }

    /// Number of stored states, consumed or not
    pub fn len(&self) -> usize {
        self.table.read().states.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Vault for InMemoryVault {
    fn find(&self, criteria: &QueryCriteria, paging: PageSpecification) -> Result<Page> {
        if paging.page_size == 0 {
            return Err(Error::Config("page size must be positive".to_string()));
        }

        let table = self.table.read();
        let matching: Vec<&StoredState> = table
            .states
            .iter()
            .filter(|s| criteria.matches(&s.state.state, s.consumed))
            .collect();

        let states = matching
            .iter()
            .skip(paging.page_number.saturating_mul(paging.page_size))
            .take(paging.page_size)
            .map(|s| s.state.clone())
            .collect();

        Ok(Page {
            states,
            total_states_available: matching.len(),
        })
    }
}
