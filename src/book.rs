//! CRUD over the finance [`Database`].
//!
//! Each operation loads the whole document, applies one change and writes it
//! back. Updates replace the full record; deletes are immediate.

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::{
    Database, Entity, EntryFilter, LedgerEntry, LedgerError, Party, PartyView, RecordError,
    Statement, compute_statement,
};
use crate::storage::{Store, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    /// No record with this id exists in the collection.
    NotFound { collection: &'static str, id: Uuid },
    /// A record with this id already exists in the collection.
    DuplicateId { collection: &'static str, id: Uuid },
    Invalid(RecordError),
    Ledger(LedgerError),
    Store(StoreError),
}

impl std::fmt::Display for BookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookError::NotFound { collection, id } => write!(f, "{collection}/{id} not found"),
            BookError::DuplicateId { collection, id } => {
                write!(f, "{collection}/{id} already exists")
            }
            BookError::Invalid(e) => write!(f, "invalid record: {e}"),
            BookError::Ledger(e) => write!(f, "{e}"),
            BookError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BookError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BookError::Invalid(e) => Some(e),
            BookError::Ledger(e) => Some(e),
            BookError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RecordError> for BookError {
    fn from(e: RecordError) -> Self {
        BookError::Invalid(e)
    }
}

impl From<LedgerError> for BookError {
    fn from(e: LedgerError) -> Self {
        BookError::Ledger(e)
    }
}

impl From<StoreError> for BookError {
    fn from(e: StoreError) -> Self {
        BookError::Store(e)
    }
}

/// Records that belong to a party.
pub trait PartyOwned {
    fn party_id(&self) -> Option<Uuid>;
}

pub struct Book {
    store: Box<dyn Store<Database>>,
}

impl Book {
    pub fn new(store: impl Store<Database> + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Current contents of the data file.
    pub fn snapshot(&self) -> Result<Database, BookError> {
        Ok(self.store.load()?)
    }

    pub fn list<E: Entity>(&self) -> Result<Vec<E>, BookError> {
        Ok(E::items(&self.store.load()?).clone())
    }

    pub fn get<E: Entity>(&self, id: Uuid) -> Result<E, BookError> {
        let db = self.store.load()?;
        find::<E>(&db, id).cloned()
    }

    /// Stores a new record. A nil id is replaced with a fresh one; an explicit
    /// id lets a deleted record be re-created under its old identity.
    pub fn create<E: Entity + PartyOwned>(&mut self, mut record: E) -> Result<E, BookError> {
        let mut db = self.store.load()?;
        if record.id().is_nil() {
            record.set_id(Uuid::new_v4());
        } else if E::items(&db).iter().any(|r| r.id() == record.id()) {
            return Err(BookError::DuplicateId {
                collection: E::COLLECTION,
                id: record.id(),
            });
        }
        record.before_save(None);
        record.validate()?;
        check_party(&db, &record)?;
        E::items_mut(&mut db).push(record.clone());
        self.store.save(&db)?;
        info!(collection = E::COLLECTION, id = %record.id(), "record created");
        Ok(record)
    }

    /// Replaces the record `id` with `record` in full.
    pub fn update<E: Entity + PartyOwned>(&mut self, id: Uuid, mut record: E) -> Result<E, BookError> {
        let mut db = self.store.load()?;
        let previous = find::<E>(&db, id)?.clone();
        record.set_id(id);
        record.before_save(Some(&previous));
        record.validate()?;
        check_party(&db, &record)?;
        if let Some(slot) = E::items_mut(&mut db).iter_mut().find(|r| r.id() == id) {
            *slot = record.clone();
        }
        self.store.save(&db)?;
        info!(collection = E::COLLECTION, %id, "record updated");
        Ok(record)
    }

    /// Removes the record `id` and returns it.
    pub fn delete<E: Entity>(&mut self, id: Uuid) -> Result<E, BookError> {
        let mut db = self.store.load()?;
        let removed = take::<E>(&mut db, id)?;
        self.store.save(&db)?;
        info!(collection = E::COLLECTION, %id, "record deleted");
        Ok(removed)
    }

    /// Removes a party together with its ledger entries.
    pub fn delete_party(&mut self, id: Uuid) -> Result<Party, BookError> {
        let mut db = self.store.load()?;
        let removed = take::<Party>(&mut db, id)?;
        let before = db.ledger_entries.len();
        db.ledger_entries.retain(|e| e.party_id != id);
        self.store.save(&db)?;
        info!(
            collection = Party::COLLECTION,
            %id,
            entries_removed = before - db.ledger_entries.len(),
            "party deleted"
        );
        Ok(removed)
    }

    pub fn party_views(&self) -> Result<Vec<PartyView>, BookError> {
        let db = self.store.load()?;
        db.parties
            .iter()
            .map(|p| party_view(&db, p.clone()))
            .collect()
    }

    pub fn party_view(&self, id: Uuid) -> Result<PartyView, BookError> {
        let db = self.store.load()?;
        let party = find::<Party>(&db, id)?.clone();
        party_view(&db, party)
    }

    /// Ledger entries of a party in stored order.
    pub fn ledger_entries(&self, party_id: Uuid) -> Result<Vec<LedgerEntry>, BookError> {
        let db = self.store.load()?;
        find::<Party>(&db, party_id)?;
        Ok(db.entries_for(party_id))
    }

    /// Statement for a party with running balances, optionally restricted to
    /// one side of the ledger after the balances are computed.
    pub fn statement(
        &self,
        party_id: Uuid,
        filter: EntryFilter,
    ) -> Result<Statement<LedgerEntry>, BookError> {
        let db = self.store.load()?;
        let party = find::<Party>(&db, party_id)?;
        let statement = compute_statement(party.opening_balance, &db.entries_for(party_id))?;
        debug!(
            party = %party_id,
            entries = statement.lines.len(),
            ?filter,
            "statement computed"
        );
        Ok(statement.filtered(filter))
    }

    /// Today's date in the local calendar, used for savings deadlines.
    pub fn today() -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

fn find<E: Entity>(db: &Database, id: Uuid) -> Result<&E, BookError> {
    E::items(db)
        .iter()
        .find(|r| r.id() == id)
        .ok_or(BookError::NotFound {
            collection: E::COLLECTION,
            id,
        })
}

fn take<E: Entity>(db: &mut Database, id: Uuid) -> Result<E, BookError> {
    let items = E::items_mut(db);
    let pos = items
        .iter()
        .position(|r| r.id() == id)
        .ok_or(BookError::NotFound {
            collection: E::COLLECTION,
            id,
        })?;
    Ok(items.remove(pos))
}

fn check_party<E: PartyOwned>(db: &Database, record: &E) -> Result<(), BookError> {
    match record.party_id() {
        Some(party_id) => find::<Party>(db, party_id).map(|_| ()),
        None => Ok(()),
    }
}

fn party_view(db: &Database, party: Party) -> Result<PartyView, BookError> {
    let statement = compute_statement(party.opening_balance, &db.entries_for(party.id))?;
    Ok(PartyView::new(party, statement.totals))
}

macro_rules! independent {
    ($($ty:ty),*) => {
        $(impl PartyOwned for $ty {
            fn party_id(&self) -> Option<Uuid> {
                None
            }
        })*
    };
}

independent!(
    crate::core::Expense,
    crate::core::Income,
    crate::core::Credit,
    crate::core::Party,
    crate::core::Note,
    crate::core::Task,
    crate::core::Budget,
    crate::core::SavingsGoal
);

impl PartyOwned for LedgerEntry {
    fn party_id(&self) -> Option<Uuid> {
        Some(self.party_id)
    }
}
