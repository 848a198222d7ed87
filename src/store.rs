//! Storage layer over sled
//!
//! Every logical table is a [`sled::Tree`]. Workflow writes go through
//! [`Store::atomically`], which runs one multi-tree sled transaction and hands
//! the closure a [`Scope`]. Sub-writers only ever receive a `&Scope`, so the
//! outermost operation owns the single atomic boundary and any abort inside a
//! sub-step discards every write made in that scope.
//!
//! sled transactions cannot scan, so equality-predicate lookups (details by
//! transaction, transaction by booking, ...) are kept as explicit index keys
//! in the `refs` tree, see [`Ref`].
use super::error::{BookingError, Result};
use super::types::TransactionCategory;
use sled::transaction::{ConflictableTransactionError, ConflictableTransactionResult};
use sled::{Db, Transactional, Tree, transaction::TransactionalTree};
use std::sync::Arc;

pub type ScopeResult<T> = ConflictableTransactionResult<T, BookingError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Bookings,
    MemberGroups,
    MemberDetails,
    Transactions,
    TransactionDetails,
    Verifications,
    Refs,
    Trail,
}

impl Table {
    fn tree_name(self) -> &'static str {
        match self {
            Self::Bookings => "bookings",
            Self::MemberGroups => "member_groups",
            Self::MemberDetails => "member_details",
            Self::Transactions => "transactions",
            Self::TransactionDetails => "transaction_details",
            Self::Verifications => "verifications",
            Self::Refs => "refs",
            Self::Trail => "trail",
        }
    }
}

/// Index keys kept in the `refs` tree. Each maps to a CBOR list of ids.
#[derive(Debug, Clone, Copy)]
pub enum Ref<'a> {
    Code(&'a str),
    BookerBookings(&'a str),
    BookingGroup(&'a str),
    GroupMembers(&'a str),
    BookingTransaction(&'a str, TransactionCategory),
    TransactionDetails(&'a str),
    BookingVerification(&'a str),
    TrailHead(&'a str),
}

impl Ref<'_> {
    pub fn key(&self) -> String {
        match self {
            Self::Code(code) => format!("code/{code}"),
            Self::BookerBookings(actor) => format!("booker/{actor}/bookings"),
            Self::BookingGroup(booking) => format!("booking/{booking}/group"),
            Self::GroupMembers(group) => format!("group/{group}/members"),
            Self::BookingTransaction(booking, category) => {
                format!("booking/{booking}/trx/{}", category.code())
            }
            Self::TransactionDetails(trx) => format!("trx/{trx}/details"),
            Self::BookingVerification(booking) => format!("booking/{booking}/verification"),
            Self::TrailHead(booking) => format!("trail/{booking}/head"),
        }
    }
}

pub struct Store {
    bookings: Tree,
    member_groups: Tree,
    member_details: Tree,
    transactions: Tree,
    transaction_details: Tree,
    verifications: Tree,
    refs: Tree,
    trail: Tree,
}

/// The writable view of every table inside one atomic scope.
pub struct Scope<'a> {
    bookings: &'a TransactionalTree,
    member_groups: &'a TransactionalTree,
    member_details: &'a TransactionalTree,
    transactions: &'a TransactionalTree,
    transaction_details: &'a TransactionalTree,
    verifications: &'a TransactionalTree,
    refs: &'a TransactionalTree,
    trail: &'a TransactionalTree,
}

pub(crate) fn encode<T: minicbor::Encode<()>>(value: &T) -> Result<Vec<u8>> {
    Ok(minicbor::to_vec(value)?)
}

pub(crate) fn decode<T>(bytes: &[u8]) -> Result<T>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    Ok(minicbor::decode(bytes)?)
}

impl Store {
    pub fn new(db: Arc<Db>) -> Result<Self> {
        Ok(Self {
            bookings: db.open_tree(Table::Bookings.tree_name())?,
            member_groups: db.open_tree(Table::MemberGroups.tree_name())?,
            member_details: db.open_tree(Table::MemberDetails.tree_name())?,
            transactions: db.open_tree(Table::Transactions.tree_name())?,
            transaction_details: db.open_tree(Table::TransactionDetails.tree_name())?,
            verifications: db.open_tree(Table::Verifications.tree_name())?,
            refs: db.open_tree(Table::Refs.tree_name())?,
            trail: db.open_tree(Table::Trail.tree_name())?,
        })
    }

    fn tree(&self, table: Table) -> &Tree {
        match table {
            Table::Bookings => &self.bookings,
            Table::MemberGroups => &self.member_groups,
            Table::MemberDetails => &self.member_details,
            Table::Transactions => &self.transactions,
            Table::TransactionDetails => &self.transaction_details,
            Table::Verifications => &self.verifications,
            Table::Refs => &self.refs,
            Table::Trail => &self.trail,
        }
    }

    /// Run `work` in one atomic scope. sled may re-run the closure when it
    /// conflicts with a concurrent scope, so `work` must not have effects
    /// outside the scope.
    pub fn atomically<T, F>(&self, work: F) -> Result<T>
    where
        F: Fn(&Scope<'_>) -> ScopeResult<T>,
    {
        let trees = (
            &self.bookings,
            &self.member_groups,
            &self.member_details,
            &self.transactions,
            &self.transaction_details,
            &self.verifications,
            &self.refs,
            &self.trail,
        );

        let out = trees.transaction(
            |(
                bookings,
                member_groups,
                member_details,
                transactions,
                transaction_details,
                verifications,
                refs,
                trail,
            )| {
                let scope = Scope {
                    bookings,
                    member_groups,
                    member_details,
                    transactions,
                    transaction_details,
                    verifications,
                    refs,
                    trail,
                };
                work(&scope)
            },
        )?;

        Ok(out)
    }

    /// Point lookup by primary key.
    pub fn get<T>(&self, table: Table, key: &str) -> Result<Option<T>>
    where
        T: for<'b> minicbor::Decode<'b, ()>,
    {
        match self.tree(table).get(key.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Equality lookup through an index key.
    pub fn lookup(&self, index: Ref<'_>) -> Result<Vec<String>> {
        Ok(self.get(Table::Refs, &index.key())?.unwrap_or_default())
    }

    /// All records whose key starts with `prefix`, in key order.
    pub fn scan<T>(&self, table: Table, prefix: &str) -> Result<Vec<T>>
    where
        T: for<'b> minicbor::Decode<'b, ()>,
    {
        self.tree(table)
            .scan_prefix(prefix.as_bytes())
            .map(|entry| {
                let (_, bytes) = entry?;
                decode(&bytes)
            })
            .collect()
    }

    pub fn count(&self, table: Table) -> usize {
        self.tree(table).len()
    }
}

impl Scope<'_> {
    fn tree(&self, table: Table) -> &TransactionalTree {
        match table {
            Table::Bookings => self.bookings,
            Table::MemberGroups => self.member_groups,
            Table::MemberDetails => self.member_details,
            Table::Transactions => self.transactions,
            Table::TransactionDetails => self.transaction_details,
            Table::Verifications => self.verifications,
            Table::Refs => self.refs,
            Table::Trail => self.trail,
        }
    }

    pub fn get<T>(&self, table: Table, key: &str) -> ScopeResult<Option<T>>
    where
        T: for<'b> minicbor::Decode<'b, ()>,
    {
        match self.tree(table).get(key.as_bytes())? {
            Some(bytes) => decode(&bytes)
                .map(Some)
                .map_err(ConflictableTransactionError::Abort),
            None => Ok(None),
        }
    }

    /// Insert or fully replace the row at `key`.
    pub fn put<T: minicbor::Encode<()>>(
        &self,
        table: Table,
        key: &str,
        value: &T,
    ) -> ScopeResult<()> {
        let bytes = encode(value).map_err(ConflictableTransactionError::Abort)?;
        self.tree(table).insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    pub fn contains(&self, table: Table, key: &str) -> ScopeResult<bool> {
        Ok(self.tree(table).get(key.as_bytes())?.is_some())
    }

    pub fn lookup(&self, index: Ref<'_>) -> ScopeResult<Vec<String>> {
        Ok(self.get(Table::Refs, &index.key())?.unwrap_or_default())
    }

    pub fn link(&self, index: Ref<'_>, id: &str) -> ScopeResult<()> {
        let mut ids = self.lookup(index)?;
        ids.push(id.to_string());
        self.put(Table::Refs, &index.key(), &ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use sled::transaction::abort;

    fn temp_store() -> Store {
        let db = sled::Config::new().temporary(true).open().unwrap();
        Store::new(Arc::new(db)).unwrap()
    }

    #[test]
    fn committed_scope_is_visible() {
        let store = temp_store();
        store
            .atomically(|scope| {
                scope.put(Table::Bookings, "book1", &"first".to_string())?;
                scope.link(Ref::BookerBookings("user1"), "book1")?;
                scope.link(Ref::BookerBookings("user1"), "book2")
            })
            .unwrap();

        let row: Option<String> = store.get(Table::Bookings, "book1").unwrap();
        assert_eq!(row.as_deref(), Some("first"));
        assert_eq!(
            store.lookup(Ref::BookerBookings("user1")).unwrap(),
            vec!["book1".to_string(), "book2".to_string()]
        );
    }

    #[test]
    fn aborted_scope_leaves_nothing_behind() {
        let store = temp_store();
        let res: Result<()> = store.atomically(|scope| {
            scope.put(Table::Bookings, "book1", &"first".to_string())?;
            scope.put(Table::Transactions, "trx1", &1u64)?;
            abort(BookingError::Validation("late failure".into()))
        });

        assert_eq!(res.unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(store.count(Table::Bookings), 0);
        assert_eq!(store.count(Table::Transactions), 0);
    }

    #[test]
    fn index_keys_are_distinct_per_category() {
        let booking = Ref::BookingTransaction("book1", TransactionCategory::Booking).key();
        let renewal = Ref::BookingTransaction("book1", TransactionCategory::Renewal).key();
        assert_ne!(booking, renewal);
    }
}
