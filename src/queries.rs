//! Read side: bookings, rosters and ledgers as last committed
use super::entities::{
    MemberDetail, MemberGroup, RoomBook, Transaction, TransactionDetail, Verification,
};
use super::error::{BookingError, Result};
use super::store::{Ref, Store, Table};
use super::types::TransactionCategory;

/// A transaction with its payment instruments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerView {
    pub transaction: Transaction,
    pub details: Vec<TransactionDetail>,
}

/// A member group with its occupants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterView {
    pub group: MemberGroup,
    pub members: Vec<MemberDetail>,
}

/// Rows behind index ids. An indexed id without a row is reported, not skipped.
fn rows<T>(store: &Store, table: Table, entity: &'static str, ids: &[String]) -> Result<Vec<T>>
where
    T: for<'b> minicbor::Decode<'b, ()>,
{
    ids.iter()
        .map(|id| {
            store
                .get(table, id)?
                .ok_or_else(|| BookingError::not_found(entity, id.as_str()))
        })
        .collect()
}

pub fn booking(store: &Store, booking_id: &str) -> Result<RoomBook> {
    store
        .get(Table::Bookings, booking_id)?
        .ok_or_else(|| BookingError::not_found("booking", booking_id))
}

/// Bookings made by `booker_id`, oldest first.
pub fn bookings_of(store: &Store, booker_id: &str) -> Result<Vec<RoomBook>> {
    let ids = store.lookup(Ref::BookerBookings(booker_id))?;
    rows(store, Table::Bookings, "booking", &ids)
}

pub fn find_by_code(store: &Store, code: &str) -> Result<RoomBook> {
    match store.lookup(Ref::Code(code))?.first() {
        Some(id) => booking(store, id),
        None => Err(BookingError::not_found("booking code", code)),
    }
}

pub fn members(store: &Store, booking_id: &str) -> Result<RosterView> {
    let group_id = store
        .lookup(Ref::BookingGroup(booking_id))?
        .into_iter()
        .next()
        .ok_or_else(|| BookingError::not_found("member group", booking_id))?;
    let group: MemberGroup = store
        .get(Table::MemberGroups, &group_id)?
        .ok_or_else(|| BookingError::not_found("member group", group_id.as_str()))?;

    let ids = store.lookup(Ref::GroupMembers(&group.id))?;
    let members = rows(store, Table::MemberDetails, "member detail", &ids)?;

    Ok(RosterView { group, members })
}

pub fn ledger(
    store: &Store,
    booking_id: &str,
    category: TransactionCategory,
) -> Result<LedgerView> {
    let transaction_id = store
        .lookup(Ref::BookingTransaction(booking_id, category))?
        .into_iter()
        .next()
        .ok_or_else(|| BookingError::not_found("transaction", booking_id))?;
    let transaction: Transaction = store
        .get(Table::Transactions, &transaction_id)?
        .ok_or_else(|| BookingError::not_found("transaction", transaction_id.as_str()))?;

    let ids = store.lookup(Ref::TransactionDetails(&transaction.id))?;
    let details = rows(store, Table::TransactionDetails, "transaction detail", &ids)?;

    Ok(LedgerView {
        transaction,
        details,
    })
}

pub fn verification(store: &Store, booking_id: &str) -> Result<Option<Verification>> {
    match store.lookup(Ref::BookingVerification(booking_id))?.first() {
        Some(id) => store.get(Table::Verifications, id),
        None => Ok(None),
    }
}
