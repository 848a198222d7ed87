//! Ledger writer: the Transaction / Transaction Detail pair of a booking
//!
//! All operations take the caller's [`Scope`]; none of them opens a scope of
//! its own.
use super::entities::{Transaction, TransactionDetail};
use super::error::BookingError;
use super::identity::Actor;
use super::store::{Ref, Scope, ScopeResult, Table};
use super::types::{Audit, DetailStatus, TransactionCategory};
use super::utils::{self, hrp};
use sled::transaction::{ConflictableTransactionError, abort};

fn new_id(prefix: &str) -> ScopeResult<String> {
    utils::new_uuid_to_bech32(prefix).map_err(ConflictableTransactionError::Abort)
}

/// Open a transaction against `booking_id` with nothing paid off yet.
pub fn create_transaction(
    scope: &Scope<'_>,
    actor: &Actor,
    booking_id: &str,
    category: TransactionCategory,
    must_pay: u64,
) -> ScopeResult<String> {
    let transaction = Transaction {
        id: new_id(hrp::TRANSACTION)?,
        reference_id: booking_id.to_string(),
        category,
        paid_off: 0,
        must_pay,
        audit: Audit::new(&actor.username),
    };

    scope.put(Table::Transactions, &transaction.id, &transaction)?;
    scope.link(Ref::BookingTransaction(booking_id, category), &transaction.id)?;

    Ok(transaction.id)
}

/// Record one payment instrument against `transaction_id`.
///
/// The offered amount must be positive and may not exceed what is still
/// outstanding on the transaction.
pub fn create_transaction_detail(
    scope: &Scope<'_>,
    actor: &Actor,
    transaction_id: &str,
    payment_method_id: &str,
    offered_amount: u64,
    initial_status: DetailStatus,
) -> ScopeResult<String> {
    let Some(transaction) = scope.get::<Transaction>(Table::Transactions, transaction_id)? else {
        return abort(BookingError::not_found("transaction", transaction_id));
    };

    if offered_amount == 0 {
        return abort(BookingError::Validation("payment must be positive".into()));
    }
    let outstanding = transaction.outstanding();
    if offered_amount > outstanding {
        return abort(BookingError::Overpayment {
            offered: offered_amount,
            outstanding,
        });
    }

    let detail = TransactionDetail {
        id: new_id(hrp::TRANSACTION_DETAIL)?,
        transaction_id: transaction_id.to_string(),
        payment_method_id: payment_method_id.to_string(),
        offered_amount,
        status: initial_status,
        audit: Audit::new(&actor.username),
    };

    scope.put(Table::TransactionDetails, &detail.id, &detail)?;
    scope.link(Ref::TransactionDetails(transaction_id), &detail.id)?;

    Ok(detail.id)
}

pub fn update_transaction(
    scope: &Scope<'_>,
    actor: &Actor,
    transaction: &mut Transaction,
) -> ScopeResult<()> {
    transaction.audit.touch(&actor.username);
    scope.put(Table::Transactions, &transaction.id, &*transaction)
}

pub fn update_transaction_detail(
    scope: &Scope<'_>,
    actor: &Actor,
    detail: &mut TransactionDetail,
) -> ScopeResult<()> {
    detail.audit.touch(&actor.username);
    scope.put(Table::TransactionDetails, &detail.id, &*detail)
}

/// The transaction of `category` referencing `booking_id`, if any.
pub fn find_transaction(
    scope: &Scope<'_>,
    booking_id: &str,
    category: TransactionCategory,
) -> ScopeResult<Option<Transaction>> {
    match scope
        .lookup(Ref::BookingTransaction(booking_id, category))?
        .first()
    {
        Some(id) => scope.get(Table::Transactions, id),
        None => Ok(None),
    }
}

pub fn find_details(
    scope: &Scope<'_>,
    transaction_id: &str,
) -> ScopeResult<Vec<TransactionDetail>> {
    let mut details = Vec::new();
    for id in scope.lookup(Ref::TransactionDetails(transaction_id))? {
        if let Some(detail) = scope.get(Table::TransactionDetails, &id)? {
            details.push(detail);
        }
    }
    Ok(details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::Store;
    use crate::types::Role;
    use std::sync::Arc;

    fn temp_store() -> Store {
        let db = sled::Config::new().temporary(true).open().unwrap();
        Store::new(Arc::new(db)).unwrap()
    }

    fn booker() -> Actor {
        Actor {
            id: "user1".into(),
            username: "alice".into(),
            role: Role::Booker,
        }
    }

    #[test]
    fn new_transaction_starts_unpaid_with_pending_detail() {
        let store = temp_store();
        let actor = booker();

        let (trx_id, detail_id) = store
            .atomically(|scope| {
                let trx_id =
                    create_transaction(scope, &actor, "book1", TransactionCategory::Booking, 500)?;
                let detail_id = create_transaction_detail(
                    scope,
                    &actor,
                    &trx_id,
                    "pay1",
                    200,
                    DetailStatus::Pending,
                )?;
                Ok((trx_id, detail_id))
            })
            .unwrap();

        let trx: Transaction = store.get(Table::Transactions, &trx_id).unwrap().unwrap();
        assert_eq!(trx.paid_off, 0);
        assert_eq!(trx.must_pay, 500);
        assert_eq!(trx.reference_id, "book1");

        let detail: TransactionDetail = store
            .get(Table::TransactionDetails, &detail_id)
            .unwrap()
            .unwrap();
        assert_eq!(detail.transaction_id, trx_id);
        assert_eq!(detail.status, DetailStatus::Pending);
        assert_eq!(detail.offered_amount, 200);
    }

    #[test]
    fn overpayment_aborts_the_scope() {
        let store = temp_store();
        let actor = booker();

        let err = store
            .atomically(|scope| {
                let trx_id =
                    create_transaction(scope, &actor, "book1", TransactionCategory::Booking, 100)?;
                create_transaction_detail(
                    scope,
                    &actor,
                    &trx_id,
                    "pay1",
                    101,
                    DetailStatus::Pending,
                )
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(store.count(Table::Transactions), 0);
        assert_eq!(store.count(Table::TransactionDetails), 0);
    }

    #[test]
    fn detail_requires_existing_transaction() {
        let store = temp_store();
        let actor = booker();

        let err = store
            .atomically(|scope| {
                create_transaction_detail(
                    scope,
                    &actor,
                    "trx_missing",
                    "pay1",
                    1,
                    DetailStatus::Pending,
                )
            })
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn lookups_follow_reference_indexes() {
        let store = temp_store();
        let actor = booker();

        store
            .atomically(|scope| {
                let trx_id =
                    create_transaction(scope, &actor, "book1", TransactionCategory::Booking, 300)?;
                create_transaction_detail(
                    scope,
                    &actor,
                    &trx_id,
                    "pay1",
                    100,
                    DetailStatus::Pending,
                )?;
                create_transaction_detail(
                    scope,
                    &actor,
                    &trx_id,
                    "pay2",
                    200,
                    DetailStatus::Pending,
                )?;
                Ok(())
            })
            .unwrap();

        let (trx, details) = store
            .atomically(|scope| {
                let trx = find_transaction(scope, "book1", TransactionCategory::Booking)?
                    .expect("transaction indexed by booking");
                let details = find_details(scope, &trx.id)?;
                Ok((trx, details))
            })
            .unwrap();

        assert_eq!(trx.must_pay, 300);
        assert_eq!(details.len(), 2);
        assert!(
            store
                .atomically(|scope| find_transaction(scope, "book1", TransactionCategory::Renewal))
                .unwrap()
                .is_none()
        );
    }
}
