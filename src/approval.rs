//! Approval state machine
//!
//! A booking is decided first by the owner of the property, then by the
//! booker (the tenant). Each decision re-reads the booking inside its own
//! atomic scope, so of two concurrent decisions on the same booking the one
//! that commits second observes the first one's status and fails its
//! precondition. The tenant's approval also recognises the held payment in
//! the ledger, atomically with the status flip.
use super::directory::PropertyLookup;
use super::entities::RoomBook;
use super::error::{BookingError, Result};
use super::history::{self, TrailEvent};
use super::identity::Actor;
use super::ledger;
use super::store::{Scope, ScopeResult, Store, Table};
use super::types::{BookingStatus, DetailStatus, Party, Role, TransactionCategory};
use sled::transaction::abort;
use std::sync::Arc;

pub struct ApprovalMachine {
    store: Arc<Store>,
    properties: Arc<dyn PropertyLookup>,
}

fn load_booking(scope: &Scope<'_>, booking_id: &str) -> ScopeResult<RoomBook> {
    match scope.get(Table::Bookings, booking_id)? {
        Some(booking) => Ok(booking),
        None => abort(BookingError::not_found("booking", booking_id)),
    }
}

/// The status `party` moves `booking` to, or `InvalidState` if `party` may not
/// decide in the booking's current status.
pub fn next_status(booking: &RoomBook, party: Party, approve: bool) -> Result<BookingStatus> {
    booking
        .status
        .decide(party, approve)
        .ok_or_else(|| BookingError::InvalidState {
            booking_id: booking.id.clone(),
            current: booking.status,
            expected: BookingStatus::awaiting(party),
        })
}

impl ApprovalMachine {
    pub fn new(store: Arc<Store>, properties: Arc<dyn PropertyLookup>) -> Self {
        Self { store, properties }
    }

    /// The owner accepts or rejects a `New` booking. No ledger effect.
    pub fn owner_decision(
        &self,
        actor: &Actor,
        booking_id: &str,
        approve: bool,
    ) -> Result<RoomBook> {
        // the room of a booking never changes, so its owner can be resolved
        // before the scope opens
        let snapshot: RoomBook = self
            .store
            .get(Table::Bookings, booking_id)?
            .ok_or_else(|| BookingError::not_found("booking", booking_id))?;
        let property = self.properties.find_property(&snapshot.room_id)?;

        self.store.atomically(|scope| {
            let mut booking = load_booking(scope, booking_id)?;
            let next = match next_status(&booking, Party::Owner, approve) {
                Ok(next) => next,
                Err(e) => return abort(e),
            };

            if actor.role != Role::Owner || actor.id != property.owner_id {
                return abort(BookingError::Forbidden {
                    actor: actor.id.clone(),
                    action: "decide for the property owner",
                });
            }

            booking.status = next;
            booking.audit.touch(&actor.username);
            scope.put(Table::Bookings, &booking.id, &booking)?;

            history::append(
                scope,
                &booking.id,
                &actor.username,
                TrailEvent::OwnerDecision { approve },
                booking.status,
            )?;

            Ok(booking)
        })
    }

    /// The booker confirms or rejects an `OwnerApproved` booking.
    ///
    /// On confirmation every pending payment of the booking's transaction is
    /// approved and added to its paid-off total; on rejection the pending
    /// payments are rejected and paid-off is left alone. The amount owed is
    /// never changed here.
    pub fn tenant_decision(
        &self,
        actor: &Actor,
        booking_id: &str,
        approve: bool,
    ) -> Result<RoomBook> {
        self.store.atomically(|scope| {
            let mut booking = load_booking(scope, booking_id)?;
            let next = match next_status(&booking, Party::Tenant, approve) {
                Ok(next) => next,
                Err(e) => return abort(e),
            };

            if actor.id != booking.booker_id {
                return abort(BookingError::Forbidden {
                    actor: actor.id.clone(),
                    action: "decide for the booker",
                });
            }

            let Some(mut transaction) =
                ledger::find_transaction(scope, booking_id, TransactionCategory::Booking)?
            else {
                return abort(BookingError::LedgerIntegrity {
                    booking_id: booking_id.to_string(),
                    record: "transaction",
                });
            };

            let mut details: Vec<_> = ledger::find_details(scope, &transaction.id)?
                .into_iter()
                .filter(|d| d.status == DetailStatus::Pending)
                .collect();
            if details.is_empty() {
                return abort(BookingError::LedgerIntegrity {
                    booking_id: booking_id.to_string(),
                    record: "pending transaction detail",
                });
            }

            let mut recognised: u64 = 0;
            for detail in details.iter_mut() {
                if approve {
                    let Some(paid_off) = transaction.paid_off.checked_add(detail.offered_amount)
                    else {
                        return abort(BookingError::Validation("paid-off total overflows".into()));
                    };
                    transaction.paid_off = paid_off;
                    recognised += detail.offered_amount;
                    detail.status = DetailStatus::Approved;
                } else {
                    detail.status = DetailStatus::Rejected;
                }
                ledger::update_transaction_detail(scope, actor, detail)?;
            }

            booking.status = next;
            booking.audit.touch(&actor.username);
            if approve {
                booking.prev_payment_due = booking.next_payment_due.take();
            }
            scope.put(Table::Bookings, &booking.id, &booking)?;

            ledger::update_transaction(scope, actor, &mut transaction)?;

            history::append(
                scope,
                &booking.id,
                &actor.username,
                TrailEvent::TenantDecision {
                    approve,
                    recognised,
                },
                booking.status,
            )?;

            Ok(booking)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Audit, TimeStamp};

    fn booking(status: BookingStatus) -> RoomBook {
        RoomBook {
            id: "book1".into(),
            property_id: "prop1".into(),
            room_id: "room1".into(),
            room_detail_id: None,
            booker_id: "user1".into(),
            payment_method_id: "pay1".into(),
            period_id: "monthly".into(),
            status,
            code: "K/I-J/2024-J/12345678".into(),
            book_date: TimeStamp::new(),
            must_pay: 10,
            prev_payment_due: None,
            next_payment_due: None,
            audit: Audit::new("alice"),
        }
    }

    #[test]
    fn legal_path() {
        let b = booking(BookingStatus::New);
        assert_eq!(
            next_status(&b, Party::Owner, true).unwrap(),
            BookingStatus::OwnerApproved
        );
        let b = booking(BookingStatus::OwnerApproved);
        assert_eq!(
            next_status(&b, Party::Tenant, true).unwrap(),
            BookingStatus::TenantConfirmed
        );
    }

    #[test]
    fn rejection_from_either_open_state() {
        assert_eq!(
            next_status(&booking(BookingStatus::New), Party::Owner, false).unwrap(),
            BookingStatus::Rejected
        );
        assert_eq!(
            next_status(&booking(BookingStatus::OwnerApproved), Party::Tenant, false).unwrap(),
            BookingStatus::Rejected
        );
    }

    #[test]
    fn out_of_order_decisions_name_the_expected_status() {
        let err = next_status(&booking(BookingStatus::New), Party::Tenant, true).unwrap_err();
        match err {
            BookingError::InvalidState {
                current, expected, ..
            } => {
                assert_eq!(current, BookingStatus::New);
                assert_eq!(expected, BookingStatus::OwnerApproved);
            }
            other => panic!("unexpected error {other:?}"),
        }

        assert!(next_status(&booking(BookingStatus::OwnerApproved), Party::Owner, true).is_err());
    }
}
