//! Property-based tests for the approval state machine and the booking ledger
//!
//! The status transitions gate every write the workflow makes, so they are
//! checked against arbitrary decision sequences rather than hand-picked ones.
//! The ledger properties drive the real service over a temporary database and
//! check that money only moves into paid-off on a tenant confirmation.

use chrono::{Datelike, TimeZone, Utc};
use proptest::prelude::*;
use room_booking::{
    BookingError, BookingService,
    booking::BookingRequest,
    code,
    config::BookingConfig,
    directory::Directory,
    identity::{RequestContext, SessionResolver},
    store::{Store, Table},
    types::{BookingStatus, DetailStatus, Gender, Party, Role, TimeStamp},
};
use std::sync::Arc;

// These property tests cover:
//
// 1. Only the awaited party may decide, from exactly one status
// 2. Terminal statuses accept no further decision
// 3. A confirmation is only reachable through an owner approval
// 4. Code layout for arbitrary dates and places
// 5. Paid-off equals the offered payment after confirmation, zero otherwise
// 6. Overpayment is refused without leaving rows behind
//
// Authorization is covered by the scenario tests.

/// Strategy to generate any booking status
fn status_strategy() -> impl Strategy<Value = BookingStatus> {
    prop_oneof![
        Just(BookingStatus::New),
        Just(BookingStatus::OwnerApproved),
        Just(BookingStatus::TenantConfirmed),
        Just(BookingStatus::Rejected),
    ]
}

fn party_strategy() -> impl Strategy<Value = Party> {
    prop_oneof![Just(Party::Owner), Just(Party::Tenant)]
}

/// Strategy to generate a sequence of decisions (1 to 8 of them)
fn decisions_strategy() -> impl Strategy<Value = Vec<(Party, bool)>> {
    prop::collection::vec((party_strategy(), any::<bool>()), 1..=8)
}

/// Strategy to generate an uppercase place initial
fn initial_strategy() -> impl Strategy<Value = String> {
    "[A-Z]"
}

struct Fixture {
    service: BookingService,
    store: Arc<Store>,
    room: String,
    method: String,
    owner: RequestContext,
    booker: RequestContext,
}

fn fixture() -> Fixture {
    let db = Arc::new(
        sled::Config::new()
            .temporary(true)
            .open()
            .expect("temporary sled database"),
    );
    let store = Arc::new(Store::new(db.clone()).unwrap());
    let resolver = Arc::new(SessionResolver::new(db.clone()).unwrap());
    let directory = Arc::new(Directory::new(db).unwrap());

    let owner = resolver.register_user("owner", Role::Owner).unwrap();
    resolver.register_user("tenant", Role::Booker).unwrap();
    let property = directory
        .register_property(&owner.id, "Kost Anggrek", "Indonesia", "Surabaya", 1)
        .unwrap();
    let method = directory
        .register_payment_method("virtual", "Bank transfer")
        .unwrap();

    Fixture {
        service: BookingService::new(
            store.clone(),
            resolver.clone(),
            directory,
            BookingConfig::default(),
        ),
        store,
        room: property.rooms[0].clone(),
        method: method.id,
        owner: RequestContext::with_session(resolver.open_session("owner").unwrap()),
        booker: RequestContext::with_session(resolver.open_session("tenant").unwrap()),
    }
}

impl Fixture {
    fn request(&self, payment: u64, must_pay: u64) -> BookingRequest {
        BookingRequest::new(&self.room)
            .set_period("monthly")
            .set_payment_method(&self.method)
            .set_book_date(TimeStamp::new_with(2025, 1, 10, 0, 0, 0))
            .set_payment(payment)
            .set_must_pay(must_pay)
            .add_member("Dewi", "081233334444", Gender::Female)
    }
}

proptest! {
    /// A decision is legal exactly when the status is the one the party awaits
    #[test]
    fn decide_only_from_awaited_status(
        status in status_strategy(),
        party in party_strategy(),
        approve in any::<bool>(),
    ) {
        let next = status.decide(party, approve);
        prop_assert_eq!(next.is_some(), status == BookingStatus::awaiting(party));
    }

    /// Terminal statuses stay put whatever is thrown at them
    #[test]
    fn terminal_statuses_are_final(decisions in decisions_strategy()) {
        for status in [BookingStatus::TenantConfirmed, BookingStatus::Rejected] {
            for (party, approve) in &decisions {
                prop_assert!(status.decide(*party, *approve).is_none());
            }
        }
    }

    /// Applying only the legal decisions of a sequence never skips the owner
    #[test]
    fn confirmation_requires_owner_approval(decisions in decisions_strategy()) {
        let mut status = BookingStatus::New;
        let mut owner_approved = false;

        for (party, approve) in decisions {
            if let Some(next) = status.decide(party, approve) {
                if next == BookingStatus::OwnerApproved {
                    owner_approved = true;
                }
                if next == BookingStatus::TenantConfirmed {
                    prop_assert!(owner_approved);
                }
                status = next;
            }
        }
    }

    /// Codes keep their layout for any date and place
    #[test]
    fn code_layout_holds(
        country in initial_strategy(),
        city in initial_strategy(),
        year in 2000i32..2100,
        month in 1u32..=12,
    ) {
        let at = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap();
        let code = code::generate_at("K", &country, &city, at).unwrap();
        let parts: Vec<&str> = code.split('/').collect();

        prop_assert_eq!(parts.len(), 4);
        prop_assert_eq!(parts[0], "K");
        prop_assert_eq!(parts[1], format!("{country}-{city}"));
        let month_initial = at.format("%B").to_string()[..1].to_string();
        prop_assert_eq!(parts[2], format!("{}-{}", at.year(), month_initial));
        prop_assert_eq!(parts[3].len(), code::DIGITS);
        prop_assert!(parts[3].chars().all(|c| c.is_ascii_digit()));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Paid-off only ever moves by the offered amount, and only on confirmation
    #[test]
    fn paid_off_follows_the_tenant(
        (must_pay, payment) in (1u64..10_000_000).prop_flat_map(|m| (Just(m), 1..=m)),
        owner_approves in any::<bool>(),
        tenant_approves in any::<bool>(),
    ) {
        let f = fixture();
        let booking = f.service.submit_booking(&f.booker, &f.request(payment, must_pay)).unwrap();
        prop_assert_eq!(f.service.ledger(&booking.id).unwrap().transaction.paid_off, 0);

        f.service.owner_decision(&f.owner, &booking.id, owner_approves).unwrap();
        let tenant = f.service.tenant_decision(&f.booker, &booking.id, tenant_approves);

        let ledger = f.service.ledger(&booking.id).unwrap();
        prop_assert_eq!(ledger.transaction.must_pay, must_pay);
        match (owner_approves, tenant_approves) {
            (true, true) => {
                prop_assert_eq!(tenant.unwrap().status, BookingStatus::TenantConfirmed);
                prop_assert_eq!(ledger.transaction.paid_off, payment);
                prop_assert_eq!(ledger.details[0].status, DetailStatus::Approved);
            }
            (true, false) => {
                prop_assert_eq!(tenant.unwrap().status, BookingStatus::Rejected);
                prop_assert_eq!(ledger.transaction.paid_off, 0);
                prop_assert_eq!(ledger.details[0].status, DetailStatus::Rejected);
            }
            (false, _) => {
                let is_invalid_state = matches!(tenant, Err(BookingError::InvalidState { .. }));
                prop_assert!(is_invalid_state);
                prop_assert_eq!(ledger.transaction.paid_off, 0);
                prop_assert_eq!(ledger.details[0].status, DetailStatus::Pending);
            }
        }
    }

    /// Offering more than is owed is refused and nothing is persisted
    #[test]
    fn overpayment_leaves_no_rows(
        (must_pay, payment) in (1u64..10_000_000).prop_flat_map(|m| (Just(m), (m + 1)..=(m * 2))),
    ) {
        let f = fixture();
        let result = f.service.submit_booking(&f.booker, &f.request(payment, must_pay));

        let is_overpayment = matches!(result, Err(BookingError::Overpayment { .. }));
        prop_assert!(is_overpayment);
        for table in [Table::Bookings, Table::MemberDetails, Table::Transactions, Table::Refs] {
            prop_assert_eq!(f.store.count(table), 0);
        }
    }
}
