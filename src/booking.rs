//! Booking writer
//!
//! Creating a booking writes the booking row, its member roster, its ledger
//! pair, an optional verification attachment and the first trail entry in
//! one atomic scope. A failure in any step leaves no row behind.
use super::code;
use super::config::BookingConfig;
use super::directory::{PaymentMethodLookup, PropertyLookup};
use super::entities::{RoomBook, Verification};
use super::error::{BookingError, ErrorKind, Result};
use super::history::{self, TrailEvent};
use super::identity::Actor;
use super::ledger;
use super::membership::{self, MemberRequest};
use super::store::{Ref, Scope, ScopeResult, Store, Table};
use super::types::{Audit, BookingStatus, DetailStatus, Gender, TimeStamp, TransactionCategory};
use super::utils::{self, hrp};
use chrono::Utc;
use sled::transaction::{ConflictableTransactionError, abort};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub description: String,
    pub url: String,
}

/// A booking as submitted by the booker. Built with chained setters, like a
/// draft, and checked by [`BookingRequest::validate`].
#[derive(Debug, Clone, Default)]
pub struct BookingRequest {
    pub room_id: String,
    pub room_detail_id: Option<String>,
    pub period_id: String,
    pub payment_method_id: String,
    pub book_date: Option<TimeStamp<Utc>>,
    pub payment: u64,  // offered now, held until the tenant confirms
    pub must_pay: u64, // total owed for the period
    pub tenant_id: Option<String>,
    pub members: Vec<MemberRequest>,
    pub verification: Option<VerificationRequest>,
}

impl BookingRequest {
    pub fn new(room_id: &str) -> Self {
        Self {
            room_id: room_id.to_string(),
            ..Self::default()
        }
    }
    pub fn set_room_detail(mut self, room_detail_id: &str) -> Self {
        self.room_detail_id = Some(room_detail_id.to_string());
        self
    }
    pub fn set_period(mut self, period_id: &str) -> Self {
        self.period_id = period_id.to_string();
        self
    }
    pub fn set_payment_method(mut self, payment_method_id: &str) -> Self {
        self.payment_method_id = payment_method_id.to_string();
        self
    }
    pub fn set_book_date(mut self, date: TimeStamp<Utc>) -> Self {
        self.book_date = Some(date);
        self
    }
    pub fn set_payment(mut self, amount: u64) -> Self {
        self.payment = amount;
        self
    }
    pub fn set_must_pay(mut self, amount: u64) -> Self {
        self.must_pay = amount;
        self
    }
    pub fn set_tenant(mut self, tenant_id: &str) -> Self {
        self.tenant_id = Some(tenant_id.to_string());
        self
    }
    pub fn add_member(mut self, name: &str, phone: &str, gender: Gender) -> Self {
        self.members.push(MemberRequest::new(name, phone, gender));
        self
    }
    pub fn set_verification(mut self, description: &str, url: &str) -> Self {
        self.verification = Some(VerificationRequest {
            description: description.to_string(),
            url: url.to_string(),
        });
        self
    }

    /// Checks the fields that can be judged without touching the store.
    pub fn validate(&self, require_members: bool) -> Result<()> {
        if self.room_id.trim().is_empty() {
            return Err(BookingError::Validation("room is not set".into()));
        }
        if self.period_id.trim().is_empty() {
            return Err(BookingError::Validation("rental period is not set".into()));
        }
        if self.payment_method_id.trim().is_empty() {
            return Err(BookingError::Validation("payment method is not set".into()));
        }
        if self.book_date.is_none() {
            return Err(BookingError::Validation("book date is not set".into()));
        }
        if self.must_pay == 0 {
            return Err(BookingError::Validation("must pay is set to zero".into()));
        }
        if self.payment == 0 {
            return Err(BookingError::Validation("payment is set to zero".into()));
        }
        if require_members && self.members.is_empty() {
            return Err(BookingError::Validation("at least one member is required".into()));
        }
        if let Some(v) = &self.verification {
            if v.url.trim().is_empty() {
                return Err(BookingError::Validation("verification url is empty".into()));
            }
        }
        Ok(())
    }
}

pub struct BookingWriter {
    store: Arc<Store>,
    properties: Arc<dyn PropertyLookup>,
    payment_methods: Arc<dyn PaymentMethodLookup>,
    settings: BookingConfig,
}

impl BookingWriter {
    pub fn new(
        store: Arc<Store>,
        properties: Arc<dyn PropertyLookup>,
        payment_methods: Arc<dyn PaymentMethodLookup>,
        settings: BookingConfig,
    ) -> Self {
        Self {
            store,
            properties,
            payment_methods,
            settings,
        }
    }

    /// Create a booking for `actor` and return it in its `New` state.
    pub fn create_booking(&self, actor: &Actor, request: &BookingRequest) -> Result<RoomBook> {
        request.validate(self.settings.require_members)?;

        let property = self.properties.find_property(&request.room_id)?;
        self.payment_methods
            .find_payment_method(&request.payment_method_id)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    BookingError::UnknownPaymentMethod(request.payment_method_id.clone())
                }
                _ => e,
            })?;

        let (Some(country), Some(city)) = (
            utils::initial(&property.country),
            utils::initial(&property.city),
        ) else {
            return Err(BookingError::Validation(format!(
                "property {} has no country or city",
                property.id
            )));
        };

        let booking_id = utils::new_uuid_to_bech32(hrp::BOOKING)?;
        let book_date = request.book_date.clone().unwrap_or_default();

        self.store.atomically(|scope| {
            let code = self.unique_code(scope, &country, &city)?;
            let booking = RoomBook {
                id: booking_id.clone(),
                property_id: property.id.clone(),
                room_id: request.room_id.clone(),
                room_detail_id: request.room_detail_id.clone(),
                booker_id: actor.id.clone(),
                payment_method_id: request.payment_method_id.clone(),
                period_id: request.period_id.clone(),
                status: BookingStatus::New,
                code: code.clone(),
                book_date: book_date.clone(),
                must_pay: request.must_pay,
                prev_payment_due: None,
                next_payment_due: Some(book_date.clone()),
                audit: Audit::new(&actor.username),
            };

            scope.put(Table::Bookings, &booking.id, &booking)?;
            scope.link(Ref::Code(&code), &booking.id)?;
            scope.link(Ref::BookerBookings(&actor.id), &booking.id)?;

            membership::add_members(
                scope,
                actor,
                &booking.id,
                request.tenant_id.as_deref(),
                &request.members,
            )?;

            let transaction_id = ledger::create_transaction(
                scope,
                actor,
                &booking.id,
                TransactionCategory::Booking,
                request.must_pay,
            )?;
            ledger::create_transaction_detail(
                scope,
                actor,
                &transaction_id,
                &request.payment_method_id,
                request.payment,
                DetailStatus::Pending,
            )?;

            if let Some(verification) = &request.verification {
                add_verification(scope, actor, &booking.id, verification)?;
            }

            history::append(
                scope,
                &booking.id,
                &actor.username,
                TrailEvent::Created { code },
                booking.status,
            )?;

            Ok(booking)
        })
    }

    /// Draw codes until one is not yet indexed.
    fn unique_code(&self, scope: &Scope<'_>, country: &str, city: &str) -> ScopeResult<String> {
        for _ in 0..self.settings.code_attempts {
            let code = code::generate(&self.settings.code_type, country, city)
                .map_err(ConflictableTransactionError::Abort)?;
            if !scope.contains(Table::Refs, &Ref::Code(&code).key())? {
                return Ok(code);
            }
            tracing::warn!(%code, "booking code collision, drawing again");
        }
        abort(BookingError::CodeExhausted(self.settings.code_attempts))
    }
}

fn add_verification(
    scope: &Scope<'_>,
    actor: &Actor,
    booking_id: &str,
    request: &VerificationRequest,
) -> ScopeResult<String> {
    let verification = Verification {
        id: utils::new_uuid_to_bech32(hrp::VERIFICATION)
            .map_err(ConflictableTransactionError::Abort)?,
        reference_id: booking_id.to_string(),
        description: request.description.clone(),
        url: request.url.clone(),
        audit: Audit::new(&actor.username),
    };
    scope.put(Table::Verifications, &verification.id, &verification)?;
    scope.link(Ref::BookingVerification(booking_id), &verification.id)?;
    Ok(verification.id)
}
