//! Service layer API for booking workflow operations
//!
//! Every operation resolves the acting user from the request context first,
//! then hands off to the booking writer or the approval state machine.
use super::approval::ApprovalMachine;
use super::booking::{BookingRequest, BookingWriter};
use super::config::BookingConfig;
use super::directory::{PaymentMethodLookup, PropertyLookup};
use super::entities::{RoomBook, Verification};
use super::error::Result;
use super::history::{self, TrailEntry};
use super::identity::{Actor, IdentityResolver, RequestContext};
use super::queries::{self, LedgerView, RosterView};
use super::store::Store;
use super::types::TransactionCategory;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct BookingService {
    store: Arc<Store>,
    identity: Arc<dyn IdentityResolver>,
    writer: BookingWriter,
    approvals: ApprovalMachine,
}

impl BookingService {
    pub fn new<D>(
        store: Arc<Store>,
        identity: Arc<dyn IdentityResolver>,
        directory: Arc<D>,
        settings: BookingConfig,
    ) -> Self
    where
        D: PropertyLookup + PaymentMethodLookup + 'static,
    {
        let writer = BookingWriter::new(
            store.clone(),
            directory.clone(),
            directory.clone(),
            settings,
        );
        let approvals = ApprovalMachine::new(store.clone(), directory);

        Self {
            store,
            identity,
            writer,
            approvals,
        }
    }

    fn actor(&self, ctx: &RequestContext) -> Result<Actor> {
        self.identity.resolve_current_actor(ctx).inspect_err(|e| {
            warn!(error = %e, "request without a resolvable actor");
        })
    }

    /// Submit a new booking on behalf of the current actor
    #[instrument(skip_all, fields(room = %request.room_id))]
    pub fn submit_booking(
        &self,
        ctx: &RequestContext,
        request: &BookingRequest,
    ) -> Result<RoomBook> {
        let actor = self.actor(ctx)?;

        match self.writer.create_booking(&actor, request) {
            Ok(booking) => {
                info!(
                    booking = %booking.id,
                    code = %booking.code,
                    booker = %actor.id,
                    "booking created"
                );
                Ok(booking)
            }
            Err(e) => {
                warn!(error = %e, booker = %actor.id, "booking rejected");
                Err(e)
            }
        }
    }

    /// Owner accepts or rejects a new booking
    #[instrument(skip(self, ctx))]
    pub fn owner_decision(
        &self,
        ctx: &RequestContext,
        booking_id: &str,
        approve: bool,
    ) -> Result<RoomBook> {
        let actor = self.actor(ctx)?;

        match self.approvals.owner_decision(&actor, booking_id, approve) {
            Ok(booking) => {
                info!(actor = %actor.id, status = ?booking.status, "owner decided");
                Ok(booking)
            }
            Err(e) => {
                warn!(actor = %actor.id, error = %e, "owner decision refused");
                Err(e)
            }
        }
    }

    /// Booker confirms or rejects an owner-approved booking
    #[instrument(skip(self, ctx))]
    pub fn tenant_decision(
        &self,
        ctx: &RequestContext,
        booking_id: &str,
        approve: bool,
    ) -> Result<RoomBook> {
        let actor = self.actor(ctx)?;

        match self.approvals.tenant_decision(&actor, booking_id, approve) {
            Ok(booking) => {
                info!(actor = %actor.id, status = ?booking.status, "tenant decided");
                Ok(booking)
            }
            Err(e) if !e.is_recoverable() => {
                tracing::error!(actor = %actor.id, error = %e, "booking ledger is inconsistent");
                Err(e)
            }
            Err(e) => {
                warn!(actor = %actor.id, error = %e, "tenant decision refused");
                Err(e)
            }
        }
    }

    /// The current actor's most recent booking
    pub fn my_booking(&self, ctx: &RequestContext) -> Result<Option<RoomBook>> {
        Ok(self.my_bookings(ctx)?.pop())
    }

    /// All bookings of the current actor, oldest first
    pub fn my_bookings(&self, ctx: &RequestContext) -> Result<Vec<RoomBook>> {
        let actor = self.actor(ctx)?;
        queries::bookings_of(&self.store, &actor.id)
    }

    pub fn booking(&self, booking_id: &str) -> Result<RoomBook> {
        queries::booking(&self.store, booking_id)
    }

    pub fn find_by_code(&self, code: &str) -> Result<RoomBook> {
        queries::find_by_code(&self.store, code)
    }

    pub fn members(&self, booking_id: &str) -> Result<RosterView> {
        queries::members(&self.store, booking_id)
    }

    pub fn ledger(&self, booking_id: &str) -> Result<LedgerView> {
        queries::ledger(&self.store, booking_id, TransactionCategory::Booking)
    }

    pub fn verification(&self, booking_id: &str) -> Result<Option<Verification>> {
        queries::verification(&self.store, booking_id)
    }

    pub fn trail(&self, booking_id: &str) -> Result<Vec<TrailEntry>> {
        history::trail(&self.store, booking_id)
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }
}
