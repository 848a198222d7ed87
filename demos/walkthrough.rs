//! A booking from request to tenant confirmation against a scratch database.
//!
//! Run with `ROOM_BOOKING_LOG=debug` to see each workflow step.

use anyhow::Context;
use room_booking::{
    BookingService,
    booking::BookingRequest,
    config::Config,
    directory::Directory,
    identity::{RequestContext, SessionResolver},
    telemetry,
    types::{Gender, Role, TimeStamp},
};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let mut config = Config::load().context("loading configuration")?;
    config.storage.temporary = true;

    let db = config.open_db()?;
    let store = config.open_store(db.clone())?;
    let resolver = Arc::new(SessionResolver::new(db.clone())?);
    let directory = Arc::new(Directory::new(db)?);

    let owner = resolver.register_user("pak_hadi", Role::Owner)?;
    resolver.register_user("rina", Role::Booker)?;
    let property =
        directory.register_property(&owner.id, "Kost Hadi", "Indonesia", "Yogyakarta", 4)?;
    let transfer = directory.register_payment_method("virtual", "Bank transfer")?;

    let service = BookingService::new(store, resolver.clone(), directory, config.booking);
    let owner_ctx = RequestContext::with_session(resolver.open_session("pak_hadi")?);
    let booker_ctx = RequestContext::with_session(resolver.open_session("rina")?);

    let request = BookingRequest::new(&property.rooms[0])
        .set_period("monthly")
        .set_payment_method(&transfer.id)
        .set_book_date(TimeStamp::new())
        .set_payment(500_000)
        .set_must_pay(1_500_000)
        .add_member("Rina", "081298765432", Gender::Female)
        .set_verification("identity card", "https://files.kost-hadi.id/rina-ktp.jpg");

    let booking = service
        .submit_booking(&booker_ctx, &request)
        .context("submitting the booking")?;
    println!("booked {} as {} ({:?})", booking.id, booking.code, booking.status);

    let booking = service.owner_decision(&owner_ctx, &booking.id, true)?;
    println!("owner decided: {:?}", booking.status);

    let booking = service.tenant_decision(&booker_ctx, &booking.id, true)?;
    println!("tenant decided: {:?}", booking.status);

    let ledger = service.ledger(&booking.id)?;
    println!(
        "paid off {} of {}, {} outstanding",
        ledger.transaction.paid_off,
        ledger.transaction.must_pay,
        ledger.transaction.outstanding()
    );

    let trail = service.trail(&booking.id)?;
    for entry in &trail {
        println!("  #{} {} {:?} -> {:?}", entry.seq, entry.actor, entry.event, entry.status);
    }
    anyhow::ensure!(
        room_booking::history::verify_trail(&trail)?,
        "approval trail failed verification"
    );

    Ok(())
}
