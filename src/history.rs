//! Approval trail
//!
//! Every state change of a booking appends one [`TrailEntry`] inside the same
//! atomic scope as the change itself. Entries are hash linked: each carries the
//! SHA-256 digest of the CBOR encoding of its predecessor, so the trail can be
//! checked for gaps or tampering with [`verify_trail`].
use super::error::Result;
use super::store::{Ref, Scope, ScopeResult, Store, Table, encode};
use super::types::{BookingStatus, TimeStamp};
use chrono::Utc;

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum TrailEvent {
    #[n(0)]
    Created {
        #[n(0)]
        code: String,
    },
    #[n(1)]
    OwnerDecision {
        #[n(0)]
        approve: bool,
    },
    #[n(2)]
    TenantDecision {
        #[n(0)]
        approve: bool,
        #[n(1)]
        recognised: u64, // amount moved into paid-off
    },
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub struct TrailEntry {
    #[n(0)]
    pub booking_id: String,
    #[n(1)]
    pub seq: u32,
    #[n(2)]
    pub actor: String,
    #[n(3)]
    pub at: TimeStamp<Utc>,
    #[n(4)]
    pub event: TrailEvent,
    #[n(5)]
    pub status: BookingStatus, // status after the event
    #[n(6)]
    pub prev_digest: String,
}

#[derive(Debug, Clone, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
struct TrailHead {
    #[n(0)]
    seq: u32,
    #[n(1)]
    digest: String,
}

impl TrailEntry {
    pub fn digest(&self) -> Result<String> {
        let cbor = encode(self)?;
        Ok(sha256::digest(&cbor))
    }
}

fn entry_key(booking_id: &str, seq: u32) -> String {
    format!("{booking_id}/{seq:010}")
}

/// Append an event for `booking_id` inside `scope`.
pub fn append(
    scope: &Scope<'_>,
    booking_id: &str,
    actor: &str,
    event: TrailEvent,
    status: BookingStatus,
) -> ScopeResult<()> {
    let head_key = Ref::TrailHead(booking_id).key();
    let head: Option<TrailHead> = scope.get(Table::Refs, &head_key)?;
    let (seq, prev_digest) = match head {
        Some(head) => (head.seq + 1, head.digest),
        None => (0, String::new()),
    };

    let entry = TrailEntry {
        booking_id: booking_id.to_string(),
        seq,
        actor: actor.to_string(),
        at: TimeStamp::new(),
        event,
        status,
        prev_digest,
    };
    let digest = entry
        .digest()
        .map_err(sled::transaction::ConflictableTransactionError::Abort)?;

    scope.put(Table::Trail, &entry_key(booking_id, seq), &entry)?;
    scope.put(Table::Refs, &head_key, &TrailHead { seq, digest })
}

/// The trail of `booking_id`, oldest first.
pub fn trail(store: &Store, booking_id: &str) -> Result<Vec<TrailEntry>> {
    store.scan(Table::Trail, &format!("{booking_id}/"))
}

/// Checks sequence numbers and digest links of a trail.
pub fn verify_trail(entries: &[TrailEntry]) -> Result<bool> {
    let mut prev = String::new();
    for (i, entry) in entries.iter().enumerate() {
        if entry.seq as usize != i || entry.prev_digest != prev {
            return Ok(false);
        }
        prev = entry.digest()?;
    }
    Ok(true)
}
