//! Membership writer: the occupant roster of a booking
use super::entities::{MemberDetail, MemberGroup};
use super::error::BookingError;
use super::identity::Actor;
use super::store::{Ref, Scope, ScopeResult, Table};
use super::types::{Audit, Gender};
use super::utils::{self, hrp};
use sled::transaction::{ConflictableTransactionError, abort};

/// One occupant as requested by the booker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRequest {
    pub name: String,
    pub phone: String,
    pub gender: Gender,
}

impl MemberRequest {
    pub fn new(name: &str, phone: &str, gender: Gender) -> Self {
        Self {
            name: name.to_string(),
            phone: phone.to_string(),
            gender,
        }
    }

    fn check(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("name is empty");
        }
        if self.phone.trim().is_empty() {
            return Some("phone is empty");
        }
        None
    }
}

/// Persist the member group of `booking_id` and one detail row per member.
///
/// The group id is assigned before any detail row is written; a bad member
/// aborts the caller's scope, taking the group (and the booking) with it.
pub fn add_members(
    scope: &Scope<'_>,
    actor: &Actor,
    booking_id: &str,
    tenant_id: Option<&str>,
    members: &[MemberRequest],
) -> ScopeResult<String> {
    let group = MemberGroup {
        id: utils::new_uuid_to_bech32(hrp::MEMBER_GROUP)
            .map_err(ConflictableTransactionError::Abort)?,
        booking_id: booking_id.to_string(),
        tenant_id: tenant_id.map(str::to_string),
        audit: Audit::new(&actor.username),
    };
    scope.put(Table::MemberGroups, &group.id, &group)?;
    scope.link(Ref::BookingGroup(booking_id), &group.id)?;

    for (index, member) in members.iter().enumerate() {
        if let Some(reason) = member.check() {
            return abort(BookingError::InvalidMember { index, reason });
        }

        let detail = MemberDetail {
            id: utils::new_uuid_to_bech32(hrp::MEMBER)
                .map_err(ConflictableTransactionError::Abort)?,
            group_id: group.id.clone(),
            name: member.name.trim().to_string(),
            phone: member.phone.trim().to_string(),
            gender: member.gender,
            audit: Audit::new(&actor.username),
        };
        scope.put(Table::MemberDetails, &detail.id, &detail)?;
        scope.link(Ref::GroupMembers(&group.id), &detail.id)?;
    }

    Ok(group.id)
}
