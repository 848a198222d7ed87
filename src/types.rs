//! Shared value types: timestamps, statuses and audit stamps
use chrono::{DateTime, TimeZone, Utc};

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl<T: TimeZone> PartialOrd for TimeStamp<T>
where
    Self: PartialEq,
{
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl<T: TimeZone> Ord for TimeStamp<T>
where
    Self: Eq,
{
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

/// Lifecycle of a room booking.
///
/// `New -> OwnerApproved -> TenantConfirmed`, with `Rejected` reachable from
/// either non-terminal state.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    #[n(0)]
    New,
    #[n(1)]
    OwnerApproved,
    #[n(2)]
    TenantConfirmed,
    #[n(3)]
    Rejected,
}

/// The two parties that gate a booking, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Owner,
    Tenant,
}

impl BookingStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::New => 0,
            Self::OwnerApproved => 1,
            Self::TenantConfirmed => 2,
            Self::Rejected => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::TenantConfirmed | Self::Rejected)
    }

    /// The only status from which `party` may decide.
    pub fn awaiting(party: Party) -> Self {
        match party {
            Party::Owner => Self::New,
            Party::Tenant => Self::OwnerApproved,
        }
    }

    /// Next status for a decision, or `None` when `party` may not decide now.
    pub fn decide(self, party: Party, approve: bool) -> Option<Self> {
        match (self, party, approve) {
            (Self::New, Party::Owner, true) => Some(Self::OwnerApproved),
            (Self::OwnerApproved, Party::Tenant, true) => Some(Self::TenantConfirmed),
            (Self::New, Party::Owner, false) | (Self::OwnerApproved, Party::Tenant, false) => {
                Some(Self::Rejected)
            }
            _ => None,
        }
    }
}

/// Approval status of a single payment instrument in a transaction.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Approved,
    #[n(2)]
    Rejected,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionCategory {
    #[n(0)]
    Booking,
    #[n(1)]
    Renewal,
}

impl TransactionCategory {
    pub fn code(self) -> u8 {
        match self {
            Self::Booking => 0,
            Self::Renewal => 1,
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    #[n(0)]
    Booker,
    #[n(1)]
    Owner,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    #[n(0)]
    Male,
    #[n(1)]
    Female,
}

/// Audit columns carried by every persisted record.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Audit {
    #[n(0)]
    pub created: TimeStamp<Utc>,
    #[n(1)]
    pub created_by: String,
    #[n(2)]
    pub modified: TimeStamp<Utc>,
    #[n(3)]
    pub modified_by: String,
    #[n(4)]
    pub is_active: bool,
}

impl Audit {
    pub fn new(username: &str) -> Self {
        let now = TimeStamp::new();
        Self {
            created: now.clone(),
            created_by: username.to_string(),
            modified: now,
            modified_by: username.to_string(),
            is_active: true,
        }
    }

    pub fn touch(&mut self, username: &str) {
        self.modified = TimeStamp::new();
        self.modified_by = username.to_string();
    }
}
