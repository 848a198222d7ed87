//! Persisted records. Keys are the record ids; values are CBOR.
use super::types::{
    Audit, BookingStatus, DetailStatus, Gender, Role, TimeStamp, TransactionCategory,
};
use chrono::Utc;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct RoomBook {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub property_id: String,
    #[n(2)]
    pub room_id: String,
    #[n(3)]
    pub room_detail_id: Option<String>, // a specific unit inside the room type
    #[n(4)]
    pub booker_id: String,
    #[n(5)]
    pub payment_method_id: String,
    #[n(6)]
    pub period_id: String,
    #[n(7)]
    pub status: BookingStatus,
    #[n(8)]
    pub code: String, // assigned once at creation
    #[n(9)]
    pub book_date: TimeStamp<Utc>,
    #[n(10)]
    pub must_pay: u64,
    #[n(11)]
    pub prev_payment_due: Option<TimeStamp<Utc>>,
    #[n(12)]
    pub next_payment_due: Option<TimeStamp<Utc>>,
    #[n(13)]
    pub audit: Audit,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct MemberGroup {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub booking_id: String,
    #[n(2)]
    pub tenant_id: Option<String>, // household identity, if any
    #[n(3)]
    pub audit: Audit,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct MemberDetail {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub group_id: String,
    #[n(2)]
    pub name: String,
    #[n(3)]
    pub phone: String,
    #[n(4)]
    pub gender: Gender,
    #[n(5)]
    pub audit: Audit,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub reference_id: String, // the booking id
    #[n(2)]
    pub category: TransactionCategory,
    #[n(3)]
    pub paid_off: u64,
    #[n(4)]
    pub must_pay: u64,
    #[n(5)]
    pub audit: Audit,
}

impl Transaction {
    pub fn outstanding(&self) -> u64 {
        self.must_pay.saturating_sub(self.paid_off)
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct TransactionDetail {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub transaction_id: String,
    #[n(2)]
    pub payment_method_id: String,
    #[n(3)]
    pub offered_amount: u64,
    #[n(4)]
    pub status: DetailStatus,
    #[n(5)]
    pub audit: Audit,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub reference_id: String,
    #[n(2)]
    pub description: String,
    #[n(3)]
    pub url: String,
    #[n(4)]
    pub audit: Audit,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct PaymentMethod {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub payment_type: String, // virtual or physical
    #[n(2)]
    pub description: String,
    #[n(3)]
    pub audit: Audit,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Property {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub owner_id: String,
    #[n(2)]
    pub name: String,
    #[n(3)]
    pub country: String,
    #[n(4)]
    pub city: String,
    #[n(5)]
    pub rooms: Vec<String>,
    #[n(6)]
    pub audit: Audit,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct User {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub username: String,
    #[n(2)]
    pub role: Role,
    #[n(3)]
    pub audit: Audit,
}
