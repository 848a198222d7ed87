//! Record identity helpers

use bech32::Bech32m;
use uuid7::uuid7;

use super::error::{BookingError, Result};

/// Human readable prefixes for each record table.
pub mod hrp {
    pub const BOOKING: &str = "book";
    pub const MEMBER_GROUP: &str = "grp";
    pub const MEMBER: &str = "mbr";
    pub const TRANSACTION: &str = "trx";
    pub const TRANSACTION_DETAIL: &str = "trxd";
    pub const VERIFICATION: &str = "vrf";
    pub const USER: &str = "user";
    pub const PROPERTY: &str = "prop";
    pub const ROOM: &str = "room";
    pub const PAYMENT_METHOD: &str = "pay";
    pub const SESSION: &str = "sess";
}

// construct a unique record id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> Result<String> {
    let hrp = bech32::Hrp::parse(hrp).map_err(|e| BookingError::Validation(e.to_string()))?;
    bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())
        .map_err(|e| BookingError::Validation(e.to_string()))
}

/// First character of a place name, used to seed booking codes.
pub fn initial(name: &str) -> Option<String> {
    name.trim().chars().next().map(|c| c.to_uppercase().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_carry_their_table_prefix() {
        let id = new_uuid_to_bech32(hrp::BOOKING).unwrap();
        assert!(id.starts_with("book1"));
        assert_ne!(id, new_uuid_to_bech32(hrp::BOOKING).unwrap());
    }

    #[test]
    fn empty_prefix_is_rejected() {
        assert!(new_uuid_to_bech32("").is_err());
    }

    #[test]
    fn initials() {
        assert_eq!(initial("indonesia").as_deref(), Some("I"));
        assert_eq!(initial("  Jakarta").as_deref(), Some("J"));
        assert_eq!(initial("   "), None);
    }
}
