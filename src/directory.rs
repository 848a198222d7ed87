//! Reference data the booking core reads but never mutates: properties with
//! their rooms, and payment methods.
use super::entities::{PaymentMethod, Property};
use super::error::{BookingError, Result};
use super::store::{decode, encode};
use super::types::Audit;
use super::utils::{self, hrp};
use sled::transaction::ConflictableTransactionResult;
use sled::{Db, Transactional, Tree};
use std::sync::Arc;

pub trait PropertyLookup: Send + Sync {
    /// The property that contains the room or unit `room_ref`.
    fn find_property(&self, room_ref: &str) -> Result<Property>;
}

pub trait PaymentMethodLookup: Send + Sync {
    fn find_payment_method(&self, id: &str) -> Result<PaymentMethod>;
}

pub struct Directory {
    db: Arc<Db>,
    properties: Tree,      // property id -> Property
    rooms: Tree,           // room id -> property id
    payment_methods: Tree, // payment method id -> PaymentMethod
}

impl Directory {
    pub fn new(db: Arc<Db>) -> Result<Self> {
        Ok(Self {
            properties: db.open_tree("properties")?,
            rooms: db.open_tree("rooms")?,
            payment_methods: db.open_tree("payment_methods")?,
            db,
        })
    }

    /// Register a property owned by `owner_id` with `room_count` rooms.
    pub fn register_property(
        &self,
        owner_id: &str,
        name: &str,
        country: &str,
        city: &str,
        room_count: usize,
    ) -> Result<Property> {
        if utils::initial(country).is_none() || utils::initial(city).is_none() {
            return Err(BookingError::Validation(
                "property country and city are required".into(),
            ));
        }

        let rooms = (0..room_count)
            .map(|_| utils::new_uuid_to_bech32(hrp::ROOM))
            .collect::<Result<Vec<_>>>()?;

        let property = Property {
            id: utils::new_uuid_to_bech32(hrp::PROPERTY)?,
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            country: country.to_string(),
            city: city.to_string(),
            rooms,
            audit: Audit::new(owner_id),
        };

        // property row and its room index land together
        let row = encode(&property)?;
        (&self.rooms, &self.properties).transaction(
            |(rooms, properties)| -> ConflictableTransactionResult<(), BookingError> {
                for room in &property.rooms {
                    rooms.insert(room.as_bytes(), property.id.as_bytes())?;
                }
                properties.insert(property.id.as_bytes(), row.as_slice())?;
                Ok(())
            },
        )?;
        self.db.flush()?;

        Ok(property)
    }

    pub fn register_payment_method(
        &self,
        payment_type: &str,
        description: &str,
    ) -> Result<PaymentMethod> {
        let method = PaymentMethod {
            id: utils::new_uuid_to_bech32(hrp::PAYMENT_METHOD)?,
            payment_type: payment_type.to_string(),
            description: description.to_string(),
            audit: Audit::new("system"),
        };
        self.payment_methods
            .insert(method.id.as_bytes(), encode(&method)?)?;

        Ok(method)
    }

    pub fn property(&self, id: &str) -> Result<Property> {
        match self.properties.get(id.as_bytes())? {
            Some(bytes) => decode(&bytes),
            None => Err(BookingError::not_found("property", id)),
        }
    }
}

impl PropertyLookup for Directory {
    fn find_property(&self, room_ref: &str) -> Result<Property> {
        let property_id = self
            .rooms
            .get(room_ref.as_bytes())?
            .ok_or_else(|| BookingError::not_found("room", room_ref))?;

        let property_id = String::from_utf8_lossy(&property_id).into_owned();
        self.property(&property_id)
    }
}

impl PaymentMethodLookup for Directory {
    fn find_payment_method(&self, id: &str) -> Result<PaymentMethod> {
        match self.payment_methods.get(id.as_bytes())? {
            Some(bytes) => decode(&bytes),
            None => Err(BookingError::not_found("payment method", id)),
        }
    }
}
