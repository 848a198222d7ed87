use super::types::BookingStatus;

pub type Result<T> = std::result::Result<T, BookingError>;

/// Classification of [`BookingError`] used by callers to pick a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Forbidden,
    InvalidState,
    NotFound,
    Persistence,
    RandomSource,
}

#[derive(thiserror::Error, Debug)]
pub enum BookingError {
    #[error("Invalid booking request: {0}")]
    Validation(String),
    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),
    #[error("Invalid member detail at position {index}: {reason}")]
    InvalidMember { index: usize, reason: &'static str },
    #[error("Offered amount {offered} exceeds the outstanding amount {outstanding}")]
    Overpayment { offered: u64, outstanding: u64 },
    #[error("No authenticated actor: {0}")]
    Authentication(String),
    #[error("Actor {actor} may not {action}")]
    Forbidden { actor: String, action: &'static str },
    #[error("Booking {booking_id} is {current:?}, expected {expected:?}")]
    InvalidState {
        booking_id: String,
        current: BookingStatus,
        expected: BookingStatus,
    },
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("Ledger integrity violated for booking {booking_id}: missing {record}")]
    LedgerIntegrity {
        booking_id: String,
        record: &'static str,
    },
    #[error("Storage failure")]
    Storage(#[from] sled::Error),
    #[error("Record codec failure: {0}")]
    Codec(String),
    #[error("Could not draw a unique booking code after {0} attempts")]
    CodeExhausted(u32),
    #[error("Entropy source failure: {0}")]
    RandomSource(String),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_)
            | Self::UnknownPaymentMethod(_)
            | Self::InvalidMember { .. }
            | Self::Overpayment { .. } => ErrorKind::Validation,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::NotFound { .. } | Self::LedgerIntegrity { .. } => ErrorKind::NotFound,
            Self::Storage(_) | Self::Codec(_) | Self::CodeExhausted(_) => ErrorKind::Persistence,
            Self::RandomSource(_) => ErrorKind::RandomSource,
        }
    }

    /// A missing ledger record means the booking invariants were already
    /// broken; retrying the same request cannot succeed.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::LedgerIntegrity { .. })
    }

    pub(crate) fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }
}

impl From<minicbor::decode::Error> for BookingError {
    fn from(value: minicbor::decode::Error) -> Self {
        Self::Codec(value.to_string())
    }
}

impl<E: std::fmt::Display> From<minicbor::encode::Error<E>> for BookingError {
    fn from(value: minicbor::encode::Error<E>) -> Self {
        Self::Codec(value.to_string())
    }
}

impl From<sled::transaction::TransactionError<BookingError>> for BookingError {
    fn from(value: sled::transaction::TransactionError<BookingError>) -> Self {
        match value {
            sled::transaction::TransactionError::Abort(err) => err,
            sled::transaction::TransactionError::Storage(err) => Self::Storage(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_integrity_is_not_found_but_not_recoverable() {
        let err = BookingError::LedgerIntegrity {
            booking_id: "book1".into(),
            record: "transaction",
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!err.is_recoverable());

        let err = BookingError::not_found("booking", "book1");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.is_recoverable());
    }

    #[test]
    fn transaction_abort_unwraps_to_inner_error() {
        let err: BookingError = sled::transaction::TransactionError::Abort(
            BookingError::Validation("empty room".into()),
        )
        .into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
