//! Error types for the airspace core.

use crate::aircraft::{AircraftId, SlotIndex};
use thiserror::Error;

/// Errors returned by [`AirspaceStore`](crate::AirspaceStore) operations.
///
/// None of these are fatal: a full table or an unknown aircraft is
/// rejected once and the caller decides whether to log it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Every slot of the table is populated
    #[error("Airspace table full (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    /// No active aircraft carries this id
    #[error("Aircraft {0} not found or inactive")]
    NotFound(AircraftId),

    /// Slot index beyond the populated range
    #[error("Slot {0} is not populated")]
    InvalidSlot(SlotIndex),
}

/// Errors raised while encoding or attaching to a shared region image.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The image does not start with the region magic
    #[error("Bad region magic: {0:?}")]
    BadMagic([u8; 4]),

    /// Attacher and publisher disagree on the record layout
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u16, found: u16 },

    /// Attacher and publisher disagree on the table capacity
    #[error("Capacity mismatch: expected {expected}, found {found}")]
    CapacityMismatch { expected: u16, found: u16 },

    /// Image shorter than the schema requires
    #[error("Region truncated: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    /// Header count larger than the capacity it declares
    #[error("Record count {count} exceeds capacity {capacity}")]
    CountOverflow { count: usize, capacity: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
