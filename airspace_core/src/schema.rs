//! Versioned layout of the shared airspace region.
//!
//! The authoritative simulator publishes the table as a fixed binary
//! image; every other process attaches through the same [`AirspaceSchema`]
//! and is rejected on a version or capacity mismatch instead of
//! misreading the records.
//!
//! # Layout (little-endian, packed)
//!
//! ```text
//! offset  size  field
//! 0       4     magic "ASPC"
//! 4       2     schema version
//! 6       2     capacity
//! 8       4     count
//! 12      42×N  records (N = capacity, unused slots zeroed)
//!
//! record: id i32 | x y z f32 | vx vy vz f32 | active u8 | pending u8 | rvx rvy rvz f32
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::aircraft::{AircraftId, AircraftRecord};
use crate::error::SchemaError;

/// Magic bytes at the start of every region image.
pub const REGION_MAGIC: [u8; 4] = *b"ASPC";

/// Current record layout version.
pub const SCHEMA_VERSION: u16 = 1;

/// Table capacity shared by every collaborator unless configured otherwise.
pub const DEFAULT_CAPACITY: u16 = 50;

/// Header bytes: magic, version, capacity, count.
pub const HEADER_SIZE: usize = 4 + 2 + 2 + 4;

/// Bytes per encoded record.
pub const RECORD_SIZE: usize = 4 + 3 * 4 + 3 * 4 + 1 + 1 + 3 * 4;

/// The single schema definition every attacher agrees on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirspaceSchema {
    pub version: u16,
    pub capacity: u16,
}

impl Default for AirspaceSchema {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl AirspaceSchema {
    /// Current layout with a custom capacity.
    pub const fn with_capacity(capacity: u16) -> Self {
        Self {
            version: SCHEMA_VERSION,
            capacity,
        }
    }

    /// Table capacity as an index bound.
    pub fn slots(&self) -> usize {
        self.capacity as usize
    }

    /// Total image size in bytes.
    pub fn region_size(&self) -> usize {
        HEADER_SIZE + self.slots() * RECORD_SIZE
    }

    /// Fails fast unless `found` matches this schema exactly.
    pub fn verify(&self, found: &AirspaceSchema) -> Result<(), SchemaError> {
        if found.version != self.version {
            return Err(SchemaError::VersionMismatch {
                expected: self.version,
                found: found.version,
            });
        }
        if found.capacity != self.capacity {
            return Err(SchemaError::CapacityMismatch {
                expected: self.capacity,
                found: found.capacity,
            });
        }
        Ok(())
    }

    /// Encodes `records` into a full region image.
    pub fn encode(&self, records: &[AircraftRecord]) -> Result<Vec<u8>, SchemaError> {
        if records.len() > self.slots() {
            return Err(SchemaError::CountOverflow {
                count: records.len(),
                capacity: self.capacity,
            });
        }

        let mut image = Vec::with_capacity(self.region_size());
        image.write_all(&REGION_MAGIC)?;
        image.write_u16::<LittleEndian>(self.version)?;
        image.write_u16::<LittleEndian>(self.capacity)?;
        image.write_u32::<LittleEndian>(records.len() as u32)?;

        for record in records {
            write_record(&mut image, record)?;
        }

        // Unused slots stay zeroed so the image size never depends on count
        image.resize(self.region_size(), 0);
        Ok(image)
    }

    /// Attaches to an image: verifies header and schema, returns the
    /// populated records.
    pub fn attach(&self, image: &[u8]) -> Result<Vec<AircraftRecord>, SchemaError> {
        let (found, count) = read_header(image)?;
        self.verify(&found)?;

        if image.len() < self.region_size() {
            return Err(SchemaError::Truncated {
                expected: self.region_size(),
                found: image.len(),
            });
        }

        let mut rdr = &image[HEADER_SIZE..];
        (0..count).map(|_| read_record(&mut rdr)).collect()
    }
}

/// Reads the header of an image without checking it against a schema.
pub fn read_header(image: &[u8]) -> Result<(AirspaceSchema, usize), SchemaError> {
    if image.len() < HEADER_SIZE {
        return Err(SchemaError::Truncated {
            expected: HEADER_SIZE,
            found: image.len(),
        });
    }

    let mut rdr = image;
    let mut magic = [0u8; 4];
    rdr.read_exact(&mut magic)?;
    if magic != REGION_MAGIC {
        return Err(SchemaError::BadMagic(magic));
    }

    let version = rdr.read_u16::<LittleEndian>()?;
    let capacity = rdr.read_u16::<LittleEndian>()?;
    let count = rdr.read_u32::<LittleEndian>()? as usize;

    if count > capacity as usize {
        return Err(SchemaError::CountOverflow { count, capacity });
    }

    Ok((AirspaceSchema { version, capacity }, count))
}

fn write_vector<W: Write>(wtr: &mut W, v: &Vector3<f32>) -> std::io::Result<()> {
    wtr.write_f32::<LittleEndian>(v.x)?;
    wtr.write_f32::<LittleEndian>(v.y)?;
    wtr.write_f32::<LittleEndian>(v.z)
}

fn read_vector<R: Read>(rdr: &mut R) -> std::io::Result<Vector3<f32>> {
    let x = rdr.read_f32::<LittleEndian>()?;
    let y = rdr.read_f32::<LittleEndian>()?;
    let z = rdr.read_f32::<LittleEndian>()?;
    Ok(Vector3::new(x, y, z))
}

fn write_record<W: Write>(wtr: &mut W, record: &AircraftRecord) -> std::io::Result<()> {
    wtr.write_i32::<LittleEndian>(record.id.0)?;
    write_vector(wtr, &record.position)?;
    write_vector(wtr, &record.velocity)?;
    wtr.write_u8(record.active as u8)?;
    wtr.write_u8(record.pending_command as u8)?;
    write_vector(wtr, &record.requested_velocity)
}

fn read_record<R: Read>(rdr: &mut R) -> Result<AircraftRecord, SchemaError> {
    let id = AircraftId(rdr.read_i32::<LittleEndian>()?);
    let position = read_vector(rdr)?;
    let velocity = read_vector(rdr)?;
    let active = rdr.read_u8()? != 0;
    let pending_command = rdr.read_u8()? != 0;
    let requested_velocity = read_vector(rdr)?;

    Ok(AircraftRecord {
        id,
        position,
        velocity,
        active,
        pending_command,
        requested_velocity,
    })
}
