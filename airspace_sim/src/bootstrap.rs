//! Bootstrapper - populates the store from an initial aircraft list.
//!
//! Input is one `id x y z vx vy vz` tuple per line, whitespace separated.
//! Blank lines and `#` comments are ignored, malformed lines are skipped,
//! and loading stops at end of input or when the table is full.
//!
//! The format is line oriented: a tuple may not span lines and a line
//! may not hold more than one tuple. Either case counts as a malformed
//! line. Lines that are not valid UTF-8 are skipped the same way.

use airspace_core::{AircraftId, AirspaceStore, SlotIndex, StoreError};
use nalgebra::Vector3;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

use crate::error::SimError;

/// One aircraft creation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapEntry {
    pub id: AircraftId,
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
}

impl BootstrapEntry {
    pub fn new(id: i32, position: [f32; 3], velocity: [f32; 3]) -> Self {
        Self {
            id: AircraftId(id),
            position: Vector3::from(position),
            velocity: Vector3::from(velocity),
        }
    }
}

/// What a bootstrap pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BootstrapReport {
    /// Created aircraft, in slot order
    pub created: Vec<(AircraftId, SlotIndex)>,

    /// Malformed lines skipped
    pub skipped: usize,

    /// Entries rejected because the id is already active
    pub duplicates: usize,

    /// True when loading stopped at capacity
    pub capacity_reached: bool,
}

/// Parses one line. `Ok(None)` for blank and comment lines.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<BootstrapEntry>, SimError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 7 {
        return Err(SimError::invalid_input(
            line_no,
            format!("expected 7 fields, found {}", fields.len()),
        ));
    }

    let id: i32 = fields[0]
        .parse()
        .map_err(|_| SimError::invalid_input(line_no, format!("bad id '{}'", fields[0])))?;

    let mut values = [0.0f32; 6];
    for (value, field) in values.iter_mut().zip(&fields[1..]) {
        *value = field
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| SimError::invalid_input(line_no, format!("bad number '{}'", field)))?;
    }

    Ok(Some(BootstrapEntry::new(
        id,
        [values[0], values[1], values[2]],
        [values[3], values[4], values[5]],
    )))
}

/// Creates store records from a sequence of entries.
///
/// Duplicate active ids are rejected before reaching the store, which
/// does not deduplicate.
pub fn populate<I>(store: &AirspaceStore, entries: I) -> BootstrapReport
where
    I: IntoIterator<Item = BootstrapEntry>,
{
    let mut report = BootstrapReport::default();

    for entry in entries {
        if store.find(entry.id).is_some() {
            warn!(aircraft = %entry.id, "Duplicate aircraft id, entry ignored");
            report.duplicates += 1;
            continue;
        }

        match store.create(entry.id, entry.position, entry.velocity) {
            Ok(slot) => {
                info!(
                    aircraft = %entry.id,
                    x = entry.position.x,
                    y = entry.position.y,
                    z = entry.position.z,
                    "Created aircraft"
                );
                report.created.push((entry.id, slot));
            }
            Err(StoreError::CapacityExceeded { capacity }) => {
                warn!(capacity, "Airspace full, remaining entries dropped");
                report.capacity_reached = true;
                break;
            }
            Err(e) => {
                warn!("Aircraft {} not created: {}", entry.id, e);
            }
        }
    }

    report
}

/// Reads tuples from `reader` into `store`.
pub fn load<R: BufRead>(store: &AirspaceStore, reader: R) -> Result<BootstrapReport, SimError> {
    let mut entries = Vec::new();
    let mut skipped = 0;

    for (index, bytes) in reader.split(b'\n').enumerate() {
        let line_no = index + 1;
        let parsed = match String::from_utf8(bytes?) {
            Ok(line) => parse_line(line_no, &line),
            Err(_) => Err(SimError::invalid_input(line_no, "not valid UTF-8")),
        };

        match parsed {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(e) => {
                warn!("Skipping bootstrap record: {}", e);
                skipped += 1;
            }
        }
    }

    let mut report = populate(store, entries);
    report.skipped = skipped;
    Ok(report)
}

/// Reads tuples from the file at `path` into `store`.
pub fn load_file(store: &AirspaceStore, path: impl AsRef<Path>) -> Result<BootstrapReport, SimError> {
    let file = File::open(path.as_ref())?;
    load(store, BufReader::new(file))
}
