//! Named shared region: publishing and attaching.
//!
//! The simulator is the single writer. Each publish writes the full image
//! to a temporary sibling and renames it into place, so an attached
//! reader sees either the previous or the next image, never a mix.

use airspace_core::{AircraftRecord, AirspaceSchema, AirspaceStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::SimError;

/// Owner side of the region.
#[derive(Debug, Clone)]
pub struct RegionPublisher {
    path: PathBuf,
    staging: PathBuf,
}

impl RegionPublisher {
    /// Creates the region and publishes the current table.
    ///
    /// Any failure here is an initialization failure.
    pub fn create(path: impl Into<PathBuf>, store: &AirspaceStore) -> Result<Self, SimError> {
        let path = path.into();
        let mut staging = path.clone().into_os_string();
        staging.push(".tmp");

        let publisher = Self {
            path,
            staging: PathBuf::from(staging),
        };
        publisher.publish(store).map_err(|e| {
            SimError::initialization(format!(
                "cannot create region {}: {}",
                publisher.path.display(),
                e
            ))
        })?;

        info!(path = %publisher.path.display(), schema = ?store.schema(), "Region created");
        Ok(publisher)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes a fresh image of `store`.
    pub fn publish(&self, store: &AirspaceStore) -> Result<(), SimError> {
        let image = store.encode_region()?;
        fs::write(&self.staging, &image)?;
        fs::rename(&self.staging, &self.path)?;
        debug!(bytes = image.len(), "Region published");
        Ok(())
    }

    /// Removes the region name. Attached readers fail on their next read.
    pub fn release(self) -> Result<(), SimError> {
        let _ = fs::remove_file(&self.staging);
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        info!(path = %self.path.display(), "Region released");
        Ok(())
    }
}

/// Read-only attacher.
#[derive(Debug)]
pub struct RegionReader {
    path: PathBuf,
    schema: AirspaceSchema,
}

impl RegionReader {
    /// Attaches to the region at `path`, verifying `schema` once up front.
    pub fn attach(path: impl Into<PathBuf>, schema: AirspaceSchema) -> Result<Self, SimError> {
        let reader = Self {
            path: path.into(),
            schema,
        };
        reader.read().map_err(|e| {
            SimError::initialization(format!("cannot attach {}: {}", reader.path.display(), e))
        })?;
        Ok(reader)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and verifies the current image.
    pub fn read(&self) -> Result<Vec<AircraftRecord>, SimError> {
        let image = fs::read(&self.path)?;
        Ok(self.schema.attach(&image)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airspace_core::{AircraftId, SchemaError};
    use nalgebra::Vector3;

    #[test]
    fn test_publish_attach_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aircraft_shm");
        let schema = AirspaceSchema::with_capacity(10);
        let store = AirspaceStore::new(schema);

        let publisher = RegionPublisher::create(&path, &store).unwrap();
        let reader = RegionReader::attach(&path, schema).unwrap();
        assert!(reader.read().unwrap().is_empty());

        store.create(AircraftId(1), Vector3::new(1.0, 1.0, 1.0), Vector3::zeros()).unwrap();
        publisher.publish(&store).unwrap();
        assert_eq!(reader.read().unwrap(), store.snapshot());

        publisher.release().unwrap();
        assert!(!path.exists());
        assert!(matches!(reader.read(), Err(SimError::Io(_))));
    }

    #[test]
    fn test_attach_fails_fast_on_capacity_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aircraft_shm");
        let store = AirspaceStore::new(AirspaceSchema::with_capacity(50));
        let _publisher = RegionPublisher::create(&path, &store).unwrap();

        let err = RegionReader::attach(&path, AirspaceSchema::with_capacity(10)).unwrap_err();
        assert!(matches!(err, SimError::Initialization(_)));

        // The underlying cause is visible through the reader error too
        let reader = RegionReader {
            path: path.clone(),
            schema: AirspaceSchema::with_capacity(10),
        };
        assert!(matches!(
            reader.read(),
            Err(SimError::Schema(SchemaError::CapacityMismatch { .. }))
        ));
    }

    #[test]
    fn test_attach_missing_region() {
        let dir = tempfile::tempdir().unwrap();
        let err = RegionReader::attach(dir.path().join("absent"), AirspaceSchema::default()).unwrap_err();
        assert!(matches!(err, SimError::Initialization(_)));
    }

    #[test]
    fn test_create_in_missing_directory_is_initialization_failure() {
        let store = AirspaceStore::default();
        let err = RegionPublisher::create("/definitely/not/here/aircraft_shm", &store).unwrap_err();
        assert!(matches!(err, SimError::Initialization(_)));
    }
}
