//! The shared airspace store.
//!
//! A fixed-capacity arena of [`AircraftRecord`] slots behind one mutex.
//! Every operation holds the lock for its whole duration and never
//! across an `.await`, so readers always see whole records.
//!
//! ```text
//!  AircraftAgent ──with_aircraft──┐
//!  ConflictMonitor ─snapshot──────┤     ┌──────────────────────────┐
//!                  ─deactivate────┼────►│ Mutex<AirspaceTable>     │
//!  Operator ───────stage_command──┤     │  [0] [1] [2] ... [count) │
//!  Display/History ─snapshot──────┘     └──────────────────────────┘
//! ```

use nalgebra::Vector3;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::aircraft::{AircraftId, AircraftRecord, SlotIndex};
use crate::error::{SchemaError, StoreError};
use crate::schema::AirspaceSchema;

/// The table itself: populated slots `[0, count)` in insertion order.
#[derive(Debug, Clone)]
pub struct AirspaceTable {
    schema: AirspaceSchema,
    records: Vec<AircraftRecord>,
}

impl AirspaceTable {
    pub fn new(schema: AirspaceSchema) -> Self {
        Self {
            schema,
            records: Vec::with_capacity(schema.slots()),
        }
    }

    /// Number of populated slots, active or not.
    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn capacity(&self) -> usize {
        self.schema.slots()
    }

    pub fn records(&self) -> &[AircraftRecord] {
        &self.records
    }

    fn position_of_active(&self, id: AircraftId) -> Option<usize> {
        self.records.iter().position(|r| r.active && r.id == id)
    }
}

/// Cloneable handle to the one shared table.
#[derive(Debug, Clone)]
pub struct AirspaceStore {
    table: Arc<Mutex<AirspaceTable>>,
}

impl Default for AirspaceStore {
    fn default() -> Self {
        Self::new(AirspaceSchema::default())
    }
}

impl AirspaceStore {
    /// Creates an empty store laid out by `schema`.
    pub fn new(schema: AirspaceSchema) -> Self {
        Self {
            table: Arc::new(Mutex::new(AirspaceTable::new(schema))),
        }
    }

    /// A panicking holder cannot leave a record half-written (every
    /// guarded section assigns whole fields), so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, AirspaceTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn schema(&self) -> AirspaceSchema {
        self.lock().schema
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity()
    }

    pub fn count(&self) -> usize {
        self.lock().count()
    }

    pub fn active_count(&self) -> usize {
        self.lock().records.iter().filter(|r| r.active).count()
    }

    /// Appends a new active record.
    ///
    /// Ids are not deduplicated here; callers check [`find`](Self::find)
    /// first when uniqueness matters.
    pub fn create(
        &self,
        id: AircraftId,
        position: Vector3<f32>,
        velocity: Vector3<f32>,
    ) -> Result<SlotIndex, StoreError> {
        let mut table = self.lock();
        if table.count() >= table.capacity() {
            return Err(StoreError::CapacityExceeded {
                capacity: table.capacity(),
            });
        }

        let slot = SlotIndex(table.records.len());
        table.records.push(AircraftRecord::new(id, position, velocity));
        debug!(aircraft = %id, slot = %slot, "Created aircraft record");
        Ok(slot)
    }

    /// Consistent point-in-time copy of every populated slot.
    pub fn snapshot(&self) -> Vec<AircraftRecord> {
        self.lock().records.clone()
    }

    /// Locates the active record with `id`.
    pub fn find(&self, id: AircraftId) -> Option<(SlotIndex, AircraftRecord)> {
        let table = self.lock();
        table
            .position_of_active(id)
            .map(|index| (SlotIndex(index), table.records[index]))
    }

    /// Writes a velocity command into the mailbox of the active
    /// aircraft `id`. A command staged before the previous one was
    /// consumed replaces it.
    pub fn stage_command(&self, id: AircraftId, velocity: Vector3<f32>) -> Result<(), StoreError> {
        let mut table = self.lock();
        let index = table
            .position_of_active(id)
            .ok_or(StoreError::NotFound(id))?;

        let record = &mut table.records[index];
        record.requested_velocity = velocity;
        record.pending_command = true;
        Ok(())
    }

    /// Scoped exclusive access to one slot.
    pub fn with_aircraft<R>(
        &self,
        slot: SlotIndex,
        mutator: impl FnOnce(&mut AircraftRecord) -> R,
    ) -> Result<R, StoreError> {
        let mut table = self.lock();
        let record = table
            .records
            .get_mut(slot.index())
            .ok_or(StoreError::InvalidSlot(slot))?;
        Ok(mutator(record))
    }

    /// Retires both aircraft in one guarded section.
    ///
    /// Returns `true` only when this call changed state. If either slot
    /// is already inactive (or invalid, or `i == j`) nothing is written.
    pub fn deactivate_pair(&self, i: SlotIndex, j: SlotIndex) -> bool {
        if i == j {
            return false;
        }

        let mut table = self.lock();
        let both_active = matches!(
            (table.records.get(i.index()), table.records.get(j.index())),
            (Some(a), Some(b)) if a.active && b.active
        );
        if !both_active {
            return false;
        }

        table.records[i.index()].active = false;
        table.records[j.index()].active = false;
        true
    }

    /// Snapshot encoded as a region image under the store's schema.
    pub fn encode_region(&self) -> Result<Vec<u8>, SchemaError> {
        let (schema, records) = {
            let table = self.lock();
            (table.schema, table.records.clone())
        };
        schema.encode(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn store_with(capacity: u16) -> AirspaceStore {
        AirspaceStore::new(AirspaceSchema::with_capacity(capacity))
    }

    #[test]
    fn test_create_assigns_sequential_slots() {
        let store = store_with(4);
        let a = store.create(AircraftId(10), Vector3::zeros(), Vector3::zeros()).unwrap();
        let b = store.create(AircraftId(20), Vector3::zeros(), Vector3::zeros()).unwrap();

        assert_eq!(a, SlotIndex(0));
        assert_eq!(b, SlotIndex(1));
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_capacity_exceeded_leaves_count_at_capacity() {
        let store = store_with(3);
        for id in 0..3 {
            store.create(AircraftId(id), Vector3::zeros(), Vector3::zeros()).unwrap();
        }

        let overflow = store.create(AircraftId(99), Vector3::zeros(), Vector3::zeros());
        assert_eq!(overflow, Err(StoreError::CapacityExceeded { capacity: 3 }));
        assert_eq!(store.count(), 3);
        assert!(store.find(AircraftId(99)).is_none());
    }

    #[test]
    fn test_store_does_not_deduplicate_ids() {
        let store = store_with(4);
        store.create(AircraftId(1), Vector3::zeros(), Vector3::zeros()).unwrap();
        store.create(AircraftId(1), Vector3::zeros(), Vector3::zeros()).unwrap();
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_stage_command_sets_mailbox() {
        let store = store_with(4);
        let slot = store.create(AircraftId(5), Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0)).unwrap();

        store.stage_command(AircraftId(5), Vector3::new(0.0, 2.0, 0.0)).unwrap();

        let record = store.with_aircraft(slot, |r| *r).unwrap();
        assert!(record.pending_command);
        assert_eq!(record.requested_velocity, Vector3::new(0.0, 2.0, 0.0));
        // Velocity only changes when the agent consumes the command
        assert_eq!(record.velocity, Vector3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_stage_command_unknown_or_inactive() {
        let store = store_with(4);
        let a = store.create(AircraftId(1), Vector3::zeros(), Vector3::zeros()).unwrap();
        let b = store.create(AircraftId(2), Vector3::zeros(), Vector3::zeros()).unwrap();

        assert_eq!(
            store.stage_command(AircraftId(3), Vector3::zeros()),
            Err(StoreError::NotFound(AircraftId(3)))
        );

        assert!(store.deactivate_pair(a, b));
        assert_eq!(
            store.stage_command(AircraftId(1), Vector3::zeros()),
            Err(StoreError::NotFound(AircraftId(1)))
        );
        assert!(!store.snapshot()[0].pending_command);
    }

    #[test]
    fn test_stage_command_skips_retired_duplicate() {
        // A retired id stays in its slot; a later aircraft may reuse the id
        let store = store_with(4);
        let a = store.create(AircraftId(1), Vector3::zeros(), Vector3::zeros()).unwrap();
        let b = store.create(AircraftId(2), Vector3::zeros(), Vector3::zeros()).unwrap();
        store.deactivate_pair(a, b);
        let c = store.create(AircraftId(1), Vector3::zeros(), Vector3::zeros()).unwrap();

        store.stage_command(AircraftId(1), Vector3::new(0.0, 0.0, 1.0)).unwrap();
        assert_eq!(store.find(AircraftId(1)).map(|(slot, _)| slot), Some(c));
        assert!(store.snapshot()[c.index()].pending_command);
    }

    #[test]
    fn test_with_aircraft_invalid_slot() {
        let store = store_with(4);
        assert_eq!(
            store.with_aircraft(SlotIndex(0), |_| ()),
            Err(StoreError::InvalidSlot(SlotIndex(0)))
        );
    }

    #[test]
    fn test_deactivate_pair_is_idempotent() {
        let store = store_with(4);
        let a = store.create(AircraftId(1), Vector3::zeros(), Vector3::zeros()).unwrap();
        let b = store.create(AircraftId(2), Vector3::zeros(), Vector3::zeros()).unwrap();
        let c = store.create(AircraftId(3), Vector3::zeros(), Vector3::zeros()).unwrap();

        assert!(store.deactivate_pair(a, b));
        let after_first = store.snapshot();

        assert!(!store.deactivate_pair(a, b));
        assert!(!store.deactivate_pair(b, a));
        assert_eq!(store.snapshot(), after_first);

        // One side already retired: the other side is left alone
        assert!(!store.deactivate_pair(a, c));
        assert!(store.snapshot()[c.index()].active);
        assert_eq!(store.active_count(), 1);
    }

    #[test]
    fn test_deactivate_pair_rejects_self_and_invalid() {
        let store = store_with(4);
        let a = store.create(AircraftId(1), Vector3::zeros(), Vector3::zeros()).unwrap();

        assert!(!store.deactivate_pair(a, a));
        assert!(!store.deactivate_pair(a, SlotIndex(3)));
        assert!(store.snapshot()[0].active);
    }

    #[test]
    fn test_snapshot_never_tears_records() {
        // Writers keep x == y == z; a torn copy would break the equality
        let store = store_with(8);
        for id in 0..8 {
            store.create(AircraftId(id), Vector3::zeros(), Vector3::zeros()).unwrap();
        }

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let store = store.clone();
                thread::spawn(move || {
                    for step in 0..2_000 {
                        let slot = SlotIndex((w * 2 + step % 2) as usize);
                        store
                            .with_aircraft(slot, |r| {
                                let v = r.position.x + 1.0;
                                r.position = Vector3::new(v, v, v);
                            })
                            .unwrap();
                    }
                })
            })
            .collect();

        for _ in 0..500 {
            for record in store.snapshot() {
                assert_eq!(record.position.x, record.position.y);
                assert_eq!(record.position.y, record.position.z);
            }
        }

        for writer in writers {
            writer.join().unwrap();
        }

        let total: f32 = store.snapshot().iter().map(|r| r.position.x).sum();
        assert_eq!(total, 8_000.0);
    }

    #[test]
    fn test_encode_region_uses_store_schema() {
        let schema = AirspaceSchema::with_capacity(6);
        let store = AirspaceStore::new(schema);
        store.create(AircraftId(1), Vector3::new(1.0, 2.0, 3.0), Vector3::zeros()).unwrap();

        let image = store.encode_region().unwrap();
        let attached = schema.attach(&image).unwrap();
        assert_eq!(attached, store.snapshot());
    }
}
