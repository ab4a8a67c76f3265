mod conflict;
mod error;
mod mutations;
mod queries;

pub use conflict::{validate, DurationPolicy, RoomDirectory, Validated};
pub use error::EngineError;

use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use dashmap::DashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::model::*;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

/// Rooms and their reservations.
///
/// Each room sits behind its own lock. Create and cancel hold the room's
/// write lock for the whole read-validate-write sequence, so the overlap
/// check never runs against a stale view of that room.
pub struct Engine {
    pub(super) rooms: DashMap<Ulid, SharedRoomState>,
    /// name → room id; entry API keeps name checks atomic with the insert.
    pub(super) room_names: DashMap<String, Ulid>,
    /// Reverse lookup: reservation id → room id
    pub(super) reservation_to_room: DashMap<Ulid, Ulid>,
    /// Next room creation sequence number.
    pub(super) room_seq: AtomicU64,
    pub(super) policy: DurationPolicy,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DurationPolicy::disabled())
    }
}

impl Engine {
    pub fn new(policy: DurationPolicy) -> Self {
        Self {
            rooms: DashMap::new(),
            room_names: DashMap::new(),
            reservation_to_room: DashMap::new(),
            room_seq: AtomicU64::new(0),
            policy,
        }
    }

    pub fn policy(&self) -> &DurationPolicy {
        &self.policy
    }

    pub fn get_room(&self, id: &Ulid) -> Option<SharedRoomState> {
        self.rooms.get(id).map(|e| e.value().clone())
    }

    pub fn get_room_for_reservation(&self, reservation_id: &Ulid) -> Option<Ulid> {
        self.reservation_to_room.get(reservation_id).map(|e| *e.value())
    }

    /// Look up a room from an untrusted id string.
    pub(super) fn resolve_room(&self, raw: &str) -> Option<SharedRoomState> {
        Ulid::from_string(raw.trim()).ok().and_then(|id| self.get_room(&id))
    }

    /// Lookup reservation → room, get room, acquire write lock.
    pub(super) async fn resolve_reservation_write(
        &self,
        reservation_id: &Ulid,
    ) -> Result<(Ulid, tokio::sync::OwnedRwLockWriteGuard<RoomState>), EngineError> {
        let room_id = self
            .get_room_for_reservation(reservation_id)
            .ok_or(EngineError::NotFound(*reservation_id))?;
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(*reservation_id))?;
        let guard = rs.write_owned().await;
        Ok((room_id, guard))
    }
}

impl RoomDirectory for Engine {
    fn room_exists(&self, id: &Ulid) -> bool {
        self.rooms.contains_key(id)
    }
}
