use std::sync::Arc;
use std::sync::atomic::Ordering;

use dashmap::mapref::entry::Entry;
use tokio::sync::RwLock;
use tracing::{debug, info};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::observability;

use super::conflict::{now_ms, validate, Validated};
use super::{Engine, EngineError, SharedRoomState};

impl Engine {
    pub async fn create_room(&self, name: &str) -> Result<RoomInfo, EngineError> {
        let name = checked_room_name(name)?;
        if self.rooms.len() >= MAX_ROOMS {
            return Err(EngineError::LimitExceeded("too many rooms"));
        }

        let id = Ulid::new();
        match self.room_names.entry(name.to_string()) {
            Entry::Occupied(_) => return Err(EngineError::RoomNameTaken(name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }
        let seq = self.room_seq.fetch_add(1, Ordering::Relaxed);
        let rs = RoomState::new(id, seq, name.to_string());
        self.rooms.insert(id, Arc::new(RwLock::new(rs)));

        metrics::gauge!(observability::ROOMS_ACTIVE).set(self.rooms.len() as f64);
        info!(room_id = %id, name, "room created");
        Ok(RoomInfo {
            id,
            name: name.to_string(),
        })
    }

    /// Renaming a room to its current name succeeds without change.
    pub async fn rename_room(&self, id: Ulid, name: &str) -> Result<RoomInfo, EngineError> {
        let name = checked_room_name(name)?;
        let rs = self
            .get_room(&id)
            .ok_or_else(|| EngineError::RoomNotFound(id.to_string()))?;
        let mut guard = rs.write().await;
        if !self.rooms.contains_key(&id) {
            // deleted while we waited for the lock
            return Err(EngineError::RoomNotFound(id.to_string()));
        }

        if guard.name != name {
            match self.room_names.entry(name.to_string()) {
                Entry::Occupied(owner) if *owner.get() != id => {
                    return Err(EngineError::RoomNameTaken(name.to_string()));
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(id);
                }
            }
            self.room_names.remove_if(&guard.name, |_, owner| *owner == id);
            info!(room_id = %id, from = %guard.name, to = name, "room renamed");
            guard.name = name.to_string();
        }

        Ok(RoomInfo {
            id,
            name: guard.name.clone(),
        })
    }

    /// Delete a room together with its reservations. Returns how many
    /// reservations went with it.
    pub async fn delete_room(&self, id: Ulid) -> Result<usize, EngineError> {
        let rs = self
            .get_room(&id)
            .ok_or_else(|| EngineError::RoomNotFound(id.to_string()))?;
        let guard = rs.write().await;
        if !self.detach_room(&guard) {
            return Err(EngineError::RoomNotFound(id.to_string()));
        }
        let dropped = guard.reservations.len();

        metrics::gauge!(observability::ROOMS_ACTIVE).set(self.rooms.len() as f64);
        metrics::gauge!(observability::RESERVATIONS_ACTIVE)
            .set(self.reservation_to_room.len() as f64);
        info!(room_id = %id, dropped, "room deleted");
        Ok(dropped)
    }

    pub async fn create_reservation(&self, request: &ReservationRequest) -> Result<Reservation, EngineError> {
        self.create_reservation_at(request, now_ms()).await
    }

    /// Same as [`Engine::create_reservation`] with the clock pinned to `now`.
    pub async fn create_reservation_at(
        &self,
        request: &ReservationRequest,
        now: Ms,
    ) -> Result<Reservation, EngineError> {
        let result = self.try_create_reservation(request, now).await;
        match &result {
            Ok(r) => {
                metrics::counter!(observability::RESERVATIONS_CREATED_TOTAL).increment(1);
                metrics::gauge!(observability::RESERVATIONS_ACTIVE)
                    .set(self.reservation_to_room.len() as f64);
                info!(
                    reservation_id = %r.id,
                    room_id = %r.room_id,
                    start = r.span.start,
                    end = r.span.end,
                    "reservation created"
                );
            }
            Err(e) => {
                metrics::counter!(observability::RESERVATIONS_REJECTED_TOTAL, "reason" => e.reason())
                    .increment(1);
                debug!(reason = e.reason(), "reservation rejected: {e}");
            }
        }
        result
    }

    async fn try_create_reservation(
        &self,
        request: &ReservationRequest,
        now: Ms,
    ) -> Result<Reservation, EngineError> {
        let room = request.room_id.as_deref().and_then(|raw| self.resolve_room(raw));
        let Some(room) = room else {
            // No lock to take; let the validator name the first failing rule.
            let unlocked = validate(
                request,
                self,
                std::iter::empty::<&Reservation>(),
                now,
                &self.policy,
            );
            return Err(match unlocked {
                Err(e) => e,
                Ok(v) => EngineError::RoomNotFound(v.room_id.to_string()),
            });
        };

        let mut guard = room.write().await;
        let Validated { room_id, span } =
            validate(request, self, &guard.reservations, now, &self.policy)?;
        debug_assert_eq!(room_id, guard.id);
        if guard.reservations.len() >= MAX_RESERVATIONS_PER_ROOM {
            return Err(EngineError::LimitExceeded("too many reservations on room"));
        }

        let reservation = Reservation {
            id: Ulid::new(),
            room_id,
            span,
        };
        guard.insert_reservation(reservation.clone());
        self.reservation_to_room.insert(reservation.id, room_id);
        Ok(reservation)
    }

    /// Remove a reservation. A second cancel of the same id is `NotFound`.
    pub async fn cancel_reservation(&self, id: Ulid) -> Result<Reservation, EngineError> {
        let (room_id, mut guard) = self.resolve_reservation_write(&id).await?;
        // The index entry is gone if the room was deleted while we waited.
        if self.reservation_to_room.remove(&id).is_none() {
            return Err(EngineError::NotFound(id));
        }
        let removed = guard
            .remove_reservation(id)
            .ok_or(EngineError::NotFound(id))?;

        metrics::counter!(observability::RESERVATIONS_CANCELLED_TOTAL).increment(1);
        metrics::gauge!(observability::RESERVATIONS_ACTIVE)
            .set(self.reservation_to_room.len() as f64);
        info!(reservation_id = %id, room_id = %room_id, "reservation cancelled");
        Ok(removed)
    }

    /// Drop every reservation, keeping the rooms.
    pub async fn reset_reservations(&self) {
        for rs in self.room_handles() {
            let mut guard = rs.write().await;
            for r in guard.reservations.drain(..) {
                self.reservation_to_room.remove(&r.id);
            }
        }
        metrics::gauge!(observability::RESERVATIONS_ACTIVE).set(0.0);
        info!("reservations reset");
    }

    /// Drop every room and, with them, every reservation.
    pub async fn reset_rooms(&self) {
        for rs in self.room_handles() {
            let guard = rs.write().await;
            self.detach_room(&guard);
        }
        metrics::gauge!(observability::ROOMS_ACTIVE).set(self.rooms.len() as f64);
        metrics::gauge!(observability::RESERVATIONS_ACTIVE)
            .set(self.reservation_to_room.len() as f64);
        info!("rooms reset");
    }

    /// Unlink a locked room from every index. False if it was already gone.
    fn detach_room(&self, rs: &RoomState) -> bool {
        if self.rooms.remove(&rs.id).is_none() {
            return false;
        }
        self.room_names.remove_if(&rs.name, |_, owner| *owner == rs.id);
        for r in &rs.reservations {
            self.reservation_to_room.remove(&r.id);
        }
        true
    }

    /// Snapshot of the room handles; no map shard stays locked across awaits.
    pub(super) fn room_handles(&self) -> Vec<SharedRoomState> {
        self.rooms.iter().map(|e| e.value().clone()).collect()
    }
}

fn checked_room_name(name: &str) -> Result<&str, EngineError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::RoomNameRequired);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(EngineError::LimitExceeded("room name too long"));
    }
    Ok(name)
}
