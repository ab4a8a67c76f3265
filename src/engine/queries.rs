use ulid::Ulid;

use crate::model::*;

use super::Engine;

impl Engine {
    /// All rooms in creation order.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut rooms = Vec::with_capacity(self.rooms.len());
        for rs in self.room_handles() {
            let guard = rs.read().await;
            let info = RoomInfo {
                id: guard.id,
                name: guard.name.clone(),
            };
            rooms.push((guard.seq, info));
        }
        rooms.sort_by_key(|(seq, _)| *seq);
        rooms.into_iter().map(|(_, info)| info).collect()
    }

    pub async fn get_room_info(&self, id: Ulid) -> Option<RoomInfo> {
        let rs = self.get_room(&id)?;
        let guard = rs.read().await;
        Some(RoomInfo {
            id: guard.id,
            name: guard.name.clone(),
        })
    }

    /// Reservations of a room in booking order. Unknown rooms have none.
    pub async fn list_reservations(&self, room_id: &str) -> Vec<Reservation> {
        let rs = match self.resolve_room(room_id) {
            Some(rs) => rs,
            None => return vec![],
        };
        let guard = rs.read().await;
        guard.reservations.clone()
    }

    pub async fn get_reservation(&self, id: Ulid) -> Option<Reservation> {
        let room_id = self.get_room_for_reservation(&id)?;
        let rs = self.get_room(&room_id)?;
        let guard = rs.read().await;
        guard.reservations.iter().find(|r| r.id == id).cloned()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn reservation_count(&self) -> usize {
        self.reservation_to_room.len()
    }
}
