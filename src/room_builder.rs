//! On-demand generation of rooms outside the rasterized island.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::biomes::{WhittakerGridLocation, MAX_ELEVATION};
use crate::room::{Coord, Room, Water};
use crate::store::{RoomStore, StoreError, WhittakerStore};

/// Neighbors within this many cells in x and y constrain a new room.
pub const NEIGHBOR_DISTANCE: i64 = 2;
/// Largest bucket difference allowed against any neighbor.
pub const CHANGE_TOLERANCE: i32 = 1;

/// Grows the world one room at a time, keeping each new room's elevation and
/// moisture close to the rooms already around it.
pub struct RoomBuilder<'a> {
    rooms: &'a dyn RoomStore,
    whittaker: &'a dyn WhittakerStore,
    spring_frequency: f64,
}

impl<'a> RoomBuilder<'a> {
    pub fn new(rooms: &'a dyn RoomStore, whittaker: &'a dyn WhittakerStore, spring_frequency: f64) -> Self {
        Self { rooms, whittaker, spring_frequency }
    }

    /// The room at `coord`, creating it if needed. `None` means no biome fits
    /// between the neighbors; nothing is stored in that case.
    pub fn generate_room<R: Rng + ?Sized>(&self, coord: Coord, rng: &mut R) -> Result<Option<Room>, StoreError> {
        if let Some(room) = self.rooms.find_by_coordinate(coord)? {
            return Ok(Some(room));
        }

        let Some(room) = self.random_room(coord, rng)? else {
            debug!(%coord, "no valid biomes for room");
            return Ok(None);
        };

        // Someone else may have created the room since the lookup above.
        self.rooms.insert_if_absent(room).map(Some)
    }

    fn random_room<R: Rng + ?Sized>(&self, coord: Coord, rng: &mut R) -> Result<Option<Room>, StoreError> {
        let mut candidates = self.whittaker.find_all()?;
        let around = |v: i64| v.saturating_sub(NEIGHBOR_DISTANCE)..=v.saturating_add(NEIGHBOR_DISTANCE);
        let neighbors = self.rooms.find_in_bounding_box(around(coord.x), around(coord.y), coord.z..=coord.z)?;

        for neighbor in &neighbors {
            candidates.retain(|candidate| fits_beside(candidate, neighbor));
        }

        let Some(choice) = candidates.choose(rng) else {
            return Ok(None);
        };

        let mut room = Room::new(coord, choice.biome.clone(), choice.elevation, choice.moisture);
        if room.elevation == MAX_ELEVATION && rng.gen::<f64>() < self.spring_frequency {
            room.water = Some(Water::spring());
        }
        Ok(Some(room))
    }
}

/// A candidate fits when it is within tolerance of the neighbor on both axes
/// and not at the tolerance on both at once.
pub fn fits_beside(candidate: &WhittakerGridLocation, neighbor: &Room) -> bool {
    let elevation_diff = (neighbor.elevation - candidate.elevation).abs();
    let moisture_diff = (neighbor.moisture - candidate.moisture).abs();
    !(elevation_diff > CHANGE_TOLERANCE
        || moisture_diff > CHANGE_TOLERANCE
        || (elevation_diff == CHANGE_TOLERANCE && moisture_diff == CHANGE_TOLERANCE))
}
