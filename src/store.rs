//! Storage contracts for rooms, biomes and the Whittaker table, with the
//! in-process implementations used by the generator and its tests.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::biomes::{default_biomes, whittaker_grid, Biome, WhittakerGridLocation};
use crate::error::GenerationError;
use crate::room::{Coord, Room};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A writer panicked while holding the lock.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Persistent rooms keyed by coordinate.
pub trait RoomStore: Send + Sync {
    fn find_by_coordinate(&self, coord: Coord) -> Result<Option<Room>, StoreError>;

    /// All rooms inside the inclusive ranges.
    fn find_in_bounding_box(
        &self,
        x: RangeInclusive<i64>,
        y: RangeInclusive<i64>,
        z: RangeInclusive<i64>,
    ) -> Result<Vec<Room>, StoreError>;

    /// Insert or replace.
    fn save(&self, room: Room) -> Result<(), StoreError>;

    /// Insert or replace a batch.
    fn save_all(&self, rooms: Vec<Room>) -> Result<(), StoreError>;

    /// Store `room` unless its coordinate is taken; either way return the room
    /// that ends up stored.
    fn insert_if_absent(&self, room: Room) -> Result<Room, StoreError>;

    fn count(&self) -> Result<usize, StoreError>;
}

pub trait BiomeStore: Send + Sync {
    /// Every biome, sorted by name.
    fn find_all(&self) -> Result<Vec<Biome>, StoreError>;

    fn find_by_name(&self, name: &str) -> Result<Option<Biome>, StoreError>;
}

pub trait WhittakerStore: Send + Sync {
    fn find_all(&self) -> Result<Vec<WhittakerGridLocation>, StoreError>;
}

/// Rooms in a `HashMap` behind an `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryRoomStore {
    rooms: RwLock<HashMap<Coord, Room>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<Coord, Room>>, StoreError> {
        self.rooms.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<Coord, Room>>, StoreError> {
        self.rooms.write().map_err(|_| StoreError::Poisoned)
    }

    /// Write every room as a JSON array, ordered by coordinate.
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        let mut rooms: Vec<Room> = self.read()?.values().cloned().collect();
        rooms.sort_by_key(|room| room.coord);
        let file = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer(file, &rooms)?;
        info!(rooms = rooms.len(), path = %path.display(), "room snapshot written");
        Ok(())
    }

    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        let file = std::io::BufReader::new(std::fs::File::open(path)?);
        let rooms: Vec<Room> = serde_json::from_reader(file)?;
        info!(rooms = rooms.len(), path = %path.display(), "room snapshot loaded");
        Ok(Self { rooms: RwLock::new(rooms.into_iter().map(|room| (room.coord, room)).collect()) })
    }
}

impl RoomStore for MemoryRoomStore {
    fn find_by_coordinate(&self, coord: Coord) -> Result<Option<Room>, StoreError> {
        Ok(self.read()?.get(&coord).cloned())
    }

    fn find_in_bounding_box(
        &self,
        x: RangeInclusive<i64>,
        y: RangeInclusive<i64>,
        z: RangeInclusive<i64>,
    ) -> Result<Vec<Room>, StoreError> {
        let rooms = self.read()?;
        let span = |r: &RangeInclusive<i64>| (*r.end() as i128 - *r.start() as i128 + 1).max(0);
        if span(&x).saturating_mul(span(&y)).saturating_mul(span(&z)) > rooms.len() as i128 {
            let mut found: Vec<Room> = rooms
                .values()
                .filter(|room| x.contains(&room.coord.x) && y.contains(&room.coord.y) && z.contains(&room.coord.z))
                .cloned()
                .collect();
            found.sort_by_key(|room| (room.coord.z, room.coord.y, room.coord.x));
            return Ok(found);
        }

        let mut found: Vec<Room> = Vec::new();
        for rz in z.clone() {
            for ry in y.clone() {
                for rx in x.clone() {
                    if let Some(room) = rooms.get(&Coord::new(rx, ry, rz)) {
                        found.push(room.clone());
                    }
                }
            }
        }
        Ok(found)
    }

    fn save(&self, room: Room) -> Result<(), StoreError> {
        self.write()?.insert(room.coord, room);
        Ok(())
    }

    fn save_all(&self, rooms: Vec<Room>) -> Result<(), StoreError> {
        let count = rooms.len();
        let mut map = self.write()?;
        for room in rooms {
            map.insert(room.coord, room);
        }
        debug!(count, "saved room batch");
        Ok(())
    }

    fn insert_if_absent(&self, room: Room) -> Result<Room, StoreError> {
        let mut map = self.write()?;
        Ok(map.entry(room.coord).or_insert(room).clone())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }
}

/// Biomes keyed by name.
#[derive(Clone, Debug)]
pub struct BiomeRegistry {
    biomes: Vec<Biome>,
}

impl BiomeRegistry {
    pub fn new(mut biomes: Vec<Biome>) -> Self {
        biomes.sort_by(|a, b| a.name.cmp(&b.name));
        Self { biomes }
    }

    /// Read a JSON array of biomes.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = std::fs::read_to_string(path)?;
        let biomes: Vec<Biome> = serde_json::from_str(&text)?;
        info!(biomes = biomes.len(), path = %path.display(), "biomes loaded");
        Ok(Self::new(biomes))
    }

    /// Biome whose color is exactly `color`.
    pub fn by_color(&self) -> HashMap<u32, Biome> {
        self.biomes.iter().map(|b| (b.color, b.clone())).collect()
    }
}

impl Default for BiomeRegistry {
    fn default() -> Self {
        Self::new(default_biomes())
    }
}

impl BiomeStore for BiomeRegistry {
    fn find_all(&self) -> Result<Vec<Biome>, StoreError> {
        Ok(self.biomes.clone())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Biome>, StoreError> {
        Ok(self
            .biomes
            .binary_search_by(|b| b.name.as_str().cmp(name))
            .ok()
            .map(|i| self.biomes[i].clone()))
    }
}

/// Read-only Whittaker table.
#[derive(Clone, Debug, Default)]
pub struct WhittakerTable {
    locations: Vec<WhittakerGridLocation>,
}

impl WhittakerTable {
    pub fn new(locations: Vec<WhittakerGridLocation>) -> Self {
        Self { locations }
    }

    /// The full table over the biomes in `store`.
    pub fn from_biomes(store: &dyn BiomeStore) -> Result<Self, GenerationError> {
        Ok(Self::new(whittaker_grid(store)?))
    }
}

impl WhittakerStore for WhittakerTable {
    fn find_all(&self) -> Result<Vec<WhittakerGridLocation>, StoreError> {
        Ok(self.locations.clone())
    }
}
