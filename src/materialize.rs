//! Turn the rasterized map into one room per pixel.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::biomes::{elevation_bucket, moisture_bucket, Biome, MAX_MOISTURE};
use crate::error::GenerationError;
use crate::graph::Graph;
use crate::raster::Raster;
use crate::room::{Coord, Room};
use crate::store::{BiomeStore, RoomStore};

/// Rows assembled in parallel before they are saved.
const ROW_BATCH: usize = 32;

/// Buckets for pixels no polygon owns: open water.
const UNOWNED_BUCKETS: (i32, i32) = (1, MAX_MOISTURE);

/// What one materialization pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaterializeSummary {
    pub rooms: usize,
    pub rows: usize,
    /// Pixels whose color matched no biome.
    pub fallbacks: usize,
}

/// Create a room for every pixel of `raster` on layer `z`.
///
/// Pixel column `x` becomes room `x`; pixel row `r` becomes room
/// `y = height - 1 - r`. Biomes come from the pixel color, falling back to
/// `default_biome`. Rows are saved one `save_all` call each, top row first.
pub fn materialize_rooms(
    raster: &Raster,
    graph: &Graph,
    biomes: &dyn BiomeStore,
    rooms: &dyn RoomStore,
    z: i64,
    default_biome: &str,
) -> Result<MaterializeSummary, GenerationError> {
    info!("Materializing rooms...");
    let by_color: HashMap<u32, Biome> = biomes.find_all()?.into_iter().map(|b| (b.color, b)).collect();
    let fallback = biomes
        .find_by_name(default_biome)?
        .ok_or_else(|| GenerationError::MissingBiome(default_biome.to_string()))?;
    let buckets: Vec<(i32, i32)> = graph
        .centers
        .iter()
        .map(|c| (elevation_bucket(c.elevation), moisture_bucket(c.moisture)))
        .collect();

    let height = raster.height() as usize;
    let mut summary = MaterializeSummary::default();

    for batch_start in (0..height).step_by(ROW_BATCH) {
        let batch_end = (batch_start + ROW_BATCH).min(height);
        let batch: Vec<(Vec<Room>, usize)> = (batch_start..batch_end)
            .into_par_iter()
            .map(|row| build_row(raster, row, z, &by_color, &fallback, &buckets))
            .collect();

        for (offset, (row_rooms, fallbacks)) in batch.into_iter().enumerate() {
            let count = row_rooms.len();
            rooms.save_all(row_rooms)?;
            summary.rooms += count;
            summary.rows += 1;
            summary.fallbacks += fallbacks;
            debug!(count, row = batch_start + offset + 1, of = height, "saved rooms");
        }
    }

    if summary.fallbacks > 0 {
        debug!(fallbacks = summary.fallbacks, biome = default_biome, "pixels fell back to the default biome");
    }
    info!(rooms = summary.rooms, rows = summary.rows, "rooms materialized");
    Ok(summary)
}

fn build_row(
    raster: &Raster,
    row: usize,
    z: i64,
    by_color: &HashMap<u32, Biome>,
    fallback: &Biome,
    buckets: &[(i32, i32)],
) -> (Vec<Room>, usize) {
    let y = raster.height() as i64 - 1 - row as i64;
    let mut fallbacks = 0usize;

    let rooms = raster
        .owners
        .row(row)
        .iter()
        .enumerate()
        .map(|(x, &owner)| {
            let color = Biome::color_from_rgb(raster.image.get_pixel(x as u32, row as u32).0);
            let biome = match by_color.get(&color) {
                Some(biome) => biome.clone(),
                None => {
                    fallbacks += 1;
                    fallback.clone()
                }
            };
            let (elevation, moisture) = buckets.get(owner as usize).copied().unwrap_or(UNOWNED_BUCKETS);
            Room::new(Coord::new(x as i64, y, z), biome, elevation, moisture)
        })
        .collect();
    (rooms, fallbacks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::open_cell;
    use crate::raster::rasterize;
    use crate::store::{BiomeRegistry, MemoryRoomStore, StoreError};
    use image::Rgb;
    use std::ops::RangeInclusive;
    use std::sync::Mutex;

    /// Records the size of each batch it is handed.
    #[derive(Default)]
    struct BatchRecorder {
        inner: MemoryRoomStore,
        batches: Mutex<Vec<Vec<Coord>>>,
    }

    impl RoomStore for BatchRecorder {
        fn find_by_coordinate(&self, coord: Coord) -> Result<Option<Room>, StoreError> {
            self.inner.find_by_coordinate(coord)
        }

        fn find_in_bounding_box(
            &self,
            x: RangeInclusive<i64>,
            y: RangeInclusive<i64>,
            z: RangeInclusive<i64>,
        ) -> Result<Vec<Room>, StoreError> {
            self.inner.find_in_bounding_box(x, y, z)
        }

        fn save(&self, room: Room) -> Result<(), StoreError> {
            self.inner.save(room)
        }

        fn save_all(&self, rooms: Vec<Room>) -> Result<(), StoreError> {
            self.batches.lock().unwrap().push(rooms.iter().map(|r| r.coord).collect());
            self.inner.save_all(rooms)
        }

        fn insert_if_absent(&self, room: Room) -> Result<Room, StoreError> {
            self.inner.insert_if_absent(room)
        }

        fn count(&self) -> Result<usize, StoreError> {
            self.inner.count()
        }
    }

    fn classified_open_cell() -> (Graph, Raster) {
        let mut graph = open_cell();
        graph.centers[0].biome = Some("Snow".to_string());
        graph.centers[0].elevation = 0.9;
        graph.centers[0].moisture = 0.5;
        let raster = rasterize(&mut graph, &BiomeRegistry::default()).unwrap();
        (graph, raster)
    }

    #[test]
    fn test_one_room_per_pixel_in_row_order() {
        let (graph, raster) = classified_open_cell();
        let store = BatchRecorder::default();

        let summary = materialize_rooms(&raster, &graph, &BiomeRegistry::default(), &store, 3, "Ocean").unwrap();

        assert_eq!(summary.rooms, 100);
        assert_eq!(summary.rows, 10);
        assert_eq!(store.count().unwrap(), 100);

        let batches = store.batches.lock().unwrap();
        assert_eq!(batches.len(), 10);
        for (row, batch) in batches.iter().enumerate() {
            assert_eq!(batch.len(), 10);
            assert!(batch.iter().all(|c| c.y == 9 - row as i64 && c.z == 3));
            assert!(batch.iter().enumerate().all(|(x, c)| c.x == x as i64));
        }
    }

    #[test]
    fn test_rows_are_inverted() {
        let (graph, raster) = classified_open_cell();
        let store = MemoryRoomStore::new();
        materialize_rooms(&raster, &graph, &BiomeRegistry::default(), &store, 0, "Ocean").unwrap();

        // Pixel (0, 0) is the top-left of the image, inside the polygon.
        let top_left = store.find_by_coordinate(Coord::new(0, 9, 0)).unwrap().unwrap();
        assert_eq!(top_left.biome.name, "Snow");
        assert_eq!((top_left.elevation, top_left.moisture), (4, 4));

        // Pixel (9, 9) is outside it.
        let bottom_right = store.find_by_coordinate(Coord::new(9, 0, 0)).unwrap().unwrap();
        assert_eq!(bottom_right.biome.name, "Ocean");
        assert_eq!((bottom_right.elevation, bottom_right.moisture), UNOWNED_BUCKETS);
    }

    #[test]
    fn test_unknown_colors_fall_back() {
        let (graph, mut raster) = classified_open_cell();
        raster.image.put_pixel(0, 0, Rgb([1, 2, 3]));
        let store = MemoryRoomStore::new();

        let summary = materialize_rooms(&raster, &graph, &BiomeRegistry::default(), &store, 0, "Beach").unwrap();

        // Every unowned pixel keeps the unclassified color too.
        assert!(summary.fallbacks >= 1);
        let room = store.find_by_coordinate(Coord::new(0, 9, 0)).unwrap().unwrap();
        assert_eq!(room.biome.name, "Beach");
    }

    #[test]
    fn test_missing_default_biome_is_an_error() {
        let (graph, raster) = classified_open_cell();
        let store = MemoryRoomStore::new();
        let result = materialize_rooms(&raster, &graph, &BiomeRegistry::default(), &store, 0, "Swamp");
        assert!(matches!(result, Err(GenerationError::MissingBiome(_))));
        assert_eq!(store.count().unwrap(), 0);
    }
}
