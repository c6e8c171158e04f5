//! World generation pipeline
//!
//! Runs every stage in order, from site sampling to room persistence, and
//! bundles the results for callers and tools.

use std::path::PathBuf;

use rand::Rng;
use tracing::{info, warn};

use crate::biomes::{assign_biomes, classifier_names};
use crate::config::WorldConfig;
use crate::elevation::{
    assign_corner_elevations, assign_ocean_coast_and_land, assign_polygon_elevations, redistribute_elevations,
};
use crate::error::GenerationError;
use crate::geometry::Bounds;
use crate::graph::{build_diagram, build_graph, improve_corners, relax_sites, sample_sites, Center, Graph};
use crate::island::{assign_corner_water, IslandShape};
use crate::materialize::{materialize_rooms, MaterializeSummary};
use crate::moisture::{assign_corner_moisture, assign_polygon_moisture, redistribute_moisture};
use crate::raster::{export_map, rasterize, Raster};
use crate::rivers::{calculate_downslopes, create_rivers};
use crate::room::Coord;
use crate::room_builder::RoomBuilder;
use crate::seeds::WorldSeeds;
use crate::store::{BiomeStore, RoomStore, StoreError, WhittakerStore};

/// The classified graph and its raster, before any room exists.
pub struct IslandMap {
    /// Seeds used for generation (allows recreation)
    pub seeds: WorldSeeds,
    pub graph: Graph,
    pub raster: Raster,
}

impl IslandMap {
    pub fn seed(&self) -> u64 {
        self.seeds.master
    }

    /// The polygon drawn at raster pixel `(x, y)`.
    pub fn center_at(&self, x: u32, y: u32) -> Option<&Center> {
        if x >= self.raster.width() || y >= self.raster.height() {
            return None;
        }
        self.raster.owner(x, y).map(|id| self.graph.center(id))
    }
}

/// Everything one full build produced.
pub struct WorldData {
    pub island: IslandMap,
    /// Where the diagnostic map was written, if it was
    pub map_path: Option<PathBuf>,
    pub rooms: MaterializeSummary,
}

/// Fail fast on anything that would stop the pipeline halfway.
pub fn check_inputs(config: &WorldConfig, biomes: &dyn BiomeStore) -> Result<(), GenerationError> {
    config.validate()?;
    let all = biomes.find_all()?;
    if all.is_empty() {
        return Err(GenerationError::EmptyBiomeTable);
    }
    let required = classifier_names().into_iter().chain(std::iter::once(config.default_biome.as_str()));
    for name in required {
        if !all.iter().any(|b| b.name == name) {
            return Err(GenerationError::MissingBiome(name.to_string()));
        }
    }
    Ok(())
}

/// Build, classify and rasterize the island described by `config`.
pub fn build_island(config: &WorldConfig, biomes: &dyn BiomeStore) -> Result<IslandMap, GenerationError> {
    check_inputs(config, biomes)?;
    let seeds = WorldSeeds::from_master(config.seed);
    let bounds = Bounds::square(config.extent as f64);
    info!(
        seed = config.seed,
        sites = config.site_count,
        extent = config.extent,
        lloyds = config.lloyd_iterations,
        island = %config.island_shape,
        "Generating island..."
    );

    let sites = sample_sites(&mut seeds.sites_rng(), config.site_count, &bounds);
    let diagram = build_diagram(&sites, &bounds)?;
    let diagram = relax_sites(diagram, &bounds, config.lloyd_iterations)?;
    let mut graph = build_graph(&diagram, &bounds);
    improve_corners(&mut graph);

    let shape = IslandShape::new(config.island_shape, &mut seeds.island_rng());
    assign_corner_water(&mut graph, &shape);
    assign_corner_elevations(&mut graph);
    assign_ocean_coast_and_land(&mut graph, config.water_threshold);
    redistribute_elevations(&mut graph);
    assign_polygon_elevations(&mut graph);

    calculate_downslopes(&mut graph);
    create_rivers(&mut graph, &mut seeds.rivers_rng(), config.extent as usize / 2);

    assign_corner_moisture(&mut graph);
    redistribute_moisture(&mut graph);
    assign_polygon_moisture(&mut graph);
    assign_biomes(&mut graph, biomes)?;

    let raster = rasterize(&mut graph, biomes)?;
    Ok(IslandMap { seeds, graph, raster })
}

/// Full build: island, diagnostic map, then one room per pixel.
pub fn generate_world(
    config: &WorldConfig,
    biomes: &dyn BiomeStore,
    rooms: &dyn RoomStore,
) -> Result<WorldData, GenerationError> {
    let island = build_island(config, biomes)?;

    let map_path = config.map_dir.as_ref().and_then(|dir| {
        match export_map(&island.raster.image, dir, &config.map_file_name()) {
            Ok(path) => {
                info!(path = %path.display(), "map exported");
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, dir = %dir.display(), "unable to export map as PNG image");
                None
            }
        }
    });

    let summary = materialize_rooms(&island.raster, &island.graph, biomes, rooms, config.z, &config.default_biome)?;
    Ok(WorldData { island, map_path, rooms: summary })
}

/// Rooms created and refused while growing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrowSummary {
    pub created: usize,
    pub blocked: usize,
}

/// Grow `rings` rings of rooms around the generated square, innermost ring
/// first, with the incremental builder.
pub fn grow_around<R: Rng + ?Sized>(
    config: &WorldConfig,
    rooms: &dyn RoomStore,
    whittaker: &dyn WhittakerStore,
    rings: u32,
    rng: &mut R,
) -> Result<GrowSummary, StoreError> {
    info!(rings, "Growing rooms around the island...");
    let builder = RoomBuilder::new(rooms, whittaker, config.spring_frequency);
    let extent = config.extent as i64;
    let mut summary = GrowSummary::default();

    for ring in 1..=rings as i64 {
        for coord in ring_coords(-ring, extent - 1 + ring, config.z) {
            if rooms.find_by_coordinate(coord)?.is_some() {
                continue;
            }
            match builder.generate_room(coord, rng)? {
                Some(_) => summary.created += 1,
                None => summary.blocked += 1,
            }
        }
    }
    info!(created = summary.created, blocked = summary.blocked, "rooms grown");
    Ok(summary)
}

/// The square ring with corners `(lo, lo)` and `(hi, hi)`, clockwise from
/// the bottom-left corner.
fn ring_coords(lo: i64, hi: i64, z: i64) -> Vec<Coord> {
    let mut coords = Vec::new();
    for y in lo..hi {
        coords.push(Coord::new(lo, y, z));
    }
    for x in lo..hi {
        coords.push(Coord::new(x, hi, z));
    }
    for y in (lo + 1..=hi).rev() {
        coords.push(Coord::new(hi, y, z));
    }
    for x in (lo + 1..=hi).rev() {
        coords.push(Coord::new(x, lo, z));
    }
    coords
}
