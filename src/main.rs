use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use island_world::config::{IslandShapeKind, WorldConfig};
use island_world::logging::init_logging;
use island_world::store::{BiomeRegistry, MemoryRoomStore, RoomStore, WhittakerTable};
use island_world::world::{generate_world, grow_around};

#[derive(Parser, Debug)]
#[command(name = "island_world")]
#[command(about = "Generate a polygonal island and fill it with rooms")]
struct Args {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of Voronoi sites
    #[arg(long)]
    sites: Option<usize>,

    /// Side length of the square world, in rooms
    #[arg(short, long)]
    extent: Option<u32>,

    /// Lloyd relaxation passes
    #[arg(long)]
    lloyds: Option<usize>,

    /// Chance of a spring on grown mountain rooms
    #[arg(long)]
    spring_frequency: Option<f64>,

    /// Island shape: radial or perlin
    #[arg(short, long)]
    island: Option<IslandShapeKind>,

    /// Directory for the PNG map
    #[arg(long)]
    map_dir: Option<PathBuf>,

    /// Skip writing the PNG map
    #[arg(long)]
    no_map: bool,

    /// Biome table JSON (built-in table if not specified)
    #[arg(long)]
    biomes: Option<PathBuf>,

    /// Write every room to this JSON file when done
    #[arg(long)]
    rooms_out: Option<PathBuf>,

    /// Grow this many rings of rooms around the island
    #[arg(long, default_value = "0")]
    grow: u32,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(Some(&args.log_level));

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => WorldConfig::load(path)?,
        None => WorldConfig::default(),
    };
    // Without a seed or config file, every run is a new world.
    config.seed = match (args.seed, &args.config) {
        (Some(seed), _) => seed,
        (None, Some(_)) => config.seed,
        (None, None) => rand::random(),
    };
    if let Some(sites) = args.sites {
        config.site_count = sites;
    }
    if let Some(extent) = args.extent {
        config.extent = extent;
    }
    if let Some(lloyds) = args.lloyds {
        config.lloyd_iterations = lloyds;
    }
    if let Some(frequency) = args.spring_frequency {
        config.spring_frequency = frequency;
    }
    if let Some(island) = args.island {
        config.island_shape = island;
    }
    if let Some(dir) = args.map_dir {
        config.map_dir = Some(dir);
    }
    if args.no_map {
        config.map_dir = None;
    }

    let biomes = match &args.biomes {
        Some(path) => BiomeRegistry::load(path)?,
        None => BiomeRegistry::default(),
    };
    let rooms = MemoryRoomStore::new();

    info!("Generating island with seed: {}", config.seed);
    let world = generate_world(&config, &biomes, &rooms)?;
    info!(
        rooms = world.rooms.rooms,
        rows = world.rooms.rows,
        fallbacks = world.rooms.fallbacks,
        "island complete"
    );

    if args.grow > 0 {
        let whittaker = WhittakerTable::from_biomes(&biomes)?;
        let summary = grow_around(&config, &rooms, &whittaker, args.grow, &mut world.island.seeds.rooms_rng())?;
        info!(created = summary.created, blocked = summary.blocked, "growth complete");
    }

    if let Some(path) = &args.rooms_out {
        rooms.save_to(path)?;
        info!(path = %path.display(), rooms = rooms.count()?, "rooms saved");
    }

    Ok(())
}
