//! Debug script to output the island's biomes as ASCII

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};

use island_world::biomes::{BEACH, ICE, LAKE, MARSH, OCEAN, RIVER};
use island_world::config::{IslandShapeKind, WorldConfig};
use island_world::store::BiomeRegistry;
use island_world::world::build_island;

/// One character per biome name.
fn biome_char(name: &str) -> char {
    match name {
        OCEAN => '~',
        LAKE => 'o',
        RIVER => '=',
        BEACH => '.',
        MARSH => 'm',
        ICE => '#',
        "Snow" => '^',
        "Tundra" => 'T',
        "Bare" => 'b',
        "Scorched" => 'x',
        "Taiga" => 'A',
        "Shrubland" => 's',
        "Temperate Desert" => 'd',
        "Temperate Rain Forest" => 'R',
        "Temperate Deciduous Forest" => 'F',
        "Grassland" => 'g',
        "Tropical Rain Forest" => 'r',
        "Tropical Seasonal Forest" => 'f',
        "Subtropical Desert" => ',',
        _ => '?',
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let shape = std::env::args()
        .nth(1)
        .map(|s| s.parse::<IslandShapeKind>())
        .transpose()?
        .unwrap_or_default();
    let config = WorldConfig {
        seed: 12345,
        site_count: 400,
        extent: 96,
        island_shape: shape,
        map_dir: None,
        ..WorldConfig::default()
    };

    let biomes = BiomeRegistry::default();
    let island = build_island(&config, &biomes)?;

    let mut file = BufWriter::new(File::create("biome_debug.txt")?);
    writeln!(file, "=== ISLAND BIOME DEBUG MAP ({0}x{0}) seed={1} island={2} ===", config.extent, island.seed(), shape)?;
    writeln!(file)?;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for y in 0..island.raster.height() {
        let line: String = (0..island.raster.width())
            .map(|x| {
                let name = island
                    .center_at(x, y)
                    .and_then(|c| c.biome.as_deref())
                    .unwrap_or("");
                *counts.entry(name).or_default() += 1;
                biome_char(name)
            })
            .collect();
        writeln!(file, "{}", line)?;
    }

    writeln!(file)?;
    writeln!(file, "=== BIOME HISTOGRAM ===")?;
    let total = (island.raster.width() * island.raster.height()) as f64;
    for (name, count) in &counts {
        let label = if name.is_empty() { "(unowned)" } else { name };
        writeln!(file, "  {} {:<28} {:>6} ({:.1}%)", biome_char(name), label, count, 100.0 * *count as f64 / total)?;
    }

    let rivers = island.graph.edges.iter().filter(|e| e.river > 0).count();
    let land = island.graph.centers.iter().filter(|c| !c.water).count();
    writeln!(file)?;
    writeln!(file, "Polygons: {} ({} land), river edges: {}", island.graph.centers.len(), land, rivers)?;

    println!("Wrote biome_debug.txt");
    Ok(())
}
