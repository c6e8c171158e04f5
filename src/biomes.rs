//! Biome definitions and the Whittaker classification
//!
//! Land polygons are classified by a 4×6 table of elevation and moisture
//! buckets. Water polygons short-circuit to dedicated water biomes first.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::GenerationError;
use crate::graph::{Center, Graph};
use crate::store::BiomeStore;

/// Highest elevation bucket.
pub const MAX_ELEVATION: i32 = 4;
/// Highest moisture bucket.
pub const MAX_MOISTURE: i32 = 6;

pub const OCEAN: &str = "Ocean";
pub const LAKE: &str = "Lake";
pub const BEACH: &str = "Beach";
pub const RIVER: &str = "River";
pub const MARSH: &str = "Marsh";
pub const ICE: &str = "Ice";

/// A named terrain type with a unique map color.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Biome {
    pub name: String,
    /// `0xRRGGBB`
    pub color: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spring_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink_text: Option<String>,
    /// Contains an `[outlets]` placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow_text: Option<String>,
}

impl Biome {
    pub fn new(name: impl Into<String>, color: u32) -> Self {
        Self { name: name.into(), color, spring_text: None, sink_text: None, flow_text: None }
    }

    pub fn with_texts(mut self, spring: Option<&str>, sink: &str, flow: &str) -> Self {
        self.spring_text = spring.map(str::to_string);
        self.sink_text = Some(sink.to_string());
        self.flow_text = Some(flow.to_string());
        self
    }

    pub fn rgb(&self) -> [u8; 3] {
        [(self.color >> 16) as u8, (self.color >> 8) as u8, self.color as u8]
    }

    pub fn color_from_rgb(rgb: [u8; 3]) -> u32 {
        (rgb[0] as u32) << 16 | (rgb[1] as u32) << 8 | rgb[2] as u32
    }

    /// Flow text with the outlet list filled in.
    pub fn describe_flow(&self, outlets: &str) -> Option<String> {
        self.flow_text.as_ref().map(|text| text.replace("[outlets]", outlets))
    }
}

/// The stock biome set: the thirteen Whittaker land biomes plus water.
pub fn default_biomes() -> Vec<Biome> {
    vec![
        Biome::new(OCEAN, 0x444471),
        Biome::new(LAKE, 0x336699),
        Biome::new(BEACH, 0xa09077),
        Biome::new(RIVER, 0x225588),
        Biome::new(MARSH, 0x2f6666),
        Biome::new(ICE, 0x99ffff),
        Biome::new("Snow", 0xffffff).with_texts(
            Some("The snow is melting into a gurgling stream here."),
            "A stream disappears under a sheet of ice here.",
            "A stream flows [outlets] from here.",
        ),
        Biome::new("Tundra", 0xbbbbaa).with_texts(
            Some("A small mountain stream gurgles up from the dirt."),
            "A stream ends here, seeping into the ground.",
            "A stream flows [outlets] from here.",
        ),
        Biome::new("Bare", 0x888888).with_texts(
            Some("A small mountain stream gurgles up from the dirt."),
            "A stream ends here, seeping into the ground.",
            "A stream flows [outlets] from here.",
        ),
        Biome::new("Scorched", 0x555555).with_texts(
            Some("A small stream bubbles up through the rocky ground."),
            "A stream disappears underground beneath the rocks here.",
            "A stream flows [outlets] from here.",
        ),
        Biome::new("Taiga", 0x99aa77).with_texts(
            None,
            "A stream disappears underground beneath the rocks here.",
            "A stream flows [outlets] from here.",
        ),
        Biome::new("Shrubland", 0x889977).with_texts(
            None,
            "A stream disappears here, flowing through the rocks into some underground cavern.",
            "A stream flows [outlets] from here.",
        ),
        Biome::new("Temperate Desert", 0xc9d29b).with_texts(
            None,
            "A stream disappears here, simply absorbed into the dirt.",
            "A stream flows [outlets] from here.",
        ),
        Biome::new("Temperate Rain Forest", 0x448855).with_texts(
            None,
            "A creek flows through here, vanishing into the thick foliage.",
            "A creek flows [outlets] from here.",
        ),
        Biome::new("Temperate Deciduous Forest", 0x679459).with_texts(
            None,
            "A creek flows through here, disappearing down into a cluster of rocks.",
            "A creek flows [outlets] from here.",
        ),
        Biome::new("Grassland", 0x88aa55).with_texts(
            None,
            "A creek ends here, fanning out across the flat, muddy grassland.",
            "A creek flows [outlets] from here.",
        ),
        Biome::new("Subtropical Desert", 0xd2b98b).with_texts(
            None,
            "A river ends here, simply absorbed into the thirsty desert sand.",
            "A river flows [outlets] from here.",
        ),
        Biome::new("Tropical Rain Forest", 0x337755).with_texts(
            None,
            "A river flows down through some hidden underground tunnel here.",
            "A river flows [outlets] from here.",
        ),
        Biome::new("Tropical Seasonal Forest", 0x559944).with_texts(
            None,
            "A river ends here, flowing under a large rock pile.",
            "A river flows [outlets] from here.",
        ),
    ]
}

/// Elevation bucket in `1..=MAX_ELEVATION`.
pub fn elevation_bucket(elevation: f64) -> i32 {
    if elevation < 0.3 {
        1
    } else if elevation < 0.6 {
        2
    } else if elevation < 0.8 {
        3
    } else {
        MAX_ELEVATION
    }
}

/// Moisture bucket in `1..=MAX_MOISTURE`.
pub fn moisture_bucket(moisture: f64) -> i32 {
    ((moisture * MAX_MOISTURE as f64).floor() as i32 + 1).clamp(1, MAX_MOISTURE)
}

/// Whittaker table lookup. Buckets outside range are clamped.
pub fn whittaker_biome_name(elevation: i32, moisture: i32) -> &'static str {
    let e = elevation.clamp(1, MAX_ELEVATION);
    let m = moisture.clamp(1, MAX_MOISTURE);
    match (e, m) {
        (4, 1) => "Scorched",
        (4, 2) => "Bare",
        (4, 3) => "Tundra",
        (4, _) => "Snow",

        (3, 1 | 2) => "Temperate Desert",
        (3, 3 | 4) => "Shrubland",
        (3, _) => "Taiga",

        (2, 1) => "Temperate Desert",
        (2, 2 | 3) => "Grassland",
        (2, 4 | 5) => "Temperate Deciduous Forest",
        (2, _) => "Temperate Rain Forest",

        (_, 1) => "Subtropical Desert",
        (_, 2) => "Grassland",
        (_, 3 | 4) => "Tropical Seasonal Forest",
        _ => "Tropical Rain Forest",
    }
}

/// Biome name for a fully classified polygon.
pub fn classify_center(center: &Center) -> &'static str {
    if center.ocean {
        OCEAN
    } else if center.water {
        if center.elevation < 0.1 {
            MARSH
        } else if center.elevation > 0.8 {
            ICE
        } else {
            LAKE
        }
    } else if center.coast {
        BEACH
    } else {
        whittaker_biome_name(elevation_bucket(center.elevation), moisture_bucket(center.moisture))
    }
}

/// Every name the classifier can produce.
pub fn classifier_names() -> Vec<&'static str> {
    let mut names = vec![OCEAN, LAKE, BEACH, MARSH, ICE];
    for e in 1..=MAX_ELEVATION {
        for m in 1..=MAX_MOISTURE {
            let name = whittaker_biome_name(e, m);
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// Name every center's biome. Fails before touching the graph when the
/// store is empty or lacks a name the classifier can produce.
pub fn assign_biomes(graph: &mut Graph, store: &dyn BiomeStore) -> Result<(), GenerationError> {
    info!("Assigning biomes...");
    let known: HashSet<String> = store.find_all()?.into_iter().map(|b| b.name).collect();
    if known.is_empty() {
        return Err(GenerationError::EmptyBiomeTable);
    }
    if let Some(missing) = classifier_names().into_iter().find(|name| !known.contains(*name)) {
        return Err(GenerationError::MissingBiome(missing.to_string()));
    }

    for center in &mut graph.centers {
        center.biome = Some(classify_center(center).to_string());
    }
    Ok(())
}

/// One cell of the Whittaker table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhittakerGridLocation {
    pub elevation: i32,
    pub moisture: i32,
    pub biome: Biome,
}

/// Build the full Whittaker table from the biomes in `store`, elevation-major.
pub fn whittaker_grid(store: &dyn BiomeStore) -> Result<Vec<WhittakerGridLocation>, GenerationError> {
    let mut grid = Vec::with_capacity((MAX_ELEVATION * MAX_MOISTURE) as usize);
    for elevation in 1..=MAX_ELEVATION {
        for moisture in 1..=MAX_MOISTURE {
            let name = whittaker_biome_name(elevation, moisture);
            let biome = store
                .find_by_name(name)?
                .ok_or_else(|| GenerationError::MissingBiome(name.to_string()))?;
            grid.push(WhittakerGridLocation { elevation, moisture, biome });
        }
    }
    Ok(grid)
}
