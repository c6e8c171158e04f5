//! Polygonal island generator
//!
//! Builds a Voronoi island with elevation, moisture, rivers and biomes,
//! rasterizes it and stores one room per pixel. Rooms outside the island
//! can be grown on demand with [`room_builder::RoomBuilder`].

pub mod biomes;
pub mod config;
pub mod elevation;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod island;
pub mod logging;
pub mod materialize;
pub mod moisture;
pub mod raster;
pub mod rivers;
pub mod room;
pub mod room_builder;
pub mod seeds;
pub mod store;
pub mod tilemap;
pub mod world;
