//! Island shape functions: decide land or water for a point of the map.
//!
//! A shape is built once from the island seed stream and is then a pure
//! function of position, so rebuilding with the same seed reproduces the same
//! coastline.

use std::f64::consts::PI;

use noise::{NoiseFn, Perlin};
use rand::Rng;
use tracing::info;

use crate::config::IslandShapeKind;
use crate::geometry::{Bounds, Point};
use crate::graph::Graph;

/// How far past the inner radius the outer ring starts.
const ISLAND_FACTOR: f64 = 1.07;

#[derive(Clone, Debug)]
pub enum IslandShape {
    Radial(RadialIsland),
    Perlin(PerlinIsland),
}

impl IslandShape {
    pub fn new<R: Rng + ?Sized>(kind: IslandShapeKind, rng: &mut R) -> Self {
        match kind {
            IslandShapeKind::Radial => IslandShape::Radial(RadialIsland::new(rng)),
            IslandShapeKind::Perlin => IslandShape::Perlin(PerlinIsland::new(rng)),
        }
    }

    /// `q` is the point normalized into `[-1, 1]²`.
    pub fn is_land(&self, q: &Point) -> bool {
        match self {
            IslandShape::Radial(shape) => shape.is_land(q),
            IslandShape::Perlin(shape) => shape.is_land(q),
        }
    }

    pub fn is_water(&self, bounds: &Bounds, p: &Point) -> bool {
        !self.is_land(&bounds.normalize(p))
    }
}

/// Overlapping sine waves around the center, with a random wedge cut out.
#[derive(Clone, Debug, PartialEq)]
pub struct RadialIsland {
    pub bumps: u32,
    pub start_angle: f64,
    pub dip_angle: f64,
    pub dip_width: f64,
}

impl RadialIsland {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            bumps: rng.gen_range(1..=6),
            start_angle: rng.gen_range(0.0..2.0 * PI),
            dip_angle: rng.gen_range(0.0..2.0 * PI),
            dip_width: rng.gen_range(0.2..0.7),
        }
    }

    pub fn is_land(&self, q: &Point) -> bool {
        let angle = q.y.atan2(q.x);
        let length = 0.5 * (q.x.abs().max(q.y.abs()) + (q.x * q.x + q.y * q.y).sqrt());
        let bumps = self.bumps as f64;

        let mut r1 = 0.5 + 0.40 * (self.start_angle + bumps * angle + ((bumps + 3.0) * angle).cos()).sin();
        let mut r2 = 0.7 - 0.20 * (self.start_angle + bumps * angle - ((bumps + 2.0) * angle).sin()).sin();

        let in_dip = (angle - self.dip_angle).abs() < self.dip_width
            || (angle - self.dip_angle + 2.0 * PI).abs() < self.dip_width
            || (angle - self.dip_angle - 2.0 * PI).abs() < self.dip_width;
        if in_dip {
            r1 = 0.2;
            r2 = 0.2;
        }

        length < r1 || (length > r1 * ISLAND_FACTOR && length < r2)
    }
}

/// Octave Perlin noise that has to beat a threshold rising toward the edges.
#[derive(Clone, Debug)]
pub struct PerlinIsland {
    noise: Perlin,
}

impl PerlinIsland {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self { noise: Perlin::new(rng.gen()) }
    }

    fn octaves(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_value = 0.0;
        for _ in 0..4 {
            total += amplitude * self.noise.get([x * frequency, y * frequency]);
            max_value += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        total / max_value
    }

    pub fn is_land(&self, q: &Point) -> bool {
        let c = (self.octaves(2.0 * q.x + 64.0, 2.0 * q.y + 64.0) + 1.0) / 2.0;
        let length_sq = q.x * q.x + q.y * q.y;
        c > 0.3 + 0.3 * length_sq
    }
}

/// Flag every corner of the graph as water or land.
pub fn assign_corner_water(graph: &mut Graph, shape: &IslandShape) {
    info!("Assigning island shape...");
    let bounds = graph.bounds;
    for corner in &mut graph.corners {
        corner.water = shape.is_water(&bounds, &corner.point);
    }
}
