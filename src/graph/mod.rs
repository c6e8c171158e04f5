//! Dual Voronoi/Delaunay polygon graph.
//!
//! Centers (polygon sites), corners (polygon vertices) and edges live in flat
//! arenas owned by [`Graph`]; every cross reference is an index into one of
//! those arenas, so the cyclic structure needs no shared ownership.

mod builder;

pub use builder::{build_diagram, build_graph, improve_corners, relax_sites, sample_sites};

use crate::geometry::{Bounds, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CenterId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CornerId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl CenterId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl CornerId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A Voronoi polygon, identified by its site.
#[derive(Clone, Debug)]
pub struct Center {
    pub index: CenterId,
    pub point: Point,
    pub neighbors: Vec<CenterId>,
    pub borders: Vec<EdgeId>,
    pub corners: Vec<CornerId>,
    pub water: bool,
    pub ocean: bool,
    pub coast: bool,
    pub border: bool,
    pub elevation: f64,
    pub moisture: f64,
    pub area: f64,
    /// Biome name, set by classification
    pub biome: Option<String>,
}

impl Center {
    fn new(index: CenterId, point: Point) -> Self {
        Self {
            index,
            point,
            neighbors: Vec::new(),
            borders: Vec::new(),
            corners: Vec::new(),
            water: false,
            ocean: false,
            coast: false,
            border: false,
            elevation: 0.0,
            moisture: 0.0,
            area: 0.0,
            biome: None,
        }
    }
}

/// A Voronoi vertex, shared by up to three polygons.
#[derive(Clone, Debug)]
pub struct Corner {
    pub index: CornerId,
    pub point: Point,
    pub adjacent: Vec<CornerId>,
    pub touches: Vec<CenterId>,
    pub protrudes: Vec<EdgeId>,
    pub water: bool,
    pub ocean: bool,
    pub coast: bool,
    pub border: bool,
    pub elevation: f64,
    pub moisture: f64,
    pub river: u32,
    /// Drainage target; points at itself until downslopes are computed
    pub downslope: CornerId,
}

impl Corner {
    fn new(index: CornerId, point: Point, border: bool) -> Self {
        Self {
            index,
            point,
            adjacent: Vec::new(),
            touches: Vec::new(),
            protrudes: Vec::new(),
            water: false,
            ocean: false,
            coast: false,
            border,
            elevation: 0.0,
            moisture: 0.0,
            river: 0,
            downslope: index,
        }
    }
}

/// One polygon side: the Delaunay pair `d0`/`d1` and the Voronoi pair `v0`/`v1`.
#[derive(Clone, Debug)]
pub struct Edge {
    pub index: EdgeId,
    pub d0: Option<CenterId>,
    pub d1: Option<CenterId>,
    pub v0: Option<CornerId>,
    pub v1: Option<CornerId>,
    pub midpoint: Option<Point>,
    pub river: u32,
}

impl Edge {
    fn new(index: EdgeId) -> Self {
        Self { index, d0: None, d1: None, v0: None, v1: None, midpoint: None, river: 0 }
    }

    /// Both Voronoi endpoints, when present.
    pub fn corners(&self) -> Option<(CornerId, CornerId)> {
        match (self.v0, self.v1) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }
}

/// The full polygon graph for one build.
#[derive(Clone, Debug)]
pub struct Graph {
    pub bounds: Bounds,
    pub centers: Vec<Center>,
    pub corners: Vec<Corner>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn center(&self, id: CenterId) -> &Center {
        &self.centers[id.index()]
    }

    pub fn corner(&self, id: CornerId) -> &Corner {
        &self.corners[id.index()]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// The edge joining two corners, if they are adjacent.
    pub fn edge_between_corners(&self, a: CornerId, b: CornerId) -> Option<EdgeId> {
        self.corner(a)
            .protrudes
            .iter()
            .copied()
            .find(|&e| {
                let edge = self.edge(e);
                edge.v0 == Some(b) || edge.v1 == Some(b)
            })
    }

    /// Corners that are neither ocean nor coast, in index order.
    pub fn land_corners(&self) -> Vec<CornerId> {
        self.corners
            .iter()
            .filter(|c| !c.ocean && !c.coast)
            .map(|c| c.index)
            .collect()
    }

    /// Average of a corner attribute onto every center. Centers without
    /// corners get 0.
    pub(crate) fn average_corners_onto_centers<F, G>(&mut self, read: F, mut write: G)
    where
        F: Fn(&Corner) -> f64,
        G: FnMut(&mut Center, f64),
    {
        for i in 0..self.centers.len() {
            let center = &self.centers[i];
            let value = if center.corners.is_empty() {
                0.0
            } else {
                let total: f64 = center.corners.iter().map(|&q| read(&self.corners[q.index()])).sum();
                total / center.corners.len() as f64
            };
            write(&mut self.centers[i], value);
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Sampled, relaxed and refined graph over a square of side `extent`.
    pub fn relaxed_graph(seed: u64, sites: usize, extent: f64) -> Graph {
        let bounds = Bounds::square(extent);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let points = sample_sites(&mut rng, sites, &bounds);
        let diagram = build_diagram(&points, &bounds).unwrap();
        let diagram = relax_sites(diagram, &bounds, 1).unwrap();
        let mut graph = build_graph(&diagram, &bounds);
        improve_corners(&mut graph);
        graph
    }

    /// Corners on a line, each joined to the next by an edge with no polygons.
    pub fn corner_chain(elevations: &[f64]) -> Graph {
        let mut corners: Vec<Corner> = elevations
            .iter()
            .enumerate()
            .map(|(i, &e)| {
                let mut corner = Corner::new(CornerId(i as u32), Point::new(i as f64, 0.0), false);
                corner.elevation = e;
                corner
            })
            .collect();
        let mut edges = Vec::new();
        for i in 1..corners.len() {
            let id = EdgeId(edges.len() as u32);
            let mut edge = Edge::new(id);
            edge.v0 = Some(CornerId(i as u32 - 1));
            edge.v1 = Some(CornerId(i as u32));
            corners[i - 1].protrudes.push(id);
            corners[i].protrudes.push(id);
            corners[i - 1].adjacent.push(CornerId(i as u32));
            corners[i].adjacent.push(CornerId(i as u32 - 1));
            edges.push(edge);
        }
        Graph {
            bounds: Bounds::square(elevations.len() as f64),
            centers: Vec::new(),
            corners,
            edges,
        }
    }

    /// One polygon in the top-left corner of a 10×10 map whose boundary is
    /// open between (0, 5) and (5, 0): the sides along the map edge are
    /// missing, as they would be for an unclipped diagram.
    pub fn open_cell() -> Graph {
        let bounds = Bounds::square(10.0);
        let points = [Point::new(0.0, 5.0), Point::new(4.0, 4.0), Point::new(5.0, 0.0)];
        let mut corners: Vec<Corner> = points
            .iter()
            .enumerate()
            .map(|(i, p)| Corner::new(CornerId(i as u32), *p, bounds.lies_on_edge(p)))
            .collect();
        let mut center = Center::new(CenterId(0), Point::new(2.0, 2.0));
        let mut edges = Vec::new();
        for (a, b) in [(0u32, 1u32), (1, 2)] {
            let id = EdgeId(edges.len() as u32);
            let mut edge = Edge::new(id);
            edge.d0 = Some(center.index);
            edge.v0 = Some(CornerId(a));
            edge.v1 = Some(CornerId(b));
            edge.midpoint = Some(points[a as usize].lerp(&points[b as usize], 0.5));
            center.borders.push(id);
            for v in [a, b] {
                if !center.corners.contains(&CornerId(v)) {
                    center.corners.push(CornerId(v));
                    corners[v as usize].touches.push(center.index);
                }
                corners[v as usize].protrudes.push(id);
            }
            corners[a as usize].adjacent.push(CornerId(b));
            corners[b as usize].adjacent.push(CornerId(a));
            edges.push(edge);
        }
        Graph { bounds, centers: vec![center], corners, edges }
    }
}
