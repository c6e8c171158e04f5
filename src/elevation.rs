//! Elevation, ocean and coast assignment on the polygon graph.
//!
//! Order matters: raw corner elevations come first (they only need the
//! island's water flags), then ocean/coast flood fill, then the rank
//! redistribution that needs to know which corners are land.

use std::collections::VecDeque;

use tracing::info;

use crate::graph::{CornerId, Graph};

/// Extra cost of a step between two land corners.
const LAND_STEP_PENALTY: f64 = 1.0;
/// Cost of any step.
const STEP_COST: f64 = 0.01;
/// Shape of the redistribution curve; larger means flatter lowlands.
const SCALE_FACTOR: f64 = 1.1;

/// Relaxation BFS from the map border. Border corners start at 0, every other
/// corner at infinity; a corner is revisited whenever a cheaper path reaches it.
pub fn assign_corner_elevations(graph: &mut Graph) {
    info!("Assigning corner elevations...");
    let mut queue: VecDeque<CornerId> = VecDeque::new();
    for corner in &mut graph.corners {
        if corner.border {
            corner.elevation = 0.0;
            queue.push_back(corner.index);
        } else {
            corner.elevation = f64::INFINITY;
        }
    }

    while let Some(q) = queue.pop_front() {
        let (elevation, water) = {
            let corner = graph.corner(q);
            (corner.elevation, corner.water)
        };
        for i in 0..graph.corners[q.index()].adjacent.len() {
            let a = graph.corners[q.index()].adjacent[i];
            let neighbor = &mut graph.corners[a.index()];
            let mut new_elevation = STEP_COST + elevation;
            if !water && !neighbor.water {
                new_elevation += LAND_STEP_PENALTY;
            }
            if new_elevation < neighbor.elevation {
                neighbor.elevation = new_elevation;
                queue.push_back(a);
            }
        }
    }
}

/// Flood fill ocean from the border, mark lakes and coasts, then derive the
/// corner flags from the polygons around each corner.
pub fn assign_ocean_coast_and_land(graph: &mut Graph, water_threshold: f64) {
    info!("Assigning ocean and land...");
    let mut queue = VecDeque::new();
    for i in 0..graph.centers.len() {
        let mut num_water = 0usize;
        let mut touches_border = false;
        for &q in &graph.centers[i].corners {
            let corner = graph.corner(q);
            touches_border |= corner.border;
            if corner.water {
                num_water += 1;
            }
        }
        let center = &mut graph.centers[i];
        if touches_border {
            center.border = true;
            center.ocean = true;
            center.water = true;
            queue.push_back(center.index);
        }
        let corner_count = center.corners.len().max(1) as f64;
        center.water = center.ocean || num_water as f64 / corner_count >= water_threshold;
    }

    while let Some(p) = queue.pop_front() {
        for i in 0..graph.center(p).neighbors.len() {
            let n = graph.center(p).neighbors[i];
            let neighbor = &mut graph.centers[n.index()];
            if neighbor.water && !neighbor.ocean {
                neighbor.ocean = true;
                queue.push_back(n);
            }
        }
    }

    let coasts: Vec<bool> = graph
        .centers
        .iter()
        .map(|center| {
            let ocean_neighbor = center.neighbors.iter().any(|&n| graph.center(n).ocean);
            let land_neighbor = center.neighbors.iter().any(|&n| !graph.center(n).water);
            ocean_neighbor && land_neighbor
        })
        .collect();
    for (center, coast) in graph.centers.iter_mut().zip(coasts) {
        center.coast = coast;
    }

    for i in 0..graph.corners.len() {
        let (num_ocean, num_land) = graph.corners[i].touches.iter().fold((0, 0), |(ocean, land), &p| {
            let center = graph.center(p);
            (ocean + center.ocean as usize, land + !center.water as usize)
        });
        let corner = &mut graph.corners[i];
        let touches = corner.touches.len();
        corner.ocean = num_ocean == touches;
        corner.coast = num_ocean > 0 && num_land > 0;
        corner.water = corner.border || (num_land != touches && !corner.coast);
    }
}

/// Target elevation for the land corner at `rank` of `count`.
pub fn redistribution_curve(rank: usize, count: usize) -> f64 {
    let y = rank as f64 / count as f64;
    let x = SCALE_FACTOR.sqrt() - (SCALE_FACTOR * (1.0 - y)).sqrt();
    x.min(1.0)
}

/// Rank-remap land corner elevations onto a curve with more low ground than
/// high ground. Ocean and coast corners are flattened to 0.
pub fn redistribute_elevations(graph: &mut Graph) {
    info!("Redistributing elevations...");
    let mut land = graph.land_corners();
    land.sort_by(|&a, &b| graph.corner(a).elevation.total_cmp(&graph.corner(b).elevation));

    let count = land.len();
    for (rank, q) in land.into_iter().enumerate() {
        graph.corners[q.index()].elevation = redistribution_curve(rank, count);
    }

    for corner in graph.corners.iter_mut().filter(|c| c.ocean || c.coast) {
        corner.elevation = 0.0;
    }
}

/// Polygon elevation is the mean of its corners.
pub fn assign_polygon_elevations(graph: &mut Graph) {
    info!("Assigning elevations to polygons...");
    graph.average_corners_onto_centers(|corner| corner.elevation, |center, value| center.elevation = value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IslandShapeKind;
    use crate::graph::fixtures::{corner_chain, relaxed_graph};
    use crate::island::{assign_corner_water, IslandShape};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn island_graph(seed: u64, sites: usize, extent: f64) -> Graph {
        let mut graph = relaxed_graph(seed, sites, extent);
        let shape = IslandShape::new(IslandShapeKind::Radial, &mut ChaCha8Rng::seed_from_u64(seed));
        assign_corner_water(&mut graph, &shape);
        assign_corner_elevations(&mut graph);
        assign_ocean_coast_and_land(&mut graph, 0.3);
        graph
    }

    #[test]
    fn test_land_steps_cost_more() {
        // border(water) - water - land - land
        let mut graph = corner_chain(&[0.0, 0.0, 0.0, 0.0]);
        graph.corners[0].border = true;
        graph.corners[0].water = true;
        graph.corners[1].water = true;

        assign_corner_elevations(&mut graph);

        let e: Vec<f64> = graph.corners.iter().map(|c| c.elevation).collect();
        assert_eq!(e[0], 0.0);
        assert!((e[1] - 0.01).abs() < 1e-12);
        assert!((e[2] - 0.02).abs() < 1e-12);
        assert!((e[3] - 1.03).abs() < 1e-12);
    }

    #[test]
    fn test_relaxation_finds_cheaper_path() {
        // Two border corners at the ends of a chain: the middle is reached
        // from both sides and must keep the cheaper cost.
        let mut graph = corner_chain(&[0.0; 5]);
        graph.corners[0].border = true;
        graph.corners[4].border = true;
        for corner in &mut graph.corners {
            corner.water = true;
        }

        assign_corner_elevations(&mut graph);

        assert!((graph.corners[2].elevation - 0.02).abs() < 1e-12);
        assert!((graph.corners[3].elevation - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_unreachable_corners_stay_infinite() {
        let mut graph = corner_chain(&[0.0; 3]);
        assign_corner_elevations(&mut graph);
        assert!(graph.corners.iter().all(|c| c.elevation.is_infinite()));
    }

    #[test]
    fn test_ocean_is_flood_filled_through_water_only() {
        let graph = island_graph(42, 200, 200.0);

        for center in &graph.centers {
            if center.border {
                assert!(center.ocean && center.water);
            }
            if center.ocean {
                assert!(center.water);
                // Every ocean polygon that is not on the border is reached
                // from an ocean neighbor.
                assert!(center.border || center.neighbors.iter().any(|&n| graph.center(n).ocean));
            }
            // A water polygon next to ocean must itself be ocean.
            if center.water && center.neighbors.iter().any(|&n| graph.center(n).ocean) {
                assert!(center.ocean);
            }
        }
    }

    #[test]
    fn test_coast_needs_ocean_and_land_neighbors() {
        let graph = island_graph(42, 200, 200.0);

        for center in &graph.centers {
            let ocean = center.neighbors.iter().any(|&n| graph.center(n).ocean);
            let land = center.neighbors.iter().any(|&n| !graph.center(n).water);
            assert_eq!(center.coast, ocean && land);
        }
        for corner in &graph.corners {
            if corner.border {
                assert!(corner.water);
            }
            assert!(!(corner.ocean && corner.coast) || corner.touches.is_empty());
        }
    }

    #[test]
    fn test_redistribution_bounds() {
        let mut graph = island_graph(42, 200, 200.0);
        redistribute_elevations(&mut graph);

        for corner in &graph.corners {
            assert!(corner.elevation >= 0.0 && corner.elevation <= 1.0);
            if corner.ocean || corner.coast {
                assert_eq!(corner.elevation, 0.0);
            }
        }
    }

    #[test]
    fn test_redistribution_preserves_rank_order() {
        let mut graph = island_graph(9, 200, 200.0);
        let mut before = graph.land_corners();
        before.sort_by(|&a, &b| graph.corner(a).elevation.total_cmp(&graph.corner(b).elevation));

        redistribute_elevations(&mut graph);

        let mut after = graph.land_corners();
        after.sort_by(|&a, &b| graph.corner(a).elevation.total_cmp(&graph.corner(b).elevation));
        assert_eq!(before, after);
    }

    #[test]
    fn test_redistribution_curve_is_increasing() {
        let n = 100;
        let values: Vec<f64> = (0..n).map(|i| redistribution_curve(i, n)).collect();
        assert_eq!(values[0], 0.0);
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert!(values[n - 1] <= 1.0);
        // Biased toward lowland: the median corner sits well below half.
        assert!(values[n / 2] < 0.35);
    }

    #[test]
    fn test_polygon_elevation_is_corner_mean() {
        let mut graph = island_graph(3, 100, 100.0);
        redistribute_elevations(&mut graph);
        assign_polygon_elevations(&mut graph);

        for center in &graph.centers {
            let mean: f64 = center.corners.iter().map(|&q| graph.corner(q).elevation).sum::<f64>()
                / center.corners.len() as f64;
            assert!((center.elevation - mean).abs() < 1e-12);
        }
    }
}
