//! Moisture propagation from fresh water and rivers.

use std::collections::VecDeque;

use tracing::info;

use crate::graph::{CornerId, Graph};

/// Moisture kept per hop away from a source.
const DECAY: f64 = 0.9;
/// Moisture of a lake or dry-bed source.
const FRESH_WATER: f64 = 1.0;
/// Cap for river-fed sources.
const MAX_RIVER_MOISTURE: f64 = 3.0;

/// Spread moisture outward from lakes and rivers, keeping the wettest value
/// that reaches each corner. Ocean and coast corners end at 1.0.
pub fn assign_corner_moisture(graph: &mut Graph) {
    info!("Assigning corner moisture...");
    let mut queue: VecDeque<CornerId> = VecDeque::new();
    for corner in &mut graph.corners {
        if (corner.water || corner.river > 0) && !corner.ocean {
            corner.moisture = if corner.river > 0 {
                MAX_RIVER_MOISTURE.min(0.2 * corner.river as f64)
            } else {
                FRESH_WATER
            };
            queue.push_back(corner.index);
        } else {
            corner.moisture = 0.0;
        }
    }

    while let Some(q) = queue.pop_front() {
        let new_moisture = DECAY * graph.corner(q).moisture;
        for i in 0..graph.corner(q).adjacent.len() {
            let a = graph.corner(q).adjacent[i];
            let neighbor = &mut graph.corners[a.index()];
            if new_moisture > neighbor.moisture {
                neighbor.moisture = new_moisture;
                queue.push_back(a);
            }
        }
    }

    for corner in graph.corners.iter_mut().filter(|c| c.ocean || c.coast) {
        corner.moisture = 1.0;
    }
}

/// Rank-remap land corner moisture linearly onto `[0, 1)`.
pub fn redistribute_moisture(graph: &mut Graph) {
    info!("Redistributing moisture...");
    let mut land = graph.land_corners();
    land.sort_by(|&a, &b| graph.corner(a).moisture.total_cmp(&graph.corner(b).moisture));

    let count = land.len();
    for (rank, q) in land.into_iter().enumerate() {
        graph.corners[q.index()].moisture = rank as f64 / count as f64;
    }
}

pub fn assign_polygon_moisture(graph: &mut Graph) {
    info!("Assigning moisture...");
    graph.average_corners_onto_centers(|corner| corner.moisture, |center, value| center.moisture = value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{corner_chain, relaxed_graph};

    #[test]
    fn test_lake_moisture_decays_per_hop() {
        let mut graph = corner_chain(&[0.0; 4]);
        graph.corners[0].water = true;

        assign_corner_moisture(&mut graph);

        let m: Vec<f64> = graph.corners.iter().map(|c| c.moisture).collect();
        assert_eq!(m[0], 1.0);
        assert!((m[1] - 0.9).abs() < 1e-12);
        assert!((m[2] - 0.81).abs() < 1e-12);
        assert!((m[3] - 0.729).abs() < 1e-12);
    }

    #[test]
    fn test_river_moisture_is_capped() {
        let mut graph = corner_chain(&[0.0; 3]);
        graph.corners[0].river = 40;
        graph.corners[2].river = 2;

        assign_corner_moisture(&mut graph);

        assert_eq!(graph.corners[0].moisture, 3.0);
        // Corner 1 keeps the wetter of 2.7 (from the big river) and 0.36.
        assert!((graph.corners[1].moisture - 2.7).abs() < 1e-12);
        // Corner 2 was overtaken by the spread from corner 0.
        assert!((graph.corners[2].moisture - 2.43).abs() < 1e-12);
    }

    #[test]
    fn test_ocean_is_not_a_source_but_ends_salty() {
        let mut graph = corner_chain(&[0.0; 3]);
        graph.corners[0].water = true;
        graph.corners[0].ocean = true;
        graph.corners[2].coast = true;

        assign_corner_moisture(&mut graph);

        assert_eq!(graph.corners[0].moisture, 1.0);
        assert_eq!(graph.corners[1].moisture, 0.0);
        assert_eq!(graph.corners[2].moisture, 1.0);
    }

    #[test]
    fn test_redistribution_is_linear_in_rank() {
        let mut graph = corner_chain(&[0.0; 4]);
        for (corner, m) in graph.corners.iter_mut().zip([0.7, 0.1, 0.9, 0.3]) {
            corner.moisture = m;
        }

        redistribute_moisture(&mut graph);

        let m: Vec<f64> = graph.corners.iter().map(|c| c.moisture).collect();
        assert_eq!(m, vec![0.5, 0.0, 0.75, 0.25]);
    }

    #[test]
    fn test_land_moisture_in_unit_range() {
        let mut graph = relaxed_graph(8, 150, 150.0);
        for (i, corner) in graph.corners.iter_mut().enumerate() {
            corner.water = i % 7 == 0;
            corner.river = (i % 5) as u32;
        }
        assign_corner_moisture(&mut graph);
        redistribute_moisture(&mut graph);
        assign_polygon_moisture(&mut graph);

        for corner in &graph.corners {
            assert!(corner.moisture >= 0.0 && corner.moisture < 1.0);
        }
        for center in &graph.centers {
            assert!(center.moisture >= 0.0 && center.moisture < 1.0);
        }
    }
}
