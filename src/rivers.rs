//! Downslope pointers and river tracing.

use rand::Rng;
use tracing::{debug, info};

use crate::graph::{CornerId, Graph};

/// River sources must sit between these elevations.
const MIN_SOURCE_ELEVATION: f64 = 0.3;
const MAX_SOURCE_ELEVATION: f64 = 0.9;

/// Point every corner at its lowest neighbor. A neighbor that only ties the
/// current best still replaces it, so the last tied neighbor wins; a corner
/// with no neighbor at or below itself points at itself.
pub fn calculate_downslopes(graph: &mut Graph) {
    info!("Calculating slopes...");
    let downslopes: Vec<CornerId> = graph
        .corners
        .iter()
        .map(|corner| {
            let mut down = corner.index;
            for &a in &corner.adjacent {
                if graph.corner(a).elevation <= graph.corner(down).elevation {
                    down = a;
                }
            }
            down
        })
        .collect();

    for (corner, down) in graph.corners.iter_mut().zip(downslopes) {
        corner.downslope = down;
    }
}

/// Trace `attempts` rivers from random upland corners down to the coast.
///
/// Each step along a downslope edge bumps the river count of the edge and of
/// both corners, unless both ends of the edge are water.
pub fn create_rivers<R: Rng + ?Sized>(graph: &mut Graph, rng: &mut R, attempts: usize) {
    info!("Creating rivers...");
    if graph.corners.is_empty() {
        return;
    }

    let mut traced = 0usize;
    for _ in 0..attempts {
        let mut q = CornerId(rng.gen_range(0..graph.corners.len()) as u32);
        {
            let source = graph.corner(q);
            if source.ocean || source.elevation < MIN_SOURCE_ELEVATION || source.elevation > MAX_SOURCE_ELEVATION {
                continue;
            }
        }
        traced += 1;

        // A walk visits every corner at most once unless ties form a loop.
        let mut steps = 0usize;
        while !graph.corner(q).coast && steps < graph.corners.len() {
            let down = graph.corner(q).downslope;
            if down == q {
                break;
            }
            if let Some(e) = graph.edge_between_corners(q, down) {
                let both_water = graph
                    .edge(e)
                    .corners()
                    .map(|(a, b)| graph.corner(a).water && graph.corner(b).water)
                    .unwrap_or(false);
                if !both_water {
                    graph.edges[e.index()].river += 1;
                    graph.corners[q.index()].river += 1;
                    graph.corners[down.index()].river += 1;
                }
            }
            q = down;
            steps += 1;
        }
    }
    debug!(attempts, traced, "rivers traced");
}
