use std::collections::HashMap;

use rand::Rng;
use tracing::{debug, info};
use voronoice::{BoundingBox, Voronoi, VoronoiBuilder};

use super::{Center, CenterId, Corner, CornerId, Edge, EdgeId, Graph};
use crate::error::GenerationError;
use crate::geometry::{mean_point, Bounds, Point};

/// Corner locations are snapped to this grid when deduplicating.
const CORNER_QUANTUM: f64 = 1e-4;

/// Draw `count` uniformly distributed sites inside `bounds`.
pub fn sample_sites<R: Rng + ?Sized>(rng: &mut R, count: usize, bounds: &Bounds) -> Vec<Point> {
    (0..count)
        .map(|_| {
            let x = bounds.x + rng.gen_range(0.0..bounds.width);
            let y = bounds.y + rng.gen_range(0.0..bounds.height);
            Point::new(x, y)
        })
        .collect()
}

/// Clipped Voronoi diagram of `sites` inside `bounds`.
pub fn build_diagram(sites: &[Point], bounds: &Bounds) -> Result<Voronoi, GenerationError> {
    // A triangulation needs at least three sites.
    if sites.len() < 3 {
        return Err(GenerationError::Diagram { sites: sites.len() });
    }
    let bounding_box = BoundingBox::new(bounds.center().into(), bounds.width, bounds.height);
    VoronoiBuilder::default()
        .set_sites(sites.iter().map(|&p| p.into()).collect())
        .set_bounding_box(bounding_box)
        .build()
        .ok_or(GenerationError::Diagram { sites: sites.len() })
}

/// Lloyd's relaxation: move every site to the mean of its cell's vertices,
/// `iterations` times, rebuilding the diagram after each pass.
pub fn relax_sites(diagram: Voronoi, bounds: &Bounds, iterations: usize) -> Result<Voronoi, GenerationError> {
    let mut diagram = diagram;
    for pass in 0..iterations {
        let sites: Vec<Point> = diagram
            .iter_cells()
            .map(|cell| {
                let vertices: Vec<Point> = cell.iter_vertices().map(Point::from).collect();
                mean_point(vertices.iter()).unwrap_or_else(|| Point::from(cell.site_position()))
            })
            .collect();
        debug!(pass, sites = sites.len(), "relaxed sites");
        diagram = build_diagram(&sites, bounds)?;
    }
    Ok(diagram)
}

fn corner_key(p: &Point) -> (i64, i64) {
    ((p.x / CORNER_QUANTUM).round() as i64, (p.y / CORNER_QUANTUM).round() as i64)
}

fn push_unique<T: PartialEq>(list: &mut Vec<T>, value: T) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Build the cross-linked center/corner/edge graph from a diagram.
///
/// Each cell side becomes one edge. A side shared by two cells carries both
/// sites as its Delaunay pair; a side on the bounding box has only `d0`.
pub fn build_graph(diagram: &Voronoi, bounds: &Bounds) -> Graph {
    info!("Building graph...");
    let mut centers: Vec<Center> = diagram
        .sites()
        .iter()
        .enumerate()
        .map(|(i, p)| Center::new(CenterId(i as u32), Point::from(p)))
        .collect();
    let mut corners: Vec<Corner> = Vec::new();
    let mut edges: Vec<Edge> = Vec::new();

    let mut corner_lookup: HashMap<(i64, i64), CornerId> = HashMap::new();
    let mut side_lookup: HashMap<(CornerId, CornerId), EdgeId> = HashMap::new();
    let mut skipped = 0usize;

    for cell in diagram.iter_cells() {
        let center = CenterId(cell.site() as u32);
        let vertices: Vec<Point> = cell.iter_vertices().map(Point::from).collect();
        if vertices.len() < 2 {
            skipped += 1;
            continue;
        }

        let mut make_corner = |p: Point| -> CornerId {
            *corner_lookup.entry(corner_key(&p)).or_insert_with(|| {
                let id = CornerId(corners.len() as u32);
                corners.push(Corner::new(id, p, bounds.lies_on_edge(&p)));
                id
            })
        };

        let ids: Vec<CornerId> = vertices.iter().map(|&p| make_corner(p)).collect();
        for i in 0..ids.len() {
            let a = ids[i];
            let b = ids[(i + 1) % ids.len()];
            if a == b {
                skipped += 1;
                continue;
            }
            let key = if a < b { (a, b) } else { (b, a) };
            match side_lookup.get(&key) {
                Some(&e) => {
                    let edge = &mut edges[e.index()];
                    if edge.d0 != Some(center) && edge.d1.is_none() {
                        edge.d1 = Some(center);
                    }
                }
                None => {
                    let id = EdgeId(edges.len() as u32);
                    let mut edge = Edge::new(id);
                    edge.d0 = Some(center);
                    edge.v0 = Some(a);
                    edge.v1 = Some(b);
                    edges.push(edge);
                    side_lookup.insert(key, id);
                }
            }
        }
    }

    for edge in &mut edges {
        if let Some((a, b)) = edge.corners() {
            edge.midpoint = Some(corners[a.index()].point.lerp(&corners[b.index()].point, 0.5));
        }
    }

    link(&mut centers, &mut corners, &edges);
    let added = link_delaunay_pairs(&mut centers, &diagram.triangulation().triangles);

    if skipped > 0 {
        debug!(skipped, "degenerate polygon sides left out of the graph");
    }
    if added > 0 {
        debug!(added, "neighbor links added for sides clipped away by the bounds");
    }
    info!(
        centers = centers.len(),
        corners = corners.len(),
        edges = edges.len(),
        "graph built"
    );

    Graph { bounds: *bounds, centers, corners, edges }
}

/// Wire every adjacency list from the edge records.
fn link(centers: &mut [Center], corners: &mut [Corner], edges: &[Edge]) {
    for edge in edges {
        // Centers point to edges. Corners point to edges.
        for d in [edge.d0, edge.d1].into_iter().flatten() {
            centers[d.index()].borders.push(edge.index);
        }
        for v in [edge.v0, edge.v1].into_iter().flatten() {
            corners[v.index()].protrudes.push(edge.index);
        }

        if let (Some(d0), Some(d1)) = (edge.d0, edge.d1) {
            push_unique(&mut centers[d0.index()].neighbors, d1);
            push_unique(&mut centers[d1.index()].neighbors, d0);
        }

        if let (Some(v0), Some(v1)) = (edge.v0, edge.v1) {
            push_unique(&mut corners[v0.index()].adjacent, v1);
            push_unique(&mut corners[v1.index()].adjacent, v0);
        }

        for d in [edge.d0, edge.d1].into_iter().flatten() {
            for v in [edge.v0, edge.v1].into_iter().flatten() {
                push_unique(&mut centers[d.index()].corners, v);
                push_unique(&mut corners[v.index()].touches, d);
            }
        }
    }
}

/// Make every Delaunay pair neighbors, including pairs whose shared side lies
/// outside the bounds and so produced no edge. Returns the links added.
fn link_delaunay_pairs(centers: &mut [Center], triangles: &[usize]) -> usize {
    let mut added = 0;
    for triangle in triangles.chunks_exact(3) {
        for (a, b) in [(triangle[0], triangle[1]), (triangle[1], triangle[2]), (triangle[2], triangle[0])] {
            if a >= centers.len() || b >= centers.len() || a == b {
                continue;
            }
            let (ca, cb) = (CenterId(a as u32), CenterId(b as u32));
            if !centers[a].neighbors.contains(&cb) {
                centers[a].neighbors.push(cb);
                push_unique(&mut centers[b].neighbors, ca);
                added += 1;
            }
        }
    }
    added
}

/// Move each non-border corner to the mean of the centers it touches, then
/// recompute edge midpoints.
pub fn improve_corners(graph: &mut Graph) {
    info!("Improving graph corners...");
    let moved: Vec<Point> = graph
        .corners
        .iter()
        .map(|corner| {
            if corner.border {
                return corner.point;
            }
            let points: Vec<Point> = corner.touches.iter().map(|&c| graph.center(c).point).collect();
            mean_point(points.iter()).unwrap_or(corner.point)
        })
        .collect();

    for (corner, point) in graph.corners.iter_mut().zip(moved) {
        corner.point = point;
    }

    for i in 0..graph.edges.len() {
        if let Some((a, b)) = graph.edges[i].corners() {
            let midpoint = graph.corner(a).point.lerp(&graph.corner(b).point, 0.5);
            graph.edges[i].midpoint = Some(midpoint);
        }
    }
}
