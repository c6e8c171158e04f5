//! Rasterize the classified polygon graph into a biome-colored image.
//!
//! Each polygon is drawn as a fan of triangles around its site. Row 0 of the
//! image is `y = 0` of the map. A parallel buffer records which polygon owns
//! each pixel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use tracing::{debug, info, warn};

use crate::biomes::{Biome, RIVER};
use crate::error::GenerationError;
use crate::geometry::{convex_contains, polygon_area, segment_distance_sq, Bounds, Point};
use crate::graph::{CenterId, CornerId, Graph};
use crate::store::BiomeStore;
use crate::tilemap::Tilemap;

/// Owner value of a pixel no polygon covers.
pub const NO_OWNER: u32 = u32::MAX;

/// Drawn for a polygon that was never classified.
const UNCLASSIFIED: Rgb<u8> = Rgb([255, 0, 255]);

/// Two open corners this close in x or y lie on the same map side.
const SIDE_TOLERANCE: f64 = 1.0;

/// A rendered map and its per-pixel polygon owners.
pub struct Raster {
    pub image: RgbImage,
    pub owners: Tilemap<u32>,
}

impl Raster {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn owner(&self, x: u32, y: u32) -> Option<CenterId> {
        match *self.owners.get(x as usize, y as usize) {
            NO_OWNER => None,
            id => Some(CenterId(id)),
        }
    }
}

/// Draw every polygon in its biome color and every river edge on top.
/// Also records each center's area.
pub fn rasterize(graph: &mut Graph, biomes: &dyn BiomeStore) -> Result<Raster, GenerationError> {
    info!("Rasterizing map...");
    let width = graph.bounds.width.ceil().max(0.0) as u32;
    let height = graph.bounds.height.ceil().max(0.0) as u32;
    let palette = palette(graph, biomes)?;

    let mut image = RgbImage::from_pixel(width, height, UNCLASSIFIED);
    let mut owners = Tilemap::new_with(width as usize, height as usize, NO_OWNER);

    for i in 0..graph.centers.len() {
        let id = CenterId(i as u32);
        let shapes = center_polygons(graph, id);
        let color = graph.centers[i]
            .biome
            .as_ref()
            .and_then(|name| palette.get(name))
            .copied()
            .unwrap_or(UNCLASSIFIED);

        let mut area = 0.0;
        for shape in &shapes {
            area += polygon_area(shape);
            fill_convex(shape, width, height, |x, y| {
                image.put_pixel(x, y, color);
                owners.set(x as usize, y as usize, id.0);
            });
        }
        graph.centers[i].area = area;
    }

    match biomes.find_by_name(RIVER)? {
        Some(river) => draw_rivers(graph, &mut image, Rgb(river.rgb())),
        None => warn!("no {} biome, rivers are not drawn", RIVER),
    }

    let unowned = owners.iter().filter(|(_, _, o)| **o == NO_OWNER).count();
    if unowned > 0 {
        debug!(unowned, "pixels outside every polygon");
    }
    info!(width, height, "created bitmap");
    Ok(Raster { image, owners })
}

/// Colors of every biome named on the graph.
fn palette(graph: &Graph, biomes: &dyn BiomeStore) -> Result<HashMap<String, Rgb<u8>>, GenerationError> {
    let mut palette = HashMap::new();
    for name in graph.centers.iter().filter_map(|c| c.biome.as_ref()) {
        if palette.contains_key(name) {
            continue;
        }
        let biome: Biome = biomes
            .find_by_name(name)?
            .ok_or_else(|| GenerationError::MissingBiome(name.clone()))?;
        palette.insert(name.clone(), Rgb(biome.rgb()));
    }
    Ok(palette)
}

/// Convex pieces that together cover a center's polygon: one triangle per
/// bordering edge, plus the closing piece when the boundary is open.
pub fn center_polygons(graph: &Graph, id: CenterId) -> Vec<Vec<Point>> {
    let center = graph.center(id);
    let site = center.point;
    let mut shapes = Vec::with_capacity(center.borders.len() + 2);
    let mut references: HashMap<CornerId, usize> = HashMap::new();

    for &e in &center.borders {
        if let Some((a, b)) = graph.edge(e).corners() {
            shapes.push(vec![site, graph.corner(a).point, graph.corner(b).point]);
            *references.entry(a).or_default() += 1;
            *references.entry(b).or_default() += 1;
        }
    }

    let open: Vec<Point> = center
        .corners
        .iter()
        .filter(|&&q| references.get(&q) == Some(&1) && graph.corner(q).border)
        .map(|&q| graph.corner(q).point)
        .collect();
    if let [first, second] = open[..] {
        shapes.extend(closing_polygons(&graph.bounds, site, first, second));
    }
    shapes
}

/// Fill the gap between two open border corners. Corners on the same map
/// side need one triangle; otherwise the nearest map corner joins them.
fn closing_polygons(bounds: &Bounds, site: Point, first: Point, second: Point) -> Vec<Vec<Point>> {
    if (first.x - second.x).abs() <= SIDE_TOLERANCE || (first.y - second.y).abs() <= SIDE_TOLERANCE {
        return vec![vec![site, first, second]];
    }
    let corner = closing_corner(bounds, &first, &second);
    vec![vec![site, first, corner], vec![site, corner, second]]
}

fn closing_corner(bounds: &Bounds, first: &Point, second: &Point) -> Point {
    let snap_x = |p: &Point| {
        if (p.x - bounds.x).abs() <= SIDE_TOLERANCE {
            Some(bounds.x)
        } else if (p.x - bounds.right()).abs() <= SIDE_TOLERANCE {
            Some(bounds.right())
        } else {
            None
        }
    };
    let snap_y = |p: &Point| {
        if (p.y - bounds.y).abs() <= SIDE_TOLERANCE {
            Some(bounds.y)
        } else if (p.y - bounds.bottom()).abs() <= SIDE_TOLERANCE {
            Some(bounds.bottom())
        } else {
            None
        }
    };
    let fallback = bounds.nearest_corner(&first.lerp(second, 0.5));
    Point::new(
        snap_x(first).or_else(|| snap_x(second)).unwrap_or(fallback.x),
        snap_y(first).or_else(|| snap_y(second)).unwrap_or(fallback.y),
    )
}

/// Call `plot` for every pixel whose center lies in the convex `shape`.
fn fill_convex<F: FnMut(u32, u32)>(shape: &[Point], width: u32, height: u32, mut plot: F) {
    let Some((x0, y0, x1, y1)) = pixel_box(shape, 0.0, width, height) else {
        return;
    };
    for y in y0..y1 {
        for x in x0..x1 {
            if convex_contains(shape, &Point::new(x as f64 + 0.5, y as f64 + 0.5)) {
                plot(x, y);
            }
        }
    }
}

/// Half-open pixel range covering `shape` grown by `margin`, clipped to the image.
fn pixel_box(shape: &[Point], margin: f64, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let min_x = shape.iter().map(|p| p.x).fold(f64::INFINITY, f64::min) - margin;
    let max_x = shape.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max) + margin;
    let min_y = shape.iter().map(|p| p.y).fold(f64::INFINITY, f64::min) - margin;
    let max_y = shape.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max) + margin;
    if !(min_x.is_finite() && max_x.is_finite() && min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    let x0 = min_x.floor().clamp(0.0, width as f64) as u32;
    let x1 = max_x.ceil().clamp(0.0, width as f64) as u32;
    let y0 = min_y.floor().clamp(0.0, height as f64) as u32;
    let y1 = max_y.ceil().clamp(0.0, height as f64) as u32;
    Some((x0, y0, x1, y1))
}

/// Stroke width for an edge carrying `river` units of flow.
pub fn river_width(river: u32) -> u32 {
    1 + (2.0 * river as f64).sqrt().floor() as u32
}

fn draw_rivers(graph: &Graph, image: &mut RgbImage, color: Rgb<u8>) {
    let (width, height) = image.dimensions();
    let mut drawn = 0usize;
    for edge in graph.edges.iter().filter(|e| e.river > 0) {
        let Some((a, b)) = edge.corners() else {
            continue;
        };
        let (pa, pb) = (graph.corner(a).point, graph.corner(b).point);
        let radius = river_width(edge.river) as f64 / 2.0;
        let Some((x0, y0, x1, y1)) = pixel_box(&[pa, pb], radius, width, height) else {
            continue;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if segment_distance_sq(&p, &pa, &pb) <= radius * radius {
                    image.put_pixel(x, y, color);
                }
            }
        }
        drawn += 1;
    }
    debug!(drawn, "river edges drawn");
}

/// Write the map as `dir/file_name`, creating `dir` first.
pub fn export_map(image: &RgbImage, dir: &Path, file_name: &str) -> Result<PathBuf, image::ImageError> {
    std::fs::create_dir_all(dir).map_err(image::ImageError::IoError)?;
    let path = dir.join(file_name);
    image.save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{open_cell, relaxed_graph};
    use crate::store::BiomeRegistry;

    fn painted(graph: &mut Graph, name: &str) -> Raster {
        for center in &mut graph.centers {
            center.biome = Some(name.to_string());
        }
        rasterize(graph, &BiomeRegistry::default()).unwrap()
    }

    #[test]
    fn test_open_cell_is_closed_through_map_corner() {
        let mut graph = open_cell();
        let raster = painted(&mut graph, "Grassland");

        assert_eq!(raster.owner(0, 0), Some(CenterId(0)));
        assert_eq!(raster.owner(3, 0), Some(CenterId(0)));
        assert_eq!(raster.owner(9, 9), None);
        assert_eq!(raster.image.get_pixel(0, 0), &Rgb([0x88, 0xaa, 0x55]));
        assert!((graph.centers[0].area - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_closing_on_one_side_is_a_triangle() {
        let bounds = Bounds::square(10.0);
        let shapes = closing_polygons(&bounds, Point::new(2.0, 5.0), Point::new(0.0, 3.0), Point::new(0.0, 7.0));
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].len(), 3);
    }

    #[test]
    fn test_closing_corner_picks_shared_corner() {
        let bounds = Bounds::square(10.0);
        let corner = closing_corner(&bounds, &Point::new(10.0, 6.0), &Point::new(4.0, 10.0));
        assert_eq!(corner, Point::new(10.0, 10.0));
    }

    #[test]
    fn test_full_graph_is_covered() {
        let mut graph = relaxed_graph(42, 120, 100.0);
        let raster = painted(&mut graph, "Ocean");

        let total = (raster.width() * raster.height()) as usize;
        let owned = raster.owners.iter().filter(|(_, _, o)| **o != NO_OWNER).count();
        assert!(owned as f64 >= 0.99 * total as f64, "{} of {} pixels owned", owned, total);
        assert!(graph.centers.iter().all(|c| c.area > 0.0));
    }

    #[test]
    fn test_rivers_drawn_in_river_color() {
        let mut graph = relaxed_graph(5, 60, 80.0);
        let edge = graph.edges.iter().position(|e| e.d1.is_some()).unwrap();
        graph.edges[edge].river = 8;
        let (a, _) = graph.edges[edge].corners().unwrap();

        let raster = painted(&mut graph, "Ocean");

        let p = graph.corner(a).point;
        let (x, y) = ((p.x as u32).min(79), (p.y as u32).min(79));
        assert_eq!(raster.image.get_pixel(x, y), &Rgb([0x22, 0x55, 0x88]));
    }

    #[test]
    fn test_river_width_grows_with_flow() {
        assert_eq!(river_width(1), 2);
        assert_eq!(river_width(2), 3);
        assert_eq!(river_width(8), 5);
    }

    #[test]
    fn test_unknown_biome_fails() {
        let mut graph = open_cell();
        graph.centers[0].biome = Some("Swamp".to_string());
        let result = rasterize(&mut graph, &BiomeRegistry::default());
        assert!(matches!(result, Err(GenerationError::MissingBiome(name)) if name == "Swamp"));
    }

    #[test]
    fn test_export_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("maps").join("deep");
        let image = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));

        let path = export_map(&image, &nested, "seed-1-sites-2-lloyds-1.png").unwrap();

        assert!(path.exists());
        assert_eq!(image::open(&path).unwrap().to_rgb8().get_pixel(0, 0), &Rgb([1, 2, 3]));
    }

    #[test]
    fn test_export_into_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("maps");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let image = RgbImage::new(2, 2);

        assert!(export_map(&image, &blocker, "map.png").is_err());
    }
}
