//! Small 2D geometry helpers shared by the graph builder and the rasterizer.

use serde::{Deserialize, Serialize};

/// A point in map space. `x` grows right, `y` grows down (raster order).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }
}

impl From<&voronoice::Point> for Point {
    fn from(p: &voronoice::Point) -> Self {
        Point::new(p.x, p.y)
    }
}

impl From<Point> for voronoice::Point {
    fn from(p: Point) -> Self {
        voronoice::Point { x: p.x, y: p.y }
    }
}

/// Arithmetic mean of a set of points, `None` when empty.
pub fn mean_point<'a, I>(points: I) -> Option<Point>
where
    I: IntoIterator<Item = &'a Point>,
{
    let mut sum = Point::default();
    let mut count = 0usize;
    for p in points {
        sum.x += p.x;
        sum.y += p.y;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(Point::new(sum.x / count as f64, sum.y / count as f64))
    }
}

/// Unsigned shoelace area of a simple polygon.
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..points.len() {
        let a = &points[i];
        let b = &points[(i + 1) % points.len()];
        twice += a.x * b.y - b.x * a.y;
    }
    twice.abs() / 2.0
}

fn cross(o: &Point, a: &Point, b: &Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Inclusive point-in-convex-polygon test that works for either winding.
pub fn convex_contains(polygon: &[Point], p: &Point) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut positive = false;
    let mut negative = false;
    for i in 0..polygon.len() {
        let c = cross(&polygon[i], &polygon[(i + 1) % polygon.len()], p);
        if c > 1e-9 {
            positive = true;
        } else if c < -1e-9 {
            negative = true;
        }
        if positive && negative {
            return false;
        }
    }
    true
}

/// Squared distance from `p` to the segment `a`–`b`.
pub fn segment_distance_sq(p: &Point, a: &Point, b: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_sq(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_sq(&Point::new(a.x + t * dx, a.y + t * dy))
}

/// Axis-aligned rectangle `[x, x + width] × [y, y + height]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn square(extent: f64) -> Self {
        Self { x: 0.0, y: 0.0, width: extent, height: extent }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// True when `p` lies on one of the four sides.
    pub fn lies_on_edge(&self, p: &Point) -> bool {
        const EPS: f64 = 1e-6;
        (p.x - self.x).abs() < EPS
            || (p.x - self.right()).abs() < EPS
            || (p.y - self.y).abs() < EPS
            || (p.y - self.bottom()).abs() < EPS
    }

    /// The rectangle corner closest to `p`.
    pub fn nearest_corner(&self, p: &Point) -> Point {
        let x = if (p.x - self.x).abs() <= (p.x - self.right()).abs() { self.x } else { self.right() };
        let y = if (p.y - self.y).abs() <= (p.y - self.bottom()).abs() { self.y } else { self.bottom() };
        Point::new(x, y)
    }

    /// Map `p` into `[-1, 1]²` relative to the rectangle.
    pub fn normalize(&self, p: &Point) -> Point {
        Point::new(2.0 * ((p.x - self.x) / self.width - 0.5), 2.0 * ((p.y - self.y) / self.height - 0.5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_area_ignores_winding() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(4.0, 0.0);
        let c = Point::new(0.0, 3.0);

        assert_eq!(polygon_area(&[a, b, c]), 6.0);
        assert_eq!(polygon_area(&[a, c, b]), 6.0);
    }

    #[test]
    fn test_convex_contains_either_winding() {
        let square = [
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        let mut reversed = square;
        reversed.reverse();

        for poly in [&square[..], &reversed[..]] {
            assert!(convex_contains(poly, &Point::new(1.0, 1.0)));
            assert!(convex_contains(poly, &Point::new(2.0, 1.0)));
            assert!(!convex_contains(poly, &Point::new(2.5, 1.0)));
        }
    }

    #[test]
    fn test_bounds_edges_and_corners() {
        let bounds = Bounds::square(100.0);

        assert!(bounds.lies_on_edge(&Point::new(0.0, 40.0)));
        assert!(bounds.lies_on_edge(&Point::new(40.0, 100.0)));
        assert!(!bounds.lies_on_edge(&Point::new(40.0, 60.0)));
        assert_eq!(bounds.nearest_corner(&Point::new(90.0, 5.0)), Point::new(100.0, 0.0));
        assert_eq!(bounds.normalize(&Point::new(50.0, 100.0)), Point::new(0.0, 1.0));
    }

    #[test]
    fn test_mean_point() {
        let points = [Point::new(0.0, 0.0), Point::new(2.0, 4.0)];
        assert_eq!(mean_point(points.iter()), Some(Point::new(1.0, 2.0)));
        assert_eq!(mean_point([].iter()), None);
    }

    #[test]
    fn test_segment_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(segment_distance_sq(&Point::new(5.0, 3.0), &a, &b), 9.0);
        assert_eq!(segment_distance_sq(&Point::new(-4.0, 3.0), &a, &b), 25.0);
        assert_eq!(segment_distance_sq(&Point::new(1.0, 1.0), &a, &a), 2.0);
    }
}
