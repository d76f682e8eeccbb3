//! Monitored regions derived from the mask template

use serde::{Deserialize, Serialize};

/// Index of a region within its template, in discovery order.
pub type RegionId = u32;

/// Integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One named zone of interest.
///
/// Built once from the mask and never mutated afterwards; sessions share the
/// region list read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredRegion {
    pub id: RegionId,
    pub centroid: Point,
    pub pixel_area: u32,
    /// Closed polygon; the last point connects back to the first.
    pub boundary: Vec<Point>,
}

impl MonitoredRegion {
    /// Create a region, deriving the centroid from the boundary polygon.
    pub fn new(id: RegionId, boundary: Vec<Point>, pixel_area: u32) -> Self {
        let centroid = polygon_centroid(&boundary);
        Self {
            id,
            centroid,
            pixel_area,
            boundary,
        }
    }

    /// Inclusive bounding box as (min, max) corners.
    pub fn bounding_box(&self) -> Option<(Point, Point)> {
        let first = self.boundary.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &self.boundary[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }

    /// Signed-area magnitude of the boundary polygon (shoelace formula).
    pub fn polygon_area(&self) -> f64 {
        signed_area(&self.boundary).abs()
    }

    /// Point-in-polygon test. Points lying on the boundary count as inside,
    /// which matches a filled-polygon rasterisation of the contour.
    pub fn contains(&self, p: Point) -> bool {
        let n = self.boundary.len();
        if n == 0 {
            return false;
        }
        if n == 1 {
            return self.boundary[0] == p;
        }

        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let a = self.boundary[i];
            let b = self.boundary[j];
            if on_segment(a, b, p) {
                return true;
            }
            // Crossing-number test on the half-open edge.
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x as f64
                    + (p.y - a.y) as f64 * (b.x - a.x) as f64 / (b.y - a.y) as f64;
                if (p.x as f64) < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    let cross = (b.x - a.x) as i64 * (p.y - a.y) as i64 - (b.y - a.y) as i64 * (p.x - a.x) as i64;
    cross == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

fn signed_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0i64;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        acc += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
    }
    acc as f64 / 2.0
}

/// Area-weighted polygon centroid, falling back to the bounding box centre
/// for degenerate (zero-area) boundaries.
fn polygon_centroid(points: &[Point]) -> Point {
    let area = signed_area(points);
    if area.abs() > f64::EPSILON {
        let n = points.len();
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..n {
            let a = points[i];
            let b = points[(i + 1) % n];
            let cross = (a.x as f64) * (b.y as f64) - (b.x as f64) * (a.y as f64);
            cx += (a.x + b.x) as f64 * cross;
            cy += (a.y + b.y) as f64 * cross;
        }
        let k = 1.0 / (6.0 * area);
        return Point::new((cx * k) as i32, (cy * k) as i32);
    }

    match points.first() {
        Some(first) => {
            let (mut min, mut max) = (*first, *first);
            for p in points {
                min.x = min.x.min(p.x);
                min.y = min.y.min(p.y);
                max.x = max.x.max(p.x);
                max.y = max.y.max(p.y);
            }
            Point::new((min.x + max.x) / 2, (min.y + max.y) / 2)
        }
        None => Point::new(0, 0),
    }
}
