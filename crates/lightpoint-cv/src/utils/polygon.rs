//! Rasterisation of region boundaries onto a frame

use lightpoint_core::{MonitoredRegion, Point};

/// Pixels of `region` that fall inside a `width` x `height` frame, in
/// row-major order. Boundary pixels are included.
///
/// Scanline fill: each row costs one pass over the edges plus one over its
/// span. Membership agrees with [MonitoredRegion::contains].
pub fn region_pixels(region: &MonitoredRegion, width: u32, height: u32) -> Vec<(u32, u32)> {
    let Some((min, max)) = region.bounding_box() else {
        return Vec::new();
    };
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let x0 = min.x.max(0);
    let y0 = min.y.max(0);
    let x1 = max.x.min(width as i32 - 1);
    let y1 = max.y.min(height as i32 - 1);
    if x0 > x1 || y0 > y1 {
        return Vec::new();
    }

    // Same edge orientation as `contains`: (boundary[i], boundary[i - 1]).
    let boundary = &region.boundary;
    let n = boundary.len();
    let edges: Vec<(Point, Point)> = (0..n).map(|i| (boundary[i], boundary[(i + n - 1) % n])).collect();

    let span = (x1 - x0 + 1) as usize;
    let mut on_edge = vec![false; span];
    let mut crossings: Vec<f64> = Vec::new();
    let mut pixels = Vec::new();

    for y in y0..=y1 {
        on_edge.iter_mut().for_each(|flag| *flag = false);
        crossings.clear();

        for &(a, b) in &edges {
            if y < a.y.min(b.y) || y > a.y.max(b.y) {
                continue;
            }
            if a.y == b.y {
                mark(&mut on_edge, x0, x1, a.x.min(b.x), a.x.max(b.x));
            } else {
                // Integer points exactly on the segment.
                let num = (y - a.y) as i64 * (b.x - a.x) as i64;
                let den = (b.y - a.y) as i64;
                if num % den == 0 {
                    let x = a.x + (num / den) as i32;
                    mark(&mut on_edge, x0, x1, x, x);
                }
            }
            if (a.y > y) != (b.y > y) {
                crossings.push(
                    a.x as f64 + (y - a.y) as f64 * (b.x - a.x) as f64 / (b.y - a.y) as f64,
                );
            }
        }
        crossings.sort_by(f64::total_cmp);

        for x in x0..=x1 {
            let right_of = crossings.len() - crossings.partition_point(|&c| c <= x as f64);
            if on_edge[(x - x0) as usize] || right_of % 2 == 1 {
                pixels.push((x as u32, y as u32));
            }
        }
    }
    pixels
}

fn mark(flags: &mut [bool], x0: i32, x1: i32, from: i32, to: i32) {
    let from = from.max(x0);
    let to = to.min(x1);
    for x in from..=to {
        flags[(x - x0) as usize] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: i32, y0: i32, x1: i32, y1: i32) -> MonitoredRegion {
        let boundary = vec![
            Point::new(x0, y0),
            Point::new(x0, y1),
            Point::new(x1, y1),
            Point::new(x1, y0),
        ];
        MonitoredRegion::new(0, boundary, ((x1 - x0 + 1) * (y1 - y0 + 1)) as u32)
    }

    #[test]
    fn test_rect_pixels_include_border() {
        let pixels = region_pixels(&rect(2, 2, 5, 4), 10, 10);
        assert_eq!(pixels.len(), 4 * 3);
        assert_eq!(pixels.first(), Some(&(2, 2)));
        assert_eq!(pixels.last(), Some(&(5, 4)));
    }

    fn brute_force(region: &MonitoredRegion, width: u32, height: u32) -> Vec<(u32, u32)> {
        (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .filter(|&(x, y)| region.contains(Point::new(x as i32, y as i32)))
            .collect()
    }

    #[test]
    fn test_scanline_agrees_with_contains() {
        let c_shape = vec![
            Point::new(5, 5),
            Point::new(5, 16),
            Point::new(16, 16),
            Point::new(16, 14),
            Point::new(7, 14),
            Point::new(7, 7),
            Point::new(16, 7),
            Point::new(16, 5),
        ];
        let triangle = vec![Point::new(2, 1), Point::new(17, 9), Point::new(4, 18)];
        let dot = vec![Point::new(3, 3)];
        let line = vec![Point::new(1, 1), Point::new(9, 5)];

        for boundary in [c_shape, triangle, dot, line] {
            let region = MonitoredRegion::new(0, boundary, 0);
            assert_eq!(region_pixels(&region, 20, 20), brute_force(&region, 20, 20));
        }
    }

    #[test]
    fn test_clipped_to_frame() {
        let pixels = region_pixels(&rect(8, 8, 20, 20), 10, 10);
        assert_eq!(pixels.len(), 4);
        assert!(region_pixels(&rect(30, 30, 40, 40), 10, 10).is_empty());
    }
}
