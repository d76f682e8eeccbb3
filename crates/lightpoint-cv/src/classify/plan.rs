//! Per-region sample coordinates, computed once per frame size

use crate::utils::region_pixels;
use lightpoint_core::{MonitoredRegion, RegionId};

/// The fixed-stride sample of every region of a template at one frame size.
///
/// Regions never change after extraction, so a session builds this once and
/// each scan only reads the stored coordinates.
#[derive(Debug, Clone)]
pub struct SamplePlan {
    width: u32,
    height: u32,
    samples: Vec<(RegionId, Vec<(u32, u32)>)>,
}

impl SamplePlan {
    pub fn new(regions: &[MonitoredRegion], width: u32, height: u32, sample_cap: usize) -> Self {
        let samples = regions
            .iter()
            .map(|region| {
                let pixels = region_pixels(region, width, height);
                (region.id, stride_sample(pixels, sample_cap))
            })
            .collect();
        Self {
            width,
            height,
            samples,
        }
    }

    /// Whether the plan was built for a `width` x `height` frame.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }

    pub fn samples(&self, id: RegionId) -> Option<&[(u32, u32)]> {
        self.samples
            .iter()
            .find(|(region_id, _)| *region_id == id)
            .map(|(_, samples)| samples.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &[(u32, u32)])> + '_ {
        self.samples.iter().map(|(id, samples)| (*id, samples.as_slice()))
    }
}

/// Every `ceil(len / cap)`-th pixel, so at most `cap` remain.
pub(crate) fn stride_sample(pixels: Vec<(u32, u32)>, cap: usize) -> Vec<(u32, u32)> {
    let stride = pixels.len().div_ceil(cap.max(1)).max(1);
    if stride == 1 {
        return pixels;
    }
    pixels.into_iter().step_by(stride).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightpoint_core::Point;

    fn square(id: RegionId, x0: i32, y0: i32, side: i32) -> MonitoredRegion {
        let boundary = vec![
            Point::new(x0, y0),
            Point::new(x0, y0 + side - 1),
            Point::new(x0 + side - 1, y0 + side - 1),
            Point::new(x0 + side - 1, y0),
        ];
        MonitoredRegion::new(id, boundary, (side * side) as u32)
    }

    #[test]
    fn test_large_region_sample_is_capped() {
        let plan = SamplePlan::new(&[square(0, 10, 10, 300)], 640, 480, 100);
        let samples = plan.samples(0).unwrap();
        // 90000 pixels at stride 900.
        assert_eq!(samples.len(), 100);
        assert_eq!(samples[0], (10, 10));
        assert!(plan.fits(640, 480));
        assert!(!plan.fits(320, 240));
    }

    #[test]
    fn test_small_region_keeps_every_pixel() {
        let plan = SamplePlan::new(&[square(0, 0, 0, 5), square(1, 10, 10, 3)], 20, 20, 100);
        assert_eq!(plan.samples(0).map(<[_]>::len), Some(25));
        assert_eq!(plan.samples(1).map(<[_]>::len), Some(9));
        assert!(plan.samples(2).is_none());
        assert_eq!(plan.iter().count(), 2);
    }

    #[test]
    fn test_region_outside_frame_has_no_samples() {
        let plan = SamplePlan::new(&[square(0, 50, 50, 5)], 20, 20, 100);
        assert_eq!(plan.samples(0).map(<[_]>::len), Some(0));
    }
}
