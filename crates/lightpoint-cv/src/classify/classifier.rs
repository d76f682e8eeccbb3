//! Colour-space membership test over sampled region pixels

use super::plan::stride_sample;
use super::{ClassifierConfig, Hsv, SamplePlan};
use crate::utils::region_pixels;
use crate::Frame;
use lightpoint_core::{ClassificationSnapshot, MonitoredRegion};

/// Decides whether a region is "active" in a frame.
///
/// Pure and deterministic: the same frame and region always give the same
/// answer, sampling uses a fixed stride.
#[derive(Debug, Clone, Default)]
pub struct RegionClassifier {
    config: ClassifierConfig,
}

impl RegionClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one region. Regions with no pixels inside the frame are
    /// inactive.
    pub fn classify(&self, frame: &Frame, region: &MonitoredRegion) -> bool {
        self.is_active(self.match_fraction(frame, region))
    }

    /// Fraction of sampled pixels inside either HSV band, or `None` when the
    /// region does not intersect the frame.
    ///
    /// Rasterises the region on every call; repeated scans should go through
    /// a [SamplePlan].
    pub fn match_fraction(&self, frame: &Frame, region: &MonitoredRegion) -> Option<f64> {
        let pixels = region_pixels(region, frame.width(), frame.height());
        self.sample_fraction(frame, &stride_sample(pixels, self.config.sample_cap))
    }

    /// Fraction of the given sample coordinates that match. Coordinates
    /// outside the frame are not counted.
    pub fn sample_fraction(&self, frame: &Frame, samples: &[(u32, u32)]) -> Option<f64> {
        let mut sampled = 0usize;
        let mut matched = 0usize;
        for &(x, y) in samples {
            let Some(pixel) = frame.get_pixel_checked(x, y) else {
                continue;
            };
            sampled += 1;
            if self.config.matches(Hsv::from_rgb(*pixel)) {
                matched += 1;
            }
        }

        (sampled > 0).then(|| matched as f64 / sampled as f64)
    }

    fn is_active(&self, fraction: Option<f64>) -> bool {
        fraction.is_some_and(|fraction| fraction > self.config.match_ratio)
    }

    /// Sample coordinates for `regions` at one frame size, capped per region.
    pub fn plan(&self, regions: &[MonitoredRegion], width: u32, height: u32) -> SamplePlan {
        SamplePlan::new(regions, width, height, self.config.sample_cap)
    }

    /// Classify every region of a plan. Cost depends on the sample cap, not
    /// on region size.
    pub fn classify_planned(&self, frame: &Frame, plan: &SamplePlan) -> ClassificationSnapshot {
        plan.iter()
            .map(|(id, samples)| (id, self.is_active(self.sample_fraction(frame, samples))))
            .collect()
    }

    /// Classify every region of a template against one frame.
    pub fn classify_all(&self, frame: &Frame, regions: &[MonitoredRegion]) -> ClassificationSnapshot {
        let plan = self.plan(regions, frame.width(), frame.height());
        self.classify_planned(frame, &plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use lightpoint_core::Point;

    const RED: Rgb<u8> = Rgb([230, 20, 20]);
    const DARK: Rgb<u8> = Rgb([20, 20, 20]);

    fn rect(id: u32, x0: i32, y0: i32, x1: i32, y1: i32) -> MonitoredRegion {
        let boundary = vec![
            Point::new(x0, y0),
            Point::new(x0, y1),
            Point::new(x1, y1),
            Point::new(x1, y0),
        ];
        MonitoredRegion::new(id, boundary, ((x1 - x0 + 1) * (y1 - y0 + 1)) as u32)
    }

    fn frame_with(fill: Rgb<u8>, lit: &[(u32, u32)]) -> Frame {
        let mut frame = Frame::from_pixel(40, 40, fill);
        for &(x, y) in lit {
            frame.put_pixel(x, y, RED);
        }
        frame
    }

    #[test]
    fn test_lit_region_is_active() {
        let classifier = RegionClassifier::default();
        let region = rect(0, 5, 5, 14, 14);
        assert!(classifier.classify(&Frame::from_pixel(40, 40, RED), &region));
        assert!(!classifier.classify(&Frame::from_pixel(40, 40, DARK), &region));
    }

    #[test]
    fn test_partial_fill_above_ratio_is_active() {
        let classifier = RegionClassifier::default();
        let region = rect(0, 0, 0, 9, 9);

        // Two full rows out of ten: 20% of samples match.
        let lit: Vec<(u32, u32)> = (0..2).flat_map(|y| (0..10).map(move |x| (x, y))).collect();
        let frame = frame_with(DARK, &lit);
        assert_eq!(classifier.match_fraction(&frame, &region), Some(0.2));
        assert!(classifier.classify(&frame, &region));

        // One row: exactly 10% does not exceed the ratio.
        let lit: Vec<(u32, u32)> = (0..10).map(|x| (x, 0)).collect();
        let frame = frame_with(DARK, &lit);
        assert_eq!(classifier.match_fraction(&frame, &region), Some(0.1));
        assert!(!classifier.classify(&frame, &region));
    }

    #[test]
    fn test_sampling_is_capped() {
        let classifier = RegionClassifier::new(ClassifierConfig {
            sample_cap: 10,
            ..Default::default()
        });
        // 25 pixels, stride 3: samples 0, 3, ..., 24.
        let region = rect(0, 0, 0, 4, 4);
        let lit: Vec<(u32, u32)> = vec![(0, 0), (3, 0), (1, 1), (4, 1)];
        let frame = frame_with(DARK, &lit);
        let fraction = classifier.match_fraction(&frame, &region).unwrap();
        assert_eq!(fraction, 4.0 / 9.0);
    }

    #[test]
    fn test_planned_matches_direct_for_large_region() {
        let classifier = RegionClassifier::default();
        let region = rect(0, 20, 20, 319, 319);
        let mut frame = Frame::from_pixel(640, 480, DARK);
        for y in 20..320 {
            for x in 20..100 {
                frame.put_pixel(x, y, RED);
            }
        }

        let plan = classifier.plan(std::slice::from_ref(&region), 640, 480);
        let samples = plan.samples(0).unwrap();
        assert!(samples.len() <= classifier.config().sample_cap);

        let direct = classifier.match_fraction(&frame, &region);
        assert_eq!(classifier.sample_fraction(&frame, samples), direct);
        assert_eq!(
            classifier.classify_planned(&frame, &plan).get(0),
            Some(classifier.classify(&frame, &region))
        );
    }

    #[test]
    fn test_samples_outside_frame_are_skipped() {
        let classifier = RegionClassifier::default();
        let frame = Frame::from_pixel(10, 10, RED);
        assert_eq!(classifier.sample_fraction(&frame, &[(1, 1), (50, 50)]), Some(1.0));
        assert_eq!(classifier.sample_fraction(&frame, &[(50, 50)]), None);
    }

    #[test]
    fn test_deterministic() {
        let classifier = RegionClassifier::default();
        let region = rect(0, 3, 3, 30, 30);
        let lit: Vec<(u32, u32)> = (3..31).step_by(4).map(|x| (x, 10)).collect();
        let frame = frame_with(DARK, &lit);
        let first = classifier.match_fraction(&frame, &region);
        for _ in 0..5 {
            assert_eq!(classifier.match_fraction(&frame, &region), first);
        }
    }

    #[test]
    fn test_region_outside_frame_is_inactive() {
        let classifier = RegionClassifier::default();
        let region = rect(0, 100, 100, 110, 110);
        let frame = Frame::from_pixel(40, 40, RED);
        assert_eq!(classifier.match_fraction(&frame, &region), None);
        assert!(!classifier.classify(&frame, &region));
    }

    #[test]
    fn test_classify_all_covers_every_region() {
        let classifier = RegionClassifier::default();
        let regions = vec![rect(0, 0, 0, 4, 4), rect(1, 10, 10, 14, 14), rect(2, 20, 20, 24, 24)];
        let lit: Vec<(u32, u32)> = (10..15).flat_map(|y| (10..15).map(move |x| (x, y))).collect();
        let snapshot = classifier.classify_all(&frame_with(DARK, &lit), &regions);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.get(0), Some(false));
        assert_eq!(snapshot.get(1), Some(true));
        assert_eq!(snapshot.active_count(), 1);
    }
}
