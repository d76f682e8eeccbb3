//! Mask image to monitored region extraction

use super::TemplateConfig;
use crate::utils::ImageUtils;
use crate::{Error, Result};
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::contours::{self, BorderType};
use imageproc::region_labelling::{Connectivity, connected_components};
use lightpoint_core::{MonitoredRegion, Point};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Turns a binary mask into the fixed list of monitored regions.
pub struct RegionTemplateExtractor {
    config: TemplateConfig,
}

impl RegionTemplateExtractor {
    pub fn new(config: TemplateConfig) -> Self {
        Self { config }
    }

    /// Load the mask at `path` and extract regions at the given frame
    /// resolution.
    pub fn extract_from_file<P: AsRef<Path>>(
        &self,
        path: P,
        width: u32,
        height: u32,
    ) -> Result<Vec<MonitoredRegion>> {
        let mask = ImageUtils::load_mask(&path)?;
        debug!(path = ?path.as_ref(), width = mask.width(), height = mask.height(), "mask loaded");
        self.extract(&mask, width, height)
    }

    /// Scale, binarise and split `mask` into external connected components.
    ///
    /// Regions are numbered in discovery order (raster scan from the top-left).
    /// Fails with [Error::Template] when nothing survives the area filter.
    pub fn extract(&self, mask: &GrayImage, width: u32, height: u32) -> Result<Vec<MonitoredRegion>> {
        if width == 0 || height == 0 {
            return Err(Error::Template(format!(
                "invalid target resolution {}x{}",
                width, height
            )));
        }

        let scaled = ImageUtils::resize_nearest(mask, width, height);
        let binary = ImageUtils::binarize(&scaled, self.config.brightness_threshold);

        // Pixel counts per component
        let labels = connected_components(&binary, Connectivity::Eight, Luma([0u8]));
        let mut areas: HashMap<u32, u32> = HashMap::new();
        for label in labels.pixels() {
            if label[0] != 0 {
                *areas.entry(label[0]).or_insert(0) += 1;
            }
        }

        let mut regions = Vec::new();
        for contour in contours::find_contours::<i32>(&binary) {
            if contour.border_type != BorderType::Outer || contour.parent.is_some() {
                continue;
            }
            let Some(start) = contour.points.first() else {
                continue;
            };

            let label = labels.get_pixel(start.x as u32, start.y as u32)[0];
            let area = areas.get(&label).copied().unwrap_or(0);
            // Pixel count, not contour area; the contour runs through border pixel centres.
            if area < self.config.min_area {
                debug!(area, min_area = self.config.min_area, "dropping small component");
                continue;
            }

            let boundary = contour.points.iter().map(|p| Point::new(p.x, p.y)).collect();
            let mut region = MonitoredRegion::new(regions.len() as u32, boundary, area);
            // Concave shapes can put the polygon centroid outside the region.
            if !region.contains(region.centroid) {
                if let Some(snapped) = nearest_member(&labels, label, &region) {
                    debug!(id = region.id, from = ?region.centroid, to = ?snapped, "centroid snapped");
                    region.centroid = snapped;
                }
            }
            regions.push(region);
        }

        if regions.is_empty() {
            return Err(Error::Template(format!(
                "mask yields no regions of at least {} pixels",
                self.config.min_area
            )));
        }

        info!(regions = regions.len(), width, height, "region template extracted");
        Ok(regions)
    }
}

/// Pixel of component `label` inside `region` closest to its centroid.
fn nearest_member(labels: &ImageBuffer<Luma<u32>, Vec<u32>>, label: u32, region: &MonitoredRegion) -> Option<Point> {
    let (min, max) = region.bounding_box()?;
    let centroid = region.centroid;
    let x1 = max.x.min(labels.width() as i32 - 1);
    let y1 = max.y.min(labels.height() as i32 - 1);

    (min.y.max(0)..=y1)
        .flat_map(|y| (min.x.max(0)..=x1).map(move |x| Point::new(x, y)))
        .filter(|p| labels.get_pixel(p.x as u32, p.y as u32)[0] == label && region.contains(*p))
        .min_by_key(|p| {
            let (dx, dy) = ((p.x - centroid.x) as i64, (p.y - centroid.y) as i64);
            dx * dx + dy * dy
        })
}

impl Default for RegionTemplateExtractor {
    fn default() -> Self {
        Self::new(TemplateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paint(mask: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn test_extracts_each_component() -> Result<()> {
        let mut mask = GrayImage::new(64, 48);
        paint(&mut mask, 4, 4, 6, 6);
        paint(&mut mask, 30, 10, 8, 5);
        paint(&mut mask, 50, 30, 10, 10);

        let regions = RegionTemplateExtractor::default().extract(&mask, 64, 48)?;
        assert_eq!(regions.len(), 3);
        for (i, region) in regions.iter().enumerate() {
            assert_eq!(region.id, i as u32);
            assert!(region.contains(region.centroid));
        }
        assert_eq!(regions[0].pixel_area, 36);
        assert_eq!(regions[1].pixel_area, 40);
        assert_eq!(regions[2].pixel_area, 100);
        Ok(())
    }

    #[test]
    fn test_small_components_are_noise() -> Result<()> {
        let mut mask = GrayImage::new(32, 32);
        paint(&mut mask, 2, 2, 2, 2);
        paint(&mut mask, 10, 10, 5, 5);

        let regions = RegionTemplateExtractor::default().extract(&mask, 32, 32)?;
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].pixel_area, 25);
        Ok(())
    }

    #[test]
    fn test_scaled_to_frame_resolution() -> Result<()> {
        let mut mask = GrayImage::new(16, 12);
        paint(&mut mask, 4, 4, 4, 4);

        let regions = RegionTemplateExtractor::default().extract(&mask, 64, 48)?;
        assert_eq!(regions.len(), 1);
        let (min, max) = regions[0].bounding_box().unwrap();
        assert!(min.x >= 14 && min.x <= 18);
        assert!(max.x >= 29 && max.x <= 33);
        assert!((225..=289).contains(&regions[0].pixel_area));
        Ok(())
    }

    #[test]
    fn test_nested_components_are_not_external() -> Result<()> {
        let mut mask = GrayImage::new(40, 40);
        paint(&mut mask, 5, 5, 30, 30);
        // Punch a hole and put an island inside it.
        for y in 10..30 {
            for x in 10..30 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        paint(&mut mask, 17, 17, 6, 6);

        let regions = RegionTemplateExtractor::default().extract(&mask, 40, 40)?;
        assert_eq!(regions.len(), 1);
        Ok(())
    }

    #[test]
    fn test_concave_centroid_stays_inside() -> Result<()> {
        // A "C": top bar, left bar, bottom bar.
        let mut mask = GrayImage::new(40, 40);
        paint(&mut mask, 5, 5, 12, 3);
        paint(&mut mask, 5, 5, 3, 12);
        paint(&mut mask, 5, 14, 12, 3);

        let regions = RegionTemplateExtractor::default().extract(&mask, 40, 40)?;
        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        assert_eq!(region.pixel_area, 90);
        assert!(region.contains(region.centroid));
        let c = region.centroid;
        assert_eq!(mask.get_pixel(c.x as u32, c.y as u32)[0], 255);
        Ok(())
    }

    #[test]
    fn test_u_shape_centroid_stays_inside() -> Result<()> {
        let mut mask = GrayImage::new(50, 50);
        paint(&mut mask, 10, 10, 4, 30);
        paint(&mut mask, 36, 10, 4, 30);
        paint(&mut mask, 10, 36, 30, 4);

        let regions = RegionTemplateExtractor::default().extract(&mask, 50, 50)?;
        assert_eq!(regions.len(), 1);
        let c = regions[0].centroid;
        assert!(regions[0].contains(c));
        assert_eq!(mask.get_pixel(c.x as u32, c.y as u32)[0], 255);
        Ok(())
    }

    #[test]
    fn test_min_area_counts_pixels() -> Result<()> {
        // 3x3 has 9 pixels and 3x4 has 12. Their contour areas (4 and 6)
        // would both fall below 10.
        let mut mask = GrayImage::new(30, 30);
        paint(&mut mask, 2, 2, 3, 3);
        paint(&mut mask, 20, 20, 3, 4);

        let regions = RegionTemplateExtractor::default().extract(&mask, 30, 30)?;
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].pixel_area, 12);
        assert!(regions[0].polygon_area() < 10.0);
        Ok(())
    }

    #[test]
    fn test_empty_mask_is_template_error() {
        let mask = GrayImage::new(20, 20);
        let err = RegionTemplateExtractor::default().extract(&mask, 20, 20).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn test_dim_pixels_are_not_monitored() {
        let mut mask = GrayImage::new(20, 20);
        for y in 5..15 {
            for x in 5..15 {
                mask.put_pixel(x, y, Luma([150]));
            }
        }
        assert!(RegionTemplateExtractor::default().extract(&mask, 20, 20).is_err());
    }
}
