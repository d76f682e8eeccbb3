//! Frame source backed by still images

use super::{CaptureError, CaptureSettings};
use crate::traits::FrameSource;
use crate::Frame;
use image::imageops::FilterType;
use std::path::PathBuf;
use tracing::debug;

/// Cycles through a fixed list of images, one per read.
///
/// Useful for dry runs without hardware. Frames are resized to the capture
/// resolution on open so region templates line up.
pub struct StillImageSource {
    paths: Vec<PathBuf>,
    frames: Vec<Frame>,
    next: usize,
    open: bool,
}

impl StillImageSource {
    /// Source reading the given image files on open.
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            frames: Vec::new(),
            next: 0,
            open: false,
        }
    }

    /// Source serving frames already in memory.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        Self {
            paths: Vec::new(),
            frames,
            next: 0,
            open: false,
        }
    }
}

impl FrameSource for StillImageSource {
    fn open(&mut self, settings: &CaptureSettings) -> Result<(), CaptureError> {
        for path in &self.paths {
            let frame = image::open(path)?.to_rgb8();
            debug!(path = ?path, "still frame loaded");
            self.frames.push(frame);
        }
        self.paths.clear();

        if self.frames.is_empty() {
            return Err(CaptureError::OpenFailed("still image source with no frames".into()));
        }

        let (width, height) = (settings.width, settings.height);
        for frame in &mut self.frames {
            if frame.dimensions() != (width, height) {
                *frame = image::imageops::resize(frame, width, height, FilterType::Triangle);
            }
        }

        self.next = 0;
        self.open = true;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        if !self.open {
            return Err(CaptureError::NotOpen);
        }
        let frame = self.frames.get(self.next).cloned().ok_or(CaptureError::NoFrame)?;
        self.next = (self.next + 1) % self.frames.len();
        Ok(frame)
    }

    fn release(&mut self) {
        self.open = false;
    }

    fn describe(&self) -> String {
        format!("still images ({} frames)", self.frames.len().max(self.paths.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn settings(width: u32, height: u32) -> CaptureSettings {
        CaptureSettings {
            width,
            height,
            ..Default::default()
        }
    }

    #[test]
    fn test_cycles_frames() -> Result<(), CaptureError> {
        let a = Frame::from_pixel(8, 8, Rgb([255, 0, 0]));
        let b = Frame::from_pixel(8, 8, Rgb([0, 0, 255]));
        let mut source = StillImageSource::from_frames(vec![a.clone(), b.clone()]);

        assert!(matches!(source.read_frame(), Err(CaptureError::NotOpen)));
        source.open(&settings(8, 8))?;
        assert_eq!(source.read_frame()?, a);
        assert_eq!(source.read_frame()?, b);
        assert_eq!(source.read_frame()?, a);

        source.release();
        assert!(source.read_frame().is_err());
        Ok(())
    }

    #[test]
    fn test_resizes_to_capture_resolution() -> Result<(), CaptureError> {
        let mut source = StillImageSource::from_frames(vec![Frame::new(16, 12)]);
        source.open(&settings(32, 24))?;
        assert_eq!(source.read_frame()?.dimensions(), (32, 24));
        Ok(())
    }

    #[test]
    fn test_loads_files() -> Result<(), CaptureError> {
        let dir = tempfile::tempdir().map_err(|e| CaptureError::OpenFailed(e.to_string()))?;
        let path = dir.path().join("frame.png");
        Frame::from_pixel(4, 4, Rgb([10, 200, 30])).save(&path)?;

        let mut source = StillImageSource::from_paths(vec![path]);
        source.open(&settings(4, 4))?;
        assert_eq!(source.read_frame()?.get_pixel(1, 1), &Rgb([10, 200, 30]));
        Ok(())
    }

    #[test]
    fn test_empty_source_fails_to_open() {
        let mut source = StillImageSource::from_frames(Vec::new());
        assert!(source.open(&settings(4, 4)).is_err());
    }
}
