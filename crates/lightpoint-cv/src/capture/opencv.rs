//! Local camera devices through OpenCV's videoio

use super::{CaptureError, CaptureSettings};
use crate::traits::FrameSource;
use crate::Frame;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use tracing::{debug, warn};

/// A camera addressed by its device index.
pub struct OpenCvCamera {
    index: i32,
    capture: Option<VideoCapture>,
}

impl OpenCvCamera {
    pub fn new(index: i32) -> Self {
        Self {
            index,
            capture: None,
        }
    }

    fn apply_settings(capture: &mut VideoCapture, settings: &CaptureSettings) -> Result<(), CaptureError> {
        // V4L convention: 0.25 manual, 0.75 aperture priority.
        let auto_exposure = if settings.auto_exposure { 0.75 } else { 0.25 };
        let props = [
            (videoio::CAP_PROP_FRAME_WIDTH, f64::from(settings.width)),
            (videoio::CAP_PROP_FRAME_HEIGHT, f64::from(settings.height)),
            (videoio::CAP_PROP_FPS, f64::from(settings.fps)),
            (videoio::CAP_PROP_BUFFERSIZE, f64::from(settings.buffer_size)),
            (videoio::CAP_PROP_BRIGHTNESS, f64::from(settings.brightness)),
            (videoio::CAP_PROP_CONTRAST, f64::from(settings.contrast)),
            (videoio::CAP_PROP_SATURATION, f64::from(settings.saturation)),
            (videoio::CAP_PROP_AUTO_EXPOSURE, auto_exposure),
            (videoio::CAP_PROP_EXPOSURE, settings.exposure),
        ];
        for (prop, value) in props {
            // Drivers silently ignore unsupported properties; only log it.
            if !capture.set(prop, value)? {
                debug!(prop, value, "capture property not accepted");
            }
        }
        Ok(())
    }

    fn mat_to_frame(bgr: &Mat) -> Result<Frame, CaptureError> {
        let mut rgb = Mat::default();
        imgproc::cvt_color(bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;

        let (width, height) = (rgb.cols(), rgb.rows());
        if width <= 0 || height <= 0 {
            return Err(CaptureError::NoFrame);
        }
        let bytes = rgb.data_bytes()?.to_vec();
        Frame::from_raw(width as u32, height as u32, bytes)
            .ok_or_else(|| CaptureError::BadFrame(format!("{width}x{height} buffer size mismatch")))
    }
}

impl FrameSource for OpenCvCamera {
    fn open(&mut self, settings: &CaptureSettings) -> Result<(), CaptureError> {
        let mut capture = VideoCapture::new(self.index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(CaptureError::OpenFailed(self.describe()));
        }
        Self::apply_settings(&mut capture, settings)?;
        self.capture = Some(capture);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let capture = self.capture.as_mut().ok_or(CaptureError::NotOpen)?;
        let mut mat = Mat::default();
        if !capture.read(&mut mat)? || mat.empty() {
            return Err(CaptureError::NoFrame);
        }
        Self::mat_to_frame(&mat)
    }

    fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Err(e) = capture.release() {
                warn!(device = self.index, error = %e, "failed to release camera");
            }
        }
    }

    fn describe(&self) -> String {
        format!("camera device {}", self.index)
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        self.release();
    }
}
