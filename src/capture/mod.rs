//! Screen region capture.
//!
//! This module provides:
//! - Region geometry (`region::CaptureLayout`)
//! - The capture burst that samples every region with the modifier held
//! - A GDI screen grabber on Windows (`screen::GdiGrabber`)

pub mod region;
#[cfg(windows)]
pub mod screen;

pub use region::{CaptureLayout, Region};

use anyhow::Result;
use image::RgbaImage;
use std::time::Duration;

use crate::input::{Key, KeySink, KeyHold};

/// Source of screen pixels.
pub trait ScreenGrabber: Send + Sync {
    fn grab(&self, region: &Region) -> Result<RgbaImage>;
}

/// One captured region, tagged with its slot index.
#[derive(Clone, Debug)]
pub struct CapturedImage {
    pub index: usize,
    pub image: RgbaImage,
}

/// Captures every region while holding the modifier key.
///
/// The game only shows the item list while the modifier is down. A failed
/// region is logged and skipped; the remaining regions are still captured and
/// the modifier is released exactly once. Output keeps region order.
pub fn capture_burst(
    grabber: &dyn ScreenGrabber,
    keys: &dyn KeySink,
    regions: &[Region],
    settle: Duration,
) -> Result<Vec<CapturedImage>> {
    crate::log(&format!("Capturing {} regions...", regions.len()));

    let hold = KeyHold::press(keys, Key::Control)?;
    std::thread::sleep(settle);

    let mut captured = Vec::with_capacity(regions.len());
    for (index, region) in regions.iter().enumerate() {
        match grabber.grab(region) {
            Ok(image) => captured.push(CapturedImage { index, image }),
            Err(e) => {
                crate::log(&format!(
                    "Capture of region {} at ({}, {}) failed: {:#}",
                    index + 1,
                    region.x,
                    region.y,
                    e
                ));
            }
        }
    }

    if let Err(e) = hold.release() {
        crate::log(&format!("Failed to release modifier after capture: {:#}", e));
    }

    crate::log(&format!(
        "Capture complete: {}/{} regions",
        captured.len(),
        regions.len()
    ));
    Ok(captured)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::input::tests::{KeyEvent, RecordingSink};
    use anyhow::anyhow;
    use image::Rgba;

    /// Returns a blank image per region; widths encode the region index.
    pub(crate) struct FakeGrabber {
        pub failing: Vec<usize>,
    }

    impl FakeGrabber {
        pub fn ok() -> Self {
            Self { failing: Vec::new() }
        }
    }

    impl ScreenGrabber for FakeGrabber {
        fn grab(&self, region: &Region) -> Result<RgbaImage> {
            // Regions from the default layout are 70 px apart
            let index = ((region.y - 108) / 70) as usize;
            if self.failing.contains(&index) {
                return Err(anyhow!("region {} unreadable", index));
            }
            Ok(RgbaImage::from_pixel(
                10 + index as u32,
                region.height,
                Rgba([0, 0, 0, 255]),
            ))
        }
    }

    fn regions() -> Vec<Region> {
        CaptureLayout::default().regions(2560, 1440)
    }

    #[test]
    fn test_all_regions_captured_in_order() {
        let sink = RecordingSink::default();
        let images = capture_burst(&FakeGrabber::ok(), &sink, &regions(), Duration::ZERO).unwrap();

        assert_eq!(images.len(), 8);
        for (i, captured) in images.iter().enumerate() {
            assert_eq!(captured.index, i);
            assert_eq!(captured.image.width(), 10 + i as u32);
        }
        assert_eq!(
            sink.events(),
            vec![KeyEvent::Down(Key::Control), KeyEvent::Up(Key::Control)]
        );
    }

    #[test]
    fn test_failed_regions_skipped_modifier_released_once() {
        for failing in 1..=7usize {
            let sink = RecordingSink::default();
            let grabber = FakeGrabber {
                failing: (0..failing).collect(),
            };
            let images = capture_burst(&grabber, &sink, &regions(), Duration::ZERO).unwrap();

            assert_eq!(images.len(), 8 - failing);
            assert_eq!(images[0].index, failing);
            assert_eq!(sink.count(KeyEvent::Down(Key::Control)), 1);
            assert_eq!(sink.count(KeyEvent::Up(Key::Control)), 1);
        }
    }

    #[test]
    fn test_all_regions_failing_still_releases() {
        let sink = RecordingSink::default();
        let grabber = FakeGrabber {
            failing: (0..8).collect(),
        };
        let images = capture_burst(&grabber, &sink, &regions(), Duration::ZERO).unwrap();
        assert!(images.is_empty());
        assert_eq!(sink.count(KeyEvent::Up(Key::Control)), 1);
    }

    #[test]
    fn test_modifier_failure_aborts_burst() {
        let sink = RecordingSink::failing_at(0);
        assert!(capture_burst(&FakeGrabber::ok(), &sink, &regions(), Duration::ZERO).is_err());
        assert!(sink.events().is_empty());
    }
}
