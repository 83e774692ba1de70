//! Capture region geometry.
//!
//! Regions are a vertical column of equally spaced rectangles. All positions
//! are stored relative to the screen size so one layout works at any
//! resolution.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Absolute screen rectangle in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.x < other.x + other.width as i32
            && other.x < self.x + self.width as i32
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Column layout of the capture regions, relative to screen size.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureLayout {
    /// Left edge as fraction of screen width
    pub x: f64,
    /// Top edge of the first region as fraction of screen height
    pub y: f64,
    /// Distance between region tops as fraction of screen height
    pub stride: f64,
    /// Region width as fraction of screen width
    pub width: f64,
    /// Region height as fraction of screen height
    pub height: f64,
    /// Number of regions (one per listed item)
    pub count: usize,
    /// Delay after pressing the modifier before the first capture (milliseconds)
    pub settle_ms: u64,
}

impl Default for CaptureLayout {
    /// 150,108 with a 70 px stride and 290×30 px regions at 2560×1440.
    fn default() -> Self {
        Self {
            x: 0.05859,
            y: 0.075,
            stride: 70.0 / 1440.0,
            width: 290.0 / 2560.0,
            height: 30.0 / 1440.0,
            count: 8,
            settle_ms: 100,
        }
    }
}

impl CaptureLayout {
    /// Regions must be non-empty and must not overlap.
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(anyhow!("Capture region count must be at least 1"));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(anyhow!("Capture regions must have a positive size"));
        }
        if self.count > 1 && self.stride < self.height {
            return Err(anyhow!(
                "Capture stride {:.4} is smaller than region height {:.4}",
                self.stride,
                self.height
            ));
        }
        Ok(())
    }

    /// Absolute regions for a screen, in slot order.
    pub fn regions(&self, screen_width: u32, screen_height: u32) -> Vec<Region> {
        let w = screen_width as f64;
        let h = screen_height as f64;

        let start_x = (w * self.x).round() as i32;
        let start_y = (h * self.y).round() as i32;
        let stride = (h * self.stride).round() as i32;
        let width = ((w * self.width).round() as u32).max(1);
        let height = ((h * self.height).round() as u32).max(1);

        (0..self.count)
            .map(|i| Region {
                x: start_x,
                y: start_y + i as i32 * stride,
                width,
                height,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_at_1440p() {
        let regions = CaptureLayout::default().regions(2560, 1440);
        assert_eq!(regions.len(), 8);
        assert_eq!(
            regions[0],
            Region { x: 150, y: 108, width: 290, height: 30 }
        );
        assert_eq!(
            regions[7],
            Region { x: 150, y: 108 + 7 * 70, width: 290, height: 30 }
        );
    }

    #[test]
    fn test_layout_scales_with_resolution() {
        let regions = CaptureLayout::default().regions(3840, 2160);
        assert_eq!(regions[0].x, 225);
        assert_eq!(regions[0].y, 162);
        assert_eq!(regions[1].y - regions[0].y, 105);
        assert_eq!(regions[0].width, 435);
        assert_eq!(regions[0].height, 45);
    }

    #[test]
    fn test_default_regions_do_not_overlap() {
        let regions = CaptureLayout::default().regions(2560, 1440);
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let layout = CaptureLayout {
            stride: 0.01,
            ..CaptureLayout::default()
        };
        assert!(layout.validate().is_err());
        assert!(CaptureLayout::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_count() {
        let layout = CaptureLayout {
            count: 0,
            ..CaptureLayout::default()
        };
        assert!(layout.validate().is_err());
    }
}
