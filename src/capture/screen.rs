//! Screen capture using GDI.
//!
//! Regions are small and captured in a tight burst, so a BitBlt from the
//! desktop DC is enough. Frames are read back as top-down 32-bit BGRA.

use anyhow::{anyhow, Result};
use image::{ImageBuffer, Rgba, RgbaImage};

use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC,
    GetDIBits, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS,
    HBITMAP, HDC, HGDIOBJ, SRCCOPY,
};

use super::{Region, ScreenGrabber};

/// Grabs regions of the primary display.
#[derive(Clone, Copy, Debug, Default)]
pub struct GdiGrabber;

impl ScreenGrabber for GdiGrabber {
    fn grab(&self, region: &Region) -> Result<RgbaImage> {
        if region.width == 0 || region.height == 0 {
            return Err(anyhow!("Empty capture region"));
        }
        unsafe { grab_region(region) }
    }
}

/// Releases the GDI objects of one capture.
struct GdiResources {
    screen_dc: HDC,
    mem_dc: HDC,
    bitmap: HBITMAP,
    previous: HGDIOBJ,
}

impl Drop for GdiResources {
    fn drop(&mut self) {
        unsafe {
            if !self.previous.is_invalid() {
                SelectObject(self.mem_dc, self.previous);
            }
            if !self.bitmap.is_invalid() {
                let _ = DeleteObject(self.bitmap);
            }
            if !self.mem_dc.is_invalid() {
                let _ = DeleteDC(self.mem_dc);
            }
            ReleaseDC(HWND::default(), self.screen_dc);
        }
    }
}

unsafe fn grab_region(region: &Region) -> Result<RgbaImage> {
    let width = region.width as i32;
    let height = region.height as i32;

    let screen_dc = unsafe { GetDC(HWND::default()) };
    if screen_dc.is_invalid() {
        return Err(anyhow!("GetDC failed for the desktop"));
    }

    let mut res = GdiResources {
        screen_dc,
        mem_dc: HDC::default(),
        bitmap: HBITMAP::default(),
        previous: HGDIOBJ::default(),
    };

    res.mem_dc = unsafe { CreateCompatibleDC(screen_dc) };
    if res.mem_dc.is_invalid() {
        return Err(anyhow!("CreateCompatibleDC failed"));
    }
    res.bitmap = unsafe { CreateCompatibleBitmap(screen_dc, width, height) };
    if res.bitmap.is_invalid() {
        return Err(anyhow!("CreateCompatibleBitmap failed ({}x{})", width, height));
    }
    res.previous = unsafe { SelectObject(res.mem_dc, res.bitmap) };

    unsafe {
        BitBlt(
            res.mem_dc,
            0,
            0,
            width,
            height,
            screen_dc,
            region.x,
            region.y,
            SRCCOPY,
        )?;
    }

    let mut info = BITMAPINFO {
        bmiHeader: BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width,
            // Negative height requests top-down rows
            biHeight: -height,
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB.0,
            ..Default::default()
        },
        ..Default::default()
    };

    let mut data = vec![0u8; (region.width * region.height * 4) as usize];
    let lines = unsafe {
        GetDIBits(
            res.mem_dc,
            res.bitmap,
            0,
            region.height,
            Some(data.as_mut_ptr().cast()),
            &mut info,
            DIB_RGB_COLORS,
        )
    };
    if lines != height {
        return Err(anyhow!("GetDIBits returned {} of {} rows", lines, height));
    }

    // BGRA -> RGBA, alpha is undefined for screen DCs
    for px in data.chunks_exact_mut(4) {
        px.swap(0, 2);
        px[3] = 255;
    }

    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(region.width, region.height, data)
            .ok_or_else(|| anyhow!("Pixel buffer size mismatch"))?;
    Ok(img)
}
