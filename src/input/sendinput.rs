//! Keyboard and pointer input via the Win32 SendInput API.
//!
//! SendInput simulates hardware-level input, which games reading
//! DirectInput/RawInput accept. Arrow keys need the extended-key flag or the
//! numpad arrows are reported instead.

use anyhow::{anyhow, Result};

use windows::Win32::Foundation::POINT;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, VIRTUAL_KEY, VK_CONTROL, VK_DOWN, VK_LEFT, VK_RIGHT,
    VK_UP,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetCursorPos, GetSystemMetrics, SetCursorPos, SM_CXSCREEN, SM_CYSCREEN,
};

use super::{Key, KeySink, Pointer};

fn virtual_key(key: Key) -> VIRTUAL_KEY {
    match key {
        Key::Control => VK_CONTROL,
        Key::Up => VK_UP,
        Key::Down => VK_DOWN,
        Key::Left => VK_LEFT,
        Key::Right => VK_RIGHT,
    }
}

fn is_extended(key: Key) -> bool {
    matches!(key, Key::Up | Key::Down | Key::Left | Key::Right)
}

/// Sends one keyboard event.
fn send_key(key: Key, up: bool) -> Result<()> {
    let mut flags = KEYBD_EVENT_FLAGS(0);
    if is_extended(key) {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    if up {
        flags |= KEYEVENTF_KEYUP;
    }

    let input = INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: virtual_key(key),
                wScan: 0,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    };

    let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if sent != 1 {
        return Err(anyhow!(
            "SendInput rejected {:?} {} (blocked by UIPI?)",
            key,
            if up { "up" } else { "down" }
        ));
    }
    Ok(())
}

/// Injects key events into the system input stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct SendInputSink;

impl KeySink for SendInputSink {
    fn key_down(&self, key: Key) -> Result<()> {
        send_key(key, false)
    }

    fn key_up(&self, key: Key) -> Result<()> {
        send_key(key, true)
    }
}

/// The system cursor on the primary display.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemPointer;

impl Pointer for SystemPointer {
    fn screen_size(&self) -> Result<(i32, i32)> {
        primary_screen_size()
    }

    fn position(&self) -> Result<(i32, i32)> {
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point)? };
        Ok((point.x, point.y))
    }

    fn move_to(&self, x: i32, y: i32) -> Result<()> {
        unsafe { SetCursorPos(x, y)? };
        Ok(())
    }
}

/// Size of the primary display in pixels.
pub fn primary_screen_size() -> Result<(i32, i32)> {
    let width = unsafe { GetSystemMetrics(SM_CXSCREEN) };
    let height = unsafe { GetSystemMetrics(SM_CYSCREEN) };
    if width <= 0 || height <= 0 {
        return Err(anyhow!("GetSystemMetrics returned {}x{}", width, height));
    }
    Ok((width, height))
}
