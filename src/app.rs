//! Tray application: hidden message window, global hotkeys and tray menu.

use anyhow::{anyhow, Result};
use std::sync::{Arc, OnceLock};

use windows::core::w;
use windows::Win32::Foundation::{HWND, LPARAM, LRESULT, POINT, WPARAM};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    RegisterHotKey, UnregisterHotKey, MOD_NOREPEAT, VK_DECIMAL, VK_F11, VK_F12, VK_NUMPAD0,
};
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyMenu, DestroyWindow, DispatchMessageW,
    GetCursorPos, GetMessageW, InsertMenuW, LoadIconW, PostQuitMessage, RegisterClassW,
    SetForegroundWindow, TrackPopupMenu, TranslateMessage, CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT,
    IDI_APPLICATION, MF_BYPOSITION, MF_SEPARATOR, MF_STRING, MSG, TPM_BOTTOMALIGN, TPM_LEFTALIGN,
    TPM_RIGHTBUTTON, WM_COMMAND, WM_DESTROY, WM_HOTKEY, WM_LBUTTONDBLCLK, WM_RBUTTONUP, WM_USER,
    WNDCLASSW, WS_OVERLAPPEDWINDOW,
};

use crate::binding::SlotId;
use crate::capture::screen::GdiGrabber;
use crate::config::{AppConfig, PhysicalKey};
use crate::input::sendinput::{primary_screen_size, SendInputSink, SystemPointer};
use crate::log;
use crate::ocr::{self, TextEngine};
use crate::pipeline::Pipeline;
use crate::vocab::Vocabulary;

const HOTKEY_RECOGNIZE: i32 = 1;
const HOTKEY_EXIT: i32 = 2;
/// Slot hotkeys use `HOTKEY_SLOT_BASE + slot index`
const HOTKEY_SLOT_BASE: i32 = 100;
const WM_TRAYICON: u32 = WM_USER + 1;

// Menu item IDs
const MENU_RECOGNIZE: usize = 1001;
const MENU_EXIT: usize = 1002;

static PIPELINE: OnceLock<Arc<Pipeline>> = OnceLock::new();

fn virtual_key(key: PhysicalKey) -> u32 {
    match key {
        PhysicalKey::Numpad(n) => VK_NUMPAD0.0 as u32 + n as u32,
        PhysicalKey::NumpadDecimal => VK_DECIMAL.0 as u32,
    }
}

fn build_pipeline(config: &AppConfig, vocabulary: Vocabulary) -> Result<Pipeline> {
    let engine: Option<Arc<dyn TextEngine>> = match ocr::tesseract_engine(&config.ocr_language) {
        Ok(engine) => Some(Arc::new(engine)),
        Err(e) => {
            log(&format!("Warning: Failed to setup Tesseract: {:#}", e));
            log("Recognition will fail until Tesseract is installed.");
            None
        }
    };

    let screen = match config.configured_screen() {
        Some(size) => size,
        None => {
            let (w, h) = primary_screen_size()?;
            (w as u32, h as u32)
        }
    };
    log(&format!("Screen: {}x{}", screen.0, screen.1));

    Ok(Pipeline::new(
        Arc::new(GdiGrabber),
        Arc::new(SendInputSink),
        engine,
        Arc::new(vocabulary),
        config.clone(),
        screen,
    )
    .with_pointer(Arc::new(SystemPointer)))
}

/// Runs the tray application until Exit or F11.
pub fn run(config: &'static AppConfig, vocabulary: Vocabulary) -> Result<()> {
    let pipeline = Arc::new(build_pipeline(config, vocabulary)?);
    let pipeline = Arc::clone(PIPELINE.get_or_init(|| pipeline));

    let hwnd = create_message_window()?;
    add_tray_icon(hwnd)?;

    let mut registered = Vec::new();
    for (id, vk, label) in [
        (HOTKEY_RECOGNIZE, VK_F12.0 as u32, "F12 (recognize)"),
        (HOTKEY_EXIT, VK_F11.0 as u32, "F11 (exit)"),
    ] {
        unsafe { RegisterHotKey(hwnd, id, MOD_NOREPEAT, vk)? };
        registered.push(id);
        log(&format!("Hotkey: {}", label));
    }

    for slot in SlotId::ALL {
        let Some(key) = config.keys.physical_key(slot) else {
            continue;
        };
        let id = HOTKEY_SLOT_BASE + slot.index() as i32;
        match unsafe { RegisterHotKey(hwnd, id, MOD_NOREPEAT, virtual_key(key)) } {
            Ok(()) => {
                registered.push(id);
                log(&format!("Hotkey: {} ({})", key, slot));
            }
            Err(e) => log(&format!("Failed to register {} for {}: {}", key, slot, e)),
        }
    }

    log("Helldiver Auto Assets started");
    log(&pipeline.state().status().status_text());
    log("Right-click tray icon to exit");

    // Message loop
    let mut msg = MSG::default();
    unsafe {
        while GetMessageW(&mut msg, HWND::default(), 0, 0).as_bool() {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        // Cleanup
        for id in registered {
            let _ = UnregisterHotKey(hwnd, id);
        }
        remove_tray_icon(hwnd);
        let _ = DestroyWindow(hwnd);
    }

    pipeline.shutdown();
    Ok(())
}

fn start_recognition() {
    let Some(pipeline) = PIPELINE.get() else {
        return;
    };
    log("Recognition requested");
    if let Err(e) = pipeline.start_cycle() {
        log(&format!("Recognition not started: {}", e));
    }
}

fn trigger_slot(slot: SlotId) {
    let Some(pipeline) = PIPELINE.get() else {
        return;
    };
    // The player logs playback results and dropped triggers
    let _ = pipeline.trigger_slot(slot);
}

fn log_status() {
    let Some(pipeline) = PIPELINE.get() else {
        return;
    };
    let state = pipeline.state();
    log(&state.status().status_text());
    for line in state.summary() {
        log(&format!("  {}", line));
    }
}

fn request_exit() {
    log("Exit requested");
    if let Some(pipeline) = PIPELINE.get() {
        pipeline.shutdown();
    }
    unsafe { PostQuitMessage(0) };
}

fn create_message_window() -> Result<HWND> {
    unsafe {
        let hinstance = GetModuleHandleW(None)?;
        let class_name = w!("HelldiverAutoAssetsClass");

        let wc = WNDCLASSW {
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(window_proc),
            hInstance: hinstance.into(),
            lpszClassName: class_name,
            ..Default::default()
        };

        let atom = RegisterClassW(&wc);
        if atom == 0 {
            return Err(anyhow!("Failed to register window class"));
        }

        let hwnd = CreateWindowExW(
            Default::default(),
            class_name,
            w!("Helldiver Auto Assets"),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            None,
            None,
            hinstance,
            None,
        )?;

        Ok(hwnd)
    }
}

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    unsafe {
        match msg {
            WM_HOTKEY => {
                let hotkey_id = wparam.0 as i32;
                if hotkey_id == HOTKEY_RECOGNIZE {
                    start_recognition();
                } else if hotkey_id == HOTKEY_EXIT {
                    request_exit();
                } else if let Some(slot) = usize::try_from(hotkey_id - HOTKEY_SLOT_BASE)
                    .ok()
                    .and_then(|i| SlotId::ALL.get(i).copied())
                {
                    trigger_slot(slot);
                }
                LRESULT(0)
            }
            WM_TRAYICON => {
                let event = (lparam.0 & 0xFFFF) as u32;
                match event {
                    WM_RBUTTONUP => show_context_menu(hwnd),
                    WM_LBUTTONDBLCLK => log_status(),
                    _ => {}
                }
                LRESULT(0)
            }
            WM_COMMAND => {
                let cmd = wparam.0 & 0xFFFF;
                if cmd == MENU_RECOGNIZE {
                    start_recognition();
                } else if cmd == MENU_EXIT {
                    request_exit();
                }
                LRESULT(0)
            }
            WM_DESTROY => {
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }
}

fn add_tray_icon(hwnd: HWND) -> Result<()> {
    unsafe {
        let mut nid = NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: hwnd,
            uID: 1,
            uFlags: NIF_ICON | NIF_MESSAGE | NIF_TIP,
            uCallbackMessage: WM_TRAYICON,
            hIcon: LoadIconW(None, IDI_APPLICATION)?,
            ..Default::default()
        };

        let tip = "Helldiver Auto Assets (F12 recognize, F11 exit)";
        let tip_wide: Vec<u16> = tip.encode_utf16().chain(std::iter::once(0)).collect();
        let len = tip_wide.len().min(nid.szTip.len());
        nid.szTip[..len].copy_from_slice(&tip_wide[..len]);

        if !Shell_NotifyIconW(NIM_ADD, &nid).as_bool() {
            return Err(anyhow!("Failed to add tray icon"));
        }

        Ok(())
    }
}

fn remove_tray_icon(hwnd: HWND) {
    unsafe {
        let nid = NOTIFYICONDATAW {
            cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
            hWnd: hwnd,
            uID: 1,
            ..Default::default()
        };
        let _ = Shell_NotifyIconW(NIM_DELETE, &nid);
    }
}

fn show_context_menu(hwnd: HWND) {
    unsafe {
        let menu = match CreatePopupMenu() {
            Ok(menu) => menu,
            Err(e) => {
                log(&format!("Failed to create tray menu: {}", e));
                return;
            }
        };

        // Inserted in reverse order since position 0
        let _ = InsertMenuW(menu, 0, MF_BYPOSITION | MF_STRING, MENU_EXIT, w!("Exit"));
        let _ = InsertMenuW(menu, 0, MF_BYPOSITION | MF_SEPARATOR, 0, None);
        let _ = InsertMenuW(
            menu,
            0,
            MF_BYPOSITION | MF_STRING,
            MENU_RECOGNIZE,
            w!("Recognize (F12)"),
        );

        let mut pt = POINT::default();
        let _ = GetCursorPos(&mut pt);

        // Required for the menu to work properly
        let _ = SetForegroundWindow(hwnd);

        let _ = TrackPopupMenu(
            menu,
            TPM_BOTTOMALIGN | TPM_LEFTALIGN | TPM_RIGHTBUTTON,
            pt.x,
            pt.y,
            0,
            hwnd,
            None,
        );

        let _ = DestroyMenu(menu);
    }
}
