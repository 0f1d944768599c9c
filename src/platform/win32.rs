use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HWND, POINT, RECT};
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, DestroyMenu, GetCursorPos, SetForegroundWindow,
    SystemParametersInfoW, TrackPopupMenu, MF_CHECKED, MF_SEPARATOR, MF_STRING, SPI_GETWORKAREA,
    SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS, TPM_LEFTALIGN, TPM_RETURNCMD, TPM_RIGHTBUTTON,
};

use crate::menu::MenuItem;
use crate::pet::Bounds;

/// Extract the Win32 HWND from a winit window.
pub fn get_hwnd(window: &winit::window::Window) -> Option<HWND> {
    let handle = window.window_handle().ok()?;
    match handle.as_raw() {
        RawWindowHandle::Win32(h) => Some(HWND(h.hwnd.get() as *mut core::ffi::c_void)),
        _ => None,
    }
}

/// Desktop area not covered by the taskbar, in screen pixels.
pub fn work_area() -> Option<Bounds> {
    let mut rect = RECT::default();
    unsafe {
        SystemParametersInfoW(
            SPI_GETWORKAREA,
            0,
            Some(&mut rect as *mut RECT as *mut core::ffi::c_void),
            SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
        )
        .ok()?;
    }
    Some(Bounds {
        left: rect.left as f32,
        top: rect.top as f32,
        right: rect.right as f32,
        bottom: rect.bottom as f32,
    })
}

/// Show `items` as a native popup at the cursor and block until the user
/// picks one. Returns the index of the chosen item.
pub fn track_popup(hwnd: HWND, items: &[MenuItem]) -> Option<usize> {
    unsafe {
        let hmenu = CreatePopupMenu().ok()?;

        // Labels must outlive TrackPopupMenu.
        let mut labels: Vec<Vec<u16>> = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            match item {
                MenuItem::Separator => {
                    let _ = AppendMenuW(hmenu, MF_SEPARATOR, 0, PCWSTR::null());
                }
                MenuItem::Action { label, checked, .. } => {
                    let wide: Vec<u16> = label.encode_utf16().chain(std::iter::once(0)).collect();
                    let flags = if *checked { MF_STRING | MF_CHECKED } else { MF_STRING };
                    // 0 means "nothing chosen", so ids start at 1.
                    let _ = AppendMenuW(hmenu, flags, i + 1, PCWSTR(wide.as_ptr()));
                    labels.push(wide);
                }
            }
        }

        let mut pt = POINT::default();
        let _ = GetCursorPos(&mut pt);

        // Required so the menu closes when clicking outside
        let _ = SetForegroundWindow(hwnd);

        let chosen = TrackPopupMenu(
            hmenu,
            TPM_LEFTALIGN | TPM_RIGHTBUTTON | TPM_RETURNCMD,
            pt.x,
            pt.y,
            0,
            hwnd,
            None,
        );
        let _ = DestroyMenu(hmenu);

        let id = chosen.0 as usize;
        (id > 0).then(|| id - 1)
    }
}
