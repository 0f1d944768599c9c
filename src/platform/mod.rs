#[cfg(windows)]
pub mod win32;

use crate::pet::Bounds;

/// Usable desktop area, when the platform can tell us.
pub fn work_area() -> Option<Bounds> {
    #[cfg(windows)]
    {
        win32::work_area()
    }
    #[cfg(not(windows))]
    {
        None
    }
}
