//! User-visible error notification.
//!
//! Startup failures that stop the process must reach the user even when no
//! window exists yet. The caller picks an implementation once at startup and
//! hands it to [`crate::StartupCheck`].

use tracing::debug;

/// Capability for showing a fatal error to the user.
pub trait UserNotifier: Send + Sync {
    /// Show `message` to the user. Blocks until acknowledged where the
    /// implementation is interactive.
    fn show_error(&self, title: &str, message: &str);
}

/// Writes the message to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl UserNotifier for ConsoleNotifier {
    fn show_error(&self, title: &str, message: &str) {
        debug!("Showing console error: {}", title);
        // Intentional stdout: headless launches have no other channel
        println!("{}", message);
    }
}

/// Shows a modal error dialog, then writes the message to stdout.
///
/// # Platform Behavior
/// - **Windows**: `MessageBoxW` with an error icon
/// - **Other**: console only
#[derive(Debug, Clone, Copy, Default)]
pub struct DialogNotifier;

impl UserNotifier for DialogNotifier {
    fn show_error(&self, title: &str, message: &str) {
        #[cfg(windows)]
        show_message_box(title, message);

        #[cfg(not(windows))]
        debug!("No dialog support on this platform, using console");

        ConsoleNotifier.show_error(title, message);
    }
}

/// Notifier suited to the current platform.
pub fn default_notifier() -> Box<dyn UserNotifier> {
    if cfg!(windows) {
        Box::new(DialogNotifier)
    } else {
        Box::new(ConsoleNotifier)
    }
}

#[cfg(windows)]
#[allow(unsafe_code)]
fn show_message_box(title: &str, message: &str) {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use windows_sys::Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_OK};

    fn wide(s: &str) -> Vec<u16> {
        OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
    }

    let text = wide(message);
    let caption = wide(title);
    // SAFETY: both buffers are NUL-terminated UTF-16 and outlive the call;
    // a null owner window is allowed.
    unsafe {
        MessageBoxW(
            std::ptr::null_mut(),
            text.as_ptr(),
            caption.as_ptr(),
            MB_OK | MB_ICONERROR,
        );
    }
}
