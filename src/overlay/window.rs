use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::c_void;
use std::sync::atomic::{AtomicU16, Ordering};

use tracing::{debug, warn};
use windows::Win32::Foundation::{COLORREF, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM};
use windows::Win32::Graphics::Dwm::{
    DWM_BB_BLURREGION, DWM_BB_ENABLE, DWM_BLURBEHIND, DwmEnableBlurBehindWindow,
};
use windows::Win32::Graphics::Gdi::{CreateRectRgn, DeleteObject, HRGN, UpdateWindow, ValidateRect};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::{
    CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetClientRect, GetMessageW,
    IDC_ARROW, LWA_ALPHA, LoadCursorW, MSG, PostMessageW, PostQuitMessage, RegisterClassExW,
    SW_HIDE, SW_SHOWNOACTIVATE, SetLayeredWindowAttributes, SetWindowDisplayAffinity,
    ShowWindow, TranslateMessage, WDA_EXCLUDEFROMCAPTURE, WINDOW_EX_STYLE, WM_DESTROY,
    WM_DISPLAYCHANGE, WM_PAINT, WM_SIZE, WM_USER, WNDCLASSEXW, WS_EX_LAYERED, WS_EX_NOACTIVATE,
    WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
};
use windows::core::{BOOL, PCWSTR};

use super::WindowEvent;
use super::config::OverlayConfig;
use super::renderer::SurfaceSize;
use crate::error::{OverlayError, OverlayResult};

/// Posted by the command listener after each enqueue. Carries no data; it
/// only makes `GetMessageW` return so the loop drains the command queue.
pub const WM_PENDING_COMMANDS: u32 = WM_USER + 1;

static WINDOW_CLASS_ATOM: AtomicU16 = AtomicU16::new(0);

thread_local! {
    /// Notifications recorded by `wnd_proc`, consumed by the UI loop.
    static WINDOW_EVENTS: RefCell<VecDeque<WindowEvent>> = const { RefCell::new(VecDeque::new()) };
}

fn push_event(event: WindowEvent) {
    WINDOW_EVENTS.with(|events| events.borrow_mut().push_back(event));
}

/// Take every window notification recorded on this thread so far.
pub fn take_window_events() -> Vec<WindowEvent> {
    WINDOW_EVENTS.with(|events| events.borrow_mut().drain(..).collect())
}

// ─── Window procedure ───────────────────────────────────────────────────────

/// Window procedure for the overlay.
///
/// Nothing is drawn here. Paint, display-change, size and destroy messages
/// are queued as [`WindowEvent`]s and applied by the UI loop once dispatch
/// returns, so the renderer is never re-entered from inside a Win32 call.
unsafe extern "system" fn wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    unsafe {
        match msg {
            WM_PAINT => {
                push_event(WindowEvent::Paint);
                let _ = ValidateRect(Some(hwnd), None);
                LRESULT(0)
            }
            WM_DISPLAYCHANGE => {
                push_event(WindowEvent::DisplayChanged);
                LRESULT(0)
            }
            WM_SIZE => {
                push_event(WindowEvent::Resized);
                LRESULT(0)
            }
            WM_PENDING_COMMANDS => LRESULT(0),
            WM_DESTROY => {
                push_event(WindowEvent::Destroyed);
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcW(hwnd, msg, wparam, lparam),
        }
    }
}

// ─── Class registration ─────────────────────────────────────────────────────

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Register the overlay window class. Only the first call does any work.
pub fn register_overlay_class(class_name: &str) -> OverlayResult<()> {
    if WINDOW_CLASS_ATOM.load(Ordering::SeqCst) != 0 {
        return Ok(());
    }

    let class_name = wide(class_name);
    let atom = unsafe {
        let instance: HINSTANCE = GetModuleHandleW(None)?.into();
        let wc = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            lpfnWndProc: Some(wnd_proc),
            hInstance: instance,
            hCursor: LoadCursorW(None, IDC_ARROW)?,
            lpszClassName: PCWSTR(class_name.as_ptr()),
            ..Default::default()
        };
        RegisterClassExW(&wc)
    };
    if atom == 0 {
        return Err(OverlayError::ClassRegistration);
    }

    WINDOW_CLASS_ATOM.store(atom, Ordering::SeqCst);
    Ok(())
}

// ─── Window ─────────────────────────────────────────────────────────────────

/// GDI region deleted when dropped.
struct Region(HRGN);

impl Drop for Region {
    fn drop(&mut self) {
        unsafe {
            let _ = DeleteObject(self.0.into());
        }
    }
}

/// Owned overlay window; destroyed on drop.
///
/// The window is:
/// * Layered (`WS_EX_LAYERED`) with a constant alpha.
/// * Click-through (`WS_EX_TRANSPARENT`).
/// * Always on top (`WS_EX_TOPMOST`).
/// * Hidden from the taskbar and Alt-Tab (`WS_EX_TOOLWINDOW`).
/// * Never focused (`WS_EX_NOACTIVATE`).
/// * Excluded from screen capture.
pub struct Window {
    hwnd: HWND,
}

impl Window {
    /// Create the overlay window at `(x, y)`. The window starts hidden.
    pub fn create(config: &OverlayConfig, x: i32, y: i32) -> OverlayResult<Self> {
        register_overlay_class(&config.class_name)?;

        let class_name = wide(&config.class_name);
        let title = wide(&config.title);
        let ex_style = WINDOW_EX_STYLE(
            WS_EX_LAYERED.0
                | WS_EX_TRANSPARENT.0
                | WS_EX_TOPMOST.0
                | WS_EX_TOOLWINDOW.0
                | WS_EX_NOACTIVATE.0,
        );

        let hwnd = unsafe {
            let instance: HINSTANCE = GetModuleHandleW(None)?.into();
            CreateWindowExW(
                ex_style,
                PCWSTR(class_name.as_ptr()),
                PCWSTR(title.as_ptr()),
                WS_POPUP,
                x,
                y,
                config.width,
                config.height,
                None,
                None,
                Some(instance),
                None,
            )
        }
        .map_err(|e| OverlayError::WindowCreation(e.to_string()))?;

        if hwnd.0.is_null() {
            return Err(OverlayError::WindowCreation("null window handle".into()));
        }
        let window = Self { hwnd };

        unsafe {
            SetLayeredWindowAttributes(hwnd, COLORREF(0), config.opacity, LWA_ALPHA)?;

            if let Err(e) = SetWindowDisplayAffinity(hwnd, WDA_EXCLUDEFROMCAPTURE) {
                warn!(error = %e, "could not exclude overlay from capture");
            }
        }
        window.enable_blur_behind(config.width, config.height);

        debug!(x, y, width = config.width, height = config.height, "created overlay window");
        Ok(window)
    }

    fn enable_blur_behind(&self, width: i32, height: i32) {
        unsafe {
            let region = Region(CreateRectRgn(0, 0, width, height));
            let blur = DWM_BLURBEHIND {
                dwFlags: DWM_BB_ENABLE | DWM_BB_BLURREGION,
                fEnable: BOOL::from(true),
                hRgnBlur: region.0,
                fTransitionOnMaximized: BOOL::from(false),
            };
            if let Err(e) = DwmEnableBlurBehindWindow(self.hwnd, &blur) {
                warn!(error = %e, "could not enable blur-behind");
            }
        }
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    pub fn client_size(&self) -> SurfaceSize {
        let mut rc = RECT::default();
        if unsafe { GetClientRect(self.hwnd, &mut rc) }.is_err() {
            return SurfaceSize::default();
        }
        SurfaceSize {
            width: (rc.right - rc.left).max(0) as u32,
            height: (rc.bottom - rc.top).max(0) as u32,
        }
    }

    pub fn set_visible(&self, visible: bool) {
        unsafe {
            if visible {
                let _ = ShowWindow(self.hwnd, SW_SHOWNOACTIVATE);
                let _ = UpdateWindow(self.hwnd);
            } else {
                let _ = ShowWindow(self.hwnd, SW_HIDE);
            }
        }
    }

    /// Callback that wakes this window's message loop from any thread.
    ///
    /// Only posts a message; the window itself is never touched off the UI
    /// thread.
    pub fn waker(&self) -> impl Fn() + Send + Sync + 'static {
        let ptr = self.hwnd.0 as usize;
        move || unsafe {
            let hwnd = HWND(ptr as *mut c_void);
            let _ = PostMessageW(Some(hwnd), WM_PENDING_COMMANDS, WPARAM(0), LPARAM(0));
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        unsafe {
            let _ = DestroyWindow(self.hwnd);
        }
        debug!("destroyed overlay window");
    }
}

// ─── Message loop ───────────────────────────────────────────────────────────

/// Block until the next message for this thread arrives and dispatch it.
///
/// Returns `false` once `WM_QUIT` is retrieved or the wait fails.
pub fn wait_and_dispatch() -> bool {
    let mut msg = MSG::default();
    unsafe {
        let ret = GetMessageW(&mut msg, None, 0, 0);
        if ret.0 == -1 {
            warn!("GetMessageW failed, leaving message loop");
            return false;
        }
        if ret.0 == 0 {
            return false;
        }
        let _ = TranslateMessage(&msg);
        DispatchMessageW(&msg);
    }
    true
}
