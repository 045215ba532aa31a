use windows::Win32::Foundation::{LPARAM, RECT};
use windows::Win32::Graphics::Gdi::{EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFOEXW};
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, MONITORINFOF_PRIMARY, SM_CXSCREEN, SM_CYSCREEN,
};
use windows::core::BOOL;

use super::types::MonitorInfo;

fn is_primary(flags: u32) -> bool {
    flags & MONITORINFOF_PRIMARY != 0
}

unsafe extern "system" fn collect_monitor(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _rect: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    unsafe {
        let monitors = &mut *(lparam.0 as *mut Vec<MonitorInfo>);

        let mut info = MONITORINFOEXW::default();
        info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;

        if GetMonitorInfoW(hmonitor, &mut info as *mut _ as *mut _).as_bool() {
            let rc = info.monitorInfo.rcMonitor;
            let name_len = info
                .szDevice
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(info.szDevice.len());

            monitors.push(MonitorInfo {
                name: String::from_utf16_lossy(&info.szDevice[..name_len]),
                x: rc.left,
                y: rc.top,
                width: rc.right - rc.left,
                height: rc.bottom - rc.top,
                primary: is_primary(info.monitorInfo.dwFlags),
            });
        }

        BOOL(1) // continue enumeration
    }
}

/// Enumerate all monitors currently connected to the system.
pub fn enumerate_monitors() -> Vec<MonitorInfo> {
    let mut monitors: Vec<MonitorInfo> = Vec::new();
    unsafe {
        let _ = EnumDisplayMonitors(
            None,
            None,
            Some(collect_monitor),
            LPARAM(&mut monitors as *mut Vec<MonitorInfo> as isize),
        );
    }
    monitors
}

/// The primary monitor, falling back to the primary screen metrics when
/// enumeration reports none.
pub fn primary_monitor(monitors: &[MonitorInfo]) -> MonitorInfo {
    monitors
        .iter()
        .find(|m| m.primary)
        .cloned()
        .unwrap_or_else(|| unsafe {
            MonitorInfo {
                name: String::new(),
                x: 0,
                y: 0,
                width: GetSystemMetrics(SM_CXSCREEN),
                height: GetSystemMetrics(SM_CYSCREEN),
                primary: true,
            }
        })
}
