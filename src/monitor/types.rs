/// Information about a connected display monitor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorInfo {
    /// Device name reported by Windows (e.g. `\\.\DISPLAY1`).
    pub name: String,
    /// X coordinate of the monitor's top-left corner in virtual-screen space.
    pub x: i32,
    /// Y coordinate of the monitor's top-left corner in virtual-screen space.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Whether Windows reports this as the primary display.
    pub primary: bool,
}

impl MonitorInfo {
    /// Top-left corner for a `width`-wide window centered horizontally on
    /// this monitor, `top_offset` pixels below its top edge.
    pub fn top_center(&self, width: i32, top_offset: i32) -> (i32, i32) {
        (self.x + (self.width - width) / 2, self.y + top_offset)
    }
}
