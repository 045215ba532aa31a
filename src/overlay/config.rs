/// Straight (non-premultiplied) RGBA color with channels in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Fixed parameters of the overlay window, applied once at creation.
#[derive(Clone, Debug)]
pub struct OverlayConfig {
    /// Window width in logical units.
    pub width: i32,
    /// Window height in logical units.
    pub height: i32,
    /// Distance between the top of the primary monitor and the window.
    pub top_offset: i32,
    /// Alpha applied to the whole layered window (255 = no extra fading).
    pub opacity: u8,
    /// Font family used for the status text.
    pub font_family: String,
    /// Font size in device-independent pixels.
    pub font_size: f32,
    /// Locale passed to the text shaper.
    pub locale: String,
    /// Color of the status text.
    pub text_color: Color,
    /// Translucent fill drawn behind the text.
    pub background_color: Color,
    /// Text shown before the first `SetText` arrives.
    pub initial_text: String,
    /// Win32 window class name.
    pub class_name: String,
    /// Window title (never shown, but visible to window enumeration tools).
    pub title: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 400,
            top_offset: 100,
            opacity: 255,
            font_family: "Segoe UI".into(),
            font_size: 24.0,
            locale: "en-us".into(),
            text_color: Color::rgba(1.0, 1.0, 1.0, 1.0),
            background_color: Color::rgba(0.0, 0.0, 0.0, 0.4),
            initial_text: "HUD Ready".into(),
            class_name: "HudOverlayClass".into(),
            title: "HUD Overlay".into(),
        }
    }
}
