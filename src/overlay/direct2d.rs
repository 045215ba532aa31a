use tracing::debug;
use windows::Win32::Foundation::D2DERR_RECREATE_TARGET;
use windows::Win32::Graphics::Direct2D::Common::{
    D2D_RECT_F, D2D_SIZE_U, D2D1_ALPHA_MODE_PREMULTIPLIED, D2D1_COLOR_F, D2D1_PIXEL_FORMAT,
};
use windows::Win32::Graphics::Direct2D::{
    D2D1_DRAW_TEXT_OPTIONS_NONE, D2D1_FACTORY_TYPE_SINGLE_THREADED, D2D1_FEATURE_LEVEL_DEFAULT,
    D2D1_HWND_RENDER_TARGET_PROPERTIES, D2D1_PRESENT_OPTIONS_NONE,
    D2D1_RENDER_TARGET_PROPERTIES, D2D1_RENDER_TARGET_TYPE_DEFAULT,
    D2D1_RENDER_TARGET_USAGE_NONE, D2D1CreateFactory, ID2D1Factory, ID2D1HwndRenderTarget,
    ID2D1SolidColorBrush,
};
use windows::Win32::Graphics::DirectWrite::{
    DWRITE_FACTORY_TYPE_SHARED, DWRITE_FONT_STRETCH_NORMAL, DWRITE_FONT_STYLE_NORMAL,
    DWRITE_FONT_WEIGHT_NORMAL, DWRITE_MEASURING_MODE_NATURAL, DWRITE_PARAGRAPH_ALIGNMENT_CENTER,
    DWRITE_TEXT_ALIGNMENT_CENTER, DWriteCreateFactory, IDWriteFactory, IDWriteTextFormat,
};
use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT_B8G8R8A8_UNORM;
use windows::core::PCWSTR;

use super::config::{Color, OverlayConfig};
use super::renderer::{Backend, DrawError, Surface, SurfaceSize};
use super::window::Window;
use crate::error::{OverlayError, OverlayResult};

/// Wrap a failed device-independent resource call as a fatal startup error.
fn device_resources(what: &'static str) -> impl FnOnce(windows::core::Error) -> OverlayError {
    move |e| OverlayError::DeviceResources(format!("{what}: {e}"))
}

/// Map a failed draw or resize call; `D2DERR_RECREATE_TARGET` means the
/// device is gone.
fn draw_error(e: windows::core::Error) -> DrawError {
    if e.code() == D2DERR_RECREATE_TARGET {
        DrawError::DeviceLost
    } else {
        DrawError::Failed(e.to_string())
    }
}

fn d2d_color(c: Color) -> D2D1_COLOR_F {
    D2D1_COLOR_F {
        r: c.r,
        g: c.g,
        b: c.b,
        a: c.a,
    }
}

/// Device-independent Direct2D/DirectWrite resources and the window they
/// draw into.
///
/// Fields drop in declaration order, which is the reverse of creation: text
/// format, DirectWrite factory, Direct2D factory, then the window.
pub struct Direct2DBackend {
    text_format: IDWriteTextFormat,
    _dwrite: IDWriteFactory,
    factory: ID2D1Factory,
    text_color: D2D1_COLOR_F,
    background_color: D2D1_COLOR_F,
    window: Window,
}

impl Direct2DBackend {
    /// Create the window and every device-independent resource.
    ///
    /// Anything already created is released again if a later step fails.
    pub fn initialize(config: &OverlayConfig, x: i32, y: i32) -> OverlayResult<Self> {
        let window = Window::create(config, x, y)?;

        let factory =
            unsafe { D2D1CreateFactory::<ID2D1Factory>(D2D1_FACTORY_TYPE_SINGLE_THREADED, None) }
                .map_err(device_resources("Direct2D factory"))?;
        let dwrite = unsafe { DWriteCreateFactory::<IDWriteFactory>(DWRITE_FACTORY_TYPE_SHARED) }
            .map_err(device_resources("DirectWrite factory"))?;

        let family: Vec<u16> = config.font_family.encode_utf16().chain(Some(0)).collect();
        let locale: Vec<u16> = config.locale.encode_utf16().chain(Some(0)).collect();
        let text_format = unsafe {
            let format = dwrite
                .CreateTextFormat(
                    PCWSTR(family.as_ptr()),
                    None,
                    DWRITE_FONT_WEIGHT_NORMAL,
                    DWRITE_FONT_STYLE_NORMAL,
                    DWRITE_FONT_STRETCH_NORMAL,
                    config.font_size,
                    PCWSTR(locale.as_ptr()),
                )
                .map_err(device_resources("text format"))?;
            format
                .SetTextAlignment(DWRITE_TEXT_ALIGNMENT_CENTER)
                .map_err(device_resources("text alignment"))?;
            format
                .SetParagraphAlignment(DWRITE_PARAGRAPH_ALIGNMENT_CENTER)
                .map_err(device_resources("paragraph alignment"))?;
            format
        };

        Ok(Self {
            text_format,
            _dwrite: dwrite,
            factory,
            text_color: d2d_color(config.text_color),
            background_color: d2d_color(config.background_color),
            window,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl Backend for Direct2DBackend {
    type Surface = Direct2DSurface;

    fn client_size(&self) -> SurfaceSize {
        self.window.client_size()
    }

    fn create_surface(&mut self, size: SurfaceSize) -> OverlayResult<Direct2DSurface> {
        let props = D2D1_RENDER_TARGET_PROPERTIES {
            r#type: D2D1_RENDER_TARGET_TYPE_DEFAULT,
            pixelFormat: D2D1_PIXEL_FORMAT {
                format: DXGI_FORMAT_B8G8R8A8_UNORM,
                alphaMode: D2D1_ALPHA_MODE_PREMULTIPLIED,
            },
            dpiX: 0.0,
            dpiY: 0.0,
            usage: D2D1_RENDER_TARGET_USAGE_NONE,
            minLevel: D2D1_FEATURE_LEVEL_DEFAULT,
        };
        let hwnd_props = D2D1_HWND_RENDER_TARGET_PROPERTIES {
            hwnd: self.window.hwnd(),
            pixelSize: D2D_SIZE_U {
                width: size.width,
                height: size.height,
            },
            presentOptions: D2D1_PRESENT_OPTIONS_NONE,
        };

        unsafe {
            let target = self.factory.CreateHwndRenderTarget(&props, &hwnd_props)?;
            let text_brush = target.CreateSolidColorBrush(&self.text_color, None)?;
            let background_brush = target.CreateSolidColorBrush(&self.background_color, None)?;
            Ok(Direct2DSurface {
                text_brush,
                background_brush,
                text_format: self.text_format.clone(),
                target,
            })
        }
    }

    fn set_window_visible(&mut self, visible: bool) {
        self.window.set_visible(visible);
    }
}

/// Render target and the brushes created from it.
pub struct Direct2DSurface {
    text_brush: ID2D1SolidColorBrush,
    background_brush: ID2D1SolidColorBrush,
    text_format: IDWriteTextFormat,
    target: ID2D1HwndRenderTarget,
}

impl Surface for Direct2DSurface {
    fn draw(&mut self, text: &str) -> Result<(), DrawError> {
        let utf16: Vec<u16> = text.encode_utf16().collect();
        let result = unsafe {
            self.target.BeginDraw();
            self.target.Clear(Some(&D2D1_COLOR_F::default()));

            let size = self.target.GetSize();
            let rect = D2D_RECT_F {
                left: 0.0,
                top: 0.0,
                right: size.width,
                bottom: size.height,
            };
            self.target.FillRectangle(&rect, &self.background_brush);
            self.target.DrawText(
                &utf16,
                &self.text_format,
                &rect,
                &self.text_brush,
                D2D1_DRAW_TEXT_OPTIONS_NONE,
                DWRITE_MEASURING_MODE_NATURAL,
            );
            self.target.EndDraw(None, None)
        };

        result.map_err(draw_error)
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), DrawError> {
        debug!(?size, "resizing render target");
        let pixels = D2D_SIZE_U {
            width: size.width,
            height: size.height,
        };
        unsafe { self.target.Resize(&pixels) }.map_err(draw_error)
    }
}
