//! Recording backend for exercising the renderer without a window.

use std::cell::RefCell;
use std::rc::Rc;

use super::renderer::{Backend, DrawError, Surface, SurfaceSize};
use crate::error::{OverlayError, OverlayResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    WindowVisible(bool),
    SurfaceCreated(SurfaceSize),
    SurfaceResized(SurfaceSize),
    SurfaceDropped,
    Draw(String),
    BackendReleased,
}

#[derive(Default)]
struct Shared {
    events: Vec<Event>,
    client_size: SurfaceSize,
    failing_creations: u32,
    lose_device: bool,
    fail_resize: bool,
    created: usize,
    live: usize,
    peak_live: usize,
}

/// Fake [`Backend`] whose state is shared with inspection handles.
///
/// Only the value passed to the renderer reports `BackendReleased` when
/// dropped; handles from [`FakeBackend::handle`] are inert.
pub struct FakeBackend {
    shared: Rc<RefCell<Shared>>,
    owner: bool,
}

impl FakeBackend {
    pub fn new(client_size: SurfaceSize) -> Self {
        Self {
            shared: Rc::new(RefCell::new(Shared {
                client_size,
                ..Shared::default()
            })),
            owner: true,
        }
    }

    pub fn handle(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            owner: false,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.shared.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.shared.borrow_mut().events.clear();
    }

    pub fn draws(&self) -> Vec<String> {
        self.shared
            .borrow()
            .events
            .iter()
            .filter_map(|e| match e {
                Event::Draw(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn set_client_size(&self, size: SurfaceSize) {
        self.shared.borrow_mut().client_size = size;
    }

    pub fn fail_next_creations(&self, count: u32) {
        self.shared.borrow_mut().failing_creations = count;
    }

    pub fn lose_device_on_next_draw(&self) {
        self.shared.borrow_mut().lose_device = true;
    }

    pub fn fail_next_resize(&self) {
        self.shared.borrow_mut().fail_resize = true;
    }

    pub fn surfaces_created(&self) -> usize {
        self.shared.borrow().created
    }

    pub fn live_surfaces(&self) -> usize {
        self.shared.borrow().live
    }

    pub fn peak_live_surfaces(&self) -> usize {
        self.shared.borrow().peak_live
    }
}

impl Backend for FakeBackend {
    type Surface = FakeSurface;

    fn client_size(&self) -> SurfaceSize {
        self.shared.borrow().client_size
    }

    fn create_surface(&mut self, size: SurfaceSize) -> OverlayResult<FakeSurface> {
        let mut shared = self.shared.borrow_mut();
        if shared.failing_creations > 0 {
            shared.failing_creations -= 1;
            return Err(OverlayError::DeviceResources("no device".into()));
        }
        shared.created += 1;
        shared.live += 1;
        shared.peak_live = shared.peak_live.max(shared.live);
        shared.events.push(Event::SurfaceCreated(size));
        Ok(FakeSurface {
            shared: self.shared.clone(),
        })
    }

    fn set_window_visible(&mut self, visible: bool) {
        self.shared
            .borrow_mut()
            .events
            .push(Event::WindowVisible(visible));
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        if self.owner {
            self.shared.borrow_mut().events.push(Event::BackendReleased);
        }
    }
}

pub struct FakeSurface {
    shared: Rc<RefCell<Shared>>,
}

impl Surface for FakeSurface {
    fn draw(&mut self, text: &str) -> Result<(), DrawError> {
        let mut shared = self.shared.borrow_mut();
        shared.events.push(Event::Draw(text.to_string()));
        if std::mem::take(&mut shared.lose_device) {
            return Err(DrawError::DeviceLost);
        }
        Ok(())
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), DrawError> {
        let mut shared = self.shared.borrow_mut();
        if std::mem::take(&mut shared.fail_resize) {
            return Err(DrawError::Failed("resize rejected".into()));
        }
        shared.events.push(Event::SurfaceResized(size));
        Ok(())
    }
}

impl Drop for FakeSurface {
    fn drop(&mut self) {
        let mut shared = self.shared.borrow_mut();
        shared.live -= 1;
        shared.events.push(Event::SurfaceDropped);
    }
}
