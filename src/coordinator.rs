use std::ops::ControlFlow;

use tracing::{debug, info};

use crate::command::{Command, CommandListener, CommandReceiver};
use crate::overlay::renderer::Backend;
use crate::overlay::{OverlayRenderer, WindowEvent};

/// Owns the renderer, the consumer end of the command queue and the
/// listener feeding it, for the whole life of the process.
///
/// Everything here runs on the UI thread.
pub struct Coordinator<B: Backend> {
    renderer: OverlayRenderer<B>,
    commands: CommandReceiver,
    listener: Option<CommandListener>,
}

impl<B: Backend> Coordinator<B> {
    pub fn new(
        renderer: OverlayRenderer<B>,
        commands: CommandReceiver,
        listener: CommandListener,
    ) -> Self {
        Self {
            renderer,
            commands,
            listener: Some(listener),
        }
    }

    #[cfg(test)]
    pub fn renderer(&self) -> &OverlayRenderer<B> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut OverlayRenderer<B> {
        &mut self.renderer
    }

    /// Apply one command. `Break` ends the event loop.
    pub fn apply(&mut self, command: Command) -> ControlFlow<()> {
        debug!(?command, "applying command");
        match command {
            Command::Toggle => self.renderer.toggle(),
            Command::Show => self.renderer.show(),
            Command::Hide => self.renderer.hide(),
            Command::SetText(text) => self.renderer.update_text(text),
            Command::Exit => {
                info!("exit requested");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    pub fn handle_window_event(&mut self, event: WindowEvent) -> ControlFlow<()> {
        match event {
            WindowEvent::Paint | WindowEvent::DisplayChanged => self.renderer.render(),
            WindowEvent::Resized => self.renderer.resize(),
            WindowEvent::Destroyed => {
                info!("overlay window destroyed");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Apply every queued command in arrival order, stopping at `Exit`.
    ///
    /// Commands behind an `Exit` are left unapplied.
    pub fn drain_commands(&mut self) -> ControlFlow<()> {
        while let Some(command) = self.commands.try_next() {
            self.apply(command)?;
        }
        ControlFlow::Continue(())
    }

    /// One pass of the UI loop: apply the window events gathered during
    /// dispatch, then the queued commands.
    ///
    /// A `Destroyed` event ends the pass before any command is applied.
    pub fn step(&mut self, events: impl IntoIterator<Item = WindowEvent>) -> ControlFlow<()> {
        for event in events {
            self.handle_window_event(event)?;
        }
        self.drain_commands()
    }

    /// Stop the listener, then tear the renderer down.
    pub fn shutdown(&mut self) {
        if let Some(mut listener) = self.listener.take() {
            listener.stop();
        }
        self.renderer.shutdown();
    }
}

impl<B: Backend> Drop for Coordinator<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Bring the overlay up on the calling thread and run it until `exit`, the
/// end of the window, or a fatal initialization error.
#[cfg(windows)]
pub fn run(config: crate::overlay::OverlayConfig) -> anyhow::Result<()> {
    use anyhow::Context;

    use crate::command::command_channel;
    use crate::monitor::{enumerate_monitors, primary_monitor};
    use crate::overlay::direct2d::Direct2DBackend;
    use crate::overlay::window::{take_window_events, wait_and_dispatch};

    let _com = platform::ComApartment::initialize().context("failed to initialize COM")?;

    let monitors = enumerate_monitors();
    for (i, mon) in monitors.iter().enumerate() {
        debug!(
            index = i,
            name = %mon.name,
            width = mon.width,
            height = mon.height,
            x = mon.x,
            y = mon.y,
            primary = mon.primary,
            "found monitor"
        );
    }
    let (x, y) = primary_monitor(&monitors).top_center(config.width, config.top_offset);

    let backend = Direct2DBackend::initialize(&config, x, y)
        .context("failed to initialize overlay window")?;
    let (sender, receiver) = command_channel(backend.window().waker());
    let renderer = OverlayRenderer::new(backend, config.initial_text.clone());
    let listener = CommandListener::start(sender).context("failed to start command listener")?;
    let mut coordinator = Coordinator::new(renderer, receiver, listener);

    println!("HUD overlay started");
    info!(x, y, "overlay running");

    coordinator.renderer_mut().show();
    while wait_and_dispatch() {
        if coordinator.step(take_window_events()).is_break() {
            break;
        }
    }

    coordinator.shutdown();
    Ok(())
}

#[cfg(windows)]
mod platform {
    use windows::Win32::System::Com::{COINIT_APARTMENTTHREADED, CoInitializeEx, CoUninitialize};

    /// COM initialized for the current thread until dropped.
    pub struct ComApartment;

    impl ComApartment {
        pub fn initialize() -> windows::core::Result<Self> {
            unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }.ok()?;
            Ok(Self)
        }
    }

    impl Drop for ComApartment {
        fn drop(&mut self) {
            unsafe { CoUninitialize() };
        }
    }
}
