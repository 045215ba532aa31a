use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::channel::CommandSink;
use super::{Command, decode_line};

/// How often `stop` re-issues the interrupt while the thread is still alive.
/// A cancel that lands before the thread has entered its read is lost.
const INTERRUPT_RETRIES: u32 = 5;
const INTERRUPT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Background reader that turns control-stream lines into [`Command`]s.
///
/// The reader runs on its own thread and only ever talks to its sink. Call
/// [`stop`](Self::stop) before tearing down whatever consumes the sink; it
/// returns once the thread is gone.
pub struct CommandListener {
    stopping: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CommandListener {
    /// Start listening on the process's standard input.
    pub fn start<S>(sink: S) -> io::Result<Self>
    where
        S: CommandSink + 'static,
    {
        Self::start_with(|| io::stdin().lock(), sink)
    }

    /// Start listening on the reader produced by `open`.
    ///
    /// `open` runs on the listener thread, so the reader itself does not
    /// need to be `Send`.
    pub fn start_with<F, R, S>(open: F, sink: S) -> io::Result<Self>
    where
        F: FnOnce() -> R + Send + 'static,
        R: BufRead,
        S: CommandSink + 'static,
    {
        let stopping = Arc::new(AtomicBool::new(false));
        let flag = stopping.clone();
        let thread = thread::Builder::new()
            .name("command-listener".into())
            .spawn(move || listen(open(), &sink, &flag))?;

        Ok(Self {
            stopping,
            thread: Some(thread),
        })
    }

    /// Ask the listener to stop without waiting for it.
    ///
    /// Lines read after this point are dropped, never delivered.
    pub fn cancel(&self) {
        self.stopping.store(true, Ordering::SeqCst);
        if let Some(thread) = &self.thread {
            interrupt_read(thread);
        }
    }

    /// Cancel and block until the listener thread has exited.
    pub fn stop(&mut self) {
        self.stop_with(interrupt_read);
    }

    fn stop_with(&mut self, interrupt: impl Fn(&JoinHandle<()>)) {
        self.stopping.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            interrupt(&thread);
            for _ in 0..INTERRUPT_RETRIES {
                if thread.is_finished() {
                    break;
                }
                thread::sleep(INTERRUPT_RETRY_DELAY);
                interrupt(&thread);
            }
            if thread.join().is_err() {
                warn!("command listener thread panicked");
            }
            info!("command listener stopped");
        }
    }

    #[cfg(test)]
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }
}

impl Drop for CommandListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn listen<R: BufRead>(mut reader: R, sink: &dyn CommandSink, stopping: &AtomicBool) {
    let mut raw = Vec::new();
    while !stopping.load(Ordering::SeqCst) {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => {
                debug!("control stream closed");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(error = %e, "control stream read failed");
                break;
            }
        }

        if stopping.load(Ordering::SeqCst) {
            break;
        }

        let command = Command::from_line(decode_line(&raw));
        debug!(?command, "received command");
        let is_exit = command == Command::Exit;
        if sink.deliver(command).is_err() {
            debug!("command consumer gone");
            break;
        }
        if is_exit {
            break;
        }
    }
}

/// Unblock a synchronous read pending on `thread`.
#[cfg(windows)]
fn interrupt_read(thread: &JoinHandle<()>) {
    use std::os::windows::io::AsRawHandle;

    use windows::Win32::Foundation::HANDLE;
    use windows::Win32::System::IO::CancelSynchronousIo;

    if thread.is_finished() {
        return;
    }
    // Fails with ERROR_NOT_FOUND when no read is pending, which is fine.
    let _ = unsafe { CancelSynchronousIo(HANDLE(thread.as_raw_handle())) };
}

/// Blocking reads cannot be interrupted here; the join waits for the next
/// line or end-of-input.
#[cfg(not(windows))]
fn interrupt_read(_thread: &JoinHandle<()>) {}
