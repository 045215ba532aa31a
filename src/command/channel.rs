use std::sync::Arc;
use std::sync::mpsc;

use thiserror::Error;

use super::Command;

/// The consumer side of a command sink has gone away.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("command channel closed")]
pub struct ChannelClosed;

/// Destination for commands produced by the listener thread.
pub trait CommandSink: Send {
    fn deliver(&self, command: Command) -> Result<(), ChannelClosed>;
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Create the FIFO queue between the listener and the UI thread.
///
/// `wake` runs after every successful enqueue so that a consumer blocked in
/// its event wait gets a chance to drain the queue.
pub fn command_channel<W>(wake: W) -> (CommandSender, CommandReceiver)
where
    W: Fn() + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel();
    (
        CommandSender {
            tx,
            wake: Arc::new(wake),
        },
        CommandReceiver { rx },
    )
}

/// Producer half, handed to the [`CommandListener`](super::CommandListener).
pub struct CommandSender {
    tx: mpsc::Sender<Command>,
    wake: Waker,
}

impl CommandSink for CommandSender {
    fn deliver(&self, command: Command) -> Result<(), ChannelClosed> {
        self.tx.send(command).map_err(|_| ChannelClosed)?;
        (self.wake)();
        Ok(())
    }
}

/// Consumer half, owned by the coordinator on the UI thread.
pub struct CommandReceiver {
    rx: mpsc::Receiver<Command>,
}

impl CommandReceiver {
    /// Next queued command, without blocking.
    pub fn try_next(&self) -> Option<Command> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn preserves_order_across_threads() {
        let (sender, receiver) = command_channel(|| {});

        let producer = thread::spawn(move || {
            for i in 0..500 {
                sender
                    .deliver(Command::SetText(i.to_string()))
                    .expect("receiver alive");
            }
        });
        producer.join().expect("producer panicked");

        let mut seen = Vec::new();
        while let Some(command) = receiver.try_next() {
            seen.push(command);
        }
        let expected: Vec<_> = (0..500).map(|i| Command::SetText(i.to_string())).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn wakes_consumer_once_per_delivery() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        let (sender, receiver) = command_channel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        sender.deliver(Command::Show).unwrap();
        sender.deliver(Command::Hide).unwrap();

        assert_eq!(wakes.load(Ordering::SeqCst), 2);
        assert_eq!(receiver.try_next(), Some(Command::Show));
        assert_eq!(receiver.try_next(), Some(Command::Hide));
        assert_eq!(receiver.try_next(), None);
    }

    #[test]
    fn delivery_fails_once_receiver_is_dropped() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = wakes.clone();
        let (sender, receiver) = command_channel(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(receiver);

        assert_eq!(sender.deliver(Command::Toggle), Err(ChannelClosed));
        assert_eq!(wakes.load(Ordering::SeqCst), 0);
    }
}
