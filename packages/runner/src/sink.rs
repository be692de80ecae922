//! Output channels.

use std::sync::Mutex;

/// The three channels a runner can write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Normal program output.
    Stdout,
    /// Errors, exceptions and failed loads.
    Stderr,
    /// Lifecycle and status notices.
    System,
}

/// Receiver for runner output.
///
/// Every piece of output goes to exactly one channel. Sinks are append-only.
pub trait OutputSink: Send + Sync {
    fn write(&self, channel: Channel, text: &str);

    fn stdout(&self, text: &str) {
        self.write(Channel::Stdout, text)
    }

    fn stderr(&self, text: &str) {
        self.write(Channel::Stderr, text)
    }

    fn system(&self, text: &str) {
        self.write(Channel::System, text)
    }
}

impl<T: OutputSink + ?Sized> OutputSink for &T {
    fn write(&self, channel: Channel, text: &str) {
        (**self).write(channel, text)
    }
}

/// A sink that records every line, for tests and headless callers.
#[derive(Debug, Default)]
pub struct BufferSink {
    lines: Mutex<Vec<(Channel, String)>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, in order.
    pub fn lines(&self) -> Vec<(Channel, String)> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Text written to one channel, in order.
    pub fn channel(&self, channel: Channel) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(c, _)| *c == channel)
            .map(|(_, text)| text)
            .collect()
    }

    pub fn clear(&self) {
        match self.lines.lock() {
            Ok(mut lines) => lines.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl OutputSink for BufferSink {
    fn write(&self, channel: Channel, text: &str) {
        match self.lines.lock() {
            Ok(mut lines) => lines.push((channel, text.to_string())),
            Err(poisoned) => poisoned.into_inner().push((channel, text.to_string())),
        }
    }
}
