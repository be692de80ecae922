//! The console the controller writes run output to.

use std::sync::atomic::{AtomicUsize, Ordering};

use codeplay_runner::{BufferSink, Channel, OutputSink};

/// An output sink that can also be wiped before a run.
pub trait Console: OutputSink {
    fn clear(&self);
}

/// A console that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryConsole {
    buffer: BufferSink,
    clears: AtomicUsize,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written since the last clear.
    pub fn lines(&self) -> Vec<(Channel, String)> {
        self.buffer.lines()
    }

    pub fn channel(&self, channel: Channel) -> Vec<String> {
        self.buffer.channel(channel)
    }

    /// How many times the console has been cleared.
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl OutputSink for MemoryConsole {
    fn write(&self, channel: Channel, text: &str) {
        self.buffer.write(channel, text)
    }
}

impl Console for MemoryConsole {
    fn clear(&self) {
        self.buffer.clear();
        self.clears.fetch_add(1, Ordering::SeqCst);
    }
}

impl<T: Console + ?Sized> Console for &T {
    fn clear(&self) {
        (**self).clear()
    }
}
