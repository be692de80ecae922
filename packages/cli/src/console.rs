use std::sync::{Mutex, MutexGuard, PoisonError};

use codeplay_runner::{Channel, OutputSink};
use codeplay_session::Console;

use crate::io::Output;

/// Console that holds lines until the shell hands them to its host.
///
/// `clear` drops anything not yet delivered; delivered lines stay in the
/// terminal's scrollback.
#[derive(Debug, Default)]
pub struct PendingConsole {
    lines: Mutex<Vec<(Channel, String)>>,
}

impl PendingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything written since the last drain.
    pub fn drain(&self) -> Vec<Output> {
        self.lines()
            .drain(..)
            .map(|(channel, text)| Output::console(channel, text))
            .collect()
    }

    // A writer that panicked mid-push leaves the vector intact.
    fn lines(&self) -> MutexGuard<'_, Vec<(Channel, String)>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutputSink for PendingConsole {
    fn write(&self, channel: Channel, text: &str) {
        self.lines().push((channel, text.to_string()));
    }
}

impl Console for PendingConsole {
    fn clear(&self) {
        self.lines().clear();
    }
}
