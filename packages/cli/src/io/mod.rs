//! The boundary between the shell core and whatever displays it.
//!
//! The core only ever sees an `IoHost`: it asks for the next input, hands
//! back styled output and says what the prompt should show. The terminal
//! host and the in-memory test host both sit behind this trait.

pub mod types;

#[cfg(test)]
pub mod test_host;

pub use types::*;

#[cfg(test)]
pub use test_host::TestHost;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait IoHost {
    /// Block until the user enters a line or presses Ctrl+C / Ctrl+D.
    fn read(&mut self) -> Result<Input, IoError>;

    fn write(&mut self, output: Output) -> Result<(), IoError>;

    /// Shown before the next `read`. Carries the paths offered for completion.
    fn set_prompt(&mut self, prompt: PromptConfig) -> Result<(), IoError>;

    fn flush(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}
