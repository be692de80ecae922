//! Interactive hosts for the shell.

pub mod terminal;

pub use terminal::{TerminalHost, EDIT_MODE_ENV};
