//! The editing surface.
//!
//! An editor starts `Plain` and may be upgraded once to `Enhanced`, which
//! adds syntax highlighting. The upgrade carries text, visibility and mode
//! across, and change listeners stay attached.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Renders source text with syntax highlighting.
pub trait Highlighter: Send + Sync {
    fn highlight(&self, mode: &str, text: &str) -> String;
}

/// Acquires a highlighter. May fail, in which case the editor stays plain.
#[async_trait]
pub trait HighlighterLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Highlighter>>;
}

/// Called with the new text after every user edit.
pub type ChangeListener = Box<dyn FnMut(&str) + Send>;

/// What the editor shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    pub text: String,
    pub visible: bool,
    pub mode: String,
}

pub enum EditorSurface {
    Plain(Buffer),
    Enhanced {
        buffer: Buffer,
        highlighter: Arc<dyn Highlighter>,
    },
}

impl EditorSurface {
    fn buffer(&self) -> &Buffer {
        match self {
            EditorSurface::Plain(buffer) => buffer,
            EditorSurface::Enhanced { buffer, .. } => buffer,
        }
    }

    fn buffer_mut(&mut self) -> &mut Buffer {
        match self {
            EditorSurface::Plain(buffer) => buffer,
            EditorSurface::Enhanced { buffer, .. } => buffer,
        }
    }
}

impl fmt::Debug for EditorSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorSurface::Plain(buffer) => f.debug_tuple("Plain").field(buffer).finish(),
            EditorSurface::Enhanced { buffer, .. } => {
                f.debug_struct("Enhanced").field("buffer", buffer).finish()
            }
        }
    }
}

pub struct Editor {
    surface: EditorSurface,
    listeners: Vec<ChangeListener>,
}

impl Editor {
    /// A hidden, empty, plain editor.
    pub fn new() -> Self {
        Self {
            surface: EditorSurface::Plain(Buffer::default()),
            listeners: Vec::new(),
        }
    }

    pub fn value(&self) -> &str {
        &self.surface.buffer().text
    }

    /// Replace the text without notifying listeners.
    pub fn set_value(&mut self, text: &str) {
        self.surface.buffer_mut().text = text.to_string();
    }

    /// Replace the text as a user edit: listeners are notified.
    pub fn apply_edit(&mut self, text: &str) {
        self.set_value(text);
        for listener in &mut self.listeners {
            listener(text);
        }
    }

    pub fn is_visible(&self) -> bool {
        self.surface.buffer().visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.surface.buffer_mut().visible = visible;
    }

    pub fn mode(&self) -> &str {
        &self.surface.buffer().mode
    }

    pub fn set_mode(&mut self, mode: &str) {
        self.surface.buffer_mut().mode = mode.to_string();
    }

    pub fn on_change(&mut self, listener: ChangeListener) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn surface(&self) -> &EditorSurface {
        &self.surface
    }

    pub fn is_enhanced(&self) -> bool {
        matches!(self.surface, EditorSurface::Enhanced { .. })
    }

    /// Switch to the enhanced surface. Returns `false` if already enhanced.
    pub fn upgrade(&mut self, highlighter: Arc<dyn Highlighter>) -> bool {
        let buffer = match &self.surface {
            EditorSurface::Plain(buffer) => buffer.clone(),
            EditorSurface::Enhanced { .. } => return false,
        };
        self.surface = EditorSurface::Enhanced {
            buffer,
            highlighter,
        };
        true
    }

    /// The text as it should be displayed.
    pub fn render(&self) -> String {
        match &self.surface {
            EditorSurface::Plain(buffer) => buffer.text.clone(),
            EditorSurface::Enhanced {
                buffer,
                highlighter,
            } => highlighter.highlight(&buffer.mode, &buffer.text),
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
