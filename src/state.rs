use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::model::Dimension;

// ── Stage ───────────────────────────────────────────────────────────

/// A shape drawn by `create`. `handle` is what `create` hands to outer
/// keywords (`circle#1`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drawing {
    pub handle: String,
    pub shape: String,
    pub size: Option<Dimension>,
    pub color: Option<String>,
    pub position: Option<String>,
    /// Grid offset from `position`, moved by `move`.
    pub offset: (i32, i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextItem {
    pub element: String,
    pub text: String,
}

/// Everything the demo vocabulary has drawn or written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stage {
    pub drawings: Vec<Drawing>,
    pub texts: Vec<TextItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    #[error("no shape called \"{0}\"")]
    UnknownShape(String),
    #[error("nothing to move")]
    NothingToMove,
    #[error("unknown direction \"{0}\"")]
    UnknownDirection(String),
}

impl Stage {
    /// Draw a shape and return its handle.
    pub fn draw(
        &mut self,
        shape: &str,
        size: Option<Dimension>,
        color: Option<String>,
        position: Option<String>,
    ) -> String {
        let handle = format!("{shape}#{}", self.drawings.len() + 1);
        self.drawings.push(Drawing {
            handle: handle.clone(),
            shape: shape.to_string(),
            size,
            color,
            position,
            offset: (0, 0),
        });
        handle
    }

    pub fn drawing(&self, handle: &str) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.handle == handle)
    }

    /// Color an existing drawing. Accepts a handle, or a bare shape name for
    /// the most recent drawing of that shape.
    pub fn fill(&mut self, shape: &str, color: String) -> Result<(), StageError> {
        let drawing = self
            .drawings
            .iter_mut()
            .rev()
            .find(|d| d.handle == shape || d.shape == shape)
            .ok_or_else(|| StageError::UnknownShape(shape.to_string()))?;
        drawing.color = Some(color);
        Ok(())
    }

    pub fn write(&mut self, element: &str, text: &str) {
        self.texts.push(TextItem {
            element: element.to_string(),
            text: text.to_string(),
        });
    }

    /// Append to the last text in `element`, or start one.
    pub fn append(&mut self, element: &str, text: &str) {
        match self.texts.iter_mut().rev().find(|t| t.element == element) {
            Some(item) => {
                item.text.push(' ');
                item.text.push_str(text);
            }
            None => self.write(element, text),
        }
    }

    /// Shift the most recent drawing one step in `direction`.
    pub fn move_last(&mut self, direction: &str) -> Result<(), StageError> {
        let (dx, dy) = match direction {
            "up" => (0, -1),
            "down" => (0, 1),
            "left" => (-1, 0),
            "right" => (1, 0),
            other => return Err(StageError::UnknownDirection(other.to_string())),
        };
        let drawing = self.drawings.last_mut().ok_or(StageError::NothingToMove)?;
        drawing.offset.0 += dx;
        drawing.offset.1 += dy;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty() && self.texts.is_empty()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.drawings {
            write!(f, "{}", d.handle)?;
            if let Some(size) = &d.size {
                write!(f, " size={size}")?;
            }
            if let Some(color) = &d.color {
                write!(f, " color={color}")?;
            }
            if let Some(position) = &d.position {
                write!(f, " at={position}")?;
            }
            if d.offset != (0, 0) {
                write!(f, " offset={},{}", d.offset.0, d.offset.1)?;
            }
            writeln!(f)?;
        }
        for t in &self.texts {
            writeln!(f, "[{}] {}", t.element, t.text)?;
        }
        Ok(())
    }
}

// ── Shared handle ───────────────────────────────────────────────────

/// Stage shared between the handlers that draw on it and whoever shows it.
#[derive(Debug, Clone, Default)]
pub struct StageHandle(Arc<Mutex<Stage>>);

impl StageHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only access to the stage. Locks the mutex for the duration of `f`.
    pub fn with_stage<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Stage) -> R,
    {
        let guard = self.0.lock();
        f(&guard)
    }

    /// Mutating access to the stage. Locks the mutex for the duration of `f`.
    pub fn with_stage_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Stage) -> R,
    {
        let mut guard = self.0.lock();
        f(&mut guard)
    }

    pub fn snapshot(&self) -> Stage {
        self.with_stage(Clone::clone)
    }
}
