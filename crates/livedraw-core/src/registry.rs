//! Process-wide store of drawings.

use crate::drawing::{DEFAULT_SESSION_WIDTH, Drawing};
use crate::render::Renderer;
use dashmap::DashMap;
use std::sync::Arc;

/// Maps drawing ids to drawings, creating them on first access.
///
/// Built once at startup and owned by the request-handling layer. Entries
/// are never removed: a drawing lives as long as the process.
pub struct DrawingRegistry {
    drawings: DashMap<String, Arc<Drawing>>,
    renderer: Arc<dyn Renderer>,
    fallback_width: u32,
}

impl DrawingRegistry {
    /// Create an empty registry whose drawings render with `renderer`.
    pub fn new(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            drawings: DashMap::new(),
            renderer,
            fallback_width: DEFAULT_SESSION_WIDTH,
        }
    }

    /// Set the width new drawings use for edits from unknown sessions.
    pub fn with_fallback_width(mut self, width: u32) -> Self {
        self.fallback_width = width;
        self
    }

    /// Get the drawing for `id`, creating an empty one if needed.
    ///
    /// Concurrent first accesses for the same id all get the same instance.
    pub fn get(&self, id: &str) -> Arc<Drawing> {
        if let Some(drawing) = self.drawings.get(id) {
            return Arc::clone(drawing.value());
        }
        let entry = self.drawings.entry(id.to_string()).or_insert_with(|| {
            log::info!("creating drawing {}", id);
            Arc::new(Drawing::new(id, Arc::clone(&self.renderer)).with_fallback_width(self.fallback_width))
        });
        Arc::clone(entry.value())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.drawings.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }
}
