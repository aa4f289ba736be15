//! Shared drawings and the observers watching them.
//!
//! A [`Drawing`] owns one [`ShapeList`] and the set of live observers. Edits
//! append under the drawing's lock. Rendering happens outside it, on at most
//! one render worker per drawing. The worker snapshots the newest shapes and
//! observer slots, publishes a frame at each observer's resolution, and
//! repeats until no newer edit is waiting, so a burst of edits costs a couple
//! of renders rather than one per edit.
//!
//! Each observer has a single-slot latest-value channel. Publishing replaces
//! whatever frame is waiting, so a slow viewer skips intermediate edits
//! instead of queueing them. A slot only accepts frames with a higher
//! generation than the one it holds, so viewers never move backwards.

use crate::edit::{CircleEdit, EditError};
use crate::render::{Frame, RenderResult, Renderer};
use crate::shape_list::ShapeList;
use crate::shapes::Shape;
use bytes::Bytes;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::watch;

/// Width used to normalize edits from a session with no live observer.
pub const DEFAULT_SESSION_WIDTH: u32 = 400;

/// Identifies one observer within its drawing.
pub type ObserverId = u64;

/// Drawing-side half of an observer.
struct ObserverSlot {
    width: u32,
    height: u32,
    session_id: String,
    tx: watch::Sender<Frame>,
}

#[derive(Default)]
struct DrawingState {
    /// Shared with in-flight renders; appends copy only while one holds it.
    shapes: Arc<ShapeList>,
    observers: HashMap<ObserverId, ObserverSlot>,
    next_observer_id: ObserverId,
    /// Newest generation the render worker has picked up.
    broadcast_generation: usize,
    /// Whether a render worker is running.
    rendering: bool,
}

/// A named shared canvas: one shape list plus its live viewers.
pub struct Drawing {
    id: String,
    renderer: Arc<dyn Renderer>,
    fallback_width: u32,
    state: Mutex<DrawingState>,
}

impl Drawing {
    /// Create an empty drawing.
    pub fn new(id: impl Into<String>, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            id: id.into(),
            renderer,
            fallback_width: DEFAULT_SESSION_WIDTH,
            state: Mutex::new(DrawingState::default()),
        }
    }

    /// Set the width used for edits from unknown sessions.
    pub fn with_fallback_width(mut self, width: u32) -> Self {
        self.fallback_width = width;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    // The state is append-only, so a panic while it was held cannot leave it torn.
    fn lock(&self) -> MutexGuard<'_, DrawingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of shapes drawn so far.
    pub fn generation(&self) -> usize {
        self.lock().shapes.len()
    }

    /// Snapshot of the current shape list.
    pub fn shapes(&self) -> Arc<ShapeList> {
        Arc::clone(&self.lock().shapes)
    }

    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    /// Append a shape and broadcast the new state to every observer.
    ///
    /// Returns the new shape count without waiting for the broadcast. If a
    /// render worker is already running it picks this edit up on its next
    /// pass. Otherwise one is started: on the blocking pool inside a tokio
    /// runtime, or on the calling thread before this returns.
    pub fn add_shape(self: &Arc<Self>, shape: Shape) -> usize {
        let (generation, start_worker) = {
            let mut state = self.lock();
            let generation = Arc::make_mut(&mut state.shapes).push(shape);
            let start_worker = !state.rendering && !state.observers.is_empty();
            if start_worker {
                state.rendering = true;
            }
            (generation, start_worker)
        };

        if start_worker {
            let drawing = Arc::clone(self);
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn_blocking(move || drawing.run_broadcasts());
                }
                Err(_) => drawing.run_broadcasts(),
            }
        }
        generation
    }

    /// Normalize a pixel-space edit with the editor's own width and append it.
    pub fn apply_edit(self: &Arc<Self>, edit: &CircleEdit, session_id: &str) -> Result<Shape, EditError> {
        let width = self.session_width(session_id);
        let shape = edit.normalize(width)?;
        log::debug!(
            "drawing {}: session {} added {:?} (scale 1/{})",
            self.id,
            session_id,
            shape,
            width
        );
        self.add_shape(shape.clone());
        Ok(shape)
    }

    /// Render worker body: broadcast the newest generation until caught up.
    fn run_broadcasts(&self) {
        let _guard = WorkerGuard(self);
        while let Some(broadcast) = self.next_broadcast() {
            for id in broadcast.deliver() {
                self.remove_observer(id);
            }
        }
    }

    /// Claim the newest generation for broadcast, or retire the worker.
    ///
    /// Checking for work and clearing `rendering` happen under one lock, so
    /// an edit either sees the worker running or starts a new one.
    fn next_broadcast(&self) -> Option<Broadcast> {
        let mut state = self.lock();
        let generation = state.shapes.len();
        if generation == state.broadcast_generation || state.observers.is_empty() {
            state.rendering = false;
            return None;
        }
        state.broadcast_generation = generation;
        Some(self.snapshot(&state))
    }

    fn snapshot(&self, state: &DrawingState) -> Broadcast {
        let targets = state
            .observers
            .iter()
            .map(|(&id, slot)| Target {
                id,
                width: slot.width,
                height: slot.height,
                tx: slot.tx.clone(),
            })
            .collect();
        Broadcast {
            drawing_id: self.id.clone(),
            renderer: Arc::clone(&self.renderer),
            generation: state.shapes.len(),
            shapes: Arc::clone(&state.shapes),
            targets,
        }
    }

    /// Render the current shapes at an arbitrary size.
    ///
    /// Includes every shape appended before the call.
    pub fn render(&self, width: u32, height: u32) -> RenderResult<Frame> {
        let shapes = self.shapes();
        let image = self.renderer.render(shapes.as_slice(), width, height)?;
        Ok(Frame::new(shapes.len(), image))
    }

    /// MIME type of rendered frames.
    pub fn content_type(&self) -> &'static str {
        self.renderer.content_type()
    }

    /// Register a viewer.
    ///
    /// The observer starts with nothing pending. Callers send their own first
    /// frame with [`Drawing::render`] and then wait on [`Observer::next_frame`].
    pub fn observe(self: &Arc<Self>, width: u32, height: u32, session_id: impl Into<String>) -> Observer {
        let session_id = session_id.into();
        let mut state = self.lock();
        let id = state.next_observer_id;
        state.next_observer_id += 1;

        let (tx, rx) = watch::channel(Frame::placeholder(state.shapes.len()));
        state.observers.insert(
            id,
            ObserverSlot {
                width,
                height,
                session_id: session_id.clone(),
                tx,
            },
        );
        log::debug!(
            "drawing {}: observer {} ({}x{}, session {}) registered, {} live",
            self.id,
            id,
            width,
            height,
            session_id,
            state.observers.len()
        );

        Observer {
            id,
            width,
            height,
            session_id,
            rx,
            drawing: Arc::downgrade(self),
        }
    }

    /// Deregister a viewer. Returns `false` if it was already gone or
    /// belongs to another drawing.
    pub fn stop_observing(&self, observer: &Observer) -> bool {
        if !std::ptr::eq(observer.drawing.as_ptr(), self) {
            return false;
        }
        self.remove_observer(observer.id)
    }

    fn remove_observer(&self, id: ObserverId) -> bool {
        let mut state = self.lock();
        let removed = state.observers.remove(&id).is_some();
        if removed {
            log::debug!(
                "drawing {}: observer {} removed, {} live",
                self.id,
                id,
                state.observers.len()
            );
        }
        removed
    }

    /// Width recorded for a live observer of `session_id`.
    ///
    /// Edits and streams are separate connections, so an edit can arrive
    /// while its session's stream is briefly down. In that case the fallback
    /// width is used and the edit still goes through.
    pub fn session_width(&self, session_id: &str) -> u32 {
        let state = self.lock();
        let width = state
            .observers
            .iter()
            .filter(|(_, slot)| slot.session_id == session_id)
            .max_by_key(|&(&id, _)| id)
            .map(|(_, slot)| slot.width);
        match width {
            Some(width) => width,
            None => {
                log::warn!(
                    "drawing {}: unknown session {:?}, assuming width {}",
                    self.id,
                    session_id,
                    self.fallback_width
                );
                self.fallback_width
            }
        }
    }
}

/// A connected viewer's delivery slot.
///
/// Dropping the observer deregisters it from its drawing, so every exit path
/// of a stream cleans up.
pub struct Observer {
    id: ObserverId,
    width: u32,
    height: u32,
    session_id: String,
    rx: watch::Receiver<Frame>,
    drawing: Weak<Drawing>,
}

impl Observer {
    pub fn id(&self) -> ObserverId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether a frame is waiting to be consumed.
    pub fn has_pending(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next frame.
    ///
    /// Returns `None` once the observer has been deregistered.
    pub async fn next_frame(&mut self) -> Option<Frame> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Take the waiting frame, if any, without blocking.
    pub fn try_next_frame(&mut self) -> Option<Frame> {
        if self.has_pending() {
            Some(self.rx.borrow_and_update().clone())
        } else {
            None
        }
    }
}

impl Drop for Observer {
    fn drop(&mut self) {
        if let Some(drawing) = self.drawing.upgrade() {
            drawing.stop_observing(self);
        }
    }
}

struct Target {
    id: ObserverId,
    width: u32,
    height: u32,
    tx: watch::Sender<Frame>,
}

/// Resets the running flag if a render panics, so later edits start a
/// fresh worker.
struct WorkerGuard<'a>(&'a Drawing);

impl Drop for WorkerGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.lock().rendering = false;
        }
    }
}

/// Snapshot of one generation, rendered and published outside the lock.
struct Broadcast {
    drawing_id: String,
    renderer: Arc<dyn Renderer>,
    generation: usize,
    shapes: Arc<ShapeList>,
    targets: Vec<Target>,
}

impl Broadcast {
    /// Render once per distinct resolution and publish. Returns the
    /// observers whose receiving half is gone.
    fn deliver(self) -> Vec<ObserverId> {
        let mut rendered: HashMap<(u32, u32), Bytes> = HashMap::new();
        let mut closed = Vec::new();

        for target in &self.targets {
            if target.tx.is_closed() {
                closed.push(target.id);
                continue;
            }

            let image = match rendered.entry((target.width, target.height)) {
                Entry::Occupied(entry) => entry.get().clone(),
                Entry::Vacant(entry) => {
                    match self.renderer.render(self.shapes.as_slice(), target.width, target.height) {
                        Ok(bytes) => entry.insert(Bytes::from(bytes)).clone(),
                        Err(e) => {
                            log::error!(
                                "drawing {}: render for observer {} failed: {}",
                                self.drawing_id,
                                target.id,
                                e
                            );
                            continue;
                        }
                    }
                }
            };

            let frame = Frame::new(self.generation, image);
            target.tx.send_if_modified(|current| {
                if frame.generation > current.generation {
                    *current = frame;
                    true
                } else {
                    false
                }
            });
        }

        log::debug!(
            "drawing {}: generation {} delivered to {} observers ({} renders)",
            self.drawing_id,
            self.generation,
            self.targets.len() - closed.len(),
            rendered.len()
        );
        closed
    }
}
