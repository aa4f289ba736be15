//! `multipart/x-mixed-replace` framing for live drawings.
//!
//! Browsers replace the displayed image each time a part completes. A part
//! is complete once the next delimiter arrives, so every chunk ends with the
//! header of the following part.

use bytes::{Bytes, BytesMut};
use futures_util::Stream;
use futures_util::stream;
use livedraw_core::{Frame, Observer};
use std::convert::Infallible;
use tracing::info;
use uuid::Uuid;

const BOUNDARY_PREFIX: &str = "boundary-";

/// Writes frames as parts of one multipart response.
#[derive(Debug, Clone)]
pub struct MultipartFramer {
    boundary: String,
    part_header: Bytes,
}

impl MultipartFramer {
    /// Framer with a fresh random boundary.
    pub fn new(image_type: &str) -> Self {
        Self::with_boundary(format!("{}{}", BOUNDARY_PREFIX, Uuid::new_v4().simple()), image_type)
    }

    pub fn with_boundary(boundary: impl Into<String>, image_type: &str) -> Self {
        let boundary = boundary.into();
        let part_header = Bytes::from(format!(
            "--{}\r\nContent-Type: {}\r\n\r\n",
            boundary, image_type
        ));
        Self {
            boundary,
            part_header,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the response's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/x-mixed-replace; boundary=\"{}\"", self.boundary)
    }

    /// First chunk of the response: opening delimiter, image, next delimiter.
    pub fn first_part(&self, image: &[u8]) -> Bytes {
        let mut chunk = BytesMut::with_capacity(self.part_header.len() * 2 + image.len() + 2);
        chunk.extend_from_slice(&self.part_header);
        chunk.extend_from_slice(image);
        chunk.extend_from_slice(b"\r\n");
        chunk.extend_from_slice(&self.part_header);
        chunk.freeze()
    }

    /// Every later chunk: image, then the next delimiter.
    pub fn next_part(&self, image: &[u8]) -> Bytes {
        let mut chunk = BytesMut::with_capacity(self.part_header.len() + image.len() + 2);
        chunk.extend_from_slice(image);
        chunk.extend_from_slice(b"\r\n");
        chunk.extend_from_slice(&self.part_header);
        chunk.freeze()
    }
}

struct LiveState {
    observer: Observer,
    framer: MultipartFramer,
    first: Option<Bytes>,
    last_generation: usize,
    drawing_id: String,
}

impl Drop for LiveState {
    fn drop(&mut self) {
        info!(
            "Stream closed: drawing {} session {}",
            self.drawing_id,
            self.observer.session_id()
        );
    }
}

/// Body stream for one viewer.
///
/// Yields the already rendered `first` frame, then one part per newer frame
/// delivered to `observer`. Frames not newer than the last one written are
/// skipped. Dropping the stream (client gone, write failed) drops the
/// observer, which deregisters it from its drawing.
pub fn live_stream(
    drawing_id: String,
    observer: Observer,
    framer: MultipartFramer,
    first: Frame,
) -> impl Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    let state = LiveState {
        first: Some(framer.first_part(&first.image)),
        last_generation: first.generation,
        observer,
        framer,
        drawing_id,
    };

    stream::unfold(state, |mut state| async move {
        if let Some(chunk) = state.first.take() {
            return Some((Ok(chunk), state));
        }
        loop {
            let frame = state.observer.next_frame().await?;
            if frame.generation <= state.last_generation {
                continue;
            }
            state.last_generation = frame.generation;
            let chunk = state.framer.next_part(&frame.image);
            return Some((Ok(chunk), state));
        }
    })
}
