//! Draw ordering for alpha blending.
//!
//! Translucent surfaces only blend correctly over what is already in the
//! framebuffer, so they have to come last and far-to-near. [`DrawQueue`]
//! collects parts, then replays them as two batches: opaque parts with depth
//! writes on, followed by translucent parts sorted back-to-front with depth
//! writes off and alpha blending on.

use crate::error::Error;
use crate::matrix::Matrix4;
use crate::render::RenderState;
use crate::scene::{PartSink, Shape};

/// One queued part.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub shape: Shape,
    pub model: Matrix4,
    pub color: [f32; 4],
}

impl DrawItem {
    pub fn is_translucent(&self) -> bool {
        self.color[3] < 1.0
    }

    /// View-space z of the part's origin. More negative is farther away.
    fn view_depth(&self, view: &Matrix4) -> f32 {
        (*view * self.model)
            .transform_point(glam::Vec3::ZERO)
            .z
    }
}

/// Items sharing one render state, in draw order.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    pub state: RenderState,
    pub items: Vec<DrawItem>,
}

/// Collects parts and replays them in blending-safe order.
#[derive(Clone, Debug, Default)]
pub struct DrawQueue {
    items: Vec<DrawItem>,
}

impl DrawQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shape: Shape, model: &Matrix4, color: [f32; 4]) {
        self.items.push(DrawItem {
            shape,
            model: *model,
            color,
        });
    }

    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Opaque batch in submission order, then translucent batch sorted
    /// back-to-front relative to `view`. Empty batches are omitted.
    pub fn ordered(&self, view: &Matrix4) -> Vec<Batch> {
        let (opaque, mut translucent): (Vec<DrawItem>, Vec<DrawItem>) = self
            .items
            .iter()
            .partition(|item| !item.is_translucent());

        translucent.sort_by(|a, b| a.view_depth(view).total_cmp(&b.view_depth(view)));

        let mut batches = Vec::with_capacity(2);
        if !opaque.is_empty() {
            batches.push(Batch {
                state: RenderState::OPAQUE,
                items: opaque,
            });
        }
        if !translucent.is_empty() {
            batches.push(Batch {
                state: RenderState::TRANSLUCENT,
                items: translucent,
            });
        }
        batches
    }

    /// Draws everything into `sink` in [`ordered`](Self::ordered) order and
    /// empties the queue. Restores opaque state afterwards.
    pub fn flush<S: PartSink + ?Sized>(&mut self, view: &Matrix4, sink: &mut S) -> Result<(), Error> {
        let batches = self.ordered(view);
        self.items.clear();
        for batch in &batches {
            sink.set_state(batch.state);
            for item in &batch.items {
                sink.draw_part(item.shape, &item.model, item.color)?;
            }
        }
        sink.set_state(RenderState::OPAQUE);
        Ok(())
    }
}

impl PartSink for DrawQueue {
    fn draw_part(&mut self, shape: Shape, model: &Matrix4, color: [f32; 4]) -> Result<(), Error> {
        self.push(shape, model, color);
        Ok(())
    }
}
