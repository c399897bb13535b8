//! Priority-ordered draw-call queue with pipeline state diffing
//!
//! Components enqueue draw calls in any order during the render walk; the
//! queue releases them ordered by render-order key (submission order breaks
//! ties) and emits only the state changes the device actually needs between
//! consecutive calls.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::foundation::math::Mat4;

use super::device::RenderDevice;
use super::state::RenderStates;
use super::MeshId;

/// One mesh draw: what to draw, where, and under which pipeline state
#[derive(Debug, Clone)]
pub struct DrawCall {
    /// Mesh to draw
    pub mesh: MeshId,
    /// World transform
    pub transform: Mat4,
    /// Pipeline state to run under
    pub states: RenderStates,
}

impl DrawCall {
    /// Draw call at the given transform with default (opaque) states
    #[must_use]
    pub fn new(mesh: MeshId, transform: Mat4) -> Self {
        Self {
            mesh,
            transform,
            states: RenderStates::default(),
        }
    }

    /// Replace the pipeline states
    #[must_use]
    pub fn with_states(mut self, states: RenderStates) -> Self {
        self.states = states;
        self
    }
}

/// Heap entry ordered by (render order, submission sequence)
#[derive(Debug)]
struct Queued {
    order: i32,
    seq: u64,
    call: DrawCall,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.seq == other.seq
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.order, self.seq).cmp(&(other.order, other.seq))
    }
}

/// Min-heap of pending draw calls
///
/// Insertion is `O(log n)`; a flush releases calls in ascending render-order,
/// equal keys in submission order.
#[derive(Debug, Default)]
pub struct DrawQueue {
    heap: BinaryHeap<Reverse<Queued>>,
    next_seq: u64,
}

impl DrawQueue {
    /// An empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending calls
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// True when no calls are pending
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Queue a call under the given render-order key
    pub fn enqueue(&mut self, order: i32, call: DrawCall) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Queued { order, seq, call }));
    }

    /// Drain the queue into the device in render order, diffing pipeline
    /// state between consecutive calls
    ///
    /// State tracking starts cold on every flush, so the first call always
    /// emits its full state. A call whose material fails to bind is logged
    /// and skipped; the flush continues.
    pub fn flush(&mut self, device: &mut dyn RenderDevice) {
        let mut applied: Option<RenderStates> = None;

        while let Some(Reverse(queued)) = self.heap.pop() {
            let states = queued.call.states;

            // Material first: if it cannot bind, nothing else should change.
            if applied.is_none_or(|prev| prev.material != states.material) {
                if let Some(material) = states.material {
                    if let Err(err) = device.bind_material(material) {
                        log::warn!("draw call for mesh {:?} skipped: {err}", queued.call.mesh);
                        continue;
                    }
                }
            }
            if applied.is_none_or(|prev| prev.texture != states.texture) {
                if let Some(texture) = states.texture {
                    device.bind_texture(texture);
                }
            }
            if applied.is_none_or(|prev| prev.blend != states.blend) {
                device.apply_blend(states.blend);
            }
            if applied.is_none_or(|prev| prev.depth != states.depth) {
                device.apply_depth(states.depth);
            }
            applied = Some(states);

            device.draw(queued.call.mesh, &queued.call.transform);
        }
    }
}

/// One layer: its own queue under its own composed transform
#[derive(Debug)]
struct Layer {
    transform: Mat4,
    queue: DrawQueue,
}

/// Draw submission context threaded through the render walk
///
/// A stack of layers, each scoping an independent draw-call queue and a
/// coordinate transform for nested render passes (render-to-texture inside
/// a larger scene). Calls land in the top layer's queue composed with its
/// transform; popping restores the parent queue and transform. The base
/// layer (identity transform) always exists.
#[derive(Debug)]
pub struct DrawContext {
    layers: Vec<Layer>,
}

impl Default for DrawContext {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawContext {
    /// A context holding only the base layer
    #[must_use]
    pub fn new() -> Self {
        Self {
            layers: vec![Layer {
                transform: Mat4::identity(),
                queue: DrawQueue::new(),
            }],
        }
    }

    fn top(&mut self) -> &mut Layer {
        self.layers.last_mut().expect("base layer always exists")
    }

    /// Push a nested layer with a fresh queue; `transform` composes with the
    /// current layer's transform
    pub fn push_layer(&mut self, transform: Mat4) {
        let composed = self.top().transform * transform;
        self.layers.push(Layer {
            transform: composed,
            queue: DrawQueue::new(),
        });
    }

    /// Pop the top layer, restoring the parent queue and transform
    ///
    /// A nested pass is expected to flush before popping; calls still
    /// pending in the popped layer belong to a finished pass and are
    /// discarded with a warning.
    ///
    /// # Panics
    /// Panics when only the base layer remains; unbalanced pops are a
    /// programming error in the caller's render code.
    pub fn pop_layer(&mut self) {
        assert!(self.layers.len() > 1, "pop_layer on the base layer");
        let popped = self.layers.pop().expect("stack depth checked above");
        if !popped.queue.is_empty() {
            log::warn!(
                "popped layer discarded {} unflushed draw calls",
                popped.queue.len()
            );
        }
    }

    /// Number of layers above the base
    pub fn layer_depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Queue a call into the current layer, composed with its transform
    pub fn enqueue(&mut self, order: i32, mut call: DrawCall) {
        let layer = self.top();
        call.transform = layer.transform * call.transform;
        layer.queue.enqueue(order, call);
    }

    /// Number of calls pending in the current layer
    pub fn pending(&mut self) -> usize {
        self.top().queue.len()
    }

    /// Flush the current layer's pending calls into the device
    pub fn flush(&mut self, device: &mut dyn RenderDevice) {
        self.top().queue.flush(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::{DeviceOp, RecordingDevice};
    use crate::render::state::MaterialId;

    fn call(mesh: u32) -> DrawCall {
        DrawCall::new(MeshId(mesh), Mat4::identity())
    }

    #[test]
    fn test_flush_orders_by_key_with_stable_ties() {
        let mut queue = DrawQueue::new();
        // Orders [5, 1, 5, 3] must come out [1, 3, 5, 5] with the two
        // fives in submission order.
        queue.enqueue(5, call(50));
        queue.enqueue(1, call(10));
        queue.enqueue(5, call(51));
        queue.enqueue(3, call(30));

        let mut device = RecordingDevice::new(64, 64);
        queue.flush(&mut device);

        let drawn: Vec<MeshId> = device
            .ops()
            .iter()
            .filter_map(|op| match op {
                DeviceOp::Draw(mesh) => Some(*mesh),
                _ => None,
            })
            .collect();
        assert_eq!(drawn, vec![MeshId(10), MeshId(30), MeshId(50), MeshId(51)]);
    }

    #[test]
    fn test_flush_emits_one_state_block_for_equal_states() {
        let states = RenderStates::opaque(MaterialId(4));
        let mut queue = DrawQueue::new();
        for mesh in 0..8 {
            queue.enqueue(0, call(mesh).with_states(states));
        }

        let mut device = RecordingDevice::new(64, 64);
        queue.flush(&mut device);

        // One material bind, one blend, one depth; then eight draws.
        assert_eq!(device.state_change_count(), 3);
        assert_eq!(device.draw_count(), 8);
    }

    #[test]
    fn test_flush_state_tracking_resets_between_flushes() {
        let states = RenderStates::opaque(MaterialId(4));
        let mut device = RecordingDevice::new(64, 64);
        let mut queue = DrawQueue::new();

        queue.enqueue(0, call(1).with_states(states));
        queue.flush(&mut device);
        queue.enqueue(0, call(2).with_states(states));
        queue.flush(&mut device);

        // The second flush re-emits the full state even though the device
        // last saw the same one.
        assert_eq!(device.state_change_count(), 6);
    }

    #[test]
    fn test_failed_material_bind_skips_only_that_call() {
        let mut queue = DrawQueue::new();
        queue.enqueue(0, call(1).with_states(RenderStates::opaque(MaterialId(1))));
        queue.enqueue(1, call(2).with_states(RenderStates::opaque(MaterialId(666))));
        queue.enqueue(2, call(3).with_states(RenderStates::opaque(MaterialId(1))));

        let mut device = RecordingDevice::new(64, 64);
        device.fail_material(MaterialId(666));
        queue.flush(&mut device);

        let drawn: Vec<MeshId> = device
            .ops()
            .iter()
            .filter_map(|op| match op {
                DeviceOp::Draw(mesh) => Some(*mesh),
                _ => None,
            })
            .collect();
        assert_eq!(drawn, vec![MeshId(1), MeshId(3)]);
    }

    #[test]
    fn test_interleaved_states_emit_changes_per_transition() {
        let opaque = RenderStates::opaque(MaterialId(1));
        let transparent = RenderStates::transparent(MaterialId(1));

        let mut queue = DrawQueue::new();
        queue.enqueue(0, call(1).with_states(opaque));
        queue.enqueue(1, call(2).with_states(transparent));
        queue.enqueue(2, call(3).with_states(opaque));

        let mut device = RecordingDevice::new(64, 64);
        queue.flush(&mut device);

        // Material never changes after the first bind; blend and depth flip
        // twice each.
        let materials = device
            .ops()
            .iter()
            .filter(|op| matches!(op, DeviceOp::Material(_)))
            .count();
        assert_eq!(materials, 1);
        let blends = device
            .ops()
            .iter()
            .filter(|op| matches!(op, DeviceOp::Blend(_)))
            .count();
        assert_eq!(blends, 3);
    }

    #[test]
    fn test_nested_layer_scopes_an_independent_queue() {
        let mut ctx = DrawContext::new();
        ctx.enqueue(0, call(1));

        // The nested pass flushes its own queue without touching the base
        // layer's pending calls.
        ctx.push_layer(Mat4::identity());
        ctx.enqueue(0, call(2));
        assert_eq!(ctx.pending(), 1);
        let mut device = RecordingDevice::new(64, 64);
        ctx.flush(&mut device);
        ctx.pop_layer();

        assert_eq!(ctx.pending(), 1);
        ctx.flush(&mut device);

        let drawn: Vec<MeshId> = device
            .ops()
            .iter()
            .filter_map(|op| match op {
                DeviceOp::Draw(mesh) => Some(*mesh),
                _ => None,
            })
            .collect();
        assert_eq!(drawn, vec![MeshId(2), MeshId(1)]);
    }

    #[test]
    fn test_layer_transform_composes_onto_enqueued_calls() {
        let shift = Mat4::new_translation(&crate::foundation::math::Vec3::new(2.0, 0.0, 0.0));
        let mut ctx = DrawContext::new();
        ctx.push_layer(shift);
        ctx.push_layer(shift);
        ctx.enqueue(0, call(1));

        let mut device = RecordingDevice::new(64, 64);
        ctx.flush(&mut device);
        ctx.pop_layer();
        ctx.pop_layer();
        assert_eq!(ctx.layer_depth(), 0);
    }

    #[test]
    #[should_panic(expected = "pop_layer on the base layer")]
    fn test_unbalanced_pop_panics() {
        let mut ctx = DrawContext::new();
        ctx.pop_layer();
    }
}
