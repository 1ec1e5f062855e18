// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! The lock-step simulation environment
//!
//! Owns all entities in type-homogeneous storage, owns all IO buffers, and
//! drives the two phases of every step: `process` (all entities compute into
//! their write sides) and `swap_io` (all buffers flip and refresh their
//! read-side statistics). Hooks can observe the simulation between phases.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::sync::Arc;

use ahash::AHashMap;
use thiserror::Error;
use tracing::{debug, error};

use crate::buffer::IoBuffer;
use crate::entity::{Entity, PartialId};

/// Fatal wiring mistakes. Both indicate programmer error in the entity graph
/// and cannot be recovered meaningfully.
#[derive(Debug, Error)]
pub enum WiringError {
    #[error("duplicate entity output id {0}")]
    DuplicateOutputId(PartialId),
    #[error("entity with output id {entity} requires unknown input id {input}")]
    MissingInputId { entity: PartialId, input: PartialId },
}

/// Uniform view over one concrete entity type's contiguous storage.
trait EntityBucket {
    fn len(&self) -> usize;
    fn entity_mut(&mut self, idx: usize) -> &mut dyn Entity;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct TypedBucket<T: Entity + 'static>(Vec<T>);

impl<T: Entity + 'static> EntityBucket for TypedBucket<T> {
    fn len(&self) -> usize {
        self.0.len()
    }

    fn entity_mut(&mut self, idx: usize) -> &mut dyn Entity {
        &mut self.0[idx]
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

type Hook = Box<dyn FnMut()>;

/// The simulation environment.
#[derive(Default)]
pub struct Environment {
    buckets: AHashMap<TypeId, Box<dyn EntityBucket>>,
    // Buckets iterate in registration order so stepping stays reproducible.
    bucket_order: Vec<TypeId>,
    io_buffers: AHashMap<PartialId, Arc<IoBuffer>>,
    next_hook_id: usize,
    pre_process_hooks: BTreeMap<usize, Hook>,
    post_process_hooks: BTreeMap<usize, Hook>,
    pre_swap_hooks: BTreeMap<usize, Hook>,
    post_swap_hooks: BTreeMap<usize, Hook>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity to its type's homogeneous storage.
    pub fn add<T: Entity + 'static>(&mut self, entity: T) {
        let tid = TypeId::of::<T>();
        if !self.buckets.contains_key(&tid) {
            self.bucket_order.push(tid);
            self.buckets.insert(tid, Box::new(TypedBucket::<T>(Vec::new())));
        }
        let bucket = self.buckets.get_mut(&tid).expect("bucket just inserted");
        bucket
            .as_any_mut()
            .downcast_mut::<TypedBucket<T>>()
            .expect("entity bucket type mismatch")
            .0
            .push(entity);
    }

    /// All entities of the concrete type `T`, if any were added.
    pub fn entities<T: Entity + 'static>(&mut self) -> Option<&mut Vec<T>> {
        self.buckets
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<TypedBucket<T>>()
            .map(|bucket| &mut bucket.0)
    }

    /// Visit every entity polymorphically, in bucket registration order and
    /// insertion order within a bucket.
    pub fn for_each_entity(&mut self, mut visit: impl FnMut(&mut dyn Entity)) {
        for tid in &self.bucket_order {
            let bucket = self.buckets.get_mut(tid).expect("registered bucket");
            for idx in 0..bucket.len() {
                visit(bucket.entity_mut(idx));
            }
        }
    }

    /// Wire all entities to their buffers.
    ///
    /// Phase 1 creates one buffer per entity output and delivers the single
    /// write capability. Phase 2 resolves every declared input id and
    /// delivers read capabilities.
    pub fn try_init_io_buffers(&mut self) -> Result<(), WiringError> {
        let Self {
            buckets,
            bucket_order,
            io_buffers,
            ..
        } = self;

        for tid in bucket_order.iter() {
            let bucket = buckets.get_mut(tid).expect("registered bucket");
            for idx in 0..bucket.len() {
                let entity = bucket.entity_mut(idx);
                let id = entity.output_id();
                if io_buffers.contains_key(&id) {
                    return Err(WiringError::DuplicateOutputId(id));
                }
                let buffer = Arc::new(IoBuffer::new(entity.output_len()));
                entity.set_output_port(buffer.output_port());
                debug!(id, size = buffer.len(), "io buffer created");
                io_buffers.insert(id, buffer);
            }
        }

        for tid in bucket_order.iter() {
            let bucket = buckets.get_mut(tid).expect("registered bucket");
            for idx in 0..bucket.len() {
                let entity = bucket.entity_mut(idx);
                let input_ids = entity.input_ids().to_vec();
                for input in input_ids {
                    let Some(buffer) = io_buffers.get(&input) else {
                        return Err(WiringError::MissingInputId {
                            entity: entity.output_id(),
                            input,
                        });
                    };
                    entity.set_input_port(input, buffer.input_port());
                }
            }
        }

        Ok(())
    }

    /// Like [`try_init_io_buffers`](Self::try_init_io_buffers), but aborts
    /// after diagnostic output on a wiring mistake.
    pub fn init_io_buffers(&mut self) {
        if let Err(err) = self.try_init_io_buffers() {
            error!(%err, "entity wiring failed");
            panic!("entity wiring failed: {err}");
        }
    }

    /// Observation handle for the buffer registered under `id`, for hosts and
    /// hooks.
    pub fn io_buffer(&self, id: PartialId) -> Option<Arc<IoBuffer>> {
        self.io_buffers.get(&id).map(Arc::clone)
    }

    /// One processing step: pre-process hooks in id order, every entity in
    /// iteration order, post-process hooks in id order.
    pub fn process(&mut self) {
        for hook in self.pre_process_hooks.values_mut() {
            hook();
        }
        for tid in &self.bucket_order {
            let bucket = self.buckets.get_mut(tid).expect("registered bucket");
            for idx in 0..bucket.len() {
                bucket.entity_mut(idx).process();
            }
        }
        for hook in self.post_process_hooks.values_mut() {
            hook();
        }
    }

    /// Flip every buffer: pre-swap hooks, swaps (each refreshing the new
    /// read-side statistics once), post-swap hooks.
    pub fn swap_io(&mut self) {
        for hook in self.pre_swap_hooks.values_mut() {
            hook();
        }
        for buffer in self.io_buffers.values() {
            buffer.swap();
        }
        for hook in self.post_swap_hooks.values_mut() {
            hook();
        }
    }

    fn next_hook_id(&mut self) -> usize {
        let id = self.next_hook_id;
        self.next_hook_id += 1;
        id
    }

    pub fn add_pre_process_hook(&mut self, hook: impl FnMut() + 'static) -> usize {
        let id = self.next_hook_id();
        self.pre_process_hooks.insert(id, Box::new(hook));
        id
    }

    pub fn add_post_process_hook(&mut self, hook: impl FnMut() + 'static) -> usize {
        let id = self.next_hook_id();
        self.post_process_hooks.insert(id, Box::new(hook));
        id
    }

    pub fn add_pre_swap_hook(&mut self, hook: impl FnMut() + 'static) -> usize {
        let id = self.next_hook_id();
        self.pre_swap_hooks.insert(id, Box::new(hook));
        id
    }

    pub fn add_post_swap_hook(&mut self, hook: impl FnMut() + 'static) -> usize {
        let id = self.next_hook_id();
        self.post_swap_hooks.insert(id, Box::new(hook));
        id
    }

    pub fn remove_pre_process_hook(&mut self, id: usize) {
        self.pre_process_hooks.remove(&id);
    }

    pub fn remove_post_process_hook(&mut self, id: usize) {
        self.post_process_hooks.remove(&id);
    }

    pub fn remove_pre_swap_hook(&mut self, id: usize) {
        self.pre_swap_hooks.remove(&id);
    }

    pub fn remove_post_swap_hook(&mut self, id: usize) {
        self.post_swap_hooks.remove(&id);
    }
}
