//! Headless render sink.
//!
//! [`MemorySink`] keeps every visual in a table instead of drawing it. It is
//! used by the headless runner and by tests, which inspect the recorded
//! updates and counters to check what a burst did.
//!
//! Containers exist implicitly: the first perspective or allocation for a
//! [`ContainerId`] creates it. [`MemorySink::detach_container`] simulates the
//! host removing a container while bursts still draw into it.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::SinkError;
use crate::resources::rendersink::{
    ContainerId, FettiStyle, FettiTransform, RenderSink, VisualHandle,
};

/// Current state of one visual.
#[derive(Debug, Clone)]
pub struct MemoryVisual {
    pub container: ContainerId,
    pub style: FettiStyle,
    pub transform: Option<FettiTransform>,
    pub opacity: f32,
    pub visible: bool,
}

/// One accepted `update` call.
#[derive(Debug, Clone, Copy)]
pub struct UpdateRecord {
    pub handle: VisualHandle,
    pub transform: FettiTransform,
    pub opacity: f32,
    pub visible: bool,
}

#[derive(Debug, Default)]
pub struct MemorySink {
    next_handle: u64,
    visuals: FxHashMap<VisualHandle, MemoryVisual>,
    perspectives: FxHashMap<ContainerId, String>,
    detached: FxHashSet<ContainerId>,
    /// Visuals that disappeared with a detached container.
    orphaned: FxHashMap<VisualHandle, ContainerId>,
    updates: Vec<UpdateRecord>,
    /// Successful `allocate` calls.
    pub allocations: usize,
    /// Successful `release` calls.
    pub releases: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a container and every visual in it, as a host tearing down a node would.
    pub fn detach_container(&mut self, container: ContainerId) {
        self.detached.insert(container);
        let orphaned = &mut self.orphaned;
        self.visuals.retain(|&handle, v| {
            if v.container == container {
                orphaned.insert(handle, container);
                false
            } else {
                true
            }
        });
    }

    pub fn is_detached(&self, container: ContainerId) -> bool {
        self.detached.contains(&container)
    }

    pub fn visual(&self, handle: VisualHandle) -> Option<&MemoryVisual> {
        self.visuals.get(&handle)
    }

    /// Number of live visuals in `container`.
    pub fn live_in(&self, container: ContainerId) -> usize {
        self.visuals
            .values()
            .filter(|v| v.container == container)
            .count()
    }

    pub fn live(&self) -> usize {
        self.visuals.len()
    }

    pub fn perspective(&self, container: ContainerId) -> Option<&str> {
        self.perspectives.get(&container).map(String::as_str)
    }

    /// Every accepted update, in call order.
    pub fn updates(&self) -> &[UpdateRecord] {
        &self.updates
    }

    /// Accepted updates for one visual, in call order.
    pub fn updates_for(&self, handle: VisualHandle) -> impl Iterator<Item = &UpdateRecord> {
        self.updates.iter().filter(move |u| u.handle == handle)
    }

    pub fn clear_updates(&mut self) {
        self.updates.clear();
    }

    fn check_attached(&self, container: ContainerId) -> Result<(), SinkError> {
        if self.detached.contains(&container) {
            Err(SinkError::ContainerDetached(container))
        } else {
            Ok(())
        }
    }
}

impl RenderSink for MemorySink {
    fn set_perspective(
        &mut self,
        container: ContainerId,
        perspective: &str,
    ) -> Result<(), SinkError> {
        self.check_attached(container)?;
        self.perspectives.insert(container, perspective.to_string());
        Ok(())
    }

    fn allocate(
        &mut self,
        container: ContainerId,
        style: &FettiStyle,
    ) -> Result<VisualHandle, SinkError> {
        self.check_attached(container)?;
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        self.visuals.insert(
            handle,
            MemoryVisual {
                container,
                style: style.clone(),
                transform: None,
                opacity: 1.0,
                visible: false,
            },
        );
        self.allocations += 1;
        Ok(handle)
    }

    fn update(
        &mut self,
        handle: VisualHandle,
        transform: &FettiTransform,
        opacity: f32,
        visible: bool,
    ) -> Result<(), SinkError> {
        if let Some(&container) = self.orphaned.get(&handle) {
            return Err(SinkError::ContainerDetached(container));
        }
        let Some(visual) = self.visuals.get_mut(&handle) else {
            return Err(SinkError::UnknownHandle(handle));
        };
        visual.transform = Some(*transform);
        visual.opacity = opacity;
        visual.visible = visible;
        self.updates.push(UpdateRecord {
            handle,
            transform: *transform,
            opacity,
            visible,
        });
        Ok(())
    }

    fn contains(&self, container: ContainerId, handle: VisualHandle) -> bool {
        self.visuals
            .get(&handle)
            .is_some_and(|v| v.container == container)
    }

    fn release(&mut self, container: ContainerId, handle: VisualHandle) -> Result<(), SinkError> {
        if !self.contains(container, handle) {
            return Err(SinkError::UnknownHandle(handle));
        }
        self.visuals.remove(&handle);
        self.releases += 1;
        Ok(())
    }
}
