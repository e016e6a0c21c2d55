//! Object heap with a stop-the-world mark-and-sweep collector.
//!
//! Slots are reused after a sweep. Every reuse bumps the slot generation, so
//! a stale [`Handle`] never resolves to the object that replaced it.

use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{CallInfo, Handle, JsContext, JsResult, JsValue, TemplateId};

pub type NativeCallback = Rc<dyn Fn(&JsContext, &CallInfo<'_>) -> JsResult<JsValue>>;

/// Runs once when a weak object is found unreachable.
pub type WeakCallback = Box<dyn FnOnce(&mut WeakCallbackInfo)>;

/// Collector statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Number of completed collections.
    pub collections: usize,
    /// Total objects reclaimed across all collections.
    pub objects_freed: usize,
    /// Objects alive after the last collection.
    pub live_after_last: usize,
}

/// What a weak callback gets to see of the dying object.
pub struct WeakCallbackInfo {
    handle: Handle,
    internal_fields: Vec<Option<Box<dyn Any>>>,
}

impl WeakCallbackInfo {
    /// The handle the object had. It no longer resolves.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Moves an internal field out of the dying object.
    pub fn take_internal_field<T: 'static>(&mut self, index: usize) -> Option<T> {
        let field = self.internal_fields.get_mut(index)?.take()?;
        match field.downcast::<T>() {
            Ok(value) => Some(*value),
            Err(field) => {
                self.internal_fields[index] = Some(field);
                None
            }
        }
    }
}

pub(crate) enum ObjectKind {
    Ordinary,
    Array(Vec<JsValue>),
    Function {
        name: Rc<str>,
        callback: NativeCallback,
    },
}

pub(crate) struct HeapObject {
    pub(crate) kind: ObjectKind,
    pub(crate) properties: BTreeMap<String, JsValue>,
    pub(crate) template: Option<TemplateId>,
    pub(crate) internal_fields: Vec<Option<Box<dyn Any>>>,
    pub(crate) weak_callback: Option<WeakCallback>,
    marked: bool,
}

impl HeapObject {
    pub(crate) fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            properties: BTreeMap::new(),
            template: None,
            internal_fields: Vec::new(),
            weak_callback: None,
            marked: false,
        }
    }

    pub(crate) fn with_template(template: TemplateId, internal_field_count: usize) -> Self {
        let mut object = Self::new(ObjectKind::Ordinary);
        object.template = Some(template);
        object.internal_fields = (0..internal_field_count).map(|_| None).collect();
        object
    }

    fn children(&self) -> impl Iterator<Item = Handle> + '_ {
        let elements = match &self.kind {
            ObjectKind::Array(items) => items.as_slice(),
            _ => &[],
        };
        elements
            .iter()
            .chain(self.properties.values())
            .filter_map(JsValue::as_object)
    }

    /// Moves the weak callback and the internal fields out for finalization.
    pub(crate) fn into_finalizer(self, handle: Handle) -> Option<(WeakCallback, WeakCallbackInfo)> {
        let callback = self.weak_callback?;
        let info = WeakCallbackInfo {
            handle,
            internal_fields: self.internal_fields,
        };
        Some((callback, info))
    }
}

struct Slot {
    generation: u32,
    object: Option<HeapObject>,
}

#[derive(Default)]
pub(crate) struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    allocated_since_collect: usize,
    stats: GcStats,
}

impl Heap {
    pub(crate) fn allocate(&mut self, object: HeapObject) -> Handle {
        self.live += 1;
        self.allocated_since_collect += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            return Handle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        Handle {
            index,
            generation: 0,
        }
    }

    pub(crate) fn get(&self, handle: Handle) -> Option<&HeapObject> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.object.as_ref()
    }

    pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut HeapObject> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.object.as_mut()
    }

    pub(crate) fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    pub(crate) fn live(&self) -> usize {
        self.live
    }

    pub(crate) fn allocated_since_collect(&self) -> usize {
        self.allocated_since_collect
    }

    pub(crate) fn stats(&self) -> GcStats {
        self.stats
    }

    /// Marks everything reachable from `roots` and unlinks the rest.
    ///
    /// The dead objects are handed back instead of dropped so that their
    /// finalizers and native payloads run after the heap is released.
    pub(crate) fn collect(
        &mut self,
        roots: impl IntoIterator<Item = Handle>,
    ) -> Vec<(Handle, HeapObject)> {
        self.mark(roots);
        let dead = self.sweep();
        self.allocated_since_collect = 0;
        self.stats.collections += 1;
        self.stats.objects_freed += dead.len();
        self.stats.live_after_last = self.live;
        dead
    }

    fn mark(&mut self, roots: impl IntoIterator<Item = Handle>) {
        let mut worklist: Vec<Handle> = roots.into_iter().collect();
        while let Some(handle) = worklist.pop() {
            let Some(object) = self.get_mut(handle) else {
                continue;
            };
            if object.marked {
                continue;
            }
            object.marked = true;
            worklist.extend(object.children());
        }
    }

    fn sweep(&mut self) -> Vec<(Handle, HeapObject)> {
        let mut dead = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(object) = slot.object.as_mut() else {
                continue;
            };
            if object.marked {
                object.marked = false;
                continue;
            }
            let handle = Handle {
                index: index as u32,
                generation: slot.generation,
            };
            if let Some(object) = slot.object.take() {
                dead.push((handle, object));
            }
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(index as u32);
        }
        self.live -= dead.len();
        dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordinary() -> HeapObject {
        HeapObject::new(ObjectKind::Ordinary)
    }

    #[test]
    fn test_unreachable_objects_are_swept() {
        let mut heap = Heap::default();
        let root = heap.allocate(ordinary());
        let child = heap.allocate(ordinary());
        let orphan = heap.allocate(ordinary());
        heap.get_mut(root)
            .unwrap()
            .properties
            .insert("child".into(), JsValue::Object(child));

        let dead = heap.collect([root]);
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].0, orphan);
        assert!(heap.contains(root));
        assert!(heap.contains(child));
        assert!(!heap.contains(orphan));
        assert_eq!(heap.live(), 2);
    }

    #[test]
    fn test_reused_slot_rejects_stale_handle() {
        let mut heap = Heap::default();
        let stale = heap.allocate(ordinary());
        heap.collect([]);
        let fresh = heap.allocate(ordinary());
        assert_eq!(fresh.index, stale.index);
        assert_ne!(fresh.generation, stale.generation);
        assert!(heap.get(stale).is_none());
        assert!(heap.get(fresh).is_some());
    }

    #[test]
    fn test_cycles_are_collected() {
        let mut heap = Heap::default();
        let a = heap.allocate(ordinary());
        let b = heap.allocate(HeapObject::new(ObjectKind::Array(vec![JsValue::Object(a)])));
        heap.get_mut(a)
            .unwrap()
            .properties
            .insert("b".into(), JsValue::Object(b));
        assert_eq!(heap.collect([a]).len(), 0);
        assert_eq!(heap.collect([]).len(), 2);

        let stats = heap.stats();
        assert_eq!(stats.collections, 2);
        assert_eq!(stats.objects_freed, 2);
        assert_eq!(stats.live_after_last, 0);
    }
}
