//! Reference-counted object storage.
//!
//! A slot is freed the moment its count drops to zero. Freed slots are
//! reused with a bumped generation so stale ids never resolve.

use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{NativeCallable, PyRef, TypeId};

pub(crate) enum Object {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Vec<PyRef>),
    Dict(BTreeMap<String, PyRef>),
    Function {
        name: Rc<str>,
        callback: NativeCallable,
    },
    Instance {
        type_id: TypeId,
        payload: Option<Box<dyn Any>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

struct Slot {
    generation: u32,
    refcount: usize,
    object: Option<Object>,
}

#[derive(Default)]
pub(crate) struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Heap {
    /// Stores `object` with a reference count of one.
    pub(crate) fn allocate(&mut self, object: Object) -> ObjId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.refcount = 1;
            slot.object = Some(object);
            return ObjId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            refcount: 1,
            object: Some(object),
        });
        ObjId {
            index,
            generation: 0,
        }
    }

    fn slot(&self, id: ObjId) -> Option<&Slot> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation && slot.object.is_some())
    }

    fn slot_mut(&mut self, id: ObjId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation && slot.object.is_some())
    }

    pub(crate) fn get(&self, id: ObjId) -> Option<&Object> {
        self.slot(id)?.object.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: ObjId) -> Option<&mut Object> {
        self.slot_mut(id)?.object.as_mut()
    }

    pub(crate) fn contains(&self, id: ObjId) -> bool {
        self.slot(id).is_some()
    }

    pub(crate) fn refcount(&self, id: ObjId) -> usize {
        self.slot(id).map_or(0, |slot| slot.refcount)
    }

    pub(crate) fn incref(&mut self, id: ObjId) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.refcount += 1;
                true
            }
            None => false,
        }
    }

    /// Drops one reference. Returns the object once the last one is gone;
    /// the caller deallocates it outside of the heap borrow.
    pub(crate) fn decref(&mut self, id: ObjId) -> Option<Object> {
        let slot = self.slot_mut(id)?;
        slot.refcount -= 1;
        if slot.refcount > 0 {
            return None;
        }
        let object = slot.object.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        object
    }

    pub(crate) fn live(&self) -> usize {
        self.live
    }
}
