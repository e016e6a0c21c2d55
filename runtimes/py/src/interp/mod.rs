//! A small embedded Python object model.
//!
//! Objects are reference counted: every [`PyRef`] owns one reference and an
//! object is deallocated the moment the last one is dropped. Extension types
//! ([`PyType`]) plug protocol slots into attribute access, item access,
//! `len()` and calls, and get their instance payload back on deallocation.

mod err;
mod heap;
mod types;

#[cfg(test)]
mod interp_test;

use std::any::Any;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::options::PyInterpreterOptions;

pub use err::{ExcType, PyErr, PyResult};
use heap::{Heap, Object};
pub use heap::ObjId;
pub use types::{
    CallFn, DeallocFn, DirFn, GetAttrFn, GetItemFn, LenFn, PyType, SetAttrFn, SetItemFn, TypeId,
};

pub type NativeCallable = Rc<dyn Fn(&PyInterpreter, &[PyRef]) -> PyResult<PyRef>>;

struct InterpInner {
    heap: RefCell<Heap>,
    /// Releases requested while the heap was borrowed.
    pending: RefCell<Vec<ObjId>>,
    types: RefCell<Vec<Rc<PyType>>>,
    globals: RefCell<BTreeMap<String, PyRef>>,
    options: PyInterpreterOptions,
    embedder_data: RefCell<Option<Rc<dyn Any>>>,
}

impl InterpInner {
    fn release(&self, id: ObjId) {
        let dead = match self.heap.try_borrow_mut() {
            Ok(mut heap) => heap.decref(id),
            Err(_) => {
                self.pending.borrow_mut().push(id);
                return;
            }
        };
        if let Some(object) = dead {
            self.dealloc(object);
        }
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        for id in pending {
            self.release(id);
        }
    }

    fn dealloc(&self, object: Object) {
        if let Object::Instance {
            type_id,
            payload: Some(payload),
        } = object
        {
            let hook = self
                .types
                .borrow()
                .get(type_id.0 as usize)
                .and_then(|py_type| py_type.dealloc);
            match hook {
                Some(dealloc) => dealloc(payload),
                None => drop(payload),
            }
            return;
        }
        // Dropping the contents releases the children.
        drop(object);
    }
}

/// An owned reference to an interpreter object.
///
/// Cloning increments the reference count and dropping decrements it. A
/// reference that outlives its interpreter is inert.
pub struct PyRef {
    interp: Weak<InterpInner>,
    id: ObjId,
}

impl PyRef {
    pub fn id(&self) -> ObjId {
        self.id
    }

    /// Python's `is`.
    pub fn is(&self, other: &PyRef) -> bool {
        self.id == other.id && self.interp.ptr_eq(&other.interp)
    }
}

impl Clone for PyRef {
    fn clone(&self) -> Self {
        if let Some(inner) = self.interp.upgrade() {
            inner.heap.borrow_mut().incref(self.id);
        }
        Self {
            interp: self.interp.clone(),
            id: self.id,
        }
    }
}

impl Drop for PyRef {
    fn drop(&mut self) {
        if let Some(inner) = self.interp.upgrade() {
            inner.release(self.id);
        }
    }
}

impl std::fmt::Debug for PyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PyRef({}:{})", self.id.index, self.id.generation)
    }
}

/// A reference that does not keep its object alive.
#[derive(Clone)]
pub struct PyWeak {
    interp: Weak<InterpInner>,
    id: ObjId,
}

impl PyWeak {
    pub fn upgrade(&self) -> Option<PyRef> {
        let inner = self.interp.upgrade()?;
        if !inner.heap.borrow_mut().incref(self.id) {
            return None;
        }
        Some(PyRef {
            interp: self.interp.clone(),
            id: self.id,
        })
    }

    pub fn is_alive(&self) -> bool {
        self.interp
            .upgrade()
            .is_some_and(|inner| inner.heap.borrow().contains(self.id))
    }
}

/// A reference to an interpreter that does not keep it alive.
#[derive(Clone)]
pub struct WeakInterpreter(Weak<InterpInner>);

impl WeakInterpreter {
    pub fn upgrade(&self) -> Option<PyInterpreter> {
        self.0.upgrade().map(|inner| PyInterpreter { inner })
    }
}

/// Shape of an object, without its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PyKind {
    None,
    Bool,
    Int,
    Float,
    Str,
    List,
    Dict,
    Function,
    Instance(TypeId),
}

#[derive(Clone)]
pub struct PyInterpreter {
    inner: Rc<InterpInner>,
}

impl Default for PyInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl PyInterpreter {
    pub fn new() -> Self {
        Self::with_options(PyInterpreterOptions::default())
    }

    pub fn with_options(options: PyInterpreterOptions) -> Self {
        tracing::debug!("Created Python interpreter");
        Self {
            inner: Rc::new(InterpInner {
                heap: RefCell::new(Heap::default()),
                pending: RefCell::new(Vec::new()),
                types: RefCell::new(Vec::new()),
                globals: RefCell::new(BTreeMap::new()),
                options,
                embedder_data: RefCell::new(None),
            }),
        }
    }

    pub fn options(&self) -> &PyInterpreterOptions {
        &self.inner.options
    }

    pub fn ptr_eq(&self, other: &PyInterpreter) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn weak_interpreter(&self) -> WeakInterpreter {
        WeakInterpreter(Rc::downgrade(&self.inner))
    }

    pub fn set_embedder_data(&self, data: Rc<dyn Any>) {
        let previous = self.inner.embedder_data.borrow_mut().replace(data);
        drop(previous);
    }

    pub fn embedder_data<T: 'static>(&self) -> Option<Rc<T>> {
        let data = self.inner.embedder_data.borrow().clone()?;
        data.downcast::<T>().ok()
    }

    /// Resolves `weak` if it belongs to this interpreter.
    pub fn upgrade(&self, weak: &PyWeak) -> Option<PyRef> {
        if !Weak::ptr_eq(&weak.interp, &Rc::downgrade(&self.inner)) {
            return None;
        }
        weak.upgrade()
    }

    pub fn downgrade(&self, obj: &PyRef) -> PyWeak {
        PyWeak {
            interp: obj.interp.clone(),
            id: obj.id,
        }
    }

    pub fn refcount(&self, obj: &PyRef) -> usize {
        self.inner.heap.borrow().refcount(obj.id)
    }

    pub fn live_objects(&self) -> usize {
        self.inner.heap.borrow().live()
    }

    // -- Allocation --------------------------------------------------------

    fn alloc(&self, object: Object) -> PyRef {
        let id = self.inner.heap.borrow_mut().allocate(object);
        PyRef {
            interp: Rc::downgrade(&self.inner),
            id,
        }
    }

    pub fn none(&self) -> PyRef {
        self.alloc(Object::None)
    }

    pub fn bool(&self, b: bool) -> PyRef {
        self.alloc(Object::Bool(b))
    }

    pub fn int(&self, i: i64) -> PyRef {
        self.alloc(Object::Int(i))
    }

    pub fn float(&self, f: f64) -> PyRef {
        self.alloc(Object::Float(f))
    }

    pub fn str(&self, s: &str) -> PyRef {
        self.alloc(Object::Str(Rc::from(s)))
    }

    pub fn list(&self, items: Vec<PyRef>) -> PyRef {
        self.alloc(Object::List(items))
    }

    pub fn dict(&self, entries: impl IntoIterator<Item = (String, PyRef)>) -> PyRef {
        self.alloc(Object::Dict(entries.into_iter().collect()))
    }

    pub fn function(
        &self,
        name: &str,
        callback: impl Fn(&PyInterpreter, &[PyRef]) -> PyResult<PyRef> + 'static,
    ) -> PyRef {
        self.alloc(Object::Function {
            name: Rc::from(name),
            callback: Rc::new(callback),
        })
    }

    pub fn register_type(&self, py_type: PyType) -> TypeId {
        let mut types = self.inner.types.borrow_mut();
        types.push(Rc::new(py_type));
        TypeId((types.len() - 1) as u32)
    }

    fn py_type(&self, type_id: TypeId) -> Option<Rc<PyType>> {
        self.inner.types.borrow().get(type_id.0 as usize).cloned()
    }

    pub fn new_instance(&self, type_id: TypeId, payload: Box<dyn Any>) -> PyRef {
        self.alloc(Object::Instance {
            type_id,
            payload: Some(payload),
        })
    }

    // -- Inspection --------------------------------------------------------

    fn with_object<R>(&self, obj: &PyRef, f: impl FnOnce(&Object) -> R) -> Option<R> {
        let heap = self.inner.heap.borrow();
        heap.get(obj.id).map(f)
    }

    pub fn kind(&self, obj: &PyRef) -> PyKind {
        self.with_object(obj, |object| match object {
            Object::None => PyKind::None,
            Object::Bool(_) => PyKind::Bool,
            Object::Int(_) => PyKind::Int,
            Object::Float(_) => PyKind::Float,
            Object::Str(_) => PyKind::Str,
            Object::List(_) => PyKind::List,
            Object::Dict(_) => PyKind::Dict,
            Object::Function { .. } => PyKind::Function,
            Object::Instance { type_id, .. } => PyKind::Instance(*type_id),
        })
        .unwrap_or(PyKind::None)
    }

    /// Name of the object's type, as `type(obj).__name__` would report it.
    pub fn type_name(&self, obj: &PyRef) -> String {
        match self.kind(obj) {
            PyKind::None => "NoneType".to_string(),
            PyKind::Bool => "bool".to_string(),
            PyKind::Int => "int".to_string(),
            PyKind::Float => "float".to_string(),
            PyKind::Str => "str".to_string(),
            PyKind::List => "list".to_string(),
            PyKind::Dict => "dict".to_string(),
            PyKind::Function => "function".to_string(),
            PyKind::Instance(type_id) => self
                .py_type(type_id)
                .map_or_else(|| "object".to_string(), |py_type| py_type.name.clone()),
        }
    }

    pub fn is_none(&self, obj: &PyRef) -> bool {
        self.kind(obj) == PyKind::None
    }

    pub fn as_bool(&self, obj: &PyRef) -> Option<bool> {
        self.with_object(obj, |object| match object {
            Object::Bool(b) => Some(*b),
            _ => None,
        })
        .flatten()
    }

    pub fn as_int(&self, obj: &PyRef) -> Option<i64> {
        self.with_object(obj, |object| match object {
            Object::Int(i) => Some(*i),
            _ => None,
        })
        .flatten()
    }

    pub fn as_float(&self, obj: &PyRef) -> Option<f64> {
        self.with_object(obj, |object| match object {
            Object::Float(f) => Some(*f),
            _ => None,
        })
        .flatten()
    }

    pub fn as_str(&self, obj: &PyRef) -> Option<Rc<str>> {
        self.with_object(obj, |object| match object {
            Object::Str(s) => Some(s.clone()),
            _ => None,
        })
        .flatten()
    }

    pub fn list_items(&self, obj: &PyRef) -> Option<Vec<PyRef>> {
        // Cloning increfs, so the heap borrow must be released first.
        let ids = self
            .with_object(obj, |object| match object {
                Object::List(items) => Some(items.iter().map(PyRef::id).collect::<Vec<_>>()),
                _ => None,
            })
            .flatten()?;
        Some(ids.into_iter().map(|id| self.new_ref(id)).collect())
    }

    pub fn dict_items(&self, obj: &PyRef) -> Option<Vec<(String, PyRef)>> {
        let entries = self
            .with_object(obj, |object| match object {
                Object::Dict(entries) => Some(
                    entries
                        .iter()
                        .map(|(key, value)| (key.clone(), value.id()))
                        .collect::<Vec<_>>(),
                ),
                _ => None,
            })
            .flatten()?;
        Some(
            entries
                .into_iter()
                .map(|(key, id)| (key, self.new_ref(id)))
                .collect(),
        )
    }

    /// A new reference to a live object.
    fn new_ref(&self, id: ObjId) -> PyRef {
        self.inner.heap.borrow_mut().incref(id);
        PyRef {
            interp: Rc::downgrade(&self.inner),
            id,
        }
    }

    /// A copy of the instance payload if it holds a `T`.
    pub fn payload<T: Clone + 'static>(&self, obj: &PyRef) -> Option<T> {
        self.with_object(obj, |object| match object {
            Object::Instance {
                payload: Some(payload),
                ..
            } => payload.downcast_ref::<T>().cloned(),
            _ => None,
        })
        .flatten()
    }

    pub fn is_callable(&self, obj: &PyRef) -> bool {
        match self.kind(obj) {
            PyKind::Function => true,
            PyKind::Instance(type_id) => self
                .py_type(type_id)
                .is_some_and(|py_type| py_type.call.is_some()),
            _ => false,
        }
    }

    pub fn function_name(&self, obj: &PyRef) -> Option<String> {
        self.with_object(obj, |object| match object {
            Object::Function { name, .. } => Some(name.to_string()),
            _ => None,
        })
        .flatten()
    }

    // -- Globals -----------------------------------------------------------

    pub fn set_global(&self, name: &str, value: PyRef) {
        let previous = self
            .inner
            .globals
            .borrow_mut()
            .insert(name.to_string(), value);
        drop(previous);
    }

    pub fn get_global(&self, name: &str) -> PyResult<PyRef> {
        let value = self.inner.globals.borrow().get(name).cloned();
        value.ok_or_else(|| {
            PyErr::new(ExcType::RuntimeError, format!("name '{}' is not defined", name))
        })
    }

    pub fn del_global(&self, name: &str) -> bool {
        let previous = self.inner.globals.borrow_mut().remove(name);
        previous.is_some()
    }

    // -- Protocols ---------------------------------------------------------

    fn instance_type(&self, obj: &PyRef) -> Option<Rc<PyType>> {
        match self.kind(obj) {
            PyKind::Instance(type_id) => self.py_type(type_id),
            _ => None,
        }
    }

    pub fn getattr(&self, obj: &PyRef, name: &str) -> PyResult<PyRef> {
        if let Some(getattr) = self.instance_type(obj).and_then(|t| t.getattr) {
            return getattr(self, obj, name);
        }
        match (self.kind(obj), name) {
            (PyKind::Function, "__name__") => {
                let function_name = self.function_name(obj).unwrap_or_default();
                return Ok(self.str(&function_name));
            }
            (PyKind::List, "append") => {
                let list = obj.clone();
                return Ok(self.function("append", move |interp, args| {
                    let [item] = args else {
                        return Err(PyErr::type_error(format!(
                            "append() takes exactly one argument ({} given)",
                            args.len()
                        )));
                    };
                    interp.append(&list, item.clone())?;
                    Ok(interp.none())
                }));
            }
            _ => {}
        }
        Err(PyErr::attribute_error(format!(
            "'{}' object has no attribute '{}'",
            self.type_name(obj),
            name
        )))
    }

    pub fn setattr(&self, obj: &PyRef, name: &str, value: PyRef) -> PyResult<()> {
        if let Some(setattr) = self.instance_type(obj).and_then(|t| t.setattr) {
            return setattr(self, obj, name, value);
        }
        Err(PyErr::attribute_error(format!(
            "'{}' object has no attribute '{}'",
            self.type_name(obj),
            name
        )))
    }

    pub fn dir(&self, obj: &PyRef) -> PyResult<Vec<String>> {
        if let Some(dir) = self.instance_type(obj).and_then(|t| t.dir) {
            return dir(self, obj);
        }
        Ok(match self.kind(obj) {
            PyKind::List => vec!["append".to_string()],
            PyKind::Function => vec!["__name__".to_string()],
            _ => Vec::new(),
        })
    }

    pub fn len(&self, obj: &PyRef) -> PyResult<usize> {
        if let Some(len) = self.instance_type(obj).and_then(|t| t.len) {
            return len(self, obj);
        }
        let len = self
            .with_object(obj, |object| match object {
                Object::Str(s) => Some(s.chars().count()),
                Object::List(items) => Some(items.len()),
                Object::Dict(entries) => Some(entries.len()),
                _ => None,
            })
            .flatten();
        len.ok_or_else(|| {
            PyErr::type_error(format!(
                "object of type '{}' has no len()",
                self.type_name(obj)
            ))
        })
    }

    pub fn getitem(&self, obj: &PyRef, key: &PyRef) -> PyResult<PyRef> {
        if let Some(getitem) = self.instance_type(obj).and_then(|t| t.getitem) {
            return getitem(self, obj, key);
        }
        match self.kind(obj) {
            PyKind::List => {
                let index = self.list_index(obj, key)?;
                let id = self
                    .with_object(obj, |object| match object {
                        Object::List(items) => items.get(index).map(PyRef::id),
                        _ => None,
                    })
                    .flatten();
                id.map(|id| self.new_ref(id))
                    .ok_or_else(|| PyErr::index_error("list index out of range"))
            }
            PyKind::Dict => {
                let key = self.dict_key(key)?;
                let id = self
                    .with_object(obj, |object| match object {
                        Object::Dict(entries) => entries.get(key.as_ref()).map(PyRef::id),
                        _ => None,
                    })
                    .flatten();
                id.map(|id| self.new_ref(id))
                    .ok_or_else(|| PyErr::key_error(&key))
            }
            _ => Err(PyErr::type_error(format!(
                "'{}' object is not subscriptable",
                self.type_name(obj)
            ))),
        }
    }

    pub fn setitem(&self, obj: &PyRef, key: &PyRef, value: PyRef) -> PyResult<()> {
        if let Some(setitem) = self.instance_type(obj).and_then(|t| t.setitem) {
            return setitem(self, obj, key, value);
        }
        let previous = match self.kind(obj) {
            PyKind::List => {
                let index = self.list_index(obj, key)?;
                let mut heap = self.inner.heap.borrow_mut();
                match heap.get_mut(obj.id) {
                    Some(Object::List(items)) => std::mem::replace(&mut items[index], value),
                    _ => return Ok(()),
                }
            }
            PyKind::Dict => {
                let key = self.dict_key(key)?;
                let mut heap = self.inner.heap.borrow_mut();
                match heap.get_mut(obj.id) {
                    Some(Object::Dict(entries)) => match entries.insert(key.to_string(), value) {
                        Some(previous) => previous,
                        None => return Ok(()),
                    },
                    _ => return Ok(()),
                }
            }
            _ => {
                return Err(PyErr::type_error(format!(
                    "'{}' object does not support item assignment",
                    self.type_name(obj)
                )));
            }
        };
        drop(previous);
        Ok(())
    }

    /// `list.append(item)`.
    pub fn append(&self, list: &PyRef, item: PyRef) -> PyResult<()> {
        if self.kind(list) != PyKind::List {
            return Err(PyErr::type_error(format!(
                "'{}' object has no attribute 'append'",
                self.type_name(list)
            )));
        }
        if let Some(Object::List(items)) = self.inner.heap.borrow_mut().get_mut(list.id) {
            items.push(item);
        }
        Ok(())
    }

    fn list_index(&self, list: &PyRef, key: &PyRef) -> PyResult<usize> {
        let Some(index) = self.as_int(key) else {
            return Err(PyErr::type_error(format!(
                "list indices must be integers, not {}",
                self.type_name(key)
            )));
        };
        let len = self.len(list)?;
        normalize_index(index, len).ok_or_else(|| PyErr::index_error("list index out of range"))
    }

    fn dict_key(&self, key: &PyRef) -> PyResult<Rc<str>> {
        self.as_str(key).ok_or_else(|| {
            PyErr::type_error(format!(
                "dict keys must be str, not {}",
                self.type_name(key)
            ))
        })
    }

    pub fn call(&self, callee: &PyRef, args: &[PyRef]) -> PyResult<PyRef> {
        if let Some(call) = self.instance_type(callee).and_then(|t| t.call) {
            return call(self, callee, args);
        }
        let callback = self
            .with_object(callee, |object| match object {
                Object::Function { callback, .. } => Some(callback.clone()),
                _ => None,
            })
            .flatten();
        match callback {
            Some(callback) => callback(self, args),
            None => Err(PyErr::type_error(format!(
                "'{}' object is not callable",
                self.type_name(callee)
            ))),
        }
    }

    /// `obj.name(*args)`.
    pub fn call_method(&self, obj: &PyRef, name: &str, args: &[PyRef]) -> PyResult<PyRef> {
        let method = self.getattr(obj, name)?;
        self.call(&method, args)
    }
}

/// Resolves a possibly negative index against `len`.
pub fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { index + len } else { index };
    (0..len).contains(&index).then_some(index as usize)
}
