//! A small embedded JavaScript object model.
//!
//! It provides what a host binding layer needs from a tracing engine:
//! handles to garbage-collected objects, handle scopes as roots, object
//! templates with interceptors and internal fields, native functions and
//! weak callbacks that fire when the collector reclaims an object.
//!
//! Handles are only valid while something roots them. Every handle returned by
//! this API is rooted in the innermost open [`JsContext::scope`]; the base
//! frame lives as long as the context.

mod heap;
mod template;

#[cfg(test)]
mod engine_test;

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::options::JsContextOptions;

use heap::{Heap, HeapObject, ObjectKind};
pub use heap::{GcStats, NativeCallback, WeakCallback, WeakCallbackInfo};
pub use template::{
    CallHandler, Enumerator, IndexedGetter, IndexedSetter, NamedGetter, NamedSetter,
    ObjectTemplate, TemplateId,
};

/// Reference to a heap object. Stale handles resolve to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum JsValue {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    BigInt(i64),
    String(Rc<str>),
    Object(Handle),
}

static_assertions::assert_not_impl_any!(JsValue: Send, Sync);

impl JsValue {
    pub fn string(s: &str) -> Self {
        JsValue::String(Rc::from(s))
    }

    pub fn as_object(&self) -> Option<Handle> {
        match self {
            JsValue::Object(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            JsValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    /// The `typeof` of the value; objects are not told apart from functions.
    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object",
            JsValue::Bool(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::BigInt(_) => "bigint",
            JsValue::String(_) => "string",
            JsValue::Object(_) => "object",
        }
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Bool(b) => write!(f, "{}", b),
            JsValue::Number(n) => write!(f, "{}", n),
            JsValue::BigInt(n) => write!(f, "{}n", n),
            JsValue::String(s) => write!(f, "{}", s),
            JsValue::Object(_) => write!(f, "[object Object]"),
        }
    }
}

/// A thrown value travels as the error of a [`JsResult`].
pub type JsResult<T> = Result<T, JsValue>;

/// Arguments of a native function or call handler invocation.
pub struct CallInfo<'a> {
    pub callee: Handle,
    pub this: JsValue,
    pub args: &'a [JsValue],
}

impl CallInfo<'_> {
    pub fn arg(&self, index: usize) -> JsValue {
        self.args.get(index).cloned().unwrap_or_default()
    }
}

struct ContextInner {
    heap: RefCell<Heap>,
    templates: RefCell<Vec<Rc<ObjectTemplate>>>,
    scopes: RefCell<Vec<Vec<Handle>>>,
    global: Handle,
    options: JsContextOptions,
    embedder_data: RefCell<Option<Rc<dyn Any>>>,
}

/// An isolated heap plus its global object.
///
/// Cloning yields another reference to the same context. The heap is never
/// borrowed while user callbacks run, so callbacks may re-enter freely.
#[derive(Clone)]
pub struct JsContext {
    inner: Rc<ContextInner>,
}

/// Non-owning reference to a [`JsContext`].
#[derive(Clone)]
pub struct WeakContext(Weak<ContextInner>);

impl WeakContext {
    pub fn upgrade(&self) -> Option<JsContext> {
        self.0.upgrade().map(|inner| JsContext { inner })
    }

    pub fn ptr_eq(&self, other: &WeakContext) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl Default for JsContext {
    fn default() -> Self {
        Self::new()
    }
}

impl JsContext {
    pub fn new() -> Self {
        Self::with_options(JsContextOptions::default())
    }

    pub fn with_options(options: JsContextOptions) -> Self {
        let mut heap = Heap::default();
        let global = heap.allocate(HeapObject::new(ObjectKind::Ordinary));
        tracing::debug!(gc_threshold = options.gc_threshold, "Created JS context");
        Self {
            inner: Rc::new(ContextInner {
                heap: RefCell::new(heap),
                templates: RefCell::new(Vec::new()),
                scopes: RefCell::new(vec![Vec::new()]),
                global,
                options,
                embedder_data: RefCell::new(None),
            }),
        }
    }

    pub fn options(&self) -> &JsContextOptions {
        &self.inner.options
    }

    pub fn downgrade(&self) -> WeakContext {
        WeakContext(Rc::downgrade(&self.inner))
    }

    pub fn ptr_eq(&self, other: &JsContext) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -- Embedder data -----------------------------------------------------

    pub fn set_embedder_data(&self, data: Rc<dyn Any>) {
        let previous = self.inner.embedder_data.borrow_mut().replace(data);
        drop(previous);
    }

    pub fn embedder_data<T: 'static>(&self) -> Option<Rc<T>> {
        let data = self.inner.embedder_data.borrow().clone()?;
        data.downcast::<T>().ok()
    }

    // -- Handle scopes -----------------------------------------------------

    /// Runs `f` inside a new handle scope. Handles created inside are
    /// unrooted when it returns; use [`JsContext::root`] to keep one.
    pub fn scope<R>(&self, f: impl FnOnce(&JsContext) -> R) -> R {
        self.inner.scopes.borrow_mut().push(Vec::new());
        let result = f(self);
        self.inner.scopes.borrow_mut().pop();
        result
    }

    /// Roots `value` in the innermost open scope.
    pub fn root(&self, value: &JsValue) {
        if let JsValue::Object(handle) = value {
            self.root_handle(*handle);
        }
    }

    fn root_handle(&self, handle: Handle) {
        if let Some(frame) = self.inner.scopes.borrow_mut().last_mut() {
            frame.push(handle);
        }
    }

    fn local(&self, value: JsValue) -> JsValue {
        self.root(&value);
        value
    }

    // -- Allocation --------------------------------------------------------

    fn allocate(&self, object: HeapObject) -> Handle {
        let threshold = self.inner.options.gc_threshold;
        if threshold > 0 && self.inner.heap.borrow().allocated_since_collect() >= threshold {
            self.collect_garbage();
        }
        let handle = self.inner.heap.borrow_mut().allocate(object);
        self.root_handle(handle);
        handle
    }

    pub fn global(&self) -> Handle {
        self.inner.global
    }

    pub fn new_object(&self) -> Handle {
        self.allocate(HeapObject::new(ObjectKind::Ordinary))
    }

    /// Allocates an array. `items` must be rooted by the caller.
    pub fn new_array(&self, items: Vec<JsValue>) -> Handle {
        self.allocate(HeapObject::new(ObjectKind::Array(items)))
    }

    pub fn new_function(
        &self,
        name: &str,
        callback: impl Fn(&JsContext, &CallInfo<'_>) -> JsResult<JsValue> + 'static,
    ) -> Handle {
        self.allocate(HeapObject::new(ObjectKind::Function {
            name: Rc::from(name),
            callback: Rc::new(callback),
        }))
    }

    /// Allocates an error object with `name` and `message` properties.
    pub fn new_error(&self, name: &str, message: &str) -> Handle {
        let mut object = HeapObject::new(ObjectKind::Ordinary);
        object
            .properties
            .insert("name".to_string(), JsValue::string(name));
        object
            .properties
            .insert("message".to_string(), JsValue::string(message));
        self.allocate(object)
    }

    /// A `TypeError` ready to be thrown.
    pub fn type_error(&self, message: &str) -> JsValue {
        JsValue::Object(self.new_error("TypeError", message))
    }

    pub fn register_template(&self, template: ObjectTemplate) -> TemplateId {
        let mut templates = self.inner.templates.borrow_mut();
        templates.push(Rc::new(template));
        TemplateId((templates.len() - 1) as u32)
    }

    pub fn new_instance(&self, template: TemplateId) -> Handle {
        let field_count = self
            .template(template)
            .map_or(0, |template| template.internal_field_count);
        self.allocate(HeapObject::with_template(template, field_count))
    }

    fn template(&self, id: TemplateId) -> Option<Rc<ObjectTemplate>> {
        self.inner.templates.borrow().get(id.0 as usize).cloned()
    }

    fn template_of(&self, handle: Handle) -> Option<Rc<ObjectTemplate>> {
        let id = self.inner.heap.borrow().get(handle)?.template?;
        self.template(id)
    }

    /// Class name of the template `handle` was instantiated from.
    pub fn class_name(&self, handle: Handle) -> Option<String> {
        self.template_of(handle)
            .map(|template| template.class_name.clone())
    }

    // -- Introspection -----------------------------------------------------

    pub fn is_alive(&self, handle: Handle) -> bool {
        self.inner.heap.borrow().contains(handle)
    }

    pub fn is_array(&self, handle: Handle) -> bool {
        matches!(
            self.inner.heap.borrow().get(handle).map(|object| &object.kind),
            Some(ObjectKind::Array(_))
        )
    }

    /// True for native functions and callable template instances.
    pub fn is_callable(&self, handle: Handle) -> bool {
        let is_function = matches!(
            self.inner.heap.borrow().get(handle).map(|object| &object.kind),
            Some(ObjectKind::Function { .. })
        );
        is_function
            || self
                .template_of(handle)
                .is_some_and(|template| template.call_handler.is_some())
    }

    pub fn is_function(&self, handle: Handle) -> bool {
        matches!(
            self.inner.heap.borrow().get(handle).map(|object| &object.kind),
            Some(ObjectKind::Function { .. })
        )
    }

    pub fn function_name(&self, handle: Handle) -> Option<String> {
        match &self.inner.heap.borrow().get(handle)?.kind {
            ObjectKind::Function { name, .. } => Some(name.to_string()),
            _ => None,
        }
    }

    /// Elements of a plain array.
    pub fn array_elements(&self, handle: Handle) -> Option<Vec<JsValue>> {
        let items = match &self.inner.heap.borrow().get(handle)?.kind {
            ObjectKind::Array(items) => items.clone(),
            _ => return None,
        };
        items.iter().for_each(|item| self.root(item));
        Some(items)
    }

    /// Own properties, bypassing interceptors.
    pub fn own_keys(&self, handle: Handle) -> Vec<String> {
        self.inner
            .heap
            .borrow()
            .get(handle)
            .map(|object| object.properties.keys().cloned().collect())
            .unwrap_or_default()
    }

    // -- Internal fields ---------------------------------------------------

    /// Stores `value` in internal field `index`. Returns `false` if the object
    /// has no such field.
    pub fn set_internal_field(&self, handle: Handle, index: usize, value: Box<dyn Any>) -> bool {
        let previous = {
            let mut heap = self.inner.heap.borrow_mut();
            let Some(field) = heap
                .get_mut(handle)
                .and_then(|object| object.internal_fields.get_mut(index))
            else {
                return false;
            };
            field.replace(value)
        };
        drop(previous);
        true
    }

    /// A copy of internal field `index` if it holds a `T`.
    pub fn internal_field<T: Clone + 'static>(&self, handle: Handle, index: usize) -> Option<T> {
        let heap = self.inner.heap.borrow();
        let field = heap.get(handle)?.internal_fields.get(index)?.as_ref()?;
        field.downcast_ref::<T>().cloned()
    }

    pub fn internal_field_count(&self, handle: Handle) -> usize {
        self.inner
            .heap
            .borrow()
            .get(handle)
            .map_or(0, |object| object.internal_fields.len())
    }

    // -- Weak references and collection -------------------------------------

    /// Arranges for `callback` to run once the object becomes unreachable.
    pub fn set_weak(&self, handle: Handle, callback: impl FnOnce(&mut WeakCallbackInfo) + 'static) {
        let previous = {
            let mut heap = self.inner.heap.borrow_mut();
            let Some(object) = heap.get_mut(handle) else {
                return;
            };
            object.weak_callback.replace(Box::new(callback))
        };
        drop(previous);
    }

    /// Runs a full collection and returns the number of objects reclaimed.
    ///
    /// Roots are the global object and every open handle scope. Weak
    /// callbacks run after the heap is released, in sweep order.
    pub fn collect_garbage(&self) -> usize {
        let roots: Vec<Handle> = {
            let scopes = self.inner.scopes.borrow();
            std::iter::once(self.inner.global)
                .chain(scopes.iter().flatten().copied())
                .collect()
        };
        let dead = self.inner.heap.borrow_mut().collect(roots);
        let freed = dead.len();
        for (handle, object) in dead {
            if let Some((callback, mut info)) = object.into_finalizer(handle) {
                callback(&mut info);
            }
        }
        tracing::debug!(freed, live = self.live_objects(), "Garbage collection finished");
        freed
    }

    pub fn live_objects(&self) -> usize {
        self.inner.heap.borrow().live()
    }

    pub fn gc_stats(&self) -> GcStats {
        self.inner.heap.borrow().stats()
    }

    // -- Globals -----------------------------------------------------------

    pub fn set_global(&self, name: &str, value: JsValue) {
        let previous = {
            let mut heap = self.inner.heap.borrow_mut();
            heap.get_mut(self.inner.global)
                .and_then(|global| global.properties.insert(name.to_string(), value))
        };
        drop(previous);
    }

    pub fn get_global(&self, name: &str) -> JsValue {
        let value = self
            .inner
            .heap
            .borrow()
            .get(self.inner.global)
            .and_then(|global| global.properties.get(name).cloned())
            .unwrap_or_default();
        self.local(value)
    }

    pub fn delete_global(&self, name: &str) -> bool {
        let previous = {
            let mut heap = self.inner.heap.borrow_mut();
            heap.get_mut(self.inner.global)
                .and_then(|global| global.properties.remove(name))
        };
        previous.is_some()
    }

    // -- Property access -----------------------------------------------------

    fn target_handle(&self, target: &JsValue, key: &str) -> JsResult<Handle> {
        match target {
            JsValue::Object(handle) if self.is_alive(*handle) => Ok(*handle),
            other => Err(self.type_error(&format!(
                "Cannot access property '{}' of {}",
                key,
                describe(other)
            ))),
        }
    }

    fn has_indexed_getter(&self, handle: Handle) -> bool {
        self.is_array(handle)
            || self
                .template_of(handle)
                .is_some_and(|template| template.indexed_getter.is_some())
    }

    fn has_indexed_setter(&self, handle: Handle) -> bool {
        self.is_array(handle)
            || self
                .template_of(handle)
                .is_some_and(|template| template.indexed_setter.is_some())
    }

    pub fn get(&self, target: &JsValue, key: &str) -> JsResult<JsValue> {
        let handle = self.target_handle(target, key)?;
        if let Some(index) = array_index(key) {
            if self.has_indexed_getter(handle) {
                return self.get_index(target, index);
            }
        }
        if let Some(getter) = self.template_of(handle).and_then(|t| t.named_getter) {
            if let Some(value) = getter(self, handle, key)? {
                return Ok(self.local(value));
            }
        }
        let value = {
            let heap = self.inner.heap.borrow();
            let Some(object) = heap.get(handle) else {
                return Ok(JsValue::Undefined);
            };
            match (&object.kind, key) {
                (ObjectKind::Array(items), "length") => JsValue::Number(items.len() as f64),
                (ObjectKind::Function { name, .. }, "name") => JsValue::String(name.clone()),
                _ => object.properties.get(key).cloned().unwrap_or_default(),
            }
        };
        Ok(self.local(value))
    }

    pub fn set(&self, target: &JsValue, key: &str, value: JsValue) -> JsResult<()> {
        let handle = self.target_handle(target, key)?;
        if let Some(index) = array_index(key) {
            if self.has_indexed_setter(handle) {
                return self.set_index(target, index, value);
            }
        }
        if let Some(setter) = self.template_of(handle).and_then(|t| t.named_setter) {
            if setter(self, handle, key, value.clone())? {
                return Ok(());
            }
        }
        let previous = {
            let mut heap = self.inner.heap.borrow_mut();
            let Some(object) = heap.get_mut(handle) else {
                return Ok(());
            };
            match (&mut object.kind, key) {
                (ObjectKind::Array(items), "length") => {
                    let len = value.as_number().unwrap_or(0.0).max(0.0) as usize;
                    items.resize(len, JsValue::Undefined);
                    None
                }
                _ => object.properties.insert(key.to_string(), value),
            }
        };
        drop(previous);
        Ok(())
    }

    pub fn get_index(&self, target: &JsValue, index: u32) -> JsResult<JsValue> {
        let handle = self.target_handle(target, &index.to_string())?;
        if let Some(getter) = self.template_of(handle).and_then(|t| t.indexed_getter) {
            return Ok(self.local(getter(self, handle, index)?.unwrap_or_default()));
        }
        let value = {
            let heap = self.inner.heap.borrow();
            match heap.get(handle) {
                Some(HeapObject {
                    kind: ObjectKind::Array(items),
                    ..
                }) => items.get(index as usize).cloned().unwrap_or_default(),
                Some(object) => object
                    .properties
                    .get(&index.to_string())
                    .cloned()
                    .unwrap_or_default(),
                None => JsValue::Undefined,
            }
        };
        Ok(self.local(value))
    }

    pub fn set_index(&self, target: &JsValue, index: u32, value: JsValue) -> JsResult<()> {
        let handle = self.target_handle(target, &index.to_string())?;
        if let Some(setter) = self.template_of(handle).and_then(|t| t.indexed_setter) {
            if setter(self, handle, index, value.clone())? {
                return Ok(());
            }
        }
        let previous = {
            let mut heap = self.inner.heap.borrow_mut();
            let Some(object) = heap.get_mut(handle) else {
                return Ok(());
            };
            match &mut object.kind {
                ObjectKind::Array(items) => {
                    let index = index as usize;
                    if index >= items.len() {
                        items.resize(index + 1, JsValue::Undefined);
                    }
                    Some(std::mem::replace(&mut items[index], value))
                }
                _ => object.properties.insert(index.to_string(), value),
            }
        };
        drop(previous);
        Ok(())
    }

    /// Enumerable property names, asking the enumerator interceptor if any.
    pub fn keys(&self, target: &JsValue) -> JsResult<Vec<String>> {
        let handle = self.target_handle(target, "keys")?;
        if let Some(enumerator) = self.template_of(handle).and_then(|t| t.enumerator) {
            return enumerator(self, handle);
        }
        let heap = self.inner.heap.borrow();
        let Some(object) = heap.get(handle) else {
            return Ok(Vec::new());
        };
        let mut keys: Vec<String> = match &object.kind {
            ObjectKind::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        };
        keys.extend(object.properties.keys().cloned());
        Ok(keys)
    }

    // -- Calls -------------------------------------------------------------

    /// Calls `callee` with `this` and `args`.
    ///
    /// The callback runs in its own handle scope; the result (or the thrown
    /// value) is rooted in the caller's scope.
    pub fn call(&self, callee: &JsValue, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let Some(handle) = callee.as_object().filter(|handle| self.is_alive(*handle)) else {
            return Err(self.type_error(&format!("{} is not a function", describe(callee))));
        };
        let callback: NativeCallback = {
            let native = match self.inner.heap.borrow().get(handle).map(|o| &o.kind) {
                Some(ObjectKind::Function { callback, .. }) => Some(callback.clone()),
                _ => None,
            };
            match native {
                Some(callback) => callback,
                None => match self.template_of(handle).and_then(|t| t.call_handler) {
                    Some(handler) => Rc::new(handler),
                    None => {
                        return Err(self.type_error(&format!(
                            "{} is not a function",
                            describe(callee)
                        )));
                    }
                },
            }
        };
        let info = CallInfo {
            callee: handle,
            this: this.clone(),
            args,
        };
        let result = self.scope(|ctx| callback(ctx, &info));
        match result {
            Ok(value) => Ok(self.local(value)),
            Err(thrown) => Err(self.local(thrown)),
        }
    }

    /// Reads `name` from `target` and calls it with `target` as `this`.
    pub fn call_method(&self, target: &JsValue, name: &str, args: &[JsValue]) -> JsResult<JsValue> {
        let method = self.get(target, name)?;
        if method.is_nullish() {
            return Err(self.type_error(&format!("{} is not a function", name)));
        }
        self.call(&method, target, args)
    }
}

fn describe(value: &JsValue) -> String {
    match value {
        JsValue::Undefined | JsValue::Null => value.to_string(),
        JsValue::String(s) => format!("\"{}\"", s),
        JsValue::Object(_) => "object".to_string(),
        other => other.to_string(),
    }
}

/// Canonical array index form: no sign, no leading zeros.
fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}
