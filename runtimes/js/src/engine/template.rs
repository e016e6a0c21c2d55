use super::{CallInfo, Handle, JsContext, JsResult, JsValue};

/// Answers a named property read. `None` falls through to the own properties.
pub type NamedGetter = fn(&JsContext, Handle, &str) -> JsResult<Option<JsValue>>;

/// Intercepts a named property write. `false` stores it as an own property.
pub type NamedSetter = fn(&JsContext, Handle, &str, JsValue) -> JsResult<bool>;

pub type IndexedGetter = fn(&JsContext, Handle, u32) -> JsResult<Option<JsValue>>;

pub type IndexedSetter = fn(&JsContext, Handle, u32, JsValue) -> JsResult<bool>;

/// Lists the property names of an intercepted object.
pub type Enumerator = fn(&JsContext, Handle) -> JsResult<Vec<String>>;

/// Makes instances callable.
pub type CallHandler = fn(&JsContext, &CallInfo<'_>) -> JsResult<JsValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TemplateId(pub(crate) u32);

/// Shape shared by host-defined objects: a class name, a number of private
/// internal fields and optional interceptors.
#[derive(Clone, Default)]
pub struct ObjectTemplate {
    pub class_name: String,
    pub internal_field_count: usize,
    pub named_getter: Option<NamedGetter>,
    pub named_setter: Option<NamedSetter>,
    pub indexed_getter: Option<IndexedGetter>,
    pub indexed_setter: Option<IndexedSetter>,
    pub enumerator: Option<Enumerator>,
    pub call_handler: Option<CallHandler>,
}

impl ObjectTemplate {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn internal_fields(mut self, count: usize) -> Self {
        self.internal_field_count = count;
        self
    }

    pub fn named(mut self, getter: NamedGetter, setter: NamedSetter) -> Self {
        self.named_getter = Some(getter);
        self.named_setter = Some(setter);
        self
    }

    pub fn indexed(mut self, getter: IndexedGetter, setter: IndexedSetter) -> Self {
        self.indexed_getter = Some(getter);
        self.indexed_setter = Some(setter);
        self
    }

    pub fn enumerator(mut self, enumerator: Enumerator) -> Self {
        self.enumerator = Some(enumerator);
        self
    }

    pub fn callable(mut self, handler: CallHandler) -> Self {
        self.call_handler = Some(handler);
        self
    }
}
