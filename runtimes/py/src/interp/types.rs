use std::any::Any;

use super::{PyInterpreter, PyRef, PyResult};

pub type GetAttrFn = fn(&PyInterpreter, &PyRef, &str) -> PyResult<PyRef>;
pub type SetAttrFn = fn(&PyInterpreter, &PyRef, &str, PyRef) -> PyResult<()>;
pub type DirFn = fn(&PyInterpreter, &PyRef) -> PyResult<Vec<String>>;
pub type LenFn = fn(&PyInterpreter, &PyRef) -> PyResult<usize>;
pub type GetItemFn = fn(&PyInterpreter, &PyRef, &PyRef) -> PyResult<PyRef>;
pub type SetItemFn = fn(&PyInterpreter, &PyRef, &PyRef, PyRef) -> PyResult<()>;
pub type CallFn = fn(&PyInterpreter, &PyRef, &[PyRef]) -> PyResult<PyRef>;

/// Receives the instance payload when the last reference goes away.
pub type DeallocFn = fn(Box<dyn Any>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub(crate) u32);

/// An extension type: a name plus the protocol slots it implements.
/// Missing slots raise the usual `TypeError`/`AttributeError`.
#[derive(Clone, Default)]
pub struct PyType {
    pub name: String,
    pub getattr: Option<GetAttrFn>,
    pub setattr: Option<SetAttrFn>,
    pub dir: Option<DirFn>,
    pub len: Option<LenFn>,
    pub getitem: Option<GetItemFn>,
    pub setitem: Option<SetItemFn>,
    pub call: Option<CallFn>,
    pub dealloc: Option<DeallocFn>,
}

impl PyType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
