//! Capability interfaces a native class implements to be visible from script
//! code, plus the building blocks for implementing them.
//!
//! Adapters only ever talk to [`ObjectBridge`] and [`FunctionBase`]. Most
//! native classes do not implement these by hand: they compose a
//! [`NativeObject`] out of a state value, a [`MethodTable`], properties, and
//! optionally a [`ChainState`] restricting call order.

use core::any::Any;
use core::fmt::Write;
use std::rc::Rc;

use crate::{
    error::{Error, Result},
    values::{Value, ValueType},
};

pub mod chain;
pub mod function;
pub mod method_table;
pub mod object;
pub mod signature;

pub use chain::ChainState;
pub use function::{BoundMethod, NativeFunction};
pub use method_table::MethodTable;
pub use object::{NativeObject, ObjectBuilder};
pub use signature::{Param, Signature, validate_args};


/// Upcasting support so that `Rc<dyn ObjectBridge>` can be downcast to its
/// concrete class.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_rc(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

fn same_instance(a: &dyn Any, b: &dyn Any) -> bool {
    core::ptr::addr_eq(a as *const dyn Any, b as *const dyn Any)
}

/// Optional behaviors an object advertises. Adapters pick the wrapper shape
/// from these flags, never from the class name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Supports `length`, `get_member_index` and `set_member_index`.
    pub indexed: bool,
    /// The object itself can be called through `call_self`.
    pub callable: bool,
}

/// A native object exposed to script code.
///
/// All methods take `&self`: objects are shared between the native side and
/// every foreign handle wrapping them, so mutable state lives behind interior
/// mutability.
pub trait ObjectBridge: AsAny {
    fn class_name(&self) -> &str;

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Names of the members currently visible to scripts.
    fn get_members(&self) -> Vec<String>;

    fn has_member(&self, prop: &str) -> bool {
        self.get_members().iter().any(|member| member == prop)
    }

    /// Fails with [`Error::UnknownMember`] if `prop` is not a visible member.
    fn get_member(&self, prop: &str) -> Result<Value>;

    fn set_member(&self, prop: &str, _value: Value) -> Result<()> {
        if self.has_member(prop) {
            Err(Error::read_only(self.class_name(), prop))
        } else {
            Err(Error::unknown_member(self.class_name(), prop))
        }
    }

    fn has_method(&self, _name: &str) -> bool {
        false
    }

    fn call(&self, name: &str, _args: &[Value]) -> Result<Value> {
        Err(Error::unknown_member(self.class_name(), name))
    }

    fn call_self(&self, _args: &[Value]) -> Result<Value> {
        Err(Error::Type(format!("{} is not callable", self.class_name())))
    }

    fn length(&self) -> Result<usize> {
        Err(Error::Type(format!("{} is not indexed", self.class_name())))
    }

    fn get_member_index(&self, _index: usize) -> Result<Value> {
        Err(Error::Type(format!("{} is not indexed", self.class_name())))
    }

    fn set_member_index(&self, _index: usize, _value: Value) -> Result<()> {
        Err(Error::Type(format!("{} is not indexed", self.class_name())))
    }

    /// Identity by default.
    fn equals(&self, other: &dyn ObjectBridge) -> bool {
        same_instance(self.as_any(), other.as_any())
    }

    /// Writes the display form. `indent` is the current nesting level when
    /// pretty printing, `None` otherwise.
    fn append_descr(&self, out: &mut String, _indent: Option<usize>) {
        let _ = write!(out, "<{}>", self.class_name());
    }

    fn append_repr(&self, out: &mut String) {
        self.append_descr(out, None);
    }
}

/// A callable exposed to script code.
pub trait FunctionBase: AsAny {
    fn name(&self) -> &str;

    /// Declared parameters, in order.
    fn signature(&self) -> &[Param];

    /// Declared result tag; `None` when any value may be returned.
    fn return_type(&self) -> Option<ValueType>;

    /// Variadic functions skip signature validation.
    fn is_variadic(&self) -> bool {
        false
    }

    fn equals(&self, other: &dyn FunctionBase) -> bool {
        same_instance(self.as_any(), other.as_any())
    }

    /// Calls the function. Implementations validate `args` against
    /// `signature()` (see [`validate_args`]) unless variadic.
    fn invoke(&self, args: &[Value]) -> Result<Value>;
}
