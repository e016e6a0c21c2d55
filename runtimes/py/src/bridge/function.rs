use ecow::EcoString;
use shellbridge_core::{
    Error, Result, Value, ValueType,
    bridge::{FunctionBase, Param},
    runtime::RuntimeAdapter,
};

use super::{BridgeState, PyBridge};
use crate::interp::{PyInterpreter, PyRef, WeakInterpreter};

/// A Python callable seen from native code.
///
/// Only a weak reference is kept, in the bridge's side table, so native code
/// never keeps a Python function alive. Invoking after its last Python
/// reference was dropped fails with [`Error::CallableGone`]. Dropping the
/// wrapper erases its side-table entry.
pub struct PyFunction {
    interp: WeakInterpreter,
    key: u64,
    name: EcoString,
}

impl PyFunction {
    pub(crate) fn register(bridge: &PyBridge, callable: &PyRef) -> Self {
        let interp = bridge.interpreter();
        let key = bridge
            .state()
            .register_callable(interp.downgrade(callable));
        let name = interp
            .function_name(callable)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| interp.type_name(callable));
        tracing::trace!(key, name = %name, "Registered Python callable");
        Self {
            interp: interp.weak_interpreter(),
            key,
            name: name.into(),
        }
    }

    /// A new reference to the Python callable, if it still exists.
    pub fn callable(&self) -> Option<PyRef> {
        let interp = self.interp.upgrade()?;
        let state = interp.embedder_data::<BridgeState>()?;
        let weak = state.callable(self.key)?;
        interp.upgrade(&weak)
    }

    fn interpreter(&self) -> Result<PyInterpreter> {
        self.interp
            .upgrade()
            .ok_or_else(|| Error::CallableGone(self.name.to_string()))
    }
}

impl FunctionBase for PyFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &[Param] {
        &[]
    }

    fn return_type(&self) -> Option<ValueType> {
        None
    }

    fn is_variadic(&self) -> bool {
        true
    }

    fn equals(&self, other: &dyn FunctionBase) -> bool {
        let Some(other) = other.as_any().downcast_ref::<PyFunction>() else {
            return false;
        };
        match (self.callable(), other.callable()) {
            (Some(a), Some(b)) => a.is(&b),
            _ => false,
        }
    }

    fn invoke(&self, args: &[Value]) -> Result<Value> {
        let interp = self.interpreter()?;
        let callable = self
            .callable()
            .ok_or_else(|| Error::CallableGone(self.name.to_string()))?;
        let bridge = PyBridge::new(&interp);
        let args: Vec<PyRef> = args.iter().map(|arg| bridge.to_foreign(arg)).collect();
        match interp.call(&callable, &args) {
            Ok(result) => bridge.to_native(&result),
            Err(err) => Err(bridge.error_from_exception(&err)),
        }
    }
}

impl Drop for PyFunction {
    fn drop(&mut self) {
        let Some(interp) = self.interp.upgrade() else {
            return;
        };
        if let Some(state) = interp.embedder_data::<BridgeState>() {
            if state.forget_callable(self.key) {
                tracing::trace!(key = self.key, "Erased Python callable");
            }
        }
    }
}

static_assertions::assert_not_impl_any!(PyFunction: Send, Sync);
