use ecow::EcoString;
use shellbridge_core::{
    Error, Result, Value, ValueType,
    bridge::{FunctionBase, Param},
    runtime::RuntimeAdapter,
};

use super::{BridgeState, JsBridge};
use crate::engine::{Handle, JsContext, JsValue, WeakContext};

/// A script callable seen from native code.
///
/// Holds the callable weakly through the bridge's side table: native code
/// never keeps a script function alive. Once the collector has reclaimed it,
/// invoking fails with [`Error::CallableGone`]. Dropping the wrapper erases
/// its side-table entry.
pub struct JsFunction {
    ctx: WeakContext,
    key: u64,
    name: EcoString,
}

impl JsFunction {
    pub(crate) fn register(bridge: &JsBridge, handle: Handle) -> Self {
        let key = bridge.state().register_callable(handle);
        let name = bridge
            .context()
            .function_name(handle)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "anonymous".to_string());
        tracing::trace!(key, name = %name, "Registered script callable");
        Self {
            ctx: bridge.context().downgrade(),
            key,
            name: name.into(),
        }
    }

    /// The live script callable, if it still exists.
    pub fn handle(&self) -> Option<Handle> {
        let ctx = self.ctx.upgrade()?;
        let state = ctx.embedder_data::<BridgeState>()?;
        state.callable(self.key).filter(|handle| ctx.is_alive(*handle))
    }

    fn context(&self) -> Result<JsContext> {
        self.ctx
            .upgrade()
            .ok_or_else(|| Error::CallableGone(self.name.to_string()))
    }
}

impl FunctionBase for JsFunction {
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
        let Some(other) = other.as_any().downcast_ref::<JsFunction>() else {
            return false;
        };
        match (self.handle(), other.handle()) {
            (Some(a), Some(b)) => a == b && self.ctx.ptr_eq(&other.ctx),
            _ => false,
        }
    }

    fn invoke(&self, args: &[Value]) -> Result<Value> {
        let ctx = self.context()?;
        let handle = self
            .handle()
            .ok_or_else(|| Error::CallableGone(self.name.to_string()))?;
        let bridge = JsBridge::new(&ctx);
        ctx.scope(|ctx| {
            let args: Vec<JsValue> = args.iter().map(|arg| bridge.to_foreign(arg)).collect();
            match ctx.call(&JsValue::Object(handle), &JsValue::Undefined, &args) {
                Ok(result) => bridge.to_native(&result),
                Err(thrown) => Err(bridge.error_from_thrown(&thrown)),
            }
        })
    }
}

impl Drop for JsFunction {
    fn drop(&mut self) {
        let Some(ctx) = self.ctx.upgrade() else {
            return;
        };
        if let Some(state) = ctx.embedder_data::<BridgeState>() {
            if state.forget_callable(self.key) {
                tracing::trace!(key = self.key, "Erased script callable");
            }
        }
    }
}

static_assertions::assert_not_impl_any!(JsFunction: Send, Sync);
