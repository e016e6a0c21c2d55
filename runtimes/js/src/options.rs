use shellbridge_core::{MarshalOptions, MarshalOptionsOverride};

/// Settings of a [`JsContext`](crate::engine::JsContext).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsContextOptions {
    /// Allocations between automatic collections. `0` disables them.
    pub gc_threshold: usize,
    pub marshal: MarshalOptions,
}

impl Default for JsContextOptions {
    fn default() -> Self {
        Self {
            gc_threshold: 10_000,
            marshal: MarshalOptions::default(),
        }
    }
}

impl JsContextOptions {
    pub fn override_with(self, options_override: &JsContextOptionsOverride) -> Self {
        Self {
            gc_threshold: options_override.gc_threshold.unwrap_or(self.gc_threshold),
            marshal: self.marshal.override_with(&options_override.marshal),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsContextOptionsOverride {
    pub gc_threshold: Option<usize>,
    pub marshal: MarshalOptionsOverride,
}
