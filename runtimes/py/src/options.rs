use shellbridge_core::{MarshalOptions, MarshalOptionsOverride};

/// Settings of a [`PyInterpreter`](crate::interp::PyInterpreter).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PyInterpreterOptions {
    pub marshal: MarshalOptions,
}

impl PyInterpreterOptions {
    pub fn override_with(self, options_override: &PyInterpreterOptionsOverride) -> Self {
        Self {
            marshal: self.marshal.override_with(&options_override.marshal),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PyInterpreterOptionsOverride {
    pub marshal: MarshalOptionsOverride,
}
