//! Marshaling options shared by the runtime adapters.

/// Limits applied while converting foreign data into native values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarshalOptions {
    /// Maximum nesting of plain foreign arrays/objects copied into native
    /// containers. Deeper (or cyclic) data is rejected with an argument error.
    pub max_depth: usize,
}

impl Default for MarshalOptions {
    fn default() -> Self {
        Self { max_depth: 100 }
    }
}

impl MarshalOptions {
    /// Returns these options with every field set in `options_override` replaced.
    pub fn override_with(self, options_override: &MarshalOptionsOverride) -> Self {
        Self {
            max_depth: options_override.max_depth.unwrap_or(self.max_depth),
        }
    }
}

/// Partial [`MarshalOptions`]; `None` fields keep the base value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarshalOptionsOverride {
    pub max_depth: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_keeps_unset_fields() {
        let base = MarshalOptions { max_depth: 12 };
        assert_eq!(base.override_with(&MarshalOptionsOverride::default()), base);
        assert_eq!(
            base.override_with(&MarshalOptionsOverride { max_depth: Some(3) }),
            MarshalOptions { max_depth: 3 }
        );
    }
}
