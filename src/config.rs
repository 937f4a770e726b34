//! Configuration for encoding and decoding.

/// What to do when a known field number arrives with an unexpected wire type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MismatchPolicy {
    /// Keep the occurrence in the unknown-field store under the wire type it
    /// arrived with, so it round-trips unchanged.
    #[default]
    PreserveUnknown,
    /// Fail decoding with [`crate::DecodeError::WireTypeMismatch`].
    Reject,
}

/// Configuration for a [`crate::Registry`].
///
/// # Example
/// ```
/// use protowire::{Config, MismatchPolicy, Registry};
///
/// let mut config = Config::new();
/// config.max_depth(32).wire_type_mismatch(MismatchPolicy::Reject);
/// let registry = Registry::with_config(config);
/// assert_eq!(registry.config().get_max_depth(), 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum nesting of messages within messages while decoding.
    pub(crate) max_depth: u32,

    /// Handling of known fields whose wire type disagrees with the schema.
    pub(crate) wire_type_mismatch: MismatchPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Default limit on nested message depth.
    pub const DEFAULT_MAX_DEPTH: u32 = 100;

    /// Create a new Config with default settings.
    pub const fn new() -> Self {
        Config {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            wire_type_mismatch: MismatchPolicy::PreserveUnknown,
        }
    }

    /// Set the maximum depth of nested messages accepted while decoding.
    pub fn max_depth(&mut self, depth: u32) -> &mut Self {
        self.max_depth = depth;
        self
    }

    /// Set the handling of wire-type mismatches on known fields.
    pub fn wire_type_mismatch(&mut self, policy: MismatchPolicy) -> &mut Self {
        self.wire_type_mismatch = policy;
        self
    }

    /// Returns the configured nested message depth limit.
    pub const fn get_max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Returns the configured wire-type mismatch policy.
    pub const fn get_wire_type_mismatch(&self) -> MismatchPolicy {
        self.wire_type_mismatch
    }
}
