//! Decoder configuration

/// Maximum nesting depth for objects/arrays (prevent stack overflow)
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Maximum number of values materialized while decoding one session
pub const DEFAULT_MAX_NODES: usize = 1 << 20;

/// How string payloads that are not valid UTF-8 are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Utf8Policy {
    /// Fail with `Amf0Error::MalformedString`
    #[default]
    Strict,
    /// Replace invalid sequences with U+FFFD
    Lossy,
}

/// Decoder configuration options
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Maximum nesting depth of complex values
    pub max_depth: usize,

    /// Maximum number of values one session may materialize, counting every
    /// inlined copy of a referenced value and the reference table's copies
    pub max_nodes: usize,

    /// Invalid UTF-8 handling
    pub utf8: Utf8Policy,

    /// Inline a copy of the referenced value for back-references.
    /// When disabled, references decode as `Amf0Value::Reference(index)`.
    pub resolve_references: bool,

    /// Packet starts with a 16-bit version word before the header count
    pub version_prefix: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_nodes: DEFAULT_MAX_NODES,
            utf8: Utf8Policy::Strict,
            resolve_references: true,
            version_prefix: false,
        }
    }
}

impl DecoderConfig {
    /// Set maximum nesting depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    /// Set the per-session value budget
    pub fn max_nodes(mut self, nodes: usize) -> Self {
        self.max_nodes = nodes.max(1);
        self
    }

    /// Replace invalid UTF-8 instead of failing
    pub fn lossy_utf8(mut self) -> Self {
        self.utf8 = Utf8Policy::Lossy;
        self
    }

    /// Enable or disable inlining of back-references
    pub fn resolve_references(mut self, resolve: bool) -> Self {
        self.resolve_references = resolve;
        self
    }

    /// Expect a version word at the start of each packet
    pub fn version_prefix(mut self, enabled: bool) -> Self {
        self.version_prefix = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecoderConfig::default();

        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.max_nodes, DEFAULT_MAX_NODES);
        assert_eq!(config.utf8, Utf8Policy::Strict);
        assert!(config.resolve_references);
        assert!(!config.version_prefix);
    }

    #[test]
    fn test_builder_max_depth_floor() {
        // A zero limit would reject every value, including top-level scalars
        let config = DecoderConfig::default().max_depth(0);

        assert_eq!(config.max_depth, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = DecoderConfig::default()
            .max_depth(8)
            .max_nodes(100)
            .lossy_utf8()
            .resolve_references(false)
            .version_prefix(true);

        assert_eq!(config.max_depth, 8);
        assert_eq!(config.max_nodes, 100);
        assert_eq!(config.utf8, Utf8Policy::Lossy);
        assert!(!config.resolve_references);
        assert!(config.version_prefix);
    }
}
