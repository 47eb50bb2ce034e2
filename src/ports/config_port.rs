//! Configuration access port trait.

/// Raw INI-style lookups. Typed resolution with defaults and strict parsing
/// happens in `domain::config`.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
