//! Configuration access port.

/// Raw `[section] key` lookups. Typing and validation happen in
/// `domain::config_validation` so a bad value is reported, never defaulted.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
}
