//! Configuration access port trait.

pub trait ConfigPort {
    /// Raw value of `key` in `section`, if present.
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    /// Section names in the order they should be processed.
    fn sections(&self) -> Vec<String>;
}
