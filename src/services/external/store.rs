use std::collections::HashMap;

/// Per-target results owned by one client.
///
/// Every write for a target replaces what was stored for it before.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetStore<V> {
    entries: HashMap<String, V>,
}

impl<V> TargetStore<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Store `value` for `target`, returning the previous value if any
    pub fn replace(&mut self, target: &str, value: V) -> Option<V> {
        self.entries.insert(target.to_string(), value)
    }

    pub fn get(&self, target: &str) -> Option<&V> {
        self.entries.get(target)
    }

    pub fn contains(&self, target: &str) -> bool {
        self.entries.contains_key(target)
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for TargetStore<V> {
    fn default() -> Self {
        Self::new()
    }
}
