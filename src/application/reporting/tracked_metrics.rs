use std::collections::HashSet;

/// Metric names whose descriptor creation has already been attempted.
///
/// Owned by a single reporter. Grows for the life of the process and is
/// never persisted; a name stays tracked even when its creation failed.
#[derive(Debug, Default, Clone)]
pub struct TrackedMetrics {
    names: HashSet<String>,
}

impl TrackedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `name`. Returns true the first time a name is seen.
    pub fn mark(&mut self, name: &str) -> bool {
        if self.names.contains(name) {
            return false;
        }
        self.names.insert(name.to_string())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}
