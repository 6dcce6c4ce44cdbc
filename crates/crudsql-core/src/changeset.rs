//! Changesets: which properties a partial statement should touch.

use std::fmt;

/// An ordered set of changed property names paired with the mutated target.
///
/// Names keep the order in which they were recorded and never repeat. A name
/// in the set means "this property takes part in the next partial statement".
pub struct ChangeSet<'a, T> {
    target: &'a mut T,
    changed: Vec<&'static str>,
}

impl<'a, T> ChangeSet<'a, T> {
    /// Start an empty changeset over `target`.
    pub fn new(target: &'a mut T) -> Self {
        Self {
            target,
            changed: Vec::new(),
        }
    }

    /// Record `name` as changed. Returns `false` if it was already recorded.
    pub fn record(&mut self, name: &'static str) -> bool {
        if self.changed.contains(&name) {
            return false;
        }
        self.changed.push(name);
        true
    }

    /// Changed property names in recording order.
    pub fn names(&self) -> &[&'static str] {
        &self.changed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.changed.iter().any(|n| *n == name)
    }

    pub fn len(&self) -> usize {
        self.changed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    /// The mutated target.
    pub fn target(&self) -> &T {
        self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        self.target
    }

    /// Give the target borrow back.
    pub fn into_target(self) -> &'a mut T {
        self.target
    }
}

impl<T: fmt::Debug> fmt::Debug for ChangeSet<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSet")
            .field("changed", &self.changed)
            .field("target", &self.target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_order_and_rejects_duplicates() {
        let mut target = 0_u8;
        let mut changes = ChangeSet::new(&mut target);
        assert!(changes.is_empty());
        assert!(changes.record("Name"));
        assert!(changes.record("Alias"));
        assert!(!changes.record("Name"));
        assert_eq!(changes.names(), &["Name", "Alias"]);
        assert!(changes.contains("Alias"));
        assert!(!changes.contains("Id"));
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn target_is_reachable() {
        let mut target = String::from("a");
        let mut changes = ChangeSet::new(&mut target);
        changes.target_mut().push('b');
        assert_eq!(changes.target(), "ab");
        changes.into_target().push('c');
        assert_eq!(target, "abc");
    }
}
