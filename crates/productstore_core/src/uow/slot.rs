//! Lazily filled, explicitly invalidated repository cache slot.

use std::rc::Rc;

/// Owned-or-absent cache for one repository instance.
pub struct RepositorySlot<R> {
    cached: Option<Rc<R>>,
}

impl<R> RepositorySlot<R> {
    pub fn new() -> Self {
        Self { cached: None }
    }

    /// Returns the cached instance, building and caching it if absent.
    pub fn get_or_build(&mut self, build: impl FnOnce() -> R) -> Rc<R> {
        Rc::clone(self.cached.get_or_insert_with(|| Rc::new(build())))
    }

    pub fn clear(&mut self) {
        self.cached = None;
    }

    pub fn is_filled(&self) -> bool {
        self.cached.is_some()
    }
}

impl<R> Default for RepositorySlot<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::RepositorySlot;
    use std::rc::Rc;

    #[test]
    fn builds_once_until_cleared() {
        let mut slot = RepositorySlot::new();
        let mut builds = 0;

        let first = slot.get_or_build(|| {
            builds += 1;
            "repo"
        });
        let second = slot.get_or_build(|| {
            builds += 1;
            "repo"
        });
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(builds, 1);

        slot.clear();
        assert!(!slot.is_filled());
        let third = slot.get_or_build(|| "repo");
        assert!(!Rc::ptr_eq(&first, &third));
    }
}
