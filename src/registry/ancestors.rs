use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::schema::ClassId;

/// Memoized ancestor chains, nearest parent first.
///
/// Each known class owns a once-cell, so concurrent readers of a frozen
/// registry fill the memo without a lock and a chain is walked at most once.
#[derive(Debug)]
pub struct AncestorResolver {
    parents: IndexMap<ClassId, ClassId>,
    memo: IndexMap<ClassId, OnceCell<Arc<[ClassId]>>>,
    walks: AtomicUsize,
}

impl AncestorResolver {
    /// `parents` must be acyclic; `RegistryBuilder::freeze` checks it.
    pub(crate) fn new<'a>(
        parents: IndexMap<ClassId, ClassId>,
        known: impl IntoIterator<Item = &'a ClassId>,
    ) -> Self {
        let memo = known
            .into_iter()
            .cloned()
            .chain(parents.keys().cloned())
            .map(|c| (c, OnceCell::new()))
            .collect();
        Self { parents, memo, walks: AtomicUsize::new(0) }
    }

    pub fn ancestors_of(&self, class: &str) -> Arc<[ClassId]> {
        match self.memo.get(class) {
            Some(cell) => cell.get_or_init(|| self.walk(class)).clone(),
            // never declared or registered: no parent link exists
            None => Arc::from(Vec::new()),
        }
    }

    pub fn parent_of(&self, class: &str) -> Option<&ClassId> {
        self.parents.get(class)
    }

    /// How many chains have actually been walked.
    pub fn traversals(&self) -> usize {
        self.walks.load(Ordering::Relaxed)
    }

    fn walk(&self, class: &str) -> Arc<[ClassId]> {
        self.walks.fetch_add(1, Ordering::Relaxed);
        let mut chain = Vec::new();
        let mut cursor = self.parents.get(class);
        while let Some(parent) = cursor {
            if chain.len() > self.parents.len() {
                break;
            }
            chain.push(parent.clone());
            cursor = self.parents.get(parent.as_str());
        }
        tracing::trace!(class, depth = chain.len(), "resolved ancestor chain");
        Arc::from(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(links: &[(&str, &str)]) -> AncestorResolver {
        let parents = links.iter().map(|(c, p)| (ClassId::new(c), ClassId::new(p))).collect();
        AncestorResolver::new(parents, [])
    }

    #[test]
    fn nearest_first_and_ends_at_root() {
        let r = resolver(&[("C", "B"), ("B", "A")]);
        let chain: Vec<_> = r.ancestors_of("C").iter().map(|c| c.to_string()).collect();
        assert_eq!(chain, ["B", "A"]);
        assert!(r.ancestors_of("A").is_empty());
    }

    #[test]
    fn undeclared_parent_terminates_chain() {
        let r = resolver(&[("Me", "User")]);
        let chain = r.ancestors_of("Me");
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].as_str(), "User");
    }

    #[test]
    fn second_lookup_hits_memo() {
        let r = resolver(&[("C", "B"), ("B", "A")]);
        let first = r.ancestors_of("C");
        let second = r.ancestors_of("C");
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(r.traversals(), 1);
    }

    #[test]
    fn known_root_class_is_memoized() {
        let root = ClassId::new("A");
        let r = AncestorResolver::new(IndexMap::new(), [&root]);
        assert!(r.ancestors_of("A").is_empty());
        assert!(r.ancestors_of("A").is_empty());
        assert_eq!(r.traversals(), 1);
    }

    #[test]
    fn unknown_class_has_no_ancestors() {
        let r = resolver(&[]);
        assert!(r.ancestors_of("Nope").is_empty());
        assert_eq!(r.traversals(), 0);
    }
}
