use crate::store::{ScopeId, TypeStore};

/// The type-parameter scopes visible from some point in a class, innermost first.
///
/// A name resolves to the first scope in the chain that declares it, so a nested class or a
/// generic method shadows parameters of the same name declared further out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeChain {
    scopes: Vec<ScopeId>,
}

impl ScopeChain {
    /// The empty chain; every lookup misses.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a chain from scopes listed innermost first.
    pub fn from_innermost(scopes: impl IntoIterator<Item = ScopeId>) -> Self {
        Self {
            scopes: scopes.into_iter().collect(),
        }
    }

    /// A new chain with `inner` in front of the scopes of `self`.
    pub fn nested(&self, inner: ScopeId) -> Self {
        let mut scopes = Vec::with_capacity(self.scopes.len() + 1);
        scopes.push(inner);
        scopes.extend_from_slice(&self.scopes);
        Self { scopes }
    }

    /// The nearest scope declaring a type parameter called `name`.
    pub fn resolve(&self, store: &TypeStore, name: &str) -> Option<ScopeId> {
        self.scopes.iter().copied().find(|&scope| {
            store
                .scope(scope)
                .is_some_and(|def| def.declares(name))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = ScopeId> + '_ {
        self.scopes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}
