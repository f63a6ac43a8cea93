use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::ty::{JavaType, TypeVariable};

/// Index of a [`ScopeDef`] inside a [`TypeStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The class or method that declares a set of type parameters.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScopeOwner {
    Class(String),
    Method {
        class: String,
        name: String,
        descriptor: String,
    },
}

impl ScopeOwner {
    pub fn class(binary_name: impl Into<String>) -> Self {
        ScopeOwner::Class(binary_name.into())
    }

    pub fn method(
        class: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        ScopeOwner::Method {
            class: class.into(),
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }

    /// Binary name of the class itself, or of the class declaring the method.
    pub fn class_name(&self) -> &str {
        match self {
            ScopeOwner::Class(name) => name,
            ScopeOwner::Method { class, .. } => class,
        }
    }
}

impl fmt::Display for ScopeOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeOwner::Class(name) => f.write_str(name),
            ScopeOwner::Method {
                class,
                name,
                descriptor,
            } => write!(f, "{class}.{name}{descriptor}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypeParamDef {
    pub name: String,
    /// Empty only while the declaring scope is still being resolved.
    pub bounds: Vec<JavaType>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScopeDef {
    pub owner: ScopeOwner,
    pub params: Vec<TypeParamDef>,
}

impl ScopeDef {
    pub fn param(&self, name: &str) -> Option<&TypeParamDef> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn declares(&self, name: &str) -> bool {
        self.param(name).is_some()
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("type parameter `{name}` is declared twice by {owner}")]
    DuplicateTypeParameter { owner: ScopeOwner, name: String },
    #[error("type parameters of {0} were already declared")]
    AlreadyDeclared(ScopeOwner),
}

/// Arena of type-parameter scopes.
///
/// Scopes are declared with placeholder parameters first and completed later via
/// [`TypeStore::define_bounds`], so bounds can refer to any parameter of any declared scope
/// regardless of declaration order.
#[derive(Clone, Debug, Default)]
pub struct TypeStore {
    scopes: Vec<ScopeDef>,
    by_owner: HashMap<ScopeOwner, ScopeId>,
}

impl TypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `owner` with one placeholder per name, in declaration order.
    pub fn declare_scope<I, S>(&mut self, owner: ScopeOwner, names: I) -> Result<ScopeId, ScopeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.by_owner.contains_key(&owner) {
            return Err(ScopeError::AlreadyDeclared(owner));
        }

        let mut params: Vec<TypeParamDef> = Vec::new();
        for name in names {
            let name = name.into();
            if params.iter().any(|p| p.name == name) {
                return Err(ScopeError::DuplicateTypeParameter { owner, name });
            }
            params.push(TypeParamDef {
                name,
                bounds: Vec::new(),
            });
        }

        let id = ScopeId(
            self.scopes
                .len()
                .try_into()
                .expect("too many type parameter scopes"),
        );
        self.scopes.push(ScopeDef {
            owner: owner.clone(),
            params,
        });
        self.by_owner.insert(owner, id);
        Ok(id)
    }

    /// Complete the placeholder `name` of `scope` in place.
    ///
    /// # Panics
    ///
    /// Panics if `bounds` is empty or the parameter was never declared. Both indicate a resolver
    /// defect rather than bad input.
    pub fn define_bounds(&mut self, scope: ScopeId, name: &str, bounds: Vec<JavaType>) {
        let def = &mut self.scopes[scope.index()];
        assert!(
            !bounds.is_empty(),
            "type parameter `{name}` of {} resolved to an empty bound list",
            def.owner
        );
        let owner = def.owner.clone();
        let param = def
            .params
            .iter_mut()
            .find(|p| p.name == name)
            .unwrap_or_else(|| panic!("type parameter `{name}` is not declared by {owner}"));
        param.bounds = bounds;
    }

    pub fn scope(&self, id: ScopeId) -> Option<&ScopeDef> {
        self.scopes.get(id.index())
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &ScopeDef)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(idx, def)| (ScopeId(idx as u32), def))
    }

    pub fn scope_of(&self, owner: &ScopeOwner) -> Option<ScopeId> {
        self.by_owner.get(owner).copied()
    }

    pub fn class_scope(&self, binary_name: &str) -> Option<ScopeId> {
        self.scope_of(&ScopeOwner::class(binary_name))
    }

    pub fn method_scope(&self, class: &str, name: &str, descriptor: &str) -> Option<ScopeId> {
        self.scope_of(&ScopeOwner::method(class, name, descriptor))
    }

    pub fn type_params(&self, scope: ScopeId) -> &[TypeParamDef] {
        self.scope(scope)
            .map(|def| def.params.as_slice())
            .unwrap_or(&[])
    }

    pub fn type_param(&self, scope: ScopeId, name: &str) -> Option<&TypeParamDef> {
        self.scope(scope)?.param(name)
    }

    /// Bounds of the parameter `var` refers to. Stub variables have no bounds.
    pub fn bounds_of(&self, var: &TypeVariable) -> &[JavaType] {
        var.scope
            .and_then(|scope| self.type_param(scope, &var.name))
            .map(|param| param.bounds.as_slice())
            .unwrap_or(&[])
    }
}
