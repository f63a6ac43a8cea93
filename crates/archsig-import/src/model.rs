use std::collections::HashMap;

use archsig_types::{
    ClassOrigin, Diagnostic, JavaType, ScopeId, ScopeOwner, TypeParamDef, TypeStore, TypeVariable,
};

use crate::class_info::{ClassInfo, EnclosingInfo, MethodInfo};
use crate::classpath::ClassPool;

#[derive(Debug)]
pub(crate) struct ClassData {
    pub(crate) info: ClassInfo,
    pub(crate) origin: ClassOrigin,
    /// `None` when the class's generics had to be dropped.
    pub(crate) scope: Option<ScopeId>,
    pub(crate) super_class: Option<JavaType>,
    pub(crate) interfaces: Vec<JavaType>,
    pub(crate) methods: Vec<MethodData>,
}

#[derive(Debug)]
pub(crate) struct MethodData {
    pub(crate) info: MethodInfo,
    /// Set only for methods declaring type parameters.
    pub(crate) scope: Option<ScopeId>,
    pub(crate) parameter_types: Vec<JavaType>,
    pub(crate) return_type: Option<JavaType>,
    pub(crate) throws_types: Vec<JavaType>,
}

/// The result of one import batch.
///
/// Immutable once built; share it behind an `Arc` to read it from several threads.
#[derive(Debug)]
pub struct ImportedClasses {
    store: TypeStore,
    classes: Vec<ClassData>,
    index: HashMap<String, usize>,
    diagnostics: Vec<Diagnostic>,
}

impl ImportedClasses {
    pub(crate) fn new(
        store: TypeStore,
        classes: Vec<ClassData>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(idx, class)| (class.info.binary_name.clone(), idx))
            .collect();
        Self {
            store,
            classes,
            index,
            diagnostics,
        }
    }

    /// A batch class, or a class loaded from the classpath while importing the batch.
    pub fn get(&self, binary_name: &str) -> Option<JavaClass<'_>> {
        let idx = *self.index.get(binary_name)?;
        Some(JavaClass {
            imported: self,
            data: &self.classes[idx],
        })
    }

    pub fn contains(&self, binary_name: &str) -> bool {
        self.index.contains_key(binary_name)
    }

    /// All classes in import order: the batch first, then classpath classes in load order.
    pub fn classes(&self) -> impl Iterator<Item = JavaClass<'_>> {
        self.classes.iter().map(move |data| JavaClass {
            imported: self,
            data,
        })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn store(&self) -> &TypeStore {
        &self.store
    }

    pub fn bounds_of(&self, var: &TypeVariable) -> &[JavaType] {
        self.store.bounds_of(var)
    }
}

impl ClassPool for ImportedClasses {
    fn lookup(&self, binary_name: &str) -> Option<&ClassInfo> {
        let idx = *self.index.get(binary_name)?;
        Some(&self.classes[idx].info)
    }
}

#[derive(Clone, Copy)]
pub struct JavaClass<'a> {
    imported: &'a ImportedClasses,
    data: &'a ClassData,
}

impl<'a> JavaClass<'a> {
    pub fn name(&self) -> &'a str {
        &self.data.info.binary_name
    }

    pub fn info(&self) -> &'a ClassInfo {
        &self.data.info
    }

    pub fn enclosing(&self) -> Option<&'a EnclosingInfo> {
        self.data.info.enclosing.as_ref()
    }

    pub fn origin(&self) -> ClassOrigin {
        self.data.origin
    }

    pub fn is_from_classpath(&self) -> bool {
        self.data.origin == ClassOrigin::Classpath
    }

    pub fn scope(&self) -> Option<ScopeId> {
        self.data.scope
    }

    /// Declared type parameters in declaration order.
    pub fn type_parameters(&self) -> Vec<JavaTypeParameter<'a>> {
        type_parameters(&self.imported.store, self.data.scope)
    }

    pub fn type_parameter(&self, name: &str) -> Option<JavaTypeParameter<'a>> {
        self.type_parameters().into_iter().find(|p| p.name() == name)
    }

    pub fn superclass(&self) -> Option<&'a JavaType> {
        self.data.super_class.as_ref()
    }

    pub fn interfaces(&self) -> &'a [JavaType] {
        &self.data.interfaces
    }

    pub fn methods(&self) -> Vec<JavaMethod<'a>> {
        self.data
            .methods
            .iter()
            .map(|data| JavaMethod {
                imported: self.imported,
                data,
            })
            .collect()
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<JavaMethod<'a>> {
        self.methods()
            .into_iter()
            .find(|m| m.name() == name && m.descriptor() == descriptor)
    }
}

impl std::fmt::Debug for JavaClass<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JavaClass")
            .field("name", &self.name())
            .field("origin", &self.origin())
            .finish()
    }
}

#[derive(Clone, Copy)]
pub struct JavaMethod<'a> {
    imported: &'a ImportedClasses,
    data: &'a MethodData,
}

impl<'a> JavaMethod<'a> {
    pub fn name(&self) -> &'a str {
        &self.data.info.name
    }

    pub fn descriptor(&self) -> &'a str {
        &self.data.info.descriptor
    }

    pub fn scope(&self) -> Option<ScopeId> {
        self.data.scope
    }

    pub fn type_parameters(&self) -> Vec<JavaTypeParameter<'a>> {
        type_parameters(&self.imported.store, self.data.scope)
    }

    pub fn type_parameter(&self, name: &str) -> Option<JavaTypeParameter<'a>> {
        self.type_parameters().into_iter().find(|p| p.name() == name)
    }

    pub fn parameter_types(&self) -> &'a [JavaType] {
        &self.data.parameter_types
    }

    /// `None` for `void`.
    pub fn return_type(&self) -> Option<&'a JavaType> {
        self.data.return_type.as_ref()
    }

    pub fn throws_types(&self) -> &'a [JavaType] {
        &self.data.throws_types
    }
}

impl std::fmt::Debug for JavaMethod<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JavaMethod")
            .field("name", &self.name())
            .field("descriptor", &self.descriptor())
            .finish()
    }
}

/// A declared type parameter together with its resolved bounds.
#[derive(Clone, Copy)]
pub struct JavaTypeParameter<'a> {
    store: &'a TypeStore,
    scope: ScopeId,
    def: &'a TypeParamDef,
}

impl<'a> JavaTypeParameter<'a> {
    pub fn name(&self) -> &'a str {
        &self.def.name
    }

    /// Never empty.
    pub fn bounds(&self) -> &'a [JavaType] {
        &self.def.bounds
    }

    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn owner(&self) -> Option<&'a ScopeOwner> {
        self.store.scope(self.scope).map(|def| &def.owner)
    }

    /// The variable other types use to refer to this parameter.
    pub fn as_type_variable(&self) -> TypeVariable {
        TypeVariable::declared(&self.def.name, self.scope)
    }
}

impl std::fmt::Debug for JavaTypeParameter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JavaTypeParameter")
            .field("name", &self.name())
            .field("scope", &self.scope)
            .field("bounds", &self.bounds())
            .finish()
    }
}

fn type_parameters(store: &TypeStore, scope: Option<ScopeId>) -> Vec<JavaTypeParameter<'_>> {
    let Some(scope) = scope else {
        return Vec::new();
    };
    store
        .type_params(scope)
        .iter()
        .map(|def| JavaTypeParameter { store, scope, def })
        .collect()
}
