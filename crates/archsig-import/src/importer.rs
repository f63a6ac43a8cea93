use std::collections::{HashMap, HashSet, VecDeque};

use archsig_classfile::{
    parse_class_signature, parse_method_descriptor, parse_method_signature, ClassSignature,
    MethodSignature, ReturnType, TypeParameter,
};
use archsig_types::{
    ClassOrigin, ClassRef, Diagnostic, JavaType, ScopeChain, ScopeId, ScopeOwner, TypeStore,
};

use crate::class_info::{ClassInfo, MethodInfo};
use crate::classpath::ClasspathProvider;
use crate::model::{ClassData, ImportedClasses, MethodData};
use crate::resolver::{ClassLookup, SignatureResolver};

pub const MALFORMED_SIGNATURE: &str = "malformed-signature";
pub const MALFORMED_DESCRIPTOR: &str = "malformed-descriptor";
pub const INVALID_TYPE_PARAMETERS: &str = "invalid-type-parameters";
pub const DUPLICATE_CLASS: &str = "duplicate-class";

/// Per-import settings, passed explicitly to every import.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    /// Load classes outside the batch from the classpath when a signature or an enclosing chain
    /// needs them. When disabled, type variables declared outside the batch become stubs.
    pub resolve_missing_dependencies_from_classpath: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            resolve_missing_dependencies_from_classpath: true,
        }
    }
}

/// Imports batches of classes and resolves their generic signatures.
pub struct ClassImporter<'a> {
    options: ImportOptions,
    classpath: &'a dyn ClasspathProvider,
}

impl<'a> ClassImporter<'a> {
    pub fn new(options: ImportOptions, classpath: &'a dyn ClasspathProvider) -> Self {
        Self { options, classpath }
    }

    pub fn options(&self) -> ImportOptions {
        self.options
    }

    /// Import `classes` as one batch.
    ///
    /// Scopes for every batch class and generic method are declared before any bound is
    /// resolved, so references between batch classes resolve regardless of order.
    pub fn import(&self, classes: impl IntoIterator<Item = ClassInfo>) -> ImportedClasses {
        let mut session = ImportSession::new(self.options, self.classpath);
        for class in classes {
            session.declare_batch_class(class);
        }
        let batch_size = session.classes.len();
        session.resolve_all();
        tracing::debug!(
            target: "archsig.import",
            batch = batch_size,
            from_classpath = session.classes.len() - batch_size,
            diagnostics = session.diagnostics.len(),
            "imported class batch"
        );
        session.finish()
    }
}

struct ClassEntry {
    data: ClassData,
    signature: Option<ClassSignature>,
    /// Parallel to `data.methods`.
    method_signatures: Vec<Option<MethodSignature>>,
}

struct ImportSession<'a> {
    options: ImportOptions,
    classpath: &'a dyn ClasspathProvider,
    store: TypeStore,
    classes: Vec<ClassEntry>,
    index: HashMap<String, usize>,
    /// Names the classpath was already asked for without success.
    misses: HashSet<String>,
    pending: VecDeque<usize>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ImportSession<'a> {
    fn new(options: ImportOptions, classpath: &'a dyn ClasspathProvider) -> Self {
        Self {
            options,
            classpath,
            store: TypeStore::new(),
            classes: Vec::new(),
            index: HashMap::new(),
            misses: HashSet::new(),
            pending: VecDeque::new(),
            diagnostics: Vec::new(),
        }
    }

    fn declare_batch_class(&mut self, class: ClassInfo) {
        if self.index.contains_key(&class.binary_name) {
            tracing::warn!(
                target: "archsig.import",
                class = %class.binary_name,
                "class appears twice in the import batch; keeping the first"
            );
            self.diagnostics.push(Diagnostic::warning(
                DUPLICATE_CLASS,
                format!("`{}` appears twice in the import batch", class.binary_name),
                Some(class.binary_name),
            ));
            return;
        }
        self.declare(class, ClassOrigin::Imported);
    }

    /// Stage 1 for one class: declare its scope and the scopes of its generic methods, and queue
    /// it for resolution.
    fn declare(&mut self, info: ClassInfo, origin: ClassOrigin) -> usize {
        let class_name = info.binary_name.clone();

        let mut signature = match info.signature.as_deref() {
            Some(raw) => match parse_class_signature(raw) {
                Ok(sig) => Some(sig),
                Err(err) => {
                    self.malformed_signature(&class_name, &class_name, &err);
                    None
                }
            },
            None => None,
        };
        let params = signature
            .as_ref()
            .map(|sig| sig.type_parameters.as_slice())
            .unwrap_or(&[]);
        let scope = self.declare_scope(ScopeOwner::class(&class_name), params);
        if scope.is_none() {
            signature = None;
        }

        let mut methods = Vec::with_capacity(info.methods.len());
        let mut method_signatures = Vec::with_capacity(info.methods.len());
        for method in &info.methods {
            let (method_scope, method_signature) = self.declare_method(&class_name, method);
            methods.push(MethodData {
                info: method.clone(),
                scope: method_scope,
                parameter_types: Vec::new(),
                return_type: None,
                throws_types: Vec::new(),
            });
            method_signatures.push(method_signature);
        }

        let idx = self.classes.len();
        self.classes.push(ClassEntry {
            data: ClassData {
                info,
                origin,
                scope,
                super_class: None,
                interfaces: Vec::new(),
                methods,
            },
            signature,
            method_signatures,
        });
        self.index.insert(class_name, idx);
        self.pending.push_back(idx);
        idx
    }

    fn declare_method(
        &mut self,
        class_name: &str,
        method: &MethodInfo,
    ) -> (Option<ScopeId>, Option<MethodSignature>) {
        let Some(raw) = method.signature.as_deref() else {
            return (None, None);
        };
        let element = format!("{class_name}.{}{}", method.name, method.descriptor);
        let signature = match parse_method_signature(raw) {
            Ok(sig) => sig,
            Err(err) => {
                self.malformed_signature(class_name, &element, &err);
                return (None, None);
            }
        };
        if signature.type_parameters.is_empty() {
            return (None, Some(signature));
        }

        let owner = ScopeOwner::method(class_name, &method.name, &method.descriptor);
        match self.declare_scope(owner, &signature.type_parameters) {
            Some(scope) => (Some(scope), Some(signature)),
            None => (None, None),
        }
    }

    /// `None` if the parameters cannot be declared; the owner's generics are then dropped.
    fn declare_scope(&mut self, owner: ScopeOwner, params: &[TypeParameter]) -> Option<ScopeId> {
        match self
            .store
            .declare_scope(owner.clone(), params.iter().map(|p| p.name.as_str()))
        {
            Ok(scope) => Some(scope),
            Err(err) => {
                tracing::warn!(
                    target: "archsig.import",
                    owner = %owner,
                    error = %err,
                    "ignoring type parameters"
                );
                self.diagnostics.push(Diagnostic::warning(
                    INVALID_TYPE_PARAMETERS,
                    err.to_string(),
                    Some(owner.class_name().to_string()),
                ));
                None
            }
        }
    }

    fn malformed_signature(
        &mut self,
        class_name: &str,
        element: &str,
        err: &archsig_classfile::Error,
    ) {
        tracing::warn!(
            target: "archsig.import",
            class = class_name,
            error = %err,
            "malformed generic signature; treating {element} as non-generic"
        );
        self.diagnostics.push(Diagnostic::warning(
            MALFORMED_SIGNATURE,
            format!("malformed generic signature on {element}: {err}"),
            Some(class_name.to_string()),
        ));
    }

    /// Stage 2: resolve queued classes until nothing new is loaded.
    fn resolve_all(&mut self) {
        while let Some(idx) = self.pending.pop_front() {
            self.resolve_class(idx);
        }
    }

    fn resolve_class(&mut self, idx: usize) {
        let chain = self.class_chain(idx);
        let scope = self.classes[idx].data.scope;
        let signature = self.classes[idx].signature.clone();

        let (super_class, interfaces) = match (&signature, scope) {
            (Some(sig), Some(scope)) => {
                self.resolve_type_parameters(scope, &sig.type_parameters, &chain);
                let mut resolver = SignatureResolver::new(self, &chain);
                let super_class = resolver.class_type(&sig.super_class);
                let interfaces = sig
                    .interfaces
                    .iter()
                    .map(|i| resolver.class_type(i))
                    .collect();
                (Some(super_class), interfaces)
            }
            _ => {
                let info = &self.classes[idx].data.info;
                let super_name = info.super_class.clone();
                let interface_names = info.interfaces.clone();
                let super_class = super_name.map(|name| JavaType::Class(self.class_ref(&name)));
                let interfaces = interface_names
                    .iter()
                    .map(|name| JavaType::Class(self.class_ref(name)))
                    .collect();
                (super_class, interfaces)
            }
        };
        let entry = &mut self.classes[idx].data;
        entry.super_class = super_class;
        entry.interfaces = interfaces;

        for method_idx in 0..self.classes[idx].data.methods.len() {
            self.resolve_method(idx, method_idx, &chain);
        }
    }

    fn resolve_method(&mut self, idx: usize, method_idx: usize, class_chain: &ScopeChain) {
        let method = &self.classes[idx].data.methods[method_idx];
        let method_scope = method.scope;
        let descriptor = method.info.descriptor.clone();
        let element = format!(
            "{}.{}{}",
            self.classes[idx].data.info.binary_name, method.info.name, descriptor
        );
        let signature = self.classes[idx].method_signatures[method_idx].clone();

        let chain = match method_scope {
            Some(scope) => class_chain.nested(scope),
            None => class_chain.clone(),
        };

        let (parameter_types, return_type, throws_types) = match signature {
            Some(sig) => {
                if let Some(scope) = method_scope {
                    self.resolve_type_parameters(scope, &sig.type_parameters, &chain);
                }
                let mut resolver = SignatureResolver::new(self, &chain);
                let params = sig.parameters.iter().map(|p| resolver.java_type(p)).collect();
                let ret = sig.return_type.as_ref().map(|r| resolver.java_type(r));
                let throws = sig
                    .throws
                    .iter()
                    .map(|t| resolver.reference_type(t))
                    .collect();
                (params, ret, throws)
            }
            None => match parse_method_descriptor(&descriptor) {
                Ok(desc) => {
                    let mut resolver = SignatureResolver::new(self, &chain);
                    let params = desc.params.iter().map(|p| resolver.field_type(p)).collect();
                    let ret = match &desc.return_type {
                        ReturnType::Void => None,
                        ReturnType::Type(ty) => Some(resolver.field_type(ty)),
                    };
                    (params, ret, Vec::new())
                }
                Err(err) => {
                    let class_name = self.classes[idx].data.info.binary_name.clone();
                    self.diagnostics.push(Diagnostic::warning(
                        MALFORMED_DESCRIPTOR,
                        format!("malformed descriptor on {element}: {err}"),
                        Some(class_name),
                    ));
                    (Vec::new(), None, Vec::new())
                }
            },
        };

        let method = &mut self.classes[idx].data.methods[method_idx];
        method.parameter_types = parameter_types;
        method.return_type = return_type;
        method.throws_types = throws_types;
    }

    /// Resolve every parameter against `chain` first and only then complete the placeholders,
    /// so forward references between siblings see declared (if not yet bounded) parameters.
    fn resolve_type_parameters(
        &mut self,
        scope: ScopeId,
        params: &[TypeParameter],
        chain: &ScopeChain,
    ) {
        let mut resolver = SignatureResolver::new(self, chain);
        let resolved: Vec<(String, Vec<JavaType>)> = params
            .iter()
            .map(|param| (param.name.clone(), resolver.type_parameter_bounds(param)))
            .collect();
        for (name, bounds) in resolved {
            self.store.define_bounds(scope, &name, bounds);
        }
    }

    /// Scopes visible inside class `idx`, innermost first: the class, then for each enclosing
    /// level the enclosing method (for local classes) and the enclosing class.
    ///
    /// The walk stops at the first enclosing class that is neither in the batch nor loadable,
    /// leaving variables declared further out unresolved.
    fn class_chain(&mut self, idx: usize) -> ScopeChain {
        let mut scopes = Vec::new();
        let mut visited = HashSet::new();
        let mut current = idx;
        loop {
            let data = &self.classes[current].data;
            if !visited.insert(current) {
                tracing::warn!(
                    target: "archsig.import",
                    class = %data.info.binary_name,
                    "enclosing class chain loops back on itself"
                );
                break;
            }
            scopes.extend(data.scope);

            let Some(enclosing) = data.info.enclosing.clone() else {
                break;
            };
            if enclosing.is_static {
                break;
            }
            let Some(outer) = self.ensure_class(&enclosing.class) else {
                tracing::debug!(
                    target: "archsig.import",
                    class = %self.classes[current].data.info.binary_name,
                    enclosing = %enclosing.class,
                    "enclosing class not available; scope chain ends here"
                );
                break;
            };
            if let Some(method) = &enclosing.method {
                scopes.extend(self.store.method_scope(
                    &enclosing.class,
                    &method.name,
                    &method.descriptor,
                ));
            }
            current = outer;
        }
        ScopeChain::from_innermost(scopes)
    }

    /// Index of `binary_name`, loading it from the classpath if allowed.
    fn ensure_class(&mut self, binary_name: &str) -> Option<usize> {
        if let Some(&idx) = self.index.get(binary_name) {
            return Some(idx);
        }
        if !self.options.resolve_missing_dependencies_from_classpath
            || self.misses.contains(binary_name)
        {
            return None;
        }

        match self.classpath.load(binary_name) {
            Some(info) if info.binary_name == binary_name => {
                tracing::debug!(
                    target: "archsig.classpath",
                    class = binary_name,
                    "loaded class from classpath"
                );
                Some(self.declare(info, ClassOrigin::Classpath))
            }
            Some(info) => {
                tracing::warn!(
                    target: "archsig.classpath",
                    class = binary_name,
                    found = %info.binary_name,
                    "classpath returned a different class"
                );
                self.misses.insert(binary_name.to_string());
                None
            }
            None => {
                tracing::debug!(
                    target: "archsig.classpath",
                    class = binary_name,
                    "class not found on classpath"
                );
                self.misses.insert(binary_name.to_string());
                None
            }
        }
    }

    fn finish(self) -> ImportedClasses {
        for (_, scope) in self.store.scopes() {
            for param in &scope.params {
                assert!(
                    !param.bounds.is_empty(),
                    "type parameter `{}` of {} was never resolved",
                    param.name,
                    scope.owner
                );
            }
        }
        let classes = self.classes.into_iter().map(|entry| entry.data).collect();
        ImportedClasses::new(self.store, classes, self.diagnostics)
    }
}

impl ClassLookup for ImportSession<'_> {
    fn store(&self) -> &TypeStore {
        &self.store
    }

    fn class_ref(&mut self, binary_name: &str) -> ClassRef {
        match self.ensure_class(binary_name) {
            Some(idx) => ClassRef::new(binary_name, self.classes[idx].data.origin),
            None => {
                tracing::debug!(
                    target: "archsig.import",
                    class = binary_name,
                    "unresolved class reference"
                );
                ClassRef::new(binary_name, ClassOrigin::Unresolved)
            }
        }
    }
}
