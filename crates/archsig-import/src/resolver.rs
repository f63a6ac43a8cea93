use archsig_classfile::{
    ClassTypeSignature, FieldType, ReferenceTypeSignature, TypeArgument, TypeParameter,
    TypeSignature,
};
use archsig_types::{
    ClassOrigin, ClassRef, JavaType, ScopeChain, TypeStore, TypeVariable, WildcardType, OBJECT,
};

use crate::class_info::internal_to_binary;
use crate::classpath::ClassPool;

/// What the resolver needs from its surroundings: the scopes declared so far and a way to turn
/// class names into references.
pub trait ClassLookup {
    fn store(&self) -> &TypeStore;

    /// A reference to `binary_name`. Classes that cannot be found resolve to
    /// [`ClassOrigin::Unresolved`] instead of failing.
    fn class_ref(&mut self, binary_name: &str) -> ClassRef;
}

/// Looks classes up in a fixed pool and never loads anything.
pub struct PoolLookup<'a> {
    store: &'a TypeStore,
    pool: &'a dyn ClassPool,
}

impl<'a> PoolLookup<'a> {
    pub fn new(store: &'a TypeStore, pool: &'a dyn ClassPool) -> Self {
        Self { store, pool }
    }
}

impl ClassLookup for PoolLookup<'_> {
    fn store(&self) -> &TypeStore {
        self.store
    }

    fn class_ref(&mut self, binary_name: &str) -> ClassRef {
        let origin = if self.pool.lookup(binary_name).is_some() {
            ClassOrigin::Imported
        } else {
            ClassOrigin::Unresolved
        };
        ClassRef::new(binary_name, origin)
    }
}

/// Turns signature syntax into [`JavaType`]s as seen from one lexical position.
///
/// Type variables bind to the nearest scope of `chain` declaring them, or become stubs. The
/// resolver never defines bounds itself; callers hand the results of
/// [`SignatureResolver::type_parameter_bounds`] to [`TypeStore::define_bounds`].
pub struct SignatureResolver<'a, L: ?Sized> {
    lookup: &'a mut L,
    chain: &'a ScopeChain,
}

impl<'a, L: ClassLookup + ?Sized> SignatureResolver<'a, L> {
    pub fn new(lookup: &'a mut L, chain: &'a ScopeChain) -> Self {
        Self { lookup, chain }
    }

    /// Bounds of `param` in declaration order; `java.lang.Object` when none are declared.
    pub fn type_parameter_bounds(&mut self, param: &TypeParameter) -> Vec<JavaType> {
        let mut bounds: Vec<JavaType> = param
            .bounds()
            .map(|bound| self.reference_type(bound))
            .collect();
        if bounds.is_empty() {
            bounds.push(JavaType::Class(self.lookup.class_ref(OBJECT)));
        }
        bounds
    }

    pub fn java_type(&mut self, sig: &TypeSignature) -> JavaType {
        match sig {
            TypeSignature::Base(base) => JavaType::Class(ClassRef::primitive(*base)),
            TypeSignature::Reference(reference) => self.reference_type(reference),
        }
    }

    pub fn reference_type(&mut self, sig: &ReferenceTypeSignature) -> JavaType {
        match sig {
            ReferenceTypeSignature::Class(class) => self.class_type(class),
            ReferenceTypeSignature::TypeVariable(name) => JavaType::TypeVar(self.type_variable(name)),
            ReferenceTypeSignature::Array {
                dimensions,
                component,
            } => {
                let component = self.java_type(component);
                JavaType::array_of(component, *dimensions)
            }
        }
    }

    /// Raw uses of a class stay concrete; only the innermost segment's arguments are kept.
    pub fn class_type(&mut self, sig: &ClassTypeSignature) -> JavaType {
        let raw = self.lookup.class_ref(&sig.binary_name());
        let args = sig.type_arguments();
        if args.is_empty() {
            return JavaType::Class(raw);
        }
        let type_arguments = args.iter().map(|arg| self.type_argument(arg)).collect();
        JavaType::parameterized(raw, type_arguments)
    }

    pub fn type_argument(&mut self, arg: &TypeArgument) -> JavaType {
        match arg {
            TypeArgument::Any => JavaType::Wildcard(WildcardType::unbounded()),
            TypeArgument::Exact(ty) => self.reference_type(ty),
            TypeArgument::Extends(ty) => {
                JavaType::Wildcard(WildcardType::extends(self.reference_type(ty)))
            }
            TypeArgument::Super(ty) => {
                JavaType::Wildcard(WildcardType::super_of(self.reference_type(ty)))
            }
        }
    }

    /// Erased descriptor types, for members without a generic signature.
    pub fn field_type(&mut self, ty: &FieldType) -> JavaType {
        match ty {
            FieldType::Base(base) => JavaType::Class(ClassRef::primitive(*base)),
            FieldType::Object(internal) => {
                JavaType::Class(self.lookup.class_ref(&internal_to_binary(internal)))
            }
            FieldType::Array(component) => {
                let component = self.field_type(component);
                JavaType::array_of(component, 1)
            }
        }
    }

    fn type_variable(&mut self, name: &str) -> TypeVariable {
        match self.chain.resolve(self.lookup.store(), name) {
            Some(scope) => TypeVariable::declared(name, scope),
            None => {
                tracing::debug!(
                    target: "archsig.import",
                    variable = name,
                    "no enclosing scope declares type variable; using a stub"
                );
                TypeVariable::stub(name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::InMemoryClasspath;
    use crate::ClassInfo;
    use archsig_classfile::{parse_class_signature, parse_field_signature, BaseType};
    use archsig_types::ScopeOwner;
    use pretty_assertions::assert_eq;

    fn pool() -> InMemoryClasspath {
        [
            ClassInfo::new("java.lang.Object"),
            ClassInfo::new("java.lang.String"),
            ClassInfo::new("java.util.List"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn binds_variables_through_the_chain_and_stubs_the_rest() {
        let pool = pool();
        let mut store = TypeStore::new();
        let scope = store
            .declare_scope(ScopeOwner::class("com.example.Foo"), ["T"])
            .unwrap();
        let chain = ScopeChain::root().nested(scope);

        let mut lookup = PoolLookup::new(&store, &pool);
        let mut resolver = SignatureResolver::new(&mut lookup, &chain);

        let sig = parse_field_signature("Ljava/util/List<TT;>;").unwrap();
        assert_eq!(
            resolver.reference_type(&sig),
            JavaType::parameterized(
                ClassRef::new("java.util.List", ClassOrigin::Imported),
                vec![JavaType::TypeVar(TypeVariable::declared("T", scope))],
            )
        );

        let sig = parse_field_signature("[[TU;").unwrap();
        let resolved = resolver.reference_type(&sig);
        assert_eq!(resolved.name(), "U[][]");
        assert!(resolved.contains_stub());
    }

    #[test]
    fn unbounded_parameters_get_object_and_arrays_collapse() {
        let pool = pool();
        let store = TypeStore::new();
        let chain = ScopeChain::root();
        let mut lookup = PoolLookup::new(&store, &pool);
        let mut resolver = SignatureResolver::new(&mut lookup, &chain);

        let sig = parse_class_signature(
            "<A:Ljava/lang/Object;B:[[Ljava/lang/String;C::Ljava/io/Serializable;>Ljava/lang/Object;",
        )
        .unwrap();
        let bounds: Vec<Vec<JavaType>> = sig
            .type_parameters
            .iter()
            .map(|p| resolver.type_parameter_bounds(p))
            .collect();

        assert_eq!(
            bounds,
            vec![
                vec![JavaType::class(OBJECT, ClassOrigin::Imported)],
                vec![JavaType::Class(
                    ClassRef::new("java.lang.String", ClassOrigin::Imported).with_dimensions(2)
                )],
                vec![JavaType::class("java.io.Serializable", ClassOrigin::Unresolved)],
            ]
        );

        let int_array = resolver.field_type(&FieldType::Array(Box::new(FieldType::Array(
            Box::new(FieldType::Base(BaseType::Int)),
        ))));
        assert_eq!(
            int_array,
            JavaType::Class(ClassRef::primitive(BaseType::Int).with_dimensions(2))
        );
    }
}
