use std::fmt;

use archsig_classfile::BaseType;

use crate::store::ScopeId;

/// The implicit bound of a type parameter declared without one.
pub const OBJECT: &str = "java.lang.Object";

/// Where a concrete class reference was resolved from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassOrigin {
    Primitive,
    /// Part of the import batch.
    Imported,
    /// Loaded on demand from the classpath.
    Classpath,
    /// Neither in the batch nor on the classpath; only the name is known.
    Unresolved,
}

/// A concrete, non-generic class, possibly as an array.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassRef {
    /// Binary name of the element type, e.g. `java.util.Map$Entry` or `int`.
    pub name: String,
    pub dimensions: usize,
    pub origin: ClassOrigin,
}

impl ClassRef {
    pub fn new(name: impl Into<String>, origin: ClassOrigin) -> Self {
        Self {
            name: name.into(),
            dimensions: 0,
            origin,
        }
    }

    pub fn primitive(base: BaseType) -> Self {
        Self::new(base.java_name(), ClassOrigin::Primitive)
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn is_array(&self) -> bool {
        self.dimensions > 0
    }

    pub fn is_primitive(&self) -> bool {
        self.origin == ClassOrigin::Primitive
    }

    /// Canonical name including array markers, e.g. `java.lang.String[][]`.
    pub fn name(&self) -> String {
        let mut out = self.name.clone();
        push_array_markers(&mut out, self.dimensions);
        out
    }

    fn write_signature(&self, out: &mut String) {
        for _ in 0..self.dimensions {
            out.push('[');
        }
        match BaseType::from_java_name(&self.name).filter(|_| self.is_primitive()) {
            Some(base) => out.push(base.descriptor_char()),
            None => {
                out.push('L');
                out.push_str(&self.name.replace('.', "/"));
                out.push(';');
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParameterizedType {
    /// The generic class; never an array.
    pub raw: ClassRef,
    pub type_arguments: Vec<JavaType>,
}

/// A reference to a type parameter by declaring scope and name.
///
/// Bounds are looked up through [`crate::TypeStore::bounds_of`]. A variable whose declaring
/// scope could not be determined has `scope: None` and is called a stub.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeVariable {
    pub name: String,
    pub scope: Option<ScopeId>,
}

impl TypeVariable {
    pub fn declared(name: impl Into<String>, scope: ScopeId) -> Self {
        Self {
            name: name.into(),
            scope: Some(scope),
        }
    }

    pub fn stub(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: None,
        }
    }

    pub fn is_stub(&self) -> bool {
        self.scope.is_none()
    }
}

/// `?`, `? extends X` or `? super X`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct WildcardType {
    pub upper_bounds: Vec<JavaType>,
    pub lower_bounds: Vec<JavaType>,
}

impl WildcardType {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn extends(bound: JavaType) -> Self {
        Self {
            upper_bounds: vec![bound],
            lower_bounds: Vec::new(),
        }
    }

    pub fn super_of(bound: JavaType) -> Self {
        Self {
            upper_bounds: Vec::new(),
            lower_bounds: vec![bound],
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.upper_bounds.is_empty() && self.lower_bounds.is_empty()
    }
}

/// An array whose element type is generic, e.g. `T[][]` or `List<String>[]`.
///
/// Built through [`JavaType::array_of`], which keeps `element` free of arrays and collapses
/// arrays of concrete classes into [`ClassRef`]s.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericArrayType {
    element: Box<JavaType>,
    dimensions: usize,
}

impl GenericArrayType {
    /// The innermost, non-array type.
    pub fn element(&self) -> &JavaType {
        &self.element
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The type with one dimension less, e.g. `T[]` for `T[][]`.
    pub fn component_type(&self) -> JavaType {
        if self.dimensions == 1 {
            (*self.element).clone()
        } else {
            JavaType::GenericArray(GenericArrayType {
                element: self.element.clone(),
                dimensions: self.dimensions - 1,
            })
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JavaType {
    Class(ClassRef),
    Parameterized(ParameterizedType),
    TypeVar(TypeVariable),
    Wildcard(WildcardType),
    GenericArray(GenericArrayType),
}

impl JavaType {
    pub fn class(name: impl Into<String>, origin: ClassOrigin) -> Self {
        JavaType::Class(ClassRef::new(name, origin))
    }

    pub fn parameterized(raw: ClassRef, type_arguments: Vec<JavaType>) -> Self {
        JavaType::Parameterized(ParameterizedType {
            raw,
            type_arguments,
        })
    }

    /// `component` with `dimensions` more array dimensions.
    ///
    /// Nested arrays are merged, and arrays of concrete classes become a single [`ClassRef`], so
    /// `String[]` wrapped once more and `String` wrapped twice yield the same value.
    pub fn array_of(component: JavaType, dimensions: usize) -> JavaType {
        if dimensions == 0 {
            return component;
        }
        match component {
            JavaType::Class(class) => {
                let total = class.dimensions + dimensions;
                JavaType::Class(class.with_dimensions(total))
            }
            JavaType::GenericArray(array) => JavaType::GenericArray(GenericArrayType {
                element: array.element,
                dimensions: array.dimensions + dimensions,
            }),
            element => JavaType::GenericArray(GenericArrayType {
                element: Box::new(element),
                dimensions,
            }),
        }
    }

    /// The canonical name used to match bounds by name.
    ///
    /// Classes and parameterized types use the raw binary name, type variables their declared
    /// name, and generic arrays the full component rendering followed by `[]` per dimension.
    pub fn name(&self) -> String {
        match self {
            JavaType::Class(class) => class.name(),
            JavaType::Parameterized(p) => p.raw.name(),
            JavaType::TypeVar(var) => var.name.clone(),
            JavaType::Wildcard(wildcard) => {
                if let Some(upper) = wildcard.upper_bounds.first() {
                    format!("? extends {}", upper.name())
                } else if let Some(lower) = wildcard.lower_bounds.first() {
                    format!("? super {}", lower.name())
                } else {
                    "?".to_string()
                }
            }
            JavaType::GenericArray(array) => {
                let mut out = array.element.display();
                push_array_markers(&mut out, array.dimensions);
                out
            }
        }
    }

    /// Java source rendering including type arguments, e.g.
    /// `java.util.Map<? extends T, java.lang.String[]>`.
    pub fn display(&self) -> String {
        self.to_string()
    }

    /// Render as a JVM signature that the signature parser accepts again.
    ///
    /// Wildcards render in their type-argument form (`*`, `+X`, `-X`).
    pub fn to_signature(&self) -> String {
        let mut out = String::new();
        self.write_signature(&mut out);
        out
    }

    fn write_signature(&self, out: &mut String) {
        match self {
            JavaType::Class(class) => class.write_signature(out),
            JavaType::Parameterized(p) => {
                out.push('L');
                out.push_str(&p.raw.name.replace('.', "/"));
                if !p.type_arguments.is_empty() {
                    out.push('<');
                    for arg in &p.type_arguments {
                        arg.write_signature(out);
                    }
                    out.push('>');
                }
                out.push(';');
            }
            JavaType::TypeVar(var) => {
                out.push('T');
                out.push_str(&var.name);
                out.push(';');
            }
            JavaType::Wildcard(wildcard) => {
                if let Some(upper) = wildcard.upper_bounds.first() {
                    out.push('+');
                    upper.write_signature(out);
                } else if let Some(lower) = wildcard.lower_bounds.first() {
                    out.push('-');
                    lower.write_signature(out);
                } else {
                    out.push('*');
                }
            }
            JavaType::GenericArray(array) => {
                for _ in 0..array.dimensions {
                    out.push('[');
                }
                array.element.write_signature(out);
            }
        }
    }

    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            JavaType::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_parameterized(&self) -> Option<&ParameterizedType> {
        match self {
            JavaType::Parameterized(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_type_var(&self) -> Option<&TypeVariable> {
        match self {
            JavaType::TypeVar(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_wildcard(&self) -> Option<&WildcardType> {
        match self {
            JavaType::Wildcard(wildcard) => Some(wildcard),
            _ => None,
        }
    }

    pub fn as_generic_array(&self) -> Option<&GenericArrayType> {
        match self {
            JavaType::GenericArray(array) => Some(array),
            _ => None,
        }
    }

    /// Whether this type mentions a stub type variable anywhere.
    pub fn contains_stub(&self) -> bool {
        match self {
            JavaType::Class(_) => false,
            JavaType::Parameterized(p) => p.type_arguments.iter().any(JavaType::contains_stub),
            JavaType::TypeVar(var) => var.is_stub(),
            JavaType::Wildcard(w) => w
                .upper_bounds
                .iter()
                .chain(&w.lower_bounds)
                .any(JavaType::contains_stub),
            JavaType::GenericArray(array) => array.element.contains_stub(),
        }
    }
}

impl fmt::Display for JavaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JavaType::Class(class) => f.write_str(&class.name()),
            JavaType::Parameterized(p) => {
                f.write_str(&p.raw.name)?;
                if !p.type_arguments.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in p.type_arguments.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            JavaType::TypeVar(var) => f.write_str(&var.name),
            JavaType::Wildcard(wildcard) => {
                f.write_str("?")?;
                if let Some(upper) = wildcard.upper_bounds.first() {
                    write!(f, " extends {upper}")?;
                }
                if let Some(lower) = wildcard.lower_bounds.first() {
                    write!(f, " super {lower}")?;
                }
                Ok(())
            }
            JavaType::GenericArray(_) => f.write_str(&self.name()),
        }
    }
}

fn push_array_markers(out: &mut String, dimensions: usize) {
    for _ in 0..dimensions {
        out.push_str("[]");
    }
}
