use archsig_classfile::ClassFile;

const ACC_STATIC: u16 = 0x0008;

/// Identifies a method within its declaring class.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub name: String,
    pub descriptor: String,
}

impl MethodKey {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
        }
    }
}

/// Lexical enclosing context of a nested, local or anonymous class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnclosingInfo {
    /// Binary name of the enclosing class.
    pub class: String,
    /// Set for local and anonymous classes declared inside a method body.
    pub method: Option<MethodKey>,
    /// A static member class cannot see the type parameters of the classes around it.
    pub is_static: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodInfo {
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn key(&self) -> MethodKey {
        MethodKey::new(&self.name, &self.descriptor)
    }
}

/// The metadata the importer needs from one class: its raw generic signatures and its enclosing
/// linkage. All names are binary names (`com.example.Outer$Inner`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassInfo {
    pub binary_name: String,
    pub signature: Option<String>,
    /// Erased superclass, used when the class carries no usable signature.
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub enclosing: Option<EnclosingInfo>,
    pub methods: Vec<MethodInfo>,
}

impl ClassInfo {
    pub fn new(binary_name: impl Into<String>) -> Self {
        Self {
            binary_name: binary_name.into(),
            signature: None,
            super_class: None,
            interfaces: Vec::new(),
            enclosing: None,
            methods: Vec::new(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_super_class(mut self, super_class: impl Into<String>) -> Self {
        self.super_class = Some(super_class.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Mark this class as an inner (non-static member) class of `outer`.
    pub fn nested_in(mut self, outer: impl Into<String>) -> Self {
        self.enclosing = Some(EnclosingInfo {
            class: outer.into(),
            method: None,
            is_static: false,
        });
        self
    }

    /// Mark this class as a static member class of `outer`.
    pub fn static_nested_in(mut self, outer: impl Into<String>) -> Self {
        self.enclosing = Some(EnclosingInfo {
            class: outer.into(),
            method: None,
            is_static: true,
        });
        self
    }

    /// Mark this class as local to (or anonymous inside) the method `name` of `outer`.
    pub fn local_in(
        mut self,
        outer: impl Into<String>,
        name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        self.enclosing = Some(EnclosingInfo {
            class: outer.into(),
            method: Some(MethodKey::new(name, descriptor)),
            is_static: false,
        });
        self
    }

    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn from_classfile(class: &ClassFile) -> Self {
        let enclosing = match &class.enclosing_method {
            Some(enclosing) => Some(EnclosingInfo {
                class: internal_to_binary(&enclosing.class),
                method: enclosing
                    .method
                    .as_ref()
                    .map(|(name, descriptor)| MethodKey::new(name, descriptor)),
                is_static: false,
            }),
            None => class.enclosing_class().map(|outer| EnclosingInfo {
                class: internal_to_binary(outer),
                method: None,
                is_static: class.inner_classes.iter().any(|inner| {
                    inner.inner_class == class.this_class && inner.access_flags & ACC_STATIC != 0
                }),
            }),
        };

        Self {
            binary_name: internal_to_binary(&class.this_class),
            signature: class.signature.clone(),
            super_class: class.super_class.as_deref().map(internal_to_binary),
            interfaces: class
                .interfaces
                .iter()
                .map(|name| internal_to_binary(name))
                .collect(),
            enclosing,
            methods: class
                .methods
                .iter()
                .map(|m| MethodInfo {
                    name: m.name.clone(),
                    descriptor: m.descriptor.clone(),
                    signature: m.signature.clone(),
                })
                .collect(),
        }
    }
}

pub(crate) fn internal_to_binary(internal: &str) -> String {
    internal.replace('/', ".")
}

pub(crate) fn binary_to_internal(binary: &str) -> String {
    binary.replace('.', "/")
}
