#![allow(dead_code)]

use archsig_import::{
    ClassImporter, ClassInfo, ImportOptions, ImportedClasses, InMemoryClasspath, MethodInfo,
};
use archsig_types::{JavaType, TypeVariable};

pub const OBJECT_SIGNATURE: &str = "Ljava/lang/Object;";

/// The slice of the JDK the tests reference, with the generic signatures the real classes carry.
pub fn minimal_jdk() -> InMemoryClasspath {
    let one_param = "<T:Ljava/lang/Object;>Ljava/lang/Object;";
    [
        ClassInfo::new("java.lang.Object"),
        ClassInfo::new("java.lang.String")
            .with_super_class("java.lang.Object")
            .with_signature(
                "Ljava/lang/Object;Ljava/io/Serializable;Ljava/lang/Comparable<Ljava/lang/String;>;Ljava/lang/CharSequence;",
            ),
        ClassInfo::new("java.lang.System").with_super_class("java.lang.Object"),
        ClassInfo::new("java.lang.Number")
            .with_super_class("java.lang.Object")
            .with_interface("java.io.Serializable"),
        ClassInfo::new("java.lang.Integer")
            .with_super_class("java.lang.Number")
            .with_signature("Ljava/lang/Number;Ljava/lang/Comparable<Ljava/lang/Integer;>;"),
        ClassInfo::new("java.lang.Long")
            .with_super_class("java.lang.Number")
            .with_signature("Ljava/lang/Number;Ljava/lang/Comparable<Ljava/lang/Long;>;"),
        ClassInfo::new("java.lang.Runnable"),
        ClassInfo::new("java.lang.CharSequence"),
        ClassInfo::new("java.lang.Comparable")
            .with_signature(one_param)
            .with_method(
                MethodInfo::new("compareTo", "(Ljava/lang/Object;)I").with_signature("(TT;)I"),
            ),
        ClassInfo::new("java.lang.Iterable").with_signature(one_param),
        ClassInfo::new("java.io.Serializable"),
        ClassInfo::new("java.io.Closeable"),
        ClassInfo::new("java.io.File")
            .with_super_class("java.lang.Object")
            .with_signature(
                "Ljava/lang/Object;Ljava/io/Serializable;Ljava/lang/Comparable<Ljava/io/File;>;",
            ),
        ClassInfo::new("java.util.Collection")
            .with_signature("<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Iterable<TE;>;"),
        ClassInfo::new("java.util.List")
            .with_signature("<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/Collection<TE;>;"),
        ClassInfo::new("java.util.Set")
            .with_signature("<E:Ljava/lang/Object;>Ljava/lang/Object;Ljava/util/Collection<TE;>;"),
        ClassInfo::new("java.util.Map")
            .with_signature("<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/lang/Object;"),
        ClassInfo::new("java.util.Map$Entry")
            .nested_in("java.util.Map")
            .with_signature("<K:Ljava/lang/Object;V:Ljava/lang/Object;>Ljava/lang/Object;"),
        ClassInfo::new("java.lang.ref.Reference")
            .with_super_class("java.lang.Object")
            .with_signature(one_param),
        ClassInfo::new("java.util.function.Function")
            .with_signature("<T:Ljava/lang/Object;R:Ljava/lang/Object;>Ljava/lang/Object;"),
    ]
    .into_iter()
    .collect()
}

pub fn import_with_classpath(
    classpath: &InMemoryClasspath,
    classes: impl IntoIterator<Item = ClassInfo>,
) -> ImportedClasses {
    ClassImporter::new(ImportOptions::default(), classpath).import(classes)
}

/// Import against [`minimal_jdk`] with classpath resolution enabled.
pub fn import(classes: impl IntoIterator<Item = ClassInfo>) -> ImportedClasses {
    import_with_classpath(&minimal_jdk(), classes)
}

/// Import with classpath resolution disabled.
pub fn import_batch_only(classes: impl IntoIterator<Item = ClassInfo>) -> ImportedClasses {
    let options = ImportOptions {
        resolve_missing_dependencies_from_classpath: false,
    };
    ClassImporter::new(options, &minimal_jdk()).import(classes)
}

/// A class with only a class signature.
pub fn generic_class(name: &str, signature: &str) -> ClassInfo {
    ClassInfo::new(name)
        .with_super_class("java.lang.Object")
        .with_signature(signature)
}

/// Renders `ty` with type variables expanded to their bounds, e.g. `U{T{java.lang.String}}`.
///
/// Stubs render as `T{stub}`. A variable already being expanded renders as its bare name.
pub fn describe(imported: &ImportedClasses, ty: &JavaType) -> String {
    let mut expanding = Vec::new();
    let mut out = String::new();
    write_description(imported, ty, &mut expanding, &mut out);
    out
}

fn write_description(
    imported: &ImportedClasses,
    ty: &JavaType,
    expanding: &mut Vec<TypeVariable>,
    out: &mut String,
) {
    match ty {
        JavaType::Class(class) => out.push_str(&class.name()),
        JavaType::Parameterized(p) => {
            out.push_str(&p.raw.name);
            out.push('<');
            for (i, arg) in p.type_arguments.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_description(imported, arg, expanding, out);
            }
            out.push('>');
        }
        JavaType::TypeVar(var) => {
            out.push_str(&var.name);
            if var.is_stub() {
                out.push_str("{stub}");
                return;
            }
            if expanding.contains(var) {
                return;
            }
            expanding.push(var.clone());
            out.push('{');
            for (i, bound) in imported.bounds_of(var).iter().enumerate() {
                if i > 0 {
                    out.push_str(" & ");
                }
                write_description(imported, bound, expanding, out);
            }
            out.push('}');
            expanding.pop();
        }
        JavaType::Wildcard(wildcard) => {
            out.push('?');
            if let Some(upper) = wildcard.upper_bounds.first() {
                out.push_str(" extends ");
                write_description(imported, upper, expanding, out);
            }
            if let Some(lower) = wildcard.lower_bounds.first() {
                out.push_str(" super ");
                write_description(imported, lower, expanding, out);
            }
        }
        JavaType::GenericArray(array) => {
            write_description(imported, array.element(), expanding, out);
            for _ in 0..array.dimensions() {
                out.push_str("[]");
            }
        }
    }
}

/// Described bounds of type parameter `param` of `class`.
pub fn bounds(imported: &ImportedClasses, class: &str, param: &str) -> Vec<String> {
    let class = imported
        .get(class)
        .unwrap_or_else(|| panic!("{class} was not imported"));
    let param = class
        .type_parameter(param)
        .unwrap_or_else(|| panic!("{} declares no type parameter {param}", class.name()));
    param
        .bounds()
        .iter()
        .map(|bound| describe(imported, bound))
        .collect()
}

/// Bounds of `param` rendered without expanding type variables.
pub fn shallow_bounds(imported: &ImportedClasses, class: &str, param: &str) -> Vec<String> {
    imported
        .get(class)
        .and_then(|class| class.type_parameter(param))
        .map(|param| param.bounds().iter().map(JavaType::display).collect())
        .unwrap_or_default()
}

pub fn type_parameter_names(imported: &ImportedClasses, class: &str) -> Vec<String> {
    imported
        .get(class)
        .map(|class| {
            class
                .type_parameters()
                .iter()
                .map(|p| p.name().to_string())
                .collect()
        })
        .unwrap_or_default()
}
