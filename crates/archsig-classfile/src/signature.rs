//! Generic signature grammar (JVMS 4.7.9.1).
//!
//! Parsing is purely syntactic: class names are not looked up anywhere, and the only failure mode
//! is [`Error::InvalidSignature`] for input that does not match the grammar. The `Display` impls
//! render the JVM form again, so `parse(s).to_string() == s` for every accepted `s`.

use std::fmt;

use crate::descriptor::{BaseType, MAX_ARRAY_DIMENSIONS};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub super_class: ClassTypeSignature,
    pub interfaces: Vec<ClassTypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<TypeSignature>,
    /// `None` for `void`.
    pub return_type: Option<TypeSignature>,
    pub throws: Vec<ReferenceTypeSignature>,
}

/// A formal type parameter. The grammar only allows the first bound to be a class type, so the
/// class bound is kept apart from the interface bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameter {
    pub name: String,
    pub class_bound: Option<ReferenceTypeSignature>,
    pub interface_bounds: Vec<ReferenceTypeSignature>,
}

impl TypeParameter {
    /// All declared bounds in declaration order.
    pub fn bounds(&self) -> impl Iterator<Item = &ReferenceTypeSignature> {
        self.class_bound.iter().chain(self.interface_bounds.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSignature {
    Base(BaseType),
    Reference(ReferenceTypeSignature),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTypeSignature {
    Class(ClassTypeSignature),
    TypeVariable(String),
    /// `dimensions` counts the leading `[` markers; `component` is never an array itself.
    Array {
        dimensions: usize,
        component: Box<TypeSignature>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTypeSignature {
    /// Internal package prefix without the trailing `/`, e.g. `java/util`. Empty for the default
    /// package.
    pub package: String,
    pub segments: Vec<SimpleClassTypeSignature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleClassTypeSignature {
    pub name: String,
    pub type_arguments: Vec<TypeArgument>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArgument {
    Any,
    Exact(ReferenceTypeSignature),
    Extends(ReferenceTypeSignature),
    Super(ReferenceTypeSignature),
}

impl ClassTypeSignature {
    /// Internal name, e.g. `java/util/Map$Entry`.
    pub fn internal_name(&self) -> String {
        let mut out = String::new();
        if !self.package.is_empty() {
            out.push_str(&self.package);
            out.push('/');
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push('$');
            }
            out.push_str(&segment.name);
        }
        out
    }

    /// Binary name, e.g. `java.util.Map$Entry`.
    pub fn binary_name(&self) -> String {
        self.internal_name().replace('/', ".")
    }

    /// Type arguments of the innermost segment.
    pub fn type_arguments(&self) -> &[TypeArgument] {
        self.segments
            .last()
            .map(|s| s.type_arguments.as_slice())
            .unwrap_or(&[])
    }
}

pub fn parse_class_signature(signature: &str) -> Result<ClassSignature> {
    let mut p = Parser::new(signature);
    let type_parameters = p.parse_type_parameters()?;
    let super_class = p.parse_class_type_signature()?;
    let mut interfaces = Vec::new();
    while !p.at_end() {
        interfaces.push(p.parse_class_type_signature()?);
    }
    Ok(ClassSignature {
        type_parameters,
        super_class,
        interfaces,
    })
}

pub fn parse_method_signature(signature: &str) -> Result<MethodSignature> {
    let mut p = Parser::new(signature);
    let type_parameters = p.parse_type_parameters()?;
    p.expect(b'(', "expected `(`")?;
    let mut parameters = Vec::new();
    while p.peek() != Some(b')') {
        parameters.push(p.parse_type_signature()?);
    }
    p.bump();
    let return_type = if p.eat(b'V') {
        None
    } else {
        Some(p.parse_type_signature()?)
    };
    let mut throws = Vec::new();
    while p.eat(b'^') {
        let thrown = match p.peek() {
            Some(b'T') => p.parse_type_variable()?,
            _ => ReferenceTypeSignature::Class(p.parse_class_type_signature()?),
        };
        throws.push(thrown);
    }
    p.finish()?;
    Ok(MethodSignature {
        type_parameters,
        parameters,
        return_type,
        throws,
    })
}

pub fn parse_field_signature(signature: &str) -> Result<ReferenceTypeSignature> {
    let mut p = Parser::new(signature);
    let ty = p.parse_reference_type_signature()?;
    p.finish()?;
    Ok(ty)
}

/// Deepest nesting of reference types (type arguments, bounds, wildcards) one signature may use.
const MAX_NESTING: usize = 256;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            depth: 0,
        }
    }

    fn error(&self, reason: &'static str) -> Error {
        Error::InvalidSignature {
            signature: self.input.to_string(),
            position: self.pos,
            reason,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, b: u8, reason: &'static str) -> Result<()> {
        if self.eat(b) {
            Ok(())
        } else {
            Err(self.error(reason))
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn finish(&self) -> Result<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error("unexpected trailing input"))
        }
    }

    fn parse_identifier(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'.' | b';' | b'[' | b'/' | b'<' | b'>' | b':') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(&self.input[start..self.pos])
    }

    fn parse_type_parameters(&mut self) -> Result<Vec<TypeParameter>> {
        if !self.eat(b'<') {
            return Ok(Vec::new());
        }
        let mut params = Vec::new();
        while !self.eat(b'>') {
            if self.at_end() {
                return Err(self.error("unterminated type parameter list"));
            }
            params.push(self.parse_type_parameter()?);
        }
        if params.is_empty() {
            return Err(self.error("empty type parameter list"));
        }
        Ok(params)
    }

    fn parse_type_parameter(&mut self) -> Result<TypeParameter> {
        let name = self.parse_identifier()?.to_string();
        self.expect(b':', "expected `:` after type parameter name")?;
        let class_bound = match self.peek() {
            Some(b'L' | b'T' | b'[') => Some(self.parse_reference_type_signature()?),
            _ => None,
        };
        let mut interface_bounds = Vec::new();
        while self.eat(b':') {
            interface_bounds.push(self.parse_reference_type_signature()?);
        }
        Ok(TypeParameter {
            name,
            class_bound,
            interface_bounds,
        })
    }

    fn parse_type_signature(&mut self) -> Result<TypeSignature> {
        if let Some(base) = self.peek().and_then(BaseType::from_descriptor_char) {
            self.pos += 1;
            return Ok(TypeSignature::Base(base));
        }
        Ok(TypeSignature::Reference(
            self.parse_reference_type_signature()?,
        ))
    }

    fn parse_reference_type_signature(&mut self) -> Result<ReferenceTypeSignature> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("type nesting too deep"));
        }
        self.depth += 1;
        let ty = self.parse_reference_type_signature_at_depth();
        self.depth -= 1;
        ty
    }

    fn parse_reference_type_signature_at_depth(&mut self) -> Result<ReferenceTypeSignature> {
        match self.peek() {
            Some(b'L') => Ok(ReferenceTypeSignature::Class(
                self.parse_class_type_signature()?,
            )),
            Some(b'T') => self.parse_type_variable(),
            Some(b'[') => {
                let mut dimensions = 0;
                while self.eat(b'[') {
                    dimensions += 1;
                }
                if dimensions > MAX_ARRAY_DIMENSIONS {
                    return Err(self.error("more than 255 array dimensions"));
                }
                let component = self.parse_type_signature()?;
                Ok(ReferenceTypeSignature::Array {
                    dimensions,
                    component: Box::new(component),
                })
            }
            Some(_) => Err(self.error("expected reference type signature")),
            None => Err(self.error("unexpected end of signature")),
        }
    }

    fn parse_type_variable(&mut self) -> Result<ReferenceTypeSignature> {
        self.expect(b'T', "expected type variable")?;
        let name = self.parse_identifier()?.to_string();
        self.expect(b';', "expected `;` after type variable")?;
        Ok(ReferenceTypeSignature::TypeVariable(name))
    }

    fn parse_class_type_signature(&mut self) -> Result<ClassTypeSignature> {
        self.expect(b'L', "expected class type signature")?;

        let mut package = String::new();
        let mut name = self.parse_identifier()?;
        while self.eat(b'/') {
            if !package.is_empty() {
                package.push('/');
            }
            package.push_str(name);
            name = self.parse_identifier()?;
        }

        let mut segments = vec![SimpleClassTypeSignature {
            name: name.to_string(),
            type_arguments: self.parse_type_arguments()?,
        }];
        while self.eat(b'.') {
            let name = self.parse_identifier()?.to_string();
            segments.push(SimpleClassTypeSignature {
                name,
                type_arguments: self.parse_type_arguments()?,
            });
        }
        self.expect(b';', "expected `;` after class type")?;

        Ok(ClassTypeSignature { package, segments })
    }

    fn parse_type_arguments(&mut self) -> Result<Vec<TypeArgument>> {
        if !self.eat(b'<') {
            return Ok(Vec::new());
        }
        let mut args = Vec::new();
        while !self.eat(b'>') {
            let arg = match self.peek() {
                Some(b'*') => {
                    self.pos += 1;
                    TypeArgument::Any
                }
                Some(b'+') => {
                    self.pos += 1;
                    TypeArgument::Extends(self.parse_reference_type_signature()?)
                }
                Some(b'-') => {
                    self.pos += 1;
                    TypeArgument::Super(self.parse_reference_type_signature()?)
                }
                Some(_) => TypeArgument::Exact(self.parse_reference_type_signature()?),
                None => return Err(self.error("unterminated type argument list")),
            };
            args.push(arg);
        }
        if args.is_empty() {
            return Err(self.error("empty type argument list"));
        }
        Ok(args)
    }
}

fn write_type_parameters(f: &mut fmt::Formatter<'_>, params: &[TypeParameter]) -> fmt::Result {
    if params.is_empty() {
        return Ok(());
    }
    f.write_str("<")?;
    for param in params {
        write!(f, "{param}")?;
    }
    f.write_str(">")
}

impl fmt::Display for TypeParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.name)?;
        if let Some(bound) = &self.class_bound {
            write!(f, "{bound}")?;
        }
        for bound in &self.interface_bounds {
            write!(f, ":{bound}")?;
        }
        Ok(())
    }
}

impl fmt::Display for ClassSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type_parameters(f, &self.type_parameters)?;
        write!(f, "{}", self.super_class)?;
        for iface in &self.interfaces {
            write!(f, "{iface}")?;
        }
        Ok(())
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type_parameters(f, &self.type_parameters)?;
        f.write_str("(")?;
        for param in &self.parameters {
            write!(f, "{param}")?;
        }
        f.write_str(")")?;
        match &self.return_type {
            Some(ty) => write!(f, "{ty}")?,
            None => f.write_str("V")?,
        }
        for thrown in &self.throws {
            write!(f, "^{thrown}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSignature::Base(base) => write!(f, "{}", base.descriptor_char()),
            TypeSignature::Reference(ty) => write!(f, "{ty}"),
        }
    }
}

impl fmt::Display for ReferenceTypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceTypeSignature::Class(class) => write!(f, "{class}"),
            ReferenceTypeSignature::TypeVariable(name) => write!(f, "T{name};"),
            ReferenceTypeSignature::Array {
                dimensions,
                component,
            } => {
                for _ in 0..*dimensions {
                    f.write_str("[")?;
                }
                write!(f, "{component}")
            }
        }
    }
}

impl fmt::Display for ClassTypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("L")?;
        if !self.package.is_empty() {
            write!(f, "{}/", self.package)?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&segment.name)?;
            if !segment.type_arguments.is_empty() {
                f.write_str("<")?;
                for arg in &segment.type_arguments {
                    match arg {
                        TypeArgument::Any => f.write_str("*")?,
                        TypeArgument::Exact(ty) => write!(f, "{ty}")?,
                        TypeArgument::Extends(ty) => write!(f, "+{ty}")?,
                        TypeArgument::Super(ty) => write!(f, "-{ty}")?,
                    }
                }
                f.write_str(">")?;
            }
        }
        f.write_str(";")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(package: &str, name: &str) -> ReferenceTypeSignature {
        ReferenceTypeSignature::Class(ClassTypeSignature {
            package: package.to_string(),
            segments: vec![SimpleClassTypeSignature {
                name: name.to_string(),
                type_arguments: vec![],
            }],
        })
    }

    #[test]
    fn class_signature_without_type_parameters() {
        let sig = parse_class_signature("Ljava/lang/Object;Ljava/io/Serializable;").unwrap();
        assert!(sig.type_parameters.is_empty());
        assert_eq!(sig.super_class.binary_name(), "java.lang.Object");
        assert_eq!(sig.interfaces.len(), 1);
        assert_eq!(sig.interfaces[0].internal_name(), "java/io/Serializable");
    }

    #[test]
    fn type_parameter_bounds_keep_declaration_order() {
        let sig = parse_class_signature(
            "<T:Ljava/lang/String;:Ljava/io/Serializable;:Ljava/lang/Runnable;>Ljava/lang/Object;",
        )
        .unwrap();
        let t = &sig.type_parameters[0];
        assert_eq!(t.name, "T");
        assert_eq!(t.class_bound, Some(class("java/lang", "String")));
        let names: Vec<_> = t.bounds().map(|b| b.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "Ljava/lang/String;",
                "Ljava/io/Serializable;",
                "Ljava/lang/Runnable;"
            ]
        );
    }

    #[test]
    fn interface_only_bound_has_no_class_bound() {
        let sig = parse_class_signature("<T::Ljava/io/Serializable;>Ljava/lang/Object;").unwrap();
        let t = &sig.type_parameters[0];
        assert_eq!(t.class_bound, None);
        assert_eq!(t.interface_bounds, vec![class("java/io", "Serializable")]);
    }

    #[test]
    fn arrays_count_leading_markers() {
        let sig = parse_field_signature("[[[Ljava/lang/String;").unwrap();
        assert_eq!(
            sig,
            ReferenceTypeSignature::Array {
                dimensions: 3,
                component: Box::new(TypeSignature::Reference(class("java/lang", "String"))),
            }
        );

        let sig = parse_field_signature("[[I").unwrap();
        assert_eq!(
            sig,
            ReferenceTypeSignature::Array {
                dimensions: 2,
                component: Box::new(TypeSignature::Base(BaseType::Int)),
            }
        );
    }

    #[test]
    fn deeply_nested_signatures_are_rejected() {
        let hostile = format!(
            "<T:{}Lb;{}>Ljava/lang/Object;",
            "La<".repeat(12_000),
            ">;".repeat(12_000)
        );
        assert!(hostile.len() < usize::from(u16::MAX));
        let err = parse_class_signature(&hostile).unwrap_err();
        assert!(
            matches!(err, Error::InvalidSignature { reason: "type nesting too deep", .. }),
            "{err:?}"
        );

        let deep_but_fine = format!("{}Lb;{}", "La<".repeat(200), ">;".repeat(200));
        assert_eq!(
            parse_field_signature(&deep_but_fine).unwrap().to_string(),
            deep_but_fine
        );
    }

    #[test]
    fn array_dimensions_are_capped() {
        let max = format!("{}I", "[".repeat(255));
        assert!(parse_field_signature(&max).is_ok());
        let over = format!("{}I", "[".repeat(256));
        assert!(matches!(
            parse_field_signature(&over),
            Err(Error::InvalidSignature { .. })
        ));
    }

    #[test]
    fn wildcards_and_inner_class_segments() {
        let sig = parse_field_signature(
            "Lcom/example/Outer<TT;>.Inner<*+Ljava/lang/Number;-TU;>;",
        )
        .unwrap();
        let ReferenceTypeSignature::Class(class_sig) = &sig else {
            panic!("expected class type, got {sig:?}");
        };
        assert_eq!(class_sig.binary_name(), "com.example.Outer$Inner");
        assert_eq!(
            class_sig.segments[0].type_arguments,
            vec![TypeArgument::Exact(ReferenceTypeSignature::TypeVariable(
                "T".to_string()
            ))]
        );
        assert_eq!(
            class_sig.type_arguments(),
            &[
                TypeArgument::Any,
                TypeArgument::Extends(class("java/lang", "Number")),
                TypeArgument::Super(ReferenceTypeSignature::TypeVariable("U".to_string())),
            ]
        );
    }

    #[test]
    fn method_signature_with_throws() {
        let sig = parse_method_signature(
            "<T:Ljava/lang/Object;X:Ljava/lang/Exception;>(TT;[I)Ljava/util/List<TT;>;^TX;^Ljava/io/IOException;",
        )
        .unwrap();
        assert_eq!(sig.type_parameters.len(), 2);
        assert_eq!(sig.parameters.len(), 2);
        assert!(sig.return_type.is_some());
        assert_eq!(
            sig.throws,
            vec![
                ReferenceTypeSignature::TypeVariable("X".to_string()),
                class("java/io", "IOException"),
            ]
        );

        let void = parse_method_signature("()V").unwrap();
        assert_eq!(void.return_type, None);
    }

    #[test]
    fn default_package_class() {
        let sig = parse_field_signature("LTop<TT;>;").unwrap();
        let ReferenceTypeSignature::Class(class_sig) = sig else {
            panic!("expected class type");
        };
        assert_eq!(class_sig.package, "");
        assert_eq!(class_sig.binary_name(), "Top");
    }

    #[test]
    fn display_reproduces_input() {
        for input in [
            "<T:Ljava/lang/Object;>Ljava/lang/Object;",
            "<A:Ljava/util/List<*>;:Ljava/io/Serializable;:Ljava/lang/Comparable<TA;>;B:TA;>Ljava/lang/Object;",
            "<T::Ljava/io/Serializable;>Ljava/util/AbstractList<[TT;>;Ljava/util/RandomAccess;",
            "Ljava/lang/Object;",
        ] {
            assert_eq!(parse_class_signature(input).unwrap().to_string(), input);
        }
        for input in ["<T:Ljava/lang/Object;>([[TT;I)V^Ljava/lang/Exception;", "()[J"] {
            assert_eq!(parse_method_signature(input).unwrap().to_string(), input);
        }
    }

    #[test]
    fn rejects_malformed_input() {
        for input in [
            "",
            "<>Ljava/lang/Object;",
            "<T>Ljava/lang/Object;",
            "<T:Ljava/lang/Object;Ljava/lang/Object;",
            "Ljava/lang/Object",
            "Ljava/util/List<>;",
            "L;",
            "Ljava/lang/Object;X",
            "<:Ljava/lang/Object;>Ljava/lang/Object;",
        ] {
            let err = parse_class_signature(input).unwrap_err();
            assert!(
                matches!(err, Error::InvalidSignature { .. }),
                "{input:?} produced {err:?}"
            );
        }
        assert!(parse_field_signature("I").is_err());
        assert!(parse_field_signature("TT").is_err());
        assert!(parse_method_signature("(I").is_err());
        assert!(parse_method_signature("()VX").is_err());
    }
}
