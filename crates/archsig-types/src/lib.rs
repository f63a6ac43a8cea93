//! Resolved generic type model for imported JVM classes.
//!
//! Type parameters live in a [`TypeStore`] arena, one [`ScopeDef`] per declaring class or method.
//! A [`TypeVariable`] only records the scope and name it refers to, so self-referential and
//! mutually recursive bounds never produce cyclic values.

#![forbid(unsafe_code)]

mod scope;
mod store;
mod ty;

use std::fmt;

use serde::Serialize;

pub use crate::scope::ScopeChain;
pub use crate::store::{ScopeDef, ScopeError, ScopeId, ScopeOwner, TypeParamDef, TypeStore};
pub use crate::ty::{
    ClassOrigin, ClassRef, GenericArrayType, JavaType, ParameterizedType, TypeVariable,
    WildcardType, OBJECT,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    /// Binary name of the class the diagnostic is about.
    pub class_name: Option<String>,
}

impl Diagnostic {
    pub fn warning(
        code: &'static str,
        message: impl Into<String>,
        class_name: Option<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            class_name,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.severity, self.code)?;
        if let Some(class_name) = &self.class_name {
            write!(f, " {class_name}")?;
        }
        write!(f, ": {}", self.message)
    }
}
