//! Batch import of JVM class metadata with generic-signature resolution.
//!
//! [`ClassImporter::import`] works in two stages. First every class of the batch, and every
//! generic method, gets a type-parameter scope with placeholder parameters. Then each scope's
//! bounds are resolved through the scope chain of its owner, loading classes outside the batch
//! from a [`ClasspathProvider`] when [`ImportOptions`] allows it. Type variables whose declaring
//! scope cannot be found become stubs without bounds.

#![forbid(unsafe_code)]

mod class_info;
mod classpath;
mod importer;
mod model;
mod resolver;

pub use crate::class_info::{ClassInfo, EnclosingInfo, MethodInfo, MethodKey};
pub use crate::classpath::{
    ClassPool, ClasspathError, ClasspathProvider, DirectoryClasspath, InMemoryClasspath,
    NoClasspath,
};
pub use crate::importer::{
    ClassImporter, ImportOptions, DUPLICATE_CLASS, INVALID_TYPE_PARAMETERS, MALFORMED_DESCRIPTOR,
    MALFORMED_SIGNATURE,
};
pub use crate::model::{ImportedClasses, JavaClass, JavaMethod, JavaTypeParameter};
pub use crate::resolver::{ClassLookup, PoolLookup, SignatureResolver};
