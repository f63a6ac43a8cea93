use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use archsig_classfile::ClassFile;
use thiserror::Error;

use crate::class_info::{binary_to_internal, ClassInfo};

#[derive(Debug, Error)]
pub enum ClasspathError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid class file {path}: {source}")]
    ClassFile {
        path: PathBuf,
        #[source]
        source: archsig_classfile::Error,
    },
    #[error("`{0}` does not name a class file below a classpath root")]
    InvalidName(String),
    #[error("{path} declares `{found}`, expected `{expected}`")]
    NameMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

/// Classes already known by binary name.
pub trait ClassPool {
    fn lookup(&self, binary_name: &str) -> Option<&ClassInfo>;
}

/// On-demand loading of classes outside the import batch.
///
/// A miss and a failed load look the same to the importer; implementations report failures
/// themselves.
pub trait ClasspathProvider {
    fn load(&self, binary_name: &str) -> Option<ClassInfo>;
}

/// A classpath without entries.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoClasspath;

impl ClasspathProvider for NoClasspath {
    fn load(&self, _binary_name: &str) -> Option<ClassInfo> {
        None
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryClasspath {
    classes: HashMap<String, ClassInfo>,
}

impl InMemoryClasspath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `class`, replacing an earlier class of the same name.
    pub fn insert(&mut self, class: ClassInfo) {
        self.classes.insert(class.binary_name.clone(), class);
    }

    pub fn with(mut self, class: ClassInfo) -> Self {
        self.insert(class);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<ClassInfo> for InMemoryClasspath {
    fn from_iter<I: IntoIterator<Item = ClassInfo>>(iter: I) -> Self {
        let mut classpath = Self::new();
        for class in iter {
            classpath.insert(class);
        }
        classpath
    }
}

impl ClassPool for InMemoryClasspath {
    fn lookup(&self, binary_name: &str) -> Option<&ClassInfo> {
        self.classes.get(binary_name)
    }
}

impl ClasspathProvider for InMemoryClasspath {
    fn load(&self, binary_name: &str) -> Option<ClassInfo> {
        self.classes.get(binary_name).cloned()
    }
}

/// Class directories searched in order for `<root>/<internal name>.class`.
#[derive(Clone, Debug, Default)]
pub struct DirectoryClasspath {
    roots: Vec<PathBuf>,
}

impl DirectoryClasspath {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Read `binary_name` from the first root containing it.
    ///
    /// `Ok(None)` means no root has a file for the class.
    pub fn read_class(&self, binary_name: &str) -> Result<Option<ClassInfo>, ClasspathError> {
        let internal = binary_to_internal(binary_name);
        if !is_relative_class_path(&internal) {
            return Err(ClasspathError::InvalidName(binary_name.to_string()));
        }
        let relative = format!("{internal}.class");
        for root in &self.roots {
            let path = root.join(&relative);
            if !path.is_file() {
                continue;
            }
            return read_class_file(&path, binary_name).map(Some);
        }
        Ok(None)
    }
}

/// Every `/`-separated segment must be a plain, non-empty path component.
fn is_relative_class_path(internal: &str) -> bool {
    internal.split('/').all(|segment| {
        let mut components = Path::new(segment).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(c)), None) if c == segment
        )
    })
}

fn read_class_file(path: &Path, binary_name: &str) -> Result<ClassInfo, ClasspathError> {
    let bytes = std::fs::read(path).map_err(|source| ClasspathError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let class = ClassFile::parse(&bytes).map_err(|source| ClasspathError::ClassFile {
        path: path.to_path_buf(),
        source,
    })?;
    let info = ClassInfo::from_classfile(&class);
    if info.binary_name != binary_name {
        return Err(ClasspathError::NameMismatch {
            path: path.to_path_buf(),
            expected: binary_name.to_string(),
            found: info.binary_name,
        });
    }
    Ok(info)
}

impl ClasspathProvider for DirectoryClasspath {
    fn load(&self, binary_name: &str) -> Option<ClassInfo> {
        match self.read_class(binary_name) {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(
                    target: "archsig.classpath",
                    class = binary_name,
                    error = %err,
                    "ignoring unreadable classpath entry"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_classpath_is_a_pool_and_a_provider() {
        let classpath: InMemoryClasspath = [
            ClassInfo::new("java.lang.Object"),
            ClassInfo::new("java.lang.String").with_super_class("java.lang.Object"),
        ]
        .into_iter()
        .collect();

        assert_eq!(classpath.len(), 2);
        assert_eq!(
            classpath.lookup("java.lang.String").map(|c| c.super_class.as_deref()),
            Some(Some("java.lang.Object"))
        );
        assert!(classpath.load("java.lang.Object").is_some());
        assert!(classpath.load("java.lang.Integer").is_none());
        assert!(NoClasspath.load("java.lang.Object").is_none());
    }

    #[test]
    fn names_escaping_the_roots_are_rejected() {
        let classpath = DirectoryClasspath::new([PathBuf::from("/nonexistent/archsig")]);
        // `L/etc/passwd;` in a descriptor arrives as `.etc.passwd`.
        for name in [".etc.passwd", "com..Foo", "", "com.example.", "..secret"] {
            assert!(
                matches!(classpath.read_class(name), Err(ClasspathError::InvalidName(_))),
                "{name:?} was accepted"
            );
            assert!(classpath.load(name).is_none());
        }
        assert!(is_relative_class_path("com/example/Outer$Inner"));
    }

    #[test]
    fn missing_directory_entries_are_misses() {
        let classpath = DirectoryClasspath::new([PathBuf::from("/nonexistent/archsig")]);
        assert!(matches!(classpath.read_class("com.example.Foo"), Ok(None)));
        assert!(classpath.load("com.example.Foo").is_none());
    }
}
