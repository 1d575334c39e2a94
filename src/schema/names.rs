//! Process-wide table of component schema names.
//!
//! Every composite type that can end up in `components.schemas` needs a name
//! that is stable (the same type always gets the same name) and collision-free
//! (two distinct types never share one). The first type to claim a bare name
//! keeps it; later distinct types with the same bare name get `Name-1`,
//! `Name-2`, and so on.
//!
//! The table only ever grows. Share one table between all compilers that feed
//! the same contract document, either by passing an `Arc<TypeNames>` around or
//! by using [`TypeNames::global`].

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

static GLOBAL: Lazy<Arc<TypeNames>> = Lazy::new(|| Arc::new(TypeNames::new()));

#[derive(Default)]
struct NameTable {
    by_type: HashMap<(TypeId, Option<String>), String>,
    taken: HashSet<String>,
}

/// Collision table mapping `(type, scope)` to a unique component name.
#[derive(Default)]
pub struct TypeNames {
    inner: Mutex<NameTable>,
}

impl TypeNames {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The table shared by the whole process.
    #[must_use]
    pub fn global() -> Arc<TypeNames> {
        Arc::clone(&GLOBAL)
    }

    /// Resolve the unique name for `id`.
    ///
    /// `bare` is the human name of the type (`User`), `scope` optionally namespaces
    /// it (`users-get.User`). The lock is held for the whole lookup-or-assign so
    /// concurrent compilers agree on every assignment.
    pub fn resolve(&self, id: TypeId, bare: &str, scope: Option<&str>) -> String {
        let key = (id, scope.map(str::to_string));
        let mut table = self.inner.lock();
        if let Some(name) = table.by_type.get(&key) {
            return name.clone();
        }
        let base = match scope {
            Some(scope) => format!("{scope}.{bare}"),
            None => bare.to_string(),
        };
        let mut name = base.clone();
        let mut index = 0usize;
        while table.taken.contains(&name) {
            index += 1;
            name = format!("{base}-{index}");
        }
        if index > 0 {
            debug!(bare = %base, assigned = %name, "Schema name collision resolved");
        }
        table.taken.insert(name.clone());
        table.by_type.insert(key, name.clone());
        name
    }

    /// Number of names handed out so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().taken.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct First;
    struct Second;
    struct Third;

    #[test]
    fn test_same_type_same_name() {
        let names = TypeNames::new();
        let a = names.resolve(TypeId::of::<First>(), "Thing", None);
        let b = names.resolve(TypeId::of::<First>(), "Thing", None);
        assert_eq!(a, "Thing");
        assert_eq!(a, b);
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_colliding_types_get_suffixes() {
        let names = TypeNames::new();
        assert_eq!(names.resolve(TypeId::of::<First>(), "Thing", None), "Thing");
        assert_eq!(names.resolve(TypeId::of::<Second>(), "Thing", None), "Thing-1");
        assert_eq!(names.resolve(TypeId::of::<Third>(), "Thing", None), "Thing-2");
        // earlier assignments never move
        assert_eq!(names.resolve(TypeId::of::<Second>(), "Thing", None), "Thing-1");
    }

    #[test]
    fn test_scoped_names_are_separate_keys() {
        let names = TypeNames::new();
        let bare = names.resolve(TypeId::of::<First>(), "Params", None);
        let scoped = names.resolve(TypeId::of::<First>(), "Params", Some("users-get"));
        assert_eq!(bare, "Params");
        assert_eq!(scoped, "users-get.Params");
    }

    #[test]
    fn test_concurrent_resolution_is_consistent() {
        let names = Arc::new(TypeNames::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let names = Arc::clone(&names);
                std::thread::spawn(move || {
                    if i % 2 == 0 {
                        names.resolve(TypeId::of::<First>(), "Race", None)
                    } else {
                        names.resolve(TypeId::of::<Second>(), "Race", None)
                    }
                })
            })
            .collect();
        let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let first: HashSet<_> = results.iter().step_by(2).collect();
        let second: HashSet<_> = results.iter().skip(1).step_by(2).collect();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first, second);
    }
}
