//! # Dependency Container
//!
//! Lazily constructed, memoized shared instances.
//!
//! Instances are keyed by a logical name and their type, so `"primary"` can
//! name both a database pool and a cache without clashing. The first caller
//! runs the initializer; everyone after that gets the same `Arc`. An
//! initializer may itself pull other instances from the container.
//!
//! Resources that need releasing register a closer. [`Container::close`] runs
//! the closers in reverse registration order and reports every failure.
//!
//! ```rust
//! use gantry::ioc::Container;
//!
//! let container = Container::new();
//! let a = container.get_or_try_init("answer", |_| Ok::<_, std::convert::Infallible>(42u32)).unwrap();
//! let b = container.get_or_try_init("answer", |_| Ok::<_, std::convert::Infallible>(0u32)).unwrap();
//! assert_eq!(*a, 42);
//! assert!(std::sync::Arc::ptr_eq(&a, &b));
//! ```

use parking_lot::{Mutex, ReentrantMutex};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

type Instance = Arc<dyn Any + Send + Sync>;
type Closer = Box<dyn FnOnce() -> Result<(), String> + Send>;

/// Errors reported by [`Container::close`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerError {
    /// `(name, message)` for every closer that failed, in the order they ran.
    pub failures: Vec<(String, String)>,
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} resource(s) failed to close", self.failures.len())?;
        for (name, message) in &self.failures {
            write!(f, "\n  {name}: {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ContainerError {}

/// Memoizing instance container.
pub struct Container {
    instances: Mutex<HashMap<(String, TypeId), Instance>>,
    // serializes construction; reentrant so initializers can resolve dependencies
    init: ReentrantMutex<()>,
    closers: Mutex<Vec<(String, Closer)>>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Container {
    #[must_use]
    pub fn new() -> Self {
        Self {
            instances: Mutex::new(HashMap::new()),
            init: ReentrantMutex::new(()),
            closers: Mutex::new(Vec::new()),
        }
    }

    fn lookup<T: Any + Send + Sync>(&self, key: &(String, TypeId)) -> Option<Arc<T>> {
        let instance = self.instances.lock().get(key).cloned()?;
        instance.downcast::<T>().ok()
    }

    /// Cached instance of `T` under `name`, if already constructed.
    #[must_use]
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.lookup(&(name.to_string(), TypeId::of::<T>()))
    }

    /// Cached instance of `T` under `name`, constructing it with `init` on
    /// first use. A failed initializer caches nothing.
    ///
    /// # Errors
    ///
    /// Whatever `init` returns.
    pub fn get_or_try_init<T, E, F>(&self, name: &str, init: F) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        F: FnOnce(&Container) -> Result<T, E>,
    {
        let key = (name.to_string(), TypeId::of::<T>());
        if let Some(existing) = self.lookup(&key) {
            return Ok(existing);
        }
        let _guard = self.init.lock();
        if let Some(existing) = self.lookup(&key) {
            return Ok(existing);
        }
        let value = Arc::new(init(self)?);
        debug!(instance = %name, ty = std::any::type_name::<T>(), "Instance constructed");
        self.instances
            .lock()
            .insert(key, Arc::clone(&value) as Instance);
        Ok(value)
    }

    /// Store a ready instance, replacing any previous one.
    pub fn set<T: Any + Send + Sync>(&self, name: &str, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.instances.lock().insert(
            (name.to_string(), TypeId::of::<T>()),
            Arc::clone(&value) as Instance,
        );
        value
    }

    /// Number of cached instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `closer` when the container is closed.
    pub fn register_closer<F, E>(&self, name: &str, closer: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: fmt::Display,
    {
        self.closers.lock().push((
            name.to_string(),
            Box::new(move || closer().map_err(|e| e.to_string())),
        ));
    }

    /// Run every registered closer, last registered first, and drop all
    /// cached instances.
    ///
    /// # Errors
    ///
    /// [`ContainerError`] listing every closer that failed; the others still ran.
    pub fn close(&self) -> Result<(), ContainerError> {
        let closers = std::mem::take(&mut *self.closers.lock());
        let mut failures = Vec::new();
        for (name, closer) in closers.into_iter().rev() {
            match closer() {
                Ok(()) => debug!(resource = %name, "Resource closed"),
                Err(message) => {
                    warn!(resource = %name, error = %message, "Resource failed to close");
                    failures.push((name, message));
                }
            }
        }
        self.instances.lock().clear();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ContainerError { failures })
        }
    }
}
