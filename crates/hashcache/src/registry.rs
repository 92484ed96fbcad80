// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Table-to-repository bindings with lazy, memoized instantiation.

use std::{collections::HashMap, fmt, sync::Arc};

use hashcache_store::{Error, Result};
use parking_lot::RwLock;

use crate::{DynRepository, Repository};

type Factory = dyn Fn() -> Arc<DynRepository<'static>> + Send + Sync;

/// How a table's repository is obtained.
///
/// Factories run without holding the registry lock. The first instance stored for
/// a registration is reused until the table is registered again; concurrent first
/// resolutions may each run the factory, and all but one result are discarded.
#[derive(Clone)]
pub struct Binding(BindingKind);

#[derive(Clone)]
enum BindingKind {
    Factory(Arc<Factory>),
    Shared(Arc<DynRepository<'static>>),
}

impl Binding {
    /// Binds a closure that constructs the repository on first use.
    pub fn factory<R, F>(factory: F) -> Self
    where
        R: Repository + 'static,
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self(BindingKind::Factory(Arc::new(move || DynRepository::new_arc(factory()))))
    }

    /// Binds a repository type constructed with [`Default`] on first use.
    #[must_use]
    pub fn from_default<R>() -> Self
    where
        R: Repository + Default + 'static,
    {
        Self::factory(R::default)
    }

    /// Binds an already constructed repository.
    pub fn shared<R>(repository: R) -> Self
    where
        R: Repository + 'static,
    {
        Self(BindingKind::Shared(DynRepository::new_arc(repository)))
    }

    fn same_as(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (BindingKind::Factory(a), BindingKind::Factory(b)) => Arc::ptr_eq(a, b),
            (BindingKind::Shared(a), BindingKind::Shared(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn instantiate(&self) -> Arc<DynRepository<'static>> {
        match &self.0 {
            BindingKind::Factory(factory) => factory(),
            BindingKind::Shared(repository) => Arc::clone(repository),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.0 {
            BindingKind::Factory(_) => "Factory",
            BindingKind::Shared(_) => "Shared",
        };
        f.debug_tuple("Binding").field(&kind).finish()
    }
}

#[derive(Default)]
struct State {
    bindings: HashMap<String, Binding>,
    instances: HashMap<String, Arc<DynRepository<'static>>>,
}

/// The set of tables a cache can serve.
///
/// A registry is usually populated at startup through the cache builder, but can be
/// updated at runtime; it is shared behind an [`Arc`] and every method takes `&self`.
///
/// # Examples
///
/// ```
/// # use std::time::Duration;
/// # use hashcache::{Records, Repository, Result};
/// # #[derive(Default)]
/// # struct Users;
/// # impl Repository for Users {
/// #     fn version(&self) -> String { "1".into() }
/// #     fn ttl(&self) -> Duration { Duration::ZERO }
/// #     async fn fetch(&self, _ids: &[String], _group: &str) -> Result<Records> { Ok(Records::new()) }
/// # }
/// use hashcache::{Binding, Registry};
///
/// let registry = Registry::new();
/// registry.register("users", Binding::from_default::<Users>());
///
/// assert!(registry.is_registered("users"));
/// assert!(registry.resolve("orders").err().is_some());
/// ```
#[derive(Default)]
pub struct Registry {
    state: RwLock<State>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `table`, replacing any previous binding and its memoized instance.
    pub fn register(&self, table: impl Into<String>, binding: Binding) {
        let table = table.into();
        let mut state = self.state.write();
        state.instances.remove(&table);
        state.bindings.insert(table, binding);
    }

    /// Registers several bindings at once.
    pub fn fill<I, T>(&self, bindings: I)
    where
        I: IntoIterator<Item = (T, Binding)>,
        T: Into<String>,
    {
        let mut state = self.state.write();
        for (table, binding) in bindings {
            let table = table.into();
            state.instances.remove(&table);
            state.bindings.insert(table, binding);
        }
    }

    /// Returns `true` if `table` has a binding.
    #[must_use]
    pub fn is_registered(&self, table: &str) -> bool {
        self.state.read().bindings.contains_key(table)
    }

    /// Returns the registered table names in ascending order.
    #[must_use]
    pub fn tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = self.state.read().bindings.keys().cloned().collect();
        tables.sort_unstable();
        tables
    }

    /// Returns the repository for `table`, instantiating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::NotRegistered`](hashcache_store::ErrorKind::NotRegistered)
    /// if `table` has no binding.
    pub fn resolve(&self, table: &str) -> Result<Arc<DynRepository<'static>>> {
        let binding = {
            let state = self.state.read();
            if let Some(repository) = state.instances.get(table) {
                return Ok(Arc::clone(repository));
            }
            state.bindings.get(table).cloned().ok_or_else(|| Error::not_registered(table))?
        };

        // Unlocked: a factory may be slow or call back into the registry.
        let repository = binding.instantiate();

        let mut state = self.state.write();
        if let Some(existing) = state.instances.get(table) {
            return Ok(Arc::clone(existing));
        }
        if !state.bindings.get(table).is_some_and(|current| current.same_as(&binding)) {
            // Re-registered or removed while the factory ran; the caller still gets
            // an instance of the binding it resolved, but it is not memoized.
            return Ok(repository);
        }
        state.instances.insert(table.to_owned(), Arc::clone(&repository));
        Ok(repository)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("tables", &self.tables()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use hashcache_store::ErrorKind;

    use super::*;
    use crate::Records;

    struct Versioned(&'static str);

    impl Repository for Versioned {
        fn version(&self) -> String {
            self.0.to_string()
        }

        fn ttl(&self) -> Duration {
            Duration::ZERO
        }

        async fn fetch(&self, _ids: &[String], _group: &str) -> Result<Records> {
            Ok(Records::new())
        }
    }

    #[derive(Default)]
    struct Defaulted;

    impl Repository for Defaulted {
        fn version(&self) -> String {
            "default".to_string()
        }

        fn ttl(&self) -> Duration {
            Duration::ZERO
        }

        async fn fetch(&self, _ids: &[String], _group: &str) -> Result<Records> {
            Ok(Records::new())
        }
    }

    fn counting_binding(counter: &Arc<AtomicUsize>, version: &'static str) -> Binding {
        let counter = Arc::clone(counter);
        Binding::factory(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Versioned(version)
        })
    }

    #[test]
    fn resolve_unregistered_table_fails() {
        let registry = Registry::new();
        let error = registry.resolve("users").err().expect("table is not registered");
        assert_eq!(
            error.kind(),
            &ErrorKind::NotRegistered {
                table: "users".to_string()
            }
        );
    }

    #[test]
    fn factory_runs_once_per_registration() {
        let registry = Registry::new();
        let created = Arc::new(AtomicUsize::new(0));
        registry.register("users", counting_binding(&created, "1"));

        let first = registry.resolve("users").expect("resolve failed");
        let second = registry.resolve("users").expect("resolve failed");

        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn register_discards_memoized_instance() {
        let registry = Registry::new();
        let created = Arc::new(AtomicUsize::new(0));
        registry.register("users", counting_binding(&created, "1"));
        assert_eq!(registry.resolve("users").expect("resolve failed").version(), "1");

        registry.register("users", counting_binding(&created, "2"));
        assert_eq!(registry.resolve("users").expect("resolve failed").version(), "2");
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn shared_binding_returns_same_instance() {
        let registry = Registry::new();
        registry.register("users", Binding::shared(Versioned("s")));
        let first = registry.resolve("users").expect("resolve failed");

        registry.register("orders", Binding::from_default::<Defaulted>());
        let second = registry.resolve("users").expect("resolve failed");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.resolve("orders").expect("resolve failed").version(), "default");
    }

    #[test]
    fn fill_registers_all_and_tables_are_sorted() {
        let registry = Registry::new();
        registry.fill([
            ("orders", Binding::shared(Versioned("o"))),
            ("accounts", Binding::from_default::<Defaulted>()),
            ("users", Binding::shared(Versioned("u"))),
        ]);

        assert_eq!(registry.tables(), ["accounts", "orders", "users"]);
        assert!(registry.is_registered("orders"));
        assert!(!registry.is_registered("invoices"));
        assert!(format!("{registry:?}").contains("accounts"));
    }

    #[test]
    fn factory_may_use_the_registry() {
        let registry = Arc::new(Registry::new());
        registry.register("orders", Binding::shared(Versioned("o")));
        let weak = Arc::downgrade(&registry);
        registry.register(
            "users",
            Binding::factory(move || {
                let registry = weak.upgrade().expect("registry outlives resolution");
                let version = registry.resolve("orders").expect("orders is registered").version();
                assert!(registry.is_registered("users"));
                Versioned(if version == "o" { "from-orders" } else { "unexpected" })
            }),
        );

        let users = registry.resolve("users").expect("resolve failed");
        assert_eq!(users.version(), "from-orders");
        assert!(Arc::ptr_eq(&users, &registry.resolve("users").expect("resolve failed")));
    }

    #[test]
    fn instance_of_replaced_binding_is_not_memoized() {
        let registry = Arc::new(Registry::new());
        let created = Arc::new(AtomicUsize::new(0));
        let weak = Arc::downgrade(&registry);
        let replacement = counting_binding(&created, "2");
        registry.register(
            "users",
            Binding::factory(move || {
                let registry = weak.upgrade().expect("registry outlives resolution");
                registry.register("users", replacement.clone());
                Versioned("1")
            }),
        );

        assert_eq!(registry.resolve("users").expect("resolve failed").version(), "1");
        assert_eq!(registry.resolve("users").expect("resolve failed").version(), "2");
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn binding_debug_names_kind() {
        assert_eq!(format!("{:?}", Binding::shared(Versioned("s"))), "Binding(\"Shared\")");
        assert_eq!(format!("{:?}", Binding::from_default::<Defaulted>()), "Binding(\"Factory\")");
    }
}
