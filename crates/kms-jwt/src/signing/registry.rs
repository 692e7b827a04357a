use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use super::{Algorithm, LocalSigningMethod, SigningMethod};

static GLOBAL: LazyLock<SigningMethodRegistry> = LazyLock::new(SigningMethodRegistry::with_builtins);

/// Maps `alg` names to signing methods.
///
/// Most code should share one registry per process, see [`SigningMethodRegistry::global`].
/// Tests build their own so overrides do not leak between them.
#[derive(Default)]
pub struct SigningMethodRegistry {
    methods: RwLock<HashMap<String, Arc<dyn SigningMethod>>>,
}

impl SigningMethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding a [`LocalSigningMethod`] for every supported algorithm.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for alg in Algorithm::ALL {
            registry.register(Arc::new(LocalSigningMethod::new(alg)));
        }
        registry
    }

    /// The process-wide registry.
    ///
    /// Created with the built-in methods on first use. Entries replaced through
    /// [`override_method`](Self::override_method) stay replaced until the
    /// process exits; nothing unsets them.
    pub fn global() -> &'static SigningMethodRegistry {
        &GLOBAL
    }

    /// Registers `method` under its own `alg`, returning whatever was there before.
    pub fn register(&self, method: Arc<dyn SigningMethod>) -> Option<Arc<dyn SigningMethod>> {
        let alg = method.alg().to_owned();
        tracing::debug!(%alg, "registering signing method");
        self.methods.write().insert(alg, method)
    }

    /// Replaces the entry for `method.alg()` with `method`.
    ///
    /// Returns the displaced method, or `None` when `method` itself was already
    /// registered, in which case nothing changes.
    pub fn override_method(
        &self,
        method: Arc<dyn SigningMethod>,
    ) -> Option<Arc<dyn SigningMethod>> {
        let mut methods = self.methods.write();
        let alg = method.alg().to_owned();
        if let Some(current) = methods.get(&alg) {
            if same_instance(current, &method) {
                return None;
            }
        }
        tracing::debug!(%alg, "overriding signing method");
        methods.insert(alg, method)
    }

    pub fn get(&self, alg: &str) -> Option<Arc<dyn SigningMethod>> {
        self.methods.read().get(alg).cloned()
    }

    pub fn algorithms(&self) -> Vec<String> {
        let mut algs: Vec<_> = self.methods.read().keys().cloned().collect();
        algs.sort();
        algs
    }
}

/// Compares the data pointers only; vtable pointers for one type can differ
/// between codegen units.
pub(crate) fn same_instance(a: &Arc<dyn SigningMethod>, b: &Arc<dyn SigningMethod>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
