//! The module caches.
//!
//! Two process-wide tables: absolute source path to module type, and short
//! builtin name to module type. Re-importing a path returns the cached
//! descriptor; variable lookup falls back to the builtin table so builtin
//! modules are visible as bare identifiers.

use rustc_hash::FxHashMap;

use crate::types::{TypeArena, TypeId};

/// Path- and name-keyed module type tables.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: FxHashMap<String, TypeId>,
    builtin_modules: FxHashMap<String, TypeId>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Installs a module type under `path`, and under `name` as well when
    /// `builtin` is set.
    pub fn define_builtin_typedef(&mut self, path: &str, name: &str, ty: TypeId, builtin: bool) {
        drop(self.modules.insert(String::from(path), ty));

        if builtin {
            drop(self.builtin_modules.insert(String::from(name), ty));
        }
    }

    /// Returns the cached module type for a path.
    #[must_use]
    pub fn module(&self, path: &str) -> Option<TypeId> { self.modules.get(path).copied() }

    /// Caches a module type under a path.
    pub fn insert_module(&mut self, path: &str, ty: TypeId) {
        drop(self.modules.insert(String::from(path), ty));
    }

    /// Returns the module type registered under a builtin short name.
    #[must_use]
    pub fn builtin(&self, name: &str) -> Option<TypeId> {
        self.builtin_modules.get(name).copied()
    }

    /// Marks every cached module type.
    pub fn mark_roots(&self, arena: &mut TypeArena) {
        for &ty in self.modules.values() {
            arena.mark(ty);
        }
        for &ty in self.builtin_modules.values() {
            arena.mark(ty);
        }
    }
}
