//! Builtin module registrations for the Sable programming language.
//!
//! Each builtin module supplies a registration record: a factory for its
//! runtime module object, a factory for its type descriptor, an import
//! path, a short name, and a builtin flag. Installing the registrations
//! populates the checker's module caches so builtin modules resolve both by
//! path and as bare identifiers.

pub mod task;

use sable_analyzer::{Builtins, ModuleRegistry, TypeArena, TypeId};
use sable_runtime::Module;

/// A builtin module's registration record.
pub struct ModuleRegistration {
    /// Factory for the runtime module object
    pub make_module: fn() -> Module,
    /// Factory for the module's type descriptor
    pub make_type: fn(&mut TypeArena, &Builtins) -> TypeId,
    /// The import path the module answers to
    pub path: &'static str,
    /// The short name bound for bare-identifier use
    pub name: &'static str,
    /// Whether the short name is installed in the builtin table
    pub builtin: bool,
}

impl std::fmt::Debug for ModuleRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistration")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("builtin", &self.builtin)
            .finish_non_exhaustive()
    }
}

/// Every builtin module this build ships.
#[must_use]
pub fn registrations() -> Vec<ModuleRegistration> { vec![task::registration()] }

/// Installs every builtin module's type descriptor into the registry.
pub fn install_builtin_modules(
    arena: &mut TypeArena,
    builtins: &Builtins,
    registry: &mut ModuleRegistry,
) {
    for registration in registrations() {
        let ty = (registration.make_type)(arena, builtins);
        registry.define_builtin_typedef(
            registration.path,
            registration.name,
            ty,
            registration.builtin,
        );
    }
}
