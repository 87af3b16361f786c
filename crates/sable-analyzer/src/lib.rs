//! Structural type checker for the Sable programming language.
//!
//! The checker walks a parsed AST in post-order, resolves nominal and
//! structural types (generics, unions, interfaces included), annotates each
//! expression node with a resolved type, and records diagnostics through the
//! same panic-mode reporter the parser uses. It never aborts on the first
//! error.
//!
//! Type descriptors live in an id-indexed [`types::TypeArena`]; identity on
//! the id is what subtyping's reflexivity and the generic-resolution table
//! key on, which breaks the class/method reference cycle without weak
//! pointers.

pub mod builtins;
pub mod checker;
pub mod env;
pub mod modules;
mod subtype;
pub mod types;

pub use builtins::Builtins;
pub use checker::Checker;
pub use env::TypeEnv;
pub use modules::ModuleRegistry;
pub use types::{TypeArena, TypeId, TypeKind};

/// Marks every type reachable from the checker's process-wide roots: the
/// module caches and the environment stack.
pub fn mark_roots(arena: &mut TypeArena, env: &TypeEnv, modules: &ModuleRegistry) {
    env.mark_roots(arena);
    modules.mark_roots(arena);
}
