//! The type environment: a stack of scopes.
//!
//! Each scope carries three tables: `locals` (what a variable reference
//! resolves to), `typedefs` (what a type name resolves to), and
//! `generic_resolutions` (descriptor identity to descriptor, written while
//! checking a call or a generic application; an open entry means "to be
//! unified"). Lookup walks outward until a scope answers.

use rustc_hash::FxHashMap;

use crate::types::{TypeArena, TypeId};

/// One lexical scope.
#[derive(Debug, Default)]
pub struct Scope {
    /// Variable name to value type
    pub locals: FxHashMap<String, TypeId>,
    /// Type name to descriptor
    pub typedefs: FxHashMap<String, TypeId>,
    /// Generic-parameter identity to its resolution; `None` is open
    pub generic_resolutions: FxHashMap<TypeId, Option<TypeId>>,
}

/// Outcome of trying to resolve or bind a generic parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericBinding {
    /// The slot was open and is now bound
    Bound,
    /// The slot was already bound to this descriptor
    Existing(TypeId),
    /// No scope carries the slot
    Absent,
}

/// A stack of scopes with outward lookup.
#[derive(Debug)]
pub struct TypeEnv {
    scopes: Vec<Scope>,
}

impl TypeEnv {
    /// Creates an environment with a single (global) scope.
    #[must_use]
    pub fn new() -> Self { Self { scopes: vec![Scope::default()] } }

    /// Pushes a fresh innermost scope.
    pub fn push_scope(&mut self) { self.scopes.push(Scope::default()); }

    /// Pops the innermost scope.
    ///
    /// The global scope is never popped; a mismatched pop is a checker bug.
    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "attempted to pop the global scope");
        if self.scopes.len() > 1 {
            drop(self.scopes.pop());
        }
    }

    /// Returns the number of scopes on the stack.
    #[must_use]
    pub fn depth(&self) -> usize { self.scopes.len() }

    /// Returns the outermost (global) scope.
    #[must_use]
    pub fn global_scope(&self) -> &Scope { &self.scopes[0] }

    /// Binds a variable name in the innermost scope.
    pub fn define_local(&mut self, name: &str, ty: TypeId) {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        drop(scope.locals.insert(String::from(name), ty));
    }

    /// Binds a type name in the innermost scope.
    pub fn define_typedef(&mut self, name: &str, ty: TypeId) {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        drop(scope.typedefs.insert(String::from(name), ty));
    }

    /// Resolves a variable name, walking outward.
    #[must_use]
    pub fn lookup_local(&self, name: &str) -> Option<TypeId> {
        self.scopes.iter().rev().find_map(|scope| scope.locals.get(name).copied())
    }

    /// Resolves a type name, walking outward.
    #[must_use]
    pub fn lookup_typedef(&self, name: &str) -> Option<TypeId> {
        self.scopes.iter().rev().find_map(|scope| scope.typedefs.get(name).copied())
    }

    /// Seeds an open generic-resolution entry in the innermost scope.
    pub fn seed_open_generic(&mut self, key: TypeId) {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        drop(scope.generic_resolutions.insert(key, None));
    }

    /// Writes a resolution into the innermost scope, replacing any entry.
    pub fn bind_generic(&mut self, key: TypeId, value: TypeId) {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        drop(scope.generic_resolutions.insert(key, Some(value)));
    }

    /// Finds the resolution for a generic parameter, walking outward.
    ///
    /// Stops at the first scope carrying the key; an open entry yields
    /// `None`.
    #[must_use]
    pub fn find_generic_resolution(&self, key: TypeId) -> Option<TypeId> {
        for scope in self.scopes.iter().rev() {
            if let Some(entry) = scope.generic_resolutions.get(&key) {
                return *entry;
            }
        }

        None
    }

    /// Binds `sub` into the first scope carrying `key`, or reports the
    /// existing resolution.
    ///
    /// This is the "bind once, confirm thereafter" step of unification.
    pub fn resolve_or_bind(&mut self, key: TypeId, sub: TypeId) -> GenericBinding {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(entry) = scope.generic_resolutions.get_mut(&key) {
                return match *entry {
                    None => {
                        *entry = Some(sub);
                        GenericBinding::Bound
                    }
                    Some(existing) => GenericBinding::Existing(existing),
                };
            }
        }

        GenericBinding::Absent
    }

    /// Marks every type reachable from this environment's tables.
    pub fn mark_roots(&self, arena: &mut TypeArena) {
        for scope in &self.scopes {
            for &ty in scope.locals.values() {
                arena.mark(ty);
            }
            for &ty in scope.typedefs.values() {
                arena.mark(ty);
            }
            for (&key, value) in &scope.generic_resolutions {
                arena.mark(key);
                if let Some(ty) = value {
                    arena.mark(*ty);
                }
            }
        }
    }
}

impl Default for TypeEnv {
    fn default() -> Self { Self::new() }
}
