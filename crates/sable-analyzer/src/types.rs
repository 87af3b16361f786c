//! Type descriptors and the arena that owns them.
//!
//! Six descriptor variants cover the whole type lattice: nominal `Simple`
//! types, callable `Functor` types, right-associated `Union` pairs,
//! structural `Interface` types, `Application` of a generic target to
//! arguments, and open `Parameter` slots introduced by declarations.
//!
//! Descriptors refer to each other by [`TypeId`], so the class/method cycle
//! (a method's functor naming its own class) needs no weak edges. Each
//! descriptor carries a mark bit; root-marking and [`TypeArena::sweep`]
//! implement the collector contract.

use std::fmt::Write as _;

use rustc_hash::FxHashMap;

/// Unique identifier for a type descriptor within a [`TypeArena`].
///
/// Subtyping's reflexivity and the generic-resolution table both key on
/// this identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

impl TypeId {
    /// Creates a new `TypeId` with the given value.
    #[must_use]
    pub const fn new(id: u32) -> Self { Self(id) }

    /// Returns the inner value of the `TypeId`.
    #[must_use]
    pub const fn value(self) -> u32 { self.0 }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type:{}", self.0)
    }
}

/// A nominal type: superclass link, field and method tables, and the
/// generic-parameter slots it was declared with.
#[derive(Debug, Clone)]
pub struct SimpleType {
    /// The declared name
    pub name: String,
    /// Superclass, when the declaration extends one
    pub super_type: Option<TypeId>,
    /// Field name to field type
    pub fields: FxHashMap<String, TypeId>,
    /// Method name to functor type
    pub methods: FxHashMap<String, TypeId>,
    /// Declared generic-parameter slots
    pub generics: Vec<TypeId>,
}

impl SimpleType {
    /// Creates an empty nominal type with the given name.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: String::from(name),
            super_type: None,
            fields: FxHashMap::default(),
            methods: FxHashMap::default(),
            generics: Vec::new(),
        }
    }
}

/// A callable type: ordered parameters, a return type, and generic slots.
///
/// The return type is `None` while a body is still being inferred; readers
/// treat that as `Nil`.
#[derive(Debug, Clone, Default)]
pub struct FunctorType {
    /// Ordered parameter types
    pub params: Vec<TypeId>,
    /// Declared or inferred return type
    pub return_type: Option<TypeId>,
    /// Declared generic-parameter slots
    pub generics: Vec<TypeId>,
}

/// An ordered union pair; n-ary unions are right-associated.
#[derive(Debug, Clone, Copy)]
pub struct UnionType {
    /// Left alternative
    pub left: TypeId,
    /// Right alternative
    pub right: TypeId,
}

/// A structural type, subtyped by shape.
#[derive(Debug, Clone)]
pub struct InterfaceType {
    /// The declared name
    pub name: String,
    /// Super-interface, when the declaration extends one
    pub super_type: Option<TypeId>,
    /// Field name to field type
    pub fields: FxHashMap<String, TypeId>,
    /// Method name to functor type
    pub methods: FxHashMap<String, TypeId>,
    /// Declared generic-parameter slots
    pub generics: Vec<TypeId>,
}

impl InterfaceType {
    /// Creates an empty interface type with the given name.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: String::from(name),
            super_type: None,
            fields: FxHashMap::default(),
            methods: FxHashMap::default(),
            generics: Vec::new(),
        }
    }
}

/// An instantiation of a generic target with concrete arguments, like
/// `List<Number>`.
#[derive(Debug, Clone)]
pub struct ApplicationType {
    /// The generic target
    pub target: TypeId,
    /// Ordered type arguments
    pub args: Vec<TypeId>,
}

/// A named generic-parameter slot, optionally bounded by `extends`.
///
/// Resolved per call through the environment's generic-resolution table.
#[derive(Debug, Clone)]
pub struct ParameterType {
    /// The declared name
    pub name: String,
    /// The `extends` bound, if any
    pub bound: Option<TypeId>,
}

/// The closed set of type descriptor variants.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// Nominal type
    Simple(SimpleType),
    /// Callable type
    Functor(FunctorType),
    /// Union pair
    Union(UnionType),
    /// Structural type
    Interface(InterfaceType),
    /// Generic application
    Application(ApplicationType),
    /// Generic parameter slot
    Parameter(ParameterType),
}

#[derive(Debug, Clone)]
struct Entry {
    kind: TypeKind,
    marked: bool,
}

/// Arena of type descriptors with mark bits for the collector.
///
/// Descriptors outlive the program while their owning module stays cached;
/// sweeping is only meaningful after the caches have been marked.
#[derive(Debug, Default)]
pub struct TypeArena {
    entries: Vec<Option<Entry>>,
    free_list: Vec<u32>,
}

impl TypeArena {
    /// Creates a new empty arena.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Allocates a descriptor and returns its id.
    pub fn alloc(&mut self, kind: TypeKind) -> TypeId {
        let entry = Entry { kind, marked: false };

        if let Some(index) = self.free_list.pop() {
            self.entries[index as usize] = Some(entry);
            return TypeId::new(index);
        }

        let index = u32::try_from(self.entries.len()).expect("type arena exceeded u32 capacity");
        self.entries.push(Some(entry));

        TypeId::new(index)
    }

    /// Returns the descriptor for an id.
    ///
    /// ## Panics
    ///
    /// Panics if the id is stale, i.e. its slot was freed by a sweep.
    #[must_use]
    pub fn get(&self, id: TypeId) -> &TypeKind {
        &self.entries[id.value() as usize].as_ref().expect("stale TypeId").kind
    }

    /// Returns the mutable descriptor for an id.
    ///
    /// ## Panics
    ///
    /// Panics if the id is stale, i.e. its slot was freed by a sweep.
    pub fn get_mut(&mut self, id: TypeId) -> &mut TypeKind {
        &mut self.entries[id.value() as usize].as_mut().expect("stale TypeId").kind
    }

    /// Returns the functor descriptor for an id, if it is one.
    #[must_use]
    pub fn as_functor(&self, id: TypeId) -> Option<&FunctorType> {
        match self.get(id) {
            TypeKind::Functor(functor) => Some(functor),
            _ => None,
        }
    }

    /// Returns the mutable functor descriptor for an id, if it is one.
    pub fn as_functor_mut(&mut self, id: TypeId) -> Option<&mut FunctorType> {
        match self.get_mut(id) {
            TypeKind::Functor(functor) => Some(functor),
            _ => None,
        }
    }

    /// Returns the nominal descriptor for an id, if it is one.
    #[must_use]
    pub fn as_simple(&self, id: TypeId) -> Option<&SimpleType> {
        match self.get(id) {
            TypeKind::Simple(simple) => Some(simple),
            _ => None,
        }
    }

    /// Returns the mutable nominal descriptor for an id, if it is one.
    pub fn as_simple_mut(&mut self, id: TypeId) -> Option<&mut SimpleType> {
        match self.get_mut(id) {
            TypeKind::Simple(simple) => Some(simple),
            _ => None,
        }
    }

    /// Returns the number of live descriptors.
    #[must_use]
    pub fn len(&self) -> usize { self.entries.iter().filter(|slot| slot.is_some()).count() }

    /// Returns true when the arena holds no live descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Renders a human-readable form of a type, for logs and tests.
    #[must_use]
    pub fn display(&self, id: TypeId) -> String {
        match self.get(id) {
            TypeKind::Simple(simple) => simple.name.clone(),
            TypeKind::Interface(interface) => interface.name.clone(),
            TypeKind::Parameter(parameter) => parameter.name.clone(),
            TypeKind::Union(union) => {
                format!("{} | {}", self.display(union.left), self.display(union.right))
            }
            TypeKind::Application(app) => {
                let mut out = self.display(app.target);
                out.push('<');
                for (i, &arg) in app.args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.display(arg));
                }
                out.push('>');
                out
            }
            TypeKind::Functor(functor) => {
                let mut out = String::from("(");
                for (i, &param) in functor.params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.display(param));
                }
                let ret = functor
                    .return_type
                    .map_or_else(|| String::from("Nil"), |ret| self.display(ret));
                let _ = write!(out, ") => {ret}");
                out
            }
        }
    }

    // ------------------------------------------------------------------
    // Collector surface
    // ------------------------------------------------------------------

    /// Clears every mark bit ahead of a mark pass.
    pub fn clear_marks(&mut self) {
        for entry in self.entries.iter_mut().flatten() {
            entry.marked = false;
        }
    }

    /// Marks the descriptor at `root` and everything reachable from it.
    pub fn mark(&mut self, root: TypeId) {
        let mut pending = vec![root];

        while let Some(id) = pending.pop() {
            let Some(entry) = self.entries.get_mut(id.value() as usize).and_then(Option::as_mut)
            else {
                continue;
            };
            if entry.marked {
                continue;
            }
            entry.marked = true;

            match &entry.kind {
                TypeKind::Simple(simple) => {
                    pending.extend(simple.super_type);
                    pending.extend(simple.fields.values().copied());
                    pending.extend(simple.methods.values().copied());
                    pending.extend(simple.generics.iter().copied());
                }
                TypeKind::Functor(functor) => {
                    pending.extend(functor.params.iter().copied());
                    pending.extend(functor.return_type);
                    pending.extend(functor.generics.iter().copied());
                }
                TypeKind::Union(union) => {
                    pending.push(union.left);
                    pending.push(union.right);
                }
                TypeKind::Interface(interface) => {
                    pending.extend(interface.super_type);
                    pending.extend(interface.fields.values().copied());
                    pending.extend(interface.methods.values().copied());
                    pending.extend(interface.generics.iter().copied());
                }
                TypeKind::Application(app) => {
                    pending.push(app.target);
                    pending.extend(app.args.iter().copied());
                }
                TypeKind::Parameter(parameter) => {
                    pending.extend(parameter.bound);
                }
            }
        }
    }

    /// Frees every unmarked descriptor, then clears the surviving marks.
    ///
    /// Returns the number of descriptors freed.
    pub fn sweep(&mut self) -> usize {
        let mut freed = 0;

        for (index, slot) in self.entries.iter_mut().enumerate() {
            match slot {
                Some(entry) if entry.marked => entry.marked = false,
                Some(_) => {
                    *slot = None;
                    self.free_list.push(index as u32);
                    freed += 1;
                }
                None => {}
            }
        }

        freed
    }
}
