//! Built-in type singletons.
//!
//! `Builtins::install` is the process-startup step that creates the
//! primitive singletons (`Number`, `Bool`, `Nil`, `Atom`, `String`,
//! `Never`, `Any`) and the generic targets (`List`, `Map`, `Task`).
//! `install_global_scope` seeds a fresh top-level environment with them;
//! `List` and `Map` land in both `typedefs` (as types) and `locals` (as
//! their `init` constructor functor).

use sable_ast::nodes::LiteralValue;

use crate::env::TypeEnv;
use crate::types::{
    ApplicationType,
    FunctorType,
    ParameterType,
    SimpleType,
    TypeArena,
    TypeId,
    TypeKind,
};

/// Ids of the built-in singleton descriptors.
///
/// These are process-wide: one arena holds them for the lifetime of the
/// checker, and every environment's global scope points at the same ids.
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    /// The `Number` type
    pub number: TypeId,
    /// The `Bool` type
    pub bool_: TypeId,
    /// The `Nil` type
    pub nil: TypeId,
    /// The `Atom` type
    pub atom: TypeId,
    /// The `String` type
    pub string: TypeId,
    /// The `Never` bottom type
    pub never: TypeId,
    /// The `Any` top type
    pub any: TypeId,
    /// The generic `List` target
    pub list_def: TypeId,
    /// The generic `Map` target
    pub map_def: TypeId,
    /// The `Task` handle type
    pub task_def: TypeId,
}

impl Builtins {
    /// Creates every built-in singleton in the given arena.
    pub fn install(arena: &mut TypeArena) -> Self {
        let number = arena.alloc(TypeKind::Simple(SimpleType::named("Number")));
        let bool_ = arena.alloc(TypeKind::Simple(SimpleType::named("Bool")));
        let nil = arena.alloc(TypeKind::Simple(SimpleType::named("Nil")));
        let atom = arena.alloc(TypeKind::Simple(SimpleType::named("Atom")));
        let string = arena.alloc(TypeKind::Simple(SimpleType::named("String")));
        let never = arena.alloc(TypeKind::Simple(SimpleType::named("Never")));
        let any = arena.alloc(TypeKind::Simple(SimpleType::named("Any")));
        let list_def = make_list_type_def(arena, number, nil);
        let map_def = make_map_type_def(arena, number, nil, bool_);
        let task_def = arena.alloc(TypeKind::Simple(SimpleType::named("Task")));

        Self { number, bool_, nil, atom, string, never, any, list_def, map_def, task_def }
    }

    /// Seeds a top-level environment with the built-in bindings.
    pub fn install_global_scope(&self, arena: &TypeArena, env: &mut TypeEnv) {
        env.define_typedef("Number", self.number);
        env.define_typedef("Nil", self.nil);
        env.define_typedef("Bool", self.bool_);
        env.define_typedef("Atom", self.atom);
        env.define_typedef("String", self.string);
        env.define_typedef("Never", self.never);
        env.define_typedef("Any", self.any);
        env.define_typedef("Task", self.task_def);
        define_local_and_typedef(arena, env, "List", self.list_def);
        define_local_and_typedef(arena, env, "Map", self.map_def);
    }

    /// The singleton for a literal's runtime kind.
    #[must_use]
    pub fn type_of_literal(&self, value: &LiteralValue) -> TypeId {
        match value {
            LiteralValue::Number(_) => self.number,
            LiteralValue::Bool(_) => self.bool_,
            LiteralValue::Nil => self.nil,
            LiteralValue::Str(_) => self.string,
            LiteralValue::Atom(_) => self.atom,
        }
    }
}

/// Binds a generic target under `name` as both a type and, through its
/// `init` method, a constructor local.
fn define_local_and_typedef(arena: &TypeArena, env: &mut TypeEnv, name: &str, ty: TypeId) {
    env.define_typedef(name, ty);

    if let Some(init) = arena.as_simple(ty).and_then(|simple| simple.methods.get("init")) {
        env.define_local(name, *init);
    }
}

/// `List<T>` with an `init` constructor and the element-typed methods the
/// runtime list module exposes.
fn make_list_type_def(arena: &mut TypeArena, number: TypeId, nil: TypeId) -> TypeId {
    let t = arena.alloc(TypeKind::Parameter(ParameterType { name: String::from("T"), bound: None }));

    let mut list = SimpleType::named("List");
    list.generics = vec![t];
    let list_id = arena.alloc(TypeKind::Simple(list));

    let applied =
        arena.alloc(TypeKind::Application(ApplicationType { target: list_id, args: vec![t] }));

    let init = arena.alloc(TypeKind::Functor(FunctorType {
        params: Vec::new(),
        return_type: Some(list_id),
        generics: Vec::new(),
    }));
    let push = arena.alloc(TypeKind::Functor(FunctorType {
        params: vec![t],
        return_type: Some(nil),
        generics: Vec::new(),
    }));
    let pop = arena.alloc(TypeKind::Functor(FunctorType {
        params: Vec::new(),
        return_type: Some(t),
        generics: Vec::new(),
    }));
    let length = arena.alloc(TypeKind::Functor(FunctorType {
        params: Vec::new(),
        return_type: Some(number),
        generics: Vec::new(),
    }));
    let copy = arena.alloc(TypeKind::Functor(FunctorType {
        params: Vec::new(),
        return_type: Some(applied),
        generics: Vec::new(),
    }));

    if let Some(simple) = arena.as_simple_mut(list_id) {
        drop(simple.methods.insert(String::from("init"), init));
        drop(simple.methods.insert(String::from("push"), push));
        drop(simple.methods.insert(String::from("pop"), pop));
        drop(simple.methods.insert(String::from("length"), length));
        drop(simple.methods.insert(String::from("copy"), copy));
    }

    list_id
}

/// `Map<K, V>` with an `init` constructor and key/value-typed methods.
fn make_map_type_def(arena: &mut TypeArena, number: TypeId, nil: TypeId, bool_: TypeId) -> TypeId {
    let k = arena.alloc(TypeKind::Parameter(ParameterType { name: String::from("K"), bound: None }));
    let v = arena.alloc(TypeKind::Parameter(ParameterType { name: String::from("V"), bound: None }));

    let mut map = SimpleType::named("Map");
    map.generics = vec![k, v];
    let map_id = arena.alloc(TypeKind::Simple(map));

    let init = arena.alloc(TypeKind::Functor(FunctorType {
        params: Vec::new(),
        return_type: Some(map_id),
        generics: Vec::new(),
    }));
    let set = arena.alloc(TypeKind::Functor(FunctorType {
        params: vec![k, v],
        return_type: Some(nil),
        generics: Vec::new(),
    }));
    let get = arena.alloc(TypeKind::Functor(FunctorType {
        params: vec![k],
        return_type: Some(v),
        generics: Vec::new(),
    }));
    let has = arena.alloc(TypeKind::Functor(FunctorType {
        params: vec![k],
        return_type: Some(bool_),
        generics: Vec::new(),
    }));
    let length = arena.alloc(TypeKind::Functor(FunctorType {
        params: Vec::new(),
        return_type: Some(number),
        generics: Vec::new(),
    }));

    if let Some(simple) = arena.as_simple_mut(map_id) {
        drop(simple.methods.insert(String::from("init"), init));
        drop(simple.methods.insert(String::from("set"), set));
        drop(simple.methods.insert(String::from("get"), get));
        drop(simple.methods.insert(String::from("has"), has));
        drop(simple.methods.insert(String::from("length"), length));
    }

    map_id
}
