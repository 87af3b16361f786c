//! The type checker: a post-order AST walker.
//!
//! `check` drives every top-level statement from an environment pre-seeded
//! with the built-in typedefs; each node yields a type (or nothing, for
//! statements and failed subtrees), and expression results are recorded in
//! a node-to-type side table. Diagnostics go through the shared panic-mode
//! reporter, with the gate cleared at statement boundaries so one bad
//! construct costs one message while the walk continues.

use rustc_hash::FxHashMap;
use sable_ast::nodes::{
    FunctionKind,
    FunctionStmt,
    Ident,
    LambdaExpr,
    LiteralExpr,
    LiteralValue,
    NodeId,
    Param,
};
use sable_ast::{AnyNode, Ast};
use sable_parser::diagnostics::{ErrorLocation, Reporter};
use sable_parser::Parser;

use crate::builtins::Builtins;
use crate::env::TypeEnv;
use crate::modules::ModuleRegistry;
use crate::types::{
    ApplicationType,
    FunctorType,
    InterfaceType,
    SimpleType,
    TypeArena,
    TypeId,
    TypeKind,
    UnionType,
};

/// The checker context threaded through the walk.
///
/// The arena, module caches, and reporter are borrowed so an `import` can
/// hand them to a nested checker over the imported file's AST.
#[derive(Debug)]
pub struct Checker<'a> {
    ast: &'a Ast,
    pub(crate) arena: &'a mut TypeArena,
    pub(crate) builtins: Builtins,
    modules: &'a mut ModuleRegistry,
    reporter: &'a mut Reporter,
    pub(crate) env: TypeEnv,
    current_class: Option<TypeId>,
    current_func: Option<TypeId>,
    current_assignment: Option<TypeId>,
    current_line: usize,
    node_types: FxHashMap<NodeId, TypeId>,
}

impl<'a> Checker<'a> {
    /// Creates a checker over one AST with a fresh, pre-seeded top-level
    /// environment.
    pub fn new(
        ast: &'a Ast,
        arena: &'a mut TypeArena,
        builtins: Builtins,
        modules: &'a mut ModuleRegistry,
        reporter: &'a mut Reporter,
    ) -> Self {
        let mut env = TypeEnv::new();
        builtins.install_global_scope(arena, &mut env);

        Self {
            ast,
            arena,
            builtins,
            modules,
            reporter,
            env,
            current_class: None,
            current_func: None,
            current_assignment: None,
            current_line: 0,
            node_types: FxHashMap::default(),
        }
    }

    /// Checks a top-level statement sequence.
    ///
    /// Never aborts on the first error; the panic gate is cleared at each
    /// statement boundary so later statements still get diagnostics.
    pub fn check(&mut self, statements: &[NodeId]) {
        for &statement in statements {
            self.reporter.clear_panic();
            let _ = self.check_node(statement);
        }
    }

    /// Returns the node-to-type annotations recorded so far.
    #[must_use]
    pub const fn node_types(&self) -> &FxHashMap<NodeId, TypeId> { &self.node_types }

    /// Looks up a value binding, walking the scope stack outward.
    #[must_use]
    pub fn lookup_local(&self, name: &str) -> Option<TypeId> { self.env.lookup_local(name) }

    /// Looks up a type binding, walking the scope stack outward.
    #[must_use]
    pub fn lookup_typedef(&self, name: &str) -> Option<TypeId> { self.env.lookup_typedef(name) }

    /// Returns the environment, for root marking.
    #[must_use]
    pub const fn env(&self) -> &TypeEnv { &self.env }

    /// Returns the built-in singleton ids.
    #[must_use]
    pub const fn builtins(&self) -> &Builtins { &self.builtins }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    fn error_at_ident(&mut self, ident: &Ident, message: &str) {
        self.reporter.error(ident.line, ErrorLocation::At(ident.text.clone()), message);
    }

    fn error_at_lexeme(&mut self, line: usize, lexeme: &str, message: &str) {
        self.reporter.error(line, ErrorLocation::At(String::from(lexeme)), message);
    }

    pub(crate) fn error_bare(&mut self, message: &str) {
        self.reporter.error(self.current_line, ErrorLocation::Bare, message);
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    /// The type of a variable reference: locals first, then the builtin
    /// module table.
    fn variable_type(&mut self, name: &Ident) -> Option<TypeId> {
        if let Some(ty) = self.env.lookup_local(&name.text) {
            return Some(ty);
        }
        if let Some(ty) = self.modules.builtin(&name.text) {
            return Some(ty);
        }

        self.error_at_ident(name, "Undefined variable");

        None
    }

    /// Resolves a type name or reports `Undefined type`.
    fn typedef_or_error(&mut self, name: &Ident) -> Option<TypeId> {
        let found = self.env.lookup_typedef(&name.text);
        if found.is_none() {
            self.error_at_ident(name, "Undefined type");
        }

        found
    }

    // ------------------------------------------------------------------
    // The walker
    // ------------------------------------------------------------------

    /// Checks one node, returning its type when it has one.
    ///
    /// `None` marks statements and subtrees whose checking failed; callers
    /// skip further constraints on a `None` rather than cascading.
    #[allow(clippy::too_many_lines)]
    pub fn check_node(&mut self, id: NodeId) -> Option<TypeId> {
        let ast = self.ast;
        let result = match ast.get(id)? {
            AnyNode::Literal(literal) => Some(self.builtins.type_of_literal(&literal.value)),
            AnyNode::Variable(variable) => {
                let name = variable.name.clone();
                self.variable_type(&name)
            }
            AnyNode::Assign(assign) => {
                let name = assign.name.clone();
                let value = assign.value;
                let value_ty = self.check_node(value);
                let named_ty = self.variable_type(&name);

                if let (Some(value_ty), Some(named_ty)) = (value_ty, named_ty)
                    && !self.is_subtype(value_ty, named_ty)
                {
                    self.error_at_ident(&name, "Type mismatch");
                }

                named_ty.or(value_ty)
            }
            AnyNode::Unary(unary) => {
                let right = self.check_node(unary.right);
                match unary.op {
                    sable_ast::nodes::UnaryOp::Not => Some(self.builtins.bool_),
                    sable_ast::nodes::UnaryOp::Negate => right,
                }
            }
            AnyNode::Binary(binary) => {
                let (left, right) = (binary.left, binary.right);
                let left_ty = self.check_node(left);
                let _ = self.check_node(right);

                left_ty
            }
            AnyNode::Logical(logical) => {
                let (left, right) = (logical.left, logical.right);
                let _ = self.check_node(left);
                let _ = self.check_node(right);

                Some(self.builtins.bool_)
            }
            AnyNode::Call(call) => {
                let call = call.clone();
                self.check_call(&call)
            }
            AnyNode::GetItem(get_item) => {
                let get_item = *get_item;
                self.check_get_item(&get_item)
            }
            AnyNode::Get(get) => {
                let get = get.clone();
                let object_ty = self.check_node(get.object)?;
                let root = self.member_root(object_ty, &get.name)?;
                self.member_type(root, &get.name)
            }
            AnyNode::Set(set) => {
                let set = set.clone();
                let value_ty = self.check_node(set.value);
                let object_ty = self.check_node(set.object)?;
                let root = self.member_root(object_ty, &set.name)?;
                let field_ty = self.member_type(root, &set.name)?;

                if let Some(value_ty) = value_ty
                    && !self.is_subtype(value_ty, field_ty)
                {
                    self.error_at_ident(&set.name, "Type mismatch in setter");
                }

                Some(field_ty)
            }
            AnyNode::Super(super_expr) => {
                let method = super_expr.method.clone();
                let super_ty = self
                    .current_class
                    .and_then(|class| self.arena.as_simple(class))
                    .and_then(|simple| simple.super_type);

                let Some(super_ty) = super_ty else {
                    self.error_at_ident(&method, "Invalid field");
                    return None;
                };

                self.member_type(super_ty, &method)
            }
            AnyNode::This(_) => self.current_class,
            AnyNode::Yield(yield_expr) => {
                if let Some(expr) = yield_expr.expr {
                    let _ = self.check_node(expr);
                }

                Some(self.builtins.any)
            }
            AnyNode::Lambda(lambda) => {
                let lambda = lambda.clone();
                self.check_lambda(&lambda)
            }
            AnyNode::List(list) => {
                let list = list.clone();
                self.check_list(&list)
            }
            AnyNode::Map(map) => {
                let map = map.clone();
                self.check_map(&map)
            }
            AnyNode::If(if_expr) => {
                let if_expr = *if_expr;
                let _ = self.check_node(if_expr.condition);
                let then_ty = self.check_node(if_expr.then_branch);
                if let Some(else_branch) = if_expr.else_branch {
                    let _ = self.check_node(else_branch);
                }

                then_ty
            }
            AnyNode::Expression(statement) => {
                self.current_line = statement.line;
                self.check_node(statement.expr)
            }
            AnyNode::Var(var) => {
                let var = var.clone();
                self.check_var(&var);
                None
            }
            AnyNode::Block(block) => {
                let statements = block.statements.clone();
                for statement in statements {
                    let _ = self.check_node(statement);
                }

                None
            }
            AnyNode::Function(function) => {
                let function = function.clone();
                self.check_function(&function)
            }
            AnyNode::Class(class) => {
                let class = class.clone();
                self.check_class(&class)
            }
            AnyNode::Interface(interface) => {
                let interface = interface.clone();
                self.check_interface(&interface);
                None
            }
            AnyNode::While(while_stmt) => {
                let while_stmt = *while_stmt;
                let _ = self.check_node(while_stmt.condition);
                let _ = self.check_node(while_stmt.body);

                Some(self.builtins.nil)
            }
            AnyNode::For(for_stmt) => {
                let for_stmt = *for_stmt;
                if let Some(initializer) = for_stmt.initializer {
                    let _ = self.check_node(initializer);
                }
                if let Some(condition) = for_stmt.condition {
                    let _ = self.check_node(condition);
                }
                if let Some(increment) = for_stmt.increment {
                    let _ = self.check_node(increment);
                }
                let _ = self.check_node(for_stmt.body);

                Some(self.builtins.nil)
            }
            AnyNode::Break(_) => None,
            AnyNode::Return(return_stmt) => {
                let return_stmt = *return_stmt;
                let value_ty = match return_stmt.value {
                    None => self.builtins.nil,
                    Some(value) => self.check_node(value)?,
                };

                if let Some(functor) = self.current_func {
                    match self.arena.as_functor(functor).and_then(|f| f.return_type) {
                        Some(declared) => {
                            if !self.is_subtype(value_ty, declared) {
                                self.error_at_lexeme(
                                    return_stmt.line,
                                    "return",
                                    "Return type mismatch",
                                );
                            }
                        }
                        None => {
                            if let Some(functor) = self.arena.as_functor_mut(functor) {
                                functor.return_type = Some(value_ty);
                            }
                        }
                    }
                }

                Some(value_ty)
            }
            AnyNode::Import(import) => {
                let import = import.clone();
                let path = match ast.get(import.path) {
                    Some(AnyNode::Literal(LiteralExpr {
                        value: LiteralValue::Str(path), ..
                    })) => path.clone(),
                    _ => return None,
                };

                if let Some(module_ty) = self.import_file(&path, &import.name) {
                    self.env.define_local(&import.name.text, module_ty);
                }

                None
            }
            AnyNode::TypeDecl(decl) => {
                let decl = decl.clone();
                // Generic-parameter headers are consumed where they appear;
                // only the statement form carries a target.
                let target = decl.target?;

                self.env.push_scope();
                let _ = self.declare_generic_params(&decl.generics);
                let result = self.check_node(target);
                self.env.pop_scope();

                if let Some(ty) = result {
                    self.env.define_typedef(&decl.name.text, ty);
                }

                None
            }
            AnyNode::Enum(_) | AnyNode::EnumItem(_) | AnyNode::MethodSig(_) => None,
            AnyNode::SimpleType(simple) => {
                let simple = simple.clone();
                let target = self.typedef_or_error(&simple.name)?;

                if simple.generics.is_empty() {
                    Some(target)
                } else {
                    let args: Vec<TypeId> =
                        simple.generics.iter().filter_map(|&g| self.check_node(g)).collect();

                    Some(self.arena.alloc(TypeKind::Application(ApplicationType {
                        target,
                        args,
                    })))
                }
            }
            AnyNode::FunctorType(functor_node) => {
                let functor_node = functor_node.clone();

                self.env.push_scope();
                let generics = self.declare_generic_params(&functor_node.generics);
                let params: Vec<TypeId> = functor_node
                    .params
                    .clone()
                    .into_iter()
                    .map(|param| {
                        param
                            .and_then(|p| self.check_node(p))
                            .unwrap_or(self.builtins.any)
                    })
                    .collect();
                let return_type = functor_node.return_type.and_then(|r| self.check_node(r));
                self.env.pop_scope();

                Some(self.arena.alloc(TypeKind::Functor(FunctorType {
                    params,
                    return_type,
                    generics,
                })))
            }
            AnyNode::UnionType(union) => {
                let union = *union;
                let left = self.check_node(union.left)?;
                let right = self.check_node(union.right)?;

                Some(self.arena.alloc(TypeKind::Union(UnionType { left, right })))
            }
        };

        if let Some(ty) = result {
            drop(self.node_types.insert(id, ty));
        }

        result
    }

    // ------------------------------------------------------------------
    // Generic parameter headers
    // ------------------------------------------------------------------

    /// Evaluates a generic parameter header list into fresh parameter
    /// descriptors, binding each name in the innermost scope.
    fn declare_generic_params(&mut self, headers: &[NodeId]) -> Vec<TypeId> {
        let ast = self.ast;
        let mut out = Vec::with_capacity(headers.len());

        for &header in headers {
            let Some(AnyNode::TypeDecl(decl)) = ast.get(header) else {
                continue;
            };
            let decl = decl.clone();
            let bound = decl.target.and_then(|t| self.check_node(t));
            let parameter = self.arena.alloc(TypeKind::Parameter(crate::types::ParameterType {
                name: decl.name.text.clone(),
                bound,
            }));

            self.env.define_typedef(&decl.name.text, parameter);
            out.push(parameter);
        }

        out
    }

    // ------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------

    fn check_call(&mut self, call: &sable_ast::nodes::CallExpr) -> Option<TypeId> {
        self.current_line = call.line;
        let callee_ty = self.check_node(call.callee)?;

        let Some(functor) = self.arena.as_functor(callee_ty).cloned() else {
            self.error_at_lexeme(call.line, "(", "Type is not callable");
            return None;
        };

        self.env.push_scope();
        for &generic in &functor.generics {
            self.env.seed_open_generic(generic);
        }

        if call.args.len() != functor.params.len() {
            // Arity mismatch stays soft until varargs are settled.
            log::debug!(
                "call arity mismatch at line {}: {} arguments against {} parameters",
                call.line,
                call.args.len(),
                functor.params.len()
            );
        }

        for (index, &arg) in call.args.iter().enumerate() {
            let arg_ty = self.check_node(arg);
            let (Some(arg_ty), Some(&param_ty)) = (arg_ty, functor.params.get(index)) else {
                continue;
            };

            if !self.is_subtype(arg_ty, param_ty) {
                self.error_at_lexeme(call.line, "(", "Type mismatch");
                self.env.pop_scope();
                return None;
            }
        }

        // A generic return resolves against the bindings this call just
        // established, before the scope carrying them goes away.
        let mut return_ty = functor.return_type;
        if let Some(ret) = return_ty
            && matches!(self.arena.get(ret), TypeKind::Parameter(_))
            && let Some(resolved) = self.env.find_generic_resolution(ret)
        {
            return_ty = Some(resolved);
        }

        self.env.pop_scope();

        return_ty
    }

    // ------------------------------------------------------------------
    // Indexing
    // ------------------------------------------------------------------

    fn check_get_item(&mut self, get_item: &sable_ast::nodes::GetItemExpr) -> Option<TypeId> {
        self.current_line = get_item.line;
        let container_ty = self.check_node(get_item.object)?;

        if self.is_subtype(container_ty, self.builtins.list_def) {
            let index_ty = self.check_node(get_item.index);
            if let Some(index_ty) = index_ty
                && !self.is_subtype(index_ty, self.builtins.number)
            {
                self.error_bare("Index must be a number");
                return None;
            }

            return match self.arena.get(container_ty) {
                TypeKind::Application(app) if !app.args.is_empty() => Some(app.args[0]),
                _ => Some(self.builtins.never),
            };
        }

        if self.is_subtype(container_ty, self.builtins.map_def) {
            let index_ty = self.check_node(get_item.index);

            let args = match self.arena.get(container_ty) {
                TypeKind::Application(app) if app.args.len() == 2 => app.args.clone(),
                _ => return Some(self.builtins.never),
            };

            if let Some(index_ty) = index_ty
                && !self.is_subtype(index_ty, args[0])
            {
                self.error_bare("Key type mismatch");
                return None;
            }

            return Some(args[1]);
        }

        self.error_bare("Cannot get item on something other than a list or map");

        None
    }

    // ------------------------------------------------------------------
    // Member access
    // ------------------------------------------------------------------

    /// Resolves an object type to the nominal or structural type carrying
    /// its members.
    fn member_root(&mut self, object_ty: TypeId, name: &Ident) -> Option<TypeId> {
        match self.arena.get(object_ty) {
            TypeKind::Simple(_) | TypeKind::Interface(_) => Some(object_ty),
            TypeKind::Application(app) => Some(app.target),
            TypeKind::Parameter(parameter) => {
                let bound = parameter.bound;
                if bound.is_none() {
                    self.error_at_ident(name, "Attempting to get from invalid generic type.");
                }

                bound
            }
            TypeKind::Functor(_) | TypeKind::Union(_) => {
                self.error_at_ident(name, "Attempting to get from invalid type.");
                None
            }
        }
    }

    /// Looks up a member, methods before fields; reports `Invalid field`
    /// when absent.
    fn member_type(&mut self, root: TypeId, name: &Ident) -> Option<TypeId> {
        let found = match self.arena.get(root) {
            TypeKind::Simple(simple) => simple
                .methods
                .get(&name.text)
                .or_else(|| simple.fields.get(&name.text))
                .copied(),
            TypeKind::Interface(interface) => interface
                .methods
                .get(&name.text)
                .or_else(|| interface.fields.get(&name.text))
                .copied(),
            _ => None,
        };

        if found.is_none() {
            self.error_at_ident(name, "Invalid field");
        }

        found
    }

    // ------------------------------------------------------------------
    // Container literals
    // ------------------------------------------------------------------

    fn check_list(&mut self, list: &sable_ast::nodes::ListExpr) -> Option<TypeId> {
        let Some(annotated) = self.current_assignment else {
            // No annotation in sight: infer the element type from the first
            // item, `Never` when empty.
            let mut item_ty = None;
            for (index, &item) in list.items.iter().enumerate() {
                let ty = self.check_node(item);
                if index == 0 {
                    item_ty = ty;
                }
            }
            let item_ty = item_ty.unwrap_or(self.builtins.never);

            return Some(self.arena.alloc(TypeKind::Application(ApplicationType {
                target: self.builtins.list_def,
                args: vec![item_ty],
            })));
        };

        let TypeKind::Application(app) = self.arena.get(annotated) else {
            self.error_at_lexeme(list.line, "[", "Type mismatch");
            return Some(annotated);
        };
        let app = app.clone();

        if !self.is_subtype(self.builtins.list_def, app.target) {
            self.error_at_lexeme(list.line, "[", "Type mismatch, incompatible type");
            return Some(annotated);
        }
        if app.args.len() != 1 {
            self.error_at_lexeme(list.line, "[", "Type mismatch, missing type annotation");
            return Some(annotated);
        }

        let item_ty = app.args[0];
        let saved = self.current_assignment.replace(item_ty);
        for &item in &list.items {
            if let Some(ty) = self.check_node(item)
                && !self.is_subtype(ty, item_ty)
            {
                self.error_at_lexeme(list.line, "[", "Type mismatch, incompatible types");
            }
        }
        self.current_assignment = saved;

        Some(annotated)
    }

    fn check_map(&mut self, map: &sable_ast::nodes::MapExpr) -> Option<TypeId> {
        let Some(annotated) = self.current_assignment else {
            let mut key_ty = None;
            let mut value_ty = None;
            for (index, (&key, &value)) in map.keys.iter().zip(&map.values).enumerate() {
                let kt = self.check_node(key);
                let vt = self.check_node(value);
                if index == 0 {
                    key_ty = kt;
                    value_ty = vt;
                }
            }

            let key_ty = key_ty.unwrap_or(self.builtins.never);
            let value_ty = value_ty.unwrap_or(self.builtins.never);

            return Some(self.arena.alloc(TypeKind::Application(ApplicationType {
                target: self.builtins.map_def,
                args: vec![key_ty, value_ty],
            })));
        };

        let TypeKind::Application(app) = self.arena.get(annotated) else {
            self.error_at_lexeme(map.line, "{", "Type mismatch");
            return Some(annotated);
        };
        let app = app.clone();

        if !self.is_subtype(self.builtins.map_def, app.target) {
            self.error_at_lexeme(map.line, "{", "Type mismatch, incompatible type");
            return Some(annotated);
        }
        if app.args.len() != 2 {
            self.error_at_lexeme(map.line, "{", "Type mismatch, missing type annotation");
            return Some(annotated);
        }

        let (key_ty, value_ty) = (app.args[0], app.args[1]);
        let saved = self.current_assignment;
        for (&key, &value) in map.keys.iter().zip(&map.values) {
            self.current_assignment = Some(key_ty);
            if let Some(ty) = self.check_node(key)
                && !self.is_subtype(ty, key_ty)
            {
                self.error_at_lexeme(map.line, "{", "Map key type mismatch, incompatible types");
            }

            self.current_assignment = Some(value_ty);
            if let Some(ty) = self.check_node(value)
                && !self.is_subtype(ty, value_ty)
            {
                self.error_at_lexeme(map.line, "{", "Map value type mismatch, incompatible types");
            }
        }
        self.current_assignment = saved;

        Some(annotated)
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn check_var(&mut self, var: &sable_ast::nodes::VarStmt) {
        let mut var_ty = var.annotation.and_then(|t| self.check_node(t));

        if let Some(initializer) = var.initializer {
            let saved = self.current_assignment;
            self.current_assignment = var_ty;
            let value_ty = self.check_node(initializer);

            if let Some(declared) = var_ty {
                if let Some(value_ty) = value_ty
                    && !self.is_subtype(value_ty, declared)
                {
                    self.error_at_ident(&var.name, "Type mismatch in var");
                }
            } else {
                var_ty = value_ty;
            }
            self.current_assignment = saved;
        }

        self.env.define_local(&var.name.text, var_ty.unwrap_or(self.builtins.any));
    }

    /// Binds a parameter list in the current scope, returning the parameter
    /// types; missing annotations default to `Any`.
    fn bind_params(&mut self, params: &[Param]) -> Vec<TypeId> {
        let mut out = Vec::with_capacity(params.len());

        for param in params {
            let ty = param
                .annotation
                .and_then(|annotation| self.check_node(annotation))
                .unwrap_or(self.builtins.any);
            self.env.define_local(&param.name.text, ty);
            out.push(ty);
        }

        out
    }

    fn check_function(&mut self, function: &FunctionStmt) -> Option<TypeId> {
        self.env.push_scope();
        let generics = self.declare_generic_params(&function.generics);
        let functor = self.arena.alloc(TypeKind::Functor(FunctorType {
            params: Vec::new(),
            return_type: None,
            generics,
        }));
        let saved_func = self.current_func.replace(functor);

        let params = self.bind_params(&function.params);
        if let Some(f) = self.arena.as_functor_mut(functor) {
            f.params = params;
        }

        let return_ty = function.return_annotation.and_then(|r| self.check_node(r));
        if let Some(f) = self.arena.as_functor_mut(functor) {
            f.return_type = return_ty;
        }

        for &statement in &function.body {
            let _ = self.check_node(statement);
        }

        if let Some(f) = self.arena.as_functor_mut(functor)
            && f.return_type.is_none()
        {
            f.return_type = Some(self.builtins.nil);
        }

        self.env.pop_scope();
        self.env.define_local(&function.name.text, functor);
        self.current_func = saved_func;

        Some(functor)
    }

    fn check_lambda(&mut self, lambda: &LambdaExpr) -> Option<TypeId> {
        let ast = self.ast;
        let Some(AnyNode::FunctorType(signature)) = ast.get(lambda.signature) else {
            return None;
        };
        let signature = signature.clone();

        self.env.push_scope();
        let generics = self.declare_generic_params(&signature.generics);
        let functor = self.arena.alloc(TypeKind::Functor(FunctorType {
            params: Vec::new(),
            return_type: None,
            generics,
        }));
        let saved_func = self.current_func.replace(functor);

        let params = self.bind_params(&lambda.params);
        if let Some(f) = self.arena.as_functor_mut(functor) {
            f.params = params;
        }

        let return_ty = signature.return_type.and_then(|r| self.check_node(r));
        if let Some(f) = self.arena.as_functor_mut(functor) {
            f.return_type = return_ty;
        }

        for &statement in &lambda.body {
            let _ = self.check_node(statement);
        }

        if let Some(f) = self.arena.as_functor_mut(functor)
            && f.return_type.is_none()
        {
            f.return_type = Some(self.builtins.nil);
        }

        self.env.pop_scope();
        self.current_func = saved_func;

        Some(functor)
    }

    fn check_class(&mut self, class: &sable_ast::nodes::ClassStmt) -> Option<TypeId> {
        let ast = self.ast;

        let class_ty = self.arena.alloc(TypeKind::Simple(SimpleType::named(&class.name.text)));
        let saved_class = self.current_class.replace(class_ty);
        let constructor = self.arena.alloc(TypeKind::Functor(FunctorType::default()));

        self.env.push_scope();
        let generics = self.declare_generic_params(&class.generics);
        if let Some(simple) = self.arena.as_simple_mut(class_ty) {
            simple.generics = generics;
        }

        // The subclass starts from a copy of the superclass tables, so
        // same-named members override.
        if let Some(parent_name) = &class.superclass
            && let Some(parent) = self.typedef_or_error(parent_name)
        {
            if let Some(parent_simple) = self.arena.as_simple(parent) {
                let fields = parent_simple.fields.clone();
                let methods = parent_simple.methods.clone();
                if let Some(simple) = self.arena.as_simple_mut(class_ty) {
                    simple.fields = fields;
                    simple.methods = methods;
                    simple.super_type = Some(parent);
                }
            }
        }

        // First pass: every method signature lands in the method table so
        // mutually recursive methods type-check.
        let mut method_bodies: Vec<(NodeId, TypeId)> = Vec::new();
        for &member in &class.body {
            match ast.get(member) {
                Some(AnyNode::Function(method)) => {
                    let method = method.clone();
                    let params: Vec<TypeId> = method
                        .params
                        .iter()
                        .map(|p| {
                            p.annotation
                                .and_then(|a| self.check_node(a))
                                .unwrap_or(self.builtins.any)
                        })
                        .collect();

                    let return_type = if method.kind == FunctionKind::Initializer {
                        Some(class_ty)
                    } else {
                        method.return_annotation.and_then(|r| self.check_node(r))
                    };

                    if method.kind == FunctionKind::Initializer
                        && let Some(ctor) = self.arena.as_functor_mut(constructor)
                    {
                        ctor.params = params.clone();
                    }

                    let functor = self.arena.alloc(TypeKind::Functor(FunctorType {
                        params,
                        return_type,
                        generics: Vec::new(),
                    }));
                    if let Some(simple) = self.arena.as_simple_mut(class_ty) {
                        drop(simple.methods.insert(method.name.text.clone(), functor));
                    }
                    method_bodies.push((member, functor));
                }
                Some(AnyNode::Var(field)) => {
                    let field = field.clone();
                    let field_ty = field.annotation.and_then(|a| self.check_node(a));

                    if let Some(initializer) = field.initializer
                        && let Some(value_ty) = self.check_node(initializer)
                        && let Some(field_ty) = field_ty
                        && !self.is_subtype(value_ty, field_ty)
                    {
                        self.error_at_ident(&field.name, "Type mismatch.");
                    }

                    let field_ty = field_ty.unwrap_or(self.builtins.any);
                    if let Some(simple) = self.arena.as_simple_mut(class_ty) {
                        drop(simple.fields.insert(field.name.text.clone(), field_ty));
                    }
                }
                _ => {}
            }
        }

        // Second pass: bodies, with `this` bound to the class type.
        for (member, functor) in method_bodies {
            let Some(AnyNode::Function(method)) = ast.get(member) else {
                continue;
            };
            let method = method.clone();

            self.env.push_scope();
            self.env.define_local("this", class_ty);

            let params = self.arena.as_functor(functor).map(|f| f.params.clone());
            if let Some(params) = params {
                for (param, &ty) in method.params.iter().zip(&params) {
                    self.env.define_local(&param.name.text, ty);
                }
            }

            let saved_func = self.current_func.replace(functor);
            for &statement in &method.body {
                let _ = self.check_node(statement);
            }
            if let Some(f) = self.arena.as_functor_mut(functor)
                && f.return_type.is_none()
            {
                f.return_type = Some(self.builtins.nil);
            }
            self.current_func = saved_func;
            self.env.pop_scope();
        }

        if let Some(ctor) = self.arena.as_functor_mut(constructor) {
            ctor.return_type = Some(class_ty);
        }

        self.env.pop_scope();

        // The class name is both a value (its constructor) and a type.
        self.env.define_local(&class.name.text, constructor);
        self.env.define_typedef(&class.name.text, class_ty);
        self.current_class = saved_class;

        Some(class_ty)
    }

    fn check_interface(&mut self, interface: &sable_ast::nodes::InterfaceStmt) {
        let ast = self.ast;

        let iface_ty =
            self.arena.alloc(TypeKind::Interface(InterfaceType::named(&interface.name.text)));
        // Bound before the body so members can reference it recursively.
        self.env.define_typedef(&interface.name.text, iface_ty);

        if let Some(parent_name) = &interface.super_interface
            && let Some(parent) = self.typedef_or_error(parent_name)
        {
            let TypeKind::Interface(parent_iface) = self.arena.get(parent) else {
                self.error_at_ident(
                    parent_name,
                    "Parent type for interface may only be an interface.",
                );
                return;
            };

            let fields = parent_iface.fields.clone();
            let methods = parent_iface.methods.clone();
            if let TypeKind::Interface(iface) = self.arena.get_mut(iface_ty) {
                iface.fields = fields;
                iface.methods = methods;
                iface.super_type = Some(parent);
            }
        }

        self.env.push_scope();
        let generics = self.declare_generic_params(&interface.generics);
        if let TypeKind::Interface(iface) = self.arena.get_mut(iface_ty) {
            iface.generics = generics;
        }

        for &member in &interface.body {
            match ast.get(member) {
                Some(AnyNode::MethodSig(signature)) => {
                    let signature = signature.clone();
                    let params: Vec<TypeId> = signature
                        .params
                        .iter()
                        .map(|p| {
                            p.annotation
                                .and_then(|a| self.check_node(a))
                                .unwrap_or(self.builtins.any)
                        })
                        .collect();

                    let return_type = if signature.kind == FunctionKind::Initializer {
                        Some(iface_ty)
                    } else {
                        signature
                            .return_annotation
                            .and_then(|r| self.check_node(r))
                            .or(Some(self.builtins.nil))
                    };

                    let functor = self.arena.alloc(TypeKind::Functor(FunctorType {
                        params,
                        return_type,
                        generics: Vec::new(),
                    }));
                    if let TypeKind::Interface(iface) = self.arena.get_mut(iface_ty) {
                        drop(iface.methods.insert(signature.name.text.clone(), functor));
                    }
                }
                Some(AnyNode::Var(field)) => {
                    let field = field.clone();
                    let field_ty = field
                        .annotation
                        .and_then(|a| self.check_node(a))
                        .unwrap_or(self.builtins.any);
                    if let TypeKind::Interface(iface) = self.arena.get_mut(iface_ty) {
                        drop(iface.fields.insert(field.name.text.clone(), field_ty));
                    }
                }
                _ => {}
            }
        }

        self.env.pop_scope();
    }

    // ------------------------------------------------------------------
    // Imports
    // ------------------------------------------------------------------

    /// Resolves an import: cache hit, or a full parse and check of the file
    /// in a fresh top-level environment.
    fn import_file(&mut self, path: &str, name: &Ident) -> Option<TypeId> {
        if let Some(cached) = self.modules.module(path) {
            return Some(cached);
        }

        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(_) => {
                self.reporter.error(
                    name.line,
                    ErrorLocation::Bare,
                    &format!("Could not open file \"{path}\"."),
                );
                return None;
            }
        };

        let mut parser = Parser::new(&source);
        let statements = parser.parse_program().unwrap_or_default();
        let (module_ast, module_reporter) = parser.into_parts();
        self.reporter.absorb(module_reporter);

        let locals = {
            let mut child = Checker::new(
                &module_ast,
                self.arena,
                self.builtins,
                self.modules,
                self.reporter,
            );
            child.check(&statements);
            child.env.global_scope().locals.clone()
        };

        let mut module_type = SimpleType::named(&name.text);
        module_type.fields = locals;
        let module_ty = self.arena.alloc(TypeKind::Simple(module_type));
        self.modules.insert_module(path, module_ty);

        Some(module_ty)
    }
}
