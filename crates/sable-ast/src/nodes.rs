//! Node definitions for the Sable AST.
//!
//! Every node is one variant of the closed [`AnyNode`] set: expressions,
//! statements, and the type-expression subset that appears in annotations.
//! Children are stored by owning [`NodeId`]; shared subtrees are not allowed,
//! so every node has exactly one parent in the tree.

use std::fmt;

/// Unique identifier for a node in the AST pool.
///
/// `NodeId` is a newtype wrapper around `u32` indexing into [`crate::Ast`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a new `NodeId` with the given value.
    #[must_use]
    pub const fn new(id: u32) -> Self { Self(id) }

    /// Returns the inner value of the `NodeId`.
    #[must_use]
    pub const fn value(self) -> u32 { self.0 }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "node:{}", self.0) }
}

/// An identifier captured from the token stream.
///
/// The lexeme is copied out of the source buffer so nodes do not borrow it;
/// the line survives for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    /// The identifier text
    pub text: String,
    /// 1-indexed source line of the token
    pub line: usize,
}

impl Ident {
    /// Creates a new identifier.
    #[must_use]
    pub const fn new(text: String, line: usize) -> Self { Self { text, line } }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.text) }
}

/// A literal value embedded in the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// A numeric literal
    Number(f64),
    /// A boolean literal
    Bool(bool),
    /// The `nil` literal
    Nil,
    /// A string literal, quotes stripped
    Str(String),
    /// An atom literal, `#` prefix stripped
    Atom(String),
}

/// Binary and logical operators.
///
/// This is the binary-operator subset of the token enumeration; a
/// [`BinaryExpr`] can carry nothing else by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,
    /// `and`
    And,
    /// `or`
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::And => "and",
            Self::Or => "or",
        };

        write!(f, "{text}")
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Negate,
}

/// What kind of callable a function declaration introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// A free function or lambda
    Function,
    /// A method in a class or interface body
    Method,
    /// The `init` method of a class
    Initializer,
}

/// A declared parameter: a name plus an optional type annotation node.
#[derive(Debug, Clone)]
pub struct Param {
    /// Parameter name
    pub name: Ident,
    /// Type annotation node, when written
    pub annotation: Option<NodeId>,
}

// ============================================================================
// Expressions
// ============================================================================

/// A literal expression.
#[derive(Debug, Clone)]
pub struct LiteralExpr {
    /// The literal value
    pub value: LiteralValue,
    /// Source line of the literal token
    pub line: usize,
}

/// A variable reference.
#[derive(Debug, Clone)]
pub struct VariableExpr {
    /// The referenced name
    pub name: Ident,
}

/// An assignment to a named variable (`name = value`).
#[derive(Debug, Clone)]
pub struct AssignExpr {
    /// The assigned name
    pub name: Ident,
    /// The value expression
    pub value: NodeId,
}

/// A unary operation (`!x`, `-x`).
#[derive(Debug, Clone, Copy)]
pub struct UnaryExpr {
    /// The operator
    pub op: UnaryOp,
    /// The operand
    pub right: NodeId,
}

/// A binary operation, including the short-circuit `and`/`or` forms.
#[derive(Debug, Clone, Copy)]
pub struct BinaryExpr {
    /// The operator
    pub op: BinaryOp,
    /// Source line of the operator token
    pub line: usize,
    /// Left operand
    pub left: NodeId,
    /// Right operand
    pub right: NodeId,
}

/// A short-circuit logical operation.
///
/// The parser emits [`BinaryExpr`] for `and`/`or`; this variant exists for
/// passes that rewrite short-circuit forms explicitly.
#[derive(Debug, Clone, Copy)]
pub struct LogicalExpr {
    /// The operator (`And` or `Or`)
    pub op: BinaryOp,
    /// Left operand
    pub left: NodeId,
    /// Right operand
    pub right: NodeId,
}

/// A call expression (`callee(args...)`).
#[derive(Debug, Clone)]
pub struct CallExpr {
    /// The callee expression
    pub callee: NodeId,
    /// Argument expressions; at most 255
    pub args: Vec<NodeId>,
    /// Source line of the opening parenthesis
    pub line: usize,
}

/// A property read (`object.name`).
#[derive(Debug, Clone)]
pub struct GetExpr {
    /// The object expression
    pub object: NodeId,
    /// The property name
    pub name: Ident,
}

/// A property write (`object.name = value`).
#[derive(Debug, Clone)]
pub struct SetExpr {
    /// The object expression
    pub object: NodeId,
    /// The property name
    pub name: Ident,
    /// The value expression
    pub value: NodeId,
}

/// An index read (`object[index]`).
#[derive(Debug, Clone, Copy)]
pub struct GetItemExpr {
    /// The container expression
    pub object: NodeId,
    /// The index expression
    pub index: NodeId,
    /// Source line of the opening bracket
    pub line: usize,
}

/// A list literal (`[a, b, c]`).
#[derive(Debug, Clone)]
pub struct ListExpr {
    /// Item expressions
    pub items: Vec<NodeId>,
    /// Source line of the opening bracket
    pub line: usize,
}

/// A map literal (`{k: v, ...}`); keys and values are parallel vectors.
#[derive(Debug, Clone)]
pub struct MapExpr {
    /// Key expressions
    pub keys: Vec<NodeId>,
    /// Value expressions, parallel to `keys`
    pub values: Vec<NodeId>,
    /// Source line of the opening brace
    pub line: usize,
}

/// A lambda (`fun (params) => body`).
///
/// `signature` is always a [`FunctorTypeNode`] whose parameter count equals
/// `params.len()`.
#[derive(Debug, Clone)]
pub struct LambdaExpr {
    /// Declared parameters
    pub params: Vec<Param>,
    /// Body statements
    pub body: Vec<NodeId>,
    /// The functor type node describing this lambda's signature
    pub signature: NodeId,
}

/// A superclass method reference (`super.name`).
#[derive(Debug, Clone)]
pub struct SuperExpr {
    /// The referenced method name
    pub method: Ident,
}

/// A reference to the current instance (`this`).
#[derive(Debug, Clone, Copy)]
pub struct ThisExpr {
    /// Source line of the `this` token
    pub line: usize,
}

/// A yield expression, suspending the current task.
#[derive(Debug, Clone, Copy)]
pub struct YieldExpr {
    /// The yielded directive, if any
    pub expr: Option<NodeId>,
}

/// A conditional (`if (cond) stmt else stmt`); parsed in prefix position, so
/// it is usable as an expression whose type is the `then` branch's.
#[derive(Debug, Clone, Copy)]
pub struct IfExpr {
    /// The condition expression
    pub condition: NodeId,
    /// The `then` branch statement
    pub then_branch: NodeId,
    /// The `else` branch statement, if present
    pub else_branch: Option<NodeId>,
}

// ============================================================================
// Statements
// ============================================================================

/// An expression evaluated for its effect.
#[derive(Debug, Clone, Copy)]
pub struct ExpressionStmt {
    /// The inner expression
    pub expr: NodeId,
    /// Source line where the statement begins
    pub line: usize,
}

/// A variable declaration, with optional annotation and initializer.
#[derive(Debug, Clone)]
pub struct VarStmt {
    /// The declared name
    pub name: Ident,
    /// Type annotation node, when written
    pub annotation: Option<NodeId>,
    /// Initializer expression, when written
    pub initializer: Option<NodeId>,
}

/// A brace-delimited statement block.
#[derive(Debug, Clone)]
pub struct BlockStmt {
    /// The contained statements
    pub statements: Vec<NodeId>,
}

/// A named function declaration.
#[derive(Debug, Clone)]
pub struct FunctionStmt {
    /// The function name
    pub name: Ident,
    /// Declared parameters
    pub params: Vec<Param>,
    /// Return type annotation node, when written
    pub return_annotation: Option<NodeId>,
    /// Generic parameter headers ([`TypeDeclStmt`] nodes)
    pub generics: Vec<NodeId>,
    /// Body statements
    pub body: Vec<NodeId>,
    /// What kind of callable this declares
    pub kind: FunctionKind,
}

/// A class declaration. The body contains only [`FunctionStmt`] (methods)
/// and [`VarStmt`] (fields).
#[derive(Debug, Clone)]
pub struct ClassStmt {
    /// The class name
    pub name: Ident,
    /// Superclass name, when `extends` is written
    pub superclass: Option<Ident>,
    /// Generic parameter headers
    pub generics: Vec<NodeId>,
    /// Member declarations
    pub body: Vec<NodeId>,
}

/// An interface declaration. The body contains only [`MethodSigStmt`] and
/// [`VarStmt`] members (no bodies).
#[derive(Debug, Clone)]
pub struct InterfaceStmt {
    /// The interface name
    pub name: Ident,
    /// Super-interface name, when `extends` is written
    pub super_interface: Option<Ident>,
    /// Generic parameter headers
    pub generics: Vec<NodeId>,
    /// Member declarations
    pub body: Vec<NodeId>,
}

/// A while loop.
#[derive(Debug, Clone, Copy)]
pub struct WhileStmt {
    /// The loop condition
    pub condition: NodeId,
    /// The loop body statement
    pub body: NodeId,
}

/// A C-style for loop; every clause is optional.
#[derive(Debug, Clone, Copy)]
pub struct ForStmt {
    /// Initializer statement
    pub initializer: Option<NodeId>,
    /// Condition expression
    pub condition: Option<NodeId>,
    /// Increment expression
    pub increment: Option<NodeId>,
    /// The loop body statement
    pub body: NodeId,
}

/// A break statement.
#[derive(Debug, Clone, Copy)]
pub struct BreakStmt {
    /// Source line of the `break` token
    pub line: usize,
}

/// A return statement.
#[derive(Debug, Clone, Copy)]
pub struct ReturnStmt {
    /// The returned expression, if any
    pub value: Option<NodeId>,
    /// Source line of the `return` token
    pub line: usize,
}

/// An import statement (`import "path" as Name`).
#[derive(Debug, Clone)]
pub struct ImportStmt {
    /// The path literal node
    pub path: NodeId,
    /// The binding name
    pub name: Ident,
}

/// A type declaration.
///
/// Doubles as a generic-parameter header: in `<T extends U>` each parameter
/// is a `TypeDeclStmt` whose `target` is the optional `extends` bound; in
/// `type X = T` the `target` is the aliased type.
#[derive(Debug, Clone)]
pub struct TypeDeclStmt {
    /// The declared type name
    pub name: Ident,
    /// Generic parameter headers
    pub generics: Vec<NodeId>,
    /// Aliased type or `extends` bound
    pub target: Option<NodeId>,
}

/// An enum declaration.
#[derive(Debug, Clone)]
pub struct EnumStmt {
    /// The enum name
    pub name: Ident,
    /// Item nodes ([`EnumItemStmt`])
    pub items: Vec<NodeId>,
}

/// One item of an enum declaration.
#[derive(Debug, Clone)]
pub struct EnumItemStmt {
    /// The item name
    pub name: Ident,
}

/// A bodiless method signature inside an interface.
#[derive(Debug, Clone)]
pub struct MethodSigStmt {
    /// The method name
    pub name: Ident,
    /// Declared parameters
    pub params: Vec<Param>,
    /// Return type annotation node, when written
    pub return_annotation: Option<NodeId>,
    /// Generic parameter headers
    pub generics: Vec<NodeId>,
    /// What kind of callable this declares
    pub kind: FunctionKind,
}

// ============================================================================
// Type expressions
// ============================================================================

/// A named type reference, optionally applied to generic arguments
/// (`Number`, `List<Number>`).
#[derive(Debug, Clone)]
pub struct SimpleTypeNode {
    /// The type name
    pub name: Ident,
    /// Generic argument type nodes
    pub generics: Vec<NodeId>,
}

/// A functor (callable) type annotation (`(A, B) => R`).
///
/// Parameter entries are `None` where the surface syntax omitted an
/// annotation, so the arity always matches the parameter list it describes.
#[derive(Debug, Clone)]
pub struct FunctorTypeNode {
    /// Parameter type nodes; `None` marks an unannotated slot
    pub params: Vec<Option<NodeId>>,
    /// Return type node, when written
    pub return_type: Option<NodeId>,
    /// Generic parameter headers
    pub generics: Vec<NodeId>,
}

/// A union type annotation (`A | B`); n-ary unions are right-associated.
#[derive(Debug, Clone, Copy)]
pub struct UnionTypeNode {
    /// Left alternative
    pub left: NodeId,
    /// Right alternative
    pub right: NodeId,
}

// ============================================================================
// The closed variant set
// ============================================================================

/// The closed set of AST node variants.
#[derive(Debug, Clone)]
pub enum AnyNode {
    // Expressions
    /// Literal expression
    Literal(LiteralExpr),
    /// Variable reference
    Variable(VariableExpr),
    /// Variable assignment
    Assign(AssignExpr),
    /// Unary operation
    Unary(UnaryExpr),
    /// Binary operation
    Binary(BinaryExpr),
    /// Short-circuit logical operation
    Logical(LogicalExpr),
    /// Call expression
    Call(CallExpr),
    /// Property read
    Get(GetExpr),
    /// Property write
    Set(SetExpr),
    /// Index read
    GetItem(GetItemExpr),
    /// List literal
    List(ListExpr),
    /// Map literal
    Map(MapExpr),
    /// Lambda expression
    Lambda(LambdaExpr),
    /// Superclass method reference
    Super(SuperExpr),
    /// `this` reference
    This(ThisExpr),
    /// Yield expression
    Yield(YieldExpr),
    /// Conditional
    If(IfExpr),

    // Statements
    /// Expression statement
    Expression(ExpressionStmt),
    /// Variable declaration
    Var(VarStmt),
    /// Statement block
    Block(BlockStmt),
    /// Function declaration
    Function(FunctionStmt),
    /// Class declaration
    Class(ClassStmt),
    /// Interface declaration
    Interface(InterfaceStmt),
    /// While loop
    While(WhileStmt),
    /// For loop
    For(ForStmt),
    /// Break statement
    Break(BreakStmt),
    /// Return statement
    Return(ReturnStmt),
    /// Import statement
    Import(ImportStmt),
    /// Type declaration / generic-parameter header
    TypeDecl(TypeDeclStmt),
    /// Enum declaration
    Enum(EnumStmt),
    /// Enum item
    EnumItem(EnumItemStmt),
    /// Interface method signature
    MethodSig(MethodSigStmt),

    // Type expressions
    /// Named type reference
    SimpleType(SimpleTypeNode),
    /// Functor type annotation
    FunctorType(FunctorTypeNode),
    /// Union type annotation
    UnionType(UnionTypeNode),
}

impl AnyNode {
    /// Returns the child node ids of this node, in source order.
    ///
    /// Used by tree traversals and by the mark phase of the collector.
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Self::Literal(_)
            | Self::Variable(_)
            | Self::This(_)
            | Self::Super(_)
            | Self::Break(_)
            | Self::EnumItem(_) => Vec::new(),
            Self::Assign(node) => vec![node.value],
            Self::Unary(node) => vec![node.right],
            Self::Binary(node) => vec![node.left, node.right],
            Self::Logical(node) => vec![node.left, node.right],
            Self::Call(node) => {
                let mut out = vec![node.callee];
                out.extend(&node.args);
                out
            }
            Self::Get(node) => vec![node.object],
            Self::Set(node) => vec![node.object, node.value],
            Self::GetItem(node) => vec![node.object, node.index],
            Self::List(node) => node.items.clone(),
            Self::Map(node) => {
                let mut out = node.keys.clone();
                out.extend(&node.values);
                out
            }
            Self::Lambda(node) => {
                let mut out = vec![node.signature];
                out.extend(node.params.iter().filter_map(|p| p.annotation));
                out.extend(&node.body);
                out
            }
            Self::Yield(node) => node.expr.into_iter().collect(),
            Self::If(node) => {
                let mut out = vec![node.condition, node.then_branch];
                out.extend(node.else_branch);
                out
            }
            Self::Expression(node) => vec![node.expr],
            Self::Var(node) => node.annotation.into_iter().chain(node.initializer).collect(),
            Self::Block(node) => node.statements.clone(),
            Self::Function(node) => {
                let mut out = node.generics.clone();
                out.extend(node.params.iter().filter_map(|p| p.annotation));
                out.extend(node.return_annotation);
                out.extend(&node.body);
                out
            }
            Self::Class(node) => {
                let mut out = node.generics.clone();
                out.extend(&node.body);
                out
            }
            Self::Interface(node) => {
                let mut out = node.generics.clone();
                out.extend(&node.body);
                out
            }
            Self::While(node) => vec![node.condition, node.body],
            Self::For(node) => {
                let mut out: Vec<NodeId> = node.initializer.into_iter().collect();
                out.extend(node.condition);
                out.extend(node.increment);
                out.push(node.body);
                out
            }
            Self::Return(node) => node.value.into_iter().collect(),
            Self::Import(node) => vec![node.path],
            Self::TypeDecl(node) => {
                let mut out = node.generics.clone();
                out.extend(node.target);
                out
            }
            Self::Enum(node) => node.items.clone(),
            Self::MethodSig(node) => {
                let mut out = node.generics.clone();
                out.extend(node.params.iter().filter_map(|p| p.annotation));
                out.extend(node.return_annotation);
                out
            }
            Self::SimpleType(node) => node.generics.clone(),
            Self::FunctorType(node) => {
                let mut out: Vec<NodeId> = node.generics.clone();
                out.extend(node.params.iter().copied().flatten());
                out.extend(node.return_type);
                out
            }
            Self::UnionType(node) => vec![node.left, node.right],
        }
    }
}
