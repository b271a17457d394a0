use codespan::Span;
use std::fmt;

/// Root of a parsed source file. Top-level order is preserved: the code
/// generator hoists nothing, it only forward-declares classes.
#[derive(Debug, Clone)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    VarDecl(VarDecl),
    Expr(Expr, Span),
    Block(Block),
    If(IfStmt),
    While {
        test: Expr,
        body: Block,
        span: Span,
    },
    For(ForStmt),
    Function(FunctionDecl),
    Class(ClassDecl),
    Return {
        argument: Option<Expr>,
        span: Span,
    },
}

#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub test: Expr,
    pub consequent: Block,
    pub alternate: Option<Box<ElseBranch>>,
    pub span: Span,
}

/// The `else` arm is either another `if` (else-if chain) or a plain block.
#[derive(Debug, Clone)]
pub enum ElseBranch {
    ElseIf(IfStmt),
    Else(Block),
}

#[derive(Debug, Clone)]
pub struct ForStmt {
    pub init: Option<ForInit>,
    pub test: Option<Expr>,
    pub update: Option<Expr>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ForInit {
    VarDecl(VarDecl),
    Expr(Expr),
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub body: Vec<MethodDef>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MethodDef {
    pub key: String,
    pub kind: MethodKind,
    pub params: Vec<String>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MethodKind {
    Constructor,
    Method,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Ident(String, Span),
    Int(i64, Span),
    Str(String, Span),
    Bool(bool, Span),
    Assign(Box<Expr>, Box<Expr>, Span),
    Binary(Box<Expr>, BinOp, Box<Expr>, Span),
    Logical(Box<Expr>, LogicalOp, Box<Expr>, Span),
    Unary(UnOp, Box<Expr>, Span),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    /// `computed` is decided at parse time: `a[b]` is computed, `a.b` is not.
    /// For non-computed access the property is always an `Ident`.
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
        computed: bool,
        span: Span,
    },
    Array(Vec<Expr>, Span),
    Object(Vec<Property>, Span),
    This(Span),
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    /// Debug-print construct: `first <expr>`.
    First(Box<Expr>, Span),
}

#[derive(Debug, Clone)]
pub struct Property {
    pub key: PropertyKey,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum PropertyKey {
    Ident(String),
    Str(String),
}

impl PropertyKey {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyKey::Ident(name) => name,
            PropertyKey::Str(value) => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnOp {
    Neg,
    Not,
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::LtEq => "<=",
            BinOp::GtEq => ">=",
        })
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        })
    }
}

impl fmt::Display for UnOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        })
    }
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(_, span) => *span,
            Expr::Int(_, span) => *span,
            Expr::Str(_, span) => *span,
            Expr::Bool(_, span) => *span,
            Expr::Assign(_, _, span) => *span,
            Expr::Binary(_, _, _, span) => *span,
            Expr::Logical(_, _, _, span) => *span,
            Expr::Unary(_, _, span) => *span,
            Expr::Call { span, .. } => *span,
            Expr::Member { span, .. } => *span,
            Expr::Array(_, span) => *span,
            Expr::Object(_, span) => *span,
            Expr::This(span) => *span,
            Expr::New { span, .. } => *span,
            Expr::First(_, span) => *span,
        }
    }

    /// Node kind name, used by codegen error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Expr::Ident(..) => "Identifier",
            Expr::Int(..) => "NumericLiteral",
            Expr::Str(..) => "StringLiteral",
            Expr::Bool(..) => "BooleanLiteral",
            Expr::Assign(..) => "AssignmentExpression",
            Expr::Binary(..) => "BinaryExpression",
            Expr::Logical(..) => "LogicalExpression",
            Expr::Unary(..) => "UnaryExpression",
            Expr::Call { .. } => "CallExpression",
            Expr::Member { .. } => "MemberExpression",
            Expr::Array(..) => "ArrayExpression",
            Expr::Object(..) => "ObjectExpression",
            Expr::This(..) => "ThisExpression",
            Expr::New { .. } => "NewExpression",
            Expr::First(..) => "FirstExpression",
        }
    }
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl(decl) => decl.span,
            Stmt::Expr(_, span) => *span,
            Stmt::Block(block) => block.span,
            Stmt::If(stmt) => stmt.span,
            Stmt::While { span, .. } => *span,
            Stmt::For(stmt) => stmt.span,
            Stmt::Function(func) => func.span,
            Stmt::Class(class) => class.span,
            Stmt::Return { span, .. } => *span,
        }
    }
}

/// Pre-order walk over every statement and expression in a subtree.
///
/// Both codegen analyses (include discovery and constructor field inference)
/// need to see arbitrarily nested nodes, so the per-variant traversal lives
/// here rather than being re-derived in each pass.
pub fn walk_stmt(stmt: &Stmt, f: &mut impl FnMut(&Expr)) {
    match stmt {
        Stmt::VarDecl(decl) => {
            if let Some(init) = &decl.init {
                walk_expr(init, f);
            }
        }
        Stmt::Expr(expr, _) => walk_expr(expr, f),
        Stmt::Block(block) => {
            for stmt in &block.body {
                walk_stmt(stmt, f);
            }
        }
        Stmt::If(stmt) => walk_if(stmt, f),
        Stmt::While { test, body, .. } => {
            walk_expr(test, f);
            for stmt in &body.body {
                walk_stmt(stmt, f);
            }
        }
        Stmt::For(stmt) => {
            match &stmt.init {
                Some(ForInit::VarDecl(decl)) => {
                    if let Some(init) = &decl.init {
                        walk_expr(init, f);
                    }
                }
                Some(ForInit::Expr(expr)) => walk_expr(expr, f),
                None => {}
            }
            if let Some(test) = &stmt.test {
                walk_expr(test, f);
            }
            if let Some(update) = &stmt.update {
                walk_expr(update, f);
            }
            for stmt in &stmt.body.body {
                walk_stmt(stmt, f);
            }
        }
        Stmt::Function(func) => {
            for stmt in &func.body.body {
                walk_stmt(stmt, f);
            }
        }
        Stmt::Class(class) => {
            for method in &class.body {
                for stmt in &method.body.body {
                    walk_stmt(stmt, f);
                }
            }
        }
        Stmt::Return { argument, .. } => {
            if let Some(expr) = argument {
                walk_expr(expr, f);
            }
        }
    }
}

fn walk_if(stmt: &IfStmt, f: &mut impl FnMut(&Expr)) {
    walk_expr(&stmt.test, f);
    for stmt in &stmt.consequent.body {
        walk_stmt(stmt, f);
    }
    match stmt.alternate.as_deref() {
        Some(ElseBranch::ElseIf(else_if)) => walk_if(else_if, f),
        Some(ElseBranch::Else(block)) => {
            for stmt in &block.body {
                walk_stmt(stmt, f);
            }
        }
        None => {}
    }
}

pub fn walk_expr(expr: &Expr, f: &mut impl FnMut(&Expr)) {
    f(expr);
    match expr {
        Expr::Ident(..) | Expr::Int(..) | Expr::Str(..) | Expr::Bool(..) | Expr::This(..) => {}
        Expr::Assign(left, right, _) => {
            walk_expr(left, f);
            walk_expr(right, f);
        }
        Expr::Binary(left, _, right, _) | Expr::Logical(left, _, right, _) => {
            walk_expr(left, f);
            walk_expr(right, f);
        }
        Expr::Unary(_, argument, _) => walk_expr(argument, f),
        Expr::Call { callee, args, .. } | Expr::New { callee, args, .. } => {
            walk_expr(callee, f);
            for arg in args {
                walk_expr(arg, f);
            }
        }
        Expr::Member {
            object, property, ..
        } => {
            walk_expr(object, f);
            walk_expr(property, f);
        }
        Expr::Array(elements, _) => {
            for element in elements {
                walk_expr(element, f);
            }
        }
        Expr::Object(properties, _) => {
            for property in properties {
                walk_expr(&property.value, f);
            }
        }
        Expr::First(argument, _) => walk_expr(argument, f),
    }
}
