use serde::{Deserialize, Serialize};

use crate::span::Spanned;

/// A parsed `.j` file: one mandatory main class followed by any number of
/// ordinary class declarations.
#[derive(Clone, Debug)]
pub struct Program {
    pub main_class: MainClass,
    pub classes: Vec<ClassDecl>,
}

/// `class Id { Void main (Params) { VarDecl* Stmt+ } }`
#[derive(Clone, Debug)]
pub struct MainClass {
    pub name: Spanned<String>,
    pub main_params: Vec<Param>,
    pub main_locals: Vec<VarDecl>,
    pub main_body: Vec<Spanned<Stmt>>,
}

/// `class Id { VarDecl* MethodDecl* }`
#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub name: Spanned<String>,
    pub fields: Vec<VarDecl>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Clone, Debug)]
pub struct VarDecl {
    pub ty: Spanned<Type>,
    pub name: Spanned<String>,
}

#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub return_ty: Spanned<Type>,
    pub name: Spanned<String>,
    pub params: Vec<Param>,
    pub locals: Vec<VarDecl>,
    pub body: Vec<Spanned<Stmt>>,
}

#[derive(Clone, Debug)]
pub struct Param {
    pub ty: Spanned<Type>,
    pub name: Spanned<String>,
}

/// Syntactic types as written in source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Int,
    Bool,
    String,
    Void,
    /// An uppercase identifier not matching a built-in type keyword.
    ClassName(String),
}

#[derive(Clone, Debug)]
pub enum Stmt {
    VarAssign {
        target: Spanned<Place>,
        value: Spanned<Expr>,
    },
    If {
        cond: Spanned<Expr>,
        then_body: Vec<Spanned<Stmt>>,
        else_body: Vec<Spanned<Stmt>>,
    },
    While {
        cond: Spanned<Expr>,
        body: Vec<Spanned<Stmt>>,
    },
    Readln(Spanned<Place>),
    Println(Spanned<Expr>),
    /// A call used for its side effects, its result discarded.
    CallStmt(Spanned<Expr>),
    Return(Option<Spanned<Expr>>),
}

/// L-value places: a bare local/parameter/field name, or a field reached
/// through a chain of `.` accesses starting at some object expression.
#[derive(Clone, Debug)]
pub enum Place {
    Var(String),
    FieldAccess(Box<Spanned<Expr>>, Spanned<String>),
}

/// Expressions. JLite's grammar distinguishes boolean (`BExp`), arithmetic
/// (`AExp`), and string (`SExp`) expressions, but they overlap at every
/// atom (identifiers, calls, field access, parenthesized expressions), so
/// one sum type models all three; the type checker rejects the shapes each
/// context disallows instead of the grammar doing so structurally.
#[derive(Clone, Debug)]
pub enum Expr {
    IntLiteral(i32),
    BoolLiteral(bool),
    StringLiteral(String),
    Null,
    This,
    Var(String),
    UnOp {
        op: UnOp,
        operand: Box<Spanned<Expr>>,
    },
    BinOp {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    FieldAccess {
        object: Box<Spanned<Expr>>,
        field: Spanned<String>,
    },
    MethodCall {
        receiver: Box<Spanned<Expr>>,
        method: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
    New(Spanned<String>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Neg, // -
    Not, // !
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    /// Whether this operator's operands (and result) are arithmetic (`Int`)
    /// as opposed to boolean.
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div)
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Ne
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}
