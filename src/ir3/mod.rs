//! IR3: a flat, indexed three-address form lowered from the typed AST.
//!
//! `original_source/ir3.py` threads every node through a `child` pointer and
//! walks linked lists to pretty-print or analyse a method body. This crate
//! keeps the same instruction shapes but stores each method's body as an
//! indexed `Vec<Instr>` (see `SPEC_FULL.md` §10): labels become strings
//! resolved to block indices by the `cfg` module rather than followed
//! pointer-by-pointer.

mod lower;
mod print;
#[cfg(test)]
mod tests;

pub use lower::lower_program;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Ty;

/// A value simple enough to appear directly as an instruction operand: no
/// further evaluation needed. Complex sub-expressions are lowered into a
/// fresh temporary first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    IntConst(i32),
    BoolConst(bool),
    StringConst(String),
    Null,
    This,
    Var(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::IntConst(n) => write!(f, "{n}"),
            Operand::BoolConst(b) => write!(f, "{b}"),
            Operand::StringConst(s) => write!(f, "{s:?}"),
            Operand::Null => write!(f, "null"),
            Operand::This => write!(f, "this"),
            Operand::Var(name) => write!(f, "{name}"),
        }
    }
}

/// An assignable location: a bare name, or a field reached through an
/// already-lowered object operand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Place3 {
    Var(String),
    FieldAccess(Operand, String),
}

impl fmt::Display for Place3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place3::Var(name) => write!(f, "{name}"),
            Place3::FieldAccess(obj, field) => write!(f, "{obj}.{field}"),
        }
    }
}

/// The right-hand side of an `Assign` instruction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RValue {
    Operand(Operand),
    UnOp(crate::ast::UnOp, Operand),
    BinOp(crate::ast::BinOp, Operand, Operand),
    FieldAccess(Operand, String),
    New(String),
    /// `method_id` is already resolved to a concrete overload at this point
    /// (see `lower::mangle_method_id`); no further dispatch happens here.
    Call(Operand, String, Vec<Operand>),
}

impl fmt::Display for RValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RValue::Operand(o) => write!(f, "{o}"),
            RValue::UnOp(op, o) => {
                let sym = match op {
                    crate::ast::UnOp::Neg => "-",
                    crate::ast::UnOp::Not => "!",
                };
                write!(f, "{sym}{o}")
            }
            RValue::BinOp(op, l, r) => write!(f, "{l} {} {r}", op.as_str()),
            RValue::FieldAccess(obj, field) => write!(f, "{obj}.{field}"),
            RValue::New(class) => write!(f, "new {class}()"),
            RValue::Call(recv, method, args) => {
                write!(f, "{recv}.{method}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// The condition of an `IfGoto`. Every branch condition in IR3 is a
/// relational comparison between two simple operands — an arbitrary boolean
/// value (a `Bool` variable, a method call result, `&&`/`||`) is lowered into
/// a temporary first and then compared against `false`, keeping this shape
/// uniform (see `lower::lower_condition`, and the Open Questions entry in
/// `DESIGN.md` for why that's a deliberate widening rather than an omission).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cond {
    pub op: crate::ast::BinOp,
    pub lhs: Operand,
    pub rhs: Operand,
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op.as_str(), self.rhs)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Instr {
    Label(String),
    Goto(String),
    IfGoto { cond: Cond, target: String },
    Assign { target: Place3, value: RValue },
    /// A call used for its side effects; any result is discarded.
    CallStmt { receiver: Operand, method: String, args: Vec<Operand> },
    Return(Option<Operand>),
    Readln(String),
    Println(Operand),
}

/// Per-class field list, in declaration order, with resolved types.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClassData3 {
    pub name: String,
    pub fields: Vec<(String, Ty)>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Method3 {
    pub class_name: String,
    /// Mangled, globally unique identifier (see `lower::mangle_method_id`).
    pub method_id: String,
    pub return_ty: Ty,
    pub params: Vec<(String, Ty)>,
    /// Declared locals and compiler-generated temporaries, in the order they
    /// were introduced; printed as `VarDecl` lines at the top of the body.
    pub locals: Vec<(String, Ty)>,
    pub instrs: Vec<Instr>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Program3 {
    pub classes: Vec<ClassData3>,
    pub methods: Vec<Method3>,
}
