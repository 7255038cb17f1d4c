//! AST → IR3 lowering.
//!
//! `original_source/gen.py`'s own `IR3Generator` is little more than a stub
//! (it allocates a single `MainClassIR3Node` and stops), so this module
//! follows `spec.md` §4.4's lowering schemes directly rather than porting
//! incomplete Python. The one genuine gap spec.md leaves open is how a
//! lowering pass recovers each sub-expression's type without an in-place
//! `.type` field on every AST node (`original_source/ast.py` mutates nodes
//! in place during type checking — not a shape this crate's AST exposes,
//! per `DESIGN.md`'s "no interior mutation of the AST" decision). This
//! module resolves that by re-deriving each expression's type from the
//! `ClassTable` and a scope stack built the same way `typecheck::TypeChecker`
//! builds its own — cheap, and safe because lowering only ever runs on a
//! program that has already type-checked successfully.

use std::collections::BTreeMap;

use crate::ast::*;
use crate::span::Spanned;
use crate::typecheck::ClassTable;
use crate::types::Ty;

use super::{ClassData3, Cond, Instr, Method3, Operand, Place3, Program3, RValue};

pub fn lower_program(program: &Program, class_table: &ClassTable) -> Program3 {
    let classes = program
        .classes
        .iter()
        .map(|class| ClassData3 {
            name: class.name.node.clone(),
            fields: class_table
                .field_order(&class.name.node)
                .unwrap_or(&[])
                .iter()
                .map(|name| {
                    let ty = class_table
                        .field_type(&class.name.node, name)
                        .expect("field_order and field_type agree on the same class");
                    (name.clone(), ty)
                })
                .collect(),
        })
        .collect();

    let mut methods = Vec::new();
    methods.push(lower_main(&program.main_class, class_table));
    for class in &program.classes {
        let overload_counts = count_overloads(class);
        let mut seen: BTreeMap<String, u32> = BTreeMap::new();
        for method in &class.methods {
            let idx = {
                let n = seen.entry(method.name.node.clone()).or_insert(0);
                let idx = *n;
                *n += 1;
                idx
            };
            let total = overload_counts[&method.name.node];
            methods.push(lower_method(class, method, idx, total, class_table));
        }
    }

    Program3 { classes, methods }
}

fn count_overloads(class: &ClassDecl) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for method in &class.methods {
        *counts.entry(method.name.node.clone()).or_insert(0) += 1;
    }
    counts
}

/// `describe` with one overload keeps its plain name; a group of N overloads
/// gets `describe$0`..`describe$N-1` in declaration order. Call sites derive
/// the same index by re-running the overload match against `ClassTable`
/// (see `Lowerer::lower_rvalue`'s `MethodCall` arm), so definition and call
/// always agree without threading an explicit id through the AST.
fn mangle_method_id(class: &str, method: &str, idx: u32, total: u32) -> String {
    if total <= 1 {
        format!("{class}_{method}")
    } else {
        format!("{class}_{method}${idx}")
    }
}

fn ty_from_type(ty: &Type) -> Ty {
    match ty {
        Type::Int => Ty::Int,
        Type::Bool => Ty::Bool,
        Type::String => Ty::String,
        Type::Void => Ty::Void,
        Type::ClassName(name) => Ty::Object(name.clone()),
    }
}

/// `None` models an argument expression that is the literal `null`, which
/// has no type of its own — only a compatibility rule with `Object` and
/// `String` parameters (mirrors `typecheck::expr::ExprTy::Null`, kept
/// separate here since lowering doesn't share that module's private type).
fn overload_matches(params: &[Ty], args: &[Option<Ty>]) -> bool {
    params.len() == args.len()
        && params.iter().zip(args).all(|(p, a)| match a {
            Some(t) => t == p,
            None => p.accepts_null(),
        })
}

struct Lowerer<'a> {
    class_table: &'a ClassTable,
    current_class: String,
    scopes: Vec<BTreeMap<String, Ty>>,
    temp_counter: u32,
    label_counter: u32,
    locals: Vec<(String, Ty)>,
    instrs: Vec<Instr>,
}

impl<'a> Lowerer<'a> {
    fn new(class_table: &'a ClassTable, current_class: String) -> Self {
        Self {
            class_table,
            current_class,
            scopes: Vec::new(),
            temp_counter: 0,
            label_counter: 0,
            locals: Vec::new(),
            instrs: Vec::new(),
        }
    }

    fn push_scope(&mut self) {
        self.scopes.push(BTreeMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn define(&mut self, name: &str, ty: Ty) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    fn lookup(&self, name: &str) -> Option<Ty> {
        self.scopes.iter().rev().find_map(|s| s.get(name).cloned())
    }

    fn fresh_temp(&mut self, ty: Ty) -> String {
        let name = format!("_t{}", self.temp_counter);
        self.temp_counter += 1;
        self.locals.push((name.clone(), ty));
        name
    }

    fn fresh_label(&mut self) -> String {
        let label = format!("L{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    fn emit(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    // --- Type re-derivation (trusts a prior successful type check) ---

    fn infer_ty(&self, expr: &Expr) -> Ty {
        match expr {
            Expr::IntLiteral(_) => Ty::Int,
            Expr::BoolLiteral(_) => Ty::Bool,
            Expr::StringLiteral(_) => Ty::String,
            Expr::Null => {
                unreachable!("callers special-case Expr::Null before asking for its type")
            }
            Expr::This => Ty::Object(self.current_class.clone()),
            Expr::Var(name) => self.lookup(name).unwrap_or(Ty::Void),
            Expr::UnOp { op, .. } => match op {
                UnOp::Neg => Ty::Int,
                UnOp::Not => Ty::Bool,
            },
            Expr::BinOp { op, lhs, rhs } => {
                if op.is_logical() || op.is_relational() {
                    Ty::Bool
                } else if *op == BinOp::Add
                    && self.is_string_like(&lhs.node)
                    && self.is_string_like(&rhs.node)
                {
                    Ty::String
                } else {
                    Ty::Int
                }
            }
            Expr::FieldAccess { object, field } => {
                let class = self.object_class(&object.node);
                self.class_table.field_type(&class, &field.node).unwrap_or(Ty::Void)
            }
            Expr::MethodCall { receiver, method, args } => {
                let class = self.object_class(&receiver.node);
                let overloads = self.class_table.method_overloads(&class, &method.node).unwrap_or_default();
                let arg_tys: Vec<Option<Ty>> = args
                    .iter()
                    .map(|a| if matches!(a.node, Expr::Null) { None } else { Some(self.infer_ty(&a.node)) })
                    .collect();
                overloads
                    .iter()
                    .find(|(params, _)| overload_matches(params, &arg_tys))
                    .map(|(_, ret)| ret.clone())
                    .unwrap_or(Ty::Void)
            }
            Expr::New(name) => Ty::Object(name.node.clone()),
        }
    }

    fn object_class(&self, expr: &Expr) -> String {
        match self.infer_ty(expr) {
            Ty::Object(class) => class,
            _ => unreachable!("non-object receiver should have failed type checking"),
        }
    }

    fn is_string_like(&self, expr: &Expr) -> bool {
        matches!(expr, Expr::Null) || self.infer_ty(expr) == Ty::String
    }

    // --- Lowering ---

    fn lower_place(&mut self, place: &Place) -> Place3 {
        match place {
            Place::Var(name) => Place3::Var(name.clone()),
            Place::FieldAccess(object, field) => {
                let obj = self.lower_operand(object);
                Place3::FieldAccess(obj, field.node.clone())
            }
        }
    }

    fn lower_operand(&mut self, expr: &Spanned<Expr>) -> Operand {
        match &expr.node {
            Expr::IntLiteral(n) => Operand::IntConst(*n),
            Expr::BoolLiteral(b) => Operand::BoolConst(*b),
            Expr::StringLiteral(s) => Operand::StringConst(s.clone()),
            Expr::Null => Operand::Null,
            Expr::This => Operand::This,
            Expr::Var(name) => Operand::Var(name.clone()),
            _ => {
                let ty = self.infer_ty(&expr.node);
                let rvalue = self.lower_rvalue(expr);
                let temp = self.fresh_temp(ty);
                self.emit(Instr::Assign { target: Place3::Var(temp.clone()), value: rvalue });
                Operand::Var(temp)
            }
        }
    }

    fn lower_rvalue(&mut self, expr: &Spanned<Expr>) -> RValue {
        match &expr.node {
            Expr::UnOp { op, operand } => RValue::UnOp(*op, self.lower_operand(operand)),
            Expr::BinOp { op, lhs, rhs } => {
                RValue::BinOp(*op, self.lower_operand(lhs), self.lower_operand(rhs))
            }
            Expr::FieldAccess { object, field } => {
                RValue::FieldAccess(self.lower_operand(object), field.node.clone())
            }
            Expr::MethodCall { receiver, method, args } => {
                let class = self.object_class(&receiver.node);
                let overloads =
                    self.class_table.method_overloads(&class, &method.node).unwrap_or_default();
                let arg_tys: Vec<Option<Ty>> = args
                    .iter()
                    .map(|a| if matches!(a.node, Expr::Null) { None } else { Some(self.infer_ty(&a.node)) })
                    .collect();
                let idx = overloads
                    .iter()
                    .position(|(params, _)| overload_matches(params, &arg_tys))
                    .expect("type checker guarantees exactly one overload matches");
                let method_id = mangle_method_id(&class, &method.node, idx as u32, overloads.len() as u32);
                let recv = self.lower_operand(receiver);
                let arg_ops: Vec<Operand> = args.iter().map(|a| self.lower_operand(a)).collect();
                RValue::Call(recv, method_id, arg_ops)
            }
            Expr::New(name) => RValue::New(name.node.clone()),
            _ => RValue::Operand(self.lower_operand(expr)),
        }
    }

    /// Lowers a boolean-valued expression to the relational comparison an
    /// `IfGoto` requires. A direct relational comparison keeps its operator;
    /// anything else (a `Bool` variable, `&&`/`||`, a call result) is reduced
    /// to a temporary and compared against `true`.
    fn lower_condition(&mut self, expr: &Spanned<Expr>) -> Cond {
        if let Expr::BinOp { op, lhs, rhs } = &expr.node {
            if op.is_relational() {
                let l = self.lower_operand(lhs);
                let r = self.lower_operand(rhs);
                return Cond { op: *op, lhs: l, rhs: r };
            }
        }
        let v = self.lower_operand(expr);
        Cond { op: BinOp::Eq, lhs: v, rhs: Operand::BoolConst(true) }
    }

    fn lower_stmts(&mut self, stmts: &[Spanned<Stmt>]) {
        for stmt in stmts {
            self.lower_stmt(stmt);
        }
    }

    fn lower_stmt(&mut self, stmt: &Spanned<Stmt>) {
        match &stmt.node {
            Stmt::VarAssign { target, value } => {
                let place = self.lower_place(&target.node);
                let rvalue = self.lower_rvalue(value);
                self.emit(Instr::Assign { target: place, value: rvalue });
            }
            Stmt::If { cond, then_body, else_body } => {
                let neg = negate(self.lower_condition(cond));
                let l_else = self.fresh_label();
                let l_end = self.fresh_label();
                self.emit(Instr::IfGoto { cond: neg, target: l_else.clone() });
                self.lower_stmts(then_body);
                self.emit(Instr::Goto(l_end.clone()));
                self.emit(Instr::Label(l_else));
                self.lower_stmts(else_body);
                self.emit(Instr::Label(l_end));
            }
            Stmt::While { cond, body } => {
                let l_cond = self.fresh_label();
                let l_end = self.fresh_label();
                self.emit(Instr::Label(l_cond.clone()));
                let neg = negate(self.lower_condition(cond));
                self.emit(Instr::IfGoto { cond: neg, target: l_end.clone() });
                self.lower_stmts(body);
                self.emit(Instr::Goto(l_cond));
                self.emit(Instr::Label(l_end));
            }
            Stmt::Readln(place) => match &place.node {
                Place::Var(name) => self.emit(Instr::Readln(name.clone())),
                Place::FieldAccess(..) => {
                    unreachable!("type checker requires readln's target to be a bare variable")
                }
            },
            Stmt::Println(expr) => {
                let op = self.lower_operand(expr);
                self.emit(Instr::Println(op));
            }
            Stmt::CallStmt(expr) => match self.lower_rvalue(expr) {
                RValue::Call(receiver, method, args) => {
                    self.emit(Instr::CallStmt { receiver, method, args })
                }
                other => {
                    let ty = if matches!(expr.node, Expr::Null) { Ty::Void } else { self.infer_ty(&expr.node) };
                    let temp = self.fresh_temp(ty);
                    self.emit(Instr::Assign { target: Place3::Var(temp), value: other });
                }
            },
            Stmt::Return(value) => match value {
                Some(expr) => {
                    let op = self.lower_operand(expr);
                    self.emit(Instr::Return(Some(op)));
                }
                None => self.emit(Instr::Return(None)),
            },
        }
    }
}

fn negate(cond: Cond) -> Cond {
    let op = match cond.op {
        BinOp::Lt => BinOp::Ge,
        BinOp::Gt => BinOp::Le,
        BinOp::Le => BinOp::Gt,
        BinOp::Ge => BinOp::Lt,
        BinOp::Eq => BinOp::Ne,
        BinOp::Ne => BinOp::Eq,
        other => unreachable!("{other:?} never appears as a condition operator"),
    };
    Cond { op, ..cond }
}

fn lower_main(main: &MainClass, class_table: &ClassTable) -> Method3 {
    let mut lowerer = Lowerer::new(class_table, main.name.node.clone());
    lowerer.push_scope();
    let mut params = Vec::new();
    for p in &main.main_params {
        let ty = ty_from_type(&p.ty.node);
        lowerer.define(&p.name.node, ty.clone());
        params.push((p.name.node.clone(), ty));
    }
    for local in &main.main_locals {
        let ty = ty_from_type(&local.ty.node);
        lowerer.define(&local.name.node, ty.clone());
        lowerer.locals.push((local.name.node.clone(), ty));
    }
    lowerer.lower_stmts(&main.main_body);
    lowerer.pop_scope();

    Method3 {
        class_name: main.name.node.clone(),
        method_id: "main".to_string(),
        return_ty: Ty::Void,
        params,
        locals: lowerer.locals,
        instrs: lowerer.instrs,
    }
}

fn lower_method(
    class: &ClassDecl,
    method: &MethodDecl,
    idx: u32,
    total: u32,
    class_table: &ClassTable,
) -> Method3 {
    let mut lowerer = Lowerer::new(class_table, class.name.node.clone());

    lowerer.push_scope();
    if let Some(fields) = class_table.field_order(&class.name.node) {
        for name in fields {
            if let Some(ty) = class_table.field_type(&class.name.node, name) {
                lowerer.define(name, ty);
            }
        }
    }

    lowerer.push_scope();
    let mut params = Vec::new();
    for p in &method.params {
        let ty = ty_from_type(&p.ty.node);
        lowerer.define(&p.name.node, ty.clone());
        params.push((p.name.node.clone(), ty));
    }
    for local in &method.locals {
        let ty = ty_from_type(&local.ty.node);
        lowerer.define(&local.name.node, ty.clone());
        lowerer.locals.push((local.name.node.clone(), ty));
    }
    lowerer.lower_stmts(&method.body);
    lowerer.pop_scope();
    lowerer.pop_scope();

    Method3 {
        class_name: class.name.node.clone(),
        method_id: mangle_method_id(&class.name.node, &method.name.node, idx, total),
        return_ty: ty_from_type(&method.return_ty.node),
        params,
        locals: lowerer.locals,
        instrs: lowerer.instrs,
    }
}
