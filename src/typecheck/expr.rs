//! Expression type checking.
//!
//! `null` has no type of its own — it's only valid where an `Object` type is
//! expected — so `check_expr` returns `ExprTy` rather than `Ty` and callers
//! that accept it (assignment, `==`/`!=`, method arguments) unwrap through
//! `ExprTy::expect_assignable_to`.

use crate::ast::*;
use crate::diagnostic::Stage;
use crate::span::{Span, Spanned};
use crate::types::Ty;

use super::TypeChecker;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum ExprTy {
    Known(Ty),
    Null,
}

impl ExprTy {
    pub(super) fn display(&self) -> String {
        match self {
            ExprTy::Known(ty) => ty.display(),
            ExprTy::Null => "null".to_string(),
        }
    }
}

impl TypeChecker {
    pub(super) fn check_expr(&mut self, expr: &Spanned<Expr>) -> ExprTy {
        match &expr.node {
            Expr::IntLiteral(_) => ExprTy::Known(Ty::Int),
            Expr::BoolLiteral(_) => ExprTy::Known(Ty::Bool),
            Expr::StringLiteral(_) => ExprTy::Known(Ty::String),
            Expr::Null => ExprTy::Null,
            Expr::This => {
                if self.in_method {
                    let class = self.current_class.clone().expect("in_method implies current_class");
                    ExprTy::Known(Ty::Object(class))
                } else {
                    self.error(Stage::TypeCheck, "'this' used outside a method".to_string(), expr.span);
                    ExprTy::Known(Ty::Void)
                }
            }
            Expr::Var(name) => {
                if let Some(ty) = self.lookup_var(name) {
                    ExprTy::Known(ty)
                } else {
                    self.error(
                        Stage::TypeCheck,
                        format!("undeclared identifier '{}'", name),
                        expr.span,
                    );
                    ExprTy::Known(Ty::Void)
                }
            }
            Expr::UnOp { op, operand } => self.check_unop(*op, operand, expr.span),
            Expr::BinOp { op, lhs, rhs } => self.check_binop(*op, lhs, rhs, expr.span),
            Expr::FieldAccess { object, field } => self.check_field_access(object, field),
            Expr::MethodCall { receiver, method, args } => {
                self.check_method_call(receiver, method, args, expr.span)
            }
            Expr::New(class_name) => {
                if !self.class_table.has_class(&class_name.node) {
                    self.error(
                        Stage::TypeCheck,
                        format!("undeclared class '{}'", class_name.node),
                        class_name.span,
                    );
                }
                ExprTy::Known(Ty::Object(class_name.node.clone()))
            }
        }
    }

    /// Like `check_expr`, but rejects `null` — used wherever the grammar
    /// requires a genuinely-typed value (conditions, loop bounds, println).
    pub(super) fn check_expr_typed(&mut self, expr: &Spanned<Expr>) -> Ty {
        match self.check_expr(expr) {
            ExprTy::Known(ty) => ty,
            ExprTy::Null => {
                self.error(
                    Stage::TypeCheck,
                    "'null' cannot be used here; its type cannot be inferred".to_string(),
                    expr.span,
                );
                Ty::Void
            }
        }
    }

    fn check_unop(&mut self, op: UnOp, operand: &Spanned<Expr>, span: Span) -> ExprTy {
        let ty = self.check_expr_typed(operand);
        let expected = match op {
            UnOp::Neg => Ty::Int,
            UnOp::Not => Ty::Bool,
        };
        if ty != expected {
            self.error(
                Stage::TypeCheck,
                format!(
                    "operator '{}' expects {}, found {}",
                    if op == UnOp::Neg { "-" } else { "!" },
                    expected.display(),
                    ty.display()
                ),
                span,
            );
        }
        ExprTy::Known(expected)
    }

    fn check_binop(
        &mut self,
        op: BinOp,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        span: Span,
    ) -> ExprTy {
        if op.is_logical() {
            let lty = self.check_expr_typed(lhs);
            let rty = self.check_expr_typed(rhs);
            if lty != Ty::Bool || rty != Ty::Bool {
                self.error(
                    Stage::TypeCheck,
                    format!(
                        "operator '{}' requires Bool operands, found {} and {}",
                        op.as_str(),
                        lty.display(),
                        rty.display()
                    ),
                    span,
                );
            }
            return ExprTy::Known(Ty::Bool);
        }

        if op == BinOp::Eq || op == BinOp::Ne {
            return self.check_equality(lhs, rhs, op, span);
        }

        let lty = self.check_expr_typed(lhs);
        let rty = self.check_expr_typed(rhs);

        if op.is_arithmetic() {
            // '+' doubles as string concatenation; every other arithmetic
            // operator is Int-only.
            if op == BinOp::Add && lty == Ty::String && rty == Ty::String {
                return ExprTy::Known(Ty::String);
            }
            if lty != Ty::Int || rty != Ty::Int {
                self.error(
                    Stage::TypeCheck,
                    format!(
                        "operator '{}' requires Int operands, found {} and {}",
                        op.as_str(),
                        lty.display(),
                        rty.display()
                    ),
                    span,
                );
            }
            return ExprTy::Known(Ty::Int);
        }

        // Relational (<, >, <=, >=): Int only.
        if lty != Ty::Int || rty != Ty::Int {
            self.error(
                Stage::TypeCheck,
                format!(
                    "operator '{}' requires Int operands, found {} and {}",
                    op.as_str(),
                    lty.display(),
                    rty.display()
                ),
                span,
            );
        }
        ExprTy::Known(Ty::Bool)
    }

    fn check_equality(
        &mut self,
        lhs: &Spanned<Expr>,
        rhs: &Spanned<Expr>,
        op: BinOp,
        span: Span,
    ) -> ExprTy {
        let lty = self.check_expr(lhs);
        let rty = self.check_expr(rhs);
        let compatible = match (&lty, &rty) {
            (ExprTy::Null, ExprTy::Null) => true,
            (ExprTy::Null, ExprTy::Known(t)) | (ExprTy::Known(t), ExprTy::Null) => {
                t.accepts_null()
            }
            (ExprTy::Known(a), ExprTy::Known(b)) => a == b,
        };
        if !compatible {
            self.error(
                Stage::TypeCheck,
                format!(
                    "operator '{}' cannot compare {} and {}",
                    op.as_str(),
                    lty.display(),
                    rty.display()
                ),
                span,
            );
        }
        ExprTy::Known(Ty::Bool)
    }

    fn check_field_access(&mut self, object: &Spanned<Expr>, field: &Spanned<String>) -> ExprTy {
        let obj_ty = self.check_expr_typed(object);
        let Ty::Object(class) = &obj_ty else {
            self.error(
                Stage::TypeCheck,
                format!("cannot access field '{}' on non-object type {}", field.node, obj_ty.display()),
                field.span,
            );
            return ExprTy::Known(Ty::Void);
        };
        match self.class_table.classes.get(class).and_then(|info| info.fields.get(&field.node)) {
            Some(ty) => ExprTy::Known(ty.clone()),
            None => {
                self.error(
                    Stage::TypeCheck,
                    format!("class '{}' has no field '{}'", class, field.node),
                    field.span,
                );
                ExprTy::Known(Ty::Void)
            }
        }
    }

    fn check_method_call(
        &mut self,
        receiver: &Spanned<Expr>,
        method: &Spanned<String>,
        args: &[Spanned<Expr>],
        span: Span,
    ) -> ExprTy {
        let recv_ty = self.check_expr_typed(receiver);
        let Ty::Object(class) = &recv_ty else {
            self.error(
                Stage::TypeCheck,
                format!("cannot call method '{}' on non-object type {}", method.node, recv_ty.display()),
                method.span,
            );
            return ExprTy::Known(Ty::Void);
        };

        let arg_tys: Vec<ExprTy> = args.iter().map(|a| self.check_expr(a)).collect();

        let Some(overloads) = self
            .class_table
            .classes
            .get(class)
            .and_then(|info| info.methods.get(&method.node))
            .cloned()
        else {
            self.error(
                Stage::TypeCheck,
                format!("class '{}' has no method '{}'", class, method.node),
                method.span,
            );
            return ExprTy::Known(Ty::Void);
        };

        let matches: Vec<_> = overloads
            .iter()
            .filter(|sig| {
                sig.params.len() == arg_tys.len()
                    && sig.params.iter().zip(&arg_tys).all(|(p, a)| expr_ty_matches(a, p))
            })
            .collect();

        match matches.len() {
            1 => ExprTy::Known(matches[0].return_ty.clone()),
            0 => {
                self.error(
                    Stage::TypeCheck,
                    format!(
                        "no overload of method '{}' in class '{}' accepts argument types ({})",
                        method.node,
                        class,
                        arg_tys.iter().map(|t| t.display()).collect::<Vec<_>>().join(", ")
                    ),
                    span,
                );
                ExprTy::Known(Ty::Void)
            }
            _ => {
                self.error(
                    Stage::TypeCheck,
                    format!(
                        "call to '{}' in class '{}' is ambiguous between {} overloads",
                        method.node, class, matches.len()
                    ),
                    span,
                );
                ExprTy::Known(matches[0].return_ty.clone())
            }
        }
    }
}

pub(super) fn expr_ty_matches(arg: &ExprTy, param: &Ty) -> bool {
    match arg {
        ExprTy::Known(t) => t == param,
        ExprTy::Null => param.accepts_null(),
    }
}
