use crate::ast::*;
use crate::diagnostic::Stage;
use crate::span::Spanned;
use crate::types::Ty;

use super::expr::expr_ty_matches;
use super::TypeChecker;

impl TypeChecker {
    pub(super) fn check_stmts(&mut self, stmts: &[Spanned<Stmt>]) {
        for stmt in stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Spanned<Stmt>) {
        match &stmt.node {
            Stmt::VarAssign { target, value } => self.check_assign(target, value),
            Stmt::If { cond, then_body, else_body } => {
                let cond_ty = self.check_expr_typed(cond);
                if cond_ty != Ty::Bool {
                    self.error(
                        Stage::TypeCheck,
                        format!("'if' condition must be Bool, found {}", cond_ty.display()),
                        cond.span,
                    );
                }
                self.push_scope();
                self.check_stmts(then_body);
                self.pop_scope();
                self.push_scope();
                self.check_stmts(else_body);
                self.pop_scope();
            }
            Stmt::While { cond, body } => {
                let cond_ty = self.check_expr_typed(cond);
                if cond_ty != Ty::Bool {
                    self.error(
                        Stage::TypeCheck,
                        format!("'while' condition must be Bool, found {}", cond_ty.display()),
                        cond.span,
                    );
                }
                self.push_scope();
                self.check_stmts(body);
                self.pop_scope();
            }
            Stmt::Readln(place) => {
                let Place::Var(name) = &place.node else {
                    self.error(
                        Stage::TypeCheck,
                        "'readln' target must be a local variable, parameter, or field".to_string(),
                        place.span,
                    );
                    return;
                };
                match self.lookup_var(name) {
                    Some(Ty::Int) | Some(Ty::Bool) | Some(Ty::String) => {}
                    Some(other) => self.error(
                        Stage::TypeCheck,
                        format!("'readln' cannot read into a value of type {}", other.display()),
                        place.span,
                    ),
                    None => self.error(
                        Stage::TypeCheck,
                        format!("undeclared identifier '{}'", name),
                        place.span,
                    ),
                }
            }
            Stmt::Println(expr) => {
                let ty = self.check_expr_typed(expr);
                if !matches!(ty, Ty::Int | Ty::Bool | Ty::String) {
                    self.error(
                        Stage::TypeCheck,
                        format!("'println' cannot print a value of type {}", ty.display()),
                        expr.span,
                    );
                }
            }
            Stmt::CallStmt(expr) => {
                self.check_expr(expr);
            }
            Stmt::Return(value) => {
                let expected = self.current_return_ty.clone();
                match (value, &expected) {
                    (None, Ty::Void) => {}
                    (None, other) => self.error(
                        Stage::TypeCheck,
                        format!("method must return a value of type {}", other.display()),
                        stmt.span,
                    ),
                    (Some(expr), Ty::Void) => {
                        self.check_expr(expr);
                        self.error(
                            Stage::TypeCheck,
                            "Void method cannot return a value".to_string(),
                            expr.span,
                        );
                    }
                    (Some(expr), expected) => {
                        let actual = self.check_expr(expr);
                        if !expr_ty_matches(&actual, expected) {
                            self.error(
                                Stage::TypeCheck,
                                format!(
                                    "method returns {} but this statement returns {}",
                                    expected.display(),
                                    actual.display()
                                ),
                                expr.span,
                            );
                        }
                    }
                }
            }
        }
    }

    fn check_assign(&mut self, target: &Spanned<Place>, value: &Spanned<Expr>) {
        let target_ty = match &target.node {
            Place::Var(name) => match self.lookup_var(name) {
                Some(ty) => Some(ty),
                None => {
                    self.error(
                        Stage::TypeCheck,
                        format!("undeclared identifier '{}'", name),
                        target.span,
                    );
                    None
                }
            },
            Place::FieldAccess(object, field) => {
                let obj_ty = self.check_expr_typed(object);
                let Ty::Object(class) = &obj_ty else {
                    self.error(
                        Stage::TypeCheck,
                        format!("cannot assign to a field on non-object type {}", obj_ty.display()),
                        field.span,
                    );
                    self.check_expr(value);
                    return;
                };
                match self.class_table.classes.get(class).and_then(|c| c.fields.get(&field.node)) {
                    Some(ty) => Some(ty.clone()),
                    None => {
                        self.error(
                            Stage::TypeCheck,
                            format!("class '{}' has no field '{}'", class, field.node),
                            field.span,
                        );
                        None
                    }
                }
            }
        };

        let value_ty = self.check_expr(value);
        if let Some(target_ty) = target_ty {
            if !expr_ty_matches(&value_ty, &target_ty) {
                self.error(
                    Stage::TypeCheck,
                    format!(
                        "cannot assign {} to a variable of type {}",
                        value_ty.display(),
                        target_ty.display()
                    ),
                    value.span,
                );
            }
        }
    }
}
