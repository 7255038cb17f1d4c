mod expr;
mod resolve;
mod stmt;
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use crate::ast::*;
use crate::diagnostic::{Diagnostic, Severity, Stage};
use crate::span::Span;
use crate::types::Ty;

pub use resolve::ClassTable;

pub(crate) struct TypeChecker {
    pub(super) class_table: ClassTable,
    /// Scope stack: class fields first (bottom), then parameters, then
    /// nested block scopes pushed/popped as `if`/`while` bodies are
    /// entered and left — mirrors `original_source/symbol_table.py`'s
    /// `SymbolTableStack`, but as borrowed `Vec` frames rather than a
    /// stack that gets `copy.deepcopy`'d on every lookup.
    scopes: Vec<BTreeMap<String, Ty>>,
    current_class: Option<String>,
    /// `this` is only valid inside an instance method body, never in `main`
    /// (which has no receiver) even though `current_class` is set to `Main`
    /// there for field/method lookup purposes.
    in_method: bool,
    current_return_ty: Ty,
    diagnostics: Vec<Diagnostic>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub(crate) fn new() -> Self {
        Self {
            class_table: ClassTable::default(),
            scopes: Vec::new(),
            current_class: None,
            in_method: false,
            current_return_ty: Ty::Void,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn check_program(mut self, program: &Program) -> Result<ClassTable, Vec<Diagnostic>> {
        self.build_class_table(program);

        self.current_class = Some(program.main_class.name.node.clone());
        self.in_method = false;
        self.current_return_ty = Ty::Void;
        self.push_scope();
        for param in &program.main_class.main_params {
            let ty = self.resolve_type(&param.ty.node, param.ty.span);
            self.define_var(&param.name.node, ty);
        }
        for local in &program.main_class.main_locals {
            let ty = self.resolve_type(&local.ty.node, local.ty.span);
            self.define_var(&local.name.node, ty);
        }
        self.check_stmts(&program.main_class.main_body);
        self.pop_scope();

        for class in &program.classes {
            self.check_class_methods(class);
        }

        let has_errors = self.diagnostics.iter().any(|d| d.severity == Severity::Error);
        if has_errors {
            Err(self.diagnostics)
        } else {
            Ok(self.class_table)
        }
    }

    fn check_class_methods(&mut self, class: &ClassDecl) {
        self.current_class = Some(class.name.node.clone());
        self.in_method = true;
        for method in &class.methods {
            self.current_return_ty = self.resolve_type(&method.return_ty.node, method.return_ty.span);
            self.push_scope();
            // Field scope lives beneath params/locals so a local can shadow
            // a field of the same name.
            if let Some(info) = self.class_table.classes.get(&class.name.node) {
                let fields = info.fields.clone();
                if let Some(scope) = self.scopes.last_mut() {
                    scope.extend(fields);
                }
            }
            self.push_scope();
            for param in &method.params {
                let ty = self.resolve_type(&param.ty.node, param.ty.span);
                self.define_var(&param.name.node, ty);
            }
            for local in &method.locals {
                let ty = self.resolve_type(&local.ty.node, local.ty.span);
                self.define_var(&local.name.node, ty);
            }
            self.check_stmts(&method.body);
            self.pop_scope();
            self.pop_scope();
        }
    }

    // --- Scope management ---

    fn push_scope(&mut self) {
        self.scopes.push(BTreeMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn define_var(&mut self, name: &str, ty: Ty) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), ty);
        }
    }

    fn lookup_var(&self, name: &str) -> Option<Ty> {
        for scope in self.scopes.iter().rev() {
            if let Some(ty) = scope.get(name) {
                return Some(ty.clone());
            }
        }
        None
    }

    // --- Diagnostics ---

    fn error(&mut self, stage: Stage, msg: String, span: Span) {
        self.diagnostics.push(Diagnostic::error(stage, msg, span));
    }
}
