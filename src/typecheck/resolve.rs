use std::collections::BTreeMap;

use crate::ast::*;
use crate::diagnostic::Stage;
use crate::types::Ty;

use super::TypeChecker;

/// One method's signature, kept distinct from others of the same name in
/// the same class to support overloading.
#[derive(Clone, Debug)]
pub(super) struct MethodSig {
    pub(super) params: Vec<Ty>,
    pub(super) return_ty: Ty,
}

#[derive(Clone, Debug, Default)]
pub(super) struct ClassInfo {
    pub(super) fields: BTreeMap<String, Ty>,
    /// Declaration order, needed by IR3 lowering for field-offset layout.
    pub(super) field_order: Vec<String>,
    /// Every overload sharing a name lives under that one key.
    pub(super) methods: BTreeMap<String, Vec<MethodSig>>,
}

#[derive(Clone, Debug, Default)]
pub struct ClassTable {
    pub(super) classes: BTreeMap<String, ClassInfo>,
}

impl ClassTable {
    pub fn class_names(&self) -> impl Iterator<Item = &String> {
        self.classes.keys()
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn field_type(&self, class: &str, field: &str) -> Option<Ty> {
        self.classes.get(class)?.fields.get(field).cloned()
    }

    /// Field names in declaration order, for IR3's object layout.
    pub fn field_order(&self, class: &str) -> Option<&[String]> {
        self.classes.get(class).map(|info| info.field_order.as_slice())
    }

    /// Every overload of `method` in `class`, as (parameter types, return type).
    pub fn method_overloads(&self, class: &str, method: &str) -> Option<Vec<(Vec<Ty>, Ty)>> {
        let info = self.classes.get(class)?;
        let sigs = info.methods.get(method)?;
        Some(sigs.iter().map(|s| (s.params.clone(), s.return_ty.clone())).collect())
    }
}

impl TypeChecker {
    /// Phase 1: register every class's fields and method signatures before
    /// any body is checked, so forward references and mutual recursion
    /// between methods resolve without a second file pass.
    pub(super) fn build_class_table(&mut self, program: &Program) {
        let main_name = &program.main_class.name;
        self.class_table.classes.insert(
            main_name.node.clone(),
            ClassInfo {
                fields: BTreeMap::new(),
                field_order: Vec::new(),
                methods: BTreeMap::from([(
                    "main".to_string(),
                    vec![MethodSig {
                        params: program
                            .main_class
                            .main_params
                            .iter()
                            .map(|p| self.resolve_type(&p.ty.node, p.ty.span))
                            .collect(),
                        return_ty: Ty::Void,
                    }],
                )]),
            },
        );

        for class in &program.classes {
            if self.class_table.classes.contains_key(&class.name.node) {
                self.error(
                    Stage::TypeCheck,
                    format!("class '{}' is already declared", class.name.node),
                    class.name.span,
                );
                continue;
            }
            self.class_table
                .classes
                .insert(class.name.node.clone(), ClassInfo::default());
        }

        for class in &program.classes {
            self.register_class_body(class);
        }
    }

    fn register_class_body(&mut self, class: &ClassDecl) {
        let mut fields = BTreeMap::new();
        let mut field_order = Vec::new();
        for field in &class.fields {
            let ty = self.resolve_type(&field.ty.node, field.ty.span);
            if fields.contains_key(&field.name.node) {
                self.error(
                    Stage::TypeCheck,
                    format!(
                        "field '{}' is already declared in class '{}'",
                        field.name.node, class.name.node
                    ),
                    field.name.span,
                );
                continue;
            }
            field_order.push(field.name.node.clone());
            fields.insert(field.name.node.clone(), ty);
        }

        let mut methods: BTreeMap<String, Vec<MethodSig>> = BTreeMap::new();
        for method in &class.methods {
            let params: Vec<Ty> = method
                .params
                .iter()
                .map(|p| self.resolve_type(&p.ty.node, p.ty.span))
                .collect();
            let return_ty = self.resolve_type(&method.return_ty.node, method.return_ty.span);
            let group = methods.entry(method.name.node.clone()).or_default();
            if group.iter().any(|sig| sig.params == params) {
                self.error(
                    Stage::TypeCheck,
                    format!(
                        "method '{}' in class '{}' is already declared with this parameter list",
                        method.name.node, class.name.node
                    ),
                    method.name.span,
                );
                continue;
            }
            group.push(MethodSig { params, return_ty });
        }

        if let Some(info) = self.class_table.classes.get_mut(&class.name.node) {
            info.fields = fields;
            info.field_order = field_order;
            info.methods = methods;
        }
    }

    /// Resolves a syntactic `Type` to a semantic `Ty`, reporting an error if
    /// it names a class that was never declared.
    pub(super) fn resolve_type(&mut self, ty: &Type, span: crate::span::Span) -> Ty {
        match ty {
            Type::Int => Ty::Int,
            Type::Bool => Ty::Bool,
            Type::String => Ty::String,
            Type::Void => Ty::Void,
            Type::ClassName(name) => {
                if !self.class_table.classes.contains_key(name) {
                    self.error(
                        Stage::TypeCheck,
                        format!("undeclared class '{}'", name),
                        span,
                    );
                }
                Ty::Object(name.clone())
            }
        }
    }
}
