use serde::{Deserialize, Serialize};

/// Semantic types used by the type checker (distinct from the AST's
/// syntactic type annotations, though JLite's surface syntax maps directly
/// onto this set with no inference needed).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ty {
    Int,
    Bool,
    String,
    Void,
    Object(String),
    /// A callable signature: declaring class, parameter types, return type.
    /// Used internally to type method lookups and overload resolution; it
    /// is never itself a variable's declared type.
    Function(String, Vec<Ty>, Box<Ty>),
}

impl Ty {
    pub fn display(&self) -> String {
        match self {
            Ty::Int => "Int".to_string(),
            Ty::Bool => "Bool".to_string(),
            Ty::String => "String".to_string(),
            Ty::Void => "Void".to_string(),
            Ty::Object(name) => name.clone(),
            Ty::Function(class, params, ret) => {
                let parts: Vec<_> = params.iter().map(|t| t.display()).collect();
                format!("{}::({}) -> {}", class, parts.join(", "), ret.display())
            }
        }
    }

    /// `null` is assignable to any object type and to `String`, but not to
    /// `Int`/`Bool`/`Void`.
    pub fn accepts_null(&self) -> bool {
        matches!(self, Ty::Object(_) | Ty::String)
    }

    /// Whether a value of type `from` can be assigned/passed where `to` is
    /// expected. JLite has no subtyping between declared classes (no
    /// inheritance), so this is structural equality, plus the null rule
    /// above, which callers check separately at the literal site.
    pub fn is_assignable_to(&self, to: &Ty) -> bool {
        self == to
    }
}
