//! Pretty-printing for IR3, matching the listing format `SPEC_FULL.md` §4.6
//! requires downstream consumers to produce: `class C { Type name; ... }`,
//! labels as `LabelN:`, branches as `if (rel) goto N;` / `goto N;`, and
//! `Return [name];`. Grounded on `original_source/ir3.py`'s `pretty_print`
//! walk, replacing its linked-list traversal with a plain iterator over the
//! indexed instruction vector.

use std::fmt;

use super::{ClassData3, Instr, Method3, Program3};

impl fmt::Display for ClassData3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {} {{ ", self.name)?;
        for (name, ty) in &self.fields {
            write!(f, "{} {}; ", ty.display(), name)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Method3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}(", self.return_ty.display(), self.method_id)?;
        for (i, (name, ty)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", ty.display(), name)?;
        }
        writeln!(f, "){{")?;

        for (name, ty) in &self.locals {
            writeln!(f, "  {} {};", ty.display(), name)?;
        }

        for instr in &self.instrs {
            match instr {
                Instr::Label(label) => writeln!(f, "{label}:")?,
                Instr::Goto(label) => writeln!(f, "  goto {label};")?,
                Instr::IfGoto { cond, target } => writeln!(f, "  if ({cond}) goto {target};")?,
                Instr::Assign { target, value } => writeln!(f, "  {target} = {value};")?,
                Instr::CallStmt { receiver, method, args } => {
                    write!(f, "  {receiver}.{method}(")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    writeln!(f, ");")?;
                }
                Instr::Return(None) => writeln!(f, "  Return;")?,
                Instr::Return(Some(op)) => writeln!(f, "  Return {op};")?,
                Instr::Readln(name) => writeln!(f, "  readln({name});")?,
                Instr::Println(op) => writeln!(f, "  println({op});")?,
            }
        }

        write!(f, "}}")
    }
}

impl fmt::Display for Program3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for class in &self.classes {
            writeln!(f, "{class}")?;
        }
        for method in &self.methods {
            writeln!(f)?;
            writeln!(f, "{method}")?;
        }
        Ok(())
    }
}
