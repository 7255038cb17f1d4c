use crate::ast::{BinOp, UnOp};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::typecheck::TypeChecker;
use crate::types::Ty;

use super::*;

fn lower(source: &str) -> Program3 {
    let (tokens, lex_diags) = Lexer::new(source, 0).tokenize();
    assert!(lex_diags.is_empty(), "lex errors: {:?}", lex_diags);
    let program = Parser::new(tokens).parse_file().expect("parse errors");
    let class_table = TypeChecker::new().check_program(&program).expect("type errors");
    lower_program(&program, &class_table)
}

fn main_method(program3: &Program3) -> &Method3 {
    program3.methods.iter().find(|m| m.method_id == "main").expect("main method")
}

#[test]
fn arithmetic_expression_lowers_through_a_temporary() {
    let program3 = lower("class Main { Void main () { println(1+2); } }");
    let main = main_method(&program3);
    assert_eq!(main.instrs.len(), 2);
    match &main.instrs[0] {
        Instr::Assign { target: Place3::Var(name), value: RValue::BinOp(BinOp::Add, l, r) } => {
            assert_eq!(l, &Operand::IntConst(1));
            assert_eq!(r, &Operand::IntConst(2));
            match &main.instrs[1] {
                Instr::Println(Operand::Var(printed)) => assert_eq!(printed, name),
                other => panic!("expected Println of the temporary, got {other:?}"),
            }
        }
        other => panic!("expected an Assign to a temporary, got {other:?}"),
    }
}

#[test]
fn if_else_lowers_with_negated_condition_and_two_labels() {
    let program3 = lower(
        "class Main { Void main () { if (1 < 2) { println(1); } else { println(2); } } }",
    );
    let main = main_method(&program3);
    let Instr::IfGoto { cond, target: l_else } = &main.instrs[0] else {
        panic!("expected IfGoto first, got {:?}", main.instrs[0]);
    };
    // The source condition is `1 < 2`; the branch jumps on its negation.
    assert_eq!(cond.op, BinOp::Ge);
    assert_eq!(cond.lhs, Operand::IntConst(1));
    assert_eq!(cond.rhs, Operand::IntConst(2));

    assert!(matches!(&main.instrs[1], Instr::Println(Operand::IntConst(1))));
    let Instr::Goto(l_end) = &main.instrs[2] else {
        panic!("expected Goto after the then-branch, got {:?}", main.instrs[2]);
    };
    assert!(matches!(&main.instrs[3], Instr::Label(l) if l == l_else));
    assert!(matches!(&main.instrs[4], Instr::Println(Operand::IntConst(2))));
    assert!(matches!(&main.instrs[5], Instr::Label(l) if l == l_end));
}

#[test]
fn while_loop_lowers_to_a_label_pair_around_the_negated_condition() {
    let program3 = lower(
        "class Main { Void main () { Int x; x = 0; while (x < 10) { x = x + 1; } } }",
    );
    let main = main_method(&program3);
    // instrs[0] is `x = 0`; instrs[1] must be the loop's condition label.
    let Instr::Label(l_cond) = &main.instrs[1] else {
        panic!("expected the while loop's condition label, got {:?}", main.instrs[1]);
    };
    let Instr::IfGoto { cond, target: l_end } = &main.instrs[2] else {
        panic!("expected IfGoto, got {:?}", main.instrs[2]);
    };
    assert_eq!(cond.op, BinOp::Ge);
    let last_two = &main.instrs[main.instrs.len() - 2..];
    assert!(matches!(&last_two[0], Instr::Goto(l) if l == l_cond));
    assert!(matches!(&last_two[1], Instr::Label(l) if l == l_end));
}

#[test]
fn overloaded_methods_get_distinct_mangled_ids() {
    let program3 = lower(
        "class Main { Void main () { Box b; b = new Box(); println(b.describe(1)); } } \
         class Box { \
           String describe (Int x) { return \"int\"; } \
           String describe (Bool x) { return \"bool\"; } \
         }",
    );
    let ids: Vec<&str> = program3
        .methods
        .iter()
        .filter(|m| m.class_name == "Box")
        .map(|m| m.method_id.as_str())
        .collect();
    assert_eq!(ids, vec!["Box_describe$0", "Box_describe$1"]);

    let main = main_method(&program3);
    let called = main.instrs.iter().find_map(|i| match i {
        Instr::Assign { value: RValue::Call(_, method, _), .. } => Some(method.as_str()),
        _ => None,
    });
    assert_eq!(called, Some("Box_describe$0"));
}

#[test]
fn null_argument_resolves_to_the_string_overload_at_the_call_site() {
    let program3 = lower(
        "class Main { Void main () { Box b; b = new Box(); println(b.describe(null)); } } \
         class Box { \
           String describe (Int x) { return \"int\"; } \
           String describe (String x) { return x; } \
         }",
    );
    let main = main_method(&program3);
    let called = main.instrs.iter().find_map(|i| match i {
        Instr::Assign { value: RValue::Call(_, method, _), .. } => Some(method.as_str()),
        _ => None,
    });
    // declaration order: describe(Int) is overload 0, describe(String) is 1.
    assert_eq!(called, Some("Box_describe$1"));
}

#[test]
fn single_overload_keeps_its_plain_name() {
    let program3 = lower(
        "class Main { Void main () { } } class Box { Int get () { return 1; } }",
    );
    let ids: Vec<&str> =
        program3.methods.iter().filter(|m| m.class_name == "Box").map(|m| m.method_id.as_str()).collect();
    assert_eq!(ids, vec!["Box_get"]);
}

#[test]
fn field_assignment_lowers_through_the_object_operand() {
    let program3 = lower(
        "class Main { Void main () { Counter c; c = new Counter(); c.n = 1; } } \
         class Counter { Int n; }",
    );
    let main = main_method(&program3);
    let found = main.instrs.iter().any(|i| {
        matches!(
            i,
            Instr::Assign {
                target: Place3::FieldAccess(Operand::Var(obj), field),
                value: RValue::Operand(Operand::IntConst(1)),
            } if obj == "c" && field == "n"
        )
    });
    assert!(found, "expected an assignment into c.n, got {:#?}", main.instrs);
}

#[test]
fn unary_not_and_class_field_layout_round_trip() {
    let program3 = lower(
        "class Main { Void main () { } } class Flag { Bool on; Void flip () { on = !on; } }",
    );
    let class = program3.classes.iter().find(|c| c.name == "Flag").unwrap();
    assert_eq!(class.fields, vec![("on".to_string(), Ty::Bool)]);

    let flip = program3.methods.iter().find(|m| m.method_id == "Flag_flip").unwrap();
    assert!(flip
        .instrs
        .iter()
        .any(|i| matches!(i, Instr::Assign { value: RValue::UnOp(UnOp::Not, Operand::Var(v)), .. } if v == "on")));
}

#[test]
fn pretty_printing_does_not_panic_and_names_the_method() {
    let program3 = lower("class Main { Void main () { println(1); } }");
    let text = program3.to_string();
    assert!(text.contains("Void main()"));
    assert!(text.contains("println(1);"));
}

#[test]
fn pretty_printing_matches_the_ir3_listing_snapshot() {
    let program3 = lower("class Main { Void main () { println(1); } }");
    insta::assert_snapshot!(program3.to_string(), @"\nVoid main(){\n  println(1);\n}\n");
}
