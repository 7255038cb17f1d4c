use crate::ir3::{lower_program, Instr, Method3, Operand, Place3, Program3, RValue};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::typecheck::TypeChecker;

use super::*;

fn lower(source: &str) -> Program3 {
    let (tokens, lex_diags) = Lexer::new(source, 0).tokenize();
    assert!(lex_diags.is_empty(), "lex errors: {:?}", lex_diags);
    let program = Parser::new(tokens).parse_file().expect("parse errors");
    let class_table = TypeChecker::new().check_program(&program).expect("type errors");
    lower_program(&program, &class_table)
}

fn main_method(program3: &Program3) -> Method3 {
    program3.methods.iter().find(|m| m.method_id == "main").cloned().expect("main method")
}

#[test]
fn empty_method_is_a_single_block_with_no_successors() {
    let program3 = lower("class Main { Void main () { } }");
    let main = main_method(&program3);
    let cfg = build_cfg(&main);
    assert_eq!(cfg.block_count, 1);
    assert_eq!(cfg.successors.get(&1), Some(&Vec::new()));
}

#[test]
fn if_else_splits_into_four_blocks_with_target_before_fallthrough() {
    let program3 =
        lower("class Main { Void main () { if (1 < 2) { println(1); } else { println(2); } } }");
    let main = main_method(&program3);
    let cfg = build_cfg(&main);
    // block 1: IfGoto; block 2: then-branch + Goto; block 3: else-branch
    // (the Label that opens it is not itself a fresh split point since the
    // previous instruction, Goto, already started a new block); block 4:
    // the end label.
    assert_eq!(cfg.block_count, 4);
    assert_eq!(cfg.successors[&1], vec![3, 2]);
    assert_eq!(cfg.successors[&2], vec![4]);
    assert_eq!(cfg.successors[&3], vec![4]);
    assert_eq!(cfg.successors[&4], Vec::<usize>::new());
}

#[test]
fn if_else_edge_map_matches_the_expected_snapshot() {
    let program3 =
        lower("class Main { Void main () { if (1 < 2) { println(1); } else { println(2); } } }");
    let main = main_method(&program3);
    let cfg = build_cfg(&main);
    insta::assert_snapshot!(format!("{:?}", cfg.successors), @"{1: [3, 2], 2: [4], 3: [4], 4: []}");
}

#[test]
fn while_loop_back_edge_points_at_the_condition_block() {
    let program3 =
        lower("class Main { Void main () { Int x; x = 0; while (x < 10) { x = x + 1; } } }");
    let main = main_method(&program3);
    let cfg = build_cfg(&main);
    // block 1: x = 0 then the condition label opens block 2 (label whose
    // predecessor, the assignment, is not a branch).
    let cond_block = cfg.label_to_block[main
        .instrs
        .iter()
        .find_map(|i| if let Instr::Label(l) = i { Some(l.as_str()) } else { None })
        .unwrap()];
    assert!(cfg.successors[&cond_block].contains(&cond_block) == false);
    // the loop body's last block must goto back to the condition block.
    let body_block = *cfg
        .successors
        .iter()
        .find(|(_, succs)| succs.contains(&cond_block))
        .map(|(b, _)| b)
        .expect("some block branches back to the condition block");
    assert_ne!(body_block, cond_block);
}

#[test]
fn constant_propagation_rewrites_println_of_a_uniquely_known_int() {
    let mut method = Method3 {
        class_name: "Main".to_string(),
        method_id: "main".to_string(),
        return_ty: crate::types::Ty::Void,
        params: Vec::new(),
        locals: vec![("x".to_string(), crate::types::Ty::Int)],
        instrs: vec![
            Instr::Assign {
                target: Place3::Var("x".to_string()),
                value: RValue::Operand(Operand::IntConst(42)),
            },
            Instr::Println(Operand::Var("x".to_string())),
        ],
    };
    build_and_optimize(&mut method, true);
    assert!(matches!(method.instrs[1], Instr::Println(Operand::IntConst(42))));
}

#[test]
fn constant_propagation_skips_a_variable_reassigned_in_the_same_block() {
    let mut method = Method3 {
        class_name: "Main".to_string(),
        method_id: "main".to_string(),
        return_ty: crate::types::Ty::Void,
        params: Vec::new(),
        locals: vec![("x".to_string(), crate::types::Ty::Int)],
        instrs: vec![
            Instr::Assign {
                target: Place3::Var("x".to_string()),
                value: RValue::Operand(Operand::IntConst(1)),
            },
            Instr::Assign {
                target: Place3::Var("x".to_string()),
                value: RValue::Operand(Operand::IntConst(2)),
            },
            Instr::Println(Operand::Var("x".to_string())),
        ],
    };
    build_and_optimize(&mut method, true);
    assert!(matches!(method.instrs[2], Instr::Println(Operand::Var(ref v)) if v == "x"));
}

#[test]
fn algebraic_identities_collapse_additive_and_multiplicative_zero_one() {
    let mut method = Method3 {
        class_name: "Main".to_string(),
        method_id: "main".to_string(),
        return_ty: crate::types::Ty::Void,
        params: Vec::new(),
        locals: vec![
            ("a".to_string(), crate::types::Ty::Int),
            ("b".to_string(), crate::types::Ty::Int),
            ("c".to_string(), crate::types::Ty::Int),
        ],
        instrs: vec![
            Instr::Assign {
                target: Place3::Var("a".to_string()),
                value: RValue::BinOp(BinOp::Add, Operand::Var("x".to_string()), Operand::IntConst(0)),
            },
            Instr::Assign {
                target: Place3::Var("b".to_string()),
                value: RValue::BinOp(BinOp::Mul, Operand::IntConst(1), Operand::Var("y".to_string())),
            },
            Instr::Assign {
                target: Place3::Var("c".to_string()),
                value: RValue::BinOp(BinOp::Sub, Operand::Var("z".to_string()), Operand::IntConst(0)),
            },
        ],
    };
    build_and_optimize(&mut method, true);
    assert!(matches!(&method.instrs[0], Instr::Assign { value: RValue::Operand(Operand::Var(v)), .. } if v == "x"));
    assert!(matches!(&method.instrs[1], Instr::Assign { value: RValue::Operand(Operand::Var(v)), .. } if v == "y"));
    assert!(matches!(&method.instrs[2], Instr::Assign { value: RValue::Operand(Operand::Var(v)), .. } if v == "z"));
}

#[test]
fn division_is_never_simplified() {
    let mut method = Method3 {
        class_name: "Main".to_string(),
        method_id: "main".to_string(),
        return_ty: crate::types::Ty::Void,
        params: Vec::new(),
        locals: vec![("a".to_string(), crate::types::Ty::Int)],
        instrs: vec![Instr::Assign {
            target: Place3::Var("a".to_string()),
            value: RValue::BinOp(BinOp::Div, Operand::Var("x".to_string()), Operand::IntConst(1)),
        }],
    };
    build_and_optimize(&mut method, true);
    assert!(matches!(&method.instrs[0], Instr::Assign { value: RValue::BinOp(BinOp::Div, ..), .. }));
}

#[test]
fn disabled_optimization_leaves_instructions_untouched_but_still_builds_a_cfg() {
    let mut method = Method3 {
        class_name: "Main".to_string(),
        method_id: "main".to_string(),
        return_ty: crate::types::Ty::Void,
        params: Vec::new(),
        locals: vec![("a".to_string(), crate::types::Ty::Int)],
        instrs: vec![Instr::Assign {
            target: Place3::Var("a".to_string()),
            value: RValue::BinOp(BinOp::Add, Operand::Var("x".to_string()), Operand::IntConst(0)),
        }],
    };
    let cfg = build_and_optimize(&mut method, false);
    assert_eq!(cfg.block_count, 1);
    assert!(matches!(&method.instrs[0], Instr::Assign { value: RValue::BinOp(BinOp::Add, ..), .. }));
}

#[test]
fn to_digraph_has_one_node_per_block_and_matching_edges() {
    let program3 =
        lower("class Main { Void main () { if (1 < 2) { println(1); } else { println(2); } } }");
    let main = main_method(&program3);
    let cfg = build_cfg(&main);
    let (graph, node_for) = to_digraph(&cfg);
    assert_eq!(graph.node_count(), cfg.block_count);
    assert_eq!(graph.edge_count(), cfg.successors.values().map(|v| v.len()).sum::<usize>());
    assert!(node_for.contains_key(&1));
}
