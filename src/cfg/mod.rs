//! Basic-block partitioning, successor-edge derivation, and the two
//! intra-block optimizations (constant propagation into `println`,
//! algebraic-identity simplification) over a lowered `Method3`.
//!
//! Grounded on `original_source/control_flow.py`'s `ControlFlowGenerator`:
//! `_label_basic_blocks` (here `partition`), `_derive_edges` (here
//! `derive_edges`), `_annotate_int_constants_and_propagate` (here
//! `constant_propagate_println`), and `_optimize_algebraic_identities` (here
//! `algebraic_identities`). Internally this keeps the block/successor maps
//! as plain `BTreeMap`s rather than the `petgraph::graph::DiGraph` mentioned
//! in `SPEC_FULL.md` §3.7 for the handful of methods this crate compiles at
//! a time — see `DESIGN.md` for why the petgraph dependency is instead
//! spent on `crate::cfg::graph` (the type downstream analyses build from
//! this module's maps when they need real graph algorithms, e.g. dominance
//! or reachability, rather than here where a `Vec`/`BTreeMap` walk already
//! answers every question this module itself needs to ask).

mod graph;
#[cfg(test)]
mod tests;

pub use graph::to_digraph;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ast::BinOp;
use crate::ir3::{Instr, Method3, Operand, Place3, RValue};

/// A method's control-flow shape: which basic block each instruction
/// belongs to, each block's ordered successor list, and the block a given
/// label resolves to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cfg {
    pub block_count: usize,
    /// 0-based index into `Method3::instrs` → 1-based basic-block number.
    pub block_of: Vec<usize>,
    pub successors: BTreeMap<usize, Vec<usize>>,
    pub label_to_block: BTreeMap<String, usize>,
}

impl Cfg {
    pub fn successors_of(&self, block: usize) -> &[usize] {
        self.successors.get(&block).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// Steps 1-3: number instructions into basic blocks and derive successor
/// edges. A method with zero instructions still gets exactly one (empty)
/// block — `control_flow.py`'s `_label_basic_blocks` starts
/// `basic_block_count` at 1 before the walk begins, so the invariant holds
/// even when the walk never runs.
pub fn build_cfg(method: &Method3) -> Cfg {
    let (block_of, label_to_block) = partition(&method.instrs);
    let block_count = block_of.iter().copied().max().unwrap_or(1);
    let successors = derive_edges(&method.instrs, &block_of, &label_to_block, block_count);
    Cfg { block_count, block_of, successors, label_to_block }
}

/// Steps 4-6: optionally run the two intra-block optimizations, then
/// re-derive the CFG so block numbers and edges reflect the rewritten
/// instructions. `enable` is the "optional, enabled by a flag" knob
/// `spec.md` §4.5 step 4 names; there is no persisted configuration for it,
/// just this argument.
pub fn build_and_optimize(method: &mut Method3, enable: bool) -> Cfg {
    let cfg = build_cfg(method);
    if !enable {
        return cfg;
    }
    constant_propagate_println(&mut method.instrs, &cfg.block_of);
    algebraic_identities(&mut method.instrs);
    build_cfg(method)
}

fn partition(instrs: &[Instr]) -> (Vec<usize>, BTreeMap<String, usize>) {
    let mut block_of = Vec::with_capacity(instrs.len());
    let mut label_to_block = BTreeMap::new();
    let mut current_block: usize = 1;
    let mut prev_was_branch = false;

    for instr in instrs {
        if let Instr::Label(_) = instr {
            if !prev_was_branch {
                current_block += 1;
            }
        }
        block_of.push(current_block);
        if let Instr::Label(name) = instr {
            label_to_block.insert(name.clone(), current_block);
        }
        prev_was_branch = matches!(instr, Instr::IfGoto { .. } | Instr::Goto(_));
        if prev_was_branch {
            current_block += 1;
        }
    }

    (block_of, label_to_block)
}

fn derive_edges(
    instrs: &[Instr],
    block_of: &[usize],
    label_to_block: &BTreeMap<String, usize>,
    block_count: usize,
) -> BTreeMap<usize, Vec<usize>> {
    let mut edges: BTreeMap<usize, Vec<usize>> = (1..=block_count).map(|b| (b, Vec::new())).collect();

    for (i, instr) in instrs.iter().enumerate() {
        let is_block_final = i + 1 >= instrs.len() || block_of[i + 1] != block_of[i];
        if !is_block_final {
            continue;
        }
        let block = block_of[i];
        let out = edges.entry(block).or_default();
        match instr {
            Instr::IfGoto { target, .. } => {
                if let Some(&tb) = label_to_block.get(target) {
                    out.push(tb);
                }
                if i + 1 < instrs.len() {
                    out.push(block_of[i + 1]);
                }
            }
            Instr::Goto(target) => {
                if let Some(&tb) = label_to_block.get(target) {
                    out.push(tb);
                }
            }
            _ => {
                if i + 1 < instrs.len() {
                    out.push(block_of[i + 1]);
                }
            }
        }
    }

    edges
}

/// Step 4: substitutes a unique literal definition into a later `println`
/// of the same name, within one basic block. Preserved narrowly to
/// `println` (not every later use) per `SPEC_FULL.md` §10's Open Questions
/// resolution: the source only ever propagated into its `PrintLn3Node`, and
/// a richer implementation is explicitly left for later rather than guessed
/// at here.
fn constant_propagate_println(instrs: &mut [Instr], block_of: &[usize]) {
    let mut known: BTreeMap<String, Option<Operand>> = BTreeMap::new();
    let mut current_block = block_of.first().copied().unwrap_or(1);

    for i in 0..instrs.len() {
        if block_of[i] != current_block {
            known.clear();
            current_block = block_of[i];
        }

        match &instrs[i] {
            Instr::Assign { target: Place3::Var(name), value: RValue::Operand(op) } if is_literal(op) => {
                known.insert(name.clone(), Some(op.clone()));
            }
            Instr::Assign { target: Place3::Var(name), .. } => {
                known.insert(name.clone(), None);
            }
            Instr::Println(Operand::Var(name)) => {
                if let Some(Some(Operand::IntConst(n))) = known.get(name) {
                    instrs[i] = Instr::Println(Operand::IntConst(*n));
                }
            }
            _ => {}
        }
    }
}

fn is_literal(op: &Operand) -> bool {
    matches!(op, Operand::IntConst(_) | Operand::BoolConst(_) | Operand::StringConst(_))
}

/// Step 5: `a+0`, `0+a`, `a-0`, `a*1`, `1*a` collapse to the non-literal
/// operand. Division is excluded per `spec.md` §4.5. Every literal operand
/// in this IR3 is already a raw `Operand::IntConst`, not a variable that
/// happens to hold a propagated constant, so unlike
/// `original_source/control_flow.py`'s explicit `is_raw_value` bookkeeping,
/// no separate "is this eligible" flag is needed here.
fn algebraic_identities(instrs: &mut [Instr]) {
    for i in 0..instrs.len() {
        let replacement = match &instrs[i] {
            Instr::Assign { target, value: RValue::BinOp(op, l, r) } => {
                identity_operand(*op, l, r).map(|operand| (target.clone(), operand))
            }
            _ => None,
        };
        if let Some((target, operand)) = replacement {
            instrs[i] = Instr::Assign { target, value: RValue::Operand(operand) };
        }
    }
}

fn identity_operand(op: BinOp, l: &Operand, r: &Operand) -> Option<Operand> {
    match op {
        BinOp::Add if is_zero(l) => Some(r.clone()),
        BinOp::Add if is_zero(r) => Some(l.clone()),
        BinOp::Sub if is_zero(r) => Some(l.clone()),
        BinOp::Mul if is_one(l) => Some(r.clone()),
        BinOp::Mul if is_one(r) => Some(l.clone()),
        _ => None,
    }
}

fn is_zero(op: &Operand) -> bool {
    matches!(op, Operand::IntConst(0))
}

fn is_one(op: &Operand) -> bool {
    matches!(op, Operand::IntConst(1))
}
