// Label resolution: the last pass over the op stream.
//
// Labels occupy no output line. Pass one assigns each remaining op its
// 0-based line and records where every label lands; pass two rewrites the
// symbolic jumps to absolute lines and turns `SET_HERE k` at line L into
// `SET (L + k)` — for the 3-op call sequence (`SET_HERE`, `STORE`,
// `JUMP`), offset 3 yields exactly the line after the jump.

use super::ops::VmOp;
use crate::error::{CompileError, CompileResult};
use crate::ir::LabelId;
use ahash::AHashMap;

pub fn resolve(code: Vec<VmOp>) -> CompileResult<Vec<VmOp>> {
    let mut lines: AHashMap<LabelId, u64> = AHashMap::new();
    let mut line = 0u64;
    for op in &code {
        if let VmOp::Label(id) = op {
            lines.insert(*id, line);
        } else {
            line += 1;
        }
    }

    let target = |label: LabelId| -> CompileResult<i64> {
        lines
            .get(&label)
            .map(|&l| l as i64)
            .ok_or(CompileError::UndefinedLabel { label })
    };

    let mut resolved = Vec::with_capacity(code.len());
    for op in code {
        let here = resolved.len() as i64;
        match op {
            VmOp::Label(_) => {}
            VmOp::JumpLabel(l) => resolved.push(VmOp::Jump(target(l)?)),
            VmOp::JposLabel(l) => resolved.push(VmOp::Jpos(target(l)?)),
            VmOp::JzeroLabel(l) => resolved.push(VmOp::Jzero(target(l)?)),
            VmOp::JnegLabel(l) => resolved.push(VmOp::Jneg(target(l)?)),
            VmOp::SetHere(offset) => resolved.push(VmOp::Set(here + offset)),
            concrete => resolved.push(concrete),
        }
    }
    Ok(resolved)
}
