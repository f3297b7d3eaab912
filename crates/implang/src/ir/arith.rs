// Synthesized arithmetic: `*`, `/` and `%` have no machine instruction and
// compile to calls into the subroutines emitted here.
//
// Division is floor division (quotient toward −∞) and the remainder takes
// the divisor's sign; a zero divisor yields quotient 0 and remainder 0.
// All three routines finish in O(log max(|x|, |y|)) machine steps.

use super::ops::{Ir, LabelKind, Operand, ProcInfo, Variable};
use super::{ABS_PROC, DIV_PROC, IrBuilder, MUL_PROC};
use crate::ast::{ArithOp, RelOp};
use smol_str::SmolStr;

/// The fixed ABI cells shared by the subroutines and their call sites.
/// Callers stage into `arg1`/`arg2` before every call (the cells are
/// clobbered) and harvest `result` (product, quotient) or `result2`
/// (remainder).
pub(crate) struct Abi {
    pub arg1: Variable,
    pub arg2: Variable,
    pub sign1: Variable,
    pub sign2: Variable,
    pub result: Variable,
    pub result2: Variable,
    pub temp: Variable,
    pub divisor: Variable,
}

impl Abi {
    pub(crate) fn register(b: &mut IrBuilder) -> Abi {
        let cell = |b: &mut IrBuilder, name: &str| {
            b.variables
                .register(Variable::scalar(SmolStr::new(name), None))
        };
        Abi {
            arg1: cell(b, "#arg1"),
            arg2: cell(b, "#arg2"),
            sign1: cell(b, "#sign1"),
            sign2: cell(b, "#sign2"),
            result: cell(b, "#result"),
            result2: cell(b, "#result2"),
            temp: cell(b, super::SCRATCH_CELL),
            divisor: cell(b, "#divisor"),
        }
    }
}

fn val(var: &Variable) -> Operand {
    Operand::Value(var.clone())
}

/// `#abs`: strips the signs off `arg1`/`arg2`, recording them in
/// `sign1`/`sign2` as ±1.
pub(crate) fn emit_abs(b: &mut IrBuilder) {
    let abi = Abi::register(b);
    let zero = b.const_operand(0);
    let one = b.const_operand(1);
    let minus_one = b.const_operand(-1);

    let entry = b.labels.fresh(LabelKind::ProcStart, "absolute values");
    let return_var = b.return_cell(ABS_PROC);
    b.procedures.insert(
        SmolStr::new(ABS_PROC),
        ProcInfo {
            entry,
            params: Vec::new(),
            return_var: return_var.clone(),
        },
    );

    b.emit(Ir::Label {
        id: entry,
        comment: "absolute values".into(),
    });

    for (arg, sign) in [(&abi.arg1, &abi.sign1), (&abi.arg2, &abi.sign2)] {
        let negate = b.labels.fresh(LabelKind::IfElse, "negative operand");
        let done = b.labels.fresh(LabelKind::IfEnd, "sign recorded");
        b.emit(Ir::CondJump {
            left: val(arg),
            op: RelOp::Lt,
            right: zero.clone(),
            label: negate,
            comment: "negative operand".into(),
        });
        b.emit(Ir::Assign {
            target: val(sign),
            value: one.clone(),
            comment: String::new(),
        });
        b.emit(Ir::Jump {
            label: done,
            comment: String::new(),
        });
        b.emit(Ir::Label {
            id: negate,
            comment: String::new(),
        });
        b.emit(Ir::BinOp {
            target: val(arg),
            left: zero.clone(),
            op: ArithOp::Sub,
            right: val(arg),
            comment: "flip to non-negative".into(),
        });
        b.emit(Ir::Assign {
            target: val(sign),
            value: minus_one.clone(),
            comment: String::new(),
        });
        b.emit(Ir::Label {
            id: done,
            comment: String::new(),
        });
    }

    b.emit(Ir::Return {
        return_var,
        comment: "return from abs".into(),
    });
}

/// `#mul`: Russian-peasant multiplication of the staged operands.
/// While the multiplier is positive: add the multiplicand into the result
/// when the multiplier is odd, then double one and halve the other.
pub(crate) fn emit_mul(b: &mut IrBuilder) {
    let abi = Abi::register(b);
    let zero = b.const_operand(0);

    let entry = b.labels.fresh(LabelKind::ProcStart, "multiply");
    let return_var = b.return_cell(MUL_PROC);
    b.procedures.insert(
        SmolStr::new(MUL_PROC),
        ProcInfo {
            entry,
            params: Vec::new(),
            return_var: return_var.clone(),
        },
    );

    let loop_start = b.labels.fresh(LabelKind::WhileStart, "multiply loop");
    let loop_body = b.labels.fresh(LabelKind::WhileHelper, "multiply loop body");
    let loop_end = b.labels.fresh(LabelKind::WhileEnd, "multiply loop end");
    let even = b.labels.fresh(LabelKind::IfEnd, "even multiplier");
    let same_sign = b.labels.fresh(LabelKind::IfEnd, "signs agree");

    b.emit(Ir::Label {
        id: entry,
        comment: "multiply".into(),
    });
    b.emit(Ir::Call {
        name: SmolStr::new(ABS_PROC),
        args: Vec::new(),
        comment: "strip signs".into(),
    });
    b.emit(Ir::Assign {
        target: val(&abi.result),
        value: zero.clone(),
        comment: "result := 0".into(),
    });

    b.emit(Ir::Label {
        id: loop_start,
        comment: "multiply loop".into(),
    });
    b.emit(Ir::CondJump {
        left: val(&abi.arg2),
        op: RelOp::Gt,
        right: zero.clone(),
        label: loop_body,
        comment: "multiplier left".into(),
    });
    b.emit(Ir::Jump {
        label: loop_end,
        comment: "multiplier exhausted".into(),
    });
    b.emit(Ir::Label {
        id: loop_body,
        comment: String::new(),
    });

    // parity probe: temp := 2*(arg2/2) - arg2 is 0 for even, -1 for odd
    b.emit(Ir::Assign {
        target: val(&abi.temp),
        value: val(&abi.arg2),
        comment: String::new(),
    });
    b.emit(Ir::Half {
        target: val(&abi.temp),
        comment: String::new(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.temp),
        left: val(&abi.temp),
        op: ArithOp::Add,
        right: val(&abi.temp),
        comment: String::new(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.temp),
        left: val(&abi.temp),
        op: ArithOp::Sub,
        right: val(&abi.arg2),
        comment: "parity of multiplier".into(),
    });
    b.emit(Ir::CondJump {
        left: val(&abi.temp),
        op: RelOp::Eq,
        right: zero.clone(),
        label: even,
        comment: "even multiplier".into(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.result),
        left: val(&abi.result),
        op: ArithOp::Add,
        right: val(&abi.arg1),
        comment: "odd: accumulate".into(),
    });
    b.emit(Ir::Label {
        id: even,
        comment: String::new(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.arg1),
        left: val(&abi.arg1),
        op: ArithOp::Add,
        right: val(&abi.arg1),
        comment: "double multiplicand".into(),
    });
    b.emit(Ir::Half {
        target: val(&abi.arg2),
        comment: "halve multiplier".into(),
    });
    b.emit(Ir::Jump {
        label: loop_start,
        comment: String::new(),
    });
    b.emit(Ir::Label {
        id: loop_end,
        comment: "multiply loop end".into(),
    });

    b.emit(Ir::CondJump {
        left: val(&abi.sign1),
        op: RelOp::Eq,
        right: val(&abi.sign2),
        label: same_sign,
        comment: "signs agree".into(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.result),
        left: zero,
        op: ArithOp::Sub,
        right: val(&abi.result),
        comment: "negate product".into(),
    });
    b.emit(Ir::Label {
        id: same_sign,
        comment: String::new(),
    });
    b.emit(Ir::Return {
        return_var,
        comment: "return from multiply".into(),
    });
}

/// `#div`: binary long division of the staged operands. The divisor is
/// scaled up by doubling alongside a power-of-two counter (kept in `arg1`
/// once the dividend magnitude is parked in `result2`), then reduced back
/// while subtracting. The sign fix implements floor semantics:
///
///   sign1  sign2   quotient          remainder
///    +      +      unchanged         unchanged
///    −      −      unchanged         negated
///    −      +      −(q+1)            |divisor| − r
///    +      −      −(q+1)            r − |divisor|
///
/// with the `+1` adjustment skipped when the remainder is exactly zero.
pub(crate) fn emit_div(b: &mut IrBuilder) {
    let abi = Abi::register(b);
    let zero = b.const_operand(0);
    let one = b.const_operand(1);

    let entry = b.labels.fresh(LabelKind::ProcStart, "divide");
    let return_var = b.return_cell(DIV_PROC);
    b.procedures.insert(
        SmolStr::new(DIV_PROC),
        ProcInfo {
            entry,
            params: Vec::new(),
            return_var: return_var.clone(),
        },
    );

    let scale = b.labels.fresh(LabelKind::WhileStart, "scale-up loop");
    let scale_end = b.labels.fresh(LabelKind::WhileEnd, "scale-up done");
    let reduce = b.labels.fresh(LabelKind::WhileStart, "reduce loop");
    let reduce_body = b.labels.fresh(LabelKind::WhileHelper, "reduce loop body");
    let reduce_end = b.labels.fresh(LabelKind::WhileEnd, "reduce done");
    let no_fit = b.labels.fresh(LabelKind::IfEnd, "divisor does not fit");
    let same_sign = b.labels.fresh(LabelKind::IfElse, "signs agree");
    let exact = b.labels.fresh(LabelKind::IfElse, "zero remainder");
    let pos_neg = b.labels.fresh(LabelKind::IfElse, "positive over negative");
    let zero_divisor = b.labels.fresh(LabelKind::IfElse, "division by zero");
    let done = b.labels.fresh(LabelKind::ProcEnd, "divide end");

    b.emit(Ir::Label {
        id: entry,
        comment: "divide".into(),
    });
    b.emit(Ir::CondJump {
        left: val(&abi.arg2),
        op: RelOp::Eq,
        right: zero.clone(),
        label: zero_divisor,
        comment: "division by zero".into(),
    });
    b.emit(Ir::Call {
        name: SmolStr::new(ABS_PROC),
        args: Vec::new(),
        comment: "strip signs".into(),
    });
    b.emit(Ir::Assign {
        target: val(&abi.divisor),
        value: val(&abi.arg2),
        comment: "keep |divisor| for the sign fix".into(),
    });
    b.emit(Ir::Assign {
        target: val(&abi.result),
        value: zero.clone(),
        comment: "quotient := 0".into(),
    });
    b.emit(Ir::Assign {
        target: val(&abi.result2),
        value: val(&abi.arg1),
        comment: "remainder := |dividend|".into(),
    });
    // arg1 is free from here on and holds the running power of two
    b.emit(Ir::Assign {
        target: val(&abi.arg1),
        value: one.clone(),
        comment: "power := 1".into(),
    });

    b.emit(Ir::Label {
        id: scale,
        comment: "scale-up loop".into(),
    });
    b.emit(Ir::CondJump {
        left: val(&abi.arg2),
        op: RelOp::Gt,
        right: val(&abi.result2),
        label: scale_end,
        comment: "divisor overtook remainder".into(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.arg2),
        left: val(&abi.arg2),
        op: ArithOp::Add,
        right: val(&abi.arg2),
        comment: "double divisor".into(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.arg1),
        left: val(&abi.arg1),
        op: ArithOp::Add,
        right: val(&abi.arg1),
        comment: "double power".into(),
    });
    b.emit(Ir::Jump {
        label: scale,
        comment: String::new(),
    });
    b.emit(Ir::Label {
        id: scale_end,
        comment: "scale-up done".into(),
    });

    b.emit(Ir::Label {
        id: reduce,
        comment: "reduce loop".into(),
    });
    b.emit(Ir::CondJump {
        left: val(&abi.arg1),
        op: RelOp::Gt,
        right: zero.clone(),
        label: reduce_body,
        comment: "power left".into(),
    });
    b.emit(Ir::Jump {
        label: reduce_end,
        comment: "power exhausted".into(),
    });
    b.emit(Ir::Label {
        id: reduce_body,
        comment: String::new(),
    });
    b.emit(Ir::CondJump {
        left: val(&abi.result2),
        op: RelOp::Lt,
        right: val(&abi.arg2),
        label: no_fit,
        comment: "divisor does not fit".into(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.result2),
        left: val(&abi.result2),
        op: ArithOp::Sub,
        right: val(&abi.arg2),
        comment: "subtract scaled divisor".into(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.result),
        left: val(&abi.result),
        op: ArithOp::Add,
        right: val(&abi.arg1),
        comment: "add power to quotient".into(),
    });
    b.emit(Ir::Label {
        id: no_fit,
        comment: String::new(),
    });
    b.emit(Ir::Half {
        target: val(&abi.arg1),
        comment: "halve power".into(),
    });
    b.emit(Ir::Half {
        target: val(&abi.arg2),
        comment: "halve divisor".into(),
    });
    b.emit(Ir::Jump {
        label: reduce,
        comment: String::new(),
    });
    b.emit(Ir::Label {
        id: reduce_end,
        comment: "reduce done".into(),
    });

    // sign fix, see the table above
    b.emit(Ir::CondJump {
        left: val(&abi.sign1),
        op: RelOp::Eq,
        right: val(&abi.sign2),
        label: same_sign,
        comment: "signs agree".into(),
    });
    b.emit(Ir::CondJump {
        left: val(&abi.result2),
        op: RelOp::Eq,
        right: zero.clone(),
        label: exact,
        comment: "zero remainder".into(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.result),
        left: val(&abi.result),
        op: ArithOp::Add,
        right: one,
        comment: "floor adjustment".into(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.result),
        left: zero.clone(),
        op: ArithOp::Sub,
        right: val(&abi.result),
        comment: "negate quotient".into(),
    });
    b.emit(Ir::CondJump {
        left: val(&abi.sign1),
        op: RelOp::Gt,
        right: zero.clone(),
        label: pos_neg,
        comment: "positive dividend".into(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.result2),
        left: val(&abi.divisor),
        op: ArithOp::Sub,
        right: val(&abi.result2),
        comment: "remainder := |divisor| - remainder".into(),
    });
    b.emit(Ir::Jump {
        label: done,
        comment: String::new(),
    });
    b.emit(Ir::Label {
        id: pos_neg,
        comment: String::new(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.result2),
        left: val(&abi.result2),
        op: ArithOp::Sub,
        right: val(&abi.divisor),
        comment: "remainder := remainder - |divisor|".into(),
    });
    b.emit(Ir::Jump {
        label: done,
        comment: String::new(),
    });
    b.emit(Ir::Label {
        id: exact,
        comment: "zero remainder".into(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.result),
        left: zero.clone(),
        op: ArithOp::Sub,
        right: val(&abi.result),
        comment: "negate quotient".into(),
    });
    b.emit(Ir::Jump {
        label: done,
        comment: String::new(),
    });
    b.emit(Ir::Label {
        id: same_sign,
        comment: "signs agree".into(),
    });
    b.emit(Ir::CondJump {
        left: val(&abi.sign1),
        op: RelOp::Gt,
        right: zero.clone(),
        label: done,
        comment: "both positive".into(),
    });
    b.emit(Ir::BinOp {
        target: val(&abi.result2),
        left: zero.clone(),
        op: ArithOp::Sub,
        right: val(&abi.result2),
        comment: "both negative: negate remainder".into(),
    });
    b.emit(Ir::Jump {
        label: done,
        comment: String::new(),
    });
    b.emit(Ir::Label {
        id: zero_divisor,
        comment: "division by zero".into(),
    });
    b.emit(Ir::Assign {
        target: val(&abi.result),
        value: zero.clone(),
        comment: "quotient := 0".into(),
    });
    b.emit(Ir::Assign {
        target: val(&abi.result2),
        value: zero,
        comment: "remainder := 0".into(),
    });
    b.emit(Ir::Label {
        id: done,
        comment: "divide end".into(),
    });
    b.emit(Ir::Return {
        return_var,
        comment: "return from divide".into(),
    });
}
