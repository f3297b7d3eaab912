// The code generator: lowers the IR stream to machine ops.
//
// Access mode drives addressing: a by-value operand compiles to the
// direct instruction, a by-reference operand to the indirect one. The
// prologue materializes every array base pointer and constant cell once;
// the label resolver then fixes up all symbolic targets.

pub mod labels;
pub mod ops;

pub use ops::VmOp;

use crate::ast::{ArithOp, RelOp};
use crate::error::{CompileError, CompileResult};
use crate::ir::{DIV_PROC, Ir, IrProgram, MUL_PROC, Operand, ProcInfo, SCRATCH_CELL, Variable};
use crate::memory::MemoryMap;

/// Lower a whole IR program and resolve its labels. The result contains
/// no pseudo-ops and is ready for [`ops::write_program`].
pub fn generate(ir: &IrProgram, memory: &MemoryMap) -> CompileResult<Vec<VmOp>> {
    let mut generator = CodeGenerator {
        ir,
        memory,
        code: Vec::new(),
    };
    generator.emit_prologue()?;
    for instruction in &ir.code {
        generator.lower(instruction)?;
    }
    generator.code.push(VmOp::Halt);
    labels::resolve(generator.code)
}

struct CodeGenerator<'a> {
    ir: &'a IrProgram,
    memory: &'a MemoryMap,
    code: Vec<VmOp>,
}

impl<'a> CodeGenerator<'a> {
    /// Immutable state, materialized once before the program runs: each
    /// local array's base cell receives its element-zero address, each
    /// constant cell its value.
    fn emit_prologue(&mut self) -> CompileResult<()> {
        for var in self.ir.variables.iter() {
            if var.is_array && !var.is_pointer {
                let cell = self.memory.cell(&var.name)?;
                let zero_address = cell.zero_address.unwrap_or(0);
                self.code.push(VmOp::Set(zero_address));
                self.code.push(VmOp::Store(cell.address));
            }
        }
        for var in self.ir.variables.iter() {
            if var.is_const {
                let Some(value) = var.const_value else { continue };
                let address = self.memory.address_of(&var.name)?;
                self.code.push(VmOp::Set(value));
                self.code.push(VmOp::Store(address));
            }
        }
        Ok(())
    }

    fn lower(&mut self, instruction: &Ir) -> CompileResult<()> {
        match instruction {
            Ir::Label { id, .. } => {
                self.code.push(VmOp::Label(*id));
                Ok(())
            }
            Ir::Jump { label, .. } => {
                self.code.push(VmOp::JumpLabel(*label));
                Ok(())
            }
            Ir::CondJump {
                left,
                op,
                right,
                label,
                ..
            } => self.lower_cond_jump(left, *op, right, *label),
            Ir::Assign { target, value, .. } => {
                self.load(value)?;
                self.store(target)
            }
            Ir::BinOp {
                target,
                left,
                op,
                right,
                ..
            } => self.lower_bin_op(target, left, *op, right),
            Ir::Half { target, .. } => {
                self.load(target)?;
                self.code.push(VmOp::Half);
                self.store(target)
            }
            Ir::ArrayRead {
                target,
                array,
                index,
                ..
            } => self.lower_array_read(target, array, index),
            Ir::ArrayWrite {
                array,
                index,
                value,
                ..
            } => self.lower_array_write(array, index, value),
            Ir::Read { target, .. } => {
                self.code.push(VmOp::Get(0));
                self.store(target)
            }
            Ir::Write { value, .. } => {
                self.load(value)?;
                self.code.push(VmOp::Put(0));
                Ok(())
            }
            Ir::Call { name, args, .. } => self.lower_call(name, args),
            Ir::Return { return_var, .. } => {
                let address = self.memory.address_of(&return_var.name)?;
                self.code.push(VmOp::Rtrn(address));
                Ok(())
            }
        }
    }

    // ---- operand access --------------------------------------------------

    fn load(&mut self, operand: &Operand) -> CompileResult<()> {
        let address = self.memory.address_of(operand.name())?;
        self.code.push(if operand.is_reference() {
            VmOp::Loadi(address)
        } else {
            VmOp::Load(address)
        });
        Ok(())
    }

    fn store(&mut self, operand: &Operand) -> CompileResult<()> {
        let address = self.memory.address_of(operand.name())?;
        self.code.push(if operand.is_reference() {
            VmOp::Storei(address)
        } else {
            VmOp::Store(address)
        });
        Ok(())
    }

    fn add(&mut self, operand: &Operand) -> CompileResult<()> {
        let address = self.memory.address_of(operand.name())?;
        self.code.push(if operand.is_reference() {
            VmOp::Addi(address)
        } else {
            VmOp::Add(address)
        });
        Ok(())
    }

    fn sub(&mut self, operand: &Operand) -> CompileResult<()> {
        let address = self.memory.address_of(operand.name())?;
        self.code.push(if operand.is_reference() {
            VmOp::Subi(address)
        } else {
            VmOp::Sub(address)
        });
        Ok(())
    }

    // ---- instruction lowering --------------------------------------------

    fn lower_cond_jump(
        &mut self,
        left: &Operand,
        op: RelOp,
        right: &Operand,
        label: crate::ir::LabelId,
    ) -> CompileResult<()> {
        self.load(left)?;
        self.sub(right)?;
        let jump = match op {
            RelOp::Eq => VmOp::JzeroLabel(label),
            RelOp::Gt => VmOp::JposLabel(label),
            RelOp::Lt => VmOp::JnegLabel(label),
            other => return Err(CompileError::UnsupportedCondition { operator: other }),
        };
        self.code.push(jump);
        Ok(())
    }

    fn lower_bin_op(
        &mut self,
        target: &Operand,
        left: &Operand,
        op: ArithOp,
        right: &Operand,
    ) -> CompileResult<()> {
        match op {
            ArithOp::Add => {
                self.load(left)?;
                self.add(right)?;
                self.store(target)
            }
            ArithOp::Sub => {
                self.load(left)?;
                self.sub(right)?;
                self.store(target)
            }
            ArithOp::Mul => self.lower_costly(target, left, right, MUL_PROC, "#result"),
            ArithOp::Div => self.lower_costly(target, left, right, DIV_PROC, "#result"),
            ArithOp::Mod => self.lower_costly(target, left, right, DIV_PROC, "#result2"),
        }
    }

    /// Stage the operands into the arithmetic ABI, call the subroutine,
    /// harvest the requested result cell.
    fn lower_costly(
        &mut self,
        target: &Operand,
        left: &Operand,
        right: &Operand,
        callee: &str,
        result_cell: &str,
    ) -> CompileResult<()> {
        let arg1 = self.memory.address_of("#arg1")?;
        let arg2 = self.memory.address_of("#arg2")?;
        self.load(left)?;
        self.code.push(VmOp::Store(arg1));
        self.load(right)?;
        self.code.push(VmOp::Store(arg2));
        self.emit_call(callee)?;
        let result = self.memory.address_of(result_cell)?;
        self.code.push(VmOp::Load(result));
        self.store(target)
    }

    fn lower_array_read(
        &mut self,
        target: &Operand,
        array: &Variable,
        index: &Operand,
    ) -> CompileResult<()> {
        // the base cell holds the element-zero address, so base + index
        // is the element's cell
        let base = self.memory.address_of(&array.name)?;
        self.code.push(VmOp::Load(base));
        self.add(index)?;
        self.code.push(VmOp::Loadi(0));
        self.store(target)
    }

    fn lower_array_write(
        &mut self,
        array: &Variable,
        index: &Operand,
        value: &Operand,
    ) -> CompileResult<()> {
        // effective address lands in the scratch cell; the value then
        // goes through it
        let base = self.memory.address_of(&array.name)?;
        let scratch = self.memory.address_of(SCRATCH_CELL)?;
        self.code.push(VmOp::Load(base));
        self.add(index)?;
        self.code.push(VmOp::Store(scratch));
        self.load(value)?;
        self.code.push(VmOp::Storei(scratch));
        Ok(())
    }

    /// Procedure linkage. Every formal is a pointer cell; a plain scalar
    /// actual passes its address immediately, an array or pointer actual
    /// forwards the address its own cell holds.
    fn lower_call(&mut self, name: &str, args: &[Variable]) -> CompileResult<()> {
        let info = self.proc_info(name)?;
        let formals = info.params.clone();
        for (actual, formal) in args.iter().zip(&formals) {
            let formal_address = self.memory.address_of(&formal.name)?;
            let actual_address = self.memory.address_of(&actual.name)?;
            if actual.is_array || actual.is_pointer {
                self.code.push(VmOp::Load(actual_address));
            } else {
                self.code.push(VmOp::Set(actual_address as i64));
            }
            self.code.push(VmOp::Store(formal_address));
        }
        self.emit_call(name)
    }

    /// The return-address trick: `SET_HERE 3` resolves to the line after
    /// the jump, which is where the callee's `RTRN` resumes.
    fn emit_call(&mut self, callee: &str) -> CompileResult<()> {
        let info = self.proc_info(callee)?;
        let entry = info.entry;
        let return_address = self.memory.address_of(&info.return_var.name)?;
        self.code.push(VmOp::SetHere(3));
        self.code.push(VmOp::Store(return_address));
        self.code.push(VmOp::JumpLabel(entry));
        Ok(())
    }

    fn proc_info(&self, name: &str) -> CompileResult<&ProcInfo> {
        self.ir
            .procedures
            .get(name)
            .ok_or_else(|| CompileError::UnknownProcedure {
                name: name.to_string(),
            })
    }
}
