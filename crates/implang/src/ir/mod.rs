// The IR builder: walks the AST and produces a linear instruction stream,
// the variable registry, and per-callable metadata.
//
// Naming rules for registry keys: procedure-locals and parameters become
// `"{proc}#{name}"`, main's declarations keep their bare name, constants
// use their textual value (`neg{n}` when negative), temporaries are
// `t{k}`. Compiler-introduced cells are `#`-prefixed (`#arg1`, `#temp`,
// `#ret#{proc}`), which keeps them outside the user namespace.

mod arith;
pub mod ops;

pub use ops::{Ir, LabelAlloc, LabelId, LabelKind, Operand, ProcInfo, VarRegistry, Variable};

use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::symbols::{SymbolTable, scoped_name};
use ahash::AHashMap;
use smol_str::SmolStr;

/// Synthesized callables and the shared scratch cell.
pub const ABS_PROC: &str = "#abs";
pub const MUL_PROC: &str = "#mul";
pub const DIV_PROC: &str = "#div";
pub const SCRATCH_CELL: &str = "#temp";

/// Output of the builder, consumed by the memory mapper and the code
/// generator. Immutable once built.
#[derive(Debug)]
pub struct IrProgram {
    pub code: Vec<Ir>,
    pub variables: VarRegistry,
    pub procedures: AHashMap<SmolStr, ProcInfo>,
    pub labels: LabelAlloc,
}

/// Build the IR for a semantically valid program.
///
/// Emission order: a placeholder jump to main's entry, the synthesized
/// arithmetic subroutines the program needs, each user procedure in
/// declaration order, then main. Calls therefore always resolve forward
/// and the initial jump skips every subroutine body on cold start.
pub fn build(program: &Program, table: &SymbolTable) -> CompileResult<IrProgram> {
    let mut b = IrBuilder::new(table);

    let main_label = b.labels.fresh(LabelKind::MainStart, "main program");
    b.emit(Ir::Jump {
        label: main_label,
        comment: "skip subroutine bodies".into(),
    });

    let costly = table.costly_operations();
    let needs_mul = costly.contains(&ArithOp::Mul);
    let needs_div = costly.contains(&ArithOp::Div) || costly.contains(&ArithOp::Mod);
    if needs_mul || needs_div {
        arith::emit_abs(&mut b);
    }
    if needs_mul {
        arith::emit_mul(&mut b);
    }
    if needs_div {
        arith::emit_div(&mut b);
    }

    for proc in &program.procedures {
        b.build_procedure(proc)?;
    }

    b.emit(Ir::Label {
        id: main_label,
        comment: "main program".into(),
    });
    for cmd in &program.commands {
        b.build_command(cmd)?;
    }

    Ok(IrProgram {
        code: b.code,
        variables: b.variables,
        procedures: b.procedures,
        labels: b.labels,
    })
}

pub(crate) struct IrBuilder<'a> {
    table: &'a SymbolTable,
    pub(crate) code: Vec<Ir>,
    pub(crate) variables: VarRegistry,
    pub(crate) procedures: AHashMap<SmolStr, ProcInfo>,
    pub(crate) labels: LabelAlloc,
    temp_counter: u32,
    current_proc: Option<SmolStr>,
}

impl<'a> IrBuilder<'a> {
    fn new(table: &'a SymbolTable) -> Self {
        IrBuilder {
            table,
            code: Vec::new(),
            variables: VarRegistry::new(),
            procedures: AHashMap::new(),
            labels: LabelAlloc::new(),
            temp_counter: 0,
            current_proc: None,
        }
    }

    pub(crate) fn emit(&mut self, ir: Ir) {
        self.code.push(ir);
    }

    pub(crate) fn fresh_temp(&mut self) -> Variable {
        self.temp_counter += 1;
        let name = SmolStr::new(format!("t{}", self.temp_counter));
        self.variables
            .register(Variable::temp(name, self.current_proc.clone()))
    }

    /// Materializes (or reuses) the constant cell for `value`.
    pub(crate) fn const_operand(&mut self, value: i64) -> Operand {
        Operand::Value(self.variables.register(Variable::constant(value)))
    }

    /// The dedicated return-address cell of a callable.
    pub(crate) fn return_cell(&mut self, proc: &str) -> Variable {
        let name = SmolStr::new(format!("#ret#{proc}"));
        self.variables.register(Variable::scalar(name, None))
    }

    // ---- name resolution -------------------------------------------------

    fn symbol(&self, name: &str, location: Location) -> CompileResult<&crate::symbols::Symbol> {
        self.table
            .lookup(self.current_proc.as_ref(), name)
            .ok_or_else(|| CompileError::UnknownSymbol {
                name: name.to_string(),
                location,
            })
    }

    /// A scalar use site: locally declared cells are accessed by value,
    /// parameters hold an address and are accessed through it.
    fn resolve_scalar(&mut self, name: &str, location: Location) -> CompileResult<Operand> {
        let symbol = self.symbol(name, location)?;
        let is_parameter = symbol.is_parameter;
        let scoped = scoped_name(self.current_proc.as_ref(), name);
        let var = if is_parameter {
            let proc = self.current_proc.clone().unwrap_or_default();
            self.variables.register(Variable::param(scoped, proc))
        } else {
            self.variables
                .register(Variable::scalar(scoped, self.current_proc.clone()))
        };
        Ok(if is_parameter {
            Operand::Reference(var)
        } else {
            Operand::Value(var)
        })
    }

    /// The variable whose cell holds the array's element-zero address.
    fn resolve_array(&mut self, name: &str, location: Location) -> CompileResult<Variable> {
        let symbol = self.symbol(name, location)?;
        let scoped = scoped_name(self.current_proc.as_ref(), name);
        if symbol.is_array_parameter {
            let proc = self.current_proc.clone().unwrap_or_default();
            return Ok(self.variables.register(Variable::array_param(scoped, proc)));
        }
        let (Some(lo), Some(hi)) = (symbol.array_start, symbol.array_end) else {
            return Err(CompileError::MalformedAst {
                message: format!("array '{name}' has no bounds"),
                location,
            });
        };
        let size = (hi - lo + 1) as u64;
        Ok(self
            .variables
            .register(Variable::array(scoped, lo, size, self.current_proc.clone())))
    }

    fn resolve_index(&mut self, index: &Index, location: Location) -> CompileResult<Operand> {
        match index {
            Index::Number(n) => Ok(self.const_operand(*n)),
            Index::Name(name) => self.resolve_scalar(name, location),
        }
    }

    /// An rvalue. Array element reads land in a fresh temporary.
    fn resolve_value(&mut self, value: &Value) -> CompileResult<Operand> {
        match value {
            Value::Number(n, _) => Ok(self.const_operand(*n)),
            Value::Ident(id) => match &id.index {
                None => self.resolve_scalar(&id.name, id.location),
                Some(index) => {
                    let array = self.resolve_array(&id.name, id.location)?;
                    let index = self.resolve_index(index, id.location)?;
                    let temp = self.fresh_temp();
                    self.emit(Ir::ArrayRead {
                        target: Operand::Value(temp.clone()),
                        array,
                        index,
                        comment: format!("load {}[...]", id.name),
                    });
                    Ok(Operand::Value(temp))
                }
            },
        }
    }

    /// A procedure-call actual: the bare variable, never dereferenced.
    fn resolve_arg(&mut self, name: &str, location: Location) -> CompileResult<Variable> {
        let symbol = self.symbol(name, location)?;
        if symbol.is_array {
            return self.resolve_array(name, location);
        }
        let is_parameter = symbol.is_parameter;
        let scoped = scoped_name(self.current_proc.as_ref(), name);
        if is_parameter {
            let proc = self.current_proc.clone().unwrap_or_default();
            Ok(self.variables.register(Variable::param(scoped, proc)))
        } else {
            Ok(self
                .variables
                .register(Variable::scalar(scoped, self.current_proc.clone())))
        }
    }

    // ---- expressions -----------------------------------------------------

    /// Emits code computing `expr` into `target`, folding the trivial
    /// multiplications and divisions by 0 and 1.
    fn assign_into(&mut self, target: Operand, expr: &Expr) -> CompileResult<()> {
        match expr {
            Expr::Value(value) => {
                let value = self.resolve_value(value)?;
                self.emit(Ir::Assign {
                    target,
                    value,
                    comment: String::new(),
                });
                Ok(())
            }
            Expr::BinOp {
                op, left, right, ..
            } => {
                if let Value::Number(n, _) = right {
                    if let Some(()) = self.try_fold(&target, *op, left, *n)? {
                        return Ok(());
                    }
                }
                let left = self.resolve_value(left)?;
                let right = self.resolve_value(right)?;
                self.emit(Ir::BinOp {
                    target,
                    left,
                    op: *op,
                    right,
                    comment: String::new(),
                });
                Ok(())
            }
        }
    }

    /// `x*0 → 0`, `x*1 → x`, `x/0 → 0`, `x/1 → x`, `x%0 → 0`; anything
    /// else is left to the synthesized subroutines.
    fn try_fold(
        &mut self,
        target: &Operand,
        op: ArithOp,
        left: &Value,
        right: i64,
    ) -> CompileResult<Option<()>> {
        enum Fold {
            Zero,
            Left,
        }
        let fold = match (op, right) {
            (ArithOp::Mul, 0) | (ArithOp::Div, 0) | (ArithOp::Mod, 0) => Fold::Zero,
            (ArithOp::Mul, 1) | (ArithOp::Div, 1) => Fold::Left,
            _ => return Ok(None),
        };
        let value = match fold {
            Fold::Zero => self.const_operand(0),
            Fold::Left => self.resolve_value(left)?,
        };
        self.emit(Ir::Assign {
            target: target.clone(),
            value,
            comment: format!("folded {op} {right}"),
        });
        Ok(Some(()))
    }

    // ---- conditions ------------------------------------------------------

    /// Branch to `target` when the condition holds. `=`, `<` and `>` map
    /// onto one machine test; the other operators branch on their negation
    /// past an unconditional jump.
    pub(crate) fn branch_if_true(
        &mut self,
        op: RelOp,
        left: Operand,
        right: Operand,
        target: LabelId,
        comment: &str,
    ) {
        if op.is_direct() {
            self.emit(Ir::CondJump {
                left,
                op,
                right,
                label: target,
                comment: comment.into(),
            });
            return;
        }
        let fallthrough = self
            .labels
            .fresh(LabelKind::IfHelper, "inverted comparison fall-through");
        self.emit(Ir::CondJump {
            left,
            op: op.negated(),
            right,
            label: fallthrough,
            comment: format!("inverted: {comment}"),
        });
        self.emit(Ir::Jump {
            label: target,
            comment: comment.into(),
        });
        self.emit(Ir::Label {
            id: fallthrough,
            comment: String::new(),
        });
    }

    fn branch_condition(
        &mut self,
        condition: &Condition,
        target: LabelId,
        when: bool,
        comment: &str,
    ) -> CompileResult<()> {
        let left = self.resolve_value(&condition.left)?;
        let right = self.resolve_value(&condition.right)?;
        let op = if when {
            condition.op
        } else {
            condition.op.negated()
        };
        self.branch_if_true(op, left, right, target, comment);
        Ok(())
    }

    // ---- commands --------------------------------------------------------

    fn build_command(&mut self, cmd: &Command) -> CompileResult<()> {
        match cmd {
            Command::Assign { target, value, .. } => self.build_assign(target, value),
            Command::If {
                condition,
                then_block,
                else_block,
                ..
            } => self.build_if(condition, then_block, else_block.as_deref()),
            Command::While {
                condition, body, ..
            } => self.build_while(condition, body),
            Command::Repeat {
                body, condition, ..
            } => self.build_repeat(body, condition),
            Command::For {
                iterator,
                from,
                to,
                downto,
                body,
                location,
            } => self.build_for(iterator, from, to, *downto, body, *location),
            Command::Call {
                name,
                args,
                location,
            } => self.build_call(name, args, *location),
            Command::Read { target, .. } => self.build_read(target),
            Command::Write { value, .. } => {
                let value = self.resolve_value(value)?;
                self.emit(Ir::Write {
                    value,
                    comment: String::new(),
                });
                Ok(())
            }
        }
    }

    fn build_assign(&mut self, target: &Identifier, expr: &Expr) -> CompileResult<()> {
        match &target.index {
            None => {
                let target = self.resolve_scalar(&target.name, target.location)?;
                self.assign_into(target, expr)
            }
            Some(index) => {
                // evaluate the right-hand side first, then store through
                // the element address
                let value = match expr {
                    Expr::Value(v) => self.resolve_value(v)?,
                    Expr::BinOp { .. } => {
                        let temp = self.fresh_temp();
                        self.assign_into(Operand::Value(temp.clone()), expr)?;
                        Operand::Value(temp)
                    }
                };
                let array = self.resolve_array(&target.name, target.location)?;
                let index = self.resolve_index(index, target.location)?;
                self.variables
                    .register(Variable::scalar(SmolStr::new(SCRATCH_CELL), None));
                self.emit(Ir::ArrayWrite {
                    array,
                    index,
                    value,
                    comment: format!("store {}[...]", target.name),
                });
                Ok(())
            }
        }
    }

    fn build_if(
        &mut self,
        condition: &Condition,
        then_block: &[Command],
        else_block: Option<&[Command]>,
    ) -> CompileResult<()> {
        let end = self.labels.fresh(LabelKind::IfEnd, "end of if");
        match else_block {
            None => {
                self.branch_condition(condition, end, false, "skip then block")?;
                for cmd in then_block {
                    self.build_command(cmd)?;
                }
            }
            Some(else_block) => {
                let else_label = self.labels.fresh(LabelKind::IfElse, "else branch");
                self.branch_condition(condition, else_label, false, "to else branch")?;
                for cmd in then_block {
                    self.build_command(cmd)?;
                }
                self.emit(Ir::Jump {
                    label: end,
                    comment: "skip else block".into(),
                });
                self.emit(Ir::Label {
                    id: else_label,
                    comment: "else branch".into(),
                });
                for cmd in else_block {
                    self.build_command(cmd)?;
                }
            }
        }
        self.emit(Ir::Label {
            id: end,
            comment: "end of if".into(),
        });
        Ok(())
    }

    fn build_while(&mut self, condition: &Condition, body: &[Command]) -> CompileResult<()> {
        let start = self.labels.fresh(LabelKind::WhileStart, "while start");
        let end = self.labels.fresh(LabelKind::WhileEnd, "while end");
        self.emit(Ir::Label {
            id: start,
            comment: "while start".into(),
        });
        self.branch_condition(condition, end, false, "exit loop")?;
        for cmd in body {
            self.build_command(cmd)?;
        }
        self.emit(Ir::Jump {
            label: start,
            comment: "loop back".into(),
        });
        self.emit(Ir::Label {
            id: end,
            comment: "while end".into(),
        });
        Ok(())
    }

    fn build_repeat(&mut self, body: &[Command], condition: &Condition) -> CompileResult<()> {
        let start = self.labels.fresh(LabelKind::RepeatStart, "repeat start");
        self.emit(Ir::Label {
            id: start,
            comment: "repeat start".into(),
        });
        for cmd in body {
            self.build_command(cmd)?;
        }
        // the body runs again while the exit condition is still false
        self.branch_condition(condition, start, false, "repeat until")?;
        Ok(())
    }

    fn build_for(
        &mut self,
        iterator: &SmolStr,
        from: &Value,
        to: &Value,
        downto: bool,
        body: &[Command],
        location: Location,
    ) -> CompileResult<()> {
        let iter = self.resolve_scalar(iterator, location)?;
        let from = self.resolve_value(from)?;
        self.emit(Ir::Assign {
            target: iter.clone(),
            value: from,
            comment: format!("init iterator {iterator}"),
        });

        // capture the end value so the body cannot perturb the bound
        let to = self.resolve_value(to)?;
        let limit = self.fresh_temp();
        self.emit(Ir::Assign {
            target: Operand::Value(limit.clone()),
            value: to,
            comment: "capture loop bound".into(),
        });

        let start = self.labels.fresh(LabelKind::ForStart, "for start");
        let end = self.labels.fresh(LabelKind::ForEnd, "for end");
        self.emit(Ir::Label {
            id: start,
            comment: "for start".into(),
        });
        let exit_op = if downto { RelOp::Lt } else { RelOp::Gt };
        self.branch_if_true(
            exit_op,
            iter.clone(),
            Operand::Value(limit),
            end,
            "iterator past bound",
        );
        for cmd in body {
            self.build_command(cmd)?;
        }
        let one = self.const_operand(1);
        let step_op = if downto { ArithOp::Sub } else { ArithOp::Add };
        self.emit(Ir::BinOp {
            target: iter.clone(),
            left: iter,
            op: step_op,
            right: one,
            comment: "step iterator".into(),
        });
        self.emit(Ir::Jump {
            label: start,
            comment: "loop back".into(),
        });
        self.emit(Ir::Label {
            id: end,
            comment: "for end".into(),
        });
        Ok(())
    }

    fn build_call(
        &mut self,
        name: &SmolStr,
        args: &[SmolStr],
        location: Location,
    ) -> CompileResult<()> {
        let mut arg_vars = Vec::with_capacity(args.len());
        for arg in args {
            arg_vars.push(self.resolve_arg(arg, location)?);
        }
        self.emit(Ir::Call {
            name: name.clone(),
            args: arg_vars,
            comment: format!("call {name}"),
        });
        Ok(())
    }

    fn build_read(&mut self, target: &Identifier) -> CompileResult<()> {
        match &target.index {
            None => {
                let target = self.resolve_scalar(&target.name, target.location)?;
                self.emit(Ir::Read {
                    target,
                    comment: String::new(),
                });
                Ok(())
            }
            Some(index) => {
                // read into a temporary first, then store through the
                // element address
                let temp = self.fresh_temp();
                self.emit(Ir::Read {
                    target: Operand::Value(temp.clone()),
                    comment: format!("read for {}[...]", target.name),
                });
                let array = self.resolve_array(&target.name, target.location)?;
                let index = self.resolve_index(index, target.location)?;
                self.variables
                    .register(Variable::scalar(SmolStr::new(SCRATCH_CELL), None));
                self.emit(Ir::ArrayWrite {
                    array,
                    index,
                    value: Operand::Value(temp),
                    comment: format!("store {}[...]", target.name),
                });
                Ok(())
            }
        }
    }

    fn build_procedure(&mut self, proc: &Procedure) -> CompileResult<()> {
        self.current_proc = Some(proc.name.clone());
        let entry = self
            .labels
            .fresh(LabelKind::ProcStart, format!("procedure {}", proc.name));

        let mut params = Vec::with_capacity(proc.params.len());
        for param in &proc.params {
            let scoped = scoped_name(Some(&proc.name), &param.name);
            let var = if param.is_array {
                Variable::array_param(scoped, proc.name.clone())
            } else {
                Variable::param(scoped, proc.name.clone())
            };
            params.push(self.variables.register(var));
        }
        let return_var = self.return_cell(&proc.name);
        self.procedures.insert(
            proc.name.clone(),
            ProcInfo {
                entry,
                params,
                return_var: return_var.clone(),
            },
        );

        self.emit(Ir::Label {
            id: entry,
            comment: format!("procedure {}", proc.name),
        });
        for cmd in &proc.commands {
            self.build_command(cmd)?;
        }
        self.emit(Ir::Return {
            return_var,
            comment: format!("end of {}", proc.name),
        });
        self.current_proc = None;
        Ok(())
    }
}
