// IR data model: variables, access-mode wrappers, instructions, labels.

use crate::ast::{ArithOp, RelOp};
use ahash::AHashMap;
use smol_str::SmolStr;

pub type LabelId = u32;

/// What a label marks; kept for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    IfElse,
    IfHelper,
    IfEnd,
    WhileStart,
    WhileEnd,
    WhileHelper,
    ForStart,
    ForEnd,
    RepeatStart,
    ProcStart,
    ProcEnd,
    MainStart,
}

/// Hands out fresh label ids and remembers what each one marks.
#[derive(Debug, Default)]
pub struct LabelAlloc {
    counter: LabelId,
    info: AHashMap<LabelId, (LabelKind, String)>,
}

impl LabelAlloc {
    pub fn new() -> Self {
        LabelAlloc::default()
    }

    pub fn fresh(&mut self, kind: LabelKind, comment: impl Into<String>) -> LabelId {
        self.counter += 1;
        self.info.insert(self.counter, (kind, comment.into()));
        self.counter
    }

    pub fn comment(&self, label: LabelId) -> &str {
        self.info.get(&label).map(|(_, c)| c.as_str()).unwrap_or("")
    }
}

/// An IR operand's backing cell. Constants, temporaries, arrays and
/// pointers are all `Variable`s; the memory mapper later binds each
/// registered name to one concrete cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Scope-qualified registry name (see naming rules in the builder).
    pub name: SmolStr,
    pub proc_name: Option<SmolStr>,
    pub is_temp: bool,
    pub is_const: bool,
    pub const_value: Option<i64>,
    pub is_array: bool,
    pub array_start: Option<i64>,
    pub array_size: Option<u64>,
    /// The cell holds an address rather than a value (parameters and
    /// array base cells behave this way at call sites).
    pub is_pointer: bool,
}

impl Variable {
    pub fn scalar(name: SmolStr, proc_name: Option<SmolStr>) -> Self {
        Variable {
            name,
            proc_name,
            is_temp: false,
            is_const: false,
            const_value: None,
            is_array: false,
            array_start: None,
            array_size: None,
            is_pointer: false,
        }
    }

    pub fn temp(name: SmolStr, proc_name: Option<SmolStr>) -> Self {
        Variable {
            is_temp: true,
            ..Variable::scalar(name, proc_name)
        }
    }

    pub fn param(name: SmolStr, proc_name: SmolStr) -> Self {
        Variable {
            is_pointer: true,
            ..Variable::scalar(name, Some(proc_name))
        }
    }

    pub fn array(name: SmolStr, start: i64, size: u64, proc_name: Option<SmolStr>) -> Self {
        Variable {
            is_array: true,
            array_start: Some(start),
            array_size: Some(size),
            ..Variable::scalar(name, proc_name)
        }
    }

    pub fn array_param(name: SmolStr, proc_name: SmolStr) -> Self {
        Variable {
            is_array: true,
            is_pointer: true,
            ..Variable::scalar(name, Some(proc_name))
        }
    }

    /// Constant cells are named by their value: `5`, `neg5`.
    pub fn constant(value: i64) -> Self {
        let name = if value < 0 {
            SmolStr::new(format!("neg{}", value.unsigned_abs()))
        } else {
            SmolStr::new(format!("{value}"))
        };
        Variable {
            is_const: true,
            const_value: Some(value),
            ..Variable::scalar(name, None)
        }
    }
}

/// Access mode committed at each IR use site: dereference the cell
/// directly, or treat its content as an address and go through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Value(Variable),
    Reference(Variable),
}

impl Operand {
    pub fn var(&self) -> &Variable {
        match self {
            Operand::Value(v) | Operand::Reference(v) => v,
        }
    }

    pub fn name(&self) -> &SmolStr {
        &self.var().name
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Operand::Reference(_))
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Value(v) => write!(f, "{}", v.name),
            Operand::Reference(v) => write!(f, "*{}", v.name),
        }
    }
}

/// Entry point, formals and return cell of a callable (user procedures and
/// the synthesized arithmetic subroutines alike).
#[derive(Debug, Clone)]
pub struct ProcInfo {
    pub entry: LabelId,
    pub params: Vec<Variable>,
    pub return_var: Variable,
}

/// One IR instruction. Every variant carries a free-form comment that the
/// verbose driver dump prints alongside the instruction.
#[derive(Debug, Clone)]
pub enum Ir {
    Label {
        id: LabelId,
        comment: String,
    },
    Jump {
        label: LabelId,
        comment: String,
    },
    /// Branch to `label` when `left op right` holds. The builder only emits
    /// operators the machine can test after `LOAD l; SUB r`.
    CondJump {
        left: Operand,
        op: RelOp,
        right: Operand,
        label: LabelId,
        comment: String,
    },
    Assign {
        target: Operand,
        value: Operand,
        comment: String,
    },
    BinOp {
        target: Operand,
        left: Operand,
        op: ArithOp,
        right: Operand,
        comment: String,
    },
    /// target := ⌊target / 2⌋
    Half {
        target: Operand,
        comment: String,
    },
    /// target := array[index]
    ArrayRead {
        target: Operand,
        array: Variable,
        index: Operand,
        comment: String,
    },
    /// array[index] := value
    ArrayWrite {
        array: Variable,
        index: Operand,
        value: Operand,
        comment: String,
    },
    Read {
        target: Operand,
        comment: String,
    },
    Write {
        value: Operand,
        comment: String,
    },
    Call {
        name: SmolStr,
        args: Vec<Variable>,
        comment: String,
    },
    /// Jump to the line stored in the callable's return cell.
    Return {
        return_var: Variable,
        comment: String,
    },
}

impl std::fmt::Display for Ir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ir::Label { id, .. } => write!(f, "L{id}:"),
            Ir::Jump { label, .. } => write!(f, "goto L{label}"),
            Ir::CondJump {
                left,
                op,
                right,
                label,
                ..
            } => write!(f, "if {left} {op} {right} goto L{label}"),
            Ir::Assign { target, value, .. } => write!(f, "{target} := {value}"),
            Ir::BinOp {
                target,
                left,
                op,
                right,
                ..
            } => write!(f, "{target} := {left} {op} {right}"),
            Ir::Half { target, .. } => write!(f, "{target} := {target} / 2"),
            Ir::ArrayRead {
                target,
                array,
                index,
                ..
            } => write!(f, "{target} := {}[{index}]", array.name),
            Ir::ArrayWrite {
                array,
                index,
                value,
                ..
            } => write!(f, "{}[{index}] := {value}", array.name),
            Ir::Read { target, .. } => write!(f, "read {target}"),
            Ir::Write { value, .. } => write!(f, "write {value}"),
            Ir::Call { name, args, .. } => {
                write!(f, "call {name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg.name)?;
                }
                write!(f, ")")
            }
            Ir::Return { return_var, .. } => write!(f, "return via {}", return_var.name),
        }
    }
}

impl Ir {
    pub fn comment(&self) -> &str {
        match self {
            Ir::Label { comment, .. }
            | Ir::Jump { comment, .. }
            | Ir::CondJump { comment, .. }
            | Ir::Assign { comment, .. }
            | Ir::BinOp { comment, .. }
            | Ir::Half { comment, .. }
            | Ir::ArrayRead { comment, .. }
            | Ir::ArrayWrite { comment, .. }
            | Ir::Read { comment, .. }
            | Ir::Write { comment, .. }
            | Ir::Call { comment, .. }
            | Ir::Return { comment, .. } => comment,
        }
    }
}

/// Every variable the builder ever touches, in first-touch order. The
/// memory mapper walks this order, which makes address assignment
/// deterministic.
#[derive(Debug, Default)]
pub struct VarRegistry {
    order: Vec<SmolStr>,
    map: AHashMap<SmolStr, Variable>,
}

impl VarRegistry {
    pub fn new() -> Self {
        VarRegistry::default()
    }

    /// Registers a variable (first touch wins) and returns the canonical
    /// copy.
    pub fn register(&mut self, var: Variable) -> Variable {
        if let Some(existing) = self.map.get(&var.name) {
            return existing.clone();
        }
        self.order.push(var.name.clone());
        self.map.insert(var.name.clone(), var.clone());
        var
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.map.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.order.iter().map(|name| &self.map[name])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
