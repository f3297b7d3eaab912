// The abstract syntax tree consumed by the IR builder.
//
// Expressions are deliberately flat: a single binary operator over two
// values. The surface grammar has no nested expressions, so the tree
// mirrors it one-to-one.

use smol_str::SmolStr;

/// 1-based source position attached to every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Location { line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    /// `*`, `/` and `%` have no machine instruction and compile to a
    /// subroutine call.
    pub fn is_costly(self) -> bool {
        matches!(self, ArithOp::Mul | ArithOp::Div | ArithOp::Mod)
    }
}

impl std::fmt::Display for ArithOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
        };
        f.write_str(s)
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl RelOp {
    /// Logical complement: `a = b` ⟷ `a != b`, `a < b` ⟷ `a >= b`, ...
    pub fn negated(self) -> RelOp {
        match self {
            RelOp::Eq => RelOp::Ne,
            RelOp::Ne => RelOp::Eq,
            RelOp::Lt => RelOp::Ge,
            RelOp::Ge => RelOp::Lt,
            RelOp::Gt => RelOp::Le,
            RelOp::Le => RelOp::Gt,
        }
    }

    /// Whether the accumulator can test this operator in one jump after
    /// `LOAD l; SUB r` (`= 0`, `> 0`, `< 0`).
    pub fn is_direct(self) -> bool {
        matches!(self, RelOp::Eq | RelOp::Lt | RelOp::Gt)
    }
}

impl std::fmt::Display for RelOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RelOp::Eq => "=",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Gt => ">",
            RelOp::Le => "<=",
            RelOp::Ge => ">=",
        };
        f.write_str(s)
    }
}

/// An array index: the grammar restricts it to a literal or a scalar name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    Number(i64),
    Name(SmolStr),
}

/// A possibly-subscripted name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: SmolStr,
    pub index: Option<Index>,
    pub location: Location,
}

/// A literal or an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Number(i64, Location),
    Ident(Identifier),
}

impl Value {
    pub fn location(&self) -> Location {
        match self {
            Value::Number(_, location) => *location,
            Value::Ident(id) => id.location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Value(Value),
    BinOp {
        op: ArithOp,
        left: Value,
        right: Value,
        location: Location,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub op: RelOp,
    pub left: Value,
    pub right: Value,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Assign {
        target: Identifier,
        value: Expr,
        location: Location,
    },
    If {
        condition: Condition,
        then_block: Vec<Command>,
        else_block: Option<Vec<Command>>,
        location: Location,
    },
    While {
        condition: Condition,
        body: Vec<Command>,
        location: Location,
    },
    Repeat {
        body: Vec<Command>,
        condition: Condition,
        location: Location,
    },
    For {
        iterator: SmolStr,
        from: Value,
        to: Value,
        downto: bool,
        body: Vec<Command>,
        location: Location,
    },
    Call {
        name: SmolStr,
        args: Vec<SmolStr>,
        location: Location,
    },
    Read {
        target: Identifier,
        location: Location,
    },
    Write {
        value: Value,
        location: Location,
    },
}

impl Command {
    pub fn location(&self) -> Location {
        match self {
            Command::Assign { location, .. }
            | Command::If { location, .. }
            | Command::While { location, .. }
            | Command::Repeat { location, .. }
            | Command::For { location, .. }
            | Command::Call { location, .. }
            | Command::Read { location, .. }
            | Command::Write { location, .. } => *location,
        }
    }
}

/// `name` or `name[lo:hi]` in a declaration list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: SmolStr,
    pub bounds: Option<(i64, i64)>,
    pub location: Location,
}

/// A formal parameter; `is_array` corresponds to the `T` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: SmolStr,
    pub is_array: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    pub name: SmolStr,
    pub params: Vec<Parameter>,
    pub declarations: Vec<Declaration>,
    pub commands: Vec<Command>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub procedures: Vec<Procedure>,
    pub declarations: Vec<Declaration>,
    pub commands: Vec<Command>,
}
