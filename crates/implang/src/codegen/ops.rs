// The target machine's instruction set, plus the pseudo-ops that exist
// only between code generation and label resolution.
//
// The machine has one accumulator p[0], a flat cell array p[1..], and a
// program counter k. Each instruction occupies one output line.

use std::io::{self, Write};

pub type LabelId = crate::ir::LabelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmOp {
    /// read input into p[i]
    Get(u64),
    /// write p[i] to output
    Put(u64),
    /// p[0] <- p[i]
    Load(u64),
    /// p[i] <- p[0]
    Store(u64),
    /// p[0] <- p[p[i]]
    Loadi(u64),
    /// p[p[i]] <- p[0]
    Storei(u64),
    /// p[0] <- p[0] + p[i]
    Add(u64),
    /// p[0] <- p[0] - p[i]
    Sub(u64),
    /// p[0] <- p[0] + p[p[i]]
    Addi(u64),
    /// p[0] <- p[0] - p[p[i]]
    Subi(u64),
    /// p[0] <- floor(p[0] / 2)
    Half,
    /// p[0] <- x
    Set(i64),
    /// k <- j
    Jump(i64),
    /// k <- j if p[0] > 0
    Jpos(i64),
    /// k <- j if p[0] = 0
    Jzero(i64),
    /// k <- j if p[0] < 0
    Jneg(i64),
    /// k <- p[i]
    Rtrn(u64),
    Halt,

    // pseudo-ops, removed by label resolution
    /// marks a jump target; occupies no output line
    Label(LabelId),
    JumpLabel(LabelId),
    JposLabel(LabelId),
    JzeroLabel(LabelId),
    JnegLabel(LabelId),
    /// p[0] <- own line + offset; resolves to `SET` during label fixup
    SetHere(i64),
}

impl VmOp {
    /// Pseudo-ops never survive label resolution.
    pub fn is_pseudo(&self) -> bool {
        matches!(
            self,
            VmOp::Label(_)
                | VmOp::JumpLabel(_)
                | VmOp::JposLabel(_)
                | VmOp::JzeroLabel(_)
                | VmOp::JnegLabel(_)
                | VmOp::SetHere(_)
        )
    }
}

impl std::fmt::Display for VmOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut buf = itoa::Buffer::new();
        let (mnemonic, arg) = match *self {
            VmOp::Get(i) => ("GET", Some(buf.format(i))),
            VmOp::Put(i) => ("PUT", Some(buf.format(i))),
            VmOp::Load(i) => ("LOAD", Some(buf.format(i))),
            VmOp::Store(i) => ("STORE", Some(buf.format(i))),
            VmOp::Loadi(i) => ("LOADI", Some(buf.format(i))),
            VmOp::Storei(i) => ("STOREI", Some(buf.format(i))),
            VmOp::Add(i) => ("ADD", Some(buf.format(i))),
            VmOp::Sub(i) => ("SUB", Some(buf.format(i))),
            VmOp::Addi(i) => ("ADDI", Some(buf.format(i))),
            VmOp::Subi(i) => ("SUBI", Some(buf.format(i))),
            VmOp::Half => ("HALF", None),
            VmOp::Set(x) => ("SET", Some(buf.format(x))),
            VmOp::Jump(j) => ("JUMP", Some(buf.format(j))),
            VmOp::Jpos(j) => ("JPOS", Some(buf.format(j))),
            VmOp::Jzero(j) => ("JZERO", Some(buf.format(j))),
            VmOp::Jneg(j) => ("JNEG", Some(buf.format(j))),
            VmOp::Rtrn(i) => ("RTRN", Some(buf.format(i))),
            VmOp::Halt => ("HALT", None),
            VmOp::Label(l) => ("LABEL", Some(buf.format(l))),
            VmOp::JumpLabel(l) => ("JUMP.L", Some(buf.format(l))),
            VmOp::JposLabel(l) => ("JPOS.L", Some(buf.format(l))),
            VmOp::JzeroLabel(l) => ("JZERO.L", Some(buf.format(l))),
            VmOp::JnegLabel(l) => ("JNEG.L", Some(buf.format(l))),
            VmOp::SetHere(k) => ("SET_HERE", Some(buf.format(k))),
        };
        match arg {
            Some(arg) => {
                f.write_str(mnemonic)?;
                f.write_str(" ")?;
                f.write_str(arg)
            }
            None => f.write_str(mnemonic),
        }
    }
}

/// Writes a resolved program in the machine's text format, one
/// instruction per line.
pub fn write_program(ops: &[VmOp], out: &mut impl Write) -> io::Result<()> {
    let mut buf = itoa::Buffer::new();
    for op in ops {
        match *op {
            VmOp::Get(i) => write_line(out, "GET", Some(buf.format(i)))?,
            VmOp::Put(i) => write_line(out, "PUT", Some(buf.format(i)))?,
            VmOp::Load(i) => write_line(out, "LOAD", Some(buf.format(i)))?,
            VmOp::Store(i) => write_line(out, "STORE", Some(buf.format(i)))?,
            VmOp::Loadi(i) => write_line(out, "LOADI", Some(buf.format(i)))?,
            VmOp::Storei(i) => write_line(out, "STOREI", Some(buf.format(i)))?,
            VmOp::Add(i) => write_line(out, "ADD", Some(buf.format(i)))?,
            VmOp::Sub(i) => write_line(out, "SUB", Some(buf.format(i)))?,
            VmOp::Addi(i) => write_line(out, "ADDI", Some(buf.format(i)))?,
            VmOp::Subi(i) => write_line(out, "SUBI", Some(buf.format(i)))?,
            VmOp::Half => write_line(out, "HALF", None)?,
            VmOp::Set(x) => write_line(out, "SET", Some(buf.format(x)))?,
            VmOp::Jump(j) => write_line(out, "JUMP", Some(buf.format(j)))?,
            VmOp::Jpos(j) => write_line(out, "JPOS", Some(buf.format(j)))?,
            VmOp::Jzero(j) => write_line(out, "JZERO", Some(buf.format(j)))?,
            VmOp::Jneg(j) => write_line(out, "JNEG", Some(buf.format(j)))?,
            VmOp::Rtrn(i) => write_line(out, "RTRN", Some(buf.format(i)))?,
            VmOp::Halt => write_line(out, "HALT", None)?,
            pseudo => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("pseudo-op {pseudo} in final program"),
                ));
            }
        }
    }
    Ok(())
}

fn write_line(out: &mut impl Write, mnemonic: &str, arg: Option<&str>) -> io::Result<()> {
    out.write_all(mnemonic.as_bytes())?;
    if let Some(arg) = arg {
        out.write_all(b" ")?;
        out.write_all(arg.as_bytes())?;
    }
    out.write_all(b"\n")
}

/// Parses a program in the machine's text format, as written by
/// [`write_program`]. Blank lines are allowed.
pub fn parse_program(text: &str) -> Result<Vec<VmOp>, String> {
    let mut ops = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let mnemonic = parts.next().unwrap_or_default();
        let arg = parts.next();
        if parts.next().is_some() {
            return Err(format!("line {}: trailing input", lineno + 1));
        }
        let unsigned = |arg: Option<&str>| -> Result<u64, String> {
            arg.ok_or_else(|| format!("line {}: missing operand", lineno + 1))?
                .parse()
                .map_err(|_| format!("line {}: bad operand", lineno + 1))
        };
        let signed = |arg: Option<&str>| -> Result<i64, String> {
            arg.ok_or_else(|| format!("line {}: missing operand", lineno + 1))?
                .parse()
                .map_err(|_| format!("line {}: bad operand", lineno + 1))
        };
        let op = match mnemonic {
            "GET" => VmOp::Get(unsigned(arg)?),
            "PUT" => VmOp::Put(unsigned(arg)?),
            "LOAD" => VmOp::Load(unsigned(arg)?),
            "STORE" => VmOp::Store(unsigned(arg)?),
            "LOADI" => VmOp::Loadi(unsigned(arg)?),
            "STOREI" => VmOp::Storei(unsigned(arg)?),
            "ADD" => VmOp::Add(unsigned(arg)?),
            "SUB" => VmOp::Sub(unsigned(arg)?),
            "ADDI" => VmOp::Addi(unsigned(arg)?),
            "SUBI" => VmOp::Subi(unsigned(arg)?),
            "HALF" if arg.is_none() => VmOp::Half,
            "SET" => VmOp::Set(signed(arg)?),
            "JUMP" => VmOp::Jump(signed(arg)?),
            "JPOS" => VmOp::Jpos(signed(arg)?),
            "JZERO" => VmOp::Jzero(signed(arg)?),
            "JNEG" => VmOp::Jneg(signed(arg)?),
            "RTRN" => VmOp::Rtrn(unsigned(arg)?),
            "HALT" if arg.is_none() => VmOp::Halt,
            other => return Err(format!("line {}: unknown mnemonic '{other}'", lineno + 1)),
        };
        ops.push(op);
    }
    Ok(ops)
}
