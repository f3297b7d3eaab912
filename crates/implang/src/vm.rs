// Reference interpreter for the target machine.
//
// Memory is a sparse cell map (programs address both the low region and
// the temporary region near 2^30). Execution is fuel-bounded so a
// miscompiled loop fails a test instead of hanging it. Cell arithmetic
// wraps; compiled programs stay well inside i64 for the value ranges the
// language guarantees.

use crate::codegen::VmOp;
use ahash::AHashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Step budget exhausted before `HALT`.
    OutOfFuel,
    /// `GET` with no input left.
    InputExhausted { pc: usize },
    /// The program counter left the program without hitting `HALT`.
    PcOutOfRange { pc: i64 },
    /// An indirect access or `RTRN` went through a negative cell value.
    BadAddress { pc: usize, value: i64 },
    /// A pseudo-op survived label resolution.
    UnresolvedOp { pc: usize },
}

impl std::fmt::Display for VmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VmError::OutOfFuel => write!(f, "step budget exhausted"),
            VmError::InputExhausted { pc } => write!(f, "input exhausted at line {pc}"),
            VmError::PcOutOfRange { pc } => write!(f, "program counter escaped to {pc}"),
            VmError::BadAddress { pc, value } => {
                write!(f, "negative address {value} at line {pc}")
            }
            VmError::UnresolvedOp { pc } => write!(f, "unresolved pseudo-op at line {pc}"),
        }
    }
}

impl std::error::Error for VmError {}

/// Machine state: accumulator and cells in one sparse map, untouched
/// cells read as zero.
pub struct Machine {
    cells: AHashMap<u64, i64>,
    pub steps: u64,
}

impl Machine {
    pub fn new() -> Self {
        Machine {
            cells: AHashMap::new(),
            steps: 0,
        }
    }

    pub fn cell(&self, address: u64) -> i64 {
        self.cells.get(&address).copied().unwrap_or(0)
    }

    fn set_cell(&mut self, address: u64, value: i64) {
        self.cells.insert(address, value);
    }

    fn indirect(&self, pc: usize, address: u64) -> Result<u64, VmError> {
        let value = self.cell(address);
        u64::try_from(value).map_err(|_| VmError::BadAddress { pc, value })
    }

    /// Runs `program` against `input` until `HALT`, returning everything
    /// the program printed.
    pub fn run(
        &mut self,
        program: &[VmOp],
        input: &[i64],
        fuel: u64,
    ) -> Result<Vec<i64>, VmError> {
        let mut output = Vec::new();
        let mut next_input = 0usize;
        let mut pc = 0usize;

        loop {
            if self.steps >= fuel {
                return Err(VmError::OutOfFuel);
            }
            self.steps += 1;
            let Some(op) = program.get(pc) else {
                return Err(VmError::PcOutOfRange { pc: pc as i64 });
            };
            let mut jumped = false;
            match *op {
                VmOp::Get(i) => {
                    let Some(&value) = input.get(next_input) else {
                        return Err(VmError::InputExhausted { pc });
                    };
                    next_input += 1;
                    self.set_cell(i, value);
                }
                VmOp::Put(i) => output.push(self.cell(i)),
                VmOp::Load(i) => {
                    let value = self.cell(i);
                    self.set_cell(0, value);
                }
                VmOp::Store(i) => {
                    let value = self.cell(0);
                    self.set_cell(i, value);
                }
                VmOp::Loadi(i) => {
                    let address = self.indirect(pc, i)?;
                    let value = self.cell(address);
                    self.set_cell(0, value);
                }
                VmOp::Storei(i) => {
                    let address = self.indirect(pc, i)?;
                    let value = self.cell(0);
                    self.set_cell(address, value);
                }
                VmOp::Add(i) => {
                    let value = self.cell(0).wrapping_add(self.cell(i));
                    self.set_cell(0, value);
                }
                VmOp::Sub(i) => {
                    let value = self.cell(0).wrapping_sub(self.cell(i));
                    self.set_cell(0, value);
                }
                VmOp::Addi(i) => {
                    let address = self.indirect(pc, i)?;
                    let value = self.cell(0).wrapping_add(self.cell(address));
                    self.set_cell(0, value);
                }
                VmOp::Subi(i) => {
                    let address = self.indirect(pc, i)?;
                    let value = self.cell(0).wrapping_sub(self.cell(address));
                    self.set_cell(0, value);
                }
                VmOp::Half => {
                    let value = self.cell(0).div_euclid(2);
                    self.set_cell(0, value);
                }
                VmOp::Set(x) => self.set_cell(0, x),
                VmOp::Jump(j) => {
                    pc = checked_target(j)?;
                    jumped = true;
                }
                VmOp::Jpos(j) => {
                    if self.cell(0) > 0 {
                        pc = checked_target(j)?;
                        jumped = true;
                    }
                }
                VmOp::Jzero(j) => {
                    if self.cell(0) == 0 {
                        pc = checked_target(j)?;
                        jumped = true;
                    }
                }
                VmOp::Jneg(j) => {
                    if self.cell(0) < 0 {
                        pc = checked_target(j)?;
                        jumped = true;
                    }
                }
                VmOp::Rtrn(i) => {
                    let address = self.indirect(pc, i)?;
                    pc = address as usize;
                    jumped = true;
                }
                VmOp::Halt => return Ok(output),
                _ => return Err(VmError::UnresolvedOp { pc }),
            }
            if !jumped {
                pc += 1;
            }
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Machine::new()
    }
}

fn checked_target(j: i64) -> Result<usize, VmError> {
    usize::try_from(j).map_err(|_| VmError::PcOutOfRange { pc: j })
}

/// One-shot convenience used by the test suite and the runner binary.
pub fn run(program: &[VmOp], input: &[i64], fuel: u64) -> Result<Vec<i64>, VmError> {
    Machine::new().run(program, input, fuel)
}
