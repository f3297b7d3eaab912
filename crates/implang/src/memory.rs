// The memory layout pass: binds every registered variable to a concrete
// cell address.
//
// Cell 0 is the accumulator and is never handed out. The low region grows
// up from 1: scalars and pointer cells, array storage, then constants
// (deduplicated by value). Temporaries grow down from the top of the
// region, so later passes can always mint new ones without disturbing
// earlier decisions.

use crate::error::{CompileError, CompileResult};
use crate::ir::VarRegistry;
use ahash::AHashMap;
use smol_str::SmolStr;

/// First temporary address; the high region grows downward from here.
pub const TEMP_REGION_TOP: u64 = 1 << 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCell {
    pub address: u64,
    pub is_array: bool,
    /// For a local array: the address element zero would occupy, i.e.
    /// `storage_base - lo`. Negative when the low bound exceeds the
    /// storage base, hence the signed type.
    pub zero_address: Option<i64>,
    pub array_size: Option<u64>,
}

#[derive(Debug)]
pub struct MemoryMap {
    cells: AHashMap<SmolStr, MemoryCell>,
    constants: AHashMap<i64, u64>,
    /// One past the last low-region address in use.
    pub low_end: u64,
    /// Lowest temporary address handed out.
    pub temp_floor: u64,
}

impl MemoryMap {
    /// Runs the three allocation passes over the registry in registration
    /// order.
    pub fn build(variables: &VarRegistry) -> MemoryMap {
        let mut map = MemoryMap {
            cells: AHashMap::new(),
            constants: AHashMap::new(),
            low_end: 1,
            temp_floor: TEMP_REGION_TOP,
        };
        map.allocate_regular(variables);
        map.allocate_constants(variables);
        map.allocate_temps(variables);
        map
    }

    /// Scalars, parameters and arrays. A local array takes one pointer
    /// cell followed by its storage; an array parameter only the pointer
    /// cell (it aliases the caller's storage).
    fn allocate_regular(&mut self, variables: &VarRegistry) {
        for var in variables.iter() {
            if var.is_const || var.is_temp {
                continue;
            }
            if var.is_array && !var.is_pointer {
                let pointer_cell = self.low_end;
                let storage_base = pointer_cell + 1;
                let size = var.array_size.unwrap_or(0);
                let lo = var.array_start.unwrap_or(0);
                self.cells.insert(
                    var.name.clone(),
                    MemoryCell {
                        address: pointer_cell,
                        is_array: true,
                        zero_address: Some(storage_base as i64 - lo),
                        array_size: Some(size),
                    },
                );
                self.low_end = storage_base + size;
            } else {
                self.cells.insert(
                    var.name.clone(),
                    MemoryCell {
                        address: self.low_end,
                        is_array: var.is_array,
                        zero_address: None,
                        array_size: None,
                    },
                );
                self.low_end += 1;
            }
        }
    }

    /// Constants alias one cell per distinct value.
    fn allocate_constants(&mut self, variables: &VarRegistry) {
        for var in variables.iter() {
            if !var.is_const {
                continue;
            }
            let Some(value) = var.const_value else {
                continue;
            };
            let address = match self.constants.get(&value) {
                Some(&addr) => addr,
                None => {
                    let addr = self.low_end;
                    self.low_end += 1;
                    self.constants.insert(value, addr);
                    addr
                }
            };
            self.cells.insert(
                var.name.clone(),
                MemoryCell {
                    address,
                    is_array: false,
                    zero_address: None,
                    array_size: None,
                },
            );
        }
    }

    fn allocate_temps(&mut self, variables: &VarRegistry) {
        for var in variables.iter() {
            if !var.is_temp {
                continue;
            }
            self.temp_floor -= 1;
            self.cells.insert(
                var.name.clone(),
                MemoryCell {
                    address: self.temp_floor,
                    is_array: false,
                    zero_address: None,
                    array_size: None,
                },
            );
        }
    }

    pub fn cell(&self, name: &str) -> CompileResult<&MemoryCell> {
        self.cells.get(name).ok_or_else(|| CompileError::UnmappedVariable {
            name: name.to_string(),
        })
    }

    pub fn address_of(&self, name: &str) -> CompileResult<u64> {
        Ok(self.cell(name)?.address)
    }

    /// Distinct constant values and their cells.
    pub fn constant_cells(&self) -> &AHashMap<i64, u64> {
        &self.constants
    }
}

impl std::fmt::Display for MemoryMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "memory map (low end {}, temp floor {}):", self.low_end, self.temp_floor)?;
        let mut cells: Vec<_> = self.cells.iter().collect();
        cells.sort_by_key(|(name, cell)| (cell.address, name.as_str()));
        for (name, cell) in cells {
            match cell.zero_address {
                Some(zero) => writeln!(
                    f,
                    "  {:>10}  {}  (array, zero address {}, size {})",
                    cell.address,
                    name,
                    zero,
                    cell.array_size.unwrap_or(0)
                )?,
                None => writeln!(f, "  {:>10}  {}", cell.address, name)?,
            }
        }
        Ok(())
    }
}
