// The symbol table produced by semantic analysis and consumed read-only by
// the IR builder.
//
// The namespace is flat: procedure-locals and parameters are keyed by their
// scope-qualified name `"{proc}#{name}"`, main's declarations by their bare
// name. `#` cannot occur in a user identifier, so qualified names never
// collide with plain ones.

use crate::ast::{ArithOp, Parameter};
use ahash::{AHashMap, AHashSet};
use smol_str::SmolStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: SmolStr,
    /// Enclosing procedure, `None` for main's scope.
    pub procedure: Option<SmolStr>,
    pub is_array: bool,
    pub array_start: Option<i64>,
    pub array_end: Option<i64>,
    pub is_parameter: bool,
    pub is_array_parameter: bool,
    /// FOR iterators re-register freely across sibling loops.
    pub is_iterator: bool,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: AHashMap<SmolStr, Symbol>,
    procedures: AHashMap<SmolStr, Vec<Parameter>>,
    costly: AHashSet<ArithOp>,
}

/// Qualified registry key for a name in the given scope.
pub fn scoped_name(procedure: Option<&SmolStr>, name: &str) -> SmolStr {
    match procedure {
        Some(proc) => SmolStr::new(format!("{proc}#{name}")),
        None => SmolStr::new(name),
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Inserts a symbol under its scope-qualified key. Returns `false` if
    /// the name is already taken in that scope.
    pub fn add_symbol(&mut self, symbol: Symbol) -> bool {
        let key = scoped_name(symbol.procedure.as_ref(), &symbol.name);
        if self.symbols.contains_key(&key) {
            return false;
        }
        self.symbols.insert(key, symbol);
        true
    }

    /// Registers a procedure signature. Returns `false` on redefinition.
    pub fn add_procedure(&mut self, name: SmolStr, params: Vec<Parameter>) -> bool {
        if self.procedures.contains_key(&name) {
            return false;
        }
        self.procedures.insert(name, params);
        true
    }

    /// Looks a name up in the given scope. Procedure bodies see only their
    /// own locals and parameters; main sees its own declarations.
    pub fn lookup(&self, procedure: Option<&SmolStr>, name: &str) -> Option<&Symbol> {
        self.symbols.get(&scoped_name(procedure, name))
    }

    pub fn get_procedure_params(&self, name: &str) -> Option<&[Parameter]> {
        self.procedures.get(name).map(|p| p.as_slice())
    }

    pub fn has_procedure(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    pub fn is_parameter(&self, procedure: Option<&SmolStr>, name: &str) -> bool {
        self.lookup(procedure, name).is_some_and(|s| s.is_parameter)
    }

    /// Records a `*`, `/` or `%` occurrence; the IR builder gates the
    /// synthesized subroutines on this set.
    pub fn record_costly(&mut self, op: ArithOp) {
        if op.is_costly() {
            self.costly.insert(op);
        }
    }

    pub fn costly_operations(&self) -> &AHashSet<ArithOp> {
        &self.costly
    }
}
