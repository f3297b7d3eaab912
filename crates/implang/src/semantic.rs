// Semantic analysis: builds the symbol table, records costly operations,
// and enforces the language's static rules. Every diagnostic is collected
// before the phase fails, so one run reports all errors.

use crate::ast::*;
use crate::error::{CompileError, CompileResult, SemanticError};
use crate::symbols::{Symbol, SymbolTable};
use ahash::AHashSet;
use smol_str::SmolStr;

/// Analyze a program; on success the returned table satisfies the contract
/// the IR builder relies on (every AST identifier resolves).
pub fn analyze(program: &Program) -> CompileResult<SymbolTable> {
    let mut analyzer = Analyzer::new();
    analyzer.check_program(program);
    if analyzer.errors.is_empty() {
        Ok(analyzer.table)
    } else {
        Err(CompileError::Semantic(analyzer.errors))
    }
}

struct Analyzer {
    table: SymbolTable,
    errors: Vec<SemanticError>,
    current_proc: Option<SmolStr>,
    /// Procedures whose definition is complete; calling anything else is an
    /// error, which also rules out recursion.
    defined_procs: AHashSet<SmolStr>,
    /// Iterators of the FOR loops enclosing the current command.
    active_iterators: Vec<SmolStr>,
}

impl Analyzer {
    fn new() -> Self {
        Analyzer {
            table: SymbolTable::new(),
            errors: Vec::new(),
            current_proc: None,
            defined_procs: AHashSet::new(),
            active_iterators: Vec::new(),
        }
    }

    fn error(&mut self, message: String, location: Location) {
        self.errors.push(SemanticError { message, location });
    }

    fn check_program(&mut self, program: &Program) {
        for proc in &program.procedures {
            self.check_procedure(proc);
        }
        self.current_proc = None;
        for decl in &program.declarations {
            self.check_declaration(decl, false);
        }
        for cmd in &program.commands {
            self.check_command(cmd);
        }
    }

    fn check_procedure(&mut self, proc: &Procedure) {
        if !self.table.add_procedure(proc.name.clone(), proc.params.clone()) {
            self.error(
                format!("procedure '{}' already defined", proc.name),
                proc.location,
            );
        }
        self.current_proc = Some(proc.name.clone());
        for param in &proc.params {
            let added = self.table.add_symbol(Symbol {
                name: param.name.clone(),
                procedure: Some(proc.name.clone()),
                is_array: param.is_array,
                array_start: None,
                array_end: None,
                is_parameter: true,
                is_array_parameter: param.is_array,
                is_iterator: false,
            });
            if !added {
                self.error(
                    format!("duplicate parameter '{}'", param.name),
                    proc.location,
                );
            }
        }
        for decl in &proc.declarations {
            self.check_declaration(decl, true);
        }
        for cmd in &proc.commands {
            self.check_command(cmd);
        }
        // the body is checked before the name becomes callable, so a
        // procedure can never call itself
        self.defined_procs.insert(proc.name.clone());
        self.current_proc = None;
    }

    fn check_declaration(&mut self, decl: &Declaration, _local: bool) {
        if let Some((lo, hi)) = decl.bounds {
            if lo > hi {
                self.error(
                    format!("invalid array bounds [{lo}:{hi}]"),
                    decl.location,
                );
                return;
            }
        }
        let added = self.table.add_symbol(Symbol {
            name: decl.name.clone(),
            procedure: self.current_proc.clone(),
            is_array: decl.bounds.is_some(),
            array_start: decl.bounds.map(|(lo, _)| lo),
            array_end: decl.bounds.map(|(_, hi)| hi),
            is_parameter: false,
            is_array_parameter: false,
            is_iterator: false,
        });
        if !added {
            self.error(
                format!("redeclaration of '{}'", decl.name),
                decl.location,
            );
        }
    }

    fn check_command(&mut self, cmd: &Command) {
        match cmd {
            Command::Assign { target, value, .. } => {
                self.check_write_target(target);
                self.check_expr(value);
            }
            Command::If {
                condition,
                then_block,
                else_block,
                ..
            } => {
                self.check_condition(condition);
                for cmd in then_block {
                    self.check_command(cmd);
                }
                if let Some(block) = else_block {
                    for cmd in block {
                        self.check_command(cmd);
                    }
                }
            }
            Command::While {
                condition, body, ..
            } => {
                self.check_condition(condition);
                for cmd in body {
                    self.check_command(cmd);
                }
            }
            Command::Repeat {
                body, condition, ..
            } => {
                for cmd in body {
                    self.check_command(cmd);
                }
                self.check_condition(condition);
            }
            Command::For {
                iterator,
                from,
                to,
                body,
                location,
                ..
            } => self.check_for(iterator, from, to, body, *location),
            Command::Call {
                name,
                args,
                location,
            } => self.check_call(name, args, *location),
            Command::Read { target, .. } => self.check_write_target(target),
            Command::Write { value, .. } => self.check_value(value),
        }
    }

    fn check_for(
        &mut self,
        iterator: &SmolStr,
        from: &Value,
        to: &Value,
        body: &[Command],
        location: Location,
    ) {
        self.check_value(from);
        self.check_value(to);
        if self.active_iterators.contains(iterator) {
            self.error(
                format!("iterator '{iterator}' already used by an enclosing loop"),
                location,
            );
            return;
        }
        match self.table.lookup(self.current_proc.as_ref(), iterator) {
            Some(existing) if !existing.is_iterator => {
                self.error(
                    format!("iterator '{iterator}' shadows a declared variable"),
                    location,
                );
                return;
            }
            Some(_) => {} // re-used by a previous sibling loop; same cell
            None => {
                self.table.add_symbol(Symbol {
                    name: iterator.clone(),
                    procedure: self.current_proc.clone(),
                    is_array: false,
                    array_start: None,
                    array_end: None,
                    is_parameter: false,
                    is_array_parameter: false,
                    is_iterator: true,
                });
            }
        }
        self.active_iterators.push(iterator.clone());
        for cmd in body {
            self.check_command(cmd);
        }
        self.active_iterators.pop();
    }

    fn check_call(&mut self, name: &SmolStr, args: &[SmolStr], location: Location) {
        let Some(params) = self.table.get_procedure_params(name) else {
            self.error(format!("unknown procedure '{name}'"), location);
            return;
        };
        let params = params.to_vec();
        if !self.defined_procs.contains(name) {
            self.error(
                format!("procedure '{name}' called before its definition"),
                location,
            );
        }
        if params.len() != args.len() {
            self.error(
                format!(
                    "procedure '{}' expects {} argument(s), got {}",
                    name,
                    params.len(),
                    args.len()
                ),
                location,
            );
            return;
        }
        for (arg, param) in args.iter().zip(&params) {
            let Some(symbol) = self.table.lookup(self.current_proc.as_ref(), arg) else {
                self.error(format!("undeclared variable '{arg}'"), location);
                continue;
            };
            if symbol.is_array != param.is_array {
                let expected = if param.is_array { "an array" } else { "a scalar" };
                self.error(
                    format!("argument '{arg}' for parameter '{}' must be {expected}", param.name),
                    location,
                );
            }
            if self.active_iterators.contains(arg) {
                self.error(
                    format!("loop iterator '{arg}' cannot be passed by reference"),
                    location,
                );
            }
        }
    }

    /// Assignment and READ targets: must resolve, must index arrays
    /// correctly, and must not be an active FOR iterator.
    fn check_write_target(&mut self, target: &Identifier) {
        if target.index.is_none() && self.active_iterators.contains(&target.name) {
            self.error(
                format!("cannot modify loop iterator '{}'", target.name),
                target.location,
            );
            return;
        }
        self.check_identifier(target);
    }

    fn check_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Value(value) => self.check_value(value),
            Expr::BinOp {
                op, left, right, ..
            } => {
                self.table.record_costly(*op);
                self.check_value(left);
                self.check_value(right);
            }
        }
    }

    fn check_condition(&mut self, condition: &Condition) {
        self.check_value(&condition.left);
        self.check_value(&condition.right);
    }

    fn check_value(&mut self, value: &Value) {
        if let Value::Ident(id) = value {
            self.check_identifier(id);
        }
    }

    fn check_identifier(&mut self, id: &Identifier) {
        let Some(symbol) = self.table.lookup(self.current_proc.as_ref(), &id.name) else {
            self.error(format!("undeclared variable '{}'", id.name), id.location);
            return;
        };
        let symbol = symbol.clone();
        match &id.index {
            None => {
                if symbol.is_array {
                    self.error(
                        format!("array '{}' used without an index", id.name),
                        id.location,
                    );
                }
            }
            Some(index) => {
                if !symbol.is_array {
                    self.error(
                        format!("'{}' is not an array", id.name),
                        id.location,
                    );
                    return;
                }
                match index {
                    Index::Number(n) => {
                        if let (Some(lo), Some(hi)) = (symbol.array_start, symbol.array_end) {
                            if *n < lo || *n > hi {
                                self.error(
                                    format!(
                                        "index {n} outside the bounds [{lo}:{hi}] of '{}'",
                                        id.name
                                    ),
                                    id.location,
                                );
                            }
                        }
                    }
                    Index::Name(name) => {
                        let index_sym = self.table.lookup(self.current_proc.as_ref(), name);
                        match index_sym {
                            None => self.error(
                                format!("undeclared variable '{name}'"),
                                id.location,
                            ),
                            Some(s) if s.is_array => self.error(
                                format!("array '{name}' cannot be an index"),
                                id.location,
                            ),
                            Some(_) => {}
                        }
                    }
                }
            }
        }
    }
}
