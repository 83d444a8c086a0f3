//! Symbol table for named memories and the per-line result history.
//!
//! Entries are kept in insertion order (an `IndexMap`) so that listings and
//! the code generator's SRAM layout are deterministic. The table also owns
//! the RES history: one `(type, optional value)` entry per successfully
//! compiled top-level line, queried by `(N RES)` with `n = 1` meaning the
//! most recent line.
//!
//! Scopes exist for nested control structures: `enter_scope` opens a new
//! scope and `exit_scope` removes every symbol declared inside it.

use indexmap::IndexMap;
use thiserror::Error;

use crate::types::Type;

/// Errors raised by symbol table operations.
#[derive(Debug, Error, PartialEq)]
pub enum SymbolError {
    /// Memory names are non-empty runs of uppercase letters.
    #[error("invalid memory name '{0}'")]
    InvalidName(String),

    /// Lookup of a name that was never declared.
    #[error("undeclared memory '{0}'")]
    Undeclared(String),

    /// RES index outside the recorded history.
    #[error("result history index {requested} out of range (available: 1-{available})")]
    HistoryRange { requested: usize, available: usize },
}

/// One declared memory.
#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    /// Inferred type of the stored value
    pub ty: Type,
    /// Whether a store has executed for this name
    pub initialized: bool,
    /// Line of the declaring store (1-based)
    pub declaration_line: u32,
    /// Scope depth the symbol was declared in
    pub scope: u32,
    /// Last stored value, when it was a literal
    pub value: Option<f64>,
}

/// Result of one compiled top-level line, for `(N RES)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HistoryEntry {
    pub ty: Type,
    pub value: Option<f64>,
}

/// Mapping from memory names to their symbols, plus the RES history.
pub struct SymbolTable {
    symbols: IndexMap<String, Symbol>,
    history: Vec<HistoryEntry>,
    current_scope: u32,
    scope_counter: u32,
}

impl SymbolTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            symbols: IndexMap::new(),
            history: Vec::new(),
            current_scope: 0,
            scope_counter: 0,
        }
    }

    /// Declares a memory with the given type.
    ///
    /// Fails when the name is not a run of uppercase letters.
    pub fn add(&mut self, name: &str, ty: Type, line: u32) -> Result<(), SymbolError> {
        if !Self::is_valid_name(name) {
            return Err(SymbolError::InvalidName(name.to_string()));
        }
        self.symbols.insert(
            name.to_string(),
            Symbol {
                ty,
                initialized: false,
                declaration_line: line,
                scope: self.current_scope,
                value: None,
            },
        );
        Ok(())
    }

    /// Updates type, initialization state and value of an existing symbol.
    pub fn update(
        &mut self,
        name: &str,
        ty: Type,
        initialized: bool,
        value: Option<f64>,
    ) -> Result<(), SymbolError> {
        let symbol = self
            .symbols
            .get_mut(name)
            .ok_or_else(|| SymbolError::Undeclared(name.to_string()))?;
        symbol.ty = ty;
        symbol.initialized = initialized;
        symbol.value = value;
        Ok(())
    }

    /// Whether the name has been declared.
    pub fn exists(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Whether the name has been declared and initialized.
    pub fn initialized(&self, name: &str) -> Result<bool, SymbolError> {
        self.symbols
            .get(name)
            .map(|s| s.initialized)
            .ok_or_else(|| SymbolError::Undeclared(name.to_string()))
    }

    /// Type of a declared symbol.
    pub fn type_of(&self, name: &str) -> Result<Type, SymbolError> {
        self.symbols
            .get(name)
            .map(|s| s.ty)
            .ok_or_else(|| SymbolError::Undeclared(name.to_string()))
    }

    /// Full symbol record, if declared.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Declared names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    // =========================================================================
    // RES HISTORY
    // =========================================================================

    /// Appends the result of a compiled line.
    pub fn record_result(&mut self, ty: Type, value: Option<f64>) {
        self.history.push(HistoryEntry { ty, value });
    }

    /// The n-th most recent result (`n = 1` is the latest).
    pub fn history(&self, n: usize) -> Result<HistoryEntry, SymbolError> {
        if n == 0 || n > self.history.len() {
            return Err(SymbolError::HistoryRange {
                requested: n,
                available: self.history.len(),
            });
        }
        Ok(self.history[self.history.len() - n])
    }

    /// Number of recorded line results.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    // =========================================================================
    // SCOPES
    // =========================================================================

    /// Opens a new scope for a nested control structure.
    pub fn enter_scope(&mut self) {
        self.scope_counter += 1;
        self.current_scope = self.scope_counter;
    }

    /// Closes the current scope, removing symbols declared inside it.
    pub fn exit_scope(&mut self) {
        if self.current_scope > 0 {
            let scope = self.current_scope;
            self.symbols.retain(|_, symbol| symbol.scope != scope);
            self.current_scope -= 1;
        }
    }

    fn is_valid_name(name: &str) -> bool {
        !name.is_empty() && name.chars().all(|c| c.is_ascii_uppercase())
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
