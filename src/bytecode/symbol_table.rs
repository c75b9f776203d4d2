use thiserror::Error;
use tracing::debug;

/// Default symbol capacity.
pub const MAX_SYMBOLS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Constant,
    Variable,
    Procedure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Literal value; constants only.
    pub value: i32,
    /// Lexical level of the declaration.
    pub level: u32,
    /// Frame offset for variables, entry instruction for procedures.
    pub address: i32,
}

impl Symbol {
    pub fn constant(name: impl Into<String>, value: i32, level: u32) -> Self {
        Self {
            kind: SymbolKind::Constant,
            name: name.into(),
            value,
            level,
            address: 0,
        }
    }

    pub fn variable(name: impl Into<String>, level: u32, address: i32) -> Self {
        Self {
            kind: SymbolKind::Variable,
            name: name.into(),
            value: 0,
            level,
            address,
        }
    }

    pub fn procedure(name: impl Into<String>, level: u32, address: i32) -> Self {
        Self {
            kind: SymbolKind::Procedure,
            name: name.into(),
            value: 0,
            level,
            address,
        }
    }

    pub fn is_procedure(&self) -> bool {
        self.kind == SymbolKind::Procedure
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclareError {
    #[error("duplicate identifier '{name}' at lexical level {level}")]
    Duplicate { name: String, level: u32 },

    #[error("procedure '{name}' already exists")]
    DuplicateProcedure { name: String, level: u32 },

    #[error("too many symbols (limit {limit})")]
    Full { limit: usize },
}

/// Saved table length; restoring it drops everything declared since.
#[must_use = "a scope mark must be handed back to leave_scope"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeMark(usize);

/// Flat, lexically scoped symbol registry.
///
/// Scopes nest by truncation: `enter_scope` records the current length and
/// `leave_scope` cuts the table back to it. Lookups scan the live entries.
#[derive(Debug)]
pub struct SymbolTable {
    entries: Vec<Symbol>,
    capacity: usize,
}

impl SymbolTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether `symbol` may be declared, without adding it.
    ///
    /// Constants and variables clash only with constants or variables of the
    /// same name at the same level. Procedures clash with any live procedure
    /// of the same name.
    pub fn check(&self, symbol: &Symbol) -> Result<(), DeclareError> {
        let clash = self.entries.iter().find(|existing| {
            existing.name == symbol.name
                && match (existing.is_procedure(), symbol.is_procedure()) {
                    (true, true) => true,
                    (false, false) => existing.level == symbol.level,
                    _ => false,
                }
        });

        if let Some(existing) = clash {
            return Err(if symbol.is_procedure() {
                DeclareError::DuplicateProcedure {
                    name: symbol.name.clone(),
                    level: existing.level,
                }
            } else {
                DeclareError::Duplicate {
                    name: symbol.name.clone(),
                    level: symbol.level,
                }
            });
        }

        if self.entries.len() >= self.capacity {
            return Err(DeclareError::Full {
                limit: self.capacity,
            });
        }

        Ok(())
    }

    /// Adds a symbol declared at `symbol.level`.
    pub fn declare(&mut self, symbol: Symbol) -> Result<(), DeclareError> {
        self.check(&symbol)?;

        debug!(
            name = %symbol.name,
            kind = ?symbol.kind,
            level = symbol.level,
            address = symbol.address,
            "declare"
        );
        self.entries.push(symbol);
        Ok(())
    }

    /// Finds the most recent constant or variable called `name`.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.entries
            .iter()
            .rev()
            .find(|s| !s.is_procedure() && s.name == name)
    }

    /// Finds the procedure called `name`.
    pub fn resolve_procedure(&self, name: &str) -> Option<&Symbol> {
        self.entries
            .iter()
            .find(|s| s.is_procedure() && s.name == name)
    }

    pub fn enter_scope(&self) -> ScopeMark {
        ScopeMark(self.entries.len())
    }

    pub fn leave_scope(&mut self, mark: ScopeMark) {
        debug!(
            dropped = self.entries.len().saturating_sub(mark.0),
            "leave scope"
        );
        self.entries.truncate(mark.0);
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new(MAX_SYMBOLS)
    }
}
