//! rpnc-drv - Compiler Driver
//!
//! Orchestrates the pipeline over one input file:
//!
//! ```text
//! line ──lex──▶ tokens ──parse──▶ AST ──sem──▶ typed AST ──tac──▶ TAC
//!                                                (per line)
//! TAC ──optimize──▶ optimized TAC ──avr──▶ assembly   (whole program)
//! ```
//!
//! Each line runs the front-end phases on its own; a line that fails any
//! phase is skipped (it neither mutates the symbol table nor advances the
//! RES history) and compilation continues with the next line, so one run
//! reports as many diagnostics as possible. Optimization and code
//! generation run once, over the accumulated instruction list.

pub mod config;
pub mod error;

pub use config::FileConfig;
pub use error::{DriverError, Result};

use std::path::PathBuf;

use rustc_hash::FxHashSet;
use tracing::{debug, info};

use rpnc_gen::{AvrGenerator, AvrOptions};
use rpnc_lex::{Lexer, Token};
use rpnc_par::Parser;
use rpnc_sem::{analyze, SymbolTable};
use rpnc_tac::{Instr, OptLevel, OptStats, Optimizer, TacGen};
use rpnc_util::{Diagnostic, ErrorKind, Handler};

/// Everything one compiler invocation needs to know.
#[derive(Clone, Debug)]
pub struct Config {
    /// Input source file.
    pub input: PathBuf,
    /// Optimization level (`completo` runs all three passes).
    pub opt_level: OptLevel,
    /// Where to write AVR assembly; `None` skips code generation.
    pub output: Option<PathBuf>,
    /// Where to write the optimized TAC listing.
    pub emit_tac: Option<PathBuf>,
    /// UART baud rate for the emitted program.
    pub baud: u32,
    /// Emit debug prints in generated assembly.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            opt_level: OptLevel::Full,
            output: None,
            emit_tac: None,
            baud: 9600,
            debug: false,
        }
    }
}

/// Result of compiling one program.
pub struct CompileOutcome {
    /// Lines that passed every phase.
    pub lines_ok: usize,
    /// Lines aborted by a diagnostic.
    pub lines_failed: usize,
    /// Every diagnostic of the run, in emission order.
    pub diagnostics: Vec<Diagnostic>,
    /// TAC before optimization.
    pub tac: Vec<Instr>,
    /// TAC after the selected passes.
    pub optimized: Vec<Instr>,
    /// Optimization counters.
    pub stats: OptStats,
    /// Generated assembly, when requested.
    pub assembly: Option<String>,
}

impl CompileOutcome {
    /// Whether the whole run succeeded.
    pub fn success(&self) -> bool {
        self.lines_failed == 0
    }

    /// The optimized TAC in its stable text form.
    pub fn tac_listing(&self) -> String {
        let mut listing = String::new();
        for instr in &self.optimized {
            listing.push_str(&instr.to_string());
            listing.push('\n');
        }
        listing
    }
}

/// State for one compiler invocation.
pub struct Session {
    config: Config,
    handler: Handler,
    table: SymbolTable,
}

impl Session {
    /// Creates a session for the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            handler: Handler::new(),
            table: SymbolTable::new(),
        }
    }

    /// Compiles the configured input file and writes requested outputs.
    pub fn compile(&mut self) -> Result<CompileOutcome> {
        let input = self.config.input.clone();
        let source =
            std::fs::read_to_string(&input).map_err(|e| DriverError::io(&input, e))?;

        let outcome = self.compile_source(&source)?;

        if let Some(path) = self.config.emit_tac.clone() {
            std::fs::write(&path, outcome.tac_listing())
                .map_err(|e| DriverError::io(&path, e))?;
            info!(path = %path.display(), "TAC listing written");
        }
        if let (Some(path), Some(assembly)) = (self.config.output.clone(), &outcome.assembly) {
            std::fs::write(&path, assembly).map_err(|e| DriverError::io(&path, e))?;
            info!(path = %path.display(), "assembly written");
        }

        Ok(outcome)
    }

    /// Compiles source text: per-line front end, whole-program back end.
    pub fn compile_source(&mut self, source: &str) -> Result<CompileOutcome> {
        let mut gen = TacGen::new();
        let mut lines_ok = 0;
        let mut lines_failed = 0;

        for (idx, raw) in source.lines().enumerate() {
            let line = idx as u32 + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            if self.compile_line(trimmed, line, &mut gen) {
                lines_ok += 1;
            } else {
                lines_failed += 1;
            }
        }

        let roots: FxHashSet<String> = gen
            .result_history()
            .iter()
            .flatten()
            .filter(|name| rpnc_tac::is_temp(name))
            .cloned()
            .collect();
        let tac = gen.into_instrs();

        let mut optimizer = Optimizer::new();
        let optimized = optimizer.optimize(tac.clone(), self.config.opt_level, &roots);
        let stats = optimizer.stats();
        info!(
            level = %self.config.opt_level,
            folds = stats.folds,
            propagations = stats.propagations,
            removed = stats.removed,
            "optimization finished"
        );

        let assembly = if self.config.output.is_some() {
            let mut gen = AvrGenerator::new(AvrOptions {
                baud: self.config.baud,
                debug: self.config.debug,
            });
            Some(gen.generate(&optimized)?)
        } else {
            None
        };

        Ok(CompileOutcome {
            lines_ok,
            lines_failed,
            diagnostics: self.handler.diagnostics(),
            tac,
            optimized,
            stats,
            assembly,
        })
    }

    /// Runs the front end over one line. Returns whether it survived.
    fn compile_line(&mut self, source: &str, line: u32, gen: &mut TacGen) -> bool {
        let errors_before = self.handler.error_count();
        debug!(line, source, "compiling line");

        let tokens: Vec<Token> = Lexer::new(source, line, &self.handler).collect();
        if self.handler.error_count() > errors_before {
            return false;
        }

        let Some(expr) = Parser::new(tokens, line, &self.handler).parse() else {
            return false;
        };

        let Some(typed) = analyze(&expr, &mut self.table, &self.handler) else {
            return false;
        };

        match gen.lower_line(&typed) {
            Ok(result) => {
                // control-structure lines leave no value for RES to read;
                // record that, whatever the node's own type was
                let ty = if result.is_some() {
                    typed.ty
                } else {
                    rpnc_sem::Type::Void
                };
                self.table.record_result(ty, typed.literal_value());
                true
            },
            Err(err) => {
                self.handler.emit(Diagnostic::error(
                    ErrorKind::Internal,
                    err.to_string(),
                    line,
                ));
                false
            },
        }
    }
}
