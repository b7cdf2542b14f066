//! The translation driver: folds the code generator over the command
//! streams of one or more source units, threading a single [`Context`]
//! forward so label uniqueness holds across the whole run.

mod codegen;
mod segment;

use std::collections::HashSet;

use crate::error::{Error, Result, SemanticError};
use crate::hack::Program;
use crate::vm;

/// One input unit: a file stem (drives static-variable naming) plus its
/// command text.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub name: String,
    pub source: String,
}

impl SourceUnit {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Translation options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Emit the stack-pointer init and `call Sys.init 0` preamble.
    pub bootstrap: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { bootstrap: true }
    }
}

/// Translate a run of source units into one program, bootstrap included.
pub fn translate(units: &[SourceUnit]) -> Result<Program> {
    translate_with_options(units, &Options::default())
}

/// Translate with explicit [`Options`].
pub fn translate_with_options(units: &[SourceUnit], options: &Options) -> Result<Program> {
    let mut ctx = Context::new();
    let mut out = Vec::new();

    if options.bootstrap {
        tracing::debug!("emitting bootstrap preamble");
        codegen::emit_bootstrap(&mut ctx, &mut out);
    }

    for unit in units {
        let lines = vm::parse_source(&unit.name, &unit.source)?;
        tracing::debug!(unit = %unit.name, commands = lines.len(), "translating unit");
        ctx.begin_unit(&unit.name);
        for line in &lines {
            ctx.set_line(line.number);
            codegen::translate_command(&mut ctx, &mut out, &line.command).map_err(|source| {
                Error::Semantic {
                    file: unit.name.clone(),
                    line: line.number,
                    source,
                }
            })?;
        }
    }

    ctx.finish()?;
    Ok(Program::new(out))
}

/// A branch target recorded at its first `goto`/`if-goto` site, checked
/// against declarations once the whole run has been read.
#[derive(Debug)]
struct LabelReference {
    qualified: String,
    name: String,
    file: String,
    line: usize,
}

/// Mutable state threaded through a run: the global label counter, the
/// current unit and function, and the label bookkeeping for deferred
/// resolution. Created once per run, owned by the driver.
#[derive(Debug, Default)]
pub(crate) struct Context {
    label_counter: usize,
    file_stem: String,
    function: String,
    file: String,
    line: usize,
    declared_labels: HashSet<String>,
    declared_functions: HashSet<String>,
    references: Vec<LabelReference>,
}

impl Context {
    fn new() -> Self {
        Self::default()
    }

    fn begin_unit(&mut self, name: &str) {
        self.file_stem = name.to_string();
        self.file = name.to_string();
    }

    fn set_line(&mut self, line: usize) {
        self.line = line;
    }

    pub(crate) fn file_stem(&self) -> &str {
        &self.file_stem
    }

    /// Next value of the run-global counter behind comparison and
    /// call-return labels.
    pub(crate) fn fresh_label_id(&mut self) -> usize {
        let id = self.label_counter;
        self.label_counter += 1;
        id
    }

    /// Qualify a branch label by its enclosing function, so identical
    /// label text in different functions stays independent.
    pub(crate) fn qualify(&self, label: &str) -> String {
        format!("{}${label}", self.function)
    }

    pub(crate) fn declare_label(&mut self, qualified: &str) -> std::result::Result<(), SemanticError> {
        if !self.declared_labels.insert(qualified.to_string()) {
            let name = qualified.split_once('$').map_or(qualified, |(_, l)| l);
            return Err(SemanticError::DuplicateLabel(name.to_string()));
        }
        Ok(())
    }

    /// Record a branch target for the end-of-run declaration check.
    /// Forward references are legal, so nothing is verified here.
    pub(crate) fn reference_label(&mut self, name: &str, qualified: &str) {
        self.references.push(LabelReference {
            qualified: qualified.to_string(),
            name: name.to_string(),
            file: self.file.clone(),
            line: self.line,
        });
    }

    pub(crate) fn enter_function(&mut self, name: &str) -> std::result::Result<(), SemanticError> {
        if !self.declared_functions.insert(name.to_string()) {
            return Err(SemanticError::DuplicateFunction(name.to_string()));
        }
        self.function = name.to_string();
        Ok(())
    }

    /// End-of-run check: every referenced label must have been declared
    /// somewhere in its function's scope.
    fn finish(self) -> Result<()> {
        for reference in &self.references {
            if !self.declared_labels.contains(&reference.qualified) {
                return Err(Error::Semantic {
                    file: reference.file.clone(),
                    line: reference.line,
                    source: SemanticError::UndeclaredLabel(reference.name.clone()),
                });
            }
        }
        Ok(())
    }
}
