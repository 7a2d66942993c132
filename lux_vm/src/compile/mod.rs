//! Bytecode compiler: lowers the parsed AST into the runtime's linked
//! instruction buffer.
//!
//! All modules share one buffer. Compiling a chunk appends to it, so a
//! session can keep compiling and resume execution where the previous
//! chunk ended. Imports inline the child module's instructions at the
//! import site and register its base offset with the module registry.

pub mod error;
mod expr;
mod stmt;

pub use error::CompileError;

use lux_vm_parser::ast::Program;

use crate::gc::ObjRef;
use crate::runtime::Runtime;
use crate::vm::instr::Instr;

/// Patch lists for one enclosing loop.
#[derive(Debug, Default)]
struct LoopContext {
    breaks: Vec<usize>,
    continues: Vec<usize>,
}

/// AST → bytecode lowering over a runtime's buffer.
#[derive(Debug)]
pub struct Compiler<'rt> {
    rt: &'rt mut Runtime,
    loops: Vec<LoopContext>,
    /// Stack of module ids under compilation; imports nest.
    module_ids: Vec<usize>,
}

impl<'rt> Compiler<'rt> {
    pub fn new(rt: &'rt mut Runtime) -> Self {
        Self {
            rt,
            loops: Vec::new(),
            module_ids: Vec::new(),
        }
    }

    /// Compile a top-level chunk into the main module.
    pub fn compile_chunk(&mut self, program: &Program) -> Result<(), CompileError> {
        let name = self.rt.intern("<main>");
        let id = match self.rt.modules.lookup_by_name(name) {
            Some(id) => id,
            None => self.rt.modules.add_module(name, 0),
        };

        self.module_ids.push(id);
        let result = self.compile_statements(&program.statements);
        self.module_ids.pop();
        result
    }

    fn compile_statements(
        &mut self,
        statements: &[lux_vm_parser::ast::Stmt],
    ) -> Result<(), CompileError> {
        for statement in statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    // ==================== buffer helpers ====================

    fn emit(&mut self, instr: Instr) -> usize {
        self.rt.code.push(instr);
        self.rt.code.len() - 1
    }

    /// Index of the next instruction to be emitted.
    fn here(&self) -> usize {
        self.rt.code.len()
    }

    fn intern(&mut self, text: &str) -> ObjRef {
        self.rt.intern(text)
    }

    /// Point a relative-jump placeholder at an absolute target index.
    fn patch_rel(&mut self, at: usize, target: usize) {
        let offset = target as isize - at as isize;
        match &mut self.rt.code[at] {
            Instr::JmpRel(slot) | Instr::JmpIfFalseRel(slot) => *slot = offset,
            other => {
                debug_assert!(false, "patch target is not a relative jump: {:?}", other);
            }
        }
    }

    // ==================== module bookkeeping ====================

    fn current_module(&self) -> usize {
        self.module_ids.last().copied().unwrap_or(0)
    }

    fn current_module_base(&self) -> usize {
        self.rt
            .modules
            .entry(self.current_module())
            .map(|entry| entry.base_offset)
            .unwrap_or(0)
    }

    /// Lower `use "path"`. A module already registered under the same
    /// name is reused; otherwise the file is located on the search
    /// paths, parsed, and its instructions are appended here wrapped in
    /// a derived scope that MAKE_MODULE folds into the module object.
    fn compile_import(&mut self, path: &str) -> Result<(), CompileError> {
        let name = self.intern(path);
        if let Some(id) = self.rt.modules.lookup_by_name(name) {
            self.emit(Instr::LoadModule(id));
            return Ok(());
        }

        let file = self
            .rt
            .imports
            .find_file(path)
            .ok_or_else(|| CompileError::ModuleNotFound(path.to_string()))?;
        let source = std::fs::read_to_string(&file)
            .map_err(|_| CompileError::ModuleNotFound(path.to_string()))?;
        let program = lux_vm_parser::parse(&source).map_err(|error| CompileError::ModuleParse {
            path: path.to_string(),
            error,
        })?;

        self.emit(Instr::BeginLocalDerived);
        let id = self.rt.modules.add_module(name, self.here());

        self.module_ids.push(id);
        let result = self.compile_statements(&program.statements);
        self.module_ids.pop();
        result?;

        self.emit(Instr::MakeModule(id));
        self.emit(Instr::EndLocal);
        Ok(())
    }
}
