//! Statement lowering.

use lux_vm_parser::ast::{AssignOp, Expr, Stmt, TypeMember};

use super::{CompileError, Compiler, LoopContext};
use crate::gc::{FunctionObject, ObjPayload};
use crate::value::Value;
use crate::vm::instr::Instr;

impl Compiler<'_> {
    pub(super) fn compile_statement(&mut self, statement: &Stmt) -> Result<(), CompileError> {
        match statement {
            Stmt::Let { names, init } => self.compile_let(names, init.as_ref()),
            Stmt::Expr(expr) => self.compile_expression_statement(expr),
            Stmt::Block(statements) => self.compile_statements(statements),
            Stmt::If {
                cond,
                body,
                else_body,
            } => self.compile_if(cond, body, else_body.as_deref()),
            Stmt::While { cond, body } => self.compile_while(cond, body),
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => self.compile_for(init, cond, update, body),
            Stmt::Break => self.compile_break(),
            Stmt::Continue => self.compile_continue(),
            Stmt::Return { value } => self.compile_return(value.as_ref()),
            Stmt::Func { name, params, body } => match body {
                // A forward declaration emits nothing.
                None => Ok(()),
                Some(body) => self.compile_function(name, params, body, false),
            },
            Stmt::TypeDecl { name, members } => self.compile_type_decl(name, members),
            Stmt::ModDecl { name, body } => self.compile_mod_decl(name, body),
        }
    }

    fn compile_let(&mut self, names: &[String], init: Option<&Expr>) -> Result<(), CompileError> {
        let Some(init) = init else {
            for name in names {
                let handle = self.intern(name);
                self.emit(Instr::DeclareIdentifier(handle));
            }
            return Ok(());
        };

        self.compile_expression(init)?;
        let handle = self.intern(&names[0]);
        self.emit(Instr::DeclareIdentifier(handle));
        self.emit(Instr::StoreIdentifier(handle));
        Ok(())
    }

    /// Expression statements discard their result, except assignments,
    /// which already consume everything they produce.
    fn compile_expression_statement(&mut self, expr: &Expr) -> Result<(), CompileError> {
        if let Expr::Assign { op, target, value } = expr {
            return self.compile_assignment(*op, target, value);
        }
        self.compile_expression(expr)?;
        self.emit(Instr::PopStack);
        Ok(())
    }

    pub(super) fn compile_assignment(
        &mut self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
    ) -> Result<(), CompileError> {
        match op {
            AssignOp::Assign => match target {
                Expr::Ident(name) => {
                    self.compile_expression(value)?;
                    let handle = self.intern(name);
                    self.emit(Instr::StoreIdentifier(handle));
                    Ok(())
                }
                Expr::Member { object, member } => {
                    self.compile_expression(object)?;
                    self.compile_expression(value)?;
                    let handle = self.intern(member);
                    self.emit(Instr::StoreMember(handle));
                    Ok(())
                }
                other => Err(CompileError::InvalidLvalue(format!("{other:?}"))),
            },
            AssignOp::AddAssign | AssignOp::SubAssign => {
                let Expr::Ident(name) = target else {
                    return Err(CompileError::InvalidLvalue(format!("{target:?}")));
                };
                self.compile_expression(value)?;
                let handle = self.intern(name);
                self.emit(Instr::LoadIdentifier(handle));
                self.emit(match op {
                    AssignOp::AddAssign => Instr::Add,
                    _ => Instr::Sub,
                });
                self.emit(Instr::StoreIdentifier(handle));
                Ok(())
            }
        }
    }

    fn compile_if(
        &mut self,
        cond: &Expr,
        body: &Stmt,
        else_body: Option<&Stmt>,
    ) -> Result<(), CompileError> {
        self.compile_expression(cond)?;
        self.emit(Instr::ToBool);
        let cond_jump = self.emit(Instr::JmpIfFalseRel(0));

        self.compile_statement(body)?;

        match else_body {
            Some(else_body) => {
                // The body's trailing jump skips the else branch; the
                // condition jump lands one past it.
                let body_end = self.emit(Instr::JmpRel(0));
                self.patch_rel(cond_jump, body_end + 1);
                self.compile_statement(else_body)?;
                let end = self.here();
                self.patch_rel(body_end, end);
            }
            None => {
                let end = self.here();
                self.patch_rel(cond_jump, end);
            }
        }
        Ok(())
    }

    fn compile_while(&mut self, cond: &Expr, body: &Stmt) -> Result<(), CompileError> {
        let loop_start = self.here();
        self.compile_expression(cond)?;
        self.emit(Instr::ToBool);
        let exit_jump = self.emit(Instr::JmpIfFalseRel(0));

        self.loops.push(LoopContext::default());
        let body_result = self.compile_statement(body);
        let context = self.loops.pop().unwrap_or_default();
        body_result?;

        let back_jump = self.emit(Instr::JmpRel(0));
        self.patch_rel(back_jump, loop_start);

        let end = self.here();
        self.patch_rel(exit_jump, end);
        for jump in context.breaks {
            self.patch_rel(jump, end);
        }
        for jump in context.continues {
            self.patch_rel(jump, loop_start);
        }
        Ok(())
    }

    /// init once; condition before each iteration; update after the
    /// body. `continue` lands on the update, `break` past the loop.
    fn compile_for(
        &mut self,
        init: &Stmt,
        cond: &Expr,
        update: &Stmt,
        body: &Stmt,
    ) -> Result<(), CompileError> {
        self.compile_statement(init)?;

        let loop_start = self.here();
        self.compile_expression(cond)?;
        self.emit(Instr::ToBool);
        let exit_jump = self.emit(Instr::JmpIfFalseRel(0));

        self.loops.push(LoopContext::default());
        let body_result = self.compile_statement(body);
        let context = self.loops.pop().unwrap_or_default();
        body_result?;

        let update_index = self.here();
        self.compile_statement(update)?;
        let back_jump = self.emit(Instr::JmpRel(0));
        self.patch_rel(back_jump, loop_start);

        let end = self.here();
        self.patch_rel(exit_jump, end);
        for jump in context.breaks {
            self.patch_rel(jump, end);
        }
        for jump in context.continues {
            self.patch_rel(jump, update_index);
        }
        Ok(())
    }

    fn compile_break(&mut self) -> Result<(), CompileError> {
        if self.loops.is_empty() {
            return Err(CompileError::BreakOutsideLoop);
        }
        let jump = self.emit(Instr::JmpRel(0));
        if let Some(context) = self.loops.last_mut() {
            context.breaks.push(jump);
        }
        Ok(())
    }

    fn compile_continue(&mut self) -> Result<(), CompileError> {
        if self.loops.is_empty() {
            return Err(CompileError::ContinueOutsideLoop);
        }
        let jump = self.emit(Instr::JmpRel(0));
        if let Some(context) = self.loops.last_mut() {
            context.continues.push(jump);
        }
        Ok(())
    }

    fn compile_return(&mut self, value: Option<&Expr>) -> Result<(), CompileError> {
        match value {
            Some(value) => self.compile_expression(value)?,
            None => {
                self.emit(Instr::LoadConst(Value::unit()));
            }
        }
        self.emit(Instr::Ret);
        Ok(())
    }

    /// Shared lowering for functions and methods: a skip jump over the
    /// body, parameter binding at entry, a Unit return tail when the
    /// body does not end in RET, then the Function constant bound to
    /// its name.
    pub(super) fn compile_function(
        &mut self,
        name: &str,
        params: &[String],
        body: &[Stmt],
        is_method: bool,
    ) -> Result<(), CompileError> {
        let skip_jump = self.emit(Instr::JmpRel(0));
        let fn_start = self.here();

        for param in params {
            let handle = self.intern(param);
            self.emit(Instr::DeclareIdentifier(handle));
            self.emit(Instr::StoreIdentifier(handle));
        }

        self.compile_statements(body)?;

        if !matches!(self.rt.code.last(), Some(Instr::Ret)) {
            self.emit(Instr::LoadConst(Value::unit()));
            self.emit(Instr::Ret);
        }

        let end = self.here();
        self.patch_rel(skip_jump, end);

        let module_id = self.current_module();
        let begin_offset = fn_start - self.current_module_base();
        let function = if is_method {
            FunctionObject::method(module_id, begin_offset, params.len())
        } else {
            FunctionObject::bytecode(module_id, begin_offset, params.len())
        };
        // Referenced from bytecode, which the collector does not scan.
        let function_ref = self.rt.heap.alloc_pinned(ObjPayload::Function(function));

        self.emit(Instr::LoadConst(Value::function(function_ref)));
        let handle = self.intern(name);
        self.emit(Instr::DeclareIdentifier(handle));
        self.emit(Instr::StoreIdentifier(handle));
        Ok(())
    }

    fn compile_type_decl(
        &mut self,
        name: &str,
        members: &[TypeMember],
    ) -> Result<(), CompileError> {
        self.emit(Instr::BeginLocalDerived);

        for member in members {
            match member {
                TypeMember::Field { name, ty } => {
                    self.compile_expression(ty)?;
                    let handle = self.intern(name);
                    self.emit(Instr::DeclareIdentifier(handle));
                    self.emit(Instr::StoreIdentifier(handle));
                }
                TypeMember::Method { name, params, body } => {
                    // The receiver binds to an implicit leading `self`.
                    let mut full_params = Vec::with_capacity(params.len() + 1);
                    full_params.push("self".to_string());
                    full_params.extend(params.iter().cloned());
                    self.compile_function(name, &full_params, body, true)?;
                }
            }
        }

        self.emit(Instr::MakeType);
        self.emit(Instr::EndLocal);

        let handle = self.intern(name);
        self.emit(Instr::DeclareIdentifier(handle));
        self.emit(Instr::StoreIdentifier(handle));
        Ok(())
    }

    fn compile_mod_decl(&mut self, name: &str, body: &[Stmt]) -> Result<(), CompileError> {
        self.emit(Instr::BeginLocalDerived);
        self.compile_statements(body)?;
        self.emit(Instr::MakeModuleLocal);
        self.emit(Instr::EndLocal);

        let handle = self.intern(name);
        self.emit(Instr::DeclareIdentifier(handle));
        self.emit(Instr::StoreIdentifier(handle));
        Ok(())
    }
}
