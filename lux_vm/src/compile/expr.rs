//! Expression lowering. Every expression pushes exactly one value;
//! statement contexts append POP_STACK when the result is unused.

use lux_vm_parser::ast::{BinaryOp, Expr, UnaryOp};

use super::{CompileError, Compiler};
use crate::value::Value;
use crate::vm::instr::Instr;

impl Compiler<'_> {
    pub(super) fn compile_expression(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Int(v) => {
                self.emit(Instr::LoadConst(Value::int(*v)));
                Ok(())
            }
            Expr::Float(v) => {
                self.emit(Instr::LoadConst(Value::float(*v)));
                Ok(())
            }
            Expr::Bool(v) => {
                self.emit(Instr::LoadConst(Value::bool_(*v)));
                Ok(())
            }
            Expr::Null => {
                self.emit(Instr::LoadConst(Value::null()));
                Ok(())
            }
            Expr::Str(text) => {
                let handle = self.intern(text);
                self.emit(Instr::LoadConst(Value::string(handle)));
                Ok(())
            }
            Expr::Ident(name) => {
                let handle = self.intern(name);
                self.emit(Instr::LoadIdentifier(handle));
                Ok(())
            }
            Expr::Unary { op, operand } => {
                self.compile_expression(operand)?;
                match op {
                    UnaryOp::Neg => {
                        self.emit(Instr::Negate);
                    }
                    UnaryOp::BitNot => {
                        self.emit(Instr::Not);
                    }
                    UnaryOp::LogicalNot => {
                        self.emit(Instr::LogicalNot);
                    }
                    // Unary plus is the identity on numbers.
                    UnaryOp::Pos => {}
                }
                Ok(())
            }
            Expr::Binary { op, left, right } => self.compile_binary(*op, left, right),
            Expr::Assign { .. } => Err(CompileError::AssignmentAsValue),
            Expr::Call { callee, args } => {
                for arg in args.iter().rev() {
                    self.compile_expression(arg)?;
                }
                self.compile_expression(callee)?;
                self.emit(Instr::Call(args.len()));
                Ok(())
            }
            Expr::Member { object, member } => {
                self.compile_expression(object)?;
                let handle = self.intern(member);
                self.emit(Instr::LoadMember(handle));
                Ok(())
            }
            Expr::MethodCall {
                object,
                method,
                args,
            } => {
                // Arguments reversed, then the receiver duplicated so
                // it serves both as lookup subject and first argument.
                for arg in args.iter().rev() {
                    self.compile_expression(arg)?;
                }
                self.compile_expression(object)?;
                self.emit(Instr::Peek);
                let handle = self.intern(method);
                self.emit(Instr::LoadMember(handle));
                self.emit(Instr::Call(args.len() + 1));
                Ok(())
            }
            Expr::Import { path } => self.compile_import(path),
            Expr::InitList { type_expr, fields } => {
                self.compile_init_list(type_expr.as_deref(), fields)
            }
        }
    }

    fn compile_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<(), CompileError> {
        let logical = matches!(op, BinaryOp::LogicalAnd | BinaryOp::LogicalOr);

        self.compile_expression(left)?;
        if logical {
            self.emit(Instr::ToBool);
        }
        self.compile_expression(right)?;
        if logical {
            self.emit(Instr::ToBool);
        }

        self.emit(match op {
            BinaryOp::Add => Instr::Add,
            BinaryOp::Sub => Instr::Sub,
            BinaryOp::Mul => Instr::Mul,
            BinaryOp::Div => Instr::Div,
            BinaryOp::Mod => Instr::Mod,
            BinaryOp::BitAnd => Instr::And,
            BinaryOp::BitOr => Instr::Or,
            BinaryOp::BitXor => Instr::Xor,
            BinaryOp::Shl => Instr::Shl,
            BinaryOp::Shr => Instr::Shr,
            BinaryOp::LogicalAnd => Instr::LogicalAnd,
            BinaryOp::LogicalOr => Instr::LogicalOr,
            BinaryOp::Eq => Instr::CmpEq,
            BinaryOp::Ne => Instr::CmpNe,
            BinaryOp::Lt => Instr::CmpLt,
            BinaryOp::Le => Instr::CmpLe,
            BinaryOp::Gt => Instr::CmpGt,
            BinaryOp::Ge => Instr::CmpGe,
        });
        Ok(())
    }

    /// Values in source order, then the type descriptor (Any for the
    /// anonymous form), then MAKE_OBJECT with the field names reversed
    /// so the VM pairs them with values popped off the stack.
    fn compile_init_list(
        &mut self,
        type_expr: Option<&Expr>,
        fields: &[(String, Expr)],
    ) -> Result<(), CompileError> {
        let mut names = Vec::with_capacity(fields.len());
        for (name, value) in fields {
            let handle = self.intern(name);
            if names.contains(&handle) {
                return Err(CompileError::InvalidInitializer(format!(
                    "duplicate field '{}'",
                    name
                )));
            }
            names.push(handle);
            self.compile_expression(value)?;
        }

        match type_expr {
            Some(type_expr) => self.compile_expression(type_expr)?,
            None => {
                let any = self.rt.types().any;
                self.emit(Instr::LoadConst(Value::type_value(any)));
            }
        }

        names.reverse();
        self.emit(Instr::MakeObject(names));
        Ok(())
    }
}
