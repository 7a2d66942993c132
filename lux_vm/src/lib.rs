// Prevent accidental debug output in library code; the CLI binary may
// use eprintln!() for user-facing error messages.
#![deny(clippy::print_stderr)]

//! The Lux scripting language: bytecode compiler, stack-based virtual
//! machine and mark-sweep garbage collector.
//!
//! Source text parses (via `lux_vm_parser`) into an AST the
//! [`compile`] module lowers onto one linked instruction buffer; the
//! [`vm`] module executes it over an operand stack and a chain of
//! scoped frames, with every heap object owned by the [`gc`] heap.
//!
//! ```
//! use lux_vm::Vm;
//!
//! let mut vm = Vm::new();
//! vm.eval("func add(a, b) { return a + b; } let r = add(3, 4);").unwrap();
//! assert_eq!(vm.global("r").unwrap().as_int(), Some(7));
//! ```

pub mod api;
pub mod builtins;
pub mod compile;
pub mod disasm;
pub mod error;
pub mod gc;
pub mod intern;
pub mod modules;
pub mod repl;
pub mod runtime;
pub mod value;
pub mod vm;

pub use api::{compile_and_run, compile_and_run_with_output};
pub use compile::CompileError;
pub use error::LuxError;
pub use gc::{GcConfig, GcStats, Heap, ObjRef};
pub use runtime::{ImportConfig, Runtime};
pub use value::{Value, ValueType};
pub use vm::{Instr, Vm, VmError};
