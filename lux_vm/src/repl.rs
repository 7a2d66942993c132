//! REPL session management: accumulate lines until brackets balance,
//! then evaluate the chunk against a persistent VM.
//!
//! The VM's bytecode buffer is append-only and the PC resumes past the
//! previous chunk, so globals and functions survive between inputs.

use crate::error::LuxError;
use crate::vm::Vm;

#[derive(Debug)]
pub struct ReplSession {
    vm: Vm,
    buffer: String,
    /// Net count of open brackets across the buffered lines.
    depth: i64,
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplSession {
    pub fn new() -> Self {
        Self::with_vm(Vm::new())
    }

    pub fn with_vm(vm: Vm) -> Self {
        Self {
            vm,
            buffer: String::new(),
            depth: 0,
        }
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    /// Whether buffered input is still waiting for closing brackets.
    pub fn pending(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Feed one input line. Returns `None` while the chunk is
    /// incomplete, `Some(result)` once it was evaluated.
    pub fn feed(&mut self, line: &str) -> Option<Result<(), LuxError>> {
        for c in line.chars() {
            match c {
                '(' | '[' | '{' => self.depth += 1,
                ')' | ']' | '}' => self.depth -= 1,
                _ => {}
            }
        }
        self.buffer.push_str(line);
        self.buffer.push('\n');

        if self.depth > 0 {
            return None;
        }

        let chunk = std::mem::take(&mut self.buffer);
        self.depth = 0;
        let result = self.vm.eval(&chunk);
        if result.is_err() {
            // Keep the session usable: drop the failed chunk's
            // execution leftovers but keep every global binding.
            self.vm.reset_execution_state();
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line_evaluates_immediately() {
        let mut session = ReplSession::new();
        let result = session.feed("let a = 1;").unwrap();
        assert!(result.is_ok());
        assert_eq!(session.vm().global("a").unwrap().as_int(), Some(1));
    }

    #[test]
    fn test_unbalanced_braces_accumulate() {
        let mut session = ReplSession::new();
        assert!(session.feed("func inc(x) {").is_none());
        assert!(session.pending());
        assert!(session.feed("    return x + 1;").is_none());
        let result = session.feed("}").unwrap();
        assert!(result.is_ok());
        assert!(!session.pending());

        let result = session.feed("let b = inc(41);").unwrap();
        assert!(result.is_ok());
        assert_eq!(session.vm().global("b").unwrap().as_int(), Some(42));
    }

    #[test]
    fn test_state_survives_an_error() {
        let mut session = ReplSession::new();
        session.feed("let a = 7;").unwrap().unwrap();
        let err = session.feed("let b = missing;").unwrap();
        assert!(err.is_err());
        // Previously defined globals are still visible.
        let result = session.feed("let c = a;");
        assert!(result.unwrap().is_ok());
        assert_eq!(session.vm().global("c").unwrap().as_int(), Some(7));
    }

    #[test]
    fn test_globals_shared_across_chunks() {
        let mut session = ReplSession::new();
        session.feed("let counter = 0;").unwrap().unwrap();
        session.feed("counter += 5;").unwrap().unwrap();
        assert_eq!(session.vm().global("counter").unwrap().as_int(), Some(5));
    }
}
