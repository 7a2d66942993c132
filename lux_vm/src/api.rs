//! Convenience entry points for embedding.

use crate::error::LuxError;
use crate::vm::Vm;

/// Compile and run a program, returning the VM for inspection.
pub fn compile_and_run(source: &str) -> Result<Vm, LuxError> {
    let mut vm = Vm::new();
    vm.eval(source)?;
    Ok(vm)
}

/// Compile and run with print output captured instead of written to
/// stdout. Returns the VM and the captured text.
pub fn compile_and_run_with_output(source: &str) -> Result<(Vm, String), LuxError> {
    let mut vm = Vm::new();
    vm.capture_output();
    vm.eval(source)?;
    let output = vm.take_output();
    Ok((vm, output))
}
