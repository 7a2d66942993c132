//! Import tests: file-based modules, deduplication, nesting.

use std::fs;

use lux_vm::{CompileError, ImportConfig, LuxError, Vm};

fn vm_in(dir: &std::path::Path) -> Vm {
    Vm::with_import_config(ImportConfig {
        cwd: dir.to_path_buf(),
        import_path: dir.to_path_buf(),
    })
}

#[test]
fn import_binds_module_functions_and_values() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("math.lux"),
        "func double(x) { return x * 2; } let base = 10;",
    )
    .unwrap();

    let mut vm = vm_in(dir.path());
    vm.eval(
        "let m = use \"math.lux\"; \
         let r = m.double(21); \
         let b = m.base;",
    )
    .unwrap();

    assert_eq!(vm.global("r").unwrap().as_int(), Some(42));
    assert_eq!(vm.global("b").unwrap().as_int(), Some(10));
}

#[test]
fn importing_twice_yields_identical_module_objects() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("dep.lux"), "let marker = 1;").unwrap();

    let mut vm = vm_in(dir.path());
    vm.eval("let m1 = use \"dep.lux\"; let m2 = use \"dep.lux\";")
        .unwrap();

    let first = vm.global("m1").unwrap().obj().unwrap();
    let second = vm.global("m2").unwrap().obj().unwrap();
    assert_eq!(first, second);
}

#[test]
fn nested_imports_resolve_offsets_across_modules() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("inner.lux"),
        "func triple(x) { return x * 3; }",
    )
    .unwrap();
    fs::write(
        dir.path().join("outer.lux"),
        "let inner = use \"inner.lux\"; let nine = inner.triple(3);",
    )
    .unwrap();

    let mut vm = vm_in(dir.path());
    vm.eval("let o = use \"outer.lux\"; let n = o.nine;").unwrap();
    assert_eq!(vm.global("n").unwrap().as_int(), Some(9));
}

#[test]
fn module_functions_keep_working_after_more_code_is_compiled() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("util.lux"),
        "func add_one(x) { return x + 1; }",
    )
    .unwrap();

    let mut vm = vm_in(dir.path());
    vm.eval("let u = use \"util.lux\";").unwrap();
    // Appending further chunks must not invalidate the module's
    // function offsets.
    vm.eval("let a = u.add_one(1);").unwrap();
    vm.eval("let b = u.add_one(a);").unwrap();
    assert_eq!(vm.global("b").unwrap().as_int(), Some(3));
}

#[test]
fn import_searches_the_import_path_after_cwd() {
    let cwd = tempfile::tempdir().unwrap();
    let libs = tempfile::tempdir().unwrap();
    fs::write(libs.path().join("shared.lux"), "let from_libs = 7;").unwrap();

    let mut vm = Vm::with_import_config(ImportConfig {
        cwd: cwd.path().to_path_buf(),
        import_path: libs.path().to_path_buf(),
    });
    vm.eval("let s = use \"shared.lux\"; let v = s.from_libs;")
        .unwrap();
    assert_eq!(vm.global("v").unwrap().as_int(), Some(7));
}

#[test]
fn cwd_shadows_the_import_path() {
    let cwd = tempfile::tempdir().unwrap();
    let libs = tempfile::tempdir().unwrap();
    fs::write(cwd.path().join("which.lux"), "let origin = 1;").unwrap();
    fs::write(libs.path().join("which.lux"), "let origin = 2;").unwrap();

    let mut vm = Vm::with_import_config(ImportConfig {
        cwd: cwd.path().to_path_buf(),
        import_path: libs.path().to_path_buf(),
    });
    vm.eval("let w = use \"which.lux\"; let o = w.origin;").unwrap();
    assert_eq!(vm.global("o").unwrap().as_int(), Some(1));
}

#[test]
fn missing_module_is_a_compile_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut vm = vm_in(dir.path());
    let err = vm.eval("let m = use \"nowhere.lux\";").unwrap_err();
    assert!(matches!(
        err,
        LuxError::Compile(CompileError::ModuleNotFound(path)) if path == "nowhere.lux"
    ));
}

#[test]
fn broken_module_source_is_a_compile_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.lux"), "let = ;").unwrap();

    let mut vm = vm_in(dir.path());
    let err = vm.eval("let m = use \"broken.lux\";").unwrap_err();
    assert!(matches!(
        err,
        LuxError::Compile(CompileError::ModuleParse { path, .. }) if path == "broken.lux"
    ));
}
