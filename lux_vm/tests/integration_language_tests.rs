//! End-to-end language tests: source text in, global values out.

use lux_vm::{compile_and_run, LuxError, ValueType, Vm, VmError};

fn run(src: &str) -> Vm {
    compile_and_run(src).unwrap()
}

fn run_err(src: &str) -> LuxError {
    let mut vm = Vm::new();
    vm.eval(src).unwrap_err()
}

#[test]
fn arithmetic_with_precedence_and_grouping() {
    let vm = run("let a = 1 + 2 * (3 + 4);");
    assert_eq!(vm.global("a").unwrap().as_int(), Some(15));
    assert_eq!(vm.global("a").unwrap().tag(), ValueType::Int);
    assert_eq!(vm.display_value(&vm.global("a").unwrap()), "15");
}

#[test]
fn array_access_is_bounds_checked() {
    let vm = run("let a = __builtin_typings_array_of(10, 20, 30);");
    let array = vm.global("a").unwrap();
    assert_eq!(vm.array_element(&array, 0).unwrap().as_int(), Some(10));
    assert_eq!(vm.array_element(&array, 2).unwrap().as_int(), Some(30));
    assert!(matches!(
        vm.array_element(&array, 3),
        Err(VmError::IndexOutOfBounds { index: 3, len: 3 })
    ));
    assert!(matches!(
        vm.array_element(&array, -1),
        Err(VmError::IndexOutOfBounds { .. })
    ));
    assert_eq!(vm.display_value(&array), "[10, 20, 30]");
}

#[test]
fn while_loop_with_compound_assignment() {
    let vm = run("let i = 0; while (i < 5) { i += 1; }");
    assert_eq!(vm.global("i").unwrap().as_int(), Some(5));
}

#[test]
fn function_declaration_and_call() {
    let vm = run("func add(a, b) { return a + b; } let r = add(3, 4);");
    assert_eq!(vm.global("r").unwrap().as_int(), Some(7));
}

#[test]
fn type_with_field_and_method() {
    let vm = run(
        "type P { field x: Int; method get() { return self.x; } } \
         let p = P { x = 9 }; \
         let v = p.get();",
    );
    assert_eq!(vm.global("v").unwrap().as_int(), Some(9));
    assert_eq!(vm.global("p").unwrap().tag(), ValueType::Object);
}

#[test]
fn module_function_call() {
    let vm = run("mod M { func f() { return 42; } } let r = M.f();");
    assert_eq!(vm.global("r").unwrap().as_int(), Some(42));
}

#[test]
fn if_elif_else_chain() {
    let src = "func classify(n) { \
                   if (n < 0) { return -1; } \
                   elif (n == 0) { return 0; } \
                   else { return 1; } \
               } \
               let a = classify(-5); \
               let b = classify(0); \
               let c = classify(17);";
    let vm = run(src);
    assert_eq!(vm.global("a").unwrap().as_int(), Some(-1));
    assert_eq!(vm.global("b").unwrap().as_int(), Some(0));
    assert_eq!(vm.global("c").unwrap().as_int(), Some(1));
}

#[test]
fn for_loop_with_break_and_continue() {
    let src = "let sum = 0; \
               for (let i = 0; i < 10; i += 1) { \
                   if (i == 3) { continue; } \
                   if (i == 6) { break; } \
                   sum += i; \
               }";
    let vm = run(src);
    // 0 + 1 + 2 + 4 + 5
    assert_eq!(vm.global("sum").unwrap().as_int(), Some(12));
}

#[test]
fn nested_loops_patch_their_own_targets() {
    let src = "let total = 0; \
               for (let i = 0; i < 3; i += 1) { \
                   for (let j = 0; j < 3; j += 1) { \
                       if (j == 2) { break; } \
                       total += 1; \
                   } \
               }";
    let vm = run(src);
    assert_eq!(vm.global("total").unwrap().as_int(), Some(6));
}

#[test]
fn recursion_terminates_with_balanced_frames() {
    let vm = run(
        "func fib(n) { \
             if (n < 2) { return n; } \
             return fib(n - 1) + fib(n - 2); \
         } \
         let f = fib(10);",
    );
    assert_eq!(vm.global("f").unwrap().as_int(), Some(55));
}

#[test]
fn mixed_numeric_widening() {
    let vm = run("let x = 1 + 2.5; let y = true + 2; let z = 2 * 3.0;");
    assert_eq!(vm.global("x").unwrap().as_float(), Some(3.5));
    assert_eq!(vm.global("y").unwrap().as_int(), Some(3));
    assert_eq!(vm.global("z").unwrap().as_float(), Some(6.0));
}

#[test]
fn bitwise_and_shift_operators() {
    let vm = run(
        "let a = 6 & 3; let o = 4 | 1; let x = 5 ^ 3; \
         let l = 1 << 4; let r = 32 >> 2; let n = ~0;",
    );
    assert_eq!(vm.global("a").unwrap().as_int(), Some(2));
    assert_eq!(vm.global("o").unwrap().as_int(), Some(5));
    assert_eq!(vm.global("x").unwrap().as_int(), Some(6));
    assert_eq!(vm.global("l").unwrap().as_int(), Some(16));
    assert_eq!(vm.global("r").unwrap().as_int(), Some(8));
    assert_eq!(vm.global("n").unwrap().as_int(), Some(-1));
}

#[test]
fn logical_operators_yield_bool_and_evaluate_both_sides() {
    let vm = run("let calls = 0; \
                  func tick() { calls += 1; return 0; } \
                  let a = 1 && tick(); \
                  let b = null || 2;");
    assert_eq!(vm.global("a").unwrap().as_bool(), Some(false));
    assert_eq!(vm.global("b").unwrap().as_bool(), Some(true));
    // No short-circuit: the right side ran.
    assert_eq!(vm.global("calls").unwrap().as_int(), Some(1));
}

#[test]
fn comparison_chain_results() {
    let vm = run(
        "let a = 1 < 2; let b = 2.5 >= 2; let c = null == null; let d = 1 != 1;",
    );
    assert_eq!(vm.global("a").unwrap().as_bool(), Some(true));
    assert_eq!(vm.global("b").unwrap().as_bool(), Some(true));
    assert_eq!(vm.global("c").unwrap().as_bool(), Some(true));
    assert_eq!(vm.global("d").unwrap().as_bool(), Some(false));
}

#[test]
fn strings_intern_to_identical_handles() {
    let vm = run("let a = \"shared\"; let b = \"shared\"; let c = \"other\";");
    let a = vm.global("a").unwrap().obj().unwrap();
    let b = vm.global("b").unwrap().obj().unwrap();
    let c = vm.global("c").unwrap().obj().unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn object_field_store_and_reload() {
    let vm = run(
        "type Point { field x: Int; field y: Int; } \
         let p = Point { x = 1, y = 2 }; \
         p.x = 10; \
         let sum = p.x + p.y;",
    );
    assert_eq!(vm.global("sum").unwrap().as_int(), Some(12));
}

#[test]
fn unspecified_fields_get_type_defaults() {
    // `Int()` yields the primitive descriptor, so omitted fields
    // default per their declared type.
    let vm = run(
        "type Pair { field x: Int(); field y: Int(); } \
         let p = Pair { x = 5 }; \
         let y = p.y;",
    );
    assert_eq!(vm.global("y").unwrap().as_int(), Some(0));
}

#[test]
fn supplied_fields_adopt_declared_descriptors() {
    let vm = run(
        "type Pair { field x: Int(); field y: Int(); } \
         let p = Pair { x = 5, y = 6 }; \
         let x = p.x; \
         let y = p.y;",
    );
    assert_eq!(vm.global("x").unwrap().as_int(), Some(5));
    assert_eq!(vm.global("y").unwrap().as_int(), Some(6));
    let int_descriptor = vm.runtime().types().int;
    assert_eq!(vm.global("x").unwrap().type_info(), Some(int_descriptor));
    assert_eq!(vm.global("y").unwrap().type_info(), Some(int_descriptor));
}

#[test]
fn anonymous_initializer_accepts_any_fields() {
    let vm = run("let p = { a = 1, b = 2.5 }; let s = p.a; let t = p.b;");
    assert_eq!(vm.global("s").unwrap().as_int(), Some(1));
    assert_eq!(vm.global("t").unwrap().as_float(), Some(2.5));
}

#[test]
fn method_updating_field_through_self() {
    let vm = run(
        "type Counter { \
             field count: Int; \
             method bump(by) { self.count = self.count + by; return self.count; } \
         } \
         let c = Counter { count = 10 }; \
         c.bump(1); \
         let n = c.bump(2);",
    );
    assert_eq!(vm.global("n").unwrap().as_int(), Some(13));
}

#[test]
fn module_bindings_visible_as_members() {
    let vm = run("mod Config { let limit = 99; } let l = Config.limit;");
    assert_eq!(vm.global("l").unwrap().as_int(), Some(99));
}

#[test]
fn float_division_follows_ieee() {
    let vm = run("let inf = 1.0 / 0.0; let nan = 0.0 / 0.0;");
    assert_eq!(vm.global("inf").unwrap().as_float(), Some(f64::INFINITY));
    assert!(vm.global("nan").unwrap().as_float().unwrap().is_nan());
}

#[test]
fn integer_division_by_zero_is_domain_error() {
    let err = run_err("let x = 1 / 0;");
    assert!(matches!(err, LuxError::Runtime(VmError::DomainError(_))));
}

#[test]
fn integer_modulo_by_zero_is_domain_error() {
    let err = run_err("let x = 1 % 0;");
    assert!(matches!(err, LuxError::Runtime(VmError::DomainError(_))));
}

#[test]
fn string_condition_is_a_type_error() {
    let err = run_err("if (\"\") { let a = 1; }");
    assert!(matches!(err, LuxError::Runtime(VmError::TypeError(_))));
}

#[test]
fn missing_field_access_errors() {
    let err = run_err(
        "type T { field x: Int; } let t = T { x = 1 }; let v = t.missing;",
    );
    assert!(matches!(err, LuxError::Runtime(VmError::FieldNotFound(_))));
}

#[test]
fn undeclared_field_in_initializer_errors() {
    let err = run_err("type T { field x: Int; } let t = T { y = 1 };");
    assert!(matches!(err, LuxError::Runtime(VmError::FieldNotFound(_))));
}

#[test]
fn member_access_on_scalar_errors() {
    let err = run_err("let n = 4; let v = n.field;");
    assert!(matches!(err, LuxError::Runtime(VmError::NotAnObject(_))));
}

#[test]
fn arity_mismatch_errors() {
    let err = run_err("func two(a, b) { return a; } two(1);");
    assert!(matches!(
        err,
        LuxError::Runtime(VmError::ArityError {
            expected: 2,
            got: 1
        })
    ));
}

#[test]
fn extra_argument_on_plain_function_is_discarded() {
    // The method-call allowance: a non-method called with one extra
    // argument sheds the top of stack (the would-be receiver).
    let vm = run("func id(a) { return a; } let r = id(1, 2);");
    assert_eq!(vm.global("r").unwrap().as_int(), Some(2));
}

#[test]
fn unary_operators_end_to_end() {
    let vm = run("let a = -5; let b = !0; let c = !1; let d = +7;");
    assert_eq!(vm.global("a").unwrap().as_int(), Some(-5));
    assert_eq!(vm.global("b").unwrap().as_bool(), Some(true));
    assert_eq!(vm.global("c").unwrap().as_bool(), Some(false));
    assert_eq!(vm.global("d").unwrap().as_int(), Some(7));
}

#[test]
fn forward_declaration_compiles_to_nothing() {
    let vm = run("func later(a); let x = 1;");
    assert_eq!(vm.global("x").unwrap().as_int(), Some(1));
    // The name was never bound.
    assert!(vm.global("later").is_none());
}

#[test]
fn function_without_return_yields_unit() {
    let vm = run("func noop() { let local = 1; } let u = noop();");
    assert!(vm.global("u").unwrap().is_unit());
}

#[test]
fn globals_are_writable_from_function_bodies() {
    let vm = run("let total = 0; func add(n) { total += n; return total; } add(4); let t = add(5);");
    assert_eq!(vm.global("t").unwrap().as_int(), Some(9));
    assert_eq!(vm.global("total").unwrap().as_int(), Some(9));
}

#[test]
fn locals_do_not_leak_out_of_functions() {
    let mut vm = Vm::new();
    vm.eval("func f() { let local_only = 3; return local_only; } f();")
        .unwrap();
    assert!(vm.global("local_only").is_none());
}
