//! Whole-program parse tests over representative Lux sources.

use lux_vm_parser::ast::{BinaryOp, Expr, Stmt, TypeMember};
use lux_vm_parser::{parse, ParseError};
use pretty_assertions::assert_eq;

#[test]
fn parses_arithmetic_program() {
    let program = parse("let a = 1 + 2 * (3 + 4);").unwrap();
    assert_eq!(program.statements.len(), 1);
}

#[test]
fn parses_while_loop_with_compound_assignment() {
    let program = parse("let i = 0; while (i < 5) { i += 1; }").unwrap();
    assert_eq!(program.statements.len(), 2);
    let Stmt::While { cond, body } = &program.statements[1] else {
        panic!("expected while");
    };
    assert!(matches!(cond, Expr::Binary { op: BinaryOp::Lt, .. }));
    let Stmt::Block(stmts) = body.as_ref() else {
        panic!("expected block body");
    };
    assert_eq!(stmts.len(), 1);
}

#[test]
fn parses_function_and_call() {
    let program = parse("func add(a, b) { return a + b; } let r = add(3, 4);").unwrap();
    assert_eq!(program.statements.len(), 2);
    let Stmt::Func { name, params, body } = &program.statements[0] else {
        panic!("expected function declaration");
    };
    assert_eq!(name, "add");
    assert_eq!(params, &["a".to_string(), "b".to_string()]);
    assert!(body.is_some());
    let Stmt::Let { init: Some(Expr::Call { args, .. }), .. } = &program.statements[1] else {
        panic!("expected call in initializer");
    };
    assert_eq!(args.len(), 2);
}

#[test]
fn parses_type_with_field_and_method() {
    let src = r#"
        type P {
            field x: Int;
            method get() {
                return self.x;
            }
        }
        let p = P { x = 9 };
        let v = p.get();
    "#;
    let program = parse(src).unwrap();
    assert_eq!(program.statements.len(), 3);

    let Stmt::TypeDecl { members, .. } = &program.statements[0] else {
        panic!("expected type declaration");
    };
    let TypeMember::Method { body, .. } = &members[1] else {
        panic!("expected method member");
    };
    assert!(matches!(&body[0], Stmt::Return { value: Some(Expr::Member { .. }) }));
}

#[test]
fn parses_module_with_function() {
    let program = parse("mod M { func f() { return 42; } } let r = M.f();").unwrap();
    let Stmt::Let { init: Some(Expr::MethodCall { object, method, args }), .. } =
        &program.statements[1]
    else {
        panic!("expected module method call");
    };
    assert!(matches!(object.as_ref(), Expr::Ident(n) if n == "M"));
    assert_eq!(method, "f");
    assert!(args.is_empty());
}

#[test]
fn parses_comments_everywhere() {
    let src = r#"
        // leading comment
        let a = 1; /* inline */ let b = 2;
        /* multi
           line */
        let c = a + b;
    "#;
    let program = parse(src).unwrap();
    assert_eq!(program.statements.len(), 3);
}

#[test]
fn reports_unknown_escape_with_position() {
    let err = parse("let s = \"oops \\x\";").unwrap_err();
    let ParseError::InvalidEscape { sequence, span } = err else {
        panic!("expected invalid escape, got {err:?}");
    };
    assert_eq!(sequence, 'x');
    assert_eq!(span.start_line, 1);
}

#[test]
fn reports_unexpected_token_in_type_body() {
    let err = parse("type T { let x = 1; }").unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedToken { .. }));
}

#[test]
fn rejects_unbalanced_parens() {
    assert!(parse("let a = (1 + 2;").is_err());
}

#[test]
fn serializes_ast_to_json() {
    let program = parse("let a = 1;").unwrap();
    let json = serde_json::to_string(&program).unwrap();
    let back: lux_vm_parser::Program = serde_json::from_str(&json).unwrap();
    assert_eq!(program, back);
}
