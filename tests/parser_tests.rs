use codespan::Files;
use ts2cpp::ast;
use ts2cpp::lexer::Lexer;
use ts2cpp::parser::Parser;

fn parse(source: &str) -> Result<ast::Program, String> {
    let mut files = Files::new();
    let file_id = files.add("test", source.to_string());

    let lexer = Lexer::new(&files, file_id);
    let mut parser = Parser::new(lexer).map_err(|d| d.message)?;
    parser.parse_program().map_err(|d| d.message)
}

fn parse_single_expr(source: &str) -> ast::Expr {
    let program = parse(source).expect("parsing failed");
    assert_eq!(program.body.len(), 1);
    match program.body.into_iter().next().unwrap() {
        ast::Stmt::Expr(expr, _) => expr,
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_var_decl_with_and_without_init() {
    let program = parse("let x = 5; let y;").expect("parsing failed");

    assert_eq!(program.body.len(), 2);
    match &program.body[0] {
        ast::Stmt::VarDecl(decl) => {
            assert_eq!(decl.name, "x");
            assert!(matches!(decl.init, Some(ast::Expr::Int(5, _))));
        }
        other => panic!("expected var decl, got {:?}", other),
    }
    match &program.body[1] {
        ast::Stmt::VarDecl(decl) => {
            assert_eq!(decl.name, "y");
            assert!(decl.init.is_none());
        }
        other => panic!("expected var decl, got {:?}", other),
    }
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let expr = parse_single_expr("1 + 2 * 3;");

    match expr {
        ast::Expr::Binary(left, ast::BinOp::Add, right, _) => {
            assert!(matches!(*left, ast::Expr::Int(1, _)));
            assert!(matches!(*right, ast::Expr::Binary(_, ast::BinOp::Mul, _, _)));
        }
        other => panic!("expected addition at the root, got {:?}", other),
    }
}

#[test]
fn test_and_binds_tighter_than_or() {
    let expr = parse_single_expr("a || b && c;");

    match expr {
        ast::Expr::Logical(left, ast::LogicalOp::Or, right, _) => {
            assert!(matches!(*left, ast::Expr::Ident(..)));
            assert!(matches!(*right, ast::Expr::Logical(_, ast::LogicalOp::And, _, _)));
        }
        other => panic!("expected || at the root, got {:?}", other),
    }
}

#[test]
fn test_comparison_is_left_associative() {
    let expr = parse_single_expr("1 - 2 - 3;");

    match expr {
        ast::Expr::Binary(left, ast::BinOp::Sub, right, _) => {
            assert!(matches!(*left, ast::Expr::Binary(_, ast::BinOp::Sub, _, _)));
            assert!(matches!(*right, ast::Expr::Int(3, _)));
        }
        other => panic!("expected subtraction at the root, got {:?}", other),
    }
}

#[test]
fn test_assignment_is_right_associative() {
    let expr = parse_single_expr("a = b = 1;");

    match expr {
        ast::Expr::Assign(left, right, _) => {
            assert!(matches!(*left, ast::Expr::Ident(..)));
            assert!(matches!(*right, ast::Expr::Assign(..)));
        }
        other => panic!("expected assignment at the root, got {:?}", other),
    }
}

#[test]
fn test_invalid_assignment_target_is_rejected() {
    let message = parse("1 = 2;").expect_err("expected a parse error");
    assert!(
        message.contains("invalid assignment target"),
        "unexpected message: {}",
        message
    );
}

#[test]
fn test_unary_binds_tighter_than_postfix_call() {
    // The call wraps the negation, not the other way around.
    let expr = parse_single_expr("-a();");

    match expr {
        ast::Expr::Call { callee, .. } => {
            assert!(matches!(*callee, ast::Expr::Unary(ast::UnOp::Neg, _, _)));
        }
        other => panic!("expected call at the root, got {:?}", other),
    }
}

#[test]
fn test_member_chain_mixes_dot_and_index() {
    let expr = parse_single_expr("a.b[0];");

    match expr {
        ast::Expr::Member {
            object, computed, ..
        } => {
            assert!(computed);
            assert!(matches!(
                *object,
                ast::Expr::Member {
                    computed: false,
                    ..
                }
            ));
        }
        other => panic!("expected member at the root, got {:?}", other),
    }
}

#[test]
fn test_new_without_argument_list() {
    let expr = parse_single_expr("new Counter;");

    match expr {
        ast::Expr::New { callee, args, .. } => {
            assert!(matches!(*callee, ast::Expr::Ident(..)));
            assert!(args.is_empty());
        }
        other => panic!("expected new expression, got {:?}", other),
    }
}

#[test]
fn test_new_callee_does_not_swallow_arguments() {
    let expr = parse_single_expr("new Counter(1, 2);");

    match expr {
        ast::Expr::New { callee, args, .. } => {
            assert!(matches!(*callee, ast::Expr::Ident(..)));
            assert_eq!(args.len(), 2);
        }
        other => panic!("expected new expression, got {:?}", other),
    }
}

#[test]
fn test_else_if_chain() {
    let program = parse("if (a) { } else if (b) { } else { }").expect("parsing failed");

    let ast::Stmt::If(stmt) = &program.body[0] else {
        panic!("expected if statement");
    };
    let Some(ast::ElseBranch::ElseIf(else_if)) = stmt.alternate.as_deref() else {
        panic!("expected else-if branch");
    };
    assert!(matches!(
        else_if.alternate.as_deref(),
        Some(ast::ElseBranch::Else(_))
    ));
}

#[test]
fn test_for_with_let_init() {
    let program = parse("for (let i = 0; i < 5; i = i + 1) { }").expect("parsing failed");

    let ast::Stmt::For(stmt) = &program.body[0] else {
        panic!("expected for statement");
    };
    assert!(matches!(stmt.init, Some(ast::ForInit::VarDecl(_))));
    assert!(stmt.test.is_some());
    assert!(matches!(stmt.update, Some(ast::Expr::Assign(..))));
}

#[test]
fn test_for_with_all_clauses_empty() {
    let program = parse("for (;;) { }").expect("parsing failed");

    let ast::Stmt::For(stmt) = &program.body[0] else {
        panic!("expected for statement");
    };
    assert!(stmt.init.is_none());
    assert!(stmt.test.is_none());
    assert!(stmt.update.is_none());
}

#[test]
fn test_class_with_constructor_and_method() {
    let program = parse(
        "class Counter {
            constructor(initial) { this.count = initial; }
            increment() { return this.count; }
        }",
    )
    .expect("parsing failed");

    let ast::Stmt::Class(class) = &program.body[0] else {
        panic!("expected class declaration");
    };
    assert_eq!(class.name, "Counter");
    assert_eq!(class.body.len(), 2);
    assert_eq!(class.body[0].kind, ast::MethodKind::Constructor);
    assert_eq!(class.body[0].params, vec!["initial".to_string()]);
    assert_eq!(class.body[1].kind, ast::MethodKind::Method);
    assert_eq!(class.body[1].key, "increment");
}

#[test]
fn test_object_literal_keys() {
    let expr = parse_single_expr(r#"x = {name: 1, "with space": 2};"#);

    let ast::Expr::Assign(_, right, _) = expr else {
        panic!("expected assignment");
    };
    let ast::Expr::Object(properties, _) = *right else {
        panic!("expected object literal");
    };
    assert_eq!(properties[0].key.as_str(), "name");
    assert_eq!(properties[1].key.as_str(), "with space");
}

#[test]
fn test_first_parses_a_full_expression() {
    let program = parse("first 1 + 2;").expect("parsing failed");

    let ast::Stmt::Expr(ast::Expr::First(argument, _), _) = &program.body[0] else {
        panic!("expected first statement");
    };
    assert!(matches!(**argument, ast::Expr::Binary(..)));
}

#[test]
fn test_semicolons_are_optional_between_statements() {
    let program = parse("let a = 1\nlet b = 2").expect("parsing failed");
    assert_eq!(program.body.len(), 2);
}

#[test]
fn test_unexpected_token_is_reported() {
    let message = parse("let x = ;").expect_err("expected a parse error");
    assert!(
        message.contains("unexpected primary expression"),
        "unexpected message: {}",
        message
    );
}

#[test]
fn test_unclosed_block_is_reported() {
    assert!(parse("function f() { let x = 1;").is_err());
}
