use ts2cpp::compiler::{compile, ERROR_MARKER};

fn compile_ok(source: &str) -> String {
    let output = compile(source);
    assert!(
        !output.starts_with(ERROR_MARKER),
        "compilation failed: {}",
        output
    );
    output
}

#[test]
fn test_let_becomes_auto() {
    let output = compile_ok("let x = 5;");

    assert!(output.contains("auto x = 5;"));
    assert!(output.contains("int main() {"));
    assert!(output.contains("return 0;"));
}

#[test]
fn test_let_without_initializer_defaults_to_zero() {
    let output = compile_ok("let x;");
    assert!(output.contains("auto x = 0;"));
}

#[test]
fn test_program_without_features_needs_no_includes() {
    let output = compile_ok("let x = 5;");
    assert!(!output.contains("#include"));
}

#[test]
fn test_console_log_lowers_to_print_any() {
    let output = compile_ok("console.log(42);");

    assert!(output.contains("print_any(42);"));
    assert!(output.contains("void print_any(const std::any& value)"));
    assert!(output.contains("#include <any>"));
    assert!(output.contains("#include <iostream>"));
    assert!(output.contains("std::cout << std::endl;"));
}

#[test]
fn test_console_log_with_multiple_arguments() {
    let output = compile_ok("console.log(1, 2);");

    let print_one = output.find("print_any(1);").unwrap();
    let separator = output.find(r#"std::cout << " ";"#).unwrap();
    let print_two = output.find("print_any(2);").unwrap();
    assert!(print_one < separator && separator < print_two);
}

#[test]
fn test_if_condition_is_parenthesized() {
    let output = compile_ok("let x = 1; if (x > 0) { console.log(x); }");
    assert!(output.contains("if ((x > 0))"));
}

#[test]
fn test_else_if_chain_emission() {
    let output = compile_ok("let x = 1; if (x > 1) { } else if (x > 0) { } else { }");

    assert!(output.contains("if ((x > 1))"));
    assert!(output.contains("else"));
    assert!(output.contains("if ((x > 0))"));
}

#[test]
fn test_while_loop() {
    let output = compile_ok("let i = 0; while (i < 5) { i = i + 1; }");

    assert!(output.contains("while ((i < 5))"));
    assert!(output.contains("(i = (i + 1));"));
}

#[test]
fn test_for_loop_counter_is_an_int() {
    let output = compile_ok("for (let i = 0; i < 5; i = i + 1) { console.log(i); }");
    assert!(output.contains("for (int i = 0; (i < 5); (i = (i + 1)))"));
}

#[test]
fn test_function_params_and_return_are_int() {
    let output = compile_ok("function add(a, b) { return a + b; } add(1, 2);");

    assert!(output.contains("int add(int a, int b)"));
    assert!(output.contains("return (a + b);"));
    // The definition is hoisted out of main; the call stays in it.
    let definition = output.find("int add(").unwrap();
    let main_start = output.find("int main()").unwrap();
    assert!(definition < main_start);
    assert!(output.contains("add(1, 2);"));
}

#[test]
fn test_bare_return_yields_zero() {
    let output = compile_ok("function f() { return; }");
    assert!(output.contains("return 0;"));
}

#[test]
fn test_string_literal_lowering() {
    let output = compile_ok(r#"let s = "hello";"#);

    assert!(output.contains(r#"auto s = std::string("hello");"#));
    assert!(output.contains("#include <string>"));
}

#[test]
fn test_string_escaping() {
    let output = compile_ok(r#"let s = "a\b";"#);
    assert!(output.contains(r#"std::string("a\\b")"#));
}

#[test]
fn test_array_literal_lowering() {
    let output = compile_ok("let a = [1, 2, 3];");

    assert!(output.contains("auto a = std::vector<std::any>{1, 2, 3};"));
    assert!(output.contains("#include <vector>"));
    assert!(output.contains("#include <any>"));
}

#[test]
fn test_object_literal_lowering() {
    let output = compile_ok(r#"let obj = {key: "value"};"#);

    assert!(output
        .contains(r#"auto obj = std::map<std::string, std::any>{{"key", std::string("value")}};"#));
    assert!(output.contains("#include <map>"));
    assert!(output.contains("#include <string>"));
}

#[test]
fn test_dot_access_on_plain_value_is_map_sugar() {
    let output = compile_ok(r#"let obj = {key: 1}; console.log(obj.key);"#);

    assert!(output.contains(r#"std::any_cast<std::map<std::string, std::any>&>(obj)["key"]"#));
}

#[test]
fn test_computed_member_is_plain_indexing() {
    let output = compile_ok("let a = [1]; console.log(a[0]);");
    assert!(output.contains("print_any(a[0]);"));
}

#[test]
fn test_class_lowering() {
    let output = compile_ok(
        "class Counter {
            constructor(initial) { this.count = initial; }
            increment() { this.count = this.count + 1; return this.count; }
        }
        let c = new Counter(0);
        c.increment();",
    );

    assert!(output.contains("struct Counter;"));
    assert!(output.contains("struct Counter {"));
    assert!(output.contains("std::any count;"));
    assert!(output.contains("Counter(std::any initial)"));
    assert!(output.contains("(this->count = initial);"));
    assert!(output.contains("std::any increment()"));
    assert!(output.contains("auto c = std::make_shared<Counter>(0);"));
    assert!(output.contains("c->increment();"));
    assert!(output.contains("#include <memory>"));
}

#[test]
fn test_class_fields_found_anywhere_in_constructor() {
    let output = compile_ok(
        "class Pair {
            constructor(flag) {
                if (flag) { this.left = 1; } else { this.right = 2; }
            }
        }",
    );

    let left = output.find("std::any left;").unwrap();
    let right = output.find("std::any right;").unwrap();
    assert!(left < right);
}

#[test]
fn test_method_without_trailing_return_gets_one() {
    let output = compile_ok(
        "class Logger {
            constructor() { this.n = 0; }
            bump() { this.n = this.n + 1; }
        }",
    );

    assert!(output.contains("return std::any{};"));
}

#[test]
fn test_new_without_arguments() {
    let output = compile_ok("class A { } let a = new A;");
    assert!(output.contains("auto a = std::make_shared<A>();"));
}

#[test]
fn test_first_statement_prints_value_and_type() {
    let output = compile_ok("first 1 + 2;");

    assert!(output.contains("auto tmp0 = (1 + 2);"));
    assert!(output
        .contains(r#"std::cout << tmp0 << " (type: " << typeid(tmp0).name() << ")" << std::endl;"#));
    assert!(output.contains("#include <typeinfo>"));
    assert!(output.contains("#include <iostream>"));
}

#[test]
fn test_first_temporaries_count_up() {
    let output = compile_ok("first 1; first 2;");

    assert!(output.contains("auto tmp0 = 1;"));
    assert!(output.contains("auto tmp1 = 2;"));
}

#[test]
fn test_output_is_deterministic() {
    let source = "first 1; let x = [1]; console.log(x); first 2;";
    assert_eq!(compile(source), compile(source));
}

#[test]
fn test_redeclared_let_is_dropped_with_its_initializer() {
    let output = compile_ok("let x = 1; let x = sideEffect();");

    assert!(output.contains("auto x = 1;"));
    // The whole second declaration vanishes, call included.
    assert!(!output.contains("sideEffect"));
}

#[test]
fn test_function_body_declarations_do_not_shadow_main() {
    let output = compile_ok("function f() { let x = 1; } let x = 2;");

    assert!(output.contains("auto x = 1;"));
    assert!(output.contains("auto x = 2;"));
}

#[test]
fn test_parse_error_is_reported_with_position() {
    let output = compile("let x = ;");

    assert!(output.starts_with(ERROR_MARKER));
    assert!(output.contains("at 1:"), "missing position: {}", output);
}

#[test]
fn test_lex_error_is_reported_not_panicked() {
    let output = compile("a & b");

    assert!(output.starts_with(ERROR_MARKER));
    assert!(output.contains("unexpected character '&'"));
}

#[test]
fn test_bare_this_in_expression_position_is_unsupported() {
    let output = compile("console.log(this);");

    assert!(output.starts_with(ERROR_MARKER));
    assert!(output.contains("unsupported expression: ThisExpression"));
}

#[test]
fn test_nested_first_is_unsupported() {
    let output = compile("let x = first 1;");

    assert!(output.starts_with(ERROR_MARKER));
    assert!(output.contains("unsupported expression: FirstExpression"));
}

#[test]
fn test_includes_are_sorted_and_precede_everything() {
    let output = compile_ok(r#"let s = "x"; console.log([s]);"#);

    let lines: Vec<&str> = output.lines().collect();
    let includes: Vec<&str> = lines
        .iter()
        .take_while(|l| l.starts_with("#include"))
        .copied()
        .collect();
    assert!(!includes.is_empty());
    let mut sorted = includes.clone();
    sorted.sort();
    assert_eq!(includes, sorted);
    assert!(output.starts_with("#include"));
}

#[test]
fn test_using_namespace_precedes_main() {
    let output = compile_ok("let x = 1;");

    let using = output.find("using namespace std;").unwrap();
    let main_start = output.find("int main()").unwrap();
    assert!(using < main_start);
}
