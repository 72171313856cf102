#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::{BufRead, Cursor, Write};
    use std::rc::Rc;

    use zlox::error::{LoxError, Result};
    use zlox::interpreter::Interpreter;
    use zlox::parser::Parser;
    use zlox::scanner::Scanner;
    use zlox::token::Token;

    /// Runs `source` with `input` available to `input()`, capturing
    /// everything `print` writes.
    fn run_source(source: &str, input: &str) -> (String, Result<()>) {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .collect::<Result<Vec<Token>>>()
            .expect("scan should succeed");

        let statements = Parser::new(&tokens).parse().expect("parse should succeed");

        let sink: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let sink_handle: Rc<RefCell<dyn Write>> = Rc::clone(&sink);

        let reader: Rc<RefCell<dyn BufRead>> =
            Rc::new(RefCell::new(Cursor::new(input.as_bytes().to_vec())));

        let mut interpreter = Interpreter::new(sink_handle, reader);

        let result = interpreter.interpret(&statements);

        let output = String::from_utf8(sink.borrow().clone()).expect("output is UTF-8");

        (output, result)
    }

    fn assert_prints(source: &str, expected: &[&str]) {
        let (output, result) = run_source(source, "");

        assert!(result.is_ok(), "unexpected error: {:?}", result.err());

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines, expected);
    }

    fn run_error(source: &str) -> LoxError {
        let (_, result) = run_source(source, "");

        result.expect_err("expected a runtime error")
    }

    // ───────────────────── arithmetic and display ─────────────────────

    #[test]
    fn test_arithmetic_precedence() {
        assert_prints("print(1 + 2 * 3);", &["7"]);
        assert_prints("print((1 + 2) * 3);", &["9"]);
    }

    #[test]
    fn test_number_display_integral_and_fractional() {
        assert_prints("print(4 / 2);", &["2"]);
        assert_prints("print(5 / 2);", &["2.5"]);
        assert_prints("print(-0.5 + 0.25);", &["-0.25"]);
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_prints("print(1 / 0);", &["inf"]);
        assert_prints("print(-1 / 0);", &["-inf"]);
        assert_prints("print(0 / 0);", &["NaN"]);
    }

    #[test]
    fn test_string_concatenation() {
        assert_prints("print('foo' + \"bar\");", &["foobar"]);
    }

    #[test]
    fn test_unary_negation_and_not() {
        assert_prints("print(-(1 + 2));", &["-3"]);
        assert_prints("print(!nil);", &["true"]);
        assert_prints("print(!0);", &["false"]);
    }

    // ───────────────────────── type errors ────────────────────────────

    #[test]
    fn test_adding_number_and_string_is_a_type_error() {
        let err = run_error("print(1 + 'x');");

        assert!(matches!(err, LoxError::Type { .. }));
        assert!(
            err.to_string()
                .contains("Unsupported operand types for '+': number and string"),
            "unexpected message: {}",
            err
        );
    }

    #[test]
    fn test_negating_a_string_is_a_type_error() {
        let err = run_error("print(-'x');");

        assert!(err.to_string().contains("Operand must be a number, got string."));
    }

    #[test]
    fn test_comparing_mixed_types_is_a_type_error() {
        let err = run_error("print(1 < 'a');");

        assert!(matches!(err, LoxError::Type { .. }));
    }

    // ─────────────────── truthiness and equality ──────────────────────

    #[test]
    fn test_only_nil_and_false_are_falsy() {
        let source = "\
            if (0) print('zero'); else print('no');\n\
            if ('') print('empty'); else print('no');\n\
            if (nil) print('nil'); else print('no');\n\
            if (false) print('f'); else print('no');\n";

        assert_prints(source, &["zero", "empty", "no", "no"]);
    }

    #[test]
    fn test_equality_never_coerces() {
        assert_prints("print(1 == '1');", &["false"]);
        assert_prints("print(nil == nil);", &["true"]);
        assert_prints("print(1 == 1);", &["true"]);
        assert_prints("print('a' != 'b');", &["true"]);
        assert_prints("print(true == 1);", &["false"]);
    }

    #[test]
    fn test_logical_operators_yield_operand_values() {
        assert_prints("print(nil or 'fallback');", &["fallback"]);
        assert_prints("print('first' or 'second');", &["first"]);
        assert_prints("print(0 and 1);", &["1"]);
        assert_prints("print(false and 'x');", &["false"]);
    }

    #[test]
    fn test_logical_operators_short_circuit() {
        // The right operand would be a runtime error if evaluated.
        assert_prints("print(true or missing);", &["true"]);
        assert_prints("print(false and missing);", &["false"]);
    }

    // ─────────────────── variables and scoping ────────────────────────

    #[test]
    fn test_var_without_initializer_is_nil() {
        assert_prints("var x; print(x);", &["nil"]);
    }

    #[test]
    fn test_assignment_is_an_expression() {
        assert_prints(
            "var a = 1; var b = 2; a = b = 3; print(a); print(b);",
            &["3", "3"],
        );
    }

    #[test]
    fn test_inner_scope_shadows_then_outer_survives() {
        let source = "\
            var x = 1;\n\
            {\n\
                var x = 2;\n\
                print(x);\n\
            }\n\
            print(x);\n";

        assert_prints(source, &["2", "1"]);
    }

    #[test]
    fn test_assignment_reaches_enclosing_scope() {
        assert_prints("var x = 1; { x = 2; } print(x);", &["2"]);
    }

    #[test]
    fn test_redefinition_in_same_scope_is_an_error() {
        let err = run_error("var x = 1; var x = 2;");

        assert!(matches!(err, LoxError::Redefinition { .. }));
        assert!(err.to_string().contains("'x' is already defined"));
    }

    #[test]
    fn test_redefining_a_native_is_an_error() {
        let err = run_error("var clock = 1;");

        assert!(matches!(err, LoxError::Redefinition { .. }));
    }

    #[test]
    fn test_reading_undefined_variable_is_an_error() {
        let err = run_error("print(missing);");

        assert!(matches!(err, LoxError::UndefinedVariable { .. }));
        assert!(err.to_string().contains("Undefined variable 'missing'."));
    }

    #[test]
    fn test_assigning_undefined_variable_is_an_error() {
        let err = run_error("missing = 1;");

        assert!(matches!(err, LoxError::UndefinedVariable { .. }));
    }

    // ─────────────────── functions and closures ───────────────────────

    #[test]
    fn test_function_call_returns_value() {
        assert_prints("fun add(a, b) { return a + b; } print(add(1, 2));", &["3"]);
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_prints("fun noop() {} print(noop());", &["nil"]);
    }

    #[test]
    fn test_return_unwinds_nested_blocks_and_loops() {
        let source = "\
            fun f() {\n\
                var i = 0;\n\
                while (true) {\n\
                    if (i > 1) { return i; }\n\
                    i = i + 1;\n\
                }\n\
            }\n\
            print(f());\n";

        assert_prints(source, &["2"]);
    }

    #[test]
    fn test_locals_do_not_leak_after_return() {
        let source = "\
            fun f() {\n\
                var local = 1;\n\
                return local;\n\
            }\n\
            f();\n\
            print(local);\n";

        let (_, result) = run_source(source, "");
        let err = result.expect_err("local should be gone after the call");

        assert!(matches!(err, LoxError::UndefinedVariable { .. }));
    }

    #[test]
    fn test_closure_counter_keeps_state() {
        let source = "\
            fun make_counter() {\n\
                var count = 0;\n\
                fun increment() {\n\
                    count = count + 1;\n\
                    return count;\n\
                }\n\
                return increment;\n\
            }\n\
            var counter = make_counter();\n\
            print(counter());\n\
            print(counter());\n\
            print(counter());\n";

        assert_prints(source, &["1", "2", "3"]);
    }

    #[test]
    fn test_two_counters_are_independent() {
        let source = "\
            fun make_counter() {\n\
                var count = 0;\n\
                fun increment() {\n\
                    count = count + 1;\n\
                    return count;\n\
                }\n\
                return increment;\n\
            }\n\
            var a = make_counter();\n\
            var b = make_counter();\n\
            print(a());\n\
            print(a());\n\
            print(b());\n";

        assert_prints(source, &["1", "2", "1"]);
    }

    #[test]
    fn test_recursive_fibonacci() {
        let source = "\
            fun fib(n) {\n\
                if (n < 2) { return n; }\n\
                return fib(n - 1) + fib(n - 2);\n\
            }\n\
            print(fib(10));\n";

        assert_prints(source, &["55"]);
    }

    #[test]
    fn test_unbounded_recursion_overflows() {
        let err = run_error("fun f() { f(); } f();");

        assert!(matches!(err, LoxError::StackOverflow { .. }));
        assert_eq!(err.to_string(), "Stack overflow.");
    }

    #[test]
    fn test_arity_mismatch_is_an_error() {
        let err = run_error("fun g(a, b) { return a; } g(1);");

        match err {
            LoxError::Arity { expected, got, .. } => {
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            other => panic!("expected an arity error, got {:?}", other),
        }
    }

    #[test]
    fn test_calling_a_number_is_a_type_error() {
        let err = run_error("var x = 5; x();");

        assert!(err.to_string().contains("Can only call functions, got number."));
    }

    #[test]
    fn test_arguments_evaluate_left_to_right() {
        let source = "\
            var trace = '';\n\
            fun log(label) {\n\
                trace = trace + label;\n\
                return label;\n\
            }\n\
            fun pair(a, b) { return trace; }\n\
            print(pair(log('a'), log('b')));\n";

        assert_prints(source, &["ab"]);
    }

    #[test]
    fn test_function_values_print_by_name() {
        assert_prints("fun f() {} print(f);", &["<fn f>"]);
        assert_prints("print(clock);", &["<native fn clock>"]);
    }

    // ───────────────────────── control flow ───────────────────────────

    #[test]
    fn test_while_loop_counts() {
        let source = "\
            var i = 0;\n\
            while (i < 3) {\n\
                print(i);\n\
                i = i + 1;\n\
            }\n";

        assert_prints(source, &["0", "1", "2"]);
    }

    #[test]
    fn test_false_while_condition_never_runs_body() {
        assert_prints("while (false) print('no'); print('done');", &["done"]);
    }

    #[test]
    fn test_for_loop_matches_equivalent_while() {
        let for_source = "for (var i = 0; i < 3; i = i + 1) print(i);";
        let while_source = "\
            {\n\
                var i = 0;\n\
                while (i < 3) {\n\
                    print(i);\n\
                    i = i + 1;\n\
                }\n\
            }\n";

        let (for_output, for_result) = run_source(for_source, "");
        let (while_output, while_result) = run_source(while_source, "");

        assert!(for_result.is_ok());
        assert!(while_result.is_ok());
        assert_eq!(for_output, while_output);
        assert_eq!(for_output, "0\n1\n2\n");
    }

    #[test]
    fn test_for_increment_runs_after_body() {
        assert_prints("for (var i = 0; i < 2; i = i + 1) { print(i * 10); }", &["0", "10"]);
    }

    #[test]
    fn test_top_level_return_stops_quietly() {
        assert_prints("print(1); return; print(2);", &["1"]);
    }

    // ─────────────────────────── builtins ─────────────────────────────

    #[test]
    fn test_clock_yields_a_positive_number() {
        assert_prints("print(clock() > 0);", &["true"]);
    }

    #[test]
    fn test_input_reads_one_line() {
        let (output, result) = run_source("print(input());", "hello\n");

        assert!(result.is_ok());
        assert_eq!(output, "hello\n");
    }

    #[test]
    fn test_input_consumes_lines_in_order() {
        let (output, result) = run_source("print(input()); print(input());", "one\ntwo\n");

        assert!(result.is_ok());
        assert_eq!(output, "one\ntwo\n");
    }

    #[test]
    fn test_input_at_eof_yields_nil() {
        let (output, result) = run_source("print(input());", "");

        assert!(result.is_ok());
        assert_eq!(output, "nil\n");
    }

    #[test]
    fn test_input_strips_carriage_return() {
        let (output, result) = run_source("print(input());", "abc\r\n");

        assert!(result.is_ok());
        assert_eq!(output, "abc\n");
    }

    #[test]
    fn test_flush_yields_nil() {
        assert_prints("print(flush());", &["nil"]);
    }

    // ─────────────────── interactive-session flow ─────────────────────

    #[test]
    fn test_interpreter_state_survives_a_caught_error() {
        // One interpreter, several inputs, the way the interactive session
        // drives it: a fresh scanner and parser per line, shared globals.
        let sink: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
        let sink_handle: Rc<RefCell<dyn Write>> = Rc::clone(&sink);
        let reader: Rc<RefCell<dyn BufRead>> =
            Rc::new(RefCell::new(Cursor::new(Vec::new())));

        let mut interpreter = Interpreter::new(sink_handle, reader);

        let mut feed = |source: &str| -> Result<()> {
            let tokens: Vec<Token> = Scanner::new(source.as_bytes())
                .collect::<Result<Vec<Token>>>()
                .expect("scan should succeed");

            let statements = Parser::new(&tokens).parse().expect("parse should succeed");

            interpreter.interpret(&statements)
        };

        feed("var x = 1;").expect("declaration should succeed");

        // Side effects before the error stand; the error does not poison
        // the globals.
        assert!(feed("print(9); print(missing);").is_err());
        feed("x = x + 1; print(x);").expect("globals should survive the error");

        // The failed block's scope was discarded on the way out.
        assert!(feed("{ var y = 5; print(missing); }").is_err());
        feed("var y = 7; print(y);").expect("block scope should not leak");

        let output = String::from_utf8(sink.borrow().clone()).expect("output is UTF-8");
        assert_eq!(output, "9\n2\n7\n");
    }
}
