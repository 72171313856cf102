#[cfg(test)]
mod parser_tests {
    use zlox::ast::Stmt;
    use zlox::ast_printer::AstPrinter;
    use zlox::error::{LoxError, Result};
    use zlox::parser::Parser;
    use zlox::scanner::Scanner;
    use zlox::token::Token;

    fn parse_program(source: &str) -> Result<Vec<Stmt>> {
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .collect::<Result<Vec<Token>>>()
            .expect("scan should succeed");

        Parser::new(&tokens).parse()
    }

    fn printed(source: &str) -> String {
        let statements = parse_program(source).expect("parse should succeed");

        AstPrinter::print_program(&statements)
    }

    fn parse_error(source: &str) -> LoxError {
        parse_program(source).expect_err("expected a parse error")
    }

    #[test]
    fn test_parser_multiplication_binds_tighter_than_addition() {
        assert_eq!(printed("1 + 2 * 3;"), "(expr (+ 1.0 (* 2.0 3.0)))");
    }

    #[test]
    fn test_parser_grouping_overrides_precedence() {
        assert_eq!(printed("(1 + 2) * 3;"), "(expr (* (group (+ 1.0 2.0)) 3.0))");
    }

    #[test]
    fn test_parser_unary_operators_nest() {
        assert_eq!(printed("--1;"), "(expr (- (- 1.0)))");
        assert_eq!(printed("!!true;"), "(expr (! (! true)))");
    }

    #[test]
    fn test_parser_comparison_binds_tighter_than_equality() {
        assert_eq!(printed("1 < 2 == true;"), "(expr (== (< 1.0 2.0) true))");
    }

    #[test]
    fn test_parser_and_binds_tighter_than_or() {
        assert_eq!(printed("a or b and c;"), "(expr (or a (and b c)))");
    }

    #[test]
    fn test_parser_assignment_is_right_associative() {
        assert_eq!(printed("a = b = 1;"), "(expr (= a (= b 1.0)))");
    }

    #[test]
    fn test_parser_assignment_to_literal_is_rejected() {
        let err = parse_error("1 = 2;");

        assert!(matches!(err, LoxError::Parse { .. }));
        assert!(err.to_string().contains("Invalid assignment target"));
    }

    #[test]
    fn test_parser_assignment_to_call_is_rejected() {
        let err = parse_error("f() = 2;");

        assert!(err.to_string().contains("Invalid assignment target"));
    }

    #[test]
    fn test_parser_print_requires_parentheses() {
        let err = parse_error("print 1;");

        assert!(err.to_string().contains("Expected '(' after 'print'"));
    }

    #[test]
    fn test_parser_print_statement_shape() {
        assert_eq!(printed("print(1 + 2);"), "(print (+ 1.0 2.0))");
    }

    #[test]
    fn test_parser_var_declaration_shapes() {
        assert_eq!(printed("var x = 5;"), "(var x = 5.0)");
        assert_eq!(printed("var y;"), "(var y)");
    }

    #[test]
    fn test_parser_if_else_shape() {
        assert_eq!(
            printed("if (x > 0) print(x); else print(0);"),
            "(if (> x 0.0) (print x) (print 0.0))"
        );
    }

    #[test]
    fn test_parser_while_shape() {
        assert_eq!(
            printed("while (x) x = x - 1;"),
            "(while x (expr (= x (- x 1.0))))"
        );
    }

    #[test]
    fn test_parser_for_desugars_to_block_and_while() {
        assert_eq!(
            printed("for (var i = 0; i < 3; i = i + 1) print(i);"),
            "(block (var i = 0.0) (while (< i 3.0) (block (print i) (expr (= i (+ i 1.0))))))"
        );
    }

    #[test]
    fn test_parser_for_without_clauses_is_a_bare_while_true() {
        assert_eq!(printed("for (;;) print(1);"), "(while true (print 1.0))");
    }

    #[test]
    fn test_parser_for_with_expression_initializer() {
        assert_eq!(
            printed("for (i = 0; i < 1;) print(i);"),
            "(block (expr (= i 0.0)) (while (< i 1.0) (print i)))"
        );
    }

    #[test]
    fn test_parser_function_declaration_shape() {
        assert_eq!(
            printed("fun add(a, b) { return a + b; }"),
            "(fun add (a b) (return (+ a b)))"
        );
    }

    #[test]
    fn test_parser_function_without_parameters() {
        assert_eq!(printed("fun ping() { print('pong'); }"), "(fun ping () (print pong))");
    }

    #[test]
    fn test_parser_return_without_value() {
        assert_eq!(printed("fun f() { return; }"), "(fun f () (return))");
    }

    #[test]
    fn test_parser_calls_chain_left_to_right() {
        assert_eq!(printed("f(1)(2);"), "(expr (call (call f 1.0) 2.0))");
    }

    #[test]
    fn test_parser_call_with_no_arguments() {
        assert_eq!(printed("clock();"), "(expr (call clock))");
    }

    #[test]
    fn test_parser_string_literals_from_both_quote_styles() {
        assert_eq!(printed("'a' + \"b\";"), "(expr (+ a b))");
    }

    #[test]
    fn test_parser_missing_semicolon_is_an_error() {
        let err = parse_error("1 + 2");

        assert!(err.to_string().contains("Expected ';' after expression"));
    }

    #[test]
    fn test_parser_first_error_aborts() {
        // The bad initializer fails immediately; the well-formed statement
        // after it is never reached.
        let err = parse_error("var x = ; print(1);");

        assert!(err.to_string().contains("Expected expression"));
    }

    #[test]
    fn test_parser_class_keyword_is_not_supported() {
        let err = parse_error("class Foo {}");

        assert!(err.to_string().contains("Expected expression"));
    }

    #[test]
    fn test_parser_error_carries_token_offset() {
        let err = parse_error("var x = ;");

        // The diagnostic points at the unexpected ';'.
        assert_eq!(err.offset(), Some(8));
    }

    #[test]
    fn test_parser_block_shape() {
        assert_eq!(
            printed("{ var a = 1; print(a); }"),
            "(block (var a = 1.0) (print a))"
        );
    }
}
