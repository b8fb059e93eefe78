//! Formula compiler
//!
//! A recursive descent parser that turns a token stream into an [`Expr`]
//! tree. Function names are resolved here, so evaluation never looks a
//! name up again.
//!
//! Both the parser nesting and the height of the produced tree are capped at
//! [`MAX_DEPTH`], so evaluating or dropping a compiled formula never runs
//! out of stack.

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::CompiledFormula;
use crate::expr::{BinaryOperator, Expr};
use crate::functions::Function;
use crate::lexer::{tokenize, Token, TokenKind};
use crate::options::EngineOptions;
use rowcalc_core::number::leading_float;

/// Maximum nesting of parentheses, calls and unary minus, and maximum
/// height of a compiled expression tree
pub const MAX_DEPTH: usize = 256;

/// Compile formula text with default options
///
/// # Example
/// ```rust
/// use rowcalc_formula::{compile_formula, Expr};
///
/// let formula = compile_formula("2 + 3 * 4").unwrap();
/// assert!(matches!(formula.root(), Expr::Binary { .. }));
/// assert!(compile_formula("SI([Age] > 18, 'Majeur', 'Mineur')").is_ok());
/// assert!(compile_formula("1 +").is_err());
/// ```
pub fn compile_formula(formula: &str) -> FormulaResult<CompiledFormula> {
    let tokens = tokenize(formula)?;
    compile(&tokens, &EngineOptions::default())
}

/// Compile a token stream produced by [`tokenize`]
pub fn compile(tokens: &[Token], options: &EngineOptions) -> FormulaResult<CompiledFormula> {
    let mut parser = Parser::new(tokens, options.strict_functions);
    if parser.current_token().kind == TokenKind::Eof {
        return Err(FormulaError::Parse("Empty formula".into()));
    }

    let (root, _) = parser.parse_expression()?;

    // Stray closing parens after a complete expression are ignored
    while parser.current_token().kind == TokenKind::RParen {
        parser.consume();
    }
    if parser.current_token().kind != TokenKind::Eof {
        return Err(FormulaError::Parse(format!(
            "Unexpected trailing token: {}",
            parser.current_token()
        )));
    }

    Ok(CompiledFormula::new(root))
}

/// A parsed subtree and its height
type Node = (Expr, usize);

fn too_deep() -> FormulaError {
    FormulaError::Parse("formula nested too deeply".into())
}

/// Height check for a node built on top of subtrees of height `below`
fn checked_height(below: usize) -> FormulaResult<usize> {
    let height = below + 1;
    if height > MAX_DEPTH {
        Err(too_deep())
    } else {
        Ok(height)
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    eof: Token,
    strict_functions: bool,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], strict_functions: bool) -> Self {
        Self {
            tokens,
            pos: 0,
            eof: Token::eof(),
            strict_functions,
            depth: 0,
        }
    }

    fn current_token(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn consume(&mut self) -> Token {
        let token = self.current_token().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Enter one level of nesting; pair with [`leave`](Self::leave)
    fn enter(&mut self) -> FormulaResult<()> {
        if self.depth >= MAX_DEPTH {
            return Err(too_deep());
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Consume a closing paren, tolerating its absence at end of input
    fn expect_closing_paren(&mut self) -> FormulaResult<()> {
        match self.current_token().kind {
            TokenKind::RParen => {
                self.consume();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            _ => Err(FormulaError::Parse(format!(
                "Expected ')', got {}",
                self.current_token()
            ))),
        }
    }

    // === Expression parsing with precedence ===
    // Precedence (lowest to highest):
    // 1. Expression: +, -, >, <, >=, <=, =, <> (one level, left to right)
    // 2. Term: *, /
    // 3. Factor: literals, fields, function calls, parentheses, unary minus

    fn parse_expression(&mut self) -> FormulaResult<Node> {
        self.enter()?;
        let mut left = self.parse_term()?;

        loop {
            let op = match self.binary_operator() {
                Some(
                    op @ (BinaryOperator::Add
                    | BinaryOperator::Subtract
                    | BinaryOperator::Equal
                    | BinaryOperator::NotEqual
                    | BinaryOperator::LessThan
                    | BinaryOperator::LessEqual
                    | BinaryOperator::GreaterThan
                    | BinaryOperator::GreaterEqual),
                ) => op,
                _ => break,
            };

            self.consume();
            let right = self.parse_term()?;
            left = join(op, left, right)?;
        }

        self.leave();
        Ok(left)
    }

    fn parse_term(&mut self) -> FormulaResult<Node> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.binary_operator() {
                Some(op @ (BinaryOperator::Multiply | BinaryOperator::Divide)) => op,
                _ => break,
            };

            self.consume();
            let right = self.parse_factor()?;
            left = join(op, left, right)?;
        }

        Ok(left)
    }

    fn binary_operator(&self) -> Option<BinaryOperator> {
        let token = self.current_token();
        if token.kind != TokenKind::Operator {
            return None;
        }
        BinaryOperator::from_symbol(&token.text)
    }

    fn parse_factor(&mut self) -> FormulaResult<Node> {
        let token = self.current_token().clone();
        match token.kind {
            TokenKind::Number => {
                self.consume();
                Ok((Expr::Number(leading_float(&token.text).unwrap_or(0.0)), 1))
            }

            TokenKind::String => {
                self.consume();
                Ok((Expr::Text(token.text), 1))
            }

            TokenKind::Field => {
                self.consume();
                Ok((Expr::Field(token.text), 1))
            }

            TokenKind::Identifier => {
                self.consume();
                self.parse_function_call(token.text)
            }

            TokenKind::LParen => {
                self.consume();
                let node = self.parse_expression()?;
                self.expect_closing_paren()?;
                Ok(node)
            }

            TokenKind::Operator if token.text == "-" => {
                self.consume();
                self.enter()?;
                let (operand, height) = self.parse_factor()?;
                self.leave();
                Ok((Expr::Negate(Box::new(operand)), checked_height(height)?))
            }

            _ => Err(FormulaError::Parse(format!("Unexpected token: {}", token))),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<Node> {
        // A bare identifier is the constant 0
        if self.current_token().kind != TokenKind::LParen {
            return Ok((Expr::Number(0.0), 1));
        }
        self.consume();

        let mut args = Vec::new();
        let mut tallest = 0;
        if !matches!(
            self.current_token().kind,
            TokenKind::RParen | TokenKind::Eof
        ) {
            let (arg, height) = self.parse_expression()?;
            args.push(arg);
            tallest = height;

            while self.current_token().kind == TokenKind::Comma {
                self.consume();
                let (arg, height) = self.parse_expression()?;
                args.push(arg);
                tallest = tallest.max(height);
            }
        }

        self.expect_closing_paren()?;

        match Function::lookup(&name) {
            Some(function) => Ok((Expr::Call { function, args }, checked_height(tallest)?)),
            None if self.strict_functions => Err(FormulaError::UnknownFunction(name)),
            None => {
                log::debug!("unknown function {} compiles to 0", name);
                Ok((Expr::Number(0.0), 1))
            }
        }
    }
}

fn join(op: BinaryOperator, (left, lh): Node, (right, rh): Node) -> FormulaResult<Node> {
    let height = checked_height(lh.max(rh))?;
    Ok((Expr::binary(op, left, right), height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(formula: &str) -> Expr {
        compile_formula(formula).unwrap().root().clone()
    }

    fn parse_strict(formula: &str) -> FormulaResult<CompiledFormula> {
        let tokens = tokenize(formula)?;
        compile(&tokens, &EngineOptions::default().with_strict_functions(true))
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(parse("42"), Expr::Number(42.0));
        assert_eq!(parse("3.14"), Expr::Number(3.14));
        assert_eq!(parse("'Hello'"), Expr::Text("Hello".into()));
        assert_eq!(parse("[Prix]"), Expr::Field("Prix".into()));
    }

    #[test]
    fn test_parse_arithmetic_precedence() {
        // 2 + (3 * 4)
        assert_eq!(
            parse("2 + 3 * 4"),
            Expr::binary(
                BinaryOperator::Add,
                Expr::Number(2.0),
                Expr::binary(BinaryOperator::Multiply, Expr::Number(3.0), Expr::Number(4.0)),
            )
        );

        // (2 + 3) * 4
        assert_eq!(
            parse("(2 + 3) * 4"),
            Expr::binary(
                BinaryOperator::Multiply,
                Expr::binary(BinaryOperator::Add, Expr::Number(2.0), Expr::Number(3.0)),
                Expr::Number(4.0),
            )
        );
    }

    #[test]
    fn test_comparison_shares_additive_level() {
        // (1 + 2) > 2, evaluated left to right
        assert_eq!(
            parse("1 + 2 > 2"),
            Expr::binary(
                BinaryOperator::GreaterThan,
                Expr::binary(BinaryOperator::Add, Expr::Number(1.0), Expr::Number(2.0)),
                Expr::Number(2.0),
            )
        );
    }

    #[test]
    fn test_parse_unary_minus() {
        assert_eq!(parse("-5"), Expr::Negate(Box::new(Expr::Number(5.0))));
        assert_eq!(
            parse("--[A]"),
            Expr::Negate(Box::new(Expr::Negate(Box::new(Expr::Field("A".into())))))
        );
    }

    #[test]
    fn test_parse_function_call() {
        let expr = parse("si([Age] > 18, 'Majeur', 'Mineur')");
        match expr {
            Expr::Call { function, args } => {
                assert_eq!(function, Function::If);
                assert_eq!(args.len(), 3);
            }
            other => panic!("Expected Call, got {:?}", other),
        }

        assert_eq!(
            parse("TODAY()"),
            Expr::Call {
                function: Function::Today,
                args: vec![],
            }
        );
    }

    #[test]
    fn test_french_and_english_names_compile_identically() {
        assert_eq!(parse("SOMME(1, 2)"), parse("SUM(1, 2)"));
        assert_eq!(parse("MOYENNE([A])"), parse("AVERAGE([A])"));
        assert_eq!(parse("moyenne([A])"), parse("AVG([A])"));
    }

    #[test]
    fn test_missing_closing_paren_at_end_is_tolerated() {
        assert_eq!(parse("(1 + 2"), parse("(1 + 2)"));
        assert_eq!(parse("SUM(1, 2"), parse("SUM(1, 2)"));
        assert_eq!(parse("SUM("), parse("SUM()"));
    }

    #[test]
    fn test_stray_closing_parens_are_ignored() {
        assert_eq!(parse("1 + 2))"), parse("1 + 2"));
    }

    #[test]
    fn test_trailing_tokens_are_errors() {
        assert!(matches!(compile_formula("1 2"), Err(FormulaError::Parse(_))));
        assert!(matches!(compile_formula("[A] 'x'"), Err(FormulaError::Parse(_))));
        assert!(matches!(compile_formula("(1 2)"), Err(FormulaError::Parse(_))));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(compile_formula(""), Err(FormulaError::Parse(_))));
        assert!(matches!(compile_formula("1 +"), Err(FormulaError::Parse(_))));
        assert!(matches!(compile_formula("* 2"), Err(FormulaError::Parse(_))));
        assert!(matches!(compile_formula("SUM(1,)"), Err(FormulaError::Parse(_))));
        assert!(matches!(compile_formula("[[invalid"), Err(FormulaError::Lex { .. })));
    }

    #[test]
    fn test_unknown_identifiers_compile_to_zero() {
        assert_eq!(parse("PI"), Expr::Number(0.0));
        assert_eq!(parse("NOPE(1, 2)"), Expr::Number(0.0));
        assert_eq!(
            parse("[A] + FOO"),
            Expr::binary(BinaryOperator::Add, Expr::Field("A".into()), Expr::Number(0.0))
        );
    }

    #[test]
    fn test_nesting_limit() {
        // The top level counts as one
        let at_limit = format!("{}1", "(".repeat(MAX_DEPTH - 1));
        assert_eq!(parse(&at_limit), Expr::Number(1.0));

        let past_limit = format!("{}1", "(".repeat(MAX_DEPTH));
        assert_eq!(
            compile_formula(&past_limit).unwrap_err(),
            FormulaError::Parse("formula nested too deeply".into())
        );

        let negations = format!("{}1", "-".repeat(MAX_DEPTH + 1));
        assert!(matches!(compile_formula(&negations), Err(FormulaError::Parse(_))));

        let calls = format!("{}1", "ABS(".repeat(MAX_DEPTH + 1));
        assert!(matches!(compile_formula(&calls), Err(FormulaError::Parse(_))));
    }

    #[test]
    fn test_operator_chain_limit() {
        // A chain of n operators is a tree of height n + 1
        let fits = format!("1{}", " + 1".repeat(MAX_DEPTH - 1));
        assert!(compile_formula(&fits).is_ok());

        let too_long = format!("1{}", " * 2".repeat(MAX_DEPTH));
        assert!(matches!(compile_formula(&too_long), Err(FormulaError::Parse(_))));

        // A parenthesised chain on the left adds its height
        let half = " + 1".repeat(MAX_DEPTH / 2);
        let stacked = format!("(1{}){}", half, half);
        assert!(matches!(compile_formula(&stacked), Err(FormulaError::Parse(_))));
    }

    #[test]
    fn test_strict_functions() {
        assert_eq!(
            parse_strict("NOPE(1)").unwrap_err(),
            FormulaError::UnknownFunction("NOPE".into())
        );
        assert!(parse_strict("SUM(1)").is_ok());
        // Bare identifiers are not function calls
        assert!(parse_strict("PI").is_ok());
    }
}
