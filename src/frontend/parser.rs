use log::{debug, trace};
use thiserror::Error;

use crate::frontend::{
    ast::Node,
    lexer::{Lex, LexerError, Ops, Token},
    lookahead::{Lookahead, LookaheadError},
};
use crate::stack::guarded;

// Everything that can go wrong while turning text into an AST. The first two
// variants and a wrapped `LexerError::UnexpectedChar` are syntax errors in
// the input, a `Buffer` error means a rule consumed more than it checked.
#[derive(Error, PartialEq, Debug)]
pub enum ParserError {
    #[error("unexpected token: {0}")]
    UnexpectedToken(Token),

    #[error("unexpected token: end of input")]
    UnexpectedEOI,

    #[error(transparent)]
    Lex(#[from] LexerError),

    #[error(transparent)]
    Buffer(#[from] LookaheadError),
}

impl ParserError {
    fn unexpected(token: Option<&Token>) -> Self {
        match token {
            Some(token) => ParserError::UnexpectedToken(token.clone()),
            None => ParserError::UnexpectedEOI,
        }
    }

    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self,
            ParserError::UnexpectedToken(_)
                | ParserError::UnexpectedEOI
                | ParserError::Lex(LexerError::UnexpectedChar(_))
        )
    }
}

type TokenBuffer = Lookahead<Token>;

// Small alias for fallible returns of parsing expressions
type ExprParseResult = Result<Node, ParserError>;

/// Grammar symbols, each with its FIRST set and parse routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Number,
    Factor,
    Term,
    Expr,
}

impl Rule {
    /// Whether `token` may start a derivation of this symbol. `None` stands
    /// for the end of input, which starts nothing.
    pub fn is_first(self, token: Option<&Token>) -> bool {
        match self {
            Rule::Number => matches!(token, Some(Token::Number(_))),
            Rule::Factor => Rule::Number.is_first(token) || matches!(token, Some(Token::LeftParen)),
            Rule::Term => Rule::Factor.is_first(token),
            Rule::Expr => Rule::Term.is_first(token),
        }
    }

    // Parentheses nest through here, so it runs on a growable stack
    fn parse(self, tokens: &mut TokenBuffer) -> ExprParseResult {
        trace!("entering {self:?}");

        guarded(|| match self {
            Rule::Number => parse_number_expr(tokens),
            Rule::Factor => parse_factor(tokens),
            Rule::Term => parse_term(tokens),
            Rule::Expr => parse_expr(tokens),
        })
    }
}

fn expect_first(rule: Rule, tokens: &TokenBuffer) -> Result<(), ParserError> {
    let next = tokens.current();

    if rule.is_first(next) {
        Ok(())
    } else {
        Err(ParserError::unexpected(next))
    }
}

/// Parse a whole program. The expression becomes the sole argument of a
/// `console.log` call, so running the generated code prints its value.
///
/// Tokens left over after the expression are ignored.
pub fn parse(text: &str) -> Result<Node, ParserError> {
    let tokens = text.lex()?;
    debug!("parsing {} tokens", tokens.len());

    let mut tokens = TokenBuffer::new(tokens);

    expect_first(Rule::Expr, &tokens)?;
    let expr = Rule::Expr.parse(&mut tokens)?;

    if !tokens.is_exhausted() {
        debug!("ignoring {} trailing tokens", tokens.remaining());
    }

    Ok(Node::print_program(expr))
}

/// numberexpr ::= number
fn parse_number_expr(tokens: &mut TokenBuffer) -> ExprParseResult {
    match tokens.get(1)? {
        Token::Number(value) => Ok(Node::literal(value.as_f64(), value.raw())),
        unexpected => Err(ParserError::UnexpectedToken(unexpected)),
    }
}

/// parenexpr ::= '(' expr ')'
fn parse_paren_expr(tokens: &mut TokenBuffer) -> ExprParseResult {
    // Swallow the open parenthesis
    let _open_paren = tokens.get(1)?;

    let expr = Rule::Expr.parse(tokens)?;

    // Running out of tokens here surfaces as the buffer's own error
    match tokens.get(1)? {
        Token::RightParen => Ok(expr),
        unexpected => Err(ParserError::UnexpectedToken(unexpected)),
    }
}

/// factor
///   ::= numberexpr
///   ::= parenexpr
fn parse_factor(tokens: &mut TokenBuffer) -> ExprParseResult {
    let next = tokens.current();

    if matches!(next, Some(Token::LeftParen)) {
        parse_paren_expr(tokens)
    } else if Rule::Number.is_first(next) {
        Rule::Number.parse(tokens)
    } else {
        Err(ParserError::unexpected(next))
    }
}

/// term ::= factor (('*' | '/') factor)*
fn parse_term(tokens: &mut TokenBuffer) -> ExprParseResult {
    parse_left_fold(tokens, Rule::Factor, |token| match token {
        Token::TermOperator(op) => Some(*op),
        _ => None,
    })
}

/// expr ::= term (('+' | '-') term)*
fn parse_expr(tokens: &mut TokenBuffer) -> ExprParseResult {
    parse_left_fold(tokens, Rule::Term, |token| match token {
        Token::ExprOperator(op) => Some(*op),
        _ => None,
    })
}

// Shared shape of the two binary tiers: collect `(op, operand)` pairs after
// the first operand, then fold them so each operator takes everything
// before it as its left child.
fn parse_left_fold(
    tokens: &mut TokenBuffer,
    operand: Rule,
    operator: fn(&Token) -> Option<Ops>,
) -> ExprParseResult {
    expect_first(operand, tokens)?;
    let left = operand.parse(tokens)?;

    let mut rhs = Vec::new();

    while let Some(op) = tokens.current().and_then(operator) {
        let _op = tokens.get(1)?;

        expect_first(operand, tokens)?;
        rhs.push((op, operand.parse(tokens)?));
    }

    Ok(rhs
        .into_iter()
        .fold(left, |acc, (op, right)| Node::binary(op, acc, right)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Value;
    use Ops::*;

    fn lit(raw: &str) -> Node {
        Node::literal(raw.parse().unwrap(), raw)
    }

    // Dig the printed expression back out of the program wrapper
    fn parse_expr_str(text: &str) -> Node {
        let program = parse(text).unwrap();

        let Node::Program { body } = &program else {
            panic!("parse must return a program");
        };
        let Node::ExpressionStatement { expression } = &body[0] else {
            panic!("program must hold an expression statement");
        };
        let Node::CallExpression { arguments, .. } = &**expression else {
            panic!("statement must be a call");
        };
        arguments[0].clone()
    }

    #[test]
    fn parsing_program_wrapper() {
        assert_eq!(parse("1+2").unwrap(), Node::print_program(Node::binary(Plus, lit("1"), lit("2"))));
    }

    #[test]
    fn parsing_single_numbers() {
        assert_eq!(parse_expr_str("42"), lit("42"));
        assert_eq!(parse_expr_str("1.50"), Node::literal(1.5, "1.50"));
        assert_eq!(parse_expr_str("((7))"), lit("7"));
    }

    #[test]
    fn parsing_left_associative_chains() {
        assert_eq!(
            parse_expr_str("1 - 2 + 3"),
            Node::binary(Plus, Node::binary(Minus, lit("1"), lit("2")), lit("3"))
        );
        assert_eq!(
            parse_expr_str("8 / 4 / 2"),
            Node::binary(Div, Node::binary(Div, lit("8"), lit("4")), lit("2"))
        );
    }

    #[test]
    fn parsing_precedence() {
        assert_eq!(
            parse_expr_str("2+3*4"),
            Node::binary(Plus, lit("2"), Node::binary(Mult, lit("3"), lit("4")))
        );
        assert_eq!(
            parse_expr_str("2*3+4"),
            Node::binary(Plus, Node::binary(Mult, lit("2"), lit("3")), lit("4"))
        );
        assert_eq!(
            parse_expr_str("(1+2)*3"),
            Node::binary(Mult, Node::binary(Plus, lit("1"), lit("2")), lit("3"))
        );
    }

    #[test]
    fn parsing_parenthesized_right_operands() {
        // Only parentheses can put a binary node on the right of another
        assert_eq!(
            parse_expr_str("1-(2-3)"),
            Node::binary(Minus, lit("1"), Node::binary(Minus, lit("2"), lit("3")))
        );
    }

    #[test]
    fn parsing_unexpected_tokens() {
        assert_eq!(parse("1 + * 2"), Err(ParserError::UnexpectedToken(Token::TermOperator(Mult))));
        assert_eq!(parse("1 + * 2").unwrap_err().to_string(), "unexpected token: *");
        assert_eq!(parse(")"), Err(ParserError::UnexpectedToken(Token::RightParen)));
        assert_eq!(parse("()"), Err(ParserError::UnexpectedToken(Token::RightParen)));
        assert_eq!(
            parse("(1 2)"),
            Err(ParserError::UnexpectedToken(Token::Number(Value::Number("2".to_string()))))
        );
    }

    #[test]
    fn parsing_running_out_of_input() {
        assert_eq!(parse(""), Err(ParserError::UnexpectedEOI));
        assert_eq!(parse("   "), Err(ParserError::UnexpectedEOI));
        assert_eq!(parse("1+"), Err(ParserError::UnexpectedEOI));
        assert_eq!(parse("2 *"), Err(ParserError::UnexpectedEOI));
        assert_eq!(parse("("), Err(ParserError::UnexpectedEOI));

        assert!(parse("").unwrap_err().is_syntax_error());
        assert!(parse("1+").unwrap_err().is_syntax_error());
    }

    #[test]
    fn parsing_unclosed_parens() {
        let err = parse("(1+2").unwrap_err();

        assert_eq!(
            err,
            ParserError::Buffer(LookaheadError::Exhausted {
                requested: 1,
                remaining: 0
            })
        );
        assert!(!err.is_syntax_error());
    }

    #[test]
    fn parsing_bad_characters() {
        let err = parse("1 + a").unwrap_err();

        assert_eq!(err, ParserError::Lex(LexerError::UnexpectedChar('a')));
        assert_eq!(err.to_string(), "unexpected token: a");
        assert!(err.is_syntax_error());
    }

    #[test]
    fn trailing_tokens_are_ignored() {
        assert_eq!(parse_expr_str("1 2"), lit("1"));
        assert_eq!(parse_expr_str("(3))"), lit("3"));
    }

    #[test]
    fn parsing_deeply_nested_parens() {
        let depth = 50_000;
        let text = format!("{}1{}", "(".repeat(depth), ")".repeat(depth));

        assert_eq!(parse_expr_str(&text), lit("1"));

        let unclosed = format!("{}1{}", "(".repeat(depth), ")".repeat(depth - 1));
        assert!(matches!(parse(&unclosed), Err(ParserError::Buffer(_))));
    }

    #[test]
    fn parsing_long_chains() {
        let text = vec!["1"; 50_000].join("+");
        let program = parse(&text).unwrap();

        assert!(matches!(program, Node::Program { .. }));
    }

    #[test]
    fn first_sets() {
        let number = Token::Number(Value::Number("1".to_string()));

        assert!(Rule::Number.is_first(Some(&number)));
        assert!(!Rule::Number.is_first(Some(&Token::LeftParen)));
        for rule in [Rule::Factor, Rule::Term, Rule::Expr] {
            assert!(rule.is_first(Some(&number)));
            assert!(rule.is_first(Some(&Token::LeftParen)));
            assert!(!rule.is_first(Some(&Token::RightParen)));
            assert!(!rule.is_first(Some(&Token::ExprOperator(Minus))));
            assert!(!rule.is_first(None));
        }
    }
}
