//! Restricted arithmetic expression handling for player submissions.
//!
//! Expressions are never handed to any dynamic evaluation facility; a small
//! recursive-descent parser covers numeric literals, the four operators,
//! unary minus, and parentheses. The character allowlist runs first as
//! defense in depth even though the parser accepts nothing else.

/// Allowlist: digits, `+ - * /`, parentheses, decimal point, whitespace.
pub fn is_expression_safe(expression: &str) -> bool {
    !expression.trim().is_empty()
        && expression.chars().all(|c| {
            c.is_ascii_digit()
                || c.is_whitespace()
                || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '.')
        })
}

/// Digit runs appearing in the expression, in order. `"12+3"` yields
/// `[12, 3]`; a decimal literal like `"1.5"` splits into `[1, 5]`, which
/// guarantees such literals never pass the round-number multiset check.
pub fn extract_numbers(expression: &str) -> Vec<i64> {
    let mut out = Vec::new();
    let mut current: Option<i64> = None;

    for c in expression.chars() {
        if let Some(digit) = c.to_digit(10) {
            // Saturating: absurdly long digit runs still fail the multiset
            // check instead of overflowing.
            current = Some(
                current
                    .unwrap_or(0)
                    .saturating_mul(10)
                    .saturating_add(digit as i64),
            );
        } else if let Some(value) = current.take() {
            out.push(value);
        }
    }
    if let Some(value) = current {
        out.push(value);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Num(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(expression: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            _ if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::new();
                let mut seen_digit = false;
                let mut seen_dot = false;
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        seen_digit = true;
                        literal.push(d);
                        chars.next();
                    } else if d == '.' && !seen_dot {
                        seen_dot = true;
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if !seen_digit {
                    return None;
                }
                tokens.push(Token::Num(literal.parse().ok()?));
            }
            _ => return None,
        }
    }

    Some(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Plus => {
                    self.next();
                    value += self.term()?;
                }
                Token::Minus => {
                    self.next();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Some(value)
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Option<f64> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek() {
            match op {
                Token::Star => {
                    self.next();
                    value *= self.factor()?;
                }
                Token::Slash => {
                    self.next();
                    value /= self.factor()?;
                }
                _ => break,
            }
        }
        Some(value)
    }

    // factor := '-' factor | Num | '(' expr ')'
    fn factor(&mut self) -> Option<f64> {
        match self.next()? {
            Token::Minus => Some(-self.factor()?),
            Token::Num(value) => Some(value),
            Token::LParen => {
                let value = self.expr()?;
                match self.next()? {
                    Token::RParen => Some(value),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Evaluates a submission arithmetically. `None` on any parse error or a
/// non-finite result (division by zero lands here).
pub fn evaluate(expression: &str) -> Option<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return None;
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
    };
    let value = parser.expr()?;
    if parser.pos != tokens.len() {
        return None;
    }
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_accepts_arithmetic_only() {
        assert!(is_expression_safe("(4 + 8 - 1) * 2"));
        assert!(is_expression_safe("1.5*16"));
        assert!(!is_expression_safe(""));
        assert!(!is_expression_safe("   "));
        assert!(!is_expression_safe("4+8; drop table"));
        assert!(!is_expression_safe("pow(2,3)"));
        assert!(!is_expression_safe("4＋8"));
    }

    #[test]
    fn extract_numbers_finds_digit_runs() {
        assert_eq!(extract_numbers("(4+8-1)*2"), vec![4, 8, 1, 2]);
        assert_eq!(extract_numbers("12+34"), vec![12, 34]);
        assert_eq!(extract_numbers("1.5*16"), vec![1, 5, 16]);
        assert_eq!(extract_numbers("((()))"), Vec::<i64>::new());
    }

    #[test]
    fn evaluate_respects_precedence_and_parens() {
        assert_eq!(evaluate("2+3*4"), Some(14.0));
        assert_eq!(evaluate("(2+3)*4"), Some(20.0));
        let near = evaluate("8/(3-8/3)").unwrap();
        assert!((near - 24.0).abs() < 1e-9);
        assert_eq!(evaluate(" 6 * 4 "), Some(24.0));
    }

    #[test]
    fn evaluate_handles_unary_minus() {
        assert_eq!(evaluate("-3+27"), Some(24.0));
        assert_eq!(evaluate("4*-6"), Some(-24.0));
        assert_eq!(evaluate("-(1-25)"), Some(24.0));
    }

    #[test]
    fn evaluate_rejects_malformed_input() {
        assert_eq!(evaluate(""), None);
        assert_eq!(evaluate("4+"), None);
        assert_eq!(evaluate("(4+8"), None);
        assert_eq!(evaluate("4 8"), None);
        assert_eq!(evaluate("*4"), None);
        assert_eq!(evaluate("4..5"), None);
        assert_eq!(evaluate("."), None);
    }

    #[test]
    fn evaluate_rejects_non_finite_results() {
        assert_eq!(evaluate("1/0"), None);
        assert_eq!(evaluate("1/(2-2)"), None);
    }
}
