//! Operator definitions and binding powers for the Pratt parser.

use std::fmt;

use crate::lexer::TokenKind;

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    LogicalOr,
    LogicalAnd,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// Left and right binding power. All binary operators are
    /// left-associative.
    pub fn binding_power(&self) -> (u8, u8) {
        use BinaryOp::*;
        match self {
            LogicalOr => (1, 2),
            LogicalAnd => (3, 4),
            Equal | NotEqual => (5, 6),
            Less | LessEqual | Greater | GreaterEqual => (7, 8),
            Add | Sub => (9, 10),
            Mul | Div | Mod => (11, 12),
        }
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        use BinaryOp::*;
        let op = match token {
            TokenKind::PipePipe => LogicalOr,
            TokenKind::AmpAmp => LogicalAnd,
            TokenKind::EqualEqual => Equal,
            TokenKind::BangEqual => NotEqual,
            TokenKind::Less => Less,
            TokenKind::LessEqual => LessEqual,
            TokenKind::Greater => Greater,
            TokenKind::GreaterEqual => GreaterEqual,
            TokenKind::Plus => Add,
            TokenKind::Minus => Sub,
            TokenKind::Star => Mul,
            TokenKind::Slash => Div,
            TokenKind::Percent => Mod,
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use BinaryOp::*;
        let s = match self {
            LogicalOr => "||",
            LogicalAnd => "&&",
            Equal => "==",
            NotEqual => "!=",
            Less => "<",
            LessEqual => "<=",
            Greater => ">",
            GreaterEqual => ">=",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
        };
        f.write_str(s)
    }
}

/// Prefix unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
}

impl UnaryOp {
    /// Higher than all binary operators.
    pub fn binding_power() -> u8 {
        13
    }

    pub fn from_token(token: TokenKind) -> Option<Self> {
        match token {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        })
    }
}

/// Binding power of postfix forms: member access, calls and indexing.
pub const POSTFIX_BINDING_POWER: u8 = 15;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_ordering() {
        let (or_l, _) = BinaryOp::LogicalOr.binding_power();
        let (and_l, _) = BinaryOp::LogicalAnd.binding_power();
        let (add_l, _) = BinaryOp::Add.binding_power();
        let (mul_l, _) = BinaryOp::Mul.binding_power();
        assert!(or_l < and_l && and_l < add_l && add_l < mul_l);
        assert!(mul_l < UnaryOp::binding_power());
        assert!(UnaryOp::binding_power() < POSTFIX_BINDING_POWER);
    }

    #[test]
    fn from_token() {
        assert_eq!(BinaryOp::from_token(TokenKind::Percent), Some(BinaryOp::Mod));
        assert_eq!(BinaryOp::from_token(TokenKind::Equal), None);
        assert_eq!(UnaryOp::from_token(TokenKind::Bang), Some(UnaryOp::Not));
    }
}
