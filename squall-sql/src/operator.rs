use std::fmt;

use thiserror::Error;

/// Raised when a symbol does not correspond to any known operator.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{symbol}` is not a valid {kind} symbol")]
pub struct UnknownOperator {
    pub kind: &'static str,
    pub symbol: String,
}

/// Unary operators for non-logical operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    IsNull,
    IsNotNull,
    UnaryPlus,
    Negation,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::IsNull => "IS NULL",
            UnaryOperator::IsNotNull => "IS NOT NULL",
            UnaryOperator::UnaryPlus => "+",
            UnaryOperator::Negation => "-",
        }
    }

    /// Whether the operator is written after its operand.
    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOperator::IsNull | UnaryOperator::IsNotNull)
    }

    pub fn from_symbol(symbol: &str) -> Result<UnaryOperator, UnknownOperator> {
        match symbol {
            "IS NULL" => Ok(UnaryOperator::IsNull),
            "IS NOT NULL" => Ok(UnaryOperator::IsNotNull),
            "+" => Ok(UnaryOperator::UnaryPlus),
            "-" => Ok(UnaryOperator::Negation),
            _ => Err(UnknownOperator {
                kind: "UnaryOperator",
                symbol: symbol.to_string(),
            }),
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Binary operators for non-logical operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Lt,
    Gt,
    Leq,
    Geq,
    Eq,
    Neq,
    In,
    Like,
    ILike,
    Between,
    NotBetween,
}

impl BinaryOperator {
    /// The first symbol is used as the canonical representation when a
    /// database accepts several spellings (e.g. `<>` and `!=`).
    pub fn symbols(&self) -> &'static [&'static str] {
        match self {
            BinaryOperator::Lt => &["<"],
            BinaryOperator::Gt => &[">"],
            BinaryOperator::Leq => &["<="],
            BinaryOperator::Geq => &[">="],
            BinaryOperator::Eq => &["="],
            BinaryOperator::Neq => &["<>", "!="],
            BinaryOperator::In => &["IN"],
            BinaryOperator::Like => &["LIKE", "~~"],
            BinaryOperator::ILike => &["ILIKE", "!~~"],
            BinaryOperator::Between => &["BETWEEN"],
            BinaryOperator::NotBetween => &["NOT BETWEEN"],
        }
    }

    pub fn canonical_symbol(&self) -> &'static str {
        self.symbols()[0]
    }

    pub fn from_symbol(symbol: &str) -> Result<BinaryOperator, UnknownOperator> {
        const ALL: &[BinaryOperator] = &[
            BinaryOperator::Lt,
            BinaryOperator::Gt,
            BinaryOperator::Leq,
            BinaryOperator::Geq,
            BinaryOperator::Eq,
            BinaryOperator::Neq,
            BinaryOperator::In,
            BinaryOperator::Like,
            BinaryOperator::ILike,
            BinaryOperator::Between,
            BinaryOperator::NotBetween,
        ];
        ALL.iter()
            .find(|op| op.symbols().contains(&symbol))
            .copied()
            .ok_or_else(|| UnknownOperator {
                kind: "BinaryOperator",
                symbol: symbol.to_string(),
            })
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_symbol())
    }
}

/// Boolean operators used in compound predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
    Not,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
            LogicalOperator::Not => "NOT",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_operator_symbols() {
        assert_eq!(BinaryOperator::Neq.canonical_symbol(), "<>");
        assert_eq!(BinaryOperator::from_symbol("!="), Ok(BinaryOperator::Neq));
        assert_eq!(BinaryOperator::from_symbol("~~"), Ok(BinaryOperator::Like));
        assert!(BinaryOperator::from_symbol("<=>").is_err());
    }

    #[test]
    fn test_unary_operator_fixity() {
        assert!(UnaryOperator::IsNull.is_postfix());
        assert!(!UnaryOperator::Negation.is_postfix());
        assert_eq!(
            UnaryOperator::from_symbol("IS NOT NULL"),
            Ok(UnaryOperator::IsNotNull)
        );
    }
}
