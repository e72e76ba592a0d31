//! # Scalar Expressions and Join Types
//!
//! Expression trees appear inside predicates, projections and join conditions.
//! The rewrite engine never evaluates them; rules inspect their *shape* (is this
//! an equality over two column references? is this an IS NULL check?) and carry
//! them through rewrites verbatim.
//!
//! Conjunctions and disjunctions are stored as flat lists (`And(Vec)`, `Or(Vec)`)
//! rather than nested binary trees. This makes "inspect the immediate operands of
//! a boolean combinator" a plain iteration, which is exactly the one-level
//! flattening policy the null-rejection analysis uses.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Reference to a table in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// Reference to a column.
///
/// `index` is the column's offset in the schema of the operator subtree that
/// produced it. For a join, offsets below the left input's width refer to the
/// left side; offsets at or above it refer to the right side, so provenance is
/// always recoverable from the reference itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
    pub index: u32,
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref t) = self.table {
            write!(f, "{}.{}", t, self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Scalar value for expressions.
///
/// Uses `OrderedFloat` for `f64` so that expressions stay `Eq + Hash`, which the
/// processed-condition memo relies on for condition signatures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarValue {
    /// SQL NULL value.
    Null,
    /// Boolean true/false.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point, wrapped in OrderedFloat for Eq/Hash support.
    Float64(OrderedFloat<f64>),
    /// UTF-8 string.
    Utf8(String),
    /// Date as days since Unix epoch (1970-01-01).
    Date(i32),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Bool(v) => write!(f, "{}", v),
            ScalarValue::Int64(v) => write!(f, "{}", v),
            ScalarValue::Float64(v) => write!(f, "{}", v),
            ScalarValue::Utf8(v) => write!(f, "'{}'", v),
            ScalarValue::Date(v) => write!(f, "DATE({})", v),
        }
    }
}

/// Scalar expressions used in predicates, projections and join conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Reference to a column by name and schema offset.
    Column(ColumnRef),
    /// Constant literal value.
    Literal(ScalarValue),
    /// Binary operation (e.g., `a = c`, `price > 100`).
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation (e.g., `a IS NOT NULL`, `NOT flag`).
    UnaryOp { op: UnaryOp, operand: Box<Expr> },
    /// Named function call, opaque to the rewriter (e.g., `UPPER(name)`).
    Function { name: String, args: Vec<Expr> },
    /// Conjunction (AND) of multiple predicates, stored as a flat list.
    And(Vec<Expr>),
    /// Disjunction (OR) of multiple predicates.
    Or(Vec<Expr>),
}

impl Expr {
    /// Return all column references in this expression.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut cols = Vec::new();
        self.collect_columns(&mut cols);
        cols
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Expr::Column(c) => out.push(c),
            Expr::Literal(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::UnaryOp { operand, .. } => operand.collect_columns(out),
            Expr::Function { args, .. } => {
                for a in args {
                    a.collect_columns(out);
                }
            }
            Expr::And(exprs) | Expr::Or(exprs) => {
                for e in exprs {
                    e.collect_columns(out);
                }
            }
        }
    }

    /// Flatten AND-chains: (A AND (B AND C)) → [A, B, C].
    pub fn conjuncts(&self) -> Vec<&Expr> {
        match self {
            Expr::And(exprs) => exprs.iter().flat_map(|e| e.conjuncts()).collect(),
            other => vec![other],
        }
    }

    /// Rebuild a predicate from a list of conjuncts.
    ///
    /// A single conjunct is returned as-is; an empty list collapses to TRUE.
    pub fn and(mut conjuncts: Vec<Expr>) -> Expr {
        match conjuncts.len() {
            0 => Expr::Literal(ScalarValue::Bool(true)),
            1 => conjuncts.pop().unwrap(),
            _ => Expr::And(conjuncts),
        }
    }

    /// Normalized signature of this expression, used by the processed-condition
    /// memo to recognize join conditions it has already analyzed.
    ///
    /// The signature is a structural hash: two conditions collide only if they
    /// are structurally identical (same operators, same column offsets, same
    /// literals), which is the normalization the memo needs.
    pub fn signature(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(c) => write!(f, "{}", c),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::BinaryOp { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::UnaryOp { op, operand } => match op {
                UnaryOp::Not => write!(f, "NOT {}", operand),
                UnaryOp::Neg => write!(f, "-{}", operand),
                UnaryOp::IsNull => write!(f, "{} IS NULL", operand),
                UnaryOp::IsNotNull => write!(f, "{} IS NOT NULL", operand),
            },
            Expr::Function { name, args } => {
                write!(f, "{}(", name)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
            Expr::And(exprs) | Expr::Or(exprs) => {
                let sep = if matches!(self, Expr::And(_)) { " AND " } else { " OR " };
                write!(f, "(")?;
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", sep)?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Binary operators for comparison and arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Equality comparison (`=`). The only operator the join-column analysis accepts.
    Eq,
    /// Inequality comparison (`<>` or `!=`).
    NotEq,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    LtEq,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    GtEq,
    /// Addition (`+`).
    Add,
    /// Subtraction (`-`).
    Sub,
    /// Multiplication (`*`).
    Mul,
    /// Division (`/`).
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        };
        write!(f, "{}", s)
    }
}

/// Unary operators for boolean logic and null checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Boolean negation (`NOT`).
    Not,
    /// Arithmetic negation (unary minus).
    Neg,
    /// Null check (`IS NULL`). Never null-rejecting.
    IsNull,
    /// Non-null check (`IS NOT NULL`). The canonical null-rejecting predicate.
    IsNotNull,
}

/// SQL join types.
///
/// The heuristic rewriter only strengthens Full and Left joins. Right joins are
/// normalized to Left by the planner before heuristic rewriting, and Semi/Anti
/// joins carry their condition differently; a strengthening candidate reporting
/// one of those types indicates a broken host precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    /// Inner join: only matching rows from both sides.
    Inner,
    /// Left outer join: all rows from left, matching from right (or NULLs).
    Left,
    /// Right outer join: all rows from right, matching from left (or NULLs).
    Right,
    /// Full outer join: all rows from both sides, NULLs where no match.
    Full,
    /// Semi join: left rows that have at least one match on the right.
    Semi,
    /// Anti join: left rows that have no match on the right.
    Anti,
    /// Cross join: Cartesian product of both sides (no condition).
    Cross,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::Full => "FULL",
            JoinType::Semi => "SEMI",
            JoinType::Anti => "ANTI",
            JoinType::Cross => "CROSS",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, index: u32) -> Expr {
        Expr::Column(ColumnRef {
            table: Some("foo".into()),
            name: name.into(),
            index,
        })
    }

    #[test]
    fn test_conjuncts_flatten_nested_ands() {
        let pred = Expr::And(vec![
            col("a", 0),
            Expr::And(vec![col("b", 1), col("c", 2)]),
        ]);
        let parts = pred.conjuncts();
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn test_and_of_one_is_identity() {
        let pred = Expr::and(vec![col("a", 0)]);
        assert_eq!(pred, col("a", 0));
    }

    #[test]
    fn test_signature_is_structural() {
        let eq = |l: u32, r: u32| Expr::BinaryOp {
            op: BinaryOp::Eq,
            left: Box::new(col("a", l)),
            right: Box::new(col("c", r)),
        };
        assert_eq!(eq(0, 2).signature(), eq(0, 2).signature());
        assert_ne!(eq(0, 2).signature(), eq(1, 2).signature());
    }

    #[test]
    fn test_display_reads_like_sql() {
        let pred = Expr::UnaryOp {
            op: UnaryOp::IsNotNull,
            operand: Box::new(col("a", 0)),
        };
        assert_eq!(pred.to_string(), "foo.a IS NOT NULL");
    }
}
