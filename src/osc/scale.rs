//! Skalierungs-Ausdrücke pro Achse (`*2`, `/ -1.5`).
//!
//! Ein Ausdruck wird einmal geparst und danach als reine Funktion angewendet.

use crate::shared::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static SCALE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([*/])\s*([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s*$")
        .unwrap_or_else(|e| unreachable!("statisches Regex-Muster ungültig: {e}"))
});

/// Rechenoperation eines Skalierungs-Ausdrucks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleOp {
    Multiply,
    Divide,
}

/// Typisierter Skalierungs-Ausdruck: `{op, operand}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScaleExpr {
    pub op: ScaleOp,
    pub operand: f32,
}

impl ScaleExpr {
    /// Identität `*1`.
    pub const IDENTITY: Self = Self {
        op: ScaleOp::Multiply,
        operand: 1.0,
    };

    /// Parst einen Ausdruck der Form `<*|/> <zahl>`.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let captures = SCALE_PATTERN
            .captures(input)
            .ok_or_else(|| ValidationError::InvalidScaleExpression(input.to_string()))?;

        let op = match &captures[1] {
            "*" => ScaleOp::Multiply,
            _ => ScaleOp::Divide,
        };
        let operand: f32 = captures[2]
            .parse()
            .map_err(|_| ValidationError::InvalidScaleExpression(input.to_string()))?;
        if !operand.is_finite() {
            return Err(ValidationError::InvalidScaleExpression(input.to_string()));
        }
        if op == ScaleOp::Divide && operand == 0.0 {
            return Err(ValidationError::DivisionByZero(input.to_string()));
        }

        Ok(Self { op, operand })
    }

    pub fn apply(&self, value: f32) -> f32 {
        match self.op {
            ScaleOp::Multiply => value * self.operand,
            ScaleOp::Divide => value / self.operand,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for ScaleExpr {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for ScaleExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self.op {
            ScaleOp::Multiply => '*',
            ScaleOp::Divide => '/',
        };
        write!(f, "{}{}", symbol, self.operand)
    }
}

impl FromStr for ScaleExpr {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ScaleExpr {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ScaleExpr> for String {
    fn from(expr: ScaleExpr) -> Self {
        expr.to_string()
    }
}
