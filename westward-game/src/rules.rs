//! The event constraint language.
//!
//! A constraint resolves a left-hand value from the party (or a chosen
//! member), optionally transforms it arithmetically, then compares it to a
//! literal. Integers support every relational operator, strings only
//! equality, and string lists (attached statuses) only membership.
//! Malformed or mistyped constraints are logged and evaluate to `false`.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::catalog::CatalogRef;
use crate::inventory::ItemType;
use crate::member::Member;
use crate::numbers::ceil_f32_to_i32;
use crate::party::PartyState;

/// Value looked up directly from the party or a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Argument {
    CurrentDay,
    CurrentMile,
    Role,
    Gender,
    Health,
    Money,
    FoodCount,
    ItemCount,
    ClothesCount,
    Status,
    Temperature,
    MemberCount,
}

impl Argument {
    /// Role, gender, health and status are read from a member.
    #[must_use]
    pub const fn requires_member(self) -> bool {
        matches!(self, Self::Role | Self::Gender | Self::Health | Self::Status)
    }
}

/// Argument parameterized by a catalog id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexArgument {
    /// Units held of the named item.
    ItemCount(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOp {
    #[serde(rename = "*")]
    Multiply,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Subtract,
    #[serde(rename = "/")]
    Divide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = ":")]
    Contains,
    #[serde(rename = "!:")]
    NotContains,
}

impl CompareOp {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Greater => ">",
            Self::Less => "<",
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::Contains => ":",
            Self::NotContains => "!:",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Int(i64),
    Text(String),
}

/// Left-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Argument(Argument),
    Complex(ComplexArgument),
    Equation(Box<Equation>),
}

impl Subject {
    #[must_use]
    pub fn requires_member(&self) -> bool {
        match self {
            Self::Argument(argument) => argument.requires_member(),
            Self::Complex(_) => false,
            Self::Equation(equation) => equation.subject.requires_member(),
        }
    }
}

/// Arithmetic transform applied to a resolved integer before comparing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equation {
    #[serde(flatten)]
    pub subject: Subject,
    pub operator: ArithmeticOp,
    pub modifier: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventConstraint {
    #[serde(flatten)]
    pub subject: Subject,
    pub operator: CompareOp,
    pub value: Literal,
}

/// Resolved left-hand value.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolved {
    Int(i64),
    Text(String),
    List(Vec<String>),
}

impl Resolved {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Text(_) => "string",
            Self::List(_) => "string list",
        }
    }
}

/// Why a constraint could not be evaluated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("argument {0:?} needs a member but none was supplied")]
    MissingMember(Argument),
    #[error("operator {operator} cannot compare a {left} with a {right}")]
    TypeMismatch {
        operator: CompareOp,
        left: &'static str,
        right: &'static str,
    },
    #[error("arithmetic needs an integer operand, found a {0}")]
    NonNumericEquation(&'static str),
    #[error("equation divides by zero")]
    DivisionByZero,
    #[error("equation overflowed")]
    Overflow,
}

impl EventConstraint {
    #[must_use]
    pub fn new(subject: Subject, operator: CompareOp, value: Literal) -> Self {
        Self {
            subject,
            operator,
            value,
        }
    }

    #[must_use]
    pub fn requires_member(&self) -> bool {
        self.subject.requires_member()
    }

    /// Evaluate against the party and, for member-scoped arguments, `member`.
    ///
    /// Validation failures are logged and treated as unsatisfied.
    #[must_use]
    pub fn evaluate(&self, party: &PartyState, member: Option<&Member>) -> bool {
        match self.check(party, member) {
            Ok(satisfied) => satisfied,
            Err(violation) => {
                log::warn!("constraint {self:?} rejected: {violation}");
                false
            }
        }
    }

    /// Evaluate, surfacing validation failures to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`RuleViolation`] when data is missing or mistyped.
    pub fn check(&self, party: &PartyState, member: Option<&Member>) -> Result<bool, RuleViolation> {
        let left = resolve(&self.subject, party, member)?;
        compare(&left, self.operator, &self.value)
    }

    pub(crate) fn references(&self) -> Option<CatalogRef<'_>> {
        let mut subject = &self.subject;
        loop {
            match subject {
                Subject::Argument(_) => return None,
                Subject::Complex(ComplexArgument::ItemCount(item)) => {
                    return Some(CatalogRef::Item(item));
                }
                Subject::Equation(equation) => subject = &equation.subject,
            }
        }
    }
}

fn resolve(
    subject: &Subject,
    party: &PartyState,
    member: Option<&Member>,
) -> Result<Resolved, RuleViolation> {
    match subject {
        Subject::Argument(argument) => resolve_argument(*argument, party, member),
        Subject::Complex(ComplexArgument::ItemCount(item)) => {
            Ok(Resolved::Int(i64::from(party.inventory.item_count(item))))
        }
        Subject::Equation(equation) => match resolve(&equation.subject, party, member)? {
            Resolved::Int(value) => {
                apply(value, equation.operator, equation.modifier).map(Resolved::Int)
            }
            other => Err(RuleViolation::NonNumericEquation(other.kind())),
        },
    }
}

fn resolve_argument(
    argument: Argument,
    party: &PartyState,
    member: Option<&Member>,
) -> Result<Resolved, RuleViolation> {
    let needs_member = || member.ok_or(RuleViolation::MissingMember(argument));
    let value = match argument {
        Argument::CurrentDay => Resolved::Int(i64::from(party.date.day())),
        Argument::CurrentMile => Resolved::Int(i64::from(party.mile())),
        Argument::Money => Resolved::Int(i64::from(ceil_f32_to_i32(party.money()))),
        Argument::FoodCount => {
            Resolved::Int(i64::from(party.inventory.count_of_type(ItemType::Food)))
        }
        Argument::ItemCount => Resolved::Int(i64::from(party.inventory.total_units())),
        Argument::ClothesCount => {
            Resolved::Int(i64::from(party.inventory.count_of_type(ItemType::Clothes)))
        }
        Argument::Temperature => Resolved::Int(i64::from(party.date.temperature())),
        Argument::MemberCount => Resolved::Int(i64::from(party.member_count())),
        Argument::Role => Resolved::Text(needs_member()?.role.id.clone()),
        Argument::Gender => Resolved::Text(needs_member()?.gender.as_str().to_string()),
        Argument::Health => Resolved::Int(i64::from(needs_member()?.health())),
        Argument::Status => Resolved::List(
            needs_member()?
                .status_ids()
                .map(str::to_string)
                .collect(),
        ),
    };
    Ok(value)
}

fn apply(value: i64, operator: ArithmeticOp, modifier: i64) -> Result<i64, RuleViolation> {
    let result = match operator {
        ArithmeticOp::Multiply => value.checked_mul(modifier),
        ArithmeticOp::Add => value.checked_add(modifier),
        ArithmeticOp::Subtract => value.checked_sub(modifier),
        ArithmeticOp::Divide => {
            if modifier == 0 {
                return Err(RuleViolation::DivisionByZero);
            }
            value.checked_div(modifier)
        }
    };
    result.ok_or(RuleViolation::Overflow)
}

fn compare(left: &Resolved, operator: CompareOp, right: &Literal) -> Result<bool, RuleViolation> {
    let mismatch = || RuleViolation::TypeMismatch {
        operator,
        left: left.kind(),
        right: match right {
            Literal::Int(_) => "integer",
            Literal::Text(_) => "string",
        },
    };
    match (left, right) {
        (Resolved::Int(left), Literal::Int(right)) => match operator {
            CompareOp::Equal => Ok(left == right),
            CompareOp::NotEqual => Ok(left != right),
            CompareOp::Greater => Ok(left > right),
            CompareOp::Less => Ok(left < right),
            CompareOp::GreaterOrEqual => Ok(left >= right),
            CompareOp::LessOrEqual => Ok(left <= right),
            CompareOp::Contains | CompareOp::NotContains => Err(mismatch()),
        },
        (Resolved::Text(left), Literal::Text(right)) => match operator {
            CompareOp::Equal => Ok(left == right),
            CompareOp::NotEqual => Ok(left != right),
            _ => Err(mismatch()),
        },
        (Resolved::List(items), Literal::Text(right)) => match operator {
            CompareOp::Contains => Ok(items.iter().any(|item| item == right)),
            CompareOp::NotContains => Ok(!items.iter().any(|item| item == right)),
            _ => Err(mismatch()),
        },
        _ => Err(mismatch()),
    }
}
