//! Parser for the compact datum/redeemer DSL used by the `custom` template.
//!
//! Two independent grammars:
//!
//! ```text
//! fields  := field (',' field)*
//! field   := identifier ':' type
//! actions := action (',' action)*
//! action  := Identifier ['(' field (',' field)* ')']
//! ```
//!
//! Empty input parses to an empty list for both grammars. Whitespace around tokens is ignored.
//! Field names follow `[a-z][a-z0-9_]*`; action names follow `[A-Za-z][A-Za-z0-9]*`.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// The closed type vocabulary accepted in field declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Int,
    ByteArray,
    Address,
    Bool,
    #[serde(rename = "List<Int>")]
    ListInt,
    #[serde(rename = "List<ByteArray>")]
    ListByteArray,
}

impl FieldType {
    pub const ALL: [FieldType; 6] = [
        FieldType::Int,
        FieldType::ByteArray,
        FieldType::Address,
        FieldType::Bool,
        FieldType::ListInt,
        FieldType::ListByteArray,
    ];

    /// The Aiken spelling of this type, also the DSL token.
    pub fn token(&self) -> &'static str {
        match self {
            FieldType::Int => "Int",
            FieldType::ByteArray => "ByteArray",
            FieldType::Address => "Address",
            FieldType::Bool => "Bool",
            FieldType::ListInt => "List<Int>",
            FieldType::ListByteArray => "List<ByteArray>",
        }
    }
}

impl FromStr for FieldType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        Self::ALL
            .into_iter()
            .find(|ty| ty.token() == compact)
            .ok_or(())
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A named, typed field of a datum record or a redeemer variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.ty)
    }
}

/// A redeemer variant. An empty field list is a unit variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpec {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl ActionSpec {
    pub fn unit(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Name as an Aiken constructor: first letter upper-cased.
    pub fn variant_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.fields.is_empty() {
            write!(f, "({})", format_fields(&self.fields))?;
        }
        Ok(())
    }
}

/// Parse a field list such as `owner:ByteArray,deadline:Int`.
pub fn parse_fields(input: &str) -> Result<Vec<FieldSpec>, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Vec::new());
    }
    parse_field_list(input)
}

/// Parse an action list such as `Claim,Cancel,Withdraw(amount:Int)`.
pub fn parse_actions(input: &str) -> Result<Vec<ActionSpec>, ParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let mut actions = Vec::new();
    let mut seen = HashSet::new();

    for part in split_top_level(input)? {
        let action = parse_action(&part)?;
        // Constructors are capitalized on render, so `claim` and `Claim` collide.
        if !seen.insert(action.name.to_ascii_lowercase()) {
            return Err(ParseError::DuplicateAction { name: action.name });
        }
        actions.push(action);
    }

    Ok(actions)
}

/// Serialize fields back into DSL form. Inverse of [`parse_fields`].
pub fn format_fields(fields: &[FieldSpec]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Serialize actions back into DSL form. Inverse of [`parse_actions`].
pub fn format_actions(actions: &[ActionSpec]) -> String {
    actions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_field_list(input: &str) -> Result<Vec<FieldSpec>, ParseError> {
    let mut fields = Vec::new();
    let mut seen = HashSet::new();

    for part in input.split(',') {
        let field = parse_field(part)?;
        if !seen.insert(field.name.clone()) {
            return Err(ParseError::DuplicateField { name: field.name });
        }
        fields.push(field);
    }

    Ok(fields)
}

fn parse_field(part: &str) -> Result<FieldSpec, ParseError> {
    let fragment = part.trim();
    if fragment.is_empty() {
        return Err(ParseError::Syntax {
            fragment: part.to_string(),
            reason: "empty field".into(),
        });
    }

    let (name, ty) = fragment.split_once(':').ok_or_else(|| ParseError::Syntax {
        fragment: fragment.to_string(),
        reason: "expected name:Type".into(),
    })?;

    let name = name.trim();
    if !is_field_identifier(name) {
        return Err(ParseError::InvalidIdentifier {
            fragment: name.to_string(),
            expected: "field names match [a-z][a-z0-9_]*",
        });
    }

    let ty = ty.trim();
    let ty = ty.parse::<FieldType>().map_err(|()| ParseError::UnknownType {
        fragment: fragment.to_string(),
        type_token: ty.to_string(),
    })?;

    Ok(FieldSpec::new(name, ty))
}

fn parse_action(part: &str) -> Result<ActionSpec, ParseError> {
    let fragment = part.trim();
    if fragment.is_empty() {
        return Err(ParseError::Syntax {
            fragment: part.to_string(),
            reason: "empty action".into(),
        });
    }

    let (name, fields) = match fragment.find('(') {
        None => (fragment, Vec::new()),
        Some(open) => {
            let rest = &fragment[open + 1..];
            let inner = rest.strip_suffix(')').ok_or_else(|| ParseError::Syntax {
                fragment: fragment.to_string(),
                reason: "unexpected text after ')'".into(),
            })?;
            if inner.contains('(') || inner.contains(')') {
                return Err(ParseError::Syntax {
                    fragment: fragment.to_string(),
                    reason: "nested parentheses are not allowed".into(),
                });
            }
            if inner.trim().is_empty() {
                return Err(ParseError::Syntax {
                    fragment: fragment.to_string(),
                    reason: "empty field list; omit the parentheses for a unit action".into(),
                });
            }
            (fragment[..open].trim(), parse_field_list(inner)?)
        }
    };

    if !is_action_identifier(name) {
        return Err(ParseError::InvalidIdentifier {
            fragment: name.to_string(),
            expected: "action names match [A-Za-z][A-Za-z0-9]*",
        });
    }

    Ok(ActionSpec {
        name: name.to_string(),
        fields,
    })
}

/// Split on commas that are not inside parentheses, rejecting unbalanced input.
fn split_top_level(input: &str) -> Result<Vec<String>, ParseError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in input.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                if depth == 0 {
                    current.push(ch);
                    return Err(ParseError::Syntax {
                        fragment: current.trim().to_string(),
                        reason: "unbalanced ')'".into(),
                    });
                }
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }

    if depth > 0 {
        return Err(ParseError::Syntax {
            fragment: current.trim().to_string(),
            reason: "unbalanced '(': missing ')'".into(),
        });
    }
    parts.push(current);

    Ok(parts)
}

/// `[a-z][a-z0-9_]*`
pub fn is_field_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Aiken keywords. Valid as DSL identifiers, but not as names in generated code.
const KEYWORDS: &[&str] = &[
    "and", "as", "bench", "const", "else", "expect", "fail", "fn", "if", "is", "let", "opaque",
    "or", "pub", "test", "todo", "trace", "type", "use", "validator", "via", "when",
];

/// Constructors in scope in every generated validator (prelude and ledger types).
const RESERVED_CONSTRUCTORS: &[&str] = &[
    "Address", "DatumHash", "False", "Finite", "InlineDatum", "Input", "Interval",
    "IntervalBound", "NegativeInfinity", "NoDatum", "None", "Output", "OutputReference", "Pair",
    "PositiveInfinity", "Script", "Some", "Transaction", "True", "VerificationKey", "Void",
];

pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

pub fn is_reserved_constructor(s: &str) -> bool {
    RESERVED_CONSTRUCTORS.contains(&s)
}

/// `[A-Za-z][A-Za-z0-9]*`
fn is_action_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric())
}
