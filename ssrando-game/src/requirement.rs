use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{GameData, ItemCount, ItemId, OptionCheckId, RawRefId, TrickId};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RequirementError {
    #[error("unbalanced parenthesis in requirement: {0}")]
    UnbalancedParenthesis(String),
    #[error("mixed '&' and '|' at one nesting level in requirement: {0}")]
    MixedOperators(String),
    #[error("missing operand in requirement: {0}")]
    MissingOperand(String),
    #[error("missing operator between terms in requirement: {0}")]
    MissingOperator(String),
    #[error("empty requirement")]
    EmptyExpression,
    #[error("invalid option check requirement: {0}")]
    InvalidOptionCheck(String),
    #[error("invalid item count requirement: {0}")]
    InvalidItemCount(String),
    #[error("circular dependence in macro {0}")]
    CircularMacro(String),
    #[error("duplicate {kind} definition: {name}")]
    DuplicateKey { kind: &'static str, name: String },
}

/// Uncompiled requirement, as written in the logic files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Term(String),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Token<'a> {
    And,
    Or,
    Open,
    Close,
    Name(&'a str),
}

fn push_name<'a>(tokens: &mut Vec<Token<'a>>, s: &'a str) {
    let s = s.trim();
    if !s.is_empty() {
        tokens.push(Token::Name(s));
    }
}

fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = vec![];
    let mut start = 0;
    for (i, c) in text.char_indices() {
        let token = match c {
            '&' => Token::And,
            '|' => Token::Or,
            '(' => Token::Open,
            ')' => Token::Close,
            _ => continue,
        };
        push_name(&mut tokens, &text[start..i]);
        tokens.push(token);
        start = i + c.len_utf8();
    }
    push_name(&mut tokens, &text[start..]);
    tokens
}

fn find_closing_parenthesis(tokens: &[Token], start: usize) -> Option<usize> {
    let mut depth = 0;
    for (i, token) in tokens.iter().enumerate().skip(start) {
        match token {
            Token::Open => depth += 1,
            Token::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_tokens(tokens: &[Token], text: &str) -> Result<Expr, RequirementError> {
    let mut operator: Option<Token> = None;
    let mut operands: Vec<Expr> = vec![];
    let mut expect_operand = true;
    let mut pos = 0;
    while pos < tokens.len() {
        match tokens[pos] {
            Token::Open => {
                if !expect_operand {
                    return Err(RequirementError::MissingOperator(text.to_owned()));
                }
                let end = find_closing_parenthesis(tokens, pos)
                    .ok_or_else(|| RequirementError::UnbalancedParenthesis(text.to_owned()))?;
                let inner = &tokens[pos + 1..end];
                if inner.is_empty() {
                    return Err(RequirementError::MissingOperand(text.to_owned()));
                }
                operands.push(parse_tokens(inner, text)?);
                expect_operand = false;
                pos = end + 1;
            }
            Token::Close => {
                return Err(RequirementError::UnbalancedParenthesis(text.to_owned()));
            }
            Token::Name(name) => {
                if !expect_operand {
                    return Err(RequirementError::MissingOperator(text.to_owned()));
                }
                operands.push(Expr::Term(name.to_owned()));
                expect_operand = false;
                pos += 1;
            }
            op @ (Token::And | Token::Or) => {
                if expect_operand {
                    return Err(RequirementError::MissingOperand(text.to_owned()));
                }
                match operator {
                    Some(prev) if prev != op => {
                        return Err(RequirementError::MixedOperators(text.to_owned()));
                    }
                    _ => operator = Some(op),
                }
                expect_operand = true;
                pos += 1;
            }
        }
    }
    if expect_operand {
        return Err(RequirementError::MissingOperand(text.to_owned()));
    }
    Ok(match operator {
        Some(Token::And) => Expr::And(operands),
        Some(Token::Or) => Expr::Or(operands),
        // Without an operator there is exactly one operand:
        _ => operands.swap_remove(0),
    })
}

/// Parses a requirement string such as `"Bow & (Clawshots | Beetle x2)"`.
///
/// Mixing `&` and `|` at the same nesting level is rejected rather than
/// resolved by precedence.
pub fn parse_requirement(text: &str) -> Result<Expr, RequirementError> {
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return Err(RequirementError::EmptyExpression);
    }
    parse_tokens(&tokens, text)
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionCheckKind {
    Enabled,
    Disabled,
    Is(String),
    IsNot(String),
    Contains(String),
    DoesNotContain(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionCheck {
    pub option: String,
    pub kind: OptionCheckKind,
}

impl Display for OptionCheck {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let option = &self.option;
        match &self.kind {
            OptionCheckKind::Enabled => write!(f, "Option \"{option}\" Enabled"),
            OptionCheckKind::Disabled => write!(f, "Option \"{option}\" Disabled"),
            OptionCheckKind::Is(v) => write!(f, "Option \"{option}\" Is \"{v}\""),
            OptionCheckKind::IsNot(v) => write!(f, "Option \"{option}\" Is Not \"{v}\""),
            OptionCheckKind::Contains(v) => write!(f, "Option \"{option}\" Contains \"{v}\""),
            OptionCheckKind::DoesNotContain(v) => {
                write!(f, "Option \"{option}\" Does Not Contain \"{v}\"")
            }
        }
    }
}

pub fn parse_option_check(term: &str) -> Result<OptionCheck, RequirementError> {
    let err = || RequirementError::InvalidOptionCheck(term.to_owned());
    let rest = term.strip_prefix("Option \"").ok_or_else(err)?;
    let (option, rest) = rest.split_once('"').ok_or_else(err)?;
    if option.is_empty() {
        return Err(err());
    }
    let rest = rest.strip_prefix(' ').ok_or_else(err)?;
    let kind = match rest {
        "Enabled" => OptionCheckKind::Enabled,
        "Disabled" => OptionCheckKind::Disabled,
        _ => {
            let quote_idx = rest.find('"').ok_or_else(err)?;
            let verb = rest[..quote_idx].strip_suffix(' ').ok_or_else(err)?;
            let value = rest[quote_idx + 1..].strip_suffix('"').ok_or_else(err)?;
            if value.is_empty() || value.contains('"') {
                return Err(err());
            }
            let value = value.to_owned();
            match verb {
                "Is" => OptionCheckKind::Is(value),
                "Is Not" => OptionCheckKind::IsNot(value),
                "Contains" => OptionCheckKind::Contains(value),
                "Does Not Contain" => OptionCheckKind::DoesNotContain(value),
                _ => return Err(err()),
            }
        }
    };
    Ok(OptionCheck {
        option: option.to_owned(),
        kind,
    })
}

// Matches "<name> x<N>"; returns None for terms of any other shape.
fn parse_item_count(term: &str) -> Result<Option<(&str, ItemCount)>, RequirementError> {
    let Some((name, count)) = term.rsplit_once(" x") else {
        return Ok(None);
    };
    if name.is_empty() || count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    let count = count
        .parse::<ItemCount>()
        .map_err(|_| RequirementError::InvalidItemCount(term.to_owned()))?;
    Ok(Some((name, count)))
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Requirement {
    Free,
    Never,
    ItemCount(ItemId, ItemCount),
    OptionCheck(OptionCheckId),
    Trick(TrickId),
    // Event or macro name, resolved when evaluated:
    Raw(RawRefId),
    And(Vec<Requirement>),
    Or(Vec<Requirement>),
}

impl Requirement {
    pub fn make_and(reqs: Vec<Requirement>) -> Requirement {
        let mut out_reqs: Vec<Requirement> = vec![];
        for req in reqs {
            if let Requirement::Never = req {
                return Requirement::Never;
            } else if let Requirement::Free = req {
                continue;
            } else if let Requirement::And(and_reqs) = req {
                out_reqs.extend(and_reqs);
            } else {
                out_reqs.push(req);
            }
        }
        if out_reqs.len() == 1 {
            out_reqs.swap_remove(0)
        } else if out_reqs.is_empty() {
            Requirement::Free
        } else {
            Requirement::And(out_reqs)
        }
    }

    pub fn make_or(reqs: Vec<Requirement>) -> Requirement {
        let mut out_reqs: Vec<Requirement> = vec![];
        for req in reqs {
            if let Requirement::Never = req {
                continue;
            } else if let Requirement::Free = req {
                return Requirement::Free;
            } else if let Requirement::Or(or_reqs) = req {
                out_reqs.extend(or_reqs);
            } else {
                out_reqs.push(req);
            }
        }
        if out_reqs.len() == 1 {
            out_reqs.swap_remove(0)
        } else if out_reqs.is_empty() {
            Requirement::Never
        } else {
            Requirement::Or(out_reqs)
        }
    }

    pub fn collect_raw_refs(&self, out: &mut Vec<RawRefId>) {
        match self {
            &Requirement::Raw(raw_id) => out.push(raw_id),
            Requirement::And(reqs) | Requirement::Or(reqs) => {
                for r in reqs {
                    r.collect_raw_refs(out);
                }
            }
            _ => {}
        }
    }

    /// Renders the requirement back into the logic-file grammar.
    pub fn to_string_pretty(&self, game_data: &GameData) -> String {
        match self {
            Requirement::Free => "Nothing".to_string(),
            Requirement::Never => "Impossible".to_string(),
            &Requirement::ItemCount(item_id, 1) => game_data.item_isv.keys[item_id].clone(),
            &Requirement::ItemCount(item_id, count) => {
                format!("{} x{}", game_data.item_isv.keys[item_id], count)
            }
            &Requirement::OptionCheck(check_id) => {
                game_data.option_check_isv.keys[check_id].to_string()
            }
            &Requirement::Trick(trick_id) => {
                format!("{} Trick", game_data.trick_isv.keys[trick_id])
            }
            &Requirement::Raw(raw_id) => game_data.raw_isv.keys[raw_id].clone(),
            Requirement::And(reqs) => join_pretty(reqs, " & ", game_data),
            Requirement::Or(reqs) => join_pretty(reqs, " | ", game_data),
        }
    }
}

fn join_pretty(reqs: &[Requirement], sep: &str, game_data: &GameData) -> String {
    let parts: Vec<String> = reqs.iter().map(|r| r.to_string_pretty(game_data)).collect();
    format!("({})", parts.join(sep))
}

impl GameData {
    fn compile_term(&mut self, term: &str) -> Result<Requirement, RequirementError> {
        if let Some((name, count)) = parse_item_count(term)? {
            let item_id = self.item_isv.add(name);
            return Ok(Requirement::ItemCount(item_id, count));
        }
        if term.starts_with("Option \"") {
            let check = parse_option_check(term)?;
            return Ok(Requirement::OptionCheck(self.option_check_isv.add(&check)));
        }
        if let Some(trick) = term.strip_suffix(" Trick") {
            return Ok(Requirement::Trick(self.trick_isv.add(trick)));
        }
        if let Some(item_id) = self.item_isv.get(term) {
            if item_id < self.num_known_items {
                return Ok(Requirement::ItemCount(item_id, 1));
            }
        }
        if let Some(macro_id) = self.macro_isv.get(term) {
            return Ok(self.macros[macro_id].clone());
        }
        Ok(match term {
            // Time of day is not tracked, so these always hold:
            "Nothing" | "Daytime" | "Nighttime" => Requirement::Free,
            "Impossible" => Requirement::Never,
            _ => Requirement::Raw(self.raw_isv.add(term)),
        })
    }

    pub fn compile_requirement(&mut self, expr: &Expr) -> Result<Requirement, RequirementError> {
        Ok(match expr {
            Expr::Term(term) => self.compile_term(term)?,
            Expr::And(children) => Requirement::make_and(
                children
                    .iter()
                    .map(|c| self.compile_requirement(c))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Expr::Or(children) => Requirement::make_or(
                children
                    .iter()
                    .map(|c| self.compile_requirement(c))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        })
    }

    pub fn parse_and_compile(&mut self, text: &str) -> Result<Requirement, RequirementError> {
        let expr = parse_requirement(text)?;
        self.compile_requirement(&expr)
    }
}
