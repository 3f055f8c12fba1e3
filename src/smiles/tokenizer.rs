use crate::bond::Bond;
use crate::smiles::error::SyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Atom(AtomToken),
    Bond {
        bond: Bond,
        pos: usize,
    },
    RingMarker {
        bond: Option<Bond>,
        ring: u16,
        raw: String,
        pos: usize,
    },
    BranchOpen(usize),
    BranchClose(usize),
    Dot(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomToken {
    pub raw: String,
    pub kind: AtomKind,
    pub pos: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomKind {
    /// An organic-subset symbol, a single letter, or `*`.
    Simple { symbol: String, aromatic: bool },
    /// Everything between `[` and `]`, undecoded.
    Bracket { contents: String },
}

impl Token {
    /// Char offset of the token in the tokenized input.
    pub fn pos(&self) -> usize {
        match self {
            Token::Atom(a) => a.pos,
            Token::Bond { pos, .. } | Token::RingMarker { pos, .. } => *pos,
            Token::BranchOpen(pos) | Token::BranchClose(pos) | Token::Dot(pos) => *pos,
        }
    }

    /// The source text this token was scanned from, whitespace excluded.
    pub fn text(&self) -> String {
        match self {
            Token::Atom(a) => a.raw.clone(),
            Token::Bond { bond, .. } => bond.as_char().to_string(),
            Token::RingMarker { bond, raw, .. } => match bond {
                Some(b) => format!("{}{}", b.as_char(), raw),
                None => raw.clone(),
            },
            Token::BranchOpen(_) => "(".to_string(),
            Token::BranchClose(_) => ")".to_string(),
            Token::Dot(_) => ".".to_string(),
        }
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, SyntaxError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            ' ' | '\t' | '\r' | '\n' => {
                i += 1;
            }
            '[' => {
                let (tok, next) = parse_bracket_atom(&chars, i)?;
                tokens.push(Token::Atom(tok));
                i = next;
            }
            'B' if chars.get(i + 1) == Some(&'r') => {
                tokens.push(Token::Atom(simple_atom("Br", false, i)));
                i += 2;
            }
            'C' if chars.get(i + 1) == Some(&'l') => {
                tokens.push(Token::Atom(simple_atom("Cl", false, i)));
                i += 2;
            }
            c if c.is_ascii_alphabetic() => {
                tokens.push(Token::Atom(simple_atom(
                    &c.to_string(),
                    c.is_ascii_lowercase(),
                    i,
                )));
                i += 1;
            }
            '*' => {
                tokens.push(Token::Atom(simple_atom("*", false, i)));
                i += 1;
            }
            c @ ('-' | '=' | '#' | ':' | '/' | '\\') => {
                if let Some(bond) = Bond::from_char(c) {
                    tokens.push(Token::Bond { bond, pos: i });
                }
                i += 1;
            }
            '(' => {
                tokens.push(Token::BranchOpen(i));
                i += 1;
            }
            ')' => {
                tokens.push(Token::BranchClose(i));
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot(i));
                i += 1;
            }
            '%' => {
                let (ring, next) = parse_percent_ring(&chars, i)?;
                let bond = try_consume_pending_bond(&mut tokens);
                tokens.push(Token::RingMarker {
                    bond,
                    ring,
                    raw: chars[i..next].iter().collect(),
                    pos: i,
                });
                i = next;
            }
            d @ '0'..='9' => {
                let bond = try_consume_pending_bond(&mut tokens);
                tokens.push(Token::RingMarker {
                    bond,
                    ring: (d as u16) - b'0' as u16,
                    raw: d.to_string(),
                    pos: i,
                });
                i += 1;
            }
            ch => return Err(SyntaxError::UnknownCharacter { pos: i, ch }),
        }
    }

    Ok(tokens)
}

/// Spells a ring number the way a SMILES writer does: a bare digit below
/// ten, `%NN` otherwise.
pub(crate) fn ring_marker_text(ring: u16) -> String {
    if ring < 10 {
        ring.to_string()
    } else {
        format!("%{:02}", ring)
    }
}

fn simple_atom(symbol: &str, aromatic: bool, pos: usize) -> AtomToken {
    AtomToken {
        raw: symbol.to_string(),
        kind: AtomKind::Simple {
            symbol: symbol.to_string(),
            aromatic,
        },
        pos,
    }
}

fn try_consume_pending_bond(tokens: &mut Vec<Token>) -> Option<Bond> {
    if let Some(Token::Bond { .. }) = tokens.last() {
        if let Some(Token::Bond { bond, .. }) = tokens.pop() {
            return Some(bond);
        }
    }
    None
}

fn parse_percent_ring(chars: &[char], start: usize) -> Result<(u16, usize), SyntaxError> {
    let i = start + 1;
    if i + 1 >= chars.len() || !chars[i].is_ascii_digit() || !chars[i + 1].is_ascii_digit() {
        return Err(SyntaxError::InvalidRingMarker { pos: start });
    }
    let d1 = (chars[i] as u16) - b'0' as u16;
    let d2 = (chars[i + 1] as u16) - b'0' as u16;

    Ok((d1 * 10 + d2, i + 2))
}

fn parse_bracket_atom(chars: &[char], start: usize) -> Result<(AtomToken, usize), SyntaxError> {
    let close = chars[start + 1..]
        .iter()
        .position(|&c| c == ']')
        .map(|offset| start + 1 + offset)
        .ok_or(SyntaxError::UnclosedBracket { pos: start })?;

    let contents: String = chars[start + 1..close].iter().collect();
    if contents.is_empty() {
        return Err(SyntaxError::UnknownCharacter { pos: close, ch: ']' });
    }

    Ok((
        AtomToken {
            raw: chars[start..=close].iter().collect(),
            kind: AtomKind::Bracket { contents },
            pos: start,
        },
        close + 1,
    ))
}
