use std::fmt;
use std::iter::Peekable;
use std::ops::Deref;
use std::str::CharIndices;

use serde::Deserialize;

use crate::error::ConfigError;

/// Largest count accepted by the `X{n}` repeat notation.
pub const MAX_REPEAT: usize = 1 << 16;

/// An atomic grammar token: a glyph plus, in the indexed encoding, an
/// optional numeric instance (`A`, `A0`, `A12`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    glyph: char,
    instance: Option<u32>,
}

impl Symbol {
    pub const BRANCH_OPEN: Symbol = Symbol::new('[');
    pub const BRANCH_CLOSE: Symbol = Symbol::new(']');

    pub const fn new(glyph: char) -> Self {
        Self { glyph, instance: None }
    }

    pub const fn indexed(glyph: char, instance: u32) -> Self {
        Self {
            glyph,
            instance: Some(instance),
        }
    }

    pub fn glyph(&self) -> char {
        self.glyph
    }

    pub fn is_branch_open(&self) -> bool {
        *self == Self::BRANCH_OPEN
    }

    pub fn is_branch_close(&self) -> bool {
        *self == Self::BRANCH_CLOSE
    }

    pub fn is_bracket(&self) -> bool {
        self.is_branch_open() || self.is_branch_close()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.instance {
            Some(n) => write!(f, "{}{}", self.glyph, n),
            None => write!(f, "{}", self.glyph),
        }
    }
}

/// How grammar text is split into symbols. Fixed per grammar instance and
/// never auto-detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolEncoding {
    /// Every character is one symbol.
    #[default]
    SingleChar,
    /// A letter plus any digits that follow it is one symbol; every other
    /// character is a symbol on its own.
    Indexed,
}

impl SymbolEncoding {
    /// Tokenize `text`, expanding the repeat notation `X{n}` into `n` copies
    /// of the preceding symbol.
    pub fn parse(self, text: &str) -> Result<Sequence, ConfigError> {
        let mut symbols: Vec<Symbol> = Vec::with_capacity(text.len());
        let mut chars = text.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            match c {
                '{' => {
                    let count = read_repeat_count(text, &mut chars)?;
                    let last = *symbols.last().ok_or_else(|| ConfigError::MalformedRepeat {
                        text: text.to_string(),
                        reason: "no symbol precedes `{`",
                    })?;
                    symbols.extend(std::iter::repeat(last).take(count - 1));
                }
                '}' => {
                    return Err(ConfigError::MalformedRepeat {
                        text: text.to_string(),
                        reason: "`}` without a matching `{`",
                    });
                }
                _ if self == SymbolEncoding::SingleChar => symbols.push(Symbol::new(c)),
                _ if c.is_ascii_digit() => {
                    return Err(ConfigError::StrayDigit {
                        text: text.to_string(),
                        offset,
                    });
                }
                _ if c.is_alphabetic() => symbols.push(read_indexed(text, c, &mut chars)?),
                _ => symbols.push(Symbol::new(c)),
            }
        }

        Ok(Sequence(symbols))
    }
}

fn read_repeat_count(text: &str, chars: &mut Peekable<CharIndices<'_>>) -> Result<usize, ConfigError> {
    let malformed = |reason| ConfigError::MalformedRepeat {
        text: text.to_string(),
        reason,
    };

    let mut digits = String::new();
    loop {
        match chars.next() {
            Some((_, '}')) => break,
            Some((_, d)) if d.is_ascii_digit() => digits.push(d),
            Some(_) => return Err(malformed("braces may only contain digits")),
            None => return Err(malformed("unterminated `{`")),
        }
    }

    if digits.is_empty() {
        return Err(malformed("empty braces"));
    }
    let count: usize = digits
        .parse()
        .map_err(|_| malformed("repeat count too large"))?;
    if count == 0 {
        return Err(ConfigError::NonPositiveRepeat {
            text: text.to_string(),
        });
    }
    if count > MAX_REPEAT {
        return Err(malformed("repeat count too large"));
    }
    Ok(count)
}

fn read_indexed(text: &str, glyph: char, chars: &mut Peekable<CharIndices<'_>>) -> Result<Symbol, ConfigError> {
    let mut digits = String::new();
    while let Some(&(_, d)) = chars.peek() {
        if !d.is_ascii_digit() {
            break;
        }
        digits.push(d);
        chars.next();
    }

    if digits.is_empty() {
        return Ok(Symbol::new(glyph));
    }
    let instance = digits.parse().map_err(|_| {
        ConfigError::parameter(
            "symbol instance",
            format!("{glyph}{digits} in {text:?} does not fit in 32 bits"),
        )
    })?;
    Ok(Symbol::indexed(glyph, instance))
}

/// One generation of the grammar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Sequence(Vec<Symbol>);

impl Sequence {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, symbol: Symbol) {
        self.0.push(symbol);
    }

    pub fn extend_from_slice(&mut self, symbols: &[Symbol]) {
        self.0.extend_from_slice(symbols);
    }

    pub fn into_vec(self) -> Vec<Symbol> {
        self.0
    }
}

impl Deref for Sequence {
    type Target = [Symbol];

    fn deref(&self) -> &[Symbol] {
        &self.0
    }
}

impl From<Vec<Symbol>> for Sequence {
    fn from(symbols: Vec<Symbol>) -> Self {
        Self(symbols)
    }
}

impl FromIterator<Symbol> for Sequence {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.0 {
            write!(f, "{symbol}")?;
        }
        Ok(())
    }
}
