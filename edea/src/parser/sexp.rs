//! KiCad S-expression reader and tree.
//!
//! KiCad stores schematics and boards as nested lists such as
//! `(symbol (lib_id "Device:R") (at 10 20 0))`. The tree keeps quoted
//! strings apart from bare tokens so a file can be written back with the
//! same quoting it was read with.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unexpected ')' at position {0}")]
    UnexpectedClose(usize),
    #[error("Unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("List without a head at position {0}")]
    EmptyList(usize),
    #[error("Trailing input at position {0}")]
    TrailingInput(usize),
}

/// Tags whose positional children get shifted by [`SExp::translate`].
const MOVABLE_PARENTS: &[&str] = &[
    "module", "footprint", "gr_text", "gr_poly", "gr_line", "gr_arc", "via", "segment",
    "dimension", "gr_circle", "gr_curve", "arc",
];
const MOVABLE_TAGS: &[&str] = &["at", "xy", "start", "end", "center"];

#[derive(Debug, Clone, PartialEq)]
pub enum SExp {
    /// Bare token: keyword, number, `yes`/`no`.
    Atom(String),
    /// Double-quoted string, stored unescaped.
    Str(String),
    List(Vec<SExp>),
}

impl SExp {
    pub fn atom(s: impl Into<String>) -> Self {
        SExp::Atom(s.into())
    }

    pub fn string(s: impl Into<String>) -> Self {
        SExp::Str(s.into())
    }

    /// Number atom in KiCad notation: at most four decimals, no trailing zeros.
    pub fn number(v: f64) -> Self {
        SExp::Atom(format_number(v))
    }

    /// Build `(tag items...)`.
    pub fn list(tag: &str, items: Vec<SExp>) -> Self {
        let mut all = Vec::with_capacity(items.len() + 1);
        all.push(SExp::Atom(tag.to_string()));
        all.extend(items);
        SExp::List(all)
    }

    /// Text of an atom or string.
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExp::Atom(s) | SExp::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SExp::Atom(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SExp::Atom(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, SExp::List(_))
    }

    pub fn as_list(&self) -> Option<&[SExp]> {
        match self {
            SExp::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<SExp>> {
        match self {
            SExp::List(items) => Some(items),
            _ => None,
        }
    }

    /// Head keyword of a list, e.g. `symbol` for `(symbol ...)`.
    pub fn tag(&self) -> Option<&str> {
        match self {
            SExp::List(items) => match items.first() {
                Some(SExp::Atom(s)) => Some(s),
                _ => None,
            },
            _ => None,
        }
    }

    /// Everything after the head.
    pub fn args(&self) -> &[SExp] {
        match self {
            SExp::List(items) if !items.is_empty() => &items[1..],
            _ => &[],
        }
    }

    /// Positional argument `index` (0 is the first item after the head).
    pub fn arg(&self, index: usize) -> Option<&SExp> {
        self.args().get(index)
    }

    /// Append an item to a list. No-op on atoms.
    pub fn push(&mut self, item: SExp) {
        if let SExp::List(items) = self {
            items.push(item);
        }
    }

    /// First direct child list whose head is `key`.
    pub fn find(&self, key: &str) -> Option<&SExp> {
        self.args().iter().find(|item| item.tag() == Some(key))
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut SExp> {
        match self {
            SExp::List(items) => items.iter_mut().skip(1).find(|item| item.tag() == Some(key)),
            _ => None,
        }
    }

    /// All direct child lists whose head is `key`, in file order.
    pub fn find_all(&self, key: &str) -> Vec<&SExp> {
        self.args()
            .iter()
            .filter(|item| item.tag() == Some(key))
            .collect()
    }

    /// First argument of the `key` child: `(uuid abc)` -> `abc`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.find(key).and_then(|e| e.arg(0)).and_then(SExp::as_atom)
    }

    /// Value of `(property "name" "value" ...)`.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.find_all("property")
            .into_iter()
            .find(|p| p.arg(0).and_then(SExp::as_atom) == Some(name))
            .and_then(|p| p.arg(1))
            .and_then(SExp::as_atom)
    }

    /// Property key/value pairs in file order.
    pub fn properties(&self) -> Vec<(&str, &str)> {
        self.find_all("property")
            .into_iter()
            .filter_map(|p| {
                let key = p.arg(0)?.as_atom()?;
                let value = p.arg(1)?.as_atom()?;
                Some((key, value))
            })
            .collect()
    }

    /// True if `word` appears as a bare atom argument, e.g. `hide`.
    pub fn contains_flag(&self, word: &str) -> bool {
        self.args()
            .iter()
            .any(|a| matches!(a, SExp::Atom(s) if s == word))
    }

    /// Pre-order visit of every list node.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a SExp)) {
        if let SExp::List(items) = self {
            f(self);
            for item in items {
                item.walk(f);
            }
        }
    }

    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut SExp)) {
        if self.is_list() {
            f(self);
        }
        if let SExp::List(items) = self {
            for item in items.iter_mut() {
                item.walk_mut(f);
            }
        }
    }

    /// Shift every positioned board item by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.walk_mut(&mut |node| {
            let is_parent = node.tag().is_some_and(|t| MOVABLE_PARENTS.contains(&t));
            if !is_parent {
                return;
            }
            if let Some(items) = node.as_list_mut() {
                for child in items.iter_mut().skip(1) {
                    if child.tag().is_some_and(|t| MOVABLE_TAGS.contains(&t)) {
                        child.shift_xy(dx, dy);
                    }
                }
            }
        });
    }

    fn shift_xy(&mut self, dx: f64, dy: f64) {
        let Some(items) = self.as_list_mut() else {
            return;
        };
        for (idx, delta) in [(1, dx), (2, dy)] {
            if let Some(v) = items.get(idx).and_then(SExp::as_f64) {
                items[idx] = SExp::number(v + delta);
            }
        }
    }

    /// Multi-line rendering with one nested list per line.
    pub fn to_pretty_string(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0);
        out.push('\n');
        out
    }

    fn write_pretty(&self, out: &mut String, depth: usize) {
        match self {
            SExp::List(items) if items.iter().skip(1).any(SExp::is_list) => {
                out.push('(');
                let mut first = true;
                for item in items {
                    if item.is_list() {
                        out.push('\n');
                        out.push_str(&"  ".repeat(depth + 1));
                        item.write_pretty(out, depth + 1);
                    } else {
                        if !first {
                            out.push(' ');
                        }
                        out.push_str(&item.to_string());
                    }
                    first = false;
                }
                out.push(')');
            }
            other => out.push_str(&other.to_string()),
        }
    }
}

pub(crate) fn format_number(v: f64) -> String {
    let rounded = (v * 10_000.0).round() / 10_000.0;
    // avoid "-0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{}", rounded)
}

impl fmt::Display for SExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExp::Atom(s) => write!(f, "{}", s),
            SExp::Str(s) => {
                let escaped = s
                    .replace('\\', "\\\\")
                    .replace('"', "\\\"")
                    .replace('\n', "\\n")
                    .replace('\t', "\\t")
                    .replace('\r', "\\r");
                write!(f, "\"{}\"", escaped)
            }
            SExp::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

pub struct SExpParser {
    input: Vec<char>,
    pos: usize,
}

impl SExpParser {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Read exactly one expression; anything but whitespace after it is an error.
    pub fn parse(&mut self) -> Result<SExp, ParseError> {
        self.skip_whitespace();
        if self.is_eof() {
            return Err(ParseError::UnexpectedEof);
        }
        let expr = self.parse_sexp()?;
        self.skip_whitespace();
        if !self.is_eof() {
            return Err(ParseError::TrailingInput(self.pos));
        }
        Ok(expr)
    }

    fn parse_sexp(&mut self) -> Result<SExp, ParseError> {
        self.skip_whitespace();

        if self.is_eof() {
            return Err(ParseError::UnexpectedEof);
        }

        match self.peek() {
            '(' => self.parse_list(),
            ')' => Err(ParseError::UnexpectedClose(self.pos)),
            '"' => self.parse_string(),
            _ => self.parse_symbol(),
        }
    }

    fn parse_list(&mut self) -> Result<SExp, ParseError> {
        let start = self.pos;
        self.expect_char('(')?;
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_eof() {
                return Err(ParseError::UnexpectedEof);
            }

            if self.peek() == ')' {
                self.advance();
                break;
            }

            items.push(self.parse_sexp()?);
        }

        match items.first() {
            Some(SExp::Atom(_)) => Ok(SExp::List(items)),
            _ => Err(ParseError::EmptyList(start)),
        }
    }

    fn parse_string(&mut self) -> Result<SExp, ParseError> {
        self.expect_char('"')?;
        let mut s = String::new();
        let mut escaped = false;

        loop {
            if self.is_eof() {
                return Err(ParseError::UnexpectedEof);
            }
            let ch = self.peek();
            self.advance();

            if escaped {
                match ch {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    'r' => s.push('\r'),
                    _ => s.push(ch),
                }
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                break;
            } else {
                s.push(ch);
            }
        }

        Ok(SExp::Str(s))
    }

    fn parse_symbol(&mut self) -> Result<SExp, ParseError> {
        let mut s = String::new();

        while !self.is_eof() {
            let ch = self.peek();
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                break;
            }
            s.push(ch);
            self.advance();
        }

        if s.is_empty() {
            Err(ParseError::UnexpectedToken(self.peek().to_string()))
        } else {
            Ok(SExp::Atom(s))
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn peek(&self) -> char {
        if self.pos < self.input.len() {
            self.input[self.pos]
        } else {
            '\0'
        }
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn expect_char(&mut self, expected: char) -> Result<(), ParseError> {
        if self.is_eof() {
            return Err(ParseError::UnexpectedEof);
        }

        let ch = self.peek();
        if ch == expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken(format!(
                "Expected '{}', found '{}'",
                expected, ch
            )))
        }
    }
}

/// Parse a string holding one KiCad expression.
pub fn from_str(text: &str) -> Result<SExp, ParseError> {
    SExpParser::new(text).parse()
}
