//! Argument splitting for typed conversion.
//!
//! A KiCad object such as
//! `(pin passive line (at 0 3.81 270) (length 1.27) hide (name "~"))`
//! has leading positional values, then named sub-lists, and sometimes bare
//! flag words after the first sub-list. [`Fields`] splits the arguments
//! that way and hands them out one accessor call at a time; whatever is left
//! over when [`Fields::finish`] runs is an unknown field.

use std::collections::{BTreeMap, VecDeque};

use thiserror::Error;
use uuid::Uuid;

use crate::parser::sexp::SExp;

/// Closed set of KiCad keywords such as stroke types or pin styles.
pub trait Keyword: Sized + Copy {
    fn keyword(self) -> &'static str;
    fn from_keyword(word: &str) -> Option<Self>;
}

/// Declare a keyword enum with its KiCad spelling and default variant.
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $kw:literal),+ $(,)? } default $default:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $kw)] $variant,)+
        }

        impl $crate::parser::fields::Keyword for $name {
            fn keyword(self) -> &'static str {
                match self {
                    $($name::$variant => $kw,)+
                }
            }

            fn from_keyword(word: &str) -> Option<Self> {
                match word {
                    $($kw => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }
    };
}
pub(crate) use keyword_enum;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Expected ({expected} ...), found {found}")]
    UnexpectedTag { expected: String, found: String },
    #[error("Unknown field '{field}' in ({parent} ...)")]
    UnknownField { parent: String, field: String },
    #[error("Missing field '{field}' in ({parent} ...)")]
    MissingField { parent: String, field: String },
    #[error("Field '{field}' appears {count} times in ({parent} ...), expected once")]
    DuplicateField {
        parent: String,
        field: String,
        count: usize,
    },
    #[error("Invalid value '{value}' for '{field}' in ({parent} ...)")]
    InvalidValue {
        parent: String,
        field: String,
        value: String,
    },
    #[error("Only the stable KiCad 6 schematic format (version 20211123) is supported, got {0}")]
    UnsupportedVersion(i64),
}

/// Types that can be built from a KiCad list.
pub trait FromSExp: Sized {
    /// Head keyword of the list this type is usually read from.
    const TAG: &'static str;

    fn from_fields(fields: &mut Fields<'_>) -> Result<Self, ModelError>;

    /// Build from the arguments of a list (the head already stripped).
    fn from_args(args: &[SExp]) -> Result<Self, ModelError> {
        let mut fields = Fields::new(Self::TAG, args);
        let value = Self::from_fields(&mut fields)?;
        fields.finish()?;
        Ok(value)
    }

    fn from_sexp(sexp: &SExp) -> Result<Self, ModelError> {
        match sexp.tag() {
            Some(tag) if tag == Self::TAG => Self::from_args(sexp.args()),
            _ => Err(ModelError::UnexpectedTag {
                expected: Self::TAG.to_string(),
                found: sexp.tag().unwrap_or("<atom>").to_string(),
            }),
        }
    }
}

pub struct Fields<'a> {
    parent: &'a str,
    positional: VecDeque<&'a SExp>,
    named: BTreeMap<&'a str, Vec<&'a [SExp]>>,
}

impl<'a> Fields<'a> {
    pub fn new(parent: &'a str, args: &'a [SExp]) -> Self {
        let split = args.iter().position(SExp::is_list).unwrap_or(args.len());
        let positional = args[..split].iter().collect();

        let mut named: BTreeMap<&'a str, Vec<&'a [SExp]>> = BTreeMap::new();
        for item in &args[split..] {
            match item {
                SExp::List(_) => {
                    if let Some(tag) = item.tag() {
                        named.entry(tag).or_default().push(item.args());
                    }
                }
                // bare words after the first sub-list are flags: `hide`
                SExp::Atom(word) | SExp::Str(word) => {
                    named.entry(word.as_str()).or_default().push(&[]);
                }
            }
        }

        Self {
            parent,
            positional,
            named,
        }
    }

    pub fn parent(&self) -> &str {
        self.parent
    }

    pub fn invalid(&self, field: &str, value: impl ToString) -> ModelError {
        ModelError::InvalidValue {
            parent: self.parent.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn missing(&self, field: &str) -> ModelError {
        ModelError::MissingField {
            parent: self.parent.to_string(),
            field: field.to_string(),
        }
    }

    pub fn has_positional(&self) -> bool {
        !self.positional.is_empty()
    }

    pub fn peek_positional(&self) -> Option<&'a SExp> {
        self.positional.front().copied()
    }

    pub fn opt_positional(&mut self) -> Option<&'a SExp> {
        self.positional.pop_front()
    }

    pub fn positional(&mut self, what: &str) -> Result<&'a SExp, ModelError> {
        self.opt_positional().ok_or_else(|| self.missing(what))
    }

    pub fn positional_str(&mut self, what: &str) -> Result<String, ModelError> {
        let item = self.positional(what)?;
        item.as_atom()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(what, item))
    }

    pub fn positional_f64(&mut self, what: &str) -> Result<f64, ModelError> {
        let item = self.positional(what)?;
        item.as_f64().ok_or_else(|| self.invalid(what, item))
    }

    pub fn positional_keyword<T: Keyword>(&mut self, what: &str) -> Result<T, ModelError> {
        let item = self.positional(what)?;
        item.as_atom()
            .and_then(T::from_keyword)
            .ok_or_else(|| self.invalid(what, item))
    }

    /// `(key word)` for a keyword enum.
    pub fn keyword<T: Keyword>(&mut self, key: &str) -> Result<Option<T>, ModelError> {
        let Some(word) = self.string(key)? else {
            return Ok(None);
        };
        T::from_keyword(&word)
            .map(Some)
            .ok_or_else(|| self.invalid(key, word))
    }

    /// Remove every occurrence of `key`.
    pub fn take_all(&mut self, key: &str) -> Vec<&'a [SExp]> {
        self.named.remove(key).unwrap_or_default()
    }

    /// Remove `key`, which may appear at most once.
    pub fn take(&mut self, key: &str) -> Result<Option<&'a [SExp]>, ModelError> {
        let mut all = self.take_all(key);
        match all.len() {
            0 => Ok(None),
            1 => Ok(all.pop()),
            count => Err(ModelError::DuplicateField {
                parent: self.parent.to_string(),
                field: key.to_string(),
                count,
            }),
        }
    }

    fn single<'s>(&self, key: &str, args: &'s [SExp]) -> Result<&'s SExp, ModelError> {
        match args {
            [one] => Ok(one),
            [] => Err(self.missing(key)),
            more => Err(self.invalid(key, SExp::List(more.to_vec()))),
        }
    }

    pub fn string(&mut self, key: &str) -> Result<Option<String>, ModelError> {
        let Some(args) = self.take(key)? else {
            return Ok(None);
        };
        let item = self.single(key, args)?;
        item.as_atom()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| self.invalid(key, item))
    }

    pub fn number(&mut self, key: &str) -> Result<Option<f64>, ModelError> {
        let Some(args) = self.take(key)? else {
            return Ok(None);
        };
        let item = self.single(key, args)?;
        item.as_f64()
            .map(Some)
            .ok_or_else(|| self.invalid(key, item))
    }

    pub fn int(&mut self, key: &str) -> Result<Option<i64>, ModelError> {
        let Some(args) = self.take(key)? else {
            return Ok(None);
        };
        let item = self.single(key, args)?;
        item.as_i64()
            .map(Some)
            .ok_or_else(|| self.invalid(key, item))
    }

    /// `(key yes)` / `(key no)`; a bare `key` flag also counts as yes.
    pub fn yes_no(&mut self, key: &str) -> Result<Option<bool>, ModelError> {
        let Some(args) = self.take(key)? else {
            return Ok(None);
        };
        match args {
            [] => Ok(Some(true)),
            [item] => match item.as_atom() {
                Some("yes") => Ok(Some(true)),
                Some("no") => Ok(Some(false)),
                _ => Err(self.invalid(key, item)),
            },
            more => Err(self.invalid(key, SExp::List(more.to_vec()))),
        }
    }

    /// Presence of a bare flag or an empty list such as `(fields_autoplaced)`.
    pub fn flag(&mut self, key: &str) -> Result<bool, ModelError> {
        Ok(self.yes_no(key)?.unwrap_or(false))
    }

    fn numbers(&self, key: &str, args: &[SExp], expected: usize) -> Result<Vec<f64>, ModelError> {
        let values: Option<Vec<f64>> = args.iter().map(SExp::as_f64).collect();
        match values {
            Some(v) if v.len() == expected => Ok(v),
            _ => Err(self.invalid(key, SExp::List(args.to_vec()))),
        }
    }

    pub fn point2(&mut self, key: &str) -> Result<Option<(f64, f64)>, ModelError> {
        let Some(args) = self.take(key)? else {
            return Ok(None);
        };
        let v = self.numbers(key, args, 2)?;
        Ok(Some((v[0], v[1])))
    }

    /// `(at x y angle)`; the angle defaults to 0 when omitted.
    pub fn point3(&mut self, key: &str) -> Result<Option<(f64, f64, f64)>, ModelError> {
        let Some(args) = self.take(key)? else {
            return Ok(None);
        };
        let expected = if args.len() == 2 { 2 } else { 3 };
        let v = self.numbers(key, args, expected)?;
        Ok(Some((v[0], v[1], v.get(2).copied().unwrap_or(0.0))))
    }

    pub fn color(&mut self, key: &str) -> Result<Option<Color>, ModelError> {
        let Some(args) = self.take(key)? else {
            return Ok(None);
        };
        let v = self.numbers(key, args, 4)?;
        let channel = |x: f64| -> Result<u8, ModelError> {
            if (0.0..=255.0).contains(&x) {
                Ok(x as u8)
            } else {
                Err(self.invalid(key, x))
            }
        };
        Ok(Some(Color {
            r: channel(v[0])?,
            g: channel(v[1])?,
            b: channel(v[2])?,
            a: v[3],
        }))
    }

    /// `(uuid ...)`, or a fresh v4 UUID when the field is absent.
    pub fn uuid(&mut self) -> Result<Uuid, ModelError> {
        match self.string("uuid")? {
            Some(text) => Uuid::parse_str(&text).map_err(|_| self.invalid("uuid", text)),
            None => Ok(Uuid::new_v4()),
        }
    }

    pub fn child<T: FromSExp>(&mut self, key: &str) -> Result<Option<T>, ModelError> {
        self.take(key)?.map(T::from_args).transpose()
    }

    pub fn children<T: FromSExp>(&mut self, key: &str) -> Result<Vec<T>, ModelError> {
        self.take_all(key).into_iter().map(T::from_args).collect()
    }

    /// Fail on anything no accessor consumed.
    pub fn finish(self) -> Result<(), ModelError> {
        if let Some(extra) = self.positional.front() {
            return Err(ModelError::UnknownField {
                parent: self.parent.to_string(),
                field: extra.to_string(),
            });
        }
        if let Some(key) = self.named.keys().next() {
            return Err(ModelError::UnknownField {
                parent: self.parent.to_string(),
                field: key.to_string(),
            });
        }
        Ok(())
    }
}

/// RGBA colour as KiCad writes it: `(color 255 0 0 0.5)`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const TRANSPARENT: Color = Color { r: 0, g: 0, b: 0, a: 0.0 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 1.0 };
}
