//! Typed parsing of route and query parameter values.

use std::str;
use thiserror::Error;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("parameter `{name}` not found")]
    Missing { name: String },

    #[error("parameter `{name}` can't be parsed as {target}")]
    Invalid { name: String, target: &'static str },
}

impl ParamError {
    pub fn missing(name: &[u8]) -> Self {
        Self::Missing { name: String::from_utf8_lossy(name).into_owned() }
    }

    pub fn invalid<T>(name: &[u8]) -> Self {
        Self::Invalid { name: String::from_utf8_lossy(name).into_owned(), target: std::any::type_name::<T>() }
    }
}

/// Types a raw parameter value can be parsed into.
pub trait FromParam<'a>: Sized {
    fn from_param(raw: &'a [u8]) -> Option<Self>;
}

/// Parses `raw` into `T`, reporting failures against `name`.
pub(crate) fn parse_param<'a, T: FromParam<'a>>(name: &[u8], raw: Option<&'a [u8]>) -> Result<T, ParamError> {
    let raw = raw.ok_or_else(|| ParamError::missing(name))?;
    T::from_param(raw).ok_or_else(|| ParamError::invalid::<T>(name))
}

impl<'a> FromParam<'a> for &'a [u8] {
    fn from_param(raw: &'a [u8]) -> Option<Self> {
        Some(raw)
    }
}

impl<'a> FromParam<'a> for &'a str {
    fn from_param(raw: &'a [u8]) -> Option<Self> {
        str::from_utf8(raw).ok()
    }
}

impl<'a> FromParam<'a> for String {
    fn from_param(raw: &'a [u8]) -> Option<Self> {
        str::from_utf8(raw).ok().map(ToOwned::to_owned)
    }
}

impl<'a> FromParam<'a> for bool {
    fn from_param(raw: &'a [u8]) -> Option<Self> {
        match raw {
            b"true" | b"1" => Some(true),
            b"false" | b"0" => Some(false),
            _ => None,
        }
    }
}

macro_rules! from_param_via_from_str {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'a> FromParam<'a> for $ty {
                fn from_param(raw: &'a [u8]) -> Option<Self> {
                    str::from_utf8(raw).ok()?.parse().ok()
                }
            }
        )*
    };
}

from_param_via_from_str!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64);

/// `YYYY-MM-DD`
impl<'a> FromParam<'a> for Date {
    fn from_param(raw: &'a [u8]) -> Option<Self> {
        Date::parse(str::from_utf8(raw).ok()?, format_description!("[year]-[month]-[day]")).ok()
    }
}

/// `YYYY-MM-DDTHH:MM:SS` with an optional fraction of a second.
impl<'a> FromParam<'a> for PrimitiveDateTime {
    fn from_param(raw: &'a [u8]) -> Option<Self> {
        let format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");
        PrimitiveDateTime::parse(str::from_utf8(raw).ok()?, format).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn test_numbers() {
        assert_eq!(i32::from_param(b"-12"), Some(-12));
        assert_eq!(u8::from_param(b"256"), None);
        assert_eq!(f64::from_param(b"2.5"), Some(2.5));
        assert_eq!(u32::from_param(b""), None);
    }

    #[test]
    fn test_text() {
        assert_eq!(<&str>::from_param(b"blog"), Some("blog"));
        assert_eq!(<&str>::from_param(&[0xff, 0xfe]), None);
        assert_eq!(String::from_param(b"x"), Some("x".to_owned()));
        assert_eq!(bool::from_param(b"true"), Some(true));
        assert_eq!(bool::from_param(b"yes"), None);
    }

    #[test]
    fn test_dates() {
        assert_eq!(Date::from_param(b"2024-01-01"), Some(date!(2024-01-01)));
        assert_eq!(Date::from_param(b"2"), None);
        assert_eq!(
            PrimitiveDateTime::from_param(b"2024-01-01T10:00:00.0000250"),
            Some(datetime!(2024-01-01 10:00:00.000025))
        );
        assert_eq!(PrimitiveDateTime::from_param(b"2024-01-01T10:00:00"), Some(datetime!(2024-01-01 10:00:00)));
    }

    #[test]
    fn test_parse_param_errors() {
        assert_eq!(parse_param::<i32>(b"id", Some(b"7".as_slice())), Ok(7));
        assert!(matches!(parse_param::<i32>(b"id", None), Err(ParamError::Missing { .. })));
        assert!(matches!(parse_param::<Date>(b"id", Some(b"2".as_slice())), Err(ParamError::Invalid { .. })));
    }
}
