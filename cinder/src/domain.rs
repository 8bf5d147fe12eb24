use std::fmt;

/// A value written to the store. Numbers are stored in decimal form and
/// read back as strings.
#[derive(Clone, Debug, PartialEq)]
pub enum CacheValue {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
}

impl fmt::Display for CacheValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheValue::Text(s) => f.write_str(s),
            CacheValue::Integer(n) => write!(f, "{n}"),
            CacheValue::Unsigned(n) => write!(f, "{n}"),
            CacheValue::Float(n) => write!(f, "{n}"),
        }
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        CacheValue::Text(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        CacheValue::Text(value.to_string())
    }
}

impl From<&String> for CacheValue {
    fn from(value: &String) -> Self {
        CacheValue::Text(value.clone())
    }
}

macro_rules! integer_value {
    ($($t:ty),*) => {
        $(impl From<$t> for CacheValue {
            fn from(value: $t) -> Self {
                CacheValue::Integer(value.into())
            }
        })*
    };
}

integer_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for CacheValue {
    fn from(value: u64) -> Self {
        CacheValue::Unsigned(value)
    }
}

impl From<usize> for CacheValue {
    fn from(value: usize) -> Self {
        CacheValue::Unsigned(value as u64)
    }
}

impl From<f32> for CacheValue {
    fn from(value: f32) -> Self {
        CacheValue::Float(value.into())
    }
}

impl From<f64> for CacheValue {
    fn from(value: f64) -> Self {
        CacheValue::Float(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_stored_form() {
        assert_eq!(CacheValue::from("abc").to_string(), "abc");
        assert_eq!(CacheValue::from(42).to_string(), "42");
        assert_eq!(CacheValue::from(-7i64).to_string(), "-7");
        assert_eq!(CacheValue::from(u64::MAX).to_string(), "18446744073709551615");
        assert_eq!(CacheValue::from(7usize).to_string(), "7");
        assert_eq!(CacheValue::from(1.5).to_string(), "1.5");
        assert_eq!(CacheValue::from(String::new()).to_string(), "");
    }
}
