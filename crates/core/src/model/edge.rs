use std::ops::{AddAssign, Neg, SubAssign};
use std::str::FromStr;

use callscope_protocol::{MetricValues, Symbol};
use thiserror::Error;

/// Separator between caller and callee in stored edge keys.
///
/// Symbol names that themselves contain this sequence cannot be told apart
/// from a caller/callee pair. Keys are split at the first occurrence and no
/// attempt is made to disambiguate.
pub const SEPARATOR: &str = "==>";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EdgeKeyError {
    #[error("empty edge key")]
    Empty,
    #[error("edge key `{0}` has no callee")]
    MissingCallee(String),
}

/// Identity of one caller→callee relationship. `caller` is `None` for root
/// invocations (no captured caller).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub caller: Option<Symbol>,
    pub callee: Symbol,
}

impl EdgeKey {
    pub fn root(callee: impl Into<Symbol>) -> Self {
        Self {
            caller: None,
            callee: callee.into(),
        }
    }

    pub fn call(caller: impl Into<Symbol>, callee: impl Into<Symbol>) -> Self {
        Self {
            caller: Some(caller.into()),
            callee: callee.into(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.caller.is_none()
    }

    /// Whether either end of the edge is `name`.
    pub fn touches(&self, name: &str) -> bool {
        self.callee == name || self.caller.as_ref().is_some_and(|c| c == name)
    }
}

/// Split a stored key into `(caller, callee)`. A key without the separator,
/// or with an empty caller portion, is a root edge.
pub fn parse_edge_key(key: &str) -> Result<(Option<Symbol>, Symbol), EdgeKeyError> {
    if key.is_empty() {
        return Err(EdgeKeyError::Empty);
    }
    let (caller, callee) = match key.split_once(SEPARATOR) {
        Some((caller, callee)) => (Some(caller).filter(|c| !c.is_empty()), callee),
        None => (None, key),
    };
    if callee.is_empty() {
        return Err(EdgeKeyError::MissingCallee(key.to_string()));
    }
    Ok((caller.map(Symbol::from), Symbol::from(callee)))
}

/// Inverse of [`parse_edge_key`] for names without the separator.
pub fn format_edge_key(caller: Option<&str>, callee: &str) -> String {
    match caller {
        Some(caller) if !caller.is_empty() => format!("{caller}{SEPARATOR}{callee}"),
        _ => callee.to_string(),
    }
}

impl FromStr for EdgeKey {
    type Err = EdgeKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (caller, callee) = parse_edge_key(s)?;
        Ok(Self { caller, callee })
    }
}

impl std::fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_edge_key(self.caller.as_deref(), &self.callee))
    }
}

/// Inclusive cost attributed to one edge: call count plus one value per metric.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Counters {
    pub calls: f64,
    pub values: MetricValues,
}

impl Counters {
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            calls: self.calls * factor,
            values: self.values.scaled(factor),
        }
    }
}

impl AddAssign for Counters {
    fn add_assign(&mut self, rhs: Self) {
        self.calls += rhs.calls;
        self.values += rhs.values;
    }
}

impl SubAssign for Counters {
    fn sub_assign(&mut self, rhs: Self) {
        self.calls -= rhs.calls;
        self.values -= rhs.values;
    }
}

impl Neg for Counters {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            calls: -self.calls,
            values: -self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_root_and_call_keys() {
        assert_eq!("main()".parse::<EdgeKey>(), Ok(EdgeKey::root("main()")));
        assert_eq!("main()==>strlen".parse::<EdgeKey>(), Ok(EdgeKey::call("main()", "strlen")));
        assert_eq!("==>boot".parse::<EdgeKey>(), Ok(EdgeKey::root("boot")));
    }

    #[test]
    fn rejects_malformed_keys() {
        assert_eq!(parse_edge_key(""), Err(EdgeKeyError::Empty));
        assert_eq!(
            parse_edge_key("main()==>"),
            Err(EdgeKeyError::MissingCallee("main()==>".into()))
        );
    }

    #[test]
    fn separator_inside_names_splits_at_first() {
        let key: EdgeKey = "a==>b==>c".parse().unwrap();
        assert_eq!(key, EdgeKey::call("a", "b==>c"));
    }

    #[test]
    fn display_matches_storage_form() {
        assert_eq!(EdgeKey::call("a", "b").to_string(), "a==>b");
        assert_eq!(EdgeKey::root("main()").to_string(), "main()");
        assert_eq!(format_edge_key(Some(""), "x"), "x");
    }

    #[test]
    fn touches_either_end() {
        let edge = EdgeKey::call("a", "b");
        assert!(edge.touches("a"));
        assert!(edge.touches("b"));
        assert!(!edge.touches("c"));
        assert!(!EdgeKey::root("b").touches("a"));
    }
}
