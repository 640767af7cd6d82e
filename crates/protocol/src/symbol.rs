use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Function name from a profiling run (`main()`, `App\Kernel::handle`).
///
/// The same callee appears in many edges and in every row built from them,
/// so names are shared rather than copied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name-column ordering: bytes compared after ASCII upper-casing, so
    /// `aB` sorts before `a_b` (`B` < `_`).
    pub fn cmp_ignore_case(&self, other: &Symbol) -> Ordering {
        let lhs = self.0.bytes().map(|b| b.to_ascii_uppercase());
        lhs.cmp(other.0.bytes().map(|b| b.to_ascii_uppercase()))
    }
}

impl std::ops::Deref for Symbol {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

// Lets `HashMap<Symbol, _>` be queried with a plain `&str`.
impl std::borrow::Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self(name.into())
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Self(name.into())
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
