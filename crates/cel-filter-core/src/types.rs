//! Static types known to the checker.

use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CelType {
    Bool,
    Int,
    UInt,
    Double,
    String,
    Null,
    List(Arc<CelType>),
    Map(Arc<CelType>, Arc<CelType>),
    /// Any value; checked only at runtime.
    Dyn,
    /// Placeholder in a generic overload signature, e.g. `A` in `list(A)`.
    TypeParam(Arc<str>),
    /// Result of an expression that already failed to check.
    Error,
}

impl CelType {
    /// `list(elem)`
    pub fn list(elem: CelType) -> Self {
        CelType::List(Arc::new(elem))
    }

    /// `map(key, value)`
    pub fn map(key: CelType, value: CelType) -> Self {
        CelType::Map(Arc::new(key), Arc::new(value))
    }

    /// A type parameter, bound per call during overload resolution.
    pub fn param(name: &str) -> Self {
        CelType::TypeParam(Arc::from(name))
    }

    pub fn is_dyn(&self) -> bool {
        matches!(self, CelType::Dyn)
    }

    /// Dyn and Error types unify with anything, so they never produce a
    /// second diagnostic for the same mistake.
    pub fn is_dyn_or_error(&self) -> bool {
        matches!(self, CelType::Dyn | CelType::Error)
    }

    /// Whether a value of type `other` can be used where `self` is expected,
    /// ignoring type parameters.
    pub fn is_assignable_from(&self, other: &CelType) -> bool {
        if self.is_dyn_or_error() || other.is_dyn_or_error() {
            return true;
        }
        match (self, other) {
            (CelType::TypeParam(_), _) | (_, CelType::TypeParam(_)) => true,
            (CelType::List(a), CelType::List(b)) => a.is_assignable_from(b),
            (CelType::Map(ak, av), CelType::Map(bk, bv)) => {
                ak.is_assignable_from(bk) && av.is_assignable_from(bv)
            }
            _ => self == other,
        }
    }

    /// The common type of two branches or aggregate elements, if any.
    ///
    /// Falls back to `dyn` when either side is dynamic.
    pub fn join(&self, other: &CelType) -> Option<CelType> {
        if self == other {
            return Some(self.clone());
        }
        match (self, other) {
            (CelType::Error, t) | (t, CelType::Error) => Some(t.clone()),
            (CelType::Dyn, _) | (_, CelType::Dyn) => Some(CelType::Dyn),
            (CelType::List(a), CelType::List(b)) => Some(CelType::list(a.join(b)?)),
            (CelType::Map(ak, av), CelType::Map(bk, bv)) => {
                Some(CelType::map(ak.join(bk)?, av.join(bv)?))
            }
            _ => None,
        }
    }
}

impl fmt::Display for CelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CelType::Bool => f.write_str("bool"),
            CelType::Int => f.write_str("int"),
            CelType::UInt => f.write_str("uint"),
            CelType::Double => f.write_str("double"),
            CelType::String => f.write_str("string"),
            CelType::Null => f.write_str("null_type"),
            CelType::List(elem) => write!(f, "list({elem})"),
            CelType::Map(key, value) => write!(f, "map({key}, {value})"),
            CelType::Dyn => f.write_str("dyn"),
            CelType::TypeParam(name) => f.write_str(name),
            CelType::Error => f.write_str("*error*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names() {
        let header = CelType::map(CelType::String, CelType::list(CelType::String));
        assert_eq!(header.to_string(), "map(string, list(string))");
        assert_eq!(CelType::Null.to_string(), "null_type");
    }

    #[test]
    fn assignability() {
        assert!(CelType::Dyn.is_assignable_from(&CelType::Int));
        assert!(CelType::Int.is_assignable_from(&CelType::Dyn));
        assert!(!CelType::Int.is_assignable_from(&CelType::String));
        assert!(CelType::list(CelType::Dyn).is_assignable_from(&CelType::list(CelType::Int)));
        assert!(!CelType::list(CelType::Int).is_assignable_from(&CelType::list(CelType::String)));
    }

    #[test]
    fn join() {
        assert_eq!(CelType::Int.join(&CelType::Int), Some(CelType::Int));
        assert_eq!(CelType::Int.join(&CelType::Dyn), Some(CelType::Dyn));
        assert_eq!(CelType::Int.join(&CelType::String), None);
        assert_eq!(
            CelType::list(CelType::Int).join(&CelType::list(CelType::Dyn)),
            Some(CelType::list(CelType::Dyn))
        );
    }
}
