//! Dynamically typed binding values and their comparison semantics.
//!
//! The dirty-checker compares values with [`Value::identical`]: primitives
//! compare by value, while lists, maps, templates and opaque objects compare
//! by reference. Replacing a list with a new list of equal content counts as
//! a change; mutating shared data in place is never observed.
//!
//! The verification pass uses the looser [`dev_mode_equal`], which walks
//! lists element by element so that freshly allocated but equal lists do not
//! produce false stability errors.

use crate::def::ViewDefinition;
use crate::error::SerializeError;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A value produced by a binding expression.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value. Renders as an empty string and removes attributes/styles.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Number (all numbers are `f64`).
    Number(f64),
    /// Immutable string; compared by content.
    Str(Arc<str>),
    /// Immutable list; compared by reference.
    List(Arc<[Value]>),
    /// Immutable string-keyed map; compared by reference.
    Map(Arc<BTreeMap<String, Value>>),
    /// A template that an anchor can instantiate.
    Template(TemplateRef),
    /// Any other shared object; compared by reference.
    Opaque(Arc<dyn Any + Send + Sync>),
}

/// Shared handle to an embedded-view definition.
#[derive(Clone)]
pub struct TemplateRef(Arc<ViewDefinition>);

impl TemplateRef {
    /// Wrap a definition.
    pub fn new(def: Arc<ViewDefinition>) -> Self {
        Self(def)
    }

    /// The wrapped definition.
    pub fn definition(&self) -> &Arc<ViewDefinition> {
        &self.0
    }

    /// Reference identity.
    pub fn ptr_eq(&self, other: &TemplateRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TemplateRef({:p})", Arc::as_ptr(&self.0))
    }
}

impl Value {
    /// Build a string value.
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Build a list value from any iterator of convertible items.
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a map value from key/value pairs.
    pub fn map<K: Into<String>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Map(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Wrap an arbitrary shared object.
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    /// `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric content, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean content, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the list items, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the template, if this is a template.
    pub fn as_template(&self) -> Option<&TemplateRef> {
        match self {
            Value::Template(t) => Some(t),
            _ => None,
        }
    }

    /// Look up a key in a map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Downcast an opaque value.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Opaque(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Identity comparison used by the update pass.
    ///
    /// `NaN` is identical to `NaN` so that a binding stuck on `NaN` does not
    /// report a change on every check.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            (Value::Template(a), Value::Template(b)) => a.ptr_eq(b),
            (Value::Opaque(a), Value::Opaque(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }

    /// JS-style truthiness, used by class bindings and structural directives.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Textual form written to text nodes, attributes and styles.
    pub fn render_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::render_string)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) | Value::Opaque(_) => "[object Object]".to_string(),
            Value::Template(_) => "[object TemplateRef]".to_string(),
        }
    }

    /// Strict textual form used for debug annotations.
    ///
    /// Fails for opaque objects and templates, which have no meaningful
    /// string representation.
    pub fn try_serialize(&self) -> Result<String, SerializeError> {
        match self {
            Value::Opaque(_) => Err(SerializeError { kind: "opaque" }),
            Value::Template(_) => Err(SerializeError { kind: "template" }),
            Value::List(items) => {
                let parts = items
                    .iter()
                    .map(Value::try_serialize)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(parts.join(","))
            }
            other => Ok(other.render_string()),
        }
    }

    fn is_reference(&self) -> bool {
        matches!(self, Value::Map(_) | Value::Template(_) | Value::Opaque(_))
    }
}

/// Equality used only by the verification pass.
///
/// Lists are compared element-wise. Two non-list reference values are
/// treated as equal, since their content cannot be compared meaningfully.
/// Everything else falls back to [`Value::identical`].
pub fn dev_mode_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| dev_mode_equal(x, y))
        }
        (a, b) if a.is_reference() && b.is_reference() => true,
        (a, b) => a.identical(b),
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Value::Template(t) => fmt::Debug::fmt(t, f),
            Value::Opaque(obj) => write!(f, "Opaque({:p})", Arc::as_ptr(obj)),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items.into())
    }
}

impl From<TemplateRef> for Value {
    fn from(t: TemplateRef) -> Self {
        Value::Template(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_compare_by_value() {
        assert!(Value::from(1).identical(&Value::from(1.0)));
        assert!(Value::str("a").identical(&Value::from("a".to_string())));
        assert!(!Value::from(true).identical(&Value::from(1)));
        assert!(Value::Null.identical(&Value::Null));
    }

    #[test]
    fn nan_is_identical_to_nan() {
        assert!(Value::from(f64::NAN).identical(&Value::from(f64::NAN)));
    }

    #[test]
    fn lists_compare_by_reference() {
        let a = Value::list([1, 2, 3]);
        let b = Value::list([1, 2, 3]);
        assert!(!a.identical(&b));
        assert!(a.identical(&a.clone()));
    }

    #[test]
    fn dev_mode_equal_walks_lists() {
        let a = Value::list([Value::from(1), Value::list(["x"])]);
        let b = Value::list([Value::from(1), Value::list(["x"])]);
        assert!(dev_mode_equal(&a, &b));
        assert!(!dev_mode_equal(&a, &Value::list([1])));
    }

    #[test]
    fn dev_mode_equal_treats_objects_as_equal() {
        let a = Value::map([("k", 1)]);
        let b = Value::map([("k", 2)]);
        assert!(dev_mode_equal(&a, &b));
        assert!(!dev_mode_equal(&a, &Value::from(1)));
        assert!(!dev_mode_equal(&Value::list([1]), &a));
    }

    #[test]
    fn render_string_formats_like_text_output() {
        assert_eq!(Value::Null.render_string(), "");
        assert_eq!(Value::from(3).render_string(), "3");
        assert_eq!(Value::from(2.5).render_string(), "2.5");
        assert_eq!(Value::from(-0.0).render_string(), "0");
        assert_eq!(Value::list([1, 2]).render_string(), "1,2");
        assert_eq!(Value::map([("a", 1)]).render_string(), "[object Object]");
        assert_eq!(Value::from(f64::INFINITY).render_string(), "Infinity");
    }

    #[test]
    fn try_serialize_rejects_opaque() {
        assert!(Value::opaque(5u8).try_serialize().is_err());
        assert!(Value::list([Value::opaque(5u8)]).try_serialize().is_err());
        assert_eq!(Value::from("ok").try_serialize().unwrap(), "ok");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from(0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::list(Vec::<Value>::new()).is_truthy());
    }
}
