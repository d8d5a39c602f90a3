//! Reflection of bound values into debug attributes.

use crate::value::Value;

const MAX_REFLECTED_LEN: usize = 30;
const SERIALIZE_FAILED: &str = "[ERROR] Exception while trying to serialize the value";

/// Attribute name used to reflect the binding `name`:
/// `ng-reflect-` followed by the dash-cased name, with `$` and `@` replaced
/// by `_`.
pub fn reflect_attribute_name(name: &str) -> String {
    let mut out = String::from("ng-reflect-");
    for ch in name.chars() {
        match ch {
            '$' | '@' => out.push('_'),
            c if c.is_ascii_uppercase() => {
                out.push('-');
                out.push(c.to_ascii_lowercase());
            }
            c => out.push(c),
        }
    }
    out
}

/// Attribute value used to reflect `value`, truncated to 30 characters.
pub fn reflect_attribute_value(value: &Value) -> String {
    match value.try_serialize() {
        Ok(s) => s.chars().take(MAX_REFLECTED_LEN).collect(),
        Err(err) => {
            tracing::warn!(%err, "binding value could not be reflected");
            SERIALIZE_FAILED.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_cases_names() {
        assert_eq!(reflect_attribute_name("fooBar"), "ng-reflect-foo-bar");
        assert_eq!(reflect_attribute_name("$implicit"), "ng-reflect-_implicit");
        assert_eq!(reflect_attribute_name("@trigger"), "ng-reflect-_trigger");
    }

    #[test]
    fn truncates_long_values() {
        let long = "x".repeat(50);
        assert_eq!(reflect_attribute_value(&Value::from(long.as_str())).len(), 30);
        assert_eq!(reflect_attribute_value(&Value::from(3)), "3");
    }

    #[test]
    fn unserializable_values_get_a_placeholder() {
        let v = Value::opaque(5u8);
        assert_eq!(reflect_attribute_value(&v), SERIALIZE_FAILED);
    }
}
