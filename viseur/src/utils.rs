use serde_json::Value;

use crate::KeyNotFound;

pub fn capitalize_first_letter(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Converts a string to the JSON primitive it looks like.
///
/// `"true"`/`"false"`/`"null"` (in any case) become booleans and null,
/// anything that parses as a number becomes a number, and everything else
/// stays a string.
pub fn unstringify(s: &str) -> Value {
    match s.to_uppercase().as_str() {
        "TRUE" => return Value::Bool(true),
        "FALSE" => return Value::Bool(false),
        "NULL" => return Value::Null,
        _ => {}
    }
    s.trim()
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(String::from(s)))
}

/// Checks that a string looks like an ftp, http or https url with a host.
pub fn validate_url(s: &str) -> bool {
    ["ftp://", "http://", "https://"].iter().any(|scheme| {
        s.strip_prefix(scheme)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| !c.is_whitespace() && c != '/')
    })
}

/// Escapes the characters that would otherwise be read as markup.
pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '/' => escaped.push_str("&#x2F;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Walks down a tree of JSON objects along `keys`.
pub fn traverse<'a>(value: &'a Value, keys: &[&str]) -> Result<&'a Value, KeyNotFound> {
    let mut current = value;
    for &key in keys {
        current = current.get(key).ok_or_else(|| KeyNotFound {
            key: String::from(key),
        })?;
    }
    Ok(current)
}

pub fn get_f64(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(Value::as_f64)
}

pub fn get_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

pub fn get_bool(value: &Value, key: &str) -> Option<bool> {
    value.get(key).and_then(Value::as_bool)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unstringify_primitives() {
        assert_eq!(unstringify("True"), Value::Bool(true));
        assert_eq!(unstringify("FALSE"), Value::Bool(false));
        assert_eq!(unstringify("null"), Value::Null);
        assert_eq!(unstringify("250"), json!(250.0));
        assert_eq!(unstringify("-0.5"), json!(-0.5));
        assert_eq!(unstringify("right"), json!("right"));
    }

    #[test]
    fn urls() {
        assert!(validate_url("http://localhost:3080"));
        assert!(validate_url("https://example.com/gamelogs"));
        assert!(!validate_url("localhost:3080"));
        assert!(!validate_url("http://"));
    }

    #[test]
    fn traverse_nested() {
        let data = json!({ "order": { "name": "makeMove", "args": {} } });
        assert_eq!(traverse(&data, &["order", "name"]), Ok(&json!("makeMove")));
        assert_eq!(
            traverse(&data, &["order", "index"]),
            Err(KeyNotFound {
                key: String::from("index")
            })
        );
    }

    #[test]
    fn escape() {
        assert_eq!(
            escape_html(r#"<b class="x">Tom & Jerry's</b>"#),
            "&lt;b class=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;&#x2F;b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn capitalize() {
        assert_eq!(capitalize_first_letter("deltas"), "Deltas");
        assert_eq!(capitalize_first_letter(""), "");
    }
}
