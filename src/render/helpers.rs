//! Generic pure template helpers (spec.md §6, "Generic" list).
//!
//! Engine-agnostic implementations over [`serde_json::Value`], so both
//! concrete adapters (`tera_adapter`, `handlebars_adapter`) wrap the same
//! logic instead of reimplementing it per engine.

use serde_json::{Map, Value};

/// `eq(a, b)`
#[must_use]
pub fn eq(a: &Value, b: &Value) -> bool {
    a == b
}

/// `ne(a, b)`
#[must_use]
pub fn ne(a: &Value, b: &Value) -> bool {
    a != b
}

/// `lt`/`lte`/`gt`/`gte` over numeric values; non-numeric operands compare
/// false for every relation.
#[must_use]
pub fn lt(a: &Value, b: &Value) -> bool {
    numeric_cmp(a, b).is_some_and(|o| o == std::cmp::Ordering::Less)
}

#[must_use]
pub fn lte(a: &Value, b: &Value) -> bool {
    numeric_cmp(a, b).is_some_and(|o| o != std::cmp::Ordering::Greater)
}

#[must_use]
pub fn gt(a: &Value, b: &Value) -> bool {
    numeric_cmp(a, b).is_some_and(|o| o == std::cmp::Ordering::Greater)
}

#[must_use]
pub fn gte(a: &Value, b: &Value) -> bool {
    numeric_cmp(a, b).is_some_and(|o| o != std::cmp::Ordering::Less)
}

fn numeric_cmp(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    a.as_f64().zip(b.as_f64()).and_then(|(a, b)| a.partial_cmp(&b))
}

/// `and(a, b)` / `or(a, b)` / `not(a)`: JSON truthiness per
/// [`is_truthy`] - `false`, `null`, `0`, `""`, and empty arrays/objects are
/// falsy, everything else is truthy.
#[must_use]
pub fn and(a: &Value, b: &Value) -> bool {
    is_truthy(a) && is_truthy(b)
}

#[must_use]
pub fn or(a: &Value, b: &Value) -> bool {
    is_truthy(a) || is_truthy(b)
}

#[must_use]
pub fn not(a: &Value) -> bool {
    !is_truthy(a)
}

#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// `lowercase`
#[must_use]
pub fn lowercase(s: &str) -> String {
    s.to_lowercase()
}

/// `uppercase`
#[must_use]
pub fn uppercase(s: &str) -> String {
    s.to_uppercase()
}

/// `capitalize`: uppercase the first character only.
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// `title_case`: capitalize each whitespace-separated word.
#[must_use]
pub fn title_case(s: &str) -> String {
    s.split_whitespace().map(capitalize).collect::<Vec<_>>().join(" ")
}

/// `trim`: strip leading/trailing whitespace.
#[must_use]
pub fn trim(s: &str) -> String {
    s.trim().to_string()
}

/// `split(s, separator)`
#[must_use]
pub fn split(s: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return s.chars().map(String::from).collect();
    }
    s.split(separator).map(str::to_string).collect()
}

/// `replace(s, from, to)`: every non-overlapping occurrence of `from`.
#[must_use]
pub fn replace(s: &str, from: &str, to: &str) -> String {
    s.replace(from, to)
}

/// `substring(s, start, end?)`: a byte-index slice, clamped to `s`'s
/// bounds and snapped inward to the nearest char boundary so the helper
/// never panics on multi-byte input.
#[must_use]
pub fn substring(s: &str, start: usize, end: Option<usize>) -> String {
    let len = s.len();
    let start = start.min(len);
    let end = end.map_or(len, |e| e.min(len)).max(start);
    let start = (start..=len).find(|&i| s.is_char_boundary(i)).unwrap_or(len);
    let end = (end..=len).find(|&i| s.is_char_boundary(i)).unwrap_or(len);
    s[start..end].to_string()
}

/// `escape`: HTML-escape `&`, `<`, `>`, `"`, `'`.
#[must_use]
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// `slugify`: lowercase, non-alphanumerics collapsed to single hyphens,
/// leading/trailing hyphens trimmed.
#[must_use]
pub fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_hyphen = true;
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            out.push('-');
            last_was_hyphen = true;
        }
    }
    if out.ends_with('-') {
        out.pop();
    }
    out
}

/// `where(array, key, value)`: elements whose `key` field equals `value`.
#[must_use]
pub fn where_eq<'a>(array: &'a [Value], key: &str, value: &Value) -> Vec<&'a Value> {
    array.iter().filter(|item| item.get(key) == Some(value)).collect()
}

/// `where_includes(array, key, value)`: elements whose `key` field is an
/// array containing `value`.
#[must_use]
pub fn where_includes<'a>(array: &'a [Value], key: &str, value: &Value) -> Vec<&'a Value> {
    array
        .iter()
        .filter(|item| item.get(key).and_then(Value::as_array).is_some_and(|arr| arr.contains(value)))
        .collect()
}

/// `sort_by(array, key)`: a stable sort by a field's string/number
/// representation.
#[must_use]
pub fn sort_by(array: &[Value], key: &str) -> Vec<Value> {
    let mut sorted: Vec<Value> = array.to_vec();
    sorted.sort_by(|a, b| sort_key(a, key).cmp(&sort_key(b, key)));
    sorted
}

fn sort_key(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// `pluck(array, key)`: project one field from each element.
#[must_use]
pub fn pluck(array: &[Value], key: &str) -> Vec<Value> {
    array.iter().map(|item| item.get(key).cloned().unwrap_or(Value::Null)).collect()
}

/// `group_by(array, key)`: group elements under each distinct value of
/// `key`, preserving first-seen group order.
#[must_use]
pub fn group_by(array: &[Value], key: &str) -> Vec<(String, Vec<Value>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<Value>> = std::collections::HashMap::new();
    for item in array {
        let group_key = sort_key(item, key);
        groups.entry(group_key.clone()).or_insert_with(|| {
            order.push(group_key.clone());
            Vec::new()
        }).push(item.clone());
    }
    order.into_iter().map(|k| (k.clone(), groups.remove(&k).unwrap_or_default())).collect()
}

/// `unique(array)`: drop structurally-equal duplicates, preserving order.
#[must_use]
pub fn unique(array: &[Value]) -> Vec<Value> {
    let mut seen: Vec<Value> = Vec::new();
    for item in array {
        if !seen.contains(item) {
            seen.push(item.clone());
        }
    }
    seen
}

/// `first(array)`
#[must_use]
pub fn first(array: &[Value]) -> Value {
    array.first().cloned().unwrap_or(Value::Null)
}

/// `last(array)`
#[must_use]
pub fn last(array: &[Value]) -> Value {
    array.last().cloned().unwrap_or(Value::Null)
}

/// `flatten(array)`: one level of nested-array flattening.
#[must_use]
pub fn flatten(array: &[Value]) -> Vec<Value> {
    let mut out = Vec::new();
    for item in array {
        match item {
            Value::Array(inner) => out.extend(inner.iter().cloned()),
            other => out.push(other.clone()),
        }
    }
    out
}

/// `compact(array)`: drop `null` elements.
#[must_use]
pub fn compact(array: &[Value]) -> Vec<Value> {
    array.iter().filter(|v| !v.is_null()).cloned().collect()
}

/// `reverse(array)`
#[must_use]
pub fn reverse(array: &[Value]) -> Vec<Value> {
    array.iter().rev().cloned().collect()
}

/// `length(value)`: element count for arrays/objects, character count for
/// strings, `0` otherwise.
#[must_use]
pub fn length(value: &Value) -> usize {
    match value {
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        Value::String(s) => s.chars().count(),
        _ => 0,
    }
}

/// `default_value(value, fallback)`: `fallback` when `value` is `null`.
#[must_use]
pub fn default_value(value: &Value, fallback: &Value) -> Value {
    if value.is_null() { fallback.clone() } else { value.clone() }
}

/// `array(...)`: wrap arguments into a JSON array, as templates have no
/// array-literal syntax of their own.
#[must_use]
pub fn array(values: &[Value]) -> Vec<Value> {
    values.to_vec()
}

/// `identity(value)`: returns `value` unchanged - useful as a no-op
/// projection passed where a helper expects a transform.
#[must_use]
pub fn identity(value: &Value) -> Value {
    value.clone()
}

/// `json(value)`: compact JSON-serialize `value` for inline embedding.
#[must_use]
pub fn json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

/// `concat(arrays...)`: flatten a list of arrays into one, preserving
/// order.
#[must_use]
pub fn concat(arrays: &[Vec<Value>]) -> Vec<Value> {
    arrays.iter().flat_map(|a| a.iter().cloned()).collect()
}

/// `is_array` / `is_object` / `is_string` / `is_number` / `is_boolean` /
/// `is_nil`: JSON type predicates.
#[must_use]
pub fn is_array(value: &Value) -> bool {
    value.is_array()
}

#[must_use]
pub fn is_object(value: &Value) -> bool {
    value.is_object()
}

#[must_use]
pub fn is_string(value: &Value) -> bool {
    value.is_string()
}

#[must_use]
pub fn is_number(value: &Value) -> bool {
    value.is_number()
}

#[must_use]
pub fn is_boolean(value: &Value) -> bool {
    value.is_boolean()
}

#[must_use]
pub fn is_nil(value: &Value) -> bool {
    value.is_null()
}

/// `type_of(value)`: one of `"array"`, `"object"`, `"string"`, `"number"`,
/// `"boolean"`, `"null"`.
#[must_use]
pub fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `values(object)`: an object's values, in key-insertion order.
#[must_use]
pub fn values(object: &Map<String, Value>) -> Vec<Value> {
    object.values().cloned().collect()
}

/// `keys(object)`: an object's keys, in key-insertion order.
#[must_use]
pub fn keys(object: &Map<String, Value>) -> Vec<String> {
    object.keys().cloned().collect()
}

/// `lookup(object, key)` / `get(object, key)`: identical dotted-path-free
/// single-key lookups, `null` when absent - two names for the same
/// operation because both appear independently across the example
/// template corpora this helper set was drawn from.
#[must_use]
pub fn lookup(object: &Value, key: &str) -> Value {
    object.get(key).cloned().unwrap_or(Value::Null)
}

#[must_use]
pub fn get(object: &Value, key: &str) -> Value {
    lookup(object, key)
}

/// `has(object, key)` / `exists(value)`: presence checks - `has` on a
/// specific key, `exists` on whether a value is non-null.
#[must_use]
pub fn has(object: &Value, key: &str) -> bool {
    object.get(key).is_some()
}

#[must_use]
pub fn exists(value: &Value) -> bool {
    !value.is_null()
}

/// `add(a, b)` / `sub(a, b)`: numeric arithmetic; non-numeric operands
/// yield `0.0`.
#[must_use]
pub fn add(a: &Value, b: &Value) -> f64 {
    a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0)
}

#[must_use]
pub fn sub(a: &Value, b: &Value) -> f64 {
    a.as_f64().unwrap_or(0.0) - b.as_f64().unwrap_or(0.0)
}

/// `abs(value)`
#[must_use]
pub fn abs(value: &Value) -> f64 {
    value.as_f64().unwrap_or(0.0).abs()
}

/// Dispatch one of the generic helpers above by name over untyped JSON
/// arguments, so each concrete adapter wires its engine-specific function/
/// filter/helper trait against one shared table instead of reimplementing
/// ~50 near-identical bindings per engine.
///
/// Returns `None` for a name this table doesn't know (the caller then
/// tries [`crate::render::struktur_helpers::call`] before giving up).
/// Wrong-arity or wrong-type calls degrade to the same defaults the typed
/// functions above already use (`0.0` for arithmetic, `null` for lookups)
/// rather than erroring, matching this helper set's "always pure, never
/// panics" contract.
#[must_use]
pub fn call(name: &str, args: &[Value]) -> Option<Value> {
    let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Null);
    let str_arg = |i: usize| args.get(i).and_then(Value::as_str).unwrap_or("").to_string();
    let array_arg = |i: usize| args.get(i).and_then(Value::as_array).cloned().unwrap_or_default();
    let object_arg = |i: usize| args.get(i).and_then(Value::as_object).cloned().unwrap_or_default();

    Some(match name {
        "eq" => Value::Bool(eq(&arg(0), &arg(1))),
        "ne" => Value::Bool(ne(&arg(0), &arg(1))),
        "lt" => Value::Bool(lt(&arg(0), &arg(1))),
        "lte" => Value::Bool(lte(&arg(0), &arg(1))),
        "gt" => Value::Bool(gt(&arg(0), &arg(1))),
        "gte" => Value::Bool(gte(&arg(0), &arg(1))),
        "and" => Value::Bool(and(&arg(0), &arg(1))),
        "or" => Value::Bool(or(&arg(0), &arg(1))),
        "not" => Value::Bool(not(&arg(0))),
        "is_truthy" => Value::Bool(is_truthy(&arg(0))),
        "lowercase" => Value::String(lowercase(&str_arg(0))),
        "uppercase" => Value::String(uppercase(&str_arg(0))),
        "capitalize" => Value::String(capitalize(&str_arg(0))),
        "title_case" => Value::String(title_case(&str_arg(0))),
        "trim" => Value::String(trim(&str_arg(0))),
        "split" => Value::Array(split(&str_arg(0), &str_arg(1)).into_iter().map(Value::String).collect()),
        "replace" => Value::String(replace(&str_arg(0), &str_arg(1), &str_arg(2))),
        "substring" => {
            let start = args.first().and_then(Value::as_u64).unwrap_or(0) as usize;
            let end = args.get(2).and_then(Value::as_u64).map(|e| e as usize);
            Value::String(substring(&str_arg(0), start, end))
        }
        "escape" => Value::String(escape(&str_arg(0))),
        "slugify" => Value::String(slugify(&str_arg(0))),
        "where" => Value::Array(where_eq(&array_arg(0), &str_arg(1), &arg(2)).into_iter().cloned().collect()),
        "where_includes" => {
            Value::Array(where_includes(&array_arg(0), &str_arg(1), &arg(2)).into_iter().cloned().collect())
        }
        "sort_by" => Value::Array(sort_by(&array_arg(0), &str_arg(1))),
        "pluck" => Value::Array(pluck(&array_arg(0), &str_arg(1))),
        "group_by" => Value::Array(
            group_by(&array_arg(0), &str_arg(1))
                .into_iter()
                .map(|(key, items)| serde_json::json!({"key": key, "items": items}))
                .collect(),
        ),
        "unique" => Value::Array(unique(&array_arg(0))),
        "first" => first(&array_arg(0)),
        "last" => last(&array_arg(0)),
        "flatten" => Value::Array(flatten(&array_arg(0))),
        "compact" => Value::Array(compact(&array_arg(0))),
        "reverse" => Value::Array(reverse(&array_arg(0))),
        "length" => Value::from(length(&arg(0))),
        "default" | "default_value" => default_value(&arg(0), &arg(1)),
        "array" => Value::Array(array(args)),
        "identity" => identity(&arg(0)),
        "json" => Value::String(json(&arg(0))),
        "concat" => {
            let arrays: Vec<Vec<Value>> = args.iter().map(|v| v.as_array().cloned().unwrap_or_default()).collect();
            Value::Array(concat(&arrays))
        }
        "is_array" => Value::Bool(is_array(&arg(0))),
        "is_object" => Value::Bool(is_object(&arg(0))),
        "is_string" => Value::Bool(is_string(&arg(0))),
        "is_number" => Value::Bool(is_number(&arg(0))),
        "is_boolean" => Value::Bool(is_boolean(&arg(0))),
        "is_nil" => Value::Bool(is_nil(&arg(0))),
        "type_of" => Value::String(type_of(&arg(0)).to_string()),
        "values" => Value::Array(values(&object_arg(0))),
        "keys" => Value::Array(keys(&object_arg(0)).into_iter().map(Value::String).collect()),
        "lookup" => lookup(&arg(0), &str_arg(1)),
        "get" => get(&arg(0), &str_arg(1)),
        "has" => Value::Bool(has(&arg(0), &str_arg(1))),
        "exists" => Value::Bool(exists(&arg(0))),
        "add" => serde_json::json!(add(&arg(0), &arg(1))),
        "sub" => serde_json::json!(sub(&arg(0), &arg(1))),
        "abs" => serde_json::json!(abs(&arg(0))),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("  Hello, World!  "), "hello-world");
        assert_eq!(slugify("Web Server #1"), "web-server-1");
    }

    #[test]
    fn title_case_capitalizes_each_word() {
        assert_eq!(title_case("web server config"), "Web Server Config");
    }

    #[test]
    fn where_eq_filters_by_field() {
        let items = vec![json!({"kind": "a"}), json!({"kind": "b"}), json!({"kind": "a"})];
        let matched = where_eq(&items, "kind", &json!("a"));
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn sort_by_orders_by_field() {
        let items = vec![json!({"name": "b"}), json!({"name": "a"})];
        let sorted = sort_by(&items, "name");
        assert_eq!(sorted[0]["name"], json!("a"));
    }

    #[test]
    fn group_by_preserves_first_seen_order() {
        let items = vec![json!({"tag": "x"}), json!({"tag": "y"}), json!({"tag": "x"})];
        let groups = group_by(&items, "tag");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "x");
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn unique_drops_structural_duplicates() {
        let items = vec![json!(1), json!(2), json!(1)];
        assert_eq!(unique(&items), vec![json!(1), json!(2)]);
    }

    #[test]
    fn flatten_collapses_one_level() {
        let items = vec![json!([1, 2]), json!(3)];
        assert_eq!(flatten(&items), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn numeric_comparisons_use_f64() {
        assert!(lt(&json!(1), &json!(2)));
        assert!(gte(&json!(2), &json!(2)));
        assert!(!lt(&json!("a"), &json!("b")));
    }

    #[test]
    fn logical_helpers_use_json_truthiness() {
        assert!(and(&json!(true), &json!("x")));
        assert!(!and(&json!(true), &json!("")));
        assert!(or(&json!(false), &json!(1)));
        assert!(not(&json!(null)));
        assert!(!not(&json!([1])));
    }

    #[test]
    fn string_transform_helpers() {
        assert_eq!(trim("  hi  "), "hi");
        assert_eq!(split("a,b,c", ","), vec!["a", "b", "c"]);
        assert_eq!(replace("hello world", "world", "there"), "hello there");
        assert_eq!(substring("hello", 1, Some(3)), "el");
        assert_eq!(substring("hello", 2, None), "llo");
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn substring_snaps_to_char_boundaries_on_multibyte_input() {
        assert_eq!(substring("héllo", 0, Some(2)), "h");
    }

    #[test]
    fn reverse_and_length_and_default_value() {
        let items = vec![json!(1), json!(2), json!(3)];
        assert_eq!(reverse(&items), vec![json!(3), json!(2), json!(1)]);
        assert_eq!(length(&json!([1, 2])), 2);
        assert_eq!(length(&json!("abc")), 3);
        assert_eq!(default_value(&json!(null), &json!("fallback")), json!("fallback"));
        assert_eq!(default_value(&json!(1), &json!("fallback")), json!(1));
    }

    #[test]
    fn type_predicates_and_type_of() {
        assert!(is_array(&json!([1])));
        assert!(is_object(&json!({})));
        assert!(is_string(&json!("x")));
        assert!(is_number(&json!(1)));
        assert!(is_boolean(&json!(true)));
        assert!(is_nil(&json!(null)));
        assert_eq!(type_of(&json!([1])), "array");
        assert_eq!(type_of(&json!(null)), "null");
    }

    #[test]
    fn object_accessors() {
        let obj = json!({"a": 1, "b": 2}).as_object().unwrap().clone();
        assert_eq!(keys(&obj), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(values(&obj), vec![json!(1), json!(2)]);
        let value = Value::Object(obj);
        assert_eq!(lookup(&value, "a"), json!(1));
        assert_eq!(get(&value, "missing"), Value::Null);
        assert!(has(&value, "a"));
        assert!(!has(&value, "z"));
        assert!(exists(&json!(0)));
        assert!(!exists(&json!(null)));
    }

    #[test]
    fn arithmetic_helpers() {
        assert_eq!(add(&json!(2), &json!(3)), 5.0);
        assert_eq!(sub(&json!(5), &json!(2)), 3.0);
        assert_eq!(abs(&json!(-4)), 4.0);
    }

    #[test]
    fn concat_flattens_array_list() {
        let a = vec![json!(1), json!(2)];
        let b = vec![json!(3)];
        assert_eq!(concat(&[a, b]), vec![json!(1), json!(2), json!(3)]);
    }

    #[test]
    fn json_helper_serializes_compactly() {
        assert_eq!(json(&json!({"a": 1})), "{\"a\":1}");
    }
}
