//! A small JSON Schema validator.
//!
//! Covers the keywords used to describe request payloads: `type`, `enum`,
//! `const`, `properties`, `required`, `additionalProperties`, `items`,
//! `minItems`/`maxItems`, `minLength`/`maxLength`, `pattern`, numeric bounds,
//! `allOf`/`anyOf`/`oneOf`/`not`. Unknown keywords are ignored.

use super::json_matcher::json_deep_equals;
use crate::model::MatchType;
use regex::Regex;
use serde_json::{Map, Value};

/// Validate `instance` against `schema`.
pub fn is_valid(schema: &Value, instance: &Value) -> bool {
    match schema {
        Value::Bool(allowed) => *allowed,
        Value::Object(keywords) => validate_object_schema(keywords, instance),
        _ => true,
    }
}

fn validate_object_schema(schema: &Map<String, Value>, instance: &Value) -> bool {
    if let Some(expected) = schema.get("type") {
        let type_ok = match expected {
            Value::String(name) => has_type(instance, name),
            Value::Array(names) => names
                .iter()
                .filter_map(Value::as_str)
                .any(|name| has_type(instance, name)),
            _ => true,
        };
        if !type_ok {
            return false;
        }
    }

    if let Some(Value::Array(options)) = schema.get("enum") {
        if !options.iter().any(|option| strict_equals(option, instance)) {
            return false;
        }
    }
    if let Some(constant) = schema.get("const") {
        if !strict_equals(constant, instance) {
            return false;
        }
    }

    let combinators_ok = schema
        .get("allOf")
        .and_then(Value::as_array)
        .map_or(true, |all| all.iter().all(|s| is_valid(s, instance)))
        && schema
            .get("anyOf")
            .and_then(Value::as_array)
            .map_or(true, |any| any.iter().any(|s| is_valid(s, instance)))
        && schema
            .get("oneOf")
            .and_then(Value::as_array)
            .map_or(true, |one| one.iter().filter(|s| is_valid(s, instance)).count() == 1)
        && schema.get("not").map_or(true, |s| !is_valid(s, instance));
    if !combinators_ok {
        return false;
    }

    match instance {
        Value::Object(object) => validate_properties(schema, object),
        Value::Array(items) => validate_items(schema, items),
        Value::String(text) => validate_string(schema, text),
        Value::Number(number) => number.as_f64().map_or(true, |n| validate_number(schema, n)),
        _ => true,
    }
}

fn has_type(instance: &Value, name: &str) -> bool {
    match name {
        "null" => instance.is_null(),
        "boolean" => instance.is_boolean(),
        "object" => instance.is_object(),
        "array" => instance.is_array(),
        "string" => instance.is_string(),
        "number" => instance.is_number(),
        "integer" => match instance {
            Value::Number(n) => {
                n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0)
            }
            _ => false,
        },
        _ => false,
    }
}

fn strict_equals(a: &Value, b: &Value) -> bool {
    json_deep_equals(a, b, MatchType::Strict)
}

fn validate_properties(schema: &Map<String, Value>, object: &Map<String, Value>) -> bool {
    if let Some(Value::Array(required)) = schema.get("required") {
        if !required
            .iter()
            .filter_map(Value::as_str)
            .all(|name| object.contains_key(name))
        {
            return false;
        }
    }

    let properties = schema.get("properties").and_then(Value::as_object);
    for (name, value) in object {
        match properties.and_then(|p| p.get(name)) {
            Some(property_schema) => {
                if !is_valid(property_schema, value) {
                    return false;
                }
            }
            None => {
                if let Some(additional) = schema.get("additionalProperties") {
                    if !is_valid(additional, value) {
                        return false;
                    }
                }
            }
        }
    }
    true
}

fn validate_items(schema: &Map<String, Value>, items: &[Value]) -> bool {
    let len = items.len() as u64;
    if schema.get("minItems").and_then(Value::as_u64).is_some_and(|min| len < min) {
        return false;
    }
    if schema.get("maxItems").and_then(Value::as_u64).is_some_and(|max| len > max) {
        return false;
    }
    match schema.get("items") {
        Some(item_schema @ (Value::Object(_) | Value::Bool(_))) => {
            items.iter().all(|item| is_valid(item_schema, item))
        }
        Some(Value::Array(positional)) => positional
            .iter()
            .zip(items.iter())
            .all(|(item_schema, item)| is_valid(item_schema, item)),
        _ => true,
    }
}

fn validate_string(schema: &Map<String, Value>, text: &str) -> bool {
    let len = text.chars().count() as u64;
    if schema.get("minLength").and_then(Value::as_u64).is_some_and(|min| len < min) {
        return false;
    }
    if schema.get("maxLength").and_then(Value::as_u64).is_some_and(|max| len > max) {
        return false;
    }
    match schema.get("pattern").and_then(Value::as_str) {
        // an invalid pattern cannot reject anything
        Some(pattern) => Regex::new(pattern).map_or(true, |regex| regex.is_match(text)),
        None => true,
    }
}

fn validate_number(schema: &Map<String, Value>, n: f64) -> bool {
    let bound = |key: &str| schema.get(key).and_then(Value::as_f64);
    !(bound("minimum").is_some_and(|min| n < min)
        || bound("maximum").is_some_and(|max| n > max)
        || bound("exclusiveMinimum").is_some_and(|min| n <= min)
        || bound("exclusiveMaximum").is_some_and(|max| n >= max))
}
