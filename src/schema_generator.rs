use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Boundary for converting an extracted type text into a draft schema.
///
/// The engine treats type signatures as opaque strings; this trait is the
/// single point where those strings are interpreted. The input is the
/// right-hand side of a conceptual named type alias
/// (`type Payload = <type_text>`), the output a schema fragment. The
/// built-in [`TsTypeConverter`] can be swapped for another implementation
/// without touching the core.
pub trait TypeSchemaConverter {
    /// Converts `type_text` into a schema fragment. Conversion is
    /// best-effort: texts the converter cannot interpret degrade to an
    /// untyped object placeholder, never to an error.
    fn convert(&self, type_text: &str) -> Schema;
}

/// OpenAPI Schema fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, number, boolean, object, array)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    /// Required property names for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Alternative schemas for union types
    #[serde(rename = "oneOf", skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Schema>>,
    /// Whether null is an accepted value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

impl Schema {
    /// A schema holding only a primitive type name.
    pub fn of_type(type_name: &str) -> Self {
        Schema {
            schema_type: Some(type_name.to_string()),
            properties: None,
            required: None,
            items: None,
            one_of: None,
            nullable: None,
        }
    }

    /// The fallback for type texts that cannot be interpreted: an untyped
    /// object.
    pub fn object_placeholder() -> Self {
        Schema::of_type("object")
    }

    fn empty() -> Self {
        Schema {
            schema_type: None,
            properties: None,
            required: None,
            items: None,
            one_of: None,
            nullable: None,
        }
    }
}

/// Best-effort structural converter for TypeScript type texts.
///
/// Understands the shapes the analyzer produces (primitives, literal
/// types, object types, arrays, unions) plus the `Array<T>` spelling and
/// nullable unions. Named types it cannot resolve (the engine does no
/// cross-file alias resolution) degrade to an object placeholder.
pub struct TsTypeConverter;

impl TypeSchemaConverter for TsTypeConverter {
    fn convert(&self, type_text: &str) -> Schema {
        debug!("Converting type text: {}", type_text);
        parse_type(type_text)
    }
}

fn parse_type(text: &str) -> Schema {
    let text = text.trim();
    if text.is_empty() {
        return Schema::object_placeholder();
    }

    // Unions first: split on `|` at nesting depth zero.
    let branches = split_top_level(text, '|');
    if branches.len() > 1 {
        return union_schema(branches);
    }

    // Fully parenthesized types unwrap to their inner type.
    if let Some(inner) = unwrap_parentheses(text) {
        return parse_type(inner);
    }

    // Array spellings: `T[]` and `Array<T>`.
    if let Some(element) = array_element(text) {
        let mut schema = Schema::of_type("array");
        schema.items = Some(Box::new(parse_type(element)));
        return schema;
    }

    // Object types: `{ name: T; other?: U }`.
    if text.starts_with('{') && text.ends_with('}') {
        return object_schema(&text[1..text.len() - 1]);
    }

    primitive_schema(text)
}

fn union_schema(branches: Vec<&str>) -> Schema {
    let mut nullable = false;
    let mut alternatives: Vec<Schema> = Vec::new();

    for branch in branches {
        let branch = branch.trim();
        if branch == "null" || branch == "undefined" {
            nullable = true;
            continue;
        }
        let schema = parse_type(branch);
        if !alternatives.contains(&schema) {
            alternatives.push(schema);
        }
    }

    let mut schema = match alternatives.len() {
        0 => Schema::empty(),
        1 => alternatives.remove(0),
        _ => {
            let mut combined = Schema::empty();
            combined.one_of = Some(alternatives);
            combined
        }
    };

    if nullable {
        schema.nullable = Some(true);
    }
    schema
}

fn object_schema(members_text: &str) -> Schema {
    let mut properties = BTreeMap::new();
    let mut required = Vec::new();

    for member in split_members(members_text) {
        let member = member.trim();
        if member.is_empty() || member.starts_with('[') {
            // Index signatures carry no property name to document.
            continue;
        }
        let Some(colon) = find_top_level(member, ':') else {
            continue;
        };

        let raw_name = member[..colon].trim();
        let optional = raw_name.ends_with('?');
        let name = raw_name
            .trim_end_matches('?')
            .trim_matches(['\'', '"'])
            .to_string();

        properties.insert(name.clone(), parse_type(&member[colon + 1..]));
        if !optional {
            required.push(name);
        }
    }

    let mut schema = Schema::of_type("object");
    schema.properties = Some(properties);
    if !required.is_empty() {
        schema.required = Some(required);
    }
    schema
}

fn primitive_schema(text: &str) -> Schema {
    match text {
        "string" => Schema::of_type("string"),
        "number" => Schema::of_type("number"),
        "boolean" | "true" | "false" => Schema::of_type("boolean"),
        "null" | "undefined" => {
            let mut schema = Schema::empty();
            schema.nullable = Some(true);
            schema
        }
        _ => {
            // Literal types widen to their primitive.
            if text.starts_with('\'') || text.starts_with('"') || text.starts_with('`') {
                return Schema::of_type("string");
            }
            if text.parse::<f64>().is_ok() {
                return Schema::of_type("number");
            }
            debug!("Unresolvable type text {:?}, using object placeholder", text);
            Schema::object_placeholder()
        }
    }
}

/// Splits `text` on `separator` occurrences at nesting depth zero.
fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut previous = '\0';

    for (idx, ch) in text.char_indices() {
        match ch {
            '{' | '[' | '(' | '<' => depth += 1,
            '}' | ']' | ')' => depth -= 1,
            '>' if previous != '=' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + ch.len_utf8();
            }
            _ => {}
        }
        previous = ch;
    }

    parts.push(&text[start..]);
    parts
}

/// Splits object members on `;` and `,` at nesting depth zero.
fn split_members(text: &str) -> Vec<&str> {
    split_top_level(text, ';')
        .into_iter()
        .flat_map(|part| split_top_level(part, ','))
        .collect()
}

fn find_top_level(text: &str, needle: char) -> Option<usize> {
    let mut depth = 0i32;
    let mut previous = '\0';

    for (idx, ch) in text.char_indices() {
        match ch {
            '{' | '[' | '(' | '<' => depth += 1,
            '}' | ']' | ')' => depth -= 1,
            '>' if previous != '=' => depth -= 1,
            c if c == needle && depth == 0 => return Some(idx),
            _ => {}
        }
        previous = ch;
    }

    None
}

/// Unwraps `(T)` to `T` when the parentheses span the whole text.
fn unwrap_parentheses(text: &str) -> Option<&str> {
    if !text.starts_with('(') || !text.ends_with(')') {
        return None;
    }

    let mut depth = 0i32;
    for (idx, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 && idx != text.len() - 1 {
                    // The opening parenthesis closes early; this is not a
                    // fully wrapped type.
                    return None;
                }
            }
            _ => {}
        }
    }

    Some(&text[1..text.len() - 1])
}

/// Recognizes the `T[]` and `Array<T>` spellings and returns the element
/// type text.
fn array_element(text: &str) -> Option<&str> {
    if let Some(prefix) = text.strip_suffix("[]") {
        if !prefix.is_empty() {
            return Some(prefix);
        }
    }

    text.strip_prefix("Array<")
        .and_then(|rest| rest.strip_suffix('>'))
        .filter(|inner| !inner.is_empty())
}
