//! Case conversion shared by the emitters.
//!
//! Declared names (`.named(..)`) are used as given. These helpers only derive
//! names that the schema never spelled out: variant names from discriminant
//! literals and Rust field names from wire keys.

const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where",
    "while", "async", "await", "dyn", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "typeof", "unsized", "virtual", "yield", "try",
];

fn is_separator(c: char) -> bool {
    matches!(c, '_' | '-' | '.' | ' ' | '/' | ':')
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// PascalCase from separated words, keeping existing inner capitals.
///
/// # Examples
/// ```
/// use stricture_core::naming::to_pascal_case;
/// assert_eq!(to_pascal_case("gps_odometer_km"), "GpsOdometerKm");
/// assert_eq!(to_pascal_case("fuel-level"), "FuelLevel");
/// assert_eq!(to_pascal_case("ObjectMeta"), "ObjectMeta");
/// ```
pub fn to_pascal_case(name: &str) -> String {
    let pascal: String = name
        .split(is_separator)
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect();

    if pascal.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", pascal)
    } else {
        pascal
    }
}

/// camelCase from separated words.
///
/// # Examples
/// ```
/// use stricture_core::naming::to_camel_case;
/// assert_eq!(to_camel_case("trip_id"), "tripId");
/// assert_eq!(to_camel_case("Pod"), "pod");
/// ```
pub fn to_camel_case(name: &str) -> String {
    let pascal = to_pascal_case(name);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// snake_case from camelCase, PascalCase or separated words.
///
/// Runs of capitals stay together, so `HTTPProxy` becomes `http_proxy`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut result = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if is_separator(c) || !(c.is_alphanumeric()) {
            if !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            continue;
        }

        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !result.is_empty() && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }

    while result.ends_with('_') {
        result.pop();
    }
    result
}

/// Rust field name for a wire key: snake_case, raw identifiers for keywords
pub fn to_rust_field_name(name: &str) -> String {
    let mut snake = to_snake_case(name);
    if snake.is_empty() {
        snake.push_str("field");
    }
    if snake.starts_with(|c: char| c.is_ascii_digit()) {
        snake.insert(0, '_');
    }

    match snake.as_str() {
        // These cannot be raw identifiers
        "self" | "Self" | "super" | "crate" => format!("{}_", snake),
        s if RUST_KEYWORDS.contains(&s) => format!("r#{}", snake),
        _ => snake,
    }
}

/// True when `name` can appear unquoted as a TypeScript property key
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case(""), "");
        assert_eq!(to_pascal_case("pod"), "Pod");
        assert_eq!(to_pascal_case("gps_odometer_km"), "GpsOdometerKm");
        assert_eq!(to_pascal_case("fuel-level"), "FuelLevel");
        assert_eq!(to_pascal_case("ObjectMeta"), "ObjectMeta");
        assert_eq!(to_pascal_case("HTTPProxy"), "HTTPProxy");
        assert_eq!(to_pascal_case("2fa"), "_2fa");
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case("trip_id"), "tripId");
        assert_eq!(to_camel_case("ObjectMeta"), "objectMeta");
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("tripId"), "trip_id");
        assert_eq!(to_snake_case("ObjectMeta"), "object_meta");
        assert_eq!(to_snake_case("HTTPProxy"), "http_proxy");
        assert_eq!(to_snake_case("odometer2Km"), "odometer2_km");
        assert_eq!(to_snake_case("fuel-level"), "fuel_level");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("x.y"), "x_y");
    }

    #[test]
    fn test_to_rust_field_name() {
        assert_eq!(to_rust_field_name("type"), "r#type");
        assert_eq!(to_rust_field_name("tripId"), "trip_id");
        assert_eq!(to_rust_field_name("self"), "self_");
        assert_eq!(to_rust_field_name("3d"), "_3d");
        assert_eq!(to_rust_field_name(""), "field");
    }

    #[test]
    fn test_is_plain_identifier() {
        assert!(is_plain_identifier("latitude"));
        assert!(is_plain_identifier("$ref"));
        assert!(!is_plain_identifier("fuel-level"));
        assert!(!is_plain_identifier("2d"));
        assert!(!is_plain_identifier(""));
    }
}
