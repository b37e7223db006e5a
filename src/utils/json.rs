use serde_json::Value;

/// Walk `path` through objects (by key) and arrays (by numeric index).
pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = match cur {
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => cur.get(*key)?,
        };
    }
    Some(cur)
}

/// Non-blank string at `path`.
pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}
