/// Lowercase ASCII slug with `-` separators. Common Latin accents are folded
/// (`Habitación en Málaga` -> `habitacion-en-malaga`), anything else that is
/// not alphanumeric becomes a separator.
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        let folded = if ch.is_ascii_alphanumeric() {
            None
        } else {
            match fold(ch) {
                "" => {
                    pending_dash = !out.is_empty();
                    continue;
                }
                f => Some(f),
            }
        };
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        match folded {
            Some(f) => out.push_str(f),
            None => out.push(ch),
        }
    }

    out
}

fn fold(ch: char) -> &'static str {
    match ch {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => "a",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'í' | 'ì' | 'î' | 'ï' => "i",
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'ø' => "o",
        'ú' | 'ù' | 'û' | 'ü' => "u",
        'ñ' => "n",
        'ç' => "c",
        'ß' => "ss",
        'æ' => "ae",
        'œ' => "oe",
        _ => "",
    }
}

/// Trailing numeric id of a `{title}-{id}` slug, or the whole slug if it is numeric.
#[must_use]
pub fn id_from_slug(slug: &str) -> Option<u64> {
    let slug = slug.trim().trim_end_matches('/');
    let tail = slug.rsplit('-').next().unwrap_or(slug);
    tail.parse::<u64>().ok()
}

/// `{slugified-title}-{id}`. A base that already ends in `-{id}` is kept as is,
/// so [`id_from_slug`] always reads back `id`.
#[must_use]
pub fn property_slug(title: &str, id: u64) -> String {
    let base = slugify(title);
    let id = id.to_string();
    if base.is_empty() || base == id {
        id
    } else if base
        .strip_suffix(id.as_str())
        .is_some_and(|rest| rest.ends_with('-'))
    {
        base
    } else {
        format!("{base}-{id}")
    }
}
