//! Profile payload normalization.
//!
//! Three concerns live here: flattening the v2 JSON profile (localized
//! values, image identifier structures), decoding the v1 XML profile into a
//! recursive string/map value, and applying the declarative field-mapping
//! tables that turn a raw profile into a [`UserInfo`] block.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::strategy::UserInfo;

/// Field map for the v1 (OAuth1) XML profile.
///
/// Targets are `UserInfo` fields (dotted for the urls map); sources are
/// dot-separated paths into the decoded profile.
pub(crate) const OAUTH1_RESPONSE_MAP: &[(&str, &str)] = &[
    ("name", "formatted-name"),
    ("first_name", "first-name"),
    ("last_name", "last-name"),
    ("email", "email-address"),
    ("headline", "headline"),
    ("description", "summary"),
    ("location", "location.name"),
    ("image", "picture-url"),
    ("urls.linkedin", "public-profile-url"),
    ("urls.website", "url"),
    ("urls.linkedin_authenticated", "site-standard-profile-request.url"),
];

/// Field map for the v2 (OAuth2) JSON profile, applied after flattening.
pub(crate) const OAUTH2_RESPONSE_MAP: &[(&str, &str)] = &[
    ("first_name", "firstName"),
    ("last_name", "lastName"),
    ("email", "emailAddress"),
    ("image", "profilePicture"),
];

/// Follow a dot-separated path through nested objects.
pub(crate) fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Apply a field-mapping table to a raw profile.
///
/// Only string-valued sources are mapped; absent or non-string sources are
/// omitted from the output, never an error. The operation is a pure
/// function of the payload, so re-applying it yields an identical block.
pub(crate) fn apply_map(raw: &Value, map: &[(&str, &str)]) -> UserInfo {
    let mut info = UserInfo::default();
    for (target, source) in map {
        let Some(value) = lookup_path(raw, source).and_then(Value::as_str) else {
            continue;
        };
        let value = value.to_string();
        match *target {
            "name" => info.name = Some(value),
            "first_name" => info.first_name = Some(value),
            "last_name" => info.last_name = Some(value),
            "email" => info.email = Some(value),
            "headline" => info.headline = Some(value),
            "description" => info.description = Some(value),
            "location" => info.location = Some(value),
            "image" => info.image = Some(value),
            other => {
                if let Some(url_key) = other.strip_prefix("urls.") {
                    info.urls.insert(url_key.to_string(), value);
                }
            }
        }
    }
    info
}

/// Flatten a v2 profile object, field by field.
///
/// Plain strings pass through; `localized` values are resolved via the
/// accompanying `preferredLocale` (`language_COUNTRY` lookup); nested
/// image-identifier structures reduce to the first identifier string; any
/// other shape passes through unmodified. Idempotent: flattened output
/// contains no shape the rules would rewrite again differently.
pub(crate) fn flatten_profile(raw: &Value) -> Value {
    let Some(fields) = raw.as_object() else {
        return raw.clone();
    };

    let mut flat = Map::with_capacity(fields.len());
    for (key, value) in fields {
        flat.insert(key.clone(), flatten_field(value));
    }
    Value::Object(flat)
}

fn flatten_field(value: &Value) -> Value {
    if value.is_string() {
        return value.clone();
    }
    if let Some(localized) = resolve_localized(value) {
        return localized;
    }
    if let Some(identifier) = resolve_image_identifier(value) {
        return identifier;
    }
    value.clone()
}

fn resolve_localized(value: &Value) -> Option<Value> {
    let localized = value.get("localized")?;
    let locale = value.get("preferredLocale")?;
    let key = format!(
        "{}_{}",
        locale.get("language")?.as_str()?,
        locale.get("country")?.as_str()?
    );
    localized.get(&key).cloned()
}

fn resolve_image_identifier(value: &Value) -> Option<Value> {
    value
        .get("displayImage~")?
        .get("elements")?
        .get(0)?
        .get("identifiers")?
        .get(0)?
        .get("identifier")
        .cloned()
}

/// Decode a v1 profile XML document into a recursive string/map value.
///
/// Every element becomes a key in its parent mapping; text-only elements
/// become strings; repeated element names last-wins. Attributes are not
/// consumed by any mapping source path and are ignored.
pub(crate) fn xml_to_value(xml: &str) -> Result<Value, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // One frame per open element: accumulated children and text.
    let mut stack: Vec<(Map<String, Value>, String)> = vec![(Map::new(), String::new())];
    let mut names: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                names.push(String::from_utf8_lossy(start.name().as_ref()).into_owned());
                stack.push((Map::new(), String::new()));
            }
            Event::Text(text) => {
                let unescaped = text.unescape()?;
                if let Some((_, buf)) = stack.last_mut() {
                    buf.push_str(&unescaped);
                }
            }
            Event::CData(cdata) => {
                // CDATA content is already literal text.
                if let Some((_, buf)) = stack.last_mut() {
                    buf.push_str(&String::from_utf8_lossy(&cdata));
                }
            }
            Event::Empty(empty) => {
                let name = String::from_utf8_lossy(empty.name().as_ref()).into_owned();
                if let Some((children, _)) = stack.last_mut() {
                    children.insert(name, Value::String(String::new()));
                }
            }
            Event::End(_) => {
                let (children, text) = stack.pop().unwrap_or_default();
                let name = names.pop().unwrap_or_default();
                let value = if children.is_empty() {
                    Value::String(text)
                } else {
                    Value::Object(children)
                };
                if let Some((parent, _)) = stack.last_mut() {
                    parent.insert(name, value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let (document, _) = stack.pop().unwrap_or_default();

    // The document's single root element is the profile itself.
    if document.len() == 1 {
        if let Some(root) = document.values().next() {
            if root.is_object() {
                return Ok(root.clone());
            }
        }
    }
    Ok(Value::Object(document))
}
