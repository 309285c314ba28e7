//! Struct-tag annotation parsing.
//!
//! A raw annotation string holds space separated `key:"value"` pairs, e.g.
//! `json:"id,omitempty" db:"user_id,pk"`. Only the requested key's value is
//! decoded into an [`Annotation`]: the first comma separated token is the
//! name, the rest are parameters.

use crate::error::ParamError;
use chrono::NaiveDateTime;
use std::fmt;
use std::time::Duration;

/// Looks up the quoted value stored under `key` in a raw annotation string.
///
/// Scanning stops at the first malformed pair, in which case the key is
/// reported as absent.
#[must_use]
pub fn lookup_tag(raw: &str, key: &str) -> Option<String> {
    let mut tag = raw.as_bytes();
    while !tag.is_empty() {
        let skip = tag.iter().take_while(|&&b| b == b' ').count();
        tag = &tag[skip..];
        if tag.is_empty() {
            break;
        }

        let mut i = 0;
        while i < tag.len() && tag[i] > b' ' && tag[i] != b':' && tag[i] != b'"' && tag[i] != 0x7f
        {
            i += 1;
        }
        if i == 0 || i + 1 >= tag.len() || tag[i] != b':' || tag[i + 1] != b'"' {
            break;
        }
        let name = &tag[..i];
        tag = &tag[i + 1..];

        let mut i = 1;
        while i < tag.len() && tag[i] != b'"' {
            if tag[i] == b'\\' {
                i += 1;
            }
            i += 1;
        }
        if i >= tag.len() {
            break;
        }
        let quoted = &tag[..=i];
        tag = &tag[i + 1..];

        if name == key.as_bytes() {
            return std::str::from_utf8(quoted).ok().and_then(unquote);
        }
    }
    None
}

/// Returns true if the raw annotation string carries `key`.
#[must_use]
pub fn has_tag(raw: &str, key: &str) -> bool {
    lookup_tag(raw, key).is_some()
}

/// Removes the surrounding quotes and decodes backslash escapes.
fn unquote(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\u{0b}',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'x' => hex_escape(&mut chars, 2)?,
            'u' => hex_escape(&mut chars, 4)?,
            'U' => hex_escape(&mut chars, 8)?,
            c @ '0'..='7' => octal_escape(c, &mut chars)?,
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}

fn hex_escape(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<char> {
    let mut value = 0u32;
    for _ in 0..digits {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    char::from_u32(value)
}

/// Reads a three-digit octal escape whose first digit is `first`. Values
/// above 255 are invalid.
fn octal_escape(first: char, chars: &mut std::str::Chars<'_>) -> Option<char> {
    let mut value = first.to_digit(8)?;
    for _ in 0..2 {
        value = value * 8 + chars.next()?.to_digit(8)?;
    }
    if value > 255 {
        return None;
    }
    char::from_u32(value)
}

/// Ordered multi-valued parameter map.
///
/// Keys keep their first insertion order; values under a key keep their
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, Vec<String>)>,
}

impl Params {
    /// Creates an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, key: &str) -> &mut Vec<String> {
        let pos = match self.entries.iter().position(|(k, _)| k == key) {
            Some(pos) => pos,
            None => {
                self.entries.push((key.to_string(), Vec::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[pos].1
    }

    /// Appends a value under `key`.
    pub fn add(&mut self, key: &str, value: impl Into<String>) {
        self.slot(key).push(value.into());
    }

    /// Replaces all values under `key` with a single value.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let slot = self.slot(key);
        slot.clear();
        slot.push(value.into());
    }

    /// Sets a flag parameter whose value is its own key.
    #[must_use]
    pub fn with(mut self, flag: &str) -> Self {
        self.set(flag, flag);
        self
    }

    /// Returns all values under `key`.
    #[must_use]
    pub fn values(&self, key: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the first value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values(key).first().map(String::as_str)
    }

    /// Returns true if `key` has at least one value.
    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        !self.values(key).is_empty()
    }

    /// Iterates over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterates over `(key, values)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes and returns the first value under `key`.
    pub fn pull(&mut self, key: &str) -> Option<String> {
        let slot = self.entries.iter_mut().find(|(k, _)| k == key)?;
        if slot.1.is_empty() {
            return None;
        }
        Some(slot.1.remove(0))
    }

    /// Removes and returns the last value under `key`.
    pub fn pop(&mut self, key: &str) -> Option<String> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.pop())
    }

    /// Fills keys that have no values from the given maps, first match wins.
    #[must_use]
    pub fn defaults(mut self, others: &[&Params]) -> Self {
        for other in others {
            for (key, values) in other.iter() {
                if !values.is_empty() && !self.has(key) {
                    *self.slot(key) = values.to_vec();
                }
            }
        }
        self
    }

    /// Overwrites keys with the non-empty values of the given maps, last match wins.
    #[must_use]
    pub fn assign(mut self, others: &[&Params]) -> Self {
        for other in others {
            for (key, values) in other.iter() {
                if !values.is_empty() {
                    *self.slot(key) = values.to_vec();
                }
            }
        }
        self
    }

    fn require(&self, key: &str) -> Result<&str, ParamError> {
        self.get(key).ok_or_else(|| ParamError::Missing {
            key: key.to_string(),
        })
    }

    /// Returns true if `key` is a set flag or holds a true boolean.
    #[must_use]
    pub fn is_true(&self, key: &str) -> bool {
        if self.get(key) == Some(key) {
            return true;
        }
        self.to_bool(key).unwrap_or(false)
    }

    /// Parses the first value under `key` as a boolean.
    ///
    /// # Errors
    /// Returns `ParamError` if the value is missing or not a boolean.
    pub fn to_bool(&self, key: &str) -> Result<bool, ParamError> {
        let value = self.require(key)?;
        match value {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            _ => Err(ParamError::invalid(key, value, "boolean")),
        }
    }

    /// Returns the first value under `key` as an integer, or zero.
    #[must_use]
    pub fn int(&self, key: &str) -> i64 {
        self.to_int(key).unwrap_or_default()
    }

    /// Parses the first value under `key` as an integer.
    ///
    /// # Errors
    /// Returns `ParamError` if the value is missing or not an integer.
    pub fn to_int(&self, key: &str) -> Result<i64, ParamError> {
        let value = self.require(key)?;
        value
            .parse()
            .map_err(|_| ParamError::invalid(key, value, "integer"))
    }

    /// Returns the first value under `key` as a float, or zero.
    #[must_use]
    pub fn float(&self, key: &str) -> f64 {
        self.to_float(key).unwrap_or_default()
    }

    /// Parses the first value under `key` as a float.
    ///
    /// # Errors
    /// Returns `ParamError` if the value is missing or not a float.
    pub fn to_float(&self, key: &str) -> Result<f64, ParamError> {
        let value = self.require(key)?;
        value
            .parse()
            .map_err(|_| ParamError::invalid(key, value, "float"))
    }

    /// Returns the first value under `key` as a duration, or zero.
    #[must_use]
    pub fn duration(&self, key: &str) -> Duration {
        self.to_duration(key).unwrap_or_default()
    }

    /// Parses the first value under `key` as a duration such as `1h30m` or `250ms`.
    ///
    /// # Errors
    /// Returns `ParamError` if the value is missing or not a duration.
    pub fn to_duration(&self, key: &str) -> Result<Duration, ParamError> {
        let value = self.require(key)?;
        parse_duration(value).ok_or_else(|| ParamError::invalid(key, value, "duration"))
    }

    /// Returns the first value under `key` as a timestamp, or the epoch.
    #[must_use]
    pub fn time(&self, key: &str, format: &str) -> NaiveDateTime {
        self.to_time(key, format).unwrap_or_default()
    }

    /// Parses the first value under `key` as a timestamp using a strftime format.
    ///
    /// # Errors
    /// Returns `ParamError` if the value is missing or does not match the format.
    pub fn to_time(&self, key: &str, format: &str) -> Result<NaiveDateTime, ParamError> {
        let value = self.require(key)?;
        NaiveDateTime::parse_from_str(value, format).map_err(|source| ParamError::Time {
            key: key.to_string(),
            source,
        })
    }
}

/// Parses a duration made of decimal magnitudes with unit suffixes.
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.strip_prefix('+').unwrap_or(s);
    if s == "0" {
        return Some(Duration::ZERO);
    }
    if s.is_empty() || s.starts_with('-') {
        return None;
    }

    let mut rest = s;
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        let int_part = &rest[..int_len];
        rest = &rest[int_len..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot.bytes().take_while(u8::is_ascii_digit).count();
            frac_part = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let unit_len = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() || *c == '.')
            .map_or(rest.len(), |(i, _)| i);
        let unit: u128 = match &rest[..unit_len] {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            _ => return None,
        };
        rest = &rest[unit_len..];

        let whole: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().ok()?
        };
        total = total.checked_add(whole.checked_mul(unit)?)?;
        if !frac_part.is_empty() {
            let digits = frac_part.len().min(18);
            let frac: u128 = frac_part[..digits].parse().ok()?;
            let scale = 10u128.pow(digits as u32);
            total = total.checked_add(frac * unit / scale)?;
        }
    }

    let secs = u64::try_from(total / 1_000_000_000).ok()?;
    Some(Duration::new(secs, (total % 1_000_000_000) as u32))
}

/// Decoded annotation for one key.
///
/// Absence of the key is represented by [`Annotation::parse`] returning `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    /// Annotation key, e.g. `json`.
    pub key: String,
    /// First token of the value; may be empty.
    pub name: String,
    /// Remaining tokens.
    pub params: Params,
}

impl Annotation {
    /// Parses the annotation stored under `key` in a raw annotation string.
    ///
    /// Returns `None` when the key is absent. Malformed parameter tokens are
    /// decoded on a best-effort basis and never rejected.
    #[must_use]
    pub fn parse(raw: &str, key: &str) -> Option<Self> {
        let value = lookup_tag(raw, key)?;
        let mut annotation = Self {
            key: key.to_string(),
            ..Self::default()
        };

        let Some((name, rest)) = value.split_once(',') else {
            annotation.name = value;
            return Some(annotation);
        };
        annotation.name = name.to_string();

        for token in rest.split(',').filter(|t| !t.is_empty()) {
            match token.split_once('=') {
                Some(("", _)) => {}
                Some((k, "")) => annotation.params.add(k, k),
                Some((k, v)) => annotation.params.add(k, v),
                None => annotation.params.add(token, token),
            }
        }
        Some(annotation)
    }

    /// Returns true if both the name and the parameters are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.params.is_empty()
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:\"{}", self.key, self.name)?;
        for (key, values) in self.params.iter() {
            for value in values {
                if value == key {
                    write!(f, ",{key}")?;
                } else {
                    write!(f, ",{key}={value}")?;
                }
            }
        }
        f.write_str("\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_and_flag() {
        let tag = Annotation::parse(r#"json:"Foo,omitempty""#, "json").expect("present");
        assert_eq!(tag.key, "json");
        assert_eq!(tag.name, "Foo");
        assert_eq!(tag.params.get("omitempty"), Some("omitempty"));
        assert!(tag.params.has("omitempty"));
    }

    #[test]
    fn test_parse_missing_key() {
        assert!(Annotation::parse(r#"json:"Foo,omitempty""#, "xml").is_none());
        assert!(!has_tag(r#"json:"Foo,omitempty""#, "xml"));
        assert!(has_tag(r#"json:"Foo,omitempty""#, "json"));
    }

    #[test]
    fn test_parse_among_other_keys() {
        let raw = r#"json:"id,omitempty" db:"user_id,pk,size=32" xml:"-""#;
        let db = Annotation::parse(raw, "db").expect("present");
        assert_eq!(db.name, "user_id");
        assert!(db.params.is_true("pk"));
        assert_eq!(db.params.int("size"), 32);

        let xml = Annotation::parse(raw, "xml").expect("present");
        assert_eq!(xml.name, "-");
        assert!(xml.params.is_empty());
    }

    #[test]
    fn test_parse_name_only_and_empty() {
        let tag = Annotation::parse(r#"json:"name""#, "json").expect("present");
        assert_eq!(tag.name, "name");
        assert!(tag.params.is_empty());

        let empty = Annotation::parse(r#"json:"""#, "json").expect("present");
        assert!(empty.is_empty());

        let unnamed = Annotation::parse(r#"json:",omitempty""#, "json").expect("present");
        assert_eq!(unnamed.name, "");
        assert!(unnamed.params.has("omitempty"));
        assert!(!unnamed.is_empty());
    }

    #[test]
    fn test_parse_repeated_params_keep_order() {
        let tag = Annotation::parse(r#"gen:"x,arg=a,arg=b,arg=c""#, "gen").expect("present");
        assert_eq!(tag.params.values("arg"), ["a", "b", "c"]);

        let mut params = tag.params;
        assert_eq!(params.pull("arg").as_deref(), Some("a"));
        assert_eq!(params.pop("arg").as_deref(), Some("c"));
        assert_eq!(params.values("arg"), ["b"]);
        assert_eq!(params.pull("arg").as_deref(), Some("b"));
        assert_eq!(params.pull("arg"), None);
        assert_eq!(params.pop("missing"), None);
    }

    #[test]
    fn test_parse_tolerates_malformed_tokens() {
        let tag = Annotation::parse(r#"gen:"x,,=oops,k=,a=b=c""#, "gen").expect("present");
        assert_eq!(tag.params.get("k"), Some("k"));
        assert_eq!(tag.params.get("a"), Some("b=c"));
        assert_eq!(tag.params.len(), 2);
    }

    #[test]
    fn test_lookup_stops_at_malformed_pair() {
        assert_eq!(lookup_tag(r#"json "x" db:"y""#, "db"), None);
        assert_eq!(lookup_tag(r#"json:"unterminated"#, "json"), None);
        assert_eq!(lookup_tag("", "json"), None);
    }

    #[test]
    fn test_lookup_unquotes_escapes() {
        let raw = r#"doc:"say \"hi\"\tnow é""#;
        assert_eq!(lookup_tag(raw, "doc").as_deref(), Some("say \"hi\"\tnow é"));
        assert_eq!(lookup_tag(r#"doc:"bad \q""#, "doc"), None);
    }

    #[test]
    fn test_lookup_unquotes_octal_escapes() {
        assert_eq!(lookup_tag(r#"doc:"\101\142c""#, "doc").as_deref(), Some("Abc"));
        assert_eq!(lookup_tag(r#"doc:"\000""#, "doc").as_deref(), Some("\0"));
        assert_eq!(lookup_tag(r#"doc:"\400""#, "doc"), None);
        assert_eq!(lookup_tag(r#"doc:"\18""#, "doc"), None);
        assert_eq!(lookup_tag(r#"doc:"\1""#, "doc"), None);
    }

    #[test]
    fn test_lookup_skips_leading_spaces() {
        assert_eq!(lookup_tag(r#"   a:"1"   b:"2""#, "b").as_deref(), Some("2"));
    }

    #[test]
    fn test_params_defaults_and_assign() {
        let mut base = Params::new();
        base.add("a", "1");
        let mut other = Params::new();
        other.add("a", "9");
        other.add("b", "2");

        let filled = base.clone().defaults(&[&other]);
        assert_eq!(filled.get("a"), Some("1"));
        assert_eq!(filled.get("b"), Some("2"));

        let assigned = base.assign(&[&other]);
        assert_eq!(assigned.get("a"), Some("9"));
        assert_eq!(assigned.get("b"), Some("2"));
    }

    #[test]
    fn test_params_with_and_set() {
        let mut params = Params::new().with("required");
        assert!(params.is_true("required"));
        params.add("required", "x");
        params.set("required", "false");
        assert_eq!(params.values("required"), ["false"]);
        assert!(!params.is_true("required"));
    }

    #[test]
    fn test_params_typed_access() {
        let tag = Annotation::parse(
            r#"cfg:"x,retries=3,ratio=0.25,on=true,timeout=1m30s,at=2024-05-01 10:30:00""#,
            "cfg",
        )
        .expect("present");
        let params = &tag.params;
        assert_eq!(params.to_int("retries").expect("int"), 3);
        assert!((params.float("ratio") - 0.25).abs() < f64::EPSILON);
        assert!(params.to_bool("on").expect("bool"));
        assert_eq!(params.duration("timeout"), Duration::from_secs(90));
        let at = params.to_time("at", "%Y-%m-%d %H:%M:%S").expect("time");
        assert_eq!(at.to_string(), "2024-05-01 10:30:00");

        assert_eq!(params.int("missing"), 0);
        assert!(matches!(
            params.to_int("missing"),
            Err(ParamError::Missing { .. })
        ));
        assert!(matches!(
            params.to_bool("retries"),
            Err(ParamError::Invalid { .. })
        ));
        assert!(matches!(
            params.to_time("retries", "%Y"),
            Err(ParamError::Time { .. })
        ));
    }

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("0"), Some(Duration::ZERO));
        assert_eq!(parse_duration("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_duration("1.5s"), Some(Duration::from_millis(1500)));
        assert_eq!(parse_duration("2h45m"), Some(Duration::from_secs(9900)));
        assert_eq!(parse_duration("10µs"), Some(Duration::from_micros(10)));
        assert_eq!(parse_duration(".5m"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("5"), None);
        assert_eq!(parse_duration("-1s"), None);
        assert_eq!(parse_duration("3d"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_display_renders_tag_syntax() {
        let tag = Annotation::parse(r#"db:"id,pk,size=32""#, "db").expect("present");
        assert_eq!(tag.to_string(), r#"db:"id,pk,size=32""#);
    }
}
