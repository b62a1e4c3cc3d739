//! Typed access to front matter fields, and the one on-disk mutation the
//! tool performs: recording the platform URL of a pushed post.

use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::error::FrontMatterError;

/// Result of reading one front matter field with an expected type.
///
/// Callers match on all three branches instead of asserting a type.
#[derive(Debug, Clone, PartialEq)]
pub enum Param<T> {
    Absent,
    /// The field exists with another type; carries a description of it.
    WrongType(String),
    Value(T),
}

impl<T> Param<T> {
    pub fn value(self) -> Option<T> {
        match self {
            Param::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// The front matter of a post, kept as the raw YAML mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: Mapping,
}

impl FrontMatter {
    pub fn parse(yaml: &str) -> Result<Self, FrontMatterError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value =
            serde_yaml::from_str(yaml).map_err(|e| FrontMatterError::Yaml(e.to_string()))?;
        match value {
            Value::Mapping(fields) => Ok(Self { fields }),
            Value::Null => Ok(Self::default()),
            _ => Err(FrontMatterError::NotAMapping),
        }
    }

    /// Raw access. YAML `null` is reported as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self.fields.get(key) {
            None | Some(Value::Null) => None,
            Some(v) => Some(v),
        }
    }

    pub fn bool(&self, key: &str) -> Param<bool> {
        match self.get(key) {
            None => Param::Absent,
            Some(Value::Bool(b)) => Param::Value(*b),
            Some(other) => Param::WrongType(kind_of(other)),
        }
    }

    pub fn int(&self, key: &str) -> Param<i64> {
        match self.get(key) {
            None => Param::Absent,
            Some(v @ Value::Number(n)) => match n.as_i64() {
                Some(i) => Param::Value(i),
                None => Param::WrongType(kind_of(v)),
            },
            Some(other) => Param::WrongType(kind_of(other)),
        }
    }

    pub fn string(&self, key: &str) -> Param<String> {
        match self.get(key) {
            None => Param::Absent,
            Some(Value::String(s)) => Param::Value(s.clone()),
            Some(other) => Param::WrongType(kind_of(other)),
        }
    }

    /// A sequence whose items are all strings. An empty sequence is a value.
    pub fn string_list(&self, key: &str) -> Param<Vec<String>> {
        match self.get(key) {
            None => Param::Absent,
            Some(Value::Sequence(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) => out.push(s.clone()),
                        other => {
                            return Param::WrongType(format!("sequence of {}", kind_of(other)))
                        }
                    }
                }
                Param::Value(out)
            }
            Some(other) => Param::WrongType(kind_of(other)),
        }
    }
}

fn kind_of(value: &Value) -> String {
    match value {
        Value::Null => "null".into(),
        Value::Bool(_) => "bool".into(),
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer".into(),
        Value::Number(_) => "float".into(),
        Value::String(_) => "string".into(),
        Value::Sequence(_) => "sequence".into(),
        Value::Mapping(_) => "mapping".into(),
        Value::Tagged(t) => format!("tagged value {}", t.tag),
    }
}

/// Byte offsets of a `---` delimited front matter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatterSpan {
    /// Start of the first line after the opening delimiter.
    pub yaml_start: usize,
    /// Start of the closing delimiter line.
    pub yaml_end: usize,
    /// Start of the body, after the closing delimiter line.
    pub body_start: usize,
}

/// Locate the front matter block. The opening `---` must be the first line.
pub fn locate(text: &str) -> Option<FrontMatterSpan> {
    let first_line_end = text.find('\n')?;
    if text[..first_line_end].trim_end() != "---" {
        return None;
    }
    let yaml_start = first_line_end + 1;
    let mut offset = yaml_start;
    for line in text[yaml_start..].split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some(FrontMatterSpan {
                yaml_start,
                yaml_end: offset,
                body_start: offset + line.len(),
            });
        }
        offset += line.len();
    }
    None
}

/// Split a Markdown file into its front matter YAML and its body.
pub fn split(text: &str) -> Result<(&str, &str), FrontMatterError> {
    let span = locate(text).ok_or(FrontMatterError::Missing)?;
    Ok((&text[span.yaml_start..span.yaml_end], &text[span.body_start..]))
}

/// Set `key: "value"` in the front matter of `text`.
///
/// An existing top-level `key:` line is replaced in place, otherwise the line
/// is appended right before the closing delimiter. Nothing outside the front
/// matter is touched.
pub fn upsert_field(text: &str, key: &str, value: &str) -> Result<String, FrontMatterError> {
    let span = locate(text).ok_or(FrontMatterError::Missing)?;
    let yaml = &text[span.yaml_start..span.yaml_end];
    let line = format!("{key}: {}", quote(value));

    let field = Regex::new(&format!(r"(?m)^{}:[^\r\n]*", regex::escape(key)))
        .map_err(|e| FrontMatterError::Yaml(e.to_string()))?;

    let new_yaml = if field.is_match(yaml) {
        field.replace(yaml, regex::NoExpand(&line)).into_owned()
    } else {
        let mut y = yaml.to_string();
        if !y.is_empty() && !y.ends_with('\n') {
            y.push('\n');
        }
        y.push_str(&line);
        y.push('\n');
        y
    };

    let mut out = String::with_capacity(text.len() + line.len() + 1);
    out.push_str(&text[..span.yaml_start]);
    out.push_str(&new_yaml);
    out.push_str(&text[span.yaml_end..]);
    Ok(out)
}

static NEEDS_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["\\]"#).expect("literal regex"));

/// `value` as a double-quoted YAML scalar.
pub(crate) fn quote(value: &str) -> String {
    format!("\"{}\"", NEEDS_ESCAPE.replace_all(value, r"\$0"))
}

/// Apply [`upsert_field`] to a file, replacing it atomically.
///
/// Returns `false` when the file already held that exact line.
pub fn record_field(path: &Path, key: &str, value: &str) -> Result<bool, FrontMatterError> {
    let io_err = |source| FrontMatterError::Io {
        path: path.to_path_buf(),
        source,
    };
    let original = std::fs::read_to_string(path).map_err(io_err)?;
    let updated = upsert_field(&original, key, value)?;
    if updated == original {
        debug!(path = %path.display(), key, "Front matter field already up to date");
        return Ok(false);
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let permissions = std::fs::metadata(path).map_err(io_err)?.permissions();
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(updated.as_bytes()).map_err(io_err)?;
    // The temp file is created 0600; keep the post's own mode.
    tmp.as_file().set_permissions(permissions).map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    info!(path = %path.display(), key, value, "Recorded front matter field");
    Ok(true)
}
