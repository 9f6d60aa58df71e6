use serde_json::Value as JsonValue;
use thiserror::Error;

/// Errors emitted while reading or writing frontmatter.
#[derive(Debug, Error)]
pub enum FrontmatterError {
    /// YAML failed to parse.
    #[error("Frontmatter parse error: {message}")]
    Parse {
        /// Message from the YAML parser
        message: String,
        /// 1-indexed line inside the YAML block, when known
        line: Option<usize>,
    },
    /// Top-level YAML node was not a mapping.
    #[error("Frontmatter must be a YAML mapping at the top level")]
    InvalidRootType,
    /// The frontmatter value could not be written back as YAML.
    #[error("Frontmatter render error: {0}")]
    Render(String),
}

impl FrontmatterError {
    /// Line inside the YAML block where parsing failed.
    pub fn line(&self) -> Option<usize> {
        match self {
            FrontmatterError::Parse { line, .. } => *line,
            _ => None,
        }
    }
}

/// Parses the body of a YAML frontmatter block (without its `---` fences)
/// into a JSON object. An empty or `null` block yields an empty object.
pub fn parse_frontmatter(block: &str) -> Result<JsonValue, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(JsonValue::Object(Default::default()));
    }

    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(block).map_err(|err| FrontmatterError::Parse {
            line: err.location().map(|location| location.line()),
            message: err.to_string(),
        })?;
    let json_value = serde_json::to_value(yaml_value).map_err(|err| FrontmatterError::Parse {
        message: err.to_string(),
        line: None,
    })?;

    match json_value {
        JsonValue::Null => Ok(JsonValue::Object(Default::default())),
        JsonValue::Object(_) => Ok(json_value),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}

/// Renders a frontmatter object back to YAML, newline-terminated and
/// without fences. Returns `None` for an empty mapping.
pub fn render_frontmatter(value: &JsonValue) -> Result<Option<String>, FrontmatterError> {
    match value {
        JsonValue::Object(map) if map.is_empty() => Ok(None),
        JsonValue::Object(_) => {
            let yaml = serde_yaml::to_string(value)
                .map_err(|err| FrontmatterError::Render(err.to_string()))?;
            Ok(Some(yaml))
        }
        JsonValue::Null => Ok(None),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}
