use mdxblocks_editor::{DocumentNode, Options, catalogue, parse_document};
use serde::Serialize;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;

// ============================================================================
// Options
// ============================================================================

fn parse_options(options: JsValue) -> Result<Options, JsError> {
    if options.is_undefined() || options.is_null() {
        return Ok(Options::default());
    }
    serde_wasm_bindgen::from_value(options)
        .map_err(|e| JsError::new(&format!("Invalid options: {}", e)))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    // Plain objects rather than `Map`s, so the editor can read `attrs` directly.
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

// ============================================================================
// Conversion API
// ============================================================================

/// Parses MDX into an editor document.
///
/// Never throws for bad MDX: syntax errors come back in the result.
///
/// # Arguments
///
/// * `source` - The MDX text
/// * `options` - Optional `{ gfm?: boolean, frontmatter?: boolean }`
///
/// # Example (JavaScript)
///
/// ```javascript
/// import { parseMdx } from './mdxblocks_wasm';
///
/// const result = parseMdx('# Hello\n\n<Tip>Nice</Tip>');
/// // result = {
/// //   document: { type: "doc", content: [ ... ] },
/// //   parseError: null,
/// //   errorLine: null,
/// //   warnings: []
/// // }
///
/// const broken = parseMdx('<Card>\n\nunclosed');
/// // broken.document === null, broken.parseError is the engine message
/// ```
#[wasm_bindgen(js_name = parseMdx)]
pub fn parse_mdx(source: &str, options: JsValue) -> Result<JsValue, JsError> {
    let options = parse_options(options)?;
    let result = parse_document(source, &options);
    to_js(&result)
}

/// Writes an editor document back to MDX text.
///
/// Throws when the value is not a document or breaks the schema.
#[wasm_bindgen(js_name = serializeDocument)]
pub fn serialize_document(doc: JsValue) -> Result<String, JsError> {
    let doc: DocumentNode = serde_wasm_bindgen::from_value(doc)
        .map_err(|e| JsError::new(&format!("Invalid document: {}", e)))?;
    mdxblocks_editor::serialize_document(&doc).map_err(|e| JsError::new(&e.to_string()))
}

// ============================================================================
// Helpers for the editor UI
// ============================================================================

/// Line number an error message points at, if it names one.
#[wasm_bindgen(js_name = locateError)]
pub fn locate_error(message: &str) -> Option<u32> {
    mdxblocks_core::locate_error(message).and_then(|location| u32::try_from(location.line).ok())
}

/// Component names the editor has a block for, in catalogue order.
#[wasm_bindgen(js_name = componentNames)]
pub fn component_names() -> js_sys::Array {
    catalogue()
        .rules()
        .iter()
        .map(|rule| JsValue::from_str(rule.name))
        .collect()
}
