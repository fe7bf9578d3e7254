use taxonomy_layout::{LayoutOptions, layout_json};
use wasm_bindgen::prelude::*;

fn parse_options(options_json: Option<String>) -> Result<LayoutOptions, String> {
    match options_json {
        Some(raw_options) if !raw_options.trim().is_empty() => {
            serde_json::from_str::<LayoutOptions>(&raw_options).map_err(|error| error.to_string())
        }
        _ => Ok(LayoutOptions::default()),
    }
}

#[wasm_bindgen]
pub fn layout_taxonomy(nodes_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = parse_options(options_json).map_err(|error| JsValue::from_str(&error))?;
    layout_json(nodes_json, &options).map_err(|error| JsValue::from_str(&error.to_string()))
}
