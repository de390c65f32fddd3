//! WASM bindings for merchant statement field extraction.
//!
//! This crate lets the browser tool run the extraction engine directly on
//! uploaded files.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use riskscan_core::{BatchAggregator, RiskscanConfig, StatementEngine, StatementFile};

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn config_from_js(config: JsValue) -> Result<RiskscanConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(RiskscanConfig::default());
    }
    serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Extract statement fields from PDF bytes.
///
/// Fails only when the document cannot be decoded; a scanned PDF comes back
/// with `requiresManualEntry` set.
#[wasm_bindgen(js_name = extractStatementPdf)]
pub fn extract_statement_pdf(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let outcome = StatementEngine::default()
        .extract_pdf(bytes)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&outcome)
}

/// Extract statement fields from CSV bytes.
#[wasm_bindgen(js_name = extractStatementCsv)]
pub fn extract_statement_csv(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let outcome = StatementEngine::default()
        .extract_csv(bytes)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&outcome)
}

/// The CSV fill-in template.
#[wasm_bindgen(js_name = csvTemplate)]
pub fn csv_template() -> String {
    riskscan_core::csv_template()
}

/// A set of uploaded statements processed together.
#[wasm_bindgen]
pub struct StatementBatch {
    aggregator: BatchAggregator,
    files: Vec<StatementFile>,
}

#[wasm_bindgen]
impl StatementBatch {
    /// Create a batch. `config` is an optional partial configuration object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<StatementBatch, JsValue> {
        Ok(Self {
            aggregator: BatchAggregator::new(config_from_js(config)?),
            files: Vec::new(),
        })
    }

    /// Queue an uploaded file.
    #[wasm_bindgen(js_name = addFile)]
    pub fn add_file(&mut self, filename: &str, bytes: Vec<u8>) {
        self.files.push(StatementFile::new(filename, bytes));
    }

    /// Number of queued files.
    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.files.len()
    }

    /// Extract every queued file and return the entries in chronological
    /// order. The queue is emptied.
    #[wasm_bindgen]
    pub fn run(&mut self) -> Result<JsValue, JsValue> {
        let started = js_sys::Date::now();
        let files = std::mem::take(&mut self.files);
        let entries = self.aggregator.run(files);

        for entry in entries.iter().filter(|e| !e.is_success()) {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "{}: {}",
                entry.filename(),
                entry.parse_error().unwrap_or("extraction failed")
            )));
        }
        web_sys::console::debug_1(&JsValue::from_str(&format!(
            "Processed {} statement(s) in {} ms",
            entries.len(),
            js_sys::Date::now() - started
        )));

        to_js(&entries)
    }
}
