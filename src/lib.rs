//! Ered Tree - WASM Module
//!
//! Layout engine and parameter-name encoder for the error-reduction tree
//! viewer. It is compiled to WebAssembly and exposes a JavaScript-friendly API
//! via wasm-bindgen; the same types are usable directly from Rust.
//!
//! # Architecture
//!
//! - `graph`: node records and the validated hierarchy (petgraph StableGraph)
//! - `names`: parameter-name compression and its inverse parser
//! - `layout`: primary positions, label placement and the annotation pass
//! - `spatial`: R-tree index over placed labels
//! - `measure`: label width measurement
//! - `session`: configuration, groups and subscriptions around the pass
//! - `protocol`: relay message contract

use std::collections::HashMap;

use js_sys::Function;
use log::LevelFilter;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod graph;
pub mod groups;
pub mod layout;
pub mod logging;
pub mod measure;
pub mod names;
pub mod protocol;
pub mod session;
pub mod spatial;

pub use config::{LayoutConfig, LayoutMode, MultiDimStyle};
pub use error::{EncodingError, Error, LayoutError, StructuralError};
pub use graph::{AnnotatedNode, Node};
pub use layout::{AnnotatedTree, annotate};
pub use session::{SessionContext, TreeSession};

use measure::GlyphTableMeasure;
use names::{DisplayNames, NameCompressor};
use protocol::{MethodCall, Outbound};
use session::{Handled, SubscriptionId};

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::init(LevelFilter::Info);
}

fn from_js<T: serde::de::DeserializeOwned + Default>(value: JsValue) -> Result<T, JsError> {
    if value.is_undefined() || value.is_null() {
        Ok(T::default())
    } else {
        Ok(serde_wasm_bindgen::from_value(value)?)
    }
}

/// Main entry point for the viewer.
///
/// Wraps a [`TreeSession`] and exchanges records and snapshots with
/// JavaScript as plain objects.
#[wasm_bindgen]
pub struct TreeLayoutWasm {
    session: TreeSession,
}

#[wasm_bindgen]
impl TreeLayoutWasm {
    /// Create a session. `config` may be a partial `LayoutConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<TreeLayoutWasm, JsError> {
        Ok(Self {
            session: TreeSession::new(from_js(config)?),
        })
    }

    /// Install the process-wide measurer from canvas glyph advances.
    ///
    /// `table` maps single characters to their advance. Returns `false` if a
    /// measurer was already installed.
    #[wasm_bindgen(js_name = installGlyphWidths)]
    pub fn install_glyph_widths(default_advance: f32, table: JsValue) -> Result<bool, JsError> {
        let table: HashMap<String, f32> = from_js(table)?;
        let advances = table
            .into_iter()
            .filter_map(|(glyph, advance)| glyph.chars().next().map(|c| (c, advance)))
            .collect();
        Ok(measure::install(GlyphTableMeasure::new(default_advance, advances)))
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// Lay out a record array and return the annotated snapshot.
    pub fn load(&mut self, records: JsValue) -> Result<JsValue, JsError> {
        let nodes: Vec<Node> = serde_wasm_bindgen::from_value(records)?;
        let tree = self.session.load(nodes)?;
        Ok(serde_wasm_bindgen::to_value(&*tree)?)
    }

    /// Apply a relay message. Returns text to send back, if any.
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&mut self, text: &str) -> Result<Option<String>, JsError> {
        match self.session.handle_message(text)? {
            Handled::Reply(reply) => Ok(Some(reply.to_owned())),
            Handled::Tree(_) | Handled::Groups => Ok(None),
        }
    }

    /// The last committed snapshot, or `null`.
    pub fn snapshot(&self) -> Result<JsValue, JsError> {
        match self.session.current() {
            Some(tree) => Ok(serde_wasm_bindgen::to_value(&*tree)?),
            None => Ok(JsValue::NULL),
        }
    }

    /// Call `callback` with every new snapshot. Returns a subscription id.
    pub fn subscribe(&mut self, callback: Function) -> u32 {
        self.session
            .subscribe(move |tree| match serde_wasm_bindgen::to_value(tree) {
                Ok(value) => {
                    if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                        log::error!("snapshot subscriber threw: {err:?}");
                    }
                }
                Err(err) => log::error!("cannot convert snapshot: {err}"),
            })
            .0
    }

    pub fn unsubscribe(&mut self, id: u32) -> bool {
        self.session.unsubscribe(SubscriptionId(id))
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// `sequence`/`long` or `balanced`/`normal`.
    #[wasm_bindgen(js_name = setMode)]
    pub fn set_mode(&mut self, selector: &str) -> Result<(), JsError> {
        let mode = LayoutMode::from_selector(selector)
            .ok_or_else(|| JsError::new(&format!("unknown layout mode `{selector}`")))?;
        Ok(self.session.set_mode(mode)?)
    }

    #[wasm_bindgen(js_name = setShowGlobals)]
    pub fn set_show_globals(&mut self, show: bool) -> Result<(), JsError> {
        Ok(self.session.set_show_globals(show)?)
    }

    /// Replace the display-name mapping.
    #[wasm_bindgen(js_name = setNames)]
    pub fn set_names(&mut self, names: JsValue) -> Result<(), JsError> {
        Ok(self.session.set_names(from_js(names)?)?)
    }

    /// Abbreviate every unnamed prefix in the loaded tree. Returns how many
    /// names were added.
    #[wasm_bindgen(js_name = registerDefaultNames)]
    pub fn register_default_names(&mut self) -> Result<usize, JsError> {
        Ok(self.session.register_default_names()?)
    }

    #[wasm_bindgen(js_name = selectGroup)]
    pub fn select_group(&mut self, group: Option<String>) -> Result<(), JsError> {
        Ok(self.session.select_group(group)?)
    }

    #[wasm_bindgen(js_name = defineGroup)]
    pub fn define_group(&mut self, name: &str, nodes: Vec<String>) -> Result<(), JsError> {
        Ok(self.session.define_group(name, nodes)?)
    }

    #[wasm_bindgen(js_name = removeGroup)]
    pub fn remove_group(&mut self, name: &str) -> Result<(), JsError> {
        Ok(self.session.remove_group(name)?)
    }

    // =========================================================================
    // Relay
    // =========================================================================

    /// The `id` message announcing this client.
    pub fn handshake() -> Result<String, JsError> {
        Ok(Outbound::handshake().to_json()?)
    }

    /// Encode `{method, args}` as a relay `method` message.
    #[wasm_bindgen(js_name = encodeMethod)]
    pub fn encode_method(call: JsValue) -> Result<String, JsError> {
        let call: MethodCall = serde_wasm_bindgen::from_value(call)?;
        Ok(Outbound::from(call).to_json()?)
    }
}

/// Compress a parameter list into display strings.
#[wasm_bindgen(js_name = compressNames)]
pub fn compress_names(params: Vec<String>, names: JsValue) -> Result<Vec<String>, JsError> {
    let names: DisplayNames = from_js(names)?;
    Ok(NameCompressor::new(&names, &LayoutConfig::default()).compress(&params))
}

/// Expand per-dimension index tokens into explicit tuples.
#[wasm_bindgen(js_name = parseIndexStrs)]
pub fn parse_index_strs(tokens: Vec<String>) -> Result<JsValue, JsError> {
    let tuples = names::parse_index_strs(&tokens)?;
    Ok(serde_wasm_bindgen::to_value(&tuples)?)
}
