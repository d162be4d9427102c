//! WASM bindings for the workbench.
//!
//! The page owns the network: `begin` hands back the request to send, and
//! `complete` / `fail` feed the model's answer back in.

use std::collections::HashMap;

use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use tokio::sync::broadcast;
use wasm_bindgen::prelude::*;

use crate::assets::{AssetField, AssetKind};
use crate::error::{GenerationError, StudioError};
use crate::generation::media::decode_optional_base64;
use crate::generation::{GenerationOutput, Modality, PreviewImage};
use crate::lang::Locale;
use crate::storyboard::ShotField;
use crate::workflow::action::{AiAction, Begun, PendingAction};
use crate::workflow::events::WorkflowEvent;
use crate::workflow::manager::Workbench;
use crate::workflow::stage::Stage;

/// Serialize a value to JsValue with maps as plain JS objects (not Map).
fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, serde_wasm_bindgen::Error> {
    value.serialize(&Serializer::new().serialize_maps_as_objects(true))
}

// =============================================================================
// ERROR CONVERSION
// =============================================================================

/// Helper macro for Result conversion
macro_rules! js_result {
    ($expr:expr) => {
        $expr.map_err(|e: StudioError| JsValue::from_str(&e.to_string()))
    };
}

fn parse_key<T: serde::de::DeserializeOwned>(key: &str, what: &str) -> Result<T, JsValue> {
    serde_json::from_value(serde_json::Value::String(key.to_string()))
        .map_err(|_| JsValue::from_str(&format!("Unknown {what}: {key}")))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PendingView<'a> {
    status: &'static str,
    ticket: u64,
    request: &'a crate::generation::GenerationRequest,
}

// =============================================================================
// MAIN WRAPPER TYPE
// =============================================================================

/// JavaScript-friendly wrapper around [`Workbench`].
#[wasm_bindgen]
pub struct JsWorkbench {
    inner: Workbench,
    events: broadcast::Receiver<WorkflowEvent>,
    pending: HashMap<u64, PendingAction>,
}

#[wasm_bindgen]
impl JsWorkbench {
    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Creates a workbench with one empty draft.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const wb = new JsWorkbench("en");
    /// ```
    #[wasm_bindgen(constructor)]
    pub fn new(locale: Option<String>) -> Result<JsWorkbench, JsValue> {
        let locale = match locale {
            Some(key) => parse_key::<Locale>(&key, "locale")?,
            None => Locale::default(),
        };
        let inner = Workbench::with_locale(locale);
        let events = inner.subscribe();
        Ok(JsWorkbench {
            inner,
            events,
            pending: HashMap::new(),
        })
    }

    /// Gets the full state as a JavaScript object.
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        Ok(to_js_value(&self.inner.snapshot())?)
    }

    /// Returns every event since the last call, oldest first.
    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&mut self) -> Result<JsValue, JsValue> {
        let mut events = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => events.push(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        Ok(to_js_value(&events)?)
    }

    // =========================================================================
    // STAGE & LOCALE
    // =========================================================================

    #[wasm_bindgen(js_name = setStage)]
    pub fn set_stage(&mut self, stage: &str) -> Result<(), JsValue> {
        let stage: Stage = parse_key(stage, "stage")?;
        self.inner.set_stage(stage);
        Ok(())
    }

    #[wasm_bindgen(js_name = toggleLocale)]
    pub fn toggle_locale(&mut self) -> Result<JsValue, JsValue> {
        Ok(to_js_value(&self.inner.toggle_locale())?)
    }

    /// Static label table for the current locale.
    #[wasm_bindgen(js_name = getLabels)]
    pub fn get_labels(&self) -> Result<JsValue, JsValue> {
        Ok(to_js_value(self.inner.labels())?)
    }

    // =========================================================================
    // SCRIPT
    // =========================================================================

    #[wasm_bindgen(js_name = selectDraft)]
    pub fn select_draft(&mut self, id: &str) -> bool {
        self.inner.select_draft(id)
    }

    #[wasm_bindgen(js_name = updateScript)]
    pub fn update_script(&mut self, content: &str) {
        self.inner.update_script(content);
    }

    #[wasm_bindgen(js_name = createDraft)]
    pub fn create_draft(&mut self) -> String {
        self.inner.create_draft()
    }

    // =========================================================================
    // STORYBOARD
    // =========================================================================

    #[wasm_bindgen(js_name = insertShot)]
    pub fn insert_shot(&mut self) -> String {
        self.inner.insert_shot()
    }

    #[wasm_bindgen(js_name = insertShotAfter)]
    pub fn insert_shot_after(&mut self, after_id: &str) -> Option<String> {
        self.inner.insert_shot_after(after_id)
    }

    #[wasm_bindgen(js_name = removeShot)]
    pub fn remove_shot(&mut self, id: &str) -> bool {
        self.inner.remove_shot(id)
    }

    #[wasm_bindgen(js_name = moveShot)]
    pub fn move_shot(&mut self, id: &str, index: usize) -> bool {
        self.inner.move_shot(id, index)
    }

    #[wasm_bindgen(js_name = selectShot)]
    pub fn select_shot(&mut self, id: &str) -> bool {
        self.inner.select_shot(id)
    }

    /// Sets one text field by its camelCase key (`"visualPrompt"`, ...).
    #[wasm_bindgen(js_name = updateShotField)]
    pub fn update_shot_field(&mut self, id: &str, field: &str, value: &str) -> Result<bool, JsValue> {
        let field = ShotField::parse(field)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown shot field: {field}")))?;
        Ok(self.inner.update_shot_field(id, field, value))
    }

    /// Replaces the character names (array of strings).
    #[wasm_bindgen(js_name = setShotCharacters)]
    pub fn set_shot_characters(&mut self, id: &str, names: JsValue) -> Result<bool, JsValue> {
        let names: Vec<String> = from_value(names)?;
        Ok(self.inner.set_shot_characters(id, names))
    }

    /// `data:` URL of a shot's cached preview.
    #[wasm_bindgen(js_name = previewDataUrl)]
    pub fn preview_data_url(&self, id: &str) -> Option<String> {
        self.inner.storyboard().preview(id).map(PreviewImage::data_url)
    }

    // =========================================================================
    // ASSETS
    // =========================================================================

    #[wasm_bindgen(js_name = addAsset)]
    pub fn add_asset(&mut self, kind: &str) -> Result<String, JsValue> {
        let kind = AssetKind::parse(kind)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown asset type: {kind}")))?;
        Ok(self.inner.add_asset(kind))
    }

    #[wasm_bindgen(js_name = removeAsset)]
    pub fn remove_asset(&mut self, id: &str) -> bool {
        self.inner.remove_asset(id)
    }

    #[wasm_bindgen(js_name = updateAssetField)]
    pub fn update_asset_field(&mut self, id: &str, field: &str, value: &str) -> Result<bool, JsValue> {
        let field = AssetField::parse(field)
            .ok_or_else(|| JsValue::from_str(&format!("Unknown asset field: {field}")))?;
        Ok(self.inner.update_asset_field(id, field, value))
    }

    // =========================================================================
    // AI ACTIONS
    // =========================================================================

    /// Starts an action such as `{ kind: "regenerateShot", shotId }`.
    ///
    /// Returns `{ status: "pending", ticket, request }` when the page must
    /// call the model, or a finished outcome.
    ///
    /// # Example (JavaScript)
    /// ```js
    /// const started = wb.begin({ kind: "advance", from: "SCRIPT" });
    /// if (started.status === "pending") {
    ///   const text = await callModel(started.request);
    ///   wb.complete(started.ticket, text);
    /// }
    /// ```
    pub fn begin(&mut self, action: JsValue) -> Result<JsValue, JsValue> {
        let action: AiAction = from_value(action)?;
        match js_result!(self.inner.begin(action))? {
            Begun::Resolved(outcome) => Ok(to_js_value(&outcome)?),
            Begun::Pending(pending) => {
                let view = to_js_value(&PendingView {
                    status: "pending",
                    ticket: pending.ticket(),
                    request: pending.request(),
                })?;
                self.pending.insert(pending.ticket(), pending);
                Ok(view)
            }
        }
    }

    /// Completes a pending action with the model's answer: a string for text
    /// requests, `{ mimeType, data }` (base64) or `null` for images, a base64
    /// string or `null` for speech. A payload of the wrong shape, or corrupt
    /// base64, fails the action like a backend error.
    pub fn complete(&mut self, ticket: u64, payload: JsValue) -> Result<JsValue, JsValue> {
        let pending = self.take_pending(ticket)?;
        let invalid = |e: serde_wasm_bindgen::Error| GenerationError::invalid_payload(e.to_string());
        let result = match pending.request().modality() {
            Modality::Text => from_value::<String>(payload).map(GenerationOutput::Text).map_err(invalid),
            Modality::Image => from_value::<Option<PreviewImage>>(payload)
                .map(GenerationOutput::Image)
                .map_err(invalid),
            Modality::Audio => from_value::<Option<String>>(payload)
                .map_err(invalid)
                .and_then(|encoded| decode_optional_base64(encoded.as_deref()))
                .map(GenerationOutput::Audio),
        };
        let outcome = js_result!(self.inner.complete(pending, result))?;
        Ok(to_js_value(&outcome)?)
    }

    /// Records that the model call failed. State is left untouched.
    pub fn fail(&mut self, ticket: u64, message: &str) -> Result<JsValue, JsValue> {
        let pending = self.take_pending(ticket)?;
        let result = Err(GenerationError::backend(message));
        match self.inner.complete(pending, result) {
            Ok(outcome) => Ok(to_js_value(&outcome)?),
            Err(StudioError::Generation(_)) => Ok(JsValue::NULL),
            Err(e) => Err(JsValue::from_str(&e.to_string())),
        }
    }

    /// Releases a pending action without applying anything.
    pub fn abandon(&mut self, ticket: u64) -> Result<(), JsValue> {
        let pending = self.take_pending(ticket)?;
        js_result!(self.inner.abandon(pending))
    }

    #[wasm_bindgen(js_name = isBusy)]
    pub fn is_busy(&self) -> bool {
        self.inner.is_busy()
    }
}

impl JsWorkbench {
    fn take_pending(&mut self, ticket: u64) -> Result<PendingAction, JsValue> {
        self.pending
            .remove(&ticket)
            .ok_or_else(|| JsValue::from_str(&StudioError::StaleTicket(ticket).to_string()))
    }
}
