//! `Studio`: drives AI actions against a shared [`Workbench`] and a
//! [`GenerationBackend`].
//!
//! The workbench mutex is held only while an action begins and while it
//! completes, never across the model call, so actions on different targets
//! overlap freely.
//!
//! A `run` future dropped mid-call releases its target lock. If the
//! workbench is locked at that moment, the action is parked and released by
//! the next call that locks the workbench through this studio.

use std::sync::{Arc, PoisonError};

use tokio::sync::{broadcast, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::StudioResult;
use crate::generation::GenerationBackend;
use crate::storyboard::ShotField;
use crate::workflow::action::{ActionOutcome, AiAction, Begun, PendingAction};
use crate::workflow::events::WorkflowEvent;
use crate::workflow::manager::{Workbench, WorkbenchSnapshot};

/// Cheaply cloneable handle; clones share one workbench and one backend.
#[derive(Clone)]
pub struct Studio {
    workbench: Arc<Mutex<Workbench>>,
    backend: Arc<dyn GenerationBackend>,
    /// Cancelled actions waiting for the workbench lock.
    cancelled: Arc<std::sync::Mutex<Vec<PendingAction>>>,
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}

impl Studio {
    pub fn new(workbench: Workbench, backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            workbench: Arc::new(Mutex::new(workbench)),
            backend,
            cancelled: Arc::default(),
        }
    }

    /// A fresh workbench driven by `backend`.
    pub fn with_backend(backend: impl GenerationBackend + 'static) -> Self {
        Self::new(Workbench::new(), Arc::new(backend))
    }

    /// Exclusive access for synchronous edits. Do not hold the guard across
    /// an `.await` on this studio.
    pub async fn workbench(&self) -> MutexGuard<'_, Workbench> {
        self.lock().await
    }

    pub async fn snapshot(&self) -> WorkbenchSnapshot {
        self.lock().await.snapshot()
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.lock().await.subscribe()
    }

    pub fn backend(&self) -> &Arc<dyn GenerationBackend> {
        &self.backend
    }

    /// Begins `action`, calls the backend if needed, and completes it.
    pub async fn run(&self, action: AiAction) -> StudioResult<ActionOutcome> {
        let pending = match self.lock().await.begin(action)? {
            Begun::Resolved(outcome) => return Ok(outcome),
            Begun::Pending(pending) => pending,
        };

        let request = pending.request().clone();
        debug!(
            backend = self.backend.name(),
            ticket = pending.ticket(),
            target = %pending.target(),
            "calling generation backend"
        );
        let mut guard = InFlight {
            studio: self,
            pending: Some(pending),
        };
        let result = self.backend.execute(&request).await;

        let mut workbench = self.lock().await;
        match guard.pending.take() {
            Some(pending) => workbench.complete(pending, result),
            None => Ok(ActionOutcome::Discarded),
        }
    }

    /// Locks the workbench, first releasing any parked cancelled actions.
    async fn lock(&self) -> MutexGuard<'_, Workbench> {
        let mut workbench = self.workbench.lock().await;
        let parked = std::mem::take(&mut *self.parked());
        for pending in parked {
            release_cancelled(&mut workbench, pending);
        }
        workbench
    }

    fn parked(&self) -> std::sync::MutexGuard<'_, Vec<PendingAction>> {
        self.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // CONVENIENCE WRAPPERS
    // =========================================================================

    /// Advances from the current stage.
    pub async fn advance(&self) -> StudioResult<ActionOutcome> {
        let from = self.lock().await.stage();
        self.run(AiAction::Advance { from }).await
    }

    pub async fn extract_assets(&self) -> StudioResult<ActionOutcome> {
        self.run(AiAction::ExtractAssets).await
    }

    pub async fn chat_script(&self, message: impl Into<String>) -> StudioResult<ActionOutcome> {
        self.run(AiAction::ChatScript {
            message: message.into(),
        })
        .await
    }

    pub async fn regenerate_shot(&self, shot_id: &str) -> StudioResult<ActionOutcome> {
        self.run(AiAction::RegenerateShot {
            shot_id: shot_id.to_string(),
        })
        .await
    }

    pub async fn synthesize_visual_prompt(&self, shot_id: &str) -> StudioResult<ActionOutcome> {
        self.run(AiAction::SynthesizeVisualPrompt {
            shot_id: shot_id.to_string(),
        })
        .await
    }

    pub async fn refine_visual_prompt(
        &self,
        shot_id: &str,
        note: impl Into<String>,
    ) -> StudioResult<ActionOutcome> {
        self.run(AiAction::RefineVisualPrompt {
            shot_id: shot_id.to_string(),
            note: note.into(),
        })
        .await
    }

    pub async fn translate_shot_field(
        &self,
        shot_id: &str,
        field: ShotField,
    ) -> StudioResult<ActionOutcome> {
        self.run(AiAction::TranslateShotField {
            shot_id: shot_id.to_string(),
            field,
        })
        .await
    }

    pub async fn render_preview(&self, shot_id: &str) -> StudioResult<ActionOutcome> {
        self.run(AiAction::RenderPreview {
            shot_id: shot_id.to_string(),
        })
        .await
    }

    pub async fn speak_dialogue(&self, shot_id: &str) -> StudioResult<ActionOutcome> {
        self.run(AiAction::SpeakDialogue {
            shot_id: shot_id.to_string(),
        })
        .await
    }

    pub async fn enhance_asset_prompt(&self, asset_id: &str) -> StudioResult<ActionOutcome> {
        self.run(AiAction::EnhanceAssetPrompt {
            asset_id: asset_id.to_string(),
        })
        .await
    }

    pub async fn translate_asset_prompt(&self, asset_id: &str) -> StudioResult<ActionOutcome> {
        self.run(AiAction::TranslateAssetPrompt {
            asset_id: asset_id.to_string(),
        })
        .await
    }
}

fn release_cancelled(workbench: &mut Workbench, pending: PendingAction) {
    let ticket = pending.ticket();
    if let Err(e) = workbench.abandon(pending) {
        warn!(ticket, error = %e, "cancelled action was already released");
    }
}

/// Releases the target lock if `run` is dropped mid-call.
struct InFlight<'a> {
    studio: &'a Studio,
    pending: Option<PendingAction>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        match self.studio.workbench.try_lock() {
            Ok(mut workbench) => release_cancelled(&mut workbench, pending),
            Err(_) => {
                debug!(
                    ticket = pending.ticket(),
                    target = %pending.target(),
                    "workbench locked; parking cancelled action"
                );
                self.studio.parked().push(pending);
            }
        }
    }
}
