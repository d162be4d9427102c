//! Runs one script through the whole pipeline against the hosted Gemini API.
//!
//! Needs `GEMINI_API_KEY` (or `API_KEY`) in the environment or a `.env` file.
//!
//! Run with: cargo run --example pipeline --features gemini

use std::sync::Arc;

use cine_workbench::{ActionOutcome, GeminiBackend, Locale, Studio, Workbench, WorkflowEvent};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SCRIPT: &str = "INT. KITCHEN - DAY

Mira, thirties, flour on her sleeves, cracks an egg one-handed.

MIRA
Perfect. Just like Mum's.

The pan hisses. Steam fogs the window.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cine_workbench=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let backend = GeminiBackend::from_env()?;
    let studio = Studio::new(Workbench::with_locale(Locale::En), Arc::new(backend));

    let mut events = studio.subscribe().await;
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let WorkflowEvent::Notice(notice) = event {
                tracing::warn!(level = ?notice.level, "{}", notice.message);
            }
        }
    });

    studio.workbench().await.update_script(SCRIPT);

    // Script -> Storyboard -> Assets
    studio.advance().await?;
    studio.advance().await?;

    let snapshot = studio.snapshot().await;
    tracing::info!(
        shots = snapshot.storyboard.len(),
        assets = snapshot.assets.len(),
        "storyboard and assets ready"
    );
    for asset in snapshot.assets.assets() {
        println!("asset  {}", asset.context_line());
    }

    for shot in snapshot.storyboard.shots() {
        studio.synthesize_visual_prompt(&shot.id).await?;
    }

    let snapshot = studio.snapshot().await;
    for shot in snapshot.storyboard.shots() {
        println!("#{} [{}] {}", shot.shot_number, shot.shot_type, shot.visual_prompt);
    }

    if let Some(first) = snapshot.storyboard.shots().first() {
        if studio.render_preview(&first.id).await? == ActionOutcome::Applied {
            let workbench = studio.workbench().await;
            if let Some(preview) = workbench.storyboard().preview(&first.id) {
                println!("preview: {} ({} bytes)", preview.mime_type, preview.data.len());
            }
        }
    }

    if let Some(spoken) = snapshot.storyboard.shots().iter().find(|s| !s.dialogue.is_empty()) {
        if let ActionOutcome::Speech { clip } = studio.speak_dialogue(&spoken.id).await? {
            println!(
                "dialogue for shot #{}: {:.1}s of audio",
                spoken.shot_number,
                clip.duration_secs()
            );
        }
    }

    Ok(())
}
