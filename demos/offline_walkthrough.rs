//! Drives the workbench by hand with canned model replies, no network.
//!
//! Shows the two-phase protocol a UI would use: `begin` an action, run the
//! request somewhere, then `complete` it with whatever came back.
//!
//! Run with: cargo run --example offline_walkthrough

use cine_workbench::generation::{GenerationBackend, Operation};
use cine_workbench::{
    AiAction, Begun, Locale, ShotField, Stage, StubBackend, Workbench, WorkflowEvent,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SHOTS: &str = r#"[
  {"shotType": "WS", "sceneName": "Harbor", "location": "Pier", "action": "Fog rolls over the pier."},
  {"shotType": "MS", "action": "Ada ties off the boat.", "dialogue": "Late again."},
  {"shotType": "CU", "action": "A bell rings somewhere unseen."}
]"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cine_workbench=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let backend = StubBackend::new()
        .with_text(Operation::Storyboard, SHOTS)
        .with_text(Operation::VisualPrompt, "Wide shot, fog, sodium lights, 35mm, muted teal palette")
        .with_text(Operation::Translate, "雾气漫过码头。");

    let mut workbench = Workbench::with_locale(Locale::En);
    let mut events = workbench.subscribe();

    workbench.update_script("EXT. HARBOR - NIGHT\n\nFog. Ada brings the boat in.");

    let from = workbench.stage();
    run(&mut workbench, &backend, AiAction::Advance { from }).await?;
    assert_eq!(workbench.stage(), Stage::Storyboard);

    let first = workbench.storyboard().shots()[0].id.clone();
    run(
        &mut workbench,
        &backend,
        AiAction::SynthesizeVisualPrompt {
            shot_id: first.clone(),
        },
    )
    .await?;
    run(
        &mut workbench,
        &backend,
        AiAction::TranslateShotField {
            shot_id: first.clone(),
            field: ShotField::Action,
        },
    )
    .await?;

    // Editing a cinematic field after synthesis marks the prompt stale.
    workbench.set_shot_lighting(&first, "Single practical lamp, hard shadows");

    let middle = workbench.storyboard().shots()[1].id.clone();
    workbench.remove_shot(&middle);

    for shot in workbench.storyboard().shots() {
        println!(
            "#{} {:<3} stale={:<5} {} | {}",
            shot.shot_number, shot.shot_type, shot.is_stale, shot.action, shot.visual_prompt
        );
    }

    let mut count = 0;
    while let Ok(event) = events.try_recv() {
        if !matches!(event, WorkflowEvent::BusyChanged { .. }) {
            println!("event: {}", serde_json::to_string(&event)?);
        }
        count += 1;
    }
    println!("{count} events, {} backend calls", backend.calls().len());

    Ok(())
}

/// Begins `action`, answers it from `backend`, and completes it.
async fn run(
    workbench: &mut Workbench,
    backend: &StubBackend,
    action: AiAction,
) -> anyhow::Result<()> {
    let pending = match workbench.begin(action)? {
        Begun::Resolved(outcome) => {
            println!("resolved: {outcome:?}");
            return Ok(());
        }
        Begun::Pending(pending) => pending,
    };
    let result = backend.execute(pending.request()).await;
    let outcome = workbench.complete(pending, result)?;
    println!("completed: {outcome:?}");
    Ok(())
}
