//! Arena simulation binary
//!
//! Runs one full round against the seeded mock oracle: submissions,
//! optimistic scoring, committee verification, an appeal, and finalization.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arena_oracle::MockOracle;
use arena_protocol::{MemoryLedger, PromptSource, RoundCoordinator, RoundRoster};
use arena_types::{
    AnswerStatus, PlayerId, ProtocolConfig, RoundId, SessionId, ValidatorId,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct CannedPrompts {
    prompts: Vec<&'static str>,
    next: usize,
}

impl CannedPrompts {
    fn new() -> Self {
        Self {
            prompts: vec![
                "Explain optimistic scoring as if you are a sports commentator.",
                "Describe a validator committee to a five-year-old.",
                "Pitch bonded appeals as a startup idea.",
                "Explain why subjective scoring needs consensus.",
            ],
            next: 0,
        }
    }
}

impl PromptSource for CannedPrompts {
    fn next_prompt(&mut self, _session_id: SessionId, _round_id: RoundId) -> String {
        let prompt = self.prompts[self.next % self.prompts.len()];
        self.next += 1;
        prompt.to_string()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arena_sim=info,arena=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Arena round simulation");

    let config = ProtocolConfig::default().with_challenge_window(Duration::from_millis(200));
    let roster = RoundRoster::new(
        ValidatorId(1),
        vec![ValidatorId(2), ValidatorId(3), ValidatorId(4)],
        (1..=8).map(ValidatorId).collect(),
    );
    let mut prompts = CannedPrompts::new();
    let prompt = prompts.next_prompt(SessionId(1), RoundId(1));
    tracing::info!(%prompt, "round prompt");

    let oracle = Arc::new(MockOracle::seeded(2024));
    let mut round = RoundCoordinator::new(
        RoundId(1),
        SessionId(1),
        prompt,
        roster,
        config,
        oracle,
    )?;

    let submissions = [
        (PlayerId(1), "It's a photo finish and the committee has the replay!"),
        (PlayerId(2), "A jury of robots checks the first robot's homework."),
        (PlayerId(3), "Stake XP on being right; the median decides."),
        (PlayerId(4), "Scores are opinions until three validators agree."),
    ];
    let mut answer_ids = Vec::new();
    for (i, (player, text)) in submissions.iter().enumerate() {
        let id = round.submit_answer(*player, (*text).to_string(), 100 + i as u64)?;
        round.set_moderation(id, AnswerStatus::Valid)?;
        answer_ids.push(id);
    }

    round.close_submissions()?;
    round.run_scoring().await?;
    round.run_verification(1_000).await?;

    // Human votes favor the last submission.
    let tallies: HashMap<_, _> = answer_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i as u64 + 1))
        .collect();

    // One challenger contests the top-voted answer's AI score.
    let appeal = round.file_appeal(PlayerId(2), answer_ids[3], 15, 1_050)?;
    let resolution = round.resolve_appeal(appeal, &tallies, 1_100).await?;
    tracing::info!(status = ?resolution.status, refund = resolution.refund, "appeal resolved");

    round.wait_for_window().await;

    let mut ledger = MemoryLedger::default();
    let board = round.finalize(&tallies, &mut ledger, 1_000 + 200)?;
    println!("{}", serde_json::to_string_pretty(&board)?);
    tracing::info!(escrow = ?round.escrow(), "round complete");

    Ok(())
}
