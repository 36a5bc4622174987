use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use wagerplay::prelude::*;

// ---------------------------------------------------------------------------
// Question bank
// ---------------------------------------------------------------------------

const QUESTIONS: &str = r#"[
  {"mainTerm": "OCEAN", "prompt": "A vast body of saltwater that covers most of the planet.",
   "forbiddenTerms": ["SEA", "WATER", "BLUE", "FISH", "BOAT"], "topic": "Nature"},
  {"mainTerm": "KEYBOARD", "prompt": "What you press to put words on a screen.",
   "forbiddenTerms": ["COMPUTER", "TYPING", "BUTTONS", "LETTERS", "MOUSE"], "topic": "Technology"},
  {"mainTerm": "GUITAR", "prompt": "Six of them, a neck, and a sound hole.",
   "forbiddenTerms": ["MUSIC", "STRINGS", "PLAY", "INSTRUMENT", "SONG"], "topic": "Music"},
  {"mainTerm": "COFFEE", "prompt": "The reason many people get out of bed.",
   "forbiddenTerms": ["DRINK", "BEAN", "CUP", "CAFFEINE", "HOT"], "topic": "Food & Drink"},
  {"mainTerm": "BICYCLE", "prompt": "Two wheels, no engine.",
   "forbiddenTerms": ["WHEELS", "RIDE", "PEDALS", "BIKE", "TRANSPORT"], "topic": "Sport & Leisure"}
]"#;

/// What the scripted guest types for each prompt. The guitar answer
/// slips a forbidden word.
fn scripted_guess(question: &Question) -> String {
    match question.main_term.as_str() {
        "OCEAN" => "is it the ocean?".into(),
        "KEYBOARD" => "a keyboard".into(),
        "GUITAR" => "you play a guitar".into(),
        "COFFEE" => "coffee, surely".into(),
        "BICYCLE" => "a bicycle".into(),
        _ => "pass".into(),
    }
}

// ---------------------------------------------------------------------------
// Settlement gateway
// ---------------------------------------------------------------------------

/// Accepts every transfer and hands back a sequential reference.
#[derive(Default)]
struct LoggingGateway {
    next: AtomicU64,
}

impl SettlementGateway for LoggingGateway {
    async fn settle(&self, request: &SettlementRequest) -> Result<SettlementReceipt, SettlementError> {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(
            from = %request.from_address,
            to = %request.to_address,
            amount = %request.amount,
            "transfer accepted"
        );
        Ok(SettlementReceipt { reference: format!("demo-tx-{n}") })
    }
}

type Service = Coordinator<MemoryStore, LoggingGateway>;

fn game_config() -> Result<GameConfig, Box<dyn std::error::Error>> {
    Ok(GameConfig {
        game_id: "1".into(),
        game_name: "Taboo the AI".into(),
        time_limit_seconds: 20,
        question_count: 3,
        question_mode: QuestionMode::Random,
        wager: Amount::parse("0.5")?,
        arbiter_address: "0xarcade".into(),
    })
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// Plays every question with the scripted answers, racing the countdown.
async fn play(engine: &mut TurnEngine, think: Duration) -> Result<Verdict, WagerError> {
    let mut countdown = Countdown::new(Duration::from_secs(engine.session().time_limit_seconds()));

    while let Some(question) = engine.current_question().cloned() {
        tokio::select! {
            _ = tokio::time::sleep(think) => {
                let guess = scripted_guess(&question);
                let record = engine.submit(&guess)?;
                eprintln!("  {:<10} {guess:<20} → {:?}", question.main_term, record.outcome);
            }
            tick = countdown.next() => {
                if tick.expired {
                    engine.expire()?;
                } else {
                    tracing::debug!(remaining = %tick.display(), "tick");
                }
            }
        }
    }
    countdown.stop();

    engine.verdict().cloned().ok_or_else(|| {
        WagerError::BadRequest("session ended without a verdict".into())
    })
}

async fn run_duel(service: Arc<Service>, think: Duration) -> Result<SettlementRecord, Box<dyn std::error::Error>> {
    let host = PlayerId::new("0xhost");
    let guest = PlayerId::new("0xguest");

    let lobby = service.create_lobby(host.clone(), 2, game_config()?).await?;
    eprintln!("host opened lobby {} ({} seats)", lobby.id(), lobby.capacity());

    let watcher = service.watch(lobby.id().clone());

    let joining = {
        let service = Arc::clone(&service);
        let id = lobby.id().clone();
        let guest = guest.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            service.join_lobby(&id, guest).await
        })
    };

    let ready = match watcher.outcome().await {
        WatchOutcome::Ready(lobby) => lobby,
        other => return Err(format!("lobby never became ready: {other:?}").into()),
    };
    joining.await??;
    eprintln!("lobby ready with {:?}", ready.players());

    let mut engine = service.start_turns(ready.id(), guest.clone()).await?;
    eprintln!(
        "guest plays {} questions against {} ({}s)",
        engine.session().question_count(),
        engine.opponent(),
        engine.session().time_limit_seconds()
    );

    let verdict = play(&mut engine, think).await?;
    let summary = engine.summary();
    eprintln!(
        "{}: score {}/{}, winner {}",
        summary.state, summary.score, summary.question_count, verdict.winner
    );
    for turn in &summary.opponent_history {
        eprintln!("  opponent {:<10} {:<20} → {:?}", turn.main_term, turn.submitted_text, turn.outcome);
    }

    Ok(service.settle(&verdict).await)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    wagerplay::init_tracing();

    let bank = QuestionBank::from_json(QUESTIONS)?;
    let service = Arc::new(
        CoordinatorBuilder::new()
            .enforce_deadline(true)
            .build(MemoryStore::new(), LoggingGateway::default(), bank),
    );

    let record = run_duel(Arc::clone(&service), Duration::from_millis(800)).await?;
    eprintln!(
        "settlement {}: {} → {} ({})",
        record.status, record.request.from_address, record.request.to_address, record.request.amount
    );

    let opening = Amount::parse("10")?;
    for address in [&record.request.from_address, &record.request.to_address] {
        match service.balance(address).applied_to(opening) {
            Some(balance) => eprintln!("  {address}: {balance}"),
            None => eprintln!("  {address}: overdrawn"),
        }
    }
    Ok(())
}
