//! Live integration tests against a real narrator deployment.
//!
//! Run with: `SURVIVOR_GM_URL=... cargo test -p survivor-core api_integration -- --ignored --nocapture`

use narrator::Narrator;
use survivor_core::{GameSession, SessionConfig};

fn setup() {
    let _ = dotenvy::dotenv();
}

fn has_endpoint() -> bool {
    std::env::var("SURVIVOR_GM_URL").is_ok()
}

#[tokio::test]
#[ignore]
async fn test_opening_scene_from_live_service() {
    setup();
    if !has_endpoint() {
        eprintln!("Skipping test: SURVIVOR_GM_URL not set");
        return;
    }

    let narrator = Narrator::from_env().expect("endpoint checked above");
    let config = SessionConfig::new(vec!["Ash".into(), "Bo".into()])
        .with_scenario("abandoned arctic research base")
        .with_seed(1);
    let mut session = GameSession::new(narrator, config);

    let opening = session.start().await.expect("opening scene");
    println!("\n=== Opening ===\n{}\n", opening.narrative);

    assert!(!opening.narrative.is_empty());
    assert!(!opening.game_over);
    let state = session.state();
    assert!(state.current_question.is_some());
    assert!(!state.current_options.is_empty());
    assert!(state.current_options.len() <= 8);
}

#[tokio::test]
#[ignore]
async fn test_one_full_turn_against_live_service() {
    setup();
    if !has_endpoint() {
        eprintln!("Skipping test: SURVIVOR_GM_URL not set");
        return;
    }

    let narrator = Narrator::from_env().expect("endpoint checked above");
    let config = SessionConfig::new(vec!["Solo".into()]).with_seed(2);
    let mut session = GameSession::new(narrator, config);
    session.start().await.expect("opening scene");

    let player = session.state().players[0].id;
    let option = session.state().current_options[0].id.clone();
    let ready = session.submit_choice(player, &option).expect("choice");
    assert!(ready, "a solo squad is ready after one pick");

    let report = session.resolve_turn().await.expect("resolution");
    println!("\n=== Turn 1 ===\n{}\n", report.narrative);
    assert!(!report.narrative.is_empty());
}
