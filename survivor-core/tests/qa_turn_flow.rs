//! QA tests for the turn loop: choice collection, resolution, effects, and
//! end-of-run conditions, driven through the scripted harness.

use narrator::{FinaleEntry, GmReply, ItemReward, PlayerOutcome};
use survivor_core::testing::{
    assert_awaiting_choices, assert_game_over, assert_inventory_count, continuing_reply,
    TestHarness,
};
use survivor_core::{Effect, Rarity};

#[test]
fn test_opening_scene_spends_no_turn_budget() {
    // The opening fetch only presents turn 1's question; a two-turn run
    // still gets exactly two choice rounds after it.
    let mut harness = TestHarness::with_turns(&["Ash"], 2);
    harness.expect_reply(continuing_reply("You wake to sirens."));
    harness.expect_reply(continuing_reply("The stairwell groans."));
    harness.expect_reply(continuing_reply("You reach the roof."));

    let opening = harness.resolve();
    assert!(!opening.game_over);
    assert_eq!(harness.state.turn, 1);
    assert_awaiting_choices(&harness);

    harness.submit_all("push-on");
    assert!(!harness.resolve().game_over);
    assert_eq!(harness.state.turn, 2);
    assert_awaiting_choices(&harness);

    harness.submit_all("push-on");
    let last = harness.resolve();
    assert!(last.game_over);
    assert_game_over(&harness);
}

#[test]
fn test_one_turn_run_survives_its_opening_scene() {
    let mut harness = TestHarness::with_turns(&["Solo"], 1);
    harness.expect_reply(continuing_reply("The hatch creaks open."));
    harness.expect_reply(continuing_reply("It slams shut behind you."));

    let opening = harness.resolve();
    assert!(!opening.game_over);
    assert_awaiting_choices(&harness);

    harness.submit_all("push-on");
    let closing = harness.resolve();
    assert!(closing.game_over);
    assert_game_over(&harness);
    assert_eq!(harness.state.finale.len(), 1);
}

#[test]
fn test_full_run_to_finale_at_max_turns() {
    let mut harness = TestHarness::with_turns(&["Ash", "Bo", "Cy"], 1);
    harness.expect_reply(GmReply {
        narrative: "The hatch blows and daylight pours in.".into(),
        score_delta: 10,
        player_finale: vec![
            FinaleEntry {
                player_index: Some(0),
                name: None,
                survived: Some(true),
                text: "Ash limps out first.".into(),
            },
            FinaleEntry {
                player_index: None,
                name: Some("bo".into()),
                survived: Some(true),
                text: "Bo follows, laughing.".into(),
            },
        ],
        ..continuing_reply("unused continuation")
    });

    harness.open_question(&["run", "hide"]);
    harness.submit_all("run");
    let report = harness.resolve();

    assert!(report.game_over);
    assert_game_over(&harness);
    // No boost active, so the squad score lands unmultiplied.
    assert_eq!(harness.score(), 10);
    assert_eq!(harness.state.finale.len(), 3);
    assert_eq!(harness.state.finale[1].text, "Bo follows, laughing.");
    // Cy got no scripted line but survives by life total.
    assert!(harness.state.finale[2].survived);
    assert!(harness.state.finale[2].text.is_empty());
}

#[test]
fn test_squad_wipe_ends_run_early() {
    let mut harness = TestHarness::new(&["Solo"]);
    harness.state.players[0].life = 1;
    harness.expect_reply(GmReply {
        life_delta: -3,
        ..continuing_reply("A support beam gives way.")
    });

    harness.open_question(&["brace"]);
    harness.submit_all("brace");
    let report = harness.resolve();

    assert!(report.game_over);
    assert!(harness.squad_down());
    assert!(!harness.state.finale[0].survived);
    assert!(harness.state.turn < harness.state.max_turns);
}

#[test]
fn test_resolution_transitions_exactly_when_all_have_chosen() {
    let mut harness = TestHarness::new(&["Ash", "Bo"]);
    harness.expect_reply(continuing_reply("The tunnel narrows."));
    harness.open_question(&["left", "right"]);

    harness.submit(0, "left").unwrap();
    assert!(!harness.state.ready_for_resolution());
    harness.submit(1, "right").unwrap();
    assert!(harness.state.ready_for_resolution());

    // A second pick from the same player never slips in.
    assert!(harness.submit(0, "right").is_err());

    harness.resolve();
    assert_eq!(harness.state.turn, 2);
    assert_awaiting_choices(&harness);
    assert!(harness.state.pending_choices.is_empty());
}

#[test]
fn test_down_players_sit_out_but_still_take_squad_damage() {
    let mut harness = TestHarness::new(&["Ash", "Bo"]);
    harness.state.players[1].life = 0;
    harness.expect_reply(GmReply {
        life_delta: -1,
        ..continuing_reply("Gas hisses from a cracked pipe.")
    });

    harness.open_question(&["mask-up"]);
    assert_eq!(harness.state.choice_order, vec![0]);
    assert!(harness.submit(1, "mask-up").is_err());
    harness.submit(0, "mask-up").unwrap();
    harness.resolve();

    assert_eq!(harness.player_life(0), 3);
    // Down players stay at zero, never negative.
    assert_eq!(harness.player_life(1), 0);
}

#[test]
fn test_shield_soaks_squad_damage() {
    let mut harness = TestHarness::new(&["Ash"]);
    harness.state.players[0].shield = 2;
    harness.expect_reply(GmReply {
        life_delta: -3,
        ..continuing_reply("Shrapnel everywhere.")
    });

    harness.open_question(&["duck"]);
    harness.submit_all("duck");
    harness.resolve();

    assert_eq!(harness.state.players[0].shield, 0);
    assert_eq!(harness.player_life(0), 3);
}

#[test]
fn test_score_boost_multiplies_next_resolution_only() {
    let mut harness = TestHarness::new(&["Ash"]);
    survivor_core::effects::set_score_boost(&mut harness.state, 2.0, 1);
    harness.expect_reply(GmReply {
        score_delta: 15,
        ..continuing_reply("A cache of supplies.")
    });
    harness.expect_reply(GmReply {
        score_delta: 15,
        ..continuing_reply("Another cache, smaller.")
    });

    harness.open_question(&["loot"]);
    harness.submit_all("loot");
    harness.resolve();
    assert_eq!(harness.score(), 30);

    harness.submit_all("push-on");
    harness.resolve();
    assert_eq!(harness.score(), 45);
}

#[test]
fn test_per_player_outcomes_and_rewards() {
    let mut harness = TestHarness::new(&["Ash", "Bo"]);
    harness.expect_reply(GmReply {
        player_outcomes: vec![
            PlayerOutcome {
                player_index: Some(0),
                name: None,
                choice_id: None,
                life_delta: -2,
                score_delta: 5,
                item_reward: None,
            },
            PlayerOutcome {
                player_index: Some(1),
                name: None,
                choice_id: None,
                life_delta: 0,
                score_delta: 0,
                item_reward: Some(ItemReward {
                    rarity: Some("rare".into()),
                    count: 1,
                    player_index: None,
                }),
            },
        ],
        ..continuing_reply("They split up at the junction.")
    });

    harness.open_question(&["split"]);
    harness.submit_all("split");
    harness.resolve();

    assert_eq!(harness.player_life(0), 2);
    assert_eq!(harness.score(), 5);
    assert_inventory_count(&harness, 0, 0);
    assert_inventory_count(&harness, 1, 1);
    assert_eq!(harness.state.players[1].inventory[0].rarity, Rarity::Rare);
}

#[test]
fn test_used_item_effects_flow_through_resolver() {
    let mut harness = TestHarness::new(&["Ash"]);
    harness.state.players[0].life = 1;
    let template = survivor_core::catalog::find_template_by_name("Advanced medkit").unwrap();
    assert!(template.effects.contains(&Effect::Life { delta: 2 }));
    let item = survivor_core::ItemInstance::from_template(template);
    let instance_id = item.instance_id;
    harness.state.players[0].inventory.push(item);

    let player = harness.state.players[0].id;
    harness
        .state
        .use_item(player, instance_id, &mut harness.rng)
        .unwrap();

    assert_eq!(harness.player_life(0), 3);
    assert_eq!(harness.score(), 62);
    assert_inventory_count(&harness, 0, 0);
}

#[test]
fn test_luck_charges_upgrade_rewarded_loot() {
    let mut harness = TestHarness::new(&["Ash"]);
    harness.state.luck_charges = 1;
    harness.expect_reply(GmReply {
        item_rewards: vec![ItemReward {
            rarity: Some("common".into()),
            count: 1,
            player_index: Some(0),
        }],
        ..continuing_reply("Something glints under the rubble.")
    });

    harness.open_question(&["dig"]);
    harness.submit_all("dig");
    harness.resolve();

    assert_inventory_count(&harness, 0, 1);
    assert_eq!(harness.state.players[0].inventory[0].rarity, Rarity::Rare);
    assert_eq!(harness.state.luck_charges, 0);
}

#[test]
fn test_peek_token_marks_one_option_next_turn() {
    let mut harness = TestHarness::new(&["Ash"]);
    harness.expect_reply(continuing_reply("The fog thins for a moment."));

    harness.open_question(&["wait"]);
    // The token is spent when the next question opens after resolution.
    harness.state.peek_tokens = 1;
    harness.submit_all("wait");
    harness.resolve();

    let hinted = harness
        .state
        .current_options
        .iter()
        .filter(|o| o.hinted)
        .count();
    assert_eq!(hinted, 1);
    assert_eq!(harness.state.peek_tokens, 0);
}

#[test]
fn test_script_exhaustion_closes_the_run() {
    let mut harness = TestHarness::new(&["Ash"]);
    harness.open_question(&["on"]);
    harness.submit_all("on");
    let report = harness.resolve();
    assert!(report.game_over);
    assert_game_over(&harness);
}
