//! Static item catalog.
//!
//! Templates the loot pools deal from, organized by rarity tier. Common and
//! rare tiers are built from name families with index-scaled score bonuses;
//! epic and above are individually authored.

use crate::effects::{Effect, LootTarget};
use crate::loot::Rarity;

/// A catalog entry. Never handed to players directly; pools clone templates
/// into instances on draw.
#[derive(Debug, Clone)]
pub struct ItemTemplate {
    /// Stable slug derived from the name, used by serialized pool queues.
    pub id: String,
    pub name: String,
    pub rarity: Rarity,
    pub effects: Vec<Effect>,
    pub description: String,
}

impl ItemTemplate {
    fn new(
        name: &str,
        rarity: Rarity,
        effects: Vec<Effect>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: slug(name),
            name: name.to_string(),
            rarity,
            effects,
            description: description.into(),
        }
    }
}

/// Lowercase the name, collapse non-alphanumerics to dashes.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Look up a template by its slug id.
pub fn template(id: &str) -> Option<&'static ItemTemplate> {
    ITEM_LIBRARY.iter().find(|t| t.id == id)
}

/// Look up a template by display name, case-insensitive.
pub fn find_template_by_name(name: &str) -> Option<&'static ItemTemplate> {
    let name_lower = name.to_lowercase();
    ITEM_LIBRARY
        .iter()
        .find(|t| t.name.to_lowercase() == name_lower)
}

/// All templates of one rarity tier.
pub fn templates_by_rarity(rarity: Rarity) -> Vec<&'static ItemTemplate> {
    ITEM_LIBRARY.iter().filter(|t| t.rarity == rarity).collect()
}

const COMMON_LIFE_NAMES: [&str; 10] = [
    "Sterile bandages",
    "Pocket water filter",
    "Dry ration",
    "Iodine tablets",
    "Dented canteen",
    "Sewing kit",
    "Protein bar",
    "Medicine pouch",
    "Hemostatic patch",
    "Thermal bag",
];

const COMMON_SHIELD_NAMES: [&str; 10] = [
    "Insulating tape",
    "Insulated gloves",
    "Dust mask",
    "Thermal blanket",
    "Flame-retardant spray",
    "Ballistic goggles",
    "Metal lid",
    "Sandbag",
    "Radiation plug",
    "Safety clip",
];

const COMMON_PEEK_NAMES: [&str; 10] = [
    "Folding flashlight",
    "Scorched map",
    "Radiation detector",
    "Rusty compass",
    "Survival guide",
    "Portable radio",
    "Pocket mirror",
    "Thermal probe",
    "Signal whistle",
    "Pocket stethoscope",
];

const COMMON_TURN_NAMES: [&str; 10] = [
    "Short rope",
    "Nylon cord",
    "Folding hook",
    "Escape map",
    "Quick bridge",
    "Compact tent",
    "Light toolbox",
    "Steel cable",
    "Bivouac kit",
    "Spare compass",
];

const COMMON_LUCK_NAMES: [&str; 10] = [
    "Industrial magnet",
    "Matchbox",
    "Lighter",
    "Micro stove",
    "Flint stone",
    "Lubricant spray",
    "Copper wire",
    "Adjustable wrench",
    "Switchblade",
    "Spare blade",
];

const COMMON_DRAW_NAMES: [&str; 10] = [
    "Metal clips",
    "Access card",
    "Magnetic patch",
    "Solar battery",
    "Button battery",
    "Filter cloth",
    "Filtering canteen",
    "Repair kit",
    "Utility belt",
    "Caffeine capsules",
];

const RARE_LIFE_NAMES: [&str; 8] = [
    "Advanced medkit",
    "Coagulant serum",
    "Surgical kit",
    "Military ration pack",
    "Blood bag",
    "Regenerating serum",
    "Recharge dose",
    "Sterile chamber",
];

const RARE_SHIELD_NAMES: [&str; 7] = [
    "Insulation suit",
    "Emergency valve",
    "Shockproof fabric",
    "Filter gas",
    "Folding shield",
    "Mobile bulkhead",
    "Ceramic shell",
];

const RARE_PEEK_NAMES: [&str; 5] = [
    "Portable radar",
    "Night-vision visor",
    "Encrypted transmitter",
    "Biometric scanner",
    "Diagnostic card",
];

const RARE_TURN_NAMES: [&str; 3] = ["Long-life battery", "Evacuation plan", "Rest modules"];

fn owner_draw(count: u32, rarity: Rarity) -> Effect {
    Effect::Loot {
        count,
        rarity: Some(rarity),
        target: LootTarget::Owner,
    }
}

fn build_library() -> Vec<ItemTemplate> {
    let mut items = Vec::new();

    for (index, name) in COMMON_LIFE_NAMES.iter().enumerate() {
        let points = 2 + index as i64;
        items.push(ItemTemplate::new(
            name,
            Rarity::Common,
            vec![Effect::Life { delta: 1 }, Effect::Score { delta: points }],
            format!("Restores 1 life and adds {points} points."),
        ));
    }

    for (index, name) in COMMON_SHIELD_NAMES.iter().enumerate() {
        let points = 12 + index as i64;
        items.push(ItemTemplate::new(
            name,
            Rarity::Common,
            vec![Effect::Score { delta: points }, Effect::Shield { points: 1 }],
            format!("Adds {points} points and absorbs 1 life loss."),
        ));
    }

    for (index, name) in COMMON_PEEK_NAMES.iter().enumerate() {
        let points = 22 + index as i64;
        items.push(ItemTemplate::new(
            name,
            Rarity::Common,
            vec![Effect::Score { delta: points }, Effect::PeekHint { count: 1 }],
            format!("Adds {points} points and reveals a hinted option next turn."),
        ));
    }

    for (index, name) in COMMON_TURN_NAMES.iter().enumerate() {
        let points = 32 + index as i64;
        items.push(ItemTemplate::new(
            name,
            Rarity::Common,
            vec![
                Effect::Score { delta: points },
                Effect::TurnExtension { count: 1 },
            ],
            format!("Adds {points} points and extends the mission by 1 turn."),
        ));
    }

    for (index, name) in COMMON_LUCK_NAMES.iter().enumerate() {
        let points = 42 + index as i64;
        items.push(ItemTemplate::new(
            name,
            Rarity::Common,
            vec![
                Effect::Score { delta: points },
                Effect::LuckCharge { count: 1 },
            ],
            format!("Adds {points} points and raises item luck by 1."),
        ));
    }

    for (index, name) in COMMON_DRAW_NAMES.iter().enumerate() {
        let points = 52 + index as i64;
        items.push(ItemTemplate::new(
            name,
            Rarity::Common,
            vec![
                Effect::Score { delta: points },
                owner_draw(1, Rarity::Common),
            ],
            format!("Adds {points} points and finds 1 common item."),
        ));
    }

    for (index, name) in RARE_LIFE_NAMES.iter().enumerate() {
        let points = 62 + index as i64;
        items.push(ItemTemplate::new(
            name,
            Rarity::Rare,
            vec![Effect::Life { delta: 2 }, Effect::Score { delta: points }],
            format!("Restores 2 life and adds {points} points."),
        ));
    }

    for (index, name) in RARE_SHIELD_NAMES.iter().enumerate() {
        let points = 70 + index as i64;
        items.push(ItemTemplate::new(
            name,
            Rarity::Rare,
            vec![Effect::Score { delta: points }, Effect::Shield { points: 2 }],
            format!("Adds {points} points and absorbs 2 life losses."),
        ));
    }

    for (index, name) in RARE_PEEK_NAMES.iter().enumerate() {
        let points = 77 + index as i64;
        items.push(ItemTemplate::new(
            name,
            Rarity::Rare,
            vec![Effect::Score { delta: points }, Effect::PeekHint { count: 2 }],
            format!("Adds {points} points and reveals hinted options for 2 turns."),
        ));
    }

    for (index, name) in RARE_TURN_NAMES.iter().enumerate() {
        let points = 82 + index as i64;
        items.push(ItemTemplate::new(
            name,
            Rarity::Rare,
            vec![
                Effect::Score { delta: points },
                Effect::TurnExtension { count: 2 },
            ],
            format!("Adds {points} points and extends the mission by 2 turns."),
        ));
    }

    items.push(ItemTemplate::new(
        "Flare gun",
        Rarity::Rare,
        vec![Effect::Score { delta: 85 }, owner_draw(1, Rarity::Rare)],
        "Adds 85 points and finds 1 rare item.",
    ));
    items.push(ItemTemplate::new(
        "Calm module",
        Rarity::Rare,
        vec![
            Effect::Score { delta: 86 },
            Effect::ScoreBoost {
                multiplier: 1.5,
                turns: 1,
            },
        ],
        "Adds 86 points and multiplies next turn's points x1.5.",
    ));

    // Epics
    items.push(ItemTemplate::new(
        "Regenerative module",
        Rarity::Epic,
        vec![Effect::Life { delta: 3 }, Effect::Shield { points: 1 }],
        "Restores 3 life and adds 1 shield.",
    ));
    items.push(ItemTemplate::new(
        "Nanobot injector",
        Rarity::Epic,
        vec![Effect::MaxLife { delta: 1 }, Effect::Life { delta: 1 }],
        "Raises max life by 1 and restores 1 life.",
    ));
    items.push(ItemTemplate::new(
        "Predictive algorithm",
        Rarity::Epic,
        vec![Effect::PeekHint { count: 3 }],
        "Reveals hinted options for 3 turns.",
    ));
    items.push(ItemTemplate::new(
        "Reactive shield",
        Rarity::Epic,
        vec![Effect::Shield { points: 3 }],
        "Absorbs 3 life losses.",
    ));
    items.push(ItemTemplate::new(
        "Recovery drone",
        Rarity::Epic,
        vec![Effect::Score { delta: 18 }, owner_draw(1, Rarity::Epic)],
        "Adds 18 points and finds 1 epic item.",
    ));
    items.push(ItemTemplate::new(
        "Tactical plan",
        Rarity::Epic,
        vec![
            Effect::Score { delta: 19 },
            Effect::ScoreBoost {
                multiplier: 2.0,
                turns: 1,
            },
        ],
        "Adds 19 points and multiplies next turn's points x2.",
    ));
    items.push(ItemTemplate::new(
        "Adrenaline syringe",
        Rarity::Epic,
        vec![
            Effect::Life { delta: 2 },
            Effect::ScoreBoost {
                multiplier: 1.5,
                turns: 1,
            },
        ],
        "Restores 2 life and multiplies next turn's points x1.5.",
    ));
    items.push(ItemTemplate::new(
        "Geolocation module",
        Rarity::Epic,
        vec![
            Effect::TurnExtension { count: 2 },
            Effect::PeekHint { count: 1 },
        ],
        "Adds 2 turns and reveals a hinted option next turn.",
    ));
    items.push(ItemTemplate::new(
        "Storage bay",
        Rarity::Epic,
        vec![Effect::Score { delta: 20 }, owner_draw(2, Rarity::Rare)],
        "Adds 20 points and finds 2 rare items.",
    ));
    items.push(ItemTemplate::new(
        "Energy core",
        Rarity::Epic,
        vec![Effect::Score { delta: 25 }, Effect::Shield { points: 1 }],
        "Adds 25 points and absorbs 1 life loss.",
    ));
    items.push(ItemTemplate::new(
        "Hyperbaric chamber",
        Rarity::Epic,
        vec![Effect::MaxLife { delta: 1 }, Effect::Life { delta: 2 }],
        "Raises max life by 1 and restores 2 life.",
    ));
    items.push(ItemTemplate::new(
        "Calm protocol",
        Rarity::Epic,
        vec![Effect::ScoreBoost {
            multiplier: 2.0,
            turns: 2,
        }],
        "Multiplies the next 2 turns' points x2.",
    ));
    items.push(ItemTemplate::new(
        "Portable bunker",
        Rarity::Epic,
        vec![Effect::Shield { points: 2 }, Effect::PeekHint { count: 2 }],
        "Absorbs 2 losses and reveals hinted options for 2 turns.",
    ));
    items.push(ItemTemplate::new(
        "Support reactor",
        Rarity::Epic,
        vec![
            Effect::Score { delta: 21 },
            Effect::LuckCharge { count: 3 },
        ],
        "Adds 21 points and raises item luck by 3.",
    ));
    items.push(ItemTemplate::new(
        "Reserve crate",
        Rarity::Epic,
        vec![
            Effect::Score { delta: 22 },
            owner_draw(1, Rarity::Rare),
            owner_draw(1, Rarity::Common),
        ],
        "Adds 22 points and finds 1 rare and 1 common item.",
    ));

    // Legendaries
    items.push(ItemTemplate::new(
        "Rescue ark",
        Rarity::Legendary,
        vec![
            Effect::MaxLife { delta: 2 },
            Effect::Life { delta: 2 },
            Effect::Shield { points: 1 },
        ],
        "Raises max life by 2, restores 2 life, and adds 1 shield.",
    ));
    items.push(ItemTemplate::new(
        "Forecast matrix",
        Rarity::Legendary,
        vec![
            Effect::PeekHint { count: 3 },
            Effect::ScoreBoost {
                multiplier: 1.5,
                turns: 2,
            },
        ],
        "Reveals hinted options for 3 turns and multiplies 2 turns' points x1.5.",
    ));
    items.push(ItemTemplate::new(
        "Shield generator",
        Rarity::Legendary,
        vec![Effect::Shield { points: 4 }],
        "Absorbs 4 life losses.",
    ));
    items.push(ItemTemplate::new(
        "Orbital resupply",
        Rarity::Legendary,
        vec![
            Effect::Score { delta: 26 },
            owner_draw(1, Rarity::Legendary),
            owner_draw(1, Rarity::Rare),
        ],
        "Adds 26 points and finds 1 legendary and 1 rare item.",
    ));
    items.push(ItemTemplate::new(
        "Lost archive",
        Rarity::Legendary,
        vec![Effect::Score { delta: 35 }, Effect::PeekHint { count: 1 }],
        "Adds 35 points and reveals a hinted option next turn.",
    ));
    items.push(ItemTemplate::new(
        "Vital catalyst",
        Rarity::Legendary,
        vec![
            Effect::Life { delta: 3 },
            Effect::Shield { points: 2 },
            Effect::Score { delta: 27 },
        ],
        "Restores 3 life, absorbs 2 losses, and adds 27 points.",
    ));

    // Supremes
    items.push(ItemTemplate::new(
        "Phoenix protocol",
        Rarity::Supreme,
        vec![
            Effect::MaxLife { delta: 2 },
            Effect::Life { delta: 3 },
            Effect::Shield { points: 2 },
        ],
        "Raises max life by 2, restores 3 life, and adds 2 shields.",
    ));
    items.push(ItemTemplate::new(
        "Quantum chrysalis",
        Rarity::Supreme,
        vec![
            Effect::ScoreBoost {
                multiplier: 3.0,
                turns: 1,
            },
            Effect::PeekHint { count: 3 },
        ],
        "Multiplies next turn's points x3 and reveals hinted options for 3 turns.",
    ));
    items.push(ItemTemplate::new(
        "Total armory",
        Rarity::Supreme,
        vec![
            owner_draw(1, Rarity::Supreme),
            owner_draw(1, Rarity::Epic),
            Effect::Shield { points: 2 },
        ],
        "Finds 1 supreme and 1 epic item and adds 2 shields.",
    ));
    items.push(ItemTemplate::new(
        "Heart of Eden",
        Rarity::Supreme,
        vec![
            Effect::MaxLife { delta: 3 },
            Effect::Life { delta: 3 },
            Effect::Score { delta: 40 },
        ],
        "Raises max life by 3, restores 3 life, and adds 40 points.",
    ));

    items
}

lazy_static::lazy_static! {
    /// The full static catalog.
    pub static ref ITEM_LIBRARY: Vec<ItemTemplate> = build_library();
}
