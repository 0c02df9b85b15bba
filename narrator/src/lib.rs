//! Minimal HTTP client for the Survivor narrative and voice services.
//!
//! This crate provides a focused client for the two external endpoints the
//! game depends on:
//! - The game-master service, which resolves a turn's choices into narrative
//!   text, score/life deltas, item rewards, and the next question.
//! - The voice-synthesis service, which turns narrative text into audio.
//!
//! Replies from the game-master are generative output and may arrive wrapped
//! in code-fence markup; [`extract_json_object`] recovers the first
//! well-formed JSON object before parsing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable holding the game-master endpoint URL.
pub const GM_URL_VAR: &str = "SURVIVOR_GM_URL";

/// Environment variable holding the voice-synthesis endpoint URL.
pub const TTS_URL_VAR: &str = "SURVIVOR_TTS_URL";

/// Errors that can occur when talking to the external services.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Endpoint not configured")]
    NoEndpoint,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

/// Client for the narrative and voice services.
#[derive(Clone)]
pub struct Narrator {
    client: reqwest::Client,
    gm_url: String,
    tts_url: Option<String>,
}

impl Narrator {
    /// Create a new client for the given game-master endpoint.
    pub fn new(gm_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .connect_timeout(std::time::Duration::from_secs(15))
                .build()
                .expect("Failed to build HTTP client"),
            gm_url: gm_url.into(),
            tts_url: None,
        }
    }

    /// Create a client from `SURVIVOR_GM_URL` (and, if set, `SURVIVOR_TTS_URL`).
    pub fn from_env() -> Result<Self, Error> {
        let gm_url = std::env::var(GM_URL_VAR).map_err(|_| Error::NoEndpoint)?;
        let mut narrator = Self::new(gm_url);
        if let Ok(tts_url) = std::env::var(TTS_URL_VAR) {
            narrator.tts_url = Some(tts_url);
        }
        Ok(narrator)
    }

    /// Set the voice-synthesis endpoint.
    pub fn with_tts_url(mut self, url: impl Into<String>) -> Self {
        self.tts_url = Some(url.into());
        self
    }

    /// Resolve a turn: send the current state and choices, get back the
    /// narrative outcome and the next question.
    pub async fn resolve(&self, request: &GmRequest) -> Result<GmReply, Error> {
        let response = self
            .client
            .post(&self.gm_url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        parse_reply(&body)
    }

    /// Synthesize narrative text into audio. Purely advisory; callers should
    /// treat failures as non-fatal.
    pub async fn synthesize(&self, request: &VoiceRequest) -> Result<VoiceReply, Error> {
        let url = self.tts_url.as_ref().ok_or(Error::NoEndpoint)?;

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        response
            .json::<VoiceReply>()
            .await
            .map_err(|e| Error::Parse(e.to_string()))
    }
}

/// Parse a game-master reply body, tolerating code-fence wrapping.
pub fn parse_reply(body: &str) -> Result<GmReply, Error> {
    let json = extract_json_object(body)
        .ok_or_else(|| Error::Parse("no JSON object found in reply".to_string()))?;
    serde_json::from_str(json).map_err(|e| Error::Parse(e.to_string()))
}

/// Recover the first well-formed JSON object span from generative output.
///
/// Scans from the first `{` and tracks brace depth, honoring string literals
/// and escapes, so replies wrapped in ```` ```json ```` fences or surrounded
/// by prose still parse.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

// ============================================================================
// Game-master wire types
// ============================================================================

/// Request sent to the game-master service for one turn resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmRequest {
    pub players: Vec<GmPlayer>,
    pub turn: u32,
    pub max_turns: u32,
    /// Aggregate squad life.
    pub lives: i32,
    pub max_lives: i32,
    pub choices: Vec<GmChoice>,
    pub history: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    pub finale_required: bool,
}

/// A player as the game-master sees them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmPlayer {
    pub name: String,
    pub life: i32,
    pub max_life: i32,
    /// Item names only; the service narrates "an object", never specifics.
    pub inventory: Vec<String>,
}

/// One submitted choice, including any cosmetic dice roll.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmChoice {
    pub player: String,
    pub option_id: String,
    pub text: String,
    pub requires_roll: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll: Option<u32>,
    #[serde(rename = "rollDC", skip_serializing_if = "Option::is_none")]
    pub roll_dc: Option<u32>,
}

/// Structured reply from the game-master.
///
/// Every field defaults: the service is generative and unknown or missing
/// fields must degrade gracefully rather than abort the turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GmReply {
    pub narrative: String,
    pub is_game_over: bool,
    pub score_delta: i64,
    pub life_delta: i32,
    pub item_rewards: Vec<ItemReward>,
    pub player_outcomes: Vec<PlayerOutcome>,
    pub player_finale: Vec<FinaleEntry>,
    pub question: Option<String>,
    pub options: Vec<GmOption>,
}

/// An item reward granted by the turn's resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemReward {
    /// Rarity name; unknown values fall back to a weighted roll downstream.
    pub rarity: Option<String>,
    pub count: u32,
    /// Explicit recipient, when the service names one.
    pub player_index: Option<usize>,
}

/// Per-player outcome deltas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerOutcome {
    pub player_index: Option<usize>,
    pub name: Option<String>,
    /// Correlates back to the option id of the player's submitted choice.
    pub choice_id: Option<String>,
    pub life_delta: i32,
    pub score_delta: i64,
    pub item_reward: Option<ItemReward>,
}

/// A victory/defeat line for one player at game over.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FinaleEntry {
    pub player_index: Option<usize>,
    pub name: Option<String>,
    pub survived: Option<bool>,
    pub text: String,
}

/// One selectable option for the next question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GmOption {
    pub id: String,
    pub text: String,
    pub requires_roll: bool,
    #[serde(rename = "rollDC")]
    pub roll_dc: Option<u32>,
    /// Stat tag for flavor ("grit", "wits"); cosmetic at this layer.
    pub roll_stat: Option<String>,
}

// ============================================================================
// Voice wire types
// ============================================================================

/// Tone-influencing context carried with every synthesis request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VoiceContext {
    pub tts_voice: String,
    pub tts_rate: f32,
    pub tts_pitch: f32,
}

impl Default for VoiceContext {
    fn default() -> Self {
        Self {
            tts_voice: "en-US-Neural2-C".to_string(),
            tts_rate: 0.97,
            tts_pitch: 0.0,
        }
    }
}

/// Request to the voice-synthesis service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceRequest {
    pub text: String,
    pub context: VoiceContext,
}

/// Synthesized audio.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceReply {
    /// Base64-encoded audio payload.
    pub audio: String,
    pub mime_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plain_object() {
        let body = r#"{"narrative": "ok"}"#;
        assert_eq!(extract_json_object(body), Some(body));
    }

    #[test]
    fn test_extract_code_fenced_object() {
        let body = "```json\n{\"narrative\": \"ok\", \"scoreDelta\": 5}\n```";
        let json = extract_json_object(body).unwrap();
        assert_eq!(json, "{\"narrative\": \"ok\", \"scoreDelta\": 5}");
    }

    #[test]
    fn test_extract_nested_and_strings() {
        let body = "noise {\"a\": {\"b\": \"close } brace\"}, \"c\": 1} trailing";
        let json = extract_json_object(body).unwrap();
        assert_eq!(json, "{\"a\": {\"b\": \"close } brace\"}, \"c\": 1}");
    }

    #[test]
    fn test_extract_unterminated_object() {
        assert!(extract_json_object("{\"a\": 1").is_none());
        assert!(extract_json_object("no braces here").is_none());
    }

    #[test]
    fn test_reply_defaults_missing_fields() {
        let reply = parse_reply(r#"{"narrative": "dust settles"}"#).unwrap();
        assert_eq!(reply.narrative, "dust settles");
        assert!(!reply.is_game_over);
        assert_eq!(reply.score_delta, 0);
        assert_eq!(reply.life_delta, 0);
        assert!(reply.options.is_empty());
        assert!(reply.question.is_none());
    }

    #[test]
    fn test_reply_tolerates_unknown_fields() {
        let reply = parse_reply(
            r#"{"narrative": "x", "scoreDelta": 3, "somethingNew": [1, 2]}"#,
        )
        .unwrap();
        assert_eq!(reply.score_delta, 3);
    }

    #[test]
    fn test_reply_full_shape() {
        let body = r#"```json
        {
          "narrative": "The vault opens.",
          "isGameOver": false,
          "scoreDelta": 12,
          "lifeDelta": -1,
          "itemRewards": [{"rarity": "rare", "count": 1}],
          "playerOutcomes": [{"playerIndex": 0, "lifeDelta": -1, "scoreDelta": 4}],
          "question": "Which corridor?",
          "options": [
            {"id": "A", "text": "Left, into the dark", "requiresRoll": true, "rollDC": 14}
          ]
        }
        ```"#;
        let reply = parse_reply(body).unwrap();
        assert_eq!(reply.score_delta, 12);
        assert_eq!(reply.item_rewards[0].rarity.as_deref(), Some("rare"));
        assert_eq!(reply.options.len(), 1);
        assert!(reply.options[0].requires_roll);
        assert_eq!(reply.options[0].roll_dc, Some(14));
    }

    #[test]
    fn test_unparseable_reply_is_fatal() {
        assert!(matches!(parse_reply("static noise"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_narrator_from_env_missing() {
        std::env::remove_var(GM_URL_VAR);
        assert!(matches!(Narrator::from_env(), Err(Error::NoEndpoint)));
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let request = GmRequest {
            players: vec![],
            turn: 2,
            max_turns: 5,
            lives: 7,
            max_lives: 8,
            choices: vec![],
            history: String::new(),
            scenario: None,
            finale_required: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["maxTurns"], 5);
        assert_eq!(json["finaleRequired"], false);
        assert!(json.get("scenario").is_none());
    }
}
