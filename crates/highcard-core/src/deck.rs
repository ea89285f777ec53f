//! Client for the external deck-of-cards REST service.
//!
//! The service is an opaque third-party dependency with two calls: create a
//! shuffled deck and draw N cards from it. [`DeckApi`] is the seam the
//! session controller programs against, so tests can substitute a scripted
//! deck; [`HttpDeckClient`] is the real implementation.
//!
//! Responses are validated strictly at this boundary: a `success: false`
//! flag, a card count differing from the requested count, or a rank/suit
//! string outside the fixed tables are all [`DeckError::Protocol`] — the
//! round engine never sees a card it cannot score.

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

use crate::cards::{Card, Rank, Suit};

/// Default base URL of the public deck-of-cards service.
pub const DEFAULT_BASE_URL: &str = "https://www.deckofcardsapi.com";

/// Errors that can occur talking to the deck service.
#[derive(Debug, Error)]
pub enum DeckError {
    /// Transport failure reaching the service.
    #[error("deck service unreachable: {0}")]
    Network(String),

    /// The response could not be parsed into the expected shape.
    #[error("unexpected deck service response: {0}")]
    Protocol(String),
}

/// Opaque identifier for a shuffled deck held by the service.
///
/// Owned by one session for its lifetime; never reused across sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckHandle(String);

impl DeckHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Response to the new-shuffled-deck call.
#[derive(Debug, Deserialize)]
pub struct NewDeckResponse {
    pub success: bool,
    pub deck_id: String,
    pub shuffled: bool,
    pub remaining: u32,
}

/// One card as the service serializes it.
#[derive(Debug, Deserialize)]
pub struct CardPayload {
    pub value: String,
    pub suit: String,
    pub image: String,
}

/// Response to the draw-cards call.
#[derive(Debug, Deserialize)]
pub struct DrawResponse {
    pub success: bool,
    pub cards: Vec<CardPayload>,
    pub remaining: u32,
}

/// Validate a new-deck response and extract the deck handle.
pub fn deck_from_response(resp: NewDeckResponse) -> Result<DeckHandle, DeckError> {
    if !resp.success {
        return Err(DeckError::Protocol(
            "service reported success = false creating a deck".to_string(),
        ));
    }
    if resp.deck_id.is_empty() {
        return Err(DeckError::Protocol("empty deck_id".to_string()));
    }
    Ok(DeckHandle(resp.deck_id))
}

/// Validate a draw response against the requested count and convert the
/// payloads into domain [`Card`]s.
pub fn cards_from_response(resp: DrawResponse, requested: usize) -> Result<Vec<Card>, DeckError> {
    if !resp.success {
        return Err(DeckError::Protocol(
            "service reported success = false drawing cards".to_string(),
        ));
    }
    if resp.cards.len() != requested {
        return Err(DeckError::Protocol(format!(
            "requested {} cards, got {}",
            requested,
            resp.cards.len()
        )));
    }
    resp.cards
        .into_iter()
        .map(|p| {
            let rank = Rank::from_api_value(&p.value)
                .ok_or_else(|| DeckError::Protocol(format!("unknown rank '{}'", p.value)))?;
            let suit = Suit::from_api_value(&p.suit)
                .ok_or_else(|| DeckError::Protocol(format!("unknown suit '{}'", p.suit)))?;
            Ok(Card {
                rank,
                suit,
                image_url: p.image,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// DeckApi
// ---------------------------------------------------------------------------

/// The two operations the session controller needs from a deck service.
pub trait DeckApi: Send + 'static {
    /// Request a freshly shuffled single deck.
    fn new_shuffled_deck(&self)
    -> impl Future<Output = Result<DeckHandle, DeckError>> + Send;

    /// Draw exactly `count` cards from the given deck.
    fn draw(
        &self,
        handle: &DeckHandle,
        count: usize,
    ) -> impl Future<Output = Result<Vec<Card>, DeckError>> + Send;
}

// ---------------------------------------------------------------------------
// HttpDeckClient
// ---------------------------------------------------------------------------

/// [`DeckApi`] implementation over the real REST service.
#[derive(Debug, Clone)]
pub struct HttpDeckClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDeckClient {
    /// Client against the public service at [`DEFAULT_BASE_URL`].
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client against an alternative host (e.g. a local stand-in).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T, DeckError> {
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(map_reqwest_error)?
            .error_for_status()
            .map_err(map_reqwest_error)?;
        resp.json::<T>().await.map_err(map_reqwest_error)
    }
}

impl Default for HttpDeckClient {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckApi for HttpDeckClient {
    async fn new_shuffled_deck(&self) -> Result<DeckHandle, DeckError> {
        let url = format!("{}/api/deck/new/shuffle/?deck_count=1", self.base_url);
        let resp: NewDeckResponse = self.get_json(url).await?;
        tracing::debug!(deck_id = %resp.deck_id, remaining = resp.remaining, "created shuffled deck");
        deck_from_response(resp)
    }

    async fn draw(&self, handle: &DeckHandle, count: usize) -> Result<Vec<Card>, DeckError> {
        let url = format!(
            "{}/api/deck/{}/draw/?count={}",
            self.base_url,
            handle.as_str(),
            count
        );
        let resp: DrawResponse = self.get_json(url).await?;
        tracing::debug!(remaining = resp.remaining, "drew {} cards", resp.cards.len());
        cards_from_response(resp, count)
    }
}

/// Decode failures are shape mismatches; everything else is transport.
fn map_reqwest_error(e: reqwest::Error) -> DeckError {
    if e.is_decode() {
        DeckError::Protocol(e.to_string())
    } else {
        DeckError::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_new_deck_payload() {
        let json = r#"{
            "success": true,
            "deck_id": "3p40paa87x90",
            "shuffled": true,
            "remaining": 52
        }"#;
        let resp: NewDeckResponse = serde_json::from_str(json).unwrap();
        let handle = deck_from_response(resp).unwrap();
        assert_eq!(handle.as_str(), "3p40paa87x90");
    }

    #[test]
    fn unsuccessful_new_deck_is_protocol_error() {
        let resp = NewDeckResponse {
            success: false,
            deck_id: "abc".to_string(),
            shuffled: true,
            remaining: 52,
        };
        assert!(matches!(
            deck_from_response(resp),
            Err(DeckError::Protocol(_))
        ));
    }

    #[test]
    fn decodes_draw_payload() {
        let json = r#"{
            "success": true,
            "cards": [
                {
                    "value": "KING",
                    "suit": "HEARTS",
                    "image": "https://deckofcardsapi.com/static/img/KH.png",
                    "code": "KH"
                },
                {
                    "value": "8",
                    "suit": "CLUBS",
                    "image": "https://deckofcardsapi.com/static/img/8C.png",
                    "code": "8C"
                }
            ],
            "deck_id": "3p40paa87x90",
            "remaining": 50
        }"#;
        let resp: DrawResponse = serde_json::from_str(json).unwrap();
        let cards = cards_from_response(resp, 2).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].rank, Rank::King);
        assert_eq!(cards[0].suit, Suit::Hearts);
        assert_eq!(cards[1].rank, Rank::Eight);
        assert!(cards[1].image_url.ends_with("8C.png"));
    }

    #[test]
    fn short_draw_is_protocol_error() {
        let resp = DrawResponse {
            success: true,
            cards: vec![CardPayload {
                value: "2".to_string(),
                suit: "SPADES".to_string(),
                image: String::new(),
            }],
            remaining: 0,
        };
        let err = cards_from_response(resp, 2).unwrap_err();
        assert!(matches!(err, DeckError::Protocol(_)));
        assert!(err.to_string().contains("requested 2"));
    }

    #[test]
    fn unknown_rank_is_protocol_error() {
        let resp = DrawResponse {
            success: true,
            cards: vec![
                CardPayload {
                    value: "JOKER".to_string(),
                    suit: "SPADES".to_string(),
                    image: String::new(),
                },
                CardPayload {
                    value: "2".to_string(),
                    suit: "SPADES".to_string(),
                    image: String::new(),
                },
            ],
            remaining: 50,
        };
        assert!(matches!(
            cards_from_response(resp, 2),
            Err(DeckError::Protocol(_))
        ));
    }

    #[test]
    fn unsuccessful_draw_is_protocol_error() {
        let resp = DrawResponse {
            success: false,
            cards: Vec::new(),
            remaining: 0,
        };
        assert!(matches!(
            cards_from_response(resp, 0),
            Err(DeckError::Protocol(_))
        ));
    }
}
