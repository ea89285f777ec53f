//! Card types and the fixed rank ordering used to decide rounds.
//!
//! A round of high-card only compares ranks; suits are carried for display.
//! Ranks parse from the deck service's string values (`"2"`–`"10"`,
//! `"JACK"`, `"QUEEN"`, `"KING"`, `"ACE"`), and the derived `Ord` gives the
//! total order `2 < 3 < ... < 10 < JACK < QUEEN < KING < ACE`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Card rank (2–14, where 14 = Ace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    /// Parse the deck service's rank string. Returns `None` for anything
    /// outside the fixed rank table.
    pub fn from_api_value(value: &str) -> Option<Self> {
        Some(match value {
            "2" => Rank::Two,
            "3" => Rank::Three,
            "4" => Rank::Four,
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "10" => Rank::Ten,
            "JACK" => Rank::Jack,
            "QUEEN" => Rank::Queen,
            "KING" => Rank::King,
            "ACE" => Rank::Ace,
            _ => return None,
        })
    }

    /// Returns the rank as a display string.
    pub fn symbol(&self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

/// Card suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    /// Parse the deck service's suit string.
    pub fn from_api_value(value: &str) -> Option<Self> {
        Some(match value {
            "SPADES" => Suit::Spades,
            "HEARTS" => Suit::Hearts,
            "DIAMONDS" => Suit::Diamonds,
            "CLUBS" => Suit::Clubs,
            _ => return None,
        })
    }

    /// Returns the suit as a display symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Suit::Spades => "♠",
            Suit::Hearts => "♥",
            Suit::Diamonds => "♦",
            Suit::Clubs => "♣",
        }
    }
}

/// A drawn card. Immutable once drawn; `image_url` is the opaque reference
/// to the card-face asset hosted by the deck service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
    pub image_url: String,
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.symbol(), self.suit.symbol())
    }
}

/// Which side a round went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    PlayerWin,
    OpponentWin,
    Tie,
}

/// One decided round, appended to the session history and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub player_card: Card,
    pub opponent_card: Card,
    pub outcome: RoundOutcome,
}

impl RoundResult {
    /// Decide a round: higher rank wins, equal ranks tie.
    pub fn decide(player_card: Card, opponent_card: Card) -> Self {
        use std::cmp::Ordering;
        let outcome = match player_card.rank.cmp(&opponent_card.rank) {
            Ordering::Greater => RoundOutcome::PlayerWin,
            Ordering::Less => RoundOutcome::OpponentWin,
            Ordering::Equal => RoundOutcome::Tie,
        };
        Self {
            player_card,
            opponent_card,
            outcome,
        }
    }
}
