pub mod cards;
pub mod deck;
pub mod engine;
pub mod session;
