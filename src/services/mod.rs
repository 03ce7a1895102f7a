//! Background services

mod token_reaper;

pub use token_reaper::TokenReaper;
