//! # Quiz Night Library
//!
//! This library provides the game logic for two party quiz games: a
//! millionaire-style ladder of multiple choice questions with purchasable
//! lifelines, and a board game of themed point cells where some cells hide
//! a question from another theme. Rendering, audio and storage are left to
//! the embedder, which receives updates through a [`session::Tunnel`] and
//! runs the timers the games ask for.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::struct_excessive_bools)]
use serde::{Deserialize, Serialize};

pub mod constants;

pub mod bank;
pub mod board;
pub mod call;
pub mod ledger;
pub mod millionaire;
pub mod preferences;
pub mod question;
pub mod selection;
pub mod session;

/// Full state snapshots sent when the screen redraws from scratch
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum SyncMessage {
    /// Millionaire game snapshot
    Millionaire(millionaire::SyncMessage),
    /// Board game snapshot
    Board(board::SyncMessage),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Incremental updates pushed as the games progress
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum UpdateMessage {
    /// Millionaire game update
    Millionaire(millionaire::UpdateMessage),
    /// Board game update
    Board(board::UpdateMessage),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Timed events the embedder schedules and hands back when they fire
#[derive(Debug, Clone, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Millionaire reveal and advance timers
    Millionaire(millionaire::AlarmMessage),
}
