//! Single-table race service.
//!
//! A [`Controller`] task owns the [`derby_execution::RaceTable`] and serializes player actions,
//! racing ticks and commentary arrivals. Clients talk to it over a WebSocket (see [`server`]) and
//! receive every committed change as a broadcast [`OutboundEvent`].

pub mod commentary;
pub mod config;
pub mod controller;
pub mod messages;
pub mod server;
pub mod ticker;

pub use commentary::{
    build_prompt, generate_commentary, Commentator, CommentaryClient, CommentaryError,
    CommentaryRequest, GeminiCommentator, LocalCommentator,
};
pub use config::{CommentaryConfig, RaceTableConfig};
pub use controller::{Command, Controller, ControllerError, ControllerHandle, ControllerSettings};
pub use messages::{Action, InboundMessage, OutboundEvent, OutboundResponse, TableSnapshot};
pub use server::{router, AppState};
pub use ticker::{Tick, Ticker};
