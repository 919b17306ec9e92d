#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Frontdesk Runtime - the dialogue action runtime.
//!
//! The central coordinator of the system: it receives classified turns
//! from the NLU front-end, fills required parameters through multi-turn
//! forms with per-slot validators, invokes the booking backend, answers
//! questions through retrieval with guardrails, and falls back to an LLM
//! when classification confidence is too low.
//!
//! # Turn flow
//!
//! ```text
//! TurnInput ─▶ resolve action (intent, active form)
//!           ─▶ task gate (enabled? inside business hours?)
//!           ─▶ action / form driver ─▶ validators, backend, retrieval, LLM
//!           ─▶ audit (hashed) ─▶ TurnOutput { messages, events }
//! ```
//!
//! Conversation state is carried in and returned as events; the runtime
//! holds no per-conversation state between turns and therefore needs no
//! per-conversation locks. Events are applied atomically, in list order.
//!
//! # Containment
//!
//! Any unexpected failure inside an action becomes an audit record with
//! `status=exception`, a single apology message, and no slot mutation.
//! Nothing is ever re-raised to the front-end.

pub mod actions;
pub mod clock;
pub mod events;
pub mod forms;
pub mod prelude;
pub mod validators;

mod error;
mod runtime;
mod turn;

pub use actions::{Action, ActionContext, ActionOutcome, ActionRegistry, APOLOGY};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{RuntimeError, RuntimeResult};
pub use events::{ConversationState, Event, KNOWN_SLOTS, SlotMap, SlotValue};
pub use runtime::DialogueRuntime;
pub use turn::{BotMessage, Entity, Intent, TurnInput, TurnOutput};
