//! Prelude module - commonly used types for convenient import.
//!
//! Use `use frontdesk_runtime::prelude::*;` to import all essential types.

pub use crate::actions::{Action, ActionContext, ActionOutcome, ActionRegistry};
pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::error::{RuntimeError, RuntimeResult};
pub use crate::events::{ConversationState, Event, SlotMap, SlotValue};
pub use crate::runtime::DialogueRuntime;
pub use crate::turn::{BotMessage, Entity, Intent, TurnInput, TurnOutput};
