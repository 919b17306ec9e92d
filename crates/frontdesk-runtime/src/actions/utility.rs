//! Utility actions: human handoff and the conversation reset.

use async_trait::async_trait;
use serde_json::json;

use frontdesk_audit::{AuditEvent, AuditStatus};

use crate::actions::{Action, ActionContext, ActionOutcome};
use crate::error::RuntimeResult;
use crate::events::Event;
use crate::turn::{BotMessage, TurnInput};

/// Channels that can carry structured side-channel payloads.
const SIDE_CHANNEL_CAPABLE: [&str; 3] = ["socketio", "webchat", "custom"];

/// Hands the conversation to a human: a side-channel event where the
/// transport supports one, and always a human-readable message with
/// contact options.
pub struct HandoffAction;

#[async_trait]
impl Action for HandoffAction {
    fn name(&self) -> &'static str {
        "handoff"
    }

    async fn run(&self, ctx: &ActionContext, input: &TurnInput) -> RuntimeResult<ActionOutcome> {
        ctx.audit
            .log_action(AuditEvent::new(
                "handoff",
                input.sender_id.clone(),
                AuditStatus::Logged,
            ))
            .await;

        let bot = ctx.config.get_bot_config().await;
        let mut outcome = ActionOutcome::default();

        if SIDE_CHANNEL_CAPABLE.contains(&input.channel.as_str()) {
            outcome.messages.push(BotMessage::Custom(json!({
                "event": "handoff_request",
                "conversation_id": input.sender_id.as_str(),
                "context": input.text.clone(),
            })));
        }

        outcome.messages.push(BotMessage::text(format!(
            "{} You can also reach {} directly by phone or email during business hours.",
            bot.handoff_message, bot.business_name,
        )));
        Ok(outcome)
    }
}

/// Clears every known slot and deactivates any form.
pub struct ResetAction;

#[async_trait]
impl Action for ResetAction {
    fn name(&self) -> &'static str {
        "reset_slots"
    }

    async fn run(&self, ctx: &ActionContext, input: &TurnInput) -> RuntimeResult<ActionOutcome> {
        ctx.audit
            .log_action(AuditEvent::new(
                "reset_slots",
                input.sender_id.clone(),
                AuditStatus::Logged,
            ))
            .await;

        Ok(
            ActionOutcome::message("Okay, let's start over. How can I help?")
                .with_event(Event::ResetAllSlots)
                .with_event(Event::DeactivateForm),
        )
    }
}
