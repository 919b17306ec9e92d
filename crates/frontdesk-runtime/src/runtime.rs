//! The dialogue runtime - per-turn coordination.
//!
//! Each turn: log the interaction shape, resolve the action from the
//! intent and any active form, gate task actions on their config, run
//! the action (plus any followups it schedules), and contain anything
//! unexpected into an audit record and a single apology. The returned
//! event list is what the NLU front-end applies to conversation state.

use tracing::{debug, info, warn};

use frontdesk_audit::{AuditEvent, AuditStatus};
use frontdesk_config::TaskKind;

use crate::actions::{APOLOGY, ActionContext, ActionRegistry};
use crate::events::{ConversationState, Event};
use crate::forms::{BOOKING_FORM, LOOKUP_FORM, MEETING_FORM};
use crate::turn::{BotMessage, TurnInput, TurnOutput};

/// Slots counted as "important" for the interaction log.
const IMPORTANT_SLOTS: [&str; 7] = [
    "service_type",
    "booking_date",
    "booking_time",
    "customer_name",
    "customer_email",
    "booking_id",
    "meeting_date",
];

/// Hard cap on followup chaining within one turn.
const MAX_ACTIONS_PER_TURN: usize = 4;

/// The dialogue action runtime.
pub struct DialogueRuntime {
    registry: ActionRegistry,
    ctx: ActionContext,
}

impl DialogueRuntime {
    /// Create a runtime with the default action registry.
    #[must_use]
    pub fn new(ctx: ActionContext) -> Self {
        let runtime = Self {
            registry: ActionRegistry::with_defaults(),
            ctx,
        };
        info!(actions = runtime.registry.names().len(), "dialogue runtime ready");
        runtime
    }

    /// Create a runtime with a custom registry.
    #[must_use]
    pub fn with_registry(ctx: ActionContext, registry: ActionRegistry) -> Self {
        Self { registry, ctx }
    }

    /// The shared component context.
    #[must_use]
    pub fn context(&self) -> &ActionContext {
        &self.ctx
    }

    /// Process one user turn.
    pub async fn handle_turn(&self, input: TurnInput) -> TurnOutput {
        let filled = IMPORTANT_SLOTS
            .iter()
            .filter(|s| input.slots.contains_key(**s))
            .count();
        self.ctx
            .audit
            .log_interaction(
                &input.intent.name,
                input.intent.confidence,
                input.entities.len(),
                filled,
            )
            .await;

        let Some(action_name) = self.resolve_action(&input).await else {
            let bot = self.ctx.config.get_bot_config().await;
            if input.intent.name == "greet" {
                return TurnOutput::message(bot.welcome_message.clone());
            }
            return TurnOutput::message(bot.fallback_message.clone());
        };

        // Task-enablement gate. A missing config means enabled.
        if let Some(kind) = task_kind_for(&action_name) {
            let config = self.ctx.config.get_task_config(kind).await;
            if !config.enabled() {
                debug!(task = %kind, "task disabled; suppressing action");
                return TurnOutput::message(format!(
                    "Sorry, {} isn't available right now. Is there anything else I can help with?",
                    task_noun(kind),
                ));
            }
            if let Some(hours) = config.business_hours() {
                let now = self.ctx.clock.time_of_day();
                if !hours.contains(now) {
                    debug!(task = %kind, %now, "outside business hours; suppressing action");
                    return TurnOutput::message(format!(
                        "We're currently closed. Our hours are {hours} - please get in touch then, or leave your question here.",
                    ));
                }
            }
        }

        self.run_with_followups(&action_name, input).await
    }

    /// Run an action and any followups it schedules, threading the event
    /// effects through so later actions observe earlier slot changes.
    async fn run_with_followups(&self, first: &str, input: TurnInput) -> TurnOutput {
        let mut input = input;
        let mut output = TurnOutput::default();
        let mut queue = std::collections::VecDeque::from([first.to_string()]);
        let mut ran = 0_usize;

        while let Some(name) = queue.pop_front() {
            ran = ran.saturating_add(1);
            if ran > MAX_ACTIONS_PER_TURN {
                warn!(action = %name, "followup limit exceeded");
                break;
            }

            let Some(action) = self.registry.get(&name) else {
                warn!(action = %name, "unknown action");
                self.ctx
                    .audit
                    .log_action(
                        AuditEvent::new(name.clone(), input.sender_id.clone(), AuditStatus::Exception)
                            .with_error("unknown action"),
                    )
                    .await;
                output.messages.push(BotMessage::text(APOLOGY));
                break;
            };

            match action.run(&self.ctx, &input).await {
                Ok(outcome) => {
                    for event in &outcome.events {
                        if let Event::FollowupAction { name } = event {
                            queue.push_back(name.clone());
                        }
                    }

                    // Followups are consumed here, not forwarded.
                    let events: Vec<Event> = outcome
                        .events
                        .into_iter()
                        .filter(|e| !matches!(e, Event::FollowupAction { .. }))
                        .collect();

                    // Later actions in the chain see the updated state.
                    let mut state = ConversationState {
                        slots: input.slots.clone(),
                        active_form: input.active_form.clone(),
                    };
                    state.apply(&events);
                    input.slots = state.slots;
                    input.active_form = state.active_form;

                    output.messages.extend(outcome.messages);
                    output.events.extend(events);
                },
                Err(e) => {
                    // Containment: audit, one apology, no slot mutation
                    // from this action, nothing re-raised.
                    warn!(action = %name, error = %e, "action failed");
                    self.ctx
                        .audit
                        .log_action(
                            AuditEvent::new(
                                name.clone(),
                                input.sender_id.clone(),
                                AuditStatus::Exception,
                            )
                            .with_error(e.to_string()),
                        )
                        .await;
                    output.messages.push(BotMessage::text(APOLOGY));
                    break;
                },
            }
        }

        output
    }

    /// Map the turn to an action name. `None` falls back to the bot's
    /// canned responses.
    async fn resolve_action(&self, input: &TurnInput) -> Option<String> {
        let intent = input.intent.name.as_str();

        // High-priority overrides interrupt an active form.
        match intent {
            "restart" | "reset" => return Some("reset_slots".to_string()),
            "request_human" | "handoff" => return Some("handoff".to_string()),
            "cancel_booking" => return Some("cancel_booking".to_string()),
            _ => {},
        }

        // Low classifier confidence goes to the LLM fallback path.
        let llm_config = self.ctx.config.get_llm_config().await;
        if intent == "nlu_fallback" || input.intent.confidence < llm_config.confidence_threshold {
            return Some("llm_fallback".to_string());
        }

        // An active form swallows everything that isn't an override.
        if let Some(form) = &input.active_form {
            return Some(form.clone());
        }

        match intent {
            "book_service" | "book_appointment" | "request_booking" => {
                Some(BOOKING_FORM.to_string())
            },
            "schedule_meeting" | "book_meeting" => Some(MEETING_FORM.to_string()),
            "reschedule_booking" | "change_booking" => Some("reschedule_booking".to_string()),
            "check_booking_status" | "booking_status" => Some("check_booking_status".to_string()),
            "get_availability" | "check_availability" => Some("get_availability".to_string()),
            "ask_business_hours" | "ask_pricing" | "ask_location" | "ask_policy"
            | "ask_services" | "business_info" | "faq" | "ask_question" => {
                Some("answer_question".to_string())
            },
            _ => None,
        }
    }
}

impl std::fmt::Debug for DialogueRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogueRuntime")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

/// Which task config gates an action.
fn task_kind_for(action: &str) -> Option<TaskKind> {
    match action {
        a if a == BOOKING_FORM => Some(TaskKind::Booking),
        "get_availability" => Some(TaskKind::Booking),
        a if a == MEETING_FORM => Some(TaskKind::Meeting),
        "get_available_meeting_times" => Some(TaskKind::Meeting),
        "cancel_booking" | "reschedule_booking" => Some(TaskKind::Cancel),
        a if a == LOOKUP_FORM => None,
        _ => None,
    }
}

fn task_noun(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Booking => "booking",
        TaskKind::Meeting => "meeting scheduling",
        TaskKind::Cancel => "cancellation",
    }
}
