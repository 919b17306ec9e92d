//! Meeting actions: the meeting form, its terminal schedule call, and
//! the availability lookup used when a requested time conflicts.

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::debug;

use frontdesk_audit::{AuditEvent, AuditStatus};
use frontdesk_backend::ScheduleMeetingRequest;
use frontdesk_config::{MeetingTaskConfig, TaskConfig, TaskKind};
use frontdesk_core::hash_pii;

use crate::actions::{Action, ActionContext, ActionOutcome};
use crate::error::{RuntimeError, RuntimeResult};
use crate::events::{Event, SlotMap, SlotValue};
use crate::forms::{
    MEETING_FORM, REQUESTED_SLOT, candidate_for, form_state, meeting_required_slots,
    next_unfilled, prompt_for_slot,
};
use crate::turn::{BotMessage, TurnInput};
use crate::validators::{
    ValidationFailure, ValidationResult, validate_booking_date, validate_email,
    validate_meeting_duration, validate_meeting_time, validate_name,
};

/// Generic task failure message for meeting operations.
const MEETING_ERROR: &str =
    "Sorry, we couldn't schedule that meeting right now. Please try again later.";

const MAX_LISTED_TIMES: usize = 6;

async fn meeting_config(ctx: &ActionContext) -> MeetingTaskConfig {
    match ctx.config.get_task_config(TaskKind::Meeting).await.as_ref() {
        TaskConfig::Meeting(config) => config.clone(),
        _ => MeetingTaskConfig::default(),
    }
}

fn validate_meeting_type(input: &str, config: &MeetingTaskConfig) -> ValidationResult<String> {
    let needle = input.trim().to_lowercase();
    if !needle.is_empty() {
        for option in &config.meeting_types {
            let lower = option.to_lowercase();
            if needle == lower || lower.contains(&needle) || needle.contains(&lower) {
                return Ok(option.clone());
            }
        }
    }
    Err(ValidationFailure {
        message: format!(
            "We offer these meeting types: {}. Which would you like?",
            config.meeting_types.join(", "),
        ),
    })
}

fn validate_meeting_slot(
    slot: &str,
    candidate: &str,
    config: &MeetingTaskConfig,
    today: NaiveDate,
) -> ValidationResult<SlotValue> {
    match slot {
        "meeting_type" => validate_meeting_type(candidate, config).map(SlotValue::from),
        "meeting_date" => validate_booking_date(
            candidate,
            today,
            config.booking_window_days,
            &config.blocked_dates,
        )
        .map(|d| SlotValue::from(d.format("%Y-%m-%d").to_string())),
        "meeting_time" => validate_meeting_time(candidate)
            .map(|t| SlotValue::from(t.format("%H:%M").to_string())),
        "meeting_duration" => validate_meeting_duration(candidate).map(SlotValue::from),
        "attendee_name" => validate_name(candidate).map(SlotValue::from),
        "attendee_email" => validate_email(candidate).map(SlotValue::from),
        other => Err(ValidationFailure {
            message: format!("I can't collect \"{other}\" here."),
        }),
    }
}

fn slot_text(slots: &SlotMap, name: &str) -> RuntimeResult<String> {
    slots
        .get(name)
        .map(SlotValue::to_text)
        .ok_or_else(|| RuntimeError::MissingSlot {
            slot: name.to_string(),
        })
}

// ---------------------------------------------------------------------------
// The meeting form
// ---------------------------------------------------------------------------

/// Drives the meeting form, same shape as the booking form.
pub struct MeetingFormAction;

#[async_trait]
impl Action for MeetingFormAction {
    fn name(&self) -> &'static str {
        MEETING_FORM
    }

    async fn run(&self, ctx: &ActionContext, input: &TurnInput) -> RuntimeResult<ActionOutcome> {
        let config = meeting_config(ctx).await;
        let required = meeting_required_slots(&config);
        let today = ctx.clock.today();

        let mut slots = input.slots.clone();
        let mut outcome = ActionOutcome::default();

        if input.active_form.as_deref() != Some(MEETING_FORM) {
            outcome.events.push(Event::ActivateForm {
                name: MEETING_FORM.to_string(),
            });
        }

        let requested = input.slot_text(REQUESTED_SLOT).map(ToString::to_string);
        let requested_candidate = requested
            .as_deref()
            .and_then(|slot| candidate_for(input, slot, true));
        debug!(
            state = ?form_state(input, &required, requested_candidate.as_deref()),
            "meeting form turn"
        );

        for slot in &required {
            if slots.contains_key(*slot) {
                continue;
            }
            let is_requested = requested.as_deref() == Some(*slot);
            let Some(candidate) = candidate_for(input, slot, is_requested) else {
                continue;
            };

            match validate_meeting_slot(slot, &candidate, &config, today) {
                Ok(value) => {
                    debug!(slot, "meeting slot filled");
                    outcome.events.push(Event::SetSlot {
                        name: (*slot).to_string(),
                        value: Some(value.clone()),
                    });
                    slots.insert((*slot).to_string(), value);
                },
                Err(failure) => {
                    outcome.messages.push(BotMessage::text(failure.message));
                    outcome.events.push(Event::set_slot(REQUESTED_SLOT, *slot));
                    return Ok(outcome);
                },
            }
        }

        if let Some(next) = next_unfilled(&slots, &required) {
            outcome.messages.push(BotMessage::text(prompt_for_slot(
                next,
                &[],
                &config.meeting_types,
            )));
            outcome.events.push(Event::set_slot(REQUESTED_SLOT, next));
            return Ok(outcome);
        }

        let terminal = complete_meeting(ctx, input, &slots).await?;
        let conflict = terminal
            .events
            .iter()
            .any(|e| matches!(e, Event::FollowupAction { .. }));

        outcome.messages.extend(terminal.messages);
        outcome.events.extend(terminal.events);
        if !conflict {
            outcome.events.push(Event::clear_slot(REQUESTED_SLOT));
            outcome.events.push(Event::DeactivateForm);
        }
        Ok(outcome)
    }
}

/// The schedule-meeting terminal action. A backend conflict keeps the
/// form active on the time slot and follows up with the availability
/// lookup.
async fn complete_meeting(
    ctx: &ActionContext,
    input: &TurnInput,
    slots: &SlotMap,
) -> RuntimeResult<ActionOutcome> {
    let meeting_type = slot_text(slots, "meeting_type")?;
    let date_iso = slot_text(slots, "meeting_date")?;
    let time = slot_text(slots, "meeting_time")?;
    let duration = slot_text(slots, "meeting_duration")?;
    let attendee_name = slot_text(slots, "attendee_name")?;
    let attendee_email = slot_text(slots, "attendee_email")?;

    let date = NaiveDate::parse_from_str(&date_iso, "%Y-%m-%d")
        .map_err(|e| RuntimeError::Internal(format!("stored meeting_date invalid: {e}")))?;

    let request = ScheduleMeetingRequest {
        meeting_type: meeting_type.clone(),
        date,
        time: time.clone(),
        duration: duration.clone(),
        attendee_name,
        attendee_email: attendee_email.clone(),
    };

    let data_hash = hash_pii(&attendee_email);

    match ctx.backend.schedule_meeting(&request).await {
        Ok(response) if response.success => {
            let meeting_id = response.meeting_id.unwrap_or_default();
            ctx.audit
                .log_action(
                    AuditEvent::new(
                        "schedule_meeting",
                        input.sender_id.clone(),
                        AuditStatus::Success,
                    )
                    .with_meeting_id(&meeting_id)
                    .with_data_hash(data_hash),
                )
                .await;

            Ok(ActionOutcome::message(format!(
                "Your {duration} {meeting_type} meeting is booked for {} at {time}. A calendar invite is on its way to {attendee_email}.",
                date.format("%B %-d, %Y"),
            ))
            .with_event(Event::set_slot("meeting_id", meeting_id.as_str())))
        },
        Ok(response) if response.is_conflict() => {
            ctx.audit
                .log_action(
                    AuditEvent::new(
                        "schedule_meeting",
                        input.sender_id.clone(),
                        AuditStatus::Failed,
                    )
                    .with_data_hash(data_hash)
                    .with_error(response.error.unwrap_or_else(|| "conflict".to_string())),
                )
                .await;

            // Conflict: drop the rejected time, stay on that slot, and
            // offer alternatives via the availability followup.
            Ok(ActionOutcome::message(
                "That time isn't available. Here are some alternatives:",
            )
            .with_event(Event::clear_slot("meeting_time"))
            .with_event(Event::set_slot(REQUESTED_SLOT, "meeting_time"))
            .with_event(Event::FollowupAction {
                name: "get_available_meeting_times".to_string(),
            }))
        },
        Ok(response) => {
            ctx.audit
                .log_action(
                    AuditEvent::new(
                        "schedule_meeting",
                        input.sender_id.clone(),
                        AuditStatus::Failed,
                    )
                    .with_data_hash(data_hash)
                    .with_error(response.error.unwrap_or_else(|| "backend refusal".to_string())),
                )
                .await;
            Ok(ActionOutcome::message(MEETING_ERROR))
        },
        Err(e) => {
            ctx.audit
                .log_action(
                    AuditEvent::new(
                        "schedule_meeting",
                        input.sender_id.clone(),
                        AuditStatus::Failed,
                    )
                    .with_data_hash(data_hash)
                    .with_error(e.to_string()),
                )
                .await;
            Ok(ActionOutcome::message(MEETING_ERROR))
        },
    }
}

// ---------------------------------------------------------------------------
// Meeting availability
// ---------------------------------------------------------------------------

/// Lists open meeting times for the type/date/duration on hand.
pub struct GetAvailableMeetingTimesAction;

#[async_trait]
impl Action for GetAvailableMeetingTimesAction {
    fn name(&self) -> &'static str {
        "get_available_meeting_times"
    }

    async fn run(&self, ctx: &ActionContext, input: &TurnInput) -> RuntimeResult<ActionOutcome> {
        let config = meeting_config(ctx).await;

        let meeting_type = input
            .slot_text("meeting_type")
            .map(ToString::to_string)
            .or_else(|| candidate_for(input, "meeting_type", false))
            .and_then(|raw| validate_meeting_type(&raw, &config).ok());
        let Some(meeting_type) = meeting_type else {
            return Ok(ActionOutcome::message(format!(
                "What type of meeting? Options: {}.",
                config.meeting_types.join(", "),
            )));
        };

        let today = ctx.clock.today();
        let date = input
            .slot_text("meeting_date")
            .map(ToString::to_string)
            .or_else(|| candidate_for(input, "meeting_date", false))
            .and_then(|raw| crate::validators::parse_date(&raw, today))
            .unwrap_or(today);
        let duration = input
            .slot_text("meeting_duration")
            .map_or_else(|| "30 minutes".to_string(), ToString::to_string);

        let date_iso = date.format("%Y-%m-%d").to_string();
        match ctx
            .backend
            .get_available_meeting_times(&meeting_type, &date_iso, &duration)
            .await
        {
            Ok(response) if response.success => {
                if response.available_times.is_empty() {
                    return Ok(ActionOutcome::message(format!(
                        "No open {duration} slots for a {meeting_type} meeting on {}. Want to try another date?",
                        date.format("%B %-d, %Y"),
                    )));
                }

                let listed: Vec<&str> = response
                    .available_times
                    .iter()
                    .take(MAX_LISTED_TIMES)
                    .map(String::as_str)
                    .collect();
                let mut text = format!(
                    "Open {duration} slots on {}: {}",
                    date.format("%B %-d, %Y"),
                    listed.join(", "),
                );
                if response.available_times.len() > MAX_LISTED_TIMES {
                    let more = response
                        .available_times
                        .len()
                        .saturating_sub(MAX_LISTED_TIMES);
                    text.push_str(&format!(" and {more} more"));
                }
                text.push('.');
                Ok(ActionOutcome::message(text))
            },
            Ok(response) => Ok(ActionOutcome::message(
                response.error.unwrap_or_else(|| MEETING_ERROR.to_string()),
            )),
            Err(e) => {
                ctx.audit
                    .log_action(
                        AuditEvent::new(
                            "get_available_meeting_times",
                            input.sender_id.clone(),
                            AuditStatus::Failed,
                        )
                        .with_error(e.to_string()),
                    )
                    .await;
                Ok(ActionOutcome::message(MEETING_ERROR))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meeting_type_matching() {
        let config = MeetingTaskConfig::default();
        assert_eq!(validate_meeting_type("demo", &config).unwrap(), "demo");
        assert_eq!(
            validate_meeting_type("a follow-up please", &config).unwrap(),
            "follow-up"
        );
        assert!(validate_meeting_type("standup", &config).is_err());
    }

    #[test]
    fn test_meeting_slot_dispatch() {
        let config = MeetingTaskConfig::default();
        let today = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();

        let time = validate_meeting_slot("meeting_time", "10am", &config, today).unwrap();
        assert_eq!(time.as_str(), Some("10:00"));

        // 17:00 is outside the meeting window even though it's inside
        // default booking hours.
        assert!(validate_meeting_slot("meeting_time", "5pm", &config, today).is_err());

        let duration =
            validate_meeting_slot("meeting_duration", "half hour", &config, today).unwrap();
        assert_eq!(duration.as_str(), Some("30 minutes"));
    }
}
