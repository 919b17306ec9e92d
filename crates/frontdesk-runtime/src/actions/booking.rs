//! Booking actions: the booking form, its terminal action, and the
//! cancel/reschedule/status/availability verbs.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use tracing::debug;

use frontdesk_audit::{AuditEvent, AuditStatus};
use frontdesk_backend::{BackendError, CreateBookingRequest, RescheduleRequest};
use frontdesk_config::{BookingTaskConfig, TaskConfig, TaskKind};
use frontdesk_core::hash_pii;

use crate::actions::{Action, ActionContext, ActionOutcome};
use crate::error::{RuntimeError, RuntimeResult};
use crate::events::{Event, SlotMap, SlotValue};
use crate::forms::{
    BOOKING_FORM, LOOKUP_FORM, REQUESTED_SLOT, booking_required_slots, candidate_for, form_state,
    next_unfilled, prompt_for_slot,
};
use crate::turn::{BotMessage, TurnInput};
use crate::validators::{
    ValidationFailure, ValidationResult, validate_booking_date, validate_booking_id,
    validate_booking_time, validate_email, validate_name, validate_phone, validate_service,
};

/// Generic task failure message for booking operations.
const BOOKING_ERROR: &str =
    "Sorry, we couldn't complete that booking request right now. Please try again later.";

/// How many availability entries are spelled out before "and N more".
const MAX_LISTED_TIMES: usize = 6;

async fn booking_config(ctx: &ActionContext) -> BookingTaskConfig {
    match ctx.config.get_task_config(TaskKind::Booking).await.as_ref() {
        TaskConfig::Booking(config) => config.clone(),
        _ => BookingTaskConfig::default(),
    }
}

/// Validate a candidate for one booking slot.
fn validate_booking_slot(
    slot: &str,
    candidate: &str,
    config: &BookingTaskConfig,
    today: NaiveDate,
) -> ValidationResult<SlotValue> {
    match slot {
        "service_type" => validate_service(candidate, config).map(SlotValue::from),
        "booking_date" => validate_booking_date(
            candidate,
            today,
            config.booking_window_days,
            &config.blocked_dates,
        )
        .map(|d| SlotValue::from(d.format("%Y-%m-%d").to_string())),
        "booking_time" => validate_booking_time(candidate, &config.business_hours)
            .map(|t| SlotValue::from(t.format("%H:%M").to_string())),
        "customer_name" => validate_name(candidate).map(SlotValue::from),
        "customer_email" => validate_email(candidate).map(SlotValue::from),
        "customer_phone" => validate_phone(candidate).map(SlotValue::from),
        "party_size" => candidate
            .trim()
            .parse::<i64>()
            .map(SlotValue::Integer)
            .map_err(|_| ValidationFailure {
                message: "How many people should we expect? Just a number is fine.".to_string(),
            }),
        "notes" => Ok(SlotValue::from(candidate.trim())),
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

fn friendly_date(iso: &str) -> String {
    NaiveDate::parse_from_str(iso, "%Y-%m-%d")
        .map_or_else(|_| iso.to_string(), |d| d.format("%B %-d, %Y").to_string())
}

/// Resolve the booking reference for the lookup-first verbs: the slot,
/// then an extracted entity, then the raw text when it parses.
fn booking_reference(input: &TurnInput) -> Option<String> {
    if let Some(id) = input.slot_text("booking_id") {
        return Some(id.to_string());
    }
    if let Some(id) = candidate_for(input, "booking_id", false) {
        return Some(id);
    }
    validate_booking_id(input.text.trim())
        .ok()
        .map(|id| id.as_str().to_string())
}

/// Activate the lookup form to collect a booking reference first.
fn activate_lookup(prompt: &str) -> ActionOutcome {
    ActionOutcome::message(prompt)
        .with_event(Event::ActivateForm {
            name: LOOKUP_FORM.to_string(),
        })
        .with_event(Event::set_slot(REQUESTED_SLOT, "booking_id"))
}

/// Format availability times: the first six spelled out, the rest
/// summarized as "and N more".
fn format_times(times: &[String]) -> String {
    let listed: Vec<&str> = times.iter().take(MAX_LISTED_TIMES).map(String::as_str).collect();
    let mut formatted = listed.join(", ");
    if times.len() > MAX_LISTED_TIMES {
        let more = times.len().saturating_sub(MAX_LISTED_TIMES);
        formatted.push_str(&format!(" and {more} more"));
    }
    formatted
}

// ---------------------------------------------------------------------------
// The booking form
// ---------------------------------------------------------------------------

/// Drives the booking form: validates candidates for unfilled required
/// slots, re-prompts on rejection, and runs the terminal create-booking
/// call when everything is filled.
pub struct BookingFormAction;

#[async_trait]
impl Action for BookingFormAction {
    fn name(&self) -> &'static str {
        BOOKING_FORM
    }

    async fn run(&self, ctx: &ActionContext, input: &TurnInput) -> RuntimeResult<ActionOutcome> {
        let config = booking_config(ctx).await;
        let required = booking_required_slots(&config);
        let today = ctx.clock.today();

        let mut slots = input.slots.clone();
        let mut outcome = ActionOutcome::default();

        if input.active_form.as_deref() != Some(BOOKING_FORM) {
            outcome.events.push(Event::ActivateForm {
                name: BOOKING_FORM.to_string(),
            });
        }

        let requested = input.slot_text(REQUESTED_SLOT).map(ToString::to_string);
        let requested_candidate = requested
            .as_deref()
            .and_then(|slot| candidate_for(input, slot, true));
        debug!(
            state = ?form_state(input, &required, requested_candidate.as_deref()),
            "booking form turn"
        );

        // Fill pass over the required slots, in order.
        for slot in &required {
            if slots.contains_key(*slot) {
                continue;
            }
            let is_requested = requested.as_deref() == Some(*slot);
            let Some(candidate) = candidate_for(input, slot, is_requested) else {
                continue;
            };

            match validate_booking_slot(slot, &candidate, &config, today) {
                Ok(value) => {
                    debug!(slot, "booking slot filled");
                    outcome.events.push(Event::SetSlot {
                        name: (*slot).to_string(),
                        value: Some(value.clone()),
                    });
                    slots.insert((*slot).to_string(), value);
                },
                Err(failure) => {
                    // Invalid candidate: keep the slot unset and stay on it.
                    outcome.messages.push(BotMessage::text(failure.message));
                    outcome.events.push(Event::set_slot(REQUESTED_SLOT, *slot));
                    return Ok(outcome);
                },
            }
        }

        // Optional slots are filled opportunistically from entities.
        for slot in ["customer_phone", "party_size", "notes"] {
            if required.contains(&slot) || slots.contains_key(slot) {
                continue;
            }
            let Some(candidate) = candidate_for(input, slot, false) else {
                continue;
            };
            if let Ok(value) = validate_booking_slot(slot, &candidate, &config, today) {
                outcome.events.push(Event::SetSlot {
                    name: slot.to_string(),
                    value: Some(value.clone()),
                });
                slots.insert(slot.to_string(), value);
            }
        }

        if let Some(next) = next_unfilled(&slots, &required) {
            let service_names: Vec<String> = config
                .enabled_services()
                .iter()
                .map(|s| s.name.clone())
                .collect();
            outcome
                .messages
                .push(BotMessage::text(prompt_for_slot(next, &service_names, &[])));
            outcome.events.push(Event::set_slot(REQUESTED_SLOT, next));
            return Ok(outcome);
        }

        // All required slots hold validated values: run the terminal action.
        let terminal = complete_booking(ctx, input, &slots).await?;
        outcome.messages.extend(terminal.messages);
        outcome.events.extend(terminal.events);
        outcome.events.push(Event::clear_slot(REQUESTED_SLOT));
        outcome.events.push(Event::DeactivateForm);
        Ok(outcome)
    }
}

/// The create-booking terminal action.
async fn complete_booking(
    ctx: &ActionContext,
    input: &TurnInput,
    slots: &SlotMap,
) -> RuntimeResult<ActionOutcome> {
    let service = slot_text(slots, "service_type")?;
    let date_iso = slot_text(slots, "booking_date")?;
    let time = slot_text(slots, "booking_time")?;
    let customer_name = slot_text(slots, "customer_name")?;
    let customer_email = slot_text(slots, "customer_email")?;

    let date = NaiveDate::parse_from_str(&date_iso, "%Y-%m-%d")
        .map_err(|e| RuntimeError::Internal(format!("stored booking_date invalid: {e}")))?;

    let party_size = slots.get("party_size").and_then(|v| match v {
        SlotValue::Integer(n) => u32::try_from(*n).ok(),
        SlotValue::Text(s) => s.parse().ok(),
        _ => None,
    });

    let request = CreateBookingRequest {
        service: service.clone(),
        date,
        time: time.clone(),
        customer_name,
        customer_email: customer_email.clone(),
        customer_phone: slots.get("customer_phone").map(SlotValue::to_text),
        party_size,
        notes: slots.get("notes").map(SlotValue::to_text),
    };

    let data_hash = hash_pii(&customer_email);
    let mut metadata = serde_json::Map::new();
    metadata.insert("service".to_string(), json!(service.clone()));
    metadata.insert("date".to_string(), json!(date_iso.clone()));
    metadata.insert("time".to_string(), json!(time.clone()));

    match ctx.backend.create_booking(&request).await {
        Ok(response) if response.success => {
            let booking_id = response.booking_id.unwrap_or_default();
            ctx.audit
                .log_action(
                    AuditEvent::new(
                        "create_booking",
                        input.sender_id.clone(),
                        AuditStatus::Success,
                    )
                    .with_booking_id(&booking_id)
                    .with_data_hash(data_hash)
                    .with_metadata(metadata),
                )
                .await;

            Ok(ActionOutcome::message(format!(
                "You're all set! {service} on {} at {time}. Your reference is {booking_id}.",
                friendly_date(&date_iso),
            ))
            .with_event(Event::SetSlot {
                name: "current_booking".to_string(),
                value: Some(SlotValue::Data(json!({
                    "booking_id": booking_id.clone(),
                    "service": service,
                    "date": date_iso,
                    "time": time,
                }))),
            })
            .with_event(Event::set_slot("booking_id", booking_id.as_str())))
        },
        Ok(response) => {
            ctx.audit
                .log_action(
                    AuditEvent::new(
                        "create_booking",
                        input.sender_id.clone(),
                        AuditStatus::Failed,
                    )
                    .with_data_hash(data_hash)
                    .with_error(response.error.unwrap_or_else(|| "backend refusal".to_string())),
                )
                .await;
            Ok(ActionOutcome::message(BOOKING_ERROR))
        },
        Err(e) => {
            ctx.audit
                .log_action(
                    AuditEvent::new(
                        "create_booking",
                        input.sender_id.clone(),
                        AuditStatus::Failed,
                    )
                    .with_data_hash(data_hash)
                    .with_error(e.to_string()),
                )
                .await;
            Ok(ActionOutcome::message(BOOKING_ERROR))
        },
    }
}

// ---------------------------------------------------------------------------
// Lookup form
// ---------------------------------------------------------------------------

/// Collects a booking reference, then follows up with the status check.
pub struct LookupFormAction;

#[async_trait]
impl Action for LookupFormAction {
    fn name(&self) -> &'static str {
        LOOKUP_FORM
    }

    async fn run(&self, _ctx: &ActionContext, input: &TurnInput) -> RuntimeResult<ActionOutcome> {
        let Some(candidate) = candidate_for(input, "booking_id", true) else {
            return Ok(activate_lookup(
                "What's your booking reference? It looks like BK-1234-5678.",
            ));
        };

        match validate_booking_id(&candidate) {
            Ok(id) => Ok(ActionOutcome::default()
                .with_event(Event::set_slot("booking_id", id.as_str()))
                .with_event(Event::clear_slot(REQUESTED_SLOT))
                .with_event(Event::DeactivateForm)
                .with_event(Event::FollowupAction {
                    name: "check_booking_status".to_string(),
                })),
            Err(failure) => Ok(ActionOutcome::message(failure.message)
                .with_event(Event::set_slot(REQUESTED_SLOT, "booking_id"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

/// Cancels a booking by reference. No local existence pre-check: an
/// unknown-but-plausible reference goes to the backend and its not-found
/// answer is surfaced.
pub struct CancelBookingAction;

#[async_trait]
impl Action for CancelBookingAction {
    fn name(&self) -> &'static str {
        "cancel_booking"
    }

    async fn run(&self, ctx: &ActionContext, input: &TurnInput) -> RuntimeResult<ActionOutcome> {
        let Some(raw) = booking_reference(input) else {
            return Ok(activate_lookup(
                "I can help cancel a booking. What's your booking reference? It looks like BK-1234-5678.",
            ));
        };

        let id = match validate_booking_id(&raw) {
            Ok(id) => id,
            Err(failure) => return Ok(ActionOutcome::message(failure.message)),
        };

        match ctx.backend.cancel_booking(&id).await {
            Ok(response) if response.success => {
                ctx.audit
                    .log_action(
                        AuditEvent::new(
                            "cancel_booking",
                            input.sender_id.clone(),
                            AuditStatus::Success,
                        )
                        .with_booking_id(id.as_str()),
                    )
                    .await;

                let mut text = format!("Your booking {id} has been cancelled.");
                if let TaskConfig::Cancel(cancel) =
                    ctx.config.get_task_config(TaskKind::Cancel).await.as_ref()
                {
                    if !cancel.policy_text.is_empty() {
                        text.push(' ');
                        text.push_str(&cancel.policy_text);
                    }
                }

                Ok(ActionOutcome::message(text)
                    .with_event(Event::clear_slot("booking_id"))
                    .with_event(Event::clear_slot("current_booking")))
            },
            Ok(response) => {
                ctx.audit
                    .log_action(
                        AuditEvent::new(
                            "cancel_booking",
                            input.sender_id.clone(),
                            AuditStatus::Failed,
                        )
                        .with_booking_id(id.as_str())
                        .with_error(response.error.unwrap_or_else(|| "backend refusal".to_string())),
                    )
                    .await;
                Ok(ActionOutcome::message(BOOKING_ERROR))
            },
            Err(BackendError::NotFound) => {
                ctx.audit
                    .log_action(
                        AuditEvent::new(
                            "cancel_booking",
                            input.sender_id.clone(),
                            AuditStatus::Failed,
                        )
                        .with_booking_id(id.as_str())
                        .with_error("Resource not found"),
                    )
                    .await;
                Ok(ActionOutcome::message(format!(
                    "We couldn't find a booking with reference {id}. Please double-check it.",
                )))
            },
            Err(e) => {
                ctx.audit
                    .log_action(
                        AuditEvent::new(
                            "cancel_booking",
                            input.sender_id.clone(),
                            AuditStatus::Failed,
                        )
                        .with_booking_id(id.as_str())
                        .with_error(e.to_string()),
                    )
                    .await;
                Ok(ActionOutcome::message(BOOKING_ERROR))
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Reschedule
// ---------------------------------------------------------------------------

/// Moves a booking to a new date/time, revalidating both against the
/// booking rules before touching the backend.
pub struct RescheduleBookingAction;

#[async_trait]
impl Action for RescheduleBookingAction {
    fn name(&self) -> &'static str {
        "reschedule_booking"
    }

    async fn run(&self, ctx: &ActionContext, input: &TurnInput) -> RuntimeResult<ActionOutcome> {
        let Some(raw) = booking_reference(input) else {
            return Ok(activate_lookup(
                "I can help reschedule. What's your booking reference? It looks like BK-1234-5678.",
            ));
        };
        let id = match validate_booking_id(&raw) {
            Ok(id) => id,
            Err(failure) => return Ok(ActionOutcome::message(failure.message)),
        };

        let date_candidate = candidate_for(input, "booking_date", false);
        let time_candidate = candidate_for(input, "booking_time", false);
        let (Some(date_raw), Some(time_raw)) = (date_candidate, time_candidate) else {
            return Ok(ActionOutcome::message(
                "What new date and time would you like?",
            ));
        };

        let config = booking_config(ctx).await;
        let date = match validate_booking_date(
            &date_raw,
            ctx.clock.today(),
            config.booking_window_days,
            &config.blocked_dates,
        ) {
            Ok(date) => date,
            Err(failure) => return Ok(ActionOutcome::message(failure.message)),
        };
        let time = match validate_booking_time(&time_raw, &config.business_hours) {
            Ok(time) => time,
            Err(failure) => return Ok(ActionOutcome::message(failure.message)),
        };

        let request = RescheduleRequest {
            date,
            time: time.format("%H:%M").to_string(),
        };

        match ctx.backend.reschedule_booking(&id, &request).await {
            Ok(response) if response.success => {
                ctx.audit
                    .log_action(
                        AuditEvent::new(
                            "reschedule_booking",
                            input.sender_id.clone(),
                            AuditStatus::Success,
                        )
                        .with_booking_id(id.as_str()),
                    )
                    .await;
                Ok(ActionOutcome::message(format!(
                    "Done! Booking {id} is now on {} at {}.",
                    date.format("%B %-d, %Y"),
                    request.time,
                ))
                .with_event(Event::set_slot(
                    "booking_date",
                    date.format("%Y-%m-%d").to_string(),
                ))
                .with_event(Event::set_slot("booking_time", request.time.as_str())))
            },
            Ok(response) => {
                ctx.audit
                    .log_action(
                        AuditEvent::new(
                            "reschedule_booking",
                            input.sender_id.clone(),
                            AuditStatus::Failed,
                        )
                        .with_booking_id(id.as_str())
                        .with_error(response.error.unwrap_or_else(|| "backend refusal".to_string())),
                    )
                    .await;
                Ok(ActionOutcome::message(BOOKING_ERROR))
            },
            Err(BackendError::NotFound) => Ok(ActionOutcome::message(format!(
                "We couldn't find a booking with reference {id}. Please double-check it.",
            ))),
            Err(e) => {
                ctx.audit
                    .log_action(
                        AuditEvent::new(
                            "reschedule_booking",
                            input.sender_id.clone(),
                            AuditStatus::Failed,
                        )
                        .with_booking_id(id.as_str())
                        .with_error(e.to_string()),
                    )
                    .await;
                Ok(ActionOutcome::message(BOOKING_ERROR))
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Looks a booking up and offers the next steps.
pub struct CheckBookingStatusAction;

#[async_trait]
impl Action for CheckBookingStatusAction {
    fn name(&self) -> &'static str {
        "check_booking_status"
    }

    async fn run(&self, ctx: &ActionContext, input: &TurnInput) -> RuntimeResult<ActionOutcome> {
        let Some(raw) = booking_reference(input) else {
            return Ok(activate_lookup(
                "What's your booking reference? It looks like BK-1234-5678.",
            ));
        };
        let id = match validate_booking_id(&raw) {
            Ok(id) => id,
            Err(failure) => return Ok(ActionOutcome::message(failure.message)),
        };

        match ctx.backend.get_booking(&id).await {
            Ok(response) if response.success => {
                let record = response.booking.unwrap_or_default();
                ctx.audit
                    .log_action(
                        AuditEvent::new(
                            "check_booking_status",
                            input.sender_id.clone(),
                            AuditStatus::Success,
                        )
                        .with_booking_id(id.as_str()),
                    )
                    .await;

                let mut outcome = ActionOutcome::message(format!(
                    "Booking {id}: {} on {} at {} - status {}. Would you like to reschedule or cancel it?",
                    record.service.as_deref().unwrap_or("service"),
                    record.date.as_deref().map_or_else(
                        || "unknown date".to_string(),
                        friendly_date,
                    ),
                    record.time.as_deref().unwrap_or("unknown time"),
                    record.status.as_deref().unwrap_or("unknown"),
                ))
                .with_event(Event::set_slot("booking_id", id.as_str()));

                // Populate slots from the retrieved record.
                if let Some(date) = &record.date {
                    outcome
                        .events
                        .push(Event::set_slot("booking_date", date.as_str()));
                }
                if let Some(time) = &record.time {
                    outcome
                        .events
                        .push(Event::set_slot("booking_time", time.as_str()));
                }
                if let Some(service) = &record.service {
                    outcome
                        .events
                        .push(Event::set_slot("service_type", service.as_str()));
                }
                outcome.events.push(Event::SetSlot {
                    name: "current_booking".to_string(),
                    value: Some(SlotValue::Data(serde_json::to_value(&record).unwrap_or_default())),
                });
                Ok(outcome)
            },
            Ok(_) | Err(BackendError::NotFound) => {
                ctx.audit
                    .log_action(
                        AuditEvent::new(
                            "check_booking_status",
                            input.sender_id.clone(),
                            AuditStatus::Failed,
                        )
                        .with_booking_id(id.as_str())
                        .with_error("Resource not found"),
                    )
                    .await;
                Ok(ActionOutcome::message(format!(
                    "We couldn't find a booking with reference {id}. Please double-check it.",
                )))
            },
            Err(e) => {
                ctx.audit
                    .log_action(
                        AuditEvent::new(
                            "check_booking_status",
                            input.sender_id.clone(),
                            AuditStatus::Failed,
                        )
                        .with_booking_id(id.as_str())
                        .with_error(e.to_string()),
                    )
                    .await;
                Ok(ActionOutcome::message(BOOKING_ERROR))
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// Lists open times for a service on a date.
pub struct GetAvailabilityAction;

#[async_trait]
impl Action for GetAvailabilityAction {
    fn name(&self) -> &'static str {
        "get_availability"
    }

    async fn run(&self, ctx: &ActionContext, input: &TurnInput) -> RuntimeResult<ActionOutcome> {
        let config = booking_config(ctx).await;

        let service_raw = input
            .slot_text("service_type")
            .map(ToString::to_string)
            .or_else(|| candidate_for(input, "service_type", false));
        let Some(service_raw) = service_raw else {
            let names: Vec<String> = config
                .enabled_services()
                .iter()
                .map(|s| s.name.clone())
                .collect();
            return Ok(ActionOutcome::message(format!(
                "Which service are you interested in? We offer: {}.",
                names.join(", "),
            )));
        };
        let service = match validate_service(&service_raw, &config) {
            Ok(service) => service,
            Err(failure) => return Ok(ActionOutcome::message(failure.message)),
        };

        let today = ctx.clock.today();
        let date = candidate_for(input, "booking_date", false)
            .or_else(|| input.slot_text("booking_date").map(ToString::to_string))
            .and_then(|raw| crate::validators::parse_date(&raw, today))
            .unwrap_or(today);
        let date_iso = date.format("%Y-%m-%d").to_string();

        match ctx.backend.get_available_slots(&service, &date_iso).await {
            Ok(response) if response.success => {
                if response.available_times.is_empty() {
                    return Ok(ActionOutcome::message(format!(
                        "There are no open times for {service} on {}. Want to try another date?",
                        date.format("%B %-d, %Y"),
                    )));
                }
                Ok(ActionOutcome::message(format!(
                    "Available times for {service} on {}: {}.",
                    date.format("%B %-d, %Y"),
                    format_times(&response.available_times),
                )))
            },
            Ok(response) => Ok(ActionOutcome::message(
                response.error.unwrap_or_else(|| BOOKING_ERROR.to_string()),
            )),
            Err(e) => {
                ctx.audit
                    .log_action(
                        AuditEvent::new(
                            "get_availability",
                            input.sender_id.clone(),
                            AuditStatus::Failed,
                        )
                        .with_error(e.to_string()),
                    )
                    .await;
                Ok(ActionOutcome::message(BOOKING_ERROR))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_times_overflow() {
        let times: Vec<String> = (9..=17).map(|h| format!("{h:02}:00")).collect();
        let formatted = format_times(&times);
        assert!(formatted.starts_with("09:00, 10:00"));
        assert!(formatted.ends_with("and 3 more"));
        assert_eq!(formatted.matches(", ").count(), 5);
    }

    #[test]
    fn test_format_times_short_list() {
        let times = vec!["09:00".to_string(), "09:30".to_string()];
        assert_eq!(format_times(&times), "09:00, 09:30");
    }

    #[test]
    fn test_friendly_date() {
        assert_eq!(friendly_date("2025-12-25"), "December 25, 2025");
        assert_eq!(friendly_date("not-a-date"), "not-a-date");
    }

    #[test]
    fn test_validate_booking_slot_dispatch() {
        let config = BookingTaskConfig::default();
        let today = NaiveDate::from_ymd_opt(2025, 6, 4).unwrap();

        let service = validate_booking_slot("service_type", "demo", &config, today).unwrap();
        assert_eq!(service.as_str(), Some("Demo"));

        let date = validate_booking_slot("booking_date", "tomorrow", &config, today).unwrap();
        assert_eq!(date.as_str(), Some("2025-06-05"));

        let time = validate_booking_slot("booking_time", "2pm", &config, today).unwrap();
        assert_eq!(time.as_str(), Some("14:00"));

        let size = validate_booking_slot("party_size", "4", &config, today).unwrap();
        assert_eq!(size, SlotValue::Integer(4));

        assert!(validate_booking_slot("booking_time", "8am", &config, today).is_err());
    }
}
