//! Question answering: grounded retrieval answers and the low-confidence
//! LLM fallback.

use async_trait::async_trait;
use tracing::debug;

use frontdesk_audit::{AuditEvent, AuditStatus};
use frontdesk_retrieval::{RefusalKind, ScoredChunk, compose};

use crate::actions::{Action, ActionContext, ActionOutcome};
use crate::error::RuntimeResult;
use crate::turn::TurnInput;

/// Refusal message for guardrail violations.
const GUARDRAIL_REFUSAL: &str = "I can only answer questions about our business and services.";

/// Clarification prompt for weakly grounded questions.
const CLARIFY: &str = "I'm not quite sure what you're after. Could you rephrase the question?";

/// Fallback when nothing is known and no LLM is available.
const NO_ANSWER: &str =
    "I don't have that information on hand. You're welcome to contact us directly.";

/// Suffix attached to answers produced without any retrieved grounding.
const GENERAL_KNOWLEDGE_SUFFIX: &str = "I'm answering based on my general knowledge.";

fn context_from(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

async fn audit_guardrail(ctx: &ActionContext, input: &TurnInput, kind: RefusalKind) {
    ctx.audit
        .log_action(
            AuditEvent::new("answer_question", input.sender_id.clone(), AuditStatus::Failed)
                .with_error(format!("guardrail:{kind}")),
        )
        .await;
}

// ---------------------------------------------------------------------------
// Grounded answering
// ---------------------------------------------------------------------------

/// Answers a question from the knowledge base, optionally composing the
/// final wording with the LLM.
pub struct AnswerQuestionAction;

#[async_trait]
impl Action for AnswerQuestionAction {
    fn name(&self) -> &'static str {
        "answer_question"
    }

    async fn run(&self, ctx: &ActionContext, input: &TurnInput) -> RuntimeResult<ActionOutcome> {
        let results = ctx
            .knowledge
            .search(Some(input.intent.name.as_str()), &input.text, None)
            .await
            .unwrap_or_else(|e| {
                debug!(error = %e, "knowledge search failed; treating as empty");
                Vec::new()
            });

        let verdict = ctx.guardrails.evaluate(&input.text, &results);

        match verdict.refusal {
            Some(kind @ (RefusalKind::Injection | RefusalKind::SensitiveData)) => {
                audit_guardrail(ctx, input, kind).await;
                return Ok(ActionOutcome::message(GUARDRAIL_REFUSAL));
            },
            Some(kind @ RefusalKind::LowRelevance) => {
                audit_guardrail(ctx, input, kind).await;
                return Ok(ActionOutcome::message(NO_ANSWER));
            },
            Some(RefusalKind::LowConfidence) => {
                return self.unknown_answer(ctx, input).await;
            },
            None => {},
        }

        if verdict.needs_clarification {
            return Ok(ActionOutcome::message(CLARIFY));
        }

        let Some(grounded) = compose(&results, &verdict) else {
            return self.unknown_answer(ctx, input).await;
        };

        // Optionally let the LLM phrase the answer, validated against the
        // sources it was given.
        let llm_config = ctx.config.get_llm_config().await;
        let mut text = grounded.text.clone();
        let mut warnings = grounded.warnings.clone();

        if llm_config.use_knowledge_base {
            if let Some(llm) = ctx.llm().await {
                let generation = llm.generate(&input.text, &context_from(&results)).await;
                if generation.success {
                    if let Some(response) = generation.response {
                        let validation = ctx.guardrails.validate_response(&response, &results);
                        warnings.extend(validation.warnings);
                        text = response;
                    }
                }
            }
        }

        let mut outcome = ActionOutcome::message(format!("{text}\n\nSource: {}", grounded.source));
        for warning in warnings {
            outcome.messages.push(crate::turn::BotMessage::text(warning));
        }

        ctx.audit
            .log_action(AuditEvent::new(
                "answer_question",
                input.sender_id.clone(),
                AuditStatus::Success,
            ))
            .await;
        Ok(outcome)
    }
}

impl AnswerQuestionAction {
    /// Nothing similar enough was retrieved: fall back to the LLM when
    /// allowed, otherwise admit not knowing.
    async fn unknown_answer(
        &self,
        ctx: &ActionContext,
        input: &TurnInput,
    ) -> RuntimeResult<ActionOutcome> {
        let llm_config = ctx.config.get_llm_config().await;
        if llm_config.fallback_to_llm {
            if let Some(llm) = ctx.llm().await {
                let generation = llm.generate(&input.text, "").await;
                if generation.success {
                    if let Some(response) = generation.response {
                        return Ok(ActionOutcome::message(format!(
                            "{response}\n\n{GENERAL_KNOWLEDGE_SUFFIX}"
                        )));
                    }
                }
            }
        }
        Ok(ActionOutcome::message(NO_ANSWER))
    }
}

// ---------------------------------------------------------------------------
// LLM fallback
// ---------------------------------------------------------------------------

/// Handles turns the NLU could not classify confidently. Retrieval is
/// still consulted for context; with nothing retrieved the model answers
/// from general knowledge and says so.
pub struct LlmFallbackAction;

#[async_trait]
impl Action for LlmFallbackAction {
    fn name(&self) -> &'static str {
        "llm_fallback"
    }

    async fn run(&self, ctx: &ActionContext, input: &TurnInput) -> RuntimeResult<ActionOutcome> {
        let bot = ctx.config.get_bot_config().await;
        let llm_config = ctx.config.get_llm_config().await;

        if !llm_config.fallback_to_llm {
            return Ok(ActionOutcome::message(bot.fallback_message.clone()));
        }

        let Some(llm) = ctx.llm().await else {
            return Ok(ActionOutcome::message(bot.fallback_message.clone()));
        };

        // No intent bias here - the classifier already gave up.
        let results = ctx
            .knowledge
            .search(None, &input.text, None)
            .await
            .unwrap_or_default();
        let threshold = ctx.guardrails.config().low;
        let grounded: Vec<ScoredChunk> = results
            .into_iter()
            .filter(|c| c.score >= threshold)
            .collect();
        let context = context_from(&grounded);

        let generation = llm.generate(&input.text, &context).await;

        if generation.success {
            let response = generation.response.unwrap_or_default();
            ctx.audit
                .log_action(AuditEvent::new(
                    "llm_fallback",
                    input.sender_id.clone(),
                    AuditStatus::Logged,
                ))
                .await;

            let text = if context.is_empty() {
                format!("{response}\n\n{GENERAL_KNOWLEDGE_SUFFIX}")
            } else {
                response
            };
            Ok(ActionOutcome::message(text))
        } else {
            ctx.audit
                .log_action(
                    AuditEvent::new("llm_fallback", input.sender_id.clone(), AuditStatus::Failed)
                        .with_error(generation.error.unwrap_or_else(|| "generation failed".to_string())),
                )
                .await;
            Ok(ActionOutcome::message(bot.fallback_message.clone()))
        }
    }
}
