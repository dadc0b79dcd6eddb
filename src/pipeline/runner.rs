//! The five-stage per-group pipeline.
//!
//! Stages run strictly in order inside one concurrency unit:
//!   A  text acquisition   — per-item failures tolerated, empty text skips
//!   B  classification     — two passes, final negative verdict skips
//!   C  structuring        — any failure skips
//!   D  enrichment         — failure is non-fatal
//!   E  post-processing    — tags, sanitization, title fix-up
//!
//! A group always resolves to exactly one `Outcome`; nothing here returns an
//! error to the caller.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::Instrument;

use super::aggregate::Outcome;
use super::parse::{parse_nutrition, parse_record, parse_verdict, ClassificationVerdict};
use super::prompts;
use crate::grouping::ShotGroup;
use crate::intake::PhotoItem;
use crate::sanitize::{fix_title_case, sanitize_field};
use crate::schema::{RecipeField, RecipeRecord};
use crate::service::invoker::ResilientInvoker;
use crate::service::{CallError, ImagePart, OperationKind, Payload, ServiceRequest};

/// Servings assumed when the structured record has none.
const DEFAULT_SERVINGS: u32 = 4;

pub struct GroupPipeline {
    invoker: ResilientInvoker,
    vision_model: String,
    text_model: String,
    batch_tags: Vec<String>,
}

impl GroupPipeline {
    pub fn new(
        invoker: ResilientInvoker,
        vision_model: String,
        text_model: String,
        batch_tags: Vec<String>,
    ) -> Self {
        Self {
            invoker,
            vision_model,
            text_model,
            batch_tags,
        }
    }

    /// Run a group through all five stages to its terminal outcome.
    pub async fn process_group(&self, group: &ShotGroup) -> Outcome {
        let span =
            tracing::info_span!("process_group", group = %group.label(), items = group.items.len());
        self.run_stages(group).instrument(span).await
    }

    async fn run_stages(&self, group: &ShotGroup) -> Outcome {
        let label = group.label();

        // Stage A — text acquisition
        let combined_text = self.acquire_text(group).await;
        if combined_text.trim().is_empty() {
            tracing::info!("no text extracted from any item in group");
            return Outcome::Skipped {
                group: label,
                reason: "no text could be extracted".to_string(),
            };
        }

        // Stage B — two-pass classification
        let verdict = self.classify(&combined_text).await;
        if !verdict.is_recipe {
            tracing::info!(pass = verdict.pass, reason = %verdict.reason, "group rejected");
            return Outcome::Skipped { group: label, reason: verdict.reason };
        }

        // Stage C — structured extraction
        let mut record = match self.structure(&combined_text).await {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "structuring failed");
                return Outcome::Skipped {
                    group: label,
                    reason: "failed to structure recipe data".to_string(),
                };
            }
        };

        // Stage D — enrichment (non-fatal)
        self.enrich(&mut record).await;

        // Stage E — post-processing
        self.post_process(&mut record);

        Outcome::Success(record)
    }

    /// Stage A: extract text from each item; individual failures only cost
    /// that item its contribution.
    async fn acquire_text(&self, group: &ShotGroup) -> String {
        let mut blocks = Vec::new();
        for item in &group.items {
            match self.extract_item_text(item).await {
                Ok(text) if !text.trim().is_empty() => blocks.push(text),
                Ok(_) => tracing::debug!(item = %item.name, "item yielded no text"),
                Err(e) => tracing::warn!(item = %item.name, error = %e, "item extraction failed"),
            }
        }
        blocks.join("\n")
    }

    async fn extract_item_text(&self, item: &PhotoItem) -> Result<String, CallError> {
        let bytes = tokio::fs::read(&item.path).await?;
        let request = ServiceRequest {
            operation: OperationKind::TextExtraction,
            model: self.vision_model.clone(),
            payload: Payload::Vision {
                prompt: prompts::EXTRACTION_PROMPT.to_string(),
                images: vec![ImagePart {
                    mime_type: item.mime_type.to_string(),
                    data_b64: BASE64.encode(&bytes),
                }],
            },
        };
        self.invoker.invoke(&request).await
    }

    /// Stage B: a positive pass-1 verdict is final; anything else gets one
    /// stricter second pass whose verdict is final. Call failures count as
    /// negative verdicts with a synthetic reason.
    async fn classify(&self, text: &str) -> ClassificationVerdict {
        let first = self.classification_pass(text, 1).await;
        if first.is_recipe {
            return first;
        }
        tracing::debug!(reason = %first.reason, "pass 1 negative, trying stricter pass");
        self.classification_pass(text, 2).await
    }

    async fn classification_pass(&self, text: &str, pass: u8) -> ClassificationVerdict {
        let request = ServiceRequest {
            operation: OperationKind::Classification,
            model: self.text_model.clone(),
            payload: Payload::Text {
                prompt: prompts::build_classification_prompt(text, pass == 2),
            },
        };
        let result = match self.invoker.invoke(&request).await {
            Ok(body) => parse_verdict(&body, pass),
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| ClassificationVerdict {
            is_recipe: false,
            reason: format!("classification call failed: {e}"),
            pass,
        })
    }

    /// Stage C: one structuring call, parsed against the full schema.
    /// Rating is cleared post-parse so the "always empty" convention holds
    /// even when the model ignores it.
    async fn structure(&self, text: &str) -> Result<RecipeRecord, CallError> {
        let request = ServiceRequest {
            operation: OperationKind::Structuring,
            model: self.text_model.clone(),
            payload: Payload::Text {
                prompt: prompts::build_structuring_prompt(text),
            },
        };
        let body = self.invoker.invoke(&request).await?;
        let mut record = parse_record(&body)?;
        record.set(RecipeField::Rating, "");
        Ok(record)
    }

    /// Stage D: only runs with a non-empty ingredient list; failures leave
    /// the record untouched.
    async fn enrich(&self, record: &mut RecipeRecord) {
        let ingredients = record.get(RecipeField::Ingredients).to_string();
        if ingredients.trim().is_empty() {
            return;
        }
        let servings = parse_servings(record.get(RecipeField::Servings));

        let request = ServiceRequest {
            operation: OperationKind::Enrichment,
            model: self.text_model.clone(),
            payload: Payload::Text {
                prompt: prompts::build_enrichment_prompt(&ingredients, servings),
            },
        };

        let updates = match self.invoker.invoke(&request).await {
            Ok(body) => parse_nutrition(&body),
            Err(e) => Err(e),
        };
        match updates {
            Ok(updates) => {
                for (field, value) in updates {
                    record.set(field, value);
                }
            }
            Err(e) => tracing::warn!(error = %e, "enrichment failed, keeping existing values"),
        }
    }

    /// Stage E: batch tags, sanitization of every field, title fix-up.
    fn post_process(&self, record: &mut RecipeRecord) {
        if !self.batch_tags.is_empty() {
            let existing = record.get(RecipeField::Tags);
            let appended = if existing.trim().is_empty() {
                self.batch_tags.join(", ")
            } else {
                format!("{existing}, {}", self.batch_tags.join(", "))
            };
            record.set(RecipeField::Tags, appended);
        }

        for field in RecipeField::ALL {
            let cleaned = sanitize_field(record.get(field));
            record.set(field, cleaned);
        }

        let fixed = fix_title_case(record.get(RecipeField::Title));
        record.set(RecipeField::Title, fixed);
    }
}

/// Leading integer of the servings field; absent, blank or unparsable means
/// the default of 4.
fn parse_servings(raw: &str) -> u32 {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_SERVINGS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::ShotGroup;
    use crate::service::invoker::RetryPolicy;
    use crate::service::ScriptedTransport;
    use chrono::NaiveDate;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    fn write_item(dir: &Path, name: &str, secs: u32) -> PhotoItem {
        let path = dir.join(name);
        std::fs::write(&path, b"jpeg bytes").unwrap();
        PhotoItem {
            path,
            name: name.to_string(),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 12)
                .unwrap()
                .and_hms_opt(18, 0, secs)
                .unwrap(),
            mime_type: "image/jpeg",
        }
    }

    fn pipeline(transport: Arc<ScriptedTransport>, tags: Vec<String>) -> GroupPipeline {
        let policy = RetryPolicy { max_retries: 1, initial_delay: Duration::from_millis(1) };
        GroupPipeline::new(
            ResilientInvoker::new(transport, policy),
            "vision-model".into(),
            "text-model".into(),
            tags,
        )
    }

    fn positive_verdict() -> &'static str {
        r#"{"is_recipe": true, "reason": "has ingredients and steps"}"#
    }

    fn structured_reply() -> String {
        serde_json::json!({
            "title": "CHICKEN SOUP \u{1F372}",
            "course": "Main",
            "main_ingredient": "Chicken",
            "servings": "4",
            "ingredients": "1 chicken\n2 carrots",
            "directions": "Simmer.\nServe.",
            "tags": "soup",
            "rating": "",
        })
        .to_string()
    }

    #[tokio::test]
    async fn empty_extraction_skips_before_classification() {
        let dir = tempfile::tempdir().unwrap();
        let group = ShotGroup { items: vec![write_item(dir.path(), "a.jpg", 0)] };
        let transport = Arc::new(
            ScriptedTransport::new().reply(OperationKind::TextExtraction, "   "),
        );
        let outcome = pipeline(transport.clone(), vec![]).process_group(&group).await;

        match outcome {
            Outcome::Skipped { group, reason } => {
                assert_eq!(group, "a.jpg");
                assert!(reason.contains("no text"));
            }
            other => panic!("expected skip, got {other:?}"),
        }
        assert!(!transport.calls().contains(&OperationKind::Classification));
        assert!(!transport.calls().contains(&OperationKind::Structuring));
    }

    #[tokio::test]
    async fn failed_item_extraction_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let group = ShotGroup {
            items: vec![
                write_item(dir.path(), "a.jpg", 0),
                write_item(dir.path(), "b.jpg", 2),
            ],
        };
        // First item fails at the transport, second succeeds; the group
        // continues on the second item's text alone.
        let transport = Arc::new(
            ScriptedTransport::new()
                .fail(OperationKind::TextExtraction, "boom")
                .reply(OperationKind::TextExtraction, "Chicken Soup\n1 chicken")
                .reply(OperationKind::Classification, positive_verdict())
                .reply(OperationKind::Structuring, &structured_reply())
                .reply(OperationKind::Enrichment, r#"{"calories": "320"}"#),
        );
        let outcome = pipeline(transport, vec![]).process_group(&group).await;
        assert!(matches!(outcome, Outcome::Success(_)));
    }

    #[tokio::test]
    async fn positive_pass1_never_issues_pass2() {
        let dir = tempfile::tempdir().unwrap();
        let group = ShotGroup { items: vec![write_item(dir.path(), "a.jpg", 0)] };
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(OperationKind::TextExtraction, "recipe text")
                .reply(OperationKind::Classification, positive_verdict())
                .reply(OperationKind::Structuring, &structured_reply())
                .reply(OperationKind::Enrichment, r#"{"calories": "320"}"#),
        );
        let outcome = pipeline(transport.clone(), vec![]).process_group(&group).await;

        assert!(matches!(outcome, Outcome::Success(_)));
        assert_eq!(transport.prompts_for(OperationKind::Classification).len(), 1);
    }

    #[tokio::test]
    async fn negative_pass1_issues_exactly_one_stricter_pass() {
        let dir = tempfile::tempdir().unwrap();
        let group = ShotGroup { items: vec![write_item(dir.path(), "a.jpg", 0)] };
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(OperationKind::TextExtraction, "faded card")
                .reply(
                    OperationKind::Classification,
                    r#"{"is_recipe": false, "reason": "looks like a note"}"#,
                )
                .reply(OperationKind::Classification, positive_verdict())
                .reply(OperationKind::Structuring, &structured_reply())
                .reply(OperationKind::Enrichment, r#"{"calories": "320"}"#),
        );
        let outcome = pipeline(transport.clone(), vec![]).process_group(&group).await;

        assert!(matches!(outcome, Outcome::Success(_)));
        let prompts = transport.prompts_for(OperationKind::Classification);
        assert_eq!(prompts.len(), 2);
        assert!(!prompts[0].contains("Look again closely"));
        assert!(prompts[1].contains("Look again closely"));
    }

    #[tokio::test]
    async fn final_negative_verdict_skips_with_pass2_reason() {
        let dir = tempfile::tempdir().unwrap();
        let group = ShotGroup { items: vec![write_item(dir.path(), "a.jpg", 0)] };
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(OperationKind::TextExtraction, "grocery list")
                .reply(
                    OperationKind::Classification,
                    r#"{"is_recipe": false, "reason": "first impression"}"#,
                )
                .reply(
                    OperationKind::Classification,
                    r#"{"is_recipe": false, "reason": "it is a shopping list"}"#,
                ),
        );
        let outcome = pipeline(transport.clone(), vec![]).process_group(&group).await;

        match outcome {
            Outcome::Skipped { reason, .. } => assert_eq!(reason, "it is a shopping list"),
            other => panic!("expected skip, got {other:?}"),
        }
        assert!(!transport.calls().contains(&OperationKind::Structuring));
    }

    #[tokio::test]
    async fn classification_call_failure_counts_as_negative() {
        let dir = tempfile::tempdir().unwrap();
        let group = ShotGroup { items: vec![write_item(dir.path(), "a.jpg", 0)] };
        // Both classification passes fail at the transport level.
        let transport = Arc::new(
            ScriptedTransport::new().reply(OperationKind::TextExtraction, "some text"),
        );
        let outcome = pipeline(transport.clone(), vec![]).process_group(&group).await;

        match outcome {
            Outcome::Skipped { reason, .. } => {
                assert!(reason.contains("classification call failed"));
            }
            other => panic!("expected skip, got {other:?}"),
        }
        assert_eq!(transport.prompts_for(OperationKind::Classification).len(), 2);
    }

    #[tokio::test]
    async fn unparsable_structuring_reply_skips() {
        let dir = tempfile::tempdir().unwrap();
        let group = ShotGroup { items: vec![write_item(dir.path(), "a.jpg", 0)] };
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(OperationKind::TextExtraction, "recipe text")
                .reply(OperationKind::Classification, positive_verdict())
                .reply(OperationKind::Structuring, "I could not do that, sorry"),
        );
        let outcome = pipeline(transport, vec![]).process_group(&group).await;

        match outcome {
            Outcome::Skipped { reason, .. } => {
                assert_eq!(reason, "failed to structure recipe data");
            }
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn enrichment_overwrites_nutrition_fields() {
        let dir = tempfile::tempdir().unwrap();
        let group = ShotGroup { items: vec![write_item(dir.path(), "a.jpg", 0)] };
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(OperationKind::TextExtraction, "recipe text")
                .reply(OperationKind::Classification, positive_verdict())
                .reply(OperationKind::Structuring, &structured_reply())
                .reply(
                    OperationKind::Enrichment,
                    r#"{"calories": "320", "protein": "24g", "nutrition_score": "7/10"}"#,
                ),
        );
        let outcome = pipeline(transport.clone(), vec![]).process_group(&group).await;

        let record = match outcome {
            Outcome::Success(record) => record,
            other => panic!("expected success, got {other:?}"),
        };
        assert_eq!(record.get(RecipeField::Calories), "320");
        assert_eq!(record.get(RecipeField::Protein), "24g");
        assert_eq!(record.get(RecipeField::NutritionScore), "7/10");
        // The enrichment prompt used the declared servings count.
        let prompt = &transport.prompts_for(OperationKind::Enrichment)[0];
        assert!(prompt.contains("4 servings"));
    }

    #[tokio::test]
    async fn enrichment_failure_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let group = ShotGroup { items: vec![write_item(dir.path(), "a.jpg", 0)] };
        // No enrichment reply scripted: the call fails, the record survives.
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(OperationKind::TextExtraction, "recipe text")
                .reply(OperationKind::Classification, positive_verdict())
                .reply(OperationKind::Structuring, &structured_reply()),
        );
        let outcome = pipeline(transport, vec![]).process_group(&group).await;

        let record = match outcome {
            Outcome::Success(record) => record,
            other => panic!("expected success, got {other:?}"),
        };
        assert_eq!(record.get(RecipeField::Calories), "");
        assert_eq!(record.get(RecipeField::MainIngredient), "Chicken");
    }

    #[tokio::test]
    async fn empty_ingredients_skip_enrichment_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let group = ShotGroup { items: vec![write_item(dir.path(), "a.jpg", 0)] };
        let no_ingredients = serde_json::json!({"title": "Mystery Dish"}).to_string();
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(OperationKind::TextExtraction, "recipe text")
                .reply(OperationKind::Classification, positive_verdict())
                .reply(OperationKind::Structuring, &no_ingredients),
        );
        let outcome = pipeline(transport.clone(), vec![]).process_group(&group).await;

        assert!(matches!(outcome, Outcome::Success(_)));
        assert!(!transport.calls().contains(&OperationKind::Enrichment));
    }

    #[tokio::test]
    async fn post_processing_applies_tags_sanitization_and_title_case() {
        let dir = tempfile::tempdir().unwrap();
        let group = ShotGroup { items: vec![write_item(dir.path(), "a.jpg", 0)] };
        let messy = serde_json::json!({
            "title": "CHICKEN SOUP \u{1F372}",
            "description": "Grandma\u{2019}s  favourite \u{2013} \u{00BD} cup butter",
            "ingredients": "1 chicken",
            "tags": "soup",
            "rating": "5",
        })
        .to_string();
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(OperationKind::TextExtraction, "recipe text")
                .reply(OperationKind::Classification, positive_verdict())
                .reply(OperationKind::Structuring, &messy)
                .reply(OperationKind::Enrichment, r#"{"calories": "320"}"#),
        );
        let tags = vec!["family".to_string(), "box-2024".to_string()];
        let outcome = pipeline(transport, tags).process_group(&group).await;

        let record = match outcome {
            Outcome::Success(record) => record,
            other => panic!("expected success, got {other:?}"),
        };
        assert_eq!(record.get(RecipeField::Title), "Chicken Soup \u{1F372}");
        assert_eq!(
            record.get(RecipeField::Description),
            "Grandma's favourite - 1/2 cup butter"
        );
        assert_eq!(record.get(RecipeField::Tags), "soup, family, box-2024");
        assert_eq!(record.get(RecipeField::Rating), "", "rating is always cleared");
    }

    #[tokio::test]
    async fn batch_tags_fill_empty_tag_field() {
        let dir = tempfile::tempdir().unwrap();
        let group = ShotGroup { items: vec![write_item(dir.path(), "a.jpg", 0)] };
        let no_tags = serde_json::json!({"title": "Toast", "ingredients": "bread"}).to_string();
        let transport = Arc::new(
            ScriptedTransport::new()
                .reply(OperationKind::TextExtraction, "toast recipe")
                .reply(OperationKind::Classification, positive_verdict())
                .reply(OperationKind::Structuring, &no_tags)
                .reply(OperationKind::Enrichment, "{}"),
        );
        let outcome = pipeline(transport, vec!["breakfast".into()]).process_group(&group).await;

        let record = match outcome {
            Outcome::Success(record) => record,
            other => panic!("expected success, got {other:?}"),
        };
        assert_eq!(record.get(RecipeField::Tags), "breakfast");
    }

    #[test]
    fn servings_parsing_rules() {
        assert_eq!(parse_servings("6"), 6);
        assert_eq!(parse_servings("6 to 8"), 6);
        assert_eq!(parse_servings(" 12 muffins"), 12);
        assert_eq!(parse_servings(""), 4);
        assert_eq!(parse_servings("a few"), 4);
        assert_eq!(parse_servings("0"), 4);
    }
}
