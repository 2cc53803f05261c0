use std::sync::Arc;

use async_trait::async_trait;
use lectern::catalog::{ChapterDraft, LectureDraft};
use lectern_types::{Result, anyhow};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outline produced by the text-generation collaborator. Deliberately a
/// draft without prices or ids: the educator edits it before saving.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseOutline {
    pub title: String,
    pub chapters: Vec<ChapterDraft>,
}

#[async_trait]
pub trait OutlineGenerator: Send + Sync {
    async fn generate(&self, topic: &str) -> Result<CourseOutline>;
}

pub type DynOutlineGenerator = Arc<dyn OutlineGenerator>;

/// Google generative-text API client. Failures here are never fatal to
/// course authoring, the frontend falls back to manual input.
pub struct GeminiOutlineGenerator {
    api_key: String,
    model: String,
    client: lectern_types::reqwest::Client,
}

impl GeminiOutlineGenerator {
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());
        Some(Self {
            api_key,
            model,
            client: lectern_types::reqwest::Client::new(),
        })
    }

    fn prompt(topic: &str) -> String {
        format!(
            "Generate a detailed course outline for \"{topic}\". \
             Return ONLY a valid JSON object, no markdown fences. The structure must be: \
             {{\"title\": \"Detailed Title\", \"chapters\": [{{\"title\": \"Chapter Name\", \
             \"lectures\": [{{\"title\": \"Lecture Name\", \"durationMinutes\": 10, \
             \"videoUrl\": \"\", \"isPreviewFree\": false}}]}}]}}. \
             Generate at least 3 chapters with 2-3 lectures each."
        )
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: String,
}

#[async_trait]
impl OutlineGenerator for GeminiOutlineGenerator {
    async fn generate(&self, topic: &str) -> Result<CourseOutline> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let body = lectern_types::json::json!({
            "contents": [{ "parts": [{ "text": Self::prompt(topic) }] }]
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("Text generation request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Text generation error {}: {}", status, body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Invalid text generation response: {}", e))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| anyhow!("Text generation returned no candidates"))?;

        parse_outline(text)
    }
}

/// The model is told not to fence its output but sometimes does anyway.
pub fn parse_outline(text: &str) -> Result<CourseOutline> {
    let clean = text.replace("```json", "").replace("```", "");
    let outline: CourseOutline = lectern_types::json::from_str(clean.trim())
        .map_err(|e| anyhow!("Generated outline is not valid JSON: {}", e))?;
    Ok(outline)
}

/// Deterministic outline served when no generator is configured, so the
/// authoring flow stays usable in development.
pub fn sample_outline(topic: &str) -> CourseOutline {
    CourseOutline {
        title: format!("{topic} Masterclass"),
        chapters: vec![
            ChapterDraft {
                title: "Introduction".to_string(),
                lectures: vec![
                    LectureDraft {
                        title: "Course Overview".to_string(),
                        duration_minutes: 5.0,
                        video_url: String::new(),
                        is_preview_free: true,
                    },
                    LectureDraft {
                        title: "Prerequisites".to_string(),
                        duration_minutes: 10.0,
                        video_url: String::new(),
                        is_preview_free: true,
                    },
                ],
            },
            ChapterDraft {
                title: "Core Concepts".to_string(),
                lectures: vec![LectureDraft {
                    title: "Getting Started".to_string(),
                    duration_minutes: 15.0,
                    video_url: String::new(),
                    is_preview_free: false,
                }],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_model_output() {
        let raw = "```json\n{\"title\": \"Rust Masterclass\", \"chapters\": [{\"title\": \
                   \"Basics\", \"lectures\": [{\"title\": \"Hello\", \"durationMinutes\": 5, \
                   \"videoUrl\": \"\", \"isPreviewFree\": true}]}]}\n```";
        let outline = parse_outline(raw).unwrap();
        assert_eq!(outline.title, "Rust Masterclass");
        assert_eq!(outline.chapters.len(), 1);
        assert!(outline.chapters[0].lectures[0].is_preview_free);
    }

    #[test]
    fn rejects_non_json_output() {
        assert!(parse_outline("Sorry, I cannot help with that.").is_err());
    }

    #[test]
    fn sample_outline_is_structurally_valid() {
        let outline = sample_outline("Rust");
        assert!(!outline.chapters.is_empty());
        assert!(outline.chapters.iter().all(|c| !c.lectures.is_empty()));
    }
}
