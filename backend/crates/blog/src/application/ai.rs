//! AI Writing Assistant
//!
//! Drafts a post from a topic, or rewrites an existing draft. Replies are
//! expected as Markdown whose first `# ` heading is the title.

use std::sync::Arc;

use kernel::error::app_error::AppError;
use platform::genai::TextGenerator;

use crate::domain::value_object::{
    post_content::PostContent, tags::MAX_TAGS, title::TITLE_MAX_CHARS,
};
use crate::error::{BlogError, BlogResult};

pub const MAX_TOPIC_CHARS: usize = 200;
pub const MAX_INSTRUCTION_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Informative,
    Casual,
    Professional,
    Technical,
    Persuasive,
}

impl Tone {
    fn describe(&self) -> &'static str {
        match self {
            Tone::Informative => "clear and informative",
            Tone::Casual => "friendly and conversational",
            Tone::Professional => "polished and professional",
            Tone::Technical => "precise and technical, with code where it helps",
            Tone::Persuasive => "persuasive and engaging",
        }
    }
}

pub struct GenerateInput {
    pub topic: String,
    pub keywords: Vec<String>,
    pub tone: Tone,
}

pub struct ImproveInput {
    pub title: Option<String>,
    pub content: String,
    pub instructions: Option<String>,
}

/// A generated post, not yet saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub content: String,
}

pub struct AiWriterUseCase {
    generator: Arc<TextGenerator>,
}

impl AiWriterUseCase {
    pub fn new(generator: Arc<TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn generate(&self, input: GenerateInput) -> BlogResult<Draft> {
        let topic = input.topic.trim();
        if topic.is_empty() {
            return Err(AppError::bad_request("Topic cannot be empty").into());
        }
        if topic.chars().count() > MAX_TOPIC_CHARS {
            return Err(AppError::bad_request(format!(
                "Topic must be at most {MAX_TOPIC_CHARS} characters"
            ))
            .into());
        }

        let keywords: Vec<&str> = input
            .keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .take(MAX_TAGS)
            .collect();

        let mut prompt = format!(
            "Write a blog post in Markdown about: {topic}\n\
             Tone: {tone}.\n\
             Start with a single '# ' heading of at most {TITLE_MAX_CHARS} characters as the title, \
             then the body with short sections.\n",
            tone = input.tone.describe(),
        );
        if !keywords.is_empty() {
            prompt.push_str(&format!("Work in these keywords: {}.\n", keywords.join(", ")));
        }

        let reply = self.generator.generate(&prompt).await?;
        let draft = split_draft(&reply, topic)?;

        tracing::info!(topic = %topic, chars = draft.content.len(), "Draft generated");
        Ok(draft)
    }

    pub async fn improve(&self, input: ImproveInput) -> BlogResult<Draft> {
        let content = PostContent::new(input.content)?;
        let instructions = input
            .instructions
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty());
        if instructions
            .as_ref()
            .is_some_and(|i| i.chars().count() > MAX_INSTRUCTION_CHARS)
        {
            return Err(AppError::bad_request(format!(
                "Instructions must be at most {MAX_INSTRUCTION_CHARS} characters"
            ))
            .into());
        }

        let title = input
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let mut prompt = String::from(
            "Improve the following blog post. Fix grammar, tighten wording and keep the \
             author's meaning and Markdown structure. Reply with the full post, starting \
             with a single '# ' heading as the title.\n",
        );
        if let Some(instructions) = &instructions {
            prompt.push_str(&format!("Additional instructions: {instructions}\n"));
        }
        prompt.push_str("\n---\n");
        if let Some(title) = &title {
            prompt.push_str(&format!("# {title}\n\n"));
        }
        prompt.push_str(content.as_str());

        let reply = self.generator.generate(&prompt).await?;
        let fallback = title.as_deref().unwrap_or("Untitled");
        let draft = split_draft(&reply, fallback)?;

        tracing::info!(chars = draft.content.len(), "Draft improved");
        Ok(draft)
    }
}

/// Take the first `# ` heading as the title; the rest is the body
fn split_draft(reply: &str, fallback_title: &str) -> BlogResult<Draft> {
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(BlogError::Generation("empty reply".to_string()));
    }

    let mut title = None;
    let mut body = Vec::new();
    for line in reply.lines() {
        match line.strip_prefix("# ") {
            Some(heading) if title.is_none() => title = Some(heading.trim().to_string()),
            _ => body.push(line),
        }
    }

    let title: String = title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| fallback_title.to_string())
        .chars()
        .take(TITLE_MAX_CHARS)
        .collect();
    let content = body.join("\n").trim().to_string();
    if content.is_empty() {
        return Err(BlogError::Generation("reply has no body".to_string()));
    }

    Ok(Draft { title, content })
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::genai::ScriptedGenerator;

    #[test]
    fn test_split_draft() {
        let draft = split_draft("# Ownership\n\nBorrowing rules.\n\n## More\nText", "x").unwrap();
        assert_eq!(draft.title, "Ownership");
        assert_eq!(draft.content, "Borrowing rules.\n\n## More\nText");
    }

    #[test]
    fn test_split_draft_without_heading() {
        let draft = split_draft("Just a body", "Fallback").unwrap();
        assert_eq!(draft.title, "Fallback");
        assert_eq!(draft.content, "Just a body");
    }

    #[test]
    fn test_split_draft_rejects_heading_only() {
        assert!(matches!(
            split_draft("# Title only", "x"),
            Err(BlogError::Generation(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_prompt_carries_inputs() {
        let scripted = ScriptedGenerator::new("# Async Rust\n\nFutures are lazy.");
        let writer = AiWriterUseCase::new(Arc::new(TextGenerator::Scripted(scripted.clone())));

        let draft = writer
            .generate(GenerateInput {
                topic: "async rust".into(),
                keywords: vec!["tokio".into(), " ".into()],
                tone: Tone::Technical,
            })
            .await
            .unwrap();

        assert_eq!(draft.title, "Async Rust");
        let prompt = &scripted.prompts()[0];
        assert!(prompt.contains("about: async rust"));
        assert!(prompt.contains("keywords: tokio."));
        assert!(prompt.contains("technical"));
    }

    #[tokio::test]
    async fn test_generate_requires_topic() {
        let writer = AiWriterUseCase::new(Arc::new(TextGenerator::Scripted(
            ScriptedGenerator::new("unused"),
        )));
        let err = writer
            .generate(GenerateInput {
                topic: "  ".into(),
                keywords: vec![],
                tone: Tone::default(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_improve_keeps_title_fallback() {
        let scripted = ScriptedGenerator::new("Cleaner text.");
        let writer = AiWriterUseCase::new(Arc::new(TextGenerator::Scripted(scripted.clone())));

        let draft = writer
            .improve(ImproveInput {
                title: Some("My Post".into()),
                content: "messy text".into(),
                instructions: Some("shorter".into()),
            })
            .await
            .unwrap();

        assert_eq!(draft, Draft {
            title: "My Post".into(),
            content: "Cleaner text.".into(),
        });
        let prompt = &scripted.prompts()[0];
        assert!(prompt.contains("Additional instructions: shorter"));
        assert!(prompt.ends_with("# My Post\n\nmessy text"));
    }
}
