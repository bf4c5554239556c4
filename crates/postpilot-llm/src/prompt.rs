//! Prompt assembly.
//!
//! Builds the system and user prompts for post generation: persona and
//! tone rules on the system side; the selected context timeline, the new
//! journal entry, and the generation instruction on the user side.

use chrono::SecondsFormat;
use postpilot_models::{Audience, ContextItem, InteractionKind, Tone};

/// Default persona line at the top of every system prompt.
const DEFAULT_PERSONA: &str =
    "You ghost-write Facebook posts for a software developer, turning their \
     markdown work journals into engaging posts written in their voice.";

/// Everything the builder needs for one generation.
#[derive(Debug, Clone)]
pub struct PromptInput<'a> {
    /// Title of the journal entry.
    pub title: &'a str,

    /// Markdown body of the journal entry.
    pub body: &'a str,

    /// Tone for the generated post.
    pub tone: Tone,

    /// Audience for the generated post.
    pub audience: Audience,

    /// 1-based position within the active series, if one is running.
    pub series_position: Option<u32>,

    /// Feedback from a rejected draft, when regenerating.
    pub feedback: Option<&'a str>,
}

/// Builds LLM prompts from selected context and the current journal entry.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: String,
}

impl PromptBuilder {
    /// Create a builder with the default persona.
    pub fn new() -> Self {
        Self {
            persona: DEFAULT_PERSONA.to_string(),
        }
    }

    /// Override the persona line.
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    /// The system prompt: persona, tone rules, audience guidance.
    pub fn system_prompt(&self, tone: Tone, audience: Audience) -> String {
        format!(
            "{}\n\nTone: {}\nAudience: {}\n\nRules:\n\
             - Write a single post, no headline, no markdown syntax.\n\
             - Keep it under 150 words.\n\
             - Never invent events that are not in the journal.\n\
             - End with at most three hashtags.",
            self.persona,
            tone_rules(tone),
            audience_guidance(audience),
        )
    }

    /// The user prompt: context timeline, journal entry, instruction.
    pub fn user_prompt(&self, context: &[ContextItem], input: &PromptInput<'_>) -> String {
        let mut prompt = String::new();

        if !context.is_empty() {
            prompt.push_str("Recent history, oldest first:\n");
            for item in context {
                prompt.push_str(&render_item(item));
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        prompt.push_str(&format!(
            "New journal entry titled \"{}\":\n{}\n\n",
            input.title, input.body
        ));

        match input.series_position {
            Some(position) if position > 1 => {
                prompt.push_str(&format!(
                    "This is post {} of an ongoing series; continue the \
                     thread from the earlier posts without repeating them.\n",
                    position
                ));
            }
            Some(_) => {
                prompt.push_str(
                    "This starts a new series; set up a thread the next posts can continue.\n",
                );
            }
            None => {}
        }

        if let Some(feedback) = input.feedback {
            prompt.push_str(&format!(
                "The previous draft was rejected: {}. Write a fresh take.\n",
                feedback
            ));
        }

        prompt.push_str("Write the post now.");
        prompt
    }
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// One timeline line per context item, full content, no truncation.
fn render_item(item: &ContextItem) -> String {
    let stamp = item.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
    let kind = match item.kind {
        InteractionKind::Upload => "journal",
        InteractionKind::Text => "message",
        InteractionKind::Button => "action",
        InteractionKind::Feedback => "feedback",
    };
    format!("- [{stamp}] {kind}: {}", item.content)
}

fn tone_rules(tone: Tone) -> &'static str {
    match tone {
        Tone::Casual => "relaxed and conversational, like telling a friend what you built",
        Tone::Professional => "polished and confident, suitable for a company page",
        Tone::Technical => "precise and concrete, naming the tools and tradeoffs",
        Tone::Upbeat => "short, energetic, celebrating the win",
    }
}

fn audience_guidance(audience: Audience) -> &'static str {
    match audience {
        Audience::Developers => "fellow developers; jargon is fine, hype is not",
        Audience::General => "non-technical readers; explain what it does, not how",
        Audience::Business => "founders and managers; lead with the outcome and impact",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn input<'a>() -> PromptInput<'a> {
        PromptInput {
            title: "Parser week",
            body: "Rewrote the tokenizer. #rust",
            tone: Tone::Casual,
            audience: Audience::Developers,
            series_position: None,
            feedback: None,
        }
    }

    #[test]
    fn test_system_prompt_mentions_tone_and_audience() {
        let builder = PromptBuilder::new();
        let system = builder.system_prompt(Tone::Technical, Audience::Business);
        assert!(system.contains("naming the tools"));
        assert!(system.contains("founders and managers"));
    }

    #[test]
    fn test_user_prompt_without_context_has_no_timeline() {
        let prompt = PromptBuilder::new().user_prompt(&[], &input());
        assert!(!prompt.contains("Recent history"));
        assert!(prompt.contains("Parser week"));
        assert!(prompt.ends_with("Write the post now."));
    }

    #[test]
    fn test_user_prompt_renders_timeline_in_given_order() {
        let t1 = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap();
        let context = vec![
            ContextItem::at(t1, InteractionKind::Upload, "day one"),
            ContextItem::at(t2, InteractionKind::Feedback, "loved it"),
        ];

        let prompt = PromptBuilder::new().user_prompt(&context, &input());
        let first = prompt.find("day one").unwrap();
        let second = prompt.find("loved it").unwrap();
        assert!(first < second);
        assert!(prompt.contains("journal: day one"));
        assert!(prompt.contains("feedback: loved it"));
    }

    #[test]
    fn test_series_blocks() {
        let mut with_series = input();
        with_series.series_position = Some(1);
        let prompt = PromptBuilder::new().user_prompt(&[], &with_series);
        assert!(prompt.contains("starts a new series"));

        with_series.series_position = Some(3);
        let prompt = PromptBuilder::new().user_prompt(&[], &with_series);
        assert!(prompt.contains("post 3 of an ongoing series"));
    }

    #[test]
    fn test_feedback_block() {
        let mut with_feedback = input();
        with_feedback.feedback = Some("too long");
        let prompt = PromptBuilder::new().user_prompt(&[], &with_feedback);
        assert!(prompt.contains("rejected: too long"));
    }

    #[test]
    fn test_custom_persona() {
        let builder = PromptBuilder::new().with_persona("You are a pirate.");
        let system = builder.system_prompt(Tone::Casual, Audience::General);
        assert!(system.starts_with("You are a pirate."));
    }
}
