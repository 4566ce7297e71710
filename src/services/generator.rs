use std::sync::Arc;

use crate::models::Flashcard;
use crate::services::error::GenerationError;
use crate::services::llm::CompletionClient;
use crate::services::parser::parse_flashcards;
use crate::utils::text::{char_len, normalize};

pub const FLASHCARD_SYSTEM_PROMPT: &str = r#"You are an expert educator creating Anki-style flashcards.

RULES:
- Extract ALL important concepts, facts, definitions, and relationships
- Each front tests exactly ONE discrete piece of knowledge
- Fronts should be specific questions, not vague topics
- Backs should be concise (1-3 sentences max) but complete
- Aim for 1 card per key concept, favor coverage over brevity
- For definitions: "What is X?" -> clear definition
- For processes: "How does X work?" -> step or mechanism
- For relationships: "What is the relationship between X and Y?" -> clear explanation
- For facts/numbers: test the specific fact directly
- Avoid cards that are too broad or require essay-length answers

Return ONLY a valid JSON array. No markdown, no explanation, no other text.
Format: [{"front": "question", "back": "answer"}, ...]"#;

const USER_PREAMBLE: &str = "Create comprehensive flashcards from this content:";

pub struct FlashcardGenerator {
    client: Arc<dyn CompletionClient>,
}

impl FlashcardGenerator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        FlashcardGenerator { client }
    }

    pub async fn generate(&self, text: &str) -> Result<Vec<Flashcard>, GenerationError> {
        let user = format!("{USER_PREAMBLE}\n\n{}", normalize(text));
        let raw = self.client.complete(FLASHCARD_SYSTEM_PROMPT, &user).await?;

        let parsed = parse_flashcards(&raw)?;
        let total = parsed.len();
        let cards: Vec<Flashcard> = parsed
            .into_iter()
            .filter(|card| !card.front.trim().is_empty() && !card.back.trim().is_empty())
            .collect();

        if cards.is_empty() {
            return Err(GenerationError::Parse);
        }
        if cards.len() < total {
            tracing::warn!(dropped = total - cards.len(), "Dropped blank flashcards");
        }

        tracing::info!(cards = cards.len(), input_chars = char_len(text), "Generated flashcards");
        Ok(cards)
    }
}
