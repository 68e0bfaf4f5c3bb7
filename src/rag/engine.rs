//! RAG answer generation.

use super::VectorSearch;
use crate::embedding::Embedder;
use crate::error::{OrdskifteError, Result};
use crate::openai::create_client;
use crate::store::{EpisodeStore, SegmentMatch};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answers questions about the show from retrieved transcript segments.
pub struct RagEngine {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    podcast_name: String,
    max_results: usize,
    search: VectorSearch,
}

impl RagEngine {
    /// Create a RAG engine over the given store and embedder.
    pub fn new(
        store: Arc<dyn EpisodeStore>,
        embedder: Arc<dyn Embedder>,
        model: &str,
        podcast_name: &str,
        max_results: usize,
    ) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
            podcast_name: podcast_name.to_string(),
            max_results,
            search: VectorSearch::new(store, embedder),
        }
    }

    /// Answer a question using retrieved transcript segments as context.
    ///
    /// Provider errors propagate to the caller unmodified; there is no
    /// retry and no fallback answer.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn answer(&self, question: &str) -> Result<String> {
        info!("Answering question");

        let matches = self
            .search
            .find_most_similar(question, self.max_results)
            .await?;
        debug!("Retrieved {} context segments", matches.len());

        let prompt = build_prompt(&self.podcast_name, &matches, question);

        let messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| OrdskifteError::Rag(e.to_string()))?
                .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| OrdskifteError::Rag(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| OrdskifteError::OpenAI(format!("Failed to generate answer: {}", e)))?;

        let answer = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .ok_or_else(|| OrdskifteError::Rag("Empty response from LLM".to_string()))?
            .clone();

        Ok(answer)
    }
}

/// Render retrieved segments into the fixed analysis prompt.
fn build_prompt(podcast_name: &str, matches: &[SegmentMatch], question: &str) -> String {
    let mut context = String::new();
    for segment_match in matches {
        context.push_str(&format!("Speaker: {}\n", segment_match.speaker));
        context.push_str(&format!("Text: {}\n", segment_match.text));
        context.push_str(&format!("Similarity: {:.4}\n", segment_match.similarity));
        context.push_str("--------------------------------\n");
    }

    format!(
        r#"# {} Podcast Analysis

You are an expert analyst of **{}**. Your task is to provide insightful answers based on the provided transcript segments.

## Instructions
- Use the relevant transcript segments below to answer the user's question
- If the segments aren't relevant to the question, clearly state this
- Maintain the conversational tone of the podcast in your analysis

## Available Transcript Segments
{}

## User Question
**{}**

## Your Response
Please provide a comprehensive answer based on the transcript segments and your knowledge of the podcast:"#,
        podcast_name, podcast_name, context, question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_context_and_question() {
        let matches = vec![
            SegmentMatch {
                speaker: "Astrid Berg".to_string(),
                text: "Taxes are the price of civilization.".to_string(),
                similarity: 0.91,
            },
            SegmentMatch {
                speaker: "Johan Lind".to_string(),
                text: "Or the price of bad bookkeeping.".to_string(),
                similarity: 0.84,
            },
        ];

        let prompt = build_prompt("The Long Argument", &matches, "What do they say about taxes?");

        assert!(prompt.contains("The Long Argument"));
        assert!(prompt.contains("Speaker: Astrid Berg"));
        assert!(prompt.contains("Similarity: 0.9100"));
        assert!(prompt.contains("What do they say about taxes?"));
        // Both segments appear, in retrieval order.
        let first = prompt.find("Astrid Berg").unwrap();
        let second = prompt.find("Johan Lind").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_prompt_with_no_matches_still_asks_question() {
        let prompt = build_prompt("Show", &[], "Anything?");
        assert!(prompt.contains("Anything?"));
        assert!(prompt.contains("## Available Transcript Segments"));
    }
}
