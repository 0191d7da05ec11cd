use crate::chat::{ChatMessage, ChatModel};
use crate::citation::format_source;
use crate::traits::VectorIndex;
use crate::{Answer, QueryError, SearchHit};
use std::sync::Arc;

pub const DEFAULT_TOP_K: usize = 3;

const PERSONA: &str = "You are an assistant specialised in analysing financial reports (URD).";
const CONTEXT_INSTRUCTION: &str = "Use ONLY the following context. Context: {context}";

/// The three-turn prompt sent for every question.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    persona: String,
    context_instruction: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            persona: PERSONA.to_string(),
            context_instruction: CONTEXT_INSTRUCTION.to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn render(&self, context: &str, question: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.persona.clone()),
            ChatMessage::system(self.context_instruction.replace("{context}", context)),
            ChatMessage::user(question),
        ]
    }
}

/// Page texts joined by a blank line, in retrieval order.
pub fn build_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| hit.unit.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub struct QueryService {
    index: Arc<dyn VectorIndex>,
    chat: Arc<dyn ChatModel>,
    prompt: PromptTemplate,
    top_k: usize,
}

impl QueryService {
    pub fn new(index: Arc<dyn VectorIndex>, chat: Arc<dyn ChatModel>) -> Self {
        Self {
            index,
            chat,
            prompt: PromptTemplate::default(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieves the nearest pages, asks the model once, and cites every
    /// retrieved page in retrieval order.
    pub async fn answer(&self, question: &str) -> Result<Answer, QueryError> {
        if question.trim().is_empty() {
            return Err(QueryError::EmptyQuestion);
        }

        let hits = self.index.similarity_search(question, self.top_k).await?;
        let sources = hits
            .iter()
            .map(|hit| format_source(&hit.unit.metadata))
            .collect::<Result<Vec<_>, _>>()?;

        let context = build_context(&hits);
        let messages = self.prompt.render(&context, question);
        tracing::debug!(retrieved = hits.len(), context_chars = context.len(), "asking chat model");

        let answer = self.chat.complete(&messages).await?;
        Ok(Answer { answer, sources })
    }
}
