//! Gemini `generateContent` request body, assembled by hand.

use crate::scanner::escape;

/// Sampling parameters sent with every request. Not caller-controlled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

pub const GENERATION_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.7,
    max_output_tokens: 2048,
    top_p: 0.95,
    top_k: 40,
};

/// Subject-scoped prompt plus generation settings for one upstream call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    prompt: String,
    generation: GenerationConfig,
}

impl UpstreamRequest {
    pub fn build(user_question: &str, subject: &str) -> Self {
        let prompt = format!(
            "You are an AI tutor specializing in {}. Provide clear, educational explanations. \
             Keep responses concise and helpful.\n\nQuestion: {}",
            subject, user_question
        );
        Self {
            prompt,
            generation: GENERATION_CONFIG,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn generation(&self) -> GenerationConfig {
        self.generation
    }

    /// Serialized request body.
    pub fn to_json(&self) -> String {
        let g = &self.generation;
        format!(
            "{{\"contents\":[{{\"parts\":[{{\"text\":\"{}\"}}]}}],\
             \"generationConfig\":{{\"temperature\":{},\"maxOutputTokens\":{},\"topP\":{},\"topK\":{}}}}}",
            escape(&self.prompt),
            g.temperature,
            g.max_output_tokens,
            g.top_p,
            g.top_k
        )
    }
}
