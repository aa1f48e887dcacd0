//! Two-stage orchestration: abstract generation, then styled summarization.
//!
//! Stage 1 asks the model for a detailed abstract of a paper title. Stage 2
//! rewrites that abstract under an explicit [`SummaryStyle`] and
//! [`SummaryLength`], and only runs when Stage 1 produced text. The
//! orchestrator detects failure solely by empty-string results — the client
//! has already logged whatever went wrong underneath.

use crate::{GeminiClient, TaskKind};
use thiserror::Error;
use tracing::info;

/// Token budget for Stage 1. Generous so the abstract is never clipped
/// mid-sentence.
pub const ABSTRACT_MAX_TOKENS: u32 = 600;

/// Target word count embedded in the Stage 1 prompt.
pub const ABSTRACT_TARGET_WORDS: u32 = 250;

const ABSTRACT_SYSTEM_INSTRUCTION: &str = "You are an academic writer and expert in AI. \
    Your task is to generate a detailed, high-quality, and professionally structured abstract \
    for a machine learning research paper. The abstract must include the motivation, method, \
    results, and conclusion.";

const SUMMARY_SYSTEM_INSTRUCTION: &str = "You are a skilled explainer. Your task is to \
    summarize a complex research paper abstract. You must adhere strictly to the requested \
    style and length. Do not add any introductory or concluding phrases outside of the \
    summary content.";

// ── Style and length ───────────────────────────────────────────────

/// Explanation style for the Stage 2 summary. The display label is embedded
/// verbatim in the prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryStyle {
    BeginnerFriendly,
    Technical,
    CodeOriented,
    Mathematical,
    HistoricalContext,
}

impl SummaryStyle {
    pub const ALL: [SummaryStyle; 5] = [
        SummaryStyle::BeginnerFriendly,
        SummaryStyle::Technical,
        SummaryStyle::CodeOriented,
        SummaryStyle::Mathematical,
        SummaryStyle::HistoricalContext,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SummaryStyle::BeginnerFriendly => "Beginner-Friendly",
            SummaryStyle::Technical => "Technical",
            SummaryStyle::CodeOriented => "Code-Oriented",
            SummaryStyle::Mathematical => "Mathematical",
            SummaryStyle::HistoricalContext => "Historical Context",
        }
    }
}

impl std::fmt::Display for SummaryStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for SummaryStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "beginner-friendly" | "beginner" => Ok(SummaryStyle::BeginnerFriendly),
            "technical" => Ok(SummaryStyle::Technical),
            "code-oriented" | "code" => Ok(SummaryStyle::CodeOriented),
            "mathematical" | "math" => Ok(SummaryStyle::Mathematical),
            "historical context" | "historical" => Ok(SummaryStyle::HistoricalContext),
            other => Err(format!(
                "unrecognized summary style {other:?}; expected one of: \
                 beginner-friendly, technical, code-oriented, mathematical, historical"
            )),
        }
    }
}

/// Requested summary length. Each variant maps to a fixed output-token
/// ceiling; there is no fallback for unrecognized labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryLength {
    Short,
    Medium,
    Long,
}

impl SummaryLength {
    pub const ALL: [SummaryLength; 3] =
        [SummaryLength::Short, SummaryLength::Medium, SummaryLength::Long];

    /// The label embedded verbatim in the Stage 2 prompt.
    pub fn label(self) -> &'static str {
        match self {
            SummaryLength::Short => "Short (1-2 paragraphs)",
            SummaryLength::Medium => "Medium (3-5 paragraphs)",
            SummaryLength::Long => "Long (detailed explanation)",
        }
    }

    /// Maximum output tokens for a summary of this length.
    pub fn max_output_tokens(self) -> u32 {
        match self {
            SummaryLength::Short => 150,
            SummaryLength::Medium => 300,
            SummaryLength::Long => 450,
        }
    }
}

impl std::fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for SummaryLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "short" | "short (1-2 paragraphs)" => Ok(SummaryLength::Short),
            "medium" | "medium (3-5 paragraphs)" => Ok(SummaryLength::Medium),
            "long" | "long (detailed explanation)" => Ok(SummaryLength::Long),
            other => Err(format!(
                "unrecognized summary length {other:?}; expected one of: short, medium, long"
            )),
        }
    }
}

// ── Generator seam ─────────────────────────────────────────────────

/// The generation capability the pipeline depends on. [`GeminiClient`]
/// implements it; tests substitute a scripted generator to assert call
/// counts and arguments.
pub trait TextGenerator {
    /// Obtain generated text, or `""` on failure. See
    /// [`GeminiClient::call`] for the contract.
    fn call(
        &self,
        user_prompt: &str,
        system_instruction: &str,
        max_output_tokens: u32,
        task: TaskKind,
    ) -> impl std::future::Future<Output = String> + Send;
}

impl TextGenerator for GeminiClient {
    async fn call(
        &self,
        user_prompt: &str,
        system_instruction: &str,
        max_output_tokens: u32,
        task: TaskKind,
    ) -> String {
        GeminiClient::call(self, user_prompt, system_instruction, max_output_tokens, task).await
    }
}

// ── Pipeline ───────────────────────────────────────────────────────

/// Result of a full pipeline run. Both fields are non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineOutput {
    /// The Stage 1 abstract, raw material for the summary.
    pub abstract_text: String,
    /// The Stage 2 styled summary.
    pub summary: String,
}

/// Which stage produced no content.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Stage 1 produced no content")]
    AbstractEmpty,
    /// Stage 2 failed, but the abstract was produced and is still useful —
    /// hosts should show it even though styling failed.
    #[error("Stage 2 produced no content")]
    SummaryEmpty { abstract_text: String },
}

/// Sequences the two generation stages and gates Stage 2 on Stage 1.
pub struct Pipeline<G: TextGenerator> {
    generator: G,
}

impl<G: TextGenerator> Pipeline<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Stage 1: generate a detailed abstract for the given paper title.
    /// Returns the generator's result unmodified (`""` on failure).
    pub async fn generate_abstract(&self, title: &str) -> String {
        let user_prompt = format!(
            "Write a detailed, {ABSTRACT_TARGET_WORDS}-word abstract for a research paper \
             titled '{title}'."
        );
        self.generator
            .call(
                &user_prompt,
                ABSTRACT_SYSTEM_INSTRUCTION,
                ABSTRACT_MAX_TOKENS,
                TaskKind::Generation,
            )
            .await
    }

    /// Stage 2: summarize `content` under the given style and length.
    /// Returns the generator's result unmodified (`""` on failure).
    pub async fn summarize(
        &self,
        content: &str,
        title: &str,
        style: SummaryStyle,
        length: SummaryLength,
    ) -> String {
        let user_prompt = format!(
            "Summarize the following research paper abstract for the paper titled '{title}'. \
             The explanation should be written in a **{style}** style, and the summary length \
             must be **{length}**, focusing on core findings and implications. \
             Abstract to summarize: \n\n{content}"
        );
        self.generator
            .call(
                &user_prompt,
                SUMMARY_SYSTEM_INSTRUCTION,
                length.max_output_tokens(),
                TaskKind::Summarization,
            )
            .await
    }

    /// Run Stage 1 then Stage 2. Stage 2 never runs when Stage 1 came back
    /// empty; a Stage 2 failure still surfaces the abstract.
    pub async fn run(
        &self,
        title: &str,
        style: SummaryStyle,
        length: SummaryLength,
    ) -> Result<PipelineOutput, PipelineError> {
        info!("Stage 1: generating abstract for {title:?}");
        let abstract_text = self.generate_abstract(title).await;
        if abstract_text.is_empty() {
            return Err(PipelineError::AbstractEmpty);
        }

        info!("Stage 2: summarizing ({style}, {length})");
        let summary = self.summarize(&abstract_text, title, style, length).await;
        if summary.is_empty() {
            return Err(PipelineError::SummaryEmpty { abstract_text });
        }

        Ok(PipelineOutput {
            abstract_text,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct RecordedCall {
        user_prompt: String,
        system_instruction: String,
        max_output_tokens: u32,
        task: TaskKind,
    }

    /// Returns scripted replies in order and records every call.
    struct ScriptedGenerator {
        replies: Mutex<VecDeque<String>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedGenerator {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn recorded(&self) -> std::sync::MutexGuard<'_, Vec<RecordedCall>> {
            self.calls.lock().unwrap()
        }
    }

    impl TextGenerator for ScriptedGenerator {
        async fn call(
            &self,
            user_prompt: &str,
            system_instruction: &str,
            max_output_tokens: u32,
            task: TaskKind,
        ) -> String {
            self.calls.lock().unwrap().push(RecordedCall {
                user_prompt: user_prompt.to_string(),
                system_instruction: system_instruction.to_string(),
                max_output_tokens,
                task,
            });
            self.replies.lock().unwrap().pop_front().unwrap_or_default()
        }
    }

    #[tokio::test]
    async fn stage_two_receives_the_exact_abstract() {
        let pipeline = Pipeline::new(ScriptedGenerator::new(&[
            "A dense abstract about transformers.",
            "A short summary.",
        ]));

        let output = pipeline
            .run("Attention Is All You Need", SummaryStyle::Technical, SummaryLength::Short)
            .await
            .unwrap();

        let calls = pipeline.generator.recorded();
        assert_eq!(calls.len(), 2);
        assert!(
            calls[1]
                .user_prompt
                .contains("A dense abstract about transformers."),
            "stage 2 prompt must embed the stage 1 abstract verbatim"
        );
        assert_eq!(output.abstract_text, "A dense abstract about transformers.");
        assert_eq!(output.summary, "A short summary.");
    }

    #[tokio::test]
    async fn empty_abstract_halts_before_stage_two() {
        let pipeline = Pipeline::new(ScriptedGenerator::new(&["", "never used"]));

        let err = pipeline
            .run("Some Title", SummaryStyle::Technical, SummaryLength::Short)
            .await
            .unwrap_err();

        assert_eq!(err, PipelineError::AbstractEmpty);
        assert_eq!(err.to_string(), "Stage 1 produced no content");
        assert_eq!(pipeline.generator.recorded().len(), 1);
    }

    #[tokio::test]
    async fn empty_summary_still_exposes_the_abstract() {
        let pipeline = Pipeline::new(ScriptedGenerator::new(&["The abstract.", ""]));

        let err = pipeline
            .run("Some Title", SummaryStyle::Mathematical, SummaryLength::Long)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Stage 2 produced no content");
        assert_eq!(
            err,
            PipelineError::SummaryEmpty {
                abstract_text: "The abstract.".to_string()
            }
        );
        assert_eq!(pipeline.generator.recorded().len(), 2);
    }

    #[tokio::test]
    async fn end_to_end_budgets_and_labels() {
        let pipeline = Pipeline::new(ScriptedGenerator::new(&["An abstract.", "A summary."]));

        pipeline
            .run("Attention Is All You Need", SummaryStyle::Technical, SummaryLength::Short)
            .await
            .unwrap();

        let calls = pipeline.generator.recorded();

        assert_eq!(calls[0].max_output_tokens, 600);
        assert_eq!(calls[0].task, TaskKind::Generation);
        assert!(calls[0].user_prompt.contains("Attention Is All You Need"));
        assert!(calls[0].user_prompt.contains("250-word"));
        assert!(calls[0].system_instruction.contains("motivation"));
        assert!(calls[0].system_instruction.contains("conclusion"));

        assert_eq!(calls[1].max_output_tokens, 150);
        assert_eq!(calls[1].task, TaskKind::Summarization);
        assert!(calls[1].user_prompt.contains("**Technical**"));
        assert!(calls[1].user_prompt.contains("**Short (1-2 paragraphs)**"));
    }

    #[tokio::test]
    async fn summarize_alone_uses_the_length_budget() {
        let generator = ScriptedGenerator::new(&["ok"]);
        let pipeline = Pipeline::new(generator);

        pipeline
            .summarize("body", "Title", SummaryStyle::BeginnerFriendly, SummaryLength::Medium)
            .await;

        assert_eq!(pipeline.generator.recorded()[0].max_output_tokens, 300);
    }

    #[test]
    fn token_budget_mapping_is_exact_and_total() {
        assert_eq!(SummaryLength::Short.max_output_tokens(), 150);
        assert_eq!(SummaryLength::Medium.max_output_tokens(), 300);
        assert_eq!(SummaryLength::Long.max_output_tokens(), 450);
    }

    #[test]
    fn unrecognized_length_fails_fast() {
        assert!("Tiny".parse::<SummaryLength>().is_err());
        assert!("".parse::<SummaryLength>().is_err());
        assert_eq!(
            "Short (1-2 paragraphs)".parse::<SummaryLength>().unwrap(),
            SummaryLength::Short
        );
        assert_eq!("long".parse::<SummaryLength>().unwrap(), SummaryLength::Long);
    }

    #[test]
    fn style_labels_round_trip() {
        for style in SummaryStyle::ALL {
            assert_eq!(style.label().parse::<SummaryStyle>().unwrap(), style);
        }
        assert!("poetic".parse::<SummaryStyle>().is_err());
    }
}
