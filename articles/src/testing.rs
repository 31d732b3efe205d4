//! Deterministic stand-ins for the model, the search provider and the terminal.

use crate::console::{Console, ProgressView};
use crate::search::{SearchCapability, SearchResult, Source};
use crate::{Error, Result};
use agent::llm::{CompletionRequest, CompletionResponse, LLM, Message};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Replays scripted completions in order and records every request.
pub struct ScriptedLLM {
    responses: Mutex<VecDeque<agent::Result<CompletionResponse>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLLM {
    pub fn new(responses: Vec<agent::Result<CompletionResponse>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(texts: &[&str]) -> Arc<Self> {
        Self::new(texts.iter().map(|text| Ok(text_response(text))).collect())
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LLM for ScriptedLLM {
    async fn completion<'a>(
        &self,
        request: CompletionRequest<'a>,
    ) -> agent::Result<CompletionResponse> {
        self.requests.lock().unwrap().push(request.messages.to_vec());
        self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(agent::Error::LLMResponseError(
                "no more scripted responses".to_string(),
            ))
        })
    }
}

/// Always answers with the same text.
pub struct FixedLLM(pub String);

#[async_trait]
impl LLM for FixedLLM {
    async fn completion<'a>(&self, _: CompletionRequest<'a>) -> agent::Result<CompletionResponse> {
        Ok(text_response(&self.0))
    }
}

pub fn text_response(text: &str) -> CompletionResponse {
    CompletionResponse {
        content: text.to_string(),
        tool_calls: vec![],
    }
}

pub fn sample_result() -> SearchResult {
    SearchResult {
        headline: "Electric Vehicles Reshape Urban Transport".to_string(),
        details: "Sales of electric vehicles doubled in two years.".to_string(),
        sources: vec![Source {
            source: "https://example.org/ev".to_string(),
            information_found: "EV sales statistics".to_string(),
        }],
    }
}

/// Returns the same result for every query and records the queries.
pub struct StubSearch {
    result: SearchResult,
    pub queries: Mutex<Vec<(String, String)>>,
}

impl StubSearch {
    pub fn new(result: SearchResult) -> Arc<Self> {
        Arc::new(Self {
            result,
            queries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl SearchCapability for StubSearch {
    async fn search(&self, query: &str, language: &str) -> Result<SearchResult> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), language.to_string()));
        Ok(self.result.clone())
    }
}

/// Fails the first `failures` searches with a transient error.
pub struct FlakySearch {
    failures: usize,
    pub calls: AtomicUsize,
}

impl FlakySearch {
    pub fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SearchCapability for FlakySearch {
    async fn search(&self, _: &str, _: &str) -> Result<SearchResult> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(Error::Agent(agent::Error::LLMResponseError(
                "search provider unavailable".to_string(),
            )));
        }
        Ok(sample_result())
    }
}

/// Console answering from scripts; panics when a script runs dry so a test
/// never blocks on unexpected input.
#[derive(Default)]
pub struct ScriptedConsole {
    answers: Mutex<VecDeque<String>>,
    confirmations: Mutex<VecDeque<bool>>,
    pub output: Mutex<Vec<String>>,
    pub asked: Mutex<Vec<String>>,
    pub progress: Arc<Mutex<Vec<String>>>,
}

impl ScriptedConsole {
    pub fn new(answers: &[&str], confirmations: &[bool]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            confirmations: Mutex::new(confirmations.iter().copied().collect()),
            ..Default::default()
        })
    }

    pub fn printed(&self) -> String {
        self.output.lock().unwrap().join("\n")
    }
}

impl Console for ScriptedConsole {
    fn ask(&self, prompt: &str, default: Option<&str>) -> Result<String> {
        self.asked.lock().unwrap().push(prompt.to_string());
        let answer = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected question: {prompt}"));
        match (answer.is_empty(), default) {
            (true, Some(default)) => Ok(default.to_string()),
            _ => Ok(answer),
        }
    }

    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool> {
        self.asked.lock().unwrap().push(prompt.to_string());
        Ok(self
            .confirmations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected confirmation: {prompt}")))
    }

    fn confirm_details(&self, details: &str, prompt: &str, default: bool) -> Result<bool> {
        self.print(details);
        self.confirm(prompt, default)
    }

    fn print(&self, text: &str) {
        self.output.lock().unwrap().push(text.to_string());
    }

    fn progress(&self, _description: &str, _total: usize) -> Box<dyn ProgressView> {
        Box::new(RecordingProgress(self.progress.clone()))
    }
}

struct RecordingProgress(Arc<Mutex<Vec<String>>>);

impl ProgressView for RecordingProgress {
    fn advance(&mut self, label: &str) -> Result<()> {
        self.0.lock().unwrap().push(label.to_string());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
