//! Search-grounded answering for the search focus modes.
//!
//! # Flow
//!
//! 1. Rephrase the question into a standalone query when history is present
//! 2. Search with the mode's engines (site-restricted when a domain is set)
//! 3. Optionally rerank results by embedding similarity
//! 4. Emit `sources`, then stream the model's answer over numbered context

use std::sync::Arc;

use crate::domain::conversation::FocusMode;
use crate::ports::{
    CompletionRequest, FocusHandler, HandlerEventStream, HandlerInvocation, MessageRole,
    SearchEngine, SearchHit, SearchOptions,
};

use super::emitter::{spawn_producer, stream_answer, Detached, EventSink, GENERIC_FAILURE};
use super::prompts;
use super::rerank::rank_by_similarity;

/// Per-mode search behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchProfile {
    pub engines: Vec<String>,
    pub language: Option<String>,
    /// Rerank results by embedding similarity to the query.
    pub rerank: bool,
    pub persona: &'static str,
}

impl SearchProfile {
    fn new(engines: &[&str], rerank: bool, persona: &'static str) -> Self {
        Self {
            engines: engines.iter().map(|e| e.to_string()).collect(),
            language: Some("en".to_string()),
            rerank,
            persona,
        }
    }

    /// General web search.
    pub fn web() -> Self {
        Self::new(&[], true, prompts::WEB_SEARCH_PERSONA)
    }

    pub fn academic() -> Self {
        Self::new(
            &["arxiv", "google scholar", "pubmed"],
            true,
            prompts::ACADEMIC_SEARCH_PERSONA,
        )
    }

    pub fn wolfram_alpha() -> Self {
        Self::new(&["wolframalpha"], false, prompts::WOLFRAM_ALPHA_PERSONA)
    }

    pub fn youtube() -> Self {
        Self::new(&["youtube"], true, prompts::YOUTUBE_SEARCH_PERSONA)
    }

    pub fn reddit() -> Self {
        Self::new(&["reddit"], true, prompts::REDDIT_SEARCH_PERSONA)
    }

    /// Profile for a search mode; `None` for modes that do not search.
    pub fn for_mode(mode: FocusMode) -> Option<Self> {
        match mode {
            FocusMode::WebSearch | FocusMode::WebSearchDomain => Some(Self::web()),
            FocusMode::AcademicSearch => Some(Self::academic()),
            FocusMode::WolframAlphaSearch => Some(Self::wolfram_alpha()),
            FocusMode::YoutubeSearch => Some(Self::youtube()),
            FocusMode::RedditSearch => Some(Self::reddit()),
            FocusMode::WritingAssistant => None,
        }
    }

    fn search_options(&self, domain: Option<&str>) -> SearchOptions {
        let mut options = SearchOptions::new().with_engines(self.engines.clone());
        if let Some(language) = &self.language {
            options = options.with_language(language.clone());
        }
        if let Some(domain) = domain {
            options = options.with_domain(domain);
        }
        options
    }
}

/// Source selection limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnswerSettings {
    pub max_sources: usize,
    /// Minimum cosine similarity kept when reranking.
    pub rerank_threshold: f32,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            max_sources: 15,
            rerank_threshold: 0.3,
        }
    }
}

/// Handler for the search focus modes.
pub struct SearchAnswerHandler {
    profile: SearchProfile,
    search: Arc<dyn SearchEngine>,
    settings: AnswerSettings,
}

impl SearchAnswerHandler {
    pub fn new(profile: SearchProfile, search: Arc<dyn SearchEngine>) -> Self {
        Self {
            profile,
            search,
            settings: AnswerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: AnswerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn profile(&self) -> &SearchProfile {
        &self.profile
    }
}

impl FocusHandler for SearchAnswerHandler {
    fn invoke(&self, invocation: HandlerInvocation) -> HandlerEventStream {
        let run = SearchRun {
            profile: self.profile.clone(),
            search: Arc::clone(&self.search),
            settings: self.settings,
            invocation,
        };
        spawn_producer(run.invocation.cancellation.clone(), move |mut sink| async move {
            // Detached means the client is gone; nothing left to do.
            let _ = run.execute(&mut sink).await;
        })
    }

    fn name(&self) -> &'static str {
        "search_answer"
    }
}

struct SearchRun {
    profile: SearchProfile,
    search: Arc<dyn SearchEngine>,
    settings: AnswerSettings,
    invocation: HandlerInvocation,
}

impl SearchRun {
    async fn execute(self, sink: &mut EventSink) -> Result<(), Detached> {
        let query = match self.standalone_query().await {
            Ok(query) => query,
            Err(err) => {
                tracing::error!(error = %err, "rephrasing failed");
                return sink.fail(GENERIC_FAILURE).await;
            }
        };

        let hits = match query {
            Some(query) => {
                let options = self.profile.search_options(self.invocation.domain.as_deref());
                match self.search.search(&query, &options).await {
                    Ok(results) => results.results,
                    Err(err) => {
                        tracing::error!(error = %err, query = %query, "search failed");
                        return sink.fail(GENERIC_FAILURE).await;
                    }
                }
            }
            None => Vec::new(),
        };

        let hits = match self.select(hits).await {
            Ok(hits) => hits,
            Err(err) => {
                tracing::error!(error = %err, "reranking failed");
                return sink.fail(GENERIC_FAILURE).await;
            }
        };
        tracing::debug!(sources = hits.len(), "sources selected");

        if !hits.is_empty() {
            sink.sources(hits.iter().map(SearchHit::to_source).collect())
                .await?;
        }

        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let system_prompt = prompts::answer_system_prompt(
            self.profile.persona,
            &prompts::numbered_context(&hits),
            &today,
        );
        let request = CompletionRequest::new()
            .with_system_prompt(system_prompt)
            .with_history(self.invocation.prior_history())
            .with_message(MessageRole::User, self.invocation.query.clone());

        stream_answer(&self.invocation.chat_model, request, sink).await
    }

    /// The query to search for, or `None` if no search is needed.
    async fn standalone_query(&self) -> Result<Option<String>, crate::ports::AIError> {
        let question = &self.invocation.query;
        let prior = self.invocation.prior_history();
        if prior.is_empty() {
            return Ok(Some(question.clone()));
        }

        let request = CompletionRequest::new()
            .with_system_prompt(prompts::rephrase_system_prompt())
            .with_message(
                MessageRole::User,
                prompts::rephrase_input(prior, question),
            );
        let response = self.invocation.chat_model.complete(request).await?;
        let rephrased = response.content.trim();

        Ok(match rephrased {
            prompts::NO_SEARCH_NEEDED => None,
            "" => Some(question.clone()),
            other => Some(other.to_string()),
        })
    }

    async fn select(&self, hits: Vec<SearchHit>) -> Result<Vec<SearchHit>, crate::ports::AIError> {
        let max = self.settings.max_sources;
        if !self.profile.rerank || hits.is_empty() {
            return Ok(hits.into_iter().take(max).collect());
        }

        let embeddings = &self.invocation.embeddings;
        let documents: Vec<String> = hits.iter().map(|h| h.page_content().to_string()).collect();
        let document_vectors = embeddings.embed_documents(&documents).await?;
        let query_vector = embeddings.embed_query(&self.invocation.query).await?;

        let ranked = rank_by_similarity(&query_vector, &document_vectors, self.settings.rerank_threshold);
        Ok(ranked
            .into_iter()
            .filter_map(|i| hits.get(i).cloned())
            .take(max)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockChatModel, MockEmbeddings};
    use crate::domain::conversation::{ChatTurn, HandlerEvent};
    use crate::ports::{AIError, SearchError, SearchResults};
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    /// Search engine returning canned hits and recording queries.
    #[derive(Default)]
    struct StaticSearch {
        hits: Vec<SearchHit>,
        fail: bool,
        seen: Mutex<Vec<(String, SearchOptions)>>,
    }

    impl StaticSearch {
        fn with_hits(hits: Vec<SearchHit>) -> Self {
            Self {
                hits,
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn queries(&self) -> Vec<(String, SearchOptions)> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchEngine for StaticSearch {
        async fn search(
            &self,
            query: &str,
            options: &SearchOptions,
        ) -> Result<SearchResults, SearchError> {
            self.seen.lock().unwrap().push((query.to_string(), options.clone()));
            if self.fail {
                return Err(SearchError::Status { status: 502 });
            }
            Ok(SearchResults {
                results: self.hits.clone(),
                suggestions: vec![],
            })
        }
    }

    fn hit(title: &str, content: &str) -> SearchHit {
        SearchHit {
            title: title.into(),
            url: format!("https://{}.example", title.to_lowercase()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    fn invocation(query: &str, history: Vec<ChatTurn>, model: MockChatModel) -> HandlerInvocation {
        HandlerInvocation {
            query: query.into(),
            history,
            chat_model: Arc::new(model),
            embeddings: Arc::new(MockEmbeddings::new()),
            domain: None,
            cancellation: CancellationToken::new(),
        }
    }

    async fn run(handler: &SearchAnswerHandler, invocation: HandlerInvocation) -> Vec<HandlerEvent> {
        handler.invoke(invocation).collect().await
    }

    fn answer_text(events: &[HandlerEvent]) -> String {
        events
            .iter()
            .filter_map(|e| match e {
                HandlerEvent::AnswerToken(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    mod profiles {
        use super::*;

        #[test]
        fn every_search_mode_has_a_profile() {
            for mode in FocusMode::all() {
                let profile = SearchProfile::for_mode(*mode);
                assert_eq!(profile.is_none(), *mode == FocusMode::WritingAssistant);
            }
        }

        #[test]
        fn engines_match_mode() {
            assert!(SearchProfile::web().engines.is_empty());
            assert_eq!(
                SearchProfile::academic().engines,
                vec!["arxiv", "google scholar", "pubmed"]
            );
            assert_eq!(SearchProfile::youtube().engines, vec!["youtube"]);
            assert_eq!(SearchProfile::reddit().engines, vec!["reddit"]);
        }

        #[test]
        fn only_wolfram_alpha_skips_reranking() {
            assert!(!SearchProfile::wolfram_alpha().rerank);
            assert!(SearchProfile::web().rerank);
            assert!(SearchProfile::academic().rerank);
        }
    }

    mod answering {
        use super::*;

        #[tokio::test]
        async fn emits_sources_then_streams_answer() {
            let search = Arc::new(StaticSearch::with_hits(vec![hit("Forecast", "weather today sunny")]));
            let handler = SearchAnswerHandler::new(SearchProfile::web(), search.clone());

            let events = run(
                &handler,
                invocation("weather today", vec![], MockChatModel::new().with_response("It is sunny.")),
            )
            .await;

            assert!(matches!(&events[0], HandlerEvent::Sources(s) if s.len() == 1));
            assert_eq!(answer_text(&events), "It is sunny.");
            assert_eq!(search.queries()[0].0, "weather today");
        }

        #[tokio::test]
        async fn rephrases_follow_up_questions() {
            let search = Arc::new(StaticSearch::with_hits(vec![hit("Paris", "paris weather")]));
            let handler = SearchAnswerHandler::new(SearchProfile::web(), search.clone());
            let model = MockChatModel::new()
                .with_response("  weather in Paris tomorrow ")
                .with_response("Rainy.");

            let events = run(
                &handler,
                invocation(
                    "and tomorrow?",
                    vec![ChatTurn::human("weather in Paris"), ChatTurn::assistant("Sunny.")],
                    model,
                ),
            )
            .await;

            assert_eq!(search.queries()[0].0, "weather in Paris tomorrow");
            assert_eq!(answer_text(&events), "Rainy.");
        }

        #[tokio::test]
        async fn first_question_as_sent_by_clients_is_searched_directly() {
            let search = Arc::new(StaticSearch::with_hits(vec![]));
            let handler = SearchAnswerHandler::new(SearchProfile::web(), search.clone());
            let model = MockChatModel::new().with_response("Sunny.");

            let inv = invocation("weather today", vec![ChatTurn::human("weather today")], model.clone());
            run(&handler, inv).await;

            assert_eq!(search.queries()[0].0, "weather today");
            let calls = model.get_calls();
            assert_eq!(calls.len(), 1, "no rephrasing call");
            assert_eq!(calls[0].messages.len(), 1, "question is not repeated");
        }

        #[tokio::test]
        async fn not_needed_skips_search_and_sources() {
            let search = Arc::new(StaticSearch::with_hits(vec![hit("X", "x")]));
            let handler = SearchAnswerHandler::new(SearchProfile::web(), search.clone());
            let model = MockChatModel::new().with_response("not_needed").with_response("Hi!");

            let events = run(
                &handler,
                invocation("hello", vec![ChatTurn::human("hey"), ChatTurn::assistant("hi")], model),
            )
            .await;

            assert!(search.queries().is_empty());
            assert_eq!(events, vec![HandlerEvent::token("Hi!")]);
        }

        #[tokio::test]
        async fn domain_restricts_search() {
            let search = Arc::new(StaticSearch::with_hits(vec![]));
            let handler = SearchAnswerHandler::new(SearchProfile::web(), search.clone());
            let mut inv = invocation("select macro", vec![], MockChatModel::new());
            inv.domain = Some("docs.rs".into());

            run(&handler, inv).await;

            assert_eq!(search.queries()[0].1.domain.as_deref(), Some("docs.rs"));
        }

        #[tokio::test]
        async fn academic_mode_passes_its_engines() {
            let search = Arc::new(StaticSearch::with_hits(vec![]));
            let handler = SearchAnswerHandler::new(SearchProfile::academic(), search.clone());

            run(&handler, invocation("transformers", vec![], MockChatModel::new())).await;

            assert_eq!(search.queries()[0].1.engines.len(), 3);
        }
    }

    mod selection {
        use super::*;

        #[tokio::test]
        async fn rerank_drops_unrelated_results() {
            let search = Arc::new(StaticSearch::with_hits(vec![
                hit("Noise", "zzzz qqqq"),
                hit("Forecast", "weather today"),
            ]));
            let handler = SearchAnswerHandler::new(SearchProfile::web(), search);

            let events = run(&handler, invocation("weather today", vec![], MockChatModel::new())).await;

            match &events[0] {
                HandlerEvent::Sources(sources) => {
                    assert_eq!(sources.len(), 1);
                    assert_eq!(sources[0].title, "Forecast");
                }
                other => panic!("expected sources, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn without_rerank_results_are_truncated_in_order() {
            let hits = (0..5).map(|i| hit(&format!("R{i}"), "zzz")).collect();
            let search = Arc::new(StaticSearch::with_hits(hits));
            let handler = SearchAnswerHandler::new(SearchProfile::wolfram_alpha(), search)
                .with_settings(AnswerSettings {
                    max_sources: 2,
                    rerank_threshold: 0.3,
                });

            let events = run(&handler, invocation("2+2", vec![], MockChatModel::new())).await;

            match &events[0] {
                HandlerEvent::Sources(sources) => {
                    let titles: Vec<_> = sources.iter().map(|s| s.title.as_str()).collect();
                    assert_eq!(titles, vec!["R0", "R1"]);
                }
                other => panic!("expected sources, got {other:?}"),
            }
        }
    }

    mod failures {
        use super::*;

        #[tokio::test]
        async fn search_failure_is_a_terminal_error_event() {
            let handler =
                SearchAnswerHandler::new(SearchProfile::web(), Arc::new(StaticSearch::failing()));
            let events = run(&handler, invocation("q", vec![], MockChatModel::new())).await;
            assert_eq!(events, vec![HandlerEvent::error(GENERIC_FAILURE)]);
        }

        #[tokio::test]
        async fn embedding_failure_is_a_terminal_error_event() {
            let search = Arc::new(StaticSearch::with_hits(vec![hit("A", "a")]));
            let handler = SearchAnswerHandler::new(SearchProfile::web(), search);
            let mut inv = invocation("q", vec![], MockChatModel::new());
            inv.embeddings = Arc::new(MockEmbeddings::failing(AIError::unavailable("down")));

            let events = run(&handler, inv).await;
            assert_eq!(events, vec![HandlerEvent::error(GENERIC_FAILURE)]);
        }

        #[tokio::test]
        async fn model_failure_after_sources_keeps_sources() {
            let search = Arc::new(StaticSearch::with_hits(vec![hit("Forecast", "weather")]));
            let handler = SearchAnswerHandler::new(SearchProfile::wolfram_alpha(), search);
            let model = MockChatModel::new().with_error(AIError::AuthenticationFailed);

            let events = run(&handler, invocation("weather", vec![], model)).await;

            assert_eq!(events.len(), 2);
            assert_eq!(events[0].kind(), "sources");
            assert_eq!(events[1], HandlerEvent::error(GENERIC_FAILURE));
        }
    }
}
