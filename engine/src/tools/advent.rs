//! Advent of Code Capabilities
//!
//! Three capabilities backed by one shared HTTP client: fetch a puzzle's prose,
//! fetch the personal puzzle input, and submit an answer. The session cookie
//! is read from `AOC_SESSION`. Network and HTTP failures are reported to the
//! backend as `Error: ...` text rather than aborting the run.

use std::sync::{Arc, OnceLock};

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use sdk::CapabilityInput;
use tracing::{debug, info, warn};

use super::{Capability, InputSchema, ParamType};

/// Environment variable holding the session cookie
pub const SESSION_ENV: &str = "AOC_SESSION";

pub const SUBMISSION_BLOCKED: &str =
    "Submission blocked. Set confirm=True after validating the answer locally.";

static DAY_DESC: OnceLock<Regex> = OnceLock::new();
static ARTICLE: OnceLock<Regex> = OnceLock::new();
static TAG: OnceLock<Regex> = OnceLock::new();

/// Errors talking to the puzzle site
#[derive(Debug, thiserror::Error)]
pub enum AdventError {
    #[error("no session cookie configured (set {SESSION_ENV})")]
    MissingSession,

    #[error("request failed with status {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("{0}")]
    Unexpected(String),
}

/// Puzzle part, `a` or `b`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Part {
    A,
    B,
}

impl Part {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "a" => Some(Part::A),
            "b" => Some(Part::B),
            _ => None,
        }
    }

    fn level(self) -> &'static str {
        match self {
            Part::A => "1",
            Part::B => "2",
        }
    }

    fn index(self) -> usize {
        match self {
            Part::A => 0,
            Part::B => 1,
        }
    }
}

/// HTTP client for the puzzle site, shared by the three capabilities
#[derive(Debug, Clone)]
pub struct AdventClient {
    base_url: String,
    session: Option<String>,
    default_year: i64,
    http: reqwest::Client,
}

impl AdventClient {
    pub fn new(base_url: impl Into<String>, session: Option<String>, default_year: i64) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: session.filter(|s| !s.trim().is_empty()),
            default_year,
            http: reqwest::Client::new(),
        }
    }

    /// Build a client reading the session cookie from the environment
    pub fn from_env(base_url: impl Into<String>, default_year: i64) -> Self {
        Self::new(base_url, std::env::var(SESSION_ENV).ok(), default_year)
    }

    pub fn default_year(&self) -> i64 {
        self.default_year
    }

    fn cookie(&self) -> Result<String, AdventError> {
        self.session
            .as_ref()
            .map(|s| format!("session={}", s.trim()))
            .ok_or(AdventError::MissingSession)
    }

    async fn get(&self, path: &str) -> Result<String, AdventError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Cookie", self.cookie()?)
            .send()
            .await
            .map_err(|e| AdventError::Network(e.to_string()))?;

        read_body(response).await
    }

    /// Fetch the prose of one puzzle part, tags stripped
    pub async fn description(
        &self,
        day: i64,
        year: i64,
        part: Part,
    ) -> Result<String, AdventError> {
        let page = self.get(&format!("/{}/day/{}", year, day)).await?;
        let re = DAY_DESC.get_or_init(|| {
            Regex::new(r#"(?s)<article[^>]*class="day-desc"[^>]*>(.*?)</article>"#)
                .expect("Invalid day-desc pattern")
        });

        let articles: Vec<&str> = re
            .captures_iter(&page)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();

        match articles.get(part.index()) {
            Some(article) => Ok(strip_tags(article)),
            None if part == Part::B => Err(AdventError::Unexpected(
                "part b is not available yet; solve part a first".to_string(),
            )),
            None => Err(AdventError::Unexpected(
                "puzzle description not found on the page".to_string(),
            )),
        }
    }

    /// Fetch the personal puzzle input, trimmed
    pub async fn input(&self, day: i64, year: i64) -> Result<String, AdventError> {
        let body = self.get(&format!("/{}/day/{}/input", year, day)).await?;
        Ok(body.trim().to_string())
    }

    /// Submit an answer and return the site's verdict text
    pub async fn submit(
        &self,
        day: i64,
        year: i64,
        part: Part,
        answer: &str,
    ) -> Result<String, AdventError> {
        let url = format!("{}/{}/day/{}/answer", self.base_url, year, day);
        info!("Submitting answer for {} day {} part {:?}", year, day, part);

        let response = self
            .http
            .post(&url)
            .header("Cookie", self.cookie()?)
            .form(&[("level", part.level()), ("answer", answer)])
            .send()
            .await
            .map_err(|e| AdventError::Network(e.to_string()))?;

        let page = read_body(response).await?;
        let re = ARTICLE.get_or_init(|| {
            Regex::new(r"(?s)<article[^>]*>(.*?)</article>").expect("Invalid article pattern")
        });

        let verdict = re
            .captures(&page)
            .and_then(|c| c.get(1))
            .map(|m| strip_tags(m.as_str()))
            .unwrap_or_else(|| strip_tags(&page));
        Ok(verdict)
    }
}

async fn read_body(response: reqwest::Response) -> Result<String, AdventError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AdventError::Network(e.to_string()))?;

    if !status.is_success() {
        return Err(AdventError::Http {
            status: status.as_u16(),
            body: body.trim().to_string(),
        });
    }
    Ok(body)
}

/// Drop HTML tags, decode the common entities and trim
pub fn strip_tags(html: &str) -> String {
    let re = TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("Invalid tag pattern"));
    re.replace_all(html, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

fn year_of(input: &CapabilityInput, client: &AdventClient) -> i64 {
    input.param_i64_opt("year").unwrap_or(client.default_year)
}

fn error_text(err: AdventError) -> String {
    warn!("Puzzle site request failed: {}", err);
    format!("Error: {}", err)
}

/// `get_puzzle_description`
pub struct PuzzleDescriptionTool {
    client: Arc<AdventClient>,
}

impl PuzzleDescriptionTool {
    pub fn new(client: Arc<AdventClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Capability for PuzzleDescriptionTool {
    fn name(&self) -> &str {
        "get_puzzle_description"
    }

    fn description(&self) -> &str {
        "Fetch the Advent of Code puzzle description for a given day."
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::object()
            .required("day", ParamType::Integer)
            .optional("year", ParamType::Integer)
            .string_enum("part", &["a", "b"], false)
    }

    async fn invoke(&self, input: CapabilityInput) -> Result<String> {
        let day = input.param_i64("day")?;
        let year = year_of(&input, &self.client);
        let part = input
            .param_str_opt("part")
            .and_then(Part::parse)
            .unwrap_or(Part::A);

        Ok(self
            .client
            .description(day, year, part)
            .await
            .unwrap_or_else(error_text))
    }
}

/// `get_puzzle_input`
pub struct PuzzleInputTool {
    client: Arc<AdventClient>,
}

impl PuzzleInputTool {
    pub fn new(client: Arc<AdventClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Capability for PuzzleInputTool {
    fn name(&self) -> &str {
        "get_puzzle_input"
    }

    fn description(&self) -> &str {
        "Fetch your personal Advent of Code input for a given day."
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::object()
            .required("day", ParamType::Integer)
            .optional("year", ParamType::Integer)
    }

    async fn invoke(&self, input: CapabilityInput) -> Result<String> {
        let day = input.param_i64("day")?;
        let year = year_of(&input, &self.client);
        Ok(self.client.input(day, year).await.unwrap_or_else(error_text))
    }
}

/// `submit_answer`
pub struct SubmitAnswerTool {
    client: Arc<AdventClient>,
}

impl SubmitAnswerTool {
    pub fn new(client: Arc<AdventClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Capability for SubmitAnswerTool {
    fn name(&self) -> &str {
        "submit_answer"
    }

    fn description(&self) -> &str {
        "Submit an Advent of Code answer. confirm must be true to allow submission."
    }

    fn input_schema(&self) -> InputSchema {
        InputSchema::object()
            .required("day", ParamType::Integer)
            .string_enum("part", &["a", "b"], true)
            .required("answer", ParamType::String)
            .optional("year", ParamType::Integer)
            .optional("confirm", ParamType::Boolean)
    }

    async fn invoke(&self, input: CapabilityInput) -> Result<String> {
        if !input.param_bool_opt("confirm").unwrap_or(false) {
            return Ok(SUBMISSION_BLOCKED.to_string());
        }

        let day = input.param_i64("day")?;
        let year = year_of(&input, &self.client);
        let part = Part::parse(input.param_str("part")?)
            .ok_or_else(|| anyhow::anyhow!("part passed schema validation but is not a or b"))?;
        let answer = input.param_str("answer")?;

        Ok(self
            .client
            .submit(day, year, part, answer)
            .await
            .unwrap_or_else(error_text))
    }
}
