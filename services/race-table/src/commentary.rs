//! Race commentary.
//!
//! Commentary is observational: it is requested after the checkpoint and finish transitions and
//! never fails. Any error, timeout or empty reply is replaced by a fixed line.

use std::future::Future;
use std::time::Duration;

use derby_types::{CommentaryPhase, RaceState, Racer};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CommentaryConfig;

/// Narration shown before players are seated.
pub const GREETING: &str = "친구들과 함께 즐거운 동물 경주를 시작해보세요!";
/// Narration when the first betting window opens.
pub const FIRST_BETTING_LINE: &str = "첫 번째 베팅 라운드입니다! 모두의 행운을 빌어요!";
/// Narration after a reset.
pub const RESET_LINE: &str = "다시 한 번 달려볼까요? 새로운 경주를 준비했어요!";
/// Used when the commentator answers with nothing.
pub const EMPTY_FALLBACK: &str = "경기가 정말 뜨겁습니다! 다음 상황을 기대해주세요!";
/// Used when the commentator fails or times out.
pub const ERROR_FALLBACK: &str =
    "관중들의 함성 소리에 해설이 잘 들리지 않습니다! 경기가 계속되고 있습니다!";

#[derive(Debug, Error)]
pub enum CommentaryError {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("failed: {status}: {body}")]
    FailedWithBody {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("commentator unavailable: {0}")]
    Unavailable(String),
}

/// Snapshot handed to a commentator.
#[derive(Clone, Debug)]
pub struct CommentaryRequest {
    pub phase: CommentaryPhase,
    pub racers: Vec<Racer>,
    pub state: RaceState,
    pub track_length: u32,
}

pub trait Commentator: Send + Sync + 'static {
    fn commentate(
        &self,
        request: &CommentaryRequest,
    ) -> impl Future<Output = Result<String, CommentaryError>> + Send;
}

/// Ask `commentator` for a line, substituting a fallback on failure, empty text or timeout.
pub async fn generate_commentary<C: Commentator>(
    commentator: &C,
    request: &CommentaryRequest,
    timeout: Duration,
) -> String {
    match tokio::time::timeout(timeout, commentator.commentate(request)).await {
        Ok(Ok(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(Ok(_)) => {
            warn!(phase = request.phase.as_str(), "empty commentary, using fallback");
            EMPTY_FALLBACK.to_string()
        }
        Ok(Err(err)) => {
            warn!(phase = request.phase.as_str(), %err, "commentary failed, using fallback");
            ERROR_FALLBACK.to_string()
        }
        Err(_) => {
            warn!(
                phase = request.phase.as_str(),
                timeout_ms = timeout.as_millis() as u64,
                "commentary timed out, using fallback"
            );
            ERROR_FALLBACK.to_string()
        }
    }
}

/// Prompt for a cheerful Korean race commentator.
pub fn build_prompt(request: &CommentaryRequest) -> String {
    let positions = request
        .racers
        .iter()
        .map(|racer| {
            format!(
                "{} (#{}): 현재 {}칸",
                racer.name,
                racer.id,
                request.state.position(racer.id)
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    let (situation, guidance) = match request.phase {
        CommentaryPhase::MidRace => (
            format!("제 {}라운드 종료 후 중간 상황", request.state.round),
            "현재 선두 동물과 뒤처진 동물을 언급하며 다음 라운드의 베팅을 유도해주세요.",
        ),
        CommentaryPhase::Finish => (
            "경기 종료".to_string(),
            "우승한 동물 친구를 축하하고 아쉬워하는 친구들을 귀엽게 위로해주세요.",
        ),
    };

    format!(
        "당신은 열정적이고 귀여운 말투를 쓰는 동물 경주 해설가 '콩떡 해설위원'입니다.\n\
         현재 상황을 바탕으로 아주 박진감 넘치고 재미있는 한국어 해설을 작성해주세요.\n\
         상태: {situation}\n\
         동물들의 위치: {positions}\n\
         트랙 총 길이: {}칸\n\n\
         {guidance}\n\
         해설은 3~4문장 정도로 짧고 \"해요\", \"했나봐요!\" 같은 다정한 종결어미를 사용해 강렬하게 작성해주세요.",
        request.track_length
    )
}

/// `generateContent` client.
#[derive(Clone, Debug)]
pub struct GeminiCommentator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, empty when there is none.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|part| part.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

impl GeminiCommentator {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, CommentaryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

impl Commentator for GeminiCommentator {
    async fn commentate(&self, request: &CommentaryRequest) -> Result<String, CommentaryError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(request),
                }],
            }],
        };
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CommentaryError::FailedWithBody { status, body });
        }
        let parsed: GenerateContentResponse = response.json().await?;
        debug!(phase = request.phase.as_str(), "commentary received");
        Ok(parsed.text())
    }
}

/// Offline commentator built from the race state alone.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalCommentator;

impl LocalCommentator {
    fn names(racers: &[Racer], ids: &[u8]) -> String {
        ids.iter()
            .filter_map(|id| racers.iter().find(|racer| racer.id == *id))
            .map(|racer| format!("{} {}", racer.icon, racer.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn line(request: &CommentaryRequest) -> String {
        match request.phase {
            CommentaryPhase::MidRace => {
                let leaders = request.state.leaders();
                let Some(first) = leaders.first() else {
                    return "모두 출발선에서 숨을 고르고 있어요! 두 번째 베팅으로 승부를 걸어보세요!"
                        .to_string();
                };
                format!(
                    "{} 친구가 {}칸으로 선두를 달리고 있어요! 뒤따르는 친구들도 역전을 노리고 있으니 두 번째 베팅을 신중하게 골라보세요!",
                    Self::names(&request.racers, &leaders),
                    request.state.position(*first)
                )
            }
            CommentaryPhase::Finish => {
                let winners: Vec<u8> = request.state.winners.iter().copied().collect();
                if winners.is_empty() {
                    return "경기가 끝났어요! 모두 정말 잘 달렸어요!".to_string();
                }
                format!(
                    "{} 친구가 결승선을 통과했어요! 우승을 축하해요! 아쉽게 놓친 친구들도 정말 잘 달렸어요!",
                    Self::names(&request.racers, &winners)
                )
            }
        }
    }
}

impl Commentator for LocalCommentator {
    async fn commentate(&self, request: &CommentaryRequest) -> Result<String, CommentaryError> {
        Ok(Self::line(request))
    }
}

/// Commentator selected at startup.
#[derive(Clone, Debug)]
pub enum CommentaryClient {
    Remote(GeminiCommentator),
    Local(LocalCommentator),
}

impl CommentaryClient {
    /// Remote commentary when an API key is configured, local otherwise.
    pub fn from_config(config: &CommentaryConfig) -> Result<Self, CommentaryError> {
        match config.api_key.as_deref() {
            Some(api_key) => Ok(Self::Remote(GeminiCommentator::new(
                &config.endpoint,
                &config.model,
                api_key,
                Duration::from_millis(config.timeout_ms),
            )?)),
            None => Ok(Self::Local(LocalCommentator)),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl Commentator for CommentaryClient {
    async fn commentate(&self, request: &CommentaryRequest) -> Result<String, CommentaryError> {
        match self {
            Self::Remote(remote) => remote.commentate(request).await,
            Self::Local(local) => local.commentate(request).await,
        }
    }
}
