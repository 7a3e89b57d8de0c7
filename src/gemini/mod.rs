//! Gemini 클라이언트 모듈 - 텍스트 생성 및 그라운딩 생성
//!
//! 랭킹 파이프라인의 두 AI 스테이지가 사용하는 생성 엔드포인트
//! 클라이언트입니다. 일반 생성과 Google 검색 그라운딩이 활성화된
//! 생성을 모두 지원합니다.
//!
//! 재시도는 하지 않습니다: 호출은 단일 요청/응답이며, 실패는 즉시
//! 호출자에게 전파되어 다음 폴백 스테이지를 선택하게 합니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let client = GeminiClient::from_env()?;
//! let text = client.generate("프롬프트").await?;
//! ```

pub mod citations;

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use citations::annotate_citations;

// ============================================================================
// Constants
// ============================================================================

/// Gemini 생성 API 엔드포인트
/// ref: https://ai.google.dev/gemini-api/docs/text-generation
const GEMINI_GENERATE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

/// HTTP 클라이언트 타임아웃 (초)
const HTTP_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Client
// ============================================================================

/// Gemini 생성 클라이언트
#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// 새 클라이언트 생성
    ///
    /// # Arguments
    /// * `api_key` - Google AI API 키
    pub fn new(api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { api_key, client })
    }

    /// 환경변수에서 API 키를 읽어 생성
    ///
    /// 우선순위: GEMINI_API_KEY > GOOGLE_AI_API_KEY
    pub fn from_env() -> Result<Self> {
        let api_key = get_api_key()?;
        Self::new(api_key)
    }

    /// 단일 턴 텍스트 생성 (검색 그라운딩 없음)
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            tools: None,
        };

        let response = self.call(&request).await?;
        Ok(response.text())
    }

    /// Google 검색 그라운딩이 활성화된 텍스트 생성
    ///
    /// 응답에는 생성 텍스트와 (있다면) 문자 오프셋 기반 출처 인용
    /// 메타데이터가 포함됩니다.
    pub async fn generate_grounded(&self, prompt: &str) -> Result<GroundedResponse> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            tools: Some(vec![Tool {
                google_search: GoogleSearch {},
            }]),
        };

        let mut response = self.call(&request).await?;
        let text = response.text();
        let grounding = response
            .candidates
            .first_mut()
            .and_then(|c| c.grounding_metadata.take());

        Ok(GroundedResponse { text, grounding })
    }

    /// 공통 API 호출: POST, 상태 검사, 에러 본문 파싱
    async fn call(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let response = self
            .client
            .post(GEMINI_GENERATE_URL)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .context("Failed to send generation request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<GeminiError>(&body) {
                anyhow::bail!(
                    "Gemini API error ({}): {}",
                    error.error.status,
                    error.error.message
                );
            }
            anyhow::bail!("Gemini API error ({}): {}", status, body);
        }

        serde_json::from_str(&body).context("Failed to parse generation response")
    }
}

// ============================================================================
// Request Types
// ============================================================================

/// Gemini API 요청 본문
/// ref: https://ai.google.dev/gemini-api/docs/text-generation
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

/// 검색 그라운딩 툴
/// ref: https://ai.google.dev/gemini-api/docs/google-search
#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "google_search")]
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

// ============================================================================
// Response Types
// ============================================================================

/// Gemini API 응답
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// 첫 후보의 파트 텍스트 연결
    fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| {
                c.content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: ResponseContent,
    #[serde(rename = "groundingMetadata")]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// 그라운딩 생성 결과
#[derive(Debug)]
pub struct GroundedResponse {
    /// 생성된 텍스트
    pub text: String,
    /// 출처 인용 메타데이터 (그라운딩이 발동하지 않으면 None)
    pub grounding: Option<GroundingMetadata>,
}

/// 그라운딩 메타데이터 (출처 인용)
///
/// `supports`는 생성 텍스트의 문자 오프셋 구간과 참조 청크 인덱스를,
/// `chunks`는 출처 URI/제목을 담습니다. 한 번 소비되고 저장되지
/// 않습니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingMetadata {
    #[serde(rename = "groundingSupports", default)]
    pub supports: Vec<GroundingSupport>,
    #[serde(rename = "groundingChunks", default)]
    pub chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroundingSupport {
    pub segment: Option<Segment>,
    #[serde(rename = "groundingChunkIndices", default)]
    pub chunk_indices: Vec<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Segment {
    #[serde(rename = "endIndex")]
    pub end_index: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroundingChunk {
    pub web: Option<WebSource>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSource {
    pub uri: String,
    pub title: Option<String>,
}

/// Gemini API 에러 응답
#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
    #[serde(default)]
    status: String,
}

// ============================================================================
// API Key Management
// ============================================================================

/// API 키 로드 (환경변수에서)
///
/// 우선순위:
/// 1. `GEMINI_API_KEY` 환경변수
/// 2. `GOOGLE_AI_API_KEY` 환경변수
pub fn get_api_key() -> Result<String> {
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            tracing::debug!("Using API key from GEMINI_API_KEY");
            return Ok(key);
        }
    }

    if let Ok(key) = std::env::var("GOOGLE_AI_API_KEY") {
        if !key.is_empty() {
            tracing::debug!("Using API key from GOOGLE_AI_API_KEY");
            return Ok(key);
        }
    }

    anyhow::bail!(
        "API key not found. Set GEMINI_API_KEY or GOOGLE_AI_API_KEY environment variable.\n\
         Get your API key at: https://aistudio.google.com/app/apikey"
    )
}

/// API 키 존재 여부 확인
pub fn has_api_key() -> bool {
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            return true;
        }
    }

    if let Ok(key) = std::env::var("GOOGLE_AI_API_KEY") {
        if !key.is_empty() {
            return true;
        }
    }

    false
}

// ============================================================================
// Tests
// ============================================================================
