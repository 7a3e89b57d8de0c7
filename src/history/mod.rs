//! 브라우저 히스토리 모듈 - 데이터 모델 및 히스토리 소스
//!
//! 랭킹 파이프라인이 소비하는 데이터 타입과,
//! 브라우저 히스토리 내보내기(JSON)를 읽어오는 소스 구현입니다.
//!
//! 파이프라인은 이 소스가 전달한 리스트의 정합성을 신뢰합니다:
//! 내부 스킴 URL 제거, 방문 0회 제거, 최근 30일 윈도우, 최신순 정렬은
//! 모두 소스의 책임입니다.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// 히스토리 조회 윈도우 (일)
pub const LOOKBACK_DAYS: i64 = 30;

/// 호출자에게 반환되는 최종 결과 리스트의 최대 길이
pub const MAX_RESULTS: usize = 5;

/// 제외할 내부/브라우저 스킴
const INTERNAL_SCHEMES: &[&str] = &[
    "chrome://",
    "chrome-extension://",
    "edge://",
    "about:",
    "devtools://",
    "view-source:",
    "file://",
];

// ============================================================================
// Data Model
// ============================================================================

/// 브라우저 히스토리 항목
///
/// 한 번 읽어온 뒤에는 불변입니다. 쿼리 한 건이 처리되는 동안만
/// 파이프라인이 소유합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// 페이지 URL
    pub url: String,
    /// 페이지 제목
    pub title: String,
    /// 방문 횟수
    pub visit_count: u32,
    /// 마지막 방문 시각 (epoch milliseconds)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_visit_time: DateTime<Utc>,
}

impl HistoryEntry {
    /// 마지막 방문 이후 경과 일수
    pub fn days_since_visit(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_visit_time).num_days()
    }
}

/// 최종 랭킹 결과
///
/// 호출자에게 노출되는 유일한 형태입니다. `reason`에는 인용 마크업이
/// 포함될 수 있습니다. 그라운딩 응답의 JSON 와이어 형태이기도 합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub url: String,
    pub title: String,
    pub reason: String,
}

// ============================================================================
// HistorySource Trait
// ============================================================================

/// 히스토리 소스 트레이트
///
/// 랭킹 파이프라인에 히스토리 항목을 공급하는 인터페이스입니다.
/// 브라우저 브리지처럼 비동기 소스도 같은 시임으로 들어올 수 있게
/// async로 선언합니다.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// 조회 윈도우 내의 히스토리 항목 반환 (최신순 정렬, 정리 완료)
    async fn fetch(&self) -> Result<Vec<HistoryEntry>>;

    /// 소스 이름
    fn name(&self) -> &str;
}

// ============================================================================
// JsonHistorySource
// ============================================================================

/// JSON 내보내기 파일 기반 히스토리 소스
///
/// 브라우저 확장이 내보낸 히스토리 JSON 배열을 읽습니다.
/// 형식: `[{"url", "title", "visitCount", "lastVisitTime"}, ...]`
pub struct JsonHistorySource {
    path: PathBuf,
}

impl JsonHistorySource {
    /// 지정된 파일 경로로 생성
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 기본 경로 (~/.hindsight/history.json)
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".hindsight")
            .join("history.json")
    }

    /// 파일 경로 반환
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl HistorySource for JsonHistorySource {
    async fn fetch(&self) -> Result<Vec<HistoryEntry>> {
        let raw = std::fs::read_to_string(&self.path).with_context(|| {
            format!("Failed to read history file: {}", self.path.display())
        })?;

        let entries: Vec<HistoryEntry> =
            serde_json::from_str(&raw).context("Failed to parse history JSON")?;

        let cleaned = clean_entries(entries, Utc::now());
        tracing::debug!("Loaded {} history entries from {}", cleaned.len(), self.path.display());

        Ok(cleaned)
    }

    fn name(&self) -> &str {
        "json-export"
    }
}

/// 히스토리 정리: 내부 URL/빈 항목/방문 0회 제거, 윈도우 적용, 최신순 정렬
fn clean_entries(entries: Vec<HistoryEntry>, now: DateTime<Utc>) -> Vec<HistoryEntry> {
    let cutoff = now - Duration::days(LOOKBACK_DAYS);

    let mut cleaned: Vec<HistoryEntry> = entries
        .into_iter()
        .filter(|e| !e.url.is_empty() && !e.title.is_empty())
        .filter(|e| e.visit_count > 0)
        .filter(|e| !is_internal_url(&e.url))
        .filter(|e| e.last_visit_time >= cutoff)
        .collect();

    cleaned.sort_by(|a, b| b.last_visit_time.cmp(&a.last_visit_time));
    cleaned
}

/// 브라우저 내부 스킴 여부
fn is_internal_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    INTERNAL_SCHEMES.iter().any(|s| lower.starts_with(s))
}

// ============================================================================
// Tests
// ============================================================================
