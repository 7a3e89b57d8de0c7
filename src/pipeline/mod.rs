//! 랭킹 파이프라인 - 오케스트레이터, 후보 선택, 다단계 폴백
//!
//! 쿼리 + 히스토리 → 키워드 필터 → 후보 선택 → [AI 랭킹] →
//! 그라운딩 분석 → 최종 리스트. 어느 스테이지든 실패하면 가장 가까운
//! 폴백으로 단락됩니다:
//!
//! 그라운딩 분석 → 후보 기반 폴백 스코어러 → 전체 히스토리 폴백
//!
//! 쿼리별 상태는 모두 지역 변수로 구성되며, 쿼리 간 공유 가변 상태는
//! 없습니다. 한 인스턴스에 동시 호출은 최대 1건이라고 가정합니다.

pub mod grounded;
pub mod ranking;

use anyhow::Result;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::concepts::extract_concepts;
use crate::gemini::GeminiClient;
use crate::history::{HistoryEntry, RankedResult, MAX_RESULTS};
use crate::scoring::{fallback_rank, filter_and_score, CANDIDATE_FALLBACK, HISTORY_FALLBACK};

// ============================================================================
// Constants
// ============================================================================

/// AI 랭킹을 호출할 필터 결과 크기 상한
const AI_RANKING_LIMIT: usize = 50;

/// 필터 결과가 상한을 넘을 때의 직접 절단 크기
const LARGE_TRUNCATE: usize = 35;

/// 폴백/최후 후보 풀 크기
const FALLBACK_POOL: usize = 20;

// ============================================================================
// StageError
// ============================================================================

/// 파이프라인 스테이지 실패 분류
///
/// 실패는 해당 스테이지 경계에서 잡혀 다음 폴백으로 강등됩니다.
/// 호출자에게는 전체 파이프라인 실패만 전파됩니다.
#[derive(Debug, Error)]
pub enum StageError {
    /// 전송 실패 - 엔드포인트 연결 불가 또는 비정상 상태 코드
    #[error("transport failure: {0}")]
    Transport(String),

    /// 형식 불량 AI 출력 - JSON이 아니거나 스키마 불일치
    #[error("malformed AI output: {0}")]
    Malformed(String),
}

// ============================================================================
// SearchPipeline
// ============================================================================

/// 검색 파이프라인
///
/// 클라이언트가 `None`이면 (API 키 미설정 등) 두 AI 스테이지를
/// 건너뛰고 휴리스틱 폴백만 사용합니다.
pub struct SearchPipeline {
    client: Option<GeminiClient>,
}

impl SearchPipeline {
    /// 새 파이프라인 생성
    pub fn new(client: Option<GeminiClient>) -> Self {
        Self { client }
    }

    /// AI 스테이지 사용 가능 여부
    pub fn ai_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// 쿼리 하나를 히스토리 배치에 대해 실행
    ///
    /// 항상 최대 5건의 결과를 반환합니다. 빈 리스트는 "관련 항목
    /// 없음"을 의미하며, 빈 히스토리는 네트워크 호출 전에 감지됩니다.
    pub async fn run(&self, query: &str, history: &[HistoryEntry]) -> Result<Vec<RankedResult>> {
        if history.is_empty() {
            tracing::info!("No history entries in window, skipping pipeline");
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let concepts = extract_concepts(query);
        let scored = filter_and_score(query, history, &concepts, now);

        let candidates = self.select_candidates(query, &scored, history, now).await;

        let (results, grounded_succeeded) = match &self.client {
            Some(client) => {
                match grounded::analyze_candidates(client, query, &candidates, now).await {
                    Ok(results) => (results, true),
                    Err(e) => {
                        tracing::warn!("Grounded analysis failed ({}), using candidate fallback", e);
                        (fallback_rank(query, &candidates, &CANDIDATE_FALLBACK, now), false)
                    }
                }
            }
            None => {
                tracing::debug!("AI stages disabled, using candidate fallback");
                (fallback_rank(query, &candidates, &CANDIDATE_FALLBACK, now), false)
            }
        };

        let mut results = resolve_candidate_results(results, grounded_succeeded, query, history, now);
        results.truncate(MAX_RESULTS);
        Ok(results)
    }

    /// 후보 선택 (키워드 필터 결과 크기에 따라 분기)
    ///
    /// - 필터 결과 없음: 원본 히스토리(최신순) 앞쪽 20건을 최후 후보로
    /// - 50건 이하: AI 랭킹에 위임, 실패 시 필터 순서 앞쪽 20건
    /// - 50건 초과: AI 호출 없이 상위 35건으로 절단
    async fn select_candidates(
        &self,
        query: &str,
        scored: &[crate::scoring::ScoredEntry],
        history: &[HistoryEntry],
        now: chrono::DateTime<Utc>,
    ) -> Vec<HistoryEntry> {
        if scored.is_empty() {
            tracing::debug!("Keyword filter empty, falling back to raw history pool");
            return history.iter().take(FALLBACK_POOL).cloned().collect();
        }

        let filtered: Vec<HistoryEntry> = scored.iter().map(|s| s.entry.clone()).collect();

        if filtered.len() > AI_RANKING_LIMIT {
            tracing::debug!("{} candidates, truncating without AI ranking", filtered.len());
            return filtered.into_iter().take(LARGE_TRUNCATE).collect();
        }

        if let Some(client) = &self.client {
            match ranking::rank_candidates(client, query, &filtered, now).await {
                Ok(ranked) => return ranked,
                Err(e) => {
                    tracing::warn!("AI ranking failed ({}), keeping filter order", e);
                    return filtered.into_iter().take(FALLBACK_POOL).collect();
                }
            }
        }

        filtered.into_iter().take(FALLBACK_POOL).collect()
    }
}

/// 후보 경로 결과 확정
///
/// 그라운딩 분석이 성공적으로 빈 배열을 반환했다면 그것은 "관련 항목
/// 없음"이라는 유효한 판정이므로 그대로 둡니다. 후보 경로가 실패하거나
/// AI 비활성 상태로 비었을 때만 전체 히스토리 최후 폴백을 시도합니다.
fn resolve_candidate_results(
    results: Vec<RankedResult>,
    grounded_succeeded: bool,
    query: &str,
    history: &[HistoryEntry],
    now: DateTime<Utc>,
) -> Vec<RankedResult> {
    if results.is_empty() && !grounded_succeeded {
        tracing::debug!("Candidate path empty, trying history-wide fallback");
        return fallback_rank(query, history, &HISTORY_FALLBACK, now);
    }
    results
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(url: &str, title: &str, visits: u32, days_ago: i64) -> HistoryEntry {
        HistoryEntry {
            url: url.to_string(),
            title: title.to_string(),
            visit_count: visits,
            last_visit_time: Utc::now() - Duration::days(days_ago),
        }
    }

    fn offline_pipeline() -> SearchPipeline {
        SearchPipeline::new(None)
    }

    #[tokio::test]
    async fn test_empty_history_returns_empty_without_network() {
        let pipeline = offline_pipeline();
        let results = pipeline.run("reddit python", &[]).await.expect("run");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_reddit_python_scenario() {
        // 플랫폼 하드 제외: reddit 항목이 유일한 최상위 결과
        let mut history = vec![entry(
            "https://reddit.com/r/python/comments/1",
            "Python best practices",
            3,
            0,
        )];
        for i in 0..100 {
            history.push(entry(
                &format!("https://unrelated{}.example.com/page", i),
                "Completely unrelated page",
                2,
                3,
            ));
        }

        let pipeline = offline_pipeline();
        let results = pipeline
            .run("reddit post about python best practices", &history)
            .await
            .expect("run");

        assert!(!results.is_empty());
        assert_eq!(results[0].url, "https://reddit.com/r/python/comments/1");
        assert!(results.len() <= MAX_RESULTS);
    }

    #[tokio::test]
    async fn test_results_never_exceed_five() {
        let history: Vec<HistoryEntry> = (0..40)
            .map(|i| entry(&format!("https://rust{}.example.com/tips", i), "rust tips", 2, 1))
            .collect();

        let pipeline = offline_pipeline();
        let results = pipeline.run("rust tips", &history).await.expect("run");
        assert!(results.len() <= MAX_RESULTS);
    }

    #[tokio::test]
    async fn test_empty_filter_uses_raw_history_pool() {
        // 쿼리와 전혀 무관한 히스토리: 키워드 필터는 비지만 원본 풀이
        // 최후 후보가 되고, 폴백은 방문 보너스만으로도 항목을 살림
        let history = vec![entry("https://facebook.com/feed", "Feed", 1, 40)];
        let pipeline = offline_pipeline();
        let results = pipeline
            .run("quantum chromodynamics paper", &history)
            .await
            .expect("run");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://facebook.com/feed");
    }

    #[tokio::test]
    async fn test_history_wide_fallback_when_candidate_pool_misses() {
        // 불용어로만 이루어진 쿼리 + 방문 0회 항목: 키워드 필터와
        // 후보 풀(원본 앞쪽 20건)이 모두 비고, 최후 폴백이 전체
        // 히스토리에서 리터럴 매칭을 찾아냄
        let mut history: Vec<HistoryEntry> = (0..25)
            .map(|i| entry(&format!("https://noise{}.example.com", i), "noise", 0, 40))
            .collect();
        history.push(entry(
            "https://match.example.com/the-who",
            "The Who concert tickets",
            0,
            40,
        ));

        let pipeline = offline_pipeline();
        let results = pipeline.run("the who", &history).await.expect("run");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://match.example.com/the-who");
    }

    #[test]
    fn test_grounded_empty_success_suppresses_history_fallback() {
        // 그라운딩 분석이 유효한 빈 배열을 반환한 경우: "관련 항목
        // 없음" 판정이므로 최후 폴백으로 덮어쓰지 않음
        let history = vec![entry("https://rust.example.com/tips", "rust tips", 3, 1)];
        let results = resolve_candidate_results(Vec::new(), true, "rust tips", &history, Utc::now());
        assert!(results.is_empty());
    }

    #[test]
    fn test_candidate_path_failure_still_reaches_history_fallback() {
        let history = vec![entry("https://rust.example.com/tips", "rust tips", 3, 1)];
        let results =
            resolve_candidate_results(Vec::new(), false, "rust tips", &history, Utc::now());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].url, "https://rust.example.com/tips");
    }
}
