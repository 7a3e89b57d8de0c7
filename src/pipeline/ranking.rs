//! AI 랭킹 클라이언트 - 후보 리스트를 인덱스 배열로 재정렬
//!
//! 후보를 번호 매긴 평문 리스트로 변환해 생성 엔드포인트에 보내고,
//! 응답에서 1-기반 인덱스 JSON 배열을 파싱합니다. 검색 그라운딩은
//! 사용하지 않습니다. 응답이 JSON 배열이 아니면 후보 앞쪽 20건을
//! 순서 그대로 반환합니다.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::gemini::GeminiClient;
use crate::history::HistoryEntry;

// ============================================================================
// Constants
// ============================================================================

/// 프롬프트에 포함할 최대 후보 수
const PROMPT_CANDIDATES: usize = 30;

/// 랭킹 결과 최대 길이 (파싱 실패 시 폴백 길이와 동일)
const MAX_RANKED: usize = 20;

// ============================================================================
// Ranking
// ============================================================================

/// 후보 리스트를 Gemini로 재정렬
///
/// 전송 실패는 에러로 전파되고, 파싱 실패는 후보 앞쪽 20건으로
/// 조용히 강등됩니다.
pub async fn rank_candidates(
    client: &GeminiClient,
    query: &str,
    candidates: &[HistoryEntry],
    now: DateTime<Utc>,
) -> Result<Vec<HistoryEntry>> {
    let pool = &candidates[..candidates.len().min(PROMPT_CANDIDATES)];
    let prompt = build_ranking_prompt(query, pool, now);

    let response = client.generate(&prompt).await?;
    tracing::debug!("Ranking response: {} chars", response.len());

    Ok(parse_ranking_response(&response, pool))
}

/// 랭킹 프롬프트 생성
///
/// 번호 매긴 리스트 (제목, URL, 방문 횟수, 경과 일수) + 1-기반
/// 인덱스 JSON 배열을 요구하는 지시문.
pub fn build_ranking_prompt(
    query: &str,
    candidates: &[HistoryEntry],
    now: DateTime<Utc>,
) -> String {
    let mut listing = String::new();
    for (i, entry) in candidates.iter().enumerate() {
        listing.push_str(&format!(
            "{}. \"{}\" | {} | visits: {} | last visited: {} days ago\n",
            i + 1,
            entry.title,
            entry.url,
            entry.visit_count,
            entry.days_since_visit(now),
        ));
    }

    format!(
        "You are ranking browser history entries by relevance to a user query.\n\n\
         Query: \"{query}\"\n\n\
         History entries:\n{listing}\n\
         Return a JSON array of the 1-based indices of the most relevant entries, \
         ordered from most to least relevant. Return between 10 and 20 indices. \
         Only use indices from 1 to {count}. \
         Respond with ONLY the JSON array, no other text.",
        query = query,
        listing = listing,
        count = candidates.len(),
    )
}

/// 랭킹 응답 파싱
///
/// 1-기반 인덱스를 후보 객체로 되돌립니다. 범위 밖 인덱스는 조용히
/// 버리고, 결과는 20건으로 제한합니다. JSON이 아니거나 배열이 아니면
/// 후보 앞쪽 20건을 그대로 반환합니다.
pub fn parse_ranking_response(response: &str, candidates: &[HistoryEntry]) -> Vec<HistoryEntry> {
    let parsed: serde_json::Value = match serde_json::from_str(response.trim()) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("Ranking response is not JSON ({}), keeping filter order", e);
            return candidates.iter().take(MAX_RANKED).cloned().collect();
        }
    };

    let indices = match parsed.as_array() {
        Some(arr) => arr,
        None => {
            tracing::warn!("Ranking response is not an array, keeping filter order");
            return candidates.iter().take(MAX_RANKED).cloned().collect();
        }
    };

    indices
        .iter()
        .filter_map(|v| v.as_u64())
        .filter(|&i| i >= 1 && i <= candidates.len() as u64)
        .map(|i| candidates[(i - 1) as usize].clone())
        .take(MAX_RANKED)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
