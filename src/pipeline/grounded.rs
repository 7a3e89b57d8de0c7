//! 그라운딩 분석 클라이언트 - 최종 결과 생성 및 출처 인용
//!
//! 후보 리스트를 Google 검색 그라운딩이 활성화된 엔드포인트에 보내
//! `{url, title, reason}` 객체의 엄격한 JSON 배열을 받습니다.
//! 성공 시 각 reason에 인용을 삽입하고 5건으로 자릅니다.
//!
//! 프롬프트는 후보 밖의 URL을 금지하지만, 반환된 URL이 실제로
//! 후보에 속하는지 사후 검증하지는 않습니다 (원 동작 유지).

use chrono::{DateTime, Utc};

use crate::gemini::{annotate_citations, GeminiClient};
use crate::history::{HistoryEntry, RankedResult, MAX_RESULTS};

use super::StageError;

/// 프롬프트에 포함할 최대 후보 수
const PROMPT_CANDIDATES: usize = 20;

// ============================================================================
// Analysis
// ============================================================================

/// 그라운딩 분석 실행
///
/// 전송 실패와 파싱 실패를 `StageError`로 구분해 반환하므로,
/// 오케스트레이터가 폴백 선택 사유를 로깅할 수 있습니다.
pub async fn analyze_candidates(
    client: &GeminiClient,
    query: &str,
    candidates: &[HistoryEntry],
    now: DateTime<Utc>,
) -> Result<Vec<RankedResult>, StageError> {
    let pool = &candidates[..candidates.len().min(PROMPT_CANDIDATES)];
    let prompt = build_grounded_prompt(query, pool, now);

    let response = client
        .generate_grounded(&prompt)
        .await
        .map_err(|e| StageError::Transport(e.to_string()))?;

    let mut results = parse_grounded_response(&response.text)?;

    for result in &mut results {
        result.reason = annotate_citations(&result.reason, response.grounding.as_ref());
    }

    results.truncate(MAX_RESULTS);
    Ok(results)
}

/// 그라운딩 프롬프트 생성
///
/// 번호 매긴 후보 리스트를 다시 서술하고, 리스트 밖의 URL 도입을
/// 명시적으로 금지하며, 엄격한 JSON 배열만 요구합니다.
pub fn build_grounded_prompt(
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
        "A user is searching their browser history. Analyze which of the pages \
         below best answer their query, using web search to understand what each \
         page is about if needed.\n\n\
         Query: \"{query}\"\n\n\
         Candidate pages (the ONLY pages you may return):\n{listing}\n\
         Rules:\n\
         - NEVER introduce a URL that is not in the candidate list above.\n\
         - For each selected page, write a short reason explaining why it matches \
         the query.\n\
         - Respond with ONLY a strict JSON array of objects: \
         [{{\"url\": \"...\", \"title\": \"...\", \"reason\": \"...\"}}]. \
         No markdown, no commentary.",
        query = query,
        listing = listing,
    )
}

/// 그라운딩 응답 파싱
///
/// 선행/후행 코드 펜스(```json 또는 ```)를 벗겨낸 뒤 JSON 배열로
/// 파싱합니다. 배열이 아니거나 파싱이 실패하면 `StageError`를
/// 반환해 후보 기반 폴백으로 이어집니다.
pub fn parse_grounded_response(text: &str) -> Result<Vec<RankedResult>, StageError> {
    let stripped = strip_code_fence(text);

    let parsed: serde_json::Value = serde_json::from_str(stripped)
        .map_err(|e| StageError::Malformed(format!("not valid JSON: {}", e)))?;

    if !parsed.is_array() {
        return Err(StageError::Malformed("response is not a JSON array".to_string()));
    }

    serde_json::from_value(parsed)
        .map_err(|e| StageError::Malformed(format!("array items do not match schema: {}", e)))
}

/// 선행/후행 코드 펜스 제거
fn strip_code_fence(text: &str) -> &str {
    let mut trimmed = text.trim();

    if let Some(rest) = trimmed.strip_prefix("```json") {
        trimmed = rest;
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        trimmed = rest;
    }

    if let Some(rest) = trimmed.strip_suffix("```") {
        trimmed = rest;
    }

    trimmed.trim()
}

// ============================================================================
// Tests
// ============================================================================
