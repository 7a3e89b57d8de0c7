//! 키워드 필터 - 컨셉 매칭 + 리터럴 토큰 + 방문 신호의 통합 스코어링
//!
//! 히스토리 항목마다 최종 관련도 점수를 계산해, 점수 > 0인 항목만
//! 내림차순으로 정렬해 반환합니다. 동점은 입력 순서를 유지합니다.

use chrono::{DateTime, Utc};

use crate::concepts::{query_tokens, Concept};
use crate::history::HistoryEntry;

use super::domain::score_domain;

// ============================================================================
// Types
// ============================================================================

/// 점수가 부여된 히스토리 항목
///
/// 중간 단계에서는 점수가 음수일 수 있습니다 (제외 신호).
/// url은 절대 변경되지 않습니다.
#[derive(Debug, Clone)]
pub struct ScoredEntry {
    pub entry: HistoryEntry,
    pub score: f64,
}

// ============================================================================
// Scoring Constants
// ============================================================================

/// 컨셉 매칭 부족 시 점수 축소 비율
const LOW_CONCEPT_PENALTY: f64 = 0.1;

/// 리터럴 토큰 보너스 (제목)
const TOKEN_TITLE_BONUS: f64 = 5.0;

/// 리터럴 토큰 보너스 (URL)
const TOKEN_URL_BONUS: f64 = 3.0;

/// 방문 횟수 보너스 계수 및 상한
const VISIT_MULTIPLIER: f64 = 0.05;
const VISIT_CAP: f64 = 2.0;

/// 최근 방문 보너스 (7일 이내)
const RECENCY_BONUS: f64 = 1.0;
const RECENCY_DAYS: i64 = 7;

// ============================================================================
// Filtering
// ============================================================================

/// 히스토리 항목을 스코어링하고 필터링
///
/// 항목별 계산 순서:
/// 1. 키워드가 소문자 제목 또는 URL에 포함된 각 컨셉의 가중치 합산
/// 2. 컨셉이 2개 이상 추출되었는데 매칭이 2개 미만이면 누적 점수 x0.1
/// 3. 불용어 제거된 쿼리 토큰별 제목 +5 / URL +3
///    (컨셉 매칭과 별개 - 리터럴 일치의 이중 가산은 의도된 동작)
/// 4. 방문 횟수 보너스 (0.05 x count, 최대 +2)
/// 5. 7일 이내 방문 시 +1
/// 6. 도메인 스코어러 출력 가산
///
/// 최종 점수 <= 0인 항목은 제거되며, 생존 항목은 내림차순 안정 정렬됩니다.
pub fn filter_and_score(
    query: &str,
    entries: &[HistoryEntry],
    concepts: &[Concept],
    now: DateTime<Utc>,
) -> Vec<ScoredEntry> {
    let tokens = query_tokens(query);

    let mut scored: Vec<ScoredEntry> = entries
        .iter()
        .map(|entry| {
            let title = entry.title.to_lowercase();
            let url = entry.url.to_lowercase();

            let mut score = 0.0;
            let mut concept_matches = 0;

            for concept in concepts {
                let hit = concept
                    .keywords
                    .iter()
                    .any(|k| title.contains(k.as_str()) || url.contains(k.as_str()));
                if hit {
                    concept_matches += 1;
                    score += concept.weight;
                }
            }

            // 2개 이상의 독립 컨셉이 맞지 않으면 쿼리가 충족되지 않은 것으로 취급
            if concepts.len() > 1 && concept_matches < 2 {
                score *= LOW_CONCEPT_PENALTY;
            }

            for token in &tokens {
                if title.contains(token.as_str()) {
                    score += TOKEN_TITLE_BONUS;
                }
                if url.contains(token.as_str()) {
                    score += TOKEN_URL_BONUS;
                }
            }

            score += (entry.visit_count as f64 * VISIT_MULTIPLIER).min(VISIT_CAP);

            if entry.days_since_visit(now) < RECENCY_DAYS {
                score += RECENCY_BONUS;
            }

            score += score_domain(&entry.url, concepts);

            ScoredEntry {
                entry: entry.clone(),
                score,
            }
        })
        .filter(|s| s.score > 0.0)
        .collect();

    // Vec::sort_by는 안정 정렬: 동점은 입력 순서 유지
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    tracing::debug!("Keyword filter kept {} of {} entries", scored.len(), entries.len());
    scored
}

// ============================================================================
// Tests
// ============================================================================
