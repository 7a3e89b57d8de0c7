//! 폴백 스코어러 - AI 스테이지 실패 시의 순수 휴리스틱 랭킹
//!
//! 두 폴백 변형(후보 기반 / 전체 히스토리 기반)은 가중치 상수만
//! 다르므로, 설정 구조체 하나로 파라미터화된 단일 스코어러로
//! 구현합니다.

use chrono::{DateTime, Utc};

use crate::history::{HistoryEntry, RankedResult, MAX_RESULTS};

// ============================================================================
// Configuration
// ============================================================================

/// 최근성 보너스 구간 (일수 상한 오름차순, 첫 매칭 구간만 적용)
#[derive(Debug, Clone, Copy)]
pub struct RecencyTier {
    pub max_days: i64,
    pub bonus: f64,
}

/// 폴백 스코어러 가중치 설정
#[derive(Debug, Clone, Copy)]
pub struct FallbackWeights {
    /// 토큰당 제목 매칭 보너스
    pub title_bonus: f64,
    /// 토큰당 URL 매칭 보너스
    pub url_bonus: f64,
    /// 방문 횟수 보너스 계수
    pub visit_multiplier: f64,
    /// 방문 횟수 보너스 상한
    pub visit_cap: f64,
    /// 최근성 보너스 구간
    pub recency_tiers: &'static [RecencyTier],
    /// reason 문자열에 방문 횟수 포함 여부
    pub show_visits: bool,
}

/// 전체 히스토리 기반 변형 (최후 폴백)
pub const HISTORY_FALLBACK: FallbackWeights = FallbackWeights {
    title_bonus: 10.0,
    url_bonus: 5.0,
    visit_multiplier: 0.1,
    visit_cap: 2.0,
    recency_tiers: &[],
    show_visits: false,
};

/// 후보 기반 변형 (그라운딩 분석 실패 시)
pub const CANDIDATE_FALLBACK: FallbackWeights = FallbackWeights {
    title_bonus: 15.0,
    url_bonus: 8.0,
    visit_multiplier: 0.2,
    visit_cap: 3.0,
    recency_tiers: &[
        RecencyTier { max_days: 7, bonus: 2.0 },
        RecencyTier { max_days: 30, bonus: 1.0 },
    ],
    show_visits: true,
};

// ============================================================================
// Ranking
// ============================================================================

/// 휴리스틱 폴백 랭킹
///
/// 쿼리를 소문자 토큰으로 분해하고 (불용어 제거 없음), 토큰별
/// 제목/URL 매칭 보너스와 방문/최근성 보너스를 합산합니다.
/// 점수 > 0인 항목을 내림차순으로 정렬해 상위 5건을 반환합니다.
pub fn fallback_rank(
    query: &str,
    entries: &[HistoryEntry],
    weights: &FallbackWeights,
    now: DateTime<Utc>,
) -> Vec<RankedResult> {
    let lower = query.to_lowercase();
    let tokens: Vec<&str> = lower.split_whitespace().collect();

    let mut scored: Vec<(f64, &HistoryEntry)> = entries
        .iter()
        .map(|entry| {
            let title = entry.title.to_lowercase();
            let url = entry.url.to_lowercase();

            let mut score = 0.0;
            for token in &tokens {
                if title.contains(token) {
                    score += weights.title_bonus;
                }
                if url.contains(token) {
                    score += weights.url_bonus;
                }
            }

            score += (entry.visit_count as f64 * weights.visit_multiplier).min(weights.visit_cap);

            let days = entry.days_since_visit(now);
            if let Some(tier) = weights.recency_tiers.iter().find(|t| days < t.max_days) {
                score += tier.bonus;
            }

            (score, entry)
        })
        .filter(|(score, _)| *score > 0.0)
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(MAX_RESULTS);

    scored
        .into_iter()
        .map(|(score, entry)| RankedResult {
            url: entry.url.clone(),
            title: entry.title.clone(),
            reason: if weights.show_visits {
                format!(
                    "키워드 매칭 점수 {:.1} (방문 {}회)",
                    score, entry.visit_count
                )
            } else {
                format!("키워드 매칭 점수 {:.1}", score)
            },
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
