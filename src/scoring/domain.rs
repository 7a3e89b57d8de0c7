//! 도메인 스코어러 - 호스트네임을 컨셉 시퀀스에 대해 평가
//!
//! 플랫폼 포함/제외 규칙을 적용한 숫자 보정값을 반환합니다.
//! 반환값은 클램핑 없이 항목의 전체 점수에 더해지며,
//! 하드 제외(-1000)는 다른 모든 양의 신호를 무효화합니다.

use once_cell::sync::Lazy;
use url::Url;

use crate::concepts::{platform_by_name, platform_of_host, Concept};

// ============================================================================
// Constants & Tables
// ============================================================================

/// 하드 제외 점수. 요청된 플랫폼과 불일치하는 항목을 제거합니다.
pub const HARD_EXCLUSION: f64 = -1000.0;

/// 플랫폼 매칭 보너스 (요청 플랫폼 하나당)
const PLATFORM_MATCH_BONUS: f64 = 100.0;

/// 명시적으로 요청되지 않은 일반 소셜 네트워크 패널티
const SOCIAL_PENALTY: f64 = -15.0;

/// 일반 유틸리티 도메인 패널티 (메일/구인구직/검색엔진)
const UTILITY_PENALTY: f64 = -25.0;

/// 도메인 키워드 매칭 보너스
const DOMAIN_KEYWORD_BONUS: f64 = 12.0;

/// 일반 소셜 네트워크 도메인
const GENERIC_SOCIAL: &[&str] = &["facebook.com", "instagram.com", "tiktok.com"];

/// 일반 유틸리티 도메인
const GENERAL_UTILITY: &[&str] = &[
    "mail.google.com",
    "gmail.com",
    "outlook.com",
    "outlook.live.com",
    "linkedin.com",
    "google.com",
    "bing.com",
    "duckduckgo.com",
];

/// 컨셉 이름 → 도메인 키워드 테이블
///
/// 컨셉이 쿼리에 나타났을 때, 호스트네임에 부분문자열로 포함된
/// 키워드 하나당 +12를 더합니다.
static DOMAIN_KEYWORDS: Lazy<Vec<(&'static str, &'static [&'static str])>> = Lazy::new(|| {
    vec![
        ("wallpaper", &["wallhaven", "unsplash", "pexels", "wallpaper"]),
        ("art", &["artstation", "deviantart", "behance", "pixiv"]),
        ("gaming", &["steam", "itch", "epicgames", "gamespot", "ign"]),
        ("tech", &["techcrunch", "arstechnica", "theverge", "wired"]),
        ("chatbot", &["openai", "chatgpt", "claude", "anthropic", "gemini"]),
    ]
});

// ============================================================================
// Scoring
// ============================================================================

/// URL의 호스트네임을 컨셉 시퀀스에 대해 스코어링
///
/// 규칙 적용 순서:
/// 1. 호스트네임 추출 실패(잘못된 URL) → 0
/// 2. 플랫폼이 요청된 경우: 매칭 플랫폼당 +100, 하나도 매칭되지 않으면
///    즉시 -1000 (다른 모든 규칙보다 우선)
/// 3. 플랫폼이 요청되지 않았는데 호스트가 알려진 플랫폼에 속하면 -1000
/// 4. 요청되지 않은 일반 소셜 -15, 일반 유틸리티 -25
/// 5. 컨셉별 도메인 키워드 매칭당 +12
pub fn score_domain(url: &str, concepts: &[Concept]) -> f64 {
    let host = match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(h) => h.to_lowercase(),
            None => return 0.0,
        },
        Err(_) => return 0.0,
    };

    let requested: Vec<&Concept> = concepts.iter().filter(|c| c.is_platform).collect();

    let mut score = 0.0;

    if !requested.is_empty() {
        let matched = requested
            .iter()
            .filter(|c| {
                platform_by_name(&c.name)
                    .map(|p| host_matches_any(&host, p.domains))
                    .unwrap_or(false)
            })
            .count();

        if matched == 0 {
            return HARD_EXCLUSION;
        }
        score += PLATFORM_MATCH_BONUS * matched as f64;
    } else if platform_of_host(&host).is_some() {
        // 쿼리가 플랫폼을 지정하지 않았는데 호스트가 알려진 플랫폼이면 제외
        return HARD_EXCLUSION;
    }

    if host_matches_any(&host, GENERIC_SOCIAL) && !host_requested(&host, concepts) {
        score += SOCIAL_PENALTY;
    }
    if host_matches_any(&host, GENERAL_UTILITY) && !host_requested(&host, concepts) {
        score += UTILITY_PENALTY;
    }

    for concept in concepts {
        if let Some((_, keywords)) = DOMAIN_KEYWORDS.iter().find(|(name, _)| *name == concept.name)
        {
            for keyword in keywords.iter() {
                if host.contains(keyword) {
                    score += DOMAIN_KEYWORD_BONUS;
                }
            }
        }
    }

    score
}

/// 호스트가 도메인 리스트 중 하나에 속하는지 (정확히 일치 또는 서브도메인)
fn host_matches_any(host: &str, domains: &[&str]) -> bool {
    domains
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
}

/// 호스트가 쿼리 컨셉 중 하나로 명시적으로 요청되었는지
fn host_requested(host: &str, concepts: &[Concept]) -> bool {
    concepts
        .iter()
        .any(|c| c.keywords.iter().any(|k| host.contains(k.as_str())))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concepts::extract_concepts;

    #[test]
    fn test_malformed_url_scores_zero() {
        let concepts = extract_concepts("reddit python");
        assert_eq!(score_domain("not a url", &concepts), 0.0);
        assert_eq!(score_domain("", &concepts), 0.0);
    }

    #[test]
    fn test_requested_platform_match_bonus() {
        let concepts = extract_concepts("reddit post about python");
        let score = score_domain("https://reddit.com/r/python", &concepts);
        assert!(score >= 100.0, "score was {}", score);
    }

    #[test]
    fn test_requested_platform_subdomain_match() {
        let concepts = extract_concepts("reddit post about python");
        let score = score_domain("https://old.reddit.com/r/python", &concepts);
        assert!(score >= 100.0);
    }

    #[test]
    fn test_hard_exclusion_when_platform_requested() {
        // reddit이 요청되었으므로 다른 모든 호스트는 하드 제외
        let concepts = extract_concepts("reddit post about python");
        assert_eq!(score_domain("https://example.com/python", &concepts), HARD_EXCLUSION);
        assert_eq!(score_domain("https://youtube.com/watch", &concepts), HARD_EXCLUSION);
    }

    #[test]
    fn test_hard_exclusion_for_unrequested_platform_host() {
        // 플랫폼 미요청 쿼리: 알려진 플랫폼 호스트는 제외
        let concepts = extract_concepts("python pandas dataframe");
        assert_eq!(score_domain("https://reddit.com/r/python", &concepts), HARD_EXCLUSION);
    }

    #[test]
    fn test_social_penalty() {
        let concepts = extract_concepts("cute cat pictures");
        let score = score_domain("https://facebook.com/cats", &concepts);
        assert_eq!(score, -15.0);
    }

    #[test]
    fn test_social_penalty_skipped_when_requested() {
        // "facebook"이 일반 컨셉으로 추출되면 패널티 면제
        let concepts = extract_concepts("facebook cat group");
        let score = score_domain("https://facebook.com/cats", &concepts);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_utility_penalty() {
        let concepts = extract_concepts("project report draft");
        let score = score_domain("https://mail.google.com/mail/u/0", &concepts);
        assert_eq!(score, -25.0);
    }

    #[test]
    fn test_domain_keyword_bonus() {
        let concepts = extract_concepts("wallpaper for desktop");
        let score = score_domain("https://wallhaven.cc/top", &concepts);
        assert_eq!(score, 12.0);
    }
}
