//! 컨셉 추출 모듈 - 쿼리에서 가중치 있는 시맨틱 컨셉 추출
//!
//! 자연어 쿼리를 플랫폼 / 콘텐츠 카테고리 / 일반 키워드 컨셉의
//! 시퀀스로 변환합니다. 패턴 테이블은 프로세스 시작 시 한 번만
//! 컴파일되는 정적 상수입니다.

use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// Types
// ============================================================================

/// 쿼리에서 추출된 시맨틱 컨셉
///
/// 플랫폼(reddit, youtube 등), 콘텐츠 카테고리(video, tutorial 등),
/// 또는 일반 키워드 하나를 나타냅니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Concept {
    /// 컨셉 이름
    pub name: String,
    /// 매칭에 사용할 키워드 집합
    pub keywords: Vec<String>,
    /// 스코어링 가중치
    pub weight: f64,
    /// 플랫폼 컨셉 여부 (도메인 하드 제외 규칙에 사용)
    pub is_platform: bool,
}

/// 플랫폼 패턴 테이블 항목
pub struct PlatformPattern {
    pub name: &'static str,
    pub pattern: Regex,
    pub keywords: &'static [&'static str],
    pub weight: f64,
    /// 이 플랫폼에 속하는 호스트네임 접미사
    pub domains: &'static [&'static str],
}

/// 카테고리 패턴 테이블 항목
pub struct CategoryPattern {
    pub name: &'static str,
    pub pattern: Regex,
    pub keywords: &'static [&'static str],
    pub weight: f64,
}

// ============================================================================
// Static Tables
// ============================================================================

/// 플랫폼 패턴 테이블 (가중치 15~25)
pub static PLATFORM_PATTERNS: Lazy<Vec<PlatformPattern>> = Lazy::new(|| {
    fn p(
        name: &'static str,
        pattern: &str,
        keywords: &'static [&'static str],
        weight: f64,
        domains: &'static [&'static str],
    ) -> PlatformPattern {
        PlatformPattern {
            name,
            pattern: Regex::new(pattern).expect("invalid platform pattern"),
            keywords,
            weight,
            domains,
        }
    }

    vec![
        p(
            "reddit",
            r"\breddit\b|\br/\w+",
            &["reddit", "subreddit", "r/"],
            25.0,
            &["reddit.com"],
        ),
        p(
            "youtube",
            r"\byou\s?tube\b|\byt\b",
            &["youtube", "yt", "watch"],
            22.0,
            &["youtube.com", "youtu.be"],
        ),
        p(
            "twitter",
            r"\btwitter\b|\btweets?\b|\bx\.com\b",
            &["twitter", "tweet", "x.com"],
            20.0,
            &["twitter.com", "x.com"],
        ),
        p(
            "github",
            r"\bgit\s?hub\b|\brepo(?:sitor(?:y|ies))?\b",
            &["github", "repository", "repo", "git"],
            22.0,
            &["github.com", "gist.github.com"],
        ),
        p(
            "stackoverflow",
            r"\bstack\s?overflow\b",
            &["stackoverflow", "stack overflow"],
            20.0,
            &["stackoverflow.com", "stackexchange.com"],
        ),
        p(
            "linkedin",
            r"\blinked\s?in\b",
            &["linkedin"],
            18.0,
            &["linkedin.com"],
        ),
        p(
            "medium",
            r"\bmedium\b",
            &["medium"],
            15.0,
            &["medium.com"],
        ),
        p(
            "wikipedia",
            r"\bwiki(?:pedia)?\b",
            &["wikipedia", "wiki"],
            18.0,
            &["wikipedia.org"],
        ),
    ]
});

/// 콘텐츠 카테고리 패턴 테이블 (가중치 12~15)
pub static CATEGORY_PATTERNS: Lazy<Vec<CategoryPattern>> = Lazy::new(|| {
    fn c(
        name: &'static str,
        pattern: &str,
        keywords: &'static [&'static str],
        weight: f64,
    ) -> CategoryPattern {
        CategoryPattern {
            name,
            pattern: Regex::new(pattern).expect("invalid category pattern"),
            keywords,
            weight,
        }
    }

    vec![
        c(
            "video",
            r"\bvideos?\b|\bwatch(?:ed|ing)?\b|\bstream(?:ing)?\b",
            &["video", "watch", "stream"],
            15.0,
        ),
        c(
            "article",
            r"\barticles?\b|\bposts?\b|\bblog\b",
            &["article", "post", "blog"],
            12.0,
        ),
        c(
            "tutorial",
            r"\btutorials?\b|\bguides?\b|\bhow\s?to\b|\blearn(?:ing)?\b",
            &["tutorial", "guide", "how-to", "learn"],
            14.0,
        ),
        c(
            "documentation",
            r"\bdocs?\b|\bdocumentation\b|\breference\b|\bapi\b",
            &["docs", "documentation", "reference", "api"],
            14.0,
        ),
        c(
            "shopping",
            r"\bshop(?:ping)?\b|\bbuy(?:ing)?\b|\bpurchase\b|\bprice\b",
            &["shop", "buy", "price", "store", "cart"],
            13.0,
        ),
        c(
            "recipe",
            r"\brecipes?\b|\bcook(?:ing)?\b|\bbak(?:e|ing)\b",
            &["recipe", "cooking", "ingredients"],
            13.0,
        ),
        c(
            "news",
            r"\bnews\b|\bheadlines?\b|\bbreaking\b",
            &["news", "headline", "breaking"],
            12.0,
        ),
    ]
});

/// 불용어 집합 (일반 기능어 + 쿼리 프레이밍 동사)
pub static STOP_WORDS: &[&str] = &[
    "a", "an", "the", "i", "me", "my", "we", "our", "you", "your", "he", "she",
    "it", "its", "they", "them", "this", "that", "these", "those", "is", "are",
    "was", "were", "be", "been", "do", "does", "did", "have", "has", "had",
    "and", "or", "but", "for", "with", "from", "of", "to", "in", "on", "at",
    "about", "what", "which", "who", "how", "when", "where", "can", "could",
    "would", "should", "will", "find", "show", "want", "looking", "search",
    "get", "some",
];

/// 일반 컨셉(단일 키워드)의 기본 가중치
const GENERIC_WEIGHT: f64 = 10.0;

// ============================================================================
// Extraction
// ============================================================================

/// 쿼리에서 컨셉 시퀀스 추출
///
/// 1. 플랫폼 패턴 매칭 (is_platform=true)
/// 2. 카테고리 패턴 매칭
/// 3. 남은 토큰을 일반 컨셉으로 추가 (기존 컨셉 키워드에
///    양방향 부분문자열로 포섭되는 토큰은 건너뜀)
///
/// 추가된 컨셉은 제거되지 않으며, 각 패턴은 한 번만 테스트되므로
/// 플랫폼/카테고리 컨셉의 중복은 발생하지 않습니다.
pub fn extract_concepts(query: &str) -> Vec<Concept> {
    let lower = query.to_lowercase();
    let mut concepts: Vec<Concept> = Vec::new();

    for platform in PLATFORM_PATTERNS.iter() {
        if platform.pattern.is_match(&lower) {
            concepts.push(Concept {
                name: platform.name.to_string(),
                keywords: platform.keywords.iter().map(|k| k.to_string()).collect(),
                weight: platform.weight,
                is_platform: true,
            });
        }
    }

    for category in CATEGORY_PATTERNS.iter() {
        if category.pattern.is_match(&lower) {
            concepts.push(Concept {
                name: category.name.to_string(),
                keywords: category.keywords.iter().map(|k| k.to_string()).collect(),
                weight: category.weight,
                is_platform: false,
            });
        }
    }

    for token in lower.split_whitespace() {
        if token.len() <= 2 || STOP_WORDS.contains(&token) {
            continue;
        }

        // 양방향 부분문자열 포섭 검사. 의도적으로 느슨합니다:
        // 이 의미를 바꾸면 많은 쿼리의 랭킹이 달라집니다.
        let covered = concepts.iter().any(|c| {
            c.keywords
                .iter()
                .any(|k| k.contains(token) || token.contains(k.as_str()))
        });

        if !covered {
            concepts.push(Concept {
                name: token.to_string(),
                keywords: vec![token.to_string()],
                weight: GENERIC_WEIGHT,
                is_platform: false,
            });
        }
    }

    tracing::debug!("Extracted {} concepts from query", concepts.len());
    concepts
}

/// 쿼리를 불용어 제거된 소문자 토큰으로 분해
///
/// 키워드 필터의 리터럴 토큰 보너스 계산에 사용됩니다.
pub fn query_tokens(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.len() > 2 && !STOP_WORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// 이름으로 플랫폼 패턴 조회
pub fn platform_by_name(name: &str) -> Option<&'static PlatformPattern> {
    PLATFORM_PATTERNS.iter().find(|p| p.name == name)
}

/// 호스트네임이 속한 플랫폼 이름 반환 (없으면 None)
pub fn platform_of_host(host: &str) -> Option<&'static str> {
    PLATFORM_PATTERNS.iter().find_map(|p| {
        p.domains
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
            .then_some(p.name)
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_concept_extraction() {
        let concepts = extract_concepts("reddit post about python best practices");
        let reddit = concepts.iter().find(|c| c.name == "reddit");
        assert!(reddit.is_some());
        let reddit = reddit.expect("reddit concept");
        assert!(reddit.is_platform);
        assert!((reddit.weight - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_generic_concepts_survive() {
        let concepts = extract_concepts("reddit post about python best practices");
        assert!(concepts.iter().any(|c| c.name == "python"));
        assert!(concepts.iter().any(|c| c.name == "practices"));
    }

    #[test]
    fn test_stop_words_and_short_tokens_dropped() {
        let concepts = extract_concepts("find me a good ai page");
        // "find", "me", "a" 제거, "ai"는 길이 2로 제거
        assert!(!concepts.iter().any(|c| c.name == "find"));
        assert!(!concepts.iter().any(|c| c.name == "me"));
        assert!(!concepts.iter().any(|c| c.name == "ai"));
        assert!(concepts.iter().any(|c| c.name == "good"));
        assert!(concepts.iter().any(|c| c.name == "page"));
    }

    #[test]
    fn test_bidirectional_subsumption() {
        // "hub"은 github 키워드 "github"의 부분문자열이므로 포섭됨
        let concepts = extract_concepts("github hub stuff");
        assert!(!concepts.iter().any(|c| c.name == "hub"));
        assert!(concepts.iter().any(|c| c.name == "stuff"));
    }

    #[test]
    fn test_duplicate_tokens_deduplicated() {
        let concepts = extract_concepts("python python python");
        let count = concepts.iter().filter(|c| c.name == "python").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_category_extraction() {
        let concepts = extract_concepts("pasta recipe with tomatoes");
        let recipe = concepts.iter().find(|c| c.name == "recipe");
        assert!(recipe.is_some());
        assert!(!recipe.expect("recipe concept").is_platform);
    }

    #[test]
    fn test_no_concepts_removed_after_add() {
        // 플랫폼 + 카테고리 + 일반 컨셉이 모두 공존
        let concepts = extract_concepts("youtube video about cats");
        assert!(concepts.iter().any(|c| c.name == "youtube" && c.is_platform));
        assert!(concepts.iter().any(|c| c.name == "video" && !c.is_platform));
        assert!(concepts.iter().any(|c| c.name == "cats"));
    }

    #[test]
    fn test_query_tokens() {
        let tokens = query_tokens("Find me the BEST python tutorials");
        assert_eq!(tokens, vec!["best", "python", "tutorials"]);
    }

    #[test]
    fn test_platform_of_host() {
        assert_eq!(platform_of_host("reddit.com"), Some("reddit"));
        assert_eq!(platform_of_host("old.reddit.com"), Some("reddit"));
        assert_eq!(platform_of_host("youtu.be"), Some("youtube"));
        assert_eq!(platform_of_host("example.com"), None);
        // 접미사 검사는 서브도메인만 허용
        assert_eq!(platform_of_host("notreddit.com"), None);
    }

    #[test]
    fn test_platform_by_name() {
        assert!(platform_by_name("reddit").is_some());
        assert!(platform_by_name("myspace").is_none());
    }
}
