//! hindsight - 브라우저 히스토리 AI 검색
//!
//! 자연어 쿼리를 브라우저 히스토리에 대해 랭킹하는 다단계 관련도
//! 파이프라인입니다. 컨셉 추출 + 휴리스틱 스코어링으로 후보를 추린 뒤
//! Gemini 랭킹과 검색 그라운딩 분석으로 최종 결과를 만들고, AI
//! 스테이지가 실패하면 휴리스틱 폴백으로 강등됩니다.

pub mod cli;
pub mod concepts;
pub mod gemini;
pub mod history;
pub mod pipeline;
pub mod scoring;

// Re-exports
pub use concepts::{extract_concepts, Concept};
pub use gemini::{
    annotate_citations, get_api_key, has_api_key, GeminiClient, GroundedResponse,
    GroundingMetadata,
};
pub use history::{
    HistoryEntry, HistorySource, JsonHistorySource, RankedResult, LOOKBACK_DAYS, MAX_RESULTS,
};
pub use pipeline::{SearchPipeline, StageError};
pub use scoring::{
    fallback_rank, filter_and_score, score_domain, FallbackWeights, ScoredEntry,
    CANDIDATE_FALLBACK, HARD_EXCLUSION, HISTORY_FALLBACK,
};
