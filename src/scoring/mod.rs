//! 스코어링 모듈 - 도메인 스코어러, 키워드 필터, 폴백 스코어러
//!
//! 컨셉 시퀀스를 기반으로 히스토리 항목에 휴리스틱 점수를 부여합니다.
//! AI 스테이지가 실패하면 폴백 스코어러가 같은 입력으로 최종 결과를
//! 생성합니다.

pub mod domain;
pub mod fallback;
pub mod keyword;

pub use domain::{score_domain, HARD_EXCLUSION};
pub use fallback::{fallback_rank, FallbackWeights, CANDIDATE_FALLBACK, HISTORY_FALLBACK};
pub use keyword::{filter_and_score, ScoredEntry};
