//! CLI 모듈
//!
//! hindsight CLI 명령어 정의 및 구현

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::concepts::extract_concepts;
use crate::gemini::{has_api_key, GeminiClient};
use crate::history::{HistorySource, JsonHistorySource};
use crate::pipeline::SearchPipeline;
use crate::scoring::filter_and_score;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "hindsight")]
#[command(version, about = "브라우저 히스토리 AI 검색", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 자연어 쿼리로 히스토리 검색
    Search {
        /// 검색 쿼리
        query: String,

        /// 히스토리 내보내기 파일 경로 (기본: ~/.hindsight/history.json)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// 키워드 필터 점수 진단 (네트워크 호출 없음)
    Score {
        /// 검색 쿼리
        query: String,

        /// 히스토리 내보내기 파일 경로
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// 표시할 항목 수
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// 상태 확인
    Status {
        /// 히스토리 내보내기 파일 경로
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Search { query, file } => cmd_search(&query, file).await,
        Commands::Score { query, file, top } => cmd_score(&query, file, top).await,
        Commands::Status { file } => cmd_status(file).await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 검색 명령어 (search)
///
/// 전체 파이프라인을 실행합니다. API 키가 없으면 휴리스틱 랭킹만
/// 사용합니다.
async fn cmd_search(query: &str, file: Option<PathBuf>) -> Result<()> {
    let source = history_source(file);
    let history = source
        .fetch()
        .await
        .context("히스토리 파일을 읽을 수 없습니다")?;

    if history.is_empty() {
        println!("[!] 최근 30일 내 히스토리가 없습니다.");
        return Ok(());
    }

    let client = if has_api_key() {
        Some(GeminiClient::from_env().context("Gemini 클라이언트 생성 실패")?)
    } else {
        println!("[!] API 키 미설정 - 휴리스틱 랭킹만 사용합니다.");
        println!("    설정: export GEMINI_API_KEY=your-key");
        None
    };

    println!("[*] 검색 중: \"{}\" ({} 항목)", query, history.len());

    let pipeline = SearchPipeline::new(client);

    // 전체 파이프라인 실패도 사용자에게는 안내 메시지로 전달
    let results = match pipeline.run(query, &history).await {
        Ok(results) => results,
        Err(e) => {
            tracing::error!("Pipeline failed: {:#}", e);
            println!("\n[!] 검색 처리 중 오류가 발생했습니다. 잠시 후 다시 시도해 주세요.");
            return Ok(());
        }
    };

    if results.is_empty() {
        println!("\n[!] 관련된 페이지를 찾지 못했습니다.");
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", results.len());

    for (i, result) in results.iter().enumerate() {
        println!("{}. {}", i + 1, result.title);
        println!("   URL: {}", result.url);
        println!("   이유: {}", truncate_text(&result.reason, 300));
        println!();
    }

    Ok(())
}

/// 점수 진단 명령어 (score)
///
/// 컨셉 추출과 키워드 필터 점수를 AI 호출 없이 보여줍니다.
async fn cmd_score(query: &str, file: Option<PathBuf>, top: usize) -> Result<()> {
    let source = history_source(file);
    let history = source
        .fetch()
        .await
        .context("히스토리 파일을 읽을 수 없습니다")?;

    let concepts = extract_concepts(query);

    println!("[*] 추출된 컨셉 ({} 개):", concepts.len());
    for concept in &concepts {
        let kind = if concept.is_platform { "플랫폼" } else { "일반" };
        println!(
            "    {} [{}] 가중치 {:.0} | 키워드: {}",
            concept.name,
            kind,
            concept.weight,
            concept.keywords.join(", ")
        );
    }

    let scored = filter_and_score(query, &history, &concepts, chrono::Utc::now());

    if scored.is_empty() {
        println!("\n[!] 양수 점수를 받은 항목이 없습니다.");
        return Ok(());
    }

    println!(
        "\n[OK] 상위 항목 ({} / {} 건):\n",
        scored.len().min(top),
        scored.len()
    );

    for s in scored.iter().take(top) {
        println!("  [{:>8.2}] {}", s.score, truncate_text(&s.entry.title, 60));
        println!("             {}", s.entry.url);
    }

    Ok(())
}

/// 상태 명령어 (status)
async fn cmd_status(file: Option<PathBuf>) -> Result<()> {
    println!("hindsight v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let source = history_source(file);
    println!("[*] 히스토리 파일: {}", source.path().display());

    match source.fetch().await {
        Ok(history) => {
            println!("[OK] 조회 윈도우 내 항목: {} 건", history.len());
        }
        Err(e) => {
            println!("[!] 히스토리 파일 읽기 실패: {}", e);
        }
    }

    if has_api_key() {
        println!("[OK] API 키: 설정됨");
    } else {
        println!("[!] API 키: 미설정");
        println!("    설정: export GEMINI_API_KEY=your-key");
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 히스토리 소스 생성 (경로 미지정 시 기본 경로)
fn history_source(file: Option<PathBuf>) -> JsonHistorySource {
    JsonHistorySource::new(file.unwrap_or_else(JsonHistorySource::default_path))
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_truncate_unicode() {
        let korean = "안녕하세요 세계";
        let truncated = truncate_text(korean, 5);
        assert_eq!(truncated, "안녕하세요...");
    }

    #[test]
    fn test_history_source_default_path() {
        let source = history_source(None);
        assert!(source.path().ends_with(".hindsight/history.json"));
    }
}
