//! 인용 주석기 - 생성 텍스트에 출처 인용 삽입
//!
//! 그라운딩 메타데이터의 문자 오프셋을 따라 출처 링크를 텍스트에
//! 끼워 넣습니다. 끝 오프셋 내림차순(오른쪽에서 왼쪽)으로 처리하여
//! 이미 삽입한 인용이 아직 처리하지 않은 앞쪽 오프셋을 무효화하지
//! 않도록 합니다.

use super::{GroundingMetadata, GroundingSupport};

/// 생성 텍스트에 출처 인용 삽입
///
/// 메타데이터 또는 supports/chunks가 비어 있으면 텍스트를 그대로
/// 반환합니다. 끝 오프셋이 없거나 참조 청크가 없는 support,
/// 텍스트 범위를 벗어나거나 문자 경계가 아닌 오프셋은 건너뜁니다.
pub fn annotate_citations(text: &str, metadata: Option<&GroundingMetadata>) -> String {
    let meta = match metadata {
        Some(m) => m,
        None => return text.to_string(),
    };
    if meta.supports.is_empty() || meta.chunks.is_empty() {
        return text.to_string();
    }

    let mut supports: Vec<&GroundingSupport> = meta
        .supports
        .iter()
        .filter(|s| support_end(s).is_some() && !s.chunk_indices.is_empty())
        .collect();

    // 끝 오프셋 내림차순: 뒤쪽 삽입이 앞쪽 오프셋을 흔들지 않음
    supports.sort_by(|a, b| support_end(b).cmp(&support_end(a)));

    let mut result = text.to_string();

    for support in supports {
        let end = match support_end(support) {
            Some(e) => e,
            None => continue,
        };
        if end > text.len() || !text.is_char_boundary(end) {
            continue;
        }

        let links: Vec<String> = support
            .chunk_indices
            .iter()
            .filter_map(|&i| meta.chunks.get(i))
            .filter_map(|chunk| chunk.web.as_ref())
            .map(|web| {
                let title = web.title.as_deref().unwrap_or(&web.uri);
                format!("[{}]({})", title, web.uri)
            })
            .collect();

        if links.is_empty() {
            continue;
        }

        result.insert_str(end, &links.join(", "));
    }

    result
}

fn support_end(support: &GroundingSupport) -> Option<usize> {
    support.segment.as_ref().and_then(|s| s.end_index)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::{GroundingChunk, Segment, WebSource};

    fn chunk(uri: &str, title: &str) -> GroundingChunk {
        GroundingChunk {
            web: Some(WebSource {
                uri: uri.to_string(),
                title: Some(title.to_string()),
            }),
        }
    }

    fn support(end: Option<usize>, indices: Vec<usize>) -> GroundingSupport {
        GroundingSupport {
            segment: Some(Segment { end_index: end }),
            chunk_indices: indices,
        }
    }

    #[test]
    fn test_no_metadata_is_identity() {
        assert_eq!(annotate_citations("hello world", None), "hello world");
    }

    #[test]
    fn test_empty_supports_is_identity() {
        let meta = GroundingMetadata {
            supports: vec![],
            chunks: vec![chunk("https://a.com", "A")],
        };
        assert_eq!(annotate_citations("hello", Some(&meta)), "hello");
    }

    #[test]
    fn test_single_citation_inserted_at_end_offset() {
        let meta = GroundingMetadata {
            supports: vec![support(Some(5), vec![0])],
            chunks: vec![chunk("https://a.com", "A")],
        };
        assert_eq!(
            annotate_citations("hello world", Some(&meta)),
            "hello[A](https://a.com) world"
        );
    }

    #[test]
    fn test_multiple_chunks_joined_with_comma() {
        let meta = GroundingMetadata {
            supports: vec![support(Some(5), vec![0, 1])],
            chunks: vec![chunk("https://a.com", "A"), chunk("https://b.com", "B")],
        };
        assert_eq!(
            annotate_citations("hello", Some(&meta)),
            "hello[A](https://a.com), [B](https://b.com)"
        );
    }

    #[test]
    fn test_right_to_left_preserves_earlier_offsets() {
        // 두 support: 오프셋 5와 11. 뒤쪽 삽입이 먼저 일어나야
        // 앞쪽 오프셋 5가 원문 기준으로 유효하게 남음
        let meta = GroundingMetadata {
            supports: vec![support(Some(5), vec![0]), support(Some(11), vec![1])],
            chunks: vec![chunk("https://a.com", "A"), chunk("https://b.com", "B")],
        };
        assert_eq!(
            annotate_citations("hello world", Some(&meta)),
            "hello[A](https://a.com) world[B](https://b.com)"
        );
    }

    #[test]
    fn test_support_without_end_offset_skipped() {
        let meta = GroundingMetadata {
            supports: vec![support(None, vec![0])],
            chunks: vec![chunk("https://a.com", "A")],
        };
        assert_eq!(annotate_citations("hello", Some(&meta)), "hello");
    }

    #[test]
    fn test_out_of_range_chunk_index_skipped() {
        let meta = GroundingMetadata {
            supports: vec![support(Some(5), vec![9])],
            chunks: vec![chunk("https://a.com", "A")],
        };
        assert_eq!(annotate_citations("hello", Some(&meta)), "hello");
    }

    #[test]
    fn test_offset_beyond_text_skipped() {
        let meta = GroundingMetadata {
            supports: vec![support(Some(100), vec![0])],
            chunks: vec![chunk("https://a.com", "A")],
        };
        assert_eq!(annotate_citations("hello", Some(&meta)), "hello");
    }

    #[test]
    fn test_non_char_boundary_offset_skipped() {
        // "한"은 UTF-8 3바이트: 오프셋 1은 문자 경계가 아님
        let meta = GroundingMetadata {
            supports: vec![support(Some(1), vec![0])],
            chunks: vec![chunk("https://a.com", "A")],
        };
        assert_eq!(annotate_citations("한글", Some(&meta)), "한글");
    }

    #[test]
    fn test_untitled_chunk_uses_uri() {
        let meta = GroundingMetadata {
            supports: vec![support(Some(5), vec![0])],
            chunks: vec![GroundingChunk {
                web: Some(WebSource {
                    uri: "https://a.com".to_string(),
                    title: None,
                }),
            }],
        };
        assert_eq!(
            annotate_citations("hello", Some(&meta)),
            "hello[https://a.com](https://a.com)"
        );
    }
}
