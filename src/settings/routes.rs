use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::routing::RouteEntry;
use super::{Result, SettingsError};

/// `host -> url` 형식의 라우트 파일을 읽습니다.
///
/// URL 자체의 검증은 [`RouteTable::build`](crate::routing::RouteTable::build)가 담당합니다.
pub async fn load_route_file<P: AsRef<Path>>(path: P) -> Result<Vec<RouteEntry>> {
    let content = fs::read_to_string(&path).await.map_err(|e| SettingsError::FileError {
        path: path.as_ref().to_string_lossy().to_string(),
        error: e,
    })?;
    Ok(parse_route_lines(&content))
}

/// 라우트 파일 본문을 선언 순서대로 항목 목록으로 변환합니다.
///
/// `#`로 시작하는 줄과 빈 줄은 무시하고, `->`로 정확히 두 부분으로 나뉘지 않는 줄은 버립니다.
pub fn parse_route_lines(content: &str) -> Vec<RouteEntry> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.starts_with('#') && !line.trim().is_empty())
        .filter_map(|(index, line)| {
            let parts: Vec<&str> = line.split("->").collect();
            match parts.as_slice() {
                [host, target] => Some(RouteEntry::new(host.trim(), target.trim())),
                _ => {
                    debug!(line = index + 1, content = %line, "형식이 잘못된 라우트 줄 무시");
                    None
                }
            }
        })
        .collect()
}
