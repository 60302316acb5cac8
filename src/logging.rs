use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::error;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{LogFormat, LogOutput, LogSettings};

/// 진단 로그 구독자를 초기화합니다.
///
/// 반환된 가드는 프로세스가 끝날 때까지 유지해야 버퍼에 남은 로그가 기록됩니다.
pub fn init_logging(settings: &LogSettings) -> io::Result<WorkerGuard> {
    let (writer, guard) = match &settings.output {
        LogOutput::Stdout => tracing_appender::non_blocking(io::stdout()),
        LogOutput::File(path) => tracing_appender::non_blocking(open_append(path)?),
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(LevelFilter::from_level(settings.level).into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(settings.output == LogOutput::Stdout)
        .with_target(true)
        .with_thread_ids(true);

    let result = match settings.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.with_file(true).with_line_number(true).try_init(),
    };
    if let Err(e) = result {
        // 테스트 등에서 이미 전역 구독자가 설정된 경우
        eprintln!("tracing 구독자 초기화 건너뜀: {}", e);
    }

    Ok(guard)
}

fn open_append(path: &Path) -> io::Result<std::fs::File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// 요청 한 건에 대한 접근 로그 레코드
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: OffsetDateTime,
    pub host: String,
    pub url_path: String,
    pub client: String,
    pub method: String,
    pub protocol: String,
    pub user_agent: String,
}

impl LogRecord {
    pub fn from_request<B>(req: &hyper::Request<B>, host: &str, client: &str) -> Self {
        let url_path = req
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.uri().to_string());

        Self {
            timestamp: OffsetDateTime::now_utc(),
            host: host.to_string(),
            url_path,
            client: client.to_string(),
            method: req.method().to_string(),
            protocol: format!("{:?}", req.version()),
            user_agent: req
                .headers()
                .get(hyper::header::USER_AGENT)
                .and_then(|h| h.to_str().ok())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let timestamp = self.timestamp.replace_nanosecond(0).unwrap_or(self.timestamp);
        let time = timestamp
            .format(&Rfc3339)
            .unwrap_or_else(|_| timestamp.unix_timestamp().to_string());

        write!(
            f,
            "Time: {}, Host: {}, URL Path: {}, Client IP: {}, Method: {}, Protocol: {}, User-Agent: {}",
            time, self.host, self.url_path, self.client, self.method, self.protocol, self.user_agent
        )
    }
}

/// 접근 로그 쓰기 스레드로 넘어가기 전에 쌓아둘 수 있는 최대 줄 수
const ACCESS_LOG_BUFFERED_LINES: usize = 128_000;

/// 접근 로그 레코드를 받는 추가 전용 저장소
pub trait AccessLog: Send + Sync {
    fn append(&self, record: &LogRecord);
}

/// 파일에 한 줄씩 추가하는 접근 로그
///
/// 쓰기는 백그라운드 스레드가 담당하며, 레코드 하나가 한 번의 쓰기로 전달되므로
/// 동시에 기록해도 줄이 섞이지 않습니다.
#[derive(Clone)]
pub struct FileAccessLog {
    writer: NonBlocking,
}

impl FileAccessLog {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<(Self, WorkerGuard)> {
        let file = open_append(path.as_ref())?;
        // 레코드를 버리지 않음. 대기 줄이 한도에 차면 append가 쓰기 스레드를 기다리며
        // 요청 처리 스레드가 그동안 멈춤
        let (writer, guard) = NonBlockingBuilder::default()
            .lossy(false)
            .buffered_lines_limit(ACCESS_LOG_BUFFERED_LINES)
            .thread_name("access-log")
            .finish(file);
        Ok((Self { writer }, guard))
    }
}

impl AccessLog for FileAccessLog {
    fn append(&self, record: &LogRecord) {
        let line = format!("{}\n", record);
        let mut writer = self.writer.clone();
        if let Err(e) = writer.write_all(line.as_bytes()) {
            error!(error = %e, "접근 로그 기록 실패");
        }
    }
}

impl fmt::Debug for FileAccessLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileAccessLog").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample_record() -> LogRecord {
        LogRecord {
            timestamp: datetime!(2024-03-01 12:30:45.123 UTC),
            host: "x.test".to_string(),
            url_path: "/a?b=c".to_string(),
            client: "203.0.113.9".to_string(),
            method: "POST".to_string(),
            protocol: "HTTP/1.1".to_string(),
            user_agent: "curl/8.0".to_string(),
        }
    }

    #[test]
    fn test_record_line_format() {
        assert_eq!(
            sample_record().to_string(),
            "Time: 2024-03-01T12:30:45Z, Host: x.test, URL Path: /a?b=c, Client IP: 203.0.113.9, \
             Method: POST, Protocol: HTTP/1.1, User-Agent: curl/8.0"
        );
    }

    #[test]
    fn test_record_from_request() {
        let req = hyper::Request::builder()
            .method("GET")
            .uri("/path?q=1")
            .header("User-Agent", "agent/1")
            .body(())
            .unwrap();

        let record = LogRecord::from_request(&req, "x.test:8080", "192.0.2.1");
        assert_eq!(record.host, "x.test:8080");
        assert_eq!(record.url_path, "/path?q=1");
        assert_eq!(record.method, "GET");
        assert_eq!(record.protocol, "HTTP/1.1");
        assert_eq!(record.user_agent, "agent/1");
    }

    #[test]
    fn test_file_access_log_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.log");
        std::fs::write(&path, "existing\n").unwrap();

        let (log, guard) = FileAccessLog::open(&path).unwrap();
        log.append(&sample_record());
        log.append(&sample_record());
        drop(guard);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "existing");
        assert!(lines[2].starts_with("Time: 2024-03-01T12:30:45Z, Host: x.test"));
    }

    #[test]
    fn test_concurrent_appends_keep_lines_whole() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 250;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.log");
        let (log, guard) = FileAccessLog::open(&path).unwrap();

        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        let record = LogRecord {
                            client: format!("10.0.{}.{}", t, i),
                            user_agent: format!("worker-{}/{}", t, "x".repeat(i % 64)),
                            ..sample_record()
                        };
                        log.append(&record);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        drop(log);
        drop(guard);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), THREADS * PER_THREAD);

        let mut per_thread = [0usize; THREADS];
        for line in lines {
            assert!(line.starts_with("Time: 2024-03-01T12:30:45Z, Host: x.test, "), "{}", line);
            let (_, agent) = line.rsplit_once(", User-Agent: worker-").expect(line);
            let (thread, padding) = agent.split_once('/').expect(line);
            assert!(padding.chars().all(|c| c == 'x'), "{}", line);
            assert_eq!(line.matches("Time: ").count(), 1, "{}", line);
            per_thread[thread.parse::<usize>().unwrap()] += 1;
        }
        assert!(per_thread.iter().all(|&count| count == PER_THREAD));
    }
}
