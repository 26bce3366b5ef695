//! 라인 소스 -- 디코더 출력 스트림을 라인 단위로 수집합니다.
//!
//! 외부 디코더 체인(rtl_fm | multimon-ng)의 stdout 또는 stdin을
//! `AsyncRead`로 받아, 개행으로 구분된 라인을 [`RawLine`]으로 감싸
//! `mpsc` 채널로 파이프라인에 전달합니다. 라인 외의 프레이밍은
//! 없습니다.
//!
//! 수집기는 자체 tokio 태스크에서 실행되며 EOF 또는 취소 시
//! 종료됩니다.

use std::time::SystemTime;

use bytes::Bytes;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::TelegramError;

/// 수집된 원시 디코더 라인
///
/// 소스가 생성하고 파서가 소비하는 일시적 데이터입니다.
#[derive(Debug, Clone)]
pub struct RawLine {
    /// 원시 라인 바이트 (개행 제외)
    pub data: Bytes,
    /// 수집 소스 식별자 (예: "decoder", "stdin")
    pub source: String,
    /// 수집 시각
    pub received_at: SystemTime,
}

impl RawLine {
    /// 새 RawLine을 생성합니다.
    pub fn new(data: impl Into<Bytes>, source: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            source: source.into(),
            received_at: SystemTime::now(),
        }
    }
}

/// 라인 수집기
///
/// 하나의 순서 있는 입력 스트림을 읽어 도착 순서 그대로 채널에
/// 넣습니다. 파이프라인의 FIFO 처리는 이 단일 소스에 의존합니다.
pub struct LineCollector {
    /// 수집된 라인 전송 채널
    tx: mpsc::Sender<RawLine>,
    /// 소스 식별자 (로그/RawLine에 표시)
    source: String,
    /// 허용 최대 라인 길이 (바이트). 초과 라인은 버립니다.
    max_line_length: usize,
    /// 종료 신호
    cancel: CancellationToken,
}

impl LineCollector {
    /// 새 수집기를 생성합니다.
    pub fn new(
        tx: mpsc::Sender<RawLine>,
        source: impl Into<String>,
        max_line_length: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            tx,
            source: source.into(),
            max_line_length,
            cancel,
        }
    }

    /// 스트림을 EOF 또는 취소까지 읽습니다.
    ///
    /// `tokio::spawn`으로 별도 태스크에서 호출하세요.
    pub async fn run<R>(self, reader: R) -> Result<(), TelegramError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let mut lines = BufReader::new(reader).lines();

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!(source = %self.source, "line collector cancelled");
                    return Ok(());
                }
                next = lines.next_line() => {
                    match next {
                        Ok(Some(line)) => {
                            if line.len() > self.max_line_length {
                                tracing::warn!(
                                    source = %self.source,
                                    length = line.len(),
                                    max = self.max_line_length,
                                    "dropping oversized line"
                                );
                                continue;
                            }
                            if line.trim().is_empty() {
                                continue;
                            }
                            let raw = RawLine::new(line.into_bytes(), self.source.clone());
                            if self.tx.send(raw).await.is_err() {
                                // 파이프라인이 먼저 종료된 경우
                                return Err(TelegramError::Channel(
                                    "line receiver closed".to_owned(),
                                ));
                            }
                        }
                        Ok(None) => {
                            tracing::info!(source = %self.source, "input stream ended");
                            return Ok(());
                        }
                        Err(e) => {
                            tracing::error!(source = %self.source, error = %e, "read failed");
                            return Err(TelegramError::Io(e));
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_line_creation() {
        let raw = RawLine::new(Bytes::from_static(b"ZVEI2: 25832"), "stdin");
        assert_eq!(raw.source, "stdin");
        assert_eq!(&raw.data[..], b"ZVEI2: 25832");
    }

    #[tokio::test]
    async fn collects_lines_in_order() {
        let (tx, mut rx) = mpsc::channel(16);
        let collector = LineCollector::new(tx, "test", 4096, CancellationToken::new());
        let input = b"ZVEI2: 25832\nZVEI2: 11111\n".as_slice();

        collector.run(input).await.unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(&first.data[..], b"ZVEI2: 25832");
        assert_eq!(&second.data[..], b"ZVEI2: 11111");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn skips_blank_lines() {
        let (tx, mut rx) = mpsc::channel(16);
        let collector = LineCollector::new(tx, "test", 4096, CancellationToken::new());
        let input = b"\n   \nZVEI2: 25832\n".as_slice();

        collector.run(input).await.unwrap();

        let only = rx.recv().await.unwrap();
        assert_eq!(&only.data[..], b"ZVEI2: 25832");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn drops_oversized_lines() {
        let (tx, mut rx) = mpsc::channel(16);
        let collector = LineCollector::new(tx, "test", 16, CancellationToken::new());
        let long = "X".repeat(64);
        let input = format!("{long}\nZVEI2: 25832\n");

        collector.run(input.as_bytes()).await.unwrap();

        let only = rx.recv().await.unwrap();
        assert_eq!(&only.data[..], b"ZVEI2: 25832");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn cancellation_stops_collector() {
        let (tx, _rx) = mpsc::channel(16);
        let cancel = CancellationToken::new();
        let collector = LineCollector::new(tx, "test", 4096, cancel.clone());

        // 끝나지 않는 스트림: duplex의 쓰기 측을 열어 둡니다.
        let (reader, _writer) = tokio::io::duplex(64);
        let handle = tokio::spawn(collector.run(reader));

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn closed_receiver_is_channel_error() {
        let (tx, rx) = mpsc::channel(16);
        drop(rx);
        let collector = LineCollector::new(tx, "test", 4096, CancellationToken::new());
        let result = collector.run(b"ZVEI2: 25832\n".as_slice()).await;
        assert!(matches!(result, Err(TelegramError::Channel(_))));
    }
}
