//! 파이프라인 통합 테스트 -- 디코더 라인에서 플러그인 전달까지

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use funkwache_core::error::{FunkwacheError, PluginError};
use funkwache_core::event::{AlarmEvent, Protocol};
use funkwache_core::plugin::{AlarmPlugin, DynAlarmPlugin, PluginInfo, PluginKind};
use funkwache_telegram::config::PipelineConfig;
use funkwache_telegram::describe::DescriptionTable;
use funkwache_telegram::filter::{FilterLoader, FilterRule};
use funkwache_telegram::pipeline::TelegramPipelineBuilder;
use funkwache_telegram::source::{LineCollector, RawLine};

/// 전달된 이벤트를 기록하는 테스트 플러그인
struct RecordingPlugin {
    info: PluginInfo,
    seen: Arc<Mutex<Vec<AlarmEvent>>>,
    fail: bool,
}

impl RecordingPlugin {
    fn new(name: &str) -> (Self, Arc<Mutex<Vec<AlarmEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let plugin = Self {
            info: PluginInfo {
                name: name.to_owned(),
                version: "0.1.0".to_owned(),
                description: "recording test plugin".to_owned(),
                kind: PluginKind::Custom("test".to_owned()),
            },
            seen: seen.clone(),
            fail: false,
        };
        (plugin, seen)
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl AlarmPlugin for RecordingPlugin {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    async fn init(&mut self) -> Result<(), FunkwacheError> {
        Ok(())
    }

    async fn deliver(&self, event: &AlarmEvent) -> Result<(), FunkwacheError> {
        if self.fail {
            return Err(PluginError::DeliveryFailed {
                name: self.info.name.clone(),
                reason: "always failing".to_owned(),
            }
            .into());
        }
        self.seen.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn stop(&self) -> Result<(), FunkwacheError> {
        Ok(())
    }
}

fn into_shared(plugins: Vec<RecordingPlugin>) -> Vec<Arc<dyn DynAlarmPlugin>> {
    plugins
        .into_iter()
        .map(|p| Arc::new(p) as Arc<dyn DynAlarmPlugin>)
        .collect()
}

/// 문서화된 열 위치에 필드를 배치한 FMS 덤프 라인을 만듭니다.
fn fms_line(
    service: &str,
    region: &str,
    location: &str,
    vehicle: &str,
    status: &str,
    direction: &str,
) -> String {
    fn pad_to(line: &mut String, column: usize) {
        while line.len() < column {
            line.push(' ');
        }
    }

    let mut line = String::from("FMS: 43f314170000 (");
    pad_to(&mut line, 19);
    line.push_str(service);
    pad_to(&mut line, 36);
    line.push_str(region);
    pad_to(&mut line, 65);
    line.push_str(location);
    pad_to(&mut line, 72);
    line.push_str(vehicle);
    pad_to(&mut line, 84);
    line.push_str(status);
    pad_to(&mut line, 101);
    line.push_str(direction);
    pad_to(&mut line, 114);
    line.push_str("III)");
    line.push_str(" CRC correct");
    line
}

async fn run_lines(
    lines: &[&str],
    config: PipelineConfig,
    rules: Vec<FilterRule>,
    descriptions: DescriptionTable,
    plugins: Vec<Arc<dyn DynAlarmPlugin>>,
) {
    let (mut pipeline, line_tx) = TelegramPipelineBuilder::new()
        .config(config)
        .plugins(plugins)
        .filter_rules(rules)
        .descriptions(descriptions)
        .build()
        .unwrap();

    for line in lines {
        line_tx
            .send(RawLine::new(Bytes::from(line.to_string()), "test"))
            .await
            .unwrap();
    }
    drop(line_tx);

    pipeline.run().await.unwrap();
    pipeline.shutdown().await;
}

#[tokio::test]
async fn zvei_line_reaches_all_plugins() {
    let (plugin_a, seen_a) = RecordingPlugin::new("a");
    let (plugin_b, seen_b) = RecordingPlugin::new("b");

    let config = PipelineConfig {
        frequency_hz: 172_500_000,
        ..Default::default()
    };

    run_lines(
        &["ZVEI2: 25832"],
        config,
        Vec::new(),
        DescriptionTable::new(),
        into_shared(vec![plugin_a, plugin_b]),
    )
    .await;

    for seen in [seen_a, seen_b] {
        let events = seen.lock().unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.protocol, Protocol::Zvei);
        assert_eq!(event.frequency_hz, 172_500_000);
        assert_eq!(event.field("zvei").as_deref(), Some("25832"));
    }
}

#[tokio::test]
async fn repeat_tone_is_resolved_before_dispatch() {
    let (plugin, seen) = RecordingPlugin::new("out");

    run_lines(
        &["ZVEI2: 25F32"],
        PipelineConfig::default(),
        Vec::new(),
        DescriptionTable::new(),
        into_shared(vec![plugin]),
    )
    .await;

    let events = seen.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].field("zvei").as_deref(), Some("25532"));
}

#[tokio::test]
async fn fms_line_is_parsed_and_dispatched() {
    let (plugin, seen) = RecordingPlugin::new("out");

    run_lines(
        &[&fms_line("9", "3", "25", "7141", "3", "0")],
        PipelineConfig::default(),
        Vec::new(),
        DescriptionTable::new(),
        into_shared(vec![plugin]),
    )
    .await;

    let events = seen.lock().unwrap();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.protocol, Protocol::Fms);
    assert_eq!(event.field("vehicle").as_deref(), Some("7141"));
    assert_eq!(event.field("status").as_deref(), Some("3"));
    assert_eq!(event.field("direction_text").as_deref(), Some("FZG -> LST"));
}

#[tokio::test]
async fn crc_failed_fms_line_is_discarded() {
    let (plugin, seen) = RecordingPlugin::new("out");
    let line = fms_line("9", "3", "25", "7141", "3", "0").replace("CRC correct", "CRC incorrect");

    run_lines(
        &[&line],
        PipelineConfig::default(),
        Vec::new(),
        DescriptionTable::new(),
        into_shared(vec![plugin]),
    )
    .await;

    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_zvei_burst_dispatches_once() {
    let (plugin, seen) = RecordingPlugin::new("out");

    run_lines(
        &["ZVEI2: 25832", "ZVEI2: 25832", "ZVEI2: 25832"],
        PipelineConfig::default(),
        Vec::new(),
        DescriptionTable::new(),
        into_shared(vec![plugin]),
    )
    .await;

    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_pocsag_pages_all_dispatch() {
    let (plugin, seen) = RecordingPlugin::new("out");
    let line = "POCSAG1200: Address: 1234567  Function: 0  Alpha:   Probealarm";

    run_lines(
        &[line, line, line],
        PipelineConfig::default(),
        Vec::new(),
        DescriptionTable::new(),
        into_shared(vec![plugin]),
    )
    .await;

    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn failing_plugin_does_not_stop_delivery_to_later_plugins() {
    let (broken, _) = RecordingPlugin::new("broken");
    let (healthy, seen) = RecordingPlugin::new("healthy");

    run_lines(
        &["ZVEI2: 25832"],
        PipelineConfig::default(),
        Vec::new(),
        DescriptionTable::new(),
        into_shared(vec![broken.failing(), healthy]),
    )
    .await;

    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn filter_rules_gate_individual_plugins() {
    let (gated, seen_gated) = RecordingPlugin::new("gated");
    let (open, seen_open) = RecordingPlugin::new("open");

    let yaml = r#"
filters:
  - name: own_loop_only
    protocol: zvei
    field: zvei
    plugin: gated
    pattern: "^258"
"#;
    let rules = FilterLoader::parse_yaml(yaml, "test.yaml").unwrap();

    run_lines(
        &["ZVEI2: 25832", "ZVEI2: 99999"],
        PipelineConfig::default(),
        rules,
        DescriptionTable::new(),
        into_shared(vec![gated, open]),
    )
    .await;

    // gated는 25832만, open은 둘 다 수신합니다.
    assert_eq!(seen_gated.lock().unwrap().len(), 1);
    assert_eq!(seen_open.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn enrichment_is_visible_to_plugins() {
    let (plugin, seen) = RecordingPlugin::new("out");

    let mut descriptions = DescriptionTable::new();
    descriptions
        .parse_yaml(Protocol::Zvei, "\"25832\": FF Musterstadt\n", "test")
        .unwrap();

    let config = PipelineConfig {
        zvei_describe: true,
        ..Default::default()
    };

    run_lines(
        &["ZVEI2: 25832"],
        config,
        Vec::new(),
        descriptions,
        into_shared(vec![plugin]),
    )
    .await;

    let events = seen.lock().unwrap();
    assert_eq!(
        events[0].field("description").as_deref(),
        Some("FF Musterstadt")
    );
}

#[tokio::test]
async fn pipeline_with_no_plugins_consumes_stream() {
    let (mut pipeline, line_tx) = TelegramPipelineBuilder::new().build().unwrap();

    line_tx
        .send(RawLine::new(Bytes::from_static(b"ZVEI2: 25832"), "test"))
        .await
        .unwrap();
    drop(line_tx);

    pipeline.run().await.unwrap();
    pipeline.shutdown().await;
    assert_eq!(pipeline.dispatched_count(), 1);
}

#[tokio::test]
async fn collector_to_pipeline_end_to_end() {
    // 라인 수집기 -> 채널 -> 파이프라인 -> 플러그인 전체 경로
    let (plugin, seen) = RecordingPlugin::new("out");
    let cancel = CancellationToken::new();

    let (mut pipeline, line_tx) = TelegramPipelineBuilder::new()
        .plugins(into_shared(vec![plugin]))
        .cancel_token(cancel.clone())
        .build()
        .unwrap();

    let collector = LineCollector::new(line_tx, "stdin", 4096, cancel.clone());
    let input = b"multimon-ng: Enabled demodulators\nZVEI2: 25832\nZVEI2: 25833\n".as_slice();

    let collector_task = tokio::spawn(collector.run(input));
    pipeline.run().await.unwrap();
    pipeline.shutdown().await;
    collector_task.await.unwrap().unwrap();

    let events = seen.lock().unwrap();
    assert_eq!(events.len(), 2);
    // 도착 순서가 보존됩니다.
    assert_eq!(events[0].field("zvei").as_deref(), Some("25832"));
    assert_eq!(events[1].field("zvei").as_deref(), Some("25833"));
}

#[tokio::test]
async fn mixed_protocol_stream_routes_each_family() {
    let (plugin, seen) = RecordingPlugin::new("out");
    let fms = fms_line("9", "3", "25", "7141", "3", "0");

    run_lines(
        &[
            "ZVEI2: 25832",
            &fms,
            "POCSAG512: Address:   54321  Function: 2  Alpha:   Einsatz",
        ],
        PipelineConfig::default(),
        Vec::new(),
        DescriptionTable::new(),
        into_shared(vec![plugin]),
    )
    .await;

    let events = seen.lock().unwrap();
    assert_eq!(events.len(), 3);
    let protocols: Vec<Protocol> = events.iter().map(|e| e.protocol).collect();
    assert!(protocols.contains(&Protocol::Zvei));
    assert!(protocols.contains(&Protocol::Fms));
    assert!(protocols.contains(&Protocol::Pocsag));
}

#[tokio::test]
async fn slow_plugin_does_not_block_pipeline_loop() {
    struct SlowPlugin {
        info: PluginInfo,
    }

    impl AlarmPlugin for SlowPlugin {
        fn info(&self) -> &PluginInfo {
            &self.info
        }
        async fn init(&mut self) -> Result<(), FunkwacheError> {
            Ok(())
        }
        async fn deliver(&self, _event: &AlarmEvent) -> Result<(), FunkwacheError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(())
        }
        async fn stop(&self) -> Result<(), FunkwacheError> {
            Ok(())
        }
    }

    let slow: Arc<dyn DynAlarmPlugin> = Arc::new(SlowPlugin {
        info: PluginInfo {
            name: "slow".to_owned(),
            version: "0.1.0".to_owned(),
            description: "never finishes".to_owned(),
            kind: PluginKind::Custom("test".to_owned()),
        },
    });

    let config = PipelineConfig {
        shutdown_grace_secs: 0,
        ..Default::default()
    };
    let (mut pipeline, line_tx) = TelegramPipelineBuilder::new()
        .config(config)
        .plugins(vec![slow])
        .build()
        .unwrap();

    // 느린 플러그인이 있어도 수집 루프는 스트림을 모두 소비합니다.
    for code in ["25832", "11111", "22222"] {
        line_tx
            .send(RawLine::new(
                Bytes::from(format!("ZVEI2: {code}")),
                "test",
            ))
            .await
            .unwrap();
    }
    drop(line_tx);

    let started = std::time::Instant::now();
    pipeline.run().await.unwrap();
    pipeline.shutdown().await;

    assert_eq!(pipeline.dispatched_count(), 3);
    assert!(started.elapsed() < Duration::from_secs(30));
}
