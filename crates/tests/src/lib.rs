//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试 (线上格式)
//! - 配置 -> 信封构建链路
//! - 模拟 e2e 测试 (无需上游传感器)
//! - TCP 回环上的 peer 广播测试

#[cfg(test)]
mod contract_tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use contracts::{RawReading, SellerIdentity, DEFAULT_SAMPLE_KIND};
    use envelope::{EnvelopeBuilder, WireFormat};

    fn builder() -> EnvelopeBuilder {
        EnvelopeBuilder::new(
            Arc::new(SellerIdentity {
                seller_id: "pi-1".to_string(),
                label: "porch".to_string(),
                lat: 51.5,
                lon: -0.12,
            }),
            DEFAULT_SAMPLE_KIND,
        )
    }

    /// Peer wire format snapshot
    #[test]
    fn test_peer_line_snapshot() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let envelope = builder().build(&RawReading::new(1_700_000_000.9, 0.42), now);
        let line = WireFormat::Peer.encode(&envelope, now).unwrap();

        assert_eq!(
            std::str::from_utf8(&line).unwrap(),
            "{\"ts\":1700000000,\"ts_iso\":\"2023-11-14T22:13:20Z\",\"brightness\":0.42,\
             \"seller_id\":\"pi-1\",\"source\":\"pi-1\",\"label\":\"porch\",\"lat\":51.5,\
             \"lon\":-0.12,\"kind\":\"brightness_sample\"}\n"
        );
    }

    /// A reading without a usable timestamp is stamped with the tick time
    #[test]
    fn test_untimed_reading_uses_tick_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 5).unwrap();
        let envelope = builder().build(&RawReading::untimed(0.1), now);
        assert_eq!(envelope.ts, now.timestamp());
        assert_eq!(envelope.ts_iso, "2024-01-01T00:00:05Z");
    }
}

#[cfg(test)]
mod config_tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use config_loader::ConfigLoader;
    use contracts::RawReading;
    use envelope::EnvelopeBuilder;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    /// Environment -> NodeConfig -> EnvelopeBuilder
    #[test]
    fn test_env_config_drives_envelope() {
        let config = ConfigLoader::from_lookup(lookup(&[
            ("SELLER_ID", "pi-1"),
            ("SELLER_LABEL", "porch"),
            ("SELLER_LAT", "51.5"),
            ("SELLER_LON", "-0.12"),
            ("PI_BASE_URL", "http://127.0.0.1:8000"),
            ("BROADCAST_ENABLE", "yes"),
            ("BROADCAST_INTERVAL_SECONDS", "-1"),
            ("BROADCAST_SAMPLE_KIND", ""),
        ]))
        .unwrap();

        assert!(config.broadcast.enabled);
        assert_eq!(config.broadcast.interval(), Duration::from_secs(5));

        let builder = EnvelopeBuilder::new(
            Arc::new(config.seller.clone()),
            config.broadcast.sample_kind.clone(),
        );
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let envelope = builder.build(&RawReading::new(0.0, 0.10), now);

        assert_eq!(envelope.ts_iso, "2024-01-01T00:00:00Z");
        assert_eq!(envelope.kind, contracts::DEFAULT_SAMPLE_KIND);
        assert_eq!(envelope.source, "pi-1");
    }

    /// Missing identity is fatal before any loop starts
    #[test]
    fn test_missing_identity_is_rejected() {
        let err = ConfigLoader::from_lookup(lookup(&[("SELLER_ID", "pi-1")])).unwrap_err();
        assert_eq!(err.kind(), "config");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::Utc;
    use contracts::{NoticeKind, RawReading, SellerIdentity, DEFAULT_SAMPLE_KIND};
    use dispatcher::{Broadcaster, PeerRegistry, TickOutcome};
    use envelope::{EnvelopeBuilder, WireFormat};
    use ingestion::{MockReading, MockSensorSource};
    use peer_transport::{MockPeerTransport, MockTransportConfig};

    fn builder() -> EnvelopeBuilder {
        EnvelopeBuilder::new(
            Arc::new(SellerIdentity {
                seller_id: "pi-1".to_string(),
                label: "porch".to_string(),
                lat: 51.5,
                lon: -0.12,
            }),
            DEFAULT_SAMPLE_KIND,
        )
    }

    fn broadcaster(
        source: MockSensorSource,
        transport: &Arc<MockPeerTransport>,
    ) -> Broadcaster<MockSensorSource, PeerRegistry<MockPeerTransport>> {
        Broadcaster::new(
            "peers",
            Arc::new(source),
            PeerRegistry::new(Arc::clone(transport), "pi-1"),
            builder(),
            WireFormat::Peer,
            Duration::from_secs(5),
        )
    }

    /// End-to-end: MockSensorSource -> Broadcaster -> PeerRegistry -> MockPeerTransport
    ///
    /// 验证：
    /// 1. 只有已连接且账户有效的 peer 收到数据
    /// 2. 单个 peer 写失败不影响其他 peer
    /// 3. 写失败的 peer 收到 write_error 通知
    #[tokio::test]
    async fn test_e2e_fan_out_with_isolation() {
        let transport = Arc::new(MockPeerTransport::with_config(MockTransportConfig {
            fail_writes: vec!["b".to_string()],
            ..Default::default()
        }));
        transport.add_peer("a", true, true);
        transport.add_peer("b", true, true);
        transport.add_peer("c", true, true);
        transport.add_peer("pending", true, false);
        transport.add_peer("gone", false, true);

        let broadcaster = broadcaster(
            MockSensorSource::constant(RawReading::new(1_700_000_000.0, 0.42)),
            &transport,
        );

        let TickOutcome::Delivered(report) = broadcaster.tick(Utc::now()).await else {
            panic!("expected delivery");
        };
        assert_eq!(report.delivered.len(), 2);
        assert_eq!(report.failed.len(), 1);

        assert_eq!(transport.writes_to("a").len(), 1);
        assert_eq!(transport.writes_to("c").len(), 1);
        assert!(transport.writes_to("pending").is_empty());
        assert!(transport.writes_to("gone").is_empty());
        assert_eq!(transport.writes_to("a"), transport.writes_to("c"));

        let notices = transport.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].0, "b");
        assert_eq!(notices[0].1.kind, NoticeKind::WriteError);
        assert!(notices[0].1.message.starts_with("localsense node pi-1 unavailable"));

        let stats = broadcaster.metrics().snapshot();
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.write_failures, 1);
    }

    /// 无合格 peer 时不访问传感器
    #[tokio::test]
    async fn test_e2e_idle_without_peers() {
        let transport = Arc::new(MockPeerTransport::new());
        transport.add_peer("pending", true, false);

        let broadcaster = broadcaster(MockSensorSource::unreachable(), &transport);

        for _ in 0..3 {
            assert!(matches!(
                broadcaster.tick(Utc::now()).await,
                TickOutcome::NoSinks
            ));
        }
        assert!(transport.writes().is_empty());
        assert_eq!(broadcaster.metrics().snapshot().idle_ticks, 3);
    }

    /// 上游失败的 tick 被跳过，之后恢复
    #[tokio::test]
    async fn test_e2e_recovers_after_fetch_failure() {
        let transport = Arc::new(MockPeerTransport::new());
        transport.add_peer("a", true, true);

        let source = MockSensorSource::scripted(
            vec![MockReading::FetchError, MockReading::DecodeError],
            MockReading::Reading(RawReading::untimed(0.7)),
        );
        let broadcaster = broadcaster(source, &transport);

        assert!(matches!(
            broadcaster.tick(Utc::now()).await,
            TickOutcome::FetchFailed
        ));
        assert!(matches!(
            broadcaster.tick(Utc::now()).await,
            TickOutcome::FetchFailed
        ));
        assert!(matches!(
            broadcaster.tick(Utc::now()).await,
            TickOutcome::Delivered(_)
        ));

        let lines = transport.writes_to("a");
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_slice(&lines[0]).unwrap();
        assert_eq!(value["brightness"], 0.7);
        assert!(transport.notices().is_empty());
    }
}

#[cfg(test)]
mod loopback_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use contracts::{
        BroadcastConfig, PeerListenerConfig, RawReading, SellerIdentity, DEFAULT_PROTOCOL_ID,
    };
    use contracts::{PeerTransport, SinkId};
    use dispatcher::{Broadcaster, PeerRegistry, StreamRegistry, TickOutcome};
    use envelope::{EnvelopeBuilder, WireFormat};
    use ingestion::MockSensorSource;
    use peer_transport::{PeerTable, TcpPeerListener};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
    use tokio::net::tcp::OwnedReadHalf;
    use tokio::net::TcpStream;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn builder() -> EnvelopeBuilder {
        EnvelopeBuilder::new(
            Arc::new(SellerIdentity {
                seller_id: "pi-1".to_string(),
                label: "porch".to_string(),
                lat: 51.5,
                lon: -0.12,
            }),
            "brightness_sample",
        )
    }

    async fn connect(
        addr: std::net::SocketAddr,
        peer_id: &str,
        account_id: &str,
    ) -> (Lines<BufReader<OwnedReadHalf>>, tokio::net::tcp::OwnedWriteHalf) {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, mut write) = stream.into_split();
        let handshake = serde_json::json!({
            "peer_id": peer_id,
            "account_id": account_id,
            "protocol": DEFAULT_PROTOCOL_ID,
        });
        write
            .write_all(format!("{handshake}\n").as_bytes())
            .await
            .unwrap();
        (BufReader::new(read).lines(), write)
    }

    async fn next_json(lines: &mut Lines<BufReader<OwnedReadHalf>>) -> serde_json::Value {
        let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        serde_json::from_str(&line).unwrap()
    }

    /// TCP listener -> PeerTable -> PeerRegistry -> Broadcaster over loopback
    #[tokio::test]
    async fn test_loopback_broadcast_only_reaches_valid_peers() {
        let listener_config = PeerListenerConfig {
            bind: "127.0.0.1:0".to_string(),
            allowed_accounts: vec!["acct-ok".to_string()],
            handshake_timeout_ms: 2000,
            write_timeout_ms: 500,
        };
        let table = Arc::new(PeerTable::new());
        let listener = TcpPeerListener::bind(
            &listener_config,
            &BroadcastConfig::default(),
            "pi-1",
            Arc::clone(&table),
        )
        .await
        .unwrap();
        let addr = listener.local_addr().unwrap();

        let cancel = CancellationToken::new();
        let listener_task = tokio::spawn(listener.run(cancel.child_token()));

        let (mut good, _good_write) = connect(addr, "buyer-ok", "acct-ok").await;
        let hello = next_json(&mut good).await;
        assert_eq!(hello["type"], "hello");
        assert_eq!(hello["seller_id"], "pi-1");

        let (mut bad, _bad_write) = connect(addr, "buyer-bad", "acct-unknown").await;
        let notice = next_json(&mut bad).await;
        assert_eq!(notice["type"], "error");
        assert_eq!(notice["kind"], "validation_error");

        let broadcaster = Broadcaster::new(
            "peers",
            Arc::new(MockSensorSource::constant(RawReading::new(
                1_700_000_000.0,
                0.42,
            ))),
            PeerRegistry::new(Arc::clone(&table), "pi-1"),
            builder(),
            WireFormat::Peer,
            Duration::from_secs(1),
        );
        let broadcaster_task = tokio::spawn(broadcaster.run(cancel.child_token()));

        let sample = next_json(&mut good).await;
        assert_eq!(sample["ts"], 1_700_000_000);
        assert_eq!(sample["source"], "pi-1");
        assert_eq!(sample["kind"], "brightness_sample");

        // The rejected peer never receives samples
        let nothing = tokio::time::timeout(Duration::from_millis(1500), bad.next_line()).await;
        assert!(nothing.is_err());

        cancel.cancel();
        let stats = broadcaster_task.await.unwrap().unwrap();
        assert!(stats.delivered >= 1);
        listener_task.await.unwrap().unwrap();
    }

    /// A peer that never reads cannot hold up delivery to the others
    #[tokio::test]
    async fn test_stalled_peer_does_not_block_fan_out() {
        use tokio::io::AsyncReadExt;

        let table = Arc::new(PeerTable::with_write_timeout(Duration::from_millis(100)));
        let (stalled, _stalled_server) = tokio::io::duplex(8);
        let (healthy, mut healthy_server) = tokio::io::duplex(4096);
        let a = table.insert("a", "0.0.7", None, stalled);
        let b = table.insert("b", "0.0.7", None, healthy);
        table.set_account_valid("a", a, true);
        table.set_account_valid("b", b, true);

        let broadcaster = Broadcaster::new(
            "peers",
            Arc::new(MockSensorSource::constant(RawReading::new(
                1_700_000_000.0,
                0.42,
            ))),
            PeerRegistry::new(Arc::clone(&table), "pi-1"),
            builder(),
            WireFormat::Peer,
            Duration::from_secs(1),
        );

        let outcome = tokio::time::timeout(Duration::from_secs(3), broadcaster.tick(chrono::Utc::now()))
            .await
            .expect("tick must not hang on a stalled peer");
        let TickOutcome::Delivered(report) = outcome else {
            panic!("expected delivery");
        };
        assert_eq!(report.delivered, vec![SinkId::from("b")]);
        assert_eq!(report.failed, vec![SinkId::from("a")]);

        let mut buf = vec![0u8; 4096];
        let n = tokio::time::timeout(Duration::from_secs(1), healthy_server.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf[..n]).unwrap();
        assert_eq!(value["ts"], 1_700_000_000);

        let peers = table.peers();
        let stalled = peers.iter().find(|p| p.peer_id == "a").unwrap();
        assert!(!stalled.connected);
        assert!(peers.iter().find(|p| p.peer_id == "b").unwrap().connected);
    }

    /// 客户端断开后 stream 广播器退出
    #[tokio::test]
    async fn test_stream_broadcaster_stops_when_client_leaves() {
        let (tx, mut rx) = mpsc::channel(4);
        let broadcaster = Broadcaster::new(
            "stream",
            Arc::new(MockSensorSource::constant(RawReading::untimed(0.3))),
            StreamRegistry::new(tx),
            builder(),
            WireFormat::Stream,
            Duration::from_secs(1),
        );
        let cancel = CancellationToken::new();
        let task = tokio::spawn(broadcaster.run(cancel.clone()));

        let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&first).unwrap();
        assert_eq!(value["brightness"], 0.3);
        assert!(value["time_iso"].is_string());

        drop(rx);
        // Closed sink: idle ticks until cancelled
        tokio::time::sleep(Duration::from_millis(1500)).await;
        cancel.cancel();
        let stats = task.await.unwrap().unwrap();
        assert_eq!(stats.delivered, 1);
        assert!(stats.idle_ticks >= 1);
    }
}
