//! End-to-end tests: one in-process coordinator plus storage nodes on
//! ephemeral ports, driven over HTTP.

use minifs::common::{CoordinatorConfig, VolumeConfig};
use minifs::{Coordinator, Error, FileClient, Instance, LifecycleState, VolumeServer, SHARD_COUNT};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use std::path::Path;
use tempfile::TempDir;

struct Cluster {
    coord: Coordinator,
    url: String,
    nodes: Vec<VolumeServer>,
    dirs: Vec<TempDir>,
    client: FileClient,
}

impl Cluster {
    async fn start(nodes: usize) -> Cluster {
        let mut coord = Coordinator::new(CoordinatorConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            node_timeout_ms: 2_000,
            ..Default::default()
        });
        coord.start().await.unwrap();
        let url = format!("http://{}", coord.local_addr().unwrap());

        let mut cluster = Cluster {
            coord,
            client: FileClient::new(url.clone()),
            url,
            nodes: Vec::new(),
            dirs: Vec::new(),
        };
        for _ in 0..nodes {
            cluster.add_node().await;
        }
        cluster
    }

    async fn add_node(&mut self) {
        let dir = TempDir::new().unwrap();
        let id = format!("{:04}", self.nodes.len() + 1);
        let mut node = VolumeServer::new(
            id,
            VolumeConfig {
                bind_addr: "127.0.0.1:0".parse().unwrap(),
                data_path: dir.path().to_path_buf(),
                coordinator_url: self.url.clone(),
                ..Default::default()
            },
        )
        .unwrap();
        node.start().await.unwrap();
        self.nodes.push(node);
        self.dirs.push(dir);
    }

    async fn node_count(&self) -> u64 {
        self.client.status().await.unwrap()["nodes"].as_u64().unwrap()
    }

    async fn file_count(&self) -> u64 {
        self.client.status().await.unwrap()["files"].as_u64().unwrap()
    }

    /// Every stored shard of `name` across all node directories, keyed by index
    fn shards_on_disk(&self, name: &str) -> Vec<(usize, Vec<u8>)> {
        let mut found = Vec::new();
        for dir in &self.dirs {
            found.extend(shards_in(dir.path(), name));
        }
        found.sort_by_key(|(i, _)| *i);
        found
    }

    async fn shutdown(mut self) {
        for node in &mut self.nodes {
            node.stop().await;
        }
        self.coord.stop().await;
    }
}

fn shards_in(dir: &Path, name: &str) -> Vec<(usize, Vec<u8>)> {
    let prefix = format!("{}.", name);
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let file = e.file_name().to_string_lossy().to_string();
            let index = file.strip_prefix(&prefix)?.parse::<usize>().ok()?;
            Some((index, std::fs::read(e.path()).unwrap()))
        })
        .collect()
}

fn payload(n: usize) -> Vec<u8> {
    (0..n).map(|i| (i * 31 % 256) as u8).collect()
}

fn status_of(err: Error) -> u16 {
    match err {
        Error::UnexpectedStatus { status, .. } => status,
        other => panic!("expected an HTTP status error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_put_get_seven_bytes() {
    let cluster = Cluster::start(5).await;
    let data = vec![1u8, 2, 3, 4, 5, 6, 7];

    cluster.client.put("test", data.clone()).await.unwrap();
    let back = cluster.client.get("test").await.unwrap();
    assert_eq!(back.as_ref(), data.as_slice());

    cluster.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_round_trip_lengths() {
    let cluster = Cluster::start(7).await;

    for n in [0usize, 1, SHARD_COUNT - 1, SHARD_COUNT, SHARD_COUNT + 1, 1 << 20] {
        let name = format!("file-{}", n);
        let data = payload(n);
        cluster.client.put(&name, data.clone()).await.unwrap();
        let back = cluster.client.get(&name).await.unwrap();
        assert_eq!(back.len(), n);
        assert_eq!(back.as_ref(), data.as_slice(), "length {}", n);
    }
    assert_eq!(cluster.file_count().await, 6);

    cluster.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shard_layout_on_disk() {
    let cluster = Cluster::start(5).await;

    let data = payload(23);
    cluster.client.put("layout", data.clone()).await.unwrap();
    let shards = cluster.shards_on_disk("layout");
    let lens: Vec<usize> = shards.iter().map(|(_, s)| s.len()).collect();
    assert_eq!(lens, vec![4, 4, 4, 4, 7]);
    let indices: Vec<usize> = shards.iter().map(|(i, _)| *i).collect();
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    let joined: Vec<u8> = shards.into_iter().flat_map(|(_, s)| s).collect();
    assert_eq!(joined, data);

    // five nodes, five shards: one per node
    for dir in &cluster.dirs {
        assert_eq!(shards_in(dir.path(), "layout").len(), 1);
    }

    cluster.client.put("tiny", vec![9u8, 8, 7]).await.unwrap();
    let tiny = cluster.shards_on_disk("tiny");
    assert_eq!(tiny, vec![(0, vec![9u8, 8, 7])]);

    cluster.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_overwrite() {
    let cluster = Cluster::start(5).await;

    cluster.client.put("once", payload(10)).await.unwrap();
    for data in [payload(10), payload(3), payload(0), payload(4096)] {
        let err = cluster.client.put("once", data).await.unwrap_err();
        assert_eq!(status_of(err), 400);
    }
    assert_eq!(cluster.client.get("once").await.unwrap().as_ref(), payload(10).as_slice());

    cluster.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_writes_single_winner() {
    let cluster = Cluster::start(5).await;

    for round in 0..10 {
        let name = format!("race-{}", round);
        let (a, b) = tokio::join!(
            cluster.client.put(&name, payload(100)),
            cluster.client.put(&name, payload(200)),
        );
        let ok = [a.is_ok(), b.is_ok()].iter().filter(|x| **x).count();
        assert_eq!(ok, 1, "round {}", round);
        let loser = if a.is_err() { a } else { b };
        assert_eq!(status_of(loser.unwrap_err()), 400);
    }
    assert_eq!(cluster.file_count().await, 10);

    cluster.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_quorum_gating() {
    let mut cluster = Cluster::start(SHARD_COUNT - 1).await;
    assert_eq!(cluster.node_count().await, 4);

    let err = cluster.client.put("gated", payload(50)).await.unwrap_err();
    assert_eq!(status_of(err), 503);
    assert_eq!(cluster.file_count().await, 0);
    let err = cluster.client.get("gated").await.unwrap_err();
    assert_eq!(status_of(err), 404);

    cluster.add_node().await;
    assert_eq!(cluster.node_count().await, 5);
    cluster.client.put("gated", payload(50)).await.unwrap();
    assert_eq!(cluster.client.get("gated").await.unwrap().as_ref(), payload(50).as_slice());

    cluster.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_idempotent_registration() {
    let cluster = Cluster::start(5).await;
    let http = reqwest::Client::new();
    let url = format!("{}/register", cluster.url);
    let port = cluster.nodes[0].local_addr().unwrap().port();

    for _ in 0..2 {
        let resp = http
            .post(&url)
            .json(&serde_json::json!({ "id": "0001", "port": port }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 204);
    }
    assert_eq!(cluster.node_count().await, 5);

    let resp = http
        .post(&url)
        .json(&serde_json::json!({ "id": "toolong", "port": port }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = http.post(&url).body("not json").send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    assert_eq!(cluster.node_count().await, 5);

    cluster.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_partial_failure_is_visible_and_not_repaired() {
    let mut cluster = Cluster::start(5).await;

    cluster.nodes[2].stop().await;
    assert_eq!(cluster.nodes[2].state(), LifecycleState::Stopped);

    let data = payload(1000);
    let err = cluster.client.put("broken", data.clone()).await.unwrap_err();
    assert_eq!(status_of(err), 503);

    // the placement stays and the other shards stay where they landed
    assert_eq!(cluster.file_count().await, 1);
    assert_eq!(cluster.shards_on_disk("broken").len(), SHARD_COUNT - 1);
    assert!(shards_in(cluster.dirs[2].path(), "broken").is_empty());

    let err = cluster.client.get("broken").await.unwrap_err();
    assert_eq!(status_of(err), 500);

    let err = cluster.client.put("broken", data).await.unwrap_err();
    assert_eq!(status_of(err), 400);

    cluster.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_node_error_status_is_a_shard_failure() {
    let cluster = Cluster::start(SHARD_COUNT - 1).await;

    // a reachable node that refuses every shard
    let fail = || async { (StatusCode::INTERNAL_SERVER_ERROR, "disk failure") };
    let app = Router::new().route("/", get(fail).put(fail));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let resp = reqwest::Client::new()
        .post(format!("{}/register", cluster.url))
        .json(&serde_json::json!({ "id": "bad1", "port": port }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 204);
    assert_eq!(cluster.node_count().await, 5);

    // every placement needs all five nodes, the failing one included
    let data = payload(500);
    let err = cluster.client.put("refused", data.clone()).await.unwrap_err();
    assert_eq!(status_of(err), 503);
    assert_eq!(cluster.file_count().await, 1);
    assert_eq!(cluster.shards_on_disk("refused").len(), SHARD_COUNT - 1);

    let err = cluster.client.get("refused").await.unwrap_err();
    assert_eq!(status_of(err), 500);
    let err = cluster.client.put("refused", data).await.unwrap_err();
    assert_eq!(status_of(err), 400);

    cluster.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_validation_errors() {
    let cluster = Cluster::start(5).await;

    let err = cluster.client.put("", payload(10)).await.unwrap_err();
    assert_eq!(status_of(err), 400);
    let err = cluster.client.get("").await.unwrap_err();
    assert_eq!(status_of(err), 400);
    let err = cluster.client.get("unknown").await.unwrap_err();
    assert_eq!(status_of(err), 404);

    // no node could store these, so they are refused before placement
    for name in ["dir/file", "back\\slash"] {
        let err = cluster.client.put(name, payload(10)).await.unwrap_err();
        assert_eq!(status_of(err), 400, "{}", name);
    }
    assert_eq!(cluster.file_count().await, 0);

    cluster.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_names_needing_encoding() {
    let cluster = Cluster::start(5).await;

    let name = "quarterly report & notes.txt";
    cluster.client.put(name, payload(64)).await.unwrap();
    assert_eq!(cluster.client.get(name).await.unwrap().as_ref(), payload(64).as_slice());

    cluster.shutdown().await;
}
