// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! A full odohd stack on loopback ports, backed by a mock UDP upstream.

#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use hickory_proto::op::{Message as DnsMessage, MessageType, OpCode, Query};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{Name, RData, Record, RecordType};
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinHandle;

use odoh_common::{KeyManager, KeyPair};
use odoh_proxy::{Proxy, ProxyConfig};
use odoh_target::{Target, TargetConfig, UdpResolver};
use odohd::metrics::PrometheusSink;
use odohd::routes;

pub const ANSWER_ADDR: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);

pub fn build_query(name: &str, id: u16) -> Vec<u8> {
    let mut msg = DnsMessage::new();
    msg.set_id(id)
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true);
    msg.add_query(Query::query(Name::from_ascii(name).unwrap(), RecordType::A));
    msg.to_vec().unwrap()
}

fn answer_for(query: &[u8]) -> Option<Vec<u8>> {
    let q = DnsMessage::from_vec(query).ok()?;
    let mut resp = DnsMessage::new();
    resp.set_id(q.id())
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(q.recursion_desired())
        .set_recursion_available(true);
    resp.add_queries(q.queries().to_vec());
    for question in q.queries() {
        resp.add_answer(Record::from_rdata(
            question.name().clone(),
            60,
            RData::A(A(ANSWER_ADDR)),
        ));
    }
    resp.to_vec().ok()
}

pub struct Stack {
    pub addr: SocketAddr,
    pub keys: Arc<KeyManager>,
    pub metrics: Arc<PrometheusSink>,
    tasks: Vec<JoinHandle<()>>,
}

impl Stack {
    pub async fn start() -> Self {
        let upstream = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let upstream_addr = upstream.local_addr().unwrap();
        let dns_task = tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            while let Ok((len, peer)) = upstream.recv_from(&mut buf).await {
                if let Some(reply) = answer_for(&buf[..len]) {
                    let _ = upstream.send_to(&reply, peer).await;
                }
            }
        });

        let metrics = Arc::new(PrometheusSink::new().unwrap());
        let keys = Arc::new(KeyManager::new(KeyPair::from_seed(&[0x5a; 32]).unwrap()).unwrap());
        let target = Arc::new(Target::new(
            Arc::clone(&keys),
            Arc::new(UdpResolver::new(upstream_addr.to_string())),
            metrics.clone(),
            TargetConfig::default(),
        ));
        let proxy = Arc::new(
            Proxy::new(
                ProxyConfig {
                    timeout: Duration::from_secs(2),
                    target_scheme: "http".to_string(),
                    ..Default::default()
                },
                metrics.clone(),
            )
            .unwrap(),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = routes::router(target, proxy);
        let http_task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            keys,
            metrics,
            tasks: vec![dns_task, http_task],
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for Stack {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
