// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Client -> proxy -> target -> upstream, all over loopback HTTP.

mod helpers;

use hickory_proto::op::Message as DnsMessage;
use hickory_proto::rr::RData;
use rand::rngs::OsRng;

use odoh_common::{
    encrypt_query, KeyPair, Message, ObliviousDoHConfigs, QueryBody, ODOH_CONTENT_TYPE,
};

use helpers::*;

async fn fetch_configs(stack: &Stack) -> Vec<u8> {
    let response = client()
        .get(stack.url("/.well-known/odohconfigs"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    response.bytes().await.unwrap().to_vec()
}

async fn post_via_proxy(stack: &Stack, query: &Message) -> reqwest::Response {
    client()
        .post(stack.url(&format!(
            "/proxy?targethost={}&targetpath=/dns-query",
            stack.addr
        )))
        .header("content-type", ODOH_CONTENT_TYPE)
        .body(query.encode().unwrap())
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_query_through_proxy_and_target() {
    let stack = Stack::start().await;

    let configs = ObliviousDoHConfigs::decode(&fetch_configs(&stack).await).unwrap();
    let config = &configs.preferred().unwrap().contents;

    let dns = build_query("e2e.example.", 0x5151);
    let (query, ctx) = encrypt_query(config, &QueryBody::new(dns), &mut OsRng).unwrap();

    let response = post_via_proxy(&stack, &query).await;
    assert_eq!(response.status().as_u16(), 200);
    let sealed = Message::decode(&response.bytes().await.unwrap()).unwrap();
    let body = ctx.open_response(&sealed).unwrap();

    let answer = DnsMessage::from_vec(&body.dns_message).unwrap();
    assert_eq!(answer.id(), 0x5151);
    assert_eq!(answer.answers().len(), 1);
    assert_eq!(answer.answers()[0].data(), Some(&RData::A(ANSWER_ADDR.into())));

    let metrics = String::from_utf8(stack.metrics.render().unwrap()).unwrap();
    assert!(metrics.contains("odoh_events_total{event=\"relayed\"} 1"));
    assert!(metrics.contains("odoh_events_total{event=\"response_sealed\"} 1"));
}

#[tokio::test]
async fn test_config_is_identical_across_fetches() {
    let stack = Stack::start().await;
    let first = fetch_configs(&stack).await;
    let second = fetch_configs(&stack).await;
    assert_eq!(first, second);
    assert_eq!(first, stack.keys.config());
}

#[tokio::test]
async fn test_stale_key_status_reaches_client() {
    let stack = Stack::start().await;
    let retired = KeyPair::from_seed(&[0x01; 32]).unwrap();
    let (query, _) = encrypt_query(
        retired.config(),
        &QueryBody::new(build_query("stale.example.", 1)),
        &mut OsRng,
    )
    .unwrap();

    let response = post_via_proxy(&stack, &query).await;
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_health() {
    let stack = Stack::start().await;
    let response = client().get(stack.url("/health")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}
