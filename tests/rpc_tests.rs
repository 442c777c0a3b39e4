//! # RPC Client Tests
//!
//! Data-center migration handling against a scripted transport.

mod common;

use common::FakeTransport;
use introlink::api;
use introlink::rpc::{RpcClient, RpcError};
use serde_json::json;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_phone_migrate_retries_once_on_new_dc() {
        let transport = FakeTransport::new();
        transport.script(api::SEND_CODE, Err(RpcError::remote(303, "PHONE_MIGRATE_5")));
        transport.script(api::SEND_CODE, Ok(json!({"phone_code_hash": "abc"})));
        let rpc = RpcClient::new(transport.clone(), 2);

        let sent = api::send_code(&rpc, "+15551234567").await.unwrap();

        assert_eq!(sent.phone_code_hash, "abc");
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].dc_id, 2);
        assert_eq!(calls[1].dc_id, 5);
        assert_eq!(calls[0].params, calls[1].params);
        assert_eq!(rpc.current_dc(), 5);
    }

    #[tokio::test]
    async fn test_migration_sticks_for_later_calls() {
        let transport = FakeTransport::new();
        transport.script("help.getConfig", Err(RpcError::remote(303, "NETWORK_MIGRATE_4")));
        transport.script("help.getConfig", Ok(json!({})));
        transport.script("help.getNearestDc", Ok(json!({})));
        let rpc = RpcClient::new(transport.clone(), 2);

        rpc.call("help.getConfig", json!({})).await.unwrap();
        rpc.call("help.getNearestDc", json!({})).await.unwrap();

        let dcs: Vec<u32> = transport.calls().iter().map(|c| c.dc_id).collect();
        assert_eq!(dcs, vec![2, 4, 4]);
    }

    #[tokio::test]
    async fn test_second_migrate_is_not_followed() {
        let transport = FakeTransport::new();
        transport.script("help.getConfig", Err(RpcError::remote(303, "USER_MIGRATE_3")));
        transport.script("help.getConfig", Err(RpcError::remote(303, "USER_MIGRATE_1")));
        let rpc = RpcClient::new(transport.clone(), 2);

        let err = rpc.call("help.getConfig", json!({})).await.unwrap_err();

        assert_eq!(err, RpcError::remote(303, "USER_MIGRATE_1"));
        assert_eq!(transport.calls().len(), 2);
        assert_eq!(rpc.current_dc(), 3);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let transport = FakeTransport::new();
        transport.script(api::SIGN_IN, Err(RpcError::remote(400, "PHONE_CODE_INVALID")));
        let rpc = RpcClient::new(transport.clone(), 2);

        let err = api::sign_in(&rpc, "+15551234567", "abc", "12345")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "PHONE_CODE_INVALID");
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(rpc.current_dc(), 2);
    }

    #[tokio::test]
    async fn test_create_chat_and_export_invite_params() {
        let transport = FakeTransport::new();
        transport.script(api::CREATE_CHAT, Ok(json!({"updates": {"chats": [{"id": 77}]}})));
        transport.script(api::EXPORT_CHAT_INVITE, Ok(json!({"link": "https://t.me/+xyz"})));
        let rpc = RpcClient::new(transport.clone(), 2);

        let chat_id = api::create_chat(&rpc, &[1, 2], "Trip").await.unwrap();
        let link = api::export_chat_invite(&rpc, chat_id).await.unwrap();

        assert_eq!(chat_id, 77);
        assert_eq!(link, "https://t.me/+xyz");
        let calls = transport.calls();
        assert_eq!(calls[0].params, json!({"users": [1, 2], "title": "Trip"}));
        assert_eq!(calls[1].params, json!({"chat_id": 77}));
    }

    #[tokio::test]
    async fn test_create_chat_without_chats_is_decode_error() {
        let transport = FakeTransport::new();
        transport.script(api::CREATE_CHAT, Ok(json!({"updates": {}})));
        let rpc = RpcClient::new(transport.clone(), 2);

        let err = api::create_chat(&rpc, &[1, 2], "Trip").await.unwrap_err();
        assert!(matches!(err, RpcError::Decode { .. }));
    }
}
