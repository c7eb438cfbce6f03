//! # Request Validation
//!
//! Rejections that happen before any backend is called: missing or empty
//! identifiers and unsupported methods. Identifiers are otherwise opaque.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use axum::http::{Method, StatusCode};
    use proptest::prelude::*;
    use std::sync::Arc;
    use summary_gateway::{AccessPayload, AggregationRequest, ContextPayload, DependencyClients, IdentityPayload};

    struct Counted {
        gateway: Gateway,
        identity: Arc<Scripted<IdentityPayload>>,
        access: Arc<Scripted<AccessPayload>>,
        context: Arc<Scripted<ContextPayload>>,
    }

    fn counted() -> Counted {
        let identity = Arc::new(Scripted::ok(identity_for("user123")));
        let access = Arc::new(Scripted::ok(access_granted()));
        let context = Arc::new(Scripted::ok(context_items(1)));
        let gateway = Gateway::new(DependencyClients {
            identity: identity.clone(),
            access: access.clone(),
            context: context.clone(),
        });
        Counted {
            gateway,
            identity,
            access,
            context,
        }
    }

    impl Counted {
        fn assert_no_backend_called(&self) {
            assert_eq!(self.identity.calls(), 0);
            assert_eq!(self.access.calls(), 0);
            assert_eq!(self.context.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_missing_user_id() {
        let h = counted();
        let reply = h
            .gateway
            .send(Method::GET, "/api/v1/chat/summary?chat_id=chat1")
            .await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["code"], 400);
        assert_eq!(reply.body["error"], "Bad Request");
        assert!(reply.message().contains("user_id"));
        h.assert_no_backend_called();
    }

    #[tokio::test]
    async fn test_missing_chat_id() {
        let h = counted();
        let reply = h
            .gateway
            .send(Method::GET, "/api/v1/chat/summary?user_id=user123")
            .await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.message().contains("chat_id"));
        assert!(!reply.message().contains("user_id"));
        h.assert_no_backend_called();
    }

    #[tokio::test]
    async fn test_both_missing() {
        let h = counted();
        let reply = h.gateway.send(Method::GET, "/api/v1/chat/summary").await;

        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.message().contains("user_id"));
        assert!(reply.message().contains("chat_id"));
        h.assert_no_backend_called();
    }

    #[tokio::test]
    async fn test_empty_values() {
        let h = counted();

        let reply = h.gateway.summary("", "chat1").await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.message().contains("user_id"));

        let reply = h.gateway.summary("user123", "").await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert!(reply.message().contains("chat_id"));

        h.assert_no_backend_called();
    }

    #[tokio::test(start_paused = true)]
    async fn test_whitespace_ids_are_aggregated() {
        let h = counted();

        let reply = h.gateway.summary("%20", "%20%20").await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["degraded"], false);
        assert_eq!(h.identity.calls(), 1);
        assert_eq!(h.access.calls(), 1);
        assert_eq!(h.context.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_key_uses_first_value() {
        let h = Gateway::new(DependencyClients {
            identity: Arc::new(EchoIdentity { delay: ms(10) }),
            access: Arc::new(Scripted::ok(access_granted())),
            context: Arc::new(Scripted::ok(context_items(1))),
        });

        let reply = h
            .send(
                Method::GET,
                "/api/v1/chat/summary?user_id=a&user_id=b&chat_id=c",
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["user"]["user_id"], "a");
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let h = counted();
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            let reply = h
                .gateway
                .send(
                    method.clone(),
                    "/api/v1/chat/summary?user_id=user123&chat_id=chat1",
                )
                .await;
            assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED, "{}", method);
            assert_eq!(reply.body["code"], 405);
            assert!(reply.message().contains(method.as_str()));
        }

        // HEAD responses carry no body
        let reply = h
            .gateway
            .send(
                Method::HEAD,
                "/api/v1/chat/summary?user_id=user123&chat_id=chat1",
            )
            .await;
        assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);

        h.assert_no_backend_called();
        assert_eq!(h.gateway.metrics.to_json()["requests"]["method_not_allowed"], 5);
    }

    #[tokio::test]
    async fn test_health_skips_aggregation() {
        let h = counted();
        let reply = h.gateway.send(Method::GET, "/health").await;

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["status"], "healthy");
        assert_eq!(reply.body["timestamp"], "2024-01-01T00:00:00Z");
        h.assert_no_backend_called();
    }

    proptest! {
        #[test]
        fn prop_whitespace_ids_accepted(user in "[ \t]{1,4}", chat in "[ a-z0-9]{1,8}") {
            let request = AggregationRequest::new(Some(user.clone()), Some(chat.clone())).unwrap();
            prop_assert_eq!(request.user_id(), user.as_str());
            prop_assert_eq!(request.chat_id(), chat.as_str());
        }

        #[test]
        fn prop_empty_user_id_rejected(chat in "[a-z0-9]{1,8}") {
            let err = AggregationRequest::new(Some(String::new()), Some(chat)).unwrap_err();
            prop_assert!(err.to_string().contains("user_id"));
            prop_assert!(!err.to_string().contains("chat_id"));
        }

        #[test]
        fn prop_non_empty_ids_accepted(user in "[a-z0-9]{1,16}", chat in "[a-z0-9]{1,16}") {
            let request = AggregationRequest::new(Some(user.clone()), Some(chat.clone())).unwrap();
            prop_assert_eq!(request.user_id(), user.as_str());
            prop_assert_eq!(request.chat_id(), chat.as_str());
        }
    }
}
