//! # Concurrent Runs
//!
//! Many aggregations in flight at once share only the client handles; no
//! result may carry another run's data, and each run keeps its own timing.

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use axum::http::StatusCode;
    use futures::future::join_all;
    use std::sync::Arc;
    use summary_gateway::DependencyClients;

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_all_succeed() {
        let gateway = Gateway::scripted(
            Scripted::ok(identity_for("user123")).after(ms(10)),
            Scripted::ok(access_granted()).after(ms(50)),
            Scripted::ok(context_items(1)).after(ms(80)),
        );

        let replies = join_all((0..10).map(|_| gateway.summary("user123", "chat1"))).await;

        for (i, reply) in replies.iter().enumerate() {
            assert_eq!(reply.status, StatusCode::OK, "request {} failed", i);
            assert_eq!(reply.body["degraded"], false);
            assert_eq!(reply.elapsed, ms(80));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_requests_all_degraded() {
        let gateway = Gateway::scripted(
            Scripted::ok(identity_for("user123")).after(ms(10)),
            Scripted::ok(access_granted()).after(ms(50)),
            Scripted::ok(context_items(1)).after(ms(300)),
        );

        let replies = join_all((0..10).map(|_| gateway.summary("user123", "chat1"))).await;

        let degraded = replies
            .iter()
            .filter(|r| r.status == StatusCode::OK && r.body["degraded"] == true)
            .count();
        assert_eq!(degraded, 10);
        assert!(replies.iter().all(|r| r.elapsed == SLA));
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_do_not_share_results() {
        let gateway = Gateway::new(DependencyClients {
            identity: Arc::new(EchoIdentity { delay: ms(30) }),
            access: Arc::new(Scripted::ok(access_granted()).after(ms(10))),
            context: Arc::new(Scripted::ok(context_items(2)).after(ms(20))),
        });

        let users: Vec<String> = (0..20).map(|i| format!("user-{}", i)).collect();
        let replies = join_all(users.iter().map(|u| gateway.summary(u, "chat1"))).await;

        for (user, reply) in users.iter().zip(&replies) {
            assert_eq!(reply.status, StatusCode::OK);
            assert_eq!(reply.body["user"]["user_id"], user.as_str());
            assert_eq!(reply.body["user"]["username"], format!("{}_name", user));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_run_does_not_affect_others() {
        let failing = Gateway::scripted(
            Scripted::err(summary_gateway::DependencyError::Cancelled).after(ms(5)),
            Scripted::ok(access_granted()).after(ms(50)),
            Scripted::ok(context_items(1)).after(ms(80)),
        );
        let healthy = Gateway::scripted(
            Scripted::ok(identity_for("user123")).after(ms(10)),
            Scripted::ok(access_granted()).after(ms(50)),
            Scripted::ok(context_items(1)).after(ms(80)),
        );

        let (bad, good) = tokio::join!(
            failing.summary("user123", "chat1"),
            healthy.summary("user123", "chat1")
        );

        assert_eq!(bad.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(bad.elapsed, ms(5));
        assert_eq!(good.status, StatusCode::OK);
        assert_eq!(good.body["degraded"], false);
    }
}
