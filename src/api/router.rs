use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use super::{
    handlers,
    middleware::{admin_only, auth_middleware},
};
use crate::AppState;

/// Full application: `/health` plus the API under `/api`.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit;

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", create_router(state))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

pub fn create_router(state: AppState) -> Router {
    // Auth routes
    let auth_public = Router::new().route("/login", post(handlers::auth::login));

    let auth_protected = Router::new()
        .route("/me", get(handlers::auth::me))
        .route("/verify", get(handlers::auth::me))
        .route("/profile", put(handlers::auth::update_profile))
        .route("/profile/avatar", post(handlers::auth::upload_avatar))
        .route("/change-password", post(handlers::auth::change_password))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Device routes (heartbeat is public, kiosks hold no token)
    let device_public = Router::new().route("/:id/heartbeat", post(handlers::devices::heartbeat));

    let device_protected = Router::new()
        .route("/", get(handlers::devices::list_devices))
        .route("/:id", get(handlers::devices::get_device))
        .route("/:id", put(handlers::devices::update_device))
        .route("/:id/config", put(handlers::devices::update_device))
        .route("/:id/logs", get(handlers::devices::device_logs))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let device_admin = Router::new()
        .route("/", post(handlers::devices::create_device))
        .route("/:id", delete(handlers::devices::delete_device))
        .layer(middleware::from_fn(admin_only))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // RFID relay routes
    let rfid_public = Router::new().route("/update", post(handlers::rfid::update_rfid));

    let rfid_protected = Router::new()
        .route("/live", get(handlers::rfid::live_rfid))
        .route("/clear", post(handlers::rfid::clear_rfid))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Attendance routes (public, kiosk-facing)
    let attendance_routes =
        Router::new().route("/", post(handlers::attendance::record_attendance));

    // Student routes
    let student_public = Router::new().route("/sync", get(handlers::students::sync_students));

    let student_protected = Router::new()
        .route("/", get(handlers::students::list_students))
        .route("/", post(handlers::students::create_student))
        .route("/:id", get(handlers::students::get_student))
        .route("/:id", put(handlers::students::update_student))
        .route("/:id", delete(handlers::students::delete_student))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Schedule routes
    let schedule_public = Router::new().route("/sync", get(handlers::schedules::sync_schedules));

    let schedule_protected = Router::new()
        .route("/", get(handlers::schedules::list_schedules))
        .route("/", post(handlers::schedules::create_schedule))
        .route("/assign", post(handlers::schedules::assign_schedule))
        .route("/kiosk/:kiosk_id", get(handlers::schedules::schedules_by_kiosk))
        .route("/:id", get(handlers::schedules::get_schedule))
        .route("/:id", put(handlers::schedules::update_schedule))
        .route("/:id", delete(handlers::schedules::delete_schedule))
        .route("/:id/logs", get(handlers::schedules::schedule_logs))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Pending registration routes (submission is public)
    let pending_public = Router::new().route("/", post(handlers::pending::submit_registration));

    let pending_protected = Router::new()
        .route("/", get(handlers::pending::list_pending))
        .route("/:id", get(handlers::pending::get_pending))
        .route("/:id/approve", post(handlers::pending::approve_pending))
        .route("/:id/reject", post(handlers::pending::reject_pending))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Dashboard routes
    let dashboard_routes = Router::new()
        .route("/stats", get(handlers::dashboard::stats))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Account management (admin only)
    let teacher_routes = Router::new()
        .route("/", get(handlers::accounts::list_teachers))
        .route("/", post(handlers::accounts::create_teacher))
        .route("/:id", put(handlers::accounts::update_teacher))
        .route("/:id", delete(handlers::accounts::delete_teacher))
        .layer(middleware::from_fn(admin_only))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/", get(handlers::accounts::list_admins))
        .route("/", post(handlers::accounts::create_admin))
        .route("/:id", put(handlers::accounts::update_admin))
        .route("/:id", delete(handlers::accounts::delete_admin))
        .layer(middleware::from_fn(admin_only))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .nest("/auth", auth_public.merge(auth_protected))
        .nest("/devices", device_public.merge(device_protected).merge(device_admin))
        .nest("/rfid", rfid_public.merge(rfid_protected))
        .nest("/attendance", attendance_routes)
        .nest("/students", student_public.merge(student_protected))
        .nest("/schedules", schedule_public.merge(schedule_protected))
        .nest("/pending", pending_public.merge(pending_protected))
        .nest("/dashboard", dashboard_routes)
        .nest("/teachers", teacher_routes)
        .nest("/admins", admin_routes)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use chrono::Duration;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::Config,
        models::{DeviceStatus, Role},
        services::{
            auth::fixtures::{lazy_pool, token_for},
            clock::manual::ManualClock,
            mailer::recording::RecordingMailer,
            presence::PresenceTracker,
            rfid_relay::RfidRelay,
        },
        storage::{
            devices::memory::{device, MemoryDeviceStore},
            mailbox::MemoryMailbox,
            minio::MinioClient,
        },
    };

    struct Harness {
        app: Router,
        config: Config,
        clock: Arc<ManualClock>,
        devices: Arc<MemoryDeviceStore>,
    }

    fn harness() -> Harness {
        let config = Config::load();
        let clock = Arc::new(ManualClock::new());
        let devices = Arc::new(MemoryDeviceStore::new());

        let state = AppState {
            db: lazy_pool(),
            minio: MinioClient::new(&config.minio),
            config: Arc::new(config.clone()),
            clock: clock.clone(),
            mailer: Arc::new(RecordingMailer::default()),
            presence: PresenceTracker::new(
                devices.clone(),
                clock.clone(),
                config.presence.stale_window,
            ),
            rfid: RfidRelay::new(
                Arc::new(MemoryMailbox::new()),
                clock.clone(),
                config.relay.active_window,
            ),
        };

        Harness {
            app: app(state),
            config,
            clock,
            devices,
        }
    }

    impl Harness {
        async fn send(
            &self,
            method: Method,
            uri: &str,
            role: Option<Role>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(role) = role {
                request = request.header(
                    header::AUTHORIZATION,
                    format!("Bearer {}", token_for(&self.config, role)),
                );
            }
            let request = match body {
                Some(body) => request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => request.body(Body::empty()).unwrap(),
            };

            let response = self.app.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }
    }

    #[tokio::test]
    async fn health_check_responds_ok() {
        let h = harness();
        let response = h
            .app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn live_rfid_requires_a_token() {
        let h = harness();
        let (status, body) = h.send(Method::GET, "/api/rfid/live", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let h = harness();
        let request = Request::get("/api/rfid/live")
            .header(header::AUTHORIZATION, "Bearer not-a-jwt")
            .body(Body::empty())
            .unwrap();
        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn empty_mailbox_reads_as_absent() {
        let h = harness();
        let (status, body) = h
            .send(Method::GET, "/api/rfid/live", Some(Role::Teacher), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"uid": null, "timestamp": null, "isActive": false}));
    }

    #[tokio::test]
    async fn rfid_update_without_uid_is_a_bad_request() {
        let h = harness();
        let (status, body) = h
            .send(Method::POST, "/api/rfid/update", None, Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "RFID UID is required");

        let (status, _) = h
            .send(Method::POST, "/api/rfid/update", None, Some(json!({"uid": ""})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn scanned_uid_goes_stale_but_stays_readable() {
        let h = harness();
        let (status, body) = h
            .send(Method::POST, "/api/rfid/update", None, Some(json!({"uid": "04A1B2C3"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["uid"], "04A1B2C3");
        let published_at = body["timestamp"].clone();

        let (_, live) = h
            .send(Method::GET, "/api/rfid/live", Some(Role::Admin), None)
            .await;
        assert_eq!(live["uid"], "04A1B2C3");
        assert_eq!(live["timestamp"], published_at);
        assert_eq!(live["isActive"], true);

        h.clock.advance(Duration::seconds(30));
        let (_, live) = h
            .send(Method::GET, "/api/rfid/live", Some(Role::Admin), None)
            .await;
        assert_eq!(live["uid"], "04A1B2C3");
        assert_eq!(live["isActive"], false);
    }

    #[tokio::test]
    async fn clear_empties_the_mailbox() {
        let h = harness();
        h.send(Method::POST, "/api/rfid/update", None, Some(json!({"uid": "AA"})))
            .await;

        let (status, body) = h
            .send(Method::POST, "/api/rfid/clear", Some(Role::Teacher), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "RFID UID cleared");

        let (_, live) = h
            .send(Method::GET, "/api/rfid/live", Some(Role::Teacher), None)
            .await;
        assert_eq!(live["uid"], Value::Null);
        assert_eq!(live["isActive"], false);
    }

    #[tokio::test]
    async fn heartbeat_for_unknown_device_is_not_found() {
        let h = harness();
        let uri = format!("/api/devices/{}/heartbeat", Uuid::new_v4());
        let (status, body) = h.send(Method::POST, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Device not found");
        assert_eq!(h.devices.writes(), 0);
    }

    #[tokio::test]
    async fn heartbeat_brings_device_online_until_stale() {
        let h = harness();
        let id = h.devices.insert(device("lab-1", DeviceStatus::Offline, None));

        let (_, before) = h
            .send(Method::GET, &format!("/api/devices/{}", id), Some(Role::Teacher), None)
            .await;
        assert_eq!(before["status"], "offline");

        let (status, body) = h
            .send(Method::POST, &format!("/api/devices/{}/heartbeat", id), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));

        h.clock.advance(Duration::seconds(60));
        let (_, device) = h
            .send(Method::GET, &format!("/api/devices/{}", id), Some(Role::Teacher), None)
            .await;
        assert_eq!(device["status"], "online");
        assert_eq!(device["device_name"], "lab-1");

        h.clock.advance(Duration::seconds(1));
        let (_, devices) = h
            .send(Method::GET, "/api/devices", Some(Role::Admin), None)
            .await;
        assert_eq!(devices[0]["status"], "offline");
        assert_eq!(devices[0]["stored_status"], "online");
    }

    #[tokio::test]
    async fn non_uuid_device_ids_are_not_found() {
        let h = harness();
        let (status, body) = h
            .send(Method::POST, "/api/devices/42/heartbeat", None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"error": "Device not found"}));

        let (status, body) = h
            .send(Method::GET, "/api/devices/42", Some(Role::Admin), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Device not found");
        assert_eq!(h.devices.writes(), 0);
    }

    #[tokio::test]
    async fn numeric_uid_is_published_as_text() {
        let h = harness();
        let (status, body) = h
            .send(Method::POST, "/api/rfid/update", None, Some(json!({"uid": 12345})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["uid"], "12345");

        let (_, live) = h
            .send(Method::GET, "/api/rfid/live", Some(Role::Teacher), None)
            .await;
        assert_eq!(live["uid"], "12345");
        assert_eq!(live["isActive"], true);
    }

    #[tokio::test]
    async fn rfid_update_without_content_type_is_still_read() {
        let h = harness();
        let request = Request::post("/api/rfid/update")
            .body(Body::from(r#"{"uid":"04A1B2C3"}"#))
            .unwrap();
        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::post("/api/rfid/update")
            .body(Body::empty())
            .unwrap();
        let response = h.app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "RFID UID is required");

        let (_, live) = h
            .send(Method::GET, "/api/rfid/live", Some(Role::Teacher), None)
            .await;
        assert_eq!(live["uid"], "04A1B2C3");
    }

    #[tokio::test]
    async fn non_scalar_uid_is_a_bad_request() {
        let h = harness();
        let (status, body) = h
            .send(Method::POST, "/api/rfid/update", None, Some(json!({"uid": {"id": 1}})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "RFID UID is required");
    }

    #[tokio::test]
    async fn device_listing_requires_a_token() {
        let h = harness();
        let (status, _) = h.send(Method::GET, "/api/devices", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn teachers_cannot_manage_devices_or_accounts() {
        let h = harness();
        let (status, body) = h
            .send(
                Method::POST,
                "/api/devices",
                Some(Role::Teacher),
                Some(json!({"device_name": "lab-2", "device_type": "kiosk"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Admin access required");

        let uri = format!("/api/devices/{}", Uuid::new_v4());
        let (status, _) = h.send(Method::DELETE, &uri, Some(Role::Teacher), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = h.send(Method::GET, "/api/teachers", Some(Role::Teacher), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = h.send(Method::GET, "/api/admins", Some(Role::Teacher), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn account_routes_check_token_before_role() {
        let h = harness();
        let (status, _) = h.send(Method::GET, "/api/teachers", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
