mod common;

use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, test, web, web::Data};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use attendance::admin::SharedSecretGate;
use attendance::capture::{CaptureConfig, SnapshotCamera};
use attendance::location::FixedLocation;
use attendance::routes;
use attendance::state::{AppState, Kiosk};
use attendance::store::{MemoryRecordStore, RecordStore, Store};
use attendance::workflow::{AttendanceWorkflow, RefreshPolicy};
use common::{peer, test_config};

const STILL: [u8; 8] = [0xFF, 0xD8, 0xFF, 0xE0, 0x02, 0x10, 0xFF, 0xD9];
const TICK: Duration = Duration::from_millis(200);

/// A stand-in IP camera: `/still.jpg` answers with a JPEG, `/locked.jpg`
/// with 403.
fn spawn_camera() -> String {
    let server = HttpServer::new(|| {
        App::new()
            .route(
                "/still.jpg",
                web::get().to(|| async {
                    HttpResponse::Ok().content_type("image/jpeg").body(STILL.to_vec())
                }),
            )
            .route(
                "/locked.jpg",
                web::get().to(|| async { HttpResponse::Forbidden().finish() }),
            )
    })
    .workers(1)
    .disable_signals()
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{addr}")
}

async fn kiosk(store: &Store, camera_url: String) -> Kiosk {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    Kiosk {
        camera: SnapshotCamera::with_client(client, camera_url),
        capture: CaptureConfig {
            tick: TICK,
            acquire_timeout: Duration::from_secs(2),
            ..CaptureConfig::default()
        },
        workflow: AttendanceWorkflow::start(
            store.clone(),
            &FixedLocation::new(-6.2, 106.8166),
            RefreshPolicy::Refetch,
        )
        .await,
    }
}

macro_rules! kiosk_app {
    ($store:expr, $camera_path:expr) => {{
        let config = test_config();
        let kiosk = kiosk(&$store, format!("{}{}", spawn_camera(), $camera_path)).await;
        let state = AppState {
            store: $store.clone(),
            gate: Box::new(SharedSecretGate::new(config.admin_password.clone())),
            kiosk: Some(kiosk),
        };
        let routes_config = config.clone();
        test::init_service(
            App::new()
                .app_data(Data::new(state))
                .app_data(Data::new(config))
                .configure(move |cfg| routes::configure(cfg, routes_config.clone())),
        )
        .await
    }};
}

fn kiosk_post(name: &str, status: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/kiosk/attendance")
        .peer_addr(peer())
        .set_json(json!({ "name": name, "status": status }))
}

#[actix_web::test]
async fn kiosk_photo_is_attached_to_the_record() {
    let store = Store::Memory(MemoryRecordStore::new());
    let app = kiosk_app!(store, "/still.jpg");

    let resp = test::call_service(&app, kiosk_post("Budi", "keluar").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let record: Value = test::read_body_json(resp).await;
    assert_eq!(record["name"], "Budi");
    assert_eq!(record["status"], "keluar");
    assert_eq!(record["location"], "-6.2000, 106.8166");
    assert!(
        record["face_image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,")
    );

    let req = test::TestRequest::get()
        .uri("/api/kiosk/attendance")
        .peer_addr(peer())
        .to_request();
    let list: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], record["id"]);
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[actix_web::test]
async fn refused_camera_is_service_unavailable_and_frees_the_kiosk() {
    let store = Store::Memory(MemoryRecordStore::new());
    let app = kiosk_app!(store, "/locked.jpg");

    for _ in 0..2 {
        let resp = test::call_service(&app, kiosk_post("Ana", "masuk").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Camera unavailable: camera permission denied");
    }
    assert!(store.list().await.unwrap().is_empty());
}

#[actix_web::test]
async fn second_submission_during_countdown_is_a_conflict() {
    let store = Store::Memory(MemoryRecordStore::new());
    let app = kiosk_app!(store, "/still.jpg");

    let first = test::call_service(&app, kiosk_post("Ana", "masuk").to_request());
    let second = async {
        actix_web::rt::time::sleep(TICK / 2).await;
        test::call_service(&app, kiosk_post("Budi", "masuk").to_request()).await
    };
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.status(), StatusCode::CREATED);
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[actix_web::test]
async fn blank_name_never_opens_the_camera() {
    let store = Store::Memory(MemoryRecordStore::new());
    let app = kiosk_app!(store, "/still.jpg");

    let resp = test::call_service(&app, kiosk_post("  ", "masuk").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(store.list().await.unwrap().is_empty());
}
