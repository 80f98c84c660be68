use chrono::Utc;
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use tracing::{debug, info};

use super::camera::{Camera, CameraError, CameraStream, CaptureConstraints, Frame};
use crate::model::ImageFormat;

/// A network camera that serves the current picture as a JPEG/PNG still at
/// a fixed URL (the usual `/snapshot.jpg` endpoint of IP cameras).
#[derive(Clone)]
pub struct SnapshotCamera {
    client: Client,
    url: String,
}

impl SnapshotCamera {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Camera for SnapshotCamera {
    type Stream = SnapshotStream;

    async fn acquire(&self, constraints: &CaptureConstraints) -> Result<SnapshotStream, CameraError> {
        let mut stream = SnapshotStream {
            client: self.client.clone(),
            url: self.url.clone(),
            constraints: *constraints,
            open: true,
        };
        // one probe frame proves the device answers with stills
        stream.grab_frame().await?;
        info!(url = %self.url, "Snapshot camera acquired");
        Ok(stream)
    }
}

pub struct SnapshotStream {
    client: Client,
    url: String,
    constraints: CaptureConstraints,
    open: bool,
}

impl CameraStream for SnapshotStream {
    async fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.open {
            return Err(CameraError::Stream("stream stopped".into()));
        }

        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("width", self.constraints.width),
                ("height", self.constraints.height),
            ])
            .send()
            .await
            .map_err(|e| CameraError::NoDevice(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(CameraError::PermissionDenied);
            }
            status if !status.is_success() => {
                return Err(CameraError::Stream(format!("camera answered {status}")));
            }
            _ => {}
        }

        let format = match response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
        {
            Some(ct) if ct.starts_with("image/png") => ImageFormat::Png,
            Some(ct) if ct.starts_with("image/jpeg") || ct.starts_with("image/jpg") => {
                ImageFormat::Jpeg
            }
            other => {
                return Err(CameraError::Stream(format!(
                    "camera returned non-image content `{}`",
                    other.unwrap_or("none")
                )));
            }
        };

        let data = response
            .bytes()
            .await
            .map_err(|e| CameraError::Stream(e.to_string()))?
            .to_vec();
        debug!(bytes = data.len(), "Snapshot frame received");

        Ok(Frame {
            width: self.constraints.width,
            height: self.constraints.height,
            format,
            data,
            captured_at: Utc::now(),
        })
    }

    fn stop(&mut self) {
        if self.open {
            self.open = false;
            debug!(url = %self.url, "Snapshot camera released");
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpResponse, HttpServer, web};
    use pretty_assertions::assert_eq;

    use super::*;

    const STILL: [u8; 8] = [0xFF, 0xD8, 0xFF, 0xE0, 0x07, 0x10, 0xFF, 0xD9];

    async fn still() -> HttpResponse {
        HttpResponse::Ok().content_type("image/jpeg").body(STILL.to_vec())
    }

    /// Serves `/still.jpg`, `/locked.jpg` (403), `/login.jpg` (401) and
    /// `/page` (HTML) on an ephemeral port.
    fn spawn_camera() -> String {
        let server = HttpServer::new(|| {
            App::new()
                .route("/still.jpg", web::get().to(still))
                .route("/locked.jpg", web::get().to(|| async { HttpResponse::Forbidden().finish() }))
                .route("/login.jpg", web::get().to(|| async { HttpResponse::Unauthorized().finish() }))
                .route(
                    "/page",
                    web::get().to(|| async {
                        HttpResponse::Ok().content_type("text/html").body("<html></html>")
                    }),
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

    fn camera(base: &str, path: &str) -> SnapshotCamera {
        let client = Client::builder().no_proxy().build().unwrap();
        SnapshotCamera::with_client(client, format!("{base}{path}"))
    }

    #[actix_web::test]
    async fn grabs_jpeg_stills_until_stopped() {
        let base = spawn_camera();
        let mut stream = camera(&base, "/still.jpg")
            .acquire(&CaptureConstraints::default())
            .await
            .unwrap();

        let frame = stream.grab_frame().await.unwrap();
        assert_eq!(frame.format, ImageFormat::Jpeg);
        assert_eq!(frame.data, STILL.to_vec());
        assert_eq!((frame.width, frame.height), (640, 480));

        stream.stop();
        assert!(matches!(stream.grab_frame().await, Err(CameraError::Stream(_))));
    }

    #[actix_web::test]
    async fn unauthorized_and_forbidden_mean_permission_denied() {
        let base = spawn_camera();
        for path in ["/locked.jpg", "/login.jpg"] {
            let result = camera(&base, path).acquire(&CaptureConstraints::default()).await;
            assert!(matches!(result, Err(CameraError::PermissionDenied)), "{path}");
        }
    }

    #[actix_web::test]
    async fn non_image_content_is_a_stream_error() {
        let base = spawn_camera();
        match camera(&base, "/page").acquire(&CaptureConstraints::default()).await {
            Err(CameraError::Stream(reason)) => assert!(reason.contains("text/html"), "{reason}"),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("HTML page accepted as a camera"),
        }
    }

    #[actix_web::test]
    async fn unreachable_camera_is_no_device() {
        let client = Client::builder().no_proxy().build().unwrap();
        let camera = SnapshotCamera::with_client(client, "http://127.0.0.1:1/still.jpg");
        let result = camera.acquire(&CaptureConstraints::default()).await;
        assert!(matches!(result, Err(CameraError::NoDevice(_))));
    }
}
