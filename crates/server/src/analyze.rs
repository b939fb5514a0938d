use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use brandlens_agent::AudiencePipeline;
use brandlens_core::dataset::source::TransientUpload;
use brandlens_core::dataset::DatasetKind;
use brandlens_core::domain::brand::BrandInfo;
use brandlens_core::domain::request::{AnalysisRequest, UploadSet};
use brandlens_core::errors::{ApplicationError, InputError, InterfaceError};
use brandlens_core::report::AnalysisReport;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AnalyzeState {
    pipeline: Arc<AudiencePipeline>,
    upload_dir: Arc<PathBuf>,
}

impl AnalyzeState {
    pub fn new(pipeline: Arc<AudiencePipeline>, upload_dir: PathBuf) -> Self {
        Self { pipeline, upload_dir: Arc::new(upload_dir) }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub error: String,
    pub correlation_id: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub fn router(state: AnalyzeState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

pub async fn analyze(
    State(state): State<AnalyzeState>,
    multipart: Multipart,
) -> ApiResult<Json<AnalysisReport>> {
    let correlation_id = Uuid::new_v4().to_string();

    let request = read_request(&state, multipart, &correlation_id)
        .await
        .map_err(|error| reject(error.into_interface(correlation_id.as_str())))?;

    info!(
        event_name = "analysis.request.accepted",
        correlation_id = %correlation_id,
        datasets = ?request.uploads.kinds(),
        "analysis request accepted"
    );

    let report = state
        .pipeline
        .run(request, &correlation_id)
        .await
        .map_err(|error| reject(error.into_interface(correlation_id.as_str())))?;

    Ok(Json(report))
}

/// Collects brand fields and streams every recognized file part into its own
/// transient upload. Uploads already written are released if a later part
/// fails.
async fn read_request(
    state: &AnalyzeState,
    mut multipart: Multipart,
    correlation_id: &str,
) -> Result<AnalysisRequest<TransientUpload>, ApplicationError> {
    let mut brand = BrandInfo::default();
    let mut uploads = UploadSet::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "brandName" => brand.name = field.text().await.map_err(multipart_error)?,
            "brandDescription" => {
                brand.description = field.text().await.map_err(multipart_error)?
            }
            "productInfo" => brand.product_info = field.text().await.map_err(multipart_error)?,
            other => match DatasetKind::from_upload_field(other) {
                Some(kind) => {
                    if let Some(upload) = persist(&state.upload_dir, field, correlation_id).await? {
                        uploads.insert(kind, upload);
                    }
                }
                None => {
                    warn!(
                        event_name = "analysis.request.unknown_field",
                        correlation_id = %correlation_id,
                        field = %other,
                        "ignoring unrecognized form field"
                    );
                }
            },
        }
    }

    Ok(AnalysisRequest::new(brand, uploads))
}

/// `None` for an empty file input (no filename, no bytes).
async fn persist(
    upload_dir: &std::path::Path,
    mut field: Field<'_>,
    correlation_id: &str,
) -> Result<Option<TransientUpload>, ApplicationError> {
    let unnamed = field.file_name().map(|name| name.trim().is_empty()).unwrap_or(true);
    let path = upload_dir.join(format!("{}.csv", Uuid::new_v4()));
    let upload = TransientUpload::new(&path, correlation_id);

    let mut file = tokio::fs::File::create(&path).await.map_err(storage_error)?;
    let mut written = 0usize;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        file.write_all(&chunk).await.map_err(storage_error)?;
        written += chunk.len();
    }
    file.flush().await.map_err(storage_error)?;

    if unnamed && written == 0 {
        return Ok(None);
    }
    Ok(Some(upload))
}

fn multipart_error(error: MultipartError) -> ApplicationError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApplicationError::Input(InputError::UploadTooLarge(error.body_text()))
    } else {
        ApplicationError::Input(InputError::MalformedUpload(error.body_text()))
    }
}

fn storage_error(error: std::io::Error) -> ApplicationError {
    ApplicationError::Storage(error.to_string())
}

fn reject(error: InterfaceError) -> (StatusCode, Json<ApiError>) {
    let (status, message) = match &error {
        InterfaceError::BadRequest { .. } => {
            (StatusCode::BAD_REQUEST, error.message().to_string())
        }
        InterfaceError::PayloadTooLarge { .. } => {
            (StatusCode::PAYLOAD_TOO_LARGE, error.user_message().to_string())
        }
        InterfaceError::ServiceUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, error.user_message().to_string())
        }
        InterfaceError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, error.user_message().to_string())
        }
    };

    warn!(
        event_name = "analysis.request.rejected",
        correlation_id = %error.correlation_id(),
        status = status.as_u16(),
        error = %error,
        "analysis request rejected"
    );

    (status, Json(ApiError { error: message, correlation_id: error.correlation_id().to_string() }))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use brandlens_agent::AudiencePipeline;
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::{router, AnalyzeState};

    const BOUNDARY: &str = "brandlens-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a str),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = String::new();
        for part in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match part {
                Part::Text(name, value) => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                    ));
                }
                Part::File(name, file_name, contents) => {
                    body.push_str(&format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: text/csv\r\n\r\n{contents}\r\n"
                    ));
                }
            }
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body.into_bytes()
    }

    async fn post(dir: &TempDir, parts: &[Part<'_>]) -> (StatusCode, Value) {
        post_with_limit(dir, parts, 1024 * 1024).await
    }

    async fn post_with_limit(
        dir: &TempDir,
        parts: &[Part<'_>],
        max_upload_bytes: usize,
    ) -> (StatusCode, Value) {
        let state =
            AnalyzeState::new(Arc::new(AudiencePipeline::default()), dir.path().to_path_buf());
        let request = Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(multipart_body(parts)))
            .expect("request");

        let response =
            router(state, max_upload_bytes).oneshot(request).await.expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn upload_dir_is_empty(dir: &TempDir) -> bool {
        fs::read_dir(dir.path()).map(|mut entries| entries.next().is_none()).unwrap_or(false)
    }

    #[tokio::test]
    async fn analyze_returns_report_and_removes_uploads() {
        let dir = TempDir::new().expect("temp dir");
        let (status, body) = post(
            &dir,
            &[
                Part::Text("brandName", "Acme"),
                Part::Text("brandDescription", "running gear"),
                Part::File("genderFile", "gender.csv", "性別,比例\n男,40\n女,60\n"),
                Part::File("ageFile", "age.csv", "年齡,比例\n18-24,30\n25-34,70\n"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["brandName"], "Acme");
        assert_eq!(body["genderDistribution"]["dominantCategory"], "女");
        assert_eq!(body["ageDistribution"]["dominantCategory"], "25-34");
        assert!(body.get("timeSeries").is_none());
        assert!(body.get("productPreference").is_none());
        assert!(upload_dir_is_empty(&dir), "transient uploads must be removed");
    }

    #[tokio::test]
    async fn optional_uploads_add_sections() {
        let dir = TempDir::new().expect("temp dir");
        let (status, body) = post(
            &dir,
            &[
                Part::Text("brandName", "Acme"),
                Part::File("genderFile", "gender.csv", "性別,比例\n男,40\n女,60\n"),
                Part::File(
                    "timeSeriesGenderFile",
                    "ts.csv",
                    "日期,性別,平均訂單金額\n2023-02,男,120\n2023-01,女,150\n",
                ),
                Part::File("productPrefFile", "pref.csv", "商品類別,權重分數\n品質,120\n"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timeSeries"]["gender"][0]["name"], "2023-01");
        assert_eq!(body["timeSeries"]["gender"][0]["男"], 0.0);
        assert_eq!(body["productPreference"]["categories"][0]["category"], "品質");
        assert!(upload_dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn missing_brand_name_is_bad_request() {
        let dir = TempDir::new().expect("temp dir");
        let (status, body) = post(
            &dir,
            &[Part::File("genderFile", "gender.csv", "性別,比例\n男,40\n女,60\n")],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "brand name is required");
        assert!(body["correlationId"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(upload_dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn missing_audience_data_is_bad_request() {
        let dir = TempDir::new().expect("temp dir");
        let (status, body) = post(
            &dir,
            &[
                Part::Text("brandName", "Acme"),
                Part::File("productPrefFile", "pref.csv", "商品類別,權重分數\n品質,120\n"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "at least one of the gender or age datasets is required");
        assert!(upload_dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn empty_file_inputs_count_as_absent() {
        let dir = TempDir::new().expect("temp dir");
        let (status, _) = post(
            &dir,
            &[
                Part::Text("brandName", "Acme"),
                Part::File("genderFile", "", ""),
                Part::File("ageFile", "", ""),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(upload_dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn malformed_dataset_is_bad_request() {
        let dir = TempDir::new().expect("temp dir");
        let (status, body) = post(
            &dir,
            &[
                Part::Text("brandName", "Acme"),
                Part::File("genderFile", "gender.csv", "name,value\nx,1\n"),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|message| message.contains("gender")));
        assert!(upload_dir_is_empty(&dir));
    }

    #[tokio::test]
    async fn upload_over_the_body_limit_is_payload_too_large() {
        let dir = TempDir::new().expect("temp dir");
        let mut contents = String::from("性別,比例\n");
        for index in 0..200 {
            contents.push_str(&format!("category-{index},{index}\n"));
        }

        let (status, body) = post_with_limit(
            &dir,
            &[Part::Text("brandName", "Acme"), Part::File("genderFile", "gender.csv", &contents)],
            512,
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "The upload is larger than the server accepts.");
        assert!(body["correlationId"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(upload_dir_is_empty(&dir), "partial uploads must be removed");
    }
}
