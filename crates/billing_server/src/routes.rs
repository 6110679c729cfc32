use std::sync::Arc;

use bytes::Bytes;
use common::consts::{
    CREATE_RESOURCE_PATH, GENERATE_INVOICES_PATH, INDEX_PATH, INVOICE_DETAIL_PATH,
    LOAD_CONFIGURATION_PATH, QUERY_DATA_PATH, RECORD_CONSUMPTION_PATH, REQUEST_ID_HEADER,
    RESET_PATH, SALES_REPORT_PATH,
};
use hyper::body::Body;
use hyper::header::HeaderValue;
use hyper::{Method, Request, StatusCode};
use opentelemetry::global;
use opentelemetry::trace::FutureExt;
use opentelemetry_http::HeaderExtractor;
use tracing::{debug, info_span, Instrument};

use crate::app_state::AppState;
use crate::handlers::errors::ApiError;
use crate::handlers::request::{extract_request_id, read_body};
use crate::handlers::response::{allow_any_origin, cors_preflight, text_response, HttpResponse};
use crate::handlers::{admin, ingestion, invoices, query};

const BANNER: &str = "Cloud billing simulator backend is running.\n";

/// Route an incoming HTTP request to the appropriate handler.
///
/// Handler errors are turned into the JSON error envelope here, so the
/// service itself never fails. Every response carries the CORS origin header
/// and the request id.
pub async fn route<B>(req: Request<B>, state: Arc<AppState>) -> Result<HttpResponse, hyper::Error>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let parent_cx = global::get_text_map_propagator(|p| p.extract(&HeaderExtractor(req.headers())));
    let request_id = extract_request_id(&req);
    let span = info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id
    );

    let mut response = match dispatch(req, &state)
        .instrument(span)
        .with_context(parent_cx)
        .await
    {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };

    allow_any_origin(&mut response);
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    Ok(response)
}

async fn dispatch<B>(req: Request<B>, state: &AppState) -> Result<HttpResponse, ApiError>
where
    B: Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if method == Method::OPTIONS {
        return Ok(cors_preflight());
    }

    match (&method, path.as_str()) {
        (&Method::GET, INDEX_PATH) => Ok(text_response(StatusCode::OK, BANNER)),
        (&Method::POST, LOAD_CONFIGURATION_PATH) => {
            ingestion::load_configuration(read_body(req).await?, state).await
        }
        (&Method::POST, RECORD_CONSUMPTION_PATH) => {
            ingestion::record_consumption(read_body(req).await?, state).await
        }
        (&Method::GET, QUERY_DATA_PATH) => query::query_data(state).await,
        (&Method::POST, GENERATE_INVOICES_PATH) => {
            invoices::generate_invoices(read_body(req).await?, state).await
        }
        (&Method::POST, SALES_REPORT_PATH) => {
            invoices::sales_report(read_body(req).await?, state).await
        }
        (&Method::POST, INVOICE_DETAIL_PATH) => {
            invoices::invoice_detail(read_body(req).await?, state).await
        }
        (&Method::POST, CREATE_RESOURCE_PATH) => {
            admin::create_resource(read_body(req).await?, state).await
        }
        (&Method::POST, RESET_PATH) => admin::reset(state).await,
        _ => {
            debug!(method = %method, path = %path, "no route found");
            Err(ApiError::RouteNotFound {
                method: method.to_string(),
                path,
            })
        }
    }
}
