use std::sync::Arc;

use billing_server::app_state::AppState;
use billing_server::routes::route;
use bytes::Bytes;
use common::api::{ErrorEnvelope, InvoiceResponse, LoadConfigurationResponse, RecordConsumptionResponse};
use common::configuration::Configuration;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, Response, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;

const CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<archivoConfiguraciones>
  <listaRecursos>
    <recurso id="1">
      <nombre>Nucleo</nombre>
      <abreviatura>vCPU</abreviatura>
      <metrica>nucleos</metrica>
      <tipo>Hardware</tipo>
      <valorXhora>2</valorXhora>
    </recurso>
    <recurso id="2">
      <nombre>Antivirus</nombre>
      <abreviatura>AV</abreviatura>
      <metrica>licencias</metrica>
      <tipo>Software</tipo>
      <valorXhora>0.5</valorXhora>
    </recurso>
  </listaRecursos>
  <listaCategorias>
    <categoria id="1">
      <nombre>Oficina</nombre>
      <descripcion>Escritorios remotos</descripcion>
      <cargaTrabajo>Ligera</cargaTrabajo>
      <listaConfiguraciones>
        <configuracion id="1">
          <nombre>Escritorio</nombre>
          <descripcion>1 vCPU con antivirus</descripcion>
          <recursosConfiguracion>
            <recurso id="1">1</recurso>
            <recurso id="2">2</recurso>
          </recursosConfiguracion>
        </configuracion>
      </listaConfiguraciones>
    </categoria>
  </listaCategorias>
  <listaClientes>
    <cliente nit="110-1">
      <nombre>Cafe Antigua</nombre>
      <usuario>cafe</usuario>
      <clave>1234</clave>
      <direccion>Antigua Guatemala</direccion>
      <correoElectronico>cafe@antigua.gt</correoElectronico>
      <listaInstancias>
        <instancia id="1">
          <idConfiguracion>1</idConfiguracion>
          <nombre>caja</nombre>
          <fechaInicio>01/01/2024</fechaInicio>
          <estado>Vigente</estado>
        </instancia>
      </listaInstancias>
    </cliente>
  </listaClientes>
</archivoConfiguraciones>"#;

const CONSUMPTIONS: &str = r#"<listadoConsumos>
  <consumo nitCliente="110-1" idInstancia="1">
    <tiempo>3</tiempo>
    <fechaHora>05/02/2024 08:00</fechaHora>
  </consumo>
  <consumo nitCliente="404-0" idInstancia="1">
    <tiempo>1</tiempo>
    <fechaHora>05/02/2024</fechaHora>
  </consumo>
</listadoConsumos>"#;

struct TestServer {
    dir: TempDir,
    state: Arc<AppState>,
}

impl TestServer {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = Configuration {
            data_file: dir.path().join("data.xml"),
            ..Configuration::default()
        };
        let state = Arc::new(AppState::new(&config));
        Self { dir, state }
    }

    async fn call(&self, method: Method, path: &str, body: &str) -> Response<Bytes> {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap();
        let response = route(request, Arc::clone(&self.state)).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        Response::from_parts(parts, bytes)
    }

    async fn post(&self, path: &str, body: &str) -> Response<Bytes> {
        self.call(Method::POST, path, body).await
    }

    fn data_file(&self) -> std::path::PathBuf {
        self.dir.path().join("data.xml")
    }

    async fn loaded() -> Self {
        let server = Self::new();
        let response = server.post("/api/cargarConfiguracion", CONFIG).await;
        assert_eq!(response.status(), StatusCode::OK);
        server
    }
}

fn json_body<T: serde::de::DeserializeOwned>(response: &Response<Bytes>) -> T {
    serde_json::from_slice(response.body()).unwrap()
}

fn error_code(response: &Response<Bytes>) -> String {
    json_body::<ErrorEnvelope>(response).error.code
}

#[tokio::test]
async fn index_banner_and_cors_headers() {
    let server = TestServer::new();
    let response = server.call(Method::GET, "/", "").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(String::from_utf8_lossy(response.body()).contains("running"));
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn request_id_is_echoed() {
    let server = TestServer::new();
    let request = Request::builder()
        .uri("/")
        .header("x-request-id", "req-42")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = route(request, Arc::clone(&server.state)).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn options_is_a_cors_preflight() {
    let server = TestServer::new();
    let response = server.call(Method::OPTIONS, "/api/generarFactura", "").await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().contains_key("access-control-allow-methods"));
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn unknown_route_is_a_json_404() {
    let server = TestServer::new();
    let response = server.call(Method::GET, "/api/nope", "").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "RouteNotFound");
}

#[tokio::test]
async fn load_configuration_summarizes_upload() {
    let server = TestServer::new();
    let response = server.post("/api/cargarConfiguracion", CONFIG).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: LoadConfigurationResponse = json_body(&response);
    assert_eq!(body.load_summary.resources, 2);
    assert_eq!(body.load_summary.categories, 1);
    assert_eq!(body.load_summary.clients, 1);
    assert_eq!(body.load_summary.instances, 1);
}

#[tokio::test]
async fn malformed_configuration_is_rejected() {
    let server = TestServer::new();

    let response = server.post("/api/cargarConfiguracion", "<archivoConfiguraciones>").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "InvalidRequest");

    let response = server.post("/api/cargarConfiguracion", "   ").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn endpoints_need_loaded_data() {
    let server = TestServer::new();

    let response = server.call(Method::GET, "/api/consultarDatos", "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "NotInitialized");

    let response = server.post("/api/registrarConsumo", CONSUMPTIONS).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let dates = r#"{"start_date": "01/02/2024", "end_date": "29/02/2024"}"#;
    let response = server.post("/api/generarFactura", dates).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn query_returns_document_without_passwords() {
    let server = TestServer::loaded().await;
    let response = server.call(Method::GET, "/api/consultarDatos", "").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = json_body(&response);
    assert_eq!(body["resources"].as_array().unwrap().len(), 2);
    assert_eq!(body["clients"][0]["nit"], "110-1");
    assert!(body["clients"][0].get("password").is_none());
    assert_eq!(body["clients"][0]["instances"][0]["consumptions"], json!([]));
}

#[tokio::test]
async fn consumption_then_invoice() {
    let server = TestServer::loaded().await;

    let response = server.post("/api/registrarConsumo", CONSUMPTIONS).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: RecordConsumptionResponse = json_body(&response);
    assert_eq!(body.process_summary.processed, 1);
    assert_eq!(body.process_summary.errors.len(), 1);

    let dates = r#"{"fecha_inicio": "01/02/2024", "fecha_fin": "29/02/2024"}"#;
    let response = server.post("/api/generarFactura", dates).await;
    assert_eq!(response.status(), StatusCode::OK);

    // per hour: 1 vCPU * 2 + 2 licences * 0.5 = 3; 3 hours
    let body: InvoiceResponse = json_body(&response);
    assert_eq!(body.invoices.len(), 1);
    assert_eq!(body.invoices[0].invoice_number, 1);
    assert_eq!(body.invoices[0].amount_due, 9.0);
    assert_eq!(body.consumption_details.len(), 2);
    assert!(body.errors.is_empty());

    // outside the period nothing is billed
    let dates = r#"{"start_date": "01/03/2024", "end_date": "31/03/2024"}"#;
    let body: InvoiceResponse = json_body(&server.post("/api/generarFactura", dates).await);
    assert!(body.invoices.is_empty());
}

#[tokio::test]
async fn invoice_requires_valid_dates() {
    let server = TestServer::loaded().await;

    for body in [
        r#"{"start_date": "01/02/2024"}"#,
        r#"{"start_date": "someday", "end_date": "29/02/2024"}"#,
        r#"{"start_date": "29/02/2024", "end_date": "01/02/2024"}"#,
        "not json",
    ] {
        let response = server.post("/api/generarFactura", body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[tokio::test]
async fn sales_report_is_a_pdf_attachment() {
    let server = TestServer::loaded().await;
    server.post("/api/registrarConsumo", CONSUMPTIONS).await;

    let dates = r#"{"start_date": "01/02/2024", "end_date": "29/02/2024"}"#;
    let response = server.post("/api/reporteVentas", dates).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"sales_report.pdf\""
    );
    assert!(response.body().starts_with(b"%PDF"));
}

#[tokio::test]
async fn invoice_detail_renders_generated_invoice() {
    let server = TestServer::loaded().await;
    server.post("/api/registrarConsumo", CONSUMPTIONS).await;

    let dates = r#"{"start_date": "01/02/2024", "end_date": "29/02/2024"}"#;
    let run: InvoiceResponse = json_body(&server.post("/api/generarFactura", dates).await);

    let request = json!({
        "factura_info": run.invoices[0],
        "detalles_consumo": run.consumption_details,
    });
    let response = server
        .post("/api/detalleFactura", &request.to_string())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"invoice_1.pdf\""
    );
    assert!(response.body().starts_with(b"%PDF"));

    let response = server.post("/api/detalleFactura", "").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_resource_and_reset() {
    let server = TestServer::new();

    let resource = json!({
        "name": "Almacenamiento",
        "abbreviation": "SSD",
        "metric": "GiB",
        "kind": "Hardware",
        "rate_per_hour": 0.1
    });
    let response = server.post("/api/crearRecurso", &resource.to_string()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = json_body(&response);
    assert_eq!(body["id"], "1");
    assert_eq!(body["name"], "Almacenamiento");

    let response = server.post("/api/resetear", "").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.call(Method::GET, "/api/consultarDatos", "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // resetting an empty system still succeeds
    let response = server.post("/api/resetear", "").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn corrupt_data_file_is_a_server_error() {
    let server = TestServer::new();
    let edited = CONFIG.replacen(
        "<valorXhora>2</valorXhora>",
        "<valorXhora>abc</valorXhora>",
        1,
    );
    std::fs::write(server.data_file(), edited).unwrap();

    let response = server.call(Method::GET, "/api/consultarDatos", "").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_code(&response), "InternalServerError");

    let dates = r#"{"start_date": "01/02/2024", "end_date": "29/02/2024"}"#;
    let response = server.post("/api/generarFactura", dates).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // a fresh upload replaces the damaged file
    let response = server.post("/api/cargarConfiguracion", CONFIG).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = server.call(Method::GET, "/api/consultarDatos", "").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn create_resource_accepts_spanish_fields() {
    let server = TestServer::loaded().await;

    let resource = json!({
        "nombre": "Respaldo",
        "abreviatura": "BKP",
        "metrica": "GiB",
        "tipo": "Software",
        "valorXhora": 1.5
    });
    let response = server.post("/api/crearRecurso", &resource.to_string()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = json_body(&response);
    assert_eq!(body["id"], "3");
    assert_eq!(body["name"], "Respaldo");
    assert_eq!(body["abbreviation"], "BKP");
    assert_eq!(body["kind"], "Software");
    assert_eq!(body["rate_per_hour"], 1.5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_consumption_batches_are_all_stored() {
    let server = Arc::new(TestServer::loaded().await);

    let batch = r#"<listadoConsumos>
  <consumo nitCliente="110-1" idInstancia="1">
    <tiempo>1</tiempo>
    <fechaHora>06/02/2024 10:00</fechaHora>
  </consumo>
</listadoConsumos>"#;

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.post("/api/registrarConsumo", batch).await.status() })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let response = server.call(Method::GET, "/api/consultarDatos", "").await;
    let body: Value = json_body(&response);
    assert_eq!(
        body["clients"][0]["instances"][0]["consumptions"]
            .as_array()
            .unwrap()
            .len(),
        8
    );
}
