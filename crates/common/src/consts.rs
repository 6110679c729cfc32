pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const INDEX_PATH: &str = "/";
pub const LOAD_CONFIGURATION_PATH: &str = "/api/cargarConfiguracion";
pub const RECORD_CONSUMPTION_PATH: &str = "/api/registrarConsumo";
pub const QUERY_DATA_PATH: &str = "/api/consultarDatos";
pub const GENERATE_INVOICES_PATH: &str = "/api/generarFactura";
pub const SALES_REPORT_PATH: &str = "/api/reporteVentas";
pub const INVOICE_DETAIL_PATH: &str = "/api/detalleFactura";
pub const CREATE_RESOURCE_PATH: &str = "/api/crearRecurso";
pub const RESET_PATH: &str = "/api/resetear";

pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

pub const DEFAULT_DATA_FILE: &str = "data.xml";
pub const DEFAULT_LISTEN_ADDRESS: &str = "127.0.0.1:5000";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "Q";
