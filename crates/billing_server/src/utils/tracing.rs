use std::fmt::{self, Write as _};
use std::sync::OnceLock;

use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{propagation::TraceContextPropagator, trace::SdkTracerProvider};
use time::macros::format_description;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{format, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

const SERVICE_NAME: &str = "billing_server";
const DEFAULT_COLLECTOR_URL: &str = "http://localhost:4317";

/// Span field whose value is echoed in every log line emitted inside it.
const REQUEST_ID_FIELD: &str = "request_id";

fn log_time() -> Result<String, fmt::Error> {
    time::OffsetDateTime::now_utc()
        .format(&format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
        ))
        .map_err(|_| fmt::Error)
}

/// Request id captured from a span's attributes, kept in the span's extensions.
struct RequestId(String);

#[derive(Default)]
struct RequestIdVisitor(Option<String>);

impl Visit for RequestIdVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == REQUEST_ID_FIELD {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == REQUEST_ID_FIELD {
            self.0 = Some(format!("{value:?}"));
        }
    }
}

/// Stores the `request_id` of each new span so the formatter can find it.
struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = RequestIdVisitor::default();
        attrs.record(&mut visitor);
        if let (Some(request_id), Some(span)) = (visitor.0, ctx.span(id)) {
            span.extensions_mut().insert(RequestId(request_id));
        }
    }
}

/// `[timestamp][level][request id] message key=value ...`
///
/// The request id part is left out for events outside a request span.
struct RequestLogFormatter;

impl<S, N> FormatEvent<S, N> for RequestLogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "[{}][{}]",
            log_time()?,
            event.metadata().level().as_str().to_lowercase()
        )?;
        let request_id = ctx.event_scope().and_then(|scope| {
            scope
                .into_iter()
                .find_map(|span| span.extensions().get::<RequestId>().map(|id| id.0.clone()))
        });
        if let Some(request_id) = request_id {
            write!(writer, "[{request_id}]")?;
        }
        writer.write_char(' ')?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn otel_enabled() -> bool {
    std::env::var("OTEL_TRACING_ENABLED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(false)
}

static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Install the global subscriber once per process.
///
/// With `OTEL_TRACING_ENABLED=true` spans are also exported over OTLP/gRPC to
/// `OTEL_COLLECTOR_URL`. If the exporter cannot be built the server keeps
/// running with console logging only.
pub fn init_tracer() -> &'static SdkTracerProvider {
    TRACER_PROVIDER.get_or_init(|| {
        global::set_text_map_propagator(TraceContextPropagator::new());

        let exporter = if otel_enabled() {
            let endpoint = std::env::var("OTEL_COLLECTOR_URL")
                .unwrap_or_else(|_| DEFAULT_COLLECTOR_URL.to_string());
            if std::env::var("OTEL_SERVICE_NAME").is_err() {
                std::env::set_var("OTEL_SERVICE_NAME", SERVICE_NAME);
            }
            match opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(&endpoint)
                .build()
            {
                Ok(exporter) => Some(exporter),
                Err(e) => {
                    eprintln!("failed to create OTLP span exporter for {endpoint}: {e}");
                    None
                }
            }
        } else {
            None
        };

        let provider = match exporter {
            Some(exporter) => {
                let provider = SdkTracerProvider::builder()
                    .with_batch_exporter(exporter)
                    .build();
                let telemetry_layer =
                    tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME));
                let subscriber = tracing_subscriber::registry()
                    .with(telemetry_layer)
                    .with(env_filter())
                    .with(RequestIdLayer)
                    .with(tracing_subscriber::fmt::layer().event_format(RequestLogFormatter));
                if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
                    eprintln!("tracing subscriber already installed: {e}");
                }
                provider
            }
            None => {
                let subscriber = tracing_subscriber::registry()
                    .with(env_filter())
                    .with(RequestIdLayer)
                    .with(tracing_subscriber::fmt::layer().event_format(RequestLogFormatter));
                if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
                    eprintln!("tracing subscriber already installed: {e}");
                }
                SdkTracerProvider::builder().build()
            }
        };

        global::set_tracer_provider(provider.clone());
        provider
    })
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing::{info, info_span};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(emit: impl FnOnce()) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::registry().with(RequestIdLayer).with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .event_format(RequestLogFormatter)
                .with_writer(move || writer.clone()),
        );
        tracing::subscriber::with_default(subscriber, emit);
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn lines_inside_a_request_carry_its_id() {
        let output = capture(|| {
            let span = info_span!("request", method = "POST", request_id = %"req-7");
            let _entered = span.enter();
            let inner = info_span!("billing");
            let _inner = inner.enter();
            info!(invoices = 2, "billing run completed");
        });

        assert!(output.starts_with('['));
        assert!(output.contains("][info][req-7] "), "{output}");
        assert!(output.contains("billing run completed"));
        assert!(output.contains("invoices=2"));
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn lines_outside_a_request_have_no_id() {
        let output = capture(|| info!("listening"));
        assert!(output.contains("][info] listening"), "{output}");
    }
}
