use crate::Result;

/// Initialize logging/tracing for the service.
///
/// Filter precedence: `TGC_LOG`, then `RUST_LOG`, then info for our crates.
pub fn init(service_name: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = std::env::var("TGC_LOG")
        .ok()
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(format!("info,tgc_core=info,{service_name}=info")));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .init();

    Ok(())
}
