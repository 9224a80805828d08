//! Console logging for the editor in the browser.

use tracing::Level;
use tracing::subscriber::set_global_default;
use tracing_subscriber::Registry;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;

/// Default directives: editor targets at debug, everything else at info.
pub const DEFAULT_FILTER: &str = "info,sitebuilder=debug";

/// Install the panic hook and a `tracing-wasm` console subscriber.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_logging(filter: Option<&str>) {
    console_error_panic_hook::set_once();

    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    let filter = EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER)).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let reg = Registry::default().with(filter).with(wasm_layer);

    let _ = set_global_default(reg);
}
