use std::sync::LazyLock;

// putting this inside LOGGER prevents us from accidentally initializing the logger more than once
static LOGGER: LazyLock<()> = LazyLock::new(|| {
    #[cfg(target_arch = "wasm32")]
    wasm_logger::init(wasm_logger::Config::default());

    #[cfg(not(target_arch = "wasm32"))]
    if env_logger::try_init().is_err() {
        return;
    }

    log::info!("Logging initialized");
});

pub fn init_logging() {
    LazyLock::force(&LOGGER);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        log::info!("still logging");
    }
}
