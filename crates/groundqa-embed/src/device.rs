use candle_core::Device;

/// Device for the sentence encoder. `APP_EMBED_DEVICE=cpu` forces the CPU even
/// when the crate is built with the `metal` feature.
pub fn select_device() -> Device {
    let forced_cpu = std::env::var("APP_EMBED_DEVICE").is_ok_and(|v| v.eq_ignore_ascii_case("cpu"));
    #[cfg(feature = "metal")]
    {
        if !forced_cpu {
            match Device::new_metal(0) {
                Ok(dev) => {
                    tracing::info!("Embedding device: Metal (MPS)");
                    return dev;
                }
                Err(e) => tracing::warn!(error = %e, "Metal unavailable, falling back to CPU"),
            }
        }
    }
    tracing::info!(forced_cpu, "Embedding device: CPU");
    Device::Cpu
}
