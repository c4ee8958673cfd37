use candle_core::Device;

pub fn select_device() -> Device {
    #[cfg(feature = "metal")]
    {
        if let Ok(dev) = Device::new_metal(0) {
            tracing::info!("Device: Metal");
            return dev;
        }
    }
    #[cfg(feature = "cuda")]
    {
        if let Ok(dev) = Device::new_cuda(0) {
            tracing::info!("Device: CUDA");
            return dev;
        }
    }
    tracing::info!("Device: CPU");
    Device::Cpu
}
