use std::env;

use burn::tensor::backend::Backend as BackendTrait;
use burn_wgpu::{RuntimeOptions, Wgpu, graphics};
use tracing::{info, warn};

pub type WgpuDevice = <Wgpu<f32> as BackendTrait>::Device;

const GRAPHICS_API_VAR: &str = "LYRICS_WGPU_BACKEND";

/// Initialize the wgpu runtime, honoring `LYRICS_WGPU_BACKEND`
/// (`auto`, `vulkan`, `metal`, `dx12` or `opengl`).
pub fn init_runtime(device: &WgpuDevice) {
    if matches!(device, WgpuDevice::Existing(_)) {
        return;
    }

    let requested = env::var(GRAPHICS_API_VAR)
        .unwrap_or_else(|_| "auto".to_string())
        .to_ascii_lowercase();
    let options = RuntimeOptions::default();

    match requested.as_str() {
        "vulkan" => {
            burn_wgpu::init_setup::<graphics::Vulkan>(device, options);
        }
        "metal" => {
            burn_wgpu::init_setup::<graphics::Metal>(device, options);
        }
        "dx12" | "directx" => {
            burn_wgpu::init_setup::<graphics::Dx12>(device, options);
        }
        "opengl" | "gl" => {
            burn_wgpu::init_setup::<graphics::OpenGl>(device, options);
        }
        other => {
            if other != "auto" {
                warn!("unknown {GRAPHICS_API_VAR} value '{other}', using auto");
            }
            burn_wgpu::init_setup::<graphics::AutoGraphicsApi>(device, options);
        }
    }

    info!("wgpu runtime initialized ({requested})");
}
