//! GPU integration tests. Need a real wgpu adapter; skipped without one.
//!
//! Run with: `cargo test -p afterglow-gpu`

use std::sync::Arc;
use std::sync::{Mutex, OnceLock};

use afterglow_core::lut::cube::parse_cube;
use afterglow_core::{ColorGradeLut, LutTextureUploader};
use afterglow_gpu::{GpuError, GpuLutTexture, WgpuLutUploader};

/// Create a test device, or `None` when the machine has no adapter.
fn create_test_device() -> Option<(Arc<wgpu::Device>, Arc<wgpu::Queue>)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = match pollster::block_on(instance.request_adapter(
        &wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            ..Default::default()
        },
    )) {
        Ok(adapter) => adapter,
        Err(err) => {
            eprintln!("skipping GPU test, no adapter: {err}");
            return None;
        }
    };

    let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("afterglow_test_device"),
        required_limits: adapter.limits(),
        ..Default::default()
    }))
    .expect("Failed to create test device");

    Some((Arc::new(device), Arc::new(queue)))
}

fn gpu_test_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

fn gradient_cube(size: u32) -> ColorGradeLut {
    let mut text = format!("LUT_3D_SIZE {size}\n");
    let max = (size - 1) as f32;
    for b in 0..size {
        for g in 0..size {
            for r in 0..size {
                text.push_str(&format!(
                    "{} {} {}\n",
                    r as f32 / max,
                    g as f32 / max,
                    b as f32 / max
                ));
            }
        }
    }
    parse_cube(&text).expect("valid cube").lut
}

#[test]
fn test_upload_round_trips_texels() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some((device, queue)) = create_test_device() else {
        return;
    };

    let lut = gradient_cube(4);
    let texture = GpuLutTexture::upload(&device, &queue, &lut).expect("upload");
    assert_eq!(texture.size, 4);
    assert_eq!(texture.texture.dimension(), wgpu::TextureDimension::D3);
    assert_eq!(texture.texture.format(), wgpu::TextureFormat::Rgba8Unorm);

    let texels = texture.read_back(&device, &queue).expect("readback");
    assert_eq!(texels, lut.data());
}

#[test]
fn test_uploader_trait_path() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some((device, queue)) = create_test_device() else {
        return;
    };

    let mut uploader = WgpuLutUploader::new(device, queue);
    assert!(uploader.max_lut_size() >= 256);
    let lut = gradient_cube(2);
    let texture = uploader.upload_lut(&lut).expect("upload");
    assert_eq!(texture.texture.size().depth_or_array_layers, 2);
}

#[test]
fn test_empty_lut_rejected() {
    let _lock = gpu_test_lock().lock().expect("gpu test lock poisoned");
    let Some((device, queue)) = create_test_device() else {
        return;
    };

    let empty = ColorGradeLut::new(0, Vec::new(), false, false).expect("empty tensor");
    assert!(matches!(
        GpuLutTexture::upload(&device, &queue, &empty),
        Err(GpuError::EmptyLut)
    ));
}
