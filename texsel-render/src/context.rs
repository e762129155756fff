//! GPU context: owns `wgpu::Device`, `Queue`, and optional `Surface`.
//!
//! Two construction paths:
//!
//! 1. **Headless** (`GpuContext::new_headless`): no window, no surface.
//!    Used for tests, benchmarks, and off-screen rendering.
//!
//! 2. **Windowed** (`GpuContext::new_with_surface`): requires a
//!    `raw_window_handle`-compatible window.
//!
//! Both request the features and limits of the configured capability tier.
//! Picking a tier is the caller's decision; an adapter that cannot run the
//! requested tier is reported, not silently downgraded.

use log::info;
use texsel_core::{CapabilityTier, SelectConfig};
use thiserror::Error;
use wgpu::{
    Adapter, Device, DeviceDescriptor, Features, Instance, InstanceDescriptor, Queue,
    RequestAdapterOptions, Surface, SurfaceConfiguration, TextureFormat, TextureUsages,
};

use crate::capabilities::{check_support, required_features, required_limits};

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,
    #[error("Failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("Surface error: {0}")]
    Surface(String),
    #[error("Adapter lacks features for the {tier} tier: {missing:?}")]
    MissingFeatures { tier: CapabilityTier, missing: Features },
    #[error("Adapter limit {limit} is {available}, need {required}")]
    LimitTooLow {
        limit: &'static str,
        available: u32,
        required: u32,
    },
    #[error("Invalid stage configuration: {0}")]
    Config(#[from] texsel_core::ConfigError),
}

/// Core GPU state shared by all rendering subsystems.
pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    pub adapter: Adapter,
    /// Present only when rendering to a window.
    pub surface: Option<Surface<'static>>,
    pub surface_config: Option<SurfaceConfiguration>,
    pub surface_format: TextureFormat,
    /// Stage configuration the device was created for.
    pub select_config: SelectConfig,
}

impl GpuContext {
    /// Create a headless context (no window, no surface).
    pub async fn new_headless(config: &SelectConfig) -> Result<Self, GpuError> {
        config.validate()?;
        let instance = Instance::new(&InstanceDescriptor::default());

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = request_device(&adapter, config, "texsel-headless").await?;

        Ok(Self {
            device,
            queue,
            adapter,
            surface: None,
            surface_config: None,
            // Readback in tests assumes a non-sRGB RGBA target.
            surface_format: TextureFormat::Rgba8Unorm,
            select_config: *config,
        })
    }

    /// Create a context with a surface attached to `window`.
    ///
    /// The caller must ensure `window` outlives the returned `GpuContext`.
    pub async fn new_with_surface<W>(
        window: W,
        width: u32,
        height: u32,
        config: &SelectConfig,
    ) -> Result<Self, GpuError>
    where
        W: wgpu::WasmNotSendSync + Into<wgpu::SurfaceTarget<'static>>,
    {
        config.validate()?;
        let instance = Instance::new(&InstanceDescriptor::default());

        let surface = instance
            .create_surface(window)
            .map_err(|e| GpuError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = request_device(&adapter, config, "texsel-windowed").await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| GpuError::Surface("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo, // VSync
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &surface_config);

        Ok(Self {
            device,
            queue,
            adapter,
            surface: Some(surface),
            surface_config: Some(surface_config),
            surface_format: format,
            select_config: *config,
        })
    }

    /// Resize the surface.  No-op if headless.
    pub fn resize(&mut self, width: u32, height: u32) {
        if let Some(config) = &mut self.surface_config {
            if width == 0 || height == 0 {
                return;
            }
            config.width = width;
            config.height = height;
            if let Some(surface) = &self.surface {
                surface.configure(&self.device, config);
            }
        }
    }

    /// Current surface dimensions, or `(0, 0)` if headless.
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_config
            .as_ref()
            .map(|c| (c.width, c.height))
            .unwrap_or((0, 0))
    }
}

async fn request_device(
    adapter: &Adapter,
    config: &SelectConfig,
    label: &'static str,
) -> Result<(Device, Queue), GpuError> {
    let adapter_limits = adapter.limits();
    check_support(adapter.features(), &adapter_limits, config)?;

    let (device, queue) = adapter
        .request_device(
            &DeviceDescriptor {
                label: Some(label),
                required_features: required_features(config.tier),
                required_limits: required_limits(config.capacity, wgpu::Limits::default()),
                ..Default::default()
            },
            None,
        )
        .await?;

    info!(
        "GPU device ready: {} ({:?}), {} tier, {} texture slots",
        adapter.get_info().name,
        adapter.get_info().backend,
        config.tier,
        config.capacity
    );

    Ok((device, queue))
}

// ===================================================================
// Tests
// ===================================================================
