use std::sync::mpsc;

use wgpu::util::DeviceExt;

use super::{FilterUniforms, shader};
use crate::{
    buffer::PixelBuffer,
    error::{DaltonlensError, Result},
    utils::pixel::Srgba8,
};

/// Device, queue and the compiled filter pipeline.
pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
    adapter_name: String,
}

impl GpuContext {
    /// Picks an adapter and compiles the shader. Fails with
    /// [DaltonlensError::GpuUnavailable] when the system has no adapter.
    pub fn new() -> Result<Self> {
        Self::with_adapter(false)
    }

    /// Same as [GpuContext::new] on the software adapter (WARP, llvmpipe or
    /// SwiftShader), when the platform provides one.
    pub fn fallback() -> Result<Self> {
        Self::with_adapter(true)
    }

    fn with_adapter(force_fallback_adapter: bool) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter,
            compatible_surface: None,
        }))
        .ok_or(DaltonlensError::GpuUnavailable)?;

        let info = adapter.get_info();
        log::info!(
            "GPU adapter {} ({:?}, {:?})",
            info.name,
            info.backend,
            info.device_type
        );

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("daltonlens_device"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .map_err(|e| DaltonlensError::Gpu(e.to_string()))?;

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("daltonlens_filter_bgl"),
            entries: &bind_group_layout_entries(),
        });
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("daltonlens_filter"),
            source: wgpu::ShaderSource::Wgsl(shader::shader_source().into()),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("daltonlens_filter_layout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("daltonlens_filter"),
            layout: Some(&layout),
            module: &module,
            entry_point: Some("main"),
            cache: None,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            bgl,
            adapter_name: info.name,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Runs the filter described by `uniforms` over `input`, one invocation
    /// per pixel, and reads the result back into `output`.
    pub fn process(
        &self,
        uniforms: &FilterUniforms,
        input: &PixelBuffer<'_, Srgba8>,
        output: &mut PixelBuffer<'_, Srgba8>,
    ) -> Result {
        let (width, height) = input.shape();
        output.ensure_shape(input.shape());
        if input.is_empty() {
            return Ok(());
        }

        let max_dim = self.max_texture_dimension();
        if width > max_dim || height > max_dim {
            return Err(DaltonlensError::Gpu(format!(
                "{width}x{height} exceeds the device texture limit of {max_dim}"
            )));
        }

        // Texture uploads want whole texels per row
        let packed;
        let input = if input.bytes_per_row() % size_of::<Srgba8>() == 0 {
            input
        } else {
            packed = input.to_owned_buffer();
            &packed
        };

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let src_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("daltonlens_src"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        self.queue.write_texture(
            src_texture.as_image_copy(),
            input.as_bytes(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(input.bytes_per_row() as u32),
                rows_per_image: Some(height),
            },
            extent,
        );

        let out_texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("daltonlens_out"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("daltonlens_uniforms"),
                contents: bytemuck::bytes_of(uniforms),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let src_view = src_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let out_view = out_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("daltonlens_filter_bg"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&src_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&out_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("daltonlens_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("daltonlens_filter_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(
                width.div_ceil(shader::WORKGROUP_SIZE),
                height.div_ceil(shader::WORKGROUP_SIZE),
                1,
            );
        }

        // Readback rows are padded to what buffer copies require
        let unpadded_bytes_per_row = width * size_of::<Srgba8>() as u32;
        let padded_bytes_per_row =
            unpadded_bytes_per_row.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("daltonlens_readback"),
            size: padded_bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            out_texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            extent,
        );

        self.queue.submit([encoder.finish()]);
        let slice = readback.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::wait());
        rx.recv()
            .map_err(|e| DaltonlensError::Gpu(e.to_string()))?
            .map_err(|e| DaltonlensError::Gpu(e.to_string()))?;

        {
            let mapped = slice.get_mapped_range();
            let unpadded = unpadded_bytes_per_row as usize;
            let padded = padded_bytes_per_row as usize;
            output
                .rows_mut()
                .zip(mapped.chunks(padded))
                .for_each(|(dst, src)| {
                    bytemuck::cast_slice_mut::<Srgba8, u8>(dst).copy_from_slice(&src[..unpadded])
                });
        }
        readback.unmap();

        log::debug!("GPU filter done on {width}x{height}");
        Ok(())
    }
}

fn bind_group_layout_entries() -> [wgpu::BindGroupLayoutEntry; 3] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::StorageTexture {
                access: wgpu::StorageTextureAccess::WriteOnly,
                format: wgpu::TextureFormat::Rgba8Unorm,
                view_dimension: wgpu::TextureViewDimension::D2,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
    ]
}
