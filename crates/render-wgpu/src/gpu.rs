use crate::mesh::{GpuMesh, MeshVertex};
use crate::shaders;
use crate::texture;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use std::collections::HashMap;
use std::sync::Arc;
use terrella_assets::TextureStore;
use terrella_common::NodeId;
use terrella_scene::{BlendMode, Camera, Light, Material, Payload, SceneGraph, ShadowConfig};
use wgpu::util::DeviceExt;

/// Orthographic half-extent of the sun's shadow volume. Wide enough to cover
/// the planet and its cloud shell with margin.
const SHADOW_EXTENT: f32 = 2.5;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    light_view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    camera_right: [f32; 4],
    camera_up: [f32; 4],
    sun_direction: [f32; 4],
    sun_color: [f32; 4],
    ambient: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct InstanceData {
    model_0: [f32; 4],
    model_1: [f32; 4],
    model_2: [f32; 4],
    model_3: [f32; 4],
}

impl InstanceData {
    fn from_matrix(model: Mat4) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct StarInstance {
    position: [f32; 3],
    size: f32,
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MaterialParams {
    base_color: [f32; 4],
    emissive: [f32; 4],
    surface: [f32; 4],
    flags: [f32; 4],
}

impl MaterialParams {
    fn from_material(material: &Material) -> Self {
        let emissive = material.emissive * material.emissive_intensity;
        Self {
            base_color: [
                material.base_color.x,
                material.base_color.y,
                material.base_color.z,
                material.opacity,
            ],
            emissive: [emissive.x, emissive.y, emissive.z, material.normal_scale],
            surface: [
                material.roughness,
                material.metalness,
                material.displacement_scale,
                if material.lit { 1.0 } else { 0.0 },
            ],
            flags: [
                if material.receive_shadow { 1.0 } else { 0.0 },
                0.0,
                0.0,
                0.0,
            ],
        }
    }
}

/// One mesh payload prepared for drawing.
struct MeshDraw {
    node: NodeId,
    mesh: Arc<GpuMesh>,
    material_bind_group: wgpu::BindGroup,
    blend: BlendMode,
    cast_shadow: bool,
}

/// The starfield prepared for drawing. Star positions are world-space and
/// static, so the instance buffer is uploaded once.
struct StarDraw {
    instance_buffer: wgpu::Buffer,
    count: u32,
}

/// wgpu-based scene renderer.
pub struct WgpuRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    additive_pipeline: wgpu::RenderPipeline,
    star_pipeline: wgpu::RenderPipeline,
    shadow_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    shadow_bind_group: wgpu::BindGroup,
    shadow_view: wgpu::TextureView,
    shadow_config: ShadowConfig,
    draws: Vec<MeshDraw>,
    stars: Option<StarDraw>,
    instance_buffer: wgpu::Buffer,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    /// Build GPU state for the assembled scene: upload each unique shape
    /// once, create one bind group per material, and prepare the shadow map
    /// sized from the directional light's configuration.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        graph: &SceneGraph,
        textures: &TextureStore,
    ) -> Self {
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniform_buffer"),
            contents: bytemuck::bytes_of(&FrameUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let material_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("material_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1),
                texture_entry(2),
                texture_entry(3),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let shadow_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let map_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("map_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow_sampler"),
            compare: Some(wgpu::CompareFunction::LessEqual),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        // Neutral per-slot fallbacks for materials with unbound maps.
        let white = texture::fallback(device, queue, "fallback_albedo", [255; 4], true);
        let flat_normal =
            texture::fallback(device, queue, "fallback_normal", [128, 128, 255, 255], false);
        let no_height = texture::fallback(device, queue, "fallback_height", [0, 0, 0, 255], false);

        // Pipelines
        let planet_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("planet_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::PLANET_SHADER.into()),
        });
        let star_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("star_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::STAR_SHADER.into()),
        });
        let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::SHADOW_SHADER.into()),
        });

        let mesh_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&frame_bgl, &material_bgl, &shadow_bgl],
            push_constant_ranges: &[],
        });
        let star_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("star_pipeline_layout"),
            bind_group_layouts: &[&frame_bgl],
            push_constant_ranges: &[],
        });
        let shadow_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow_pipeline_layout"),
            bind_group_layouts: &[&frame_bgl],
            push_constant_ranges: &[],
        });

        let instance_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &wgpu::vertex_attr_array![
                4 => Float32x4,
                5 => Float32x4,
                6 => Float32x4,
                7 => Float32x4,
            ],
        };

        let opaque_pipeline = Self::mesh_pipeline(
            device,
            &mesh_layout,
            &planet_shader,
            surface_format,
            instance_layout.clone(),
            wgpu::BlendState::REPLACE,
            true,
            wgpu::CompareFunction::Less,
            "opaque_pipeline",
        );
        // Additive layers draw over the surface without writing depth;
        // LessEqual lets the coincident night-lights shell pass the depth
        // test against the surface sphere.
        let additive_blend = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };
        let additive_pipeline = Self::mesh_pipeline(
            device,
            &mesh_layout,
            &planet_shader,
            surface_format,
            instance_layout.clone(),
            additive_blend,
            false,
            wgpu::CompareFunction::LessEqual,
            "additive_pipeline",
        );

        let star_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("star_pipeline"),
            layout: Some(&star_layout),
            vertex: wgpu::VertexState {
                module: &star_shader,
                entry_point: Some("vs_star"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<StarInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3,
                        1 => Float32,
                        2 => Float32x4,
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &star_shader,
                entry_point: Some("fs_star"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(additive_blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let shadow_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("shadow_pipeline"),
            layout: Some(&shadow_layout),
            vertex: wgpu::VertexState {
                module: &shadow_shader,
                entry_point: Some("vs_shadow"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout(), instance_layout],
            },
            fragment: None,
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Front),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 1.5,
                    clamp: 0.0,
                },
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        // Walk the graph: upload shapes (deduplicated by Arc identity),
        // build per-material bind groups, find the shadow configuration.
        let mut shapes: HashMap<usize, Arc<GpuMesh>> = HashMap::new();
        let mut draws = Vec::new();
        let mut stars = None;
        let mut shadow_config = ShadowConfig::default();

        for (id, node) in graph.nodes() {
            match &node.payload {
                Some(Payload::Mesh(instance)) => {
                    let key = Arc::as_ptr(&instance.shape) as usize;
                    let mesh = shapes
                        .entry(key)
                        .or_insert_with(|| {
                            Arc::new(GpuMesh::upload(device, &instance.shape, &node.name))
                        })
                        .clone();

                    let material = &instance.material;
                    let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{}_material", material.name)),
                        contents: bytemuck::bytes_of(&MaterialParams::from_material(material)),
                        usage: wgpu::BufferUsages::UNIFORM,
                    });

                    let resolve = |slot: Option<terrella_assets::AssetId>,
                                   srgb: bool,
                                   fallback: &wgpu::TextureView| {
                        slot.and_then(|id| textures.get(id))
                            .map(|data| texture::upload(device, queue, data, srgb))
                            .unwrap_or_else(|| fallback.clone())
                    };
                    let albedo = resolve(material.albedo, true, &white);
                    let normal = resolve(material.normal_map, false, &flat_normal);
                    let height = resolve(material.displacement_map, false, &no_height);

                    let material_bind_group =
                        device.create_bind_group(&wgpu::BindGroupDescriptor {
                            label: Some(&format!("{}_bind_group", material.name)),
                            layout: &material_bgl,
                            entries: &[
                                wgpu::BindGroupEntry {
                                    binding: 0,
                                    resource: params.as_entire_binding(),
                                },
                                wgpu::BindGroupEntry {
                                    binding: 1,
                                    resource: wgpu::BindingResource::TextureView(&albedo),
                                },
                                wgpu::BindGroupEntry {
                                    binding: 2,
                                    resource: wgpu::BindingResource::TextureView(&normal),
                                },
                                wgpu::BindGroupEntry {
                                    binding: 3,
                                    resource: wgpu::BindingResource::TextureView(&height),
                                },
                                wgpu::BindGroupEntry {
                                    binding: 4,
                                    resource: wgpu::BindingResource::Sampler(&map_sampler),
                                },
                            ],
                        });

                    draws.push(MeshDraw {
                        node: id,
                        mesh,
                        material_bind_group,
                        blend: material.blend,
                        cast_shadow: material.cast_shadow,
                    });
                }
                Some(Payload::Points(cloud)) => {
                    let instances: Vec<StarInstance> = cloud
                        .points
                        .iter()
                        .map(|star| StarInstance {
                            position: star.position.to_array(),
                            size: star.size,
                            color: [star.color[0], star.color[1], star.color[2], 1.0],
                        })
                        .collect();
                    let instance_buffer =
                        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                            label: Some("star_instance_buffer"),
                            contents: bytemuck::cast_slice(&instances),
                            usage: wgpu::BufferUsages::VERTEX,
                        });
                    stars = Some(StarDraw {
                        instance_buffer,
                        count: instances.len() as u32,
                    });
                }
                Some(Payload::Light(Light::Directional {
                    shadow: Some(config),
                    ..
                })) => {
                    shadow_config = *config;
                }
                _ => {}
            }
        }

        // Opaque draws first; additive layers blend over them.
        draws.sort_by_key(|d| d.blend == BlendMode::Additive);

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: (draws.len().max(1) * std::mem::size_of::<InstanceData>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shadow_view = Self::create_shadow_texture(device, &shadow_config);
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("shadow_bind_group"),
            layout: &shadow_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&shadow_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow_sampler),
                },
            ],
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        tracing::info!(
            "renderer prepared: {} mesh draws, {} unique shapes, {} stars",
            draws.len(),
            shapes.len(),
            stars.as_ref().map(|s| s.count).unwrap_or(0)
        );

        Self {
            opaque_pipeline,
            additive_pipeline,
            star_pipeline,
            shadow_pipeline,
            frame_buffer,
            frame_bind_group,
            shadow_bind_group,
            shadow_view,
            shadow_config,
            draws,
            stars,
            instance_buffer,
            depth_texture,
            surface_format,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Render one frame: shadow pass, then opaque, stars, and additive
    /// layers in a single main pass.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        graph: &SceneGraph,
        camera: &Camera,
    ) {
        let worlds = graph.world_transforms();

        // Gather lights from the graph. They never change after assembly,
        // but deriving them here keeps the renderer stateless over frames.
        let mut ambient = [0.05_f32, 0.05, 0.05, 1.0];
        let mut sun_position = Vec3::new(-5.0, 3.0, 5.0);
        let mut sun_color = [1.0_f32, 1.0, 1.0, 0.0];
        let mut sun_intensity = 0.0_f32;
        for (id, node) in graph.nodes() {
            if let Some(Payload::Light(light)) = &node.payload {
                match light {
                    Light::Ambient { color, intensity } => {
                        ambient = [color.x, color.y, color.z, *intensity];
                    }
                    Light::Directional {
                        color, intensity, ..
                    } => {
                        sun_color = [color.x, color.y, color.z, 0.0];
                        sun_intensity = *intensity;
                        if let Some(world) = worlds.get(&id) {
                            sun_position = world.w_axis.truncate();
                        }
                    }
                }
            }
        }

        let sun_direction = sun_position.normalize_or_zero();
        let light_view = Mat4::look_at_rh(sun_position, Vec3::ZERO, Vec3::Y);
        let light_proj = Mat4::orthographic_rh(
            -SHADOW_EXTENT,
            SHADOW_EXTENT,
            -SHADOW_EXTENT,
            SHADOW_EXTENT,
            self.shadow_config.near,
            self.shadow_config.far,
        );

        let view_matrix = camera.view_matrix();
        let frame = FrameUniforms {
            view_proj: camera.view_projection().to_cols_array_2d(),
            light_view_proj: (light_proj * light_view).to_cols_array_2d(),
            camera_pos: [camera.position.x, camera.position.y, camera.position.z, 1.0],
            camera_right: [
                view_matrix.x_axis.x,
                view_matrix.y_axis.x,
                view_matrix.z_axis.x,
                0.0,
            ],
            camera_up: [
                view_matrix.x_axis.y,
                view_matrix.y_axis.y,
                view_matrix.z_axis.y,
                0.0,
            ],
            sun_direction: [sun_direction.x, sun_direction.y, sun_direction.z, sun_intensity],
            sun_color,
            ambient,
        };
        queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        let instances: Vec<InstanceData> = self
            .draws
            .iter()
            .map(|draw| {
                InstanceData::from_matrix(worlds.get(&draw.node).copied().unwrap_or(Mat4::IDENTITY))
            })
            .collect();
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shadow_pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            pass.set_pipeline(&self.shadow_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (index, draw) in self.draws.iter().enumerate() {
                if !draw.cast_shadow {
                    continue;
                }
                pass.set_vertex_buffer(0, draw.mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(draw.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(
                    0..draw.mesh.index_count,
                    0,
                    index as u32..index as u32 + 1,
                );
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            // Opaque meshes
            pass.set_pipeline(&self.opaque_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_bind_group(2, &self.shadow_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (index, draw) in self.draws.iter().enumerate() {
                if draw.blend != BlendMode::Opaque {
                    continue;
                }
                pass.set_bind_group(1, &draw.material_bind_group, &[]);
                pass.set_vertex_buffer(0, draw.mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(draw.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(
                    0..draw.mesh.index_count,
                    0,
                    index as u32..index as u32 + 1,
                );
            }

            // Starfield billboards
            if let Some(stars) = &self.stars {
                pass.set_pipeline(&self.star_pipeline);
                pass.set_bind_group(0, &self.frame_bind_group, &[]);
                pass.set_vertex_buffer(0, stars.instance_buffer.slice(..));
                pass.draw(0..6, 0..stars.count);
            }

            // Additive layers over the surface
            pass.set_pipeline(&self.additive_pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_bind_group(2, &self.shadow_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
            for (index, draw) in self.draws.iter().enumerate() {
                if draw.blend != BlendMode::Additive {
                    continue;
                }
                pass.set_bind_group(1, &draw.material_bind_group, &[]);
                pass.set_vertex_buffer(0, draw.mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(draw.mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(
                    0..draw.mesh.index_count,
                    0,
                    index as u32..index as u32 + 1,
                );
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    #[allow(clippy::too_many_arguments)]
    fn mesh_pipeline(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        shader: &wgpu::ShaderModule,
        surface_format: wgpu::TextureFormat,
        instance_layout: wgpu::VertexBufferLayout<'_>,
        blend: wgpu::BlendState,
        depth_write: bool,
        depth_compare: wgpu::CompareFunction,
        label: &str,
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout(), instance_layout],
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: depth_write,
                depth_compare,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }

    fn create_shadow_texture(
        device: &wgpu::Device,
        config: &ShadowConfig,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("shadow_map"),
            size: wgpu::Extent3d {
                width: config.map_width.max(1),
                height: config.map_height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}
