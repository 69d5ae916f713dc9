use terrella_assets::TextureData;

/// Upload decoded RGBA8 pixels as a 2D texture and return its view.
///
/// Color maps go up as sRGB; data maps (normals, displacement) stay linear.
pub fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    data: &TextureData,
    srgb: bool,
) -> wgpu::TextureView {
    create(
        device,
        queue,
        &data.name,
        data.width,
        data.height,
        &data.pixels,
        srgb,
    )
}

/// A 1x1 texture used when a material slot has no map bound.
pub fn fallback(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    rgba: [u8; 4],
    srgb: bool,
) -> wgpu::TextureView {
    create(device, queue, label, 1, 1, &rgba, srgb)
}

fn create(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    pixels: &[u8],
    srgb: bool,
) -> wgpu::TextureView {
    let format = if srgb {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
