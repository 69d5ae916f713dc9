/// WGSL shader for the planet layers and the sun marker.
///
/// One module serves both the opaque and the additive pipelines; blend state
/// and depth writes differ per pipeline, the shading does not. Displacement
/// is applied in the vertex stage, normal mapping and the directional +
/// ambient lighting model in the fragment stage.
pub const PLANET_SHADER: &str = r#"
struct FrameUniforms {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    camera_right: vec4<f32>,
    camera_up: vec4<f32>,
    sun_direction: vec4<f32>,   // xyz: toward the sun, w: intensity
    sun_color: vec4<f32>,
    ambient: vec4<f32>,         // rgb: color, w: intensity
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

struct MaterialParams {
    base_color: vec4<f32>,      // rgb: tint, w: opacity
    emissive: vec4<f32>,        // rgb: premultiplied emissive, w: normal scale
    surface: vec4<f32>,         // x: roughness, y: metalness, z: displacement scale, w: lit
    flags: vec4<f32>,           // x: receive shadow
};

@group(1) @binding(0)
var<uniform> material: MaterialParams;
@group(1) @binding(1)
var albedo_tex: texture_2d<f32>;
@group(1) @binding(2)
var normal_tex: texture_2d<f32>;
@group(1) @binding(3)
var displacement_tex: texture_2d<f32>;
@group(1) @binding(4)
var map_sampler: sampler;

@group(2) @binding(0)
var shadow_map: texture_depth_2d;
@group(2) @binding(1)
var shadow_sampler: sampler_comparison;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tangent: vec3<f32>,
    @location(3) uv: vec2<f32>,
};

struct InstanceInput {
    @location(4) model_0: vec4<f32>,
    @location(5) model_1: vec4<f32>,
    @location(6) model_2: vec4<f32>,
    @location(7) model_3: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) world_tangent: vec3<f32>,
    @location(3) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );

    let height = textureSampleLevel(displacement_tex, map_sampler, vertex.uv, 0.0).r;
    let displaced = vertex.position + vertex.normal * height * material.surface.z;
    let world_pos = model * vec4<f32>(displaced, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.world_tangent = normalize((model * vec4<f32>(vertex.tangent, 0.0)).xyz);
    out.uv = vertex.uv;
    return out;
}

fn shadow_factor(world_pos: vec3<f32>) -> f32 {
    let light_clip = frame.light_view_proj * vec4<f32>(world_pos, 1.0);
    let ndc = light_clip.xyz / light_clip.w;
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);
    let in_bounds = uv.x >= 0.0 && uv.x <= 1.0 && uv.y >= 0.0 && uv.y <= 1.0;
    let lit = textureSampleCompareLevel(shadow_map, shadow_sampler, uv, ndc.z - 0.002);
    return select(1.0, lit, in_bounds);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(albedo_tex, map_sampler, in.uv).rgb * material.base_color.rgb;

    let sampled = textureSample(normal_tex, map_sampler, in.uv).xyz * 2.0 - 1.0;
    let scaled = vec3<f32>(sampled.xy * material.emissive.w, sampled.z);
    let bitangent = cross(in.world_normal, in.world_tangent);
    let tbn = mat3x3<f32>(in.world_tangent, bitangent, in.world_normal);
    let n = normalize(tbn * scaled);

    let l = normalize(frame.sun_direction.xyz);
    let shadow = mix(1.0, shadow_factor(in.world_pos), material.flags.x);
    let diffuse = max(dot(n, l), 0.0) * shadow;

    let view_dir = normalize(frame.camera_pos.xyz - in.world_pos);
    let half_dir = normalize(l + view_dir);
    let spec_power = mix(64.0, 8.0, material.surface.x);
    let spec_strength = (1.0 - material.surface.x) * mix(0.04, 1.0, material.surface.y);
    let specular = pow(max(dot(n, half_dir), 0.0), spec_power) * spec_strength * shadow;

    let sun = frame.sun_color.rgb * frame.sun_direction.w;
    let lighting = frame.ambient.rgb * frame.ambient.w + sun * diffuse;
    let lit_color = albedo * lighting + sun * specular + material.emissive.rgb;

    // Unlit layers (night lights) bypass the lighting model.
    let color = select(albedo, lit_color, material.surface.w > 0.5);
    return vec4<f32>(color, material.base_color.a);
}
"#;

/// WGSL shader for the starfield: camera-facing billboard quads expanded in
/// the vertex stage, soft radial falloff in the fragment stage.
pub const STAR_SHADER: &str = r#"
struct FrameUniforms {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    camera_right: vec4<f32>,
    camera_up: vec4<f32>,
    sun_direction: vec4<f32>,
    sun_color: vec4<f32>,
    ambient: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

struct StarInstance {
    @location(0) position: vec3<f32>,
    @location(1) size: f32,
    @location(2) color: vec4<f32>,
};

struct StarOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) corner: vec2<f32>,
};

@vertex
fn vs_star(@builtin(vertex_index) index: u32, star: StarInstance) -> StarOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[index];
    let offset = (frame.camera_right.xyz * corner.x + frame.camera_up.xyz * corner.y)
        * star.size * 0.5;

    var out: StarOutput;
    out.clip_position = frame.view_proj * vec4<f32>(star.position + offset, 1.0);
    out.color = star.color;
    out.corner = corner;
    return out;
}

@fragment
fn fs_star(in: StarOutput) -> @location(0) vec4<f32> {
    let falloff = max(1.0 - length(in.corner), 0.0);
    return vec4<f32>(in.color.rgb, in.color.a * falloff * falloff);
}
"#;

/// WGSL depth-only shader for the directional light's shadow pass.
pub const SHADOW_SHADER: &str = r#"
struct FrameUniforms {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    camera_right: vec4<f32>,
    camera_up: vec4<f32>,
    sun_direction: vec4<f32>,
    sun_color: vec4<f32>,
    ambient: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tangent: vec3<f32>,
    @location(3) uv: vec2<f32>,
};

struct InstanceInput {
    @location(4) model_0: vec4<f32>,
    @location(5) model_1: vec4<f32>,
    @location(6) model_2: vec4<f32>,
    @location(7) model_3: vec4<f32>,
};

@vertex
fn vs_shadow(vertex: VertexInput, instance: InstanceInput) -> @builtin(position) vec4<f32> {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    return frame.light_view_proj * model * vec4<f32>(vertex.position, 1.0);
}
"#;
