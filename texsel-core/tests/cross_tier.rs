//! Cross-tier regression: the same draw through both lowerings must be
//! pixel-identical, at the default capacity and after regenerating for
//! other capacities.

use texsel_core::{
    build_stage, CapabilityTier, ColorType, Fragment, Framebuffer, SamplerConfig, SelectConfig,
    Texture, TextureArrayBinding, TextureSelect, AddressMode, FilterMode, NO_TEXTURE,
};

const WIDTH: u32 = 48;
const HEIGHT: u32 = 40;
const CLEAR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Slot textures with distinct sizes, contents, and sampler settings.
fn populate(capacity: u32) -> TextureArrayBinding {
    let mut binding = TextureArrayBinding::new(capacity);
    for slot in 0..capacity {
        let size = 1 + slot % 5;
        let color_type = if slot % 2 == 0 { ColorType::Rgba } else { ColorType::Rgb };
        let len = (size * size) as usize * color_type.bytes_per_pixel();
        let pixels: Vec<u8> = (0..len).map(|i| (i * 37 + slot as usize * 101) as u8).collect();
        let sampler = SamplerConfig {
            filter: if slot % 3 == 0 { FilterMode::Nearest } else { FilterMode::Linear },
            address_mode: match slot % 3 {
                0 => AddressMode::ClampToEdge,
                1 => AddressMode::Repeat,
                _ => AddressMode::MirrorRepeat,
            },
        };
        let texture = Texture::from_pixels(size, size, color_type, &pixels, sampler).unwrap();
        binding.bind(slot, texture).unwrap();
    }
    binding
}

/// Every pixel gets a fragment; ids sweep valid slots and a band of
/// out-of-range ids including the sentinel.
fn fragments(capacity: u32) -> Vec<(u32, u32, Fragment)> {
    let mut out = Vec::with_capacity((WIDTH * HEIGHT) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let n = y * WIDTH + x;
            let tex_id = match n % 11 {
                9 => capacity + n % 7,
                10 => NO_TEXTURE,
                _ => n % capacity,
            };
            let uv = [
                (x as f32 + 0.5) / WIDTH as f32 * 1.5 - 0.25,
                (y as f32 + 0.5) / HEIGHT as f32 * 1.5 - 0.25,
            ];
            out.push((x, y, Fragment::new(tex_id, uv)));
        }
    }
    out
}

fn render(config: SelectConfig, binding: &TextureArrayBinding) -> (Framebuffer, texsel_core::DrawStats) {
    let stage = build_stage(&config).unwrap();
    let mut fb = Framebuffer::new(WIDTH, HEIGHT, CLEAR);
    let stats = fb.draw(stage.as_ref(), binding, fragments(config.capacity));
    (fb, stats)
}

#[test]
fn test_tiers_are_pixel_identical() {
    for capacity in [1, 7, 32, 64] {
        let binding = populate(capacity);
        let (direct, direct_stats) =
            render(SelectConfig::new(capacity, CapabilityTier::DirectIndex), &binding);
        let (case, case_stats) =
            render(SelectConfig::new(capacity, CapabilityTier::CaseDispatch), &binding);

        assert_eq!(direct_stats, case_stats, "capacity {capacity}");
        assert!(direct_stats.discarded > 0);
        assert!(direct_stats.written > 0);
        assert_eq!(direct, case, "capacity {capacity}");
    }
}

#[test]
fn test_discarded_pixels_keep_clear_color() {
    let binding = populate(32);
    for tier in CapabilityTier::ALL {
        let (fb, _) = render(SelectConfig::new(32, tier), &binding);
        for (x, y, fragment) in fragments(32) {
            if fragment.tex_id >= 32 {
                assert_eq!(fb.pixel(x, y), Some(CLEAR), "{tier} at ({x}, {y})");
            }
        }
    }
}

#[test]
fn test_solid_slot_is_exact_across_unit_square() {
    let mut binding = TextureArrayBinding::new(32);
    binding.bind(17, Texture::solid([64, 128, 192, 255])).unwrap();
    let expected = [64.0 / 255.0, 128.0 / 255.0, 192.0 / 255.0, 1.0];

    for tier in CapabilityTier::ALL {
        let stage = build_stage(&SelectConfig::new(32, tier)).unwrap();
        for i in 0..=10 {
            for j in 0..=10 {
                let uv = [i as f32 / 10.0, j as f32 / 10.0];
                let out = stage.shade(&binding, Fragment::new(17, uv));
                assert_eq!(out.color(), Some(expected), "{tier} at {uv:?}");
            }
        }
    }
}
