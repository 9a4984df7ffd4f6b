//! Collision mask encoding from composed page pixels.
//!
//! A mask cell is 1 where the sampled pixel's alpha is non-zero. The row
//! stride is rounded up to a multiple of 8 bits. Before packing into bytes,
//! bit order is reversed within every 8-bit group: the stored byte's bit 0
//! holds the 8th sampled cell of its group. The consuming format depends on
//! this exact byte layout.

use image::RgbaImage;
use tracing::debug;

use crate::assets::{AssetDatabase, CollisionMask, MaskMode, SpriteAsset};
use crate::project::MaskJob;

/// Runs every queued mask job against the still-resident page pixels.
/// Each job replaces its sprite's mask list with exactly one new mask.
pub fn regenerate_masks(db: &mut AssetDatabase, jobs: &[MaskJob], page: &RgbaImage) {
    let mode = db.mask_mode;
    for job in jobs {
        let sprite = &mut db.sprites[job.sprite];
        let mask = encode_sprite_mask(sprite, mode, page, job);
        debug!(sprite = %sprite.name, width = mask.width, height = mask.height, "regenerated collision mask");
        sprite.masks.clear();
        sprite.masks.push(mask);
    }
}

/// Builds one mask for `sprite` by sampling the placement region of `page`.
pub fn encode_sprite_mask(
    sprite: &SpriteAsset,
    mode: MaskMode,
    page: &RgbaImage,
    job: &MaskJob,
) -> CollisionMask {
    let (mask_width, mask_height) = sprite.mask_dimensions(mode);
    let stride = (mask_width + 7) / 8 * 8;
    let mut bits = vec![false; (stride * mask_height) as usize];

    let (page_w, page_h) = page.dimensions();
    for y in 0..mask_height.min(job.bounds.h) {
        for x in 0..mask_width.min(job.bounds.w) {
            let px = job.bounds.x + x;
            let py = job.bounds.y + y;
            if px >= page_w || py >= page_h {
                continue;
            }
            let opaque = page.get_pixel(px, py)[3] > 0;
            let bit_index = match mode {
                MaskMode::BoundingBox => (y * stride + x) as usize,
                MaskMode::FullSprite => {
                    ((y + job.target_y) * stride + x + job.target_x) as usize
                }
            };
            if bit_index < bits.len() {
                bits[bit_index] = opaque;
            }
        }
    }

    CollisionMask {
        width: mask_width,
        height: mask_height,
        data: pack_bits_reversed(&bits),
    }
}

/// Packs a bit sequence into bytes, reversing bit order within each group
/// of 8: sampled cell `8k + j` lands in byte `k` at bit position `7 - j`.
fn pack_bits_reversed(bits: &[bool]) -> Vec<u8> {
    let mut data = vec![0u8; bits.len() / 8];
    for (k, chunk) in bits.chunks_exact(8).enumerate() {
        let mut byte = 0u8;
        for (j, &bit) in chunk.iter().enumerate() {
            if bit {
                byte |= 1 << (7 - j);
            }
        }
        data[k] = byte;
    }
    data
}
