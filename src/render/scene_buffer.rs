//! Fixed-layout scene serialization for GPU upload.
//!
//! Every visible object becomes one 128-byte record; a 256-byte header
//! carrying the object count precedes the record array (256 so the
//! object array can be bound at a storage-buffer offset that satisfies
//! the minimum binding alignment). The layout is part of the wire
//! contract with the compute kernel and must match the WGSL structs
//! bit for bit — the two `u32` type-code fields occupy byte ranges
//! that the shader addresses inside otherwise-float data, which the
//! `#[repr(C)]` Pod structs reproduce exactly.

use crate::scene::SceneObject;
use bytemuck::{Pod, Zeroable};

/// Maximum resident objects; extras are silently dropped.
pub const MAX_OBJECTS: usize = 256;
/// Bytes per object record.
pub const OBJECT_STRIDE: usize = 128;
/// Bytes reserved for the header block.
pub const HEADER_SIZE: usize = 256;
/// Total staging/GPU buffer size for a maximum-capacity scene.
pub const SCENE_BUFFER_SIZE: usize = HEADER_SIZE + MAX_OBJECTS * OBJECT_STRIDE;

/// One object as the compute kernel sees it (128 bytes).
///
/// Bytes 0-63: transform block. Bytes 64-127: material block.
/// Reserved fields are zero on every encode.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectRecord {
    pub position: [f32; 3],
    pub object_type: u32,
    pub scale: [f32; 3],
    _pad0: f32,
    pub rotation: [f32; 3],
    _pad1: f32,
    _reserved0: [f32; 4],
    pub color: [f32; 3],
    pub material_type: u32,
    pub ior: f32,
    pub intensity: f32,
    _reserved1: [f32; 10],
}

impl ObjectRecord {
    fn from_object(obj: &SceneObject) -> Self {
        Self {
            position: obj.transform.position.as_vec3().to_array(),
            object_type: obj.kind.gpu_code(),
            scale: obj.transform.scale.as_vec3().to_array(),
            rotation: obj.transform.rotation.as_vec3().to_array(),
            color: obj.material.color.to_array(),
            material_type: obj.material.kind.gpu_code(),
            ior: obj.material.ior,
            intensity: obj.material.intensity,
            ..Self::default()
        }
    }
}

/// Header record (first 4 bytes = clamped object count).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneHeader {
    pub object_count: u32,
    _pad: [u32; 63],
}

impl Default for SceneHeader {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Reusable staging block for the scene buffer.
///
/// Backed by `u32` words so the decoded header/record views are always
/// aligned. The staging memory is fully zeroed on every encode, so
/// stale bytes from a previously larger scene never reach the GPU.
pub struct SceneData {
    staging: Vec<u32>,
}

impl SceneData {
    pub fn new() -> Self {
        Self {
            staging: vec![0u32; SCENE_BUFFER_SIZE / 4],
        }
    }

    /// Encode the current object list: visible objects only, original
    /// order, silently truncated at [`MAX_OBJECTS`].
    pub fn encode(&mut self, objects: &[SceneObject]) {
        self.staging.fill(0);
        let staging: &mut [u8] = bytemuck::cast_slice_mut(&mut self.staging);

        let mut count = 0usize;
        for obj in objects.iter().filter(|o| o.visible) {
            if count == MAX_OBJECTS {
                tracing::debug!("scene exceeds {MAX_OBJECTS} visible objects, truncating");
                break;
            }
            let record = ObjectRecord::from_object(obj);
            let offset = HEADER_SIZE + count * OBJECT_STRIDE;
            staging[offset..offset + OBJECT_STRIDE].copy_from_slice(bytemuck::bytes_of(&record));
            count += 1;
        }

        let header = SceneHeader {
            object_count: count as u32,
            ..SceneHeader::default()
        };
        staging[..HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&header));
    }

    /// Encode in one step.
    pub fn from_objects(objects: &[SceneObject]) -> Self {
        let mut data = Self::new();
        data.encode(objects);
        data
    }

    /// Full staging block (header + records) for GPU upload.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.staging)
    }

    /// Decoded header view.
    pub fn header(&self) -> &SceneHeader {
        bytemuck::from_bytes(&self.bytes()[..HEADER_SIZE])
    }

    /// Decoded record array view (all [`MAX_OBJECTS`] slots).
    pub fn records(&self) -> &[ObjectRecord] {
        bytemuck::cast_slice(&self.bytes()[HEADER_SIZE..])
    }

    pub fn object_count(&self) -> u32 {
        self.header().object_count
    }

    /// Upload the whole block with a single queue write.
    ///
    /// No diffing: every call re-serializes and re-uploads the full
    /// object list.
    pub fn upload(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, self.bytes());
    }
}

impl Default for SceneData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, MaterialKind, PrimitiveKind};
    use glam::{DVec3, Vec3};
    use std::mem::{offset_of, size_of};

    fn object(id: u64) -> SceneObject {
        let mut obj = SceneObject::new(id, format!("obj-{id}"), PrimitiveKind::Cylinder);
        obj.transform.position = DVec3::new(1.0, 2.0, 3.0);
        obj.transform.rotation = DVec3::new(0.1, 0.2, 0.3);
        obj.transform.scale = DVec3::new(0.5, 1.5, 0.5);
        obj.material = Material {
            color: Vec3::new(0.9, 0.1, 0.2),
            kind: MaterialKind::Glass,
            ior: 1.45,
            intensity: 2.0,
        };
        obj
    }

    #[test]
    fn test_wire_layout() {
        assert_eq!(size_of::<ObjectRecord>(), OBJECT_STRIDE);
        assert_eq!(size_of::<SceneHeader>(), HEADER_SIZE);
        assert_eq!(SCENE_BUFFER_SIZE, 256 + 256 * 128);

        // Field offsets are shader-visible and frozen
        assert_eq!(offset_of!(ObjectRecord, position), 0);
        assert_eq!(offset_of!(ObjectRecord, object_type), 12);
        assert_eq!(offset_of!(ObjectRecord, scale), 16);
        assert_eq!(offset_of!(ObjectRecord, rotation), 32);
        assert_eq!(offset_of!(ObjectRecord, color), 64);
        assert_eq!(offset_of!(ObjectRecord, material_type), 76);
        assert_eq!(offset_of!(ObjectRecord, ior), 80);
        assert_eq!(offset_of!(ObjectRecord, intensity), 84);
    }

    #[test]
    fn test_staging_block_word_aligned() {
        // Decoded views cast in place; the backing store must carry
        // u32 alignment for that to be sound
        let data = SceneData::from_objects(&[object(0)]);
        assert_eq!(data.bytes().as_ptr() as usize % std::mem::align_of::<u32>(), 0);
        assert_eq!(data.header().object_count, 1);
        assert_eq!(data.records().len(), MAX_OBJECTS);
    }

    #[test]
    fn test_round_trip() {
        let objects: Vec<_> = (0..5).map(object).collect();
        let data = SceneData::from_objects(&objects);

        assert_eq!(data.object_count(), 5);
        for (obj, rec) in objects.iter().zip(data.records()) {
            assert_eq!(rec.position, obj.transform.position.as_vec3().to_array());
            assert_eq!(rec.scale, obj.transform.scale.as_vec3().to_array());
            assert_eq!(rec.rotation, obj.transform.rotation.as_vec3().to_array());
            assert_eq!(rec.object_type, obj.kind.gpu_code());
            assert_eq!(rec.color, obj.material.color.to_array());
            assert_eq!(rec.material_type, obj.material.kind.gpu_code());
            assert_eq!(rec.ior, obj.material.ior);
            assert_eq!(rec.intensity, obj.material.intensity);
        }
    }

    #[test]
    fn test_visibility_filter_preserves_order() {
        let mut objects: Vec<_> = (0..4).map(object).collect();
        objects[1].visible = false;
        let data = SceneData::from_objects(&objects);

        assert_eq!(data.object_count(), 3);
        // Slot 1 is the third input object, not the hidden one
        let recs = data.records();
        assert_eq!(recs[0].intensity, objects[0].material.intensity);
        assert_eq!(recs[1].position, objects[2].transform.position.as_vec3().to_array());
    }

    #[test]
    fn test_truncates_at_capacity() {
        let objects: Vec<_> = (0..300).map(object).collect();
        let data = SceneData::from_objects(&objects);
        assert_eq!(data.object_count(), MAX_OBJECTS as u32);
        assert_eq!(data.bytes().len(), SCENE_BUFFER_SIZE);
    }

    #[test]
    fn test_stale_bytes_cleared_on_reencode() {
        let mut data = SceneData::new();
        data.encode(&(0..10).map(object).collect::<Vec<_>>());
        data.encode(&(0..2).map(object).collect::<Vec<_>>());

        assert_eq!(data.object_count(), 2);
        // Slots beyond the new count must be fully zeroed
        for rec in &data.records()[2..] {
            assert_eq!(*rec, ObjectRecord::default());
        }
    }

    #[test]
    fn test_reserved_padding_is_zero() {
        let data = SceneData::from_objects(&[object(0)]);
        let raw = &data.bytes()[HEADER_SIZE..HEADER_SIZE + OBJECT_STRIDE];
        // Transform-block reserved pad (bytes 48-63) and material tail (88-127)
        assert!(raw[48..64].iter().all(|&b| b == 0));
        assert!(raw[88..128].iter().all(|&b| b == 0));
    }
}
