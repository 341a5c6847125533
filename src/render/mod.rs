//! GPU side of the renderer core.
//!
//! - [`scene_buffer`] - fixed-layout scene serialization for GPU upload
//! - [`compute`] - progressive path-trace compute pipeline
//! - [`shaders`] - embedded WGSL kernels
//!
//! ## Architecture
//! ```text
//! Object list → scene_buffer encode → GPU scene buffer
//!                                          ↓
//!            camera/settings uniforms → compute kernel → accumulation (ping-pong)
//!                                          ↓
//!                              tone-mapped output texture
//! ```

pub mod compute;
pub mod scene_buffer;
pub mod shaders;

pub use compute::{CameraUniform, PathTracer};
pub use scene_buffer::{SceneData, MAX_OBJECTS, OBJECT_STRIDE, SCENE_BUFFER_SIZE};

/// Notification seam between the editor layers and the renderer.
///
/// Anything that changes the rendered image (object edits, camera
/// movement, selection highlighting) must invalidate the progressive
/// accumulation. The trigger lives with the caller; the renderer only
/// implements the mechanism.
pub trait InvalidationListener {
    fn on_scene_or_camera_invalidated(&mut self);
}
