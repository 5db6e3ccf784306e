//! Frame buffer adapter - converts a particle pool into renderer-ready data.

use serde::Serialize;

use super::{DisplayTransform, ParticlePool};
use crate::schema::SimulationConfig;

/// Flat `[x0, y0, z0, x1, y1, z1, ...]` coordinates in pool slot order.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    data: Vec<f32>,
}

impl FrameBuffer {
    /// Coordinates, three per particle.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Raw bytes for direct upload to a vertex buffer.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// Number of `f32` values (three per particle).
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of particles represented.
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.data.len() / 3
    }

    /// Scaled position of one particle.
    pub fn position(&self, index: usize) -> Option<[f32; 3]> {
        let chunk = self.data.get(index * 3..index * 3 + 3)?;
        Some([chunk[0], chunk[1], chunk[2]])
    }
}

/// Per-frame parameters for the enhanced shading program.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadingUniforms {
    /// Seconds since the session started.
    pub time: f32,
    /// Index of the active colour scheme.
    pub color_scheme: u32,
    /// 1 when depth fading is enabled.
    pub depth_fading: u32,
    /// Rendered point size.
    pub point_size: f32,
}

/// Enhanced shading resource could not be initialized.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Shading program failed to compile: {0}")]
    Compile(String),
    #[error("Enhanced rendering is not supported on this device")]
    Unsupported,
}

/// Host-provided shading program used for enhanced rendering.
pub trait ShadingProgram {
    /// Acquire the program. Called at most once per adapter.
    fn load(&mut self) -> Result<(), RenderError>;

    /// Release any resources held by the program.
    fn release(&mut self) {}
}

/// Active rendering path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RenderMode {
    /// Parameterized shading with per-frame uniforms.
    Enhanced,
    /// Flat, non-parameterized points.
    Basic,
}

enum ProgramState {
    /// Not yet requested.
    Pending(Box<dyn ShadingProgram>),
    Ready(Box<dyn ShadingProgram>),
    /// Load failed or no program was supplied; never retried.
    Unavailable,
}

/// Writes scaled particle positions and shading uniforms once per frame.
pub struct FrameBufferAdapter {
    buffer: FrameBuffer,
    display: DisplayTransform,
    program: ProgramState,
    uniforms: Option<ShadingUniforms>,
}

impl FrameBufferAdapter {
    /// Adapter for a family's display transform.
    ///
    /// `program` is loaded lazily the first time enhanced rendering is
    /// requested.
    pub fn new(display: DisplayTransform, program: Option<Box<dyn ShadingProgram>>) -> Self {
        Self {
            buffer: FrameBuffer::default(),
            display,
            program: match program {
                Some(p) => ProgramState::Pending(p),
                None => ProgramState::Unavailable,
            },
            uniforms: None,
        }
    }

    pub fn buffer(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// Uniforms for this frame; `None` in basic mode.
    pub fn uniforms(&self) -> Option<&ShadingUniforms> {
        self.uniforms.as_ref()
    }

    /// Rendering path used by the last update.
    pub fn mode(&self) -> RenderMode {
        if self.uniforms.is_some() {
            RenderMode::Enhanced
        } else {
            RenderMode::Basic
        }
    }

    /// Rebuild the buffer from the pool and refresh shading uniforms.
    ///
    /// Never fails: an unavailable shading program degrades to basic mode.
    pub fn update(&mut self, pool: &ParticlePool, config: &SimulationConfig, elapsed: f32) {
        let data = &mut self.buffer.data;
        data.clear();
        data.reserve(pool.len() * 3);
        for p in pool.particles() {
            data.extend_from_slice(&self.display.apply(*p));
        }

        self.uniforms = if config.enhanced_rendering && self.ensure_program() {
            Some(ShadingUniforms {
                time: elapsed,
                color_scheme: config.color_scheme.index(),
                depth_fading: config.depth_fading as u32,
                point_size: config.particle_size,
            })
        } else {
            None
        };
    }

    /// Load the shading program on first use; report whether it is ready.
    fn ensure_program(&mut self) -> bool {
        match std::mem::replace(&mut self.program, ProgramState::Unavailable) {
            ProgramState::Ready(p) => {
                self.program = ProgramState::Ready(p);
                true
            }
            ProgramState::Pending(mut p) => match p.load() {
                Ok(()) => {
                    log::info!("Enhanced rendering enabled");
                    self.program = ProgramState::Ready(p);
                    true
                }
                Err(e) => {
                    log::warn!("Enhanced rendering unavailable, falling back to basic points: {e}");
                    false
                }
            },
            ProgramState::Unavailable => false,
        }
    }

    /// Release the shading program, if one was loaded.
    pub fn release(&mut self) {
        if let ProgramState::Ready(mut p) =
            std::mem::replace(&mut self.program, ProgramState::Unavailable)
        {
            p.release();
        }
        self.uniforms = None;
    }
}

impl Drop for FrameBufferAdapter {
    fn drop(&mut self) {
        self.release();
    }
}
