//! WebAssembly bindings for the attractor simulation.
//!
//! Provides a thin wrapper around `SimulationScheduler` for browser hosts.
//! The host drives frames from `requestAnimationFrame` and uploads the
//! returned `Float32Array` straight into a vertex buffer.

use js_sys::{Float32Array, Function};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{
    compute::{RenderError, ShadingProgram, SimulationScheduler},
    schema::{ControlBinding, ControlMap, FamilyId, PlatformBudget},
};

/// Initialize WASM module with panic hook and logging.
#[wasm_bindgen(start)]
pub fn init() {
    // Set panic hook for better error messages in browser
    console_error_panic_hook::set_once();

    // Initialize WASM logger
    wasm_logger::init(wasm_logger::Config::default());
}

/// Shading program backed by a JavaScript callback.
///
/// `load` must return a truthy value once the program is compiled; a falsy
/// return or a thrown exception selects basic rendering.
struct JsShadingProgram {
    load: Function,
    release: Option<Function>,
}

impl ShadingProgram for JsShadingProgram {
    fn load(&mut self) -> Result<(), RenderError> {
        match self.load.call0(&JsValue::NULL) {
            Ok(value) if value.is_truthy() => Ok(()),
            Ok(_) => Err(RenderError::Unsupported),
            Err(e) => Err(RenderError::Compile(
                e.as_string().unwrap_or_else(|| format!("{e:?}")),
            )),
        }
    }

    fn release(&mut self) {
        if let Some(release) = &self.release {
            if let Err(e) = release.call0(&JsValue::NULL) {
                log::warn!("Shading program release failed: {e:?}");
            }
        }
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {e}")))
}

fn controls_from_js(value: JsValue) -> Result<ControlMap, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(ControlMap::new());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid controls: {e}")))
}

/// Coefficient metadata exposed to control panels.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CoefficientInfo {
    key: &'static str,
    default: f32,
    min: f32,
    max: f32,
}

/// WebAssembly wrapper for the simulation scheduler.
#[wasm_bindgen]
pub struct WasmSimulation {
    scheduler: SimulationScheduler,
}

#[wasm_bindgen]
impl WasmSimulation {
    /// Create a stopped simulation.
    ///
    /// # Arguments
    /// * `mobile` - Use the mobile particle ceiling
    /// * `load_shader` - Optional callback that compiles the enhanced shading program
    /// * `release_shader` - Optional callback that releases it
    #[wasm_bindgen(constructor)]
    pub fn new(
        mobile: bool,
        load_shader: Option<Function>,
        release_shader: Option<Function>,
    ) -> WasmSimulation {
        let budget = if mobile {
            PlatformBudget::mobile()
        } else {
            PlatformBudget::desktop()
        };

        let mut scheduler = SimulationScheduler::new(budget);
        if let Some(load) = load_shader {
            scheduler = scheduler.with_shading_program(move || {
                Box::new(JsShadingProgram {
                    load: load.clone(),
                    release: release_shader.clone(),
                }) as Box<dyn ShadingProgram>
            });
        }

        WasmSimulation { scheduler }
    }

    /// Select an attractor family and start animating.
    ///
    /// `controls` is a plain object of control values, or `null`.
    #[wasm_bindgen]
    pub fn start(&mut self, family: &str, controls: JsValue) -> Result<(), JsValue> {
        let controls = controls_from_js(controls)?;
        self.scheduler
            .start(family, &controls)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Stop animating. Safe to call repeatedly.
    #[wasm_bindgen]
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Stop and release the particle pool and shading program.
    #[wasm_bindgen]
    pub fn teardown(&mut self) {
        self.scheduler.teardown();
    }

    /// Merge changed controls into the running session.
    #[wasm_bindgen(js_name = updateParameters)]
    pub fn update_parameters(&mut self, controls: JsValue) -> Result<(), JsValue> {
        let controls = controls_from_js(controls)?;
        self.scheduler.update_parameters(&controls);
        Ok(())
    }

    /// Change the particle count; returns the count actually used.
    #[wasm_bindgen]
    pub fn resize(&mut self, particle_count: usize) -> usize {
        self.scheduler.resize(particle_count)
    }

    /// Advance one frame. Returns the frame report, or `null` when stopped.
    #[wasm_bindgen]
    pub fn frame(&mut self, dt: f32) -> Result<JsValue, JsValue> {
        match self.scheduler.on_frame(dt) {
            Some(report) => to_js(&report),
            None => Ok(JsValue::NULL),
        }
    }

    /// Copy of the current frame buffer (`[x, y, z]` per particle).
    #[wasm_bindgen(js_name = getFrameBuffer)]
    pub fn get_frame_buffer(&self) -> Float32Array {
        match self.scheduler.frame_buffer() {
            Some(buffer) => Float32Array::from(buffer.as_slice()),
            None => Float32Array::new_with_length(0),
        }
    }

    /// Shading uniforms for this frame, or `null` in basic mode.
    #[wasm_bindgen(js_name = getUniforms)]
    pub fn get_uniforms(&self) -> Result<JsValue, JsValue> {
        to_js(&self.scheduler.uniforms())
    }

    /// Pool statistics as JSON.
    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> Result<JsValue, JsValue> {
        to_js(&self.scheduler.stats())
    }

    /// Bound configuration of the running session.
    #[wasm_bindgen(js_name = getConfig)]
    pub fn get_config(&self) -> Result<JsValue, JsValue> {
        to_js(&self.scheduler.config())
    }

    /// Divergence totals since the session started.
    #[wasm_bindgen(js_name = getTotals)]
    pub fn get_totals(&self) -> Result<JsValue, JsValue> {
        to_js(&self.scheduler.total_report())
    }

    /// Current auto-rotation angle in radians.
    #[wasm_bindgen(js_name = getRotation)]
    pub fn get_rotation(&self) -> f32 {
        self.scheduler.rotation()
    }

    /// Seconds since the session started.
    #[wasm_bindgen(js_name = getElapsed)]
    pub fn get_elapsed(&self) -> f32 {
        self.scheduler.elapsed()
    }

    #[wasm_bindgen(js_name = getFamily)]
    pub fn get_family(&self) -> Option<String> {
        self.scheduler.family().map(|f| f.as_str().to_string())
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }
}

/// Identifiers of every supported family.
#[wasm_bindgen(js_name = listFamilies)]
pub fn list_families() -> Result<JsValue, JsValue> {
    let names: Vec<&str> = FamilyId::ALL.iter().map(|f| f.as_str()).collect();
    to_js(&names)
}

/// Coefficient keys and ranges for a family.
#[wasm_bindgen(js_name = familyCoefficients)]
pub fn family_coefficients(family: &str) -> Result<JsValue, JsValue> {
    let family: FamilyId = family
        .parse()
        .map_err(|e: crate::schema::UnknownFamily| JsValue::from_str(&e.to_string()))?;
    let info: Vec<CoefficientInfo> = family
        .coefficients()
        .iter()
        .map(|spec| CoefficientInfo {
            key: spec.key,
            default: spec.default,
            min: spec.min,
            max: spec.max,
        })
        .collect();
    to_js(&info)
}

/// Documented default particle count for a family.
#[wasm_bindgen(js_name = defaultParticleCount)]
pub fn default_particle_count(family: &str) -> Result<usize, JsValue> {
    let family: FamilyId = family
        .parse()
        .map_err(|e: crate::schema::UnknownFamily| JsValue::from_str(&e.to_string()))?;
    Ok(ControlBinding::default_particle_count(family))
}
