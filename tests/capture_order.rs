use shadercap::{
    FrameRGBA, QuadRenderer, RenderSettings, ShaderProgram, ShaderStage, ShadercapResult,
    UniformSet, UniformValue,
};

/// Renderer stub: stamps row `call_count % height` with a color derived from
/// the current shader/uniform state, honoring the clear-between-renders
/// setting. Deterministic in its inputs, so identical state renders
/// identically.
struct RowStampRenderer {
    settings: RenderSettings,
    calls: u32,
}

impl RowStampRenderer {
    fn new(settings: RenderSettings) -> Self {
        Self { settings, calls: 0 }
    }
}

impl QuadRenderer for RowStampRenderer {
    fn render_quad(
        &mut self,
        program: &ShaderProgram,
        uniforms: &UniformSet,
        target: &mut FrameRGBA,
    ) -> ShadercapResult<()> {
        if let Some(clear) = self.settings.clear_rgba {
            for px in target.data.chunks_exact_mut(4) {
                px.copy_from_slice(&clear);
            }
        }

        let t = match uniforms.get("iTime") {
            Some(UniformValue::Float(t)) => *t,
            _ => 0.0,
        };
        let r = (program.fragment_source().len() % 256) as u8;
        let g = ((t * 255.0) as i64).clamp(0, 255) as u8;

        let row = (self.calls % target.height) as usize;
        let stride = target.width as usize * 4;
        for px in target.data[row * stride..(row + 1) * stride].chunks_exact_mut(4) {
            px.copy_from_slice(&[r, g, self.calls as u8, 255]);
        }
        self.calls += 1;
        Ok(())
    }
}

fn decode_rgba(png: &[u8]) -> (u32, u32, Vec<u8>) {
    let img = image::load_from_memory(png).unwrap().to_rgba8();
    (img.width(), img.height(), img.into_raw())
}

fn pixel(data: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
    let i = (y * width + x) as usize * 4;
    [data[i], data[i + 1], data[i + 2], data[i + 3]]
}

#[test]
fn nth_capture_lands_at_index_n_minus_1() {
    let mut stage = ShaderStage::new(4, 8, Box::new(RowStampRenderer::new(
        RenderSettings {
            clear_rgba: Some([0, 0, 0, 255]),
        },
    )))
    .unwrap();

    for _ in 0..5 {
        stage.capture_frame().unwrap();
    }
    assert_eq!(stage.frame_count(), 5);

    // The renderer stamps its call ordinal into the blue channel of row n,
    // so frame order is directly observable in the decoded stills.
    for n in 0..5u32 {
        let frame = stage.frames().get(n as usize).unwrap();
        let (w, _, data) = decode_rgba(frame.as_bytes());
        assert_eq!(pixel(&data, w, 0, n)[2], n as u8);
    }
}

#[test]
fn same_uniforms_render_identically() {
    let mut stage = ShaderStage::new(4, 4, Box::new(RowStampRenderer::new(
        RenderSettings {
            clear_rgba: Some([0, 0, 0, 255]),
        },
    )))
    .unwrap();

    let mut uniforms = UniformSet::new();
    uniforms.set("iTime", UniformValue::Float(0.5));
    stage.set_uniforms(uniforms.clone());
    stage.capture_frame().unwrap();

    // Setting the same set again must not change the rendered output.
    stage.set_uniforms(uniforms);
    stage.capture_frame().unwrap();

    let a = stage.frames().get(0).unwrap().as_bytes();
    let b = stage.frames().get(1).unwrap().as_bytes();
    let (w, _, da) = decode_rgba(a);
    let (_, _, db) = decode_rgba(b);
    // Compare the stamped rows (rows 0 and 1 for calls 0 and 1).
    assert_eq!(pixel(&da, w, 1, 0)[..2], pixel(&db, w, 1, 1)[..2]);
}

#[test]
fn fragment_swap_between_captures_changes_the_frame() {
    let mut stage = ShaderStage::new(4, 4, Box::new(RowStampRenderer::new(
        RenderSettings {
            clear_rgba: Some([0, 0, 0, 255]),
        },
    )))
    .unwrap();

    stage.set_fragment_source("void main() {}", None);
    stage.capture_frame().unwrap();
    stage.set_fragment_source("void main() { gl_FragColor = vec4(1.0); }", None);
    stage.capture_frame().unwrap();

    let (w, _, da) = decode_rgba(stage.frames().get(0).unwrap().as_bytes());
    let (_, _, db) = decode_rgba(stage.frames().get(1).unwrap().as_bytes());
    assert_ne!(pixel(&da, w, 0, 0)[0], pixel(&db, w, 0, 1)[0]);
}

#[test]
fn uncleared_target_accumulates_trails_across_captures() {
    let mut stage = ShaderStage::new(4, 4, Box::new(RowStampRenderer::new(
        RenderSettings::default(),
    )))
    .unwrap();

    stage.capture_frame().unwrap();
    stage.capture_frame().unwrap();

    // Without clearing, the second frame still shows row 0 from the first
    // draw alongside its own row 1.
    let (w, _, data) = decode_rgba(stage.frames().get(1).unwrap().as_bytes());
    assert_ne!(pixel(&data, w, 0, 0), [0, 0, 0, 255]);
    assert_ne!(pixel(&data, w, 0, 1), [0, 0, 0, 255]);

    // With clearing enabled, row 0 is gone from the second frame.
    let mut cleared = ShaderStage::new(4, 4, Box::new(RowStampRenderer::new(
        RenderSettings {
            clear_rgba: Some([0, 0, 0, 255]),
        },
    )))
    .unwrap();
    cleared.capture_frame().unwrap();
    cleared.capture_frame().unwrap();
    let (w, _, data) = decode_rgba(cleared.frames().get(1).unwrap().as_bytes());
    assert_eq!(pixel(&data, w, 0, 0), [0, 0, 0, 255]);
    assert_ne!(pixel(&data, w, 0, 1), [0, 0, 0, 255]);
}

#[test]
fn renderer_errors_surface_unmodified() {
    struct FailingRenderer;
    impl QuadRenderer for FailingRenderer {
        fn render_quad(
            &mut self,
            _program: &ShaderProgram,
            _uniforms: &UniformSet,
            _target: &mut FrameRGBA,
        ) -> ShadercapResult<()> {
            Err(shadercap::ShadercapError::render(
                "shader failed to link: ERROR: 0:1",
            ))
        }
    }

    let mut stage = ShaderStage::new(4, 4, Box::new(FailingRenderer)).unwrap();
    let err = stage.capture_frame().unwrap_err();
    assert!(err.to_string().contains("shader failed to link"));
    assert_eq!(stage.frame_count(), 0);
}
