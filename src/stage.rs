use crate::{
    assemble::{self, ArtifactStore, AssembleOptions},
    capture::{FrameBuffer, encode_frame_png},
    error::ShadercapResult,
    highlight::{CodeColorScheme, OverlayLayout, paint_source},
    overlay_cpu::CpuOverlay,
    render::{FrameRGBA, QuadRenderer},
    shader::{ShaderProgram, UniformSet},
};

/// Source-overlay configuration. While set on a stage, every capture paints
/// the highlighted display source over the rendered frame.
#[derive(Clone, Debug)]
pub struct OverlaySpec {
    pub scheme: CodeColorScheme,
    pub layout: OverlayLayout,
    /// Font used for shaping and glyph painting; the family is whatever
    /// these bytes register as.
    pub font_bytes: Vec<u8>,
}

/// The one owned resource struct of a recording pipeline: render target,
/// renderer collaborator, program/uniform state, display source, overlay
/// configuration, and the frame buffer.
///
/// Every operation takes `&mut self`, so captures are serialized and no
/// configuration change can overlap an in-flight capture. One stage owns its
/// surfaces exclusively; nothing is shared across instances.
pub struct ShaderStage {
    width: u32,
    height: u32,
    renderer: Box<dyn QuadRenderer>,
    program: ShaderProgram,
    uniforms: UniformSet,
    display_source: Option<String>,
    overlay: Option<OverlaySpec>,
    target: FrameRGBA,
    buffer: FrameBuffer,
    background: [u8; 4],
}

impl ShaderStage {
    /// Build a stage around an already-constructed renderer collaborator.
    ///
    /// Context acquisition lives in the renderer's own constructor and is
    /// fatal there; by the time a stage can be built the context exists.
    /// Geometry must be non-zero.
    pub fn new(
        width: u32,
        height: u32,
        renderer: Box<dyn QuadRenderer>,
    ) -> ShadercapResult<Self> {
        let target = FrameRGBA::new(width, height)?;
        Ok(Self {
            width,
            height,
            renderer,
            program: ShaderProgram::default(),
            uniforms: UniformSet::new(),
            display_source: None,
            overlay: None,
            target,
            buffer: FrameBuffer::new(),
            background: [0, 0, 0, 255],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    /// Replace the fragment stage whole; the vertex stage is fixed. Passing
    /// `display` replaces the display source too, `None` clears it back to
    /// the fragment-text fallback. Subsequent captures use the new program.
    pub fn set_fragment_source(&mut self, fragment: impl Into<String>, display: Option<&str>) {
        self.program.set_fragment(fragment);
        self.display_source = display.map(str::to_string);
    }

    /// Replace the uniform set wholesale (never merged).
    pub fn set_uniforms(&mut self, uniforms: UniformSet) {
        self.uniforms = uniforms;
    }

    /// Text shown by the highlighter, decoupled from the rendered fragment
    /// source (e.g. an abbreviated or annotated variant).
    pub fn set_display_source(&mut self, display: Option<String>) {
        self.display_source = display;
    }

    pub fn set_overlay(&mut self, overlay: Option<OverlaySpec>) {
        self.overlay = overlay;
    }

    /// Background the composed surface is flattened over when a frame is
    /// encoded.
    pub fn set_background(&mut self, rgba: [u8; 4]) {
        self.background = rgba;
    }

    /// The text the overlay would paint right now.
    pub fn display_text(&self) -> &str {
        self.display_source
            .as_deref()
            .unwrap_or_else(|| self.program.fragment_source())
    }

    pub fn frame_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn frames(&self) -> &FrameBuffer {
        &self.buffer
    }

    /// Render one frame of the current shader/uniform state, overlay the
    /// highlighted source if configured, and append the composed image to
    /// the frame buffer. Call order defines frame order and therefore
    /// playback order.
    ///
    /// Returns a read handle to the underlying render target for caller-side
    /// inspection. The target persists across captures: it is only cleared
    /// between draws if the renderer was configured to clear.
    pub fn capture_frame(&mut self) -> ShadercapResult<&FrameRGBA> {
        self.renderer
            .render_quad(&self.program, &self.uniforms, &mut self.target)?;

        let mut composed = self.target.clone();
        if let Some(overlay) = &self.overlay {
            let mut painter =
                CpuOverlay::new(self.width, self.height, &overlay.font_bytes, &overlay.layout)?;
            let text = self
                .display_source
                .as_deref()
                .unwrap_or_else(|| self.program.fragment_source());
            paint_source(&mut painter, text, &overlay.scheme, &overlay.layout)?;
            painter.finish(&mut composed)?;
        }

        let frame = encode_frame_png(&composed, self.background)?;
        self.buffer.push(frame)?;
        tracing::debug!(frames = self.buffer.len(), "captured frame");
        Ok(&self.target)
    }

    /// Drain the frame buffer into the encoder and store the resulting MP4,
    /// returning its artifact handle. Frame submission completes in full
    /// before the encoder runs; see [`crate::encode_ffmpeg::encode_frames`].
    pub fn assemble(
        &mut self,
        store: &mut ArtifactStore,
        opts: &AssembleOptions,
    ) -> ShadercapResult<String> {
        assemble::assemble_frames(&mut self.buffer, store, self.width, self.height, opts)
    }
}
