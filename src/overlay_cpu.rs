use crate::{
    compose,
    error::{ShadercapError, ShadercapResult},
    highlight::{OverlayLayout, OverlaySurface},
    render::FrameRGBA,
};

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct TextBrushRgba8 {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

/// CPU implementation of [`OverlaySurface`]: Parley shapes and measures text
/// from caller-supplied font bytes, vello_cpu paints rectangles and glyph
/// runs into an offscreen layer that [`CpuOverlay::finish`] composites over
/// the captured frame.
pub struct CpuOverlay {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    font: vello_cpu::peniko::FontData,
    family: String,
    font_px: f32,
}

impl CpuOverlay {
    /// Build a painter for one frame-sized overlay pass.
    ///
    /// The font family used for shaping is the one registered from
    /// `font_bytes`; the bytes double as the glyph source for painting.
    pub fn new(
        width: u32,
        height: u32,
        font_bytes: &[u8],
        layout: &OverlayLayout,
    ) -> ShadercapResult<Self> {
        layout.validate()?;
        let width_u16: u16 = width
            .try_into()
            .map_err(|_| ShadercapError::overlay("overlay width exceeds u16"))?;
        let height_u16: u16 = height
            .try_into()
            .map_err(|_| ShadercapError::overlay("overlay height exceeds u16"))?;

        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| ShadercapError::overlay("no font families registered from font bytes"))?;
        let family = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ShadercapError::overlay("registered font family has no name"))?
            .to_string();

        let font = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes.to_vec()),
            0,
        );

        Ok(Self {
            width: width_u16,
            height: height_u16,
            ctx: vello_cpu::RenderContext::new(width_u16, height_u16),
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            font,
            family,
            font_px: layout.font_px,
        })
    }

    fn layout_for(
        &mut self,
        text: &str,
        brush: TextBrushRgba8,
    ) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(self.font_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }

    /// Flush the painted overlay and composite it over `target`.
    pub fn finish(mut self, target: &mut FrameRGBA) -> ShadercapResult<()> {
        if u32::from(self.width) != target.width || u32::from(self.height) != target.height {
            return Err(ShadercapError::overlay(
                "overlay/target surface size mismatch",
            ));
        }
        self.ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.render_to_pixmap(&mut pixmap);
        compose::over_in_place(&mut target.data, pixmap.data_as_u8_slice())
    }
}

impl OverlaySurface for CpuOverlay {
    fn measure_text(&mut self, text: &str) -> ShadercapResult<f32> {
        if text.is_empty() {
            return Ok(0.0);
        }
        Ok(self.layout_for(text, TextBrushRgba8::default()).full_width())
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, rgba: [u8; 4]) -> ShadercapResult<()> {
        if w <= 0.0 || h <= 0.0 {
            return Ok(());
        }
        self.ctx
            .set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            rgba[0], rgba[1], rgba[2], rgba[3],
        ));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            f64::from(x),
            f64::from(y),
            f64::from(x + w),
            f64::from(y + h),
        ));
        Ok(())
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, rgba: [u8; 4]) -> ShadercapResult<f32> {
        if text.is_empty() {
            return Ok(0.0);
        }

        let brush = TextBrushRgba8 {
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        };
        let layout = self.layout_for(text, brush);
        let advance = layout.full_width();

        self.ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            f64::from(x),
            f64::from(y),
        )));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                    brush.r, brush.g, brush.b, brush.a,
                ));

                let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                self.ctx
                    .glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }

        Ok(advance)
    }
}
