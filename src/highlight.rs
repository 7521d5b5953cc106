use crate::error::{ShadercapError, ShadercapResult};

/// Keyword/type set a phrase is tested against when deciding reserved vs
/// normal coloring. Matching is by substring: a phrase containing any of
/// these anywhere counts as reserved. Identifiers that merely embed a
/// keyword ("pointer" embeds "int") are therefore flagged too; that is
/// documented behavior, not a bug to fix here.
pub const RESERVED_WORDS: &[&str] = &[
    "void", "float", "int", "bool", "vec2", "vec3", "vec4", "mat2", "mat3", "mat4", "sampler2D",
    "samplerCube", "uniform", "attribute", "varying", "precision", "highp", "mediump", "lowp",
    "in", "out", "const", "return", "if", "else", "for", "while",
];

/// Classification of one painted piece of a source line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TokenClass {
    Normal,
    Reserved,
    Operator,
    Comment,
}

/// What kind of separator matched at a scan position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SeparatorKind {
    CommentOpener,
    Terminator,
    Operator,
    Bracket,
}

/// Byte range of one line plus its token class. Spans never cross lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub class: TokenClass,
}

/// Token class -> RGBA8 color, plus the per-line background fill.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CodeColorScheme {
    pub normal: [u8; 4],
    pub reserved: [u8; 4],
    pub operator: [u8; 4],
    pub comment: [u8; 4],
    pub line_background: [u8; 4],
}

impl Default for CodeColorScheme {
    fn default() -> Self {
        Self {
            normal: [235, 235, 235, 255],
            reserved: [86, 156, 214, 255],
            operator: [212, 212, 160, 255],
            comment: [106, 153, 85, 255],
            line_background: [0, 0, 0, 160],
        }
    }
}

impl CodeColorScheme {
    pub fn color_for(&self, class: TokenClass) -> [u8; 4] {
        match class {
            TokenClass::Normal => self.normal,
            TokenClass::Reserved => self.reserved,
            TokenClass::Operator => self.operator,
            TokenClass::Comment => self.comment,
        }
    }
}

/// Pixel layout of the painted overlay.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OverlayLayout {
    /// Font size in pixels; also the height of each line's background.
    pub font_px: f32,
    /// Outer offset of the text block from the surface origin.
    pub padding: f32,
    /// Extra vertical space between consecutive lines.
    pub line_spacing: f32,
}

impl Default for OverlayLayout {
    fn default() -> Self {
        Self {
            font_px: 16.0,
            padding: 8.0,
            line_spacing: 4.0,
        }
    }
}

impl OverlayLayout {
    pub fn validate(&self) -> ShadercapResult<()> {
        if !self.font_px.is_finite() || self.font_px <= 0.0 {
            return Err(ShadercapError::validation(
                "overlay font_px must be finite and > 0",
            ));
        }
        if !self.padding.is_finite() || self.padding < 0.0 {
            return Err(ShadercapError::validation(
                "overlay padding must be finite and >= 0",
            ));
        }
        if !self.line_spacing.is_finite() || self.line_spacing < 0.0 {
            return Err(ShadercapError::validation(
                "overlay line_spacing must be finite and >= 0",
            ));
        }
        Ok(())
    }

    /// Top edge of line `index`'s background rectangle.
    pub fn line_top(&self, index: usize) -> f32 {
        self.padding + index as f32 * (self.font_px + self.line_spacing)
    }
}

/// Painting seam between the highlighter and a concrete drawing surface.
///
/// `fill_text` returns the horizontal advance of the painted text so the
/// caller can keep adjacent pieces visually contiguous. Implementations must
/// accept empty text (zero advance, nothing painted).
pub trait OverlaySurface {
    fn measure_text(&mut self, text: &str) -> ShadercapResult<f32>;
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, rgba: [u8; 4]) -> ShadercapResult<()>;
    fn fill_text(&mut self, text: &str, x: f32, y: f32, rgba: [u8; 4]) -> ShadercapResult<f32>;
}

/// Match a separator starting at byte `i`, in priority order: comment opener,
/// whitespace/statement terminator, arithmetic operator, bracket. All
/// separators are single ASCII bytes except the two-byte comment opener, so
/// scanning bytes never lands inside a multi-byte character.
fn separator_at(bytes: &[u8], i: usize) -> Option<(usize, SeparatorKind)> {
    if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'/') {
        return Some((2, SeparatorKind::CommentOpener));
    }
    match bytes[i] {
        b' ' | b'\t' | b';' => Some((1, SeparatorKind::Terminator)),
        b'+' | b'-' | b'*' | b'/' | b'=' | b'%' => Some((1, SeparatorKind::Operator)),
        b'(' | b')' | b'{' | b'}' | b'[' | b']' | b',' => Some((1, SeparatorKind::Bracket)),
        _ => None,
    }
}

fn classify_phrase(phrase: &str) -> TokenClass {
    if RESERVED_WORDS.iter().any(|k| phrase.contains(k)) {
        TokenClass::Reserved
    } else {
        TokenClass::Normal
    }
}

/// Scan one line left to right into phrase/separator spans.
///
/// Every line yields at least one span (an empty line yields one empty
/// normal phrase). A comment opener emits the opener span, then the whole
/// remainder of the line as one classified phrase, and ends the scan: no
/// separator after the opener is processed, even if textually present.
pub fn scan_line(line: &str) -> Vec<Span> {
    let bytes = line.as_bytes();
    let mut spans = Vec::new();
    let mut phrase_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let Some((len, kind)) = separator_at(bytes, i) else {
            i += 1;
            continue;
        };

        spans.push(Span {
            start: phrase_start,
            end: i,
            class: classify_phrase(&line[phrase_start..i]),
        });

        if kind == SeparatorKind::CommentOpener {
            spans.push(Span {
                start: i,
                end: i + len,
                class: TokenClass::Comment,
            });
            spans.push(Span {
                start: i + len,
                end: bytes.len(),
                class: classify_phrase(&line[i + len..]),
            });
            return spans;
        }

        spans.push(Span {
            start: i,
            end: i + len,
            class: TokenClass::Operator,
        });
        i += len;
        phrase_start = i;
    }

    spans.push(Span {
        start: phrase_start,
        end: bytes.len(),
        class: classify_phrase(&line[phrase_start..]),
    });
    spans
}

/// Paint a multi-line source string onto `surface`.
///
/// Each line gets a semi-transparent background rectangle sized to its
/// measured full width, then its spans painted left to right with the cursor
/// advanced by each span's measured advance. Never errors on tokenizer edge
/// cases: an unterminated comment, an empty line, or a line with no
/// separators all paint best-effort; a fully empty source paints nothing.
pub fn paint_source(
    surface: &mut dyn OverlaySurface,
    source: &str,
    scheme: &CodeColorScheme,
    layout: &OverlayLayout,
) -> ShadercapResult<()> {
    layout.validate()?;

    for (index, line) in source.lines().enumerate() {
        let y = layout.line_top(index);
        let full_width = surface.measure_text(line)?;
        surface.fill_rect(
            layout.padding,
            y,
            full_width,
            layout.font_px,
            scheme.line_background,
        )?;

        let mut x = layout.padding;
        for span in scan_line(line) {
            let advance = surface.fill_text(
                &line[span.start..span.end],
                x,
                y,
                scheme.color_for(span.class),
            )?;
            x += advance;
        }
    }

    Ok(())
}
