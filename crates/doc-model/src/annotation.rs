//! Annotation data model
//!
//! Every annotation shares an id/page envelope and carries a kind-specific
//! body. All geometry lives in document coordinates: page-local, independent
//! of zoom, origin at the page's top-left corner with y growing downward.

use crate::error::Rejection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Minimum width and height, in document units, of a persisted rectangle.
pub const MIN_RECT_SPAN: f32 = 5.0;

/// Minimum number of points in a persisted drawing.
pub const MIN_DRAWING_POINTS: usize = 2;

/// Side length of the sticky-note icon a comment occupies on the page.
pub const COMMENT_ICON_SIZE: f32 = 20.0;

/// Average glyph advance relative to the font size, used to estimate text extents.
const GLYPH_ADVANCE: f32 = 0.6;

/// Line height relative to the font size.
const LINE_HEIGHT: f32 = 1.2;

/// Point in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageCoordinate {
    pub x: f32,
    pub y: f32,
}

impl PageCoordinate {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &PageCoordinate) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle in document coordinates.
///
/// Rectangles stored in annotations are normalized (`x1 <= x2`, `y1 <= y2`),
/// except arrows, whose `(x1, y1)` is the tail and `(x2, y2)` the head. Use
/// [`Rect::from_corners`] to build one from two arbitrary drag points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl Rect {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build a normalized rectangle spanning two corners in any order.
    pub fn from_corners(a: PageCoordinate, b: PageCoordinate) -> Self {
        Self { x1: a.x.min(b.x), y1: a.y.min(b.y), x2: a.x.max(b.x), y2: a.y.max(b.y) }
    }

    /// Square of half-size `radius` centered on `point`.
    pub fn around(point: PageCoordinate, radius: f32) -> Self {
        Self {
            x1: point.x - radius,
            y1: point.y - radius,
            x2: point.x + radius,
            y2: point.y + radius,
        }
    }

    pub fn normalized(&self) -> Self {
        Self::from_corners(self.top_left(), self.bottom_right())
    }

    pub fn top_left(&self) -> PageCoordinate {
        PageCoordinate::new(self.x1, self.y1)
    }

    pub fn bottom_right(&self) -> PageCoordinate {
        PageCoordinate::new(self.x2, self.y2)
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).abs()
    }

    pub fn center(&self) -> PageCoordinate {
        PageCoordinate::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Whether both spans reach [`MIN_RECT_SPAN`].
    pub fn meets_minimum_span(&self) -> bool {
        self.width() >= MIN_RECT_SPAN && self.height() >= MIN_RECT_SPAN
    }

    /// Same size, with the top-left corner moved to `origin`.
    pub fn moved_to(&self, origin: PageCoordinate) -> Self {
        Self {
            x1: origin.x,
            y1: origin.y,
            x2: origin.x + (self.x2 - self.x1),
            y2: origin.y + (self.y2 - self.y1),
        }
    }

    /// Same corners shifted by `(dx, dy)`; orientation is kept.
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self { x1: self.x1 + dx, y1: self.y1 + dy, x2: self.x2 + dx, y2: self.y2 + dy }
    }

    pub fn expanded(&self, by: f32) -> Self {
        Self { x1: self.x1 - by, y1: self.y1 - by, x2: self.x2 + by, y2: self.y2 + by }
    }

    pub fn contains(&self, point: &PageCoordinate) -> bool {
        point.x >= self.x1 && point.x <= self.x2 && point.y >= self.y1 && point.y <= self.y2
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x1 <= other.x2 && other.x1 <= self.x2 && self.y1 <= other.y2 && other.y1 <= self.y2
    }

    /// Smallest rectangle containing every point, or `None` for an empty slice.
    pub fn bounding(points: &[PageCoordinate]) -> Option<Self> {
        let first = points.first()?;
        let mut rect = Rect::new(first.x, first.y, first.x, first.y);
        for point in points.iter().skip(1) {
            rect.x1 = rect.x1.min(point.x);
            rect.y1 = rect.y1.min(point.y);
            rect.x2 = rect.x2.max(point.x);
            rect.y2 = rect.y2.max(point.y);
        }
        Some(rect)
    }
}

/// RGBA color, serialized as `#rrggbbaa`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const RED: Color = Color { r: 255, g: 0, b: 0, a: 255 };
    pub const GREEN: Color = Color { r: 0, g: 128, b: 0, a: 255 };
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255, a: 255 };
    pub const YELLOW: Color = Color { r: 255, g: 255, b: 0, a: 255 };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid color `{0}`")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    /// Accepts `#rrggbb`, `#rrggbbaa` and a handful of names.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let named = match value.to_ascii_lowercase().as_str() {
            "red" => Some(Color::RED),
            "green" => Some(Color::GREEN),
            "blue" => Some(Color::BLUE),
            "yellow" => Some(Color::YELLOW),
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let invalid = || ParseColorError(value.to_owned());
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return Err(invalid());
        }

        let channel = |index: usize| {
            hex.get(index..index + 2)
                .and_then(|digits| u8::from_str_radix(digits, 16).ok())
                .ok_or_else(invalid)
        };

        let alpha = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Color::new(channel(0)?, channel(2)?, channel(4)?, alpha))
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// Subtype of a shape annotation.
///
/// An arrow's rectangle is not normalized: it runs from `(x1, y1)` to the
/// arrowhead at `(x2, y2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Oval,
    Arrow,
}

/// Discriminant of [`AnnotationBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Highlight,
    Text,
    Drawing,
    Shape,
    Comment,
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnnotationKind::Highlight => "highlight",
            AnnotationKind::Text => "text",
            AnnotationKind::Drawing => "drawing",
            AnnotationKind::Shape => "shape",
            AnnotationKind::Comment => "comment",
        };
        f.write_str(name)
    }
}

/// Kind-specific annotation geometry and payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnotationBody {
    Highlight { rect: Rect },
    Text { position: PageCoordinate, text: String },
    Drawing { points: Vec<PageCoordinate> },
    Shape { rect: Rect, shape: ShapeKind },
    Comment { position: PageCoordinate, text: String },
}

impl AnnotationBody {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            AnnotationBody::Highlight { .. } => AnnotationKind::Highlight,
            AnnotationBody::Text { .. } => AnnotationKind::Text,
            AnnotationBody::Drawing { .. } => AnnotationKind::Drawing,
            AnnotationBody::Shape { .. } => AnnotationKind::Shape,
            AnnotationBody::Comment { .. } => AnnotationKind::Comment,
        }
    }

    /// Normalize rectangles and check the persistence invariants.
    ///
    /// Arrow endpoints are kept as given so the arrowhead stays put.
    pub fn validated(self) -> Result<Self, Rejection> {
        match self {
            AnnotationBody::Highlight { rect } => {
                let rect = rect.normalized();
                check_rect(&rect)?;
                Ok(AnnotationBody::Highlight { rect })
            }
            AnnotationBody::Shape { rect, shape: ShapeKind::Arrow } => {
                let length = rect.top_left().distance_to(&rect.bottom_right());
                if length < MIN_RECT_SPAN {
                    return Err(Rejection::ArrowTooShort { length });
                }
                Ok(AnnotationBody::Shape { rect, shape: ShapeKind::Arrow })
            }
            AnnotationBody::Shape { rect, shape } => {
                let rect = rect.normalized();
                check_rect(&rect)?;
                Ok(AnnotationBody::Shape { rect, shape })
            }
            AnnotationBody::Drawing { points } => {
                if points.len() < MIN_DRAWING_POINTS {
                    return Err(Rejection::TooFewPoints { count: points.len() });
                }
                Ok(AnnotationBody::Drawing { points })
            }
            AnnotationBody::Text { position, text } => {
                if text.trim().is_empty() {
                    return Err(Rejection::EmptyText);
                }
                Ok(AnnotationBody::Text { position, text })
            }
            AnnotationBody::Comment { position, text } => {
                if text.trim().is_empty() {
                    return Err(Rejection::EmptyText);
                }
                Ok(AnnotationBody::Comment { position, text })
            }
        }
    }
}

fn check_rect(rect: &Rect) -> Result<(), Rejection> {
    if rect.meets_minimum_span() {
        Ok(())
    } else {
        Err(Rejection::RectTooSmall { width: rect.width(), height: rect.height() })
    }
}

/// Visual styling. Font fields only matter for text annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationStyle {
    pub color: Color,
    pub stroke_width: f32,
    pub font_family: String,
    pub font_size: f32,
}

impl AnnotationStyle {
    /// Stroke style in the given color (drawings and shapes).
    pub fn markup(color: Color) -> Self {
        Self { color, ..Self::default() }
    }

    pub fn highlight() -> Self {
        Self { color: Color::YELLOW, stroke_width: 0.0, ..Self::default() }
    }

    pub fn text() -> Self {
        Self { color: Color::BLACK, ..Self::default() }
    }

    pub fn comment() -> Self {
        Self { color: Color::YELLOW, ..Self::default() }
    }
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self { color: Color::RED, stroke_width: 2.0, font_family: "Arial".to_owned(), font_size: 12.0 }
    }
}

/// Identifier of an annotation, rendered as `page:sequence`.
///
/// The sequence comes from a per-page counter that never hands out the same
/// value twice, so ids stay unique on their page even after deletions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AnnotationId {
    page_index: u32,
    sequence: u32,
}

impl AnnotationId {
    pub fn new(page_index: u32, sequence: u32) -> Self {
        Self { page_index, sequence }
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.page_index, self.sequence)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid annotation id `{0}`")]
pub struct ParseAnnotationIdError(String);

impl FromStr for AnnotationId {
    type Err = ParseAnnotationIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseAnnotationIdError(value.to_owned());
        let (page, sequence) = value.split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            page_index: page.parse().map_err(|_| invalid())?,
            sequence: sequence.parse().map_err(|_| invalid())?,
        })
    }
}

impl TryFrom<String> for AnnotationId {
    type Error = ParseAnnotationIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AnnotationId> for String {
    fn from(id: AnnotationId) -> Self {
        id.to_string()
    }
}

/// Partial update merged into an existing annotation.
///
/// Unset fields keep their previous values. Setting a field the annotation's
/// kind does not have makes the whole patch inapplicable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationPatch {
    pub position: Option<PageCoordinate>,
    pub rect: Option<Rect>,
    pub points: Option<Vec<PageCoordinate>>,
    pub text: Option<String>,
    pub shape: Option<ShapeKind>,
    pub color: Option<Color>,
    pub stroke_width: Option<f32>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
}

impl AnnotationPatch {
    pub fn position(position: PageCoordinate) -> Self {
        Self { position: Some(position), ..Self::default() }
    }

    pub fn rect(rect: Rect) -> Self {
        Self { rect: Some(rect), ..Self::default() }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn merge_body(&self, body: &AnnotationBody) -> Option<AnnotationBody> {
        let merged = match body {
            AnnotationBody::Highlight { rect } => {
                if self.position.is_some()
                    || self.points.is_some()
                    || self.text.is_some()
                    || self.shape.is_some()
                {
                    return None;
                }
                AnnotationBody::Highlight { rect: self.rect.unwrap_or(*rect) }
            }
            AnnotationBody::Shape { rect, shape } => {
                if self.position.is_some() || self.points.is_some() || self.text.is_some() {
                    return None;
                }
                AnnotationBody::Shape {
                    rect: self.rect.unwrap_or(*rect),
                    shape: self.shape.unwrap_or(*shape),
                }
            }
            AnnotationBody::Drawing { points } => {
                if self.position.is_some()
                    || self.rect.is_some()
                    || self.text.is_some()
                    || self.shape.is_some()
                {
                    return None;
                }
                AnnotationBody::Drawing {
                    points: self.points.clone().unwrap_or_else(|| points.clone()),
                }
            }
            AnnotationBody::Text { position, text } | AnnotationBody::Comment { position, text } => {
                if self.rect.is_some() || self.points.is_some() || self.shape.is_some() {
                    return None;
                }
                let position = self.position.unwrap_or(*position);
                let text = self.text.clone().unwrap_or_else(|| text.clone());
                if body.kind() == AnnotationKind::Text {
                    AnnotationBody::Text { position, text }
                } else {
                    AnnotationBody::Comment { position, text }
                }
            }
        };
        Some(merged)
    }

    fn merge_style(&self, style: &AnnotationStyle) -> AnnotationStyle {
        AnnotationStyle {
            color: self.color.unwrap_or(style.color),
            stroke_width: self.stroke_width.unwrap_or(style.stroke_width),
            font_family: self.font_family.clone().unwrap_or_else(|| style.font_family.clone()),
            font_size: self.font_size.unwrap_or(style.font_size),
        }
    }
}

/// One user-created mark on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    id: AnnotationId,
    page_index: u32,
    body: AnnotationBody,
    style: AnnotationStyle,
}

impl Annotation {
    pub(crate) fn new(id: AnnotationId, body: AnnotationBody, style: AnnotationStyle) -> Self {
        Self { id, page_index: id.page_index(), body, style }
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn kind(&self) -> AnnotationKind {
        self.body.kind()
    }

    pub fn body(&self) -> &AnnotationBody {
        &self.body
    }

    pub fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    /// Copy with `patch` merged in, or `None` when the patch does not fit the
    /// kind or the result would break a persistence invariant.
    pub(crate) fn patched(&self, patch: &AnnotationPatch) -> Option<Self> {
        let body = patch.merge_body(&self.body)?.validated().ok()?;
        let style = patch.merge_style(&self.style);
        Some(Self { id: self.id, page_index: self.page_index, body, style })
    }

    /// Area the annotation occupies on the page, used for selection outlines.
    pub fn outline(&self) -> Rect {
        match &self.body {
            AnnotationBody::Highlight { rect } | AnnotationBody::Shape { rect, .. } => {
                rect.normalized()
            }
            AnnotationBody::Drawing { points } => {
                Rect::bounding(points).unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))
            }
            AnnotationBody::Text { position, text } => {
                let lines = text.lines().count().max(1) as f32;
                let longest = text.lines().map(|line| line.chars().count()).max().unwrap_or(0);
                let width = longest as f32 * self.style.font_size * GLYPH_ADVANCE;
                let height = lines * self.style.font_size * LINE_HEIGHT;
                Rect::new(position.x, position.y, position.x + width, position.y + height)
            }
            AnnotationBody::Comment { position, .. } => Rect::new(
                position.x,
                position.y,
                position.x + COMMENT_ICON_SIZE,
                position.y + COMMENT_ICON_SIZE,
            ),
        }
    }

    /// Whether the square `point ± tolerance` touches the annotation.
    pub fn hit_test(&self, point: &PageCoordinate, tolerance: f32) -> bool {
        let probe = Rect::around(*point, tolerance);
        let half_stroke = self.style.stroke_width / 2.0;

        match &self.body {
            AnnotationBody::Shape { rect, shape: ShapeKind::Oval } => {
                let center = rect.center();
                let radius_x = rect.width() / 2.0 + half_stroke;
                let radius_y = rect.height() / 2.0 + half_stroke;
                if radius_x <= 0.0 || radius_y <= 0.0 {
                    return probe.intersects(rect);
                }
                let nearest_x = center.x.clamp(probe.x1, probe.x2);
                let nearest_y = center.y.clamp(probe.y1, probe.y2);
                let dx = (nearest_x - center.x) / radius_x;
                let dy = (nearest_y - center.y) / radius_y;
                dx * dx + dy * dy <= 1.0
            }
            AnnotationBody::Shape { rect, shape: ShapeKind::Arrow } => point_near_segment(
                point,
                &rect.top_left(),
                &rect.bottom_right(),
                tolerance + half_stroke,
            ),
            AnnotationBody::Drawing { points } => match points.as_slice() {
                [] => false,
                [only] => point.distance_to(only) <= tolerance + half_stroke,
                _ => points.windows(2).any(|segment| {
                    point_near_segment(point, &segment[0], &segment[1], tolerance + half_stroke)
                }),
            },
            AnnotationBody::Shape { rect, shape: ShapeKind::Rectangle } => {
                probe.intersects(&rect.expanded(half_stroke))
            }
            AnnotationBody::Highlight { .. }
            | AnnotationBody::Text { .. }
            | AnnotationBody::Comment { .. } => probe.intersects(&self.outline()),
        }
    }
}

fn point_near_segment(
    point: &PageCoordinate,
    start: &PageCoordinate,
    end: &PageCoordinate,
    tolerance: f32,
) -> bool {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-6 {
        return point.distance_to(start) <= tolerance;
    }

    let t = (((point.x - start.x) * dx + (point.y - start.y) * dy) / length_sq).clamp(0.0, 1.0);
    let closest = PageCoordinate::new(start.x + t * dx, start.y + t * dy);
    point.distance_to(&closest) <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(body: AnnotationBody, style: AnnotationStyle) -> Annotation {
        Annotation::new(AnnotationId::new(0, 1), body, style)
    }

    #[test]
    fn rect_from_corners_normalizes_drag_direction() {
        let rect =
            Rect::from_corners(PageCoordinate::new(100.0, 50.0), PageCoordinate::new(10.0, 80.0));
        assert_eq!(rect, Rect::new(10.0, 50.0, 100.0, 80.0));
        assert_eq!(rect.width(), 90.0);
        assert_eq!(rect.height(), 30.0);
    }

    #[test]
    fn moved_rect_keeps_its_size() {
        let rect = Rect::new(10.0, 10.0, 40.0, 30.0);
        let moved = rect.moved_to(PageCoordinate::new(100.0, 200.0));
        assert_eq!(moved, Rect::new(100.0, 200.0, 130.0, 220.0));
    }

    #[test]
    fn color_parses_hex_and_names() {
        assert_eq!("#ff0000".parse::<Color>(), Ok(Color::RED));
        assert_eq!("#FFFF0080".parse::<Color>(), Ok(Color::new(255, 255, 0, 128)));
        assert_eq!("yellow".parse::<Color>(), Ok(Color::YELLOW));
        assert!("#12345".parse::<Color>().is_err());
        assert!("teal".parse::<Color>().is_err());
        assert_eq!(Color::rgb(1, 2, 3).to_hex(), "#010203ff");
    }

    #[test]
    fn annotation_id_round_trips_through_its_text_form() {
        let id = AnnotationId::new(3, 12);
        assert_eq!(id.to_string(), "3:12");
        assert_eq!("3:12".parse::<AnnotationId>(), Ok(id));
        assert!("3-12".parse::<AnnotationId>().is_err());
        assert!("x:1".parse::<AnnotationId>().is_err());
    }

    #[test]
    fn highlight_validation_rejects_thin_rectangles() {
        let body = AnnotationBody::Highlight { rect: Rect::new(10.0, 10.0, 14.0, 100.0) };
        assert!(matches!(body.validated(), Err(Rejection::RectTooSmall { .. })));

        let body = AnnotationBody::Highlight { rect: Rect::new(100.0, 50.0, 10.0, 10.0) };
        let validated = body.validated().expect("large rectangle should validate");
        assert_eq!(validated, AnnotationBody::Highlight { rect: Rect::new(10.0, 10.0, 100.0, 50.0) });
    }

    #[test]
    fn flat_arrow_is_accepted_but_short_arrow_is_not() {
        let flat = AnnotationBody::Shape {
            rect: Rect::new(0.0, 10.0, 50.0, 10.0),
            shape: ShapeKind::Arrow,
        };
        assert!(flat.validated().is_ok());

        let short = AnnotationBody::Shape {
            rect: Rect::new(0.0, 0.0, 2.0, 2.0),
            shape: ShapeKind::Arrow,
        };
        assert!(matches!(short.validated(), Err(Rejection::ArrowTooShort { .. })));
    }

    #[test]
    fn arrow_keeps_its_direction() {
        let up_right = Rect::new(0.0, 100.0, 100.0, 0.0);
        let body = AnnotationBody::Shape { rect: up_right, shape: ShapeKind::Arrow }
            .validated()
            .expect("long arrow should validate");
        assert_eq!(body, AnnotationBody::Shape { rect: up_right, shape: ShapeKind::Arrow });

        let arrow = annotation(body, AnnotationStyle::markup(Color::RED));
        assert_eq!(arrow.outline(), Rect::new(0.0, 0.0, 100.0, 100.0));
        assert!(arrow.hit_test(&PageCoordinate::new(50.0, 50.0), 1.0));
        assert!(arrow.hit_test(&PageCoordinate::new(90.0, 10.0), 1.0));
        assert!(!arrow.hit_test(&PageCoordinate::new(10.0, 10.0), 1.0));

        let moved = up_right.translated(10.0, 5.0);
        assert_eq!(moved, Rect::new(10.0, 105.0, 110.0, 5.0));
    }

    #[test]
    fn oval_hit_test_ignores_bounding_box_corners() {
        let oval = annotation(
            AnnotationBody::Shape { rect: Rect::new(0.0, 0.0, 100.0, 100.0), shape: ShapeKind::Oval },
            AnnotationStyle::markup(Color::GREEN),
        );

        assert!(oval.hit_test(&PageCoordinate::new(50.0, 50.0), 1.0));
        assert!(oval.hit_test(&PageCoordinate::new(100.5, 50.0), 1.0));
        assert!(!oval.hit_test(&PageCoordinate::new(2.0, 2.0), 1.0));
    }

    #[test]
    fn drawing_hit_test_follows_segments() {
        let drawing = annotation(
            AnnotationBody::Drawing {
                points: vec![PageCoordinate::new(0.0, 0.0), PageCoordinate::new(100.0, 0.0)],
            },
            AnnotationStyle::markup(Color::RED),
        );

        assert!(drawing.hit_test(&PageCoordinate::new(50.0, 2.5), 2.0));
        assert!(!drawing.hit_test(&PageCoordinate::new(50.0, 10.0), 2.0));
    }

    #[test]
    fn comment_occupies_its_note_icon() {
        let comment = annotation(
            AnnotationBody::Comment { position: PageCoordinate::new(10.0, 10.0), text: "?".into() },
            AnnotationStyle::comment(),
        );

        assert_eq!(comment.outline(), Rect::new(10.0, 10.0, 30.0, 30.0));
        assert!(comment.hit_test(&PageCoordinate::new(29.0, 29.0), 0.5));
        assert!(!comment.hit_test(&PageCoordinate::new(40.0, 40.0), 0.5));
    }

    #[test]
    fn patch_rejects_fields_foreign_to_the_kind() {
        let highlight = annotation(
            AnnotationBody::Highlight { rect: Rect::new(0.0, 0.0, 50.0, 50.0) },
            AnnotationStyle::highlight(),
        );

        assert!(highlight.patched(&AnnotationPatch::position(PageCoordinate::new(1.0, 1.0))).is_none());
        assert!(highlight.patched(&AnnotationPatch::default().with_text("nope")).is_none());

        let recolored = highlight
            .patched(&AnnotationPatch::default().with_color(Color::GREEN))
            .expect("color applies to every kind");
        assert_eq!(recolored.style().color, Color::GREEN);
        assert_eq!(recolored.body(), highlight.body());
    }

    #[test]
    fn body_serializes_with_a_kind_tag() {
        let body = AnnotationBody::Text { position: PageCoordinate::new(1.0, 2.0), text: "hi".into() };
        let json = serde_json::to_value(&body).expect("body should serialize");
        assert_eq!(json["kind"], "text");
        assert_eq!(json["text"], "hi");
    }
}
