//! SVG clip paths and cover overlays.
//!
//! Every ring becomes one closed sub-path (`M … L … Z`) of a single path
//! element. The path is rendered with the even-odd rule, so holes cut out of
//! their exterior and the islands of a multipolygon form one composite
//! region. Self-intersecting rings are drawn as-is.

use crate::fit::Placement;
use crate::normalize::NormalizedShape;

/// Build SVG path data with one closed sub-path per ring.
///
/// Rings with fewer than two points contribute nothing.
#[must_use]
pub fn path_data(shape: &NormalizedShape) -> String {
    let mut data = String::new();
    for ring in shape.rings.iter().filter(|ring| ring.len() >= 2) {
        for (i, [x, y]) in ring.iter().enumerate() {
            let command = if i == 0 { 'M' } else { 'L' };
            if !data.is_empty() && i == 0 {
                data.push(' ');
            }
            data.push_str(&format!("{command}{x:.3},{y:.3} "));
        }
        data.push('Z');
    }
    data
}

/// A named clip region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipPath {
    /// Element id, referenced as `url(#id)`.
    pub id: String,
    /// Path data from [`path_data`].
    pub data: String,
}

impl ClipPath {
    /// Clip region for a shape.
    #[must_use]
    pub fn new(id: impl Into<String>, shape: &NormalizedShape) -> Self {
        Self {
            id: id.into(),
            data: path_data(shape),
        }
    }

    /// The `<clipPath>` element.
    #[must_use]
    pub fn to_svg(&self) -> String {
        format!(
            r#"<clipPath id="{}"><path d="{}" clip-rule="evenodd"/></clipPath>"#,
            escape_attr(&self.id),
            self.data
        )
    }
}

/// Styling for a cover overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    /// Outline colour.
    pub stroke: String,
    /// Outline width in screen pixels.
    pub stroke_width: f64,
    /// Outline opacity.
    pub stroke_opacity: f64,
}

impl OverlayStyle {
    /// Outline in the given colour with the standard weight.
    #[must_use]
    pub fn outline(stroke: impl Into<String>) -> Self {
        Self {
            stroke: stroke.into(),
            stroke_width: 2.0,
            stroke_opacity: 0.8,
        }
    }
}

/// Render the cover overlay: the photo clipped to the outline, then the
/// outline itself on top.
#[must_use]
pub fn cover_overlay(
    id: &str,
    shape: &NormalizedShape,
    placement: &Placement,
    href: &str,
    style: &OverlayStyle,
) -> String {
    let clip = ClipPath::new(format!("clip-{id}"), shape);
    let viewport = shape.viewport;
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {vw:.3} {vh:.3}" preserveAspectRatio="none">"#,
            r#"<defs>{clip}</defs>"#,
            r#"<g clip-path="url(#{clip_id})">"#,
            r#"<image href="{href}" x="{x:.3}" y="{y:.3}" width="{w:.3}" height="{h:.3}" preserveAspectRatio="none"/>"#,
            r#"</g>"#,
            r#"<path d="{data}" fill="none" fill-rule="evenodd" stroke="{stroke}" stroke-width="{sw}" stroke-opacity="{so}" vector-effect="non-scaling-stroke"/>"#,
            r#"</svg>"#
        ),
        vw = viewport.width,
        vh = viewport.height,
        clip = clip.to_svg(),
        clip_id = escape_attr(&clip.id),
        href = escape_attr(href),
        x = placement.x,
        y = placement.y,
        w = placement.width,
        h = placement.height,
        data = clip.data,
        stroke = escape_attr(&style.stroke),
        sw = style.stroke_width,
        so = style.stroke_opacity,
    )
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::normalize::normalize;

    fn donut() -> NormalizedShape {
        let geometry = Geometry::Polygon(vec![
            vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
            vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0], [1.0, 1.0]],
        ]);
        normalize(geometry.rings()).unwrap()
    }

    #[test]
    fn one_closed_subpath_per_ring() {
        let data = path_data(&donut());
        assert_eq!(data.matches('M').count(), 2);
        assert_eq!(data.matches('Z').count(), 2);
        assert!(data.starts_with("M0.000,100.000 "));
    }

    #[test]
    fn points_are_written_with_three_decimals() {
        let triangle = Geometry::Polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]);
        let shape = normalize(triangle.rings()).unwrap();
        assert_eq!(
            path_data(&shape),
            "M0.000,100.000 L100.000,100.000 L100.000,0.000 L0.000,100.000 Z"
        );
    }

    #[test]
    fn multipolygon_is_one_path() {
        let geometry = Geometry::MultiPolygon(vec![
            vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
            vec![vec![[2.0, 0.0], [3.0, 0.0], [3.0, 1.0], [2.0, 0.0]]],
        ]);
        let clip = ClipPath::new("c", &normalize(geometry.rings()).unwrap());
        let svg = clip.to_svg();
        assert_eq!(svg.matches("<path").count(), 1);
        assert!(svg.contains(r#"clip-rule="evenodd""#));
        assert_eq!(clip.data.matches('Z').count(), 2);
    }

    #[test]
    fn overlay_escapes_href_and_references_clip() {
        let placement = Placement {
            x: -10.0,
            y: 0.0,
            width: 120.0,
            height: 100.0,
        };
        let svg = cover_overlay(
            "3106200",
            &donut(),
            &placement,
            "https://cdn.example.com/a.jpg?x=1&y=2",
            &OverlayStyle::outline("#a855f7"),
        );
        assert!(svg.contains(r#"id="clip-3106200""#));
        assert!(svg.contains(r#"clip-path="url(#clip-3106200)""#));
        assert!(svg.contains("x=1&amp;y=2"));
        assert!(svg.contains(r#"x="-10.000""#));
        assert!(svg.contains(r##"stroke="#a855f7""##));
    }
}
