//! Error types for geometry handling.

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors raised while loading or normalizing geometry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeoError {
    /// No rings, or only empty rings.
    #[error("geometry has no coordinates")]
    Empty,

    /// The bounding box has zero or non-finite width or height.
    #[error("geometry is degenerate: {0}")]
    Degenerate(String),

    /// The document is not a usable GeoJSON feature collection.
    #[error("invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    /// A geometry type other than Polygon or MultiPolygon.
    #[error("unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    /// The GeoJSON source could not be read.
    #[error("geometry source unavailable: {0}")]
    Unavailable(String),
}
