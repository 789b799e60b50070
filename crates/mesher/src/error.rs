/// The meshing result type.
pub type MeshingResult = Result<(), MeshingError>;

/// A broken invariant in caller-supplied data.
///
/// These are not internal bugs: they are raised when the structures handed
/// to the core (boundaries, initializer output, layer spans) turn out to be
/// inconsistent. Invariants that hold by construction are `debug_assert!`s
/// instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StructuralError {
    /// A quad layer span walk left the front ring without reaching its
    /// ending edge.
    SpanOutsideFront,
    /// The advancing front is not a connected ring of edges.
    DisconnectedFront,
    /// An initializer seed edge carries a twin link it should not have, or
    /// a twin link is one-sided.
    TwinMismatch,
    /// An initializer boundary produced no seed edges.
    EmptyBoundary,
}

impl core::fmt::Display for StructuralError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StructuralError::SpanOutsideFront => {
                write!(f, "Quad layer span is not contained in the front")
            }
            StructuralError::DisconnectedFront => {
                write!(f, "The advancing front is not a connected ring of edges")
            }
            StructuralError::TwinMismatch => {
                write!(f, "Inconsistent twin-edge link")
            }
            StructuralError::EmptyBoundary => {
                write!(f, "A boundary produced no seed edges")
            }
        }
    }
}

impl std::error::Error for StructuralError {}

/// The meshing error enumeration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MeshingError {
    /// Caller-supplied structures are inconsistent.
    Structural(StructuralError),
    /// The mesh has no boundary edges to start a front from.
    NoBoundaryEdges,
}

impl core::fmt::Display for MeshingError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MeshingError::Structural(e) => {
                write!(f, "Structural error: {e}")
            }
            MeshingError::NoBoundaryEdges => {
                write!(f, "The mesh has no boundary edges")
            }
        }
    }
}

impl std::error::Error for MeshingError {}

impl core::convert::From<StructuralError> for MeshingError {
    fn from(value: StructuralError) -> Self {
        Self::Structural(value)
    }
}
