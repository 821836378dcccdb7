use kiln_ir::FusionKind;
use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Graph consistency errors found by [`verify_fusion_kinds`](crate::verify_fusion_kinds).
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// Fusion rooted at a contiguous reduction is not an input fusion.
    #[snafu(display("fusion {fusion} in {computation} is rooted at a contiguous reduction but has kind {kind}"))]
    FusionKindMismatch { fusion: String, computation: String, kind: FusionKind },
}
