//! Fusion engine configuration.
//!
//! Provides typed configuration for the decision functions with a bon
//! builder. Supports both explicit configuration and environment variable
//! fallbacks; the engine itself never reads the environment.

use bon::bon;

/// Cap on the operands plus outputs of one fused kernel.
///
/// The kernel argument limit of the target depends on buffer assignment and
/// constant memory use, neither of which is known during fusion. Capping the
/// combined count keeps kernels under that limit and bounds register pressure.
pub const MAX_OPERANDS_AND_OUTPUTS_PER_FUSION: usize = 64;

/// Knobs threaded into the top-level decision functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusionConfig {
    /// Accept any valid multi-output root, not only input-fusible reductions.
    pub experimental_multi_output_fusion: bool,
    /// Upper bound on operands plus output buffers of a merged fusion.
    pub max_operands_and_outputs_per_fusion: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            experimental_multi_output_fusion: false,
            max_operands_and_outputs_per_fusion: MAX_OPERANDS_AND_OUTPUTS_PER_FUSION,
        }
    }
}

#[bon]
impl FusionConfig {
    /// Create a fusion configuration with builder pattern.
    #[builder(finish_fn = build)]
    pub fn builder(
        #[builder(default = false)] experimental_multi_output_fusion: bool,
        #[builder(default = MAX_OPERANDS_AND_OUTPUTS_PER_FUSION)] max_operands_and_outputs_per_fusion: usize,
    ) -> Self {
        Self { experimental_multi_output_fusion, max_operands_and_outputs_per_fusion }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// * `KILN_EXPERIMENTAL_MOF=1` - Enable the experimental multi-output path
    /// * `KILN_MAX_FUSION_OPERANDS` - Operand plus output cap (default: 64)
    pub fn from_env() -> Self {
        let experimental_multi_output_fusion = std::env::var("KILN_EXPERIMENTAL_MOF").is_ok_and(|v| v == "1");
        let max_operands_and_outputs_per_fusion = std::env::var("KILN_MAX_FUSION_OPERANDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&cap: &usize| cap > 0)
            .unwrap_or(MAX_OPERANDS_AND_OUTPUTS_PER_FUSION);

        Self { experimental_multi_output_fusion, max_operands_and_outputs_per_fusion }
    }

    /// Configuration with the experimental multi-output path switched on.
    pub fn experimental() -> Self {
        Self { experimental_multi_output_fusion: true, ..Default::default() }
    }
}

// ============================================================================
// TESTS
// ============================================================================
