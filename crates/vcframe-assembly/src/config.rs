use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::buffer::FrameLimits;

/// Frame assembly settings, loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct AssemblyConfig {
    /// Hard cap on the payload of a single frame, in bytes.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,

    /// Frame buffers grow in multiples of this many bytes.
    #[serde(default = "default_growth_step")]
    pub growth_step: usize,

    /// Packets per frame above which the assembler refuses more.
    #[serde(default = "default_max_packets_per_frame")]
    pub max_packets_per_frame: usize,

    /// Round-trip time from which a partial delta frame holding its first
    /// packet is declared decodable instead of waiting for retransmissions.
    #[serde(default = "default_decodable_rtt_threshold_ms")]
    pub decodable_rtt_threshold_ms: u32,

    /// Round-trip time from which hybrid NACK stops requesting gaps inside a
    /// frame whose first and last packets already arrived.
    #[serde(default = "default_nack_rtt_threshold_ms")]
    pub nack_rtt_threshold_ms: u32,

    /// Finalize VP8 frames per partition instead of as one contiguous run.
    #[serde(default)]
    pub independent_partitions: bool,

    /// Number of frame buffers in a pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_max_frame_size() -> usize {
    4_000_000
}

fn default_growth_step() -> usize {
    30_000
}

fn default_max_packets_per_frame() -> usize {
    800
}

fn default_decodable_rtt_threshold_ms() -> u32 {
    100
}

fn default_nack_rtt_threshold_ms() -> u32 {
    100
}

fn default_pool_size() -> usize {
    100
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            max_frame_size: default_max_frame_size(),
            growth_step: default_growth_step(),
            max_packets_per_frame: default_max_packets_per_frame(),
            decodable_rtt_threshold_ms: default_decodable_rtt_threshold_ms(),
            nack_rtt_threshold_ms: default_nack_rtt_threshold_ms(),
            independent_partitions: false,
            pool_size: default_pool_size(),
        }
    }
}

impl AssemblyConfig {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.growth_step > 0, "growth_step must be non-zero");
        anyhow::ensure!(
            self.max_frame_size >= self.growth_step,
            "max_frame_size ({}) is smaller than growth_step ({})",
            self.max_frame_size,
            self.growth_step
        );
        anyhow::ensure!(self.max_packets_per_frame > 0, "max_packets_per_frame must be non-zero");
        Ok(())
    }

    pub fn limits(&self) -> FrameLimits {
        FrameLimits {
            max_frame_size: self.max_frame_size,
            growth_step: self.growth_step,
            independent_partitions: self.independent_partitions,
        }
    }
}
