//! Decoding configuration: a plain struct deserialised from TOML, with
//! CLI overrides layered on top (spec §10.1).

use crate::errors::{DecoderError, DecoderResult};
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub max_stack_size: u32,
    pub prune_threshold: f64,
    pub cov_limit: u32,
    pub cov_threshold: f64,
    pub diversity: u32,
    pub diversity_stack_increment: u32,
    pub dist_limit: i32,
    pub dist_limit_ext: bool,
    pub dist_limit_simple: bool,
    pub dist_phrase_swap: bool,
    pub itg_limit: bool,
    pub dist_limit_itg: i32,
    pub lev_limit: u32,
    pub cube_pruning: bool,
    pub forced_decoding: bool,
    pub forced_decoding_nz: bool,
    pub nbest_size: u32,
    pub lattice_out: bool,
    pub masse: bool,
    pub nbest_out: bool,
    pub verbosity: u8,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_stack_size: 0,
            prune_threshold: -10.0,
            cov_limit: 0,
            cov_threshold: f64::NEG_INFINITY,
            diversity: 0,
            diversity_stack_increment: 0,
            dist_limit: -1,
            dist_limit_ext: false,
            dist_limit_simple: false,
            dist_phrase_swap: false,
            itg_limit: false,
            dist_limit_itg: -1,
            lev_limit: 0,
            cube_pruning: false,
            forced_decoding: false,
            forced_decoding_nz: false,
            nbest_size: 1,
            lattice_out: false,
            masse: false,
            nbest_out: false,
            verbosity: 0,
        }
    }
}

impl DecoderConfig {
    pub fn from_toml_str(text: &str) -> DecoderResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> DecoderResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Fatal-error checks run once at load time (spec §7); never
    /// re-checked on the hot path.
    pub fn validate(&self) -> DecoderResult<()> {
        if self.prune_threshold >= 0.0 {
            return Err(DecoderError::Config(format!(
                "prune_threshold must be negative, got {}",
                self.prune_threshold
            )));
        }
        if self.cov_threshold > 0.0 {
            return Err(DecoderError::Config(format!(
                "cov_threshold must be non-positive, got {}",
                self.cov_threshold
            )));
        }
        if self.lev_limit > 100 {
            return Err(DecoderError::Config(format!(
                "lev_limit is a percentage of source length, got {}",
                self.lev_limit
            )));
        }
        if self.forced_decoding_nz && !self.forced_decoding {
            return Err(DecoderError::Config(
                "forced_decoding_nz requires forced_decoding".to_string(),
            ));
        }
        Ok(())
    }

    pub fn stack_prune_size(&self) -> Option<u32> {
        if self.max_stack_size == 0 {
            None
        } else {
            Some(self.max_stack_size)
        }
    }

    pub fn cov_limit_opt(&self) -> Option<u32> {
        if self.cov_limit == 0 {
            None
        } else {
            Some(self.cov_limit)
        }
    }

    pub fn dist_limit_opt(&self) -> Option<u32> {
        if self.dist_limit < 0 {
            None
        } else {
            Some(self.dist_limit as u32)
        }
    }

    pub fn dist_limit_itg_opt(&self) -> Option<u32> {
        if self.dist_limit_itg < 0 {
            None
        } else {
            Some(self.dist_limit_itg as u32)
        }
    }

    /// `lev_limit` is a percentage of the source sentence length; `None`
    /// means no limit (the `0` sentinel).
    pub fn lev_limit_for_source(&self, sentence_len: u32) -> Option<u32> {
        if self.lev_limit == 0 {
            None
        } else {
            Some((self.lev_limit * sentence_len).div_ceil(100))
        }
    }

    /// Whether recombined-but-inferior states should be discarded outright
    /// rather than kept (for a lattice or an n-best list). Mirrors
    /// `runStackDecoder`'s `discardRecomb = !masse && !latticeOut && !nbestOut`.
    pub fn discard_recomb(&self) -> bool {
        !self.masse && !self.lattice_out && !self.nbest_out
    }

    /// Size of the final stack: 1 if recombined states are discarded
    /// outright (nothing downstream can use more than the single best
    /// anyway), else `nbest_size` when that's both requested and smaller
    /// than the regular stack size, else the regular stack size.
    pub fn last_stack_size(&self) -> Option<u32> {
        if self.discard_recomb() {
            Some(1)
        } else if !self.masse && !self.lattice_out && self.stack_prune_size().is_some_and(|max| self.nbest_size < max) {
            Some(self.nbest_size)
        } else {
            self.stack_prune_size()
        }
    }
}

/// CLI overrides, merged onto a base [`DecoderConfig`] loaded from TOML.
/// Mirrors the base struct's field names per spec §10.1, all optional so
/// `clap` only overrides what the user actually passed.
#[derive(clap::Args, Debug, Default)]
pub struct ConfigOverrides {
    #[arg(long)]
    pub max_stack_size: Option<u32>,
    #[arg(long)]
    pub prune_threshold: Option<f64>,
    #[arg(long)]
    pub dist_limit: Option<i32>,
    #[arg(long)]
    pub cube_pruning: bool,
    #[arg(long)]
    pub verbosity: Option<u8>,
}

impl ConfigOverrides {
    pub fn apply(&self, mut config: DecoderConfig) -> DecoderConfig {
        if let Some(v) = self.max_stack_size {
            config.max_stack_size = v;
        }
        if let Some(v) = self.prune_threshold {
            config.prune_threshold = v;
        }
        if let Some(v) = self.dist_limit {
            config.dist_limit = v;
        }
        if self.cube_pruning {
            config.cube_pruning = true;
        }
        if let Some(v) = self.verbosity {
            config.verbosity = v;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(DecoderConfig::default().validate().is_ok());
    }

    #[test]
    fn non_negative_prune_threshold_is_rejected() {
        let config = DecoderConfig {
            prune_threshold: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DecoderError::Config(_))));
    }

    #[test]
    fn round_trips_through_a_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("decode.toml");
        std::fs::write(&path, "max_stack_size = 200\nprune_threshold = -5.0\n").unwrap();
        let config = DecoderConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.max_stack_size, 200);
        assert_eq!(config.prune_threshold, -5.0);
    }

    #[test]
    fn forced_decoding_nz_requires_forced_decoding() {
        let config = DecoderConfig {
            forced_decoding_nz: true,
            forced_decoding: false,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
