pub mod config;
pub mod events;
pub mod preview;
pub mod sync;

use std::path::PathBuf;

use calsync_core::storage::data_dir;
use calsync_core::SyncKinds;
use clap::Args;

/// Calendar file used when `--store` is not given.
pub fn default_store_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(data_dir()?.join("calendar.json"))
}

/// Per-run overrides of the mirrored kinds from the config file.
#[derive(Args, Debug, Default)]
pub struct KindOverrides {
    /// Mirror due dates
    #[arg(long, overrides_with = "no_dues")]
    dues: bool,
    /// Do not mirror due dates
    #[arg(long)]
    no_dues: bool,
    /// Mirror threshold dates
    #[arg(long, overrides_with = "no_thresholds")]
    thresholds: bool,
    /// Do not mirror threshold dates
    #[arg(long)]
    no_thresholds: bool,
}

impl KindOverrides {
    pub fn apply(&self, kinds: SyncKinds) -> SyncKinds {
        let kinds = match (self.dues, self.no_dues) {
            (true, _) => kinds.with_dues(true),
            (_, true) => kinds.with_dues(false),
            _ => kinds,
        };
        match (self.thresholds, self.no_thresholds) {
            (true, _) => kinds.with_thresholds(true),
            (_, true) => kinds.with_thresholds(false),
            _ => kinds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_only_touch_given_kinds() {
        let base = SyncKinds::new(true, false);
        assert_eq!(KindOverrides::default().apply(base), base);

        let flags = KindOverrides {
            thresholds: true,
            ..Default::default()
        };
        assert_eq!(flags.apply(base), SyncKinds::new(true, true));

        let flags = KindOverrides {
            no_dues: true,
            ..Default::default()
        };
        assert!(flags.apply(base).is_empty());
    }
}
