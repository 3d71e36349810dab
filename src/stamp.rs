use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};

pub(crate) type RefTime = DateTime<Utc>;

/// Reference time and forecast offset of one message, as used for output
/// file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    pub(crate) ref_time: RefTime,
    pub(crate) forecast_offset: u32,
}

impl Stamp {
    pub(crate) fn new(ref_time: RefTime, forecast_offset: u32) -> Self {
        Self {
            ref_time,
            forecast_offset,
        }
    }

    pub(crate) fn dir_name(&self) -> String {
        self.ref_time.format("%Y-%m-%d_%H_%M_%S").to_string()
    }

    /// `<base>/<reference time>/<forecast offset>`
    pub(crate) fn dir(&self, base: &Path) -> PathBuf {
        base.join(self.dir_name()).join(self.forecast_offset.to_string())
    }
}

impl Display for Stamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}Z+{:03}", self.ref_time.format("%Y%m%d%H"), self.forecast_offset)
    }
}
