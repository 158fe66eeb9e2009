//! Write every event to all members

use super::TargetRef;
use crate::core::{error::Result, internal_log, log_event::SharedEvent};

pub struct SplitGroup {
    targets: Vec<TargetRef>,
}

impl SplitGroup {
    pub fn new(targets: Vec<TargetRef>) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &[TargetRef] {
        &self.targets
    }

    /// Every member is attempted; the first error is returned
    pub(crate) fn write(&self, event: &SharedEvent) -> Result<()> {
        let mut first_error = None;
        for target in &self.targets {
            if let Err(e) = target.write(event) {
                internal_log::debug(format_args!(
                    "Split member '{}' failed: {}",
                    target.display_name(),
                    e
                ));
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
