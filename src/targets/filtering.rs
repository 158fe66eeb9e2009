//! Forward only the events a predicate accepts

use super::TargetRef;
use crate::core::{error::Result, filter::FilterPredicate, log_event::SharedEvent};

pub struct FilteringWrapper {
    child: TargetRef,
    condition: FilterPredicate,
}

impl FilteringWrapper {
    pub fn new(child: TargetRef, condition: FilterPredicate) -> Self {
        Self { child, condition }
    }

    pub fn child(&self) -> &TargetRef {
        &self.child
    }

    pub(crate) fn write(&self, event: &SharedEvent) -> Result<()> {
        if (self.condition)(event) {
            self.child.write(event)
        } else {
            Ok(())
        }
    }
}
